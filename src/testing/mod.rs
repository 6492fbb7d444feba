//! In-memory stand-ins for the DOM and the remote session.

use crate::dropdown::CandidateList;
use crate::error::{MentionError, MentionResult};
use crate::focus::{Scheduler, TaskId};
use crate::models::{Candidate, MentionToken};
use crate::surface::{Boundary, Fragment, NodeClass, Surface};
use crate::sync::{ChangeSource, OutboundEvent, SyncChannel};
use crate::text::{utf16_len, utf16_to_byte_idx};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

pub(crate) fn token(id: &str, name: &str) -> MentionToken {
    MentionToken {
        contact_id: id.to_string(),
        display_name: name.to_string(),
        provider: "hubspot".to_string(),
    }
}

pub(crate) fn candidate(id: &str, name: &str) -> Candidate {
    Candidate {
        contact_id: id.to_string(),
        display_name: name.to_string(),
        first_name: None,
        last_name: None,
        provider: "hubspot".to_string(),
    }
}

pub(crate) fn contact_json(id: &str, name: &str) -> String {
    serde_json::json!({ "id": id, "display_name": name, "crm_provider": "hubspot" }).to_string()
}

#[derive(Clone, Debug)]
enum MemKind {
    Element,
    Block,
    Break,
    Text(String),
    Token(MentionToken),
}

#[derive(Clone, Debug)]
struct MemNode {
    kind: MemKind,
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Debug)]
struct MemInner {
    nodes: Vec<MemNode>,
    selection: Option<Boundary<usize>>,
    focused: bool,
}

/// Arena-backed surface. Node 0 is the root element.
#[derive(Debug)]
pub(crate) struct MemSurface {
    inner: RefCell<MemInner>,
}

const ROOT: usize = 0;

impl MemSurface {
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(MemInner {
                nodes: vec![MemNode {
                    kind: MemKind::Element,
                    parent: None,
                    children: vec![],
                }],
                selection: None,
                focused: false,
            }),
        }
    }

    fn alloc(&self, parent: Option<usize>, kind: MemKind) -> usize {
        let mut inner = self.inner.borrow_mut();
        let id = inner.nodes.len();
        inner.nodes.push(MemNode {
            kind,
            parent,
            children: vec![],
        });
        if let Some(p) = parent {
            inner.nodes[p].children.push(id);
        }
        id
    }

    pub fn push_text(&self, parent: usize, text: &str) -> usize {
        self.alloc(Some(parent), MemKind::Text(text.to_string()))
    }

    pub fn push_token(&self, parent: usize, token: MentionToken) -> usize {
        self.alloc(Some(parent), MemKind::Token(token))
    }

    pub fn push_element(&self, parent: usize) -> usize {
        self.alloc(Some(parent), MemKind::Element)
    }

    pub fn push_block(&self, parent: usize) -> usize {
        self.alloc(Some(parent), MemKind::Block)
    }

    pub fn push_break(&self, parent: usize) -> usize {
        self.alloc(Some(parent), MemKind::Break)
    }

    /// A text node that is not part of the surface.
    pub fn detached_text(&self, text: &str) -> usize {
        self.alloc(None, MemKind::Text(text.to_string()))
    }

    pub fn edit_text(&self, node: usize, text: &str) {
        let mut inner = self.inner.borrow_mut();
        if let MemKind::Text(s) = &mut inner.nodes[node].kind {
            *s = text.to_string();
        }
    }

    pub fn force_selection(&self, at: Option<(usize, u32)>) {
        self.inner.borrow_mut().selection = at.map(|(n, o)| Boundary::new(n, o));
    }

    pub fn blur(&self) {
        self.inner.borrow_mut().focused = false;
    }

    /// Append `text` the way typing at the end would, moving the caret along.
    pub fn type_at_end(&self, text: &str) {
        let last = {
            let inner = self.inner.borrow();
            inner.nodes[ROOT]
                .children
                .last()
                .copied()
                .filter(|&c| matches!(inner.nodes[c].kind, MemKind::Text(_)))
        };
        let node = match last {
            Some(n) => {
                let mut inner = self.inner.borrow_mut();
                if let MemKind::Text(s) = &mut inner.nodes[n].kind {
                    s.push_str(text);
                }
                n
            }
            None => self.push_text(ROOT, text),
        };
        let len = match &self.inner.borrow().nodes[node].kind {
            MemKind::Text(s) => utf16_len(s),
            _ => 0,
        };
        self.force_selection(Some((node, len)));
    }

    fn detach_children(inner: &mut MemInner, parent: usize, range: std::ops::Range<usize>) {
        let removed = inner.nodes[parent].children.drain(range).collect::<Vec<_>>();
        for id in removed {
            inner.nodes[id].parent = None;
        }
    }
}

impl Surface for MemSurface {
    type Node = usize;

    fn root(&self) -> usize {
        ROOT
    }

    fn classify(&self, node: &usize) -> NodeClass<usize> {
        let inner = self.inner.borrow();
        let n = &inner.nodes[*node];
        match &n.kind {
            MemKind::Text(s) => NodeClass::Text(s.clone()),
            MemKind::Token(t) => NodeClass::Token(t.clone()),
            MemKind::Element => NodeClass::Element(n.children.clone()),
            MemKind::Block => NodeClass::Block(n.children.clone()),
            MemKind::Break => NodeClass::Break,
        }
    }

    fn contains(&self, ancestor: &usize, node: &usize) -> bool {
        let inner = self.inner.borrow();
        let mut cur = Some(*node);
        while let Some(id) = cur {
            if id == *ancestor {
                return true;
            }
            cur = inner.nodes[id].parent;
        }
        false
    }

    fn selection(&self) -> Option<Boundary<usize>> {
        self.inner.borrow().selection.clone()
    }

    fn select(&self, at: &Boundary<usize>) -> MentionResult<()> {
        self.inner.borrow_mut().selection = Some(at.clone());
        Ok(())
    }

    /// Supports ranges whose ends are text runs under the same parent.
    fn replace(&self, start: &Boundary<usize>, end: &Boundary<usize>, fragments: &[Fragment]) -> MentionResult<()> {
        let (parent, i, j, head, tail) = {
            let inner = self.inner.borrow();
            let text_of = |id: usize| match &inner.nodes[id].kind {
                MemKind::Text(s) => Some(s.clone()),
                _ => None,
            };
            let s1 = text_of(start.container).ok_or_else(|| MentionError::dom("start is not text"))?;
            let s2 = text_of(end.container).ok_or_else(|| MentionError::dom("end is not text"))?;
            let parent = inner.nodes[start.container]
                .parent
                .filter(|p| Some(*p) == inner.nodes[end.container].parent)
                .ok_or_else(|| MentionError::dom("range ends have different parents"))?;
            let siblings = &inner.nodes[parent].children;
            let i = siblings
                .iter()
                .position(|&c| c == start.container)
                .ok_or_else(|| MentionError::dom("start not attached"))?;
            let j = siblings
                .iter()
                .position(|&c| c == end.container)
                .ok_or_else(|| MentionError::dom("end not attached"))?;
            if i > j || (i == j && start.offset > end.offset) {
                return Err(MentionError::dom("inverted range"));
            }
            let head = s1[..utf16_to_byte_idx(&s1, start.offset)].to_string();
            let tail = s2[utf16_to_byte_idx(&s2, end.offset)..].to_string();
            (parent, i, j, head, tail)
        };

        {
            let mut inner = self.inner.borrow_mut();
            Self::detach_children(&mut inner, parent, i + 1..j + 1);
            if let MemKind::Text(s) = &mut inner.nodes[start.container].kind {
                *s = head;
            }
        }

        let mut inserted = vec![];
        for f in fragments {
            let kind = match f {
                Fragment::Text(t) => MemKind::Text(t.clone()),
                Fragment::Token(t) => MemKind::Token(t.clone()),
            };
            inserted.push(self.alloc(None, kind));
        }
        if !tail.is_empty() {
            inserted.push(self.alloc(None, MemKind::Text(tail)));
        }

        let mut inner = self.inner.borrow_mut();
        for (k, id) in inserted.into_iter().enumerate() {
            inner.nodes[id].parent = Some(parent);
            inner.nodes[parent].children.insert(i + 1 + k, id);
        }
        Ok(())
    }

    fn set_text(&self, text: &str) {
        {
            let mut inner = self.inner.borrow_mut();
            let n = inner.nodes[ROOT].children.len();
            Self::detach_children(&mut inner, ROOT, 0..n);
        }
        if !text.is_empty() {
            self.push_text(ROOT, text);
        }
    }

    fn focus(&self) {
        self.inner.borrow_mut().focused = true;
    }

    fn has_focus(&self) -> bool {
        self.inner.borrow().focused
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeCandidates {
    items: RefCell<Vec<Option<String>>>,
    loading: Cell<bool>,
    highlighted: Cell<Option<usize>>,
    hidden: Cell<bool>,
}

impl FakeCandidates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_items(&self, items: Vec<Option<String>>) {
        *self.items.borrow_mut() = items;
    }

    pub fn set_loading(&self, loading: bool) {
        self.loading.set(loading);
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted.get()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden.get()
    }
}

impl CandidateList for FakeCandidates {
    fn items(&self) -> Vec<Option<String>> {
        self.items.borrow().clone()
    }

    fn loading(&self) -> bool {
        self.loading.get()
    }

    fn highlight(&self, index: usize) {
        self.highlighted.set(Some(index));
    }

    fn hide(&self) {
        self.hidden.set(true);
    }

    fn show(&self) {
        self.hidden.set(false);
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingChannel {
    events: RefCell<Vec<OutboundEvent>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OutboundEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl SyncChannel for RecordingChannel {
    fn push(&self, event: OutboundEvent) {
        self.events.borrow_mut().push(event);
    }
}

/// Scheduler whose tasks only fire when a test says so.
#[derive(Debug, Default)]
pub(crate) struct ManualScheduler {
    next: Cell<TaskId>,
    scheduled: RefCell<Vec<TaskId>>,
    cancelled: RefCell<Vec<TaskId>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelled(&self) -> Vec<TaskId> {
        self.cancelled.borrow().clone()
    }

    /// Scheduled and not cancelled.
    pub fn live(&self) -> Vec<TaskId> {
        let cancelled = self.cancelled.borrow();
        self.scheduled
            .borrow()
            .iter()
            .copied()
            .filter(|id| !cancelled.contains(id))
            .collect()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self) -> Option<TaskId> {
        let id = self.next.get() + 1;
        self.next.set(id);
        self.scheduled.borrow_mut().push(id);
        Some(id)
    }

    fn cancel(&self, id: TaskId) {
        self.cancelled.borrow_mut().push(id);
    }
}

type Registry = RefCell<Vec<(u64, Rc<dyn Fn()>)>>;

#[derive(Default)]
pub(crate) struct FakeChangeSource {
    registry: Rc<Registry>,
    next: Cell<u64>,
}

pub(crate) struct FakeSubscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Drop for FakeSubscription {
    fn drop(&mut self) {
        if let Some(r) = self.registry.upgrade() {
            r.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

impl FakeChangeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self) {
        let callbacks = self
            .registry
            .borrow()
            .iter()
            .map(|(_, f)| f.clone())
            .collect::<Vec<_>>();
        for f in callbacks {
            f();
        }
    }

    pub fn subscribers(&self) -> usize {
        self.registry.borrow().len()
    }
}

impl ChangeSource for FakeChangeSource {
    type Subscription = FakeSubscription;

    fn subscribe(&self, on_change: Box<dyn Fn()>) -> MentionResult<FakeSubscription> {
        let id = self.next.get() + 1;
        self.next.set(id);
        self.registry.borrow_mut().push((id, Rc::from(on_change)));
        Ok(FakeSubscription {
            id,
            registry: Rc::downgrade(&self.registry),
        })
    }
}
