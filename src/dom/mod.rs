//! `web_sys` implementations of the widget's seams, and [`mount`].

mod hook;

pub use hook::MentionInputHook;

use crate::config::MentionInputConfig;
use crate::dropdown::CandidateList;
use crate::error::{MentionError, MentionResult};
use crate::focus::{Scheduler, TaskId};
use crate::models::MentionToken;
use crate::surface::{Boundary, Fragment, NodeClass, Surface};
use crate::sync::{ChangeSource, InboundCommand, OutboundEvent, SyncChannel};
use crate::widget::{dispatch, observe_changes, KeyOutcome, MentionWidget, SharedWidget};
use leptos::logging::warn;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, EventTarget, HtmlElement, Node};

const TOKEN_ATTR: &str = "data-mention";

/// Elements the browser lays out as their own line inside a contenteditable.
const BLOCK_TAGS: &[&str] = &[
    "DIV", "P", "LI", "UL", "OL", "BLOCKQUOTE", "PRE", "H1", "H2", "H3", "H4", "H5", "H6",
];

fn document() -> MentionResult<Document> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| MentionError::dom("no document"))
}

/// The contenteditable element. Mention tokens are
/// `<span contenteditable="false" data-mention ...>@Name</span>`.
#[derive(Clone, Debug)]
pub struct DomSurface {
    root: HtmlElement,
    document: Document,
}

impl DomSurface {
    pub fn new(root: HtmlElement) -> MentionResult<Self> {
        let document = match root.owner_document() {
            Some(d) => d,
            None => document()?,
        };
        Ok(Self { root, document })
    }

    fn token_element(&self, token: &MentionToken) -> MentionResult<Node> {
        let el = self
            .document
            .create_element("span")
            .map_err(|e| MentionError::js("create token", e))?;
        let attrs = [
            ("contenteditable", "false"),
            (TOKEN_ATTR, ""),
            ("data-contact-id", token.contact_id.as_str()),
            ("data-display-name", token.display_name.as_str()),
            ("data-provider", token.provider.as_str()),
            ("class", "mention-token"),
        ];
        for (name, value) in attrs {
            el.set_attribute(name, value)
                .map_err(|e| MentionError::js("token attribute", e))?;
        }
        el.set_text_content(Some(&token.text()));
        Ok(el.into())
    }

    fn fragment_node(&self, fragment: &Fragment) -> MentionResult<Node> {
        match fragment {
            Fragment::Text(t) => Ok(self.document.create_text_node(t).into()),
            Fragment::Token(t) => self.token_element(t),
        }
    }

    fn read_token(el: &Element) -> MentionToken {
        let display_name = el.get_attribute("data-display-name").unwrap_or_else(|| {
            el.text_content()
                .unwrap_or_default()
                .trim_start_matches('@')
                .to_string()
        });
        MentionToken {
            contact_id: el.get_attribute("data-contact-id").unwrap_or_default(),
            display_name,
            provider: el.get_attribute("data-provider").unwrap_or_default(),
        }
    }
}

impl Surface for DomSurface {
    type Node = Node;

    fn root(&self) -> Node {
        self.root.clone().into()
    }

    fn classify(&self, node: &Node) -> NodeClass<Node> {
        if node.node_type() == Node::TEXT_NODE {
            return NodeClass::Text(node.text_content().unwrap_or_default());
        }
        if let Some(el) = node.dyn_ref::<Element>() {
            if el.has_attribute(TOKEN_ATTR) {
                return NodeClass::Token(Self::read_token(el));
            }
            if el.tag_name() == "BR" {
                return NodeClass::Break;
            }
        }
        let children = node.child_nodes();
        let children = (0..children.length()).filter_map(|i| children.item(i)).collect();
        let block = node
            .dyn_ref::<Element>()
            .is_some_and(|el| BLOCK_TAGS.contains(&el.tag_name().as_str()));
        if block {
            NodeClass::Block(children)
        } else {
            NodeClass::Element(children)
        }
    }

    fn contains(&self, ancestor: &Node, node: &Node) -> bool {
        ancestor.contains(Some(node))
    }

    fn selection(&self) -> Option<Boundary<Node>> {
        let sel = self.document.get_selection().ok().flatten()?;
        if sel.range_count() == 0 {
            return None;
        }
        let range = sel.get_range_at(0).ok()?;
        let container = range.start_container().ok()?;
        let offset = range.start_offset().ok()?;
        Some(Boundary::new(container, offset))
    }

    fn select(&self, at: &Boundary<Node>) -> MentionResult<()> {
        let sel = self
            .document
            .get_selection()
            .map_err(|e| MentionError::js("getSelection", e))?
            .ok_or_else(|| MentionError::dom("no selection object"))?;
        let range = self
            .document
            .create_range()
            .map_err(|e| MentionError::js("createRange", e))?;
        range
            .set_start(&at.container, at.offset)
            .map_err(|e| MentionError::js("setStart", e))?;
        range.collapse_with_to_start(true);
        sel.remove_all_ranges()
            .map_err(|e| MentionError::js("removeAllRanges", e))?;
        sel.add_range(&range).map_err(|e| MentionError::js("addRange", e))
    }

    fn replace(&self, start: &Boundary<Node>, end: &Boundary<Node>, fragments: &[Fragment]) -> MentionResult<()> {
        let range = self
            .document
            .create_range()
            .map_err(|e| MentionError::js("createRange", e))?;
        range
            .set_start(&start.container, start.offset)
            .map_err(|e| MentionError::js("setStart", e))?;
        range
            .set_end(&end.container, end.offset)
            .map_err(|e| MentionError::js("setEnd", e))?;
        range
            .delete_contents()
            .map_err(|e| MentionError::js("deleteContents", e))?;

        // Find the insertion point without leaving empty text nodes behind.
        let (parent, reference) = match start.container.dyn_ref::<web_sys::Text>() {
            Some(text) => {
                let parent = text
                    .parent_node()
                    .ok_or_else(|| MentionError::dom("text run has no parent"))?;
                let tail = text
                    .split_text(start.offset)
                    .map_err(|e| MentionError::js("splitText", e))?;
                let tail: Node = tail.into();
                if tail.text_content().unwrap_or_default().is_empty() {
                    let next = tail.next_sibling();
                    parent
                        .remove_child(&tail)
                        .map_err(|e| MentionError::js("removeChild", e))?;
                    (parent, next)
                } else {
                    (parent, Some(tail))
                }
            }
            None => {
                let reference = start.container.child_nodes().item(start.offset);
                (start.container.clone(), reference)
            }
        };

        for fragment in fragments {
            let node = self.fragment_node(fragment)?;
            parent
                .insert_before(&node, reference.as_ref())
                .map_err(|e| MentionError::js("insertBefore", e))?;
        }
        Ok(())
    }

    fn set_text(&self, text: &str) {
        self.root
            .set_text_content(if text.is_empty() { None } else { Some(text) });
    }

    fn focus(&self) {
        if let Err(e) = self.root.focus() {
            warn!("{}", MentionError::js("focus", e));
        }
    }

    fn has_focus(&self) -> bool {
        let root: &Node = self.root.as_ref();
        self.document
            .active_element()
            .is_some_and(|active| {
                let active: &Node = active.as_ref();
                root.contains(Some(active))
            })
    }
}

/// The candidate list rendered by the remote session, looked up by id on every
/// read since the session may replace it at any time.
#[derive(Clone, Debug)]
pub struct DomCandidateList {
    document: Document,
    config: MentionInputConfig,
}

impl DomCandidateList {
    pub fn new(document: Document, config: MentionInputConfig) -> Self {
        Self { document, config }
    }

    fn container(&self) -> MentionResult<Element> {
        self.document
            .get_element_by_id(&self.config.dropdown_id)
            .ok_or_else(|| MentionError::missing_dropdown(&self.config.dropdown_id))
    }

    fn item_elements(&self) -> Vec<Element> {
        let Ok(container) = self.container() else {
            return vec![];
        };
        let Ok(list) = container.query_selector_all(&self.config.item_selector) else {
            return vec![];
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|n| n.dyn_into::<Element>().ok())
            .collect()
    }

    /// Index of the item that contains `target`, if `target` is inside the list.
    pub fn index_of(&self, target: &Element) -> Option<usize> {
        let item = target.closest(&self.config.item_selector).ok().flatten()?;
        let container = self.container().ok()?;
        let container: &Node = container.as_ref();
        let item_node: &Node = item.as_ref();
        if !container.contains(Some(item_node)) {
            return None;
        }
        self.item_elements().iter().position(|el| {
            let el: &Node = el.as_ref();
            item_node.is_same_node(Some(el))
        })
    }

    fn set_display(&self, value: Option<&str>) {
        let container = match self.container() {
            Ok(c) => c,
            Err(e) => {
                warn!("{e}");
                return;
            }
        };
        let Some(el) = container.dyn_ref::<HtmlElement>() else {
            return;
        };
        let style = el.style();
        let result = match value {
            Some(v) => style.set_property("display", v),
            None => style.remove_property("display").map(|_| ()),
        };
        if let Err(e) = result {
            warn!("{}", MentionError::js("dropdown display", e));
        }
    }
}

impl CandidateList for DomCandidateList {
    fn items(&self) -> Vec<Option<String>> {
        self.item_elements()
            .iter()
            .map(|el| el.get_attribute(&self.config.contact_attr))
            .collect()
    }

    fn loading(&self) -> bool {
        self.document.get_element_by_id(&self.config.loading_id).is_some()
    }

    fn highlight(&self, index: usize) {
        for (i, el) in self.item_elements().iter().enumerate() {
            let selected = i == index;
            let result = el
                .set_attribute("aria-selected", if selected { "true" } else { "false" })
                .and_then(|_| {
                    if selected {
                        el.set_attribute("data-selected", "")
                    } else {
                        el.remove_attribute("data-selected")
                    }
                });
            if let Err(e) = result {
                warn!("{}", MentionError::js("highlight", e));
                continue;
            }
            if selected {
                let opts = web_sys::ScrollIntoViewOptions::new();
                opts.set_block(web_sys::ScrollLogicalPosition::Nearest);
                el.scroll_into_view_with_scroll_into_view_options(&opts);
            }
        }
    }

    fn hide(&self) {
        self.set_display(Some("none"));
    }

    fn show(&self) {
        self.set_display(None);
    }
}

type FrameHandler = Rc<RefCell<Option<Rc<dyn Fn(TaskId)>>>>;

/// One-shot tasks on the next animation frame.
///
/// A cancelled frame never runs its closure, which stays allocated on the JS
/// side; at most one is outstanding per widget.
#[derive(Clone, Default)]
pub struct FrameScheduler {
    handler: FrameHandler,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the task id whenever a scheduled frame fires.
    pub fn set_handler(&self, handler: impl Fn(TaskId) + 'static) {
        *self.handler.borrow_mut() = Some(Rc::new(handler));
    }

    fn clear_handler(&self) {
        self.handler.borrow_mut().take();
    }
}

impl Scheduler for FrameScheduler {
    fn schedule(&self) -> Option<TaskId> {
        let window = web_sys::window()?;
        let id = Rc::new(Cell::new(0));
        let handler = self.handler.clone();
        let fired = id.clone();
        let cb = Closure::once_into_js(move || {
            let f = handler.borrow().clone();
            if let Some(f) = f {
                f(fired.get());
            }
        });
        match window.request_animation_frame(cb.unchecked_ref()) {
            Ok(tid) => {
                id.set(tid);
                Some(tid)
            }
            Err(e) => {
                warn!("{}", MentionError::js("requestAnimationFrame", e));
                None
            }
        }
    }

    fn cancel(&self, id: TaskId) {
        if let Some(window) = web_sys::window() {
            let _ = window.cancel_animation_frame(id);
        }
    }
}

/// Child-list changes anywhere under `document.body`.
pub struct BodyMutations {
    target: Node,
}

impl BodyMutations {
    pub fn new(document: &Document) -> MentionResult<Self> {
        let body = document.body().ok_or_else(|| MentionError::dom("no body"))?;
        Ok(Self { target: body.into() })
    }
}

/// Disconnects its observer when dropped.
pub struct MutationSubscription {
    observer: web_sys::MutationObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, web_sys::MutationObserver)>,
}

impl Drop for MutationSubscription {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

impl ChangeSource for BodyMutations {
    type Subscription = MutationSubscription;

    fn subscribe(&self, on_change: Box<dyn Fn()>) -> MentionResult<MutationSubscription> {
        let callback = Closure::<dyn FnMut(js_sys::Array, web_sys::MutationObserver)>::new(
            move |_records: js_sys::Array, _observer: web_sys::MutationObserver| on_change(),
        );
        let observer = web_sys::MutationObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|e| MentionError::js("MutationObserver", e))?;
        let init = web_sys::MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer
            .observe_with_options(&self.target, &init)
            .map_err(|e| MentionError::js("observe", e))?;
        Ok(MutationSubscription {
            observer,
            _callback: callback,
        })
    }
}

/// Forwards outbound events to a JS `pushEvent(name, payload)` function.
#[derive(Clone, Debug)]
pub struct JsPushChannel {
    push: js_sys::Function,
}

impl JsPushChannel {
    pub fn new(push: js_sys::Function) -> Self {
        Self { push }
    }
}

impl SyncChannel for JsPushChannel {
    fn push(&self, event: OutboundEvent) {
        let payload = js_sys::JSON::parse(&event.payload().to_string()).unwrap_or(JsValue::NULL);
        if let Err(e) = self
            .push
            .call2(&JsValue::NULL, &JsValue::from_str(event.name()), &payload)
        {
            warn!("{}", MentionError::js(event.name(), e));
        }
    }
}

/// An event listener that removes itself when dropped.
struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

impl Listener {
    fn new(target: &EventTarget, kind: &'static str, f: impl FnMut(web_sys::Event) + 'static) -> MentionResult<Self> {
        let callback = Closure::<dyn FnMut(web_sys::Event)>::new(f);
        target
            .add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
            .map_err(|e| MentionError::js(kind, e))?;
        Ok(Self {
            target: target.clone(),
            kind,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.callback.as_ref().unchecked_ref());
    }
}

pub type DomWidget<C> = MentionWidget<DomSurface, DomCandidateList, C, FrameScheduler>;

/// A widget attached to the page. Dropping it detaches every listener, stops
/// observing the document and cancels any pending refocus.
pub struct MountedMentionInput<C: SyncChannel + 'static> {
    widget: SharedWidget<DomSurface, DomCandidateList, C, FrameScheduler>,
    _listeners: Vec<Listener>,
    _mutations: MutationSubscription,
}

impl<C: SyncChannel + 'static> MountedMentionInput<C> {
    pub fn apply(&self, command: InboundCommand) {
        dispatch(&Rc::downgrade(&self.widget), |w| w.apply(command));
    }

    /// Map a named server event through the configured command names.
    pub fn handle_event(&self, name: &str, payload: &serde_json::Value) {
        let command = InboundCommand::from_event(self.widget.borrow().config(), name, payload);
        if let Some(command) = command {
            self.apply(command);
        }
    }

    pub fn set_disabled(&self, disabled: bool) {
        dispatch(&Rc::downgrade(&self.widget), |w| w.set_disabled(disabled));
    }

    pub fn unmount(self) {}
}

impl<C: SyncChannel + 'static> Drop for MountedMentionInput<C> {
    fn drop(&mut self) {
        if let Ok(mut w) = self.widget.try_borrow_mut() {
            w.teardown();
            w.scheduler().clear_handler();
        }
    }
}

/// Attach a mention widget to `el`.
pub fn mount<C: SyncChannel + 'static>(
    el: HtmlElement,
    config: MentionInputConfig,
    channel: C,
) -> MentionResult<MountedMentionInput<C>> {
    let surface = DomSurface::new(el.clone())?;
    let document = surface.document.clone();
    let candidates = DomCandidateList::new(document.clone(), config.clone());
    let scheduler = FrameScheduler::new();

    let widget: SharedWidget<_, _, C, _> = Rc::new(RefCell::new(MentionWidget::new(
        surface,
        candidates.clone(),
        channel,
        scheduler.clone(),
        config,
    )));
    let weak = Rc::downgrade(&widget);

    {
        let weak = weak.clone();
        scheduler.set_handler(move |id| dispatch(&weak, |w| w.run_deferred(id)));
    }

    let surface_target: &EventTarget = el.as_ref();
    let document_target: &EventTarget = document.as_ref();
    let mut listeners = Vec::with_capacity(5);

    {
        let weak = weak.clone();
        listeners.push(Listener::new(surface_target, "keydown", move |ev| {
            let Some(ev) = ev.dyn_ref::<web_sys::KeyboardEvent>() else {
                return;
            };
            if ev.is_composing() {
                return;
            }
            let (key, shift) = (ev.key(), ev.shift_key());
            let mut outcome = KeyOutcome::PassThrough;
            dispatch(&weak, |w| outcome = w.on_keydown(&key, shift));
            if outcome == KeyOutcome::Handled {
                ev.prevent_default();
            }
        })?);
    }
    {
        let weak = weak.clone();
        listeners.push(Listener::new(surface_target, "input", move |_| {
            dispatch(&weak, |w| w.on_input());
        })?);
    }
    {
        let weak = weak.clone();
        listeners.push(Listener::new(surface_target, "blur", move |_| {
            dispatch(&weak, |w| w.on_blur());
        })?);
    }
    {
        let weak = weak.clone();
        listeners.push(Listener::new(document_target, "selectionchange", move |_| {
            dispatch(&weak, |w| w.on_selection_change());
        })?);
    }
    {
        let weak = weak.clone();
        listeners.push(Listener::new(document_target, "mousedown", move |ev| {
            let Some(target) = ev.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            let Some(index) = candidates.index_of(&target) else {
                return;
            };
            // Keep focus in the surface.
            ev.prevent_default();
            dispatch(&weak, |w| w.on_candidate_click(index));
        })?);
    }

    let mutations = observe_changes(&BodyMutations::new(&document)?, &widget)?;

    Ok(MountedMentionInput {
        widget,
        _listeners: listeners,
        _mutations: mutations,
    })
}
