//! The mention input: reconciles keystrokes, DOM change notifications and
//! remote commands against one editable surface.

use crate::caret::CaretTracker;
use crate::config::MentionInputConfig;
use crate::dropdown::{CandidateList, DropdownAction, DropdownController, NavKey};
use crate::error::MentionResult;
use crate::focus::{FocusGuardian, Scheduler, TaskId};
use crate::mentions;
use crate::models::{mentions_json, Candidate};
use crate::serializer::serialize_units;
use crate::surface::Surface;
use crate::sync::{ChangeSource, InboundCommand, OutboundEvent, SyncChannel};
use crate::trigger::{detect_excluding, TriggerSpan};
use crate::walker::{token_spans, walk};
use leptos::logging::warn;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Whether the host should suppress the browser's default for a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    PassThrough,
}

/// Per-instance widget state. Created on mount, dropped on unmount.
pub struct MentionWidget<S, L, C, T>
where
    S: Surface,
    L: CandidateList,
    C: SyncChannel,
    T: Scheduler,
{
    surface: S,
    candidates: L,
    channel: C,
    scheduler: T,
    config: MentionInputConfig,
    caret: CaretTracker,
    dropdown: DropdownController,
    guardian: FocusGuardian,
    /// Span found by the most recent input event.
    trigger: Option<TriggerSpan>,
}

impl<S, L, C, T> MentionWidget<S, L, C, T>
where
    S: Surface,
    L: CandidateList,
    C: SyncChannel,
    T: Scheduler,
{
    pub fn new(surface: S, candidates: L, channel: C, scheduler: T, config: MentionInputConfig) -> Self {
        Self {
            surface,
            candidates,
            channel,
            scheduler,
            config,
            caret: CaretTracker::new(),
            dropdown: DropdownController::new(),
            guardian: FocusGuardian::new(),
            trigger: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn candidates(&self) -> &L {
        &self.candidates
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn scheduler(&self) -> &T {
        &self.scheduler
    }

    pub fn config(&self) -> &MentionInputConfig {
        &self.config
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.config.disabled = disabled;
    }

    pub fn dropdown(&self) -> &DropdownController {
        &self.dropdown
    }

    pub fn trigger(&self) -> Option<&TriggerSpan> {
        self.trigger.as_ref()
    }

    pub fn last_caret(&self) -> Option<u32> {
        self.caret.last_known()
    }

    pub fn pending_refocus(&self) -> Option<TaskId> {
        self.guardian.pending()
    }

    fn guard_active(&self) -> bool {
        self.dropdown.is_open() || self.candidates.loading()
    }

    /// The user edited the surface.
    pub fn on_input(&mut self) {
        let units = walk(&self.surface);
        let content = serialize_units(&units);
        self.caret.cache(&self.surface);

        self.channel.push(OutboundEvent::InputChange {
            value: content.clone(),
        });

        let caret = CaretTracker::offset(&self.surface).or(self.caret.last_known());
        self.trigger = caret.and_then(|c| detect_excluding(&content, c, &token_spans(&units)));

        match self.trigger {
            Some(_) => self.dropdown.rearm(),
            None if self.dropdown.is_open() => {
                self.dropdown.close();
                self.candidates.hide();
            }
            None => {}
        }
    }

    /// A key went down in the surface.
    pub fn on_keydown(&mut self, key: &str, shift: bool) -> KeyOutcome {
        if let Ok(nav) = key.parse::<NavKey>() {
            let live = self.candidates.items();
            match self.dropdown.on_key(nav, live.len()) {
                DropdownAction::Select(i) => {
                    self.candidates.highlight(i);
                    return KeyOutcome::Handled;
                }
                DropdownAction::Commit(i) => {
                    self.commit(&live, i);
                    return KeyOutcome::Handled;
                }
                DropdownAction::Dismiss => {
                    self.dismiss();
                    return KeyOutcome::Handled;
                }
                DropdownAction::Ignore => {}
            }
        }

        if key == "Enter" && !shift {
            self.send();
            return KeyOutcome::Handled;
        }

        KeyOutcome::PassThrough
    }

    /// A candidate item was clicked.
    pub fn on_candidate_click(&mut self, index: usize) {
        let live = self.candidates.items();
        if let DropdownAction::Commit(i) = self.dropdown.on_click(index, live.len()) {
            self.commit(&live, i);
        }
    }

    /// The document selection moved.
    pub fn on_selection_change(&mut self) {
        if self.caret.cache(&self.surface) {
            return;
        }
        let active = self.guard_active();
        let focused = self.surface.has_focus();
        self.guardian.check(&self.scheduler, active, focused, false);
    }

    /// The surface lost focus.
    pub fn on_blur(&mut self) {
        let active = self.guard_active();
        self.guardian.check(&self.scheduler, active, false, false);
    }

    /// Something in the document changed; the candidate list may have been
    /// patched.
    pub fn on_dom_changed(&mut self) {
        let live = self.candidates.items();
        if let Some(i) = self.dropdown.on_list_changed(&live) {
            self.candidates.show();
            self.candidates.highlight(i);
        }

        let active = self.guard_active();
        let focused = self.surface.has_focus();
        let inside = CaretTracker::offset(&self.surface).is_some();
        self.guardian.check(&self.scheduler, active, focused, inside);
    }

    /// A scheduled task fired.
    pub fn run_deferred(&mut self, id: TaskId) {
        if !self.guardian.fire(id) {
            return;
        }
        self.surface.focus();
        if let Err(e) = self.caret.restore(&self.surface) {
            warn!("caret restore failed: {e}");
        }
    }

    /// Apply a command from the remote session.
    pub fn apply(&mut self, command: InboundCommand) {
        let result = match command {
            InboundCommand::SetContent(text) => {
                self.surface.set_text(&text);
                self.trigger = None;
                self.focus_at_end()
            }
            InboundCommand::Focus => self.focus_at_end(),
        };
        if let Err(e) = result {
            warn!("inbound command failed: {e}");
        }
    }

    /// Release everything that could outlive the mount.
    pub fn teardown(&mut self) {
        self.guardian.cancel(&self.scheduler);
        self.dropdown.close();
        self.caret.clear();
        self.trigger = None;
    }

    fn focus_at_end(&mut self) -> MentionResult<()> {
        self.surface.focus();
        self.caret.move_to_end(&self.surface)
    }

    fn commit(&mut self, live: &[Option<String>], index: usize) {
        self.candidates.hide();

        let Some(raw) = live.get(index).cloned().flatten() else {
            warn!("candidate {index} has no {}", self.config.contact_attr);
            return;
        };
        let candidate = match Candidate::parse(&raw) {
            Ok(c) => c,
            Err(e) => {
                warn!("{e}");
                return;
            }
        };
        let Some(span) = self.trigger.take() else {
            warn!("no active @query to replace");
            return;
        };

        match mentions::insert(&self.surface, &span, &candidate) {
            Ok(caret) => {
                self.caret.remember(caret);
                let units = walk(&self.surface);
                self.channel.push(OutboundEvent::InputChange {
                    value: serialize_units(&units),
                });
                let tokens = mentions::extract_all(&self.surface);
                self.channel.push(OutboundEvent::SelectMention {
                    mentions: mentions_json(&tokens),
                });
            }
            Err(e) => warn!("mention insert aborted: {e}"),
        }
    }

    fn dismiss(&mut self) {
        self.candidates.hide();
        self.trigger = None;
        if !self.surface.has_focus() {
            self.surface.focus();
            if let Err(e) = self.caret.restore(&self.surface) {
                warn!("caret restore failed: {e}");
            }
        }
        self.channel.push(OutboundEvent::CloseMentionDropdown);
    }

    fn send(&mut self) {
        if self.config.disabled {
            return;
        }
        let units = walk(&self.surface);
        let content = serialize_units(&units);
        let tokens = mentions::extract_all(&self.surface);
        if content.trim().is_empty() && tokens.is_empty() {
            return;
        }
        self.channel.push(OutboundEvent::SendMessage {
            content,
            mentions: mentions_json(&tokens),
        });
    }
}

pub type SharedWidget<S, L, C, T> = Rc<RefCell<MentionWidget<S, L, C, T>>>;

/// Run `f` against the widget if it is still alive and not already inside a
/// handler. Events raised synchronously by the widget's own DOM calls are
/// dropped here.
pub fn dispatch<W>(widget: &Weak<RefCell<W>>, f: impl FnOnce(&mut W)) {
    let Some(widget) = widget.upgrade() else {
        return;
    };
    let Ok(mut w) = widget.try_borrow_mut() else {
        return;
    };
    f(&mut w);
}

/// Route change notifications from `source` to [`MentionWidget::on_dom_changed`].
pub fn observe_changes<S, L, C, T, Src>(
    source: &Src,
    widget: &SharedWidget<S, L, C, T>,
) -> MentionResult<Src::Subscription>
where
    S: Surface + 'static,
    L: CandidateList + 'static,
    C: SyncChannel + 'static,
    T: Scheduler + 'static,
    Src: ChangeSource,
{
    let weak = Rc::downgrade(widget);
    source.subscribe(Box::new(move || {
        dispatch(&weak, |w| w.on_dom_changed());
    }))
}
