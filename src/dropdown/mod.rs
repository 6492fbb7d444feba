//! Keyboard selection over the externally rendered candidate list.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Read-only view of the candidate list rendered by the remote session.
pub trait CandidateList {
    /// Raw `data-contact` payload of each selectable item, in order. A missing
    /// container reads as an empty list.
    fn items(&self) -> Vec<Option<String>>;

    /// Whether the loading indicator is present.
    fn loading(&self) -> bool;

    /// Mark exactly the item at `index` as selected.
    fn highlight(&self, index: usize);

    /// Hide the list until it changes again.
    fn hide(&self);

    /// Undo [`CandidateList::hide`].
    fn show(&self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::EnumString, strum::Display)]
pub enum NavKey {
    ArrowUp,
    ArrowDown,
    Enter,
    Escape,
    Tab,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropdownState {
    Closed,
    Open { selected: usize, count: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropdownAction {
    /// The key is not for the dropdown.
    Ignore,
    /// Selection moved to this index.
    Select(usize),
    /// Insert the candidate at this index.
    Commit(usize),
    /// Close without inserting.
    Dismiss,
}

#[derive(Clone, Debug)]
pub struct DropdownController {
    state: DropdownState,
    /// Fingerprint of the list last seen, so unrelated DOM churn neither
    /// resets the selection nor reopens a dismissed list.
    seen: Option<u64>,
}

impl Default for DropdownController {
    fn default() -> Self {
        Self::new()
    }
}

fn fingerprint<K: Hash>(items: &[K]) -> u64 {
    let mut hasher = DefaultHasher::new();
    items.hash(&mut hasher);
    hasher.finish()
}

impl DropdownController {
    pub fn new() -> Self {
        Self {
            state: DropdownState::Closed,
            seen: None,
        }
    }

    pub fn state(&self) -> DropdownState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, DropdownState::Open { .. })
    }

    pub fn selected(&self) -> Option<usize> {
        match self.state {
            DropdownState::Open { selected, .. } => Some(selected),
            DropdownState::Closed => None,
        }
    }

    /// The candidate list changed. Returns the index to mark selected when the
    /// list (re)opens.
    pub fn on_list_changed<K: Hash>(&mut self, items: &[K]) -> Option<usize> {
        if items.is_empty() {
            self.state = DropdownState::Closed;
            self.seen = None;
            return None;
        }

        let fp = fingerprint(items);
        if self.seen == Some(fp) {
            return None;
        }
        self.seen = Some(fp);
        self.state = DropdownState::Open {
            selected: 0,
            count: items.len(),
        };
        Some(0)
    }

    /// Forget the last list so the next non-empty notification opens it, even
    /// if it carries the same candidates as before.
    pub fn rearm(&mut self) {
        if !self.is_open() {
            self.seen = None;
        }
    }

    pub fn close(&mut self) {
        self.state = DropdownState::Closed;
    }

    /// Handle a navigation key. `live_count` is the number of items in the
    /// document right now, which may differ from what was last observed.
    pub fn on_key(&mut self, key: NavKey, live_count: usize) -> DropdownAction {
        let DropdownState::Open { selected, .. } = self.state else {
            return DropdownAction::Ignore;
        };
        if live_count == 0 {
            self.state = DropdownState::Closed;
            return DropdownAction::Ignore;
        }

        let n = live_count;
        let selected = selected.min(n - 1);
        match key {
            NavKey::ArrowDown => {
                let next = (selected + 1) % n;
                self.state = DropdownState::Open { selected: next, count: n };
                DropdownAction::Select(next)
            }
            NavKey::ArrowUp => {
                let next = (selected + n - 1) % n;
                self.state = DropdownState::Open { selected: next, count: n };
                DropdownAction::Select(next)
            }
            NavKey::Enter => {
                self.state = DropdownState::Closed;
                DropdownAction::Commit(selected)
            }
            NavKey::Escape | NavKey::Tab => {
                self.state = DropdownState::Closed;
                DropdownAction::Dismiss
            }
        }
    }

    /// A candidate was clicked.
    pub fn on_click(&mut self, index: usize, live_count: usize) -> DropdownAction {
        if index >= live_count {
            return DropdownAction::Ignore;
        }
        self.state = DropdownState::Closed;
        DropdownAction::Commit(index)
    }
}
