//! Contenteditable chat input with inline @mention tokens, driven by a remote
//! session that renders the candidate list.

mod text;

pub mod caret;
pub mod component;
pub mod config;
pub mod dom;
pub mod dropdown;
pub mod error;
pub mod focus;
pub mod mentions;
pub mod models;
pub mod serializer;
pub mod surface;
pub mod sync;
pub mod trigger;
pub mod walker;
pub mod widget;

#[cfg(test)]
mod testing;

pub use component::MentionInput;
pub use config::MentionInputConfig;
pub use dom::{mount, MentionInputHook, MountedMentionInput};
pub use error::{MentionError, MentionErrorKind, MentionResult};
pub use models::{Candidate, MentionPayload, MentionToken};
pub use sync::{InboundCommand, OutboundEvent};
pub use widget::{KeyOutcome, MentionWidget};

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
}
