use serde::{Deserialize, Serialize};

/// Ids and event names one widget instance uses to find its collaborators.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MentionInputConfig {
    /// Id of the candidate list container.
    pub dropdown_id: String,
    /// Id of the loading indicator shown while candidates are fetched.
    pub loading_id: String,
    /// Selector matching selectable items inside the container.
    pub item_selector: String,
    /// Attribute holding the serialized candidate on each item.
    pub contact_attr: String,
    /// Server event that focuses the surface.
    pub focus_command: String,
    /// Server event that replaces the content.
    pub set_content_command: String,
    #[serde(default)]
    pub disabled: bool,
}

impl MentionInputConfig {
    /// Main chat panel input.
    pub fn chat() -> Self {
        Self {
            dropdown_id: "mention-dropdown".to_string(),
            loading_id: "mention-loading".to_string(),
            item_selector: "[data-mention-item]".to_string(),
            contact_attr: "data-contact".to_string(),
            focus_command: "focus_chat_input".to_string(),
            set_content_command: "update_chat_input".to_string(),
            disabled: false,
        }
    }

    /// Floating chat bubble input.
    pub fn bubble() -> Self {
        Self {
            dropdown_id: "bubble-mention-dropdown".to_string(),
            loading_id: "bubble-mention-loading".to_string(),
            focus_command: "focus_bubble_input".to_string(),
            set_content_command: "update_bubble_input".to_string(),
            ..Self::chat()
        }
    }

    pub fn for_variant(variant: &str) -> Self {
        match variant.trim() {
            "bubble" => Self::bubble(),
            _ => Self::chat(),
        }
    }

    /// Read overrides from the surface element's `data-*` attributes.
    ///
    /// `data-variant` picks the preset; `data-dropdown-id`, `data-loading-id`,
    /// `data-focus-event` and `data-update-event` override single fields;
    /// `aria-disabled="true"` disables sending.
    pub fn from_element(el: &web_sys::Element) -> Self {
        let attr = |name: &str| el.get_attribute(name).filter(|v| !v.trim().is_empty());

        let mut config = attr("data-variant")
            .map(|v| Self::for_variant(&v))
            .unwrap_or_else(Self::chat);

        if let Some(v) = attr("data-dropdown-id") {
            config.dropdown_id = v;
        }
        if let Some(v) = attr("data-loading-id") {
            config.loading_id = v;
        }
        if let Some(v) = attr("data-focus-event") {
            config.focus_command = v;
        }
        if let Some(v) = attr("data-update-event") {
            config.set_content_command = v;
        }
        config.disabled = attr("aria-disabled").is_some_and(|v| v == "true");

        config
    }
}

impl Default for MentionInputConfig {
    fn default() -> Self {
        Self::chat()
    }
}
