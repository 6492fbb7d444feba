//! Boundary with the remote session: outbound events, inbound commands and
//! DOM change notifications.

use crate::config::MentionInputConfig;
use crate::error::MentionResult;
use leptos::logging::warn;
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum OutboundEvent {
    InputChange { value: String },
    /// `mentions` is the JSON-serialized mention list.
    SelectMention { mentions: String },
    CloseMentionDropdown,
    SendMessage { content: String, mentions: String },
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn payload(&self) -> serde_json::Value {
        match self {
            OutboundEvent::InputChange { value } => serde_json::json!({ "value": value }),
            OutboundEvent::SelectMention { mentions } => serde_json::json!({ "mentions": mentions }),
            OutboundEvent::CloseMentionDropdown => serde_json::json!({}),
            OutboundEvent::SendMessage { content, mentions } => {
                serde_json::json!({ "content": content, "mentions": mentions })
            }
        }
    }
}

/// Where outbound events go.
pub trait SyncChannel {
    fn push(&self, event: OutboundEvent);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundCommand {
    /// Replace the whole content and put the caret at the end.
    SetContent(String),
    /// Focus the surface with the caret at the end.
    Focus,
}

#[derive(Deserialize, Debug)]
struct SetContentPayload {
    value: String,
}

impl InboundCommand {
    /// Map a named server event onto a command, using the names configured
    /// for this widget. Unknown names yield `None`, and so does a set-content
    /// payload without a string `value`.
    pub fn from_event(config: &MentionInputConfig, name: &str, payload: &serde_json::Value) -> Option<Self> {
        if name == config.set_content_command {
            match SetContentPayload::deserialize(payload) {
                Ok(p) => Some(InboundCommand::SetContent(p.value)),
                Err(e) => {
                    warn!("ignoring {name}: {e}");
                    None
                }
            }
        } else if name == config.focus_command {
            Some(InboundCommand::Focus)
        } else {
            None
        }
    }
}

/// Source of "something in the document changed" notifications.
///
/// The returned subscription stops delivery when dropped.
pub trait ChangeSource {
    type Subscription;

    fn subscribe(&self, on_change: Box<dyn Fn()>) -> MentionResult<Self::Subscription>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_event_names() {
        let v = OutboundEvent::InputChange { value: "x".to_string() };
        assert_eq!(v.name(), "input_change");
        assert_eq!(
            OutboundEvent::SelectMention { mentions: "[]".to_string() }.name(),
            "select_mention"
        );
        assert_eq!(OutboundEvent::CloseMentionDropdown.name(), "close_mention_dropdown");
        assert_eq!(
            OutboundEvent::SendMessage {
                content: String::new(),
                mentions: "[]".to_string()
            }
            .name(),
            "send_message"
        );
    }

    #[test]
    fn test_outbound_payload_shapes() {
        let p = OutboundEvent::SendMessage {
            content: "Hi @Bob ".to_string(),
            mentions: "[]".to_string(),
        }
        .payload();
        assert_eq!(p["content"], "Hi @Bob ");
        assert_eq!(p["mentions"], "[]");
        assert!(OutboundEvent::CloseMentionDropdown
            .payload()
            .as_object()
            .is_some_and(|o| o.is_empty()));
    }

    #[test]
    fn test_inbound_from_event_uses_configured_names() {
        let chat = MentionInputConfig::chat();
        let cmd = InboundCommand::from_event(&chat, "update_chat_input", &serde_json::json!({"value": "hey"}));
        assert_eq!(cmd, Some(InboundCommand::SetContent("hey".to_string())));
        assert_eq!(
            InboundCommand::from_event(&chat, "focus_chat_input", &serde_json::json!({})),
            Some(InboundCommand::Focus)
        );
        assert_eq!(
            InboundCommand::from_event(&chat, "focus_bubble_input", &serde_json::json!({})),
            None
        );

        let bubble = MentionInputConfig::bubble();
        assert_eq!(
            InboundCommand::from_event(&bubble, "update_bubble_input", &serde_json::json!({"value": ""})),
            Some(InboundCommand::SetContent(String::new()))
        );
    }

    #[test]
    fn test_malformed_set_content_is_ignored() {
        let chat = MentionInputConfig::chat();
        for payload in [
            serde_json::json!(null),
            serde_json::json!({"val": "typo"}),
            serde_json::json!({"value": 3}),
            serde_json::json!("hey"),
        ] {
            assert_eq!(
                InboundCommand::from_event(&chat, "update_chat_input", &payload),
                None,
                "payload {payload}"
            );
        }
    }
}
