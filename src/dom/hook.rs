use super::{mount, JsPushChannel, MountedMentionInput};
use crate::config::MentionInputConfig;
use crate::sync::InboundCommand;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

/// Entry point for a remote session's JS hook object:
///
/// ```js
/// mounted() { this.input = MentionInputHook.mount(this.el, (n, p) => this.pushEvent(n, p)); }
/// destroyed() { this.input.destroy(); }
/// ```
#[wasm_bindgen]
pub struct MentionInputHook {
    mounted: Option<MountedMentionInput<JsPushChannel>>,
}

#[wasm_bindgen]
impl MentionInputHook {
    /// Configuration is read from the element's `data-*` attributes.
    pub fn mount(el: HtmlElement, push_event: js_sys::Function) -> Result<MentionInputHook, JsValue> {
        let config = MentionInputConfig::from_element(&el);
        let mounted = mount(el, config, JsPushChannel::new(push_event))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self {
            mounted: Some(mounted),
        })
    }

    /// Forward a server event; names that are not commands for this widget
    /// are ignored.
    pub fn handle_event(&self, name: &str, payload: JsValue) {
        let Some(m) = &self.mounted else {
            return;
        };
        let payload = js_sys::JSON::stringify(&payload)
            .ok()
            .and_then(|s| serde_json::from_str(&String::from(s)).ok())
            .unwrap_or(serde_json::Value::Null);
        m.handle_event(name, &payload);
    }

    pub fn set_content(&self, value: String) {
        if let Some(m) = &self.mounted {
            m.apply(InboundCommand::SetContent(value));
        }
    }

    pub fn focus(&self) {
        if let Some(m) = &self.mounted {
            m.apply(InboundCommand::Focus);
        }
    }

    pub fn set_disabled(&self, disabled: bool) {
        if let Some(m) = &self.mounted {
            m.set_disabled(disabled);
        }
    }

    pub fn destroy(&mut self) {
        self.mounted.take();
    }
}
