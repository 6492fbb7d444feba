use crate::config::MentionInputConfig;
use crate::dom::{mount, MountedMentionInput};
use crate::sync::{InboundCommand, OutboundEvent, SyncChannel};
use leptos::html;
use leptos::logging::warn;
use leptos::prelude::*;
use tw_merge::tw_merge;

/// Forwards outbound events to a Leptos callback.
#[derive(Clone, Copy)]
pub struct CallbackChannel(pub Callback<OutboundEvent>);

impl SyncChannel for CallbackChannel {
    fn push(&self, event: OutboundEvent) {
        self.0.run(event);
    }
}

/// Contenteditable chat input with inline @mentions.
///
/// The candidate list is rendered elsewhere on the page (by id, see
/// [`MentionInputConfig`]); this component only drives keyboard selection and
/// token insertion against it.
#[component]
pub fn MentionInput(
    #[prop(into, optional)] class: String,
    #[prop(into, optional)] placeholder: String,
    #[prop(optional)] config: Option<MentionInputConfig>,
    #[prop(into, optional)] disabled: MaybeProp<bool>,
    /// Latest command from the server; each new value is applied once.
    #[prop(into, optional)]
    command: MaybeProp<InboundCommand>,
    #[prop(into)] on_event: Callback<OutboundEvent>,
) -> impl IntoView {
    let surface_ref: NodeRef<html::Div> = NodeRef::new();
    let mounted: StoredValue<Option<MountedMentionInput<CallbackChannel>>, LocalStorage> =
        StoredValue::new_local(None);
    let config = config.unwrap_or_default();

    let merged_class = tw_merge!(
        "border-input flex min-h-9 w-full min-w-0 rounded-md border bg-transparent px-3 py-2 text-base shadow-xs outline-none whitespace-pre-wrap break-words md:text-sm",
        "focus-visible:border-ring focus-visible:ring-ring/50 focus-visible:ring-2",
        "empty:before:content-[attr(data-placeholder)] empty:before:text-muted-foreground",
        "aria-disabled:cursor-not-allowed aria-disabled:opacity-50",
        "[&_[data-mention]]:text-primary [&_[data-mention]]:font-medium",
        class
    );

    // Mount once the node exists.
    Effect::new(move |_| {
        let Some(el) = surface_ref.get() else {
            return;
        };
        if mounted.with_value(|m| m.is_some()) {
            return;
        }
        let mut config = config.clone();
        config.disabled = disabled.get_untracked().unwrap_or(false);
        match mount(el.into(), config, CallbackChannel(on_event)) {
            Ok(m) => mounted.set_value(Some(m)),
            Err(e) => warn!("mention input mount failed: {e}"),
        }
    });

    Effect::new(move |_| {
        let d = disabled.get().unwrap_or(false);
        mounted.with_value(|m| {
            if let Some(m) = m {
                m.set_disabled(d);
            }
        });
    });

    Effect::new(move |_| {
        let Some(cmd) = command.get() else {
            return;
        };
        mounted.with_value(|m| {
            if let Some(m) = m {
                m.apply(cmd);
            }
        });
    });

    on_cleanup(move || {
        mounted.try_update_value(|m| {
            if let Some(m) = m.take() {
                m.unmount();
            }
        });
    });

    view! {
        <div
            node_ref=surface_ref
            data-name="MentionInput"
            contenteditable="true"
            role="textbox"
            aria-multiline="true"
            aria-disabled=move || disabled.get().unwrap_or(false).to_string()
            data-placeholder=placeholder
            class=merged_class
        ></div>
    }
}
