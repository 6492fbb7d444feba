use wasm_bindgen::JsValue;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MentionErrorKind {
    /// A trigger span no longer matches the surface content.
    StaleSpan,
    /// A candidate payload could not be parsed into a [`crate::models::Candidate`].
    MalformedCandidate,
    /// The candidate list or loading indicator is not in the document.
    MissingDropdown,
    /// A DOM call failed.
    Dom,
}

#[derive(Clone, Debug)]
pub struct MentionError {
    pub kind: MentionErrorKind,
    pub message: String,
}

impl std::fmt::Display for MentionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for MentionError {}

impl MentionError {
    pub(crate) fn stale_span(start: u32, end: u32) -> Self {
        Self {
            kind: MentionErrorKind::StaleSpan,
            message: format!("trigger span {start}..{end} no longer matches the surface"),
        }
    }

    pub(crate) fn malformed(e: impl std::fmt::Display) -> Self {
        Self {
            kind: MentionErrorKind::MalformedCandidate,
            message: format!("malformed candidate: {e}"),
        }
    }

    pub(crate) fn missing_dropdown(id: &str) -> Self {
        Self {
            kind: MentionErrorKind::MissingDropdown,
            message: format!("#{id} not found"),
        }
    }

    pub(crate) fn dom(ctx: &str) -> Self {
        Self {
            kind: MentionErrorKind::Dom,
            message: ctx.to_string(),
        }
    }

    pub(crate) fn js(ctx: &str, e: JsValue) -> Self {
        let detail = e
            .as_string()
            .or_else(|| js_sys::JSON::stringify(&e).ok().and_then(|s| s.as_string()))
            .unwrap_or_default();
        Self {
            kind: MentionErrorKind::Dom,
            message: format!("{ctx}: {detail}"),
        }
    }
}

pub type MentionResult<T> = Result<T, MentionError>;
