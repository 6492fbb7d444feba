use crate::caret::CaretTracker;
use crate::error::{MentionError, MentionResult};
use crate::models::{Candidate, MentionToken};
use crate::serializer::serialize_units;
use crate::surface::{Fragment, Surface};
use crate::trigger::TriggerSpan;
use crate::walker::{text_range, walk, UnitKind};

/// Replace `span` with a token for `candidate` followed by one space, and put
/// the caret after the space.
///
/// Returns the new caret offset. Nothing is changed when the span no longer
/// matches the surface.
pub fn insert<S: Surface>(surface: &S, span: &TriggerSpan, candidate: &Candidate) -> MentionResult<u32> {
    let units = walk(surface);
    let content = serialize_units(&units);
    if !span.matches(&content) {
        return Err(MentionError::stale_span(span.start, span.end));
    }

    let (start, end) =
        text_range(&units, span.start, span.end).ok_or_else(|| MentionError::stale_span(span.start, span.end))?;

    let token = MentionToken::from(candidate);
    let caret = span.start + token.logical_len() + 1;
    surface.replace(&start, &end, &[Fragment::Token(token), Fragment::Text(" ".to_string())])?;
    CaretTracker::set_offset(surface, caret)?;
    Ok(caret)
}

/// Every token in the surface, in document order.
pub fn extract_all<S: Surface>(surface: &S) -> Vec<MentionToken> {
    walk(surface)
        .into_iter()
        .filter_map(|u| match u.kind {
            UnitKind::Token(t) => Some(t),
            _ => None,
        })
        .collect()
}
