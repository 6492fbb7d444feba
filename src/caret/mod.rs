use crate::error::MentionResult;
use crate::surface::Surface;
use crate::walker::{boundary_at, offset_of, total_len, walk};

/// Converts between the live selection and logical offsets, and remembers the
/// last offset seen inside the surface.
#[derive(Clone, Debug, Default)]
pub struct CaretTracker {
    last_known: Option<u32>,
}

impl CaretTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_known(&self) -> Option<u32> {
        self.last_known
    }

    /// Offset of the selection anchor, or `None` when it is outside the surface.
    pub fn offset<S: Surface>(surface: &S) -> Option<u32> {
        let at = surface.selection()?;
        offset_of(surface, &at)
    }

    /// Collapse the selection at `offset`, clamped to the end of the content.
    pub fn set_offset<S: Surface>(surface: &S, offset: u32) -> MentionResult<()> {
        surface.select(&boundary_at(surface, offset))
    }

    /// Record the current offset. Returns whether the selection was inside
    /// the surface.
    pub fn cache<S: Surface>(&mut self, surface: &S) -> bool {
        match Self::offset(surface) {
            Some(o) => {
                self.last_known = Some(o);
                true
            }
            None => false,
        }
    }

    pub fn remember(&mut self, offset: u32) {
        self.last_known = Some(offset);
    }

    /// Put the caret back where it was last seen, or at the end.
    pub fn restore<S: Surface>(&mut self, surface: &S) -> MentionResult<()> {
        let end = total_len(&walk(surface));
        let target = self.last_known.unwrap_or(end).min(end);
        Self::set_offset(surface, target)?;
        self.last_known = Some(target);
        Ok(())
    }

    /// Move the caret to the end of the content and remember it there.
    pub fn move_to_end<S: Surface>(&mut self, surface: &S) -> MentionResult<()> {
        let end = total_len(&walk(surface));
        Self::set_offset(surface, end)?;
        self.last_known = Some(end);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.last_known = None;
    }
}
