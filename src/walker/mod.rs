//! Document-order traversal of the editable surface.
//!
//! All offset arithmetic goes through here. A text node contributes its
//! UTF-16 length; a mention token contributes `len("@" + display_name)` as a
//! single unit and is never entered. A `<br>` and the start of every block
//! after the first in its parent contribute one `\n`.

use crate::models::MentionToken;
use crate::surface::{Boundary, NodeClass, Surface};
use crate::text::utf16_len;
use std::ops::Range;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnitKind {
    Text(String),
    Token(MentionToken),
    /// A `<br>`.
    Break,
    /// The line break in front of a block element; `node` is the block.
    BlockStart,
}

/// One leaf of the surface with its logical position.
#[derive(Clone, Debug)]
pub struct Unit<N> {
    pub node: N,
    pub parent: N,
    /// Index of `node` among `parent`'s children.
    pub index: u32,
    pub start: u32,
    pub kind: UnitKind,
}

impl<N> Unit<N> {
    pub fn len(&self) -> u32 {
        match &self.kind {
            UnitKind::Text(s) => utf16_len(s),
            UnitKind::Token(t) => t.logical_len(),
            UnitKind::Break | UnitKind::BlockStart => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn end(&self) -> u32 {
        self.start + self.len()
    }

    pub fn span(&self) -> Range<u32> {
        self.start..self.end()
    }
}

/// Flatten the surface into units, in document order.
pub fn walk<S: Surface>(surface: &S) -> Vec<Unit<S::Node>> {
    let mut out = Vec::new();
    let root = surface.root();
    if let Some(children) = surface.classify(&root).into_children() {
        walk_children(surface, &root, &children, 0, &mut out);
    }
    out
}

fn walk_children<S: Surface>(
    surface: &S,
    parent: &S::Node,
    children: &[S::Node],
    mut acc: u32,
    out: &mut Vec<Unit<S::Node>>,
) -> u32 {
    let last = children.len().saturating_sub(1);
    for (i, child) in children.iter().enumerate() {
        let kind = match surface.classify(child) {
            NodeClass::Text(s) => UnitKind::Text(s),
            NodeClass::Token(t) => UnitKind::Token(t),
            NodeClass::Break if i == last => continue,
            NodeClass::Break => UnitKind::Break,
            NodeClass::Element(grandchildren) => {
                acc = walk_children(surface, child, &grandchildren, acc, out);
                continue;
            }
            NodeClass::Block(grandchildren) => {
                if i > 0 {
                    out.push(Unit {
                        node: child.clone(),
                        parent: parent.clone(),
                        index: i as u32,
                        start: acc,
                        kind: UnitKind::BlockStart,
                    });
                    acc += 1;
                }
                acc = walk_children(surface, child, &grandchildren, acc, out);
                continue;
            }
        };
        let unit = Unit {
            node: child.clone(),
            parent: parent.clone(),
            index: i as u32,
            start: acc,
            kind,
        };
        acc = unit.end();
        out.push(unit);
    }
    acc
}

pub fn total_len<N>(units: &[Unit<N>]) -> u32 {
    units.last().map(Unit::end).unwrap_or(0)
}

/// Spans covered by committed tokens.
pub fn token_spans<N>(units: &[Unit<N>]) -> Vec<Range<u32>> {
    units
        .iter()
        .filter(|u| matches!(u.kind, UnitKind::Token(_)))
        .map(Unit::span)
        .collect()
}

/// Map a logical offset to a boundary point.
///
/// Offsets falling strictly inside a token snap to just after it; offsets past
/// the end clamp to the end of the surface.
pub fn boundary_at<S: Surface>(surface: &S, offset: u32) -> Boundary<S::Node> {
    let units = walk(surface);
    for u in &units {
        match &u.kind {
            UnitKind::Text(_) if offset <= u.end() => {
                return Boundary::new(u.node.clone(), offset.saturating_sub(u.start));
            }
            UnitKind::Text(_) => {}
            _ if offset <= u.start => {
                return Boundary::new(u.parent.clone(), u.index);
            }
            UnitKind::BlockStart if offset <= u.end() => {
                return Boundary::new(u.node.clone(), 0);
            }
            _ if offset <= u.end() => {
                return Boundary::new(u.parent.clone(), u.index + 1);
            }
            _ => {}
        }
    }
    end_boundary(surface)
}

pub fn end_boundary<S: Surface>(surface: &S) -> Boundary<S::Node> {
    let root = surface.root();
    let count = surface
        .classify(&root)
        .into_children()
        .map_or(0, |children| children.len() as u32);
    Boundary::new(root, count)
}

/// Map a boundary point back to a logical offset.
///
/// Returns `None` when the boundary is outside the surface. A boundary inside
/// a token resolves to the end of that token.
pub fn offset_of<S: Surface>(surface: &S, at: &Boundary<S::Node>) -> Option<u32> {
    let root = surface.root();
    if !surface.contains(&root, &at.container) {
        return None;
    }
    Some(seek(surface, &root, at, 0))
}

/// Offset of `at` given that `node` starts at `acc` and contains `at`.
fn seek<S: Surface>(surface: &S, node: &S::Node, at: &Boundary<S::Node>, acc: u32) -> u32 {
    let children = match surface.classify(node) {
        NodeClass::Text(s) => return acc + at.offset.min(utf16_len(&s)),
        NodeClass::Token(t) => {
            return if *node == at.container && at.offset == 0 {
                acc
            } else {
                acc + t.logical_len()
            };
        }
        NodeClass::Break => return acc,
        NodeClass::Block(children) | NodeClass::Element(children) => children,
    };

    if *node == at.container {
        let upto = (at.offset as usize).min(children.len());
        return acc + (0..upto).map(|i| width(surface, &children, i)).sum::<u32>();
    }

    let mut a = acc;
    for (i, child) in children.iter().enumerate() {
        if surface.contains(child, &at.container) {
            return seek(surface, child, at, a + lead(surface, &children, i));
        }
        a += width(surface, &children, i);
    }
    a
}

/// Line break contributed in front of `children[i]`'s content.
fn lead<S: Surface>(surface: &S, children: &[S::Node], i: usize) -> u32 {
    match surface.classify(&children[i]) {
        NodeClass::Block(_) if i > 0 => 1,
        _ => 0,
    }
}

/// Logical width of `children[i]`, following the same rules as [`walk`].
fn width<S: Surface>(surface: &S, children: &[S::Node], i: usize) -> u32 {
    match surface.classify(&children[i]) {
        NodeClass::Text(s) => utf16_len(&s),
        NodeClass::Token(t) => t.logical_len(),
        NodeClass::Break => u32::from(i + 1 < children.len()),
        NodeClass::Element(grandchildren) => inner_width(surface, &grandchildren),
        NodeClass::Block(grandchildren) => u32::from(i > 0) + inner_width(surface, &grandchildren),
    }
}

fn inner_width<S: Surface>(surface: &S, children: &[S::Node]) -> u32 {
    (0..children.len()).map(|i| width(surface, children, i)).sum()
}

/// Resolve `start..end` to boundaries inside text runs, for replacement.
///
/// Fails when either end lands outside a text run, or a token or line break
/// overlaps the span.
pub fn text_range<N: Clone>(units: &[Unit<N>], start: u32, end: u32) -> Option<(Boundary<N>, Boundary<N>)> {
    if start >= end || end > total_len(units) {
        return None;
    }

    let overlaps_atom = units
        .iter()
        .any(|u| !matches!(u.kind, UnitKind::Text(_)) && u.start < end && u.end() > start);
    if overlaps_atom {
        return None;
    }

    let is_text = |u: &&Unit<N>| matches!(u.kind, UnitKind::Text(_));
    let first = units
        .iter()
        .filter(is_text)
        .find(|u| u.start <= start && start < u.end())?;
    let last = units
        .iter()
        .filter(is_text)
        .find(|u| u.start < end && end <= u.end())?;

    Some((
        Boundary::new(first.node.clone(), start - first.start),
        Boundary::new(last.node.clone(), end - last.start),
    ))
}
