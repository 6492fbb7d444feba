//! The editable surface as seen by the widget.
//!
//! [`Surface`] is implemented over `web_sys` nodes in [`crate::dom`] and over
//! an in-memory tree in tests. Offsets in [`Boundary`] follow DOM `Range`
//! rules: UTF-16 units for text nodes, child indices for element nodes.

use crate::error::MentionResult;
use crate::models::MentionToken;

/// How the tree walker treats a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeClass<N> {
    Text(String),
    /// An atomic mention token. Its children are never visited.
    Token(MentionToken),
    /// A hard line break (`<br>`). Counts as one `\n`, except as the last
    /// child of its parent, where it only holds an empty line open.
    Break,
    /// A block element (`<div>`, `<p>`, ...). Starts a new line unless it is
    /// the first child of its parent.
    Block(Vec<N>),
    /// Any other element. Its children are visited in order.
    Element(Vec<N>),
}

impl<N> NodeClass<N> {
    pub fn into_children(self) -> Option<Vec<N>> {
        match self {
            NodeClass::Block(children) | NodeClass::Element(children) => Some(children),
            _ => None,
        }
    }
}

/// A DOM-style boundary point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Boundary<N> {
    pub container: N,
    pub offset: u32,
}

impl<N> Boundary<N> {
    pub fn new(container: N, offset: u32) -> Self {
        Self { container, offset }
    }
}

/// Nodes the widget inserts into the surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Token(MentionToken),
}

pub trait Surface {
    type Node: Clone + PartialEq;

    fn root(&self) -> Self::Node;

    fn classify(&self, node: &Self::Node) -> NodeClass<Self::Node>;

    /// Inclusive: a node contains itself.
    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool;

    /// Anchor of the current selection, wherever it is in the document.
    fn selection(&self) -> Option<Boundary<Self::Node>>;

    /// Collapse the selection to `at`.
    fn select(&self, at: &Boundary<Self::Node>) -> MentionResult<()>;

    /// Delete everything between `start` and `end`, then insert `fragments`
    /// in order at `start`.
    fn replace(
        &self,
        start: &Boundary<Self::Node>,
        end: &Boundary<Self::Node>,
        fragments: &[Fragment],
    ) -> MentionResult<()>;

    /// Replace all children with a single text run (none when `text` is empty).
    fn set_text(&self, text: &str);

    fn focus(&self);

    fn has_focus(&self) -> bool;
}
