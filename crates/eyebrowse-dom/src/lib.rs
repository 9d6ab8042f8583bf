//! EyeBrowse DOM - Document Object Model
//!
//! Arena-backed document tree that the reconciliation engine mutates.
//! Nodes are addressed by [`NodeId`]; detached nodes stay in the arena so
//! callers holding an id can still ask whether it is connected.

mod classlist;
mod document;
mod node;
mod observer;
mod selector;
mod style;
mod tree;

pub use classlist::ClassList;
pub use document::{Document, Viewport};
pub use node::{Attribute, ElementData, Node, NodeData};
pub use observer::{
    MutationObserverInit, MutationObserverManager, MutationRecord, MutationType, ObserverId,
};
pub use selector::{Selector, SelectorList, Specificity};
pub use style::{StyleDeclaration, StyleProperty};
pub use tree::{Children, DomTree};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this points at a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NotFound(NodeId),

    #[error("Hierarchy request error: cannot insert {child} under {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Unsupported selector: {0}")]
    InvalidSelector(String),
}
