//! Construction and validation errors.
//!
//! Queries never fail: a sweep that touches nothing is `Contact::None`. These
//! errors only come out of building trees and hulls, or validating a descent
//! context against a tree before use.

use crate::bsp::NodeId;

/// Problems found while assembling a tree arena.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// A node id does not refer to a node of this builder.
    #[error("node {0:?} does not exist in this tree")]
    UnknownNode(NodeId),
    /// The same node is used as a child of more than one internal node.
    #[error("node {child:?} has two parents ({first:?} and {second:?})")]
    SharedChild {
        child: NodeId,
        first: NodeId,
        second: NodeId,
    },
    /// The chosen root is also the child of another node.
    #[error("root {0:?} is referenced as a child")]
    RootHasParent(NodeId),
    /// A node was added but cannot be reached from the root.
    #[error("node {0:?} is not reachable from the root")]
    Unreachable(NodeId),
    /// A splitting plane has a non-finite normal or offset.
    #[error("node {0:?} has a non-finite splitting plane")]
    NonFinitePlane(NodeId),
}

/// Problems found while building a convex hull.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HullError {
    /// Fewer than four bounding planes were supplied.
    #[error("a closed hull needs at least 4 planes, got {0}")]
    TooFewPlanes(usize),
    /// The planes do not enclose a bounded, non-empty volume.
    #[error("planes do not enclose a bounded volume ({vertices} vertices found)")]
    Unbounded { vertices: usize },
    /// A cuboid half-extent is negative or not finite.
    #[error("invalid half extent on axis {0}")]
    InvalidExtent(usize),
}

/// Problems with a descent context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SweepError {
    /// The context's stack cannot hold a full descent of the tree.
    #[error("descent stack holds {capacity} entries but the tree needs {required}")]
    StackTooShallow { required: usize, capacity: usize },
}
