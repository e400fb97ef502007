//! Visitor pattern for the leaves a descent reaches.
//!
//! Visitors allow custom processing of leaves during a descent without
//! coupling the walk to specific use cases.

use super::node::{Leaf, NodeId};

/// Visitor for processing leaves in the order a descent reaches them.
///
/// Implement this trait to define custom behavior per leaf. Common uses
/// include:
/// - Gathering the entities near a moving shape
/// - Debug drawing of the cells a sweep crosses
pub trait LeafVisitor {
    /// Called once for each leaf the descent reaches.
    fn visit(&mut self, id: NodeId, leaf: &Leaf);
}

/// A simple visitor that collects the ids of all visited leaves.
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    collected: Vec<NodeId>,
}

impl CollectingVisitor {
    /// Creates a new empty collecting visitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected leaf ids.
    pub fn into_leaves(self) -> Vec<NodeId> {
        self.collected
    }

    /// Returns a reference to the collected leaf ids.
    pub fn leaves(&self) -> &[NodeId] {
        &self.collected
    }
}

impl LeafVisitor for CollectingVisitor {
    fn visit(&mut self, id: NodeId, _leaf: &Leaf) {
        self.collected.push(id);
    }
}

/// A visitor that calls a closure for each leaf.
pub struct FnVisitor<F>
where
    F: FnMut(NodeId, &Leaf),
{
    func: F,
}

impl<F> FnVisitor<F>
where
    F: FnMut(NodeId, &Leaf),
{
    /// Creates a new visitor from a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> LeafVisitor for FnVisitor<F>
where
    F: FnMut(NodeId, &Leaf),
{
    fn visit(&mut self, id: NodeId, leaf: &Leaf) {
        (self.func)(id, leaf);
    }
}
