//! Solid-leaf Binary Space Partitioning tree.
//!
//! The tree partitions 3D space with planes into convex leaves. Solid leaves
//! are static world geometry; open leaves hold links to the dynamic entities
//! overlapping them. The tree enables:
//!
//! - Point location ([`BspTree::pos_to_leaf`])
//! - Broad-phase lookups of the leaves a shape touches
//! - Swept collision descents (see [`DescentContext`](crate::DescentContext))
//!
//! # Example
//!
//! ```
//! use bsp_sweep::{BspTree, ConvexHull};
//! use bsp_sweep::bsp::AxialFirst;
//! use nalgebra::Point3;
//!
//! let floor = ConvexHull::from_box(
//!     Point3::new(-10.0, -1.0, -10.0),
//!     Point3::new(10.0, 0.0, 10.0),
//! )
//! .unwrap();
//! let tree = BspTree::build(vec![floor], &AxialFirst);
//!
//! let above = tree.pos_to_leaf(Point3::new(0.0, 2.0, 0.0));
//! assert!(!tree.node(above).leaf().unwrap().is_solid());
//! ```
//!
//! # Architecture
//!
//! - [`BspTree`]: Arena of nodes with root, depth and point location
//! - [`TreeBuilder`]: Validating bottom-up arena assembly
//! - [`BspNode`]: Internal splitting node or [`Leaf`]
//! - [`PlaneSelector`]: Strategy trait for choosing splitting planes
//! - [`LeafVisitor`]: Visitor trait for the leaves a descent reaches

mod node;
mod selector;
mod tree;
mod visitor;

// Re-export main types
pub use node::{BspNode, Leaf, NodeId, NodeKind, SolidLeaf};
pub use selector::{AxialFirst, FirstPlane, PlaneSelector};
pub use tree::{BspTree, TreeBuilder};
pub use visitor::{CollectingVisitor, FnVisitor, LeafVisitor};
