//! Incremental, stack-based descent of a tree along a sweep.
//!
//! A descent yields, one leaf at a time, the leaves a moving point, sphere or
//! hull enters between two positions. Children are pushed so that the side the
//! sweep reaches first is examined first, which lets sweep tests stop as soon
//! as no earlier contact is possible.
//!
//! When a plane cannot separate a sweep (a line lying in the plane, or a shape
//! straddling it for the whole span) both children receive the unclipped
//! segment tagged [`DescentOp::Copy`]. Pruning after a confirmed hit never
//! discards past such an entry.

mod context;
mod stack;

pub use context::DescentContext;
pub use stack::{DescentOp, StackEntry};
