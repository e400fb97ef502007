use nalgebra::{Point3, Vector3};

use crate::bsp::NodeId;

/// How a stack entry came to be pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescentOp {
    /// Ordinary step: the segment was routed to this child alone, or clipped
    /// to the part that touches it.
    Descend,
    /// The same unclipped segment was pushed into both children because the
    /// plane could not separate it. Pruning after a hit stops here.
    Copy,
}

/// One pending node of a descent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackEntry {
    pub node: NodeId,
    /// Segment start inside this node.
    pub a: Point3<f32>,
    /// Segment end inside this node.
    pub b: Point3<f32>,
    /// Sweep fraction of `a`.
    pub t_a: f32,
    /// Sweep fraction of `b`.
    pub t_b: f32,
    /// The sweep starts inside this node; no plane was crossed to reach it.
    pub has_start: bool,
    /// Outward normal of the last plane crossed to enter the node.
    pub normal: Vector3<f32>,
    pub op: DescentOp,
}

impl StackEntry {
    pub(crate) fn root(node: NodeId, a: Point3<f32>, b: Point3<f32>) -> Self {
        Self {
            node,
            a,
            b,
            t_a: 0.0,
            t_b: 1.0,
            has_start: true,
            normal: Vector3::zeros(),
            op: DescentOp::Descend,
        }
    }

    /// The same segment routed to `node`.
    pub(crate) fn routed(&self, node: NodeId, op: DescentOp) -> Self {
        Self { node, op, ..*self }
    }

    /// The part of this entry's segment between local fractions `s0..s1`,
    /// routed to `node`.
    pub(crate) fn clipped(&self, node: NodeId, s0: f32, s1: f32) -> Self {
        let delta = self.b - self.a;
        let dt = self.t_b - self.t_a;
        Self {
            node,
            a: if s0 == 0.0 { self.a } else { self.a + delta * s0 },
            b: if s1 == 1.0 { self.b } else { self.a + delta * s1 },
            t_a: self.t_a + s0 * dt,
            t_b: self.t_a + s1 * dt,
            has_start: self.has_start,
            normal: self.normal,
            op: DescentOp::Descend,
        }
    }

    /// Point of the segment at local fraction `s`.
    #[inline]
    pub fn lerp(&self, s: f32) -> Point3<f32> {
        self.a + (self.b - self.a) * s
    }

    /// Global sweep fraction of local fraction `s`.
    #[inline]
    pub fn global_time(&self, s: f32) -> f32 {
        self.t_a + s * (self.t_b - self.t_a)
    }
}
