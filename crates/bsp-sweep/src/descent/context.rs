use nalgebra::{Point3, UnitQuaternion};

use crate::bsp::{BspTree, LeafVisitor, NodeKind};
use crate::error::SweepError;
use crate::{ConvexHull, EntityId, SweepConfig, SweepShape, PLANE_EPSILON};

use super::stack::{DescentOp, StackEntry};

/// Reusable state for descending a tree with a sweep.
///
/// Holds the fixed-capacity descent stack and the per-query entity marks.
/// A context is owned by one thread at a time; sweeps on other threads use
/// their own context against the same shared tree.
///
/// The walker never looks at leaves itself. After [`begin`](Self::begin),
/// the caller inspects [`top`](Self::top): leaves are handled and popped by
/// the caller, internal nodes are expanded by one of the descend calls.
///
/// ```
/// use bsp_sweep::{BspTree, DescentContext};
/// use nalgebra::Point3;
///
/// let tree = BspTree::empty();
/// let mut ctx = DescentContext::for_tree(&tree);
/// ctx.begin(&tree, Point3::origin(), Point3::new(1.0, 0.0, 0.0));
/// assert_eq!(ctx.top().unwrap().node, tree.root());
/// ```
#[derive(Debug, Clone)]
pub struct DescentContext {
    stack: Vec<StackEntry>,
    capacity: usize,
    plane_epsilon: f32,
    start: Point3<f32>,
    end: Point3<f32>,
    epoch: u64,
    marks: Vec<u64>,
}

impl DescentContext {
    /// A context with a fixed stack capacity.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(SweepConfig::MIN_STACK_CAPACITY);
        Self {
            stack: Vec::with_capacity(capacity),
            capacity,
            plane_epsilon: PLANE_EPSILON,
            start: Point3::origin(),
            end: Point3::origin(),
            epoch: 0,
            marks: Vec::new(),
        }
    }

    /// A context configured by `config`, sized for `tree` unless the
    /// configuration fixes a capacity.
    pub fn with_config(config: &SweepConfig, tree: &BspTree) -> Self {
        let capacity = config
            .stack_capacity
            .unwrap_or_else(|| tree.required_stack());
        let mut ctx = Self::new(capacity);
        ctx.plane_epsilon = config.plane_epsilon;
        ctx
    }

    /// A context with just enough stack for `tree`.
    pub fn for_tree(tree: &BspTree) -> Self {
        Self::with_config(&SweepConfig::default(), tree)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Checks up front that a descent of `tree` cannot overflow the stack.
    pub fn check_capacity(&self, tree: &BspTree) -> Result<(), SweepError> {
        let required = tree.required_stack();
        if required > self.capacity {
            return Err(SweepError::StackTooShallow {
                required,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Resets the stack to the root of `tree`, spanning the whole sweep.
    pub fn begin(&mut self, tree: &BspTree, a: Point3<f32>, b: Point3<f32>) {
        self.stack.clear();
        self.start = a;
        self.end = b;
        self.push(StackEntry::root(tree.root(), a, b));
    }

    /// Start of the sweep given to the last [`begin`](Self::begin).
    #[inline]
    pub fn sweep_start(&self) -> Point3<f32> {
        self.start
    }

    #[inline]
    pub fn sweep_end(&self) -> Point3<f32> {
        self.end
    }

    #[inline]
    pub fn top(&self) -> Option<&StackEntry> {
        self.stack.last()
    }

    #[inline]
    pub fn pop(&mut self) -> Option<StackEntry> {
        self.stack.pop()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Expands the top entry for a line segment.
    pub fn line_descend(&mut self, tree: &BspTree) {
        self.descend_shape(tree, &SweepShape::Point);
    }

    /// Expands the top entry for a swept hull.
    pub fn descend(&mut self, tree: &BspTree, hull: &ConvexHull, orientation: UnitQuaternion<f32>) {
        self.descend_shape(tree, &SweepShape::hull(hull, orientation));
    }

    /// Expands the top entry for a swept sphere.
    pub fn sphere_descend(&mut self, tree: &BspTree, radius: f32) {
        self.descend_shape(tree, &SweepShape::Sphere(radius));
    }

    /// Pops the top entry and pushes the children of its node that `shape`
    /// touches along the entry's segment.
    ///
    /// A leaf on top is simply popped.
    pub fn descend_shape(&mut self, tree: &BspTree, shape: &SweepShape) {
        let Some(entry) = self.stack.pop() else {
            return;
        };
        let NodeKind::Internal { plane, left, right } = tree.node(entry.node).kind() else {
            return;
        };
        let (left, right) = (*left, *right);
        let normal = plane.normal();
        let da = plane.signed_distance(entry.a);
        let db = plane.signed_distance(entry.b);
        let (front, back) = shape.extents(&normal);

        // right touched where d + front >= 0, left where back - d > 0
        let (f0, f1) = (da + front, db + front);
        let (g0, g1) = (back - da, back - db);
        let right_span = nonneg_span(f0, f1);
        let left_span = positive_span(g0, g1);
        let centre_right = da >= 0.0;

        let in_plane =
            shape.is_point() && da.abs() <= self.plane_epsilon && db.abs() <= self.plane_epsilon;
        let straddles = match (left_span, right_span) {
            _ if in_plane => true,
            (None, None) => return,
            (Some(_), None) => return self.push(entry.routed(left, DescentOp::Descend)),
            (None, Some(_)) => return self.push(entry.routed(right, DescentOp::Descend)),
            (Some(l), Some(r)) => is_full(l) && is_full(r),
        };
        if straddles {
            let (near, far) = if centre_right { (right, left) } else { (left, right) };
            let mut far_entry = entry.routed(far, DescentOp::Copy);
            if in_plane {
                // only touches the far side's boundary
                far_entry.has_start = false;
                far_entry.normal = if far == left { normal } else { -normal };
            }
            self.push(far_entry);
            self.push(entry.routed(near, DescentOp::Copy));
            return;
        }

        let (Some(l), Some(r)) = (left_span, right_span) else {
            return;
        };
        let zero_length = entry.a == entry.b;
        let right_entry = (r.0 < r.1 || zero_length).then(|| {
            let mut child = entry.clipped(right, r.0, r.1);
            if f0 <= 0.0 {
                child.has_start = false;
                child.normal = -normal;
            }
            child
        });
        let left_entry = (l.0 < l.1 || zero_length).then(|| {
            let mut child = entry.clipped(left, l.0, l.1);
            if g0 <= 0.0 {
                child.has_start = false;
                child.normal = normal;
            }
            child
        });

        match (left_entry, right_entry) {
            (Some(le), Some(re)) => {
                let right_first = r.0 < l.0 || (r.0 == l.0 && centre_right);
                let (first, second) = if right_first { (re, le) } else { (le, re) };
                self.push(second);
                self.push(first);
            }
            (Some(only), None) | (None, Some(only)) => self.push(only),
            (None, None) => {}
        }
    }

    /// Discards entries down to the nearest [`DescentOp::Copy`] entry.
    pub fn pop_to_next_op(&mut self) {
        while self.stack.last().is_some_and(|e| e.op != DescentOp::Copy) {
            self.stack.pop();
        }
    }

    /// Runs a whole descent of `shape` from `a` to `b`, handing every leaf
    /// reached to `visitor` in descent order.
    pub fn visit_leaves<V: LeafVisitor>(
        &mut self,
        tree: &BspTree,
        shape: &SweepShape,
        a: Point3<f32>,
        b: Point3<f32>,
        visitor: &mut V,
    ) {
        self.begin(tree, a, b);
        while let Some(top) = self.top() {
            let id = top.node;
            match tree.node(id).leaf() {
                Some(leaf) => {
                    visitor.visit(id, leaf);
                    self.stack.pop();
                }
                None => self.descend_shape(tree, shape),
            }
        }
    }

    /// Starts a new query generation; every entity reads as unmarked.
    ///
    /// `entity_count` sizes the mark table so no query has to grow it.
    pub fn next_epoch(&mut self, entity_count: usize) -> u64 {
        if self.marks.len() < entity_count {
            self.marks.resize(entity_count, 0);
        }
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            self.marks.fill(0);
            self.epoch = 1;
        }
        self.epoch
    }

    /// Marks an entity as visited in this generation. Returns `true` if it
    /// was not marked yet.
    pub fn mark(&mut self, id: EntityId) -> bool {
        let index = id.index();
        if index >= self.marks.len() {
            self.marks.resize(index + 1, 0);
        }
        if self.marks[index] == self.epoch {
            return false;
        }
        self.marks[index] = self.epoch;
        true
    }

    pub fn is_marked(&self, id: EntityId) -> bool {
        self.marks.get(id.index()) == Some(&self.epoch)
    }

    fn push(&mut self, entry: StackEntry) {
        assert!(
            self.stack.len() < self.capacity,
            "descent stack overflow at node {:?}: capacity {} is too small for this tree",
            entry.node,
            self.capacity
        );
        self.stack.push(entry);
    }
}

/// Part of `0..=1` where `f0 + s * (f1 - f0) >= 0`.
fn nonneg_span(f0: f32, f1: f32) -> Option<(f32, f32)> {
    match (f0 >= 0.0, f1 >= 0.0) {
        (true, true) => Some((0.0, 1.0)),
        (false, false) => None,
        (true, false) => Some((0.0, f0 / (f0 - f1))),
        (false, true) => Some((f0 / (f0 - f1), 1.0)),
    }
}

/// Part of `0..=1` where `g0 + s * (g1 - g0) > 0`.
fn positive_span(g0: f32, g1: f32) -> Option<(f32, f32)> {
    match (g0 > 0.0, g1 > 0.0) {
        (true, true) => Some((0.0, 1.0)),
        (false, false) => None,
        (true, false) => Some((0.0, g0 / (g0 - g1))),
        (false, true) => Some((g0 / (g0 - g1), 1.0)),
    }
}

#[inline]
fn is_full(span: (f32, f32)) -> bool {
    span == (0.0, 1.0)
}
