//! BSP tree container and construction.

use std::sync::Arc;

use log::debug;
use nalgebra::Point3;

use crate::error::TreeError;
use crate::{Classification, ConvexHull, Plane3D, SweepShape};

use super::node::{BspNode, Leaf, NodeId, NodeKind, SolidLeaf};
use super::selector::{FirstPlane, PlaneSelector};

/// A solid-leaf Binary Space Partitioning tree.
///
/// Nodes live in a flat arena and refer to each other by [`NodeId`]. The
/// tree is immutable once built, apart from the entity links stored in its
/// open leaves.
///
/// # Construction
///
/// Trees come either from a level loader through [`TreeBuilder`], or from a
/// set of convex brushes:
///
/// ```
/// use bsp_sweep::{BspTree, ConvexHull};
/// use nalgebra::{Point3, Vector3};
///
/// let wall = ConvexHull::cuboid(Vector3::new(1.0, 4.0, 4.0)).unwrap();
/// let tree = BspTree::from_brushes(vec![wall]);
///
/// let inside = tree.pos_to_leaf(Point3::new(0.0, 0.0, 0.0));
/// assert!(tree.node(inside).leaf().unwrap().is_solid());
/// ```
#[derive(Debug, Clone)]
pub struct BspTree {
    nodes: Vec<BspNode>,
    root: NodeId,
    depth: usize,
}

impl Default for BspTree {
    fn default() -> Self {
        Self::empty()
    }
}

impl BspTree {
    /// A tree made of a single open leaf.
    pub fn empty() -> Self {
        Self {
            nodes: vec![BspNode::new(NodeKind::Leaf(Leaf::empty()))],
            root: NodeId(0),
            depth: 1,
        }
    }

    /// Compiles convex solid brushes into a tree.
    ///
    /// Uses the provided [`PlaneSelector`] to choose splitting planes among
    /// the brush faces. Every point inside a brush ends up in a solid leaf
    /// whose precise hull is that brush.
    pub fn build<S: PlaneSelector>(brushes: Vec<ConvexHull>, selector: &S) -> Self {
        let brushes: Vec<Arc<ConvexHull>> = brushes.into_iter().map(Arc::new).collect();
        let fragments = brushes
            .iter()
            .enumerate()
            .map(|(brush, hull)| Fragment {
                brush,
                remaining: hull.planes().to_vec(),
            })
            .collect();

        let mut builder = TreeBuilder::new();
        let root = compile_node(&mut builder, &brushes, fragments, selector);
        let tree = builder.finish(root);
        debug!(
            "compiled {} brushes into {} nodes, depth {}",
            brushes.len(),
            tree.node_count(),
            tree.depth()
        );
        tree
    }

    /// Compiles brushes using the default plane selector ([`FirstPlane`]).
    pub fn from_brushes(brushes: Vec<ConvexHull>) -> Self {
        Self::build(brushes, &FirstPlane)
    }

    /// Returns the root node id.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns a node by id.
    ///
    /// # Panics
    /// Panics if the id does not belong to this tree.
    #[inline]
    pub fn node(&self, id: NodeId) -> &BspNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn leaf_mut(&mut self, id: NodeId) -> Option<&mut Leaf> {
        self.nodes.get_mut(id.index()).and_then(BspNode::leaf_mut)
    }

    /// Returns the number of nodes, internal and leaves.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the maximum number of nodes on a root-to-leaf path (1 for a
    /// single leaf).
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Stack entries a descent of this tree can need at most.
    #[inline]
    pub fn required_stack(&self) -> usize {
        self.depth + 1
    }

    /// Ids of all leaves.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_leaf())
            .map(|(i, _)| NodeId(i as u32))
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    /// Walks from the root to the leaf containing `point`.
    pub fn pos_to_leaf(&self, point: Point3<f32>) -> NodeId {
        let mut id = self.root;
        while let NodeKind::Internal { plane, left, right } = self.node(id).kind() {
            id = if plane.signed_distance(point) >= 0.0 {
                *right
            } else {
                *left
            };
        }
        id
    }

    /// The planes bounding a node's cell, facing out of the cell.
    ///
    /// These are the splitting planes of its ancestors, flipped where the
    /// cell lies on their front side. Some may not touch the cell at all.
    pub fn leaf_planes(&self, id: NodeId) -> Vec<Plane3D> {
        let mut planes = Vec::with_capacity(self.depth);
        let mut child = id;
        while let Some(parent) = self.node(child).parent() {
            if let NodeKind::Internal { plane, left, .. } = self.node(parent).kind() {
                planes.push(if *left == child { *plane } else { plane.flipped() });
            }
            child = parent;
        }
        planes
    }

    /// Collects every leaf a shape centred at `center` overlaps.
    pub fn leaves_touching(&self, shape: &SweepShape, center: Point3<f32>, out: &mut Vec<NodeId>) {
        let mut pending = vec![self.root];
        while let Some(id) = pending.pop() {
            match self.node(id).kind() {
                NodeKind::Leaf(_) => out.push(id),
                NodeKind::Internal { plane, left, right } => {
                    let d = plane.signed_distance(center);
                    let (front, back) = shape.extents(&plane.normal());
                    if d + front >= 0.0 {
                        pending.push(*right);
                    }
                    if d - back < 0.0 {
                        pending.push(*left);
                    }
                }
            }
        }
    }
}

/// Assembles a tree arena bottom-up.
///
/// ```
/// use bsp_sweep::{Plane3D, SolidLeaf, TreeBuilder};
/// use nalgebra::Vector3;
///
/// let mut builder = TreeBuilder::new();
/// let solid = builder.solid_leaf(SolidLeaf::default());
/// let open = builder.leaf();
/// let root = builder.split(Plane3D::new(Vector3::y(), 0.0), solid, open);
/// let tree = builder.build(root).unwrap();
/// assert_eq!(tree.depth(), 2);
/// ```
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<BspNode>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an open leaf.
    pub fn leaf(&mut self) -> NodeId {
        self.push(NodeKind::Leaf(Leaf::empty()))
    }

    /// Adds a solid leaf.
    pub fn solid_leaf(&mut self, solid: SolidLeaf) -> NodeId {
        self.push(NodeKind::Leaf(Leaf::solid(solid)))
    }

    /// Adds an internal node; `left` is behind the plane, `right` in front.
    pub fn split(&mut self, plane: Plane3D, left: NodeId, right: NodeId) -> NodeId {
        self.push(NodeKind::Internal { plane, left, right })
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(BspNode::new(kind));
        id
    }

    /// Validates the arena and produces the tree rooted at `root`.
    pub fn build(mut self, root: NodeId) -> Result<BspTree, TreeError> {
        let count = self.nodes.len();
        if root.index() >= count {
            return Err(TreeError::UnknownNode(root));
        }

        let mut parents: Vec<Option<NodeId>> = vec![None; count];
        for (i, node) in self.nodes.iter().enumerate() {
            let id = NodeId(i as u32);
            let NodeKind::Internal { plane, left, right } = node.kind() else {
                continue;
            };
            let finite = plane.normal().iter().all(|c| c.is_finite()) && plane.offset().is_finite();
            if !finite {
                return Err(TreeError::NonFinitePlane(id));
            }
            for child in [*left, *right] {
                if child.index() >= count {
                    return Err(TreeError::UnknownNode(child));
                }
                if let Some(first) = parents[child.index()] {
                    return Err(TreeError::SharedChild {
                        child,
                        first,
                        second: id,
                    });
                }
                parents[child.index()] = Some(id);
            }
        }
        if parents[root.index()].is_some() {
            return Err(TreeError::RootHasParent(root));
        }

        // With one parent per node and a parentless root, the reachable part
        // is a tree, so this walk terminates.
        let mut reached = vec![false; count];
        let mut depth = 0;
        let mut pending = vec![(root, 1usize)];
        while let Some((id, level)) = pending.pop() {
            reached[id.index()] = true;
            depth = depth.max(level);
            if let Some((left, right)) = self.nodes[id.index()].children() {
                pending.push((left, level + 1));
                pending.push((right, level + 1));
            }
        }
        if let Some(i) = reached.iter().position(|r| !r) {
            return Err(TreeError::Unreachable(NodeId(i as u32)));
        }

        for (node, parent) in self.nodes.iter_mut().zip(parents) {
            node.set_parent(parent);
        }
        Ok(BspTree {
            nodes: self.nodes,
            root,
            depth,
        })
    }

    /// Builds a tree whose structure is known to be valid.
    fn finish(self, root: NodeId) -> BspTree {
        match self.build(root) {
            Ok(tree) => tree,
            Err(err) => unreachable!("brush compiler produced an invalid arena: {err}"),
        }
    }
}

/// A brush that still has faces to carve out of the current cell.
#[derive(Debug, Clone)]
struct Fragment {
    brush: usize,
    remaining: Vec<Plane3D>,
}

/// Recursively compiles brush fragments into a subtree.
///
/// A cell becomes solid once some brush has had all of its faces used as
/// splitters with the cell behind each of them.
fn compile_node<S: PlaneSelector>(
    builder: &mut TreeBuilder,
    brushes: &[Arc<ConvexHull>],
    fragments: Vec<Fragment>,
    selector: &S,
) -> NodeId {
    if let Some(done) = fragments.iter().find(|f| f.remaining.is_empty()) {
        let hull = Arc::clone(&brushes[done.brush]);
        return builder.solid_leaf(SolidLeaf::from_hull(hull));
    }
    if fragments.is_empty() {
        return builder.leaf();
    }

    let candidates: Vec<Plane3D> = fragments
        .iter()
        .flat_map(|f| f.remaining.iter().copied())
        .collect();
    let splitter = *selector.select(&candidates).unwrap_or(&candidates[0]);
    let flipped = splitter.flipped();

    let mut front = Vec::new();
    let mut back = Vec::new();

    for mut fragment in fragments {
        // Own face: the brush lies behind it.
        if let Some(pos) = fragment.remaining.iter().position(|p| p.approx_eq(&splitter)) {
            fragment.remaining.swap_remove(pos);
            back.push(fragment);
            continue;
        }
        if let Some(pos) = fragment.remaining.iter().position(|p| p.approx_eq(&flipped)) {
            fragment.remaining.swap_remove(pos);
            front.push(fragment);
            continue;
        }
        match brushes[fragment.brush].classify(&splitter) {
            Classification::Front => front.push(fragment),
            Classification::Back => back.push(fragment),
            Classification::Coplanar | Classification::Spanning => {
                front.push(fragment.clone());
                back.push(fragment);
            }
        }
    }

    let left = compile_node(builder, brushes, back, selector);
    let right = compile_node(builder, brushes, front, selector);
    builder.split(splitter, left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::selector::AxialFirst;
    use nalgebra::{UnitQuaternion, Vector3};

    fn unit_box_at(x: f32, y: f32, z: f32) -> ConvexHull {
        ConvexHull::cuboid(Vector3::new(1.0, 1.0, 1.0))
            .unwrap()
            .translated(Vector3::new(x, y, z))
    }

    fn is_solid(tree: &BspTree, p: Point3<f32>) -> bool {
        tree.node(tree.pos_to_leaf(p)).leaf().unwrap().is_solid()
    }

    /// root: y >= 0 open, y < 0 solid
    fn floor_tree() -> BspTree {
        let mut builder = TreeBuilder::new();
        let solid = builder.solid_leaf(SolidLeaf::default());
        let open = builder.leaf();
        let root = builder.split(Plane3D::new(Vector3::y(), 0.0), solid, open);
        builder.build(root).unwrap()
    }

    #[test]
    fn empty_tree() {
        let tree = BspTree::empty();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.pos_to_leaf(Point3::origin()), tree.root());
    }

    #[test]
    fn builder_sets_parents_and_depth() {
        let tree = floor_tree();
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.required_stack(), 3);
        let (left, right) = tree.node(tree.root()).children().unwrap();
        assert_eq!(tree.node(left).parent(), Some(tree.root()));
        assert_eq!(tree.node(right).parent(), Some(tree.root()));
        assert_eq!(tree.node(tree.root()).parent(), None);
    }

    #[test]
    fn pos_to_leaf_sends_on_plane_points_right() {
        let tree = floor_tree();
        let (left, right) = tree.node(tree.root()).children().unwrap();
        assert_eq!(tree.pos_to_leaf(Point3::new(0.0, 0.0, 0.0)), right);
        assert_eq!(tree.pos_to_leaf(Point3::new(0.0, -0.1, 0.0)), left);
    }

    #[test]
    fn builder_rejects_unknown_child() {
        let mut builder = TreeBuilder::new();
        let leaf = builder.leaf();
        let root = builder.split(Plane3D::new(Vector3::x(), 0.0), leaf, NodeId(9));
        assert_eq!(builder.build(root).unwrap_err(), TreeError::UnknownNode(NodeId(9)));
    }

    #[test]
    fn builder_rejects_shared_child() {
        let mut builder = TreeBuilder::new();
        let leaf = builder.leaf();
        let root = builder.split(Plane3D::new(Vector3::x(), 0.0), leaf, leaf);
        assert!(matches!(
            builder.build(root),
            Err(TreeError::SharedChild { .. })
        ));
    }

    #[test]
    fn builder_rejects_unreachable_node() {
        let mut builder = TreeBuilder::new();
        let a = builder.leaf();
        let b = builder.leaf();
        let _stray = builder.leaf();
        let root = builder.split(Plane3D::new(Vector3::x(), 0.0), a, b);
        assert_eq!(builder.build(root).unwrap_err(), TreeError::Unreachable(NodeId(2)));
    }

    #[test]
    fn builder_rejects_child_as_root() {
        let mut builder = TreeBuilder::new();
        let a = builder.leaf();
        let b = builder.leaf();
        builder.split(Plane3D::new(Vector3::x(), 0.0), a, b);
        assert_eq!(builder.build(a).unwrap_err(), TreeError::RootHasParent(a));
    }

    #[test]
    fn leaf_planes_face_out_of_the_cell() {
        let tree = floor_tree();
        let (left, right) = tree.node(tree.root()).children().unwrap();

        let below = tree.leaf_planes(left);
        assert_eq!(below.len(), 1);
        assert!(below[0].signed_distance(Point3::new(0.0, 1.0, 0.0)) > 0.0);

        let above = tree.leaf_planes(right);
        assert!(above[0].signed_distance(Point3::new(0.0, -1.0, 0.0)) > 0.0);
    }

    #[test]
    fn single_brush_is_carved_exactly() {
        let tree = BspTree::from_brushes(vec![unit_box_at(0.0, 0.0, 0.0)]);
        assert!(is_solid(&tree, Point3::new(0.0, 0.0, 0.0)));
        assert!(is_solid(&tree, Point3::new(0.9, -0.9, 0.9)));
        assert!(!is_solid(&tree, Point3::new(1.1, 0.0, 0.0)));
        assert!(!is_solid(&tree, Point3::new(0.0, 0.0, -1.5)));
        // six faces, one solid leaf
        assert_eq!(tree.depth(), 7);
        assert_eq!(tree.leaf_count(), 7);
    }

    #[test]
    fn overlapping_brushes_cover_their_union() {
        let brushes = vec![unit_box_at(0.0, 0.0, 0.0), unit_box_at(1.5, 0.5, 0.0)];
        for tree in [
            BspTree::from_brushes(brushes.clone()),
            BspTree::build(brushes, &AxialFirst),
        ] {
            assert!(is_solid(&tree, Point3::new(-0.5, 0.0, 0.0)));
            assert!(is_solid(&tree, Point3::new(2.2, 1.2, 0.0)));
            assert!(is_solid(&tree, Point3::new(1.0, 0.8, 0.5)));
            assert!(!is_solid(&tree, Point3::new(2.2, -0.8, 0.0)));
            assert!(!is_solid(&tree, Point3::new(-0.5, 1.2, 0.0)));
        }
    }

    #[test]
    fn solid_leaves_carry_their_brush() {
        let tree = BspTree::from_brushes(vec![unit_box_at(5.0, 0.0, 0.0)]);
        let leaf = tree.pos_to_leaf(Point3::new(5.0, 0.0, 0.0));
        let solid = tree.node(leaf).leaf().unwrap().solid_data().unwrap();
        assert!(solid.hull().unwrap().contains(Point3::new(5.5, 0.5, 0.5)));
    }

    #[test]
    fn leaves_touching_spans_the_plane() {
        let tree = floor_tree();
        let hull = ConvexHull::cuboid(Vector3::new(1.0, 1.0, 1.0)).unwrap();
        let shape = SweepShape::hull(&hull, UnitQuaternion::identity());

        let mut out = Vec::new();
        tree.leaves_touching(&shape, Point3::new(0.0, 0.5, 0.0), &mut out);
        assert_eq!(out.len(), 2);

        out.clear();
        tree.leaves_touching(&shape, Point3::new(0.0, 3.0, 0.0), &mut out);
        assert_eq!(out, vec![tree.pos_to_leaf(Point3::new(0.0, 3.0, 0.0))]);
    }
}
