//! BSP tree node implementation.

use std::sync::Arc;

use crate::{ConvexHull, EntityId, Plane3D};

/// Index of a node inside its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Position of the node in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the BSP tree.
///
/// Internal nodes partition space with a single plane: points with
/// `signed_distance >= 0` belong to the `right` subtree, the rest to `left`.
/// Leaves are convex cells that are either solid world geometry or open
/// space holding links to dynamic entities.
#[derive(Debug, Clone)]
pub struct BspNode {
    parent: Option<NodeId>,
    kind: NodeKind,
}

/// What a node holds.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A splitting node with both children.
    Internal {
        plane: Plane3D,
        left: NodeId,
        right: NodeId,
    },
    /// A convex cell.
    Leaf(Leaf),
}

/// A convex cell of the partition.
#[derive(Debug, Clone, Default)]
pub struct Leaf {
    solid: Option<SolidLeaf>,
    entities: Vec<EntityId>,
}

/// Collision data of a solid leaf.
///
/// Bevels are extra outward planes (typically the axial planes of the solid's
/// bounding box) that keep swept hulls from sliding past sharp corners. The
/// precise hull, when present, is the exact convex solid the leaf was cut
/// from.
#[derive(Debug, Clone, Default)]
pub struct SolidLeaf {
    bevels: Vec<Plane3D>,
    hull: Option<Arc<ConvexHull>>,
}

impl SolidLeaf {
    pub fn new(bevels: Vec<Plane3D>, hull: Option<Arc<ConvexHull>>) -> Self {
        Self { bevels, hull }
    }

    /// Solid leaf data derived from a convex solid: its axial bevels plus the
    /// solid itself as the precise hull.
    pub fn from_hull(hull: Arc<ConvexHull>) -> Self {
        Self {
            bevels: hull.axial_bevels(),
            hull: Some(hull),
        }
    }

    #[inline]
    pub fn bevels(&self) -> &[Plane3D] {
        &self.bevels
    }

    #[inline]
    pub fn hull(&self) -> Option<&ConvexHull> {
        self.hull.as_deref()
    }
}

impl Leaf {
    /// An open cell with no linked entities.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A solid cell.
    pub fn solid(solid: SolidLeaf) -> Self {
        Self {
            solid: Some(solid),
            entities: Vec::new(),
        }
    }

    #[inline]
    pub fn is_solid(&self) -> bool {
        self.solid.is_some()
    }

    /// Solid collision data, `None` for open cells.
    #[inline]
    pub fn solid_data(&self) -> Option<&SolidLeaf> {
        self.solid.as_ref()
    }

    /// Entities currently overlapping this cell.
    #[inline]
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub(crate) fn link(&mut self, id: EntityId) {
        if !self.entities.contains(&id) {
            self.entities.push(id);
        }
    }

    pub(crate) fn unlink(&mut self, id: EntityId) {
        self.entities.retain(|e| *e != id);
    }
}

impl BspNode {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self { parent: None, kind }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    /// Parent node, `None` for the root.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Checks if this node has no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// Returns the splitting plane of an internal node.
    #[inline]
    pub fn plane(&self) -> Option<&Plane3D> {
        match &self.kind {
            NodeKind::Internal { plane, .. } => Some(plane),
            NodeKind::Leaf(_) => None,
        }
    }

    /// Returns `(left, right)` for an internal node.
    #[inline]
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        match self.kind {
            NodeKind::Internal { left, right, .. } => Some((left, right)),
            NodeKind::Leaf(_) => None,
        }
    }

    #[inline]
    pub fn leaf(&self) -> Option<&Leaf> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Internal { .. } => None,
        }
    }

    #[inline]
    pub(crate) fn leaf_mut(&mut self) -> Option<&mut Leaf> {
        match &mut self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Internal { .. } => None,
        }
    }
}
