//! Dynamic entities linked into the tree's open leaves.

use std::sync::Arc;

use nalgebra::{Point3, UnitQuaternion, Vector3};

use crate::bsp::NodeId;
use crate::{ConvexHull, Placement};

/// Index of an entity in its [`Entities`] store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) u32);

impl EntityId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Classes of entities, used to ignore groups of them in queries.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct EntityFlags: u32 {
        const PLAYER     = 0x0000_0001;
        const MONSTER    = 0x0000_0002;
        const PROJECTILE = 0x0000_0004;
        const TRIGGER    = 0x0000_0008;
        const NO_CLIP    = 0x0000_0010;

        // Game code may define its own bits.
        const _ = !0;
    }
}

/// One element of an entity's alternate hit-shape chain.
///
/// Offset and orientation are relative to the owning entity.
#[derive(Debug, Clone)]
pub struct HitShape {
    pub hull: Arc<ConvexHull>,
    pub offset: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
}

impl HitShape {
    pub fn new(hull: Arc<ConvexHull>, offset: Vector3<f32>) -> Self {
        Self {
            hull,
            offset,
            orientation: UnitQuaternion::identity(),
        }
    }

    pub fn with_orientation(mut self, orientation: UnitQuaternion<f32>) -> Self {
        self.orientation = orientation;
        self
    }
}

/// A moving object with a collision hull.
///
/// ```
/// use std::sync::Arc;
/// use bsp_sweep::{ConvexHull, Entity, EntityFlags};
/// use nalgebra::{Point3, Vector3};
///
/// let hull = Arc::new(ConvexHull::cuboid(Vector3::new(0.5, 0.5, 1.0)).unwrap());
/// let player = Entity::new(Point3::new(0.0, 0.0, 1.0))
///     .with_hull(hull)
///     .with_flags(EntityFlags::PLAYER);
/// assert_eq!(player.placements(false).len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Entity {
    position: Point3<f32>,
    orientation: UnitQuaternion<f32>,
    hull: Option<Arc<ConvexHull>>,
    alt: Vec<HitShape>,
    flags: EntityFlags,
    links: Vec<NodeId>,
}

impl Entity {
    /// An entity with no hull at `position`.
    pub fn new(position: Point3<f32>) -> Self {
        Self {
            position,
            orientation: UnitQuaternion::identity(),
            hull: None,
            alt: Vec::new(),
            flags: EntityFlags::empty(),
            links: Vec::new(),
        }
    }

    pub fn with_hull(mut self, hull: Arc<ConvexHull>) -> Self {
        self.hull = Some(hull);
        self
    }

    pub fn with_orientation(mut self, orientation: UnitQuaternion<f32>) -> Self {
        self.orientation = orientation;
        self
    }

    /// Adds a shape to the alternate hit-shape chain.
    pub fn with_alt(mut self, shape: HitShape) -> Self {
        self.alt.push(shape);
        self
    }

    pub fn with_flags(mut self, flags: EntityFlags) -> Self {
        self.flags = flags;
        self
    }

    #[inline]
    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    #[inline]
    pub fn orientation(&self) -> UnitQuaternion<f32> {
        self.orientation
    }

    #[inline]
    pub fn hull(&self) -> Option<&ConvexHull> {
        self.hull.as_deref()
    }

    #[inline]
    pub fn alt_shapes(&self) -> &[HitShape] {
        &self.alt
    }

    #[inline]
    pub fn flags(&self) -> EntityFlags {
        self.flags
    }

    /// Leaves this entity is currently linked into.
    #[inline]
    pub fn links(&self) -> &[NodeId] {
        &self.links
    }

    pub(crate) fn set_links(&mut self, links: Vec<NodeId>) {
        self.links = links;
    }

    pub(crate) fn links_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.links
    }

    pub(crate) fn set_transform(&mut self, position: Point3<f32>, orientation: UnitQuaternion<f32>) {
        self.position = position;
        self.orientation = orientation;
    }

    pub(crate) fn set_flags(&mut self, flags: EntityFlags) {
        self.flags = flags;
    }

    /// The world-space hulls to test against.
    ///
    /// With `alt` set and a non-empty alternate chain, that chain replaces
    /// the main hull. Entities without any hull have no placements.
    pub fn placements(&self, alt: bool) -> Vec<Placement<'_>> {
        if alt && !self.alt.is_empty() {
            return self
                .alt
                .iter()
                .map(|shape| {
                    Placement::new(
                        &shape.hull,
                        self.position + self.orientation * shape.offset,
                        self.orientation * shape.orientation,
                    )
                })
                .collect();
        }
        self.hull
            .iter()
            .map(|hull| Placement::new(hull, self.position, self.orientation))
            .collect()
    }
}

/// Storage for all entities of a world.
#[derive(Debug, Clone, Default)]
pub struct Entities {
    entities: Vec<Entity>,
}

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        self.entities.push(entity);
        id
    }

    #[inline]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.index())
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.index())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityId(i as u32), e))
    }
}
