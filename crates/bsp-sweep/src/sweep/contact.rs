//! Query inputs and results.

use nalgebra::Vector3;

use crate::{Entity, EntityFlags, EntityId};

bitflags::bitflags! {
    /// What a sweep test considers.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct TestType: u32 {
        /// Static world geometry.
        const TREE         = 0x01;
        /// Entities' main hulls.
        const ENTITIES     = 0x02;
        /// Entities' alternate hit-shape chains instead of their main hulls.
        const ALT          = 0x04;
        const ENTITIES_ALT = Self::ENTITIES.bits() | Self::ALT.bits();
        const ALL          = Self::TREE.bits() | Self::ENTITIES.bits();
        const ALL_ALT      = Self::ALL.bits() | Self::ALT.bits();
    }
}

impl Default for TestType {
    fn default() -> Self {
        TestType::ALL
    }
}

/// First contact of a sweep that started clear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Sweep fraction of first contact, in `0..=1`.
    pub time_first: f32,
    /// Sweep fraction at which the sweep leaves the hit entity. `None` for
    /// world geometry.
    pub time_last: Option<f32>,
    /// Surface normal at the contact, facing the sweep.
    pub normal: Vector3<f32>,
    pub entity: Option<EntityId>,
}

/// The sweep started overlapping something.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Length of the minimum translation that separates the shapes.
    pub depth: f32,
    /// Unit direction of that translation.
    pub direction: Vector3<f32>,
    pub entity: Option<EntityId>,
}

/// Outcome of a sweep test.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Contact {
    #[default]
    None,
    Hit(Hit),
    Intersect(Intersection),
}

impl Contact {
    pub const NONE: u32 = 0;
    pub const HIT: u32 = 1;
    pub const INTERSECT: u32 = 2;

    /// Numeric contact code: [`NONE`](Self::NONE), [`HIT`](Self::HIT) or
    /// [`INTERSECT`](Self::INTERSECT).
    pub fn code(&self) -> u32 {
        match self {
            Contact::None => Self::NONE,
            Contact::Hit(_) => Self::HIT,
            Contact::Intersect(_) => Self::INTERSECT,
        }
    }

    /// Hit time, or the translation depth for an intersection.
    pub fn time_first(&self) -> Option<f32> {
        match self {
            Contact::None => None,
            Contact::Hit(hit) => Some(hit.time_first),
            Contact::Intersect(isect) => Some(isect.depth),
        }
    }

    /// Surface normal, or the translation direction for an intersection.
    pub fn normal(&self) -> Option<Vector3<f32>> {
        match self {
            Contact::None => None,
            Contact::Hit(hit) => Some(hit.normal),
            Contact::Intersect(isect) => Some(isect.direction),
        }
    }

    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Contact::None => None,
            Contact::Hit(hit) => hit.entity,
            Contact::Intersect(isect) => isect.entity,
        }
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Contact::None)
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        matches!(self, Contact::Hit(_))
    }

    #[inline]
    pub fn is_intersect(&self) -> bool {
        matches!(self, Contact::Intersect(_))
    }
}

/// Which geometry a query tests and which entities it skips.
///
/// ```
/// use bsp_sweep::{EntityFlags, Filter, TestType};
///
/// let filter = Filter::new(TestType::ALL).with_ignore_flags(EntityFlags::TRIGGER);
/// assert!(filter.test.contains(TestType::TREE));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Filter<'a> {
    pub test: TestType,
    /// Entities whose flags intersect this set are skipped.
    pub ignore_flags: EntityFlags,
    /// Entities skipped by id.
    pub ignore: &'a [EntityId],
}

impl<'a> Filter<'a> {
    pub fn new(test: TestType) -> Self {
        Self {
            test,
            ignore_flags: EntityFlags::empty(),
            ignore: &[],
        }
    }

    pub fn with_ignore_flags(mut self, flags: EntityFlags) -> Self {
        self.ignore_flags = flags;
        self
    }

    pub fn ignoring(mut self, ignore: &'a [EntityId]) -> Self {
        self.ignore = ignore;
        self
    }

    #[inline]
    pub(crate) fn skips(&self, entity: &Entity) -> bool {
        entity.flags().intersects(self.ignore_flags)
    }
}
