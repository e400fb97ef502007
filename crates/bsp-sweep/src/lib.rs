//! Swept collision queries over solid-leaf BSP (Binary Space Partitioning)
//! trees.
//!
//! A [`World`] pairs a static [`BspTree`] with dynamic [`Entity`] values
//! linked into its open leaves. [`line_test`] and [`hull_test`] answer which
//! thing a moving segment or convex hull touches first on its way from one
//! point to another, telling a clean [`Hit`] apart from a sweep that starts
//! overlapping something ([`Intersection`]).
//!
//! ```
//! use std::sync::Arc;
//! use bsp_sweep::{hull_test, BspTree, ConvexHull, DescentContext, Entity, Filter, TestType, World};
//! use nalgebra::{Point3, UnitQuaternion, Vector3};
//!
//! let floor = ConvexHull::from_box(Point3::new(-50.0, -50.0, -1.0), Point3::new(50.0, 50.0, 0.0)).unwrap();
//! let mut world = World::new(BspTree::from_brushes(vec![floor]));
//! let crate_hull = Arc::new(ConvexHull::cuboid(Vector3::new(1.0, 1.0, 1.0)).unwrap());
//! let target = world.spawn(Entity::new(Point3::new(10.0, 0.0, 1.0)).with_hull(crate_hull));
//!
//! let player = ConvexHull::cuboid(Vector3::new(0.5, 0.5, 0.5)).unwrap();
//! let mut ctx = DescentContext::for_tree(world.tree());
//! let contact = hull_test(
//!     &mut ctx,
//!     &world,
//!     &player,
//!     Point3::new(0.0, 0.0, 1.0),
//!     Point3::new(20.0, 0.0, 1.0),
//!     UnitQuaternion::identity(),
//!     &Filter::new(TestType::ALL),
//! );
//! assert_eq!(contact.entity(), Some(target));
//! ```

pub mod bsp;
mod config;
mod descent;
mod entity;
mod error;
mod hull;
mod plane;
mod shape;
pub mod sweep;
mod world;

pub use bsp::{BspNode, BspTree, Leaf, NodeId, NodeKind, SolidLeaf, TreeBuilder};
pub use config::SweepConfig;
pub use descent::{DescentContext, DescentOp, StackEntry};
pub use entity::{Entities, Entity, EntityFlags, EntityId, HitShape};
pub use error::{HullError, SweepError, TreeError};
pub use hull::ConvexHull;
pub use plane::{Classification, Plane3D, PlaneSide, PLANE_EPSILON};
pub use shape::{Placement, SweepShape};
pub use sweep::{
    descent_entities, hull_test, line_test, shape_test, sphere_entities, Contact, Filter, Hit,
    Intersection, NarrowContact, TestType,
};
pub use world::World;
