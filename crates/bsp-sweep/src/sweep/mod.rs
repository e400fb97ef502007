//! Sweep tests driven by the descent engine.
//!
//! [`line_test`] and [`hull_test`] walk the leaves a sweep enters and
//! return the earliest [`Contact`] with solid geometry or entities.
//! [`descent_entities`] and [`sphere_entities`] gather the entities near a
//! sweep or a point without computing a contact.
//!
//! Every query starts a new mark generation in the [`DescentContext`], so an
//! entity linked into several visited leaves is tested once.

mod contact;
mod hull;
mod line;
pub mod narrow;
mod query;

pub use contact::{Contact, Filter, Hit, Intersection, TestType};
pub use hull::{hull_test, shape_test};
pub use line::line_test;
pub use narrow::NarrowContact;
pub use query::{descent_entities, sphere_entities};

use log::warn;
use nalgebra::Point3;

use crate::bsp::{BspTree, Leaf, NodeId, SolidLeaf};
use crate::{DescentContext, SweepShape, World};

use narrow::sweep;

/// Rejects sweeps with NaN or infinite endpoints.
fn valid_sweep(a: Point3<f32>, b: Point3<f32>) -> bool {
    let finite = a.iter().chain(b.iter()).all(|c| c.is_finite());
    if !finite {
        warn!("ignoring sweep with non-finite endpoints {a:?} -> {b:?}");
    }
    finite
}

/// Starts a mark generation with the filter's ignored entities pre-marked.
fn begin_query(ctx: &mut DescentContext, world: &World, filter: &Filter) {
    ctx.next_epoch(world.entities().len());
    for &id in filter.ignore {
        ctx.mark(id);
    }
}

/// Earliest contact between the current sweep and the not yet tested
/// entities linked in `leaf`. An overlap is returned as soon as it is found.
fn leaf_entities(
    ctx: &mut DescentContext,
    world: &World,
    leaf: &Leaf,
    shape: &SweepShape,
    filter: &Filter,
) -> Contact {
    let alt = filter.test.contains(TestType::ALT);
    let (start, end) = (ctx.sweep_start(), ctx.sweep_end());
    let mut best: Option<Hit> = None;

    for &id in leaf.entities() {
        if !ctx.mark(id) {
            continue;
        }
        let Some(entity) = world.entity(id) else {
            continue;
        };
        if filter.skips(entity) {
            continue;
        }
        for placement in entity.placements(alt) {
            match sweep(shape, start, end, &placement) {
                NarrowContact::Overlap { depth, direction } => {
                    return Contact::Intersect(Intersection {
                        depth,
                        direction,
                        entity: Some(id),
                    });
                }
                NarrowContact::Hit {
                    enter,
                    leave,
                    normal,
                } if best.is_none_or(|hit| enter < hit.time_first) => {
                    best = Some(Hit {
                        time_first: enter,
                        time_last: Some(leave),
                        normal,
                        entity: Some(id),
                    });
                }
                _ => {}
            }
        }
    }
    best.map_or(Contact::None, Contact::Hit)
}

/// Shortest way out of a solid leaf for a shape centred at `center`, over
/// the leaf's bounding planes and bevels.
fn leaf_intersection(
    tree: &BspTree,
    leaf: NodeId,
    solid: &SolidLeaf,
    shape: &SweepShape,
    center: Point3<f32>,
) -> Intersection {
    let mut depth = f32::INFINITY;
    let mut direction = nalgebra::Vector3::zeros();
    for plane in tree.leaf_planes(leaf).iter().chain(solid.bevels()) {
        let n = plane.normal();
        let pen = shape.support(&-n) - plane.signed_distance(center);
        if pen < depth {
            depth = pen;
            direction = n;
        }
    }
    Intersection {
        depth: if depth.is_finite() { depth.max(0.0) } else { 0.0 },
        direction,
        entity: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::TreeBuilder;
    use crate::{ConvexHull, Entity, EntityFlags, Plane3D};
    use assert_approx_eq::assert_approx_eq;
    use nalgebra::Vector3;
    use std::sync::Arc;

    #[test]
    fn rejects_non_finite_sweeps() {
        assert!(valid_sweep(Point3::origin(), Point3::new(1.0, 2.0, 3.0)));
        assert!(!valid_sweep(Point3::new(f32::NAN, 0.0, 0.0), Point3::origin()));
        assert!(!valid_sweep(Point3::origin(), Point3::new(0.0, f32::INFINITY, 0.0)));
    }

    #[test]
    fn leaf_intersection_picks_nearest_plane() {
        let mut builder = TreeBuilder::new();
        let solid = builder.solid_leaf(SolidLeaf::default());
        let open = builder.leaf();
        let root = builder.split(Plane3D::new(Vector3::y(), 0.0), solid, open);
        let tree = builder.build(root).unwrap();

        let data = tree.node(solid).leaf().unwrap().solid_data().unwrap().clone();
        let isect = leaf_intersection(&tree, solid, &data, &SweepShape::Point, Point3::new(0.0, -0.3, 0.0));
        assert_approx_eq!(isect.depth, 0.3);
        assert_eq!(isect.direction, Vector3::y());

        // a sphere has to move out by its radius as well
        let isect = leaf_intersection(&tree, solid, &data, &SweepShape::Sphere(1.0), Point3::new(0.0, -0.3, 0.0));
        assert_approx_eq!(isect.depth, 1.3);
    }

    #[test]
    fn leaf_entities_tests_each_entity_once() {
        let mut world = World::new(BspTree::empty());
        let cube = Arc::new(ConvexHull::cuboid(Vector3::new(1.0, 1.0, 1.0)).unwrap());
        let near = world.spawn(Entity::new(Point3::new(4.0, 0.0, 0.0)).with_hull(cube.clone()));
        world.spawn(Entity::new(Point3::new(8.0, 0.0, 0.0)).with_hull(cube.clone()));
        world.spawn(
            Entity::new(Point3::new(2.0, 0.0, 0.0))
                .with_hull(cube)
                .with_flags(EntityFlags::TRIGGER),
        );

        let tree = world.tree();
        let leaf = tree.node(tree.root()).leaf().unwrap();
        let filter = Filter::new(TestType::ENTITIES).with_ignore_flags(EntityFlags::TRIGGER);
        let mut ctx = DescentContext::for_tree(tree);
        begin_query(&mut ctx, &world, &filter);
        ctx.begin(tree, Point3::origin(), Point3::new(10.0, 0.0, 0.0));

        let contact = leaf_entities(&mut ctx, &world, leaf, &SweepShape::Point, &filter);
        assert_eq!(contact.entity(), Some(near));
        assert_approx_eq!(contact.time_first().unwrap(), 0.3);

        // all marked now
        let again = leaf_entities(&mut ctx, &world, leaf, &SweepShape::Point, &filter);
        assert!(again.is_none());
    }
}
