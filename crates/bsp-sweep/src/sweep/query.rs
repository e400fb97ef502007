use nalgebra::{Point3, UnitQuaternion};

use crate::bsp::CollectingVisitor;
use crate::{ConvexHull, DescentContext, EntityId, SweepShape, World};

use super::narrow::{sweep, NarrowContact};
use super::{begin_query, valid_sweep, Filter};

/// Entities linked in the leaves `hull` passes through from `a` to `b`, in
/// descent order and without duplicates. No contact is computed.
pub fn descent_entities(
    ctx: &mut DescentContext,
    world: &World,
    hull: &ConvexHull,
    orientation: UnitQuaternion<f32>,
    a: Point3<f32>,
    b: Point3<f32>,
    filter: &Filter,
) -> Vec<EntityId> {
    if !valid_sweep(a, b) {
        return Vec::new();
    }
    let shape = SweepShape::hull(hull, orientation);
    gather(ctx, world, &shape, a, b, filter, |_, _| true)
}

/// Entities whose hulls come within `radius` of `center`.
///
/// Entities without a hull count by their position.
pub fn sphere_entities(
    ctx: &mut DescentContext,
    world: &World,
    center: Point3<f32>,
    radius: f32,
    filter: &Filter,
) -> Vec<EntityId> {
    if !valid_sweep(center, center) {
        return Vec::new();
    }
    let shape = SweepShape::Sphere(radius);
    gather(ctx, world, &shape, center, center, filter, |id, world| {
        let Some(entity) = world.entity(id) else {
            return false;
        };
        let placements = entity.placements(false);
        if placements.is_empty() {
            return (entity.position() - center).norm() <= radius;
        }
        placements.iter().any(|placement| {
            matches!(
                sweep(&shape, center, center, placement),
                NarrowContact::Overlap { .. }
            )
        })
    })
}

/// Unmarked, unfiltered entities linked in the leaves of a descent that
/// pass `keep`.
fn gather<F>(
    ctx: &mut DescentContext,
    world: &World,
    shape: &SweepShape,
    a: Point3<f32>,
    b: Point3<f32>,
    filter: &Filter,
    keep: F,
) -> Vec<EntityId>
where
    F: Fn(EntityId, &World) -> bool,
{
    let tree = world.tree();
    begin_query(ctx, world, filter);
    let mut visitor = CollectingVisitor::new();
    ctx.visit_leaves(tree, shape, a, b, &mut visitor);

    let mut found = Vec::new();
    for &leaf in visitor.leaves() {
        let Some(leaf) = tree.node(leaf).leaf() else {
            continue;
        };
        for &id in leaf.entities() {
            if !ctx.mark(id) {
                continue;
            }
            let skipped = world.entity(id).is_none_or(|entity| filter.skips(entity));
            if !skipped && keep(id, world) {
                found.push(id);
            }
        }
    }
    found
}
