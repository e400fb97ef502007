use log::{debug, trace};
use nalgebra::{Point3, UnitQuaternion};

use crate::bsp::{BspTree, SolidLeaf};
use crate::descent::StackEntry;
use crate::{ConvexHull, DescentContext, Placement, SweepShape, World};

use super::narrow::{sweep, NarrowContact, Slab, SlabClip};
use super::{
    begin_query, leaf_entities, leaf_intersection, valid_sweep, Contact, Filter, Hit,
    Intersection, TestType,
};

/// Sweeps `hull` under `orientation` from `a` to `b` and returns its first
/// contact.
///
/// Unlike a line, a hull can touch a leaf visited later before one visited
/// earlier, so a candidate hit only ends the search once every pending leaf
/// is entered at or after it.
pub fn hull_test(
    ctx: &mut DescentContext,
    world: &World,
    hull: &ConvexHull,
    a: Point3<f32>,
    b: Point3<f32>,
    orientation: UnitQuaternion<f32>,
    filter: &Filter,
) -> Contact {
    shape_test(ctx, world, &SweepShape::hull(hull, orientation), a, b, filter)
}

/// [`hull_test`] for any sweep shape.
pub fn shape_test(
    ctx: &mut DescentContext,
    world: &World,
    shape: &SweepShape,
    a: Point3<f32>,
    b: Point3<f32>,
    filter: &Filter,
) -> Contact {
    if !valid_sweep(a, b) {
        return Contact::None;
    }
    let tree = world.tree();
    begin_query(ctx, world, filter);
    ctx.begin(tree, a, b);

    let mut best: Option<Hit> = None;
    while let Some(&entry) = ctx.top() {
        if best.is_some_and(|hit| entry.t_a >= hit.time_first) {
            ctx.pop();
            continue;
        }
        let Some(leaf) = tree.node(entry.node).leaf() else {
            ctx.descend_shape(tree, shape);
            continue;
        };
        ctx.pop();
        trace!("hull leaf {:?} at t {}..{}", entry.node, entry.t_a, entry.t_b);

        let contact = match leaf.solid_data() {
            Some(solid) if filter.test.contains(TestType::TREE) => {
                solid_contact(tree, &entry, solid, shape, a, b)
            }
            None if filter.test.contains(TestType::ENTITIES) => {
                leaf_entities(ctx, world, leaf, shape, filter)
            }
            _ => Contact::None,
        };
        match contact {
            Contact::Intersect(isect) => {
                debug!(
                    "hull starts inside {:?} in leaf {:?}, depth {}",
                    isect.entity, entry.node, isect.depth
                );
                return Contact::Intersect(isect);
            }
            Contact::Hit(hit) if best.is_none_or(|prev| hit.time_first < prev.time_first) => {
                best = Some(hit);
            }
            _ => {}
        }
    }
    best.map_or(Contact::None, Contact::Hit)
}

/// Contact with one solid leaf reached by `entry`.
///
/// The leaf entry is refined by the bevel planes; a precise hull, when
/// present, has the last word unless both it and the shape are unrotated
/// boxes, where the axial planes are already exact.
fn solid_contact(
    tree: &BspTree,
    entry: &StackEntry,
    solid: &SolidLeaf,
    shape: &SweepShape,
    start: Point3<f32>,
    end: Point3<f32>,
) -> Contact {
    let mut slab = if entry.has_start {
        SlabClip::new()
    } else {
        SlabClip::entered(entry.normal)
    };
    for bevel in solid.bevels() {
        let n = bevel.normal();
        let back = shape.support(&-n);
        let g0 = bevel.signed_distance(entry.a) - back;
        let g1 = bevel.signed_distance(entry.b) - back;
        if !slab.clip(g0, g1, n) {
            return Contact::None;
        }
    }
    let slab = slab.finish();
    if slab == Slab::Miss {
        return Contact::None;
    }

    let precise = solid
        .hull()
        .filter(|brush| !(shape.is_axis_aligned_box() && brush.is_axis_aligned_box()));
    if let Some(brush) = precise {
        return match sweep(shape, start, end, &Placement::world(brush)) {
            NarrowContact::Miss => Contact::None,
            NarrowContact::Hit { enter, normal, .. } => Contact::Hit(Hit {
                time_first: enter,
                time_last: None,
                normal,
                entity: None,
            }),
            NarrowContact::Overlap { depth, direction } => Contact::Intersect(Intersection {
                depth,
                direction,
                entity: None,
            }),
        };
    }

    match slab {
        Slab::Miss => Contact::None,
        Slab::Hit { enter, normal } => Contact::Hit(Hit {
            time_first: entry.global_time(enter),
            time_last: None,
            normal,
            entity: None,
        }),
        Slab::Overlap => {
            Contact::Intersect(leaf_intersection(tree, entry.node, solid, shape, start))
        }
    }
}
