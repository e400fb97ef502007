use log::{debug, trace};
use nalgebra::Point3;

use crate::{DescentContext, SweepShape, World};

use super::{
    begin_query, leaf_entities, leaf_intersection, valid_sweep, Contact, Filter, Hit, TestType,
};

/// Sweeps a line segment from `a` to `b` and returns its first contact.
///
/// Leaves are visited in the order the segment enters them, so the first
/// solid leaf entered is final up to the nearest pending
/// [`Copy`](crate::DescentOp::Copy) entry; everything above it is dropped.
/// Starting inside a solid leaf or an entity is an immediate
/// [`Contact::Intersect`].
///
/// ```
/// use bsp_sweep::{line_test, BspTree, ConvexHull, DescentContext, Filter, TestType, World};
/// use nalgebra::{Point3, Vector3};
///
/// let wall = ConvexHull::from_box(Point3::new(4.0, -8.0, -8.0), Point3::new(6.0, 8.0, 8.0)).unwrap();
/// let world = World::new(BspTree::from_brushes(vec![wall]));
/// let mut ctx = DescentContext::for_tree(world.tree());
///
/// let contact = line_test(
///     &mut ctx,
///     &world,
///     Point3::origin(),
///     Point3::new(10.0, 0.0, 0.0),
///     &Filter::new(TestType::TREE),
/// );
/// assert!((contact.time_first().unwrap() - 0.4).abs() < 1e-5);
/// assert_eq!(contact.normal(), Some(-Vector3::x()));
/// ```
pub fn line_test(
    ctx: &mut DescentContext,
    world: &World,
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
            ctx.line_descend(tree);
            continue;
        };
        ctx.pop();
        trace!("line leaf {:?} at t {}..{}", entry.node, entry.t_a, entry.t_b);

        if let Some(solid) = leaf.solid_data() {
            if !filter.test.contains(TestType::TREE) {
                continue;
            }
            if entry.has_start {
                let isect = leaf_intersection(tree, entry.node, solid, &SweepShape::Point, a);
                debug!("line starts in solid leaf {:?}, depth {}", entry.node, isect.depth);
                return Contact::Intersect(isect);
            }
            best = Some(Hit {
                time_first: entry.t_a,
                time_last: None,
                normal: entry.normal,
                entity: None,
            });
            ctx.pop_to_next_op();
        } else if filter.test.contains(TestType::ENTITIES) {
            match leaf_entities(ctx, world, leaf, &SweepShape::Point, filter) {
                Contact::Intersect(isect) => {
                    debug!("line starts inside entity {:?}", isect.entity);
                    return Contact::Intersect(isect);
                }
                Contact::Hit(hit) if best.is_none_or(|prev| hit.time_first < prev.time_first) => {
                    best = Some(hit);
                    if hit.time_first <= entry.t_b {
                        ctx.pop_to_next_op();
                    }
                }
                _ => {}
            }
        }
    }
    best.map_or(Contact::None, Contact::Hit)
}
