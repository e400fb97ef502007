//! Swept separating-axis test between a moving shape and a placed hull.
//!
//! Every candidate axis contributes two linear "gaps" over the sweep, one per
//! side. A gap that is non-negative at the start means the shapes begin
//! separated along that axis; the sweep enters contact once every gap has
//! gone negative and leaves it as soon as any gap turns positive again. This
//! is the slab clip a ray runs against a brush, generalized to arbitrary axes.
//!
//! The test is exact for polyhedra (face normals of both hulls plus edge
//! cross products cover every face of their Minkowski difference). For a
//! sphere the target's face normals only bound the contact from outside, so
//! the face-axis window is then narrowed to where the sphere really reaches
//! the hull, rounding its edges and corners.

use nalgebra::{Point3, Vector3};

use crate::{Placement, SweepShape};

/// Edge cross products shorter than this are parallel edges and skipped.
const AXIS_EPSILON: f32 = 1e-6;

/// Golden-section steps when looking for a sphere's deepest point.
const SEARCH_STEPS: usize = 48;

/// Bisection steps when locating a sphere's first and last touch.
const BISECT_STEPS: usize = 32;

const INV_PHI: f32 = 0.618_034;

/// Outcome of a narrow-phase sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NarrowContact {
    Miss,
    /// First contact at sweep fraction `enter`, separation again at `leave`.
    Hit {
        enter: f32,
        leave: f32,
        normal: Vector3<f32>,
    },
    /// Overlapping at the start; moving the shape by `depth` along
    /// `direction` separates them.
    Overlap {
        depth: f32,
        direction: Vector3<f32>,
    },
}

/// Order-independent clip of a sweep against a set of half-space gaps.
///
/// Entering constraints raise `enter` (keeping the normal of the latest one),
/// leaving constraints lower `leave`; the result does not depend on the order
/// the gaps are fed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SlabClip {
    enter: f32,
    leave: f32,
    normal: Vector3<f32>,
    outside: bool,
    missed: bool,
}

/// Result of a [`SlabClip`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Slab {
    Miss,
    Hit { enter: f32, normal: Vector3<f32> },
    Overlap,
}

impl SlabClip {
    /// A sweep that may start inside every half-space.
    pub(crate) fn new() -> Self {
        Self {
            enter: -1.0,
            leave: 1.0,
            normal: Vector3::zeros(),
            outside: false,
            missed: false,
        }
    }

    /// A sweep already known to enter at its start, through a plane with
    /// `normal`.
    pub(crate) fn entered(normal: Vector3<f32>) -> Self {
        Self {
            enter: 0.0,
            normal,
            outside: true,
            ..Self::new()
        }
    }

    /// Adds one half-space gap, `g0` at the start and `g1` at the end; the
    /// sweep is clear of the half-space where the gap is non-negative.
    ///
    /// Returns `false` once the sweep provably misses.
    pub(crate) fn clip(&mut self, g0: f32, g1: f32, normal: Vector3<f32>) -> bool {
        if self.missed {
            return false;
        }
        if g0 >= 0.0 {
            self.outside = true;
            // never gets closer, or only after the end
            if g1 >= g0 {
                self.missed = true;
                return false;
            }
            let f = g0 / (g0 - g1);
            if f > 1.0 {
                self.missed = true;
                return false;
            }
            if f > self.enter {
                self.enter = f;
                self.normal = normal;
            }
        } else if g1 > 0.0 {
            let f = g0 / (g0 - g1);
            if f < self.leave {
                self.leave = f;
            }
        }
        true
    }

    pub(crate) fn finish(&self) -> Slab {
        if self.missed {
            Slab::Miss
        } else if !self.outside {
            Slab::Overlap
        } else if self.enter < self.leave {
            Slab::Hit {
                enter: self.enter,
                normal: self.normal,
            }
        } else {
            Slab::Miss
        }
    }

    #[inline]
    pub(crate) fn leave(&self) -> f32 {
        self.leave
    }
}

/// Sweeps `shape` from `a` to `b` against `target`.
pub fn sweep(
    shape: &SweepShape,
    a: Point3<f32>,
    b: Point3<f32>,
    target: &Placement,
) -> NarrowContact {
    let mut slab = SlabClip::new();
    let mut depth = f32::INFINITY;
    let mut direction = Vector3::zeros();

    for n in separating_axes(shape, target) {
        let t_max = target.support(&n);
        let t_min = -target.support(&-n);
        let (front, back) = shape.extents(&n);
        let (ca, cb) = (a.coords.dot(&n), b.coords.dot(&n));

        // clear on the +n side, then on the -n side
        let (p0, p1) = (ca - back - t_max, cb - back - t_max);
        let (q0, q1) = (t_min - ca - front, t_min - cb - front);
        if !slab.clip(p0, p1, n) || !slab.clip(q0, q1, -n) {
            return NarrowContact::Miss;
        }

        if -p0 < depth {
            depth = -p0;
            direction = n;
        }
        if -q0 < depth {
            depth = -q0;
            direction = -n;
        }
    }

    let contact = match slab.finish() {
        Slab::Miss => NarrowContact::Miss,
        Slab::Hit { enter, normal } => NarrowContact::Hit {
            enter,
            leave: slab.leave(),
            normal,
        },
        Slab::Overlap => NarrowContact::Overlap { depth, direction },
    };
    match *shape {
        SweepShape::Sphere(radius) if radius > 0.0 => {
            round_sphere(contact, radius, a, b, target, slab.leave())
        }
        _ => contact,
    }
}

/// Distance from `point` to the placed hull less `radius`, and the unit
/// direction from the hull towards `point` (zero when `point` is inside).
fn sphere_gap(target: &Placement, radius: f32, point: Point3<f32>) -> (f32, Vector3<f32>) {
    let local = Point3::from(
        target
            .orientation
            .inverse_transform_vector(&(point - target.position)),
    );
    let offset = local - target.hull.closest_point(local);
    let dist = offset.norm();
    let direction = if dist > 0.0 {
        target.orientation * (offset / dist)
    } else {
        Vector3::zeros()
    };
    (dist - radius, direction)
}

/// Narrows a face-axis result for a sphere to the window where the sphere
/// actually reaches the hull.
///
/// The gap along the sweep is convex, so inside the face-axis window it has
/// one minimum; the sphere touches iff that minimum is negative, and the
/// touches are the two roots around it.
fn round_sphere(
    contact: NarrowContact,
    radius: f32,
    a: Point3<f32>,
    b: Point3<f32>,
    target: &Placement,
    face_leave: f32,
) -> NarrowContact {
    let gap = |t: f32| sphere_gap(target, radius, a + (b - a) * t);

    let (lo, hi, face_normal) = match contact {
        NarrowContact::Miss => return NarrowContact::Miss,
        NarrowContact::Overlap { .. } => {
            let (g, direction) = gap(0.0);
            if g < 0.0 {
                if direction == Vector3::zeros() {
                    // centre inside: the nearest face is the way out
                    return contact;
                }
                return NarrowContact::Overlap {
                    depth: -g,
                    direction,
                };
            }
            (0.0, face_leave, direction)
        }
        NarrowContact::Hit { enter, leave, normal } => (enter, leave, normal),
    };

    let (g_lo, n_lo) = gap(lo);
    let (enter, deepest) = if g_lo <= 0.0 {
        (lo, lo)
    } else {
        let (mut x0, mut x1) = (lo, hi);
        for _ in 0..SEARCH_STEPS {
            let m0 = x1 - (x1 - x0) * INV_PHI;
            let m1 = x0 + (x1 - x0) * INV_PHI;
            if gap(m0).0 < gap(m1).0 {
                x1 = m1;
            } else {
                x0 = m0;
            }
        }
        let deepest = 0.5 * (x0 + x1);
        if gap(deepest).0 >= 0.0 {
            return NarrowContact::Miss;
        }
        (last_clear(&gap, lo, deepest), deepest)
    };
    let leave = if gap(hi).0 < 0.0 {
        hi
    } else {
        last_clear(&gap, hi, deepest)
    };

    let normal = if enter == lo { n_lo } else { gap(enter).1 };
    NarrowContact::Hit {
        enter,
        leave,
        normal: if normal == Vector3::zeros() {
            face_normal
        } else {
            normal
        },
    }
}

/// Bisects between a clear time and an overlapping one, returning the clear
/// side of the boundary.
fn last_clear<F>(gap: &F, mut clear: f32, mut overlapping: f32) -> f32
where
    F: Fn(f32) -> (f32, Vector3<f32>),
{
    for _ in 0..BISECT_STEPS {
        let mid = 0.5 * (clear + overlapping);
        if gap(mid).0 < 0.0 {
            overlapping = mid;
        } else {
            clear = mid;
        }
    }
    clear
}

/// Unit axes to test: target faces, then (for hulls) the moving hull's faces
/// and every edge-edge cross product.
fn separating_axes(shape: &SweepShape, target: &Placement) -> Vec<Vector3<f32>> {
    let mut axes: Vec<Vector3<f32>> = target
        .hull
        .planes()
        .iter()
        .map(|p| target.orientation * p.normal())
        .collect();

    let SweepShape::Hull { .. } = shape else {
        return axes;
    };
    axes.extend(shape.face_normals());

    let target_edges: Vec<Vector3<f32>> = target
        .hull
        .edges()
        .iter()
        .map(|e| target.orientation * e)
        .collect();
    for e in shape.edge_directions() {
        for t in &target_edges {
            let axis = e.cross(t);
            let len = axis.norm();
            if len > AXIS_EPSILON {
                axes.push(axis / len);
            }
        }
    }
    axes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConvexHull, Plane3D};
    use assert_approx_eq::assert_approx_eq;
    use nalgebra::UnitQuaternion;
    use std::f32::consts::FRAC_PI_4;

    fn cube(half: f32) -> ConvexHull {
        ConvexHull::cuboid(Vector3::new(half, half, half)).unwrap()
    }

    #[test]
    fn slab_takes_latest_entry_whatever_the_order() {
        let x = Vector3::x();
        let y = Vector3::y();
        // x gap closes at 0.25, y gap at 0.5
        let gaps = [(1.0, -3.0, x), (2.0, -2.0, y)];

        for order in [[0, 1], [1, 0]] {
            let mut slab = SlabClip::new();
            for i in order {
                let (g0, g1, n) = gaps[i];
                assert!(slab.clip(g0, g1, n));
            }
            assert_eq!(slab.finish(), Slab::Hit { enter: 0.5, normal: y });
        }
    }

    #[test]
    fn slab_leaving_before_entering_misses() {
        let mut slab = SlabClip::new();
        assert!(slab.clip(1.0, -1.0, Vector3::x()));
        // already inside, leaves at 0.25
        assert!(slab.clip(-1.0, 3.0, Vector3::y()));
        assert_eq!(slab.finish(), Slab::Miss);
    }

    #[test]
    fn slab_moving_away_misses() {
        let mut slab = SlabClip::new();
        assert!(!slab.clip(1.0, 2.0, Vector3::x()));
        assert!(!slab.clip(-1.0, -1.0, Vector3::y()));
        assert_eq!(slab.finish(), Slab::Miss);
    }

    #[test]
    fn slab_inside_everything_overlaps() {
        let mut slab = SlabClip::new();
        assert!(slab.clip(-1.0, -2.0, Vector3::x()));
        assert_eq!(slab.finish(), Slab::Overlap);
    }

    #[test]
    fn slab_entered_keeps_entry_normal_until_beaten() {
        let mut slab = SlabClip::entered(-Vector3::x());
        assert!(slab.clip(-1.0, -1.0, Vector3::y()));
        assert_eq!(
            slab.finish(),
            Slab::Hit {
                enter: 0.0,
                normal: -Vector3::x()
            }
        );
        assert!(slab.clip(1.0, -1.0, Vector3::z()));
        assert_eq!(slab.finish(), Slab::Hit { enter: 0.5, normal: Vector3::z() });
    }

    #[test]
    fn point_hits_box_face() {
        let target = cube(1.0);
        let placed = Placement::new(&target, Point3::new(5.0, 0.0, 0.0), UnitQuaternion::identity());
        let result = sweep(&SweepShape::Point, Point3::origin(), Point3::new(10.0, 0.0, 0.0), &placed);
        match result {
            NarrowContact::Hit { enter, leave, normal } => {
                assert_approx_eq!(enter, 0.4);
                assert_approx_eq!(leave, 0.6);
                assert_approx_eq!(normal.x, -1.0);
            }
            other => panic!("expected hit, got {other:?}"),
        }
    }

    #[test]
    fn box_hits_box_earlier_by_its_extent() {
        let target = cube(1.0);
        let mover = cube(1.0);
        let placed = Placement::new(&target, Point3::new(5.0, 0.0, 0.0), UnitQuaternion::identity());
        let shape = SweepShape::hull(&mover, UnitQuaternion::identity());
        let result = sweep(&shape, Point3::origin(), Point3::new(10.0, 0.0, 0.0), &placed);
        let NarrowContact::Hit { enter, leave, .. } = result else {
            panic!("expected hit, got {result:?}");
        };
        assert_approx_eq!(enter, 0.3);
        assert_approx_eq!(leave, 0.7);
    }

    #[test]
    fn rotated_box_reaches_further() {
        let target = cube(1.0);
        let mover = cube(1.0);
        let placed = Placement::new(&target, Point3::new(5.0, 0.0, 0.0), UnitQuaternion::identity());
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_4);
        let shape = SweepShape::hull(&mover, rotation);
        let NarrowContact::Hit { enter, .. } =
            sweep(&shape, Point3::origin(), Point3::new(10.0, 0.0, 0.0), &placed)
        else {
            panic!("expected hit");
        };
        // corner leads by sqrt(2)
        assert_approx_eq!(enter, (4.0 - std::f32::consts::SQRT_2) / 10.0, 1e-4);
    }

    #[test]
    fn passing_beside_misses() {
        let target = cube(1.0);
        let placed = Placement::new(&target, Point3::new(5.0, 3.0, 0.0), UnitQuaternion::identity());
        let shape = SweepShape::Sphere(1.5);
        let result = sweep(&shape, Point3::origin(), Point3::new(10.0, 0.0, 0.0), &placed);
        assert_eq!(result, NarrowContact::Miss);
    }

    #[test]
    fn starting_inside_gives_shortest_way_out() {
        let target = cube(2.0);
        let placed = Placement::new(&target, Point3::origin(), UnitQuaternion::identity());
        let result = sweep(
            &SweepShape::Point,
            Point3::new(0.0, 1.5, 0.0),
            Point3::new(0.0, 1.5, 0.0),
            &placed,
        );
        let NarrowContact::Overlap { depth, direction } = result else {
            panic!("expected overlap, got {result:?}");
        };
        assert_approx_eq!(depth, 0.5);
        assert_approx_eq!(direction.y, 1.0);
    }

    #[test]
    fn touching_is_not_overlap() {
        let target = cube(1.0);
        let placed = Placement::new(&target, Point3::origin(), UnitQuaternion::identity());
        let result = sweep(
            &SweepShape::Point,
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            &placed,
        );
        assert_eq!(result, NarrowContact::Miss);
    }

    #[test]
    fn sloped_face_normal_is_reported() {
        let wedge = ConvexHull::from_planes(vec![
            Plane3D::new(Vector3::new(-1.0, 1.0, 0.0), 0.0),
            Plane3D::axial(0, 4.0, true),
            Plane3D::axial(1, 0.0, false),
            Plane3D::axial(2, 1.0, true),
            Plane3D::axial(2, -1.0, false),
        ])
        .unwrap();
        let placed = Placement::world(&wedge);
        let result = sweep(
            &SweepShape::Point,
            Point3::new(2.0, 4.0, 0.0),
            Point3::new(2.0, -4.0, 0.0),
            &placed,
        );
        let NarrowContact::Hit { enter, normal, .. } = result else {
            panic!("expected hit, got {result:?}");
        };
        // slope y = x reached at y = 2
        assert_approx_eq!(enter, 0.25);
        assert_approx_eq!(normal.x, -std::f32::consts::FRAC_1_SQRT_2);
        assert_approx_eq!(normal.y, std::f32::consts::FRAC_1_SQRT_2);
    }

    #[test]
    fn sphere_rounds_the_edge_it_passes() {
        let target = cube(1.0);
        let placed = Placement::world(&target);
        let result = sweep(
            &SweepShape::Sphere(1.0),
            Point3::new(1.9, 5.0, 0.0),
            Point3::new(1.9, -5.0, 0.0),
            &placed,
        );
        let NarrowContact::Hit { enter, leave, normal } = result else {
            panic!("expected hit, got {result:?}");
        };
        // centre one radius from the edge x = y = 1: y = 1 + sqrt(0.19)
        let rise = 0.19f32.sqrt();
        assert_approx_eq!(enter, (4.0 - rise) / 10.0, 1e-4);
        assert_approx_eq!(leave, (6.0 + rise) / 10.0, 1e-4);
        assert_approx_eq!(normal.x, 0.9, 1e-3);
        assert_approx_eq!(normal.y, rise, 1e-3);
    }

    #[test]
    fn sphere_face_contact_is_unchanged() {
        let target = cube(1.0);
        let placed = Placement::world(&target);
        let result = sweep(
            &SweepShape::Sphere(0.5),
            Point3::new(0.2, 5.0, 0.0),
            Point3::new(0.2, -5.0, 0.0),
            &placed,
        );
        let NarrowContact::Hit { enter, normal, .. } = result else {
            panic!("expected hit, got {result:?}");
        };
        assert_approx_eq!(enter, 0.35, 1e-4);
        assert_approx_eq!(normal.y, 1.0, 1e-3);
    }

    #[test]
    fn sphere_clear_of_corner_misses() {
        let target = cube(1.0);
        let placed = Placement::world(&target);
        let centre = Point3::new(1.8, 1.8, 0.0);
        let result = sweep(&SweepShape::Sphere(1.0), centre, centre, &placed);
        assert_eq!(result, NarrowContact::Miss);

        // inside every face slab of the turned cube but clear of its top edge
        let result = sweep(
            &SweepShape::Sphere(1.0),
            Point3::new(-5.0, 2.6, 0.0),
            Point3::new(5.0, 2.6, 0.0),
            &Placement::new(
                &target,
                Point3::origin(),
                UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_4),
            ),
        );
        assert_eq!(result, NarrowContact::Miss);
    }

    #[test]
    fn sphere_overlapping_an_edge_pushes_out_diagonally() {
        let target = cube(1.0);
        let placed = Placement::world(&target);
        let centre = Point3::new(1.5, 1.5, 0.0);
        let result = sweep(&SweepShape::Sphere(1.0), centre, centre, &placed);
        let NarrowContact::Overlap { depth, direction } = result else {
            panic!("expected overlap, got {result:?}");
        };
        assert_approx_eq!(depth, 1.0 - 0.5f32.sqrt(), 1e-4);
        assert_approx_eq!(direction.x, std::f32::consts::FRAC_1_SQRT_2, 1e-4);
        assert_approx_eq!(direction.y, std::f32::consts::FRAC_1_SQRT_2, 1e-4);
    }
}
