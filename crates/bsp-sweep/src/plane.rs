//! Plane representation and side tests shared by the tree, the hulls and the
//! sweep tests.

use nalgebra::{Point3, Vector3};

/// Default epsilon for plane classification.
/// Points within this distance of the plane are considered "on" the plane.
pub const PLANE_EPSILON: f32 = 1e-5;

/// Tolerance used when comparing two planes for equality (normal and offset).
const PLANE_MATCH_EPSILON: f32 = 1e-4;

/// Which side of a plane a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// Point is in front of the plane (positive side of normal)
    Front,
    /// Point is behind the plane (negative side of normal)
    Back,
    /// Point lies on the plane (within epsilon tolerance)
    OnPlane,
}

/// Classification of a convex volume relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// All vertices are in front of the plane
    Front,
    /// All vertices are behind the plane
    Back,
    /// All vertices are on the plane (flat volume)
    Coplanar,
    /// Vertices are on both sides (spans the plane)
    Spanning,
}

/// A plane in 3D space, represented as `normal · point = offset`.
///
/// BSP splitting planes send points with `signed_distance >= 0` to the right
/// (front) child and everything else to the left (back) child. Planes bounding
/// a solid volume use outward-facing normals.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plane3D {
    normal: Vector3<f32>,
    offset: f32,
}

impl Plane3D {
    /// Creates a new plane from a normal vector and offset.
    /// The normal will be normalized automatically.
    ///
    /// # Panics
    /// Panics if the normal vector has zero length.
    pub fn new(normal: Vector3<f32>, offset: f32) -> Self {
        let norm = normal.norm();
        assert!(norm > f32::EPSILON, "Plane normal cannot be zero");
        Self {
            normal: normal / norm,
            offset: offset / norm,
        }
    }

    /// Axis-aligned plane `point[axis] = offset` facing `+axis` (or `-axis`
    /// when `positive` is false).
    pub fn axial(axis: usize, offset: f32, positive: bool) -> Self {
        let mut normal = Vector3::zeros();
        if positive {
            normal[axis] = 1.0;
            Self { normal, offset }
        } else {
            normal[axis] = -1.0;
            Self {
                normal,
                offset: -offset,
            }
        }
    }

    /// Returns the unit normal vector of the plane.
    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    /// Returns the signed distance from the origin to the plane along the normal.
    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Computes the signed distance from a point to the plane.
    /// - Positive: point is in front (same side as normal)
    /// - Negative: point is behind (opposite side from normal)
    /// - Zero: point is on the plane
    #[inline]
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        self.normal.dot(&point.coords) - self.offset
    }

    /// Side of the plane `point` is on, within [`PLANE_EPSILON`].
    pub fn classify_point(&self, point: Point3<f32>) -> PlaneSide {
        let dist = self.signed_distance(point);
        if dist > PLANE_EPSILON {
            PlaneSide::Front
        } else if dist < -PLANE_EPSILON {
            PlaneSide::Back
        } else {
            PlaneSide::OnPlane
        }
    }

    /// Classifies a set of points (the vertices of a convex volume).
    pub fn classify_points<'a, I>(&self, points: I) -> Classification
    where
        I: IntoIterator<Item = &'a Point3<f32>>,
    {
        let mut front = 0;
        let mut back = 0;
        let mut total = 0;

        for point in points {
            total += 1;
            match self.classify_point(*point) {
                PlaneSide::Front => front += 1,
                PlaneSide::Back => back += 1,
                PlaneSide::OnPlane => {}
            }
        }

        if front == 0 && back == 0 && total > 0 {
            Classification::Coplanar
        } else if back == 0 {
            Classification::Front
        } else if front == 0 {
            Classification::Back
        } else {
            Classification::Spanning
        }
    }

    /// Returns a new plane with the normal flipped (facing the opposite direction).
    #[inline]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }

    /// Returns `true` if both planes describe the same oriented plane, within
    /// a small tolerance.
    pub fn approx_eq(&self, other: &Plane3D) -> bool {
        self.normal.dot(&other.normal) > 1.0 - PLANE_MATCH_EPSILON
            && (self.offset - other.offset).abs() < PLANE_MATCH_EPSILON
    }

    /// Returns the axis index if the normal is aligned with a coordinate axis.
    pub fn axis(&self) -> Option<usize> {
        (0..3).find(|&i| (self.normal[i].abs() - 1.0).abs() < PLANE_MATCH_EPSILON)
    }

    /// Intersection point of three planes, if they meet in a single point.
    pub fn intersect_three(a: &Plane3D, b: &Plane3D, c: &Plane3D) -> Option<Point3<f32>> {
        let n_bc = b.normal.cross(&c.normal);
        let denom = a.normal.dot(&n_bc);
        if denom.abs() < 1e-6 {
            return None;
        }
        let n_ca = c.normal.cross(&a.normal);
        let n_ab = a.normal.cross(&b.normal);
        let p = (n_bc * a.offset + n_ca * b.offset + n_ab * c.offset) / denom;
        Some(Point3::from(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn new_normalizes_normal_and_offset() {
        let plane = Plane3D::new(Vector3::new(0.0, 2.0, 0.0), 4.0);
        assert_approx_eq!(plane.normal().norm(), 1.0);
        assert_approx_eq!(plane.offset(), 2.0);
    }

    #[test]
    fn signed_distance_sign_matches_side() {
        let plane = Plane3D::new(Vector3::new(1.0, 0.0, 0.0), 1.0);
        assert_approx_eq!(plane.signed_distance(Point3::new(3.0, 0.0, 0.0)), 2.0);
        assert_approx_eq!(plane.signed_distance(Point3::new(0.0, 5.0, 0.0)), -1.0);
        assert_eq!(plane.classify_point(Point3::new(1.0, 9.0, 9.0)), PlaneSide::OnPlane);
    }

    #[test]
    fn axial_planes_face_requested_direction() {
        let pos = Plane3D::axial(2, 3.0, true);
        let neg = Plane3D::axial(2, 3.0, false);
        assert_approx_eq!(pos.signed_distance(Point3::new(0.0, 0.0, 4.0)), 1.0);
        assert_approx_eq!(neg.signed_distance(Point3::new(0.0, 0.0, 2.0)), 1.0);
        assert_eq!(pos.axis(), Some(2));
        assert!(pos.flipped().approx_eq(&neg));
    }

    #[test]
    fn classify_points_spanning() {
        let plane = Plane3D::new(Vector3::new(0.0, 1.0, 0.0), 0.0);
        let points = [Point3::new(0.0, -1.0, 0.0), Point3::new(0.0, 1.0, 0.0)];
        assert_eq!(plane.classify_points(&points), Classification::Spanning);
        let above = [Point3::new(0.0, 1.0, 0.0), Point3::new(0.0, 0.0, 0.0)];
        assert_eq!(plane.classify_points(&above), Classification::Front);
    }

    #[test]
    fn three_axial_planes_meet_at_corner() {
        let p = Plane3D::intersect_three(
            &Plane3D::axial(0, 1.0, true),
            &Plane3D::axial(1, 2.0, true),
            &Plane3D::axial(2, -3.0, false),
        )
        .unwrap();
        assert_approx_eq!(p.x, 1.0);
        assert_approx_eq!(p.y, 2.0);
        assert_approx_eq!(p.z, -3.0);
    }
}
