//! The shapes a sweep can carry through the tree.

use nalgebra::{Point3, UnitQuaternion, Vector3};

use crate::ConvexHull;

/// Rotation angle (radians) below which an orientation counts as identity.
const IDENTITY_ANGLE_EPSILON: f32 = 1e-6;

/// A shape swept along a segment, centred on the moving point.
#[derive(Debug, Clone, Copy)]
pub enum SweepShape<'a> {
    /// A bare point: the sweep is a line segment.
    Point,
    /// A sphere of the given radius.
    Sphere(f32),
    /// A convex hull under a fixed orientation.
    Hull {
        hull: &'a ConvexHull,
        orientation: UnitQuaternion<f32>,
    },
}

impl<'a> SweepShape<'a> {
    /// A hull shape.
    pub fn hull(hull: &'a ConvexHull, orientation: UnitQuaternion<f32>) -> Self {
        SweepShape::Hull { hull, orientation }
    }

    /// World-space support distance along `dir`.
    ///
    /// Zero for points; a negative sphere radius is treated as zero.
    pub fn support(&self, dir: &Vector3<f32>) -> f32 {
        match self {
            SweepShape::Point => 0.0,
            SweepShape::Sphere(radius) => (*radius).max(0.0) * dir.norm(),
            SweepShape::Hull { hull, orientation } => {
                hull.support(&orientation.inverse_transform_vector(dir))
            }
        }
    }

    /// `(support(n), support(-n))`: how far the shape reaches in front of and
    /// behind its centre relative to a plane normal.
    #[inline]
    pub fn extents(&self, normal: &Vector3<f32>) -> (f32, f32) {
        (self.support(normal), self.support(&-normal))
    }

    /// Returns `true` when the shape has no extent at all.
    pub fn is_point(&self) -> bool {
        match self {
            SweepShape::Point => true,
            SweepShape::Sphere(radius) => *radius <= 0.0,
            SweepShape::Hull { .. } => false,
        }
    }

    /// Returns `true` for an axis-aligned box hull with no rotation, whose
    /// contact against axial geometry is already exact from plane tests.
    pub fn is_axis_aligned_box(&self) -> bool {
        match self {
            SweepShape::Hull { hull, orientation } => {
                hull.is_axis_aligned_box() && orientation.angle() < IDENTITY_ANGLE_EPSILON
            }
            _ => false,
        }
    }

    /// World-space face normals (empty for points and spheres).
    pub fn face_normals(&self) -> Vec<Vector3<f32>> {
        match self {
            SweepShape::Hull { hull, orientation } => hull
                .planes()
                .iter()
                .map(|p| orientation * p.normal())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// World-space edge directions (empty for points and spheres).
    pub fn edge_directions(&self) -> Vec<Vector3<f32>> {
        match self {
            SweepShape::Hull { hull, orientation } => {
                hull.edges().iter().map(|e| orientation * e).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// A hull fixed in world space: the target side of a narrow-phase test.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub hull: &'a ConvexHull,
    pub position: Point3<f32>,
    pub orientation: UnitQuaternion<f32>,
}

impl<'a> Placement<'a> {
    pub fn new(hull: &'a ConvexHull, position: Point3<f32>, orientation: UnitQuaternion<f32>) -> Self {
        Self {
            hull,
            position,
            orientation,
        }
    }

    /// A hull already expressed in world coordinates, such as a brush.
    pub fn world(hull: &'a ConvexHull) -> Self {
        Self::new(hull, Point3::origin(), UnitQuaternion::identity())
    }

    /// World-space support distance along `dir`, measured from the origin.
    pub fn support(&self, dir: &Vector3<f32>) -> f32 {
        self.position.coords.dot(dir)
            + self.hull.support(&self.orientation.inverse_transform_vector(dir))
    }

    /// The placed hull seen as a sweep shape centred on `position`.
    pub fn shape(&self) -> SweepShape<'a> {
        SweepShape::hull(self.hull, self.orientation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn point_has_no_extent() {
        let shape = SweepShape::Point;
        assert_eq!(shape.extents(&Vector3::x()), (0.0, 0.0));
        assert!(shape.is_point());
        assert!(SweepShape::Sphere(0.0).is_point());
    }

    #[test]
    fn sphere_support_scales_with_direction() {
        let shape = SweepShape::Sphere(2.0);
        assert_approx_eq!(shape.support(&Vector3::new(0.0, 3.0, 0.0)), 6.0);
        assert_approx_eq!(SweepShape::Sphere(-1.0).support(&Vector3::x()), 0.0);
    }

    #[test]
    fn rotated_box_reaches_its_corner() {
        let hull = ConvexHull::cuboid(Vector3::new(1.0, 1.0, 1.0)).unwrap();
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_4);
        let shape = SweepShape::hull(&hull, rotation);
        assert_approx_eq!(shape.support(&Vector3::x()), std::f32::consts::SQRT_2, 1e-5);
        assert!(!shape.is_axis_aligned_box());
        assert!(SweepShape::hull(&hull, UnitQuaternion::identity()).is_axis_aligned_box());
    }

    #[test]
    fn placement_support_includes_position() {
        let hull = ConvexHull::cuboid(Vector3::new(1.0, 2.0, 3.0)).unwrap();
        let placed = Placement::new(&hull, Point3::new(10.0, 0.0, 0.0), UnitQuaternion::identity());
        assert_approx_eq!(placed.support(&Vector3::x()), 11.0);
        assert_approx_eq!(placed.support(&-Vector3::x()), -9.0);
        assert_approx_eq!(Placement::world(&hull).support(&Vector3::z()), 3.0);
    }
}
