//! Convex hulls: the precise shape of solid brushes and of entities.

use nalgebra::{Point3, Vector3};

use crate::error::HullError;
use crate::{Classification, Plane3D};

/// Distance under which a vertex counts as lying on a plane.
const VERTEX_EPSILON: f32 = 1e-3;

/// Slack allowed for a closest-point candidate to count as on the hull.
const CLOSEST_EPSILON: f32 = 1e-4;

/// A closed convex polyhedron given by its outward-facing face planes.
///
/// Vertices and edge directions are derived from the planes once, at
/// construction, so support queries and separating-axis tests never have to
/// rebuild them.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexHull {
    planes: Vec<Plane3D>,
    vertices: Vec<Point3<f32>>,
    edges: Vec<Vector3<f32>>,
    mins: Point3<f32>,
    maxs: Point3<f32>,
}

impl ConvexHull {
    /// An axis-aligned box centred on the origin.
    pub fn cuboid(half_extents: Vector3<f32>) -> Result<Self, HullError> {
        let mins = Point3::from(-half_extents);
        let maxs = Point3::from(half_extents);
        Self::from_box(mins, maxs)
    }

    /// An axis-aligned box spanning `mins..maxs`.
    pub fn from_box(mins: Point3<f32>, maxs: Point3<f32>) -> Result<Self, HullError> {
        for axis in 0..3 {
            if !(mins[axis].is_finite() && maxs[axis].is_finite()) || maxs[axis] < mins[axis] {
                return Err(HullError::InvalidExtent(axis));
            }
        }

        let planes = (0..3)
            .flat_map(|axis| {
                [
                    Plane3D::axial(axis, maxs[axis], true),
                    Plane3D::axial(axis, mins[axis], false),
                ]
            })
            .collect();

        let vertices = (0..8)
            .map(|corner| {
                Point3::new(
                    if corner & 1 == 0 { mins.x } else { maxs.x },
                    if corner & 2 == 0 { mins.y } else { maxs.y },
                    if corner & 4 == 0 { mins.z } else { maxs.z },
                )
            })
            .collect();

        Ok(Self {
            planes,
            vertices,
            edges: vec![Vector3::x(), Vector3::y(), Vector3::z()],
            mins,
            maxs,
        })
    }

    /// Builds a hull from its bounding planes (normals pointing out).
    ///
    /// Planes that do not end up carrying a face are dropped. The planes must
    /// enclose a bounded volume with some thickness.
    pub fn from_planes(planes: Vec<Plane3D>) -> Result<Self, HullError> {
        if planes.len() < 4 {
            return Err(HullError::TooFewPlanes(planes.len()));
        }

        let mut vertices: Vec<Point3<f32>> = Vec::new();
        for i in 0..planes.len() {
            for j in (i + 1)..planes.len() {
                for k in (j + 1)..planes.len() {
                    let Some(p) = Plane3D::intersect_three(&planes[i], &planes[j], &planes[k])
                    else {
                        continue;
                    };
                    if !p.coords.iter().all(|c| c.is_finite()) {
                        continue;
                    }
                    let inside = planes
                        .iter()
                        .all(|plane| plane.signed_distance(p) <= VERTEX_EPSILON);
                    let duplicate = vertices
                        .iter()
                        .any(|v| (v - p).norm() < VERTEX_EPSILON);
                    if inside && !duplicate {
                        vertices.push(p);
                    }
                }
            }
        }

        let faces: Vec<Plane3D> = planes
            .into_iter()
            .filter(|plane| {
                vertices
                    .iter()
                    .filter(|v| plane.signed_distance(**v).abs() <= VERTEX_EPSILON)
                    .count()
                    >= 3
            })
            .collect();

        let flat = faces.first().is_none_or(|face| {
            vertices
                .iter()
                .all(|v| face.signed_distance(*v).abs() <= VERTEX_EPSILON)
        });
        if vertices.len() < 4 || faces.len() < 4 || flat {
            return Err(HullError::Unbounded {
                vertices: vertices.len(),
            });
        }

        let mut edges: Vec<Vector3<f32>> = Vec::new();
        for i in 0..faces.len() {
            for j in (i + 1)..faces.len() {
                let shared = vertices
                    .iter()
                    .filter(|v| {
                        faces[i].signed_distance(**v).abs() <= VERTEX_EPSILON
                            && faces[j].signed_distance(**v).abs() <= VERTEX_EPSILON
                    })
                    .count();
                if shared < 2 {
                    continue;
                }
                let Some(dir) = faces[i].normal().cross(&faces[j].normal()).try_normalize(1e-6)
                else {
                    continue;
                };
                if !edges.iter().any(|e| e.dot(&dir).abs() > 1.0 - 1e-4) {
                    edges.push(dir);
                }
            }
        }

        let (mins, maxs) = bounds_of(&vertices);
        Ok(Self {
            planes: faces,
            vertices,
            edges,
            mins,
            maxs,
        })
    }

    /// Outward face planes.
    #[inline]
    pub fn planes(&self) -> &[Plane3D] {
        &self.planes
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    /// Unique (unsigned) edge directions, unit length.
    #[inline]
    pub fn edges(&self) -> &[Vector3<f32>] {
        &self.edges
    }

    /// Axis-aligned bounds `(mins, maxs)`.
    #[inline]
    pub fn bounds(&self) -> (Point3<f32>, Point3<f32>) {
        (self.mins, self.maxs)
    }

    /// Support distance: how far the hull reaches along `dir`, measured from
    /// its local origin. `dir` need not be unit length.
    pub fn support(&self, dir: &Vector3<f32>) -> f32 {
        self.vertices
            .iter()
            .map(|v| v.coords.dot(dir))
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// The vertex reaching farthest along `dir`.
    pub fn support_point(&self, dir: &Vector3<f32>) -> Point3<f32> {
        let mut best = self.vertices[0];
        let mut best_dist = best.coords.dot(dir);
        for v in &self.vertices[1..] {
            let d = v.coords.dot(dir);
            if d > best_dist {
                best = *v;
                best_dist = d;
            }
        }
        best
    }

    /// Returns `true` if the point is inside or on the hull.
    pub fn contains(&self, point: Point3<f32>) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.signed_distance(point) <= VERTEX_EPSILON)
    }

    /// The point of the hull closest to `point`, which is `point` itself
    /// when it lies inside.
    ///
    /// The answer lies on a face, an edge or a vertex, so every projection
    /// onto a face plane or a face-face line that stays inside the hull is a
    /// candidate, along with every vertex.
    pub fn closest_point(&self, point: Point3<f32>) -> Point3<f32> {
        if self.contains_within(point, 0.0) {
            return point;
        }
        let mut best = self.support_point(&Vector3::zeros());
        let mut best_dist = f32::INFINITY;
        let mut consider = |candidate: Point3<f32>| {
            let dist = (candidate - point).norm_squared();
            if dist < best_dist && self.contains_within(candidate, CLOSEST_EPSILON) {
                best = candidate;
                best_dist = dist;
            }
        };

        for v in &self.vertices {
            consider(*v);
        }
        for face in &self.planes {
            consider(point - face.normal() * face.signed_distance(point));
        }
        for (i, first) in self.planes.iter().enumerate() {
            for second in &self.planes[i + 1..] {
                let dir = first.normal().cross(&second.normal());
                if dir.norm() < 1e-6 {
                    continue;
                }
                let across = Plane3D::new(dir, dir.dot(&point.coords));
                if let Some(q) = Plane3D::intersect_three(first, second, &across) {
                    consider(q);
                }
            }
        }
        best
    }

    fn contains_within(&self, point: Point3<f32>, tolerance: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.signed_distance(point) <= tolerance)
    }

    /// Classifies the hull's vertices against a plane.
    pub fn classify(&self, plane: &Plane3D) -> Classification {
        plane.classify_points(&self.vertices)
    }

    /// Returns `true` for six axis-aligned faces, i.e. a box.
    pub fn is_axis_aligned_box(&self) -> bool {
        self.planes.len() == 6 && self.planes.iter().all(|p| p.axis().is_some())
    }

    /// Axial planes of the bounding box that are not already faces.
    ///
    /// Swept boxes stop on these instead of sliding past a sharp corner of
    /// the hull.
    pub fn axial_bevels(&self) -> Vec<Plane3D> {
        (0..3)
            .flat_map(|axis| {
                [
                    Plane3D::axial(axis, self.maxs[axis], true),
                    Plane3D::axial(axis, self.mins[axis], false),
                ]
            })
            .filter(|bevel| !self.planes.iter().any(|face| face.approx_eq(bevel)))
            .collect()
    }

    /// The same hull moved by `offset`.
    pub fn translated(&self, offset: Vector3<f32>) -> Self {
        let planes = self
            .planes
            .iter()
            .map(|p| Plane3D::new(p.normal(), p.offset() + p.normal().dot(&offset)))
            .collect();
        Self {
            planes,
            vertices: self.vertices.iter().map(|v| v + offset).collect(),
            edges: self.edges.clone(),
            mins: self.mins + offset,
            maxs: self.maxs + offset,
        }
    }
}

fn bounds_of(points: &[Point3<f32>]) -> (Point3<f32>, Point3<f32>) {
    let mut mins = Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY);
    let mut maxs = Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);
    for p in points {
        mins = mins.inf(p);
        maxs = maxs.sup(p);
    }
    (mins, maxs)
}
