//! Plane selection strategies for compiling brushes into a tree.
//!
//! The choice of splitting plane affects tree depth and how many leaves a
//! brush is cut into. Every candidate is a face plane of some brush that
//! still has to be carved out.

use crate::Plane3D;

/// Strategy for selecting which candidate plane splits the current node.
pub trait PlaneSelector {
    /// Select a plane from the candidates.
    ///
    /// Returns `None` if the slice is empty.
    /// The returned reference must be to an element in the provided slice.
    fn select<'a>(&self, planes: &'a [Plane3D]) -> Option<&'a Plane3D>;
}

/// Selects the first candidate.
///
/// This is the simplest and fastest selector; brushes are carved one after
/// the other in input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstPlane;

impl PlaneSelector for FirstPlane {
    fn select<'a>(&self, planes: &'a [Plane3D]) -> Option<&'a Plane3D> {
        planes.first()
    }
}

/// Prefers axis-aligned candidates, falling back to the first one.
///
/// Axial splits come first so that the sloped faces of a brush end up deep
/// in the tree, close to the solid leaves they bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxialFirst;

impl PlaneSelector for AxialFirst {
    fn select<'a>(&self, planes: &'a [Plane3D]) -> Option<&'a Plane3D> {
        planes
            .iter()
            .find(|p| p.axis().is_some())
            .or_else(|| planes.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn sloped() -> Plane3D {
        Plane3D::new(Vector3::new(1.0, 1.0, 0.0), 0.0)
    }

    #[test]
    fn first_plane_empty_list() {
        let planes: Vec<Plane3D> = vec![];
        assert!(FirstPlane.select(&planes).is_none());
        assert!(AxialFirst.select(&planes).is_none());
    }

    #[test]
    fn first_plane_takes_head() {
        let planes = vec![sloped(), Plane3D::axial(0, 1.0, true)];
        assert_eq!(FirstPlane.select(&planes), Some(&planes[0]));
    }

    #[test]
    fn axial_first_skips_sloped_planes() {
        let planes = vec![sloped(), Plane3D::axial(0, 1.0, true)];
        assert_eq!(AxialFirst.select(&planes), Some(&planes[1]));

        let only_sloped = vec![sloped()];
        assert_eq!(AxialFirst.select(&only_sloped), Some(&only_sloped[0]));
    }
}
