//! Tunables for descent contexts.

use crate::PLANE_EPSILON;

/// Configuration for a [`DescentContext`](crate::DescentContext).
///
/// ```
/// use bsp_sweep::SweepConfig;
///
/// let config = SweepConfig::default().with_stack_capacity(64);
/// assert_eq!(config.stack_capacity, Some(64));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SweepConfig {
    /// Fixed stack size. `None` sizes the stack from the tree it is created for.
    pub stack_capacity: Option<usize>,
    /// Distance under which a segment is treated as lying in a splitting plane.
    pub plane_epsilon: f32,
}

impl SweepConfig {
    /// Smallest stack any context gets, so single-leaf trees still work.
    pub const MIN_STACK_CAPACITY: usize = 2;

    /// Sets a fixed stack capacity.
    pub fn with_stack_capacity(mut self, capacity: usize) -> Self {
        self.stack_capacity = Some(capacity);
        self
    }

    /// Sets the on-plane tolerance used by the descent.
    pub fn with_plane_epsilon(mut self, epsilon: f32) -> Self {
        self.plane_epsilon = epsilon;
        self
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            stack_capacity: None,
            plane_epsilon: PLANE_EPSILON,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sizes_from_tree() {
        let config = SweepConfig::default();
        assert_eq!(config.stack_capacity, None);
        assert_eq!(config.plane_epsilon, PLANE_EPSILON);
    }

    #[test]
    fn setters_chain() {
        let config = SweepConfig::default()
            .with_stack_capacity(8)
            .with_plane_epsilon(0.5);
        assert_eq!(config.stack_capacity, Some(8));
        assert_eq!(config.plane_epsilon, 0.5);
    }
}
