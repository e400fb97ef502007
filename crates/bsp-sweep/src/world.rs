//! The static tree together with the entities linked into it.

use log::trace;
use nalgebra::{Point3, UnitQuaternion};

use crate::bsp::{BspTree, NodeId};
use crate::entity::{Entities, Entity, EntityFlags, EntityId};
use crate::SweepShape;

/// Everything a sweep query runs against.
///
/// Entities are linked into every open leaf their hulls (main and
/// alternate) overlap. Solid leaves never hold links.
#[derive(Debug, Clone, Default)]
pub struct World {
    tree: BspTree,
    entities: Entities,
}

impl World {
    pub fn new(tree: BspTree) -> Self {
        Self {
            tree,
            entities: Entities::new(),
        }
    }

    #[inline]
    pub fn tree(&self) -> &BspTree {
        &self.tree
    }

    #[inline]
    pub fn entities(&self) -> &Entities {
        &self.entities
    }

    #[inline]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Adds an entity and links it into the leaves it overlaps.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let links = touching_leaves(&self.tree, &entity);
        let id = self.entities.insert(entity);
        self.link(id, links);
        id
    }

    /// Moves an entity and relinks it. Returns `false` for an unknown id.
    pub fn set_transform(
        &mut self,
        id: EntityId,
        position: Point3<f32>,
        orientation: UnitQuaternion<f32>,
    ) -> bool {
        let Some(entity) = self.entities.get_mut(id) else {
            return false;
        };
        entity.set_transform(position, orientation);
        let old = std::mem::take(entity.links_mut());
        let links = touching_leaves(&self.tree, entity);

        for leaf in old {
            if let Some(leaf) = self.tree.leaf_mut(leaf) {
                leaf.unlink(id);
            }
        }
        self.link(id, links);
        true
    }

    /// Replaces an entity's flags. Returns `false` for an unknown id.
    pub fn set_flags(&mut self, id: EntityId, flags: EntityFlags) -> bool {
        match self.entities.get_mut(id) {
            Some(entity) => {
                entity.set_flags(flags);
                true
            }
            None => false,
        }
    }

    fn link(&mut self, id: EntityId, links: Vec<NodeId>) {
        for &leaf in &links {
            if let Some(leaf) = self.tree.leaf_mut(leaf) {
                leaf.link(id);
            }
        }
        trace!("entity {:?} linked into {} leaves", id, links.len());
        if let Some(entity) = self.entities.get_mut(id) {
            entity.set_links(links);
        }
    }
}

/// Open leaves overlapped by any of an entity's shapes, sorted and unique.
fn touching_leaves(tree: &BspTree, entity: &Entity) -> Vec<NodeId> {
    let mut leaves = Vec::new();
    let mut placements = entity.placements(false);
    if !entity.alt_shapes().is_empty() {
        placements.extend(entity.placements(true));
    }

    if placements.is_empty() {
        tree.leaves_touching(&SweepShape::Point, entity.position(), &mut leaves);
    }
    for placement in &placements {
        tree.leaves_touching(&placement.shape(), placement.position, &mut leaves);
    }

    leaves.retain(|&id| tree.node(id).leaf().is_some_and(|leaf| !leaf.is_solid()));
    leaves.sort_unstable();
    leaves.dedup();
    leaves
}
