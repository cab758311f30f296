//! In-memory hierarchy used by the propagation tests

use hecs::Entity;
use rustc_hash::FxHashMap;

use crate::ecs::{ChildList, Hierarchy, HierarchyMut, Transform};

struct Node {
    name: String,
    parent: Option<Entity>,
    children: ChildList,
    transform: Option<Transform>,
}

/// Plain map-backed tree. Entity ids come from a scratch hecs world.
#[derive(Default)]
pub(crate) struct FakeHierarchy {
    ids: hecs::World,
    nodes: FxHashMap<Entity, Node>,
    order: Vec<Entity>,
}

impl FakeHierarchy {
    pub(crate) fn add(&mut self, name: &str, parent: Option<Entity>, transform: Transform) -> Entity {
        self.insert(name, parent, Some(transform))
    }

    pub(crate) fn add_without_transform(&mut self, name: &str, parent: Option<Entity>) -> Entity {
        self.insert(name, parent, None)
    }

    fn insert(&mut self, name: &str, parent: Option<Entity>, transform: Option<Transform>) -> Entity {
        let entity = self.ids.spawn(());
        self.nodes.insert(
            entity,
            Node {
                name: name.to_string(),
                parent,
                children: ChildList::new(),
                transform,
            },
        );
        if let Some(parent) = parent {
            self.nodes
                .get_mut(&parent)
                .expect("parent added first")
                .children
                .push(entity);
        }
        self.order.push(entity);
        entity
    }

    pub(crate) fn get(&self, entity: Entity) -> Transform {
        self.transform(entity).expect("entity has a transform")
    }

    pub(crate) fn get_mut(&mut self, entity: Entity) -> &mut Transform {
        self.transform_mut(entity).expect("entity has a transform")
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn snapshot(&self) -> Vec<(Entity, Transform)> {
        self.order
            .iter()
            .filter_map(|&e| self.transform(e).map(|t| (e, t)))
            .collect()
    }
}

impl Hierarchy for FakeHierarchy {
    fn parent(&self, entity: Entity) -> Option<Entity> {
        self.nodes.get(&entity)?.parent
    }

    fn children(&self, entity: Entity) -> ChildList {
        self.nodes
            .get(&entity)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    fn roots(&self) -> Vec<Entity> {
        self.order
            .iter()
            .copied()
            .filter(|e| {
                let node = &self.nodes[e];
                let placed_by_parent = node
                    .parent
                    .is_some_and(|parent| self.nodes[&parent].transform.is_some());
                node.transform.is_some() && !placed_by_parent
            })
            .collect()
    }

    fn transform(&self, entity: Entity) -> Option<Transform> {
        self.nodes.get(&entity)?.transform
    }

    fn transform_mut(&mut self, entity: Entity) -> Option<&mut Transform> {
        self.nodes.get_mut(&entity)?.transform.as_mut()
    }

    fn name(&self, entity: Entity) -> String {
        self.nodes
            .get(&entity)
            .map_or_else(|| format!("{entity:?}"), |node| node.name.clone())
    }
}

impl HierarchyMut for FakeHierarchy {
    fn set_parent(&mut self, child: Entity, new_parent: Option<Entity>) -> Result<(), Entity> {
        if !self.nodes.contains_key(&child) {
            return Err(child);
        }
        if let Some(parent) = new_parent {
            if !self.nodes.contains_key(&parent) {
                return Err(parent);
            }
        }

        if let Some(old) = self.nodes[&child].parent {
            if let Some(node) = self.nodes.get_mut(&old) {
                node.children.retain(|c| *c != child);
            }
        }
        if let Some(parent) = new_parent {
            if let Some(node) = self.nodes.get_mut(&parent) {
                node.children.push(child);
            }
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = new_parent;
        }
        Ok(())
    }
}
