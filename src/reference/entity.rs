use serde_json::Value;

use super::{read_name, write_name};
use crate::ecs::{Entity, EntityId, World};

/// Handle to another entity, found by name when the owner joins a scene.
///
/// `siblings` lists reference slots of the same owner that follow this
/// entity: they initialize against it once it resolves and exit with it.
#[derive(Debug, Default)]
pub struct EntityReference {
    name: String,
    entity: Option<EntityId>,
    siblings: Vec<usize>,
}

impl EntityReference {
    pub fn new(siblings: &[usize]) -> Self {
        Self { name: String::new(), entity: None, siblings: siblings.to_vec() }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Changes the name looked up at the next init. Use
    /// [`Context::assign_entity`](crate::ecs::Context::assign_entity) to
    /// re-point a live reference.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    pub fn is_resolved(&self) -> bool {
        self.entity.is_some()
    }

    pub fn siblings(&self) -> &[usize] {
        &self.siblings
    }

    pub fn get<'w>(&self, world: &'w World) -> Option<&'w Entity> {
        world.entity(self.entity?)
    }

    pub(crate) fn bind(&mut self, entity: EntityId) {
        self.entity = Some(entity);
    }

    pub(crate) fn unbind(&mut self) {
        self.entity = None;
    }

    /// Reads `{ "EntityName": name }` or a bare name string.
    pub fn read(&mut self, json: &Value) {
        read_name(&mut self.name, "EntityName", json);
    }

    pub fn write(&self) -> Value {
        write_name("EntityName", &self.name)
    }
}

/// Clones come back unbound.
impl Clone for EntityReference {
    fn clone(&self) -> Self {
        Self { name: self.name.clone(), entity: None, siblings: self.siblings.clone() }
    }
}
