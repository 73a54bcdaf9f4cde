use std::any::Any;
use std::ops::{Deref, DerefMut};

use super::{Component, ComponentKey, EntityId, World};

/// World access handed to component hooks, together with the identity of
/// the component being called.
pub struct Context<'w> {
    world: &'w mut World,
    key: ComponentKey,
}

impl<'w> Context<'w> {
    pub(crate) fn new(world: &'w mut World, key: ComponentKey) -> Self {
        world.hook_depth += 1;
        Self { world, key }
    }

    /// Key of the component whose hook is running.
    pub fn key(&self) -> ComponentKey {
        self.key
    }

    /// Entity that owns the running component.
    pub fn entity(&self) -> EntityId {
        self.key.entity
    }

    pub fn entity_name(&self) -> &str {
        self.world.entity_name(self.key.entity)
    }

    /// Starts delivering broadcasts of `E` to the running component.
    pub fn listen<E: Any>(&mut self) {
        self.world.events_mut().add_listener::<E>(self.key);
    }

    /// Stops delivering broadcasts of `E`. Warns when not listening.
    pub fn unlisten<E: Any>(&mut self) -> bool {
        self.world.events_mut().remove_listener::<E>(self.key)
    }

    /// Re-points component reference `slot` of `owner` at `entity`, firing
    /// disconnect and connect hooks as needed. `None` detaches it.
    ///
    /// `owner` must be the component whose hook is running.
    pub fn bind_reference(&mut self, owner: &mut dyn Component, slot: usize, entity: Option<EntityId>) {
        self.world.rebind_component_reference(owner, self.key, slot, entity);
    }

    /// Re-points entity reference `slot` of `owner` at `entity`. Its sibling
    /// component references exit and re-initialize against the new entity.
    pub fn assign_entity(&mut self, owner: &mut dyn Component, slot: usize, entity: Option<EntityId>) {
        self.world.retarget_entity_reference(owner, self.key, slot, entity);
    }
}

impl Drop for Context<'_> {
    fn drop(&mut self) {
        self.world.hook_depth -= 1;
    }
}

impl Deref for Context<'_> {
    type Target = World;

    fn deref(&self) -> &World {
        self.world
    }
}

impl DerefMut for Context<'_> {
    fn deref_mut(&mut self) -> &mut World {
        self.world
    }
}
