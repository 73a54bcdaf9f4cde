//! Entities, components and the scene world that owns them.
//!
//! Components live in slots on their entity and are addressed by
//! [`ComponentKey`]. The [`World`] keeps per-tag registries of initialized
//! components, routes reference events and applies deferred structural
//! changes at the end of each frame.

mod binding;
mod component;
mod context;
mod entity;
pub mod factory;
mod prefab;
mod registry;
mod world;

use std::fmt;

pub use component::{BEHAVIOR, Component, ComponentMeta, ComponentType, Target, TypeTag};
pub use context::Context;
pub use entity::Entity;
pub use prefab::Prefab;
pub use registry::Registries;
pub use world::{SceneInfo, Time, World};

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// Scene-unique entity id. Never reused within a world.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-instance component id. Never reused within a world.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u32);

impl ComponentId {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Address of one live component: its entity and its own id.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentKey {
    pub entity: EntityId,
    pub component: ComponentId,
}

impl ComponentKey {
    pub fn new(entity: EntityId, component: ComponentId) -> Self {
        Self { entity, component }
    }
}

/// One reference slot on one component.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReferenceKey {
    pub owner: ComponentKey,
    pub slot: usize,
}

impl ReferenceKey {
    pub fn new(owner: ComponentKey, slot: usize) -> Self {
        Self { owner, slot }
    }
}
