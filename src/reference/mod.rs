//! Handles that resolve to other components, entities, assets and input
//! actions and stay coherent as their targets come and go.
//!
//! A component exposes its handles through numbered slots
//! ([`Component::reference_mut`](crate::ecs::Component::reference_mut)).
//! The world initializes every slot right after the component's `on_init`
//! and exits them, in reverse, right before its `on_exit`.

mod action;
mod asset;
mod component;
mod entity;

pub use action::ActionReference;
pub use asset::{AssetReference, AssetReferenceBase};
pub use component::{ComponentReference, ComponentReferenceBase};
pub use entity::EntityReference;

use serde_json::Value;

/// Mutable view of one reference slot.
pub enum ReferenceMut<'a> {
    Component(&'a mut dyn ComponentReferenceBase),
    Entity(&'a mut EntityReference),
    Asset(&'a mut dyn AssetReferenceBase),
    Action(&'a mut ActionReference),
}

impl ReferenceMut<'_> {
    pub fn kind(&self) -> ReferenceKind {
        match self {
            Self::Component(r) => ReferenceKind::Component { follows_owner: r.follows_owner() },
            Self::Entity(_) => ReferenceKind::Entity,
            Self::Asset(_) => ReferenceKind::Asset,
            Self::Action(_) => ReferenceKind::Action,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `follows_owner` references bind to their owner's entity at init.
    Component { follows_owner: bool },
    Entity,
    Asset,
    Action,
}

/// Reads a `{ "<key>": name }` object, or a bare name string, into `name`.
pub(crate) fn read_name(name: &mut String, key: &str, json: &Value) {
    use crate::stream::{self, Location, kind_name, location};
    use crate::warning;

    match json {
        Value::String(_) => {
            stream::read(name, json);
        }
        Value::Object(object) => {
            for (field, value) in object {
                if field == key {
                    let _at = Location::key(field);
                    stream::read(name, value);
                } else {
                    warning!("JSON error: unrecognized key \"{field}\" at {}", location());
                }
            }
        }
        other => warning!("JSON error: expected object, found {} at {}", kind_name(other), location()),
    }
}

pub(crate) fn write_name(key: &str, name: &str) -> Value {
    let mut json = serde_json::Map::new();
    json.insert(key.into(), Value::from(name));
    Value::Object(json)
}
