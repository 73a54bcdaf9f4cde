//! Typed event broadcast between components.
//!
//! A component listens for events of type `E` by registering its key, usually
//! from `on_init` through [`Context::listen`](crate::Context::listen). Each
//! [`World::broadcast`](crate::World::broadcast) of an `E` reaches every
//! listener's [`Component::on_event`](crate::Component::on_event) in
//! registration order. A component that leaves the scene stops listening.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

use crate::ecs::ComponentKey;
use crate::warning;

/// Event carrying only a name, as sent by
/// [`EventEmitter`](crate::components::EventEmitter).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedEvent(pub String);

impl NamedEvent {
    pub fn name(&self) -> &str {
        &self.0
    }
}

#[derive(Debug)]
struct Listeners {
    type_name: &'static str,
    keys: Vec<ComponentKey>,
}

/// Listener lists, one per event type.
#[derive(Debug, Default)]
pub struct Events {
    listeners: HashMap<TypeId, Listeners>,
}

impl Events {
    /// Registers `key` for events of type `E`. Registering twice has no
    /// further effect.
    pub fn add_listener<E: Any>(&mut self, key: ComponentKey) {
        let listeners = self
            .listeners
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Listeners { type_name: type_name::<E>(), keys: Vec::new() });
        if !listeners.keys.contains(&key) {
            listeners.keys.push(key);
        }
    }

    /// Unregisters `key` from events of type `E`. Warns and returns false
    /// when there was nothing to remove.
    pub fn remove_listener<E: Any>(&mut self, key: ComponentKey) -> bool {
        let id = TypeId::of::<E>();
        let Some(listeners) = self.listeners.get_mut(&id) else {
            warning!("no listeners of event type \"{}\" to remove", type_name::<E>());
            return false;
        };
        let Some(index) = listeners.keys.iter().position(|k| *k == key) else {
            warning!("listener {key:?} of event type \"{}\" could not be found to remove", type_name::<E>());
            return false;
        };
        listeners.keys.remove(index);
        if listeners.keys.is_empty() {
            self.listeners.remove(&id);
        }
        true
    }

    /// Keys listening for `E`, in registration order.
    pub fn listeners<E: Any>(&self) -> &[ComponentKey] {
        self.listeners.get(&TypeId::of::<E>()).map_or(&[][..], |l| l.keys.as_slice())
    }

    pub fn is_listening<E: Any>(&self, key: ComponentKey) -> bool {
        self.listeners::<E>().contains(&key)
    }

    /// Event type names with their listener counts, sorted by name.
    pub fn summary(&self) -> Vec<(&'static str, usize)> {
        let mut summary: Vec<_> = self.listeners.values().map(|l| (l.type_name, l.keys.len())).collect();
        summary.sort_unstable();
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Drops `key` from every list without warning.
    pub(crate) fn forget(&mut self, key: ComponentKey) {
        self.listeners.retain(|_, listeners| {
            listeners.keys.retain(|k| *k != key);
            !listeners.keys.is_empty()
        });
    }
}
