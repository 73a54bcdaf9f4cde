use std::collections::HashMap;

use super::{Component, ComponentId, ComponentKey, ComponentType, EntityId, ReferenceKey, TypeTag};

/// One component position on an entity. `component` is `None` while the
/// component is checked out to run a hook.
pub(crate) struct ComponentSlot {
    pub(crate) id: ComponentId,
    pub(crate) tag: TypeTag,
    pub(crate) bases: &'static [TypeTag],
    pub(crate) component: Option<Box<dyn Component>>,
    pub(crate) initialized: bool,
    pub(crate) pending_removal: bool,
}

impl ComponentSlot {
    pub(crate) fn is_a(&self, tag: TypeTag) -> bool {
        self.tag == tag || self.bases.contains(&tag)
    }
}

/// A live entity in a [`World`](super::World).
pub struct Entity {
    pub(crate) id: EntityId,
    pub(crate) name: String,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
    pub(crate) slots: Vec<ComponentSlot>,
    index: HashMap<TypeTag, ComponentId>,
    /// Component references currently watching this entity.
    pub(crate) references: Vec<ReferenceKey>,
    /// Entity references currently bound to this entity.
    pub(crate) entity_references: Vec<ReferenceKey>,
    pub(crate) initialized: bool,
    pub(crate) destroy_queued: bool,
}

impl Entity {
    pub(crate) fn new(id: EntityId, name: String) -> Self {
        Self {
            id,
            name,
            parent: None,
            children: Vec::new(),
            slots: Vec::new(),
            index: HashMap::new(),
            references: Vec::new(),
            entity_references: Vec::new(),
            initialized: false,
            destroy_queued: false,
        }
    }

    pub fn id(&self) -> EntityId { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn parent(&self) -> Option<EntityId> { self.parent }
    pub fn children(&self) -> &[EntityId] { &self.children }
    pub fn is_initialized(&self) -> bool { self.initialized }
    pub fn is_destroy_queued(&self) -> bool { self.destroy_queued }

    /// Component references watching this entity.
    pub fn references(&self) -> &[ReferenceKey] {
        &self.references
    }

    /// Entity references bound to this entity.
    pub fn entity_references(&self) -> &[ReferenceKey] {
        &self.entity_references
    }

    // -- Components ---------------------------------------------------------

    pub fn component_count(&self) -> usize {
        self.slots.len()
    }

    /// Keys of every component, in insertion order.
    pub fn component_keys(&self) -> impl Iterator<Item = ComponentKey> + '_ {
        self.slots.iter().map(|slot| ComponentKey::new(self.id, slot.id))
    }

    pub fn component_tags(&self) -> impl Iterator<Item = TypeTag> + '_ {
        self.slots.iter().map(|slot| slot.tag)
    }

    /// Whether a component of type `tag`, or of a type that is-a `tag`, is
    /// attached.
    pub fn has_component(&self, tag: TypeTag) -> bool {
        self.slots.iter().any(|slot| !slot.pending_removal && slot.is_a(tag))
    }

    /// Key of the first component that is-a `tag`.
    pub fn find(&self, tag: TypeTag) -> Option<ComponentKey> {
        self.position_of(tag).map(|i| ComponentKey::new(self.id, self.slots[i].id))
    }

    pub fn component(&self, id: ComponentId) -> Option<&dyn Component> {
        self.slot(id)?.component.as_deref()
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut dyn Component> {
        self.slot_mut(id)?.component.as_deref_mut()
    }

    /// First component that is a `T`. `None` while that component is
    /// running one of its own hooks.
    pub fn get<T: ComponentType>(&self) -> Option<&T> {
        let position = self.position_of(T::TAG)?;
        self.slots[position].component.as_deref()?.downcast_ref::<T>()
    }

    pub fn get_mut<T: ComponentType>(&mut self) -> Option<&mut T> {
        let position = self.position_of(T::TAG)?;
        self.slots[position].component.as_deref_mut()?.downcast_mut::<T>()
    }

    // -- Slots --------------------------------------------------------------

    fn position_of(&self, tag: TypeTag) -> Option<usize> {
        if let Some(id) = self.index.get(&tag) {
            return self.slots.iter().position(|slot| slot.id == *id && !slot.pending_removal);
        }
        self.slots.iter().position(|slot| !slot.pending_removal && slot.is_a(tag))
    }

    pub(crate) fn has_exact(&self, tag: TypeTag) -> bool {
        self.index.contains_key(&tag)
    }

    pub(crate) fn slot(&self, id: ComponentId) -> Option<&ComponentSlot> {
        self.slots.iter().find(|slot| slot.id == id)
    }

    pub(crate) fn slot_mut(&mut self, id: ComponentId) -> Option<&mut ComponentSlot> {
        self.slots.iter_mut().find(|slot| slot.id == id)
    }

    pub(crate) fn push_slot(&mut self, id: ComponentId, component: Box<dyn Component>) {
        let tag = component.type_tag();
        self.index.insert(tag, id);
        self.slots.push(ComponentSlot {
            id,
            tag,
            bases: component.bases(),
            component: Some(component),
            initialized: false,
            pending_removal: false,
        });
    }

    pub(crate) fn remove_slot(&mut self, id: ComponentId) -> Option<ComponentSlot> {
        let position = self.slots.iter().position(|slot| slot.id == id)?;
        let slot = self.slots.remove(position);
        if self.index.get(&slot.tag) == Some(&id) {
            self.index.remove(&slot.tag);
        }
        Some(slot)
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("components", &self.component_tags().collect::<Vec<_>>())
            .finish()
    }
}
