use std::any::Any;
use std::collections::HashMap;

use serde_json::Value;

use super::binding::ReferenceOp;
use super::entity::ComponentSlot;
use super::{
    Component, ComponentId, ComponentKey, ComponentType, Context, Entity, EntityId, Prefab, ReferenceKey,
    Registries, TypeTag,
};
use crate::assets::AssetLibraries;
use crate::audio::AudioQueue;
use crate::events::Events;
use crate::input::InputState;
use crate::warning;

// ---------------------------------------------------------------------------
// Time / SceneInfo
// ---------------------------------------------------------------------------

/// Simulation clock, advanced once per fixed tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Time {
    pub fixed_dt: f32,
    /// Fixed ticks run so far.
    pub tick: u64,
    /// Simulated seconds, `tick * fixed_dt`.
    pub elapsed: f64,
}

impl Default for Time {
    fn default() -> Self {
        Self { fixed_dt: 1.0 / 60.0, tick: 0, elapsed: 0.0 }
    }
}

/// Header of the loaded scene. Lighting and transition settings are kept
/// as raw JSON for their collaborators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneInfo {
    pub name: String,
    pub lighting: Value,
    pub transition: Value,
}

enum Deferred {
    Destroy(EntityId),
    Spawn { id: EntityId, parent: Option<EntityId>, prefab: Prefab },
    Reparent { child: EntityId, parent: Option<EntityId> },
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Every live entity, the per-tag registries and the shared state component
/// hooks reach through their [`Context`].
pub struct World {
    pub(super) entities: HashMap<EntityId, Entity>,
    /// Entity ids in hierarchy order: each parent before its descendants.
    pub(super) roster: Vec<EntityId>,
    pub(super) registries: Registries,
    /// Reference events owed to components that were checked out.
    pub(super) pending: Vec<(ReferenceKey, ReferenceOp)>,
    /// Component hooks currently running. Structural teardown waits while
    /// any component is checked out.
    pub(super) hook_depth: u32,
    deferred: Vec<Deferred>,
    next_scene: Option<String>,
    scene: SceneInfo,
    next_entity: u32,
    next_component: u32,
    pub(super) assets: AssetLibraries,
    pub(super) input: InputState,
    audio: AudioQueue,
    events: Events,
    time: Time,
    quit: bool,
}

impl World {
    pub fn new() -> Self {
        Self::with_assets(AssetLibraries::with_builtin_types())
    }

    pub fn with_assets(assets: AssetLibraries) -> Self {
        Self {
            entities: HashMap::new(),
            roster: Vec::new(),
            registries: Registries::default(),
            pending: Vec::new(),
            hook_depth: 0,
            deferred: Vec::new(),
            next_scene: None,
            scene: SceneInfo::default(),
            next_entity: 1,
            next_component: 1,
            assets,
            input: InputState::default(),
            audio: AudioQueue::default(),
            events: Events::default(),
            time: Time::default(),
            quit: false,
        }
    }

    // -- Shared state -------------------------------------------------------

    pub fn assets(&self) -> &AssetLibraries { &self.assets }
    pub fn assets_mut(&mut self) -> &mut AssetLibraries { &mut self.assets }
    pub fn input(&self) -> &InputState { &self.input }
    pub fn input_mut(&mut self) -> &mut InputState { &mut self.input }
    pub fn audio(&self) -> &AudioQueue { &self.audio }
    pub fn audio_mut(&mut self) -> &mut AudioQueue { &mut self.audio }
    pub fn events(&self) -> &Events { &self.events }
    pub fn events_mut(&mut self) -> &mut Events { &mut self.events }
    pub fn time(&self) -> &Time { &self.time }
    pub fn time_mut(&mut self) -> &mut Time { &mut self.time }
    pub fn scene(&self) -> &SceneInfo { &self.scene }
    pub fn scene_mut(&mut self) -> &mut SceneInfo { &mut self.scene }

    // -- Entity queries -----------------------------------------------------

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Name of `id`, or `""` if it does not exist.
    pub fn entity_name(&self, id: EntityId) -> &str {
        self.entities.get(&id).map_or("", Entity::name)
    }

    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    /// Live entities in hierarchy order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.roster.iter().filter_map(|id| self.entities.get(id))
    }

    pub fn entity_ids(&self) -> &[EntityId] {
        &self.roster
    }

    pub fn roots(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities().filter(|e| e.parent.is_none()).map(Entity::id)
    }

    /// First entity in hierarchy order called `name`.
    pub fn find_entity(&self, name: &str) -> Option<EntityId> {
        self.entities().find(|e| e.name == name && !e.destroy_queued).map(Entity::id)
    }

    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.entities.get(&id)?.parent
    }

    pub fn children(&self, id: EntityId) -> &[EntityId] {
        self.entities.get(&id).map_or(&[], |e| e.children.as_slice())
    }

    pub fn rename(&mut self, id: EntityId, name: impl Into<String>) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Whether `id` sits somewhere below `ancestor`.
    pub fn is_descendant(&self, id: EntityId, ancestor: EntityId) -> bool {
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    // -- Component queries --------------------------------------------------

    pub fn get<T: ComponentType>(&self, id: EntityId) -> Option<&T> {
        self.entities.get(&id)?.get::<T>()
    }

    pub fn get_mut<T: ComponentType>(&mut self, id: EntityId) -> Option<&mut T> {
        self.entities.get_mut(&id)?.get_mut::<T>()
    }

    /// Key of the first component on `id` that is a `T`.
    pub fn key_of<T: ComponentType>(&self, id: EntityId) -> Option<ComponentKey> {
        self.entities.get(&id)?.find(T::TAG)
    }

    pub fn component<T: ComponentType>(&self, key: ComponentKey) -> Option<&T> {
        self.component_dyn(key)?.downcast_ref::<T>()
    }

    pub fn component_mut<T: ComponentType>(&mut self, key: ComponentKey) -> Option<&mut T> {
        self.entities.get_mut(&key.entity)?.component_mut(key.component)?.downcast_mut::<T>()
    }

    /// `None` if the component does not exist or is running a hook.
    pub fn component_dyn(&self, key: ComponentKey) -> Option<&dyn Component> {
        self.entities.get(&key.entity)?.component(key.component)
    }

    /// Whether `key` names an attached component, checked out or not.
    pub fn has_component(&self, key: ComponentKey) -> bool {
        self.slot(key).is_some_and(|slot| !slot.pending_removal)
    }

    pub fn is_initialized(&self, key: ComponentKey) -> bool {
        self.slot(key).is_some_and(|slot| slot.initialized)
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    /// Initialized components that are-a `tag`, in insertion order.
    pub fn registry(&self, tag: TypeTag) -> &[ComponentKey] {
        self.registries.get(tag)
    }

    /// Every initialized `T` that is not running a hook.
    pub fn components<T: ComponentType>(&self) -> impl Iterator<Item = (ComponentKey, &T)> + '_ {
        self.registries.get(T::TAG).iter().filter_map(|key| Some((*key, self.component::<T>(*key)?)))
    }

    // -- Immediate structure ------------------------------------------------

    /// Adds a prefab tree as a root and initializes it.
    pub fn add_entity(&mut self, prefab: Prefab) -> EntityId {
        let id = self.allocate_entity();
        self.insert_tree(id, prefab, None);
        self.init_entity(id);
        id
    }

    /// Adds several roots. All of them are inserted before any initializes,
    /// so references between them resolve.
    pub fn add_entities(&mut self, prefabs: Vec<Prefab>) -> Vec<EntityId> {
        let ids: Vec<EntityId> = prefabs
            .into_iter()
            .map(|prefab| {
                let id = self.allocate_entity();
                self.insert_tree(id, prefab, None);
                id
            })
            .collect();
        for id in &ids {
            self.init_entity(*id);
        }
        ids
    }

    /// Adds a prefab tree under `parent` and initializes it.
    pub fn add_child(&mut self, parent: EntityId, prefab: Prefab) -> Option<EntityId> {
        if !self.contains(parent) {
            warning!("cannot add \"{}\" under missing entity {parent}", prefab.name);
            return None;
        }
        let id = self.allocate_entity();
        self.insert_tree(id, prefab, Some(parent));
        if self.entities.get(&parent).is_some_and(|p| p.initialized) {
            self.init_entity(id);
            self.notify_child_added(parent, id);
        }
        Some(id)
    }

    pub fn instantiate(&mut self, prefab: &Prefab) -> EntityId {
        self.add_entity(prefab.clone())
    }

    /// Detached copy of `id` and its children.
    pub fn clone_entity(&self, id: EntityId) -> Option<Prefab> {
        let entity = self.entities.get(&id)?;
        let mut prefab = Prefab::new(entity.name.clone());
        for slot in entity.slots.iter().filter(|slot| !slot.pending_removal) {
            match &slot.component {
                Some(component) => {
                    prefab.add_component(component.clone_component());
                }
                None => warning!("{} on \"{}\" is busy and was not cloned", slot.tag, entity.name),
            }
        }
        prefab.children = entity.children.iter().filter_map(|child| self.clone_entity(*child)).collect();
        Some(prefab)
    }

    /// Attaches a component. On an entity already in the scene it is
    /// initialized right away, then offered to every reference watching the
    /// entity. A second component of the same concrete type is rejected.
    pub fn add_component(&mut self, id: EntityId, component: Box<dyn Component>) -> Option<ComponentKey> {
        let tag = component.type_tag();
        let Some(entity) = self.entities.get_mut(&id) else {
            warning!("cannot add {tag} to missing entity {id}");
            return None;
        };
        if entity.has_exact(tag) {
            warning!("entity \"{}\" already has a {tag} component", entity.name);
            return None;
        }
        let component_id = ComponentId(self.next_component);
        self.next_component += 1;
        entity.push_slot(component_id, component);

        let key = ComponentKey::new(id, component_id);
        if entity.initialized {
            self.init_component(key);
            self.notify_added(key);
        }
        Some(key)
    }

    pub fn insert<T: Component>(&mut self, id: EntityId, component: T) -> Option<ComponentKey> {
        self.add_component(id, Box::new(component))
    }

    /// Detaches a component. Watching references are told first, then the
    /// component exits. A component running a hook is removed as soon as
    /// the hook returns, and `None` is returned.
    pub fn remove_component(&mut self, key: ComponentKey) -> Option<Box<dyn Component>> {
        let slot = self.slot_mut(key)?;
        if slot.pending_removal && slot.component.is_some() {
            return None;
        }
        slot.pending_removal = true;
        if slot.component.is_none() {
            return None;
        }
        if slot.initialized {
            self.notify_removing(key);
        }
        let component = self.exit_component(key);
        if let Some(entity) = self.entities.get_mut(&key.entity) {
            entity.remove_slot(key.component);
        }
        component
    }

    /// Removes the `T` attached to `id` and hands it back.
    pub fn remove<T: ComponentType>(&mut self, id: EntityId) -> Option<T> {
        let entity = self.entities.get(&id)?;
        let slot = entity.slots.iter().find(|slot| slot.tag == T::TAG && !slot.pending_removal)?;
        let key = ComponentKey::new(id, slot.id);
        let component = self.remove_component(key)?;
        component.into_any().downcast::<T>().ok().map(|boxed| *boxed)
    }

    /// Destroys every entity right away and drops queued structural
    /// changes. Called from a component hook it queues the destroys instead
    /// and they happen at the next sync point.
    pub fn clear(&mut self) {
        if self.in_hook() {
            self.deferred.retain(|op| matches!(op, Deferred::Destroy(_)));
            let roots: Vec<EntityId> = self.roots().collect();
            for root in roots {
                self.destroy(root);
            }
            return;
        }
        let roots: Vec<EntityId> = self.roots().collect();
        for root in roots {
            self.destroy_now(root);
        }
        self.deferred.clear();
        self.pending.clear();
        self.registries.clear();
    }

    // -- Deferred structure -------------------------------------------------

    /// Queues a prefab tree to be added as a root at the next sync point.
    /// The returned id is already reserved.
    pub fn spawn(&mut self, prefab: Prefab) -> EntityId {
        let id = self.allocate_entity();
        self.deferred.push(Deferred::Spawn { id, parent: None, prefab });
        id
    }

    pub fn spawn_child(&mut self, parent: EntityId, prefab: Prefab) -> EntityId {
        let id = self.allocate_entity();
        self.deferred.push(Deferred::Spawn { id, parent: Some(parent), prefab });
        id
    }

    /// Queues `id` and its children for destruction at the next sync point.
    pub fn destroy(&mut self, id: EntityId) {
        if let Some(entity) = self.entities.get_mut(&id) {
            if !entity.destroy_queued {
                entity.destroy_queued = true;
                self.deferred.push(Deferred::Destroy(id));
            }
            return;
        }
        let before = self.deferred.len();
        self.deferred.retain(|op| !matches!(op, Deferred::Spawn { id: spawned, .. } if *spawned == id));
        if self.deferred.len() == before {
            warning!("cannot destroy missing entity {id}");
        }
    }

    /// Queues a move of `child` under `parent`, or to the root with `None`.
    pub fn set_parent(&mut self, child: EntityId, parent: Option<EntityId>) {
        self.deferred.push(Deferred::Reparent { child, parent });
    }

    pub fn set_next_scene(&mut self, name: impl Into<String>) {
        self.next_scene = Some(name.into());
    }

    pub fn next_scene(&self) -> Option<&str> {
        self.next_scene.as_deref()
    }

    pub fn take_next_scene(&mut self) -> Option<String> {
        self.next_scene.take()
    }

    /// Asks the engine to stop after the current frame.
    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Whether a component hook is running.
    pub fn in_hook(&self) -> bool {
        self.hook_depth > 0
    }

    /// Applies queued destroys, then spawns, then re-parents. Changes queued
    /// while applying wait for the next call, and so does everything when
    /// called from inside a component hook.
    pub fn apply_deferred(&mut self) {
        if self.in_hook() {
            log::debug!("sync point requested inside a hook; deferred until the hook returns");
            return;
        }
        let queued = std::mem::take(&mut self.deferred);
        let mut spawns = Vec::new();
        let mut reparents = Vec::new();
        let mut destroys = Vec::new();
        for op in queued {
            match op {
                Deferred::Destroy(id) => destroys.push(id),
                Deferred::Spawn { id, parent, prefab } => spawns.push((id, parent, prefab)),
                Deferred::Reparent { child, parent } => reparents.push((child, parent)),
            }
        }

        for id in destroys {
            self.destroy_now(id);
        }

        let mut added = Vec::with_capacity(spawns.len());
        for (id, parent, prefab) in spawns {
            if let Some(parent) = parent {
                if !self.contains(parent) {
                    warning!("cannot spawn \"{}\" under missing entity {parent}", prefab.name);
                    continue;
                }
            }
            self.insert_tree(id, prefab, parent);
            added.push((id, parent));
        }
        for (id, parent) in added {
            if !self.entities.get(&id).is_some_and(|e| !e.initialized) {
                continue;
            }
            match parent {
                Some(parent) if !self.entities.get(&parent).is_some_and(|p| p.initialized) => {}
                Some(parent) => {
                    self.init_entity(id);
                    self.notify_child_added(parent, id);
                }
                None => self.init_entity(id),
            }
        }

        for (child, parent) in reparents {
            self.reparent_now(child, parent);
        }
    }

    // -- Dispatch -----------------------------------------------------------

    /// Runs `on_fixed_update` on every component listed under `tag` at
    /// entry. Components that exit during the pass are skipped.
    pub fn dispatch_fixed_update(&mut self, tag: TypeTag) {
        let keys = self.registries.get(tag).to_vec();
        for key in keys {
            if self.registries.contains(tag, key) {
                self.with_component_dyn(key, |component, cx| component.on_fixed_update(cx));
            }
        }
    }

    pub fn dispatch_update(&mut self, tag: TypeTag, dt: f32) {
        let keys = self.registries.get(tag).to_vec();
        for key in keys {
            if self.registries.contains(tag, key) {
                self.with_component_dyn(key, |component, cx| component.on_update(cx, dt));
            }
        }
    }

    /// Delivers `event` to every component listening for `E`, in
    /// registration order. Listeners that are checked out or stop listening
    /// during the broadcast are skipped. Returns how many were reached.
    pub fn broadcast<E: Any>(&mut self, event: &E) -> usize {
        let keys = self.events.listeners::<E>().to_vec();
        let mut delivered = 0;
        for key in keys {
            if !self.events.is_listening::<E>(key) {
                continue;
            }
            if self.with_component_dyn(key, |component, cx| component.on_event(event, cx)).is_some() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Checks out the `T` at `key` and runs `f` with it and a context.
    pub fn with_component<T: ComponentType, R>(
        &mut self,
        key: ComponentKey,
        f: impl FnOnce(&mut T, &mut Context<'_>) -> R,
    ) -> Option<R> {
        let mut component = self.checkout(key)?;
        let result = match component.downcast_mut::<T>() {
            Some(target) => Some(f(target, &mut Context::new(self, key))),
            None => None,
        };
        self.checkin(key, component);
        result
    }

    pub fn with_component_dyn<R>(
        &mut self,
        key: ComponentKey,
        f: impl FnOnce(&mut dyn Component, &mut Context<'_>) -> R,
    ) -> Option<R> {
        let mut component = self.checkout(key)?;
        let result = f(component.as_mut(), &mut Context::new(self, key));
        self.checkin(key, component);
        Some(result)
    }

    /// Runs `f` on every initialized component of `id`, in insertion order.
    pub fn for_each_component_of(&mut self, id: EntityId, mut f: impl FnMut(&mut dyn Component, &mut Context<'_>)) {
        let keys: Vec<ComponentKey> = match self.entities.get(&id) {
            Some(entity) => entity
                .slots
                .iter()
                .filter(|slot| slot.initialized)
                .map(|slot| ComponentKey::new(id, slot.id))
                .collect(),
            None => return,
        };
        for key in keys {
            if self.is_initialized(key) {
                self.with_component_dyn(key, &mut f);
            }
        }
    }

    // -- Internals ----------------------------------------------------------

    fn allocate_entity(&mut self) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        id
    }

    pub(super) fn slot(&self, key: ComponentKey) -> Option<&ComponentSlot> {
        self.entities.get(&key.entity)?.slot(key.component)
    }

    pub(super) fn slot_mut(&mut self, key: ComponentKey) -> Option<&mut ComponentSlot> {
        self.entities.get_mut(&key.entity)?.slot_mut(key.component)
    }

    pub(super) fn checkout(&mut self, key: ComponentKey) -> Option<Box<dyn Component>> {
        self.slot_mut(key)?.component.take()
    }

    pub(super) fn is_checked_out(&self, key: ComponentKey) -> bool {
        self.slot(key).is_some_and(|slot| slot.component.is_none())
    }

    /// Returns a checked-out component to its slot, then delivers reference
    /// events queued for it and carries out a removal requested meanwhile.
    pub(super) fn checkin(&mut self, key: ComponentKey, component: Box<dyn Component>) {
        let Some(slot) = self.slot_mut(key) else { return };
        slot.component = Some(component);
        let removal = std::mem::take(&mut slot.pending_removal);
        self.replay_pending(key);
        if removal {
            self.remove_component(key);
        }
    }

    fn insert_tree(&mut self, id: EntityId, prefab: Prefab, parent: Option<EntityId>) {
        let (name, components, children) = prefab.into_parts();
        let mut entity = Entity::new(id, name);
        entity.parent = parent;
        for component in components {
            let component_id = ComponentId(self.next_component);
            self.next_component += 1;
            entity.push_slot(component_id, component);
        }

        let position = match parent {
            Some(parent) => self.subtree_end(parent),
            None => self.roster.len(),
        };
        self.roster.insert(position, id);
        if let Some(parent) = parent.and_then(|p| self.entities.get_mut(&p)) {
            parent.children.push(id);
        }
        self.entities.insert(id, entity);

        for child in children {
            let child_id = self.allocate_entity();
            self.insert_tree(child_id, child, Some(id));
        }
    }

    /// Roster index just past `id`'s last descendant.
    fn subtree_end(&self, id: EntityId) -> usize {
        let Some(start) = self.roster.iter().position(|e| *e == id) else {
            return self.roster.len();
        };
        let mut end = start + 1;
        while end < self.roster.len() && self.is_descendant(self.roster[end], id) {
            end += 1;
        }
        end
    }

    fn init_entity(&mut self, id: EntityId) {
        let Some(entity) = self.entities.get_mut(&id) else { return };
        if entity.initialized {
            debug_assert!(false, "entity {id} initialized twice");
            return;
        }
        entity.initialized = true;
        let components: Vec<ComponentId> = entity.slots.iter().map(|slot| slot.id).collect();
        let children = entity.children.clone();
        for component in components {
            self.init_component(ComponentKey::new(id, component));
        }
        for child in children {
            self.init_entity(child);
        }
    }

    fn init_component(&mut self, key: ComponentKey) {
        let Some(slot) = self.slot(key) else { return };
        if slot.initialized {
            debug_assert!(false, "{} {key:?} initialized twice", slot.tag);
            return;
        }
        let Some(mut component) = self.checkout(key) else { return };
        component.on_init(&mut Context::new(self, key));
        self.init_references(component.as_mut(), key);
        if let Some(slot) = self.slot_mut(key) {
            slot.initialized = true;
        }
        self.registries.insert(key, component.type_tag(), component.bases());
        self.checkin(key, component);
    }

    /// Takes the component out of the scene: off the registries, references
    /// exited, then `on_exit`. The slot is left empty for the caller to
    /// remove.
    fn exit_component(&mut self, key: ComponentKey) -> Option<Box<dyn Component>> {
        let initialized = self.slot(key)?.initialized;
        let mut component = self.checkout(key)?;
        if initialized {
            self.registries.remove(key, component.type_tag(), component.bases());
            self.exit_references(component.as_mut(), key);
            component.on_exit(&mut Context::new(self, key));
            if let Some(slot) = self.slot_mut(key) {
                slot.initialized = false;
            }
        }
        self.events.forget(key);
        self.pending.retain(|(reference, _)| reference.owner != key);
        Some(component)
    }

    fn destroy_now(&mut self, id: EntityId) {
        let Some(entity) = self.entities.get(&id) else { return };
        let children = entity.children.clone();
        for child in children {
            self.destroy_now(child);
        }

        self.clear_inbound(id);
        let keys: Vec<ComponentKey> = match self.entities.get(&id) {
            Some(entity) => entity.component_keys().collect(),
            None => return,
        };
        for key in keys.into_iter().rev() {
            self.exit_component(key);
            if let Some(entity) = self.entities.get_mut(&id) {
                entity.remove_slot(key.component);
            }
        }
        // Exit hooks may have pointed new references here.
        self.clear_inbound(id);

        if let Some(parent) = self.parent(id) {
            self.detach_child(parent, id);
        }
        self.roster.retain(|e| *e != id);
        self.entities.remove(&id);
        self.pending.retain(|(reference, _)| reference.owner.entity != id);
    }

    fn reparent_now(&mut self, child: EntityId, parent: Option<EntityId>) {
        if !self.contains(child) {
            return;
        }
        if let Some(parent) = parent {
            if !self.contains(parent) {
                warning!("cannot move {child} under missing entity {parent}");
                return;
            }
            if parent == child || self.is_descendant(parent, child) {
                warning!("cannot move \"{}\" under its own descendant", self.entity_name(child));
                return;
            }
        }
        let old = self.parent(child);
        if old == parent {
            return;
        }

        if let Some(old) = old {
            self.detach_child(old, child);
        }
        let block = self.take_subtree(child);
        if let Some(entity) = self.entities.get_mut(&child) {
            entity.parent = parent;
        }
        let position = match parent {
            Some(parent) => {
                if let Some(entity) = self.entities.get_mut(&parent) {
                    entity.children.push(child);
                }
                self.subtree_end(parent)
            }
            None => self.roster.len(),
        };
        for (offset, id) in block.into_iter().enumerate() {
            self.roster.insert(position + offset, id);
        }
        if let Some(parent) = parent {
            self.notify_child_added(parent, child);
        }
    }

    /// Removes `id` and its descendants from the roster, in order.
    fn take_subtree(&mut self, id: EntityId) -> Vec<EntityId> {
        let Some(start) = self.roster.iter().position(|e| *e == id) else {
            return Vec::new();
        };
        let end = self.subtree_end(id);
        self.roster.drain(start..end).collect()
    }

    fn detach_child(&mut self, parent: EntityId, child: EntityId) {
        let Some(entity) = self.entities.get_mut(&parent) else { return };
        entity.children.retain(|c| *c != child);
        if let Some(entity) = self.entities.get_mut(&child) {
            entity.parent = None;
        }
        self.for_each_component_of(parent, |component, cx| component.on_remove_child(child, cx));
    }

    fn notify_child_added(&mut self, parent: EntityId, child: EntityId) {
        self.for_each_component_of(parent, |component, cx| component.on_add_child(child, cx));
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("scene", &self.scene.name)
            .field("entities", &self.entities().collect::<Vec<_>>())
            .finish()
    }
}
