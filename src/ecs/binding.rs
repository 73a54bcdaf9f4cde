//! Reference bookkeeping: binding reference slots to entities and
//! components, and routing add/remove/teardown events to the owners of the
//! references that watch them.

use super::{Component, ComponentKey, Context, EntityId, ReferenceKey, Target, TypeTag, World};
use crate::reference::{ReferenceKind, ReferenceMut};
use crate::warning;

/// A reference event routed to the owner of one reference slot.
#[derive(Copy, Clone, Debug)]
pub(crate) enum ReferenceOp {
    TrySet { target: ComponentKey, tag: TypeTag, bases: &'static [TypeTag] },
    TryRemove { target: ComponentKey },
    /// The watched entity is going away.
    Clear { entity: EntityId },
    /// The entity an entity reference is bound to is going away.
    ClearEntity { entity: EntityId },
    RebindAction,
}

fn slot_kinds(owner: &mut dyn Component) -> Vec<ReferenceKind> {
    let mut kinds = Vec::new();
    while let Some(reference) = owner.reference_mut(kinds.len()) {
        kinds.push(reference.kind());
    }
    kinds
}

/// Component slots listed as siblings by some entity reference.
fn claimed_slots(owner: &mut dyn Component, kinds: &[ReferenceKind]) -> Vec<usize> {
    let mut claimed = Vec::new();
    for (slot, kind) in kinds.iter().enumerate() {
        if *kind != ReferenceKind::Entity {
            continue;
        }
        if let Some(ReferenceMut::Entity(reference)) = owner.reference_mut(slot) {
            claimed.extend_from_slice(reference.siblings());
        }
    }
    claimed
}

impl World {
    // -- Lifecycle ----------------------------------------------------------

    pub(super) fn init_references(&mut self, owner: &mut dyn Component, key: ComponentKey) {
        let kinds = slot_kinds(owner);
        let claimed = claimed_slots(owner, &kinds);
        for (slot, kind) in kinds.into_iter().enumerate() {
            match kind {
                ReferenceKind::Component { follows_owner: true } if !claimed.contains(&slot) => {
                    self.attach_component_reference(owner, key, slot, key.entity);
                }
                ReferenceKind::Component { .. } => {}
                ReferenceKind::Entity => self.attach_entity_reference(owner, key, slot),
                ReferenceKind::Asset => self.init_asset_reference(owner, key, slot),
                ReferenceKind::Action => self.attach_action_reference(owner, key, slot),
            }
        }
    }

    pub(super) fn exit_references(&mut self, owner: &mut dyn Component, key: ComponentKey) {
        let kinds = slot_kinds(owner);
        for (slot, kind) in kinds.into_iter().enumerate().rev() {
            match kind {
                ReferenceKind::Component { .. } => self.detach_component_reference(owner, key, slot),
                ReferenceKind::Entity => self.detach_entity_reference(owner, key, slot),
                ReferenceKind::Asset => {}
                ReferenceKind::Action => self.detach_action_reference(owner, key, slot),
            }
        }
    }

    // -- Component references -----------------------------------------------

    fn attach_component_reference(&mut self, owner: &mut dyn Component, key: ComponentKey, slot: usize, entity: EntityId) {
        let (expected, required, attached) = match owner.reference_mut(slot) {
            Some(ReferenceMut::Component(reference)) => {
                (reference.expected(), reference.is_required(), reference.entity().is_some())
            }
            _ => return,
        };
        if attached {
            debug_assert!(false, "reference slot {slot} of {key:?} initialized twice");
            return;
        }
        if !self.contains(entity) {
            warning!("\"{}\": {expected} reference points at missing entity {entity}", self.entity_name(key.entity));
            return;
        }
        let Some(watched) = self.entities.get_mut(&entity) else { return };
        let found = watched
            .slots
            .iter()
            .find(|candidate| !candidate.pending_removal && candidate.is_a(expected))
            .map(|candidate| ComponentKey::new(entity, candidate.id));
        watched.references.push(ReferenceKey::new(key, slot));
        if let Some(ReferenceMut::Component(reference)) = owner.reference_mut(slot) {
            reference.attach(entity, found);
        }

        match found {
            Some(target) => owner.on_connect(slot, Target::Component(target), &mut Context::new(self, key)),
            None if required => warning!(
                "\"{}\": required {expected} reference found nothing on \"{}\"",
                self.entity_name(key.entity),
                self.entity_name(entity)
            ),
            None => {}
        }
    }

    fn detach_component_reference(&mut self, owner: &mut dyn Component, key: ComponentKey, slot: usize) {
        let (entity, target) = match owner.reference_mut(slot) {
            Some(ReferenceMut::Component(reference)) => (reference.entity(), reference.target()),
            _ => return,
        };
        let Some(entity) = entity else { return };
        if let Some(target) = target {
            owner.on_disconnect(slot, Target::Component(target), &mut Context::new(self, key));
        }
        let reference_key = ReferenceKey::new(key, slot);
        if let Some(watched) = self.entities.get_mut(&entity) {
            watched.references.retain(|r| *r != reference_key);
        }
        if let Some(ReferenceMut::Component(reference)) = owner.reference_mut(slot) {
            reference.clear();
        }
        self.pending.retain(|(r, _)| *r != reference_key);
    }

    /// Points component reference `slot` at `entity`, or detaches it.
    pub(super) fn rebind_component_reference(
        &mut self,
        owner: &mut dyn Component,
        key: ComponentKey,
        slot: usize,
        entity: Option<EntityId>,
    ) {
        self.detach_component_reference(owner, key, slot);
        if let Some(entity) = entity {
            self.attach_component_reference(owner, key, slot, entity);
        }
    }

    // -- Entity references --------------------------------------------------

    fn attach_entity_reference(&mut self, owner: &mut dyn Component, key: ComponentKey, slot: usize) {
        let (name, attached) = match owner.reference_mut(slot) {
            Some(ReferenceMut::Entity(reference)) => (reference.name().to_string(), reference.is_resolved()),
            _ => return,
        };
        if attached {
            debug_assert!(false, "entity reference slot {slot} of {key:?} initialized twice");
            return;
        }
        if name.is_empty() {
            return;
        }
        match self.find_entity(&name) {
            Some(entity) => self.connect_entity_reference(owner, key, slot, entity),
            None => warning!("\"{}\": no entity named \"{name}\"", self.entity_name(key.entity)),
        }
    }

    fn connect_entity_reference(&mut self, owner: &mut dyn Component, key: ComponentKey, slot: usize, entity: EntityId) {
        let siblings = match owner.reference_mut(slot) {
            Some(ReferenceMut::Entity(reference)) => {
                reference.bind(entity);
                reference.siblings().to_vec()
            }
            _ => return,
        };
        if let Some(target) = self.entities.get_mut(&entity) {
            target.entity_references.push(ReferenceKey::new(key, slot));
        }
        for sibling in siblings {
            self.attach_component_reference(owner, key, sibling, entity);
        }
        owner.on_connect(slot, Target::Entity(entity), &mut Context::new(self, key));
    }

    fn detach_entity_reference(&mut self, owner: &mut dyn Component, key: ComponentKey, slot: usize) {
        let (entity, siblings) = match owner.reference_mut(slot) {
            Some(ReferenceMut::Entity(reference)) => (reference.entity(), reference.siblings().to_vec()),
            _ => return,
        };
        let Some(entity) = entity else { return };
        for sibling in siblings.into_iter().rev() {
            self.detach_component_reference(owner, key, sibling);
        }
        owner.on_disconnect(slot, Target::Entity(entity), &mut Context::new(self, key));
        let reference_key = ReferenceKey::new(key, slot);
        if let Some(target) = self.entities.get_mut(&entity) {
            target.entity_references.retain(|r| *r != reference_key);
        }
        if let Some(ReferenceMut::Entity(reference)) = owner.reference_mut(slot) {
            reference.unbind();
        }
        self.pending.retain(|(r, _)| *r != reference_key);
    }

    /// Re-points entity reference `slot` at `entity`; its siblings follow.
    pub(super) fn retarget_entity_reference(
        &mut self,
        owner: &mut dyn Component,
        key: ComponentKey,
        slot: usize,
        entity: Option<EntityId>,
    ) {
        self.detach_entity_reference(owner, key, slot);
        let name = entity.map(|e| self.entity_name(e).to_string()).unwrap_or_default();
        match owner.reference_mut(slot) {
            Some(ReferenceMut::Entity(reference)) => reference.set_name(name),
            _ => return,
        }
        if let Some(entity) = entity.filter(|e| self.contains(*e)) {
            self.connect_entity_reference(owner, key, slot, entity);
        }
    }

    // -- Asset and action references ----------------------------------------

    fn init_asset_reference(&mut self, owner: &mut dyn Component, key: ComponentKey, slot: usize) {
        let Some(ReferenceMut::Asset(reference)) = owner.reference_mut(slot) else { return };
        reference.init(&self.assets, self.entity_name(key.entity));
    }

    fn attach_action_reference(&mut self, owner: &mut dyn Component, key: ComponentKey, slot: usize) {
        let name = match owner.reference_mut(slot) {
            Some(ReferenceMut::Action(reference)) => reference.name().to_string(),
            _ => return,
        };
        if name.is_empty() {
            return;
        }
        let action = self.input.action_id(&name);
        if action.is_none() {
            warning!("\"{}\": no input action named \"{name}\"", self.entity_name(key.entity));
        }
        if let Some(ReferenceMut::Action(reference)) = owner.reference_mut(slot) {
            reference.bind(action);
        }
        self.input.watch(ReferenceKey::new(key, slot));
    }

    fn detach_action_reference(&mut self, owner: &mut dyn Component, key: ComponentKey, slot: usize) {
        self.input.unwatch(ReferenceKey::new(key, slot));
        if let Some(ReferenceMut::Action(reference)) = owner.reference_mut(slot) {
            reference.bind(None);
        }
    }

    /// Re-resolves every registered action reference by name. Call after
    /// replacing the action roster.
    pub fn rebind_actions(&mut self) {
        for reference in self.input.watchers().to_vec() {
            self.visit_owner(reference, ReferenceOp::RebindAction);
        }
    }

    // -- Fan-out ------------------------------------------------------------

    /// Offers a freshly initialized component to every reference watching
    /// its entity.
    pub(super) fn notify_added(&mut self, key: ComponentKey) {
        let Some(slot) = self.slot(key) else { return };
        if !slot.initialized || slot.pending_removal {
            return;
        }
        let (tag, bases) = (slot.tag, slot.bases);
        let watchers = match self.entities.get(&key.entity) {
            Some(entity) => entity.references.clone(),
            None => return,
        };
        for reference in watchers {
            self.visit_owner(reference, ReferenceOp::TrySet { target: key, tag, bases });
        }
    }

    /// Unbinds every reference bound to a component that is about to exit.
    /// The component's own references are left to its exit.
    pub(super) fn notify_removing(&mut self, key: ComponentKey) {
        let watchers = match self.entities.get(&key.entity) {
            Some(entity) => entity.references.clone(),
            None => return,
        };
        for reference in watchers.into_iter().filter(|r| r.owner != key) {
            self.visit_owner(reference, ReferenceOp::TryRemove { target: key });
        }
    }

    /// Clears every reference watching or bound to `entity`.
    pub(super) fn clear_inbound(&mut self, entity: EntityId) {
        let (references, entity_references) = match self.entities.get_mut(&entity) {
            Some(target) => (
                std::mem::take(&mut target.references),
                std::mem::take(&mut target.entity_references),
            ),
            None => return,
        };
        for reference in references {
            self.visit_owner(reference, ReferenceOp::Clear { entity });
        }
        for reference in entity_references {
            self.visit_owner(reference, ReferenceOp::ClearEntity { entity });
        }
    }

    /// Applies `op` to the owner of `reference` now, or once the owner is
    /// checked back in if it is running a hook.
    pub(super) fn visit_owner(&mut self, reference: ReferenceKey, op: ReferenceOp) {
        if let Some(mut owner) = self.checkout(reference.owner) {
            self.apply(owner.as_mut(), reference, op);
            self.checkin(reference.owner, owner);
        } else if self.is_checked_out(reference.owner) {
            self.pending.push((reference, op));
        }
    }

    pub(super) fn replay_pending(&mut self, key: ComponentKey) {
        if !self.pending.iter().any(|(reference, _)| reference.owner == key) {
            return;
        }
        let (due, rest): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.pending).into_iter().partition(|(reference, _)| reference.owner == key);
        self.pending = rest;
        for (reference, op) in due {
            self.visit_owner(reference, op);
        }
    }

    fn apply(&mut self, owner: &mut dyn Component, reference: ReferenceKey, op: ReferenceOp) {
        let ReferenceKey { owner: key, slot } = reference;
        match op {
            ReferenceOp::TrySet { target, tag, bases } => {
                let bound = match owner.reference_mut(slot) {
                    Some(ReferenceMut::Component(r)) => r.try_set(target, tag, bases),
                    _ => false,
                };
                if bound {
                    owner.on_connect(slot, Target::Component(target), &mut Context::new(self, key));
                }
            }
            ReferenceOp::TryRemove { target } => {
                let bound = matches!(
                    owner.reference_mut(slot),
                    Some(ReferenceMut::Component(r)) if r.target() == Some(target)
                );
                if bound {
                    owner.on_disconnect(slot, Target::Component(target), &mut Context::new(self, key));
                    if let Some(ReferenceMut::Component(r)) = owner.reference_mut(slot) {
                        r.try_remove(target);
                    }
                }
            }
            ReferenceOp::Clear { entity } => {
                let target = match owner.reference_mut(slot) {
                    Some(ReferenceMut::Component(r)) if r.entity() == Some(entity) => r.target(),
                    _ => return,
                };
                if let Some(target) = target {
                    owner.on_disconnect(slot, Target::Component(target), &mut Context::new(self, key));
                }
                if let Some(ReferenceMut::Component(r)) = owner.reference_mut(slot) {
                    r.clear();
                }
            }
            ReferenceOp::ClearEntity { entity } => {
                let bound = matches!(
                    owner.reference_mut(slot),
                    Some(ReferenceMut::Entity(r)) if r.entity() == Some(entity)
                );
                if bound {
                    owner.on_disconnect(slot, Target::Entity(entity), &mut Context::new(self, key));
                    if let Some(ReferenceMut::Entity(r)) = owner.reference_mut(slot) {
                        r.unbind();
                    }
                }
            }
            ReferenceOp::RebindAction => {
                let Some(ReferenceMut::Action(r)) = owner.reference_mut(slot) else { return };
                let action = self.input.action_id(r.name());
                r.bind(action);
            }
        }
    }
}
