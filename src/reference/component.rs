use std::fmt;
use std::marker::PhantomData;

use crate::ecs::{ComponentKey, ComponentType, EntityId, TypeTag, World};

/// Object-safe surface of a [`ComponentReference`], used by the world to
/// route add, remove and teardown events.
pub trait ComponentReferenceBase {
    fn expected(&self) -> TypeTag;
    fn is_required(&self) -> bool;
    /// Whether the reference binds to its owner's entity at init.
    fn follows_owner(&self) -> bool;
    /// Entity being watched.
    fn entity(&self) -> Option<EntityId>;
    /// Component currently bound.
    fn target(&self) -> Option<ComponentKey>;
    /// Starts watching `entity`, bound to `target` if one matched.
    fn attach(&mut self, entity: EntityId, target: Option<ComponentKey>);
    /// Binds `candidate` if the reference is watching its entity, is
    /// unresolved and `candidate` is-a the expected type. Returns whether it
    /// bound.
    fn try_set(&mut self, candidate: ComponentKey, tag: TypeTag, bases: &[TypeTag]) -> bool;
    /// Unbinds if currently bound to `candidate`. Keeps watching.
    fn try_remove(&mut self, candidate: ComponentKey) -> bool;
    /// Stops watching and unbinds.
    fn clear(&mut self);
}

/// Handle to the first component of type `T` on some entity.
///
/// By default the reference watches its owner's own entity. References
/// created with [`external`](Self::external) stay detached until bound
/// through an [`EntityReference`](super::EntityReference) sibling list or
/// [`Context::bind_reference`](crate::ecs::Context::bind_reference).
/// `REQUIRED` references warn when nothing matches at init.
pub struct ComponentReference<T, const REQUIRED: bool = false> {
    follows_owner: bool,
    entity: Option<EntityId>,
    target: Option<ComponentKey>,
    marker: PhantomData<fn() -> T>,
}

impl<T: ComponentType, const REQUIRED: bool> ComponentReference<T, REQUIRED> {
    pub fn new() -> Self {
        Self { follows_owner: true, entity: None, target: None, marker: PhantomData }
    }

    pub fn external() -> Self {
        Self { follows_owner: false, ..Self::new() }
    }

    pub fn key(&self) -> Option<ComponentKey> {
        self.target
    }

    pub fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    pub fn is_resolved(&self) -> bool {
        self.target.is_some()
    }

    pub fn get<'w>(&self, world: &'w World) -> Option<&'w T> {
        world.component::<T>(self.target?)
    }

    pub fn get_mut<'w>(&self, world: &'w mut World) -> Option<&'w mut T> {
        world.component_mut::<T>(self.target?)
    }

    /// Like [`get`](Self::get), for call sites where the target must exist.
    ///
    /// # Panics
    ///
    /// If the reference is unresolved.
    pub fn expect<'w>(&self, world: &'w World) -> &'w T {
        match self.get(world) {
            Some(target) => target,
            None => panic!("{} reference is not bound", T::TAG),
        }
    }
}

impl<T: ComponentType, const REQUIRED: bool> Default for ComponentReference<T, REQUIRED> {
    fn default() -> Self {
        Self::new()
    }
}

/// Clones come back unbound, in the same mode.
impl<T, const REQUIRED: bool> Clone for ComponentReference<T, REQUIRED> {
    fn clone(&self) -> Self {
        Self { follows_owner: self.follows_owner, entity: None, target: None, marker: PhantomData }
    }
}

impl<T: ComponentType, const REQUIRED: bool> fmt::Debug for ComponentReference<T, REQUIRED> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentReference")
            .field("expected", &T::TAG)
            .field("entity", &self.entity)
            .field("target", &self.target)
            .finish()
    }
}

impl<T: ComponentType, const REQUIRED: bool> ComponentReferenceBase for ComponentReference<T, REQUIRED> {
    fn expected(&self) -> TypeTag { T::TAG }
    fn is_required(&self) -> bool { REQUIRED }
    fn follows_owner(&self) -> bool { self.follows_owner }
    fn entity(&self) -> Option<EntityId> { self.entity }
    fn target(&self) -> Option<ComponentKey> { self.target }

    fn attach(&mut self, entity: EntityId, target: Option<ComponentKey>) {
        self.entity = Some(entity);
        self.target = target;
    }

    fn try_set(&mut self, candidate: ComponentKey, tag: TypeTag, bases: &[TypeTag]) -> bool {
        if self.target.is_some() || self.entity != Some(candidate.entity) {
            return false;
        }
        if tag != T::TAG && !bases.contains(&T::TAG) {
            return false;
        }
        self.target = Some(candidate);
        true
    }

    fn try_remove(&mut self, candidate: ComponentKey) -> bool {
        if self.target != Some(candidate) {
            return false;
        }
        self.target = None;
        true
    }

    fn clear(&mut self) {
        self.entity = None;
        self.target = None;
    }
}
