use std::any::Any;
use std::fmt;

use serde_json::Value;

use super::{ComponentKey, Context, EntityId};
use crate::collision::Collider;
use crate::reference::ReferenceMut;
use crate::render::Renderable;
use crate::serializable::Serializable;
use crate::stream;

// ---------------------------------------------------------------------------
// TypeTag
// ---------------------------------------------------------------------------

/// Interned name of a component type. Used as the factory key, the registry
/// key and the `Type` field of serialized components.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(&'static str);

impl TypeTag {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Role tag for components that take part in the per-tick update dispatch.
pub const BEHAVIOR: TypeTag = TypeTag::new("Behavior");

/// What a reference slot got connected to or disconnected from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Component(ComponentKey),
    Entity(EntityId),
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// Behavior and data attached to one entity.
///
/// Every hook has an empty default. While a hook runs the component is
/// checked out of its slot, so it can freely mutate the world through `cx`
/// but cannot look itself up.
pub trait Component: ComponentMeta + 'static {
    /// Called once when the component joins a scene, before its references
    /// are initialized.
    fn on_init(&mut self, _cx: &mut Context<'_>) {}

    /// Called once when the component leaves a scene, after its references
    /// have exited.
    fn on_exit(&mut self, _cx: &mut Context<'_>) {}

    fn on_fixed_update(&mut self, _cx: &mut Context<'_>) {}

    fn on_update(&mut self, _cx: &mut Context<'_>, _dt: f32) {}

    fn on_add_child(&mut self, _child: EntityId, _cx: &mut Context<'_>) {}

    fn on_remove_child(&mut self, _child: EntityId, _cx: &mut Context<'_>) {}

    /// Another entity's collider touched one of this entity's colliders.
    fn on_collision(&mut self, _other: ComponentKey, _cx: &mut Context<'_>) {}

    /// A broadcast event this component listens for. Downcast `event` to
    /// the types registered with [`Context::listen`].
    fn on_event(&mut self, _event: &dyn Any, _cx: &mut Context<'_>) {}

    /// Reference slot `slot`. Slots are numbered from 0 without gaps; the
    /// first `None` ends the list.
    fn reference_mut(&mut self, _slot: usize) -> Option<ReferenceMut<'_>> {
        None
    }

    /// Reference slot `slot` became bound to `target`.
    fn on_connect(&mut self, _slot: usize, _target: Target, _cx: &mut Context<'_>) {}

    /// Reference slot `slot` is about to lose `target`.
    fn on_disconnect(&mut self, _slot: usize, _target: Target, _cx: &mut Context<'_>) {}

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        None
    }

    fn as_collider(&self) -> Option<&dyn Collider> {
        None
    }

    /// The part of `self` that is an instance of the ancestor type `tag`.
    /// Types that declare [`ComponentType::BASES`] and embed the base's
    /// data return it here.
    fn upcast(&self, _tag: TypeTag) -> Option<&dyn Any> {
        None
    }

    fn upcast_mut(&mut self, _tag: TypeTag) -> Option<&mut dyn Any> {
        None
    }
}

/// Type plumbing every component gets from [`ComponentType`].
pub trait ComponentMeta: Any {
    fn type_tag(&self) -> TypeTag;
    fn bases(&self) -> &'static [TypeTag];
    fn clone_component(&self) -> Box<dyn Component>;
    /// Reads serialized fields, ignoring the `Type` key.
    fn read_json(&mut self, json: &Value);
    fn write_json(&self) -> Value;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// A concrete, factory-constructible component type.
pub trait ComponentType: Component + Serializable + Clone + Default {
    const TAG: TypeTag;

    /// Every ancestor this type is-a, nearest first. The type is listed in
    /// each ancestor's registry and matches references that expect it.
    const BASES: &'static [TypeTag] = &[];
}

impl<T: ComponentType> ComponentMeta for T {
    fn type_tag(&self) -> TypeTag {
        T::TAG
    }

    fn bases(&self) -> &'static [TypeTag] {
        T::BASES
    }

    fn clone_component(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }

    fn read_json(&mut self, json: &Value) {
        stream::read_object_except(self, json, &["Type"]);
    }

    fn write_json(&self) -> Value {
        self.write()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl dyn Component {
    /// Whether this component is a `tag`, directly or through an ancestor.
    pub fn is_a(&self, tag: TypeTag) -> bool {
        self.type_tag() == tag || self.bases().contains(&tag)
    }

    pub fn downcast_ref<T: ComponentType>(&self) -> Option<&T> {
        if self.type_tag() == T::TAG {
            self.as_any().downcast_ref::<T>()
        } else {
            self.upcast(T::TAG)?.downcast_ref::<T>()
        }
    }

    pub fn downcast_mut<T: ComponentType>(&mut self) -> Option<&mut T> {
        if self.type_tag() == T::TAG {
            self.as_any_mut().downcast_mut::<T>()
        } else {
            self.upcast_mut(T::TAG)?.downcast_mut::<T>()
        }
    }
}

impl Clone for Box<dyn Component> {
    fn clone(&self) -> Self {
        self.clone_component()
    }
}

impl fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_tag())
    }
}
