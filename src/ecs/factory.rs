//! Process-wide table from component type name to constructor.
//!
//! Built-in component types are registered the first time the table is
//! touched; game code adds its own with [`register`].

use std::collections::HashMap;
use std::sync::{LazyLock, PoisonError, RwLock};

use super::{Component, ComponentType, TypeTag};

type Constructor = fn() -> Box<dyn Component>;

/// What the factory knows about one component type.
#[derive(Copy, Clone, Debug)]
pub struct ComponentInfo {
    pub tag: TypeTag,
    pub bases: &'static [TypeTag],
    create: Constructor,
}

impl ComponentInfo {
    pub fn create(&self) -> Box<dyn Component> {
        (self.create)()
    }

    pub fn is_a(&self, tag: TypeTag) -> bool {
        self.tag == tag || self.bases.contains(&tag)
    }
}

#[derive(Default)]
pub struct ComponentTypes {
    by_name: HashMap<&'static str, ComponentInfo>,
}

impl ComponentTypes {
    pub fn register<T: ComponentType>(&mut self) {
        self.by_name.entry(T::TAG.name()).or_insert(ComponentInfo {
            tag: T::TAG,
            bases: T::BASES,
            create: construct::<T>,
        });
    }

    pub fn get(&self, name: &str) -> Option<ComponentInfo> {
        self.by_name.get(name).copied()
    }
}

fn construct<T: ComponentType>() -> Box<dyn Component> {
    Box::new(T::default())
}

static TYPES: LazyLock<RwLock<ComponentTypes>> = LazyLock::new(|| {
    let mut types = ComponentTypes::default();
    crate::components::register_builtins(&mut types);
    RwLock::new(types)
});

/// Makes `T` constructible from its tag name. Registering twice is a no-op.
pub fn register<T: ComponentType>() {
    TYPES.write().unwrap_or_else(PoisonError::into_inner).register::<T>();
}

pub fn info(name: &str) -> Option<ComponentInfo> {
    TYPES.read().unwrap_or_else(PoisonError::into_inner).get(name)
}

/// Default-constructed component of the type called `name`.
pub fn create(name: &str) -> Option<Box<dyn Component>> {
    info(name).map(|info| info.create())
}

/// Every registered type name, sorted.
pub fn names() -> Vec<&'static str> {
    let types = TYPES.read().unwrap_or_else(PoisonError::into_inner);
    let mut names: Vec<_> = types.by_name.keys().copied().collect();
    names.sort_unstable();
    names
}
