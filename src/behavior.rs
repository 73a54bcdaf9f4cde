use crate::ecs::{ComponentType, TypeTag, World};
use crate::engine::System;

/// Forwards the fixed and variable updates to every component registered
/// under one tag, in registry order.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorSystem {
    tag: TypeTag,
}

impl BehaviorSystem {
    pub fn new(tag: TypeTag) -> Self {
        Self { tag }
    }

    /// Drives every component that is-a `T`.
    pub fn of<T: ComponentType>() -> Self {
        Self::new(T::TAG)
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }
}

impl System for BehaviorSystem {
    fn name(&self) -> &'static str {
        self.tag.name()
    }

    fn on_fixed_update(&mut self, world: &mut World) {
        world.dispatch_fixed_update(self.tag);
    }

    fn on_update(&mut self, world: &mut World, dt: f32) {
        world.dispatch_update(self.tag, dt);
    }
}
