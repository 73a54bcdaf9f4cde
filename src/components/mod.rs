//! Built-in component types.

mod circle_collider;
mod event_emitter;
mod inventory;
mod resource_counter;
mod resources_ui_manager;
mod sprite;
mod tilemap_sprite;
mod transform;

pub use circle_collider::CircleCollider;
pub use event_emitter::EventEmitter;
pub use inventory::Inventory;
pub use resource_counter::ResourceCounter;
pub use resources_ui_manager::ResourcesUiManager;
pub use sprite::Sprite;
pub use tilemap_sprite::TilemapSprite;
pub use transform::Transform;

use crate::ecs::factory::ComponentTypes;

/// Registers every built-in type with the component factory.
pub fn register_builtins(types: &mut ComponentTypes) {
    types.register::<Transform>();
    types.register::<Sprite>();
    types.register::<TilemapSprite>();
    types.register::<CircleCollider>();
    types.register::<Inventory>();
    types.register::<ResourceCounter>();
    types.register::<ResourcesUiManager>();
    types.register::<EventEmitter>();
}
