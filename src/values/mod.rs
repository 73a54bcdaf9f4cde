//! Small serializable value objects shared by components and assets.

mod collision_layer_flags;
mod item_stack;
mod loot_table;

pub use collision_layer_flags::CollisionLayerFlags;
pub use item_stack::ItemStack;
pub use loot_table::{LootEntry, LootTable};
