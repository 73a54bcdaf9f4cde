use serde_json::{Map, Value};

use crate::ecs::{Component, ComponentType, TypeTag};
use crate::serializable::{ReadMethodMap, Serializable};
use crate::stream;
use crate::values::ItemStack;
use crate::warning;

/// Item stacks held by an entity, at most one stack per item id.
///
/// Every change bumps [`revision`](Self::revision) so watchers can tell
/// when to refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    items: Vec<ItemStack>,
    revision: u64,
}

impl Inventory {
    pub fn with_items(items: &[ItemStack]) -> Self {
        let mut inventory = Self::default();
        inventory.add_all(items);
        inventory
    }

    pub fn items(&self) -> &[ItemStack] {
        &self.items
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn count(&self, item_id: i32) -> i32 {
        self.items.iter().find(|s| s.item_id == item_id).map_or(0, |s| s.count)
    }

    pub fn contains(&self, stack: ItemStack) -> bool {
        self.count(stack.item_id) >= stack.count
    }

    pub fn contains_all(&self, stacks: &[ItemStack]) -> bool {
        stacks.iter().all(|&stack| self.contains(stack))
    }

    /// Adds to the stack of the same id, or appends a new one. Empty
    /// stacks are ignored. A stack saturates at `i32::MAX`.
    pub fn add(&mut self, stack: ItemStack) {
        if stack.is_empty() {
            return;
        }
        match self.items.iter_mut().find(|s| s.item_id == stack.item_id) {
            Some(existing) => {
                existing.count = existing.count.checked_add(stack.count).unwrap_or_else(|| {
                    warning!("inventory: item {} count capped at {}", stack.item_id, i32::MAX);
                    i32::MAX
                });
            }
            None => self.items.push(stack),
        }
        self.revision += 1;
    }

    pub fn add_all(&mut self, stacks: &[ItemStack]) {
        for &stack in stacks {
            self.add(stack);
        }
    }

    /// Takes `stack.count` items away. Fails, changing nothing, when fewer
    /// are held. A stack that reaches zero is dropped.
    pub fn remove(&mut self, stack: ItemStack) -> bool {
        if stack.is_empty() {
            return true;
        }
        let Some(index) = self.items.iter().position(|s| s.item_id == stack.item_id) else {
            return false;
        };
        if self.items[index].count < stack.count {
            return false;
        }
        self.items[index].count -= stack.count;
        if self.items[index].count == 0 {
            self.items.remove(index);
        }
        self.revision += 1;
        true
    }

    /// Removes every stack, or none of them if any is short.
    pub fn remove_all(&mut self, stacks: &[ItemStack]) -> bool {
        if !self.contains_all(stacks) {
            return false;
        }
        for &stack in stacks {
            self.remove(stack);
        }
        true
    }

    fn read_items(&mut self, json: &Value) {
        let mut stacks = Vec::new();
        stream::read_objects(&mut stacks, json);
        self.items.clear();
        self.add_all(&stacks);
    }

    const READ_METHODS: &'static ReadMethodMap<Self> = &[("Items", Self::read_items)];
}

impl Serializable for Inventory {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn write(&self) -> Value {
        let mut json = Map::new();
        json.insert("Items".into(), stream::write_objects(&self.items));
        Value::Object(json)
    }
}

impl Component for Inventory {}

impl ComponentType for Inventory {
    const TAG: TypeTag = TypeTag::new("Inventory");
}
