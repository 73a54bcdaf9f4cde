use serde_json::{Map, Value};

use crate::serializable::{ReadMethodMap, Serializable};
use crate::stream;
use crate::warning;

/// A count of one item type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ItemStack {
    pub item_id: i32,
    pub count: i32,
}

impl ItemStack {
    pub const fn new(item_id: i32, count: i32) -> Self {
        Self { item_id, count }
    }

    pub fn is_empty(&self) -> bool {
        self.count <= 0
    }

    fn read_item_id(&mut self, json: &Value) { stream::read(&mut self.item_id, json); }
    fn read_count(&mut self, json: &Value) { stream::read(&mut self.count, json); }

    const READ_METHODS: &'static ReadMethodMap<Self> =
        &[("ItemId", Self::read_item_id), ("Count", Self::read_count)];
}

impl Serializable for ItemStack {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn after_load(&mut self) {
        if self.count < 0 {
            warning!("item stack {}: negative count {} clamped to 0", self.item_id, self.count);
            self.count = 0;
        }
    }

    fn write(&self) -> Value {
        let mut json = Map::new();
        json.insert("ItemId".into(), stream::write(&self.item_id));
        json.insert("Count".into(), stream::write(&self.count));
        Value::Object(json)
    }
}
