use serde_json::{Map, Value};

use crate::ecs::{Component, ComponentType, TypeTag};
use crate::serializable::{ReadMethodMap, Serializable};
use crate::stream;
use crate::values::ItemStack;

/// Displays how many of one item an inventory holds.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceCounter {
    pub resources: ItemStack,
    pub opacity: f32,
}

impl Default for ResourceCounter {
    fn default() -> Self {
        Self { resources: ItemStack::default(), opacity: 1.0 }
    }
}

impl ResourceCounter {
    pub fn item_id(&self) -> i32 {
        self.resources.item_id
    }

    pub fn set_resources(&mut self, resources: ItemStack) {
        self.resources = resources;
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    /// Text shown next to the item icon.
    pub fn label(&self) -> String {
        self.resources.count.to_string()
    }

    fn read_resources(&mut self, json: &Value) { stream::read_object(&mut self.resources, json); }
    fn read_opacity(&mut self, json: &Value) { stream::read(&mut self.opacity, json); }

    const READ_METHODS: &'static ReadMethodMap<Self> =
        &[("Resources", Self::read_resources), ("Opacity", Self::read_opacity)];
}

impl Serializable for ResourceCounter {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn write(&self) -> Value {
        let mut json = Map::new();
        json.insert("Resources".into(), self.resources.write());
        json.insert("Opacity".into(), stream::write(&self.opacity));
        Value::Object(json)
    }
}

impl Component for ResourceCounter {}

impl ComponentType for ResourceCounter {
    const TAG: TypeTag = TypeTag::new("ResourceCounter");
}
