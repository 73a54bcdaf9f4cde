use serde_json::{Map, Value};

use crate::serializable::{ReadMethodMap, Serializable};
use crate::stream;

/// Bit set of collision layers, one bit per layer index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CollisionLayerFlags {
    pub flags: u32,
}

impl CollisionLayerFlags {
    pub const NONE: Self = Self { flags: 0 };
    pub const ALL: Self = Self { flags: u32::MAX };

    pub const fn new(flags: u32) -> Self {
        Self { flags }
    }

    /// Whether the bit for `layer` is set. Layers past 31 are never included.
    pub fn includes(self, layer: u32) -> bool {
        layer < u32::BITS && self.flags & (1 << layer) != 0
    }

    pub fn with(self, layer: u32) -> Self {
        if layer < u32::BITS { Self { flags: self.flags | (1 << layer) } } else { self }
    }

    fn read_flags(&mut self, json: &Value) { stream::read(&mut self.flags, json); }

    const READ_METHODS: &'static ReadMethodMap<Self> = &[("Flags", Self::read_flags)];
}

impl From<u32> for CollisionLayerFlags {
    fn from(flags: u32) -> Self {
        Self { flags }
    }
}

impl Serializable for CollisionLayerFlags {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn write(&self) -> Value {
        let mut json = Map::new();
        json.insert("Flags".into(), stream::write(&self.flags));
        Value::Object(json)
    }
}
