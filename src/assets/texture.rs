use glam::{IVec2, Vec2};
use serde_json::{Map, Value};

use super::Asset;
use crate::serializable::{ReadMethodMap, Serializable};
use crate::stream;
use crate::warning;

/// An image file split into a grid of equally sized frames.
///
/// The engine never decodes the image; the renderer collaborator loads
/// `filepath` and uses the sheet layout to pick frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub filepath: String,
    /// Columns and rows of the sprite sheet.
    pub sheet_dimensions: IVec2,
    /// Normalized origin inside a frame.
    pub pivot: Vec2,
}

impl Default for Texture {
    fn default() -> Self {
        Self { filepath: String::new(), sheet_dimensions: IVec2::ONE, pivot: Vec2::splat(0.5) }
    }
}

impl Texture {
    pub fn frame_count(&self) -> u32 {
        (self.sheet_dimensions.x * self.sheet_dimensions.y) as u32
    }

    /// Normalized `(offset, size)` of frame `index` on the sheet.
    pub fn frame_uv(&self, index: u32) -> Option<(Vec2, Vec2)> {
        if index >= self.frame_count() {
            return None;
        }
        let columns = self.sheet_dimensions.x as u32;
        let size = Vec2::ONE / self.sheet_dimensions.as_vec2();
        let cell = Vec2::new((index % columns) as f32, (index / columns) as f32);
        Some((cell * size, size))
    }

    fn read_filepath(&mut self, json: &Value) { stream::read(&mut self.filepath, json); }
    fn read_sheet_dimensions(&mut self, json: &Value) { stream::read(&mut self.sheet_dimensions, json); }
    fn read_pivot(&mut self, json: &Value) { stream::read(&mut self.pivot, json); }

    const READ_METHODS: &'static ReadMethodMap<Self> = &[
        ("Filepath", Self::read_filepath),
        ("SheetDimensions", Self::read_sheet_dimensions),
        ("Pivot", Self::read_pivot),
    ];
}

impl Serializable for Texture {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn after_load(&mut self) {
        if self.sheet_dimensions.min_element() < 1 {
            warning!(
                "texture \"{}\": sheet dimensions {} must be at least 1x1",
                self.filepath,
                self.sheet_dimensions
            );
            self.sheet_dimensions = self.sheet_dimensions.max(IVec2::ONE);
        }
    }

    fn write(&self) -> Value {
        let mut json = Map::new();
        json.insert("Filepath".into(), stream::write(&self.filepath));
        json.insert("SheetDimensions".into(), stream::write(&self.sheet_dimensions));
        json.insert("Pivot".into(), stream::write(&self.pivot));
        Value::Object(json)
    }
}

impl Asset for Texture {
    const LIBRARY: &'static str = "Textures";
}
