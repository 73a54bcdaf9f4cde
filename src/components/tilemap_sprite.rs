use std::any::Any;

use glam::{Affine2, Vec2};
use serde_json::{Map, Value};

use super::{Sprite, Transform};
use crate::ecs::{Component, ComponentKey, ComponentType, TypeTag, World};
use crate::reference::{AssetReferenceBase, ReferenceMut};
use crate::render::{RENDERABLE, Renderable, Renderer, SpriteDraw};
use crate::serializable::{ReadMethodMap, Serializable};
use crate::stream;
use crate::warning;

/// A grid of sprite-sheet frames drawn row by row. A tile id below zero is
/// empty. Is-a [`Sprite`]: lookups and references for `Sprite` match it.
#[derive(Debug, Clone)]
pub struct TilemapSprite {
    pub sprite: Sprite,
    pub tiles: Vec<i32>,
    /// Tiles per row, at least 1.
    row_width: i32,
    /// Distance between neighbouring tiles, in local units.
    pub stride_multiplier: Vec2,
}

impl Default for TilemapSprite {
    fn default() -> Self {
        Self { sprite: Sprite::default(), tiles: Vec::new(), row_width: 1, stride_multiplier: Vec2::ONE }
    }
}

impl TilemapSprite {
    pub fn new(sprite: Sprite, tiles: Vec<i32>, row_width: i32) -> Self {
        let mut tilemap = Self { sprite, tiles, ..Self::default() };
        tilemap.set_row_width(row_width);
        tilemap
    }

    pub fn row_width(&self) -> i32 {
        self.row_width
    }

    /// Widths below 1 are raised to 1 with a warning.
    pub fn set_row_width(&mut self, row_width: i32) {
        if row_width < 1 {
            warning!("tilemap sprite: row width {row_width} must be at least 1");
        }
        self.row_width = row_width.max(1);
    }

    pub fn rows(&self) -> i32 {
        (self.tiles.len() as i32 + self.row_width - 1) / self.row_width
    }

    /// Tile id at `(column, row)`, if inside the grid.
    pub fn tile(&self, column: i32, row: i32) -> Option<i32> {
        if column < 0 || row < 0 || column >= self.row_width {
            return None;
        }
        self.tiles.get((row * self.row_width + column) as usize).copied()
    }

    fn tile_offset(&self, index: usize) -> Vec2 {
        let index = index as i32;
        Vec2::new((index % self.row_width) as f32, (index / self.row_width) as f32) * self.stride_multiplier
    }

    fn read_texture(&mut self, json: &Value) { self.sprite.read_texture(json); }
    fn read_layer(&mut self, json: &Value) { self.sprite.read_layer(json); }
    fn read_color(&mut self, json: &Value) { self.sprite.read_color(json); }
    fn read_opacity(&mut self, json: &Value) { self.sprite.read_opacity(json); }
    fn read_frame(&mut self, json: &Value) { self.sprite.read_frame(json); }
    fn read_tiles(&mut self, json: &Value) { stream::read_array(&mut self.tiles, json); }
    fn read_row_width(&mut self, json: &Value) { stream::read(&mut self.row_width, json); }
    fn read_stride_multiplier(&mut self, json: &Value) { stream::read(&mut self.stride_multiplier, json); }

    const READ_METHODS: &'static ReadMethodMap<Self> = &[
        ("Texture", Self::read_texture),
        ("FrameIndex", Self::read_frame),
        ("Layer", Self::read_layer),
        ("Color", Self::read_color),
        ("Opacity", Self::read_opacity),
        ("Tiles", Self::read_tiles),
        ("RowWidth", Self::read_row_width),
        ("StrideMultiplier", Self::read_stride_multiplier),
    ];
}

impl Serializable for TilemapSprite {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn after_load(&mut self) {
        self.sprite.clamp_opacity();
        self.set_row_width(self.row_width);
    }

    fn write(&self) -> Value {
        let mut json = Map::new();
        self.sprite.write_fields(&mut json);
        json.insert("Tiles".into(), stream::write_array(&self.tiles));
        json.insert("RowWidth".into(), stream::write(&self.row_width));
        json.insert("StrideMultiplier".into(), stream::write(&self.stride_multiplier));
        Value::Object(json)
    }
}

impl Renderable for TilemapSprite {
    fn layer(&self) -> i32 {
        self.sprite.layer
    }

    fn draw(&self, world: &World, owner: ComponentKey, renderer: &mut dyn Renderer) {
        if self.sprite.opacity <= 0.0 || !self.sprite.texture.is_resolved() {
            return;
        }
        let origin = Transform::global(world, owner.entity);
        let color = self.sprite.tint();
        for (index, &tile) in self.tiles.iter().enumerate() {
            if tile < 0 {
                continue;
            }
            renderer.draw_sprite(SpriteDraw {
                texture: self.sprite.texture.name().to_string(),
                frame: tile as u32,
                transform: origin * Affine2::from_translation(self.tile_offset(index)),
                layer: self.sprite.layer,
                color,
            });
        }
    }

    fn overlaps_local_point(&self, point: Vec2) -> bool {
        let size = Vec2::new(self.row_width as f32, self.rows() as f32) * self.stride_multiplier;
        let local = point + self.sprite.pivot() * self.stride_multiplier;
        local.cmpge(Vec2::ZERO).all() && local.cmplt(size).all()
    }
}

impl Component for TilemapSprite {
    fn reference_mut(&mut self, slot: usize) -> Option<ReferenceMut<'_>> {
        self.sprite.reference_mut(slot)
    }

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }

    fn upcast(&self, tag: TypeTag) -> Option<&dyn Any> {
        (tag == Sprite::TAG).then_some(&self.sprite as &dyn Any)
    }

    fn upcast_mut(&mut self, tag: TypeTag) -> Option<&mut dyn Any> {
        (tag == Sprite::TAG).then_some(&mut self.sprite as &mut dyn Any)
    }
}

impl ComponentType for TilemapSprite {
    const TAG: TypeTag = TypeTag::new("TilemapSprite");
    const BASES: &'static [TypeTag] = &[Sprite::TAG, RENDERABLE];
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::diag;

    #[test]
    fn row_width_never_drops_below_one() {
        diag::drain();
        let mut tilemap = TilemapSprite::new(Sprite::default(), vec![0, 1, 2], 0);
        assert_eq!(tilemap.row_width(), 1);
        assert_eq!(tilemap.rows(), 3);

        tilemap.set_row_width(-4);
        assert_eq!(tilemap.tile(0, 2), Some(2));

        stream::read_object(&mut tilemap, &json!({ "RowWidth": 0 }));
        assert_eq!(tilemap.row_width(), 1);
        assert_eq!(diag::drain().len(), 3);
    }

    #[test]
    fn tiles_fill_rows_left_to_right() {
        let tilemap = TilemapSprite::new(Sprite::default(), vec![4, -1, 6, 7, 8], 2);
        assert_eq!(tilemap.rows(), 3);
        assert_eq!(tilemap.tile(1, 1), Some(7));
        assert_eq!(tilemap.tile(1, 2), None);
        assert_eq!(tilemap.tile(2, 0), None);
        assert_eq!(tilemap.tile_offset(3), Vec2::new(1.0, 1.0));
    }
}
