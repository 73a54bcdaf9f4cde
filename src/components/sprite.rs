use glam::{Vec2, Vec4};
use serde_json::{Map, Value};

use super::Transform;
use crate::assets::Texture;
use crate::ecs::{Component, ComponentKey, ComponentType, TypeTag, World};
use crate::reference::{AssetReference, ReferenceMut};
use crate::reference::AssetReferenceBase;
use crate::render::{RENDERABLE, Renderable, Renderer, SpriteDraw};
use crate::serializable::{ReadMethodMap, Serializable};
use crate::stream;
use crate::warning;

/// One frame of a texture, drawn as a unit quad around the texture pivot.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub texture: AssetReference<Texture>,
    pub frame: u32,
    pub layer: i32,
    pub color: Vec4,
    pub opacity: f32,
}

impl Default for Sprite {
    fn default() -> Self {
        Self { texture: AssetReference::new(), frame: 0, layer: 0, color: Vec4::ONE, opacity: 1.0 }
    }
}

impl Sprite {
    pub fn new(texture: &str, layer: i32) -> Self {
        Self { texture: AssetReference::named(texture), layer, ..Self::default() }
    }

    /// Color with the opacity folded into alpha.
    pub fn tint(&self) -> Vec4 {
        self.color.truncate().extend(self.color.w * self.opacity)
    }

    pub(super) fn pivot(&self) -> Vec2 {
        self.texture.get().map_or(Vec2::splat(0.5), |texture| texture.pivot)
    }

    pub(super) fn read_texture(&mut self, json: &Value) { self.texture.read(json); }
    pub(super) fn read_frame(&mut self, json: &Value) { stream::read(&mut self.frame, json); }
    pub(super) fn read_layer(&mut self, json: &Value) { stream::read(&mut self.layer, json); }
    pub(super) fn read_color(&mut self, json: &Value) { stream::read(&mut self.color, json); }
    pub(super) fn read_opacity(&mut self, json: &Value) { stream::read(&mut self.opacity, json); }

    pub(super) fn clamp_opacity(&mut self) {
        if !(0.0..=1.0).contains(&self.opacity) {
            warning!("sprite: opacity {} clamped into [0, 1]", self.opacity);
            self.opacity = self.opacity.clamp(0.0, 1.0);
        }
    }

    pub(super) fn write_fields(&self, json: &mut Map<String, Value>) {
        json.insert("Texture".into(), self.texture.write());
        json.insert("FrameIndex".into(), stream::write(&self.frame));
        json.insert("Layer".into(), stream::write(&self.layer));
        json.insert("Color".into(), stream::write(&self.color));
        json.insert("Opacity".into(), stream::write(&self.opacity));
    }

    const READ_METHODS: &'static ReadMethodMap<Self> = &[
        ("Texture", Self::read_texture),
        ("FrameIndex", Self::read_frame),
        ("Layer", Self::read_layer),
        ("Color", Self::read_color),
        ("Opacity", Self::read_opacity),
    ];
}

impl Serializable for Sprite {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn after_load(&mut self) {
        self.clamp_opacity();
    }

    fn write(&self) -> Value {
        let mut json = Map::new();
        self.write_fields(&mut json);
        Value::Object(json)
    }
}

impl Renderable for Sprite {
    fn layer(&self) -> i32 {
        self.layer
    }

    fn draw(&self, world: &World, owner: ComponentKey, renderer: &mut dyn Renderer) {
        if self.opacity <= 0.0 || !self.texture.is_resolved() {
            return;
        }
        renderer.draw_sprite(SpriteDraw {
            texture: self.texture.name().to_string(),
            frame: self.frame,
            transform: Transform::global(world, owner.entity),
            layer: self.layer,
            color: self.tint(),
        });
    }

    fn overlaps_local_point(&self, point: Vec2) -> bool {
        let local = point + self.pivot();
        local.cmpge(Vec2::ZERO).all() && local.cmple(Vec2::ONE).all()
    }
}

impl Component for Sprite {
    fn reference_mut(&mut self, slot: usize) -> Option<ReferenceMut<'_>> {
        match slot {
            0 => Some(ReferenceMut::Asset(&mut self.texture)),
            _ => None,
        }
    }

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }
}

impl ComponentType for Sprite {
    const TAG: TypeTag = TypeTag::new("Sprite");
    const BASES: &'static [TypeTag] = &[RENDERABLE];
}
