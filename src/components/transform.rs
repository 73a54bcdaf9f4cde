use glam::{Affine2, Vec2};
use serde_json::{Map, Value};

use crate::ecs::{Component, ComponentType, EntityId, TypeTag, World};
use crate::serializable::{ReadMethodMap, Serializable};
use crate::stream;

/// Position, rotation (radians) and scale relative to the parent entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub translation: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
    /// Lives in world space rather than screen space.
    pub is_diegetic: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self { translation: Vec2::ZERO, rotation: 0.0, scale: Vec2::ONE, is_diegetic: false }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec2) -> Self {
        Self { translation, ..Self::default() }
    }

    pub fn matrix(&self) -> Affine2 {
        Affine2::from_scale_angle_translation(self.scale, self.rotation, self.translation)
    }

    /// Local-to-world matrix of entity `id`: the product of every
    /// transform from the root down. Entities without a transform
    /// contribute the identity.
    pub fn global(world: &World, id: EntityId) -> Affine2 {
        let mut matrix = Affine2::IDENTITY;
        let mut current = Some(id);
        while let Some(entity) = current {
            if let Some(transform) = world.get::<Transform>(entity) {
                matrix = transform.matrix() * matrix;
            }
            current = world.parent(entity);
        }
        matrix
    }

    fn read_translation(&mut self, json: &Value) { stream::read(&mut self.translation, json); }
    fn read_rotation(&mut self, json: &Value) { stream::read(&mut self.rotation, json); }
    fn read_scale(&mut self, json: &Value) { stream::read(&mut self.scale, json); }
    fn read_is_diegetic(&mut self, json: &Value) { stream::read(&mut self.is_diegetic, json); }

    const READ_METHODS: &'static ReadMethodMap<Self> = &[
        ("Translation", Self::read_translation),
        ("Rotation", Self::read_rotation),
        ("Scale", Self::read_scale),
        ("IsDiegetic", Self::read_is_diegetic),
    ];
}

impl Serializable for Transform {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn write(&self) -> Value {
        let mut json = Map::new();
        json.insert("Translation".into(), stream::write(&self.translation));
        json.insert("Rotation".into(), stream::write(&self.rotation));
        json.insert("Scale".into(), stream::write(&self.scale));
        json.insert("IsDiegetic".into(), stream::write(&self.is_diegetic));
        Value::Object(json)
    }
}

impl Component for Transform {}

impl ComponentType for Transform {
    const TAG: TypeTag = TypeTag::new("Transform");
}
