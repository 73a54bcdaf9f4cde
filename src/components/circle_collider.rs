use glam::Vec2;
use serde_json::{Map, Value};

use super::Transform;
use crate::collision::{COLLIDER, Collider};
use crate::ecs::{Component, ComponentType, TypeTag, World};
use crate::reference::{ComponentReference, ReferenceMut};
use crate::serializable::{ReadMethodMap, Serializable};
use crate::stream;
use crate::values::CollisionLayerFlags;
use crate::warning;

/// A circle around the entity's origin, scaled with its transform.
#[derive(Debug, Clone)]
pub struct CircleCollider {
    pub radius: f32,
    pub collision_layer: u32,
    pub collision_layer_flags: CollisionLayerFlags,
    transform: ComponentReference<Transform, true>,
}

impl Default for CircleCollider {
    fn default() -> Self {
        Self {
            radius: 1.0,
            collision_layer: 0,
            collision_layer_flags: CollisionLayerFlags::ALL,
            transform: ComponentReference::new(),
        }
    }
}

impl CircleCollider {
    pub fn new(radius: f32) -> Self {
        Self { radius, ..Self::default() }
    }

    pub fn on_layer(mut self, layer: u32, flags: CollisionLayerFlags) -> Self {
        self.collision_layer = layer;
        self.collision_layer_flags = flags;
        self
    }

    fn read_radius(&mut self, json: &Value) { stream::read(&mut self.radius, json); }
    fn read_collision_layer(&mut self, json: &Value) { stream::read(&mut self.collision_layer, json); }
    fn read_collision_layer_flags(&mut self, json: &Value) {
        stream::read_object(&mut self.collision_layer_flags, json);
    }

    const READ_METHODS: &'static ReadMethodMap<Self> = &[
        ("Radius", Self::read_radius),
        ("CollisionLayer", Self::read_collision_layer),
        ("CollisionLayerFlags", Self::read_collision_layer_flags),
    ];
}

impl Serializable for CircleCollider {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn after_load(&mut self) {
        if self.radius < 0.0 {
            warning!("circle collider: negative radius {} clamped to 0", self.radius);
            self.radius = 0.0;
        }
    }

    fn write(&self) -> Value {
        let mut json = Map::new();
        json.insert("Radius".into(), stream::write(&self.radius));
        json.insert("CollisionLayer".into(), stream::write(&self.collision_layer));
        json.insert("CollisionLayerFlags".into(), self.collision_layer_flags.write());
        Value::Object(json)
    }
}

impl Collider for CircleCollider {
    fn collision_layer(&self) -> u32 {
        self.collision_layer
    }

    fn collision_layer_flags(&self) -> CollisionLayerFlags {
        self.collision_layer_flags
    }

    fn world_circle(&self, world: &World) -> Option<(Vec2, f32)> {
        let entity = self.transform.key()?.entity;
        let matrix = Transform::global(world, entity);
        let scale = matrix.matrix2.x_axis.length().max(matrix.matrix2.y_axis.length());
        Some((matrix.translation, self.radius * scale))
    }
}

impl Component for CircleCollider {
    fn reference_mut(&mut self, slot: usize) -> Option<ReferenceMut<'_>> {
        match slot {
            0 => Some(ReferenceMut::Component(&mut self.transform)),
            _ => None,
        }
    }

    fn as_collider(&self) -> Option<&dyn Collider> {
        Some(self)
    }
}

impl ComponentType for CircleCollider {
    const TAG: TypeTag = TypeTag::new("CircleCollider");
    const BASES: &'static [TypeTag] = &[COLLIDER];
}
