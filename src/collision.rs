//! Circle-vs-circle overlap tests between registered colliders.

use glam::Vec2;

use crate::ecs::{ComponentKey, TypeTag, World};
use crate::engine::System;
use crate::values::CollisionLayerFlags;

/// Registry tag listing every collider component.
pub const COLLIDER: TypeTag = TypeTag::new("Collider");

pub trait Collider {
    /// Layer this collider sits on.
    fn collision_layer(&self) -> u32;

    /// Layers this collider reacts to.
    fn collision_layer_flags(&self) -> CollisionLayerFlags;

    /// World-space center and radius, if the collider can be placed.
    fn world_circle(&self, world: &World) -> Option<(Vec2, f32)>;
}

struct Shape {
    key: ComponentKey,
    layer: u32,
    flags: CollisionLayerFlags,
    center: Vec2,
    radius: f32,
}

impl Shape {
    fn interacts_with(&self, other: &Shape) -> bool {
        self.key.entity != other.key.entity
            && self.flags.includes(other.layer)
            && other.flags.includes(self.layer)
    }

    fn overlaps(&self, other: &Shape) -> bool {
        let reach = self.radius + other.radius;
        self.center.distance_squared(other.center) <= reach * reach
    }
}

/// Every overlapping collider pair, each pair once, in registry order.
pub fn contacts(world: &World) -> Vec<(ComponentKey, ComponentKey)> {
    let shapes: Vec<Shape> = world
        .registry(COLLIDER)
        .iter()
        .filter_map(|&key| {
            let collider = world.component_dyn(key)?.as_collider()?;
            let (center, radius) = collider.world_circle(world)?;
            Some(Shape {
                key,
                layer: collider.collision_layer(),
                flags: collider.collision_layer_flags(),
                center,
                radius,
            })
        })
        .collect();

    let mut pairs = Vec::new();
    for (i, a) in shapes.iter().enumerate() {
        for b in &shapes[i + 1..] {
            if a.interacts_with(b) && a.overlaps(b) {
                pairs.push((a.key, b.key));
            }
        }
    }
    pairs
}

/// Tests all colliders once per tick and tells every component of both
/// entities about each contact.
#[derive(Debug, Default)]
pub struct CollisionSystem {
    contacts: usize,
}

impl CollisionSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contacts found on the last tick.
    pub fn last_contacts(&self) -> usize {
        self.contacts
    }
}

impl System for CollisionSystem {
    fn name(&self) -> &'static str {
        "Collision"
    }

    fn on_fixed_update(&mut self, world: &mut World) {
        let pairs = contacts(world);
        self.contacts = pairs.len();
        for (a, b) in pairs {
            world.for_each_component_of(a.entity, |component, cx| component.on_collision(b, cx));
            world.for_each_component_of(b.entity, |component, cx| component.on_collision(a, cx));
        }
    }
}
