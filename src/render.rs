//! The render collaborator.
//!
//! Components that draw declare [`RENDERABLE`] among their bases and expose
//! themselves through [`Component::as_renderable`](crate::ecs::Component).
//! The Render system orders them by layer and hands each one a [`Renderer`]
//! to record draw calls into. What a renderer does with those calls is up to
//! the backend; the engine ships [`DrawList`], which only records them.

use glam::{Affine2, Vec2, Vec4};

use crate::components::Transform;
use crate::ecs::{ComponentKey, TypeTag, World};
use crate::engine::System;

/// Registry tag listing every drawable component.
pub const RENDERABLE: TypeTag = TypeTag::new("Renderable");

pub trait Renderable {
    /// Lower layers draw first.
    fn layer(&self) -> i32;

    fn draw(&self, world: &World, owner: ComponentKey, renderer: &mut dyn Renderer);

    /// Whether `point`, in the owning entity's local space, hits this sprite.
    fn overlaps_local_point(&self, point: Vec2) -> bool;
}

/// One textured quad.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteDraw {
    pub texture: String,
    pub frame: u32,
    pub transform: Affine2,
    pub layer: i32,
    pub color: Vec4,
}

pub trait Renderer {
    fn begin_frame(&mut self) {}
    fn draw_sprite(&mut self, draw: SpriteDraw);
    fn end_frame(&mut self) {}
}

/// Renderer that keeps the draw calls of the last frame.
#[derive(Debug, Default)]
pub struct DrawList {
    pub draws: Vec<SpriteDraw>,
}

impl Renderer for DrawList {
    fn begin_frame(&mut self) {
        self.draws.clear();
    }

    fn draw_sprite(&mut self, draw: SpriteDraw) {
        self.draws.push(draw);
    }
}

/// Registered renderables, stable-sorted by layer. Equal layers keep
/// registry order.
pub fn draw_order(world: &World) -> Vec<(i32, ComponentKey)> {
    let mut order: Vec<(i32, ComponentKey)> = world
        .registry(RENDERABLE)
        .iter()
        .filter_map(|&key| {
            let renderable = world.component_dyn(key)?.as_renderable()?;
            Some((renderable.layer(), key))
        })
        .collect();
    order.sort_by_key(|&(layer, _)| layer);
    order
}

/// Draws every renderable of `world` into `renderer`.
pub fn render(world: &World, renderer: &mut dyn Renderer) {
    renderer.begin_frame();
    for (_, key) in draw_order(world) {
        if let Some(renderable) = world.component_dyn(key).and_then(|c| c.as_renderable()) {
            renderable.draw(world, key, renderer);
        }
    }
    renderer.end_frame();
}

/// Top-most renderable under the world-space `point`.
pub fn pick(world: &World, point: Vec2) -> Option<ComponentKey> {
    draw_order(world).into_iter().rev().map(|(_, key)| key).find(|&key| {
        let Some(renderable) = world.component_dyn(key).and_then(|c| c.as_renderable()) else {
            return false;
        };
        let local = Transform::global(world, key.entity).inverse().transform_point2(point);
        renderable.overlaps_local_point(local)
    })
}

// ── RenderSystem ────────────────────────────────────────────────────────────

pub struct RenderSystem {
    renderer: Box<dyn Renderer>,
    frames: u64,
}

impl RenderSystem {
    pub fn new(renderer: Box<dyn Renderer>) -> Self {
        Self { renderer, frames: 0 }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for RenderSystem {
    fn default() -> Self {
        Self::new(Box::new(DrawList::default()))
    }
}

impl System for RenderSystem {
    fn name(&self) -> &'static str {
        "Render"
    }

    fn on_draw(&mut self, world: &World) {
        render(world, self.renderer.as_mut());
        self.frames += 1;
    }
}
