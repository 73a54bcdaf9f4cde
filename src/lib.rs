//! Entity/component core of a small 2D engine: JSON-described prefabs and
//! scenes, self-healing references between components, entities, assets
//! and input actions, and a fixed-step loop driving a list of systems.

pub mod diag;

pub mod assets;
pub mod audio;
pub mod behavior;
pub mod collision;
pub mod components;
pub mod config;
pub mod debug;
pub mod ecs;
pub mod engine;
pub mod events;
pub mod input;
pub mod platform;
pub mod reference;
pub mod render;
pub mod scene;
pub mod serializable;
pub mod stream;
pub mod values;

pub use config::EngineConfig;
pub use ecs::{Component, ComponentType, Context, Prefab, World};
pub use engine::{Engine, EngineBuilder, EngineError, System};
