//! The fixed-step loop and the systems it drives.
//!
//! An [`Engine`] owns the [`World`] and an ordered list of [`System`]s. Every
//! frame it runs as many fixed ticks as the accumulated real time allows,
//! then one variable update and one draw. Entity and scene changes queued
//! during a tick are applied at the sync point that ends it.

use std::path::PathBuf;

use crate::assets::AssetError;
use crate::audio::{AudioSystem, ChannelGroups};
use crate::behavior::BehaviorSystem;
use crate::collision::CollisionSystem;
use crate::config::EngineConfig;
use crate::debug::DebugSystem;
use crate::ecs::{BEHAVIOR, TypeTag, World};
use crate::input::{ControlPromptSystem, InputSystem};
use crate::render::RenderSystem;
use crate::scene::SceneSystem;
use crate::stream::StreamError;

/// Longest real-time step fed into the accumulator. Anything longer is
/// treated as a stall and dropped.
pub const MAX_FRAME_TIME: f32 = 0.25;

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("scene \"{name}\" not found at {}", path.display())]
    MissingScene { name: String, path: PathBuf },

    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("could not create window: {0}")]
    Window(#[from] winit::error::OsError),
}

// ── System ──────────────────────────────────────────────────────────────────

/// One stage of the engine loop. Every hook but [`name`](System::name) has an
/// empty default.
pub trait System {
    fn name(&self) -> &'static str;

    /// Runs once at boot, in system order. An error aborts the boot.
    fn on_init(&mut self, _world: &mut World) -> Result<(), EngineError> {
        Ok(())
    }

    /// A scene called `scene` is starting on an empty world.
    fn on_scene_init(&mut self, _world: &mut World, _scene: &str) -> Result<(), EngineError> {
        Ok(())
    }

    fn on_fixed_update(&mut self, _world: &mut World) {}

    /// Variable-rate step. Must not advance game state.
    fn on_update(&mut self, _world: &mut World, _dt: f32) {}

    fn on_draw(&mut self, _world: &World) {}

    /// The current scene is ending; its entities are still alive.
    fn on_scene_exit(&mut self, _world: &mut World) {}

    /// Runs once at shutdown, in reverse system order, after the last scene
    /// has been torn down.
    fn on_exit(&mut self, _world: &mut World) {}
}

/// Loads every registered asset library from the asset root at boot.
pub struct AssetLibrarySystem {
    root: PathBuf,
}

impl AssetLibrarySystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl System for AssetLibrarySystem {
    fn name(&self) -> &'static str {
        "AssetLibraries"
    }

    fn on_init(&mut self, world: &mut World) -> Result<(), EngineError> {
        world.assets_mut().load_all(&self.root)?;
        Ok(())
    }
}

// ── Engine ──────────────────────────────────────────────────────────────────

pub struct Engine {
    world: World,
    systems: Vec<Box<dyn System>>,
    initial_scene: Option<String>,
    accumulator: f32,
    initialized: bool,
}

impl Engine {
    /// An engine with no systems. See [`EngineBuilder`] for the standard set.
    pub fn new(world: World) -> Self {
        Self { world, systems: Vec::new(), initial_scene: None, accumulator: 0.0, initialized: false }
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn add_system(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
    }

    pub fn world(&self) -> &World { &self.world }
    pub fn world_mut(&mut self) -> &mut World { &mut self.world }
    pub fn is_initialized(&self) -> bool { self.initialized }

    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    /// Initializes every system in order, then starts the initial scene.
    pub fn init(&mut self) -> Result<(), EngineError> {
        debug_assert!(!self.initialized, "engine initialized twice");
        if self.initialized {
            return Ok(());
        }
        for system in &mut self.systems {
            log::debug!("initializing {}", system.name());
            system.on_init(&mut self.world)?;
        }
        self.initialized = true;

        if let Some(scene) = self.initial_scene.take() {
            self.start_scene(&scene)?;
        }
        log::info!("engine initialized with {} systems", self.systems.len());
        Ok(())
    }

    /// Feeds `real_dt` seconds into the accumulator and runs the resulting
    /// fixed ticks, one variable update and one draw. A non-finite `real_dt`
    /// counts as zero.
    pub fn frame(&mut self, real_dt: f32) {
        let fixed_dt = self.world.time().fixed_dt;
        let real_dt = if real_dt.is_finite() { real_dt.clamp(0.0, MAX_FRAME_TIME) } else { 0.0 };
        self.accumulator += real_dt;
        while self.accumulator >= fixed_dt {
            self.tick();
            self.accumulator -= fixed_dt;
        }

        for system in &mut self.systems {
            system.on_update(&mut self.world, real_dt);
        }
        self.sync();

        for system in &mut self.systems {
            system.on_draw(&self.world);
        }
    }

    /// One fixed step of every system, then the sync point.
    pub fn tick(&mut self) {
        for system in &mut self.systems {
            system.on_fixed_update(&mut self.world);
        }
        let time = self.world.time_mut();
        time.tick += 1;
        time.elapsed = time.tick as f64 * time.fixed_dt as f64;
        self.sync();
    }

    /// Runs `ticks` frames of exactly one fixed step each.
    pub fn run_ticks(&mut self, ticks: u64) {
        let fixed_dt = self.world.time().fixed_dt;
        for _ in 0..ticks {
            if self.world.quit_requested() {
                break;
            }
            self.frame(fixed_dt);
        }
    }

    /// Tears down the current scene and every system, in reverse order.
    pub fn exit(&mut self) {
        if !self.initialized {
            return;
        }
        self.end_scene();
        for system in self.systems.iter_mut().rev() {
            log::debug!("exiting {}", system.name());
            system.on_exit(&mut self.world);
        }
        self.initialized = false;
    }

    fn sync(&mut self) {
        self.world.apply_deferred();
        if let Some(next) = self.world.take_next_scene() {
            self.end_scene();
            if let Err(err) = self.start_scene(&next) {
                log::error!("could not start scene \"{next}\": {err}");
            }
        }
    }

    fn start_scene(&mut self, name: &str) -> Result<(), EngineError> {
        log::info!("starting scene \"{name}\"");
        for system in &mut self.systems {
            system.on_scene_init(&mut self.world, name)?;
        }
        // Spawns made by scene setup belong to the new scene.
        self.world.apply_deferred();
        Ok(())
    }

    fn end_scene(&mut self) {
        for system in self.systems.iter_mut().rev() {
            system.on_scene_exit(&mut self.world);
        }
        self.world.clear();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("systems", &self.system_names())
            .field("initialized", &self.initialized)
            .field("world", &self.world)
            .finish()
    }
}

// ── EngineBuilder ───────────────────────────────────────────────────────────

/// Assembles the standard system order:
/// Input, Audio, AssetLibraries, Scene, Behaviors, extra systems, Collision,
/// late systems, Render, Debug, ControlPrompt.
pub struct EngineBuilder {
    config: EngineConfig,
    behaviors: Vec<TypeTag>,
    systems: Vec<Box<dyn System>>,
    late_systems: Vec<Box<dyn System>>,
    headless: bool,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            behaviors: vec![BEHAVIOR],
            systems: Vec::new(),
            late_systems: Vec::new(),
            headless: false,
        }
    }
}

impl EngineBuilder {
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        let ups = config.updates_per_second;
        self.config = config;
        self.with_ups(ups)
    }

    pub fn with_ups(mut self, ups: u32) -> Self { self.config.updates_per_second = ups.max(1); self }
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self { self.config.asset_root = root.into(); self }
    pub fn with_scene_root(mut self, root: impl Into<PathBuf>) -> Self { self.config.scene_root = root.into(); self }

    /// Scene started by [`Engine::init`]. An empty name starts none.
    pub fn with_initial_scene(mut self, name: impl Into<String>) -> Self {
        self.config.initial_scene = name.into();
        self
    }

    /// Adds a system after the behavior systems and before collision.
    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Adds a system after collision and before render, for work that must
    /// see the tick's contacts (lighting, camera follow).
    pub fn with_late_system(mut self, system: impl System + 'static) -> Self {
        self.late_systems.push(Box::new(system));
        self
    }

    /// Dispatches `on_fixed_update`/`on_update` to every component
    /// registered under `tag`, in addition to [`BEHAVIOR`].
    pub fn with_behavior(mut self, tag: TypeTag) -> Self {
        if !self.behaviors.contains(&tag) {
            self.behaviors.push(tag);
        }
        self
    }

    /// Never opens an audio device.
    pub fn headless(mut self) -> Self { self.headless = true; self }

    pub fn config(&self) -> &EngineConfig { &self.config }

    pub fn build(self) -> Engine {
        let config = self.config;
        let mut world = World::new();
        world.time_mut().fixed_dt = config.fixed_dt();
        let mut engine = Engine::new(world);

        let channels = ChannelGroups::new(config.channels.clone());
        let audio = if self.headless { AudioSystem::headless(channels) } else { AudioSystem::new(channels) };

        engine.add_system(Box::new(InputSystem::new(config.actions_file.clone())));
        engine.add_system(Box::new(audio));
        engine.add_system(Box::new(AssetLibrarySystem::new(config.asset_root.clone())));
        engine.add_system(Box::new(SceneSystem::new(config.scene_root.clone())));
        for tag in self.behaviors {
            engine.add_system(Box::new(BehaviorSystem::new(tag)));
        }
        for system in self.systems {
            engine.add_system(system);
        }
        engine.add_system(Box::new(CollisionSystem::new()));
        for system in self.late_systems {
            engine.add_system(system);
        }
        engine.add_system(Box::new(RenderSystem::default()));
        engine.add_system(Box::new(DebugSystem::new()));
        engine.add_system(Box::new(ControlPromptSystem::new(config.control_prompts_file.clone())));

        if !config.initial_scene.is_empty() {
            engine.initial_scene = Some(config.initial_scene);
        }
        engine
    }
}
