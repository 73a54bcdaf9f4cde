use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use quarry::components::Transform;
use quarry::ecs::*;
use quarry::EngineConfig;
use quarry::engine::{Engine, EngineBuilder, EngineError, System};
use quarry::scene::{self, SceneFile};
use quarry::serializable::{ReadMethodMap, Serializable};
use quarry::stream;
use serde_json::{Value, json};

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("quarry-engine-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_scene(root: &Path, name: &str, entities: Value) {
    let json = json!({ "Name": name, "Lighting": { "Ambient": 0.5 }, "Entities": entities });
    stream::write_file(&scene::SceneFile::path(root, name), &json).unwrap();
}

fn headless(root: &Path) -> EngineBuilder {
    Engine::builder()
        .headless()
        .with_asset_root(root.join("Assets"))
        .with_scene_root(root)
        .with_initial_scene("")
}

/// Writes every engine hook it receives into a shared log.
struct Recorder {
    log: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    fn new() -> (Self, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        (Self { log: log.clone() }, log)
    }

    fn push(&self, event: impl Into<String>) {
        self.log.borrow_mut().push(event.into());
    }
}

impl System for Recorder {
    fn name(&self) -> &'static str {
        "Recorder"
    }

    fn on_init(&mut self, _world: &mut World) -> Result<(), EngineError> {
        self.push("init");
        Ok(())
    }

    fn on_scene_init(&mut self, world: &mut World, scene: &str) -> Result<(), EngineError> {
        self.push(format!("scene {scene} {}", world.len()));
        Ok(())
    }

    fn on_fixed_update(&mut self, _world: &mut World) {
        self.push("fixed");
    }

    fn on_update(&mut self, _world: &mut World, _dt: f32) {
        self.push("update");
    }

    fn on_draw(&mut self, _world: &World) {
        self.push("draw");
    }

    fn on_scene_exit(&mut self, world: &mut World) {
        self.push(format!("scene exit {}", world.len()));
    }

    fn on_exit(&mut self, world: &mut World) {
        self.push(format!("exit {}", world.len()));
    }
}

/// A system that only has a name.
struct Marker(&'static str);

impl System for Marker {
    fn name(&self) -> &'static str {
        self.0
    }
}

/// Spawns one entity on its first fixed update, and switches scene when
/// asked to.
#[derive(Debug, Clone, Default)]
struct Spawner {
    spawned: bool,
    next_scene: String,
}

impl Spawner {
    fn read_next_scene(&mut self, json: &Value) { stream::read(&mut self.next_scene, json); }

    const READ_METHODS: &'static ReadMethodMap<Self> = &[("NextScene", Self::read_next_scene)];
}

impl Serializable for Spawner {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn write(&self) -> Value {
        json!({ "NextScene": self.next_scene })
    }
}

impl Component for Spawner {
    fn on_fixed_update(&mut self, cx: &mut Context<'_>) {
        if !self.spawned {
            self.spawned = true;
            cx.spawn(Prefab::new("Spawned").with(Transform::default()));
        }
        if !self.next_scene.is_empty() {
            let next = std::mem::take(&mut self.next_scene);
            cx.set_next_scene(next);
        }
    }
}

impl ComponentType for Spawner {
    const TAG: TypeTag = TypeTag::new("Spawner");
    const BASES: &'static [TypeTag] = &[BEHAVIOR];
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- boot ---------------------------------------------------------------

    #[test]
    fn builder_lays_out_the_standard_system_order() {
        let dir = temp_dir("order");
        let (recorder, _) = Recorder::new();
        let engine = headless(&dir).with_system(recorder).build();
        assert_eq!(
            engine.system_names(),
            vec![
                "Input", "Audio", "AssetLibraries", "Scene", "Behavior", "Recorder", "Collision", "Render", "Debug",
                "ControlPrompt"
            ]
        );
    }

    #[test]
    fn late_systems_run_between_collision_and_render() {
        let dir = temp_dir("late");
        let engine = headless(&dir).with_late_system(Marker("Lighting")).with_system(Marker("Early")).build();
        assert_eq!(
            engine.system_names(),
            vec![
                "Input", "Audio", "AssetLibraries", "Scene", "Behavior", "Early", "Collision", "Lighting", "Render",
                "Debug", "ControlPrompt"
            ]
        );
    }

    #[test]
    fn missing_initial_scene_fails_init() {
        let dir = temp_dir("missing");
        let mut engine = headless(&dir).with_initial_scene("Nowhere").build();
        match engine.init() {
            Err(EngineError::MissingScene { name, .. }) => assert_eq!(name, "Nowhere"),
            other => panic!("expected a missing scene, got {other:?}"),
        }
    }

    #[test]
    fn init_loads_the_initial_scene() {
        let dir = temp_dir("init");
        write_scene(&dir, "Main", json!([
            { "Name": "Camera", "Components": [{ "Type": "Transform" }] },
            { "Name": "Player", "Children": [{ "Name": "Hat" }] }
        ]));
        let mut engine = headless(&dir).with_initial_scene("Main").build();
        engine.init().unwrap();

        let world = engine.world();
        assert!(engine.is_initialized());
        assert_eq!(world.scene().name, "Main");
        assert_eq!(world.scene().lighting, json!({ "Ambient": 0.5 }));
        assert_eq!(world.len(), 3);
        let player = world.find_entity("Player").unwrap();
        assert_eq!(world.entity_name(world.children(player)[0]), "Hat");
    }

    #[test]
    fn ups_sets_the_fixed_step() {
        let dir = temp_dir("ups");
        let engine = headless(&dir).with_ups(30).build();
        assert!((engine.world().time().fixed_dt - 1.0 / 30.0).abs() < 1e-6);
    }

    #[test]
    fn zero_rate_config_falls_back_to_one_update_per_second() {
        let dir = temp_dir("zero-ups");
        let config = EngineConfig { updates_per_second: 0, ..EngineConfig::default() };
        let builder = Engine::builder()
            .headless()
            .with_config(config)
            .with_asset_root(dir.join("Assets"))
            .with_scene_root(&dir)
            .with_initial_scene("");
        assert_eq!(builder.config().updates_per_second, 1);
        let mut engine = builder.build();
        assert_eq!(engine.world().time().fixed_dt, 1.0);

        engine.init().unwrap();
        engine.frame(0.25);
        assert_eq!(engine.world().time().tick, 0);
    }

    // -- loop ---------------------------------------------------------------

    #[test]
    fn frames_run_fixed_ticks_then_update_then_draw() {
        let dir = temp_dir("frames");
        let (recorder, log) = Recorder::new();
        let mut engine = headless(&dir).with_ups(8).with_system(recorder).build();
        engine.init().unwrap();
        log.borrow_mut().clear();

        engine.frame(0.25);
        assert_eq!(*log.borrow(), vec!["fixed", "fixed", "update", "draw"]);
        assert_eq!(engine.world().time().tick, 2);

        log.borrow_mut().clear();
        engine.frame(0.125);
        assert_eq!(*log.borrow(), vec!["fixed", "update", "draw"]);
    }

    #[test]
    fn long_stalls_are_clamped() {
        let dir = temp_dir("stall");
        let mut engine = headless(&dir).with_ups(8).build();
        engine.init().unwrap();
        engine.frame(5.0);
        assert_eq!(engine.world().time().tick, 2);
    }

    #[test]
    fn non_finite_frame_time_counts_as_zero() {
        let dir = temp_dir("nan");
        let (recorder, log) = Recorder::new();
        let mut engine = headless(&dir).with_ups(8).with_system(recorder).build();
        engine.init().unwrap();
        log.borrow_mut().clear();

        engine.frame(f32::NAN);
        engine.frame(f32::INFINITY);
        engine.frame(-1.0);
        assert_eq!(engine.world().time().tick, 0);
        assert_eq!(*log.borrow(), vec!["update", "draw", "update", "draw", "update", "draw"]);

        engine.frame(0.125);
        assert_eq!(engine.world().time().tick, 1);
    }

    #[test]
    fn run_ticks_advances_the_clock() {
        let dir = temp_dir("ticks");
        let mut engine = headless(&dir).build();
        engine.init().unwrap();
        engine.run_ticks(3);
        let time = engine.world().time();
        assert_eq!(time.tick, 3);
        assert!((time.elapsed - 3.0 * time.fixed_dt as f64).abs() < 1e-9);
    }

    #[test]
    fn quit_stops_run_ticks() {
        let dir = temp_dir("quit");
        let mut engine = headless(&dir).build();
        engine.init().unwrap();
        engine.run_ticks(2);
        engine.world_mut().request_quit();
        engine.run_ticks(5);
        assert_eq!(engine.world().time().tick, 2);
    }

    #[test]
    fn spawns_made_during_a_tick_land_at_its_end() {
        let dir = temp_dir("spawns");
        let mut engine = headless(&dir).build();
        engine.init().unwrap();
        engine.world_mut().add_entity(Prefab::new("Spawner").with(Spawner::default()));

        engine.tick();
        let spawned = engine.world().find_entity("Spawned").unwrap();
        assert!(engine.world().entity(spawned).unwrap().is_initialized());
        assert_eq!(engine.world().registry(Transform::TAG).len(), 1);
    }

    // -- scenes -------------------------------------------------------------

    #[test]
    fn next_scene_swaps_the_world_at_the_sync_point() {
        let dir = temp_dir("switch");
        write_scene(&dir, "First", json!([
            { "Name": "Switcher", "Components": [{ "Type": "Spawner", "NextScene": "Second" }] }
        ]));
        write_scene(&dir, "Second", json!([{ "Name": "Fresh" }]));
        quarry::ecs::factory::register::<Spawner>();

        let (recorder, log) = Recorder::new();
        let mut engine = headless(&dir).with_initial_scene("First").with_system(recorder).build();
        engine.init().unwrap();
        assert_eq!(*log.borrow(), vec!["init", "scene First 1"]);
        log.borrow_mut().clear();

        engine.run_ticks(1);
        let world = engine.world();
        assert_eq!(world.scene().name, "Second");
        assert!(world.find_entity("Switcher").is_none());
        assert!(world.find_entity("Spawned").is_none());
        assert!(world.find_entity("Fresh").is_some());
        // The old scene still had its entities when told it was ending.
        assert_eq!(*log.borrow(), vec!["fixed", "scene exit 2", "scene Second 1", "update", "draw"]);
    }

    #[test]
    fn exit_tears_down_the_scene_before_the_systems() {
        let dir = temp_dir("exit");
        write_scene(&dir, "Main", json!([{ "Name": "A" }, { "Name": "B" }]));
        let (recorder, log) = Recorder::new();
        let mut engine = headless(&dir).with_initial_scene("Main").with_system(recorder).build();
        engine.init().unwrap();
        log.borrow_mut().clear();

        engine.exit();
        assert_eq!(*log.borrow(), vec!["scene exit 2", "exit 0"]);
        assert!(!engine.is_initialized());
    }

    #[test]
    fn saved_scene_loads_back() {
        let dir = temp_dir("save");
        let mut world = World::new();
        world.scene_mut().name = "Saved".into();
        world.add_entity(Prefab::new("Root").with(Transform::default()).with_child(Prefab::new("Leaf")));
        scene::save_scene(&world, &SceneFile::path(&dir, "Saved")).unwrap();

        let mut engine = headless(&dir).with_initial_scene("Saved").build();
        engine.init().unwrap();
        let loaded = engine.world();
        let root = loaded.find_entity("Root").unwrap();
        assert!(loaded.get::<Transform>(root).is_some());
        assert_eq!(loaded.entity_name(loaded.children(root)[0]), "Leaf");
    }
}
