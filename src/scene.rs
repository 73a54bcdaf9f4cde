//! Scene files and the Scene system.
//!
//! A scene file `<scene_root>/<Name>.scene.json` holds a header and the
//! root entity trees:
//!
//! ```json
//! { "Name": "Main", "Lighting": {...}, "Transition": {...}, "Entities": [ ... ] }
//! ```

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::ecs::{Prefab, SceneInfo, World};
use crate::engine::{EngineError, System};
use crate::serializable::{ReadMethodMap, Serializable};
use crate::stream::{self, StreamError};

#[derive(Debug, Clone, Default)]
pub struct SceneFile {
    pub name: String,
    pub lighting: Value,
    pub transition: Value,
    pub entities: Vec<Prefab>,
}

impl SceneFile {
    /// Snapshot of every root entity tree in `world`.
    pub fn from_world(world: &World) -> Self {
        let scene = world.scene();
        Self {
            name: scene.name.clone(),
            lighting: scene.lighting.clone(),
            transition: scene.transition.clone(),
            entities: world.roots().filter_map(|id| world.clone_entity(id)).collect(),
        }
    }

    pub fn path(root: &Path, name: &str) -> PathBuf {
        root.join(format!("{name}.scene.json"))
    }

    fn read_name(&mut self, json: &Value) { stream::read(&mut self.name, json); }
    fn read_lighting(&mut self, json: &Value) { self.lighting = json.clone(); }
    fn read_transition(&mut self, json: &Value) { self.transition = json.clone(); }
    fn read_entities(&mut self, json: &Value) { stream::read_objects(&mut self.entities, json); }

    const READ_METHODS: &'static ReadMethodMap<Self> = &[
        ("Name", Self::read_name),
        ("Lighting", Self::read_lighting),
        ("Transition", Self::read_transition),
        ("Entities", Self::read_entities),
    ];
}

impl Serializable for SceneFile {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn write(&self) -> Value {
        let mut json = Map::new();
        json.insert("Name".into(), stream::write(&self.name));
        json.insert("Lighting".into(), self.lighting.clone());
        json.insert("Transition".into(), self.transition.clone());
        json.insert("Entities".into(), stream::write_objects(&self.entities));
        Value::Object(json)
    }
}

/// Writes the live world to `path` in scene-file form.
pub fn save_scene(world: &World, path: &Path) -> Result<(), StreamError> {
    stream::write_file(path, &SceneFile::from_world(world).write())
}

/// Adds a parsed scene to an empty world. Returns the root entity count.
pub fn load_scene(world: &mut World, scene: SceneFile) -> usize {
    *world.scene_mut() = SceneInfo {
        name: scene.name,
        lighting: scene.lighting,
        transition: scene.transition,
    };
    world.add_entities(scene.entities).len()
}

// ── SceneSystem ─────────────────────────────────────────────────────────────

/// Loads `<root>/<Name>.scene.json` whenever a scene starts.
pub struct SceneSystem {
    root: PathBuf,
}

impl SceneSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl System for SceneSystem {
    fn name(&self) -> &'static str {
        "Scene"
    }

    fn on_scene_init(&mut self, world: &mut World, scene: &str) -> Result<(), EngineError> {
        let path = SceneFile::path(&self.root, scene);
        if !path.is_file() {
            return Err(EngineError::MissingScene { name: scene.to_string(), path });
        }
        let mut file = SceneFile::default();
        stream::read_file(&mut file, &path)?;
        if file.name.is_empty() {
            file.name = scene.to_string();
        }
        let roots = load_scene(world, file);
        log::info!("loaded scene \"{scene}\" with {roots} root entities");
        Ok(())
    }

    fn on_scene_exit(&mut self, world: &mut World) {
        log::debug!("leaving scene \"{}\" ({} entities)", world.scene().name, world.len());
    }
}
