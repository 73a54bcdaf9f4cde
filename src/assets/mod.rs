//! Named, immutable-after-load asset stores.
//!
//! Each asset type has one [`AssetLibrary`], reachable through the
//! [`AssetLibraries`] table. Libraries fill up at boot, either by scanning a
//! directory tree (one JSON file per asset) or from a manifest object, and
//! are never evicted.

mod animation;
mod sound;
mod texture;

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::{Map, Value};
use walkdir::WalkDir;

use crate::serializable::Serializable;
use crate::stream::{self, Location, StreamError, kind_name};
use crate::warning;

pub use animation::AnimationAsset;
pub use sound::Sound;
pub use texture::Texture;

/// A type stored in an [`AssetLibrary`].
pub trait Asset: Serializable + Default + 'static {
    /// Directory under the asset root, and key in a combined manifest.
    const LIBRARY: &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("could not scan {path}: {source}")]
    Walk { path: PathBuf, #[source] source: walkdir::Error },

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("{library} manifest must be an object, found {found}")]
    Manifest { library: &'static str, found: &'static str },
}

// ── AssetLibrary ────────────────────────────────────────────────────────────

/// Every loaded asset of one type, by name.
#[derive(Debug)]
pub struct AssetLibrary<T> {
    assets: BTreeMap<String, Rc<T>>,
}

impl<T: Asset> AssetLibrary<T> {
    pub fn new() -> Self {
        Self { assets: BTreeMap::new() }
    }

    /// Shared handle to the asset called `name`.
    pub fn get(&self, name: &str) -> Option<Rc<T>> {
        self.assets.get(name).cloned()
    }

    pub fn assets(&self) -> &BTreeMap<String, Rc<T>> {
        &self.assets
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize { self.assets.len() }
    pub fn is_empty(&self) -> bool { self.assets.is_empty() }

    /// Name under which `asset` is stored, found by identity.
    pub fn name_of(&self, asset: &T) -> Option<&str> {
        self.assets
            .iter()
            .find(|(_, stored)| std::ptr::eq(stored.as_ref(), asset))
            .map(|(name, _)| name.as_str())
    }

    /// Adds an asset. A name that is already taken keeps its first asset.
    pub fn insert(&mut self, name: impl Into<String>, asset: T) -> bool {
        let name = name.into();
        if self.assets.contains_key(&name) {
            warning!("{}: duplicate asset \"{name}\" ignored", T::LIBRARY);
            return false;
        }
        self.assets.insert(name, Rc::new(asset));
        true
    }

    /// Loads every `name: asset` pair of a manifest object.
    pub fn load_manifest(&mut self, json: &Value) -> Result<usize, AssetError> {
        let Some(entries) = json.as_object() else {
            return Err(AssetError::Manifest { library: T::LIBRARY, found: kind_name(json) });
        };
        let _at = Location::key(T::LIBRARY);
        let mut loaded = 0;
        for (name, data) in entries {
            let _entry = Location::key(name);
            let mut asset = T::default();
            stream::read_object(&mut asset, data);
            if self.insert(name.clone(), asset) {
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Loads every `*.json` file under `dir`. The asset name is the path
    /// relative to `dir` with the `.json` suffix removed, so
    /// `Textures/ui/ghost.png.json` becomes `ui/ghost.png`.
    ///
    /// A missing directory is an empty library. Unreadable or malformed
    /// files abort the load.
    pub fn load_directory(&mut self, dir: &Path) -> Result<usize, AssetError> {
        if !dir.is_dir() {
            log::info!("{}: no asset directory at {}", T::LIBRARY, dir.display());
            return Ok(0);
        }

        let mut loaded = 0;
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|source| AssetError::Walk { path: dir.to_path_buf(), source })?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = asset_name(dir, path) else { continue };

            let json = stream::parse_file(path)?;
            let _file = Location::file(path);
            let mut asset = T::default();
            stream::read_object(&mut asset, &json);
            if self.insert(name, asset) {
                loaded += 1;
            }
        }
        log::debug!("{}: loaded {loaded} assets from {}", T::LIBRARY, dir.display());
        Ok(loaded)
    }

    /// Writes the library as a manifest object.
    pub fn save(&self) -> Value {
        let mut json = Map::new();
        for (name, asset) in &self.assets {
            json.insert(name.clone(), asset.write());
        }
        Value::Object(json)
    }
}

impl<T: Asset> Default for AssetLibrary<T> {
    fn default() -> Self { Self::new() }
}

fn asset_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let relative = relative.to_str()?.replace('\\', "/");
    relative.strip_suffix(".json").map(str::to_string)
}

// ── AssetLibraries ──────────────────────────────────────────────────────────

type DirectoryLoader = fn(&mut AssetLibraries, &Path) -> Result<usize, AssetError>;
type ManifestLoader = fn(&mut AssetLibraries, &Value) -> Result<usize, AssetError>;

struct Loader {
    library: &'static str,
    directory: DirectoryLoader,
    manifest: ManifestLoader,
}

/// One library per registered asset type.
#[derive(Default)]
pub struct AssetLibraries {
    libraries: HashMap<TypeId, Box<dyn Any>>,
    loaders: Vec<Loader>,
}

impl AssetLibraries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with every asset type the engine ships with.
    pub fn with_builtin_types() -> Self {
        let mut libraries = Self::new();
        libraries.register::<crate::ecs::Prefab>();
        libraries.register::<Texture>();
        libraries.register::<Sound>();
        libraries.register::<AnimationAsset>();
        libraries.register::<crate::values::LootTable>();
        libraries
    }

    /// Makes `T` discoverable by [`load_all`](Self::load_all) and
    /// [`load_manifest`](Self::load_manifest).
    pub fn register<T: Asset>(&mut self) {
        if self.loaders.iter().any(|l| l.library == T::LIBRARY) {
            return;
        }
        self.library_mut::<T>();
        self.loaders.push(Loader {
            library: T::LIBRARY,
            directory: |libraries, dir| libraries.library_mut::<T>().load_directory(dir),
            manifest: |libraries, json| libraries.library_mut::<T>().load_manifest(json),
        });
    }

    pub fn library<T: Asset>(&self) -> Option<&AssetLibrary<T>> {
        self.libraries
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref::<AssetLibrary<T>>())
    }

    pub fn library_mut<T: Asset>(&mut self) -> &mut AssetLibrary<T> {
        self.libraries
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(AssetLibrary::<T>::new()))
            .downcast_mut::<AssetLibrary<T>>()
            .expect("type mismatch in asset library table")
    }

    pub fn get<T: Asset>(&self, name: &str) -> Option<Rc<T>> {
        self.library::<T>()?.get(name)
    }

    pub fn library_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.loaders.iter().map(|l| l.library)
    }

    /// Loads every registered library from `root/<LIBRARY>`.
    pub fn load_all(&mut self, root: &Path) -> Result<usize, AssetError> {
        let loaders: Vec<(&'static str, DirectoryLoader)> =
            self.loaders.iter().map(|l| (l.library, l.directory)).collect();
        let mut total = 0;
        for (library, load) in loaders {
            total += load(self, &root.join(library))?;
        }
        log::info!("loaded {total} assets from {}", root.display());
        Ok(total)
    }

    /// Loads a combined manifest `{ "<LIBRARY>": { name: asset, ... }, ... }`.
    /// Sections for unregistered libraries are warned about and skipped.
    pub fn load_manifest(&mut self, json: &Value) -> Result<usize, AssetError> {
        let Some(sections) = json.as_object() else {
            return Err(AssetError::Manifest { library: "Assets", found: kind_name(json) });
        };
        let mut total = 0;
        for (library, section) in sections {
            let loader = self.loaders.iter().find(|l| l.library == library.as_str()).map(|l| l.manifest);
            match loader {
                Some(load) => total += load(self, section)?,
                None => warning!("unknown asset library \"{library}\" in manifest"),
            }
        }
        Ok(total)
    }
}

impl std::fmt::Debug for AssetLibraries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetLibraries")
            .field("libraries", &self.loaders.iter().map(|l| l.library).collect::<Vec<_>>())
            .finish()
    }
}
