use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::{read_name, write_name};
use crate::assets::{Asset, AssetLibraries};
use crate::warning;

/// Object-safe surface of an [`AssetReference`].
pub trait AssetReferenceBase {
    fn library(&self) -> &'static str;
    fn name(&self) -> &str;
    fn is_resolved(&self) -> bool;
    /// Looks the name up. A non-empty name that misses warns, naming
    /// `owner`.
    fn init(&mut self, assets: &AssetLibraries, owner: &str);
}

/// Handle to a named asset in its library.
pub struct AssetReference<T> {
    name: String,
    asset: Option<Rc<T>>,
}

impl<T: Asset> AssetReference<T> {
    pub fn new() -> Self {
        Self { name: String::new(), asset: None }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), asset: None }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self) -> Option<&T> {
        self.asset.as_deref()
    }

    pub fn shared(&self) -> Option<Rc<T>> {
        self.asset.clone()
    }

    /// # Panics
    ///
    /// If the reference is unresolved.
    pub fn expect(&self) -> &T {
        match self.get() {
            Some(asset) => asset,
            None => panic!("{} asset \"{}\" is not loaded", T::LIBRARY, self.name),
        }
    }

    /// Re-points the reference at `name` and resolves it immediately.
    pub fn set(&mut self, name: impl Into<String>, assets: &AssetLibraries, owner: &str) {
        self.name = name.into();
        self.asset = None;
        self.init(assets, owner);
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.asset = None;
    }

    /// Reads `{ "AssetName": name }` or a bare name string.
    pub fn read(&mut self, json: &Value) {
        read_name(&mut self.name, "AssetName", json);
        self.asset = None;
    }

    pub fn write(&self) -> Value {
        write_name("AssetName", &self.name)
    }
}

impl<T: Asset> AssetReferenceBase for AssetReference<T> {
    fn library(&self) -> &'static str { T::LIBRARY }
    fn name(&self) -> &str { &self.name }
    fn is_resolved(&self) -> bool { self.asset.is_some() }

    fn init(&mut self, assets: &AssetLibraries, owner: &str) {
        if self.name.is_empty() {
            self.asset = None;
            return;
        }
        self.asset = assets.get::<T>(&self.name);
        if self.asset.is_none() {
            warning!("{owner}: no {} asset named \"{}\"", T::LIBRARY, self.name);
        }
    }
}

impl<T: Asset> Default for AssetReference<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Clones share the resolved asset.
impl<T> Clone for AssetReference<T> {
    fn clone(&self) -> Self {
        Self { name: self.name.clone(), asset: self.asset.clone() }
    }
}

impl<T: Asset> fmt::Debug for AssetReference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetReference")
            .field("library", &T::LIBRARY)
            .field("name", &self.name)
            .field("resolved", &self.asset.is_some())
            .finish()
    }
}
