use serde_json::{Map, Value};

use super::{Component, ComponentType, TypeTag, factory};
use crate::assets::Asset;
use crate::serializable::{ReadMethodMap, Serializable};
use crate::stream::{self, Location, location};
use crate::warning;

/// A detached entity tree: the archetype asset, the payload of a spawn and
/// the result of cloning a live entity.
///
/// Cloning a prefab clones every component; references inside the copies
/// come back unbound and resolve against the new entity once it joins a
/// world.
#[derive(Clone, Default)]
pub struct Prefab {
    pub name: String,
    components: Vec<Box<dyn Component>>,
    pub children: Vec<Prefab>,
}

impl Prefab {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), components: Vec::new(), children: Vec::new() }
    }

    pub fn with<T: Component>(mut self, component: T) -> Self {
        self.add_component(Box::new(component));
        self
    }

    pub fn with_child(mut self, child: Prefab) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a component. A second component of the same concrete type is
    /// rejected with a warning.
    pub fn add_component(&mut self, component: Box<dyn Component>) -> bool {
        let tag = component.type_tag();
        if self.components.iter().any(|c| c.type_tag() == tag) {
            warning!("prefab \"{}\" already has a {tag} component", self.name);
            return false;
        }
        self.components.push(component);
        true
    }

    pub fn remove_component(&mut self, tag: TypeTag) -> Option<Box<dyn Component>> {
        let position = self.components.iter().position(|c| c.type_tag() == tag)?;
        Some(self.components.remove(position))
    }

    pub fn components(&self) -> &[Box<dyn Component>] {
        &self.components
    }

    pub fn get<T: ComponentType>(&self) -> Option<&T> {
        self.components.iter().find_map(|c| c.downcast_ref::<T>())
    }

    pub fn get_mut<T: ComponentType>(&mut self) -> Option<&mut T> {
        self.components.iter_mut().find_map(|c| c.downcast_mut::<T>())
    }

    pub(crate) fn into_parts(self) -> (String, Vec<Box<dyn Component>>, Vec<Prefab>) {
        (self.name, self.components, self.children)
    }

    /// Number of entities in this tree, itself included.
    pub fn entity_count(&self) -> usize {
        1 + self.children.iter().map(Prefab::entity_count).sum::<usize>()
    }

    // -- Reading ------------------------------------------------------------

    fn read_name(&mut self, json: &Value) { stream::read(&mut self.name, json); }

    fn read_components(&mut self, json: &Value) {
        let Some(items) = json.as_array() else {
            warning!("JSON error: expected array, found {} at {}", stream::kind_name(json), location());
            return;
        };
        for (i, item) in items.iter().enumerate() {
            let _at = Location::index(i);
            let Some(type_name) = item.get("Type").and_then(Value::as_str) else {
                warning!("JSON error: component without a \"Type\" at {}", location());
                continue;
            };
            let Some(mut component) = factory::create(type_name) else {
                warning!("JSON error: unknown component type \"{type_name}\" at {}", location());
                continue;
            };
            component.read_json(item);
            self.add_component(component);
        }
    }

    fn read_children(&mut self, json: &Value) { stream::read_objects(&mut self.children, json); }

    const READ_METHODS: &'static ReadMethodMap<Self> = &[
        ("Name", Self::read_name),
        ("Components", Self::read_components),
        ("Children", Self::read_children),
    ];
}

/// Serialized form of one component: `Type` first, then its fields.
pub(crate) fn write_component(component: &dyn Component) -> Value {
    let mut json = Map::new();
    json.insert("Type".into(), Value::from(component.type_tag().name()));
    if let Value::Object(fields) = component.write_json() {
        json.extend(fields);
    }
    Value::Object(json)
}

impl Serializable for Prefab {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn write(&self) -> Value {
        let mut json = Map::new();
        json.insert("Name".into(), stream::write(&self.name));
        json.insert(
            "Components".into(),
            Value::Array(self.components.iter().map(|c| write_component(c.as_ref())).collect()),
        );
        json.insert("Children".into(), stream::write_objects(&self.children));
        Value::Object(json)
    }
}

impl Asset for Prefab {
    const LIBRARY: &'static str = "Archetypes";
}

impl std::fmt::Debug for Prefab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prefab")
            .field("name", &self.name)
            .field("components", &self.components)
            .field("children", &self.children)
            .finish()
    }
}
