use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::{Inventory, ResourceCounter, Sprite, Transform};
use crate::ecs::{BEHAVIOR, Component, ComponentType, Context, EntityId, Prefab, Target, TypeTag};
use crate::reference::{AssetReference, ComponentReference, EntityReference, ReferenceMut};
use crate::serializable::{ReadMethodMap, Serializable};
use crate::stream;
use crate::values::ItemStack;
use crate::warning;

// The prefab resolves first so a connect-time sync can already spawn
// counters.
const COUNTER_PREFAB: usize = 0;
const INVENTORY_ENTITY: usize = 1;
const INVENTORY: usize = 2;

/// Keeps one [`ResourceCounter`] child per item id held by the inventory
/// of another entity, stacked vertically.
#[derive(Debug)]
pub struct ResourcesUiManager {
    inventory_entity: EntityReference,
    inventory: ComponentReference<Inventory>,
    counter_prefab: AssetReference<Prefab>,
    pub hide_when_empty: bool,
    pub padding: f32,
    pub spacing: f32,
    pub opacity: f32,

    counters: BTreeMap<i32, EntityId>,
    seen_revision: Option<u64>,
    connections: u32,
    disconnections: u32,
}

impl Default for ResourcesUiManager {
    fn default() -> Self {
        Self {
            inventory_entity: EntityReference::new(&[INVENTORY]),
            inventory: ComponentReference::external(),
            counter_prefab: AssetReference::new(),
            hide_when_empty: false,
            padding: 0.0,
            spacing: 1.0,
            opacity: 1.0,
            counters: BTreeMap::new(),
            seen_revision: None,
            connections: 0,
            disconnections: 0,
        }
    }
}

/// Clones keep the settings; counters are rebuilt from the clone's own
/// children when it joins a scene.
impl Clone for ResourcesUiManager {
    fn clone(&self) -> Self {
        Self {
            inventory_entity: self.inventory_entity.clone(),
            inventory: self.inventory.clone(),
            counter_prefab: self.counter_prefab.clone(),
            hide_when_empty: self.hide_when_empty,
            padding: self.padding,
            spacing: self.spacing,
            opacity: self.opacity,
            ..Self::default()
        }
    }
}

impl ResourcesUiManager {
    pub fn new(inventory_entity: &str, counter_prefab: &str) -> Self {
        Self {
            inventory_entity: EntityReference::new(&[INVENTORY]).named(inventory_entity),
            counter_prefab: AssetReference::named(counter_prefab),
            ..Self::default()
        }
    }

    pub fn inventory_entity(&self) -> &EntityReference {
        &self.inventory_entity
    }

    pub fn inventory(&self) -> &ComponentReference<Inventory> {
        &self.inventory
    }

    /// Watches the inventory on `entity` instead, or none. The old inventory
    /// disconnects before the new one connects.
    pub fn set_inventory_entity(&mut self, entity: Option<EntityId>, cx: &mut Context<'_>) {
        cx.assign_entity(self, INVENTORY_ENTITY, entity);
    }

    /// Counter entity per item id.
    pub fn counters(&self) -> &BTreeMap<i32, EntityId> {
        &self.counters
    }

    /// Times the inventory reference connected.
    pub fn connections(&self) -> u32 {
        self.connections
    }

    pub fn disconnections(&self) -> u32 {
        self.disconnections
    }

    fn collect_counters(&mut self, cx: &Context<'_>) {
        self.counters.clear();
        for &child in cx.children(cx.entity()) {
            if let Some(counter) = cx.get::<ResourceCounter>(child) {
                self.counters.insert(counter.item_id(), child);
            }
        }
    }

    /// Brings every counter in line with the inventory.
    fn sync(&mut self, cx: &mut Context<'_>) {
        let Some(inventory) = self.inventory.get(cx) else { return };
        let revision = inventory.revision();
        let items = inventory.items().to_vec();

        for &stack in &items {
            self.update_counter(stack, cx);
        }
        let emptied: Vec<(i32, EntityId)> = self
            .counters
            .iter()
            .filter(|(id, _)| !items.iter().any(|stack| stack.item_id == **id))
            .map(|(&id, &entity)| (id, entity))
            .collect();
        for (id, entity) in emptied {
            if let Some(counter) = cx.get_mut::<ResourceCounter>(entity) {
                counter.set_resources(ItemStack::new(id, 0));
            }
        }

        self.seen_revision = Some(revision);
        self.layout(cx);
    }

    fn update_counter(&mut self, stack: ItemStack, cx: &mut Context<'_>) {
        if let Some(&entity) = self.counters.get(&stack.item_id) {
            if let Some(counter) = cx.get_mut::<ResourceCounter>(entity) {
                counter.set_resources(stack);
            }
            return;
        }

        let Some(prefab) = self.counter_prefab.get() else {
            warning!("{}: no resource counter prefab to show item {}", cx.entity_name(), stack.item_id);
            return;
        };
        let mut prefab = prefab.clone();
        let Some(counter) = prefab.get_mut::<ResourceCounter>() else {
            warning!("resource counter prefab \"{}\" has no ResourceCounter", self.counter_prefab.name());
            return;
        };
        counter.set_resources(stack);
        counter.set_opacity(self.opacity);

        let parent = cx.entity();
        if let Some(entity) = cx.add_child(parent, prefab) {
            self.counters.insert(stack.item_id, entity);
        }
    }

    /// Stacks counters top to bottom and hides the backing sprite when
    /// there is nothing to show.
    fn layout(&self, cx: &mut Context<'_>) {
        for (row, &entity) in self.counters.values().enumerate() {
            if let Some(transform) = cx.get_mut::<Transform>(entity) {
                transform.translation.y = -(self.padding + row as f32 * self.spacing);
            }
        }
        let opacity = if self.hide_when_empty && self.counters.is_empty() { 0.0 } else { self.opacity };
        let entity = cx.entity();
        if let Some(sprite) = cx.get_mut::<Sprite>(entity) {
            sprite.opacity = opacity;
        }
    }

    fn read_inventory_entity(&mut self, json: &Value) { self.inventory_entity.read(json); }
    fn read_counter_prefab(&mut self, json: &Value) { self.counter_prefab.read(json); }
    fn read_hide_when_empty(&mut self, json: &Value) { stream::read(&mut self.hide_when_empty, json); }
    fn read_padding(&mut self, json: &Value) { stream::read(&mut self.padding, json); }
    fn read_spacing(&mut self, json: &Value) { stream::read(&mut self.spacing, json); }
    fn read_opacity(&mut self, json: &Value) { stream::read(&mut self.opacity, json); }

    const READ_METHODS: &'static ReadMethodMap<Self> = &[
        ("InventoryEntity", Self::read_inventory_entity),
        ("ResourceCounterPrefab", Self::read_counter_prefab),
        ("HideWhenEmpty", Self::read_hide_when_empty),
        ("Padding", Self::read_padding),
        ("Spacing", Self::read_spacing),
        ("Opacity", Self::read_opacity),
    ];
}

impl Serializable for ResourcesUiManager {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn after_load(&mut self) {
        if !(0.0..=1.0).contains(&self.opacity) {
            warning!("resources ui: opacity {} clamped into [0, 1]", self.opacity);
            self.opacity = self.opacity.clamp(0.0, 1.0);
        }
    }

    fn write(&self) -> Value {
        let mut json = Map::new();
        json.insert("InventoryEntity".into(), self.inventory_entity.write());
        json.insert("ResourceCounterPrefab".into(), self.counter_prefab.write());
        json.insert("HideWhenEmpty".into(), stream::write(&self.hide_when_empty));
        json.insert("Padding".into(), stream::write(&self.padding));
        json.insert("Spacing".into(), stream::write(&self.spacing));
        json.insert("Opacity".into(), stream::write(&self.opacity));
        Value::Object(json)
    }
}

impl Component for ResourcesUiManager {
    fn on_init(&mut self, cx: &mut Context<'_>) {
        self.collect_counters(cx);
        self.seen_revision = None;
    }

    fn on_update(&mut self, cx: &mut Context<'_>, _dt: f32) {
        let revision = self.inventory.get(cx).map(Inventory::revision);
        if revision.is_some() && revision != self.seen_revision {
            self.sync(cx);
        }
    }

    fn on_remove_child(&mut self, child: EntityId, _cx: &mut Context<'_>) {
        self.counters.retain(|_, entity| *entity != child);
    }

    fn reference_mut(&mut self, slot: usize) -> Option<ReferenceMut<'_>> {
        match slot {
            INVENTORY_ENTITY => Some(ReferenceMut::Entity(&mut self.inventory_entity)),
            INVENTORY => Some(ReferenceMut::Component(&mut self.inventory)),
            COUNTER_PREFAB => Some(ReferenceMut::Asset(&mut self.counter_prefab)),
            _ => None,
        }
    }

    fn on_connect(&mut self, slot: usize, _target: Target, cx: &mut Context<'_>) {
        if slot == INVENTORY {
            self.connections += 1;
            self.sync(cx);
        }
    }

    fn on_disconnect(&mut self, slot: usize, _target: Target, _cx: &mut Context<'_>) {
        if slot == INVENTORY {
            self.disconnections += 1;
            self.seen_revision = None;
        }
    }
}

impl ComponentType for ResourcesUiManager {
    const TAG: TypeTag = TypeTag::new("ResourcesUiManager");
    const BASES: &'static [TypeTag] = &[BEHAVIOR];
}
