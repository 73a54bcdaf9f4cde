use rand::Rng;
use serde_json::{Map, Value};

use super::ItemStack;
use crate::assets::Asset;
use crate::serializable::{ReadMethodMap, Serializable};
use crate::stream;
use crate::warning;

// ── LootEntry ───────────────────────────────────────────────────────────────

/// One row of a [`LootTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct LootEntry {
    /// Candidate items; one is picked uniformly per roll.
    pub item_ids: Vec<i32>,
    pub min_count: i32,
    pub max_count: i32,
    /// Chance in `[0, 1]` that a roll of this entry yields anything.
    pub probability: f32,
    /// Relative pick weight when the table rolls randomly.
    pub weight: f32,
    pub allow_multiple_rolls: bool,
}

impl Default for LootEntry {
    fn default() -> Self {
        Self {
            item_ids: Vec::new(),
            min_count: 1,
            max_count: 1,
            probability: 1.0,
            weight: 1.0,
            allow_multiple_rolls: true,
        }
    }
}

impl LootEntry {
    /// Rolls this entry once. Returns `None` when the probability check
    /// fails or there is nothing to drop.
    pub fn roll(&self, rng: &mut impl Rng) -> Option<ItemStack> {
        if self.item_ids.is_empty() || rng.r#gen::<f32>() >= self.probability {
            return None;
        }
        let item_id = self.item_ids[rng.gen_range(0..self.item_ids.len())];
        let count = rng.gen_range(self.min_count..=self.max_count.max(self.min_count));
        Some(ItemStack::new(item_id, count))
    }

    fn read_item_ids(&mut self, json: &Value) { stream::read_array(&mut self.item_ids, json); }
    fn read_min_count(&mut self, json: &Value) { stream::read(&mut self.min_count, json); }
    fn read_max_count(&mut self, json: &Value) { stream::read(&mut self.max_count, json); }
    fn read_probability(&mut self, json: &Value) { stream::read(&mut self.probability, json); }
    fn read_weight(&mut self, json: &Value) { stream::read(&mut self.weight, json); }
    fn read_allow_multiple_rolls(&mut self, json: &Value) { stream::read(&mut self.allow_multiple_rolls, json); }

    const READ_METHODS: &'static ReadMethodMap<Self> = &[
        ("ItemIds", Self::read_item_ids),
        ("MinCount", Self::read_min_count),
        ("MaxCount", Self::read_max_count),
        ("Probability", Self::read_probability),
        ("Weight", Self::read_weight),
        ("AllowMultipleRolls", Self::read_allow_multiple_rolls),
    ];
}

impl Serializable for LootEntry {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn after_load(&mut self) {
        if self.min_count < 0 {
            warning!("loot entry: MinCount {} clamped to 0", self.min_count);
            self.min_count = 0;
        }
        if self.max_count < self.min_count {
            warning!("loot entry: MaxCount {} raised to MinCount {}", self.max_count, self.min_count);
            self.max_count = self.min_count;
        }
        if !(0.0..=1.0).contains(&self.probability) {
            warning!("loot entry: Probability {} clamped into [0, 1]", self.probability);
            self.probability = self.probability.clamp(0.0, 1.0);
        }
        if self.weight < 0.0 {
            warning!("loot entry: Weight {} clamped to 0", self.weight);
            self.weight = 0.0;
        }
    }

    fn write(&self) -> Value {
        let mut json = Map::new();
        json.insert("ItemIds".into(), stream::write_array(&self.item_ids));
        json.insert("MinCount".into(), stream::write(&self.min_count));
        json.insert("MaxCount".into(), stream::write(&self.max_count));
        json.insert("Probability".into(), stream::write(&self.probability));
        json.insert("Weight".into(), stream::write(&self.weight));
        json.insert("AllowMultipleRolls".into(), stream::write(&self.allow_multiple_rolls));
        Value::Object(json)
    }
}

// ── LootTable ───────────────────────────────────────────────────────────────

/// Configurable item drops.
///
/// With random rolls disabled every entry is rolled once. With random rolls
/// enabled the table makes between `min_rolls` and `max_rolls` weighted
/// picks; an entry that disallows multiple rolls leaves the pool after its
/// first pick.
#[derive(Debug, Clone, PartialEq)]
pub struct LootTable {
    pub entries: Vec<LootEntry>,
    pub random_rolls_enabled: bool,
    pub min_rolls: i32,
    pub max_rolls: i32,
}

impl Default for LootTable {
    fn default() -> Self {
        Self { entries: Vec::new(), random_rolls_enabled: false, min_rolls: 1, max_rolls: 1 }
    }
}

impl LootTable {
    /// Rolls the table. Stacks of the same item are merged and empty drops
    /// are left out.
    pub fn generate(&self, rng: &mut impl Rng) -> Vec<ItemStack> {
        let mut loot = Vec::new();
        if self.random_rolls_enabled {
            self.roll_weighted(rng, &mut loot);
        } else {
            for entry in &self.entries {
                if let Some(stack) = entry.roll(rng) {
                    add_loot(&mut loot, stack);
                }
            }
        }
        loot
    }

    fn roll_weighted(&self, rng: &mut impl Rng, loot: &mut Vec<ItemStack>) {
        let mut banned = vec![false; self.entries.len()];
        let mut total_weight: f32 = self.entries.iter().map(|e| e.weight).sum();
        let rolls = rng.gen_range(self.min_rolls..=self.max_rolls.max(self.min_rolls));

        for _ in 0..rolls {
            if total_weight <= 0.0 {
                break;
            }
            let mut target = rng.gen_range(0.0..total_weight);
            let picked = self.entries.iter().enumerate().position(|(i, entry)| {
                if banned[i] {
                    return false;
                }
                target -= entry.weight;
                target < 0.0
            });
            // Float drift can leave a sliver past the last entry.
            let Some(index) = picked.or_else(|| banned.iter().rposition(|b| !b)) else { break };

            let entry = &self.entries[index];
            if let Some(stack) = entry.roll(rng) {
                add_loot(loot, stack);
            }
            if !entry.allow_multiple_rolls {
                banned[index] = true;
                total_weight -= entry.weight;
            }
        }
    }

    fn read_entries(&mut self, json: &Value) { stream::read_objects(&mut self.entries, json); }
    fn read_random_rolls_enabled(&mut self, json: &Value) { stream::read(&mut self.random_rolls_enabled, json); }
    fn read_min_rolls(&mut self, json: &Value) { stream::read(&mut self.min_rolls, json); }
    fn read_max_rolls(&mut self, json: &Value) { stream::read(&mut self.max_rolls, json); }

    const READ_METHODS: &'static ReadMethodMap<Self> = &[
        ("Entries", Self::read_entries),
        ("RandomRollsEnabled", Self::read_random_rolls_enabled),
        ("MinRolls", Self::read_min_rolls),
        ("MaxRolls", Self::read_max_rolls),
    ];
}

fn add_loot(loot: &mut Vec<ItemStack>, stack: ItemStack) {
    if stack.count == 0 {
        return;
    }
    match loot.iter_mut().find(|s| s.item_id == stack.item_id) {
        Some(existing) => existing.count += stack.count,
        None => loot.push(stack),
    }
}

impl Serializable for LootTable {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn after_load(&mut self) {
        if self.min_rolls < 0 {
            warning!("loot table: MinRolls {} clamped to 0", self.min_rolls);
            self.min_rolls = 0;
        }
        if self.max_rolls < self.min_rolls {
            warning!("loot table: MaxRolls {} raised to MinRolls {}", self.max_rolls, self.min_rolls);
            self.max_rolls = self.min_rolls;
        }
    }

    fn write(&self) -> Value {
        let mut json = Map::new();
        json.insert("Entries".into(), stream::write_objects(&self.entries));
        json.insert("RandomRollsEnabled".into(), stream::write(&self.random_rolls_enabled));
        json.insert("MinRolls".into(), stream::write(&self.min_rolls));
        json.insert("MaxRolls".into(), stream::write(&self.max_rolls));
        Value::Object(json)
    }
}

impl Asset for LootTable {
    const LIBRARY: &'static str = "LootTables";
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn entry(item: i32, count: i32) -> LootEntry {
        LootEntry { item_ids: vec![item], min_count: count, max_count: count, ..LootEntry::default() }
    }

    #[test]
    fn fixed_rolls_use_every_entry_and_merge() {
        let table = LootTable {
            entries: vec![entry(3, 2), entry(5, 1), entry(3, 4)],
            ..LootTable::default()
        };
        let loot = table.generate(&mut StdRng::seed_from_u64(7));
        assert_eq!(loot, vec![ItemStack::new(3, 6), ItemStack::new(5, 1)]);
    }

    #[test]
    fn zero_probability_never_drops() {
        let table = LootTable {
            entries: vec![LootEntry { probability: 0.0, ..entry(1, 1) }],
            ..LootTable::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            assert!(table.generate(&mut rng).is_empty());
        }
    }

    #[test]
    fn single_roll_entries_leave_the_pool() {
        let table = LootTable {
            entries: vec![
                LootEntry { allow_multiple_rolls: false, ..entry(1, 1) },
                LootEntry { allow_multiple_rolls: false, ..entry(2, 1) },
            ],
            random_rolls_enabled: true,
            min_rolls: 5,
            max_rolls: 5,
        };
        let loot = table.generate(&mut StdRng::seed_from_u64(42));
        assert_eq!(loot.iter().map(|s| s.count).sum::<i32>(), 2);
        assert_eq!(loot.len(), 2);
    }

    #[test]
    fn zero_counts_are_skipped() {
        let table = LootTable { entries: vec![entry(9, 0)], ..LootTable::default() };
        assert!(table.generate(&mut StdRng::seed_from_u64(3)).is_empty());
    }

    #[test]
    fn read_orders_min_and_max() {
        let mut table = LootTable::default();
        stream::read_object(
            &mut table,
            &serde_json::json!({
                "Entries": [{ "ItemIds": [1], "MinCount": 4, "MaxCount": 2, "Probability": 1.5 }],
                "MinRolls": 3,
                "MaxRolls": 1
            }),
        );
        assert_eq!(table.max_rolls, 3);
        assert_eq!(table.entries[0].max_count, 4);
        assert_eq!(table.entries[0].probability, 1.0);
    }
}
