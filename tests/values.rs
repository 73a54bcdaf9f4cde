use glam::Vec2;
use quarry::collision::{self, CollisionSystem};
use quarry::components::{CircleCollider, Inventory, Sprite, Transform};
use quarry::ecs::*;
use quarry::serializable::{ReadMethodMap, Serializable};
use quarry::values::{CollisionLayerFlags, ItemStack, LootTable};
use quarry::{diag, stream};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};

fn prefab_from(json: &Value) -> Prefab {
    let mut prefab = Prefab::default();
    stream::read_object(&mut prefab, json);
    prefab
}

fn collider_at(name: &str, x: f32, collider: CircleCollider) -> Prefab {
    Prefab::new(name).with(Transform::from_translation(Vec2::new(x, 0.0))).with(collider)
}

/// Counts the contacts reported to its entity.
#[derive(Debug, Clone, Default)]
struct Bumper {
    hits: Vec<ComponentKey>,
}

impl Serializable for Bumper {
    fn read_methods() -> &'static ReadMethodMap<Self> { &[] }

    fn write(&self) -> Value {
        json!({})
    }
}

impl Component for Bumper {
    fn on_collision(&mut self, other: ComponentKey, _cx: &mut Context<'_>) {
        self.hits.push(other);
    }
}

impl ComponentType for Bumper {
    const TAG: TypeTag = TypeTag::new("Bumper");
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- prefab serialization ---------------------------------------------------

    #[test]
    fn prefab_survives_write_and_read() {
        diag::drain();
        let source = json!({
            "Name": "Crate",
            "Components": [
                { "Type": "Transform", "Translation": [2.0, 3.0], "Scale": [2.0, 2.0] },
                { "Type": "CircleCollider", "Radius": 0.5, "CollisionLayer": 3, "CollisionLayerFlags": { "Flags": 9 } },
                { "Type": "Sprite", "Texture": "crate.png", "Layer": 1 },
                { "Type": "Inventory", "Items": [{ "ItemId": 4, "Count": 2 }] }
            ],
            "Children": [{ "Name": "Lid", "Components": [{ "Type": "Transform" }] }]
        });

        let first = prefab_from(&source);
        assert_eq!(first.components().len(), 4);
        assert_eq!(first.entity_count(), 2);
        let collider = first.get::<CircleCollider>().unwrap();
        assert_eq!(collider.collision_layer, 3);
        assert!(collider.collision_layer_flags.includes(0));
        assert!(collider.collision_layer_flags.includes(3));
        assert!(!collider.collision_layer_flags.includes(1));

        let written = first.write();
        let second = prefab_from(&written);
        assert_eq!(second.write(), written);
        assert_eq!(second.get::<Transform>(), first.get::<Transform>());
        assert_eq!(second.get::<Inventory>().unwrap().items(), &[ItemStack::new(4, 2)]);
        assert!(diag::drain().is_empty());
    }

    #[test]
    fn unknown_component_type_is_skipped_with_a_warning() {
        diag::drain();
        let prefab = prefab_from(&json!({
            "Name": "Odd",
            "Components": [{ "Type": "Teleporter" }, { "Type": "Transform" }]
        }));
        assert_eq!(prefab.components().len(), 1);
        let warnings = diag::drain();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Teleporter"));
        assert!(warnings[0].contains("Components[0]"));
    }

    #[test]
    fn instances_keep_their_own_state() {
        let prefab = Prefab::new("Box").with(Sprite::new("box.png", 0));
        let mut world = World::new();
        let a = world.add_entity(prefab.clone());
        let b = world.add_entity(prefab);
        world.get_mut::<Sprite>(a).unwrap().opacity = 0.25;
        assert_eq!(world.get::<Sprite>(b).unwrap().opacity, 1.0);
    }

    // -- loot tables ------------------------------------------------------------

    #[test]
    fn loot_table_reads_and_clamps() {
        diag::drain();
        let mut table = LootTable::default();
        stream::read_object(
            &mut table,
            &json!({
                "Entries": [{ "ItemIds": [1], "MinCount": 3, "MaxCount": 1, "Probability": 2.0 }],
                "MinRolls": 2,
                "MaxRolls": 0
            }),
        );
        let entry = &table.entries[0];
        assert_eq!((entry.min_count, entry.max_count), (3, 3));
        assert_eq!(entry.probability, 1.0);
        assert_eq!((table.min_rolls, table.max_rolls), (2, 2));
        assert_eq!(diag::drain().len(), 3);
    }

    #[test]
    fn weighted_rolls_respect_single_roll_entries() {
        let mut table = LootTable::default();
        stream::read_object(
            &mut table,
            &json!({
                "RandomRollsEnabled": true,
                "MinRolls": 5,
                "MaxRolls": 5,
                "Entries": [
                    { "ItemIds": [10], "AllowMultipleRolls": false },
                    { "ItemIds": [20], "AllowMultipleRolls": false, "Weight": 3.0 }
                ]
            }),
        );

        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut loot = table.generate(&mut rng);
            loot.sort_by_key(|stack| stack.item_id);
            assert_eq!(loot, vec![ItemStack::new(10, 1), ItemStack::new(20, 1)]);
        }
    }

    #[test]
    fn same_seed_same_loot() {
        let mut table = LootTable::default();
        stream::read_object(
            &mut table,
            &json!({
                "RandomRollsEnabled": true,
                "MinRolls": 1,
                "MaxRolls": 4,
                "Entries": [
                    { "ItemIds": [1, 2, 3], "MinCount": 1, "MaxCount": 5 },
                    { "ItemIds": [4], "Probability": 0.5 }
                ]
            }),
        );
        let first = table.generate(&mut StdRng::seed_from_u64(7));
        let second = table.generate(&mut StdRng::seed_from_u64(7));
        assert_eq!(first, second);
    }

    // -- collision --------------------------------------------------------------

    #[test]
    fn overlapping_circles_on_shared_layers_touch() {
        let mut world = World::new();
        let ids = world.add_entities(vec![
            collider_at("A", 0.0, CircleCollider::new(1.0).on_layer(0, CollisionLayerFlags::NONE.with(0))),
            collider_at("B", 1.5, CircleCollider::new(1.0)),
            collider_at("Far", 10.0, CircleCollider::new(1.0)),
            collider_at("Ghost", 0.5, CircleCollider::new(1.0).on_layer(2, CollisionLayerFlags::ALL)),
        ]);

        let pairs = collision::contacts(&world);
        let a = world.key_of::<CircleCollider>(ids[0]).unwrap();
        let b = world.key_of::<CircleCollider>(ids[1]).unwrap();
        let ghost = world.key_of::<CircleCollider>(ids[3]).unwrap();
        assert!(pairs.contains(&(a, b)));
        assert!(pairs.contains(&(b, ghost)));
        assert!(!pairs.iter().any(|&(x, y)| (x, y) == (a, ghost) || (x, y) == (ghost, a)));
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn parent_scale_grows_the_circle() {
        let mut world = World::new();
        let parent = Prefab::new("Big")
            .with(Transform { scale: Vec2::splat(2.0), ..Transform::default() })
            .with_child(Prefab::new("Hitbox").with(Transform::default()).with(CircleCollider::new(1.0)));
        world.add_entities(vec![parent, collider_at("Other", 2.5, CircleCollider::new(1.0))]);
        assert_eq!(collision::contacts(&world).len(), 1);
    }

    #[test]
    fn collision_system_notifies_both_entities() {
        let mut world = World::new();
        let ids = world.add_entities(vec![
            collider_at("A", 0.0, CircleCollider::new(1.0)).with(Bumper::default()),
            collider_at("B", 1.0, CircleCollider::new(1.0)).with(Bumper::default()),
        ]);
        let mut system = CollisionSystem::new();
        quarry::System::on_fixed_update(&mut system, &mut world);

        assert_eq!(system.last_contacts(), 1);
        let b_key = world.key_of::<CircleCollider>(ids[1]).unwrap();
        let a_key = world.key_of::<CircleCollider>(ids[0]).unwrap();
        assert_eq!(world.get::<Bumper>(ids[0]).unwrap().hits, vec![b_key]);
        assert_eq!(world.get::<Bumper>(ids[1]).unwrap().hits, vec![a_key]);
    }
}
