use std::any::Any;

use quarry::components::EventEmitter;
use quarry::diag;
use quarry::ecs::*;
use quarry::events::NamedEvent;
use quarry::serializable::{ReadMethodMap, Serializable};
use serde_json::{Value, json};

#[derive(Debug)]
struct Damage(i32);

/// Records the named events and damage it hears.
#[derive(Debug, Clone, Default)]
struct Bell {
    heard: Vec<String>,
    damage: i32,
    unlisten_on_exit: bool,
}

impl Serializable for Bell {
    fn read_methods() -> &'static ReadMethodMap<Self> { &[] }

    fn write(&self) -> Value {
        json!({})
    }
}

impl Component for Bell {
    fn on_init(&mut self, cx: &mut Context<'_>) {
        cx.listen::<NamedEvent>();
        cx.listen::<Damage>();
    }

    fn on_exit(&mut self, cx: &mut Context<'_>) {
        if self.unlisten_on_exit {
            cx.unlisten::<NamedEvent>();
        }
    }

    fn on_event(&mut self, event: &dyn Any, _cx: &mut Context<'_>) {
        if let Some(named) = event.downcast_ref::<NamedEvent>() {
            self.heard.push(named.name().to_owned());
        } else if let Some(Damage(amount)) = event.downcast_ref::<Damage>() {
            self.damage += amount;
        }
    }
}

impl ComponentType for Bell {
    const TAG: TypeTag = TypeTag::new("Bell");
}

fn heard(world: &World, id: EntityId) -> Vec<String> {
    world.get::<Bell>(id).unwrap().heard.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emitter_reaches_listeners_on_init_and_exit() {
        let mut world = World::new();
        let bell = world.add_entity(Prefab::new("Bell").with(Bell::default()));
        let door = world.add_entity(Prefab::new("Door").with(EventEmitter::new("Opened", "Closed")));
        assert_eq!(heard(&world, bell), vec!["Opened"]);

        world.destroy(door);
        world.apply_deferred();
        assert_eq!(heard(&world, bell), vec!["Opened", "Closed"]);
    }

    #[test]
    fn listeners_added_later_miss_earlier_broadcasts() {
        let mut world = World::new();
        let ids = world.add_entities(vec![
            Prefab::new("Door").with(EventEmitter::new("Opened", "")),
            Prefab::new("Bell").with(Bell::default()),
        ]);
        assert!(heard(&world, ids[1]).is_empty());
    }

    #[test]
    fn emitter_next_to_its_listener_is_heard() {
        let mut world = World::new();
        let id = world.add_entity(Prefab::new("Alarm").with(Bell::default()).with(EventEmitter::new("Ready", "")));
        assert_eq!(heard(&world, id), vec!["Ready"]);
    }

    #[test]
    fn broadcast_reaches_only_listeners_of_that_type() {
        let mut world = World::new();
        let ids = world.add_entities(vec![
            Prefab::new("A").with(Bell::default()),
            Prefab::new("B").with(Bell::default()),
        ]);
        assert_eq!(world.broadcast(&Damage(3)), 2);
        assert_eq!(world.broadcast(&Damage(4)), 2);
        assert_eq!(world.broadcast(&7_u8), 0);

        for id in ids {
            assert_eq!(world.get::<Bell>(id).unwrap().damage, 7);
            assert!(heard(&world, id).is_empty());
        }
    }

    #[test]
    fn leaving_the_scene_stops_listening() {
        diag::drain();
        let mut world = World::new();
        let ids = world.add_entities(vec![
            Prefab::new("Quiet").with(Bell::default()),
            Prefab::new("Tidy").with(Bell { unlisten_on_exit: true, ..Bell::default() }),
        ]);
        assert_eq!(world.events().listeners::<NamedEvent>().len(), 2);

        world.destroy(ids[0]);
        world.destroy(ids[1]);
        world.apply_deferred();
        assert!(world.events().is_empty());
        assert_eq!(world.broadcast(&NamedEvent("Hello".into())), 0);
        assert!(diag::drain().is_empty());
    }

    #[test]
    fn unlistening_twice_warns() {
        diag::drain();
        let mut world = World::new();
        let id = world.add_entity(Prefab::new("Bell").with(Bell::default()));
        let key = world.key_of::<Bell>(id).unwrap();
        let results = world.with_component::<Bell, _>(key, |_, cx| (cx.unlisten::<Damage>(), cx.unlisten::<Damage>()));
        assert_eq!(results, Some((true, false)));

        let warnings = diag::drain();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Damage"), "{}", warnings[0]);
        assert_eq!(world.events().listeners::<Damage>(), &[] as &[ComponentKey]);
    }
}
