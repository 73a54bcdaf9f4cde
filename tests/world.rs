use std::cell::RefCell;

use glam::Vec2;
use quarry::components::Transform;
use quarry::ecs::*;
use quarry::reference::{ComponentReference, ReferenceMut};
use quarry::serializable::{ReadMethodMap, Serializable};
use quarry::{diag, stream};
use serde_json::{Value, json};

thread_local! {
    static JOURNAL: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn record(event: String) {
    JOURNAL.with(|journal| journal.borrow_mut().push(event));
}

fn journal() -> Vec<String> {
    JOURNAL.with(|journal| journal.borrow_mut().drain(..).collect())
}

/// Records every hook it sees. Watches the Transform on its own entity.
#[derive(Debug, Clone, Default)]
struct Witness {
    label: String,
    transform: ComponentReference<Transform>,
    remove_self: bool,
    destroy_self: bool,
    clear_world: bool,
}

impl Witness {
    fn named(label: &str) -> Self {
        Self { label: label.to_string(), ..Self::default() }
    }

    fn read_label(&mut self, json: &Value) { stream::read(&mut self.label, json); }

    const READ_METHODS: &'static ReadMethodMap<Self> = &[("Label", Self::read_label)];
}

impl Serializable for Witness {
    fn read_methods() -> &'static ReadMethodMap<Self> { Self::READ_METHODS }

    fn write(&self) -> Value {
        json!({ "Label": self.label })
    }
}

impl Component for Witness {
    fn on_init(&mut self, _cx: &mut Context<'_>) {
        record(format!("init {}", self.label));
    }

    fn on_exit(&mut self, _cx: &mut Context<'_>) {
        record(format!("exit {}", self.label));
    }

    fn on_fixed_update(&mut self, cx: &mut Context<'_>) {
        record(format!("tick {}", self.label));
        if self.remove_self {
            let key = cx.key();
            cx.remove_component(key);
        }
        if self.destroy_self {
            let id = cx.entity();
            cx.destroy(id);
            cx.apply_deferred();
        }
        if self.clear_world {
            cx.clear();
        }
    }

    fn on_add_child(&mut self, child: EntityId, cx: &mut Context<'_>) {
        record(format!("child+ {} {}", self.label, World::entity_name(cx, child)));
    }

    fn on_remove_child(&mut self, _child: EntityId, _cx: &mut Context<'_>) {
        record(format!("child- {}", self.label));
    }

    fn reference_mut(&mut self, slot: usize) -> Option<ReferenceMut<'_>> {
        match slot {
            0 => Some(ReferenceMut::Component(&mut self.transform)),
            _ => None,
        }
    }

    fn on_connect(&mut self, _slot: usize, _target: Target, _cx: &mut Context<'_>) {
        record(format!("connect {}", self.label));
    }

    fn on_disconnect(&mut self, _slot: usize, _target: Target, _cx: &mut Context<'_>) {
        record(format!("disconnect {}", self.label));
    }
}

impl ComponentType for Witness {
    const TAG: TypeTag = TypeTag::new("Witness");
    const BASES: &'static [TypeTag] = &[BEHAVIOR];
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- lifecycle ----------------------------------------------------------

    #[test]
    fn add_entity_initializes_and_registers() {
        journal();
        let mut world = World::new();
        let id = world.add_entity(Prefab::new("A").with(Witness::named("a")));

        let key = world.key_of::<Witness>(id).unwrap();
        assert!(world.is_initialized(key));
        assert_eq!(world.registry(Witness::TAG), &[key]);
        assert_eq!(world.registry(BEHAVIOR), &[key]);
        assert_eq!(journal(), vec!["init a"]);
    }

    #[test]
    fn reference_to_own_entity_connects_after_init() {
        journal();
        let mut world = World::new();
        let id = world.add_entity(Prefab::new("A").with(Witness::named("a")).with(Transform::default()));

        assert_eq!(journal(), vec!["init a", "connect a"]);
        let witness = world.get::<Witness>(id).unwrap();
        assert_eq!(witness.transform.key(), world.key_of::<Transform>(id));
        assert!(world.entity(id).unwrap().references().iter().any(|r| r.slot == 0));
    }

    #[test]
    fn late_component_binds_and_removal_unbinds() {
        journal();
        let mut world = World::new();
        let id = world.add_entity(Prefab::new("A").with(Witness::named("a")));
        journal();

        let key = world.insert(id, Transform::from_translation(Vec2::new(3.0, 4.0))).unwrap();
        assert_eq!(journal(), vec!["connect a"]);
        assert_eq!(world.get::<Witness>(id).unwrap().transform.key(), Some(key));

        let removed = world.remove::<Transform>(id).unwrap();
        assert_eq!(removed.translation, Vec2::new(3.0, 4.0));
        assert_eq!(journal(), vec!["disconnect a"]);

        // Still watching the entity, so a new Transform binds again.
        let witness = world.get::<Witness>(id).unwrap();
        assert!(!witness.transform.is_resolved());
        assert_eq!(witness.transform.entity(), Some(id));
        world.insert(id, Transform::default());
        assert_eq!(journal(), vec!["connect a"]);
    }

    #[test]
    fn second_component_of_same_type_is_rejected() {
        diag::drain();
        let mut world = World::new();
        let id = world.add_entity(Prefab::new("A").with(Transform::default()));
        assert!(world.insert(id, Transform::default()).is_none());
        assert_eq!(world.entity(id).unwrap().component_count(), 1);
        assert_eq!(diag::drain().len(), 1);
    }

    #[test]
    fn destroy_disconnects_once_then_exits() {
        journal();
        let mut world = World::new();
        let id = world.add_entity(Prefab::new("A").with(Witness::named("a")).with(Transform::default()));
        journal();

        world.destroy(id);
        assert!(world.contains(id));
        assert!(world.find_entity("A").is_none());
        world.apply_deferred();

        assert!(!world.contains(id));
        assert_eq!(journal(), vec!["disconnect a", "exit a"]);
        assert!(world.registry(Witness::TAG).is_empty());
        assert!(world.registry(Transform::TAG).is_empty());
    }

    #[test]
    fn removal_inside_a_hook_happens_on_return() {
        journal();
        let mut world = World::new();
        let witness = Witness { remove_self: true, ..Witness::named("a") };
        let id = world.add_entity(Prefab::new("A").with(witness));
        journal();

        world.dispatch_fixed_update(BEHAVIOR);
        assert_eq!(journal(), vec!["tick a", "exit a"]);
        assert!(world.get::<Witness>(id).is_none());

        world.dispatch_fixed_update(BEHAVIOR);
        assert!(journal().is_empty());
    }

    #[test]
    fn destroying_own_entity_inside_a_hook_waits_for_the_sync_point() {
        journal();
        let mut world = World::new();
        let witness = Witness { destroy_self: true, ..Witness::named("a") };
        let id = world.add_entity(Prefab::new("A").with(witness).with(Transform::default()));
        let key = world.key_of::<Witness>(id).unwrap();
        journal();

        world.dispatch_fixed_update(BEHAVIOR);
        assert_eq!(journal(), vec!["tick a"]);
        assert!(world.contains(id));
        assert_eq!(world.registry(BEHAVIOR), &[key]);
        assert!(!world.in_hook());

        world.apply_deferred();
        assert_eq!(journal(), vec!["disconnect a", "exit a"]);
        assert!(!world.contains(id));
        assert!(world.registry(BEHAVIOR).is_empty());
        assert!(world.registry(Transform::TAG).is_empty());
    }

    #[test]
    fn clear_inside_a_hook_queues_every_destroy() {
        journal();
        let mut world = World::new();
        let clearer = Witness { clear_world: true, ..Witness::named("a") };
        world.add_entities(vec![Prefab::new("A").with(clearer), Prefab::new("B").with(Witness::named("b"))]);
        journal();

        world.dispatch_fixed_update(BEHAVIOR);
        assert_eq!(journal(), vec!["tick a", "tick b"]);
        assert_eq!(world.len(), 2);
        assert!(world.has_deferred());

        world.apply_deferred();
        assert_eq!(journal(), vec!["exit a", "exit b"]);
        assert!(world.is_empty());
        assert!(world.registry(BEHAVIOR).is_empty());
    }

    #[test]
    fn fixed_update_only_reaches_initialized_components() {
        journal();
        let mut world = World::new();
        world.spawn(Prefab::new("A").with(Witness::named("a")));
        world.dispatch_fixed_update(BEHAVIOR);
        assert!(journal().is_empty());

        world.apply_deferred();
        world.dispatch_fixed_update(BEHAVIOR);
        assert_eq!(journal(), vec!["init a", "tick a"]);
    }

    // -- hierarchy ----------------------------------------------------------

    #[test]
    fn children_follow_their_parent_in_hierarchy_order() {
        let mut world = World::new();
        let a = world.add_entity(Prefab::new("A").with_child(Prefab::new("A1")));
        let b = world.add_entity(Prefab::new("B"));
        let a2 = world.add_child(a, Prefab::new("A2")).unwrap();

        let names: Vec<&str> = world.entities().map(Entity::name).collect();
        assert_eq!(names, vec!["A", "A1", "A2", "B"]);
        assert_eq!(world.children(a).len(), 2);
        assert_eq!(world.parent(a2), Some(a));
        assert!(world.is_descendant(a2, a));
        assert!(!world.is_descendant(b, a));
    }

    #[test]
    fn empty_prefab_makes_a_bare_entity() {
        let mut world = World::new();
        let id = world.add_entity(Prefab::new("Empty"));
        let entity = world.entity(id).unwrap();
        assert!(entity.is_initialized());
        assert_eq!(entity.component_count(), 0);
        assert!(entity.children().is_empty());
    }

    #[test]
    fn children_added_later_notify_the_parent() {
        journal();
        let mut world = World::new();
        let parent = world.add_entity(Prefab::new("P").with(Witness::named("p")));
        journal();

        let child = world.add_child(parent, Prefab::new("C")).unwrap();
        assert_eq!(journal(), vec!["child+ p C"]);

        world.destroy(child);
        world.apply_deferred();
        assert_eq!(journal(), vec!["child- p"]);
        assert!(world.children(parent).is_empty());
    }

    #[test]
    fn reparent_moves_the_whole_subtree() {
        let mut world = World::new();
        let a = world.add_entity(Prefab::new("A"));
        let b = world.add_entity(Prefab::new("B").with_child(Prefab::new("B1")));
        world.set_parent(b, Some(a));
        world.apply_deferred();

        let names: Vec<&str> = world.entities().map(Entity::name).collect();
        assert_eq!(names, vec!["A", "B", "B1"]);
        assert_eq!(world.parent(b), Some(a));
        assert_eq!(world.roots().collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn cannot_reparent_under_own_descendant() {
        diag::drain();
        let mut world = World::new();
        let a = world.add_entity(Prefab::new("A").with_child(Prefab::new("A1")));
        let a1 = world.children(a)[0];
        world.set_parent(a, Some(a1));
        world.apply_deferred();
        assert_eq!(world.parent(a), None);
        assert_eq!(diag::drain().len(), 1);
    }

    // -- deferred changes ---------------------------------------------------

    #[test]
    fn spawn_reserves_an_id_until_the_sync_point() {
        let mut world = World::new();
        let id = world.spawn(Prefab::new("Late"));
        assert!(!world.contains(id));
        assert!(world.has_deferred());

        world.apply_deferred();
        assert!(world.contains(id));
        assert!(world.entity(id).unwrap().is_initialized());
        assert!(!world.has_deferred());
    }

    #[test]
    fn destroying_a_queued_spawn_cancels_it() {
        let mut world = World::new();
        let id = world.spawn(Prefab::new("Never"));
        world.destroy(id);
        world.apply_deferred();
        assert!(!world.contains(id));
        assert!(world.is_empty());
    }

    #[test]
    fn destroys_apply_before_spawns() {
        journal();
        let mut world = World::new();
        let old = world.add_entity(Prefab::new("Old").with(Witness::named("old")));
        journal();

        world.spawn(Prefab::new("New").with(Witness::named("new")));
        world.destroy(old);
        world.apply_deferred();
        assert_eq!(journal(), vec!["exit old", "init new"]);
    }

    #[test]
    fn spawn_child_under_missing_parent_is_dropped() {
        diag::drain();
        let mut world = World::new();
        let parent = world.add_entity(Prefab::new("P"));
        let child = world.spawn_child(parent, Prefab::new("C"));
        world.destroy(parent);
        world.apply_deferred();
        assert!(!world.contains(child));
        assert_eq!(diag::drain().len(), 1);
    }

    #[test]
    fn clear_exits_everything() {
        journal();
        let mut world = World::new();
        world.add_entity(Prefab::new("A").with(Witness::named("a")).with_child(Prefab::new("A1").with(Witness::named("a1"))));
        world.spawn(Prefab::new("Queued"));
        journal();

        world.clear();
        assert!(world.is_empty());
        assert!(!world.has_deferred());
        // Children go first; the parent still hears about it.
        assert_eq!(journal(), vec!["exit a1", "child- a", "exit a"]);
        assert!(world.registry(BEHAVIOR).is_empty());
    }

    // -- clone / ordering ---------------------------------------------------

    #[test]
    fn cloned_prefab_has_its_own_components() {
        diag::drain();
        let mut prefab = Prefab::default();
        stream::read_object(
            &mut prefab,
            &json!({ "Name": "A", "Components": [{ "Type": "Transform", "Translation": [1, 2] }] }),
        );
        assert!(diag::drain().is_empty());

        let mut world = World::new();
        let original = world.add_entity(prefab);
        let copy = world.clone_entity(original).unwrap();
        let clone = world.add_entity(copy);

        world.get_mut::<Transform>(clone).unwrap().translation.x = 9.0;
        assert_eq!(world.get::<Transform>(original).unwrap().translation, Vec2::new(1.0, 2.0));
        assert_eq!(world.get::<Transform>(clone).unwrap().translation, Vec2::new(9.0, 2.0));
        assert_ne!(world.key_of::<Transform>(original), world.key_of::<Transform>(clone));
    }

    #[test]
    fn identical_runs_assign_identical_ids_and_order() {
        fn run() -> (Vec<EntityId>, Vec<ComponentKey>) {
            let mut world = World::new();
            let a = world.add_entity(Prefab::new("A").with(Witness::named("a")));
            world.spawn_child(a, Prefab::new("A1").with(Witness::named("a1")));
            world.spawn(Prefab::new("B").with(Witness::named("b")));
            world.apply_deferred();
            world.dispatch_fixed_update(BEHAVIOR);
            (world.entity_ids().to_vec(), world.registry(BEHAVIOR).to_vec())
        }
        assert_eq!(run(), run());
    }
}
