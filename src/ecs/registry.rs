use std::collections::HashMap;
use std::iter;

use super::{ComponentKey, TypeTag};

/// Per-tag lists of initialized components, in insertion order.
///
/// A component is listed under its own tag and under every ancestor tag it
/// declares, from the end of its `on_init` until the start of its
/// `on_exit`.
#[derive(Debug, Default)]
pub struct Registries {
    lists: HashMap<TypeTag, Vec<ComponentKey>>,
}

impl Registries {
    pub fn get(&self, tag: TypeTag) -> &[ComponentKey] {
        self.lists.get(&tag).map_or(&[], Vec::as_slice)
    }

    pub fn contains(&self, tag: TypeTag, key: ComponentKey) -> bool {
        self.get(tag).contains(&key)
    }

    /// Whether `key` is listed under any tag.
    pub fn lists(&self, key: ComponentKey) -> bool {
        self.lists.values().any(|list| list.contains(&key))
    }

    pub fn tags(&self) -> impl Iterator<Item = TypeTag> + '_ {
        self.lists.iter().filter(|(_, list)| !list.is_empty()).map(|(tag, _)| *tag)
    }

    pub(crate) fn insert(&mut self, key: ComponentKey, tag: TypeTag, bases: &[TypeTag]) {
        for tag in iter::once(tag).chain(bases.iter().copied()) {
            let list = self.lists.entry(tag).or_default();
            if !list.contains(&key) {
                list.push(key);
            }
        }
    }

    pub(crate) fn remove(&mut self, key: ComponentKey, tag: TypeTag, bases: &[TypeTag]) {
        for tag in iter::once(tag).chain(bases.iter().copied()) {
            if let Some(list) = self.lists.get_mut(&tag) {
                if let Some(position) = list.iter().position(|k| *k == key) {
                    list.remove(position);
                }
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.lists.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{ComponentId, EntityId};

    const SPRITE: TypeTag = TypeTag::new("Sprite");
    const TILEMAP: TypeTag = TypeTag::new("TilemapSprite");

    fn key(entity: u32, component: u32) -> ComponentKey {
        ComponentKey::new(EntityId(entity), ComponentId(component))
    }

    #[test]
    fn subtypes_are_listed_under_ancestors() {
        let mut registries = Registries::default();
        registries.insert(key(1, 1), SPRITE, &[]);
        registries.insert(key(2, 2), TILEMAP, &[SPRITE]);
        assert_eq!(registries.get(SPRITE), &[key(1, 1), key(2, 2)]);
        assert_eq!(registries.get(TILEMAP), &[key(2, 2)]);

        registries.remove(key(2, 2), TILEMAP, &[SPRITE]);
        assert_eq!(registries.get(SPRITE), &[key(1, 1)]);
        assert!(!registries.lists(key(2, 2)));
    }

    #[test]
    fn removal_keeps_insertion_order() {
        let mut registries = Registries::default();
        for i in 0..4 {
            registries.insert(key(i, i), SPRITE, &[]);
        }
        registries.remove(key(1, 1), SPRITE, &[]);
        assert_eq!(registries.get(SPRITE), &[key(0, 0), key(2, 2), key(3, 3)]);
    }
}
