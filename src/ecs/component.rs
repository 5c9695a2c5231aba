//! Dense component storage supporting several instances per entity
//!
//! Every store keeps its values packed in `[0, len)`. An entity may own any
//! number of slots; the store tracks them as an ordered index list per entity
//! plus an inverse slot -> entity table used when swap-removing.

use std::any::{type_name, Any};
use std::collections::HashMap;

use smallvec::SmallVec;

use super::{EcsError, EcsResult, Entity};

/// Trait for components
pub trait Component: Send + Sync + 'static {}

/// Components that hold a resource which must be released explicitly.
///
/// A disposing store calls `dispose` exactly once for every value on its
/// removal path, whether the value is removed directly or purged because its
/// entity was destroyed.
pub trait Disposable: Component {
    fn dispose(&mut self);
}

/// Type-erased component storage
pub trait ComponentStorage: Send + Sync {
    /// Drops every slot the entity owns; no-op if it owns none.
    fn entity_destroyed(&mut self, entity: Entity);
    fn has(&self, entity: Entity) -> bool;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn component_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

type SlotList = SmallVec<[usize; 4]>;

/// Concrete storage for a specific component type
pub struct TypedComponentStorage<T: Component> {
    data: Vec<T>,
    entity_to_indices: HashMap<Entity, SlotList>,
    index_to_entity: Vec<Entity>,
    capacity: usize,
    release: Option<fn(&mut T)>,
}

impl<T: Component> TypedComponentStorage<T> {
    /// Store whose values are simply dropped on removal.
    pub fn simple(capacity: usize) -> Self {
        Self {
            data: Vec::new(),
            entity_to_indices: HashMap::new(),
            index_to_entity: Vec::new(),
            capacity,
            release: None,
        }
    }

    /// Store that disposes each value before dropping it.
    pub fn disposing(capacity: usize) -> Self
    where
        T: Disposable,
    {
        Self {
            release: Some(T::dispose as fn(&mut T)),
            ..Self::simple(capacity)
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_disposing(&self) -> bool {
        self.release.is_some()
    }

    /// Appends a new slot for the entity. Repeated inserts for the same
    /// entity each get their own slot.
    pub fn insert(&mut self, entity: Entity, component: T) -> EcsResult<()> {
        if entity.index() >= self.capacity {
            self.discard(component);
            return Err(EcsError::InvalidEntity {
                entity,
                max: self.capacity,
            });
        }
        if self.data.len() >= self.capacity {
            self.discard(component);
            return Err(EcsError::StoreFull {
                component: type_name::<T>(),
                capacity: self.capacity,
            });
        }

        let index = self.data.len();
        self.data.push(component);
        self.index_to_entity.push(entity);
        self.entity_to_indices.entry(entity).or_default().push(index);
        Ok(())
    }

    /// Releases a value that never made it into the store.
    pub fn discard(&self, mut component: T) {
        if let Some(release) = self.release {
            release(&mut component);
        }
    }

    /// Values owned by the entity, in the order they were inserted.
    pub fn get(&self, entity: Entity) -> EcsResult<Vec<&T>> {
        let slots = self.slots(entity)?;
        Ok(slots.iter().map(|&index| &self.data[index]).collect())
    }

    pub fn get_at(&self, entity: Entity, position: usize) -> EcsResult<&T> {
        let index = self.slot_at(entity, position)?;
        Ok(&self.data[index])
    }

    pub fn get_at_mut(&mut self, entity: Entity, position: usize) -> EcsResult<&mut T> {
        let index = self.slot_at(entity, position)?;
        Ok(&mut self.data[index])
    }

    /// Overwrites the entity's slots positionally.
    pub fn set(&mut self, entity: Entity, values: Vec<T>) -> EcsResult<()> {
        let slots = self.slots(entity)?;
        if slots.len() != values.len() {
            return Err(EcsError::LengthMismatch {
                entity,
                component: type_name::<T>(),
                expected: slots.len(),
                actual: values.len(),
            });
        }

        let slots = slots.clone();
        for (index, value) in slots.into_iter().zip(values) {
            self.data[index] = value;
        }
        Ok(())
    }

    pub fn set_at(&mut self, entity: Entity, position: usize, value: T) -> EcsResult<()> {
        *self.get_at_mut(entity, position)? = value;
        Ok(())
    }

    /// Releases and removes every slot the entity owns.
    pub fn remove(&mut self, entity: Entity) -> EcsResult<()> {
        let slots = self
            .entity_to_indices
            .remove(&entity)
            .ok_or_else(|| Self::not_found(entity))?;
        self.remove_slots(slots);
        Ok(())
    }

    /// Number of slots the entity owns.
    pub fn count(&self, entity: Entity) -> usize {
        self.entity_to_indices.get(&entity).map_or(0, |slots| slots.len())
    }

    /// Every value with its owner, in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.index_to_entity.iter().copied().zip(self.data.iter())
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entity_to_indices.keys().copied()
    }

    fn remove_slots(&mut self, mut slots: SlotList) {
        if let Some(release) = self.release {
            for &index in &slots {
                release(&mut self.data[index]);
            }
        }

        // Highest slot first: the value moved into a vacated slot always sits
        // above every slot still waiting to be removed, so it never belongs
        // to this entity.
        slots.sort_unstable_by(|a, b| b.cmp(a));
        for index in slots {
            let last = self.data.len() - 1;
            self.data.swap_remove(index);
            self.index_to_entity.swap_remove(index);
            if index == last {
                continue;
            }

            let owner = self.index_to_entity[index];
            if let Some(owner_slots) = self.entity_to_indices.get_mut(&owner) {
                if let Some(slot) = owner_slots.iter_mut().find(|slot| **slot == last) {
                    *slot = index;
                }
            }
        }
    }

    fn slots(&self, entity: Entity) -> EcsResult<&SlotList> {
        self.entity_to_indices
            .get(&entity)
            .ok_or_else(|| Self::not_found(entity))
    }

    fn slot_at(&self, entity: Entity, position: usize) -> EcsResult<usize> {
        let slots = self.slots(entity)?;
        slots
            .get(position)
            .copied()
            .ok_or(EcsError::SlotOutOfRange {
                entity,
                component: type_name::<T>(),
                index: position,
                len: slots.len(),
            })
    }

    fn not_found(entity: Entity) -> EcsError {
        EcsError::NotFound {
            entity,
            component: type_name::<T>(),
        }
    }
}

impl<T: Component> ComponentStorage for TypedComponentStorage<T> {
    fn entity_destroyed(&mut self, entity: Entity) {
        if let Some(slots) = self.entity_to_indices.remove(&entity) {
            self.remove_slots(slots);
        }
    }

    fn has(&self, entity: Entity) -> bool {
        self.entity_to_indices.contains_key(&entity)
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn component_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
    }
    impl Component for Position {}

    struct Buffer {
        released: Arc<AtomicUsize>,
    }
    impl Component for Buffer {}
    impl Disposable for Buffer {
        fn dispose(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn e(id: u32) -> Entity {
        Entity::from_raw(id)
    }

    fn xs(storage: &TypedComponentStorage<Position>, entity: Entity) -> Vec<f32> {
        storage.get(entity).unwrap().iter().map(|p| p.x).collect()
    }

    /// Every slot is owned by exactly one entity and the counts add up.
    fn assert_consistent<T: Component>(storage: &TypedComponentStorage<T>) {
        let total: usize = storage.entity_to_indices.values().map(|s| s.len()).sum();
        assert_eq!(total, storage.data.len());
        assert_eq!(storage.index_to_entity.len(), storage.data.len());
        for (entity, slots) in &storage.entity_to_indices {
            for &index in slots {
                assert!(index < storage.data.len());
                assert_eq!(storage.index_to_entity[index], *entity);
            }
        }
    }

    #[test]
    fn test_multiple_instances_keep_insert_order() {
        let mut storage = TypedComponentStorage::<Position>::simple(16);

        storage.insert(e(0), Position { x: 1.0 }).unwrap();
        assert_eq!(xs(&storage, e(0)), vec![1.0]);

        storage.insert(e(0), Position { x: 2.0 }).unwrap();
        assert_eq!(xs(&storage, e(0)), vec![1.0, 2.0]);
        assert_eq!(storage.count(e(0)), 2);

        storage.remove(e(0)).unwrap();
        assert!(!storage.has(e(0)));
        assert!(matches!(
            storage.get(e(0)),
            Err(EcsError::NotFound { .. })
        ));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_remove_interleaved_multi_slot_entities() {
        let mut storage = TypedComponentStorage::<Position>::simple(16);
        for round in 0..3 {
            storage.insert(e(1), Position { x: 10.0 + round as f32 }).unwrap();
            storage.insert(e(2), Position { x: 20.0 + round as f32 }).unwrap();
        }
        storage.insert(e(1), Position { x: 13.0 }).unwrap();

        storage.remove(e(1)).unwrap();
        assert_consistent(&storage);
        assert_eq!(xs(&storage, e(2)), vec![20.0, 21.0, 22.0]);
        assert_eq!(storage.len(), 3);

        storage.remove(e(2)).unwrap();
        assert_consistent(&storage);
        assert_eq!(storage.len(), 0);
    }

    #[test]
    fn test_remove_entity_owning_tail_slots() {
        let mut storage = TypedComponentStorage::<Position>::simple(16);
        storage.insert(e(2), Position { x: 20.0 }).unwrap();
        storage.insert(e(1), Position { x: 10.0 }).unwrap();
        storage.insert(e(2), Position { x: 21.0 }).unwrap();
        storage.insert(e(1), Position { x: 11.0 }).unwrap();
        storage.insert(e(1), Position { x: 12.0 }).unwrap();

        storage.remove(e(1)).unwrap();
        assert_consistent(&storage);
        assert_eq!(xs(&storage, e(2)), vec![20.0, 21.0]);
    }

    #[test]
    fn test_set_overwrites_positionally() {
        let mut storage = TypedComponentStorage::<Position>::simple(8);
        storage.insert(e(3), Position { x: 1.0 }).unwrap();
        storage.insert(e(4), Position { x: 9.0 }).unwrap();
        storage.insert(e(3), Position { x: 2.0 }).unwrap();

        storage
            .set(e(3), vec![Position { x: 5.0 }, Position { x: 6.0 }])
            .unwrap();
        assert_eq!(xs(&storage, e(3)), vec![5.0, 6.0]);
        assert_eq!(xs(&storage, e(4)), vec![9.0]);

        storage.set_at(e(3), 1, Position { x: 7.0 }).unwrap();
        assert_eq!(storage.get_at(e(3), 1).unwrap().x, 7.0);

        assert!(matches!(
            storage.set(e(3), vec![Position { x: 0.0 }]),
            Err(EcsError::LengthMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
        assert!(matches!(
            storage.get_at(e(3), 2),
            Err(EcsError::SlotOutOfRange { index: 2, len: 2, .. })
        ));
        assert_eq!(storage.count(e(3)), 2);
    }

    #[test]
    fn test_insert_bounds() {
        let mut storage = TypedComponentStorage::<Position>::simple(2);

        assert!(matches!(
            storage.insert(e(2), Position { x: 0.0 }),
            Err(EcsError::InvalidEntity { max: 2, .. })
        ));

        storage.insert(e(0), Position { x: 0.0 }).unwrap();
        storage.insert(e(0), Position { x: 0.0 }).unwrap();
        assert!(matches!(
            storage.insert(e(1), Position { x: 0.0 }),
            Err(EcsError::StoreFull { capacity: 2, .. })
        ));
    }

    #[test]
    fn test_disposing_store_releases_once_per_value() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut storage = TypedComponentStorage::<Buffer>::disposing(8);
        assert!(storage.is_disposing());

        for id in [0, 0, 1, 0] {
            storage
                .insert(
                    e(id),
                    Buffer {
                        released: released.clone(),
                    },
                )
                .unwrap();
        }

        storage.remove(e(0)).unwrap();
        assert_eq!(released.load(Ordering::SeqCst), 3);

        storage.entity_destroyed(e(1));
        storage.entity_destroyed(e(1));
        assert_eq!(released.load(Ordering::SeqCst), 4);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_rejected_insert_is_released() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut storage = TypedComponentStorage::<Buffer>::disposing(2);
        let buffer = || Buffer {
            released: released.clone(),
        };

        storage.insert(e(0), buffer()).unwrap();
        storage.insert(e(1), buffer()).unwrap();
        assert_eq!(storage.len(), storage.capacity());

        assert!(matches!(
            storage.insert(e(0), buffer()),
            Err(EcsError::StoreFull { .. })
        ));
        assert_eq!(released.load(Ordering::SeqCst), 1);

        assert!(matches!(
            storage.insert(e(5), buffer()),
            Err(EcsError::InvalidEntity { .. })
        ));
        assert_eq!(released.load(Ordering::SeqCst), 2);

        storage.entity_destroyed(e(0));
        storage.entity_destroyed(e(1));
        assert_eq!(released.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_entity_destroyed_is_noop_for_unknown_entity() {
        let mut storage = TypedComponentStorage::<Position>::simple(4);
        storage.insert(e(1), Position { x: 1.0 }).unwrap();

        storage.entity_destroyed(e(0));
        assert_eq!(storage.len(), 1);
        assert!(storage.has(e(1)));
    }

    #[test]
    fn test_iteration_and_mutation() {
        let mut storage = TypedComponentStorage::<Position>::simple(4);
        storage.insert(e(1), Position { x: 1.0 }).unwrap();
        storage.insert(e(2), Position { x: 3.0 }).unwrap();

        assert_eq!(storage.iter().count(), 2);

        storage.get_at_mut(e(1), 0).unwrap().x += 1.0;
        assert_eq!(storage.get_at(e(1), 0).unwrap().x, 2.0);

        let mut owners: Vec<_> = storage.entities().collect();
        owners.sort();
        assert_eq!(owners, vec![e(1), e(2)]);
    }
}
