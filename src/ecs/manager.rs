//! Component type registry

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use tracing::debug;

use super::component::{Component, ComponentStorage, Disposable, TypedComponentStorage};
use super::signature::{ComponentType, MAX_COMPONENTS};
use super::{EcsError, EcsResult, Entity};

struct Registration {
    component_type: ComponentType,
    storage: Box<dyn ComponentStorage>,
}

/// Assigns component type IDs and routes typed calls to the right store
pub struct ComponentManager {
    registrations: HashMap<TypeId, Registration>,
    next_component_type: ComponentType,
    store_capacity: usize,
}

impl ComponentManager {
    pub fn new(store_capacity: usize) -> Self {
        Self {
            registrations: HashMap::new(),
            next_component_type: 0,
            store_capacity,
        }
    }

    pub fn register_simple<T: Component>(&mut self) -> EcsResult<ComponentType> {
        let storage = TypedComponentStorage::<T>::simple(self.store_capacity);
        self.register::<T>(Box::new(storage))
    }

    pub fn register_disposable<T: Disposable>(&mut self) -> EcsResult<ComponentType> {
        let storage = TypedComponentStorage::<T>::disposing(self.store_capacity);
        self.register::<T>(Box::new(storage))
    }

    pub fn is_registered<T: Component>(&self) -> bool {
        self.registrations.contains_key(&TypeId::of::<T>())
    }

    pub fn component_type<T: Component>(&self) -> EcsResult<ComponentType> {
        self.registration::<T>()
            .map(|registration| registration.component_type)
    }

    pub fn registered_count(&self) -> usize {
        self.registrations.len()
    }

    pub fn add<T: Component>(&mut self, entity: Entity, component: T) -> EcsResult<()> {
        self.storage_mut::<T>()?.insert(entity, component)
    }

    pub fn remove<T: Component>(&mut self, entity: Entity) -> EcsResult<()> {
        self.storage_mut::<T>()?.remove(entity)
    }

    pub fn get<T: Component>(&self, entity: Entity) -> EcsResult<Vec<&T>> {
        self.storage::<T>()?.get(entity)
    }

    pub fn set<T: Component>(&mut self, entity: Entity, values: Vec<T>) -> EcsResult<()> {
        self.storage_mut::<T>()?.set(entity, values)
    }

    /// Purges the entity from every registered store.
    pub fn entity_destroyed(&mut self, entity: Entity) {
        for registration in self.registrations.values_mut() {
            registration.storage.entity_destroyed(entity);
        }
    }

    pub fn storage<T: Component>(&self) -> EcsResult<&TypedComponentStorage<T>> {
        self.registration::<T>()?
            .storage
            .as_any()
            .downcast_ref::<TypedComponentStorage<T>>()
            .ok_or(EcsError::UnregisteredType(type_name::<T>()))
    }

    pub fn storage_mut<T: Component>(&mut self) -> EcsResult<&mut TypedComponentStorage<T>> {
        self.registrations
            .get_mut(&TypeId::of::<T>())
            .and_then(|registration| {
                registration
                    .storage
                    .as_any_mut()
                    .downcast_mut::<TypedComponentStorage<T>>()
            })
            .ok_or(EcsError::UnregisteredType(type_name::<T>()))
    }

    fn register<T: Component>(
        &mut self,
        storage: Box<dyn ComponentStorage>,
    ) -> EcsResult<ComponentType> {
        let name = type_name::<T>();
        if self.is_registered::<T>() {
            return Err(EcsError::DuplicateRegistration(name));
        }
        if self.next_component_type as usize >= MAX_COMPONENTS {
            return Err(EcsError::TooManyComponentTypes {
                name,
                max: MAX_COMPONENTS,
            });
        }

        let component_type = self.next_component_type;
        self.registrations.insert(
            TypeId::of::<T>(),
            Registration {
                component_type,
                storage,
            },
        );
        self.next_component_type += 1;
        debug!(
            component = name,
            component_type,
            disposing = self.storage::<T>().map_or(false, |s| s.is_disposing()),
            "component registered"
        );
        Ok(component_type)
    }

    fn registration<T: Component>(&self) -> EcsResult<&Registration> {
        self.registrations
            .get(&TypeId::of::<T>())
            .ok_or(EcsError::UnregisteredType(type_name::<T>()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    impl Component for Position {}

    #[derive(Debug, Clone, PartialEq)]
    struct Velocity {
        dx: f32,
    }
    impl Component for Velocity {}

    struct Handle;
    impl Component for Handle {}
    impl Disposable for Handle {
        fn dispose(&mut self) {}
    }

    macro_rules! marker_components {
        ($($name:ident),*) => {
            $(struct $name; impl Component for $name {})*
        };
    }

    marker_components!(
        C0, C1, C2, C3, C4, C5, C6, C7, C8, C9, C10, C11, C12, C13, C14, C15, C16, C17, C18, C19,
        C20, C21, C22, C23, C24, C25, C26, C27, C28, C29, C30, C31, C32
    );

    #[test]
    fn test_types_get_sequential_ids() {
        let mut manager = ComponentManager::new(16);
        assert_eq!(manager.register_simple::<Position>().unwrap(), 0);
        assert_eq!(manager.register_disposable::<Handle>().unwrap(), 1);
        assert_eq!(manager.register_simple::<Velocity>().unwrap(), 2);

        assert_eq!(manager.component_type::<Velocity>().unwrap(), 2);
        assert!(manager.storage::<Handle>().unwrap().is_disposing());
        assert!(!manager.storage::<Position>().unwrap().is_disposing());
    }

    #[test]
    fn test_duplicate_and_unregistered() {
        let mut manager = ComponentManager::new(16);
        manager.register_simple::<Position>().unwrap();

        assert!(matches!(
            manager.register_simple::<Position>(),
            Err(EcsError::DuplicateRegistration(_))
        ));
        manager.register_disposable::<Handle>().unwrap();
        assert!(matches!(
            manager.register_simple::<Handle>(),
            Err(EcsError::DuplicateRegistration(_))
        ));
        assert_eq!(manager.registered_count(), 2);
        assert!(matches!(
            manager.component_type::<Velocity>(),
            Err(EcsError::UnregisteredType(_))
        ));
        assert!(matches!(
            manager.add(Entity::from_raw(0), Velocity { dx: 1.0 }),
            Err(EcsError::UnregisteredType(_))
        ));
    }

    #[test]
    fn test_component_type_cap() {
        let mut manager = ComponentManager::new(4);
        macro_rules! register_all {
            ($($name:ident),*) => { $(manager.register_simple::<$name>().unwrap();)* };
        }
        register_all!(
            C0, C1, C2, C3, C4, C5, C6, C7, C8, C9, C10, C11, C12, C13, C14, C15, C16, C17, C18,
            C19, C20, C21, C22, C23, C24, C25, C26, C27, C28, C29, C30, C31
        );
        assert_eq!(manager.registered_count(), MAX_COMPONENTS);

        assert!(matches!(
            manager.register_simple::<C32>(),
            Err(EcsError::TooManyComponentTypes { max: 32, .. })
        ));
    }

    #[test]
    fn test_routing_and_broadcast_destroy() {
        let mut manager = ComponentManager::new(16);
        manager.register_simple::<Position>().unwrap();
        manager.register_simple::<Velocity>().unwrap();
        let entity = Entity::from_raw(3);

        manager.add(entity, Position { x: 1.0, y: 2.0 }).unwrap();
        manager.add(entity, Velocity { dx: 0.5 }).unwrap();
        manager.set(entity, vec![Velocity { dx: 1.5 }]).unwrap();
        assert_eq!(
            manager.get::<Velocity>(entity).unwrap(),
            vec![&Velocity { dx: 1.5 }]
        );
        assert_eq!(
            manager.get::<Position>(entity).unwrap(),
            vec![&Position { x: 1.0, y: 2.0 }]
        );

        manager.entity_destroyed(entity);
        assert!(manager.get::<Position>(entity).is_err());
        assert!(manager.get::<Velocity>(entity).is_err());

        assert!(matches!(
            manager.remove::<Position>(entity),
            Err(EcsError::NotFound { .. })
        ));
    }
}
