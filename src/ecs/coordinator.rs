//! Coordinator - the single entry point to the ECS
//!
//! Keeps the entity signatures, the component stores and the system
//! membership sets consistent with each other. Every mutation of an entity's
//! component set goes store first, then signature, then systems.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::component::{Component, Disposable};
use super::entity::EntityManager;
use super::manager::ComponentManager;
use super::signature::ComponentType;
use super::system::{System, SystemRegistry};
use super::{EcsError, EcsResult, Entity, Signature};
use crate::config::EcsConfig;

pub struct Coordinator {
    components: ComponentManager,
    entities: EntityManager,
    systems: SystemRegistry,
}

impl Coordinator {
    pub fn new(config: &EcsConfig) -> Self {
        Self::with_capacity(config.max_entities)
    }

    pub fn with_capacity(max_entities: usize) -> Self {
        Self {
            components: ComponentManager::new(max_entities),
            entities: EntityManager::new(max_entities),
            systems: SystemRegistry::new(),
        }
    }

    pub fn max_entities(&self) -> usize {
        self.entities.max_entities()
    }

    // Entities

    pub fn create_entity(&mut self) -> EcsResult<Entity> {
        self.entities.create_entity()
    }

    /// Frees the ID, purges every component the entity owns (disposing the
    /// ones that need it) and drops it from every system.
    pub fn destroy_entity(&mut self, entity: Entity) -> EcsResult<()> {
        self.entities.destroy_entity(entity)?;
        self.components.entity_destroyed(entity);
        self.systems.entity_destroyed(entity);
        Ok(())
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    pub fn living_count(&self) -> usize {
        self.entities.living_count()
    }

    pub fn signature(&self, entity: Entity) -> EcsResult<Signature> {
        self.entities.signature(entity)
    }

    // Components

    pub fn register_simple_component<T: Component>(&mut self) -> EcsResult<ComponentType> {
        self.components.register_simple::<T>()
    }

    pub fn register_disposable_component<T: Disposable>(&mut self) -> EcsResult<ComponentType> {
        self.components.register_disposable::<T>()
    }

    pub fn component_type<T: Component>(&self) -> EcsResult<ComponentType> {
        self.components.component_type::<T>()
    }

    /// Appends a `T` to the entity. A rejected disposable value is released
    /// before the error is returned.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> EcsResult<()> {
        let rejection = match self.entities.signature(entity) {
            Err(err) => Some(err),
            Ok(_) if !self.entities.is_alive(entity) => {
                warn!(
                    %entity,
                    component = std::any::type_name::<T>(),
                    "add to dead entity rejected"
                );
                Some(EcsError::EntityNotAlive(entity))
            }
            Ok(_) => None,
        };
        if let Some(err) = rejection {
            if let Ok(storage) = self.components.storage::<T>() {
                storage.discard(component);
            }
            return Err(err);
        }
        self.components.add(entity, component)?;
        self.update_signature::<T>(entity, true)
    }

    /// Removes every instance of `T` the entity owns.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> EcsResult<()> {
        self.components.remove::<T>(entity)?;
        self.update_signature::<T>(entity, false)
    }

    pub fn get_components<T: Component>(&self, entity: Entity) -> EcsResult<Vec<&T>> {
        self.components.get::<T>(entity)
    }

    pub fn set_components<T: Component>(
        &mut self,
        entity: Entity,
        values: Vec<T>,
    ) -> EcsResult<()> {
        self.components.set(entity, values)
    }

    pub fn get_component<T: Component>(&self, entity: Entity, index: usize) -> EcsResult<&T> {
        self.components.storage::<T>()?.get_at(entity, index)
    }

    pub fn get_component_mut<T: Component>(
        &mut self,
        entity: Entity,
        index: usize,
    ) -> EcsResult<&mut T> {
        self.components.storage_mut::<T>()?.get_at_mut(entity, index)
    }

    pub fn set_component<T: Component>(
        &mut self,
        entity: Entity,
        index: usize,
        component: T,
    ) -> EcsResult<()> {
        self.components
            .storage_mut::<T>()?
            .set_at(entity, index, component)
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> EcsResult<bool> {
        let component_type = self.components.component_type::<T>()?;
        Ok(self.entities.signature(entity)?.get(component_type))
    }

    /// Number of `T` instances the entity owns.
    pub fn component_count<T: Component>(&self, entity: Entity) -> EcsResult<usize> {
        Ok(self.components.storage::<T>()?.count(entity))
    }

    /// Every `T` value in the world with its owner.
    pub fn iter_components<T: Component>(&self) -> EcsResult<impl Iterator<Item = (Entity, &T)>> {
        Ok(self.components.storage::<T>()?.iter())
    }

    // Systems

    /// Registers `S`, runs its `init` hook and hands the instance back.
    ///
    /// If `init` fails the registration is rolled back.
    pub fn register_system<S: System + Default>(&mut self) -> EcsResult<S> {
        self.systems.register::<S>()?;
        let mut system = S::default();
        if let Err(err) = system.init(self) {
            self.systems.unregister::<S>();
            return Err(err);
        }
        Ok(system)
    }

    /// Sets the signature `S` requires and recomputes its membership from
    /// the current live entities.
    pub fn set_system_signature<S: System>(&mut self, signature: Signature) -> EcsResult<()> {
        self.systems.set_signature::<S>(signature)?;
        self.systems.rebuild::<S>(self.entities.living())
    }

    /// Builds a signature from component types and sets it for `S`.
    pub fn require<S: System>(&mut self, types: &[ComponentType]) -> EcsResult<()> {
        self.set_system_signature::<S>(types.iter().copied().collect())
    }

    pub fn system_entities<S: System>(&self) -> EcsResult<&BTreeSet<Entity>> {
        self.systems.entities::<S>()
    }

    pub fn is_system_registered<S: System>(&self) -> bool {
        self.systems.is_registered::<S>()
    }

    fn update_signature<T: Component>(&mut self, entity: Entity, present: bool) -> EcsResult<()> {
        let component_type = self.components.component_type::<T>()?;
        let mut signature = self.entities.signature(entity)?;
        signature.set(component_type, present);
        self.entities.set_signature(entity, signature)?;
        debug!(%entity, component_type, present, "signature changed");
        self.systems.entity_signature_changed(entity, signature);
        Ok(())
    }
}
