//! System registration and live membership tracking

use std::any::{type_name, TypeId};
use std::collections::{BTreeSet, HashMap};

use tracing::{debug, trace};

use super::{Coordinator, EcsError, EcsResult, Entity, Signature};

/// A unit of logic acting on every entity whose signature covers its own.
///
/// `init` runs once, right after registration, and is where a system
/// declares its signature (and may register systems it depends on).
pub trait System: 'static {
    fn init(&mut self, _coordinator: &mut Coordinator) -> EcsResult<()> {
        Ok(())
    }
}

#[derive(Debug)]
struct SystemRecord {
    name: &'static str,
    signature: Option<Signature>,
    entities: BTreeSet<Entity>,
}

impl SystemRecord {
    fn matches(&self, entity_signature: Signature) -> bool {
        self.signature
            .map_or(false, |required| Signature::is_subset(required, entity_signature))
    }

    fn update(&mut self, entity: Entity, entity_signature: Signature) {
        if self.matches(entity_signature) {
            if self.entities.insert(entity) {
                trace!(system = self.name, %entity, "entity joined system");
            }
        } else if self.entities.remove(&entity) {
            trace!(system = self.name, %entity, "entity left system");
        }
    }
}

/// Required signatures and matching entity sets, keyed by system type
#[derive(Default)]
pub struct SystemRegistry {
    systems: HashMap<TypeId, SystemRecord>,
}

impl SystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: System>(&mut self) -> EcsResult<()> {
        let name = type_name::<S>();
        if self.is_registered::<S>() {
            return Err(EcsError::DuplicateRegistration(name));
        }
        self.systems.insert(
            TypeId::of::<S>(),
            SystemRecord {
                name,
                signature: None,
                entities: BTreeSet::new(),
            },
        );
        debug!(system = name, "system registered");
        Ok(())
    }

    pub(crate) fn unregister<S: System>(&mut self) {
        self.systems.remove(&TypeId::of::<S>());
    }

    pub fn is_registered<S: System>(&self) -> bool {
        self.systems.contains_key(&TypeId::of::<S>())
    }

    pub fn set_signature<S: System>(&mut self, signature: Signature) -> EcsResult<()> {
        let record = self.record_mut::<S>()?;
        record.signature = Some(signature);
        debug!(system = record.name, ?signature, "system signature set");
        Ok(())
    }

    pub fn signature<S: System>(&self) -> EcsResult<Option<Signature>> {
        Ok(self.record::<S>()?.signature)
    }

    /// Recomputes one system's membership from scratch.
    pub fn rebuild<S: System>(
        &mut self,
        living: impl IntoIterator<Item = (Entity, Signature)>,
    ) -> EcsResult<()> {
        let record = self.record_mut::<S>()?;
        let members: BTreeSet<Entity> = living
            .into_iter()
            .filter(|(_, signature)| record.matches(*signature))
            .map(|(entity, _)| entity)
            .collect();
        record.entities = members;
        Ok(())
    }

    pub fn entities<S: System>(&self) -> EcsResult<&BTreeSet<Entity>> {
        Ok(&self.record::<S>()?.entities)
    }

    pub fn entity_destroyed(&mut self, entity: Entity) {
        for record in self.systems.values_mut() {
            record.entities.remove(&entity);
        }
    }

    pub fn entity_signature_changed(&mut self, entity: Entity, signature: Signature) {
        for record in self.systems.values_mut() {
            record.update(entity, signature);
        }
    }

    fn record<S: System>(&self) -> EcsResult<&SystemRecord> {
        self.systems
            .get(&TypeId::of::<S>())
            .ok_or(EcsError::SystemNotRegistered(type_name::<S>()))
    }

    fn record_mut<S: System>(&mut self) -> EcsResult<&mut SystemRecord> {
        self.systems
            .get_mut(&TypeId::of::<S>())
            .ok_or(EcsError::SystemNotRegistered(type_name::<S>()))
    }
}
