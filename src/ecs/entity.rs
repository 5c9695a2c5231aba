//! Entity management

use std::collections::VecDeque;
use std::fmt;

use tracing::debug;

use super::{EcsError, EcsResult, Signature};

/// Entity ID type - plain index into signature and component tables
pub type EntityId = u32;

/// Opaque, recyclable entity handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(EntityId);

impl Entity {
    pub const fn from_raw(id: EntityId) -> Self {
        Self(id)
    }

    pub const fn id(self) -> EntityId {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues and recycles entity IDs and owns each entity's signature
pub struct EntityManager {
    available: VecDeque<Entity>,
    signatures: Vec<Signature>,
    alive: Vec<bool>,
    living_count: usize,
}

impl EntityManager {
    pub fn new(max_entities: usize) -> Self {
        let max_id = EntityId::try_from(max_entities).unwrap_or(EntityId::MAX);
        Self {
            available: (0..max_id).map(Entity).collect(),
            signatures: vec![Signature::EMPTY; max_entities],
            alive: vec![false; max_entities],
            living_count: 0,
        }
    }

    pub fn max_entities(&self) -> usize {
        self.signatures.len()
    }

    pub fn create_entity(&mut self) -> EcsResult<Entity> {
        let entity = self
            .available
            .pop_front()
            .ok_or(EcsError::CapacityExceeded {
                max: self.max_entities(),
            })?;
        self.alive[entity.index()] = true;
        self.living_count += 1;
        debug!(%entity, living = self.living_count, "entity created");
        Ok(entity)
    }

    /// Clears the entity's signature and hands its ID back to the free queue.
    pub fn destroy_entity(&mut self, entity: Entity) -> EcsResult<()> {
        self.check_range(entity)?;
        if !self.alive[entity.index()] {
            return Err(EcsError::EntityNotAlive(entity));
        }

        self.signatures[entity.index()].set_all(false);
        self.alive[entity.index()] = false;
        self.available.push_back(entity);
        self.living_count -= 1;
        debug!(%entity, living = self.living_count, "entity destroyed");
        Ok(())
    }

    pub fn signature(&self, entity: Entity) -> EcsResult<Signature> {
        self.check_range(entity)?;
        Ok(self.signatures[entity.index()])
    }

    pub fn set_signature(&mut self, entity: Entity, signature: Signature) -> EcsResult<()> {
        self.check_range(entity)?;
        self.signatures[entity.index()] = signature;
        Ok(())
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alive.get(entity.index()).copied().unwrap_or(false)
    }

    pub fn living_count(&self) -> usize {
        self.living_count
    }

    /// Live entities with their current signatures, in ID order.
    pub fn living(&self) -> impl Iterator<Item = (Entity, Signature)> + '_ {
        self.alive
            .iter()
            .zip(&self.signatures)
            .enumerate()
            .filter(|(_, (alive, _))| **alive)
            .map(|(id, (_, signature))| (Entity(id as EntityId), *signature))
    }

    fn check_range(&self, entity: Entity) -> EcsResult<()> {
        if entity.index() >= self.max_entities() {
            return Err(EcsError::OutOfRange {
                entity,
                max: self.max_entities(),
            });
        }
        Ok(())
    }
}
