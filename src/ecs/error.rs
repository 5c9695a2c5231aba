//! Error type shared by every ECS operation

use thiserror::Error;

use super::Entity;

pub type EcsResult<T> = Result<T, EcsError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    #[error("too many entities in existence (max {max})")]
    CapacityExceeded { max: usize },

    #[error("entity {entity} out of range (max {max})")]
    OutOfRange { entity: Entity, max: usize },

    #[error("entity {entity} is not valid for a store of capacity {max}")]
    InvalidEntity { entity: Entity, max: usize },

    #[error("entity {0} is not alive")]
    EntityNotAlive(Entity),

    #[error("{0} registered more than once")]
    DuplicateRegistration(&'static str),

    #[error("component {0} not registered before use")]
    UnregisteredType(&'static str),

    #[error("system {0} used before registered")]
    SystemNotRegistered(&'static str),

    #[error("cannot register {name}: all {max} component slots are taken")]
    TooManyComponentTypes { name: &'static str, max: usize },

    #[error("entity {entity} has no {component} component")]
    NotFound {
        entity: Entity,
        component: &'static str,
    },

    #[error("{component} store is full ({capacity} slots)")]
    StoreFull {
        component: &'static str,
        capacity: usize,
    },

    #[error("entity {entity} owns {expected} {component} slots, got {actual} values")]
    LengthMismatch {
        entity: Entity,
        component: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("entity {entity} has {len} {component} slots, index {index} requested")]
    SlotOutOfRange {
        entity: Entity,
        component: &'static str,
        index: usize,
        len: usize,
    },
}
