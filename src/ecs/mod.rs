//! Entity Component System (ECS) runtime
//!
//! Entities are recyclable IDs, components live in dense per-type stores that
//! allow several instances per entity, and systems keep a live set of the
//! entities whose signature covers theirs. All access goes through the
//! [`Coordinator`].

pub mod component;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod manager;
pub mod signature;
pub mod system;

pub use component::{Component, ComponentStorage, Disposable, TypedComponentStorage};
pub use coordinator::Coordinator;
pub use entity::{Entity, EntityId, EntityManager};
pub use error::{EcsError, EcsResult};
pub use manager::ComponentManager;
pub use signature::{ComponentType, Signature, MAX_COMPONENTS};
pub use system::{System, SystemRegistry};
