pub mod components;
pub mod config;
pub mod demo;
pub mod ecs;
pub mod engine;
pub mod scene;
pub mod systems;

pub use config::EngineConfig;
pub use ecs::{Coordinator, EcsError, Entity, Signature};
pub use engine::{Engine, EngineBuilder, FrameStats, Stage};
