use anyhow::Result;

use crate::{
    components::{Spin, Transform},
    ecs::{Coordinator, EcsResult, Entity, System},
    engine::Stage,
};

/// Turns every transform of an entity that also has a `Spin`
#[derive(Default)]
pub struct SpinSystem;

impl System for SpinSystem {
    fn init(&mut self, coordinator: &mut Coordinator) -> EcsResult<()> {
        let transform = coordinator.component_type::<Transform>()?;
        let spin = coordinator.component_type::<Spin>()?;
        coordinator.require::<Self>(&[transform, spin])
    }
}

impl Stage for SpinSystem {
    fn name(&self) -> &str {
        "spin"
    }

    fn update(&mut self, coordinator: &mut Coordinator, dt: f32) -> Result<()> {
        let entities: Vec<Entity> = coordinator
            .system_entities::<Self>()?
            .iter()
            .copied()
            .collect();
        for entity in entities {
            let speed = coordinator.get_component::<Spin>(entity, 0)?.radians_per_second;
            for slot in 0..coordinator.component_count::<Transform>(entity)? {
                let transform = coordinator.get_component_mut::<Transform>(entity, slot)?;
                transform.yaw = (transform.yaw + speed * dt).rem_euclid(std::f32::consts::TAU);
            }
        }
        Ok(())
    }
}
