use anyhow::Result;
use tracing::debug;

use crate::{
    components::Lifetime,
    ecs::{Coordinator, EcsResult, Entity, System},
    engine::Stage,
};

/// Counts down `Lifetime` and destroys entities whose time ran out
#[derive(Default)]
pub struct LifetimeSystem {
    expired: u64,
}

impl LifetimeSystem {
    pub fn expired(&self) -> u64 {
        self.expired
    }
}

impl System for LifetimeSystem {
    fn init(&mut self, coordinator: &mut Coordinator) -> EcsResult<()> {
        let lifetime = coordinator.component_type::<Lifetime>()?;
        coordinator.require::<Self>(&[lifetime])
    }
}

impl Stage for LifetimeSystem {
    fn name(&self) -> &str {
        "lifetime"
    }

    fn update(&mut self, coordinator: &mut Coordinator, dt: f32) -> Result<()> {
        let entities: Vec<Entity> = coordinator
            .system_entities::<Self>()?
            .iter()
            .copied()
            .collect();

        let mut expired = Vec::new();
        for entity in entities {
            let lifetime = coordinator.get_component_mut::<Lifetime>(entity, 0)?;
            lifetime.remaining_seconds -= dt;
            if lifetime.remaining_seconds <= 0.0 {
                expired.push(entity);
            }
        }

        for entity in expired {
            coordinator.destroy_entity(entity)?;
            self.expired += 1;
            debug!(%entity, "lifetime expired");
        }
        Ok(())
    }
}
