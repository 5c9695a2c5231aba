//! Wires the demo scene, its systems and the frame loop together

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::{
    components::{self, BufferLedger},
    config::EngineConfig,
    ecs::{Coordinator, Entity},
    engine::{Engine, EngineBuilder},
    scene::Scene,
    systems::{DrawListSystem, DrawReport, LifetimeSystem, SpinSystem},
};

pub struct Demo {
    scene_name: String,
    engine: Engine,
    ledger: Arc<BufferLedger>,
    draw_report: Rc<RefCell<DrawReport>>,
    spawned: Vec<Entity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub scene: String,
    pub frames: u64,
    pub living_entities: usize,
    pub draw_calls: usize,
    pub total_indices: u64,
    pub buffers_allocated: usize,
    pub buffers_released: usize,
    pub average_frame_micros: Option<u64>,
    pub finished_at: DateTime<Utc>,
}

impl Demo {
    pub fn build(config: EngineConfig, scene: &Scene) -> Result<Self> {
        let mut coordinator = Coordinator::new(&config.ecs);
        components::register_all(&mut coordinator).context("Failed to register components")?;

        let lifetime = coordinator.register_system::<LifetimeSystem>()?;
        let spin = coordinator.register_system::<SpinSystem>()?;
        let draw_list = coordinator.register_system::<DrawListSystem>()?;
        let draw_report = draw_list.report();

        let ledger = BufferLedger::new();
        let spawned = scene
            .spawn(&mut coordinator, &ledger)
            .with_context(|| format!("Failed to spawn scene '{}'", scene.name))?;
        info!(
            scene = %scene.name,
            models = spawned.len(),
            parts = scene.part_count(),
            "scene spawned"
        );

        let engine = EngineBuilder::new(config)
            .with_coordinator(coordinator)
            .with_stage(lifetime)
            .with_stage(spin)
            .with_stage(draw_list)
            .build();

        Ok(Self {
            scene_name: scene.name.clone(),
            engine,
            ledger,
            draw_report,
            spawned,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn ledger(&self) -> &Arc<BufferLedger> {
        &self.ledger
    }

    pub fn draw_report(&self) -> DrawReport {
        self.draw_report.borrow().clone()
    }

    pub fn run(&mut self, frames: u64, dt: f32) -> Result<RunSummary> {
        self.engine.run(frames, dt)?;
        Ok(self.summary())
    }

    /// Destroys every spawned entity still alive, releasing its buffers.
    pub fn shutdown(&mut self) -> Result<()> {
        let coordinator = self.engine.coordinator_mut();
        for &entity in &self.spawned {
            if coordinator.is_alive(entity) {
                coordinator.destroy_entity(entity)?;
            }
        }
        info!(
            released = self.ledger.released(),
            live = self.ledger.live(),
            "scene torn down"
        );
        Ok(())
    }

    pub fn summary(&self) -> RunSummary {
        let report = self.draw_report.borrow();
        RunSummary {
            scene: self.scene_name.clone(),
            frames: self.engine.frame_count(),
            living_entities: self.engine.coordinator().living_count(),
            draw_calls: report.commands.len(),
            total_indices: report.total_indices,
            buffers_allocated: self.ledger.allocated(),
            buffers_released: self.ledger.released(),
            average_frame_micros: self
                .engine
                .average_frame_time()
                .map(|time| time.as_micros() as u64),
            finished_at: Utc::now(),
        }
    }
}
