//! Frame loop - runs an update pass then a read-only render pass per frame

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info_span};

use crate::config::EngineConfig;
use crate::ecs::Coordinator;

/// A unit of per-frame work driven by the engine.
pub trait Stage {
    fn name(&self) -> &str;

    fn update(&mut self, coordinator: &mut Coordinator, dt: f32) -> Result<()>;

    fn render(&mut self, _coordinator: &Coordinator) -> Result<()> {
        Ok(())
    }
}

/// Statistics for a single frame
#[derive(Debug, Clone)]
pub struct FrameStats {
    pub frame: u64,
    pub duration: Duration,
    pub stage_times: Vec<(String, Duration)>,
    pub living_entities: usize,
}

pub struct EngineBuilder {
    config: EngineConfig,
    coordinator: Option<Coordinator>,
    stages: Vec<Box<dyn Stage>>,
}

impl EngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            coordinator: None,
            stages: Vec::new(),
        }
    }

    /// Use an already populated coordinator instead of an empty one.
    pub fn with_coordinator(mut self, coordinator: Coordinator) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    pub fn with_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn build(self) -> Engine {
        let coordinator = self
            .coordinator
            .unwrap_or_else(|| Coordinator::new(&self.config.ecs));
        Engine {
            coordinator,
            stages: self.stages,
            frame: 0,
            stats_history: VecDeque::new(),
            max_stats_history: 100,
            config: self.config,
        }
    }
}

pub struct Engine {
    coordinator: Coordinator,
    stages: Vec<Box<dyn Stage>>,
    frame: u64,
    stats_history: VecDeque<FrameStats>,
    max_stats_history: usize,
    config: EngineConfig,
}

impl Engine {
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut Coordinator {
        &mut self.coordinator
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Execute one frame
    pub fn frame(&mut self, dt: f32) -> Result<FrameStats> {
        let frame_start = Instant::now();
        let frame_number = self.frame + 1;
        let _span = info_span!("frame", frame = frame_number).entered();
        let mut stage_times = Vec::with_capacity(self.stages.len());

        for stage in &mut self.stages {
            let stage_start = Instant::now();
            stage
                .update(&mut self.coordinator, dt)
                .with_context(|| format!("stage '{}' failed to update", stage.name()))?;
            stage_times.push((stage.name().to_string(), stage_start.elapsed()));
        }

        for (stage, (_, elapsed)) in self.stages.iter_mut().zip(stage_times.iter_mut()) {
            let stage_start = Instant::now();
            stage
                .render(&self.coordinator)
                .with_context(|| format!("stage '{}' failed to render", stage.name()))?;
            *elapsed += stage_start.elapsed();
        }

        self.frame = frame_number;
        let stats = FrameStats {
            frame: frame_number,
            duration: frame_start.elapsed(),
            stage_times,
            living_entities: self.coordinator.living_count(),
        };
        debug!(
            living = stats.living_entities,
            micros = stats.duration.as_micros() as u64,
            "frame finished"
        );

        self.stats_history.push_back(stats.clone());
        if self.stats_history.len() > self.max_stats_history {
            self.stats_history.pop_front();
        }
        Ok(stats)
    }

    /// Run a number of frames with a fixed timestep
    pub fn run(&mut self, frames: u64, dt: f32) -> Result<()> {
        self.run_with_hook(frames, dt, |_| {})
    }

    pub fn run_with_hook<F>(&mut self, frames: u64, dt: f32, mut hook: F) -> Result<()>
    where
        F: FnMut(&FrameStats),
    {
        for _ in 0..frames {
            let stats = self.frame(dt)?;
            hook(&stats);
        }
        Ok(())
    }

    /// Get recent frame statistics
    pub fn recent_stats(&self) -> impl Iterator<Item = &FrameStats> {
        self.stats_history.iter()
    }

    /// Get average frame time from recent history
    pub fn average_frame_time(&self) -> Option<Duration> {
        if self.stats_history.is_empty() {
            return None;
        }

        let total: Duration = self.stats_history.iter().map(|s| s.duration).sum();
        Some(total / self.stats_history.len() as u32)
    }
}
