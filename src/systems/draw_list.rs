use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{ensure, Result};

use crate::{
    components::{GpuBuffers, MeshPart, Transform},
    ecs::{Coordinator, EcsResult, Entity, System},
    engine::Stage,
};

/// One mesh part ready to be submitted
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub entity: Entity,
    pub mesh: String,
    pub buffers: u32,
    pub index_count: u32,
    pub transform: Transform,
}

#[derive(Debug, Clone, Default)]
pub struct DrawReport {
    pub frames: u64,
    pub commands: Vec<DrawCommand>,
    pub total_indices: u64,
}

/// Collects a draw list from every model during the render pass.
///
/// Mesh parts and buffers are paired by slot: a model's i-th `MeshPart`
/// is drawn with its i-th `GpuBuffers`.
#[derive(Default)]
pub struct DrawListSystem {
    report: Rc<RefCell<DrawReport>>,
}

impl DrawListSystem {
    pub fn report(&self) -> Rc<RefCell<DrawReport>> {
        Rc::clone(&self.report)
    }
}

impl System for DrawListSystem {
    fn init(&mut self, coordinator: &mut Coordinator) -> EcsResult<()> {
        let transform = coordinator.component_type::<Transform>()?;
        let mesh = coordinator.component_type::<MeshPart>()?;
        let buffers = coordinator.component_type::<GpuBuffers>()?;
        coordinator.require::<Self>(&[transform, mesh, buffers])
    }
}

impl Stage for DrawListSystem {
    fn name(&self) -> &str {
        "draw_list"
    }

    fn update(&mut self, _coordinator: &mut Coordinator, _dt: f32) -> Result<()> {
        Ok(())
    }

    fn render(&mut self, coordinator: &Coordinator) -> Result<()> {
        let mut commands = Vec::new();
        for &entity in coordinator.system_entities::<Self>()? {
            let transform = *coordinator.get_component::<Transform>(entity, 0)?;
            let parts = coordinator.get_components::<MeshPart>(entity)?;
            let buffers = coordinator.get_components::<GpuBuffers>(entity)?;
            ensure!(
                parts.len() == buffers.len(),
                "entity {entity} has {} mesh parts but {} buffers",
                parts.len(),
                buffers.len()
            );

            for (part, buffers) in parts.into_iter().zip(buffers) {
                commands.push(DrawCommand {
                    entity,
                    mesh: part.mesh.clone(),
                    buffers: buffers.handle(),
                    index_count: part.index_count,
                    transform,
                });
            }
        }

        let mut report = self.report.borrow_mut();
        report.frames += 1;
        report.total_indices = commands.iter().map(|c| u64::from(c.index_count)).sum();
        report.commands = commands;
        Ok(())
    }
}
