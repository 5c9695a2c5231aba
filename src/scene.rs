//! Scene description loaded from YAML and spawned into a coordinator

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::{
    components::{BufferLedger, Lifetime, MeshPart, Spin, Transform},
    ecs::{Coordinator, Entity},
};

#[derive(Debug, Clone, Deserialize)]
pub struct Scene {
    pub name: String,
    pub description: Option<String>,
    pub models: Vec<SceneModel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneModel {
    pub name: String,
    pub transform: Transform,
    /// Angular speed in radians per second
    #[serde(default)]
    pub spin: Option<f32>,
    /// Seconds until the model is destroyed
    #[serde(default)]
    pub lifetime: Option<f32>,
    #[serde(default)]
    pub parts: Vec<ScenePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenePart {
    pub mesh: String,
    pub index_count: u32,
}

pub struct SceneLoader {
    base_dir: PathBuf,
}

impl SceneLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scene> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scene file {}", path.display()))?;
        Scene::from_yaml(&data).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

impl Scene {
    pub fn from_yaml(data: &str) -> Result<Self> {
        let scene: Scene = serde_yaml::from_str(data)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.models.is_empty(), "scene '{}' has no models", self.name);
        for model in &self.models {
            if let Some(lifetime) = model.lifetime {
                ensure!(
                    lifetime > 0.0,
                    "model '{}' has a non-positive lifetime",
                    model.name
                );
            }
        }
        Ok(())
    }

    pub fn part_count(&self) -> usize {
        self.models.iter().map(|model| model.parts.len()).sum()
    }

    /// Creates one entity per model. A model with several parts owns one
    /// `MeshPart` and one `GpuBuffers` per part.
    pub fn spawn(
        &self,
        coordinator: &mut Coordinator,
        ledger: &Arc<BufferLedger>,
    ) -> Result<Vec<Entity>> {
        let mut spawned = Vec::with_capacity(self.models.len());
        for model in &self.models {
            let entity = coordinator
                .create_entity()
                .with_context(|| format!("Failed to create entity for model '{}'", model.name))?;

            if let Err(err) = Self::populate(model, entity, coordinator, ledger) {
                // Purge the half-built model so its buffers are released.
                coordinator.destroy_entity(entity)?;
                return Err(err.context(format!("Failed to spawn model '{}'", model.name)));
            }

            debug!(model = %model.name, %entity, parts = model.parts.len(), "model spawned");
            spawned.push(entity);
        }
        Ok(spawned)
    }

    fn populate(
        model: &SceneModel,
        entity: Entity,
        coordinator: &mut Coordinator,
        ledger: &Arc<BufferLedger>,
    ) -> Result<()> {
        for part in &model.parts {
            coordinator.add_component(
                entity,
                MeshPart {
                    mesh: part.mesh.clone(),
                    index_count: part.index_count,
                },
            )?;
            coordinator.add_component(entity, ledger.allocate())?;
        }
        coordinator.add_component(entity, model.transform)?;
        if let Some(radians_per_second) = model.spin {
            coordinator.add_component(entity, Spin { radians_per_second })?;
        }
        if let Some(remaining_seconds) = model.lifetime {
            coordinator.add_component(entity, Lifetime { remaining_seconds })?;
        }
        Ok(())
    }
}
