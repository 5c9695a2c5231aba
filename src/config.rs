//! Engine configuration loaded from YAML

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Main configuration for an engine run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub name: String,
    #[serde(default)]
    pub ecs: EcsConfig,
    #[serde(default)]
    pub frames: FrameConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EcsConfig {
    #[serde(default = "default_max_entities")]
    pub max_entities: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameConfig {
    #[serde(default = "default_frame_count")]
    pub count: u64,
    #[serde(default = "default_dt_seconds")]
    pub dt_seconds: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_max_entities() -> usize {
    5000
}

fn default_frame_count() -> u64 {
    120
}

fn default_dt_seconds() -> f32 {
    1.0 / 60.0
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            max_entities: default_max_entities(),
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            count: default_frame_count(),
            dt_seconds: default_dt_seconds(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "mini_engine".to_string(),
            ecs: EcsConfig::default(),
            frames: FrameConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: EngineConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.ecs.max_entities == 0 {
            bail!("ecs.max_entities must be greater than zero");
        }
        if u32::try_from(self.ecs.max_entities).is_err() {
            bail!("ecs.max_entities must fit in a 32-bit entity id");
        }
        if !(self.frames.dt_seconds > 0.0) {
            bail!("frames.dt_seconds must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();

        assert_eq!(config.ecs.max_entities, 5000);
        assert_eq!(config.frames.count, 120);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "name: tiny\necs:\n  max_entities: 16\n";
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.name, "tiny");
        assert_eq!(config.ecs.max_entities, 16);
        assert_eq!(config.frames.dt_seconds, default_dt_seconds());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = EngineConfig::default();
        config.ecs.max_entities = 64;

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("engine.yaml");
        config.to_yaml(&path).unwrap();

        let loaded = EngineConfig::from_yaml(&path).unwrap();
        assert_eq!(loaded.name, config.name);
        assert_eq!(loaded.ecs.max_entities, 64);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.ecs.max_entities = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.frames.dt_seconds = 0.0;
        assert!(config.validate().is_err());
    }
}
