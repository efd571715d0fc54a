use serde::{Deserialize, Serialize};
use soundscape_stream::{GridConfig, StreamBudget};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("serialization error: {0}")]
    Serialize(String),
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

enum Format {
    Yaml,
    Json,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Engine tunables. Every field has a default, so partial files are fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Chunk edge length in world units.
    pub grid_size: f32,
    /// Chebyshev radius, in chunks, of the streamed neighbourhood.
    pub render_distance: i32,
    pub default_grid_color: String,
    pub stream_load_budget: usize,
    pub stream_unload_budget: usize,
    pub default_effect_radius: f64,
    /// Seed for mobile-object random seeds. Unset means a fresh seed per run.
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_size: 20.0,
            render_distance: 1,
            default_grid_color: "#444444".to_string(),
            stream_load_budget: 8,
            stream_unload_budget: 8,
            default_effect_radius: 3.0,
            rng_seed: None,
        }
    }
}

impl EngineConfig {
    /// Load from a `.yaml`/`.yml` or `.json` file and validate.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = Format::of(path)?;
        let contents = std::fs::read_to_string(path)?;
        let config: Self = match format {
            Format::Yaml => {
                serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
            Format::Json => {
                serde_json::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
        };
        config.validate()?;
        tracing::info!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match Format::of(path)? {
            Format::Yaml => self.to_yaml()?,
            Format::Json => serde_json::to_string_pretty(self)
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "grid_size must be positive, got {}",
                self.grid_size
            )));
        }
        if self.render_distance < 0 {
            return Err(ConfigError::Invalid(format!(
                "render_distance must not be negative, got {}",
                self.render_distance
            )));
        }
        if !(self.default_effect_radius.is_finite() && self.default_effect_radius > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "default_effect_radius must be positive, got {}",
                self.default_effect_radius
            )));
        }
        Ok(())
    }

    pub fn grid_config(&self) -> GridConfig {
        GridConfig {
            grid_size: self.grid_size,
            render_distance: self.render_distance,
            default_color: self.default_grid_color.clone(),
        }
    }

    pub fn stream_budget(&self) -> StreamBudget {
        StreamBudget {
            load: self.stream_load_budget,
            unload: self.stream_unload_budget,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_with(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let file = temp_with(".yaml", "grid_size: 10.0\nrng_seed: 7\n");
        let config = EngineConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.grid_size, 10.0);
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.render_distance, 1);
        assert_eq!(config.default_grid_color, "#444444");
    }

    #[test]
    fn json_is_accepted() {
        let file = temp_with(".json", r#"{"render_distance": 3, "stream_load_budget": 2}"#);
        let config = EngineConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.render_distance, 3);
        assert_eq!(config.stream_budget().load, 2);
        assert_eq!(config.grid_config().render_distance, 3);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = temp_with(".toml", "grid_size = 1.0");
        assert!(matches!(
            EngineConfig::load_from_file(file.path()),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let file = temp_with(".yml", "grid_size: -4.0\n");
        assert!(matches!(
            EngineConfig::load_from_file(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let file = temp_with(".json", "{ nope");
        assert!(matches!(
            EngineConfig::load_from_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn save_then_load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.yaml");
        let config = EngineConfig {
            grid_size: 32.0,
            rng_seed: Some(11),
            ..EngineConfig::default()
        };
        config.save_to_file(&path).unwrap();
        assert_eq!(EngineConfig::load_from_file(&path).unwrap(), config);
    }
}
