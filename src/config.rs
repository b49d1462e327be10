//! TOML configuration for the inference pipeline.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```toml
//! schema = "atomic"
//! threshold = 0.6
//!
//! [ollama]
//! model = "mistral"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::model::OllamaConfig;
use crate::relation::RelationSchema;
use crate::semantic::DEFAULT_DIMENSION;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Schema used when relation matching is off and when reading records.
    #[serde(default)]
    pub schema: RelationSchema,
    /// Minimum linker probability for a tail to survive context filtering.
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default = "default_true")]
    pub extract_heads: bool,
    #[serde(default = "default_true")]
    pub match_relations: bool,
    #[serde(default)]
    pub semantic: SemanticConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub linker: LinkerConfig,
}

/// Settings for the graph relation matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticConfig {
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkerConfig {
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

fn default_threshold() -> f32 {
    0.5
}
fn default_true() -> bool {
    true
}
fn default_dimension() -> usize {
    DEFAULT_DIMENSION
}
fn default_min_similarity() -> f32 {
    0.7
}
fn default_top_k() -> usize {
    3
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            schema: RelationSchema::default(),
            threshold: default_threshold(),
            extract_heads: true,
            match_relations: true,
            semantic: SemanticConfig::default(),
            ollama: OllamaConfig::default(),
            linker: LinkerConfig::default(),
        }
    }
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            min_similarity: default_min_similarity(),
            top_k: default_top_k(),
        }
    }
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
        }
    }
}

impl InferenceConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Write as pretty TOML.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: InferenceConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, InferenceConfig::default());
        assert_eq!(cfg.threshold, 0.5);
        assert_eq!(cfg.ollama.base_url, "http://localhost:11434");
        assert_eq!(cfg.semantic.top_k, 3);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: InferenceConfig = toml::from_str(
            r#"
            schema = "conceptnet"
            threshold = 0.8

            [ollama]
            model = "mistral"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.schema, RelationSchema::ConceptNet);
        assert_eq!(cfg.threshold, 0.8);
        assert_eq!(cfg.ollama.model, "mistral");
        assert_eq!(cfg.ollama.timeout_secs, 120);
        assert!(cfg.extract_heads);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cskg.toml");
        let mut cfg = InferenceConfig::default();
        cfg.match_relations = false;
        cfg.linker.dimension = 1024;
        cfg.save(&path).unwrap();
        assert_eq!(InferenceConfig::load(&path).unwrap(), cfg);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = InferenceConfig::load(Path::new("/nonexistent/cskg.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
