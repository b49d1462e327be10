//! Default linker: hypervector similarity between facts and context sentences.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Context, KnowledgeLinker};
use crate::error::{LinkerError, LinkerResult};
use crate::graph::KnowledgeGraph;
use crate::nlp::{LanguagePipeline, RuleBasedPipeline};
use crate::semantic::{DEFAULT_DIMENSION, HyperVec, SemanticEncoder};

const CONFIG_FILE: &str = "linker.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticLinkerConfig {
    pub dimension: usize,
}

impl Default for SemanticLinkerConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
        }
    }
}

/// Scores `"{head} {phrase} {tail}"` against each context sentence and
/// keeps the best match, rescaled from the `[0.5, 1]` similarity band of
/// related vectors to `[0, 1]`.
pub struct SemanticLinker {
    config: SemanticLinkerConfig,
    encoder: SemanticEncoder,
    nlp: Arc<dyn LanguagePipeline>,
}

impl std::fmt::Debug for SemanticLinker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticLinker")
            .field("config", &self.config)
            .field("pipeline", &self.nlp.name())
            .finish()
    }
}

impl SemanticLinker {
    pub fn new(config: SemanticLinkerConfig, nlp: Arc<dyn LanguagePipeline>) -> LinkerResult<Self> {
        if config.dimension == 0 {
            return Err(LinkerError::InvalidConfig {
                message: "dimension must be greater than zero".into(),
            });
        }
        Ok(Self {
            encoder: SemanticEncoder::new(config.dimension),
            config,
            nlp,
        })
    }

    /// Linker with default settings and the built-in English pipeline.
    pub fn with_defaults() -> Self {
        Self {
            config: SemanticLinkerConfig::default(),
            encoder: SemanticEncoder::default(),
            nlp: Arc::new(RuleBasedPipeline),
        }
    }

    /// Load from a directory written by `save_pretrained`.
    pub fn from_pretrained(path: impl AsRef<Path>, nlp: Arc<dyn LanguagePipeline>) -> LinkerResult<Self> {
        let path: PathBuf = path.as_ref().join(CONFIG_FILE);
        let text = std::fs::read_to_string(&path).map_err(|e| LinkerError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: SemanticLinkerConfig =
            toml::from_str(&text).map_err(|e| LinkerError::Serialize {
                message: e.to_string(),
            })?;
        Self::new(config, nlp)
    }

    pub fn config(&self) -> &SemanticLinkerConfig {
        &self.config
    }

    fn rescale(similarity: f32) -> f32 {
        ((similarity - 0.5) / 0.5).clamp(0.0, 1.0)
    }
}

impl KnowledgeLinker for SemanticLinker {
    fn name(&self) -> &str {
        "semantic_linker"
    }

    fn link(&self, graph: &KnowledgeGraph, context: &Context) -> LinkerResult<Vec<Vec<f32>>> {
        let sentences: Vec<HyperVec> = context
            .sentences(self.nlp.as_ref())
            .iter()
            .filter_map(|s| self.encoder.encode_text(s))
            .collect();

        let mut probs = Vec::with_capacity(graph.len());
        for knowledge in graph {
            let mut row = Vec::with_capacity(knowledge.tails.len());
            for tail in &knowledge.tails {
                let fact = knowledge
                    .relation
                    .verbalize(knowledge.head.text(), Some(tail))?;
                let score = self
                    .encoder
                    .encode_text(&fact)
                    .map(|fact_vec| {
                        sentences
                            .iter()
                            .map(|s| Self::rescale(fact_vec.similarity(s)))
                            .fold(0.0_f32, f32::max)
                    })
                    .unwrap_or(0.0);
                row.push(score);
            }
            probs.push(row);
        }
        Ok(probs)
    }

    fn save_pretrained(&self, dir: &Path) -> LinkerResult<()> {
        std::fs::create_dir_all(dir).map_err(|e| LinkerError::Io {
            path: dir.display().to_string(),
            source: e,
        })?;
        let text = toml::to_string_pretty(&self.config).map_err(|e| LinkerError::Serialize {
            message: e.to_string(),
        })?;
        let path = dir.join(CONFIG_FILE);
        std::fs::write(&path, text).map_err(|e| LinkerError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }
}
