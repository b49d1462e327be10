//! Generation model adapter contract.
//!
//! A [`KnowledgeModel`] fills in tails: it takes a graph whose tuples have
//! no tails and returns a graph with generated tails. Batching, decoding,
//! and transport are the adapter's business; the orchestrator treats
//! `generate` as one blocking call and propagates its errors unchanged.

pub mod ollama;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::graph::KnowledgeGraph;

pub use ollama::{OllamaConfig, OllamaZeroshot};

/// Decoding options. Unset fields fall back to the model's own defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    pub num_beams: Option<usize>,
    pub num_return_sequences: Option<usize>,
    pub max_length: Option<usize>,
    pub min_length: Option<usize>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<usize>,
    pub repetition_penalty: Option<f32>,
    pub do_sample: Option<bool>,
    pub seed: Option<u64>,
    pub batch_size: Option<usize>,
    /// Backend-specific options passed through verbatim.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl GenerateOptions {
    /// Fill every unset field from `defaults`.
    pub fn with_defaults(&self, defaults: &GenerateOptions) -> GenerateOptions {
        let mut extra = defaults.extra.clone();
        extra.extend(self.extra.clone());
        GenerateOptions {
            num_beams: self.num_beams.or(defaults.num_beams),
            num_return_sequences: self.num_return_sequences.or(defaults.num_return_sequences),
            max_length: self.max_length.or(defaults.max_length),
            min_length: self.min_length.or(defaults.min_length),
            temperature: self.temperature.or(defaults.temperature),
            top_p: self.top_p.or(defaults.top_p),
            top_k: self.top_k.or(defaults.top_k),
            repetition_penalty: self.repetition_penalty.or(defaults.repetition_penalty),
            do_sample: self.do_sample.or(defaults.do_sample),
            seed: self.seed.or(defaults.seed),
            batch_size: self.batch_size.or(defaults.batch_size),
            extra,
        }
    }
}

/// Fine-tuning options for trainable models.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainOptions {
    pub learning_rate: f32,
    pub epochs: usize,
    pub batch_size: usize,
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            learning_rate: 1e-5,
            epochs: 3,
            batch_size: 32,
            seed: 42,
        }
    }
}

/// A text-to-tail generator.
pub trait KnowledgeModel: Send + Sync {
    fn name(&self) -> &str;

    /// Generate tails for the tuples of `graph`.
    fn generate(
        &self,
        graph: &KnowledgeGraph,
        options: &GenerateOptions,
    ) -> ModelResult<KnowledgeGraph>;

    /// Fine-tune on a training graph. Zero-shot models refuse.
    fn train(
        &mut self,
        _train_graph: &KnowledgeGraph,
        _val_graph: Option<&KnowledgeGraph>,
        _options: &TrainOptions,
    ) -> ModelResult<()> {
        Err(ModelError::NotTrainable {
            model: self.name().to_string(),
        })
    }

    /// Persist enough state to reload the model from `dir`.
    fn save_pretrained(&self, dir: &Path) -> ModelResult<()>;

    /// Whether the model relies on in-prompt examples instead of training.
    fn is_zeroshot(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_options_win_over_defaults() {
        let caller = GenerateOptions {
            top_k: Some(5),
            ..Default::default()
        };
        let defaults = GenerateOptions {
            top_k: Some(1),
            temperature: Some(0.7),
            ..Default::default()
        };
        let merged = caller.with_defaults(&defaults);
        assert_eq!(merged.top_k, Some(5));
        assert_eq!(merged.temperature, Some(0.7));
        assert_eq!(merged.max_length, None);
    }

    #[test]
    fn options_parse_from_partial_json() {
        let opts: GenerateOptions =
            serde_json::from_str(r#"{"num_beams": 5, "extra": {"stop": ["\n"]}}"#).unwrap();
        assert_eq!(opts.num_beams, Some(5));
        assert!(opts.extra.contains_key("stop"));
    }
}
