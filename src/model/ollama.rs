//! Zero-shot tail generation through an Ollama server.
//!
//! Tuples that already have tails (for example a sample graph merged into
//! the input) serve as in-prompt examples; tuples without tails are the
//! targets. For each target the prompt lists up to `max_examples`
//! verbalized examples sharing its relation, then the target's own
//! verbalization left open for completion.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{GenerateOptions, KnowledgeModel};
use crate::error::{ModelError, ModelResult};
use crate::graph::{Knowledge, KnowledgeGraph};

const CONFIG_FILE: &str = "ollama.toml";

/// Connection and prompting settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL for the Ollama API.
    pub base_url: String,
    /// Model name to use.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Examples included per prompt.
    pub max_examples: usize,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            model: "llama3.2".into(),
            timeout_secs: 120,
            max_examples: 5,
        }
    }
}

/// Few-shot generator backed by `/api/generate`.
#[derive(Debug, Clone)]
pub struct OllamaZeroshot {
    config: OllamaConfig,
}

impl OllamaZeroshot {
    pub fn new(config: OllamaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Load from a directory written by `save_pretrained`, or treat the
    /// argument as a model name with default connection settings.
    pub fn from_pretrained(model_name_or_path: &str) -> ModelResult<Self> {
        let path = PathBuf::from(model_name_or_path).join(CONFIG_FILE);
        if path.is_file() {
            let text = std::fs::read_to_string(&path).map_err(|e| ModelError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
            let config: OllamaConfig =
                toml::from_str(&text).map_err(|e| ModelError::Serialize {
                    message: e.to_string(),
                })?;
            return Ok(Self::new(config));
        }
        Ok(Self::new(OllamaConfig {
            model: model_name_or_path.to_string(),
            ..OllamaConfig::default()
        }))
    }

    /// Defaults applied to unset generation options.
    pub fn default_options() -> GenerateOptions {
        GenerateOptions {
            top_k: Some(1),
            top_p: Some(0.9),
            num_return_sequences: Some(3),
            num_beams: Some(3),
            temperature: Some(0.7),
            repetition_penalty: Some(1.2),
            max_length: Some(32),
            do_sample: Some(true),
            seed: Some(42),
            ..GenerateOptions::default()
        }
    }

    /// Few-shot prompt for `target`, one example per line.
    pub fn build_prompt(&self, target: &Knowledge, examples: &[&Knowledge]) -> String {
        let mut lines: Vec<String> = examples
            .iter()
            .filter(|e| e.relation == target.relation)
            .filter_map(|e| e.to_prompt(true).ok())
            .take(self.config.max_examples)
            .collect();
        let open = target
            .to_prompt(false)
            .unwrap_or_else(|_| format!("{} {}", target.head, target.relation));
        lines.push(open);
        lines.join("\n")
    }

    fn complete(
        &self,
        agent: &ureq::Agent,
        prompt: &str,
        options: &GenerateOptions,
        seed: u64,
    ) -> ModelResult<String> {
        let url = format!("{}/api/generate", self.config.base_url);

        let mut model_options = serde_json::json!({
            "seed": seed,
            "num_predict": options.max_length,
            "temperature": options.temperature,
            "top_k": options.top_k,
            "top_p": options.top_p,
            "repeat_penalty": options.repetition_penalty,
        });
        for (key, value) in &options.extra {
            model_options[key] = value.clone();
        }
        if let Some(map) = model_options.as_object_mut() {
            map.retain(|_, v| !v.is_null());
        }
        let body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "raw": true,
            "options": model_options,
        });

        let body_str = serde_json::to_string(&body).map_err(|e| ModelError::RequestFailed {
            message: format!("JSON serialize error: {e}"),
        })?;

        let resp = agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&body_str)
            .map_err(|e| match e {
                ureq::Error::Transport(_) => ModelError::Unavailable {
                    url: self.config.base_url.clone(),
                },
                other => ModelError::RequestFailed {
                    message: other.to_string(),
                },
            })?;

        let resp_str = resp.into_string().map_err(|e| ModelError::ParseError {
            message: e.to_string(),
        })?;
        let json: serde_json::Value =
            serde_json::from_str(&resp_str).map_err(|e| ModelError::ParseError {
                message: e.to_string(),
            })?;

        json["response"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| ModelError::ParseError {
                message: "missing 'response' field".into(),
            })
    }
}

impl Default for OllamaZeroshot {
    fn default() -> Self {
        Self::new(OllamaConfig::default())
    }
}

/// Seed of the `index`-th requested sequence; wraps at `u64::MAX`.
fn sequence_seed(base: u64, index: usize) -> u64 {
    base.wrapping_add(index as u64)
}

/// First non-blank line of a completion, trimmed.
pub(crate) fn first_line(completion: &str) -> Option<String> {
    completion
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

impl KnowledgeModel for OllamaZeroshot {
    fn name(&self) -> &str {
        "ollama_zeroshot"
    }

    fn generate(
        &self,
        graph: &KnowledgeGraph,
        options: &GenerateOptions,
    ) -> ModelResult<KnowledgeGraph> {
        let options = options.with_defaults(&Self::default_options());
        let sequences = options.num_return_sequences.unwrap_or(1).max(1);
        let base_seed = options.seed.unwrap_or(42);

        let (examples, targets): (Vec<&Knowledge>, Vec<&Knowledge>) = graph
            .iter()
            .partition(|k| k.tails.iter().any(|t| !t.trim().is_empty()));

        tracing::info!(
            model = %self.config.model,
            targets = targets.len(),
            examples = examples.len(),
            sequences,
            "generating tails"
        );

        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build();

        let mut output = KnowledgeGraph::new();
        for target in targets {
            let prompt = self.build_prompt(target, &examples);
            let mut tails: Vec<String> = Vec::with_capacity(sequences);
            for i in 0..sequences {
                let seed = sequence_seed(base_seed, i);
                let completion = self.complete(&agent, &prompt, &options, seed)?;
                if let Some(tail) = first_line(&completion) {
                    if !tails.contains(&tail) {
                        tails.push(tail);
                    }
                }
            }
            tracing::debug!(head = target.head.text(), relation = %target.relation, tails = tails.len(), "generated");
            output.push(Knowledge::new(
                target.head.clone(),
                target.relation.clone(),
                tails,
            ));
        }
        Ok(output)
    }

    fn save_pretrained(&self, dir: &Path) -> ModelResult<()> {
        std::fs::create_dir_all(dir).map_err(|e| ModelError::Io {
            path: dir.display().to_string(),
            source: e,
        })?;
        let text = toml::to_string_pretty(&self.config).map_err(|e| ModelError::Serialize {
            message: e.to_string(),
        })?;
        let path = dir.join(CONFIG_FILE);
        std::fs::write(&path, text).map_err(|e| ModelError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }

    fn is_zeroshot(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrainOptions;
    use crate::relation::RelationSchema;

    fn k(head: &str, relation: &str, tail: &str) -> Knowledge {
        Knowledge::from_parts(head, relation, tail, RelationSchema::Atomic)
    }

    #[test]
    fn prompt_uses_same_relation_examples() {
        let model = OllamaZeroshot::new(OllamaConfig {
            max_examples: 1,
            ..OllamaConfig::default()
        });
        let e1 = k("PersonX buys a car", "xWant", "to drive");
        let e2 = k("PersonX eats", "xWant", "to sleep");
        let other = k("PersonX eats", "xNeed", "food");
        let target = k("PersonX reads a book", "xWant", "");

        let prompt = model.build_prompt(&target, &[&other, &e1, &e2]);
        assert_eq!(
            prompt,
            "PersonX buys a car as a result, PersonX wants to drive\n\
             PersonX reads a book as a result, PersonX wants"
        );
    }

    #[test]
    fn prompt_falls_back_for_unknown_relation() {
        let model = OllamaZeroshot::default();
        let target = k("cat", "Teleports", "");
        assert_eq!(model.build_prompt(&target, &[]), "cat Teleports");
    }

    #[test]
    fn first_line_trims_and_skips_blank() {
        assert_eq!(first_line("\n  to sleep \nmore"), Some("to sleep".into()));
        assert_eq!(first_line("   \n"), None);
    }

    #[test]
    fn sequence_seeds_wrap_instead_of_overflowing() {
        assert_eq!(sequence_seed(42, 2), 44);
        assert_eq!(sequence_seed(u64::MAX, 0), u64::MAX);
        assert_eq!(sequence_seed(u64::MAX, 1), 0);
        assert_eq!(sequence_seed(u64::MAX, 3), 2);
    }

    #[test]
    fn zeroshot_is_not_trainable() {
        let mut model = OllamaZeroshot::default();
        assert!(model.is_zeroshot());
        let err = model
            .train(&KnowledgeGraph::new(), None, &TrainOptions::default())
            .unwrap_err();
        assert!(matches!(err, ModelError::NotTrainable { .. }));
    }

    #[test]
    fn generate_without_targets_makes_no_requests() {
        // Port 9 is discard; nothing should be contacted anyway.
        let model = OllamaZeroshot::new(OllamaConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..OllamaConfig::default()
        });
        let graph: KnowledgeGraph = vec![k("a", "xWant", "b")].into();
        let out = model.generate(&graph, &GenerateOptions::default()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn save_and_reload_config() {
        let dir = tempfile::tempdir().unwrap();
        let model = OllamaZeroshot::new(OllamaConfig {
            model: "mistral".into(),
            max_examples: 2,
            ..OllamaConfig::default()
        });
        model.save_pretrained(dir.path()).unwrap();
        let loaded = OllamaZeroshot::from_pretrained(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(loaded.config(), model.config());

        let by_name = OllamaZeroshot::from_pretrained("phi3").unwrap();
        assert_eq!(by_name.config().model, "phi3");
    }
}
