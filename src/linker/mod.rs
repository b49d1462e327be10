//! Context-relevance linker contract.
//!
//! A linker scores every tail of every tuple against a narrative context.
//! Scores are per `(tuple, tail)`: `link` returns one row per tuple in graph
//! order with one probability per tail. `filter` keeps tails scoring at or
//! above a threshold and drops tuples left without tails.

pub mod semantic;

use std::path::Path;

use crate::error::{LinkerError, LinkerResult};
use crate::graph::{Knowledge, KnowledgeGraph};
use crate::nlp::LanguagePipeline;

pub use semantic::SemanticLinker;

/// Narrative context for relevance scoring.
#[derive(Debug, Clone, PartialEq)]
pub enum Context {
    /// Raw text, split into sentences by the linker's pipeline.
    Text(String),
    /// Pre-split sentences.
    Sentences(Vec<String>),
}

impl Context {
    /// Non-blank context sentences.
    pub fn sentences(&self, nlp: &dyn LanguagePipeline) -> Vec<String> {
        match self {
            Context::Text(text) => nlp.sentences(text),
            Context::Sentences(sentences) => sentences
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Context::Text(text) => text.trim().is_empty(),
            Context::Sentences(sentences) => sentences.iter().all(|s| s.trim().is_empty()),
        }
    }
}

impl From<&str> for Context {
    fn from(text: &str) -> Self {
        Context::Text(text.to_string())
    }
}

impl From<String> for Context {
    fn from(text: String) -> Self {
        Context::Text(text)
    }
}

impl From<Vec<String>> for Context {
    fn from(sentences: Vec<String>) -> Self {
        Context::Sentences(sentences)
    }
}

/// Scores generated knowledge against a context.
pub trait KnowledgeLinker: Send + Sync {
    fn name(&self) -> &str;

    /// Relevance probability of every tail of every tuple.
    fn link(&self, graph: &KnowledgeGraph, context: &Context) -> LinkerResult<Vec<Vec<f32>>>;

    /// Keep tails with probability `>= threshold`; drop tuples with none left.
    fn filter(
        &self,
        graph: &KnowledgeGraph,
        context: &Context,
        threshold: f32,
    ) -> LinkerResult<KnowledgeGraph> {
        let probs = self.link(graph, context)?;
        if probs.len() != graph.len() {
            return Err(LinkerError::ShapeMismatch {
                expected: graph.len(),
                actual: probs.len(),
            });
        }

        let mut filtered = KnowledgeGraph::new();
        for (knowledge, row) in graph.iter().zip(&probs) {
            if row.len() != knowledge.tails.len() {
                return Err(LinkerError::ShapeMismatch {
                    expected: knowledge.tails.len(),
                    actual: row.len(),
                });
            }
            let tails: Vec<String> = knowledge
                .tails
                .iter()
                .zip(row)
                .filter(|(_, p)| **p >= threshold)
                .map(|(t, _)| t.clone())
                .collect();
            if !tails.is_empty() {
                filtered.push(Knowledge::new(
                    knowledge.head.clone(),
                    knowledge.relation.clone(),
                    tails,
                ));
            }
        }
        tracing::debug!(
            linker = self.name(),
            before = graph.len(),
            after = filtered.len(),
            threshold,
            "filtered by context"
        );
        Ok(filtered)
    }

    fn save_pretrained(&self, dir: &Path) -> LinkerResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::RuleBasedPipeline;
    use crate::relation::RelationSchema;

    /// Scores each tail by a fixed table keyed on tail text.
    struct TableLinker(Vec<(&'static str, f32)>);

    impl KnowledgeLinker for TableLinker {
        fn name(&self) -> &str {
            "table"
        }

        fn link(&self, graph: &KnowledgeGraph, _context: &Context) -> LinkerResult<Vec<Vec<f32>>> {
            Ok(graph
                .iter()
                .map(|k| {
                    k.tails
                        .iter()
                        .map(|t| {
                            self.0
                                .iter()
                                .find(|(text, _)| *text == t.as_str())
                                .map_or(0.0, |(_, p)| *p)
                        })
                        .collect()
                })
                .collect())
        }

        fn save_pretrained(&self, _dir: &Path) -> LinkerResult<()> {
            Ok(())
        }
    }

    struct ShortLinker;

    impl KnowledgeLinker for ShortLinker {
        fn name(&self) -> &str {
            "short"
        }

        fn link(&self, _graph: &KnowledgeGraph, _context: &Context) -> LinkerResult<Vec<Vec<f32>>> {
            Ok(Vec::new())
        }

        fn save_pretrained(&self, _dir: &Path) -> LinkerResult<()> {
            Ok(())
        }
    }

    fn graph() -> KnowledgeGraph {
        vec![
            Knowledge::from_parts("a", "xWant", "[b, c]", RelationSchema::Atomic),
            Knowledge::from_parts("d", "xWant", "e", RelationSchema::Atomic),
        ]
        .into()
    }

    #[test]
    fn filter_is_tail_granular() {
        let linker = TableLinker(vec![("b", 0.9), ("c", 0.2), ("e", 0.1)]);
        let out = linker.filter(&graph(), &"ctx".into(), 0.5).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tails, vec!["b"]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let linker = TableLinker(vec![("b", 0.5), ("c", 0.5), ("e", 0.5)]);
        assert_eq!(linker.filter(&graph(), &"ctx".into(), 0.5).unwrap().len(), 2);
    }

    #[test]
    fn threshold_above_one_drops_everything() {
        let linker = TableLinker(vec![("b", 1.0), ("c", 1.0), ("e", 1.0)]);
        assert!(linker.filter(&graph(), &"ctx".into(), 1.1).unwrap().is_empty());
    }

    #[test]
    fn wrong_shape_is_an_error() {
        let err = ShortLinker.filter(&graph(), &"ctx".into(), 0.5).unwrap_err();
        assert!(matches!(
            err,
            LinkerError::ShapeMismatch {
                expected: 2,
                actual: 0
            }
        ));
    }

    #[test]
    fn context_sentences() {
        let nlp = RuleBasedPipeline;
        let text: Context = "It rained. We stayed in.".into();
        assert_eq!(text.sentences(&nlp), vec!["It rained.", "We stayed in."]);
        let split: Context = vec!["  one ".to_string(), " ".to_string()].into();
        assert_eq!(split.sentences(&nlp), vec!["one"]);
        assert!(Context::Sentences(vec![]).is_empty());
    }
}
