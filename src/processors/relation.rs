//! Relation matchers.

use crate::graph::KnowledgeGraph;
use crate::head::KnowledgeHead;
use crate::relation::{KnowledgeRelation, RelationSchema, head_relations};
use crate::semantic::{HyperVec, SemanticEncoder};

pub type HeadRelationPair = (KnowledgeHead, KnowledgeRelation);

/// Selects the relations that apply to each head.
pub trait RelationMatcher: Send + Sync {
    /// Registry name.
    fn name(&self) -> &str;

    /// Pair heads with relations.
    ///
    /// `relations`, when given, restricts the output to those relation names.
    /// `sample_graph` is an optional set of worked examples.
    fn match_heads(
        &self,
        heads: &[KnowledgeHead],
        relations: Option<&[KnowledgeRelation]>,
        sample_graph: Option<&KnowledgeGraph>,
    ) -> Vec<HeadRelationPair>;
}

fn allowed(relation: &str, filter: Option<&[KnowledgeRelation]>) -> bool {
    filter.is_none_or(|subset| subset.iter().any(|r| r.text() == relation))
}

/// Statically valid relations for a head's kind.
#[derive(Debug, Clone)]
pub struct SimpleRelationMatcher {
    name: String,
}

impl SimpleRelationMatcher {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for SimpleRelationMatcher {
    fn default() -> Self {
        Self::new("simple_relation_matcher")
    }
}

impl RelationMatcher for SimpleRelationMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn match_heads(
        &self,
        heads: &[KnowledgeHead],
        relations: Option<&[KnowledgeRelation]>,
        _sample_graph: Option<&KnowledgeGraph>,
    ) -> Vec<HeadRelationPair> {
        heads
            .iter()
            .flat_map(|head| {
                head_relations(head.kind())
                    .iter()
                    .filter(|r| allowed(r, relations))
                    .map(|r| {
                        (
                            head.clone(),
                            KnowledgeRelation::new(*r, RelationSchema::Atomic),
                        )
                    })
            })
            .collect()
    }
}

/// Every relation of a schema for every head. Used when matching is off.
#[derive(Debug, Clone)]
pub struct BaseRelationMatcher {
    name: String,
    schema: RelationSchema,
}

impl BaseRelationMatcher {
    pub fn new(name: impl Into<String>, schema: RelationSchema) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    pub fn schema(&self) -> RelationSchema {
        self.schema
    }
}

impl Default for BaseRelationMatcher {
    fn default() -> Self {
        Self::new("base_relation_matcher", RelationSchema::Atomic)
    }
}

impl RelationMatcher for BaseRelationMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn match_heads(
        &self,
        heads: &[KnowledgeHead],
        relations: Option<&[KnowledgeRelation]>,
        _sample_graph: Option<&KnowledgeGraph>,
    ) -> Vec<HeadRelationPair> {
        let schema_relations: Vec<KnowledgeRelation> = KnowledgeRelation::all(self.schema)
            .into_iter()
            .filter(|r| allowed(r.text(), relations))
            .collect();
        heads
            .iter()
            .flat_map(|head| {
                schema_relations
                    .iter()
                    .map(move |r| (head.clone(), r.clone()))
            })
            .collect()
    }
}

/// Narrows the statically valid relations using a sample graph.
///
/// A relation is kept for a head when some sample tuple carrying that
/// relation has a head at least `min_similarity` similar to it. At most
/// `top_k` relations per head survive, best match first. Without a sample
/// graph nothing is matched.
#[derive(Debug, Clone)]
pub struct GraphRelationMatcher {
    name: String,
    encoder: SemanticEncoder,
    min_similarity: f32,
    top_k: usize,
}

impl GraphRelationMatcher {
    pub fn new(
        name: impl Into<String>,
        encoder: SemanticEncoder,
        min_similarity: f32,
        top_k: usize,
    ) -> Self {
        Self {
            name: name.into(),
            encoder,
            min_similarity,
            top_k,
        }
    }
}

impl Default for GraphRelationMatcher {
    fn default() -> Self {
        Self::new("graph_relation_matcher", SemanticEncoder::default(), 0.7, 3)
    }
}

impl RelationMatcher for GraphRelationMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn match_heads(
        &self,
        heads: &[KnowledgeHead],
        relations: Option<&[KnowledgeRelation]>,
        sample_graph: Option<&KnowledgeGraph>,
    ) -> Vec<HeadRelationPair> {
        let Some(sample) = sample_graph else {
            return Vec::new();
        };

        let examples: Vec<(&str, HyperVec)> = sample
            .iter()
            .filter_map(|k| {
                self.encoder
                    .encode_text(k.head.text())
                    .map(|v| (k.relation.text(), v))
            })
            .collect();

        let mut pairs = Vec::new();
        for head in heads {
            let Some(head_vec) = self.encoder.encode_text(head.text()) else {
                continue;
            };
            let mut scored: Vec<(&'static str, f32)> = head_relations(head.kind())
                .iter()
                .filter(|r| allowed(r, relations))
                .filter_map(|r| {
                    examples
                        .iter()
                        .filter(|(rel, _)| rel == r)
                        .map(|(_, v)| head_vec.similarity(v))
                        .fold(None, |best: Option<f32>, s| Some(best.map_or(s, |b| b.max(s))))
                        .filter(|best| *best >= self.min_similarity)
                        .map(|best| (*r, best))
                })
                .collect();
            // Stable, so equal scores keep taxonomy order.
            scored.sort_by(|a, b| b.1.total_cmp(&a.1));
            scored.truncate(self.top_k);

            tracing::debug!(head = head.text(), matched = scored.len(), "graph relation match");
            pairs.extend(scored.into_iter().map(|(r, _)| {
                (
                    head.clone(),
                    KnowledgeRelation::new(r, RelationSchema::Atomic),
                )
            }));
        }
        pairs
    }
}
