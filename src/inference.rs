//! The inference orchestrator.
//!
//! [`CommonsenseInference::infer`] turns text and/or literal heads into a
//! knowledge graph:
//!
//! 1. collect heads: explicit heads first, then every registered head
//!    extractor in registration order (or the text itself when extraction
//!    is off), deduplicated case-insensitively, first seen wins
//! 2. pair heads with relations: every registered relation matcher, or the
//!    base matcher when matching is off
//! 3. assemble tail-less tuples, heads in first-seen order and relations in
//!    taxonomy order, and merge in the sample graph
//! 4. stop here on a dry run or without a model; otherwise generate tails,
//!    filter them against the context, clean, and sort
//!
//! "Nothing to do" outcomes are warnings and return `Ok(None)`.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::config::InferenceConfig;
use crate::error::{InferenceError, InferenceResult};
use crate::graph::{Knowledge, KnowledgeGraph};
use crate::head::{HeadKind, KnowledgeHead};
use crate::linker::semantic::SemanticLinkerConfig;
use crate::linker::{Context, KnowledgeLinker, SemanticLinker};
use crate::model::{GenerateOptions, KnowledgeModel};
use crate::nlp::{LanguagePipeline, RuleBasedPipeline};
use crate::processors::{
    BaseRelationMatcher, GraphRelationMatcher, HeadExtractor, HeadRelationPair,
    NounPhraseHeadExtractor, RelationMatcher, SentenceHeadExtractor, SimpleRelationMatcher,
    VerbPhraseHeadExtractor,
};
use crate::relation::{KnowledgeRelation, RelationSchema};
use crate::semantic::SemanticEncoder;

/// A processor to register, tagged with its capability.
pub enum Processor {
    Head(Box<dyn HeadExtractor>),
    Relation(Box<dyn RelationMatcher>),
}

impl Processor {
    pub fn head(extractor: impl HeadExtractor + 'static) -> Self {
        Processor::Head(Box::new(extractor))
    }

    pub fn relation(matcher: impl RelationMatcher + 'static) -> Self {
        Processor::Relation(Box::new(matcher))
    }

    pub fn name(&self) -> &str {
        match self {
            Processor::Head(p) => p.name(),
            Processor::Relation(p) => p.name(),
        }
    }
}

/// Registered processor names in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessorNames {
    pub head: Vec<String>,
    pub relation: Vec<String>,
}

/// Inputs to [`CommonsenseInference::infer`].
pub struct InferOptions<'a> {
    pub text: Option<&'a str>,
    /// Literal heads, added before anything extracted.
    pub heads: Vec<String>,
    pub model: Option<&'a dyn KnowledgeModel>,
    pub model_args: GenerateOptions,
    pub extract_heads: bool,
    pub match_relations: bool,
    /// Restrict matching to these relations.
    pub relations: Option<Vec<KnowledgeRelation>>,
    pub dry_run: bool,
    pub sample_graph: Option<&'a KnowledgeGraph>,
    pub context: Option<Context>,
    /// Linker for context filtering; a [`SemanticLinker`] when unset.
    pub linker: Option<&'a dyn KnowledgeLinker>,
    pub threshold: f32,
}

impl Default for InferOptions<'_> {
    fn default() -> Self {
        Self {
            text: None,
            heads: Vec::new(),
            model: None,
            model_args: GenerateOptions::default(),
            extract_heads: true,
            match_relations: true,
            relations: None,
            dry_run: false,
            sample_graph: None,
            context: None,
            linker: None,
            threshold: 0.5,
        }
    }
}

impl<'a> InferOptions<'a> {
    pub fn text(text: &'a str) -> Self {
        Self {
            text: Some(text),
            ..Self::default()
        }
    }

    pub fn heads<S: Into<String>>(heads: impl IntoIterator<Item = S>) -> Self {
        Self {
            heads: heads.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Head extraction, relation matching, and generation behind one call.
///
/// The processor registry is plain mutable state: share an instance across
/// threads only behind your own synchronization.
pub struct CommonsenseInference {
    nlp: Arc<dyn LanguagePipeline>,
    schema: RelationSchema,
    linker_config: SemanticLinkerConfig,
    head_extractors: IndexMap<String, Box<dyn HeadExtractor>>,
    relation_matchers: IndexMap<String, Box<dyn RelationMatcher>>,
}

impl std::fmt::Debug for CommonsenseInference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommonsenseInference")
            .field("pipeline", &self.nlp.name())
            .field("schema", &self.schema)
            .field("head_extractors", &self.head_extractors.keys().collect::<Vec<_>>())
            .field(
                "relation_matchers",
                &self.relation_matchers.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for CommonsenseInference {
    fn default() -> Self {
        Self::new()
    }
}

impl CommonsenseInference {
    /// Orchestrator with the built-in English pipeline and default processors.
    pub fn new() -> Self {
        Self::with_pipeline(Arc::new(RuleBasedPipeline))
    }

    /// Orchestrator using a custom linguistic pipeline.
    pub fn with_pipeline(nlp: Arc<dyn LanguagePipeline>) -> Self {
        Self::build(nlp, &InferenceConfig::default())
    }

    pub fn from_config(config: &InferenceConfig) -> Self {
        Self::build(Arc::new(RuleBasedPipeline), config)
    }

    fn build(nlp: Arc<dyn LanguagePipeline>, config: &InferenceConfig) -> Self {
        let mut this = Self {
            nlp,
            schema: config.schema,
            linker_config: SemanticLinkerConfig {
                dimension: config.linker.dimension,
            },
            head_extractors: IndexMap::new(),
            relation_matchers: IndexMap::new(),
        };
        this.register(Processor::head(SentenceHeadExtractor::default()));
        this.register(Processor::head(NounPhraseHeadExtractor::default()));
        this.register(Processor::head(VerbPhraseHeadExtractor::default()));
        this.register(Processor::relation(SimpleRelationMatcher::default()));
        this.register(Processor::relation(GraphRelationMatcher::new(
            "graph_relation_matcher",
            SemanticEncoder::new(config.semantic.dimension),
            config.semantic.min_similarity,
            config.semantic.top_k,
        )));
        this
    }

    fn register(&mut self, processor: Processor) {
        match processor {
            Processor::Head(p) => {
                self.head_extractors.insert(p.name().to_string(), p);
            }
            Processor::Relation(p) => {
                self.relation_matchers.insert(p.name().to_string(), p);
            }
        }
    }

    pub fn pipeline(&self) -> &dyn LanguagePipeline {
        self.nlp.as_ref()
    }

    pub fn schema(&self) -> RelationSchema {
        self.schema
    }

    /// Register a processor. An existing processor with the same name is
    /// replaced in place.
    pub fn add_processor(&mut self, processor: Processor) -> InferenceResult<()> {
        if processor.name().trim().is_empty() {
            return Err(InferenceError::InvalidArgument {
                message: "processor name must not be empty".into(),
            });
        }
        tracing::debug!(name = processor.name(), "registering processor");
        self.register(processor);
        Ok(())
    }

    /// Remove a processor by name. Returns whether anything was removed.
    pub fn remove_processor(&mut self, name: &str) -> bool {
        let head = self.head_extractors.shift_remove(name).is_some();
        let relation = self.relation_matchers.shift_remove(name).is_some();
        head || relation
    }

    pub fn processors(&self) -> ProcessorNames {
        ProcessorNames {
            head: self.head_extractors.keys().cloned().collect(),
            relation: self.relation_matchers.keys().cloned().collect(),
        }
    }

    /// Run the pipeline. `Ok(None)` means there was nothing to infer from.
    pub fn infer(&self, opts: InferOptions<'_>) -> InferenceResult<Option<KnowledgeGraph>> {
        validate(&opts)?;

        if opts.text.is_none() && opts.heads.is_empty() {
            tracing::warn!("no text or heads given, skipping inference");
            return Ok(None);
        }

        let heads = self.collect_heads(&opts);
        if heads.is_empty() {
            tracing::warn!("no heads found, skipping inference");
            return Ok(None);
        }
        tracing::info!(heads = heads.len(), "collected heads");

        let pairs = self.match_relations(&heads, &opts);
        if pairs.is_empty() {
            tracing::warn!(heads = heads.len(), "no relations matched any head");
        }
        tracing::info!(pairs = pairs.len(), "matched relations");

        let mut graph: KnowledgeGraph = pairs
            .into_iter()
            .map(|(head, relation)| Knowledge::pending(head, relation))
            .collect();

        if let Some(sample) = opts.sample_graph {
            graph = graph + sample.clone();
        } else if opts.model.is_some_and(|m| m.is_zeroshot()) {
            tracing::warn!(
                "zero-shot generation without a sample graph; results may be poor, \
                 pass a few worked examples as the sample graph"
            );
        }

        let model = match opts.model {
            Some(model) if !opts.dry_run => model,
            _ => {
                tracing::info!(tuples = graph.len(), dry_run = opts.dry_run, "returning without generation");
                return Ok(Some(graph.sorted()));
            }
        };

        tracing::info!(model = model.name(), tuples = graph.len(), "generating");
        let mut generated = model.generate(&graph, &opts.model_args)?;

        if let Some(context) = opts.context.as_ref().filter(|c| !c.is_empty()) {
            let default_linker;
            let linker: &dyn KnowledgeLinker = match opts.linker {
                Some(linker) => linker,
                None => {
                    default_linker = SemanticLinker::new(self.linker_config.clone(), self.nlp.clone())?;
                    &default_linker
                }
            };
            tracing::info!(linker = linker.name(), threshold = opts.threshold, "filtering by context");
            generated = linker.filter(&generated, context, opts.threshold)?;
        }

        generated.clean();
        generated.sort();
        tracing::info!(tuples = generated.len(), "inference complete");
        Ok(Some(generated))
    }

    fn collect_heads(&self, opts: &InferOptions<'_>) -> Vec<KnowledgeHead> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut heads = Vec::new();
        let mut add = |head: KnowledgeHead| {
            if !head.is_blank() && seen.insert(head.key()) {
                heads.push(head);
            }
        };

        for text in &opts.heads {
            add(KnowledgeHead::new(text, HeadKind::Sentence));
        }

        let text = opts.text.filter(|t| !t.trim().is_empty());
        match text {
            Some(text) if opts.extract_heads => {
                let doc = self.nlp.analyze(text);
                for extractor in self.head_extractors.values() {
                    let extracted = extractor.extract(text, Some(&doc), self.nlp.as_ref());
                    tracing::debug!(extractor = extractor.name(), heads = extracted.len(), "extracted heads");
                    for head in extracted {
                        add(head);
                    }
                }
            }
            Some(text) => add(KnowledgeHead::new(text, HeadKind::Sentence)),
            None => {}
        }
        heads
    }

    fn match_relations(
        &self,
        heads: &[KnowledgeHead],
        opts: &InferOptions<'_>,
    ) -> Vec<HeadRelationPair> {
        let filter = opts.relations.as_deref();
        let mut pairs: IndexSet<HeadRelationPair> = IndexSet::new();

        if opts.match_relations {
            for matcher in self.relation_matchers.values() {
                let matched = matcher.match_heads(heads, filter, opts.sample_graph);
                tracing::debug!(matcher = matcher.name(), pairs = matched.len(), "matched relations");
                pairs.extend(matched);
            }
        } else {
            let base = BaseRelationMatcher::new("base_relation_matcher", self.schema);
            pairs.extend(base.match_heads(heads, filter, opts.sample_graph));
        }

        // Heads in first-seen order, then relations in taxonomy order.
        let head_rank: IndexMap<String, usize> = heads
            .iter()
            .enumerate()
            .map(|(i, h)| (h.key(), i))
            .collect();
        let mut ordered: Vec<HeadRelationPair> = pairs.into_iter().collect();
        ordered.sort_by_key(|(head, relation)| {
            (
                head_rank.get(&head.key()).copied().unwrap_or(usize::MAX),
                relation
                    .schema()
                    .rank(relation.text())
                    .unwrap_or(usize::MAX),
            )
        });
        ordered
    }
}

fn validate(opts: &InferOptions<'_>) -> InferenceResult<()> {
    if !opts.threshold.is_finite() || opts.threshold < 0.0 {
        return Err(InferenceError::InvalidArgument {
            message: format!(
                "threshold must be a finite, non-negative number (got {})",
                opts.threshold
            ),
        });
    }
    if let Some(relations) = &opts.relations {
        if relations.iter().any(|r| r.text().trim().is_empty()) {
            return Err(InferenceError::InvalidArgument {
                message: "relation subset contains a blank relation name".into(),
            });
        }
    }
    Ok(())
}
