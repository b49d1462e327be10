//! End-to-end tests for the inference pipeline.
//!
//! These exercise head extraction, relation matching, generation, and
//! context filtering together through `CommonsenseInference::infer`, with
//! in-process stand-ins for the generation model and linker.

use std::collections::HashMap;
use std::path::Path;

use commonsense_kg::error::{LinkerResult, ModelResult};
use commonsense_kg::graph::{Knowledge, KnowledgeGraph};
use commonsense_kg::inference::{CommonsenseInference, InferOptions};
use commonsense_kg::linker::{Context, KnowledgeLinker};
use commonsense_kg::model::{GenerateOptions, KnowledgeModel};
use commonsense_kg::relation::{ATOMIC_RELATIONS, RelationSchema};

/// Completes every tuple with `"<relation> of <head>"`.
struct EchoModel {
    zeroshot: bool,
}

impl KnowledgeModel for EchoModel {
    fn name(&self) -> &str {
        "echo"
    }

    fn generate(
        &self,
        graph: &KnowledgeGraph,
        options: &GenerateOptions,
    ) -> ModelResult<KnowledgeGraph> {
        let n = options.num_return_sequences.unwrap_or(1);
        Ok(graph
            .iter()
            .map(|k| {
                let tails = (0..n)
                    .map(|i| format!("{} of {} #{i}", k.relation, k.head))
                    .collect();
                Knowledge::new(k.head.clone(), k.relation.clone(), tails)
            })
            .collect())
    }

    fn save_pretrained(&self, _dir: &Path) -> ModelResult<()> {
        Ok(())
    }

    fn is_zeroshot(&self) -> bool {
        self.zeroshot
    }
}

/// Scores tails by a fixed table, 0.0 for anything unlisted.
struct TableLinker(HashMap<&'static str, f32>);

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
                    .map(|t| self.0.get(t.as_str()).copied().unwrap_or(0.0))
                    .collect()
            })
            .collect())
    }

    fn save_pretrained(&self, _dir: &Path) -> LinkerResult<()> {
        Ok(())
    }
}

#[test]
fn nothing_to_infer_returns_none() {
    let inference = CommonsenseInference::new();
    assert!(inference.infer(InferOptions::default()).unwrap().is_none());
}

#[test]
fn dry_run_on_text_yields_pending_tuples() {
    let inference = CommonsenseInference::new();
    let graph = inference
        .infer(InferOptions {
            dry_run: true,
            ..InferOptions::text("The cat sleeps.")
        })
        .unwrap()
        .unwrap();

    assert!(!graph.is_empty());
    assert!(graph.iter().all(|k| k.tails.is_empty()));
    assert!(graph.iter().any(|k| k.head.text().starts_with("The cat sleeps")));
}

#[test]
fn unmatched_heads_get_every_schema_relation_once() {
    let inference = CommonsenseInference::new();
    let graph = inference
        .infer(InferOptions {
            match_relations: false,
            dry_run: true,
            ..InferOptions::heads(["dog"])
        })
        .unwrap()
        .unwrap();

    assert_eq!(graph.len(), ATOMIC_RELATIONS.len());
    for relation in ATOMIC_RELATIONS.iter() {
        let count = graph
            .iter()
            .filter(|k| k.relation.text() == *relation)
            .count();
        assert_eq!(count, 1, "relation {relation}");
    }
    assert!(graph.iter().all(|k| k.head.text() == "dog"));
}

#[test]
fn generation_fills_tails_and_sorts() {
    let inference = CommonsenseInference::new();
    let model = EchoModel { zeroshot: false };
    let graph = inference
        .infer(InferOptions {
            match_relations: false,
            model: Some(&model),
            ..InferOptions::heads(["apple", "zebra"])
        })
        .unwrap()
        .unwrap();

    assert_eq!(graph.len(), 2 * ATOMIC_RELATIONS.len());
    assert!(graph.iter().all(Knowledge::has_tails));
    // Head text descending.
    assert_eq!(graph[0].head.text(), "zebra");
    assert_eq!(graph[graph.len() - 1].head.text(), "apple");
}

#[test]
fn num_return_sequences_reaches_the_model() {
    let inference = CommonsenseInference::new();
    let model = EchoModel { zeroshot: false };
    let graph = inference
        .infer(InferOptions {
            match_relations: false,
            model: Some(&model),
            model_args: GenerateOptions {
                num_return_sequences: Some(3),
                ..GenerateOptions::default()
            },
            ..InferOptions::heads(["dog"])
        })
        .unwrap()
        .unwrap();
    assert!(graph.iter().all(|k| k.tails.len() == 3));
}

#[test]
fn threshold_above_one_filters_everything() {
    let inference = CommonsenseInference::new();
    let model = EchoModel { zeroshot: false };
    let graph = inference
        .infer(InferOptions {
            match_relations: false,
            model: Some(&model),
            context: Some(Context::from("The dog barked at the mail carrier.")),
            threshold: 1.1,
            ..InferOptions::heads(["dog"])
        })
        .unwrap()
        .unwrap();
    assert!(graph.is_empty());
}

#[test]
fn custom_linker_keeps_only_relevant_tails() {
    let inference = CommonsenseInference::new();
    let model = EchoModel { zeroshot: false };
    let linker = TableLinker(HashMap::from([
        ("xWant of dog #0", 0.9),
        ("xNeed of dog #0", 0.4),
    ]));
    let graph = inference
        .infer(InferOptions {
            match_relations: false,
            model: Some(&model),
            context: Some(Context::from("A dog wants a walk.")),
            linker: Some(&linker),
            threshold: 0.5,
            ..InferOptions::heads(["dog"])
        })
        .unwrap()
        .unwrap();

    assert_eq!(graph.len(), 1);
    assert_eq!(graph[0].relation.text(), "xWant");
    assert_eq!(graph[0].tails, vec!["xWant of dog #0"]);
}

#[test]
fn linker_is_unused_without_context() {
    let inference = CommonsenseInference::new();
    let model = EchoModel { zeroshot: false };
    let linker = TableLinker(HashMap::new());
    let graph = inference
        .infer(InferOptions {
            match_relations: false,
            model: Some(&model),
            linker: Some(&linker),
            ..InferOptions::heads(["dog"])
        })
        .unwrap()
        .unwrap();
    assert_eq!(graph.len(), ATOMIC_RELATIONS.len());
}

#[test]
fn sample_graph_is_merged_before_generation() {
    let inference = CommonsenseInference::new();
    let model = EchoModel { zeroshot: true };
    let sample: KnowledgeGraph = vec![Knowledge::from_parts(
        "PersonX eats",
        "xEffect",
        "gets full",
        RelationSchema::Atomic,
    )]
    .into();

    let graph = inference
        .infer(InferOptions {
            match_relations: false,
            relations: Some(vec![commonsense_kg::relation::KnowledgeRelation::new(
                "xWant",
                RelationSchema::Atomic,
            )]),
            dry_run: true,
            model: Some(&model),
            sample_graph: Some(&sample),
            ..InferOptions::heads(["PersonX runs"])
        })
        .unwrap()
        .unwrap();

    assert_eq!(graph.len(), 2);
    assert!(graph.iter().any(|k| k.head.text() == "PersonX eats" && k.has_tails()));
    assert!(graph.iter().any(|k| k.head.text() == "PersonX runs" && !k.has_tails()));
}

#[test]
fn tuples_compare_tails_as_sets() {
    let a = Knowledge::from_parts("dog", "xWant", "['walk', 'food']", RelationSchema::Atomic);
    let b = Knowledge::from_parts("dog", "xWant", "['food', 'walk', 'food']", RelationSchema::Atomic);
    assert_eq!(a, b);

    let left: KnowledgeGraph = vec![a].into();
    let right: KnowledgeGraph = vec![b].into();
    assert_eq!((&left | &right).len(), 1);
    assert!((&left - &right).is_empty());
}

#[test]
fn blank_context_skips_filtering() {
    let inference = CommonsenseInference::new();
    let model = EchoModel { zeroshot: false };
    for context in [
        Context::from("   "),
        Context::Sentences(vec![String::new(), " ".into()]),
    ] {
        let graph = inference
            .infer(InferOptions {
                match_relations: false,
                model: Some(&model),
                context: Some(context),
                ..InferOptions::heads(["dog"])
            })
            .unwrap()
            .unwrap();
        assert_eq!(graph.len(), ATOMIC_RELATIONS.len());
    }
}

#[test]
fn non_ascii_words_do_not_break_extraction() {
    let inference = CommonsenseInference::new();
    let graph = inference
        .infer(InferOptions {
            dry_run: true,
            ..InferOptions::text("ぁing ぁed.")
        })
        .unwrap();
    assert!(graph.is_some());
}
