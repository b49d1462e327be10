// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # commonsense-kg
//!
//! Commonsense knowledge inference: extract candidate heads from text, pair
//! them with commonsense relations, and have a generation model complete the
//! tails of the resulting knowledge graph.
//!
//! ## Architecture
//!
//! - **Relation taxonomy** (`relation`): ATOMIC-2020, ConceptNet, and TransOMCS tables
//! - **Knowledge graph** (`graph`): tuples with set algebra, JSONL/CSV records
//! - **Processors** (`processors`): pluggable head extractors and relation matchers
//! - **Linguistics** (`nlp`, `semantic`): analysis contract and hypervector similarity
//! - **Adapters** (`model`, `linker`): tail generation and context filtering
//! - **Orchestrator** (`inference`): the end-to-end pipeline
//!
//! ## Library usage
//!
//! ```no_run
//! use commonsense_kg::inference::{CommonsenseInference, InferOptions};
//!
//! let inference = CommonsenseInference::new();
//! let graph = inference
//!     .infer(InferOptions {
//!         dry_run: true,
//!         ..InferOptions::text("PersonX buys a new car.")
//!     })
//!     .unwrap();
//! if let Some(graph) = graph {
//!     for knowledge in &graph {
//!         println!("{knowledge}");
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod head;
pub mod inference;
pub mod linker;
pub mod metrics;
pub mod model;
pub mod nlp;
pub mod processors;
pub mod relation;
pub mod semantic;
