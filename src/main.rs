//! cskg CLI: commonsense knowledge inference.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use commonsense_kg::config::InferenceConfig;
use commonsense_kg::graph::{CsvOptions, JsonlOptions, KnowledgeGraph};
use commonsense_kg::head::HeadKind;
use commonsense_kg::inference::{CommonsenseInference, InferOptions};
use commonsense_kg::linker::Context;
use commonsense_kg::metrics::evaluate;
use commonsense_kg::model::{GenerateOptions, OllamaConfig, OllamaZeroshot};
use commonsense_kg::relation::{
    KnowledgeRelation, RelationSchema, head_relations, relation_frequency, relation_to_nl,
};

#[derive(Parser)]
#[command(name = "cskg", version, about = "Commonsense knowledge inference")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Infer a knowledge graph from text and/or heads.
    Infer {
        /// Input text.
        #[arg(long)]
        text: Option<String>,

        /// Literal heads (repeatable).
        #[arg(long = "head")]
        heads: Vec<String>,

        /// Restrict to these relations (repeatable).
        #[arg(long = "relation")]
        relations: Vec<String>,

        /// Use the text itself as the only head.
        #[arg(long)]
        no_extract: bool,

        /// Pair every head with every relation of the schema.
        #[arg(long)]
        no_match: bool,

        /// Skip generation; emit head/relation pairs only.
        #[arg(long)]
        dry_run: bool,

        /// JSONL file of worked examples.
        #[arg(long)]
        sample: Option<PathBuf>,

        /// Context text for relevance filtering.
        #[arg(long)]
        context: Option<String>,

        /// Relevance threshold (overrides config).
        #[arg(long)]
        threshold: Option<f32>,

        /// Ollama model name (overrides config).
        #[arg(long)]
        model: Option<String>,

        /// Completions requested per tuple.
        #[arg(long)]
        num_return_sequences: Option<usize>,

        /// Output JSONL file (default: stdout).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List relations of a schema.
    Relations {
        #[arg(long, default_value = "atomic")]
        schema: RelationSchema,

        /// Only relations allowed for this head kind (ATOMIC).
        #[arg(long)]
        head_kind: Option<HeadKind>,
    },

    /// Set algebra and cleanup over JSONL graphs.
    Graph {
        #[arg(value_enum)]
        op: GraphOp,

        /// Left (or only) operand.
        left: PathBuf,

        /// Right operand for binary operations.
        right: Option<PathBuf>,

        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Convert a CSV graph to JSONL.
    Convert {
        input: PathBuf,

        #[arg(long, short)]
        output: Option<PathBuf>,

        /// The CSV has no header row; columns are head, relation, tails.
        #[arg(long)]
        no_header: bool,

        #[arg(long, default_value = ",")]
        delimiter: char,
    },

    /// BLEU and ROUGE-L of generated tails against references.
    Evaluate {
        generated: PathBuf,
        reference: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GraphOp {
    Union,
    Intersect,
    Difference,
    Clean,
    Sort,
}

fn write_graph(graph: &KnowledgeGraph, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            graph.to_jsonl(path).into_diagnostic()?;
            tracing::info!(path = %path.display(), tuples = graph.len(), "wrote graph");
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            graph.write_jsonl(&mut lock).into_diagnostic()?;
            lock.flush().into_diagnostic()?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => InferenceConfig::load(path).into_diagnostic()?,
        None => InferenceConfig::default(),
    };
    let jsonl = JsonlOptions {
        schema: config.schema,
        ..JsonlOptions::default()
    };

    match cli.command {
        Commands::Infer {
            text,
            heads,
            relations,
            no_extract,
            no_match,
            dry_run,
            sample,
            context,
            threshold,
            model,
            num_return_sequences,
            output,
        } => {
            let inference = CommonsenseInference::from_config(&config);
            let sample = sample
                .map(|path| KnowledgeGraph::from_jsonl(path, &jsonl))
                .transpose()
                .into_diagnostic()?;
            let generator = OllamaZeroshot::new(OllamaConfig {
                model: model.unwrap_or_else(|| config.ollama.model.clone()),
                ..config.ollama.clone()
            });
            let relations = (!relations.is_empty()).then(|| {
                relations
                    .iter()
                    .map(|r| KnowledgeRelation::from_text(r, config.schema))
                    .collect()
            });

            let opts = InferOptions {
                text: text.as_deref(),
                heads,
                model: Some(&generator),
                model_args: GenerateOptions {
                    num_return_sequences,
                    ..GenerateOptions::default()
                },
                extract_heads: config.extract_heads && !no_extract,
                match_relations: config.match_relations && !no_match,
                relations,
                dry_run,
                sample_graph: sample.as_ref(),
                context: context.map(Context::Text),
                linker: None,
                threshold: threshold.unwrap_or(config.threshold),
            };

            match inference.infer(opts).into_diagnostic()? {
                Some(graph) => write_graph(&graph, output.as_deref())?,
                None => eprintln!("Nothing to infer: give --text or --head."),
            }
        }

        Commands::Relations { schema, head_kind } => {
            let names: Vec<&str> = match head_kind {
                Some(kind) => head_relations(kind).to_vec(),
                None => schema.relations().to_vec(),
            };
            for name in names {
                println!(
                    "{name:<20} {:<45} {}",
                    relation_to_nl(name).unwrap_or("-"),
                    relation_frequency(name)
                );
            }
        }

        Commands::Graph {
            op,
            left,
            right,
            output,
        } => {
            let mut graph = KnowledgeGraph::from_jsonl(&left, &jsonl).into_diagnostic()?;
            let other = right
                .map(|path| KnowledgeGraph::from_jsonl(path, &jsonl))
                .transpose()
                .into_diagnostic()?;
            let needs_right = || miette::miette!("this operation needs two graph files");

            let result = match op {
                GraphOp::Union => &graph | other.as_ref().ok_or_else(needs_right)?,
                GraphOp::Intersect => &graph & other.as_ref().ok_or_else(needs_right)?,
                GraphOp::Difference => &graph - other.as_ref().ok_or_else(needs_right)?,
                GraphOp::Clean => {
                    graph.clean();
                    graph
                }
                GraphOp::Sort => {
                    graph.sort();
                    graph
                }
            };
            write_graph(&result, output.as_deref())?;
        }

        Commands::Convert {
            input,
            output,
            no_header,
            delimiter,
        } => {
            let delimiter = u8::try_from(delimiter)
                .ok()
                .filter(u8::is_ascii)
                .ok_or_else(|| miette::miette!("delimiter must be a single ASCII character"))?;
            let options = CsvOptions {
                schema: config.schema,
                has_headers: !no_header,
                delimiter,
                ..CsvOptions::default()
            };
            let graph = KnowledgeGraph::from_csv(&input, &options).into_diagnostic()?;
            write_graph(&graph, output.as_deref())?;
        }

        Commands::Evaluate {
            generated,
            reference,
        } => {
            let generated = KnowledgeGraph::from_jsonl(&generated, &jsonl).into_diagnostic()?;
            let reference = KnowledgeGraph::from_jsonl(&reference, &jsonl).into_diagnostic()?;
            let eval = evaluate(&generated, &reference);
            println!("{}", serde_json::to_string_pretty(&eval).into_diagnostic()?);
        }
    }

    Ok(())
}
