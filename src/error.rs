//! Rich diagnostic error types for the commonsense inference crate.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the crate.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum KgError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Relation(#[from] RelationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Linker(#[from] LinkerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Relation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RelationError {
    #[error("unknown relation \"{relation}\" for schema {schema}")]
    #[diagnostic(
        code(kg::relation::unknown),
        help(
            "The relation has no natural-language verbalization. \
             This usually means the graph was built with a different relation schema \
             than the component consuming it. List known relations with `cskg relations`."
        )
    )]
    UnknownRelation { relation: String, schema: String },
}

// ---------------------------------------------------------------------------
// Graph record errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("I/O error on {path}: {source}")]
    #[diagnostic(
        code(kg::graph::io),
        help("Check that the file exists and that you have read/write permissions.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON record on line {line}: {message}")]
    #[diagnostic(
        code(kg::graph::json),
        help(
            "Each line must hold one JSON object like \
             {{\"head\": \"...\", \"relation\": \"...\", \"tails\": [\"...\"]}}."
        )
    )]
    Json { line: usize, message: String },

    #[error("malformed CSV input: {message}")]
    #[diagnostic(
        code(kg::graph::csv),
        help("Check the delimiter and quoting. Tail cells containing commas must be quoted.")
    )]
    Csv { message: String },

    #[error("failed to serialize knowledge record: {message}")]
    #[diagnostic(code(kg::graph::serialize))]
    Serialize { message: String },
}

// ---------------------------------------------------------------------------
// Inference errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum InferenceError {
    #[error("invalid argument: {message}")]
    #[diagnostic(
        code(kg::infer::invalid_argument),
        help("The call violated the input contract of the inference pipeline. {message}")
    )]
    InvalidArgument { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Linker(#[from] LinkerError),
}

// ---------------------------------------------------------------------------
// Generation model errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    #[error("generation backend is not available at {url}")]
    #[diagnostic(
        code(kg::model::unavailable),
        help("Start Ollama with `ollama serve`, or run with --dry-run to skip generation.")
    )]
    Unavailable { url: String },

    #[error("generation request failed: {message}")]
    #[diagnostic(
        code(kg::model::request_failed),
        help("Check that the backend is running and the model is pulled.")
    )]
    RequestFailed { message: String },

    #[error("failed to parse generation response: {message}")]
    #[diagnostic(
        code(kg::model::parse_error),
        help("The backend returned an unexpected response format.")
    )]
    ParseError { message: String },

    #[error("model \"{model}\" is not trainable")]
    #[diagnostic(
        code(kg::model::not_trainable),
        help("Zero-shot generators only run inference. Fine-tune a seq2seq model instead.")
    )]
    NotTrainable { model: String },

    #[error("I/O error on {path}: {source}")]
    #[diagnostic(
        code(kg::model::io),
        help("Check that the model directory exists and is writable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize model configuration: {message}")]
    #[diagnostic(code(kg::model::serialize))]
    Serialize { message: String },
}

// ---------------------------------------------------------------------------
// Linker errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum LinkerError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Relation(#[from] RelationError),

    #[error("linker returned {actual} probability rows for {expected} knowledge tuples")]
    #[diagnostic(
        code(kg::linker::shape_mismatch),
        help(
            "`link` must return exactly one row per tuple and one probability per tail, \
             in graph order."
        )
    )]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("invalid linker configuration: {message}")]
    #[diagnostic(code(kg::linker::invalid_config))]
    InvalidConfig { message: String },

    #[error("I/O error on {path}: {source}")]
    #[diagnostic(
        code(kg::linker::io),
        help("Check that the linker directory exists and is readable/writable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize linker configuration: {message}")]
    #[diagnostic(code(kg::linker::serialize))]
    Serialize { message: String },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(kg::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(kg::config::parse),
        help("Check the TOML syntax and field names in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(kg::config::write),
        help("Ensure you have write permissions to the target directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type RelationResult<T> = std::result::Result<T, RelationError>;
pub type GraphResult<T> = std::result::Result<T, GraphError>;
pub type InferenceResult<T> = std::result::Result<T, InferenceError>;
pub type ModelResult<T> = std::result::Result<T, ModelError>;
pub type LinkerResult<T> = std::result::Result<T, LinkerError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Convenience alias for functions returning crate-level results.
pub type KgResult<T> = std::result::Result<T, KgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_error_converts_to_kg_error() {
        let err = RelationError::UnknownRelation {
            relation: "Foo".into(),
            schema: "atomic".into(),
        };
        let kg: KgError = err.into();
        assert!(matches!(
            kg,
            KgError::Relation(RelationError::UnknownRelation { .. })
        ));
    }

    #[test]
    fn linker_error_wraps_relation_error() {
        let err = RelationError::UnknownRelation {
            relation: "Foo".into(),
            schema: "atomic".into(),
        };
        let linker: LinkerError = err.into();
        let infer: InferenceError = linker.into();
        assert!(matches!(
            infer,
            InferenceError::Linker(LinkerError::Relation(_))
        ));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = LinkerError::ShapeMismatch {
            expected: 3,
            actual: 2,
        };
        let msg = format!("{err}");
        assert!(msg.contains('3'));
        assert!(msg.contains('2'));
    }
}
