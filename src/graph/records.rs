//! Flat-file records: line-delimited JSON and CSV.
//!
//! JSONL lines look like `{"head": ..., "relation": ..., "tails": ...}` where
//! `tails` may be a string or an array of strings. Field names are
//! configurable. Missing fields are legal and map to an empty head, the
//! default relation, or no tails.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde_json::Value;

use super::{Knowledge, KnowledgeGraph, list_to_text, parse_tail_cell};
use crate::error::{GraphError, GraphResult};
use crate::head::{HeadKind, KnowledgeHead};
use crate::relation::{KnowledgeRelation, RelationSchema};

/// Field names and schema for JSONL reading.
#[derive(Debug, Clone)]
pub struct JsonlOptions {
    pub schema: RelationSchema,
    pub head_attr: String,
    pub relation_attr: String,
    pub tails_attr: String,
}

impl Default for JsonlOptions {
    fn default() -> Self {
        Self {
            schema: RelationSchema::Atomic,
            head_attr: "head".into(),
            relation_attr: "relation".into(),
            tails_attr: "tails".into(),
        }
    }
}

/// Column layout and schema for CSV reading.
///
/// With `has_headers`, columns are looked up by name; without, the first
/// three columns are head, relation, and tails.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub schema: RelationSchema,
    pub has_headers: bool,
    pub delimiter: u8,
    pub head_col: String,
    pub relation_col: String,
    pub tails_col: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            schema: RelationSchema::Atomic,
            has_headers: true,
            delimiter: b',',
            head_col: "head".into(),
            relation_col: "relation".into(),
            tails_col: "tails".into(),
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> GraphError {
    GraphError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn tails_from_value(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other.to_string()],
    }
}

fn string_field(object: &serde_json::Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn knowledge_from_cells(
    head: Option<&str>,
    relation: Option<&str>,
    tails: Vec<String>,
    schema: RelationSchema,
) -> Knowledge {
    let head = KnowledgeHead::new(head.unwrap_or_default(), HeadKind::Sentence);
    let relation = match relation.map(str::trim).filter(|r| !r.is_empty()) {
        Some(text) => KnowledgeRelation::from_text(text, schema),
        None => KnowledgeRelation::default(),
    };
    Knowledge::new(head, relation, tails)
}

impl KnowledgeGraph {
    /// Parse JSONL from any reader. Blank lines are skipped.
    pub fn read_jsonl<R: Read>(reader: R, options: &JsonlOptions) -> GraphResult<Self> {
        let mut graph = KnowledgeGraph::new();
        for (index, line) in BufReader::new(reader).lines().enumerate() {
            let line_no = index + 1;
            let line = line.map_err(|e| GraphError::Json {
                line: line_no,
                message: e.to_string(),
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(&line).map_err(|e| GraphError::Json {
                line: line_no,
                message: e.to_string(),
            })?;
            let Value::Object(object) = value else {
                return Err(GraphError::Json {
                    line: line_no,
                    message: "expected a JSON object".into(),
                });
            };

            let head = string_field(&object, &options.head_attr);
            let relation = string_field(&object, &options.relation_attr);
            let tails = tails_from_value(object.get(&options.tails_attr));
            graph.push(knowledge_from_cells(
                Some(&head),
                Some(&relation),
                tails,
                options.schema,
            ));
        }
        Ok(graph)
    }

    /// Read a JSONL file.
    pub fn from_jsonl(path: impl AsRef<Path>, options: &JsonlOptions) -> GraphResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| io_error(path, e))?;
        let graph = Self::read_jsonl(file, options)?;
        tracing::debug!(path = %path.display(), tuples = graph.len(), "read JSONL graph");
        Ok(graph)
    }

    /// Write one JSON object per line. `tails` is always an array.
    pub fn write_jsonl<W: Write>(&self, mut writer: W) -> GraphResult<()> {
        for knowledge in self.iter() {
            let line = serde_json::to_string(&knowledge.to_json(false)).map_err(|e| {
                GraphError::Serialize {
                    message: e.to_string(),
                }
            })?;
            writeln!(writer, "{line}").map_err(|e| GraphError::Serialize {
                message: e.to_string(),
            })?;
        }
        writer.flush().map_err(|e| GraphError::Serialize {
            message: e.to_string(),
        })
    }

    /// Write a JSONL file, replacing any existing content.
    pub fn to_jsonl(&self, path: impl AsRef<Path>) -> GraphResult<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| io_error(path, e))?;
        self.write_jsonl(BufWriter::new(file))?;
        tracing::debug!(path = %path.display(), tuples = self.len(), "wrote JSONL graph");
        Ok(())
    }

    /// Parse CSV from any reader.
    pub fn read_csv<R: Read>(reader: R, options: &CsvOptions) -> GraphResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(options.has_headers)
            .delimiter(options.delimiter)
            .flexible(true)
            .from_reader(reader);

        let (head_idx, relation_idx, tails_idx) = if options.has_headers {
            let headers = reader.headers().map_err(|e| GraphError::Csv {
                message: e.to_string(),
            })?;
            let find = |name: &str| headers.iter().position(|h| h.trim() == name);
            (
                find(&options.head_col),
                find(&options.relation_col),
                find(&options.tails_col),
            )
        } else {
            (Some(0), Some(1), Some(2))
        };

        let mut graph = KnowledgeGraph::new();
        for result in reader.records() {
            let record = result.map_err(|e| GraphError::Csv {
                message: e.to_string(),
            })?;
            let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i));
            let tails = cell(tails_idx).map(parse_tail_cell).unwrap_or_default();
            graph.push(knowledge_from_cells(
                cell(head_idx),
                cell(relation_idx),
                tails,
                options.schema,
            ));
        }
        Ok(graph)
    }

    /// Read a CSV file.
    pub fn from_csv(path: impl AsRef<Path>, options: &CsvOptions) -> GraphResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| io_error(path, e))?;
        let graph = Self::read_csv(file, options)?;
        tracing::debug!(path = %path.display(), tuples = graph.len(), "read CSV graph");
        Ok(graph)
    }

    /// Write `head,relation,tails` rows; tails are rendered as a quoted
    /// bracketed list (see [`list_to_text`]).
    pub fn write_csv<W: Write>(&self, writer: W) -> GraphResult<()> {
        let mut writer = csv::Writer::from_writer(writer);
        let csv_err = |e: csv::Error| GraphError::Csv {
            message: e.to_string(),
        };
        writer
            .write_record(["head", "relation", "tails"])
            .map_err(csv_err)?;
        for knowledge in self.iter() {
            let tails = list_to_text(&knowledge.tails);
            writer
                .write_record([
                    knowledge.head.text(),
                    knowledge.relation.text(),
                    tails.as_str(),
                ])
                .map_err(csv_err)?;
        }
        writer.flush().map_err(|e| GraphError::Csv {
            message: e.to_string(),
        })
    }

    pub fn to_csv(&self, path: impl AsRef<Path>) -> GraphResult<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| io_error(path, e))?;
        self.write_csv(BufWriter::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jsonl_accepts_string_array_and_missing_tails() {
        let input = r#"{"head": "PersonX eats", "relation": "xWant", "tails": "to sleep"}
{"head": "PersonX eats", "relation": "xNeed", "tails": ["food", "a plate"]}

{"head": "dog"}
{"relation": "IsAfter"}
"#;
        let graph = KnowledgeGraph::read_jsonl(input.as_bytes(), &JsonlOptions::default()).unwrap();
        assert_eq!(graph.len(), 4);
        assert_eq!(graph[0].tails, vec!["to sleep"]);
        assert_eq!(graph[1].tails, vec!["food", "a plate"]);
        assert_eq!(graph[2].relation, KnowledgeRelation::default());
        assert!(graph[2].tails.is_empty());
        assert!(graph[3].head.is_blank());
        assert_eq!(graph[3].relation.text(), "isAfter");
    }

    #[test]
    fn jsonl_custom_attribute_names() {
        let input = r#"{"source": "cat", "rel": "CapableOf", "targets": ["purr"]}"#;
        let options = JsonlOptions {
            head_attr: "source".into(),
            relation_attr: "rel".into(),
            tails_attr: "targets".into(),
            ..JsonlOptions::default()
        };
        let graph = KnowledgeGraph::read_jsonl(input.as_bytes(), &options).unwrap();
        assert_eq!(graph[0].head.text(), "cat");
        assert_eq!(graph[0].tails, vec!["purr"]);
    }

    #[test]
    fn jsonl_reports_bad_line_number() {
        let input = "{\"head\": \"a\"}\nnot json\n";
        let err = KnowledgeGraph::read_jsonl(input.as_bytes(), &JsonlOptions::default())
            .unwrap_err();
        assert!(matches!(err, GraphError::Json { line: 2, .. }));
    }

    #[test]
    fn jsonl_writes_tails_as_array() {
        let graph: KnowledgeGraph = vec![Knowledge::from_parts(
            "a",
            "xWant",
            "b",
            RelationSchema::Atomic,
        )]
        .into();
        let mut out = Vec::new();
        graph.write_jsonl(&mut out).unwrap();
        let line = String::from_utf8(out).unwrap();
        assert_eq!(
            line.trim(),
            r#"{"head":"a","relation":"xWant","tails":["b"]}"#
        );
    }

    #[test]
    fn csv_with_headers_and_bracketed_tails() {
        let input = "relation,head,tails\nxWant,PersonX eats,\"['to sleep', 'to rest']\"\nxNeed,PersonX eats,food\n";
        let graph = KnowledgeGraph::read_csv(input.as_bytes(), &CsvOptions::default()).unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph[0].tails, vec!["to sleep", "to rest"]);
        assert_eq!(graph[1].tails, vec!["food"]);
        assert_eq!(graph[1].relation.text(), "xNeed");
    }

    #[test]
    fn csv_missing_column_maps_to_empty() {
        let input = "head,relation\ncat,CapableOf\n";
        let graph = KnowledgeGraph::read_csv(input.as_bytes(), &CsvOptions::default()).unwrap();
        assert_eq!(graph[0].head.text(), "cat");
        assert!(graph[0].tails.is_empty());
    }

    #[test]
    fn csv_without_headers_is_positional() {
        let input = "cat\tCapableOf\tpurr\n";
        let options = CsvOptions {
            has_headers: false,
            delimiter: b'\t',
            ..CsvOptions::default()
        };
        let graph = KnowledgeGraph::read_csv(input.as_bytes(), &options).unwrap();
        assert_eq!(graph[0].relation.text(), "CapableOf");
        assert_eq!(graph[0].tails, vec!["purr"]);
    }

    #[test]
    fn csv_write_then_read() {
        let graph: KnowledgeGraph = vec![Knowledge::from_parts(
            "a, b",
            "xWant",
            "[c, d]",
            RelationSchema::Atomic,
        )]
        .into();
        let mut out = Vec::new();
        graph.write_csv(&mut out).unwrap();
        let back = KnowledgeGraph::read_csv(out.as_slice(), &CsvOptions::default()).unwrap();
        assert_eq!(back, graph);
    }
}
