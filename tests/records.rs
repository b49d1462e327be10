//! File-level tests for JSONL and CSV graph records.

use commonsense_kg::graph::{CsvOptions, JsonlOptions, Knowledge, KnowledgeGraph};
use commonsense_kg::relation::RelationSchema;

fn sample() -> KnowledgeGraph {
    vec![
        Knowledge::from_parts(
            "PersonX eats breakfast",
            "xWant",
            "['to go to work', 'to wash dishes']",
            RelationSchema::Atomic,
        ),
        Knowledge::from_parts("PersonX eats breakfast", "xNeed", "food", RelationSchema::Atomic),
        Knowledge::from_parts("cup", "ObjectUse", "", RelationSchema::Atomic),
    ]
    .into()
}

#[test]
fn jsonl_file_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("graph.jsonl");

    let graph = sample();
    graph.to_jsonl(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 3);

    let restored = KnowledgeGraph::from_jsonl(&path, &JsonlOptions::default()).unwrap();
    assert_eq!(restored, graph);
    assert!(restored[2].tails.is_empty());
}

#[test]
fn csv_file_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("graph.csv");

    let graph = sample();
    graph.to_csv(&path).unwrap();
    let restored = KnowledgeGraph::from_csv(&path, &CsvOptions::default()).unwrap();

    assert_eq!(restored, graph);
    assert_eq!(restored[0].tails, vec!["to go to work", "to wash dishes"]);
}

#[test]
fn csv_keeps_tails_with_commas_and_quotes() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("commas.csv");

    let graph: KnowledgeGraph = vec![
        Knowledge::new(
            "PersonX is tired".into(),
            commonsense_kg::relation::KnowledgeRelation::new("xWant", RelationSchema::Atomic),
            vec!["to rest, then sleep".into(), "PersonX's bed".into()],
        ),
        Knowledge::new(
            "PersonX reads".into(),
            commonsense_kg::relation::KnowledgeRelation::new("xAttr", RelationSchema::Atomic),
            vec!["curious', 'calm".into()],
        ),
    ]
    .into();
    graph.to_csv(&path).unwrap();
    let restored = KnowledgeGraph::from_csv(&path, &CsvOptions::default()).unwrap();

    assert_eq!(restored, graph);
    assert_eq!(restored[0].tails, vec!["to rest, then sleep", "PersonX's bed"]);
    assert_eq!(restored[1].tails, vec!["curious', 'calm"]);
}

#[test]
fn headerless_tab_separated_conceptnet() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("cn.tsv");
    std::fs::write(&path, "dog\tcapableof\tbark\ncat\tIsA\t[pet, animal]\n").unwrap();

    let options = CsvOptions {
        schema: RelationSchema::ConceptNet,
        has_headers: false,
        delimiter: b'\t',
        ..CsvOptions::default()
    };
    let graph = KnowledgeGraph::from_csv(&path, &options).unwrap();
    assert_eq!(graph.len(), 2);
    assert_eq!(graph[0].relation.text(), "CapableOf");
    assert_eq!(graph[0].relation.schema(), RelationSchema::ConceptNet);
    assert_eq!(graph[1].tails, vec!["pet", "animal"]);
}

#[test]
fn csv_then_jsonl_conversion() {
    let dir = tempfile::TempDir::new().unwrap();
    let csv_path = dir.path().join("in.csv");
    let jsonl_path = dir.path().join("out.jsonl");
    std::fs::write(
        &csv_path,
        "relation,head,tails\nxIntent,PersonX pays the bill,['to be polite']\n",
    )
    .unwrap();

    let graph = KnowledgeGraph::from_csv(&csv_path, &CsvOptions::default()).unwrap();
    graph.to_jsonl(&jsonl_path).unwrap();
    let restored = KnowledgeGraph::from_jsonl(&jsonl_path, &JsonlOptions::default()).unwrap();

    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].head.text(), "PersonX pays the bill");
    assert_eq!(restored[0].relation.text(), "xIntent");
    assert_eq!(restored[0].tails, vec!["to be polite"]);
}

#[test]
fn missing_file_reports_path() {
    let err = KnowledgeGraph::from_jsonl("/nonexistent/graph.jsonl", &JsonlOptions::default())
        .unwrap_err();
    assert!(err.to_string().contains("/nonexistent/graph.jsonl"), "{err}");
}

#[test]
fn malformed_jsonl_reports_line() {
    let input = "{\"head\": \"a\", \"relation\": \"xWant\"}\nnot json\n";
    let err = KnowledgeGraph::read_jsonl(input.as_bytes(), &JsonlOptions::default()).unwrap_err();
    assert!(err.to_string().contains('2'), "{err}");
}
