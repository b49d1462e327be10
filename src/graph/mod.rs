//! Knowledge tuples and the knowledge graph.
//!
//! A [`Knowledge`] is one `(head, relation, tails)` tuple. A [`KnowledgeGraph`]
//! is an ordered sequence of tuples that doubles as a set: union, intersection,
//! and difference go through an insertion-ordered set keyed by tuple equality,
//! which compares tails as a set. Those operations are lossy (duplicates
//! collapse, the right operand's order is only kept for unseen elements), so
//! callers that care about order should [`sort`](KnowledgeGraph::sort) afterwards.

pub mod records;

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, BitAnd, BitOr, Index, Sub};

use indexmap::IndexSet;
use serde_json::json;

use crate::error::RelationResult;
use crate::head::{HeadKind, KnowledgeHead};
use crate::relation::{KnowledgeRelation, RelationSchema, relation_frequency};

pub use records::{CsvOptions, JsonlOptions};

/// End-of-sequence marker used by seq2seq prompts.
pub const EOS_TOKEN: &str = "[EOS]";
/// Generation marker appended to seq2seq prompts.
pub const GEN_TOKEN: &str = "[GEN]";
/// Padding token.
pub const PAD_TOKEN: &str = "[PAD]";

/// One knowledge tuple.
#[derive(Debug, Clone)]
pub struct Knowledge {
    pub head: KnowledgeHead,
    pub relation: KnowledgeRelation,
    pub tails: Vec<String>,
}

impl Knowledge {
    pub fn new(head: KnowledgeHead, relation: KnowledgeRelation, tails: Vec<String>) -> Self {
        Self {
            head,
            relation,
            tails,
        }
    }

    /// Tuple with no tails yet (pre-generation).
    pub fn pending(head: KnowledgeHead, relation: KnowledgeRelation) -> Self {
        Self::new(head, relation, Vec::new())
    }

    /// Build a tuple from plain strings, parsing bracketed tail lists.
    pub fn from_parts(head: &str, relation: &str, tails: &str, schema: RelationSchema) -> Self {
        Self::new(
            KnowledgeHead::new(head, HeadKind::Sentence),
            KnowledgeRelation::from_text(relation, schema),
            parse_tail_cell(tails),
        )
    }

    /// Verbalize the tuple; with `include_tail` the first tail is appended.
    pub fn to_prompt(&self, include_tail: bool) -> RelationResult<String> {
        let tail = if include_tail {
            self.tails.first().map(String::as_str)
        } else {
            None
        };
        self.relation.verbalize(self.head.text(), tail)
    }

    /// Seq2seq prompt: `"{head} {relation} [GEN]"`.
    pub fn to_comet_prompt(&self) -> String {
        format!("{} {} {GEN_TOKEN}", self.head.text(), self.relation.text())
    }

    /// JSON view; with `only_one_tail` the `tails` field holds just the first tail.
    pub fn to_json(&self, only_one_tail: bool) -> serde_json::Value {
        if only_one_tail {
            json!({
                "head": self.head.text(),
                "relation": self.relation.text(),
                "tails": self.tails.first().cloned().unwrap_or_default(),
            })
        } else {
            json!({
                "head": self.head.text(),
                "relation": self.relation.text(),
                "tails": self.tails,
            })
        }
    }

    pub fn has_tails(&self) -> bool {
        !self.tails.is_empty()
    }

    fn tail_set(&self) -> BTreeSet<&str> {
        self.tails.iter().map(String::as_str).collect()
    }
}

impl PartialEq for Knowledge {
    fn eq(&self, other: &Self) -> bool {
        self.head == other.head
            && self.relation == other.relation
            && self.tail_set() == other.tail_set()
    }
}

impl Eq for Knowledge {}

impl Hash for Knowledge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.head.hash(state);
        self.relation.hash(state);
        // Sorted and deduplicated so the hash agrees with set equality.
        for tail in self.tail_set() {
            tail.hash(state);
        }
    }
}

impl fmt::Display for Knowledge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} --{}--> [{}]",
            self.head,
            self.relation,
            self.tails.join(", ")
        )
    }
}

/// Ordered collection of knowledge tuples with set algebra.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeGraph {
    graph: Vec<Knowledge>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn push(&mut self, knowledge: Knowledge) {
        self.graph.push(knowledge);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Knowledge> {
        self.graph.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Knowledge> {
        self.graph.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&Knowledge> {
        self.graph.get(index)
    }

    pub fn as_slice(&self) -> &[Knowledge] {
        &self.graph
    }

    pub fn into_vec(self) -> Vec<Knowledge> {
        self.graph
    }

    /// Set union: left tuples first, then unseen right tuples.
    pub fn union(&self, other: &KnowledgeGraph) -> KnowledgeGraph {
        let set: IndexSet<&Knowledge> = self.graph.iter().chain(other.graph.iter()).collect();
        set.into_iter().cloned().collect()
    }

    /// Set intersection in left-operand order.
    pub fn intersection(&self, other: &KnowledgeGraph) -> KnowledgeGraph {
        let right: IndexSet<&Knowledge> = other.graph.iter().collect();
        let set: IndexSet<&Knowledge> = self
            .graph
            .iter()
            .filter(|k| right.contains(*k))
            .collect();
        set.into_iter().cloned().collect()
    }

    /// Set difference in left-operand order.
    pub fn difference(&self, other: &KnowledgeGraph) -> KnowledgeGraph {
        let right: IndexSet<&Knowledge> = other.graph.iter().collect();
        let set: IndexSet<&Knowledge> = self
            .graph
            .iter()
            .filter(|k| !right.contains(*k))
            .collect();
        set.into_iter().cloned().collect()
    }

    /// Sort in place by head text, then relation corpus frequency, both
    /// descending. The sort is stable, so re-sorting is a no-op.
    pub fn sort(&mut self) -> &mut Self {
        self.graph.sort_by(|a, b| {
            b.head
                .text()
                .cmp(a.head.text())
                .then_with(|| {
                    relation_frequency(b.relation.text())
                        .cmp(&relation_frequency(a.relation.text()))
                })
        });
        self
    }

    /// Strip whitespace from tails, drop empty tails, and drop tuples left
    /// without tails.
    pub fn clean(&mut self) -> &mut Self {
        for knowledge in &mut self.graph {
            knowledge.tails = knowledge
                .tails
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }
        self.graph.retain(Knowledge::has_tails);
        self
    }

    pub fn sorted(mut self) -> Self {
        self.sort();
        self
    }

    pub fn cleaned(mut self) -> Self {
        self.clean();
        self
    }

    /// One-tail tabular view: `(head, relation, first tail)` per tuple.
    pub fn to_rows(&self) -> Vec<(String, String, String)> {
        self.graph
            .iter()
            .map(|k| {
                (
                    k.head.text().to_string(),
                    k.relation.text().to_string(),
                    k.tails.first().cloned().unwrap_or_default(),
                )
            })
            .collect()
    }

    /// JSON array of every tuple (see [`Knowledge::to_json`]).
    pub fn to_json(&self, only_one_tail: bool) -> serde_json::Value {
        serde_json::Value::Array(self.graph.iter().map(|k| k.to_json(only_one_tail)).collect())
    }
}

impl FromIterator<Knowledge> for KnowledgeGraph {
    fn from_iter<I: IntoIterator<Item = Knowledge>>(iter: I) -> Self {
        Self {
            graph: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Knowledge>> for KnowledgeGraph {
    fn from(graph: Vec<Knowledge>) -> Self {
        Self { graph }
    }
}

impl Extend<Knowledge> for KnowledgeGraph {
    fn extend<I: IntoIterator<Item = Knowledge>>(&mut self, iter: I) {
        self.graph.extend(iter);
    }
}

impl IntoIterator for KnowledgeGraph {
    type Item = Knowledge;
    type IntoIter = std::vec::IntoIter<Knowledge>;

    fn into_iter(self) -> Self::IntoIter {
        self.graph.into_iter()
    }
}

impl<'a> IntoIterator for &'a KnowledgeGraph {
    type Item = &'a Knowledge;
    type IntoIter = std::slice::Iter<'a, Knowledge>;

    fn into_iter(self) -> Self::IntoIter {
        self.graph.iter()
    }
}

impl Index<usize> for KnowledgeGraph {
    type Output = Knowledge;

    fn index(&self, index: usize) -> &Knowledge {
        &self.graph[index]
    }
}

impl BitOr for &KnowledgeGraph {
    type Output = KnowledgeGraph;

    fn bitor(self, rhs: Self) -> KnowledgeGraph {
        self.union(rhs)
    }
}

impl BitAnd for &KnowledgeGraph {
    type Output = KnowledgeGraph;

    fn bitand(self, rhs: Self) -> KnowledgeGraph {
        self.intersection(rhs)
    }
}

impl Sub for &KnowledgeGraph {
    type Output = KnowledgeGraph;

    fn sub(self, rhs: Self) -> KnowledgeGraph {
        self.difference(rhs)
    }
}

/// Concatenation is set union.
impl Add for KnowledgeGraph {
    type Output = KnowledgeGraph;

    fn add(self, rhs: Self) -> KnowledgeGraph {
        self.union(&rhs)
    }
}

/// Parse a bracketed list like `"[a, 'b', \"c, d\"]"` into its elements.
///
/// One pair of brackets is stripped. Elements are separated by commas,
/// except inside single- or double-quoted elements, where a backslash
/// escapes the next character. Unquoted elements are trimmed. Empty
/// elements are skipped.
pub fn text_to_list(text: &str) -> Vec<String> {
    let inner = text.trim();
    let inner = inner.strip_prefix('[').unwrap_or(inner);
    let inner = inner.strip_suffix(']').unwrap_or(inner);

    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else {
            break;
        };
        let item = if first == '\'' || first == '"' {
            chars.next();
            let mut item = String::new();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => item.extend(chars.next()),
                    c if c == first => break,
                    c => item.push(c),
                }
            }
            // Anything between the closing quote and the separator is dropped.
            chars.by_ref().take_while(|&c| c != ',').for_each(drop);
            item
        } else {
            let raw: String = chars.by_ref().take_while(|&c| c != ',').collect();
            raw.trim().to_string()
        };
        if !item.is_empty() {
            items.push(item);
        }
    }
    items
}

/// Render tails as a bracketed list that [`text_to_list`] reads back
/// unchanged: every tail is quoted, preferring single quotes.
pub fn list_to_text(tails: &[String]) -> String {
    let quoted: Vec<String> = tails
        .iter()
        .map(|tail| {
            let quote = if tail.contains('\'') && !tail.contains('"') {
                '"'
            } else {
                '\''
            };
            let mut out = String::with_capacity(tail.len() + 2);
            out.push(quote);
            for c in tail.chars() {
                if c == quote || c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push(quote);
            out
        })
        .collect();
    format!("[{}]", quoted.join(", "))
}

/// Interpret a tabular tail cell: bracketed lists are parsed, anything else
/// is one tail. A blank cell has no tails.
pub fn parse_tail_cell(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Vec::new()
    } else if trimmed.starts_with('[') && trimmed.ends_with(']') {
        text_to_list(trimmed)
    } else {
        vec![value.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(head: &str, relation: &str, tails: &[&str]) -> Knowledge {
        Knowledge::new(
            KnowledgeHead::new(head, HeadKind::Sentence),
            KnowledgeRelation::new(relation, RelationSchema::Atomic),
            tails.iter().map(|t| t.to_string()).collect(),
        )
    }

    #[test]
    fn tails_compare_as_sets() {
        assert_eq!(k("a", "xWant", &["b", "c"]), k("a", "xWant", &["c", "b"]));
        assert_eq!(k("a", "xWant", &["b", "b"]), k("a", "xWant", &["b"]));
        assert_ne!(k("a", "xWant", &["b"]), k("a", "xNeed", &["b"]));
    }

    #[test]
    fn equal_tuples_collapse_in_sets() {
        let set: IndexSet<Knowledge> = [k("a", "xWant", &["b", "c"]), k("A", "xWant", &["c", "b"])]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn union_keeps_left_order_then_unseen_right() {
        let left: KnowledgeGraph = vec![k("b", "xWant", &[]), k("a", "xWant", &[])].into();
        let right: KnowledgeGraph = vec![k("a", "xWant", &[]), k("c", "xWant", &[])].into();
        let union = &left | &right;
        let heads: Vec<_> = union.iter().map(|k| k.head.text()).collect();
        assert_eq!(heads, vec!["b", "a", "c"]);
    }

    #[test]
    fn intersection_and_difference() {
        let left: KnowledgeGraph = vec![k("a", "xWant", &["x"]), k("b", "xWant", &["y"])].into();
        let right: KnowledgeGraph = vec![k("b", "xWant", &["y"])].into();
        assert_eq!((&left & &right).len(), 1);
        let diff = &left - &right;
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].head.text(), "a");
    }

    #[test]
    fn sort_orders_by_head_then_frequency_descending() {
        let mut graph: KnowledgeGraph = vec![
            k("apple", "Causes", &[]),
            k("banana", "xReason", &[]),
            k("apple", "ObjectUse", &[]),
        ]
        .into();
        graph.sort();
        let order: Vec<_> = graph
            .iter()
            .map(|k| (k.head.text(), k.relation.text()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("banana", "xReason"),
                ("apple", "ObjectUse"),
                ("apple", "Causes"),
            ]
        );
    }

    #[test]
    fn clean_strips_and_drops() {
        let mut graph: KnowledgeGraph = vec![
            k("a", "xWant", &["  to eat ", "", "   "]),
            k("b", "xWant", &[" "]),
            k("c", "xWant", &[]),
        ]
        .into();
        graph.clean();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph[0].tails, vec!["to eat".to_string()]);
    }

    #[test]
    fn prompts() {
        let knowledge = k("PersonX buys a car", "xWant", &["to drive"]);
        assert_eq!(
            knowledge.to_prompt(true).unwrap(),
            "PersonX buys a car as a result, PersonX wants to drive"
        );
        assert_eq!(knowledge.to_comet_prompt(), "PersonX buys a car xWant [GEN]");
    }

    #[test]
    fn json_view_with_one_tail() {
        let knowledge = k("a", "xWant", &["b", "c"]);
        assert_eq!(knowledge.to_json(true)["tails"], "b");
        assert_eq!(knowledge.to_json(false)["tails"], json!(["b", "c"]));
    }

    #[test]
    fn tail_cells() {
        assert_eq!(parse_tail_cell("['to eat', sleep]"), vec!["to eat", "sleep"]);
        assert_eq!(parse_tail_cell("just one, with comma"), vec!["just one, with comma"]);
        assert!(parse_tail_cell("  ").is_empty());
        assert!(parse_tail_cell("[]").is_empty());
    }

    #[test]
    fn quoted_elements_keep_commas() {
        assert_eq!(
            text_to_list(r#"['to rest, then sleep', "PersonX's bed", it\'s]"#),
            vec!["to rest, then sleep", "PersonX's bed", "it\\'s"]
        );
        let tails: Vec<String> = vec![
            "to rest, then sleep".into(),
            "PersonX's \"big\" day".into(),
            r"back\slash".into(),
            "[bracketed]".into(),
        ];
        assert_eq!(text_to_list(&list_to_text(&tails)), tails);
        assert_eq!(list_to_text(&[]), "[]");
    }
}
