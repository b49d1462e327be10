//! Evaluation of generated tails against reference tails.
//!
//! Generated and reference tuples are paired by head and relation; every
//! generated tail is scored against all reference tails of its pair.
//! Tuples without a reference counterpart are skipped.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

use crate::graph::KnowledgeGraph;

const MAX_ORDER: usize = 4;
/// Numerator used in place of zero n-gram matches.
const SMOOTHING_EPSILON: f64 = 0.1;

/// Corpus-level scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Evaluation {
    /// Corpus BLEU up to 4-grams with brevity penalty, in `[0, 1]`.
    pub bleu: f64,
    /// Mean ROUGE-L F1, in `[0, 1]`.
    pub rouge_l: f64,
    /// Tuples that had a reference.
    pub pairs: usize,
    /// Generated tails scored.
    pub tails: usize,
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn ngrams(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    if tokens.len() >= n {
        for gram in tokens.windows(n) {
            *counts.entry(gram).or_insert(0) += 1;
        }
    }
    counts
}

fn lcs_len(a: &[String], b: &[String]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for x in a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// ROUGE-L F1 of a hypothesis against its best-matching reference.
pub fn rouge_l(hypothesis: &str, references: &[&str]) -> f64 {
    let hyp = tokenize(hypothesis);
    if hyp.is_empty() {
        return 0.0;
    }
    references
        .iter()
        .map(|r| {
            let reference = tokenize(r);
            let lcs = lcs_len(&hyp, &reference) as f64;
            if lcs == 0.0 {
                return 0.0;
            }
            let precision = lcs / hyp.len() as f64;
            let recall = lcs / reference.len() as f64;
            2.0 * precision * recall / (precision + recall)
        })
        .fold(0.0, f64::max)
}

#[derive(Debug, Default)]
struct BleuStats {
    matches: [usize; MAX_ORDER],
    totals: [usize; MAX_ORDER],
    hyp_len: usize,
    ref_len: usize,
}

impl BleuStats {
    fn add(&mut self, hypothesis: &[String], references: &[Vec<String>]) {
        for n in 1..=MAX_ORDER {
            let hyp_counts = ngrams(hypothesis, n);
            let mut max_ref: HashMap<&[String], usize> = HashMap::new();
            for reference in references {
                for (gram, count) in ngrams(reference, n) {
                    let slot = max_ref.entry(gram).or_insert(0);
                    *slot = (*slot).max(count);
                }
            }
            for (gram, count) in &hyp_counts {
                self.matches[n - 1] += (*count).min(max_ref.get(gram).copied().unwrap_or(0));
                self.totals[n - 1] += count;
            }
        }
        self.hyp_len += hypothesis.len();
        // Closest reference length, shorter wins ties.
        self.ref_len += references
            .iter()
            .map(Vec::len)
            .min_by_key(|len| (len.abs_diff(hypothesis.len()), *len))
            .unwrap_or(0);
    }

    fn score(&self) -> f64 {
        if self.hyp_len == 0 {
            return 0.0;
        }
        let orders: Vec<f64> = (0..MAX_ORDER)
            .filter(|&i| self.totals[i] > 0)
            .map(|i| {
                let matches = if self.matches[i] == 0 {
                    SMOOTHING_EPSILON
                } else {
                    self.matches[i] as f64
                };
                (matches / self.totals[i] as f64).ln()
            })
            .collect();
        if orders.is_empty() || self.matches[0] == 0 {
            return 0.0;
        }
        let log_precision = orders.iter().sum::<f64>() / orders.len() as f64;
        let brevity = if self.hyp_len >= self.ref_len {
            1.0
        } else {
            (1.0 - self.ref_len as f64 / self.hyp_len as f64).exp()
        };
        brevity * log_precision.exp()
    }
}

/// Score `generated` against `reference`.
pub fn evaluate(generated: &KnowledgeGraph, reference: &KnowledgeGraph) -> Evaluation {
    let mut references: IndexMap<(String, String), Vec<String>> = IndexMap::new();
    for knowledge in reference {
        references
            .entry((knowledge.head.key(), knowledge.relation.text().to_string()))
            .or_default()
            .extend(knowledge.tails.iter().map(|t| t.trim().to_string()));
    }

    let mut bleu = BleuStats::default();
    let mut rouge_sum = 0.0;
    let mut eval = Evaluation::default();

    for knowledge in generated {
        let key = (knowledge.head.key(), knowledge.relation.text().to_string());
        let Some(refs) = references.get(&key).filter(|r| !r.is_empty()) else {
            continue;
        };
        eval.pairs += 1;
        let ref_tokens: Vec<Vec<String>> = refs.iter().map(|r| tokenize(r)).collect();
        let ref_strs: Vec<&str> = refs.iter().map(String::as_str).collect();
        for tail in &knowledge.tails {
            bleu.add(&tokenize(tail), &ref_tokens);
            rouge_sum += rouge_l(tail, &ref_strs);
            eval.tails += 1;
        }
    }

    if eval.tails > 0 {
        eval.bleu = bleu.score();
        eval.rouge_l = rouge_sum / eval.tails as f64;
    }
    tracing::debug!(pairs = eval.pairs, tails = eval.tails, bleu = eval.bleu, rouge_l = eval.rouge_l, "evaluated");
    eval
}
