//! Deterministic hyperdimensional text encoder.
//!
//! Text is mapped into binary hypervector space: every word and every
//! character trigram of a word gets a pseudo-random vector seeded from its
//! hash, and a text is the majority bundle of its features. Texts sharing
//! words or word stems end up measurably closer than the ~0.5 similarity of
//! unrelated vectors. Used as the similarity backend for the graph relation
//! matcher and the default context linker.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::{RngCore, SeedableRng};

use crate::nlp::stopwords::is_excluded;

/// Default vector width in bits.
pub const DEFAULT_DIMENSION: usize = 2048;

/// A bit-packed binary hypervector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperVec {
    words: Vec<u64>,
    dim: usize,
}

impl HyperVec {
    pub fn zero(dim: usize) -> Self {
        Self {
            words: vec![0; dim.div_ceil(64)],
            dim,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn get_bit(&self, i: usize) -> bool {
        (self.words[i / 64] >> (i % 64)) & 1 == 1
    }

    pub fn set_bit(&mut self, i: usize, value: bool) {
        let mask = 1u64 << (i % 64);
        if value {
            self.words[i / 64] |= mask;
        } else {
            self.words[i / 64] &= !mask;
        }
    }

    fn mask_tail(&mut self) {
        let used = self.dim % 64;
        if used != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << used) - 1;
            }
        }
    }

    /// Number of differing bits. Vectors of different width never match.
    pub fn hamming(&self, other: &HyperVec) -> usize {
        if self.dim != other.dim {
            return self.dim.max(other.dim);
        }
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a ^ b).count_ones() as usize)
            .sum()
    }

    /// `1 - hamming / dim`: 1.0 for identical vectors, ~0.5 for unrelated ones.
    pub fn similarity(&self, other: &HyperVec) -> f32 {
        if self.dim == 0 {
            return 0.0;
        }
        1.0 - self.hamming(other) as f32 / self.dim as f32
    }
}

/// Majority-vote bundle; ties are broken by bit-position parity.
pub fn bundle(vectors: &[&HyperVec]) -> Option<HyperVec> {
    let first = vectors.first()?;
    let dim = first.dim;
    if vectors.iter().any(|v| v.dim != dim) {
        return None;
    }

    let mut acc = vec![0i32; dim];
    for v in vectors {
        for (i, slot) in acc.iter_mut().enumerate() {
            *slot += if v.get_bit(i) { 1 } else { -1 };
        }
    }

    let mut out = HyperVec::zero(dim);
    for (i, &count) in acc.iter().enumerate() {
        out.set_bit(i, count > 0 || (count == 0 && i % 2 == 0));
    }
    Some(out)
}

/// Encodes words and texts into hypervectors of a fixed width.
#[derive(Debug, Clone, Copy)]
pub struct SemanticEncoder {
    dimension: usize,
}

impl Default for SemanticEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl SemanticEncoder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Deterministic vector for one token. The same token always yields
    /// the same vector.
    pub fn encode_token(&self, token: &str) -> HyperVec {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        let mut rng = rand::rngs::StdRng::seed_from_u64(hasher.finish());

        let mut v = HyperVec::zero(self.dimension);
        for word in v.words.iter_mut() {
            *word = rng.next_u64();
        }
        v.mask_tail();
        v
    }

    /// Encode a text as the bundle of its content words and their trigrams.
    ///
    /// Stop words are skipped unless the text has nothing else. Returns
    /// `None` for text without any word characters.
    pub fn encode_text(&self, text: &str) -> Option<HyperVec> {
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();
        let content: Vec<&String> = words.iter().filter(|w| !is_excluded(w)).collect();
        let chosen: Vec<&String> = if content.is_empty() {
            words.iter().collect()
        } else {
            content
        };
        if chosen.is_empty() {
            return None;
        }

        let mut features = Vec::new();
        for word in chosen {
            features.push(self.encode_token(word));
            let padded: Vec<char> = format!("#{word}#").chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                features.push(self.encode_token(&format!("3:{gram}")));
            }
        }
        let refs: Vec<&HyperVec> = features.iter().collect();
        bundle(&refs)
    }

    /// Similarity of two texts in `[0, 1]`; 0.0 when either has no words.
    pub fn text_similarity(&self, a: &str, b: &str) -> f32 {
        match (self.encode_text(a), self.encode_text(b)) {
            (Some(a), Some(b)) => a.similarity(&b),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_encoding_is_deterministic() {
        let enc = SemanticEncoder::new(1000);
        assert_eq!(enc.encode_token("cat"), enc.encode_token("cat"));
        assert_ne!(enc.encode_token("cat"), enc.encode_token("dog"));
    }

    #[test]
    fn unrelated_tokens_are_near_half() {
        let enc = SemanticEncoder::default();
        let sim = enc.encode_token("cat").similarity(&enc.encode_token("carburetor"));
        assert!((0.4..0.6).contains(&sim), "sim={sim}");
    }

    #[test]
    fn tail_bits_are_masked() {
        let enc = SemanticEncoder::new(70);
        let v = enc.encode_token("x");
        assert_eq!(v.words.len(), 2);
        assert_eq!(v.words[1] >> 6, 0);
    }

    #[test]
    fn bundle_is_similar_to_inputs() {
        let enc = SemanticEncoder::default();
        let a = enc.encode_token("a");
        let b = enc.encode_token("b");
        let c = enc.encode_token("c");
        let bundled = bundle(&[&a, &b, &c]).unwrap();
        for v in [&a, &b, &c] {
            assert!(bundled.similarity(v) > 0.55);
        }
    }

    #[test]
    fn bundle_rejects_mixed_widths() {
        let a = SemanticEncoder::new(64).encode_token("a");
        let b = SemanticEncoder::new(128).encode_token("a");
        assert!(bundle(&[&a, &b]).is_none());
        assert!(bundle(&[]).is_none());
    }

    #[test]
    fn shared_words_raise_similarity() {
        let enc = SemanticEncoder::default();
        let related = enc.text_similarity("the cat eats fish", "a cat eating fish");
        let unrelated = enc.text_similarity("the cat eats fish", "stock markets crashed");
        assert!(related > unrelated, "{related} <= {unrelated}");
        assert_eq!(enc.text_similarity("", "cat"), 0.0);
    }
}
