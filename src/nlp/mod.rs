//! Linguistic analysis contract.
//!
//! Head extractors and linkers only see text through a [`LanguagePipeline`],
//! which turns a string into a [`Doc`]: tokens with part-of-speech tags,
//! lemmas and a shallow dependency tree, sentence boundaries, and noun chunks.
//! Any tagger can sit behind the trait; [`RuleBasedPipeline`] is the built-in
//! English one.

pub mod rules;
pub mod stopwords;

use std::ops::Range;

pub use rules::RuleBasedPipeline;

/// Coarse part-of-speech tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pos {
    Noun,
    ProperNoun,
    Verb,
    Aux,
    Adj,
    Adv,
    Det,
    Pron,
    Adp,
    Conj,
    Num,
    Part,
    Punct,
    Other,
}

/// Dependency label relative to the token's head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dep {
    Root,
    Nsubj,
    /// Direct object.
    Dobj,
    /// Attribute of a copula ("is a *cat*").
    Attr,
    Det,
    Amod,
    Aux,
    Prep,
    Pobj,
    Punct,
    Other,
}

#[derive(Debug, Clone)]
pub struct Token {
    /// Position in [`Doc::tokens`].
    pub i: usize,
    /// Surface text.
    pub text: String,
    /// Lowercase dictionary form.
    pub lemma: String,
    pub pos: Pos,
    pub dep: Dep,
    /// Index of the governing token (self for the sentence root).
    pub head: usize,
    /// Sentence index.
    pub sent: usize,
    /// Byte offset into the analyzed text.
    pub idx: usize,
}

impl Token {
    pub fn lower(&self) -> String {
        self.text.to_lowercase()
    }

    pub fn is_punct(&self) -> bool {
        self.pos == Pos::Punct
    }
}

/// Result of analyzing one text.
#[derive(Debug, Clone, Default)]
pub struct Doc {
    pub text: String,
    pub tokens: Vec<Token>,
    /// Token ranges of each sentence.
    pub sentences: Vec<Range<usize>>,
    /// Token ranges of each base noun phrase.
    pub noun_chunks: Vec<Range<usize>>,
}

impl Doc {
    /// Source text covered by a token range.
    pub fn span_text(&self, range: Range<usize>) -> &str {
        if range.start >= range.end || range.end > self.tokens.len() {
            return "";
        }
        let start = self.tokens[range.start].idx;
        let last = &self.tokens[range.end - 1];
        &self.text[start..last.idx + last.text.len()]
    }

    /// Sentence texts in order.
    pub fn sentence_texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.sentences.iter().map(|r| self.span_text(r.clone()))
    }

    /// Tokens whose head is `i`.
    pub fn children(&self, i: usize) -> impl Iterator<Item = &Token> + '_ {
        self.tokens.iter().filter(move |t| t.head == i && t.i != i)
    }
}

/// Opaque linguistic analyzer.
pub trait LanguagePipeline: Send + Sync {
    fn name(&self) -> &str;

    /// Analyze text. Deterministic for a fixed pipeline.
    fn analyze(&self, text: &str) -> Doc;

    /// Split text into non-blank sentences.
    fn sentences(&self, text: &str) -> Vec<String> {
        self.analyze(text)
            .sentence_texts()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}
