//! Knowledge heads: candidate subject phrases that knowledge is generated about.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// What kind of phrase a head is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadKind {
    /// A whole sentence (event-like head).
    #[default]
    Sentence,
    /// A noun or noun chunk.
    NounPhrase,
    /// A verb phrase such as "to sleep" or "eat apple".
    VerbPhrase,
}

impl HeadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HeadKind::Sentence => "sentence",
            HeadKind::NounPhrase => "noun_phrase",
            HeadKind::VerbPhrase => "verb_phrase",
        }
    }
}

impl fmt::Display for HeadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HeadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sentence" => Ok(Self::Sentence),
            "noun_phrase" | "noun" => Ok(Self::NounPhrase),
            "verb_phrase" | "verb" => Ok(Self::VerbPhrase),
            other => Err(format!(
                "unknown head kind \"{other}\" (expected sentence, noun_phrase or verb_phrase)"
            )),
        }
    }
}

/// Weak back-reference into the linguistic analysis a head came from.
///
/// Indices point into a [`Doc`](crate::nlp::Doc) that the head does not own;
/// they are only meaningful while that analysis is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    /// Sentence index.
    Sentence(usize),
    /// Single token index.
    Token(usize),
    /// Token range `[start, end)`.
    Span { start: usize, end: usize },
    /// A governing token and one of its dependents.
    TokenPair(usize, usize),
}

/// A candidate head.
///
/// Equality and hashing use the normalized text only (NFKC, lowercase,
/// collapsed whitespace); kind and entity are ignored.
#[derive(Debug, Clone)]
pub struct KnowledgeHead {
    text: String,
    kind: HeadKind,
    entity: Option<EntityRef>,
}

impl KnowledgeHead {
    pub fn new(text: impl AsRef<str>, kind: HeadKind) -> Self {
        Self {
            text: text.as_ref().trim().to_string(),
            kind,
            entity: None,
        }
    }

    pub fn with_entity(mut self, entity: EntityRef) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> HeadKind {
        self.kind
    }

    pub fn entity(&self) -> Option<EntityRef> {
        self.entity
    }

    /// Key used for equality and dedup.
    pub fn key(&self) -> String {
        normalize_key(&self.text)
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

impl PartialEq for KnowledgeHead {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for KnowledgeHead {}

impl Hash for KnowledgeHead {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for KnowledgeHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for KnowledgeHead {
    fn from(text: &str) -> Self {
        Self::new(text, HeadKind::Sentence)
    }
}

/// NFKC-normalize, lowercase, and collapse internal whitespace.
pub fn normalize_key(text: &str) -> String {
    let folded: String = text.nfkc().collect::<String>().to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
