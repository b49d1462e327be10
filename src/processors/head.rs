//! Head extractors.

use std::collections::HashSet;

use crate::head::{EntityRef, HeadKind, KnowledgeHead};
use crate::nlp::stopwords::is_excluded;
use crate::nlp::{Dep, Doc, LanguagePipeline, Pos};

/// Produces candidate heads from text.
///
/// Implementations must be deterministic for a fixed input and pipeline.
/// When `doc` is given it is the pipeline's analysis of `text` and should be
/// reused instead of analyzing again.
pub trait HeadExtractor: Send + Sync {
    /// Registry name.
    fn name(&self) -> &str;

    fn extract(
        &self,
        text: &str,
        doc: Option<&Doc>,
        nlp: &dyn LanguagePipeline,
    ) -> Vec<KnowledgeHead>;
}

fn with_doc<T>(
    text: &str,
    doc: Option<&Doc>,
    nlp: &dyn LanguagePipeline,
    f: impl FnOnce(&Doc) -> T,
) -> T {
    match doc {
        Some(doc) => f(doc),
        None => f(&nlp.analyze(text)),
    }
}

fn strip_punctuation(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
}

/// One head per non-blank sentence.
#[derive(Debug, Clone)]
pub struct SentenceHeadExtractor {
    name: String,
}

impl SentenceHeadExtractor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for SentenceHeadExtractor {
    fn default() -> Self {
        Self::new("sentence_extractor")
    }
}

impl HeadExtractor for SentenceHeadExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(
        &self,
        text: &str,
        doc: Option<&Doc>,
        nlp: &dyn LanguagePipeline,
    ) -> Vec<KnowledgeHead> {
        with_doc(text, doc, nlp, |doc| {
            doc.sentence_texts()
                .enumerate()
                .filter(|(_, s)| !s.trim().is_empty())
                .map(|(i, s)| {
                    KnowledgeHead::new(s, HeadKind::Sentence).with_entity(EntityRef::Sentence(i))
                })
                .collect()
        })
    }
}

/// Common nouns and noun chunks, minus stop words and placeholders.
#[derive(Debug, Clone)]
pub struct NounPhraseHeadExtractor {
    name: String,
}

impl NounPhraseHeadExtractor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for NounPhraseHeadExtractor {
    fn default() -> Self {
        Self::new("noun_phrase_extractor")
    }
}

impl HeadExtractor for NounPhraseHeadExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(
        &self,
        text: &str,
        doc: Option<&Doc>,
        nlp: &dyn LanguagePipeline,
    ) -> Vec<KnowledgeHead> {
        with_doc(text, doc, nlp, |doc| {
            let mut seen = HashSet::new();
            let mut heads = Vec::new();

            for token in doc.tokens.iter().filter(|t| t.pos == Pos::Noun) {
                if is_excluded(&token.text) {
                    continue;
                }
                let stripped = strip_punctuation(&token.text);
                if stripped.chars().count() > 1 && seen.insert(stripped.to_lowercase()) {
                    heads.push(
                        KnowledgeHead::new(stripped, HeadKind::NounPhrase)
                            .with_entity(EntityRef::Token(token.i)),
                    );
                }
            }

            for chunk in &doc.noun_chunks {
                let chunk_doc = nlp.analyze(doc.span_text(chunk.clone()));
                let kept: Vec<&str> = chunk_doc
                    .tokens
                    .iter()
                    .filter(|t| !t.is_punct() && !is_excluded(&t.text))
                    .map(|t| t.text.as_str())
                    .collect();
                let joined = kept.join(" ");
                let stripped = strip_punctuation(&joined);
                if stripped.chars().count() > 1 && seen.insert(stripped.to_lowercase()) {
                    heads.push(
                        KnowledgeHead::new(stripped, HeadKind::NounPhrase).with_entity(
                            EntityRef::Span {
                                start: chunk.start,
                                end: chunk.end,
                            },
                        ),
                    );
                }
            }
            heads
        })
    }
}

/// `"to {lemma}"` for every verb, plus `"{lemma} {object}"` for its direct
/// objects and attributes.
#[derive(Debug, Clone)]
pub struct VerbPhraseHeadExtractor {
    name: String,
}

impl VerbPhraseHeadExtractor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for VerbPhraseHeadExtractor {
    fn default() -> Self {
        Self::new("verb_phrase_extractor")
    }
}

impl HeadExtractor for VerbPhraseHeadExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(
        &self,
        text: &str,
        doc: Option<&Doc>,
        nlp: &dyn LanguagePipeline,
    ) -> Vec<KnowledgeHead> {
        with_doc(text, doc, nlp, |doc| {
            let mut seen = HashSet::new();
            let mut heads = Vec::new();
            let mut push = |text: String, entity: EntityRef| {
                if seen.insert(text.clone()) {
                    heads.push(KnowledgeHead::new(text, HeadKind::VerbPhrase).with_entity(entity));
                }
            };

            for verb in doc.tokens.iter().filter(|t| t.pos == Pos::Verb) {
                push(format!("to {}", verb.lemma), EntityRef::Token(verb.i));
                for child in doc
                    .children(verb.i)
                    .filter(|c| matches!(c.dep, Dep::Dobj | Dep::Attr))
                {
                    push(
                        format!("{} {}", verb.lemma, child.text),
                        EntityRef::TokenPair(verb.i, child.i),
                    );
                }
            }
            heads
        })
    }
}
