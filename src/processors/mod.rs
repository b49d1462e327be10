//! Pluggable processors: head extractors and relation matchers.
//!
//! Both are trait objects held by name in the orchestrator's registries.
//! New strategies plug in by implementing [`HeadExtractor`] or
//! [`RelationMatcher`] and registering through
//! [`CommonsenseInference::add_processor`](crate::inference::CommonsenseInference::add_processor).

pub mod head;
pub mod relation;

pub use head::{
    HeadExtractor, NounPhraseHeadExtractor, SentenceHeadExtractor, VerbPhraseHeadExtractor,
};
pub use relation::{
    BaseRelationMatcher, GraphRelationMatcher, HeadRelationPair, RelationMatcher,
    SimpleRelationMatcher,
};
