//! Relation taxonomy: schemas, relation tables, and verbalization.
//!
//! All tables here are process-wide, read-only `static` data. They cover the
//! three supported knowledge-base schemas (ATOMIC-2020, ConceptNet, TransOMCS),
//! the head-kind to allowed-relations table used by relation matching, the
//! ConceptNet → ATOMIC mapping, natural-language phrases for every relation,
//! and ATOMIC-2020 corpus frequencies used as a sort tie-break.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RelationError, RelationResult};
use crate::head::HeadKind;

/// Which knowledge-base schema a relation belongs to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RelationSchema {
    /// ATOMIC-2020: social, physical, and event relations.
    #[default]
    Atomic,
    /// ConceptNet 5 relations.
    ConceptNet,
    /// TransOMCS (ConceptNet-style relations mined from text).
    TransOmcs,
}

impl RelationSchema {
    /// Every relation name of this schema, in declaration order.
    pub fn relations(self) -> &'static [&'static str] {
        match self {
            RelationSchema::Atomic => ATOMIC_RELATIONS,
            RelationSchema::ConceptNet => CONCEPTNET_RELATIONS,
            RelationSchema::TransOmcs => TRANSOMCS_RELATIONS,
        }
    }

    /// Position of `relation` in this schema's declaration order.
    pub fn rank(self, relation: &str) -> Option<usize> {
        self.relations().iter().position(|r| *r == relation)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelationSchema::Atomic => "atomic",
            RelationSchema::ConceptNet => "conceptnet",
            RelationSchema::TransOmcs => "transomcs",
        }
    }
}

impl fmt::Display for RelationSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "atomic" | "atomic2020" => Ok(Self::Atomic),
            "conceptnet" => Ok(Self::ConceptNet),
            "transomcs" => Ok(Self::TransOmcs),
            other => Err(format!(
                "unknown relation schema \"{other}\" (expected atomic, conceptnet or transomcs)"
            )),
        }
    }
}

/// A named commonsense relation tagged with its schema.
///
/// Immutable after construction. Equality and hashing cover both the name and
/// the schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KnowledgeRelation {
    text: String,
    schema: RelationSchema,
}

impl KnowledgeRelation {
    /// Create a relation with the name taken verbatim.
    pub fn new(text: impl Into<String>, schema: RelationSchema) -> Self {
        Self {
            text: text.into(),
            schema,
        }
    }

    /// Parse a relation name, canonicalizing its spelling against the schema's
    /// table case-insensitively. Unknown names are kept verbatim (trimmed).
    pub fn from_text(text: &str, schema: RelationSchema) -> Self {
        let trimmed = text.trim();
        let canonical = schema
            .relations()
            .iter()
            .chain(ALL_RELATIONS.iter())
            .find(|r| r.eq_ignore_ascii_case(trimmed))
            .map(|r| (*r).to_string())
            .unwrap_or_else(|| trimmed.to_string());
        Self::new(canonical, schema)
    }

    /// All relations of a schema, in declaration order.
    pub fn all(schema: RelationSchema) -> Vec<Self> {
        schema
            .relations()
            .iter()
            .map(|r| Self::new(*r, schema))
            .collect()
    }

    /// Relations allowed for a head kind (ATOMIC-2020 schema).
    pub fn for_head_kind(kind: HeadKind) -> Vec<Self> {
        head_relations(kind)
            .iter()
            .map(|r| Self::new(*r, RelationSchema::Atomic))
            .collect()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn schema(&self) -> RelationSchema {
        self.schema
    }

    /// Whether the name appears in this relation's schema table.
    pub fn is_known(&self) -> bool {
        self.schema.rank(&self.text).is_some()
    }

    /// Natural-language phrase for this relation.
    pub fn natural_language(&self) -> RelationResult<&'static str> {
        relation_to_nl(&self.text).ok_or_else(|| RelationError::UnknownRelation {
            relation: self.text.clone(),
            schema: self.schema.to_string(),
        })
    }

    /// Render `"{head} {phrase}"`, followed by `" {tail}"` when a tail is given.
    pub fn verbalize(&self, head: &str, tail: Option<&str>) -> RelationResult<String> {
        let phrase = self.natural_language()?;
        let mut out = format!("{} {phrase}", head.trim());
        if let Some(tail) = tail.map(str::trim).filter(|t| !t.is_empty()) {
            out.push(' ');
            out.push_str(tail);
        }
        Ok(out)
    }

    /// Map a ConceptNet/TransOMCS relation onto ATOMIC-2020.
    ///
    /// ATOMIC relations map to themselves; relations without a mapping yield
    /// an empty list.
    pub fn to_atomic(&self) -> Vec<Self> {
        if self.schema == RelationSchema::Atomic {
            return vec![self.clone()];
        }
        conceptnet_to_atomic(&self.text)
            .iter()
            .map(|r| Self::new(*r, RelationSchema::Atomic))
            .collect()
    }

    /// ATOMIC-2020 corpus frequency of this relation (0 when unknown).
    pub fn frequency(&self) -> u32 {
        relation_frequency(&self.text)
    }
}

impl fmt::Display for KnowledgeRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// ---------------------------------------------------------------------------
// Relation tables
// ---------------------------------------------------------------------------

/// Union of every relation name known across schemas.
pub static ALL_RELATIONS: &[&str] = &[
    "AtLocation",
    "CapableOf",
    "Causes",
    "CausesDesire",
    "CreatedBy",
    "DefinedAs",
    "DesireOf",
    "Desires",
    "HasA",
    "HasFirstSubevent",
    "HasLastSubevent",
    "HasPainCharacter",
    "HasPainIntensity",
    "HasPrerequisite",
    "HasProperty",
    "HasSubEvent",
    "HasSubevent",
    "HinderedBy",
    "InheritsFrom",
    "InstanceOf",
    "IsA",
    "LocatedNear",
    "LocationOfAction",
    "MadeOf",
    "MadeUpOf",
    "MotivatedByGoal",
    "NotCapableOf",
    "NotDesires",
    "NotHasA",
    "NotHasProperty",
    "NotIsA",
    "NotMadeOf",
    "ObjectUse",
    "PartOf",
    "ReceivesAction",
    "RelatedTo",
    "SymbolOf",
    "UsedFor",
    "isAfter",
    "isBefore",
    "isFilledBy",
    "oEffect",
    "oReact",
    "oWant",
    "xAttr",
    "xEffect",
    "xIntent",
    "xNeed",
    "xReact",
    "xReason",
    "xWant",
];

pub static ATOMIC_RELATIONS: &[&str] = &[
    "AtLocation",
    "CapableOf",
    "Causes",
    "Desires",
    "HasProperty",
    "HasSubEvent",
    "HinderedBy",
    "MadeUpOf",
    "NotDesires",
    "isAfter",
    "isBefore",
    "isFilledBy",
    "oEffect",
    "oReact",
    "oWant",
    "xAttr",
    "xEffect",
    "xIntent",
    "xNeed",
    "xReact",
    "xReason",
    "xWant",
    "ObjectUse",
];

pub static CONCEPTNET_RELATIONS: &[&str] = &[
    "AtLocation",
    "CapableOf",
    "Causes",
    "CausesDesire",
    "CreatedBy",
    "DefinedAs",
    "Desires",
    "HasA",
    "HasFirstSubevent",
    "HasLastSubevent",
    "HasPrerequisite",
    "HasProperty",
    "HasSubevent",
    "InheritsFrom",
    "InstanceOf",
    "IsA",
    "MadeOf",
    "MotivatedByGoal",
    "NotCapableOf",
    "NotDesires",
    "NotHasA",
    "NotHasProperty",
    "NotIsA",
    "NotMadeOf",
    "PartOf",
    "ReceivesAction",
    "SymbolOf",
    "UsedFor",
];

pub static TRANSOMCS_RELATIONS: &[&str] = &[
    "AtLocation",
    "CapableOf",
    "Causes",
    "CausesDesire",
    "CreatedBy",
    "DefinedAs",
    "DesireOf",
    "Desires",
    "HasA",
    "HasFirstSubevent",
    "HasLastSubevent",
    "HasPainCharacter",
    "HasPainIntensity",
    "HasPrerequisite",
    "HasProperty",
    "HasSubevent",
    "InheritsFrom",
    "InstanceOf",
    "IsA",
    "LocatedNear",
    "LocationOfAction",
    "MadeOf",
    "MotivatedByGoal",
    "NotCapableOf",
    "NotDesires",
    "NotHasA",
    "NotHasProperty",
    "NotIsA",
    "NotMadeOf",
    "PartOf",
    "ReceivesAction",
    "RelatedTo",
    "SymbolOf",
    "UsedFor",
];

pub static PHYSICAL_RELATIONS: &[&str] = &[
    "ObjectUse",
    "CapableOf",
    "MadeUpOf",
    "HasProperty",
    "Desires",
    "NotDesires",
    "AtLocation",
];

pub static EVENT_RELATIONS: &[&str] = &[
    "Causes",
    "HinderedBy",
    "xReason",
    "isAfter",
    "isBefore",
    "HasSubEvent",
    "isFilledBy",
];

pub static SOCIAL_RELATIONS: &[&str] = &[
    "xIntent", "xReact", "oReact", "xAttr", "xEffect", "xNeed", "xWant", "oEffect", "oWant",
];

static SENTENCE_RELATIONS: &[&str] = &[
    "Causes",
    "HinderedBy",
    "xReason",
    "isAfter",
    "isBefore",
    "HasSubEvent",
    "isFilledBy",
    "xIntent",
    "xReact",
    "oReact",
    "xAttr",
    "xEffect",
    "xNeed",
    "xWant",
    "oEffect",
    "oWant",
];

/// Relations statically allowed for a head kind.
///
/// Sentences take event + social relations, noun phrases take physical
/// relations, verb phrases take event relations.
pub fn head_relations(kind: HeadKind) -> &'static [&'static str] {
    match kind {
        HeadKind::Sentence => SENTENCE_RELATIONS,
        HeadKind::NounPhrase => PHYSICAL_RELATIONS,
        HeadKind::VerbPhrase => EVENT_RELATIONS,
    }
}

/// ATOMIC-2020 relations a ConceptNet relation maps onto.
pub fn conceptnet_to_atomic(relation: &str) -> &'static [&'static str] {
    match relation {
        "Causes" => &["Causes", "xEffect"],
        "CausesDesire" => &["xWant"],
        "MadeOf" => &["MadeUpOf"],
        "HasA" => &["MadeUpOf", "HasProperty"],
        "HasPrerequisite" => &["xNeed"],
        "HasSubevent" | "HasFirstSubevent" | "HasLastSubevent" => &["HasSubEvent"],
        "MotivatedByGoal" => &["xIntent", "xReason"],
        "PartOf" => &["MadeUpOf"],
        "UsedFor" => &["ObjectUse"],
        "ReceivesAction" => &["MadeUpOf", "AtLocation", "Causes", "ObjectUse"],
        _ => &[],
    }
}

/// Natural-language phrase for a relation name.
pub fn relation_to_nl(relation: &str) -> Option<&'static str> {
    let phrase = match relation {
        "AtLocation" => "located or found at or in or on",
        "CapableOf" => "is or are capable of",
        "Causes" => "causes",
        "CausesDesire" => "makes someone want",
        "CreatedBy" => "is created by",
        "DefinedAs" => "is defined as",
        "DesireOf" => "is desired by",
        "Desires" => "desires",
        "HasA" => "has, possesses or contains",
        "HasFirstSubevent" => "begins with the event or action",
        "HasLastSubevent" => "ends with the event or action",
        "HasPainCharacter" => "has the pain character of",
        "HasPainIntensity" => "has the pain intensity of",
        "HasPrerequisite" => "to do this, one requires",
        "HasProperty" => "can be characterized by being or having",
        "HasSubEvent" | "HasSubevent" => "includes the event or action",
        "HinderedBy" => "can be hindered by",
        "InheritsFrom" => "inherits from",
        "InstanceOf" => "is an example or instance of",
        "IsA" => "is a",
        "LocatedNear" => "is located near",
        "LocationOfAction" => "is the location of the action",
        "MadeOf" => "is made of",
        "MadeUpOf" => "made up of",
        "MotivatedByGoal" => "is a step towards accomplishing the goal",
        "NotCapableOf" => "is not capable of",
        "NotDesires" => "do not desire",
        "NotHasA" => "does not have",
        "NotHasProperty" => "cannot be characterized by being or having",
        "NotIsA" => "is not a",
        "NotMadeOf" => "is not made of",
        "ObjectUse" | "UsedFor" => "used for",
        "PartOf" => "is a part of",
        "ReceivesAction" => "can receive or be affected by the action",
        "RelatedTo" => "is related to",
        "SymbolOf" => "is a symbol of",
        "isAfter" => "happens after",
        "isBefore" => "happens before",
        "isFilledBy" => "blank can be filled by",
        "oEffect" => "as a result, Y or others will",
        "oReact" => "as a result, Y or others feel",
        "oWant" => "as a result, Y or others want",
        "xAttr" => "X is seen as",
        "xEffect" => "as a result, PersonX will",
        "xIntent" => "because PersonX wanted",
        "xNeed" => "but before, PersonX needed",
        "xReact" => "as a result, PersonX feels",
        "xReason" => "because",
        "xWant" => "as a result, PersonX wants",
        _ => return None,
    };
    Some(phrase)
}

/// Number of ATOMIC-2020 tuples carrying a relation (0 when unknown).
pub fn relation_frequency(relation: &str) -> u32 {
    match relation {
        "ObjectUse" => 165_590,
        "xAttr" => 110_791,
        "xWant" => 109_098,
        "HinderedBy" => 106_658,
        "AtLocation" => 102_861,
        "xNeed" => 100_995,
        "xEffect" => 78_832,
        "xReact" => 62_969,
        "xIntent" => 57_685,
        "oWant" => 43_079,
        "isFilledBy" => 33_266,
        "oEffect" => 28_351,
        "oReact" => 26_570,
        "isBefore" => 23_208,
        "isAfter" => 22_453,
        "HasSubEvent" => 12_845,
        "CapableOf" => 7_968,
        "HasProperty" => 5_617,
        "MadeUpOf" => 3_345,
        "NotDesires" => 2_737,
        "Desires" => 1_996,
        "Causes" => 376,
        "xReason" => 334,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_schema_relation_has_a_phrase() {
        for schema in [
            RelationSchema::Atomic,
            RelationSchema::ConceptNet,
            RelationSchema::TransOmcs,
        ] {
            for rel in schema.relations() {
                assert!(relation_to_nl(rel).is_some(), "{schema}: {rel} has no phrase");
            }
        }
    }

    #[test]
    fn head_tables_only_name_atomic_relations() {
        for kind in [HeadKind::Sentence, HeadKind::NounPhrase, HeadKind::VerbPhrase] {
            for rel in head_relations(kind) {
                assert!(RelationSchema::Atomic.rank(rel).is_some(), "{rel}");
            }
        }
    }

    #[test]
    fn from_text_canonicalizes_case() {
        let rel = KnowledgeRelation::from_text(" IsAfter ", RelationSchema::Atomic);
        assert_eq!(rel.text(), "isAfter");
        assert!(rel.is_known());

        let custom = KnowledgeRelation::from_text("LikesToEat", RelationSchema::Atomic);
        assert_eq!(custom.text(), "LikesToEat");
        assert!(!custom.is_known());
    }

    #[test]
    fn equality_includes_schema() {
        let a = KnowledgeRelation::new("Causes", RelationSchema::Atomic);
        let b = KnowledgeRelation::new("Causes", RelationSchema::ConceptNet);
        assert_ne!(a, b);
        assert_eq!(a, KnowledgeRelation::new("Causes", RelationSchema::Atomic));
    }

    #[test]
    fn verbalize_with_and_without_tail() {
        let rel = KnowledgeRelation::new("xWant", RelationSchema::Atomic);
        assert_eq!(
            rel.verbalize("PersonX buys a car", None).unwrap(),
            "PersonX buys a car as a result, PersonX wants"
        );
        assert_eq!(
            rel.verbalize("PersonX buys a car", Some(" to drive ")).unwrap(),
            "PersonX buys a car as a result, PersonX wants to drive"
        );
    }

    #[test]
    fn verbalize_unknown_relation_errors() {
        let rel = KnowledgeRelation::new("Teleports", RelationSchema::Atomic);
        let err = rel.verbalize("cat", None).unwrap_err();
        assert!(matches!(err, RelationError::UnknownRelation { .. }));
    }

    #[test]
    fn conceptnet_maps_onto_atomic() {
        let rel = KnowledgeRelation::new("UsedFor", RelationSchema::ConceptNet);
        let mapped = rel.to_atomic();
        assert_eq!(mapped, vec![KnowledgeRelation::new("ObjectUse", RelationSchema::Atomic)]);
        assert!(KnowledgeRelation::new("IsA", RelationSchema::ConceptNet)
            .to_atomic()
            .is_empty());
    }

    #[test]
    fn frequency_orders_common_relations_first() {
        assert!(relation_frequency("ObjectUse") > relation_frequency("Causes"));
        assert_eq!(relation_frequency("Teleports"), 0);
    }

    #[test]
    fn schema_parses_from_str() {
        assert_eq!("ConceptNet".parse::<RelationSchema>(), Ok(RelationSchema::ConceptNet));
        assert!("wordnet".parse::<RelationSchema>().is_err());
    }
}
