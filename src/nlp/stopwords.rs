//! English stop words and placeholder tokens ignored by head extraction.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Placeholder participants and punctuation that never make useful heads.
pub static IGNORE_WORDS: &[&str] = &["personx", "persony", "personz", "_", "'", "-"];

pub static STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "almost", "alone", "along",
    "already", "also", "although", "always", "am", "among", "an", "and", "another", "any",
    "anyone", "anything", "anywhere", "are", "around", "as", "at", "back", "be", "became",
    "because", "become", "been", "before", "being", "below", "between", "both", "but", "by",
    "can", "cannot", "could", "did", "do", "does", "doing", "done", "down", "during", "each",
    "either", "else", "enough", "even", "ever", "every", "everyone", "everything", "few",
    "first", "for", "from", "further", "get", "give", "go", "had", "has", "have", "having", "he",
    "her", "here", "hers", "herself", "him", "himself", "his", "how", "however", "i", "if", "in",
    "into", "is", "it", "its", "itself", "just", "last", "least", "less", "made", "make", "many",
    "may", "me", "might", "more", "most", "much", "must", "my", "myself", "neither", "never",
    "next", "no", "nobody", "none", "nor", "not", "nothing", "now", "of", "off", "often", "on",
    "once", "one", "only", "onto", "or", "other", "others", "otherwise", "our", "ours",
    "ourselves", "out", "over", "own", "part", "per", "perhaps", "please", "put", "quite",
    "rather", "really", "same", "say", "see", "seem", "seemed", "several", "she", "should",
    "show", "side", "since", "so", "some", "someone", "something", "sometimes", "somewhere",
    "still", "such", "take", "than", "that", "the", "their", "theirs", "them", "themselves",
    "then", "there", "these", "they", "this", "those", "though", "through", "thus", "to", "too",
    "top", "toward", "towards", "under", "until", "up", "upon", "us", "used", "very", "via",
    "was", "we", "well", "were", "what", "whatever", "when", "where", "whether", "which",
    "while", "who", "whoever", "whole", "whom", "whose", "why", "will", "with", "within",
    "without", "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

static EXCLUDED: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    STOP_WORDS
        .iter()
        .chain(IGNORE_WORDS.iter())
        .copied()
        .collect()
});

/// Whether a word is a stop word or an ignored placeholder (case-insensitive).
pub fn is_excluded(word: &str) -> bool {
    EXCLUDED.contains(word.to_lowercase().as_str())
}
