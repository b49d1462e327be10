//! Rule-based English pipeline.
//!
//! Lexicon and suffix driven: a regex tokenizer, sentence splitting on
//! terminal punctuation, closed-class word lists plus a base-form verb
//! lexicon for tagging, a small irregular-form table for lemmas, and a
//! shallow parser that finds subjects, objects, and prepositional objects
//! around each verb. Good enough for short event descriptions like
//! "PersonX buys a new car." and fully deterministic.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::{Dep, Doc, LanguagePipeline, Pos, Token};

static RE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+(?:['’]\w+)*|[^\w\s]").unwrap());

static DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "my", "your", "his", "her", "its", "our",
    "their", "some", "any", "every", "each", "no", "another",
];

static PRONOUNS: &[&str] = &[
    "i", "you", "he", "she", "it", "we", "they", "me", "him", "us", "them", "personx", "persony",
    "personz", "someone", "somebody", "everyone", "everybody", "something", "anyone", "nobody",
    "myself", "yourself", "himself", "herself", "itself", "ourselves", "themselves",
];

static AUXILIARIES: &[&str] = &[
    "is", "am", "are", "was", "were", "be", "been", "being", "do", "does", "did", "has", "have",
    "had", "will", "would", "can", "could", "shall", "should", "may", "might", "must",
];

static ADPOSITIONS: &[&str] = &[
    "in", "on", "at", "to", "for", "with", "from", "by", "of", "about", "into", "onto", "over",
    "under", "after", "before", "during", "through", "near", "without", "across", "behind",
    "around", "between", "towards", "toward", "inside", "outside",
];

static CONJUNCTIONS: &[&str] = &[
    "and", "or", "but", "so", "because", "while", "if", "when", "although", "though", "nor",
    "then",
];

static ADVERBS: &[&str] = &[
    "not", "very", "too", "also", "never", "always", "often", "again", "still", "just", "already",
    "soon", "now", "here", "there", "today", "tomorrow", "yesterday", "together", "away", "home",
];

static ADJECTIVES: &[&str] = &[
    "good", "bad", "big", "small", "new", "old", "happy", "sad", "hungry", "tired", "angry",
    "red", "blue", "green", "black", "white", "hot", "cold", "warm", "long", "short", "tall",
    "young", "nice", "great", "little", "large", "early", "late", "free", "full", "empty", "rich",
    "poor", "sick", "busy", "quiet", "loud", "fast", "slow", "strong", "weak", "clean", "dirty",
    "delicious", "favorite", "first", "last", "best", "own",
];

static VERBS: &[&str] = &[
    "accept", "add", "allow", "answer", "apologize", "arrive", "ask", "attend", "bake", "bark",
    "bathe", "be", "become", "begin", "believe", "bite", "borrow", "break", "bring", "build",
    "buy", "call", "carry", "catch", "celebrate", "change", "chase", "check", "choose", "clean",
    "climb", "close", "come", "cook", "cry", "cut", "dance", "decide", "deliver", "die", "do",
    "draw", "dream", "drink", "drive", "drop", "eat", "enjoy", "enter", "escape", "explain",
    "fall", "feed", "feel", "fight", "find", "finish", "fix", "fly", "follow", "forget", "get",
    "give", "go", "grab", "grow", "hate", "have", "hear", "help", "hide", "hit", "hold", "hope",
    "hug", "hunt", "hurt", "invite", "join", "jump", "keep", "kick", "kill", "kiss", "know",
    "laugh", "learn", "leave", "lend", "lie", "like", "listen", "live", "lose", "love", "make",
    "marry", "meet", "miss", "move", "need", "open", "order", "paint", "pass", "pay", "pick",
    "plan", "plant", "play", "pray", "prepare", "pull", "push", "put", "rain", "reach", "read",
    "receive", "relax", "remember", "rent", "repair", "rest", "return", "ride", "ring", "run",
    "save", "say", "scream", "see", "sell", "send", "shop", "shout", "show", "sing", "sit",
    "sleep", "smell", "smile", "speak", "spend", "stand", "start", "stay", "steal", "stop",
    "study", "swim", "take", "talk", "taste", "teach", "tell", "thank", "think", "throw",
    "touch", "travel", "try", "turn", "understand", "use", "visit", "wait", "wake", "walk",
    "want", "wash", "watch", "wear", "win", "wish", "work", "worry", "write", "yell",
];

static IRREGULAR_VERBS: &[(&str, &str)] = &[
    ("is", "be"), ("am", "be"), ("are", "be"), ("was", "be"), ("were", "be"), ("been", "be"),
    ("being", "be"), ("has", "have"), ("had", "have"), ("does", "do"), ("did", "do"),
    ("done", "do"), ("went", "go"), ("gone", "go"), ("goes", "go"), ("ate", "eat"),
    ("eaten", "eat"), ("ran", "run"), ("bought", "buy"), ("made", "make"), ("took", "take"),
    ("taken", "take"), ("gave", "give"), ("given", "give"), ("got", "get"), ("gotten", "get"),
    ("saw", "see"), ("seen", "see"), ("sold", "sell"), ("found", "find"), ("wrote", "write"),
    ("written", "write"), ("drove", "drive"), ("driven", "drive"), ("slept", "sleep"),
    ("drank", "drink"), ("sang", "sing"), ("swam", "swim"), ("taught", "teach"),
    ("thought", "think"), ("brought", "bring"), ("felt", "feel"), ("left", "leave"),
    ("met", "meet"), ("paid", "pay"), ("said", "say"), ("told", "tell"), ("won", "win"),
    ("sat", "sit"), ("stood", "stand"), ("came", "come"), ("knew", "know"), ("known", "know"),
    ("lost", "lose"), ("kept", "keep"), ("held", "hold"), ("heard", "hear"), ("fell", "fall"),
    ("flew", "fly"), ("grew", "grow"), ("broke", "break"), ("broken", "break"),
    ("began", "begin"), ("begun", "begin"), ("chose", "choose"), ("caught", "catch"),
    ("fought", "fight"), ("fed", "feed"), ("hid", "hide"), ("built", "build"), ("sent", "send"),
    ("spent", "spend"), ("stole", "steal"), ("threw", "throw"), ("understood", "understand"),
    ("woke", "wake"), ("wore", "wear"), ("rode", "ride"), ("rang", "ring"), ("became", "become"),
    ("forgot", "forget"), ("lent", "lend"), ("spoke", "speak"),
];

static IRREGULAR_NOUNS: &[(&str, &str)] = &[
    ("children", "child"), ("men", "man"), ("women", "woman"), ("mice", "mouse"),
    ("feet", "foot"), ("teeth", "tooth"), ("people", "person"), ("geese", "goose"),
    ("knives", "knife"), ("wives", "wife"), ("leaves", "leaf"),
];

struct Lexicon {
    determiners: HashSet<&'static str>,
    pronouns: HashSet<&'static str>,
    auxiliaries: HashSet<&'static str>,
    adpositions: HashSet<&'static str>,
    conjunctions: HashSet<&'static str>,
    adverbs: HashSet<&'static str>,
    adjectives: HashSet<&'static str>,
    verbs: HashSet<&'static str>,
    irregular_verbs: HashMap<&'static str, &'static str>,
    irregular_nouns: HashMap<&'static str, &'static str>,
}

static LEXICON: LazyLock<Lexicon> = LazyLock::new(|| Lexicon {
    determiners: DETERMINERS.iter().copied().collect(),
    pronouns: PRONOUNS.iter().copied().collect(),
    auxiliaries: AUXILIARIES.iter().copied().collect(),
    adpositions: ADPOSITIONS.iter().copied().collect(),
    conjunctions: CONJUNCTIONS.iter().copied().collect(),
    adverbs: ADVERBS.iter().copied().collect(),
    adjectives: ADJECTIVES.iter().copied().collect(),
    verbs: VERBS.iter().copied().collect(),
    irregular_verbs: IRREGULAR_VERBS.iter().copied().collect(),
    irregular_nouns: IRREGULAR_NOUNS.iter().copied().collect(),
});

impl Lexicon {
    /// Base form of `lower` if it is a known verb in any inflection.
    fn verb_lemma(&self, lower: &str) -> Option<String> {
        if let Some(lemma) = self.irregular_verbs.get(lower) {
            return Some((*lemma).to_string());
        }
        if self.verbs.contains(lower) {
            return Some(lower.to_string());
        }
        verb_candidates(lower)
            .into_iter()
            .find(|c| self.verbs.contains(c.as_str()))
    }

    fn noun_lemma(&self, lower: &str) -> String {
        if let Some(lemma) = self.irregular_nouns.get(lower) {
            return (*lemma).to_string();
        }
        let n = lower.len();
        if n > 4 && lower.ends_with("ies") {
            format!("{}y", &lower[..n - 3])
        } else if n > 4
            && ["sses", "ches", "shes", "xes", "zes"]
                .iter()
                .any(|s| lower.ends_with(s))
        {
            lower[..n - 2].to_string()
        } else if n > 3
            && lower.ends_with('s')
            && !["ss", "us", "is"].iter().any(|s| lower.ends_with(s))
        {
            lower[..n - 1].to_string()
        } else {
            lower.to_string()
        }
    }
}

/// Candidate base forms obtained by stripping inflectional suffixes.
fn verb_candidates(lower: &str) -> Vec<String> {
    let mut out = Vec::new();
    let undouble = |stem: &str| -> Option<String> {
        let mut rev = stem.chars().rev();
        let (last, prev) = (rev.next()?, rev.next()?);
        (last == prev).then(|| stem[..stem.len() - last.len_utf8()].to_string())
    };

    if let Some(stem) = lower.strip_suffix("ies") {
        out.push(format!("{stem}y"));
    }
    if let Some(stem) = lower.strip_suffix("es") {
        out.push(stem.to_string());
    }
    if let Some(stem) = lower.strip_suffix('s') {
        out.push(stem.to_string());
    }
    if let Some(stem) = lower.strip_suffix("ing") {
        out.push(stem.to_string());
        out.push(format!("{stem}e"));
        out.extend(undouble(stem));
    }
    if let Some(stem) = lower.strip_suffix("ied") {
        out.push(format!("{stem}y"));
    }
    if let Some(stem) = lower.strip_suffix("ed") {
        out.push(stem.to_string());
        out.push(format!("{stem}e"));
        out.extend(undouble(stem));
    }
    out.retain(|c| c.len() >= 2);
    out
}

fn is_word(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}

fn is_number(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        && text.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.')
}

fn is_terminal(text: &str) -> bool {
    matches!(text, "." | "!" | "?")
}

/// Built-in English pipeline. Stateless and cheap to clone.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedPipeline;

impl RuleBasedPipeline {
    pub fn new() -> Self {
        Self
    }

    fn tag(&self, text: &str, prev: Option<Pos>, next: Option<&str>, sentence_initial: bool) -> Pos {
        let lex = &*LEXICON;
        if !is_word(text) {
            return Pos::Punct;
        }
        if is_number(text) {
            return Pos::Num;
        }
        let lower = text.to_lowercase();
        let word = lower.as_str();

        if word == "to" {
            let next_is_verb = next
                .map(|n| lex.verbs.contains(n.to_lowercase().as_str()))
                .unwrap_or(false);
            return if next_is_verb { Pos::Part } else { Pos::Adp };
        }
        if lex.determiners.contains(word) {
            return Pos::Det;
        }
        if lex.pronouns.contains(word) {
            return Pos::Pron;
        }
        if lex.auxiliaries.contains(word) {
            return Pos::Aux;
        }
        if lex.adpositions.contains(word) {
            return Pos::Adp;
        }
        if lex.conjunctions.contains(word) {
            return Pos::Conj;
        }
        if lex.adverbs.contains(word) {
            return Pos::Adv;
        }
        if lex.adjectives.contains(word) {
            return Pos::Adj;
        }

        let after_nominal_modifier = matches!(
            prev,
            Some(Pos::Det | Pos::Adj | Pos::Num | Pos::Adp | Pos::Verb)
        );
        if lex.verb_lemma(word).is_some() {
            return if after_nominal_modifier {
                Pos::Noun
            } else {
                Pos::Verb
            };
        }
        if word.len() > 4 && word.ends_with("ly") {
            return Pos::Adv;
        }
        if word.len() > 4
            && word.ends_with("ed")
            && matches!(
                prev,
                Some(Pos::Noun | Pos::ProperNoun | Pos::Pron | Pos::Aux | Pos::Adv)
            )
        {
            return Pos::Verb;
        }
        if word.len() > 5 && word.ends_with("ing") && prev == Some(Pos::Aux) {
            return Pos::Verb;
        }
        if word.len() > 5
            && ["ful", "ous", "ive", "able", "ible", "less", "ish"]
                .iter()
                .any(|s| word.ends_with(s))
        {
            return Pos::Adj;
        }
        if !sentence_initial && text.chars().next().is_some_and(char::is_uppercase) {
            return Pos::ProperNoun;
        }
        Pos::Noun
    }

    fn lemmatize(&self, text: &str, pos: Pos) -> String {
        let lex = &*LEXICON;
        let lower = text.to_lowercase();
        match pos {
            Pos::Verb | Pos::Aux => lex.verb_lemma(&lower).unwrap_or_else(|| {
                lower
                    .strip_suffix("ed")
                    .or_else(|| lower.strip_suffix("ing"))
                    .filter(|stem| stem.len() >= 2)
                    .map(str::to_string)
                    .unwrap_or_else(|| lower.clone())
            }),
            Pos::Noun => lex.noun_lemma(&lower),
            _ => lower,
        }
    }

    /// Split token indices into sentences at terminal punctuation.
    fn split_sentences(tokens: &[(usize, &str)]) -> Vec<Range<usize>> {
        let mut sentences = Vec::new();
        let mut start = 0;
        for i in 0..tokens.len() {
            let ends_here = is_terminal(tokens[i].1)
                && tokens.get(i + 1).is_none_or(|(_, next)| !is_terminal(next));
            if ends_here {
                sentences.push(start..i + 1);
                start = i + 1;
            }
        }
        if start < tokens.len() {
            sentences.push(start..tokens.len());
        }
        sentences
    }

    /// Base noun phrases: runs of modifiers ending in a noun, or a lone pronoun.
    fn chunk(tokens: &[Token], sentence: Range<usize>) -> Vec<Range<usize>> {
        let mut chunks = Vec::new();
        let mut run_start: Option<usize> = None;
        let mut last_noun: Option<usize> = None;

        let mut close = |run_start: &mut Option<usize>, last_noun: &mut Option<usize>| {
            if let (Some(start), Some(end)) = (*run_start, *last_noun) {
                chunks.push(start..end + 1);
            }
            *run_start = None;
            *last_noun = None;
        };

        for i in sentence {
            match tokens[i].pos {
                Pos::Pron => {
                    close(&mut run_start, &mut last_noun);
                    run_start = Some(i);
                    last_noun = Some(i);
                    close(&mut run_start, &mut last_noun);
                }
                Pos::Det | Pos::Adj | Pos::Num => {
                    if last_noun.is_some() {
                        close(&mut run_start, &mut last_noun);
                    }
                    run_start.get_or_insert(i);
                }
                Pos::Noun | Pos::ProperNoun => {
                    run_start.get_or_insert(i);
                    last_noun = Some(i);
                }
                _ => close(&mut run_start, &mut last_noun),
            }
        }
        close(&mut run_start, &mut last_noun);
        chunks
    }

    /// Attach every token of a sentence to a head and label the edge.
    fn parse(tokens: &mut [Token], sentence: Range<usize>, chunks: &[Range<usize>]) {
        let root = sentence
            .clone()
            .find(|&i| tokens[i].pos == Pos::Verb)
            .or_else(|| sentence.clone().find(|&i| tokens[i].pos == Pos::Aux))
            .or_else(|| sentence.clone().find(|&i| !tokens[i].is_punct()))
            .unwrap_or(sentence.start);

        for i in sentence.clone() {
            let token = &mut tokens[i];
            token.head = root;
            token.dep = match token.pos {
                Pos::Punct => Dep::Punct,
                _ => Dep::Other,
            };
        }
        tokens[root].dep = Dep::Root;

        // Modifiers inside a chunk attach to the chunk's last token.
        let mut chunk_head_of = HashMap::new();
        for chunk in chunks.iter().filter(|c| sentence.contains(&c.start)) {
            let head = chunk.end - 1;
            chunk_head_of.insert(head, chunk.start);
            for i in chunk.start..head {
                tokens[i].head = head;
                tokens[i].dep = match tokens[i].pos {
                    Pos::Det => Dep::Det,
                    Pos::Adj | Pos::Num => Dep::Amod,
                    _ => Dep::Other,
                };
            }
        }

        let mut governor: Option<usize> = None;
        let mut prep: Option<usize> = None;
        for i in sentence.clone() {
            match tokens[i].pos {
                Pos::Verb => {
                    governor = Some(i);
                    prep = None;
                }
                Pos::Aux if i == root => {
                    governor = Some(i);
                    prep = None;
                }
                Pos::Aux | Pos::Part => {
                    if let Some(next_verb) =
                        (i + 1..sentence.end).find(|&j| tokens[j].pos == Pos::Verb)
                    {
                        tokens[i].head = next_verb;
                        tokens[i].dep = Dep::Aux;
                    }
                }
                Pos::Adp => {
                    if let Some(g) = governor {
                        tokens[i].head = g;
                        tokens[i].dep = Dep::Prep;
                    }
                    prep = Some(i);
                }
                Pos::Conj | Pos::Punct => prep = None,
                _ => {}
            }

            if !chunk_head_of.contains_key(&i) {
                continue;
            }
            if let Some(p) = prep {
                tokens[i].head = p;
                tokens[i].dep = Dep::Pobj;
                prep = None;
            } else if let Some(g) = governor.filter(|&g| g < i) {
                tokens[i].head = g;
                tokens[i].dep = if tokens[g].lemma == "be" {
                    Dep::Attr
                } else {
                    Dep::Dobj
                };
            } else if i < root {
                tokens[i].head = root;
                tokens[i].dep = Dep::Nsubj;
            }
        }
    }
}

impl LanguagePipeline for RuleBasedPipeline {
    fn name(&self) -> &str {
        "rule_based_en"
    }

    fn analyze(&self, text: &str) -> Doc {
        let raw: Vec<(usize, &str)> = RE_TOKEN
            .find_iter(text)
            .map(|m| (m.start(), m.as_str()))
            .collect();
        let sentences = Self::split_sentences(&raw);

        let mut tokens = Vec::with_capacity(raw.len());
        for (sent, range) in sentences.iter().enumerate() {
            let mut prev: Option<Pos> = None;
            for i in range.clone() {
                let (idx, surface) = raw[i];
                let next = raw.get(i + 1).map(|(_, t)| *t).filter(|_| i + 1 < range.end);
                let pos = self.tag(surface, prev, next, i == range.start);
                tokens.push(Token {
                    i,
                    text: surface.to_string(),
                    lemma: self.lemmatize(surface, pos),
                    pos,
                    dep: Dep::Other,
                    head: i,
                    sent,
                    idx,
                });
                if pos != Pos::Punct {
                    prev = Some(pos);
                }
            }
        }

        let mut noun_chunks = Vec::new();
        for range in &sentences {
            let chunks = Self::chunk(&tokens, range.clone());
            Self::parse(&mut tokens, range.clone(), &chunks);
            noun_chunks.extend(chunks);
        }

        Doc {
            text: text.to_string(),
            tokens,
            sentences,
            noun_chunks,
        }
    }
}
