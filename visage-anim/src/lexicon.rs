//! Keyword lexicons: token -> (valence, arousal) contribution
//!
//! Built once per process and shared read-only afterwards.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Which lexicon a token was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexiconKind {
    Positive,
    Negative,
    Thinking,
    Surprise,
}

/// One immutable lexicon
#[derive(Debug)]
pub struct Lexicon {
    kind: LexiconKind,
    entries: HashMap<&'static str, (f64, f64)>,
}

impl Lexicon {
    fn build(kind: LexiconKind, entries: &[(&'static str, f64, f64)]) -> Self {
        Self {
            kind,
            entries: entries.iter().map(|&(w, v, a)| (w, (v, a))).collect(),
        }
    }

    pub fn kind(&self) -> LexiconKind {
        self.kind
    }

    /// (valence, arousal) contribution of `token`
    pub fn get(&self, token: &str) -> Option<(f64, f64)> {
        self.entries.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

const POSITIVE: &[(&str, f64, f64)] = &[
    ("good", 0.3, 0.1),
    ("great", 0.5, 0.3),
    ("excellent", 0.6, 0.3),
    ("perfect", 0.6, 0.3),
    ("love", 0.5, 0.4),
    ("beautiful", 0.4, 0.2),
    ("happy", 0.5, 0.3),
    ("wonderful", 0.5, 0.3),
    ("awesome", 0.5, 0.4),
    ("fantastic", 0.5, 0.4),
    ("yes", 0.2, 0.1),
    ("nice", 0.3, 0.1),
    ("thanks", 0.3, 0.1),
    ("brilliant", 0.5, 0.4),
    ("fun", 0.4, 0.3),
    ("exciting", 0.4, 0.5),
    ("cool", 0.3, 0.2),
    ("elegant", 0.4, 0.2),
    ("clever", 0.3, 0.2),
    ("simple", 0.2, 0.0),
    ("clean", 0.2, 0.0),
    ("solved", 0.4, 0.3),
    ("works", 0.3, 0.2),
    ("done", 0.3, 0.2),
    ("exactly", 0.3, 0.2),
    ("right", 0.2, 0.1),
    ("correct", 0.3, 0.1),
];

const NEGATIVE: &[(&str, f64, f64)] = &[
    ("error", -0.4, 0.4),
    ("fail", -0.4, 0.3),
    ("failed", -0.4, 0.3),
    ("bug", -0.3, 0.3),
    ("wrong", -0.3, 0.2),
    ("bad", -0.3, 0.2),
    ("broken", -0.4, 0.3),
    ("crash", -0.5, 0.5),
    ("problem", -0.3, 0.3),
    ("issue", -0.2, 0.2),
    ("unfortunately", -0.3, 0.1),
    ("sorry", -0.2, 0.1),
    ("warning", -0.2, 0.3),
    ("danger", -0.4, 0.5),
    ("no", -0.1, 0.1),
    ("not", -0.1, 0.0),
    ("can't", -0.2, 0.1),
    ("cannot", -0.2, 0.1),
    ("stuck", -0.3, 0.2),
    ("confused", -0.2, 0.2),
    ("hard", -0.1, 0.2),
    ("slow", -0.2, 0.1),
    ("ugly", -0.3, 0.2),
    ("mess", -0.3, 0.3),
    ("hack", -0.2, 0.2),
    ("terrible", -0.5, 0.3),
    ("awful", -0.5, 0.3),
];

// Tokens never contain spaces, so multi-word phrases are not listed.
const THINKING: &[(&str, f64, f64)] = &[
    ("hmm", 0.0, 0.2),
    ("consider", 0.0, 0.2),
    ("perhaps", 0.0, 0.1),
    ("maybe", 0.0, 0.1),
    ("if", 0.0, 0.1),
    ("analyzing", 0.0, 0.3),
    ("investigating", 0.0, 0.3),
    ("looking", 0.0, 0.2),
    ("checking", 0.0, 0.2),
    ("searching", 0.0, 0.2),
    ("reading", 0.0, 0.1),
    ("understanding", 0.0, 0.2),
];

const SURPRISE: &[(&str, f64, f64)] = &[
    ("!", 0.1, 0.5),
    ("wow", 0.3, 0.6),
    ("whoa", 0.2, 0.5),
    ("interesting", 0.2, 0.4),
    ("unexpected", 0.0, 0.5),
    ("actually", 0.1, 0.3),
    ("wait", 0.0, 0.4),
    ("oh", 0.1, 0.3),
    ("huh", 0.0, 0.3),
    ("really", 0.1, 0.3),
];

static LEXICONS: OnceLock<[Lexicon; 4]> = OnceLock::new();

/// All lexicons, in scoring order
pub fn lexicons() -> &'static [Lexicon; 4] {
    LEXICONS.get_or_init(|| {
        [
            Lexicon::build(LexiconKind::Positive, POSITIVE),
            Lexicon::build(LexiconKind::Negative, NEGATIVE),
            Lexicon::build(LexiconKind::Thinking, THINKING),
            Lexicon::build(LexiconKind::Surprise, SURPRISE),
        ]
    })
}

/// Every (valence, arousal) contribution `token` has across the lexicons
pub fn lookup(token: &str) -> impl Iterator<Item = (f64, f64)> + '_ {
    lexicons().iter().filter_map(move |lex| lex.get(token))
}

/// Split lowercased text into maximal runs of `[a-z'!?]`
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_ascii_lowercase() || c == '\'' || c == '!' || c == '?'))
        .filter(|token| !token.is_empty())
}
