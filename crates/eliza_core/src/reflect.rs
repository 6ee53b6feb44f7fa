//! Pronoun/person reflection of captured text.
//!
//! "my boss hates me" comes back as "your boss hates you". Only captured
//! user text is reflected; template text is never touched.

use std::collections::HashMap;
use std::sync::OnceLock;

const PRONOUNS: &[(&str, &str)] = &[
    ("i", "you"),
    ("me", "you"),
    ("my", "your"),
    ("mine", "yours"),
    ("myself", "yourself"),
    ("am", "are"),
    ("you", "I"),
    ("your", "my"),
    ("yours", "mine"),
    ("yourself", "myself"),
    ("we", "you"),
    ("us", "you"),
    ("our", "your"),
    ("ours", "yours"),
    ("ourselves", "yourselves"),
];

/// Replacements used when the word is not in subject position.
const OBJECTS: &[(&str, &str)] = &[("you", "me")];

/// verb -> (new subject -> form)
const AGREEMENT: &[(&str, &[(&str, &str)])] = &[
    ("are", &[("i", "am")]),
    ("were", &[("i", "was")]),
    ("was", &[("you", "were")]),
    ("is", &[("i", "am"), ("you", "are")]),
    ("has", &[("i", "have"), ("you", "have")]),
];

const AUXILIARIES: &[&str] = &[
    "am", "are", "is", "was", "were", "do", "does", "did", "can", "cannot", "could", "will",
    "would", "should", "shall", "must", "may", "might", "have", "has", "had",
];

/// Words after which a new clause (and so a subject) usually starts.
const CLAUSE_LEADS: &[&str] = &[
    "because", "that", "if", "when", "while", "and", "but", "so", "since", "though",
    "although", "unless", "until", "whether", "why", "how", "what", "where", "who",
];

const QUESTION_WORDS: &[&str] = &["why", "what", "how", "when", "where", "who"];

#[derive(Debug, Clone)]
pub struct ReflectionMap {
    words: HashMap<String, String>,
    objects: HashMap<String, String>,
    agreement: HashMap<String, HashMap<String, String>>,
}

impl Default for ReflectionMap {
    fn default() -> Self {
        Self::english()
    }
}

impl ReflectionMap {
    pub fn english() -> Self {
        let pairs = |list: &[(&str, &str)]| -> HashMap<String, String> {
            list.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        Self {
            words: pairs(PRONOUNS),
            objects: pairs(OBJECTS),
            agreement: AGREEMENT
                .iter()
                .map(|(verb, forms)| (verb.to_string(), pairs(forms)))
                .collect(),
        }
    }

    /// Add or override a word mapping. Keys are matched case-insensitively.
    pub fn insert(&mut self, word: &str, replacement: &str) {
        let key = word.to_lowercase();
        self.objects.remove(&key);
        self.words.insert(key, replacement.to_string());
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains_key(&word.to_lowercase())
    }

    /// Reflect `text` word by word.
    ///
    /// Tokens are split on whitespace and rejoined with single spaces;
    /// punctuation around a token survives substitution of its core.
    pub fn reflect(&self, text: &str) -> String {
        let parts: Vec<(&str, &str, &str)> = text.split_whitespace().map(split_affixes).collect();
        let folded: Vec<String> = parts.iter().map(|(_, core, _)| core.to_lowercase()).collect();

        let mut out: Vec<String> = Vec::with_capacity(parts.len());
        let mut subject: Option<String> = None;
        let mut prev_replaced = false;

        for (i, word) in folded.iter().enumerate() {
            let replacement = self
                .objects
                .get(word)
                .filter(|_| !is_subject_position(&folded, i))
                .or_else(|| self.words.get(word));

            match replacement {
                Some(new) => {
                    let new_subject = new.to_lowercase();
                    // Question inversion: "are you" -> "am I".
                    if i > 0 && !prev_replaced && inverted_at(&folded, i - 1) {
                        if let Some(form) = self.conjugate(&folded[i - 1], &new_subject) {
                            out[i - 1] = form;
                        }
                    }
                    out.push(new.clone());
                    subject = Some(new_subject);
                    prev_replaced = true;
                }
                None => {
                    let form = subject
                        .take()
                        .and_then(|s| self.conjugate(word, &s))
                        .unwrap_or_else(|| parts[i].1.to_string());
                    out.push(form);
                    prev_replaced = false;
                }
            }
        }

        parts
            .iter()
            .zip(out)
            .map(|((prefix, _, suffix), core)| format!("{prefix}{core}{suffix}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn conjugate(&self, verb: &str, subject: &str) -> Option<String> {
        self.agreement.get(verb)?.get(subject).cloned()
    }
}

/// Reflect with the built-in English map.
pub fn reflect(text: &str) -> String {
    static DEFAULT: OnceLock<ReflectionMap> = OnceLock::new();
    DEFAULT.get_or_init(ReflectionMap::english).reflect(text)
}

fn is_subject_position(folded: &[String], i: usize) -> bool {
    if i == 0 {
        return true;
    }
    let prev = folded[i - 1].as_str();
    if AUXILIARIES.contains(&prev) || CLAUSE_LEADS.contains(&prev) {
        return true;
    }
    folded
        .get(i + 1)
        .is_some_and(|next| AUXILIARIES.contains(&next.as_str()))
}

fn inverted_at(folded: &[String], verb: usize) -> bool {
    verb == 0 || QUESTION_WORDS.contains(&folded[verb - 1].as_str())
}

/// Split a token into leading punctuation, core, trailing punctuation.
fn split_affixes(token: &str) -> (&str, &str, &str) {
    let is_core = |c: char| c.is_alphanumeric();
    let Some(start) = token.find(is_core) else {
        return (token, "", "");
    };
    let last = token.rfind(is_core).unwrap_or(start);
    let end = last + token[last..].chars().next().map_or(1, char::len_utf8);
    (&token[..start], &token[start..end], &token[end..])
}
