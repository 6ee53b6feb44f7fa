//! Input normalisation shared by every rule.
//!
//! Raw input is split on whitespace into [`Word`]s. Each word keeps its
//! original spelling (for echoing back) and a case-folded form (for
//! matching). Possessive `'s` is dropped from the folded form only.
//! Surrounding punctuation is stripped; trailing sentence
//! punctuation is remembered as a clause break, and a trailing `?` also
//! produces a standalone mark token so rules can key on questions.

/// Characters that end a clause when they trail a word.
const CLAUSE_PUNCT: &[char] = &['.', ',', '!', ';', ':', '?'];

/// Contractions expanded before matching, so rules only need the long form.
const CONTRACTIONS: &[(&str, &[&str])] = &[
    ("i'm", &["i", "am"]),
    ("i've", &["i", "have"]),
    ("i'll", &["i", "will"]),
    ("i'd", &["i", "would"]),
    ("you're", &["you", "are"]),
    ("you've", &["you", "have"]),
    ("you'll", &["you", "will"]),
    ("you'd", &["you", "would"]),
    ("we're", &["we", "are"]),
    ("we've", &["we", "have"]),
    ("they're", &["they", "are"]),
    ("they've", &["they", "have"]),
    ("it's", &["it", "is"]),
    ("that's", &["that", "is"]),
    ("what's", &["what", "is"]),
    ("he's", &["he", "is"]),
    ("she's", &["she", "is"]),
    ("there's", &["there", "is"]),
    ("don't", &["do", "not"]),
    ("doesn't", &["does", "not"]),
    ("didn't", &["did", "not"]),
    ("can't", &["cannot"]),
    ("won't", &["will", "not"]),
    ("wouldn't", &["would", "not"]),
    ("shouldn't", &["should", "not"]),
    ("couldn't", &["could", "not"]),
    ("isn't", &["is", "not"]),
    ("aren't", &["are", "not"]),
    ("wasn't", &["was", "not"]),
    ("weren't", &["were", "not"]),
    ("haven't", &["have", "not"]),
    ("hasn't", &["has", "not"]),
    ("hadn't", &["had", "not"]),
];

/// The token used for a trailing question mark.
pub const QUESTION_MARK: &str = "?";

/// One normalised input token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Original spelling with surrounding punctuation removed.
    pub text: String,
    /// Lower-cased form used for matching.
    pub folded: String,
    /// A clause ends right after this word.
    pub breaks: bool,
    /// Standalone `?` token; matchable but never echoed.
    pub mark: bool,
}

impl Word {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            folded: text.to_lowercase(),
            breaks: false,
            mark: false,
        }
    }

    fn question_mark() -> Self {
        Self {
            text: QUESTION_MARK.to_string(),
            folded: QUESTION_MARK.to_string(),
            breaks: true,
            mark: true,
        }
    }
}

/// Look up the expansion of a (lower-case) contraction.
pub fn expand_contraction(folded: &str) -> Option<&'static [&'static str]> {
    CONTRACTIONS
        .iter()
        .find(|(short, _)| *short == folded)
        .map(|(_, long)| *long)
}

/// Normalise a line of input into words.
pub fn normalize(input: &str) -> Vec<Word> {
    let mut words: Vec<Word> = Vec::new();

    for chunk in input.split_whitespace() {
        let chunk = chunk.replace(['\u{2018}', '\u{2019}'], "'");

        let (Some(start), Some(last)) = (
            chunk.find(|c: char| c.is_alphanumeric()),
            chunk.rfind(|c: char| c.is_alphanumeric()),
        ) else {
            // Bare punctuation such as "?" or "..." attaches to the previous word.
            close_clause(&mut words, &chunk);
            continue;
        };

        let end = last + chunk[last..].chars().next().map_or(1, char::len_utf8);
        let core = &chunk[start..end];
        push_expanded(&mut words, core);
        close_clause(&mut words, &chunk[end..]);
    }

    words
}

fn push_expanded(words: &mut Vec<Word>, core: &str) {
    let folded = core.to_lowercase();
    let Some(expansion) = expand_contraction(&folded) else {
        let mut word = Word::new(core);
        // Possessives match as their stem: "mother's" is "mother".
        if let Some(stem) = folded.strip_suffix("'s").filter(|s| !s.is_empty()) {
            word.folded = stem.to_string();
        }
        words.push(word);
        return;
    };

    let capitalised = core.chars().next().is_some_and(char::is_uppercase);
    for (i, part) in expansion.iter().enumerate() {
        if i == 0 && capitalised {
            words.push(Word::new(&capitalise(part)));
        } else {
            words.push(Word::new(part));
        }
    }
}

fn close_clause(words: &mut Vec<Word>, trailing: &str) {
    if !trailing.contains(CLAUSE_PUNCT) {
        return;
    }
    if let Some(prev) = words.last_mut() {
        prev.breaks = true;
    }
    if trailing.contains('?') && !words.last().is_some_and(|w| w.mark) {
        words.push(Word::question_mark());
    }
}

/// Fold a keyword or pattern literal the same way input is folded.
pub fn fold_phrase(phrase: &str) -> Vec<String> {
    normalize(phrase).into_iter().map(|w| w.folded).collect()
}

/// Render words back to text, dropping mark tokens.
pub fn join_words(words: &[Word]) -> String {
    words
        .iter()
        .filter(|w| !w.mark)
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn capitalise(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
