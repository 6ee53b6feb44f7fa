//! Decomposition patterns: literal words interleaved with `*` wildcards.
//!
//! A pattern is anchored at both ends of the input. Each wildcard captures
//! zero or more words, longest first, and the matcher backtracks only as
//! far as needed to place the following literals. Literals compare against
//! the folded form of a word, so matching is case-insensitive, while the
//! captures keep the original spelling.

use crate::text::{fold_phrase, join_words, Word};

const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Accepted spellings, each a sequence of folded words.
    Literal(Vec<Vec<String>>),
    Wildcard,
}

#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    tokens: Vec<Token>,
}

impl Pattern {
    /// Parse a pattern such as `"* i am *"`. Literals go through the same
    /// contraction expansion as input, so `"i'm *"` means `"i am *"`.
    pub fn parse(source: &str) -> Self {
        let mut tokens = Vec::new();
        for raw in source.split_whitespace() {
            if raw == WILDCARD {
                tokens.push(Token::Wildcard);
                continue;
            }
            for word in fold_phrase(raw) {
                tokens.push(Token::Literal(vec![vec![word]]));
            }
        }
        Self {
            source: source.trim().to_string(),
            tokens,
        }
    }

    /// Let every literal spelled exactly `keyword` also accept `synonyms`.
    pub fn accept_synonyms(&mut self, keyword: &str, synonyms: &[Vec<String>]) {
        if synonyms.is_empty() {
            return;
        }
        for token in &mut self.tokens {
            if let Token::Literal(alts) = token {
                if alts.len() == 1 && alts[0].len() == 1 && alts[0][0] == keyword {
                    alts.extend(synonyms.iter().cloned());
                }
            }
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of capture groups this pattern produces.
    pub fn wildcards(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| matches!(t, Token::Wildcard))
            .count()
    }

    pub fn has_adjacent_wildcards(&self) -> bool {
        self.tokens
            .windows(2)
            .any(|w| matches!(w, [Token::Wildcard, Token::Wildcard]))
    }

    /// Match the whole input, returning one capture per wildcard in order.
    pub fn matches<'a>(&self, words: &'a [Word]) -> Option<Vec<Capture<'a>>> {
        let mut spans = Vec::with_capacity(self.wildcards());
        if !match_from(&self.tokens, words, 0, &mut spans) {
            return None;
        }

        let last_wildcard = matches!(self.tokens.last(), Some(Token::Wildcard));
        let count = spans.len();
        Some(
            spans
                .into_iter()
                .enumerate()
                .map(|(i, (start, end))| Capture {
                    words: &words[start..end],
                    trailing: last_wildcard && i + 1 == count,
                })
                .collect(),
        )
    }
}

fn match_from(
    tokens: &[Token],
    words: &[Word],
    pos: usize,
    spans: &mut Vec<(usize, usize)>,
) -> bool {
    let Some((token, rest)) = tokens.split_first() else {
        return pos == words.len();
    };

    match token {
        Token::Literal(alts) => alts.iter().any(|alt| {
            let end = pos + alt.len();
            end <= words.len()
                && words[pos..end]
                    .iter()
                    .zip(alt)
                    .all(|(w, lit)| w.folded == *lit)
                && match_from(rest, words, end, spans)
        }),
        Token::Wildcard => {
            for end in (pos..=words.len()).rev() {
                spans.push((pos, end));
                if match_from(rest, words, end, spans) {
                    return true;
                }
                spans.pop();
            }
            false
        }
    }
}

/// The words spanned by one wildcard.
#[derive(Debug, Clone, Copy)]
pub struct Capture<'a> {
    pub words: &'a [Word],
    /// The wildcard ends the pattern (nothing anchors it on the right).
    pub trailing: bool,
}

impl<'a> Capture<'a> {
    /// Confine the capture to the clause next to its anchor.
    ///
    /// A trailing capture keeps words up to its first clause break; any
    /// other capture keeps words after its last break, ignoring a break on
    /// its final word.
    pub fn clause(&self) -> &'a [Word] {
        let words = self.words;
        if self.trailing {
            match words.iter().position(|w| w.breaks) {
                Some(i) => &words[..=i],
                None => words,
            }
        } else {
            let body = &words[..words.len().saturating_sub(1)];
            match body.iter().rposition(|w| w.breaks) {
                Some(i) => &words[i + 1..],
                None => words,
            }
        }
    }

    pub fn text(&self) -> String {
        join_words(self.clause())
    }
}
