//! Construction-time failures of the rule table.
//!
//! Per-turn problems never surface here: an unmatched input or an overlong
//! redirect chain degrades to a fallback prompt (see [`crate::FallbackReason`]).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to parse rule table: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("rule table has no fallback prompts")]
    EmptyFallbacks,

    #[error("keyword #{index} is empty")]
    EmptyKeyword { index: usize },

    #[error("keyword '{keyword}' has no decomposition rules")]
    NoRules { keyword: String },

    #[error("keyword '{keyword}' is declared more than once")]
    DuplicateKeyword { keyword: String },

    #[error("keyword '{keyword}', rule #{rule}: empty pattern")]
    EmptyPattern { keyword: String, rule: usize },

    #[error("keyword '{keyword}', rule #{rule}: pattern '{pattern}' has adjacent wildcards")]
    AdjacentWildcards {
        keyword: String,
        rule: usize,
        pattern: String,
    },

    #[error("keyword '{keyword}', rule #{rule}: no reassembly templates")]
    EmptyReassembly { keyword: String, rule: usize },

    #[error(
        "keyword '{keyword}', rule #{rule}: template '{template}' uses {{{index}}} \
         but the pattern only has {captures} capture(s)"
    )]
    PlaceholderOutOfRange {
        keyword: String,
        rule: usize,
        template: String,
        index: usize,
        captures: usize,
    },

    #[error("fallback prompt '{template}' references a capture group")]
    CapturePlaceholderInFallback { template: String },

    #[error("keyword '{keyword}', rule #{rule}: redirect to unknown keyword '{target}'")]
    UnknownRedirect {
        keyword: String,
        rule: usize,
        target: String,
    },

    #[error("redirect cycle: {chain}")]
    RedirectCycle { chain: String },
}
