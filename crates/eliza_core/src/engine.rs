//! Rule selection: keyword scan → decomposition → reflection → reassembly.

use std::sync::Arc;

use crate::choice::{Chooser, RandomChooser};
use crate::config::EngineConfig;
use crate::error::TableError;
use crate::select::{pick, select, Selected};
use crate::state::{ConversationState, RuleId, Slot};
use crate::table::RuleTable;
use crate::text::normalize;

/// Where a reply came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Rule {
        keyword: String,
        rule: usize,
        template: usize,
        /// Redirects followed before the final rule.
        redirects: usize,
    },
    Fallback(FallbackReason),
}

/// Why a content-free prompt was used instead of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    NoKeyword,
    NoDecomposition { keyword: String },
    IndirectionLimitExceeded { keyword: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub text: String,
    pub origin: Origin,
}

/// The responder. Holds an immutable, validated rule table; all
/// per-conversation data lives in [`ConversationState`].
#[derive(Debug, Clone)]
pub struct Eliza {
    table: Arc<RuleTable>,
    config: EngineConfig,
}

impl Eliza {
    pub fn new(table: RuleTable) -> Self {
        Self::with_config(table, EngineConfig::default())
    }

    pub fn with_config(table: RuleTable, config: EngineConfig) -> Self {
        Self {
            table: Arc::new(table),
            config,
        }
    }

    /// An engine over the built-in rule table.
    pub fn builtin() -> Result<Self, TableError> {
        Ok(Self::new(RuleTable::builtin()?))
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start a conversation. Randomness is seeded from the config when a
    /// seed is set.
    pub fn initialize(&self, user_name: &str) -> ConversationState {
        self.initialize_with(user_name, Box::new(RandomChooser::new(self.config.seed)))
    }

    pub fn initialize_with(&self, user_name: &str, chooser: Box<dyn Chooser>) -> ConversationState {
        tracing::debug!(user = user_name, "Conversation started");
        ConversationState::new(user_name, chooser)
    }

    pub fn respond(&self, input: &str, state: &mut ConversationState) -> String {
        self.respond_traced(input, state).text
    }

    /// Like [`Eliza::respond`], also reporting which rule (or fallback) answered.
    pub fn respond_traced(&self, input: &str, state: &mut ConversationState) -> Response {
        state.begin_turn();
        let words = normalize(input);

        let Some(hit) = self.table.select_keyword(&words) else {
            return self.fallback(state, FallbackReason::NoKeyword);
        };

        // Tables are cycle-free, so `max_redirects` alone bounds this loop.
        let mut entry = hit.entry;
        let mut redirects = 0;

        loop {
            let kw = &self.table.entries()[entry];
            tracing::debug!(keyword = kw.keyword(), rank = kw.rank(), "Trying keyword");

            let Some((rule_index, captures)) = kw.decompose(&words) else {
                return self.fallback(
                    state,
                    FallbackReason::NoDecomposition {
                        keyword: kw.keyword().to_string(),
                    },
                );
            };
            let rule = &kw.rules()[rule_index];

            let reflections = self.table.reflections();
            let last = captures.len().saturating_sub(1);
            let captures: Vec<String> = captures
                .iter()
                .enumerate()
                .map(|(i, capture)| {
                    let reflected = reflections.reflect(&capture.text());
                    if i == last {
                        rule.frame().apply(&reflected)
                    } else {
                        reflected
                    }
                })
                .collect();

            let id = RuleId {
                entry,
                rule: rule_index,
            };
            let (template, selected) = select(id, rule, &captures, state, self.config.selection);

            match selected {
                Selected::Text(text) => {
                    tracing::debug!(
                        keyword = kw.keyword(),
                        pattern = rule.pattern().source(),
                        template,
                        "Rule matched"
                    );
                    return Response {
                        text,
                        origin: Origin::Rule {
                            keyword: kw.keyword().to_string(),
                            rule: rule_index,
                            template,
                            redirects,
                        },
                    };
                }
                Selected::Redirect { keyword, entry: target } => {
                    redirects += 1;
                    if redirects > self.config.max_redirects {
                        return self.fallback(
                            state,
                            FallbackReason::IndirectionLimitExceeded { keyword },
                        );
                    }
                    tracing::debug!(from = kw.keyword(), to = %keyword, "Following redirect");
                    entry = target;
                }
            }
        }
    }

    fn fallback(&self, state: &mut ConversationState, reason: FallbackReason) -> Response {
        let fallbacks = self.table.fallbacks();
        let index = pick(Slot::Fallback, fallbacks.len(), state, self.config.selection);
        tracing::debug!(?reason, index, "Using fallback prompt");
        Response {
            text: fallbacks[index].render(&[], state.user_name()),
            origin: Origin::Fallback(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::ScriptedChooser;

    #[test]
    fn test_builtin_engine_answers() {
        let eliza = Eliza::builtin().unwrap();
        let mut state = eliza.initialize_with("Sam", Box::new(ScriptedChooser::default()));
        let reply = eliza.respond("I need a holiday", &mut state);
        assert!(reply.contains("a holiday"), "got {reply:?}");
        assert_eq!(state.turns(), 1);
    }

    #[test]
    fn test_no_keyword_uses_fallback() {
        let eliza = Eliza::builtin().unwrap();
        let mut state = eliza.initialize("Sam");
        let response = eliza.respond_traced("xyz qux blah", &mut state);
        assert_eq!(response.origin, Origin::Fallback(FallbackReason::NoKeyword));
        assert!(!response.text.is_empty());
    }
}
