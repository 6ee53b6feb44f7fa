//! Per-conversation mutable state.

use std::collections::HashMap;
use std::fmt;

use crate::choice::Chooser;

/// Identity of a decomposition rule: its position in the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId {
    pub entry: usize,
    pub rule: usize,
}

/// Anything with rotating alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Rule(RuleId),
    Fallback,
}

/// Created once per conversation by [`crate::Eliza::initialize`], mutated
/// every turn, dropped when the conversation ends.
pub struct ConversationState {
    user_name: String,
    last_used: HashMap<Slot, usize>,
    chooser: Box<dyn Chooser>,
    turns: u64,
}

impl ConversationState {
    pub fn new(user_name: &str, chooser: Box<dyn Chooser>) -> Self {
        Self {
            user_name: user_name.to_string(),
            last_used: HashMap::new(),
            chooser,
            turns: 0,
        }
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Number of turns answered so far.
    pub fn turns(&self) -> u64 {
        self.turns
    }

    /// Index of the alternative used last time `slot` fired.
    pub fn last_used(&self, slot: Slot) -> Option<usize> {
        self.last_used.get(&slot).copied()
    }

    pub(crate) fn record(&mut self, slot: Slot, index: usize) {
        self.last_used.insert(slot, index);
    }

    pub(crate) fn chooser(&mut self) -> &mut dyn Chooser {
        self.chooser.as_mut()
    }

    pub(crate) fn begin_turn(&mut self) {
        self.turns += 1;
    }
}

impl fmt::Debug for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationState")
            .field("user_name", &self.user_name)
            .field("last_used", &self.last_used)
            .field("turns", &self.turns)
            .finish_non_exhaustive()
    }
}
