//! Reassembly: choosing a template and filling in captures.

use serde::Deserialize;

use crate::state::{ConversationState, RuleId, Slot};
use crate::table::{DecompositionRule, Reassembly};

const NAME_PLACEHOLDER: &str = "name";

/// How an alternative is picked among a rule's reassemblies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Cycle through alternatives in declared order.
    #[default]
    Rotate,
    /// Pick at random, never the same alternative twice in a row.
    Random,
}

impl std::str::FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rotate" => Ok(Self::Rotate),
            "random" => Ok(Self::Random),
            other => Err(format!("unknown selection mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Capture(usize),
    Name,
}

/// Response text with `{0}`, `{1}`, … and `{name}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Braces that do not hold a number or `name` are kept literally.
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                break;
            };
            let inner = after[..close].trim();
            let segment = if inner == NAME_PLACEHOLDER {
                Some(Segment::Name)
            } else {
                inner.parse::<usize>().ok().map(Segment::Capture)
            };

            match segment {
                Some(segment) => {
                    text.push_str(&rest[..open]);
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(segment);
                }
                None => text.push_str(&rest[..open + 1 + close + 1]),
            }
            rest = &after[close + 1..];
        }
        text.push_str(rest);
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Self {
            source: source.to_string(),
            segments,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Highest capture index referenced, if any.
    pub fn max_capture(&self) -> Option<usize> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Capture(i) => Some(*i),
                _ => None,
            })
            .max()
    }

    pub fn uses_name(&self) -> bool {
        self.segments.contains(&Segment::Name)
    }

    /// Fill placeholders. A missing capture renders as an empty string.
    ///
    /// Template text and captures are tidied; the user name is inserted
    /// exactly as given.
    pub fn render(&self, captures: &[String], user_name: &str) -> String {
        let mut out = String::new();
        let mut chunk = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(t) => chunk.push_str(t),
                Segment::Capture(i) => chunk.push_str(captures.get(*i).map_or("", String::as_str)),
                Segment::Name => {
                    push_tidy(&mut out, &chunk);
                    if !user_name.is_empty() {
                        if !out.is_empty() && chunk.ends_with(char::is_whitespace) {
                            out.push(' ');
                        }
                        out.push_str(user_name);
                    }
                    chunk.clear();
                }
            }
        }
        push_tidy(&mut out, &chunk);
        out
    }
}

/// Append `text` with whitespace collapsed, dropping spaces left in front of
/// punctuation by empty captures.
fn push_tidy(out: &mut String, text: &str) {
    for (i, word) in text.split_whitespace().enumerate() {
        let glue = word.starts_with(['.', ',', '!', '?', ';', ':']);
        let spaced = i > 0 || text.starts_with(char::is_whitespace);
        if !out.is_empty() && spaced && !glue {
            out.push(' ');
        }
        out.push_str(word);
    }
}

/// Outcome of selecting a reassembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selected {
    Text(String),
    Redirect { keyword: String, entry: usize },
}

/// Pick the next alternative for `slot` and remember it.
pub fn pick(slot: Slot, len: usize, state: &mut ConversationState, mode: SelectionMode) -> usize {
    if len == 0 {
        return 0;
    }
    let last = state.last_used(slot);
    let index = match mode {
        SelectionMode::Rotate => last.map_or(0, |l| (l + 1) % len),
        SelectionMode::Random if len == 1 => 0,
        SelectionMode::Random => {
            let i = state.chooser().choose(len) % len;
            if Some(i) == last {
                (i + 1) % len
            } else {
                i
            }
        }
    };
    state.record(slot, index);
    index
}

/// Choose a reassembly of `rule` and render it with (already reflected)
/// captures. Returns the chosen index with the outcome.
pub fn select(
    id: RuleId,
    rule: &DecompositionRule,
    captures: &[String],
    state: &mut ConversationState,
    mode: SelectionMode,
) -> (usize, Selected) {
    let reassemblies = rule.reassemblies();
    let index = pick(Slot::Rule(id), reassemblies.len(), state, mode);
    let selected = match &reassemblies[index] {
        Reassembly::Template(t) => Selected::Text(t.render(captures, state.user_name())),
        Reassembly::Goto { keyword, entry } => Selected::Redirect {
            keyword: keyword.clone(),
            entry: *entry,
        },
    };
    (index, selected)
}
