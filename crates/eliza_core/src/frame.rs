//! Framing of "I am X" captures.
//!
//! Templates for state statements read "How long have you been {1}?", so
//! the bare capture needs a lead-in: "sad" becomes "feeling sad", "a
//! failure" becomes "being a failure", "running late" stays as it is.
//! The decision is a small lexical heuristic on the first word of the
//! rule's last capture.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureFrame {
    /// Captures are used as reflected.
    #[default]
    Plain,
    /// The last capture describes the speaker's state.
    State,
}

const DETERMINERS: &[&str] = &[
    "a", "an", "the", "your", "my", "his", "her", "their", "our", "this", "that", "some",
    "one", "no", "I", "you", "me", "him", "them", "it",
];

const ADJECTIVES: &[&str] = &[
    "sad", "happy", "glad", "mad", "angry", "afraid", "alone", "lonely", "sick", "ill", "well",
    "fine", "ok", "okay", "good", "bad", "poor", "rich", "tired", "sure", "unsure", "certain",
    "calm", "weak", "strong", "old", "young", "ugly", "fat", "thin", "smart", "dumb", "stupid",
    "lost", "upset", "down", "low", "broke", "late", "done", "free", "busy", "sorry", "shy",
    "quiet", "bored", "numb", "empty", "alive", "awake", "aware", "ashamed", "so", "very",
    "really", "too", "quite", "always", "never", "still", "just", "not",
];

const ADJECTIVE_SUFFIXES: &[&str] = &[
    "ed", "ful", "ous", "less", "ive", "able", "ible", "al", "ic", "ish", "ent", "ant", "ly",
    "y",
];

impl CaptureFrame {
    pub fn apply(self, capture: &str) -> String {
        match self {
            CaptureFrame::Plain => capture.to_string(),
            CaptureFrame::State => frame_state(capture),
        }
    }
}

fn frame_state(capture: &str) -> String {
    let Some(first) = capture.split_whitespace().next() else {
        return String::new();
    };
    let word = first.to_lowercase();
    let word = word.trim_matches(|c: char| !c.is_alphanumeric());

    if word.len() > 4 && word.ends_with("ing") {
        return capture.to_string();
    }
    if word == "to" {
        return format!("trying {capture}");
    }
    if DETERMINERS.iter().any(|d| d.eq_ignore_ascii_case(word)) {
        return format!("being {capture}");
    }
    if ADJECTIVES.contains(&word)
        || (word.len() > 3 && ADJECTIVE_SUFFIXES.iter().any(|s| word.ends_with(s)))
    {
        return format!("feeling {capture}");
    }
    format!("being {capture}")
}
