//! Keyword-driven reflective responder.
//!
//! A line of input is normalised, scanned for ranked keywords, decomposed by
//! the first matching pattern of the winning keyword, and answered with a
//! reassembly template whose placeholders are filled with reflected
//! captures. Inputs without a usable keyword get a content-free prompt.
//!
//! ```no_run
//! let eliza = eliza_core::Eliza::builtin()?;
//! let mut state = eliza.initialize("Alex");
//! println!("{}", eliza.respond("I am feeling stressed.", &mut state));
//! # Ok::<(), eliza_core::TableError>(())
//! ```

pub mod choice;
pub mod config;
pub mod engine;
pub mod error;
pub mod frame;
pub mod pattern;
pub mod reflect;
pub mod select;
pub mod state;
pub mod table;
pub mod text;

pub use choice::{Chooser, RandomChooser, ScriptedChooser};
pub use config::{ElizaConfig, EngineConfig, SessionConfig};
pub use engine::{Eliza, FallbackReason, Origin, Response};
pub use error::TableError;
pub use frame::CaptureFrame;
pub use pattern::{Capture, Pattern};
pub use reflect::{reflect, ReflectionMap};
pub use select::{SelectionMode, Template};
pub use state::{ConversationState, RuleId};
pub use table::{KeywordEntry, RuleTable};
pub use text::{normalize, Word};
