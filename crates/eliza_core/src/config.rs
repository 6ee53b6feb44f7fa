use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::engine::Eliza;
use crate::select::SelectionMode;
use crate::table::RuleTable;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ElizaConfig {
    pub engine: EngineConfig,
    pub rules: RulesConfig,
    pub session: SessionConfig,
}

impl ElizaConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: ElizaConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("ELIZA_SELECTION") {
            match v.parse() {
                Ok(mode) => self.engine.selection = mode,
                Err(e) => tracing::warn!("Ignoring ELIZA_SELECTION: {}", e),
            }
        }
        if let Ok(v) = std::env::var("ELIZA_SEED") {
            match v.parse() {
                Ok(n) => self.engine.seed = Some(n),
                Err(e) => tracing::warn!("Ignoring ELIZA_SEED={:?}: {}", v, e),
            }
        }
        if let Ok(v) = std::env::var("ELIZA_MAX_REDIRECTS") {
            match v.parse() {
                Ok(n) => self.engine.max_redirects = n,
                Err(e) => tracing::warn!("Ignoring ELIZA_MAX_REDIRECTS={:?}: {}", v, e),
            }
        }
        if let Ok(v) = std::env::var("ELIZA_RULES") {
            self.rules.path = Some(PathBuf::from(v));
        }
    }

    /// The configured rule table, or the built-in one.
    pub fn load_table(&self) -> Result<RuleTable> {
        match &self.rules.path {
            Some(path) => RuleTable::load(path),
            None => RuleTable::builtin().context("Built-in rule table is invalid"),
        }
    }

    pub fn build_engine(&self) -> Result<Eliza> {
        let table = self.load_table()?;
        Ok(Eliza::with_config(table, self.engine.clone()))
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub selection: SelectionMode,
    /// Redirects (`goto`) followed per turn before giving up.
    pub max_redirects: usize,
    /// Seed for random selection; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            selection: SelectionMode::Rotate,
            max_redirects: 1,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// External rule table; the built-in table is used when unset.
    pub path: Option<PathBuf>,
}

/// Text used by the terminal front end around the engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub bot_name: String,
    pub greeting: String,
    /// Sent once the user's name is known; `{name}` is substituted.
    pub welcome: String,
    pub farewells: Vec<String>,
    pub quit_words: Vec<String>,
    pub empty_input_reply: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bot_name: "eliza".to_string(),
            greeting: "Hi, I'm a psychotherapist. Why don't we start by telling me your name?"
                .to_string(),
            welcome: "Hi {name}. How can I help you today? Feel free to tell me anything, \
                      these sessions are completely confidential."
                .to_string(),
            farewells: vec![
                "Thank you for talking with me.".to_string(),
                "Good-bye, for now.".to_string(),
                "Thank you, that will be $150. Have a good day!".to_string(),
            ],
            quit_words: vec!["quit".to_string(), "exit".to_string(), "bye".to_string()],
            empty_input_reply: "I'm sorry, I didn't catch that. Can you please elaborate?"
                .to_string(),
        }
    }
}

impl SessionConfig {
    pub fn is_quit(&self, input: &str) -> bool {
        let input = input.trim();
        self.quit_words.iter().any(|w| w.eq_ignore_ascii_case(input))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ElizaConfig::default();
        assert_eq!(cfg.engine.selection, SelectionMode::Rotate);
        assert_eq!(cfg.engine.max_redirects, 1);
        assert!(cfg.rules.path.is_none());
        assert_eq!(cfg.session.farewells.len(), 3);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[engine]
selection = "random"
"#;
        let cfg: ElizaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.engine.selection, SelectionMode::Random);
        // Defaults for unspecified fields
        assert_eq!(cfg.engine.max_redirects, 1);
        assert_eq!(cfg.session.bot_name, "eliza");
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[engine]
selection = "rotate"
max_redirects = 3
seed = 42

[rules]
path = "rules/custom.toml"

[session]
bot_name = "doctor"
greeting = "Hello."
welcome = "Welcome, {name}."
farewells = ["Bye."]
quit_words = ["stop"]
empty_input_reply = "Say something."
"#;
        let cfg: ElizaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.engine.max_redirects, 3);
        assert_eq!(cfg.engine.seed, Some(42));
        assert_eq!(cfg.rules.path, Some(PathBuf::from("rules/custom.toml")));
        assert_eq!(cfg.session.bot_name, "doctor");
        assert!(cfg.session.is_quit(" STOP "));
        assert!(!cfg.session.is_quit("quit"));
    }

    #[test]
    fn test_env_overrides_and_defaults() {
        // Part 1: env overrides
        std::env::set_var("ELIZA_SELECTION", "random");
        std::env::set_var("ELIZA_SEED", "9");

        let mut cfg = ElizaConfig::default();
        cfg.apply_env_overrides();

        assert_eq!(cfg.engine.selection, SelectionMode::Random);
        assert_eq!(cfg.engine.seed, Some(9));

        // Part 2: unparsable overrides leave the current values in place
        std::env::set_var("ELIZA_SEED", "soon");
        std::env::set_var("ELIZA_MAX_REDIRECTS", "many");

        let mut cfg = ElizaConfig::default();
        cfg.apply_env_overrides();

        assert_eq!(cfg.engine.seed, None);
        assert_eq!(cfg.engine.max_redirects, 1);

        // Clean up env vars before testing defaults
        std::env::remove_var("ELIZA_SELECTION");
        std::env::remove_var("ELIZA_SEED");
        std::env::remove_var("ELIZA_MAX_REDIRECTS");

        // Part 3: nonexistent path returns defaults (no env interference)
        let cfg = ElizaConfig::load_or_default("/nonexistent/path.toml");
        assert_eq!(cfg.engine.selection, SelectionMode::Rotate);
    }

    #[test]
    fn test_build_engine_from_rules_file() {
        let dir = tempfile::tempdir().unwrap();
        let rules = dir.path().join("rules.toml");
        std::fs::write(
            &rules,
            r#"
fallbacks = ["Go on."]
[[keyword]]
word = "cat"
[[keyword.rule]]
pattern = "* cat *"
reassembly = ["Tell me about the cat."]
"#,
        )
        .unwrap();

        let config_path = dir.path().join("eliza.toml");
        std::fs::write(
            &config_path,
            format!("[rules]\npath = {:?}\n", rules.display().to_string()),
        )
        .unwrap();

        let cfg = ElizaConfig::load(&config_path).unwrap();
        let eliza = cfg.build_engine().unwrap();
        let mut state = eliza.initialize("Kim");
        assert_eq!(eliza.respond("my cat", &mut state), "Tell me about the cat.");
    }

    #[test]
    fn test_broken_rules_file_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let rules = dir.path().join("rules.toml");
        std::fs::write(&rules, "fallbacks = []\n").unwrap();
        let cfg = ElizaConfig {
            rules: RulesConfig { path: Some(rules) },
            ..Default::default()
        };
        assert!(cfg.build_engine().is_err());
    }
}
