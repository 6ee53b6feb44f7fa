//! The keyword rule table.
//!
//! Tables are described in TOML (see `rules/default.toml`), deserialized
//! into [`TableSpec`] and validated once into an immutable [`RuleTable`].
//! Every structural problem is reported here, before any conversation
//! starts.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::error::TableError;
use crate::frame::CaptureFrame;
use crate::pattern::{Capture, Pattern};
use crate::reflect::ReflectionMap;
use crate::select::Template;
use crate::text::{fold_phrase, Word};

const BUILTIN_RULES: &str = include_str!("../rules/default.toml");
const GOTO_PREFIX: &str = "goto ";

// ============================================================================
// Serialized form
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableSpec {
    #[serde(default)]
    pub fallbacks: Vec<String>,
    /// Extra or overriding reflections on top of the English defaults.
    #[serde(default)]
    pub reflections: BTreeMap<String, String>,
    #[serde(default, rename = "keyword")]
    pub keywords: Vec<KeywordSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeywordSpec {
    pub word: String,
    #[serde(default)]
    pub rank: i32,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleSpec {
    pub pattern: String,
    #[serde(default)]
    pub frame: CaptureFrame,
    /// Templates, or `"goto <keyword>"` to continue with another keyword.
    #[serde(default)]
    pub reassembly: Vec<String>,
}

// ============================================================================
// Validated form
// ============================================================================

#[derive(Debug, Clone)]
pub enum Reassembly {
    Template(Template),
    Goto { keyword: String, entry: usize },
}

#[derive(Debug, Clone)]
pub struct DecompositionRule {
    pattern: Pattern,
    frame: CaptureFrame,
    reassemblies: Vec<Reassembly>,
}

impl DecompositionRule {
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn frame(&self) -> CaptureFrame {
        self.frame
    }

    pub fn reassemblies(&self) -> &[Reassembly] {
        &self.reassemblies
    }
}

#[derive(Debug, Clone)]
pub struct KeywordEntry {
    keyword: String,
    rank: i32,
    /// Folded trigger phrases: the keyword first, then its synonyms.
    triggers: Vec<Vec<String>>,
    rules: Vec<DecompositionRule>,
}

impl KeywordEntry {
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn rank(&self) -> i32 {
        self.rank
    }

    pub fn rules(&self) -> &[DecompositionRule] {
        &self.rules
    }

    /// First rule (in declared order) whose pattern matches.
    pub fn decompose<'a>(&self, words: &'a [Word]) -> Option<(usize, Vec<Capture<'a>>)> {
        self.rules
            .iter()
            .enumerate()
            .find_map(|(i, rule)| rule.pattern.matches(words).map(|caps| (i, caps)))
    }

    /// Earliest word position at which any trigger phrase occurs.
    fn first_occurrence(&self, words: &[Word]) -> Option<usize> {
        (0..words.len()).find(|&pos| {
            self.triggers.iter().any(|phrase| {
                words.len() - pos >= phrase.len()
                    && words[pos..pos + phrase.len()]
                        .iter()
                        .zip(phrase)
                        .all(|(w, p)| w.folded == *p)
            })
        })
    }
}

/// A keyword found in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordHit {
    pub entry: usize,
    pub position: usize,
    pub rank: i32,
}

#[derive(Debug, Clone)]
pub struct RuleTable {
    entries: Vec<KeywordEntry>,
    fallbacks: Vec<Template>,
    reflections: ReflectionMap,
    by_keyword: HashMap<String, usize>,
}

impl RuleTable {
    /// The rule set shipped with the crate.
    pub fn builtin() -> Result<Self, TableError> {
        Self::from_toml_str(BUILTIN_RULES)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, TableError> {
        let spec: TableSpec = toml::from_str(source)?;
        Self::from_spec(spec)
    }

    /// Load and validate a table from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule table: {}", path.display()))?;
        let table = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid rule table: {}", path.display()))?;
        tracing::info!(
            "Loaded {} keyword entries from {}",
            table.entries.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_spec(spec: TableSpec) -> Result<Self, TableError> {
        if spec.fallbacks.is_empty() {
            return Err(TableError::EmptyFallbacks);
        }
        let fallbacks = spec
            .fallbacks
            .iter()
            .map(|source| {
                let template = Template::parse(source);
                match template.max_capture() {
                    Some(_) => Err(TableError::CapturePlaceholderInFallback {
                        template: source.clone(),
                    }),
                    None => Ok(template),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut reflections = ReflectionMap::english();
        for (word, replacement) in &spec.reflections {
            reflections.insert(word, replacement);
        }

        let mut by_keyword = HashMap::new();
        for (i, kw) in spec.keywords.iter().enumerate() {
            let key = fold_phrase(&kw.word).join(" ");
            if key.is_empty() {
                return Err(TableError::EmptyKeyword { index: i });
            }
            if by_keyword.insert(key.clone(), i).is_some() {
                return Err(TableError::DuplicateKeyword { keyword: key });
            }
        }

        let entries = spec
            .keywords
            .iter()
            .map(|kw| build_entry(kw, &by_keyword))
            .collect::<Result<Vec<_>, _>>()?;

        check_redirect_cycles(&entries)?;

        Ok(Self {
            entries,
            fallbacks,
            reflections,
            by_keyword,
        })
    }

    pub fn entries(&self) -> &[KeywordEntry] {
        &self.entries
    }

    pub fn entry(&self, keyword: &str) -> Option<&KeywordEntry> {
        let key = fold_phrase(keyword).join(" ");
        self.by_keyword.get(&key).map(|&i| &self.entries[i])
    }

    pub fn fallbacks(&self) -> &[Template] {
        &self.fallbacks
    }

    pub fn reflections(&self) -> &ReflectionMap {
        &self.reflections
    }

    /// Every keyword present in the input, at its earliest position.
    pub fn keywords_in(&self, words: &[Word]) -> Vec<KeywordHit> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(entry, kw)| {
                kw.first_occurrence(words).map(|position| KeywordHit {
                    entry,
                    position,
                    rank: kw.rank,
                })
            })
            .collect()
    }

    /// Highest rank wins; ties go to the keyword that appears first.
    pub fn select_keyword(&self, words: &[Word]) -> Option<KeywordHit> {
        self.keywords_in(words).into_iter().min_by(|a, b| {
            b.rank
                .cmp(&a.rank)
                .then(a.position.cmp(&b.position))
                .then(a.entry.cmp(&b.entry))
        })
    }
}

fn build_entry(
    spec: &KeywordSpec,
    by_keyword: &HashMap<String, usize>,
) -> Result<KeywordEntry, TableError> {
    let folded = fold_phrase(&spec.word);
    let keyword = folded.join(" ");
    if spec.rules.is_empty() {
        return Err(TableError::NoRules { keyword });
    }

    let synonyms: Vec<Vec<String>> = spec
        .synonyms
        .iter()
        .map(|s| fold_phrase(s))
        .filter(|s| !s.is_empty())
        .collect();

    let mut rules = Vec::with_capacity(spec.rules.len());
    for (index, rule) in spec.rules.iter().enumerate() {
        let mut pattern = Pattern::parse(&rule.pattern);
        if pattern.is_empty() {
            return Err(TableError::EmptyPattern {
                keyword: keyword.clone(),
                rule: index,
            });
        }
        if pattern.has_adjacent_wildcards() {
            return Err(TableError::AdjacentWildcards {
                keyword: keyword.clone(),
                rule: index,
                pattern: rule.pattern.clone(),
            });
        }
        if folded.len() == 1 {
            pattern.accept_synonyms(&folded[0], &synonyms);
        }
        if rule.reassembly.is_empty() {
            return Err(TableError::EmptyReassembly {
                keyword: keyword.clone(),
                rule: index,
            });
        }

        let captures = pattern.wildcards();
        let mut reassemblies = Vec::with_capacity(rule.reassembly.len());
        for source in &rule.reassembly {
            if let Some(target) = source.trim().strip_prefix(GOTO_PREFIX) {
                let target = fold_phrase(target).join(" ");
                let Some(&entry) = by_keyword.get(&target) else {
                    return Err(TableError::UnknownRedirect {
                        keyword: keyword.clone(),
                        rule: index,
                        target,
                    });
                };
                reassemblies.push(Reassembly::Goto {
                    keyword: target,
                    entry,
                });
                continue;
            }

            let template = Template::parse(source);
            if let Some(max) = template.max_capture().filter(|&m| m >= captures) {
                return Err(TableError::PlaceholderOutOfRange {
                    keyword: keyword.clone(),
                    rule: index,
                    template: source.clone(),
                    index: max,
                    captures,
                });
            }
            reassemblies.push(Reassembly::Template(template));
        }

        rules.push(DecompositionRule {
            pattern,
            frame: rule.frame,
            reassemblies,
        });
    }

    let mut triggers = vec![folded];
    triggers.extend(synonyms);

    Ok(KeywordEntry {
        keyword,
        rank: spec.rank,
        triggers,
        rules,
    })
}

fn redirect_targets(entry: &KeywordEntry) -> impl Iterator<Item = usize> + '_ {
    entry
        .rules
        .iter()
        .flat_map(|r| r.reassemblies.iter())
        .filter_map(|r| match r {
            Reassembly::Goto { entry, .. } => Some(*entry),
            Reassembly::Template(_) => None,
        })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

/// Depth-first search over redirect edges; any back edge is a cycle.
fn check_redirect_cycles(entries: &[KeywordEntry]) -> Result<(), TableError> {
    fn visit(
        node: usize,
        entries: &[KeywordEntry],
        marks: &mut [Visit],
        path: &mut Vec<usize>,
    ) -> Result<(), TableError> {
        marks[node] = Visit::Active;
        path.push(node);
        for target in redirect_targets(&entries[node]) {
            match marks[target] {
                Visit::Active => {
                    let start = path.iter().position(|&n| n == target).unwrap_or(0);
                    let chain = path[start..]
                        .iter()
                        .chain(std::iter::once(&target))
                        .map(|&n| entries[n].keyword.as_str())
                        .collect::<Vec<_>>()
                        .join(" -> ");
                    return Err(TableError::RedirectCycle { chain });
                }
                Visit::New => visit(target, entries, marks, path)?,
                Visit::Done => {}
            }
        }
        path.pop();
        marks[node] = Visit::Done;
        Ok(())
    }

    let mut marks = vec![Visit::New; entries.len()];
    let mut path = Vec::new();
    for node in 0..entries.len() {
        if marks[node] == Visit::New {
            visit(node, entries, &mut marks, &mut path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::normalize;

    fn table(source: &str) -> Result<RuleTable, TableError> {
        RuleTable::from_toml_str(source)
    }

    const SMALL: &str = r#"
fallbacks = ["Please go on."]

[[keyword]]
word = "mother"
rank = 2
synonyms = ["mom", "mum"]

[[keyword.rule]]
pattern = "* mother *"
reassembly = ["Tell me more about your mother."]

[[keyword]]
word = "sad"
rank = 2

[[keyword.rule]]
pattern = "* sad *"
reassembly = ["Why do you feel sad?"]

[[keyword]]
word = "computer"
rank = 5

[[keyword.rule]]
pattern = "* computer *"
reassembly = ["Do computers worry you?"]
"#;

    #[test]
    fn test_builtin_table_is_valid() {
        let table = RuleTable::builtin().unwrap();
        assert!(!table.entries().is_empty());
        assert!(!table.fallbacks().is_empty());
        assert!(table.entry("I'm").is_some());
    }

    #[test]
    fn test_highest_rank_wins() {
        let table = table(SMALL).unwrap();
        let words = normalize("my mother broke the computer");
        let hit = table.select_keyword(&words).unwrap();
        assert_eq!(table.entries()[hit.entry].keyword(), "computer");
    }

    #[test]
    fn test_rank_tie_prefers_earliest() {
        let table = table(SMALL).unwrap();
        let words = normalize("I am sad about my mother");
        let hit = table.select_keyword(&words).unwrap();
        assert_eq!(table.entries()[hit.entry].keyword(), "sad");
        assert_eq!(hit.position, 2);
    }

    #[test]
    fn test_synonym_triggers_keyword() {
        let table = table(SMALL).unwrap();
        let words = normalize("My mum called");
        let hit = table.select_keyword(&words).unwrap();
        let entry = &table.entries()[hit.entry];
        assert_eq!(entry.keyword(), "mother");
        assert!(entry.decompose(&words).is_some());
    }

    #[test]
    fn test_no_keyword() {
        let table = table(SMALL).unwrap();
        assert!(table.select_keyword(&normalize("xyz qux blah")).is_none());
        assert!(table.select_keyword(&[]).is_none());
    }

    #[test]
    fn test_rejects_empty_reassembly() {
        let err = table(
            r#"
fallbacks = ["Go on."]
[[keyword]]
word = "x"
[[keyword.rule]]
pattern = "* x *"
reassembly = []
"#,
        )
        .unwrap_err();
        assert!(matches!(err, TableError::EmptyReassembly { rule: 0, .. }));
    }

    #[test]
    fn test_rejects_missing_fallbacks() {
        let err = table("fallbacks = []").unwrap_err();
        assert!(matches!(err, TableError::EmptyFallbacks));
    }

    #[test]
    fn test_rejects_capture_in_fallback() {
        let err = table(r#"fallbacks = ["You said {0}"]"#).unwrap_err();
        assert!(matches!(err, TableError::CapturePlaceholderInFallback { .. }));
    }

    #[test]
    fn test_rejects_placeholder_out_of_range() {
        let err = table(
            r#"
fallbacks = ["Go on."]
[[keyword]]
word = "x"
[[keyword.rule]]
pattern = "x *"
reassembly = ["{0} and {1}"]
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TableError::PlaceholderOutOfRange {
                index: 1,
                captures: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_adjacent_wildcards() {
        let err = table(
            r#"
fallbacks = ["Go on."]
[[keyword]]
word = "x"
[[keyword.rule]]
pattern = "* * x"
reassembly = ["Hm."]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, TableError::AdjacentWildcards { .. }));
    }

    #[test]
    fn test_rejects_unknown_redirect() {
        let err = table(
            r#"
fallbacks = ["Go on."]
[[keyword]]
word = "x"
[[keyword.rule]]
pattern = "* x *"
reassembly = ["goto nowhere"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, TableError::UnknownRedirect { .. }));
    }

    #[test]
    fn test_rejects_self_redirect() {
        let err = table(
            r#"
fallbacks = ["Go on."]
[[keyword]]
word = "loop"
[[keyword.rule]]
pattern = "* loop *"
reassembly = ["goto loop"]
"#,
        )
        .unwrap_err();
        match err {
            TableError::RedirectCycle { chain } => assert_eq!(chain, "loop -> loop"),
            other => panic!("Expected RedirectCycle, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_indirect_cycle() {
        let err = table(
            r#"
fallbacks = ["Go on."]
[[keyword]]
word = "a"
[[keyword.rule]]
pattern = "*"
reassembly = ["goto b"]
[[keyword]]
word = "b"
[[keyword.rule]]
pattern = "*"
reassembly = ["Fine.", "goto a"]
"#,
        )
        .unwrap_err();
        match err {
            TableError::RedirectCycle { chain } => assert_eq!(chain, "a -> b -> a"),
            other => panic!("Expected RedirectCycle, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_duplicate_keyword() {
        let err = table(
            r#"
fallbacks = ["Go on."]
[[keyword]]
word = "I'm"
[[keyword.rule]]
pattern = "*"
reassembly = ["A."]
[[keyword]]
word = "i am"
[[keyword.rule]]
pattern = "*"
reassembly = ["B."]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, TableError::DuplicateKeyword { .. }));
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(matches!(table("fallbacks = ["), Err(TableError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        std::fs::write(&path, SMALL).unwrap();
        let table = RuleTable::load(&path).unwrap();
        assert_eq!(table.entries().len(), 3);

        assert!(RuleTable::load(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_custom_reflections() {
        let table = table(
            r#"
fallbacks = ["Go on."]
[reflections]
mum = "your mum"
"#,
        )
        .unwrap();
        assert!(table.reflections().contains("mum"));
    }
}
