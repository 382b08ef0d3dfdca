//! Heuristic hints attached to NameError, AttributeError and ValueError.
//!
//! A hint is a supplementary suggestion helping the user diagnose a typo or
//! a habit carried over from another language. Suggestions come from edit
//! distance against in-scope names (threshold 2, top 3, ranked by ascending
//! distance); NameError sites additionally inspect the offending source line
//! for well-known foreign-language constructs.

use std::fmt;

use strum::{Display, IntoStaticStr};

use crate::scope::Scope;
use crate::types::ClassDef;

/// What produced the hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum HintKind {
    Typo,
    LanguageConversion,
    Enum,
    Attribute,
    KeywordTypo,
    General,
}

/// A formatted hint with its ranked suggestions.
#[derive(Debug, Clone)]
pub struct Hint {
    pub kind: HintKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

impl Hint {
    pub fn new(kind: HintKind, message: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            suggestions,
        }
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hint ({}): {}", self.kind, self.message)?;
        if !self.suggestions.is_empty() {
            write!(f, " (did you mean {}?)", self.suggestions.join(", "))?;
        }
        Ok(())
    }
}

/// Maximum edit distance for a candidate to count as a near-miss.
const MAX_EDIT_DISTANCE: usize = 2;

/// Maximum number of suggestions attached to a hint.
const MAX_SUGGESTIONS: usize = 3;

/// Reserved words considered for keyword-typo hints.
const KEYWORDS: &[&str] = &[
    "let", "var", "const", "def", "class", "interface", "enum", "record", "if", "else", "for",
    "while", "loop", "return", "break", "continue", "try", "catch", "finally", "defer", "throw",
    "select", "go", "new", "this", "super", "true", "false", "nil",
];

/// Source-line patterns from other languages, with the Rill equivalent.
const FOREIGN_PATTERNS: &[(&str, &str)] = &[
    ("console.log", "println"),
    ("console.error", "println"),
    ("System.out.println", "println"),
    ("System.out.print", "print"),
    ("printf", "print"),
    ("fmt.Println", "println"),
    ("fmt.Printf", "print"),
    ("puts ", "println"),
    ("echo ", "println"),
    ("print(", "print"),
];

/// Classic Levenshtein distance over unicode scalar values.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let sub_cost = usize::from(ca != cb);
            cur[j + 1] = (prev[j] + sub_cost).min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Ranks `candidates` by edit distance to `target`, keeping near-misses
/// within the threshold, ascending distance, top 3. Ties break
/// alphabetically so suggestion order is stable.
pub fn rank_suggestions<I>(target: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut scored: Vec<(usize, String)> = candidates
        .into_iter()
        .filter(|c| c != target && !c.starts_with("__"))
        .filter_map(|c| {
            let dist = edit_distance(target, &c);
            (dist <= MAX_EDIT_DISTANCE).then_some((dist, c))
        })
        .collect();
    scored.sort();
    scored.dedup();
    scored.truncate(MAX_SUGGESTIONS);
    scored.into_iter().map(|(_, name)| name).collect()
}

/// Builds the hint for an undefined name, if one applies.
///
/// Checks, in order: foreign-language constructs on the offending source
/// line, keyword near-misses, and near-misses among the names visible from
/// `scope` (the full chain, so builtin globals are included).
pub fn name_error_hint(name: &str, scope: &Scope) -> Option<Hint> {
    if let Some(hint) = language_conversion_hint(name, scope) {
        return Some(hint);
    }

    let keyword_matches = rank_suggestions(name, KEYWORDS.iter().map(|k| (*k).to_owned()));
    if !keyword_matches.is_empty() {
        return Some(Hint::new(
            HintKind::KeywordTypo,
            format!("'{name}' looks like a misspelled keyword"),
            keyword_matches,
        ));
    }

    let visible = scope.visible_names();
    let matches = rank_suggestions(name, visible);
    if matches.is_empty() {
        None
    } else {
        Some(Hint::new(
            HintKind::Typo,
            format!("'{name}' is not defined; a similarly named binding exists"),
            matches,
        ))
    }
}

/// Scans the offending source line for constructs from other languages.
fn language_conversion_hint(name: &str, scope: &Scope) -> Option<Hint> {
    let line_no = scope.pos().line;
    let line = scope.source_line(line_no)?;
    for (pattern, replacement) in FOREIGN_PATTERNS {
        // `print(` would match Rill's own print; only flag it when the
        // failing name itself is part of the pattern.
        if line.contains(pattern) && pattern.contains(name) {
            return Some(Hint::new(
                HintKind::LanguageConversion,
                format!("'{pattern}' is not Rill; use {replacement}(...) instead"),
                vec![(*replacement).to_owned()],
            ));
        }
    }
    None
}

/// Builds the hint for a missing attribute: near-misses among the
/// receiver class's field and method names, including inherited ones.
pub fn attribute_hint(name: &str, class: &ClassDef) -> Option<Hint> {
    let matches = rank_suggestions(name, class.member_names());
    if matches.is_empty() {
        None
    } else {
        Some(Hint::new(
            HintKind::Attribute,
            format!("'{}' has no member '{name}'", class.name()),
            matches,
        ))
    }
}

/// Builds the hint for a missing enum variant.
pub fn enum_hint(name: &str, enum_name: &str, variants: &[String]) -> Option<Hint> {
    let matches = rank_suggestions(name, variants.iter().cloned());
    if matches.is_empty() {
        None
    } else {
        Some(Hint::new(
            HintKind::Enum,
            format!("enum {enum_name} has no variant '{name}'"),
            matches,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("abc", "abc"), 0);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("printl", "println"), 1);
        assert_eq!(edit_distance("lenght", "length"), 2);
    }

    #[test]
    fn rank_filters_threshold_and_truncates() {
        let candidates = ["println", "print", "printer", "parse", "join"]
            .iter()
            .map(|s| (*s).to_owned());
        let out = rank_suggestions("printl", candidates);
        // "print" and "println" are both one edit away, "printer" two;
        // "parse" and "join" are past the threshold.
        assert_eq!(out, vec!["print".to_owned(), "println".to_owned(), "printer".to_owned()]);
    }

    #[test]
    fn rank_excludes_exact_and_internal_names() {
        let candidates = ["count", "__count", "counts"].iter().map(|s| (*s).to_owned());
        let out = rank_suggestions("count", candidates);
        assert_eq!(out, vec!["counts".to_owned()]);
    }

    #[test]
    fn keyword_list_is_close_to_common_typos() {
        let out = rank_suggestions("wihle", KEYWORDS.iter().map(|k| (*k).to_owned()));
        assert_eq!(out[0], "while");
    }

    #[test]
    fn hint_kind_serialization() {
        assert_eq!(HintKind::LanguageConversion.to_string(), "language_conversion");
        assert_eq!(HintKind::KeywordTypo.to_string(), "keyword_typo");
        assert_eq!(HintKind::Typo.to_string(), "typo");
    }
}
