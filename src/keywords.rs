//! Keyword gate: the admission filter for persisted results.
//!
//! A file is kept only if its normalized text contains at least one
//! vocabulary entry as a case-insensitive substring. There is no
//! word-boundary check, so `trump` also matches `trumpet`.

use std::path::Path;

use crate::error::{Error, Result};

/// Vocabulary used when no keyword file is configured.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "epstein",
    "jeffrey epstein",
    "jeffery epstein",
    "jeffery",
    "epstein island",
    "little st. james",
    "lsj",
    "little saint james",
    "palm beach",
    "new york mansion",
    "massage",
    "trafficking",
    "minor",
    "victim",
    "flight log",
    "flight logs",
    "pilot",
    "maxwell",
    "ghislaine",
    "gmax",
    "wexner",
    "leslie wexner",
    "ehud barak",
    "jean-luc",
    "brunel",
    "jean-luc brunel",
    "kellen",
    "dubin",
    "glenn dubin",
    "ava dubin",
    "trump",
    "donald trump",
    "melania",
    "ivanka",
    "mar-a-lago",
    "clinton",
    "bill clinton",
    "hillary clinton",
    "prince andrew",
    "kevin spacey",
    "bill gates",
    "dershowitz",
    "alan dershowitz",
    "giuffre",
    "virginia giuffre",
    "virginia roberts",
    "johanna sjoberg",
    "courtney wilde",
    "carolyn",
    "zorro ranch",
    "st. thomas",
    "virgin islands",
    "upper east side",
    "affidavit",
    "testimony",
    "indictment",
    "deposition",
    "lawsuit",
    "sealed",
    "unsealed",
    "fbi",
    "cia",
    "mi6",
    "plea deal",
    "flight",
    "manifest",
    "passport",
    "travel records",
    "bank wire",
    "trust",
    "foundation",
    "blackmail",
    "surveillance",
    "recordings",
    "hidden camera",
    "escort",
    "modeling agency",
    "handler",
];

/// An ordered, duplicate-free keyword vocabulary.
#[derive(Debug, Clone)]
pub struct KeywordGate {
    /// `(as configured, lower-cased)` pairs in vocabulary order.
    entries: Vec<(String, String)>,
}

impl KeywordGate {
    /// Build a gate from an ordered vocabulary.
    ///
    /// Entries are trimmed; blank entries are dropped (an empty keyword
    /// would match every file) and later case-insensitive duplicates of
    /// an earlier entry are ignored.
    pub fn new<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: Vec<(String, String)> = Vec::new();
        for word in vocabulary {
            let word = word.as_ref().trim();
            if word.is_empty() {
                continue;
            }
            let lower = word.to_lowercase();
            if entries.iter().any(|(_, seen)| *seen == lower) {
                continue;
            }
            entries.push((word.to_string(), lower));
        }
        Self { entries }
    }

    /// Read a vocabulary file: one keyword per line, blank lines and
    /// lines starting with `#` ignored.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "cannot read keyword file {}: {e}",
                path.display()
            ))
        })?;

        let gate = Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        );
        if gate.is_empty() {
            return Err(Error::Config(format!(
                "keyword file {} contains no keywords",
                path.display()
            )));
        }
        Ok(gate)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vocabulary entries contained in `text`, in vocabulary order.
    ///
    /// An empty result means the file must be discarded.
    pub fn matched<'a>(&'a self, text: &str) -> Vec<&'a str> {
        let lower = text.to_lowercase();
        self.entries
            .iter()
            .filter(|(_, needle)| lower.contains(needle.as_str()))
            .map(|(word, _)| word.as_str())
            .collect()
    }
}

impl Default for KeywordGate {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_are_case_insensitive_substrings() {
        let gate = KeywordGate::new(["trump", "flight log"]);
        assert_eq!(gate.matched("A TRUMPET solo"), vec!["trump"]);
        assert_eq!(gate.matched("see Flight Logs"), vec!["flight log"]);
    }

    #[test]
    fn output_follows_vocabulary_order() {
        let gate = KeywordGate::new(["zeta", "alpha", "mid"]);
        assert_eq!(
            gate.matched("alpha then mid then zeta"),
            vec!["zeta", "alpha", "mid"]
        );
    }

    #[test]
    fn no_match_is_empty() {
        let gate = KeywordGate::default();
        assert!(gate.matched("grocery list: eggs, milk").is_empty());
        assert!(gate.matched("").is_empty());
    }

    #[test]
    fn every_entry_satisfying_the_predicate_is_returned() {
        let gate = KeywordGate::default();
        let text = "Meeting with Epstein about Flight Logs";
        let lower = text.to_lowercase();
        let expected: Vec<&str> = DEFAULT_KEYWORDS
            .iter()
            .copied()
            .filter(|k| lower.contains(k))
            .collect();
        assert_eq!(gate.matched(text), expected);
        assert!(expected.contains(&"epstein"));
        assert!(expected.contains(&"flight log"));
        assert!(expected.contains(&"flight logs"));
    }

    #[test]
    fn blank_and_duplicate_entries_are_dropped() {
        let gate = KeywordGate::new(["FBI", "", "  ", "fbi", "cia"]);
        assert_eq!(gate.len(), 2);
        assert_eq!(gate.matched("the fbi and the CIA"), vec!["FBI", "cia"]);
    }

    #[test]
    fn default_vocabulary_has_no_duplicates() {
        let gate = KeywordGate::default();
        assert_eq!(gate.len(), DEFAULT_KEYWORDS.len());
    }

    #[test]
    fn loads_vocabulary_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("keywords.txt");
        std::fs::write(&path, "# people\nMaxwell\n\n  palm beach \n").unwrap();

        let gate = KeywordGate::from_file(&path).unwrap();
        assert_eq!(gate.len(), 2);
        assert_eq!(gate.matched("Palm Beach police"), vec!["palm beach"]);
    }

    #[test]
    fn empty_vocabulary_file_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("keywords.txt");
        std::fs::write(&path, "# nothing here\n\n").unwrap();

        assert!(matches!(
            KeywordGate::from_file(&path),
            Err(Error::Config(_))
        ));
    }
}
