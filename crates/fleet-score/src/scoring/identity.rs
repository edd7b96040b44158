//! Name-keyed identity resolution.
//!
//! Execution records reference operatives by free-text name. Every join that
//! relies on that name goes through this module so the matching rules live in
//! one place and collisions are reported instead of guessed away.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Canonical join key: zero-width characters removed, whitespace collapsed,
/// upper-cased.
pub fn normalize_name(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_uppercase()
}

/// How confidently a query name was tied to a single record key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    /// The normalized query equals the key.
    Exact,
    /// One key contains the query without being equal to it.
    Partial,
    /// Several distinct keys match; figures may blend more than one person.
    Ambiguous,
    /// No record matched at all.
    NoMatch,
}

impl MatchConfidence {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Exact => "Exact match",
            Self::Partial => "Partial name match",
            Self::Ambiguous => "Ambiguous name match",
            Self::NoMatch => "No match",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
    Exact(String),
    Partial(String),
    Ambiguous(Vec<String>),
    NoMatch,
}

impl NameMatch {
    pub fn confidence(&self) -> MatchConfidence {
        match self {
            NameMatch::Exact(_) => MatchConfidence::Exact,
            NameMatch::Partial(_) => MatchConfidence::Partial,
            NameMatch::Ambiguous(_) => MatchConfidence::Ambiguous,
            NameMatch::NoMatch => MatchConfidence::NoMatch,
        }
    }
}

/// Case-insensitive, containment-based resolver over normalized keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameResolver;

impl NameResolver {
    /// Substring test used by record-store name filters.
    pub fn matches(&self, query: &str, candidate: &str) -> bool {
        let query = normalize_name(query);
        if query.is_empty() {
            return false;
        }
        normalize_name(candidate).contains(&query)
    }

    /// Resolve a query against a set of keys. An exact key wins outright;
    /// otherwise a single key that contains, or is contained by, the query is
    /// a partial match and several are reported as ambiguous.
    pub fn resolve<'a, I>(&self, query: &str, keys: I) -> NameMatch
    where
        I: IntoIterator<Item = &'a str>,
    {
        let query = normalize_name(query);
        if query.is_empty() {
            return NameMatch::NoMatch;
        }

        let mut partial = BTreeSet::new();
        for key in keys {
            let key = normalize_name(key);
            if key == query {
                return NameMatch::Exact(key);
            }
            if !key.is_empty() && (key.contains(&query) || query.contains(&key)) {
                partial.insert(key);
            }
        }

        match partial.len() {
            0 => NameMatch::NoMatch,
            1 => NameMatch::Partial(partial.into_iter().next().unwrap_or_default()),
            _ => NameMatch::Ambiguous(partial.into_iter().collect()),
        }
    }

    /// Grade the distinct names a partial-match store read returned for a query.
    pub fn assess<'a, I>(&self, query: &str, returned: I) -> MatchConfidence
    where
        I: IntoIterator<Item = &'a str>,
    {
        let query = normalize_name(query);
        let distinct: BTreeSet<String> = returned.into_iter().map(normalize_name).collect();

        match distinct.len() {
            0 => MatchConfidence::NoMatch,
            1 if distinct.contains(&query) => MatchConfidence::Exact,
            1 => MatchConfidence::Partial,
            _ => MatchConfidence::Ambiguous,
        }
    }
}
