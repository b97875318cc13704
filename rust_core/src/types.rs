//! Core value types for name reconciliation.

use crate::utils::matching::{display_form, identity_key};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// One team name as extracted from a source.
///
/// Keeps the trimmed surface form for display and a normalized identity key.
/// Equality, ordering and hashing use the key only, so "Arsenal" and
/// " arsenal " are the same team.
#[derive(Clone, Debug)]
pub struct TeamName {
    key: String,
    display: String,
}

impl TeamName {
    /// Build a name from raw text. Returns `None` for blank input.
    pub fn new(raw: &str) -> Option<Self> {
        let display = display_form(raw);
        if display.is_empty() {
            return None;
        }
        Some(Self {
            key: identity_key(&display),
            display,
        })
    }

    /// Normalized identity key (lowercase, single-spaced).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Surface form as first seen in the source.
    pub fn as_str(&self) -> &str {
        &self.display
    }
}

impl PartialEq for TeamName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for TeamName {}

impl Hash for TeamName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for TeamName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TeamName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for TeamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl Serialize for TeamName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display)
    }
}

impl<'de> Deserialize<'de> for TeamName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TeamName::new(&raw).ok_or_else(|| serde::de::Error::custom("team name is blank"))
    }
}

/// Unique team names from one source, iterated in key order.
///
/// When two surface forms share a key the first one inserted wins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NameSet {
    names: BTreeSet<TeamName>,
}

impl NameSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw name. Returns true if it was new.
    pub(crate) fn insert_raw(&mut self, raw: &str) -> bool {
        match TeamName::new(raw) {
            Some(name) => self.names.insert(name),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TeamName> + '_ {
        self.names.iter()
    }

    pub fn contains(&self, name: &TeamName) -> bool {
        self.names.contains(name)
    }

    /// Membership test on raw text (normalized first).
    pub fn contains_str(&self, raw: &str) -> bool {
        TeamName::new(raw).is_some_and(|n| self.names.contains(&n))
    }

    /// Names present in both sets; surface forms come from `self`.
    pub fn intersection(&self, other: &NameSet) -> NameSet {
        self.names
            .iter()
            .filter(|n| other.contains(n))
            .cloned()
            .collect()
    }

    /// Names in `self` that are absent from `other`.
    pub fn difference(&self, other: &NameSet) -> NameSet {
        self.names
            .iter()
            .filter(|n| !other.contains(n))
            .cloned()
            .collect()
    }
}

impl FromIterator<TeamName> for NameSet {
    fn from_iter<I: IntoIterator<Item = TeamName>>(iter: I) -> Self {
        let mut names = BTreeSet::new();
        for name in iter {
            // BTreeSet::insert keeps the existing element on duplicates
            names.insert(name);
        }
        Self { names }
    }
}

impl<'a> FromIterator<&'a str> for NameSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = NameSet::new();
        for raw in iter {
            set.insert_raw(raw);
        }
        set
    }
}

impl<'a> IntoIterator for &'a NameSet {
    type Item = &'a TeamName;
    type IntoIter = std::collections::btree_set::Iter<'a, TeamName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

/// A proposed match for some other name.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Candidate {
    pub name: TeamName,
    pub score: f64,
}

/// Accepted left -> right rename with its confidence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NameMapping {
    pub source: TeamName,
    pub target: TeamName,
    pub confidence: f64,
}
