//! # Host sets and the diff engine.
//!
//! [`HostSet`] is an insertion-ordered set of host names: duplicates collapse on
//! construction, equality is by membership only. Insertion order is kept solely
//! so logs read like the declaration they came from.
//!
//! [`diff`] compares two host lists by membership:
//! ```text
//! old = [a, b]        new = [b, c]
//!   added   = new \ old = {c}
//!   removed = old \ new = {a}
//! ```

use std::collections::HashSet;
use std::fmt;

/// Insertion-ordered, duplicate-free set of host names.
#[derive(Clone, Default)]
pub struct HostSet(Vec<String>);

impl HostSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns true if `host` is a member.
    pub fn contains(&self, host: &str) -> bool {
        self.0.iter().any(|h| h == host)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set has no members.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates members in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// Members as a slice, in insertion order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Consumes the set, returning its members.
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<S: Into<String>> FromIterator<S> for HostSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let mut hosts = Vec::new();
        for host in iter {
            let host = host.into();
            if seen.insert(host.clone()) {
                hosts.push(host);
            }
        }
        Self(hosts)
    }
}

impl PartialEq for HostSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|h| other.contains(h))
    }
}

impl Eq for HostSet {}

impl fmt::Debug for HostSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}

impl IntoIterator for HostSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a HostSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Membership delta between two host lists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostDiff {
    /// Hosts present in the new list only.
    pub added: HostSet,
    /// Hosts present in the old list only.
    pub removed: HostSet,
}

impl HostDiff {
    /// Returns true if neither side changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Computes the hosts added and removed between `old` and `new`.
///
/// Order and duplicates in the inputs do not matter.
///
/// # Example
/// ```
/// use mdnsvisor::{HostSet, diff};
///
/// let old = vec!["a".to_string(), "b".to_string()];
/// let new = vec!["b".to_string(), "c".to_string()];
/// let d = diff(&old, &new);
/// assert_eq!(d.added, HostSet::from_iter(["c"]));
/// assert_eq!(d.removed, HostSet::from_iter(["a"]));
/// ```
pub fn diff(old: &[String], new: &[String]) -> HostDiff {
    let old_set: HashSet<&str> = old.iter().map(String::as_str).collect();
    let new_set: HashSet<&str> = new.iter().map(String::as_str).collect();

    let added = new
        .iter()
        .filter(|h| !old_set.contains(h.as_str()))
        .cloned()
        .collect();
    let removed = old
        .iter()
        .filter(|h| !new_set.contains(h.as_str()))
        .cloned()
        .collect();

    HostDiff { added, removed }
}
