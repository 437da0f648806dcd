//! # Informer-style object cache.
//!
//! [`Store`] remembers the last listing of a source by store key and turns the
//! next full listing into the notifications a watching client would have seen:
//!
//! ```text
//! key only in new listing       → Added(new)
//! key in both, object changed   → Updated { old, new }
//! key only in old listing       → Deleted(tombstone(old))
//! ```
//!
//! Deletions are reported as tombstones because a listing never shows the
//! object's final state, only its absence. Notifications come out sorted by key.
//!
//! A key that is listed but unreadable is "held": its cached object stays, and
//! nothing is reported for it until a readable version shows up again.

use std::collections::{BTreeMap, BTreeSet};

use super::notification::{Notification, Object};
use crate::reconcile::Declaration;

/// Last known declarations keyed by `namespace/name`.
#[derive(Debug, Default)]
pub struct Store {
    objects: BTreeMap<String, Declaration>,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached declarations.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Cached declaration under `key`.
    pub fn get(&self, key: &str) -> Option<&Declaration> {
        self.objects.get(key)
    }

    /// Replaces the cache with `listing` and returns what changed.
    ///
    /// If a key appears more than once in `listing`, the last object wins.
    pub fn replace(&mut self, listing: Vec<Declaration>) -> Vec<Notification> {
        self.replace_holding(listing, &BTreeSet::new())
    }

    /// Like [`Store::replace`], but a cached key in `held` that is missing from
    /// `listing` keeps its object instead of being deleted.
    pub fn replace_holding(
        &mut self,
        listing: Vec<Declaration>,
        held: &BTreeSet<String>,
    ) -> Vec<Notification> {
        let mut next: BTreeMap<String, Declaration> =
            listing.into_iter().map(|d| (d.key(), d)).collect();
        let mut prev = std::mem::take(&mut self.objects);
        let mut out = Vec::new();

        for (key, decl) in &next {
            match prev.remove(key) {
                None => out.push((key.clone(), Notification::Added(decl.clone().into()))),
                Some(old) if old != *decl => out.push((
                    key.clone(),
                    Notification::Updated {
                        old: old.into(),
                        new: decl.clone().into(),
                    },
                )),
                Some(_) => {}
            }
        }
        for (key, old) in prev {
            if held.contains(&key) {
                next.insert(key, old);
                continue;
            }
            let tombstone = Object::from(old).into_tombstone(key.clone());
            out.push((key, Notification::Deleted(tombstone)));
        }

        self.objects = next;
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out.into_iter().map(|(_, n)| n).collect()
    }
}
