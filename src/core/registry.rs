//! # Host registry: which hosts have a live advertiser.
//!
//! The registry maps host name → handle of the running advertiser task. It is the
//! only shared mutable state of the supervisor and lives behind a single mutex
//! that is held for lookups, inserts and deletes only.
//!
//! ## Rules
//! - At most one entry per host.
//! - Every entry carries a generation id; an exiting task evicts its entry only
//!   if the id still matches, so a stale exit never removes a newer advertiser.
//! - Each entry's token is a child of the supervisor's runtime token.
//!
//! ```text
//! claim(h)   ──► absent?  insert {id, child token} → Some(Claim)
//!                present? → None
//! release(h) ──► present? cancel token, remove → true
//!                absent?  → false
//! evict(h,id)──► present with same id? remove → true
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Registry entry of a live advertiser.
struct Handle {
    /// Generation id of the task owning the entry.
    id: u64,
    /// Cancellation token of the task.
    cancel: CancellationToken,
}

/// Ticket returned by [`Registry::claim`] to the task that will run the host.
#[derive(Debug)]
pub struct Claim {
    /// Generation id; pass back to [`Registry::evict`] on exit.
    pub id: u64,
    /// Token the task must observe.
    pub token: CancellationToken,
}

/// Mutex-guarded map of advertised hosts.
pub struct Registry {
    hosts: Mutex<HashMap<String, Handle>>,
    next_id: AtomicU64,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            hosts: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers `host` with a fresh child token of `parent`, unless it is already present.
    pub async fn claim(&self, host: &str, parent: &CancellationToken) -> Option<Claim> {
        let mut hosts = self.hosts.lock().await;
        if hosts.contains_key(host) {
            return None;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = parent.child_token();
        hosts.insert(
            host.to_owned(),
            Handle {
                id,
                cancel: token.clone(),
            },
        );
        Some(Claim { id, token })
    }

    /// Cancels and removes `host`. Returns false if it was not registered.
    pub async fn release(&self, host: &str) -> bool {
        let mut hosts = self.hosts.lock().await;
        match hosts.remove(host) {
            Some(handle) => {
                handle.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Removes `host` only if its entry still belongs to generation `id`.
    pub async fn evict(&self, host: &str, id: u64) -> bool {
        let mut hosts = self.hosts.lock().await;
        match hosts.get(host) {
            Some(handle) if handle.id == id => {
                hosts.remove(host);
                true
            }
            _ => false,
        }
    }

    /// Returns true if `host` has a live entry.
    pub async fn contains(&self, host: &str) -> bool {
        self.hosts.lock().await.contains_key(host)
    }

    /// Returns sorted list of registered hosts.
    pub async fn list(&self) -> Vec<String> {
        let hosts = self.hosts.lock().await;
        let mut names: Vec<String> = hosts.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Returns true if no host is registered.
    pub async fn is_empty(&self) -> bool {
        self.hosts.lock().await.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn claim_is_exclusive_per_host() {
        let reg = Registry::new();
        let root = CancellationToken::new();

        let first = reg.claim("a", &root).await.expect("first claim");
        assert!(reg.claim("a", &root).await.is_none());
        assert!(reg.claim("b", &root).await.is_some());
        assert_eq!(reg.list().await, ["a", "b"]);
        assert!(!first.token.is_cancelled());
    }

    #[tokio::test]
    async fn release_cancels_and_is_idempotent() {
        let reg = Registry::new();
        let root = CancellationToken::new();
        let claim = reg.claim("a", &root).await.unwrap();

        assert!(reg.release("a").await);
        assert!(claim.token.is_cancelled());
        assert!(!reg.release("a").await);
        assert!(reg.is_empty().await);
    }

    #[tokio::test]
    async fn stale_evict_keeps_newer_entry() {
        let reg = Registry::new();
        let root = CancellationToken::new();

        let old = reg.claim("a", &root).await.unwrap();
        assert!(reg.release("a").await);
        let new = reg.claim("a", &root).await.unwrap();
        assert_ne!(old.id, new.id);

        assert!(!reg.evict("a", old.id).await);
        assert!(reg.contains("a").await);
        assert!(reg.evict("a", new.id).await);
        assert!(!reg.contains("a").await);
    }

    #[tokio::test]
    async fn parent_cancel_reaches_every_claim() {
        let reg = Registry::new();
        let root = CancellationToken::new();
        let a = reg.claim("a", &root).await.unwrap();
        let b = reg.claim("b", &root).await.unwrap();

        root.cancel();
        assert!(a.token.is_cancelled());
        assert!(b.token.is_cancelled());
    }
}
