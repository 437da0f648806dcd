//! # Reconciler: notifications in, host intents out.
//!
//! Turns declaration notifications into the minimal set of [`Intent`]s. The
//! enabled flag of the previous and current snapshot selects the transition:
//!
//! ```text
//!  previous   current    intents
//!  disabled → disabled   (none)
//!  disabled → enabled    HostsAdded(current hosts)
//!  enabled  → disabled   HostsRemoved(previous hosts)
//!  enabled  → enabled    HostsRemoved(old \ new), then HostsAdded(new \ old)
//! ```
//!
//! `on_add` runs the machine from an empty disabled state, `on_delete` runs it to
//! an empty disabled state, `on_update` uses both snapshots. Removals always go
//! out before additions, and empty intents are never emitted.
//!
//! ## Worker
//! [`Reconciler::run`] consumes one ordered channel on a single task, so
//! notifications are handled strictly in delivery order with no locking here.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::declaration::{Declaration, ENABLED_ANNOTATION, Extracted, extract};
use super::handler::{HostHandler, Intent};
use super::hosts::{HostSet, diff};
use crate::events::{Bus, Event, EventKind};
use crate::watch::{Notification, Object};

/// Derives intents for one declaration moving from `previous` to `current`.
///
/// Use [`Extracted::default`] for the "no object" side of a create or delete.
pub fn transition(previous: &Extracted, current: &Extracted) -> Vec<Intent> {
    let mut intents = Vec::with_capacity(2);

    match (previous.enabled, current.enabled) {
        (false, false) => {}
        (false, true) => {
            let added: HostSet = current.hosts.iter().cloned().collect();
            if !added.is_empty() {
                intents.push(Intent::HostsAdded(added));
            }
        }
        (true, false) => {
            let removed: HostSet = previous.hosts.iter().cloned().collect();
            if !removed.is_empty() {
                intents.push(Intent::HostsRemoved(removed));
            }
        }
        (true, true) => {
            let delta = diff(&previous.hosts, &current.hosts);
            if !delta.removed.is_empty() {
                intents.push(Intent::HostsRemoved(delta.removed));
            }
            if !delta.added.is_empty() {
                intents.push(Intent::HostsAdded(delta.added));
            }
        }
    }

    intents
}

/// Intents derived from one notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    /// Key of the declaration the notification was about.
    pub declaration: String,
    /// Intents in the order they must be applied.
    pub intents: Vec<Intent>,
}

/// A notification whose payload could not be used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dropped {
    /// Hook that delivered it.
    pub hook: &'static str,
    /// Description of what was received.
    pub received: String,
}

impl fmt::Display for Dropped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} received {}", self.hook, self.received)
    }
}

/// Converts declaration notifications into intents for a [`HostHandler`].
pub struct Reconciler {
    handler: Arc<dyn HostHandler>,
    annotation: Arc<str>,
    bus: Bus,
}

impl Reconciler {
    /// Creates a reconciler recognizing [`ENABLED_ANNOTATION`].
    pub fn new(handler: Arc<dyn HostHandler>, bus: Bus) -> Self {
        Self {
            handler,
            annotation: Arc::from(ENABLED_ANNOTATION),
            bus,
        }
    }

    /// Overrides the annotation key that enables a declaration.
    pub fn with_annotation(mut self, annotation: impl Into<Arc<str>>) -> Self {
        self.annotation = annotation.into();
        self
    }

    /// Derives the intents for `notification` without applying them.
    pub fn plan(&self, notification: &Notification) -> Result<Plan, Dropped> {
        let dropped = |obj: &Object| Dropped {
            hook: notification.hook(),
            received: obj.describe(),
        };

        match notification {
            Notification::Added(obj) => {
                let decl = obj.as_declaration().ok_or_else(|| dropped(obj))?;
                Ok(Plan {
                    declaration: decl.key(),
                    intents: transition(&Extracted::default(), &self.extract(decl)),
                })
            }
            Notification::Updated { old, new } => {
                let old_decl = old.as_declaration().ok_or_else(|| dropped(old))?;
                let new_decl = new.as_declaration().ok_or_else(|| dropped(new))?;
                Ok(Plan {
                    declaration: new_decl.key(),
                    intents: transition(&self.extract(old_decl), &self.extract(new_decl)),
                })
            }
            Notification::Deleted(obj) => {
                let decl = match obj {
                    Object::Tombstone(t) => t.last_known.as_declaration(),
                    other => other.as_declaration(),
                }
                .ok_or_else(|| dropped(obj))?;
                Ok(Plan {
                    declaration: decl.key(),
                    intents: transition(&self.extract(decl), &Extracted::default()),
                })
            }
        }
    }

    /// Plans `notification` and applies the resulting intents in order.
    pub async fn handle(&self, notification: Notification) {
        let plan = match self.plan(&notification) {
            Ok(plan) => plan,
            Err(dropped) => {
                self.bus.publish(
                    Event::new(EventKind::NotificationDropped).with_reason(dropped.to_string()),
                );
                return;
            }
        };

        for intent in &plan.intents {
            let kind = match intent {
                Intent::HostsAdded(_) => EventKind::HostsAdded,
                Intent::HostsRemoved(_) => EventKind::HostsRemoved,
            };
            self.bus.publish(
                Event::new(kind)
                    .with_declaration(plan.declaration.as_str())
                    .with_hosts(intent.hosts().iter().cloned()),
            );
            intent.apply(self.handler.as_ref()).await;
        }
    }

    /// Consumes notifications until `token` is cancelled or every sender is gone.
    pub async fn run(self, mut rx: mpsc::Receiver<Notification>, token: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Some(notification) => self.handle(notification).await,
                    None => break,
                },
            }
        }
    }

    fn extract(&self, decl: &Declaration) -> Extracted {
        extract(decl, &self.annotation)
    }
}
