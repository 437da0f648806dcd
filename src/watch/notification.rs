//! # Notification payloads crossing the watch boundary.
//!
//! Watch adapters describe what changed in the store as [`Notification`]s.
//! Payloads are [`Object`]s rather than declarations because a store may hand
//! out things the reconciler cannot use: objects of another kind, or a
//! [`Tombstone`] standing in for an object whose final state was missed.

use serde_json::Value;

use crate::reconcile::{DECLARATION_KIND, Declaration};

/// Payload of a notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Object {
    /// A decoded declaration.
    Declaration(Box<Declaration>),
    /// Deletion marker carrying the last-known state of the object.
    Tombstone(Tombstone),
    /// Object of another kind.
    Unknown {
        /// Reported kind.
        kind: String,
        /// Store key, when the object names itself.
        key: Option<String>,
    },
    /// Declaration-kind object that failed to decode.
    ///
    /// The object still exists in the store; only its current state is unreadable.
    Undecodable {
        /// Store key, when `metadata.name` was readable.
        key: Option<String>,
        /// Decoder message.
        error: String,
    },
}

/// Deletion marker for an object whose final state was not observed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tombstone {
    /// Store key of the deleted object.
    pub key: String,
    /// Last state the store knew about.
    pub last_known: Box<Object>,
}

impl Object {
    /// Returns the declaration if this payload is one (tombstones are not unwrapped).
    pub fn as_declaration(&self) -> Option<&Declaration> {
        match self {
            Object::Declaration(d) => Some(d.as_ref()),
            _ => None,
        }
    }

    /// Wraps `self` in a tombstone keyed by `key`.
    pub fn into_tombstone(self, key: impl Into<String>) -> Object {
        Object::Tombstone(Tombstone {
            key: key.into(),
            last_known: Box::new(self),
        })
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            Object::Declaration(d) => format!("{DECLARATION_KIND} {}", d.key()),
            Object::Tombstone(t) => format!("tombstone {} ({})", t.key, t.last_known.describe()),
            Object::Unknown { kind, key: Some(key) } => format!("{kind} {key}"),
            Object::Unknown { kind, key: None } => kind.clone(),
            Object::Undecodable { key, error } => format!(
                "undecodable {DECLARATION_KIND} {}: {error}",
                key.as_deref().unwrap_or("<unnamed>")
            ),
        }
    }

    /// Store key of an object whose current state could not be read.
    pub fn undecodable_key(&self) -> Option<&str> {
        match self {
            Object::Undecodable { key, .. } => key.as_deref(),
            _ => None,
        }
    }

    /// Decodes a JSON object, classifying anything that is not a declaration as
    /// [`Object::Unknown`].
    ///
    /// A missing `kind` is accepted so hand-written manifests can omit it.
    pub fn from_value(value: Value) -> Object {
        let key = store_key(&value);

        match value.get("kind").and_then(Value::as_str) {
            Some(k) if k != DECLARATION_KIND => {
                return Object::Unknown {
                    kind: k.to_owned(),
                    key,
                };
            }
            _ => {}
        }

        match serde_json::from_value::<Declaration>(value) {
            Ok(decl) => Object::Declaration(Box::new(decl)),
            Err(err) => Object::Undecodable {
                key,
                error: err.to_string(),
            },
        }
    }
}

/// `namespace/name` read straight from raw metadata, like [`Declaration::key`].
fn store_key(value: &Value) -> Option<String> {
    let meta = value.get("metadata")?;
    let name = meta.get("name")?.as_str()?;
    match meta.get("namespace").and_then(Value::as_str) {
        Some(ns) if !ns.is_empty() => Some(format!("{ns}/{name}")),
        _ => Some(name.to_owned()),
    }
}

impl From<Declaration> for Object {
    fn from(decl: Declaration) -> Self {
        Object::Declaration(Box::new(decl))
    }
}

/// Change reported by a watch adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    /// Object appeared in the store.
    Added(Object),
    /// Object changed from `old` to `new`.
    Updated {
        /// Previous state.
        old: Object,
        /// Current state.
        new: Object,
    },
    /// Object left the store; may be a [`Tombstone`].
    Deleted(Object),
}

impl Notification {
    /// Name of the hook that produces this notification.
    pub fn hook(&self) -> &'static str {
        match self {
            Notification::Added(_) => "on_add",
            Notification::Updated { .. } => "on_update",
            Notification::Deleted(_) => "on_delete",
        }
    }
}
