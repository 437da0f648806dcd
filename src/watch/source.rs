//! # Snapshot sources.
//!
//! A [`SnapshotSource`] produces the complete current set of objects on every
//! call; the polling adapter turns consecutive snapshots into notifications.
//!
//! [`decode_list`] accepts the two shapes sources produce: a Kubernetes `List`
//! (`{"kind": "List", "items": [...]}`, what `kubectl get -o json` prints) or a
//! bare JSON array of objects.

use async_trait::async_trait;
use serde::de::Error as _;
use serde_json::Value;

use super::notification::Object;
use crate::error::WatchError;

/// Something that can list every declaration-like object at once.
#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Lists the current objects. Undecodable items come back as [`Object::Undecodable`].
    async fn list(&self) -> Result<Vec<Object>, WatchError>;
}

/// Decodes a listing into objects, classifying each item separately.
///
/// Fails only if the document itself is not JSON or not a list.
pub fn decode_list(bytes: &[u8]) -> Result<Vec<Object>, WatchError> {
    let items = match serde_json::from_slice::<Value>(bytes)? {
        Value::Array(items) => items,
        Value::Object(mut doc) => match doc.remove("items") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) => Vec::new(),
            _ => {
                return Err(WatchError::Decode(serde_json::Error::custom(
                    "expected a List with an `items` array",
                )));
            }
        },
        _ => {
            return Err(WatchError::Decode(serde_json::Error::custom(
                "expected a JSON array or List object",
            )));
        }
    };
    Ok(items.into_iter().map(Object::from_value).collect())
}
