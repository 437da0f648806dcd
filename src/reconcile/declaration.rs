//! # Declarations and host extraction.
//!
//! A [`Declaration`] is the slice of an ingress object the reconciler cares about:
//! its identity, its annotations and its rule list. The serde layout follows the
//! Kubernetes `networking.k8s.io/v1` `Ingress` JSON shape, with every other field
//! ignored, so objects listed by `kubectl -o json` decode directly.
//!
//! [`extract`] is the only place that interprets a declaration:
//! - enabled iff the annotation is present with value exactly `"true"`
//! - hosts are the non-empty `host` fields of the rules, in order, duplicates kept

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// Annotation that opts a declaration into advertisement.
pub const ENABLED_ANNOTATION: &str = "mdnscontroller/enabled";

/// Kind of object a declaration is decoded from.
pub const DECLARATION_KIND: &str = "Ingress";

/// Declaration of hosts that should be advertised.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Declaration {
    /// Object identity and annotations.
    pub metadata: ObjectMeta,
    /// Rule list.
    #[serde(default, deserialize_with = "null_as_default")]
    pub spec: DeclarationSpec,
}

/// Identity and annotations of a declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Object name.
    pub name: String,
    /// Namespace (absent for cluster-scoped or hand-written objects).
    #[serde(default)]
    pub namespace: Option<String>,
    /// Annotations.
    #[serde(default, deserialize_with = "null_as_default")]
    pub annotations: BTreeMap<String, String>,
    /// Store version, if the source provides one.
    #[serde(default)]
    pub resource_version: Option<String>,
}

/// Rule list of a declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct DeclarationSpec {
    /// Rules in source order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub rules: Vec<Rule>,
}

/// Reads an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

/// Single rule, optionally naming a host.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Rule {
    /// Host name; `None` and `""` both mean "no host".
    #[serde(default)]
    pub host: Option<String>,
}

impl Declaration {
    /// Creates an empty declaration with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta {
                name: name.into(),
                ..ObjectMeta::default()
            },
            spec: DeclarationSpec::default(),
        }
    }

    /// Sets the namespace.
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.metadata.namespace = Some(namespace.into());
        self
    }

    /// Adds an annotation.
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.annotations.insert(key.into(), value.into());
        self
    }

    /// Marks the declaration enabled via [`ENABLED_ANNOTATION`].
    pub fn enabled(self) -> Self {
        self.with_annotation(ENABLED_ANNOTATION, "true")
    }

    /// Appends a rule carrying `host`.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.spec.rules.push(Rule {
            host: Some(host.into()),
        });
        self
    }

    /// Appends a rule without a host.
    pub fn with_hostless_rule(mut self) -> Self {
        self.spec.rules.push(Rule::default());
        self
    }

    /// Sets the store version.
    pub fn with_resource_version(mut self, version: impl Into<String>) -> Self {
        self.metadata.resource_version = Some(version.into());
        self
    }

    /// Object name.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Store key: `namespace/name`, or just `name` without a namespace.
    pub fn key(&self) -> String {
        match self.metadata.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => format!("{ns}/{}", self.metadata.name),
            _ => self.metadata.name.clone(),
        }
    }
}

/// Result of [`extract`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Extracted {
    /// Whether the declaration opts into advertisement.
    pub enabled: bool,
    /// Declared hosts in source order (duplicates possible).
    pub hosts: Vec<String>,
}

/// Reads the enabled flag and host list of a declaration.
///
/// `annotation` is the key whose value must be exactly `"true"`; no other
/// spelling counts.
///
/// # Example
/// ```
/// use mdnsvisor::{Declaration, ENABLED_ANNOTATION, extract};
///
/// let decl = Declaration::new("web")
///     .with_annotation(ENABLED_ANNOTATION, "true")
///     .with_host("web.local")
///     .with_hostless_rule()
///     .with_host("web.local");
///
/// let out = extract(&decl, ENABLED_ANNOTATION);
/// assert!(out.enabled);
/// assert_eq!(out.hosts, ["web.local", "web.local"]);
/// ```
pub fn extract(decl: &Declaration, annotation: &str) -> Extracted {
    let enabled = decl
        .metadata
        .annotations
        .get(annotation)
        .is_some_and(|v| v == "true");

    let hosts = decl
        .spec
        .rules
        .iter()
        .filter_map(|r| r.host.as_deref())
        .filter(|h| !h.is_empty())
        .map(str::to_owned)
        .collect();

    Extracted { enabled, hosts }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_requires_exact_true() {
        for value in ["True", "TRUE", "1", "yes", "true ", ""] {
            let decl = Declaration::new("x").with_annotation(ENABLED_ANNOTATION, value);
            assert!(!extract(&decl, ENABLED_ANNOTATION).enabled, "value {value:?}");
        }
        let decl = Declaration::new("x").enabled();
        assert!(extract(&decl, ENABLED_ANNOTATION).enabled);
    }

    #[test]
    fn missing_annotation_is_disabled() {
        let decl = Declaration::new("x").with_host("a.local");
        let out = extract(&decl, ENABLED_ANNOTATION);
        assert!(!out.enabled);
        assert_eq!(out.hosts, ["a.local"]);
    }

    #[test]
    fn other_annotation_key_is_ignored() {
        let decl = Declaration::new("x").with_annotation("mdnscontroller/Enabled", "true");
        assert!(!extract(&decl, ENABLED_ANNOTATION).enabled);
        assert!(extract(&decl, "mdnscontroller/Enabled").enabled);
    }

    #[test]
    fn hosts_skip_empty_and_missing() {
        let decl = Declaration::new("x")
            .with_host("a.local")
            .with_hostless_rule()
            .with_host("")
            .with_host("b.local")
            .with_host("a.local");
        assert_eq!(
            extract(&decl, ENABLED_ANNOTATION).hosts,
            ["a.local", "b.local", "a.local"]
        );
    }

    #[test]
    fn decodes_ingress_json() {
        let json = r#"{
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "metadata": {
                "name": "web",
                "namespace": "default",
                "resourceVersion": "42",
                "annotations": { "mdnscontroller/enabled": "true" }
            },
            "spec": {
                "ingressClassName": "traefik",
                "rules": [
                    { "host": "web.local", "http": { "paths": [] } },
                    { "http": { "paths": [] } }
                ]
            }
        }"#;
        let decl: Declaration = serde_json::from_str(json).expect("decode");
        assert_eq!(decl.key(), "default/web");
        assert_eq!(decl.metadata.resource_version.as_deref(), Some("42"));
        let out = extract(&decl, ENABLED_ANNOTATION);
        assert!(out.enabled);
        assert_eq!(out.hosts, ["web.local"]);
    }

    #[test]
    fn explicit_nulls_decode_as_empty() {
        let json = r#"{
            "metadata": { "name": "web", "namespace": "apps", "annotations": null },
            "spec": { "rules": null }
        }"#;
        let decl: Declaration = serde_json::from_str(json).expect("decode");
        assert!(decl.metadata.annotations.is_empty());
        assert!(decl.spec.rules.is_empty());

        let decl: Declaration =
            serde_json::from_str(r#"{"metadata": {"name": "bare"}, "spec": null}"#).expect("decode");
        assert_eq!(decl, Declaration::new("bare"));
    }

    #[test]
    fn key_without_namespace_is_name() {
        assert_eq!(Declaration::new("solo").key(), "solo");
        assert_eq!(Declaration::new("solo").in_namespace("").key(), "solo");
    }
}
