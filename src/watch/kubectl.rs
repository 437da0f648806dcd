//! # `kubectl`-backed source.
//!
//! [`KubectlSource`] shells out to `kubectl get ingresses -o json` and decodes
//! the printed `List`. Cluster access follows kubectl's own configuration;
//! `--context` and `--kubeconfig` can be pinned per source.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::{
    notification::Object,
    source::{SnapshotSource, decode_list},
};
use crate::error::WatchError;

/// Lists ingresses through the `kubectl` CLI.
#[derive(Clone, Debug)]
pub struct KubectlSource {
    program: String,
    namespace: Option<String>,
    context: Option<String>,
    kubeconfig: Option<String>,
}

impl KubectlSource {
    /// Lists ingresses of all namespaces with the `kubectl` found on `PATH`.
    pub fn new() -> Self {
        Self {
            program: "kubectl".to_owned(),
            namespace: None,
            context: None,
            kubeconfig: None,
        }
    }

    /// Uses another binary (e.g. an absolute path or a wrapper).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Restricts the listing to one namespace.
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Pins the kubeconfig context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Pins the kubeconfig file.
    pub fn with_kubeconfig(mut self, path: impl Into<String>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    /// Command-line arguments passed to the program.
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["get", "ingresses", "-o", "json"]
            .into_iter()
            .map(str::to_owned)
            .collect();
        match &self.namespace {
            Some(ns) => args.extend(["--namespace".to_owned(), ns.clone()]),
            None => args.push("--all-namespaces".to_owned()),
        }
        if let Some(ctx) = &self.context {
            args.extend(["--context".to_owned(), ctx.clone()]);
        }
        if let Some(path) = &self.kubeconfig {
            args.extend(["--kubeconfig".to_owned(), path.clone()]);
        }
        args
    }
}

impl Default for KubectlSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotSource for KubectlSource {
    fn name(&self) -> &str {
        &self.program
    }

    async fn list(&self) -> Result<Vec<Object>, WatchError> {
        let output = Command::new(&self.program)
            .args(self.args())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|error| WatchError::Command {
                program: self.program.clone(),
                error,
            })?;

        if !output.status.success() {
            return Err(WatchError::Status {
                program: self.program.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        decode_list(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_args_list_all_namespaces() {
        assert_eq!(
            KubectlSource::new().args(),
            ["get", "ingresses", "-o", "json", "--all-namespaces"]
        );
    }

    #[test]
    fn scoped_args() {
        let src = KubectlSource::new()
            .in_namespace("apps")
            .with_context("lab")
            .with_kubeconfig("/etc/kube/config");
        assert_eq!(
            src.args(),
            [
                "get", "ingresses", "-o", "json", "--namespace", "apps", "--context", "lab",
                "--kubeconfig", "/etc/kube/config"
            ]
        );
    }

    #[tokio::test]
    async fn missing_program_is_command_error() {
        let src = KubectlSource::new().with_program("/definitely/not/kubectl");
        assert!(matches!(src.list().await, Err(WatchError::Command { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_program_is_status_error() {
        let src = KubectlSource::new().with_program("false");
        match src.list().await {
            Err(WatchError::Status { code, .. }) => assert_eq!(code, Some(1)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
