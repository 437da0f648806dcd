//! # Subprocess advertiser.
//!
//! [`CommandAdvertiser`] runs one long-lived child process per host, e.g.
//! `avahi-publish -a -R printer.local 192.168.1.20`. Arguments are a template in
//! which `{host}` and `{address}` are substituted per advertisement.
//!
//! ## Lifecycle
//! ```text
//! spawn(program, args) ──► select {
//!     child exits        → Err(Exited { code })   (the host is no longer advertised)
//!     ctx cancelled      → kill child, reap it → Err(Canceled)
//! }
//! ```
//! The child is spawned with `kill_on_drop`, so an aborted task never leaks it.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::advertiser::{Advertise, Advertisement};
use crate::error::AdvertiseError;

/// Placeholder replaced by the host name.
pub const HOST_PLACEHOLDER: &str = "{host}";
/// Placeholder replaced by the advertised address.
pub const ADDRESS_PLACEHOLDER: &str = "{address}";

/// Advertiser that keeps one child process alive per host.
#[derive(Clone, Debug)]
pub struct CommandAdvertiser {
    program: String,
    args: Vec<String>,
}

impl CommandAdvertiser {
    /// Creates an advertiser running `program` with the templated `args`.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Platform default: `avahi-publish` on Linux and friends.
    #[cfg(not(target_os = "macos"))]
    pub fn platform_default() -> Self {
        Self::new("avahi-publish", ["-a", "-R", HOST_PLACEHOLDER, ADDRESS_PLACEHOLDER])
    }

    /// Platform default: `dns-sd` proxy registration on macOS.
    #[cfg(target_os = "macos")]
    pub fn platform_default() -> Self {
        Self::new(
            "dns-sd",
            [
                "-P",
                HOST_PLACEHOLDER,
                "_http._tcp",
                "local",
                "80",
                HOST_PLACEHOLDER,
                ADDRESS_PLACEHOLDER,
            ],
        )
    }

    /// Program that will be run.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for `ad`, with placeholders substituted.
    pub fn render_args(&self, ad: &Advertisement) -> Vec<String> {
        let address = ad.address.to_string();
        self.args
            .iter()
            .map(|a| {
                a.replace(HOST_PLACEHOLDER, &ad.host)
                    .replace(ADDRESS_PLACEHOLDER, &address)
            })
            .collect()
    }
}

#[async_trait]
impl Advertise for CommandAdvertiser {
    fn name(&self) -> &str {
        &self.program
    }

    async fn advertise(
        &self,
        ad: &Advertisement,
        ctx: CancellationToken,
    ) -> Result<(), AdvertiseError> {
        let mut child = Command::new(&self.program)
            .args(self.render_args(ad))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| AdvertiseError::Spawn {
                program: self.program.clone(),
                error,
            })?;

        tokio::select! {
            status = child.wait() => {
                let code = status.ok().and_then(|s| s.code());
                Err(AdvertiseError::Exited { code })
            }
            _ = ctx.cancelled() => {
                // Already-exited children make kill fail; reaping below covers both.
                let _ = child.start_kill();
                let _ = child.wait().await;
                Err(AdvertiseError::Canceled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    fn ad() -> Advertisement {
        Advertisement::new("web.local", IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)))
    }

    #[test]
    fn renders_placeholders() {
        let adv = CommandAdvertiser::new("tool", ["--name={host}", "{address}", "{host}:{address}"]);
        assert_eq!(
            adv.render_args(&ad()),
            ["--name=web.local", "192.168.1.20", "web.local:192.168.1.20"]
        );
    }

    #[test]
    fn platform_default_mentions_host_and_address() {
        let rendered = CommandAdvertiser::platform_default().render_args(&ad());
        assert!(rendered.iter().any(|a| a == "web.local"));
        assert!(rendered.iter().any(|a| a == "192.168.1.20"));
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let adv = CommandAdvertiser::new("/definitely/not/a/real/program", Vec::<String>::new());
        let err = adv
            .advertise(&ad(), CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "advertise_spawn");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn self_exit_is_reported() {
        let adv = CommandAdvertiser::new("sh", ["-c", "exit 3"]);
        let err = adv
            .advertise(&ad(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AdvertiseError::Exited { code: Some(3) }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cancellation_kills_child() {
        let adv = CommandAdvertiser::new("sleep", ["30"]);
        let token = CancellationToken::new();
        let t = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            t.cancel();
        });

        let res = tokio::time::timeout(Duration::from_secs(5), adv.advertise(&ad(), token))
            .await
            .expect("child was not killed");
        assert!(matches!(res, Err(AdvertiseError::Canceled)));
    }
}
