//! # mdnsvisor - ingress host advertiser
//!
//! Watches ingresses annotated with `mdnscontroller/enabled: "true"` and keeps
//! one mDNS advertisement running per declared host.
//!
//! ```text
//! kubectl get ingresses ──poll──► Reconciler ──► Supervisor ──► avahi-publish / dns-sd (per host)
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use mdnsvisor::{
    AdvertiserRef, CommandAdvertiser, Config, Controller, ENABLED_ANNOTATION, FileSource,
    KubectlSource, LogAdvertiser, LogWriter, PollConfig, PollingWatch, Subscribe, local_ipv4,
};

/// Where declarations are read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Source {
    /// `kubectl get ingresses -o json`
    Kubectl,
    /// A JSON file holding a List or an array of ingresses
    File,
}

/// How hosts are advertised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// One child process per host (avahi-publish on Linux, dns-sd on macOS)
    Command,
    /// Only log what would be advertised
    Log,
}

/// Advertise annotated ingress hosts over mDNS
#[derive(Parser, Debug)]
#[command(name = "mdnsvisor")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// IP address to advertise (auto-detected if not specified)
    #[arg(long, env = "MDNSVISOR_ADDRESS")]
    address: Option<IpAddr>,

    /// Annotation that must be "true" for an ingress to be advertised
    #[arg(long, default_value = ENABLED_ANNOTATION, env = "MDNSVISOR_ANNOTATION")]
    annotation: String,

    /// Declaration source
    #[arg(long, value_enum, default_value_t = Source::Kubectl, env = "MDNSVISOR_SOURCE")]
    source: Source,

    /// Declaration file (with --source file)
    #[arg(long, required_if_eq("source", "file"), env = "MDNSVISOR_FILE")]
    file: Option<PathBuf>,

    /// kubectl binary
    #[arg(long, default_value = "kubectl", env = "MDNSVISOR_KUBECTL")]
    kubectl: String,

    /// Namespace to watch (all namespaces if not specified)
    #[arg(short, long, env = "MDNSVISOR_NAMESPACE")]
    namespace: Option<String>,

    /// kubeconfig context
    #[arg(long, env = "MDNSVISOR_CONTEXT")]
    context: Option<String>,

    /// kubeconfig file
    #[arg(long, env = "KUBECONFIG")]
    kubeconfig: Option<String>,

    /// Advertisement backend
    #[arg(long, value_enum, default_value_t = Backend::Command, env = "MDNSVISOR_BACKEND")]
    backend: Backend,

    /// Program run per host instead of the platform default
    #[arg(long, env = "MDNSVISOR_ADVERTISE_CMD")]
    advertise_cmd: Option<String>,

    /// Argument for --advertise-cmd; `{host}` and `{address}` are substituted (repeatable)
    #[arg(long = "advertise-arg", requires = "advertise_cmd", allow_hyphen_values = true)]
    advertise_args: Vec<String>,

    /// Seconds between listings
    #[arg(long, default_value_t = 10, env = "MDNSVISOR_INTERVAL")]
    interval: u64,

    /// Seconds to wait for advertisers to stop on shutdown
    #[arg(long, default_value_t = 10, env = "MDNSVISOR_GRACE")]
    grace: u64,

    /// Seconds to wait for the initial listing
    #[arg(long, default_value_t = 60, env = "MDNSVISOR_SYNC_TIMEOUT")]
    sync_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MDNSVISOR_LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.json_logs)?;

    info!(version = env!("CARGO_PKG_VERSION"), "starting mdnsvisor");

    let address = match args.address {
        Some(address) => address,
        None => detect_address().await,
    };
    info!(%address, "advertising hosts with address");

    let cfg = Config {
        address,
        annotation: args.annotation.clone(),
        grace: Duration::from_secs(args.grace),
        sync_timeout: Duration::from_secs(args.sync_timeout),
        ..Config::default()
    };

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let controller = Controller::builder(cfg)
        .with_advertiser(advertiser(&args))
        .with_subscribers(subs)
        .build();

    let poll = PollConfig {
        interval: Duration::from_secs(args.interval.max(1)),
        ..PollConfig::default()
    };
    let bus = controller.bus().clone();

    let result = match args.source {
        Source::Kubectl => {
            let mut source = KubectlSource::new().with_program(args.kubectl.as_str());
            if let Some(ns) = &args.namespace {
                source = source.in_namespace(ns.as_str());
            }
            if let Some(ctx) = &args.context {
                source = source.with_context(ctx.as_str());
            }
            if let Some(path) = &args.kubeconfig {
                source = source.with_kubeconfig(path.as_str());
            }
            let namespace = args.namespace.as_deref().unwrap_or("<all>");
            info!(namespace, "watching ingresses via kubectl");
            controller
                .run(PollingWatch::new(source, bus).with_config(poll))
                .await
        }
        Source::File => {
            let path = args.file.clone().context("--file is required with --source file")?;
            info!(path = %path.display(), "watching declaration file");
            controller
                .run(PollingWatch::new(FileSource::new(path), bus).with_config(poll))
                .await
        }
    };
    result.context("controller failed")?;

    info!("mdnsvisor stopped");
    Ok(())
}

/// Picks the advertisement backend from the command line.
fn advertiser(args: &Args) -> AdvertiserRef {
    match (args.backend, &args.advertise_cmd) {
        (Backend::Log, _) => Arc::new(LogAdvertiser),
        (Backend::Command, Some(program)) => Arc::new(CommandAdvertiser::new(
            program.as_str(),
            args.advertise_args.iter().cloned(),
        )),
        (Backend::Command, None) => Arc::new(CommandAdvertiser::platform_default()),
    }
}

/// Detects the local IPv4 address, falling back to loopback.
async fn detect_address() -> IpAddr {
    match local_ipv4().await {
        Ok(ip) => IpAddr::V4(ip),
        Err(e) => {
            warn!(error = %e, "no IPv4 address found, falling back to 127.0.0.1");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level {level:?}"))?;

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
            .context("failed to install logger")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init()
            .context("failed to install logger")?;
    }

    Ok(())
}
