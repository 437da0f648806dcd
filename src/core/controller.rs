//! # Controller: wires the watch adapter, reconciler and supervisor together.
//!
//! ## Run
//! ```text
//! run(adapter)
//!   ├─ listener: Bus ──► SubscriberSet (until the very end)
//!   ├─ spawn Reconciler::run(rx, token)          ◄── Hooks ◄── spawn adapter.run(hooks, ready, token)
//!   │
//!   ├─ phase 1: wait for readiness within sync_timeout
//!   │     ready          → WatchSynced
//!   │     signal dropped → Err(SyncFailed)          (adapter's error as reason)
//!   │     timeout        → Err(SyncTimeout)
//!   │
//!   ├─ phase 2: wait for the first of
//!   │     OS signal / cancel()    → graceful stop
//!   │     adapter exit            → Err(Watch)
//!   │
//!   └─ shutdown: ShutdownRequested → cancel root token → join reconciler
//!                → Supervisor::shutdown() (grace) → stop listener
//! ```
//!
//! A fatal error still goes through the shutdown path, so no advertiser
//! outlives `run`.

use std::sync::Arc;

use tokio::{
    sync::{Mutex, broadcast::error::RecvError},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use super::{builder::ControllerBuilder, shutdown, supervisor::Supervisor};
use crate::{
    config::Config,
    error::{RuntimeError, WatchError},
    events::{Bus, Event, EventKind},
    reconcile::{HostHandler, Reconciler},
    subscribers::{SubscriberSet, panic_message},
    watch::{Hooks, Readiness, WatchAdapter, readiness},
};

/// Why the controller is stopping.
enum Stop {
    Signal(&'static str),
    Cancelled,
    Fatal(RuntimeError),
}

/// Running reconciliation loop for one watch adapter.
pub struct Controller {
    cfg: Config,
    bus: Bus,
    subs: Mutex<Option<SubscriberSet>>,
    supervisor: Arc<Supervisor>,
    token: CancellationToken,
    handle_signals: bool,
}

impl Controller {
    /// Starts building a controller with `cfg`.
    pub fn builder(cfg: Config) -> ControllerBuilder {
        ControllerBuilder::new(cfg)
    }

    pub(super) fn new_internal(
        cfg: Config,
        bus: Bus,
        subs: SubscriberSet,
        supervisor: Arc<Supervisor>,
        token: CancellationToken,
        handle_signals: bool,
    ) -> Self {
        Self {
            cfg,
            bus,
            subs: Mutex::new(Some(subs)),
            supervisor,
            token,
            handle_signals,
        }
    }

    /// Event bus shared by every component.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// The supervisor owning the advertisers.
    pub fn supervisor(&self) -> &Arc<Supervisor> {
        &self.supervisor
    }

    /// Configuration the controller was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Requests a graceful stop, as if a termination signal arrived.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns true once a stop was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Runs until a termination signal, [`Controller::cancel`], or a fatal error.
    ///
    /// Returns `Ok(())` after a graceful stop in which every advertiser exited
    /// within `grace`.
    pub async fn run<A: WatchAdapter>(&self, adapter: A) -> Result<(), RuntimeError> {
        let listener_stop = CancellationToken::new();
        let listener = self.spawn_listener(listener_stop.clone()).await;

        let (hooks, rx) = Hooks::channel(self.cfg.queue_capacity_clamped());
        let (signal, ready) = readiness();

        let handler: Arc<dyn HostHandler> = self.supervisor.clone();
        let reconciler = Reconciler::new(handler, self.bus.clone())
            .with_annotation(self.cfg.annotation.as_str());
        let reconciler_task = tokio::spawn(reconciler.run(rx, self.token.child_token()));

        let adapter_token = self.token.child_token();
        let mut adapter_task =
            Some(tokio::spawn(async move { adapter.run(hooks, signal, adapter_token).await }));

        let stop = self.wait_for_stop(ready, &mut adapter_task).await;
        let reason = match &stop {
            Stop::Signal(name) => (*name).to_owned(),
            Stop::Cancelled => "cancelled".to_owned(),
            Stop::Fatal(e) => e.to_string(),
        };
        self.bus
            .publish(Event::new(EventKind::ShutdownRequested).with_reason(reason));

        self.token.cancel();
        let _ = reconciler_task.await;
        if let Some(mut task) = adapter_task {
            if tokio::time::timeout(self.cfg.grace, &mut task).await.is_err() {
                task.abort();
            }
        }
        let drained = self.supervisor.shutdown().await;

        listener_stop.cancel();
        if let Some(listener) = listener {
            let _ = listener.await;
        }

        match stop {
            Stop::Fatal(e) => Err(e),
            Stop::Signal(_) | Stop::Cancelled => drained,
        }
    }

    /// Waits through the sync phase and the steady state until something stops the run.
    async fn wait_for_stop(
        &self,
        mut ready: Readiness,
        adapter_task: &mut Option<JoinHandle<Result<(), WatchError>>>,
    ) -> Stop {
        let os_signal = os_signal(self.handle_signals);
        tokio::pin!(os_signal);

        let sync_timeout = self.cfg.sync_timeout;
        let synced = tokio::select! {
            biased;
            _ = self.token.cancelled() => return Stop::Cancelled,
            sig = &mut os_signal => return signal_stop(sig),
            synced = tokio::time::timeout(sync_timeout, ready.wait()) => synced,
        };

        match synced {
            Ok(true) => self.bus.publish(Event::new(EventKind::WatchSynced)),
            Ok(false) => {
                let exit = match adapter_task.take() {
                    Some(task) => tokio::time::timeout(self.cfg.grace, task).await.ok(),
                    None => None,
                };
                let reason = match exit.map(adapter_exit) {
                    Some(RuntimeError::Watch(e)) => e.to_string(),
                    Some(other) => other.to_string(),
                    None => "adapter dropped its ready signal".to_owned(),
                };
                return Stop::Fatal(RuntimeError::SyncFailed { reason });
            }
            Err(_) => {
                return Stop::Fatal(RuntimeError::SyncTimeout {
                    timeout: sync_timeout,
                });
            }
        }

        let Some(task) = adapter_task.as_mut() else {
            return Stop::Fatal(RuntimeError::Watch(WatchError::Stopped));
        };
        let finished = tokio::select! {
            biased;
            _ = self.token.cancelled() => return Stop::Cancelled,
            sig = &mut os_signal => return signal_stop(sig),
            res = task => res,
        };
        *adapter_task = None;

        // Adapters stopped by our own token are not failures.
        if self.token.is_cancelled() {
            Stop::Cancelled
        } else {
            Stop::Fatal(adapter_exit(finished))
        }
    }

    /// Forwards bus events to the subscriber set until `stop` fires, then drains.
    ///
    /// Only the first `run` gets a listener; the subscriber set is consumed.
    async fn spawn_listener(&self, stop: CancellationToken) -> Option<JoinHandle<()>> {
        let set = self.subs.lock().await.take()?;
        let mut rx = self.bus.subscribe();

        Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    ev = rx.recv() => match ev {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => {
                        while let Ok(ev) = rx.try_recv() {
                            set.emit(&ev);
                        }
                        break;
                    }
                }
            }
            set.shutdown().await;
        }))
    }
}

/// Completes on a termination signal; never completes when signals are not handled.
async fn os_signal(enabled: bool) -> Result<&'static str, RuntimeError> {
    if !enabled {
        return std::future::pending().await;
    }
    shutdown::wait_for_shutdown_signal()
        .await
        .map_err(RuntimeError::Signal)
}

fn signal_stop(sig: Result<&'static str, RuntimeError>) -> Stop {
    match sig {
        Ok(name) => Stop::Signal(name),
        Err(e) => Stop::Fatal(e),
    }
}

/// Classifies how an adapter task ended when nobody asked it to.
fn adapter_exit(res: Result<Result<(), WatchError>, tokio::task::JoinError>) -> RuntimeError {
    let err = match res {
        Ok(Ok(())) => WatchError::Stopped,
        Ok(Err(e)) => e,
        Err(join) if join.is_panic() => WatchError::Panicked {
            info: panic_message(join.into_panic().as_ref()),
        },
        Err(_) => WatchError::Stopped,
    };
    RuntimeError::Watch(err)
}
