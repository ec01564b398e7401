use crate::capture::{self, DocumentFetcher};
use crate::config::ReadinessStrategy;
use crate::error::{Error, Result};
use crate::server::process::{OutputMode, ServerSpec, SsrServer};
use crate::server::readiness::{IpcChannel, ReadinessWatcher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Lifecycle state of a generation run's server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Nothing spawned yet
    Idle,
    /// Server process is running
    Spawned,
    /// Readiness watcher armed
    AwaitingReady,
    /// Fetching and writing the document
    Capturing,
    /// Server killed and reaped
    Terminated,
    /// A step failed
    Failed,
}

/// A recorded state change
#[derive(Debug, Clone)]
pub struct LifecycleTransition {
    /// State entered
    pub state: LifecycleState,
    /// When it was entered
    pub at: Instant,
    /// Details
    pub details: Option<String>,
}

/// Drives one SSR server from spawn to termination and captures its root document.
///
/// The server is terminated on every path out of [`run`](Self::run), whether
/// the capture succeeded or not.
pub struct ServerLifecycleController {
    spec: ServerSpec,
    strategy: ReadinessStrategy,
    output_dir: PathBuf,
    fetcher: Arc<dyn DocumentFetcher>,
    ready_timeout: Option<Duration>,
    state: LifecycleState,
    transitions: Vec<LifecycleTransition>,
}

impl ServerLifecycleController {
    /// Create a controller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for a zero fixed delay.
    pub fn new(
        spec: ServerSpec,
        strategy: ReadinessStrategy,
        output_dir: impl Into<PathBuf>,
        fetcher: Arc<dyn DocumentFetcher>,
    ) -> Result<Self> {
        if strategy == ReadinessStrategy::FixedDelay(Duration::ZERO) {
            return Err(Error::Configuration(
                "wait delay must be greater than zero".to_string(),
            ));
        }

        let mut controller = Self {
            spec,
            strategy,
            output_dir: output_dir.into(),
            fetcher,
            ready_timeout: None,
            state: LifecycleState::Idle,
            transitions: Vec::new(),
        };
        controller.record(LifecycleState::Idle, None);
        Ok(controller)
    }

    /// Bound the readiness wait. Without this the wait under `Stdout` and
    /// `Ipc` is unbounded.
    pub fn with_ready_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// Current state
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Every state entered so far, oldest first
    pub fn transitions(&self) -> &[LifecycleTransition] {
        &self.transitions
    }

    /// Spawn the server, wait for readiness, capture the root document and
    /// terminate the server.
    ///
    /// Returns the path of the written document.
    #[tracing::instrument(skip(self), fields(port = self.spec.port, strategy = ?self.strategy))]
    pub async fn run(&mut self) -> Result<PathBuf> {
        if self.state != LifecycleState::Idle {
            return Err(Error::Process(format!(
                "controller already ran (state {:?})",
                self.state
            )));
        }

        let ipc = match self.strategy {
            ReadinessStrategy::Ipc => match IpcChannel::bind().await {
                Ok(channel) => Some(channel),
                Err(e) => return Err(self.fail(e)),
            },
            _ => None,
        };
        let ipc_addr = match ipc.as_ref().map(IpcChannel::local_addr).transpose() {
            Ok(addr) => addr,
            Err(e) => return Err(self.fail(e)),
        };
        let stdout = match self.strategy {
            ReadinessStrategy::Stdout => OutputMode::Piped,
            _ => OutputMode::Discard,
        };

        let mut server = match SsrServer::spawn(&self.spec, stdout, ipc_addr) {
            Ok(server) => server,
            Err(e) => return Err(self.fail(e)),
        };
        self.record(LifecycleState::Spawned, Some(format!("pid {}", server.id())));

        let outcome = self.await_and_capture(&mut server, ipc).await;
        let outcome = match outcome {
            Ok(path) => Ok(path),
            Err(e) => Err(self.fail(e)),
        };

        match server.terminate().await {
            Ok(status) => self.record(LifecycleState::Terminated, Some(status.to_string())),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to reap SSR server");
                self.record(LifecycleState::Terminated, Some(e.to_string()));
            }
        }

        outcome
    }

    async fn await_and_capture(
        &mut self,
        server: &mut SsrServer,
        ipc: Option<IpcChannel>,
    ) -> Result<PathBuf> {
        let watcher = match (self.strategy, ipc) {
            (ReadinessStrategy::Stdout, _) => ReadinessWatcher::Stdout(server.take_stdout()?),
            (ReadinessStrategy::Ipc, Some(channel)) => ReadinessWatcher::Ipc(channel),
            (ReadinessStrategy::Ipc, None) => {
                return Err(Error::Process("IPC channel was not opened".to_string()));
            }
            (ReadinessStrategy::FixedDelay(delay), _) => ReadinessWatcher::Delay(delay),
        };
        self.record(LifecycleState::AwaitingReady, None);

        let signal = match self.ready_timeout {
            Some(timeout) => tokio::time::timeout(timeout, watcher.wait())
                .await
                .map_err(|_| {
                    Error::Timeout(format!(
                        "server did not signal readiness within {:?}",
                        timeout
                    ))
                })??,
            None => watcher.wait().await?,
        };
        tracing::info!(?signal, "SSR server is ready");
        self.record(LifecycleState::Capturing, Some(format!("{:?}", signal)));

        let url = capture::root_url(server.port());
        let body = self.fetcher.fetch(&url).await?;
        capture::write_document(&self.output_dir, &body).await
    }

    fn fail(&mut self, error: Error) -> Error {
        tracing::error!(error = %error, state = ?self.state, "Generation step failed");
        self.record(LifecycleState::Failed, Some(error.to_string()));
        error
    }

    fn record(&mut self, state: LifecycleState, details: Option<String>) {
        tracing::debug!(from = ?self.state, to = ?state, "Lifecycle transition");
        self.state = state;
        self.transitions.push(LifecycleTransition {
            state,
            at: Instant::now(),
            details,
        });
    }
}
