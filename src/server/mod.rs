/// SSR server management module for SSG Runner.
///
/// This module owns the child process for the duration of a generation run:
/// spawning it, detecting readiness, capturing the root document and
/// terminating it. All public components are instrumented with `tracing`.
///
/// # Components
///
/// * `lifecycle` - The state machine driving a run from spawn to termination
/// * `process` - Spawning and killing the server process
/// * `readiness` - One-shot readiness watchers (stdout, IPC, fixed delay)
///
/// # Examples
///
/// Capturing a server that prints once it listens:
///
/// ```no_run
/// use ssg_runner::capture::HttpFetcher;
/// use ssg_runner::config::ReadinessStrategy;
/// use ssg_runner::server::{ServerLifecycleController, ServerSpec};
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> ssg_runner::Result<()> {
/// let spec = ServerSpec {
///     command: "node".to_string(),
///     args: vec![],
///     entry: "dist/ssr".into(),
///     cwd: ".".into(),
///     env: HashMap::new(),
///     port: 3000,
/// };
///
/// let mut controller = ServerLifecycleController::new(
///     spec,
///     ReadinessStrategy::Stdout,
///     "dist/ssg",
///     Arc::new(HttpFetcher::new()?),
/// )?;
/// let document = controller.run().await?;
/// println!("Captured {}", document.display());
/// # Ok(())
/// # }
/// ```
pub mod lifecycle;
mod process;
pub mod readiness;

pub use lifecycle::{LifecycleState, LifecycleTransition, ServerLifecycleController};
pub use process::{IPC_ENV, OutputMode, ServerSpec, SsrServer};
pub use readiness::{IpcChannel, ReadinessWatcher, ReadySignal};
