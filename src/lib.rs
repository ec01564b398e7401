/*!
 # SSG Runner

 A Rust library for generating a static site by snapshotting a server-side
 rendering (SSR) process.

 ## Overview

 SSG Runner performs a single generation run:
 - Empty the output directory and seed it with the static assets
 - Pick a port for the SSR server (explicit, from `PORT`, or a free one)
 - Start the SSR server and wait until it signals readiness
 - Fetch its root document once and save it as `index.html`
 - Terminate the server, whatever happened along the way

 ## Basic Usage

 ```no_run
 use ssg_runner::{Result, StaticGenerator};

 #[tokio::main]
 async fn main() -> Result<()> {
     // Defaults merged with the file, then the PORT override
     let generator = StaticGenerator::from_config_file("ssg.json")?;

     generator.generate().await?;

     Ok(())
 }
 ```

 ## Readiness

 The server decides when it is ready through the `wait` setting:

 - `"stdout"`: the first output it writes
 - `"ipc"`: the first message it sends to the address in `SSG_IPC_ADDR`
 - a number: a fixed delay in milliseconds

 The first two have no timeout unless `readyTimeout` is set. A server that
 never signals keeps the run waiting. The exception is a server that closes
 stdout under `"stdout"` without writing anything: it can no longer signal,
 so the run fails with a process error.

 ## License

 This project is licensed under the terms in the LICENSE file.
*/

pub mod capture;
pub mod config;
pub mod error;
pub mod output;
pub mod port;
pub mod server;

pub use capture::{DocumentFetcher, HttpFetcher};
pub use config::{GenerationConfig, PortSetting, ReadinessStrategy, WaitSetting};
pub use error::{Error, Result};
pub use port::{LocalPortFinder, PortFinder, PortResolver};
pub use server::{LifecycleState, ServerLifecycleController, ServerSpec};

use config::PORT_ENV;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Generate a static site from `config`.
///
/// Shorthand for `StaticGenerator::new(config)?.generate().await`, so the
/// `PORT` environment variable overrides `config.port`.
pub async fn generate(config: GenerationConfig) -> Result<()> {
    StaticGenerator::new(config)?.generate().await
}

/// Runs static site generation
///
/// This struct is the main entry point. It owns the configuration and the two
/// capabilities a run needs from the outside world: fetching a document and
/// finding a free port.
/// All public methods are instrumented with `tracing` spans.
pub struct StaticGenerator {
    /// Configuration
    config: GenerationConfig,
    /// Fetches the rendered document
    fetcher: Arc<dyn DocumentFetcher>,
    /// Searches for free ports
    port_finder: Arc<dyn PortFinder>,
}

impl StaticGenerator {
    /// Create a generator from a configuration file path
    #[tracing::instrument(skip(path), fields(config_path = ?path.as_ref()))]
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        tracing::info!("Loading configuration from file");
        let config = GenerationConfig::from_file(path)?;
        Self::new(config)
    }

    /// Create a generator from a configuration string
    #[tracing::instrument(skip(config))]
    pub fn from_config_str(config: &str) -> Result<Self> {
        tracing::info!("Loading configuration from string");
        let config = GenerationConfig::parse_from_str(config)?;
        Self::new(config)
    }

    /// Create a generator with the HTTP fetcher and local port finder
    ///
    /// The deploy-time `PORT` environment variable is applied on top of
    /// `config`. Use [`with_components`](Self::with_components) to take the
    /// configuration exactly as given.
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let config = config.with_port_override(std::env::var(PORT_ENV).ok().as_deref());
        Ok(Self::with_components(
            config,
            Arc::new(HttpFetcher::new()?),
            Arc::new(LocalPortFinder::default()),
        ))
    }

    /// Create a generator with custom capabilities
    ///
    /// The environment is not consulted; `config` is used as is.
    pub fn with_components(
        config: GenerationConfig,
        fetcher: Arc<dyn DocumentFetcher>,
        port_finder: Arc<dyn PortFinder>,
    ) -> Self {
        Self {
            config,
            fetcher,
            port_finder,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Run one generation.
    ///
    /// Steps run strictly in order: configuration check, SSR directory check,
    /// output preparation, port resolution, then the server lifecycle.
    ///
    /// # Errors
    ///
    /// * [`Error::Configuration`] for an invalid `wait` value, before anything else
    /// * [`Error::Precondition`] if the SSR directory is missing, with the output untouched
    /// * [`Error::OutputPreparation`] if the output directory cannot be materialized
    /// * [`Error::PortResolution`] if no valid port is available
    /// * [`Error::Process`], [`Error::Timeout`] or [`Error::Capture`] from the
    ///   server lifecycle, after the server has been terminated
    ///
    /// This method is instrumented with `tracing`.
    #[tracing::instrument(skip(self), fields(run_id = %Uuid::new_v4()))]
    pub async fn generate(&self) -> Result<()> {
        tracing::info!("Starting static generation");

        let strategy = config::validate_config(&self.config).inspect_err(|e| {
            tracing::error!(error = %e, "Invalid configuration");
        })?;

        let ssr_dir = self.config.ssr_dir();
        if !tokio::fs::try_exists(&ssr_dir).await.unwrap_or(false) {
            tracing::error!(ssr_dir = %ssr_dir.display(), "SSR directory is missing");
            return Err(Error::Precondition(format!(
                "SSR directory {} does not exist",
                ssr_dir.display()
            )));
        }

        let output_dir = self.config.output_dir();
        output::prepare_output(&output_dir, &self.config.static_dir()).await?;

        let port = PortResolver::new(Arc::clone(&self.port_finder))
            .resolve(self.config.port)
            .await?;

        let spec = ServerSpec {
            command: self.config.command.clone(),
            args: self.config.args.clone(),
            entry: ssr_dir,
            cwd: self.config.cwd.clone(),
            env: self.config.env.clone(),
            port,
        };
        let mut controller = ServerLifecycleController::new(
            spec,
            strategy,
            output_dir,
            Arc::clone(&self.fetcher),
        )?
        .with_ready_timeout(self.config.ready_timeout());

        let document = controller.run().await?;
        tracing::info!(document = %document.display(), "Static generation finished");
        Ok(())
    }
}
