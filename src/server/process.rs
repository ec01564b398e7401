// src/server/process.rs
use crate::config::PORT_ENV;
use crate::error::{Error, Result};
use async_process::{Child, ChildStdout, Command, Stdio};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Environment variable holding the IPC channel address under the `ipc` strategy
pub const IPC_ENV: &str = "SSG_IPC_ADDR";

/// Everything needed to launch the SSR server.
#[derive(Debug, Clone)]
pub struct ServerSpec {
    /// Program to run
    pub command: String,
    /// Arguments placed before `entry`
    pub args: Vec<String>,
    /// SSR entry point, passed as the last argument
    pub entry: PathBuf,
    /// Working directory of the server
    pub cwd: PathBuf,
    /// Extra environment variables, merged into the inherited environment
    pub env: HashMap<String, String>,
    /// Port the server must listen on
    pub port: u16,
}

/// What happens to the server's standard output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Piped back to us, to be watched for readiness
    Piped,
    /// Sent to the null device
    Discard,
}

/// A running SSR server process.
///
/// The process is killed when [`terminate`](Self::terminate) is called, and
/// also if the handle is dropped first.
pub struct SsrServer {
    /// Child process
    child: Child,
    /// Port handed to the server
    port: u16,
}

impl SsrServer {
    /// Spawn the server described by `spec`.
    ///
    /// Stdin and stderr are discarded. When `ipc_addr` is set the server finds
    /// it in [`IPC_ENV`].
    #[tracing::instrument(skip(spec), fields(command = %spec.command, port = spec.port))]
    pub fn spawn(
        spec: &ServerSpec,
        stdout: OutputMode,
        ipc_addr: Option<SocketAddr>,
    ) -> Result<Self> {
        let mut command = Command::new(&spec.command);
        command.args(&spec.args).arg(&spec.entry).current_dir(&spec.cwd);

        // Set environment variables
        for (key, value) in &spec.env {
            command.env(key, value);
        }
        command.env(PORT_ENV, spec.port.to_string());
        if let Some(addr) = ipc_addr {
            command.env(IPC_ENV, addr.to_string());
        }

        // Configure stdio
        let stdout = match stdout {
            OutputMode::Piped => Stdio::piped(),
            OutputMode::Discard => Stdio::null(),
        };
        command
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::null())
            .kill_on_drop(true);

        // Start the process
        let child = command.spawn().map_err(|e| {
            Error::Process(format!(
                "Failed to start '{}' for {}: {}",
                spec.command,
                spec.entry.display(),
                e
            ))
        })?;

        tracing::info!(pid = child.id(), "SSR server spawned");
        Ok(Self {
            child,
            port: spec.port,
        })
    }

    /// OS process id
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Port the server was told to listen on
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Take the stdout pipe from the process
    pub fn take_stdout(&mut self) -> Result<ChildStdout> {
        self.child.stdout.take().ok_or_else(|| {
            Error::Process("Failed to get stdout pipe from child process".to_string())
        })
    }

    /// Kill the process and wait for it to exit.
    ///
    /// Consumes the handle, so a server is terminated at most once.
    pub async fn terminate(mut self) -> Result<ExitStatus> {
        let pid = self.child.id();
        if let Err(e) = self.child.kill() {
            // Already exited on its own; reaping below still applies
            tracing::debug!(pid, error = %e, "Kill request failed");
        }

        let status = self
            .child
            .status()
            .await
            .map_err(|e| Error::Process(format!("Failed to wait for process exit: {}", e)))?;

        tracing::info!(pid, %status, "SSR server terminated");
        Ok(status)
    }
}
