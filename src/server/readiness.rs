//! One-shot readiness detection for a freshly spawned server.
//!
//! A [`ReadinessWatcher`] is armed right after spawn and consumed by
//! [`ReadinessWatcher::wait`], so it can fire at most once.

use crate::error::{Error, Result};
use async_process::ChildStdout;
use futures_lite::io::AsyncReadExt;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpListener;

/// What made the watcher fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadySignal {
    /// The server wrote `bytes` bytes to stdout
    Output { bytes: usize },
    /// The server sent a message of `bytes` bytes over the IPC channel
    Message { bytes: usize },
    /// The fixed delay elapsed
    Elapsed(Duration),
}

/// Channel a server uses to announce it is ready.
///
/// A loopback TCP listener. The server connects to the address published in
/// [`IPC_ENV`](crate::server::IPC_ENV) and writes anything; the first
/// non-empty read on any connection counts as the message.
#[derive(Debug)]
pub struct IpcChannel {
    listener: TcpListener,
}

impl IpcChannel {
    /// Bind a channel on an ephemeral loopback port
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .map_err(|e| Error::Process(format!("Failed to open IPC channel: {}", e)))?;
        Ok(Self { listener })
    }

    /// Address the server should connect to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| Error::Process(format!("Failed to read IPC channel address: {}", e)))
    }

    /// Wait for the first message. Returns its size.
    async fn first_message(self) -> Result<usize> {
        let mut buf = [0u8; 1024];
        loop {
            let (mut stream, peer) = self
                .listener
                .accept()
                .await
                .map_err(|e| Error::Process(format!("IPC channel failed: {}", e)))?;

            match tokio::io::AsyncReadExt::read(&mut stream, &mut buf).await {
                Ok(0) => tracing::debug!(%peer, "IPC connection closed without a message"),
                Ok(n) => return Ok(n),
                Err(e) => tracing::debug!(%peer, error = %e, "IPC connection failed"),
            }
        }
    }
}

/// Watches for exactly one readiness event.
pub enum ReadinessWatcher {
    /// First chunk on the server's stdout
    Stdout(ChildStdout),
    /// First message on the IPC channel
    Ipc(IpcChannel),
    /// A timer started when the watcher is awaited
    Delay(Duration),
}

impl ReadinessWatcher {
    /// Wait for the signal.
    ///
    /// Under `Stdout` and `Ipc` this never returns if the server stays silent.
    /// A server that closes stdout before writing anything is reported as a
    /// process error instead.
    pub async fn wait(self) -> Result<ReadySignal> {
        match self {
            ReadinessWatcher::Stdout(mut stdout) => {
                let mut buf = [0u8; 4096];
                let bytes = stdout.read(&mut buf).await.map_err(|e| {
                    Error::Process(format!("Failed to read server stdout: {}", e))
                })?;
                if bytes == 0 {
                    return Err(Error::Process(
                        "Server closed stdout before signalling readiness".to_string(),
                    ));
                }

                // Keep the pipe drained so later writes neither block nor hit a closed pipe
                tokio::spawn(async move {
                    let _ = futures_lite::io::copy(stdout, futures_lite::io::sink()).await;
                });

                Ok(ReadySignal::Output { bytes })
            }
            ReadinessWatcher::Ipc(channel) => {
                let bytes = channel.first_message().await?;
                Ok(ReadySignal::Message { bytes })
            }
            ReadinessWatcher::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(ReadySignal::Elapsed(delay))
            }
        }
    }
}
