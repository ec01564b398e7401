//! Port selection for the SSR server.
//!
//! A [`PortResolver`] turns the configured [`PortSetting`] into a single
//! validated port, delegating free-port searches to a [`PortFinder`].

use crate::config::PortSetting;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Lowest port a server may be asked to bind.
pub const MIN_PORT: i64 = 1;
/// Highest valid TCP port.
pub const MAX_PORT: i64 = 65535;

/// Finds a TCP port that nothing is currently listening on.
#[async_trait]
pub trait PortFinder: Send + Sync {
    /// Returns a free port, restricted to the inclusive `range` when given.
    async fn find_free_port(&self, range: Option<(u16, u16)>) -> Result<u16>;
}

/// [`PortFinder`] that probes by briefly binding a listener on a local address.
#[derive(Debug, Clone)]
pub struct LocalPortFinder {
    host: IpAddr,
}

impl LocalPortFinder {
    /// Create a finder probing on `host`
    pub fn new(host: IpAddr) -> Self {
        Self { host }
    }
}

impl Default for LocalPortFinder {
    fn default() -> Self {
        Self::new(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }
}

#[async_trait]
impl PortFinder for LocalPortFinder {
    async fn find_free_port(&self, range: Option<(u16, u16)>) -> Result<u16> {
        let Some((low, high)) = range else {
            let listener = TcpListener::bind((self.host, 0)).await.map_err(|e| {
                Error::PortResolution(format!("no available ports: {}", e))
            })?;
            let port = listener
                .local_addr()
                .map_err(|e| Error::PortResolution(format!("no available ports: {}", e)))?
                .port();
            return Ok(port);
        };

        for port in low..=high {
            match TcpListener::bind((self.host, port)).await {
                Ok(_listener) => return Ok(port),
                Err(e) => tracing::trace!(port, error = %e, "Port is taken"),
            }
        }

        Err(Error::PortResolution(format!(
            "no available ports in range {}-{}",
            low, high
        )))
    }
}

/// Resolves the port the SSR server will listen on.
///
/// # Examples
///
/// ```
/// use ssg_runner::config::PortSetting;
/// use ssg_runner::port::PortResolver;
///
/// # #[tokio::main]
/// # async fn main() -> ssg_runner::Result<()> {
/// let resolver = PortResolver::default();
/// assert_eq!(resolver.resolve(Some(PortSetting::Fixed(8080))).await?, 8080);
/// assert!(resolver.resolve(Some(PortSetting::Fixed(70000))).await.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PortResolver {
    finder: Arc<dyn PortFinder>,
}

impl PortResolver {
    /// Create a resolver backed by `finder`
    pub fn new(finder: Arc<dyn PortFinder>) -> Self {
        Self { finder }
    }

    /// Resolve `setting` into a port.
    ///
    /// A fixed port is used directly, a range is searched for a free port, and
    /// no setting at all searches the whole port space. A range reaching past
    /// 65535 is searched up to 65535. Whatever comes out is
    /// validated to lie in 1-65535.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, setting: Option<PortSetting>) -> Result<u16> {
        let port = match setting {
            Some(PortSetting::Fixed(port)) => port,
            Some(PortSetting::Range(low, high)) => {
                let range = validate_range(low, high)?;
                i64::from(self.finder.find_free_port(Some(range)).await?)
            }
            None => i64::from(self.finder.find_free_port(None).await?),
        };

        let port = validate_port(port)?;
        tracing::info!(port, "Resolved server port");
        Ok(port)
    }
}

impl Default for PortResolver {
    fn default() -> Self {
        Self::new(Arc::new(LocalPortFinder::default()))
    }
}

/// Checks that `port` is a usable TCP port.
pub fn validate_port(port: i64) -> Result<u16> {
    if (MIN_PORT..=MAX_PORT).contains(&port) {
        Ok(port as u16)
    } else {
        Err(Error::PortResolution(format!(
            "invalid port {}: must be between {} and {}",
            port, MIN_PORT, MAX_PORT
        )))
    }
}

/// Checks a range's low end and clamps its high end to [`MAX_PORT`].
fn validate_range(low: i64, high: i64) -> Result<(u16, u16)> {
    let low = validate_port(low)?;
    let clamped = high.min(MAX_PORT);
    if clamped < i64::from(low) {
        return Err(Error::PortResolution(format!(
            "invalid port range {}-{}: low end is above high end",
            low, high
        )));
    }
    if clamped != high {
        tracing::debug!(high, clamped, "Clamped port range to the valid port space");
    }
    Ok((low, validate_port(clamped)?))
}
