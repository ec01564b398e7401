/// Error handling module for SSG Runner.
///
/// This module defines the error types used throughout the library.
/// Every variant names the phase of a generation run that failed, so a
/// caller can tell a bad configuration apart from a server that would not
/// render.
///
/// # Example
///
/// ```
/// use ssg_runner::error::{Error, Result};
///
/// fn handle_error(result: Result<()>) {
///     match result {
///         Ok(_) => println!("Site generated"),
///         Err(Error::Precondition(msg)) => println!("Nothing to run: {}", msg),
///         Err(Error::PortResolution(msg)) => println!("No port: {}", msg),
///         Err(Error::Capture(msg)) => println!("Capture failed: {}", msg),
///         Err(e) => println!("Other error: {}", e),
///     }
/// }
/// ```
use thiserror::Error;

/// Errors that can occur while generating a static site.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to parse configuration from a file or string.
    ///
    /// This error occurs when:
    /// - The configuration file cannot be read
    /// - The configuration JSON is malformed
    /// - Field types are incorrect
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration parsed but holds a value the generator cannot use.
    ///
    /// This error occurs when:
    /// - `wait` is neither `"stdout"`, `"ipc"` nor a number
    /// - A fixed readiness delay is zero or negative
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A required input is missing before anything was started.
    ///
    /// This error occurs when the SSR directory does not exist. No output
    /// has been touched and no process has been spawned.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// The output directory could not be emptied or seeded with static assets.
    #[error("Failed to prepare output directory: {0}")]
    OutputPreparation(String),

    /// No usable port could be determined.
    ///
    /// This error occurs when:
    /// - Every port of the requested range is occupied
    /// - An explicit or overriding port lies outside 1-65535
    /// - A port range is malformed
    #[error("Port resolution failed: {0}")]
    PortResolution(String),

    /// Error when starting or watching the SSR server process.
    ///
    /// This error occurs when:
    /// - The process fails to spawn
    /// - The process closes its output before signalling readiness
    #[error("Server process error: {0}")]
    Process(String),

    /// The rendered document could not be fetched or written.
    ///
    /// The server process has already been terminated when this is returned.
    #[error("Capture failed: {0}")]
    Capture(String),

    /// The optional readiness timeout elapsed.
    #[error("Timeout: {0}")]
    Timeout(String),
}

/// Result type for ssg-runner operations.
pub type Result<T> = std::result::Result<T, Error>;
