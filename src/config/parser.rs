use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that carries the port.
///
/// The generator reads it once as the deploy-time override and sets it on the
/// spawned server so it knows where to listen.
pub const PORT_ENV: &str = "PORT";

/// Desired port for the SSR server.
///
/// Values are kept signed so that out-of-range input survives parsing and is
/// reported by the port resolver rather than by serde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortSetting {
    /// A single port, used as is.
    Fixed(i64),
    /// Search for a free port within `low..=high`.
    Range(i64, i64),
}

/// Raw `wait` value as it appears in configuration.
///
/// Turned into a [`ReadinessStrategy`] by
/// [`validate_config`](crate::config::validate_config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WaitSetting {
    /// Fixed delay in milliseconds.
    Millis(f64),
    /// `"stdout"` or `"ipc"`.
    Named(String),
    /// Anything else. Always rejected by validation.
    Other(serde_json::Value),
}

impl Default for WaitSetting {
    fn default() -> Self {
        WaitSetting::Named("stdout".to_string())
    }
}

/// Rule that decides when the spawned server is ready to be captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessStrategy {
    /// The first chunk the server writes to stdout.
    ///
    /// A silent server that keeps running is waited on indefinitely. One that
    /// closes stdout before writing anything can no longer signal, so the run
    /// fails with [`Error::Process`](crate::error::Error::Process) instead of
    /// hanging.
    Stdout,
    /// The first message the server sends over the IPC channel.
    Ipc,
    /// A fixed delay after spawn. Stdout is never inspected.
    FixedDelay(Duration),
}

/// Directory layout of a generation run.
///
/// Relative paths are resolved against [`GenerationConfig::cwd`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirConfig {
    /// Directory holding the SSR server entry point.
    pub ssr: PathBuf,
    /// Static assets copied verbatim into the output.
    #[serde(rename = "static")]
    pub static_assets: PathBuf,
    /// Output directory. Emptied at the start of every run.
    pub ssg: PathBuf,
}

impl Default for DirConfig {
    fn default() -> Self {
        Self {
            ssr: PathBuf::from("dist/ssr"),
            static_assets: PathBuf::from("dist/ssr/www"),
            ssg: PathBuf::from("dist/ssg"),
        }
    }
}

/// Configuration of a single generation run.
///
/// Every field has a default, so a configuration file only needs to name what
/// it changes.
///
/// # JSON Schema
///
/// ```json
/// {
///   "cwd": "/path/to/app",
///   "port": [5000, 5010],
///   "wait": "stdout",
///   "dir": {
///     "ssr": "dist/ssr",
///     "static": "dist/ssr/www",
///     "ssg": "dist/ssg"
///   },
///   "command": "node",
///   "args": [],
///   "env": { "NODE_ENV": "production" },
///   "readyTimeout": 30000
/// }
/// ```
///
/// # Examples
///
/// ```
/// use ssg_runner::config::{GenerationConfig, PortSetting, WaitSetting};
///
/// let config = GenerationConfig::parse_from_str(r#"{ "port": 3000, "wait": 250 }"#).unwrap();
/// assert_eq!(config.port, Some(PortSetting::Fixed(3000)));
/// assert_eq!(config.wait, WaitSetting::Millis(250.0));
/// assert_eq!(config.command, "node");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationConfig {
    /// Working directory of the spawned server.
    pub cwd: PathBuf,

    /// Desired port. `None` picks any free port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<PortSetting>,

    /// Readiness rule.
    pub wait: WaitSetting,

    /// Directory layout.
    pub dir: DirConfig,

    /// Program that runs the SSR entry point.
    pub command: String,

    /// Arguments placed before the SSR directory on the command line.
    pub args: Vec<String>,

    /// Extra environment variables for the server, on top of the inherited ones.
    pub env: HashMap<String, String>,

    /// Upper bound on the readiness wait, in milliseconds. Unbounded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_timeout: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            port: None,
            wait: WaitSetting::default(),
            dir: DirConfig::default(),
            command: "node".to_string(),
            args: Vec::new(),
            env: HashMap::new(),
            ready_timeout: None,
        }
    }
}

impl GenerationConfig {
    /// Loads a configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The file cannot be read
    /// * The file contents are not valid JSON
    /// * The JSON does not conform to the expected schema
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigParse(format!("Failed to read config file: {}", e)))?;

        Self::parse_from_str(&content)
    }

    /// Parses a configuration from a JSON string, filling in defaults.
    pub fn parse_from_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::ConfigParse(format!("Failed to parse JSON config: {}", e)))
    }

    /// Applies the deploy-time port override.
    ///
    /// A numeric override replaces whatever `port` holds, including an
    /// explicit port or range. A missing or non-numeric value leaves the
    /// configuration untouched.
    pub fn with_port_override(mut self, value: Option<&str>) -> Self {
        let Some(raw) = value else {
            return self;
        };

        match raw.trim().parse::<i64>() {
            Ok(port) => {
                tracing::debug!(port, previous = ?self.port, "Applying port override");
                self.port = Some(PortSetting::Fixed(port));
            }
            Err(_) => {
                tracing::warn!(value = %raw, "Ignoring non-numeric port override");
            }
        }
        self
    }

    /// Readiness timeout as a duration, if one is configured.
    pub fn ready_timeout(&self) -> Option<Duration> {
        self.ready_timeout.map(Duration::from_millis)
    }

    /// Absolute path of the SSR directory.
    pub fn ssr_dir(&self) -> PathBuf {
        self.resolve(&self.dir.ssr)
    }

    /// Absolute path of the static asset directory.
    pub fn static_dir(&self) -> PathBuf {
        self.resolve(&self.dir.static_assets)
    }

    /// Absolute path of the output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.dir.ssg)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = GenerationConfig::parse_from_str("{}").unwrap();

        assert_eq!(config.port, None);
        assert_eq!(config.wait, WaitSetting::Named("stdout".to_string()));
        assert_eq!(config.dir.ssr, PathBuf::from("dist/ssr"));
        assert_eq!(config.dir.static_assets, PathBuf::from("dist/ssr/www"));
        assert_eq!(config.dir.ssg, PathBuf::from("dist/ssg"));
        assert_eq!(config.command, "node");
        assert!(config.args.is_empty());
        assert_eq!(config.ready_timeout, None);
    }

    #[test]
    fn test_parse_port_range_and_nested_dirs() {
        let config = GenerationConfig::parse_from_str(
            r#"{
                "cwd": "/srv/app",
                "port": [5000, 5010],
                "wait": "ipc",
                "dir": { "static": "public" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.port, Some(PortSetting::Range(5000, 5010)));
        assert_eq!(config.wait, WaitSetting::Named("ipc".to_string()));
        assert_eq!(config.static_dir(), PathBuf::from("/srv/app/public"));
        assert_eq!(config.ssr_dir(), PathBuf::from("/srv/app/dist/ssr"));
        assert_eq!(config.output_dir(), PathBuf::from("/srv/app/dist/ssg"));
    }

    #[test]
    fn test_unrecognized_wait_still_parses() {
        let config = GenerationConfig::parse_from_str(r#"{ "wait": true }"#).unwrap();
        assert_eq!(config.wait, WaitSetting::Other(serde_json::Value::Bool(true)));
    }

    #[test]
    fn test_absolute_dirs_ignore_cwd() {
        let mut config = GenerationConfig::default();
        config.cwd = PathBuf::from("/srv/app");
        config.dir.ssg = PathBuf::from("/tmp/out");

        assert_eq!(config.output_dir(), PathBuf::from("/tmp/out"));
    }
}
