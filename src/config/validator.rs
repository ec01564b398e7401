use crate::config::{GenerationConfig, ReadinessStrategy, WaitSetting};
use crate::error::{Error, Result};
use std::time::Duration;

/// Turns a raw `wait` value into a readiness strategy
pub fn readiness_strategy(wait: &WaitSetting) -> Result<ReadinessStrategy> {
    match wait {
        WaitSetting::Named(name) if name == "stdout" => Ok(ReadinessStrategy::Stdout),
        WaitSetting::Named(name) if name == "ipc" => Ok(ReadinessStrategy::Ipc),
        WaitSetting::Millis(ms) if ms.is_finite() && *ms > 0.0 => Ok(
            ReadinessStrategy::FixedDelay(Duration::from_nanos((ms * 1_000_000.0).round() as u64)),
        ),
        WaitSetting::Millis(ms) => Err(Error::Configuration(format!(
            "wait delay must be a positive number of milliseconds, got {}",
            ms
        ))),
        WaitSetting::Named(name) => Err(Error::Configuration(format!(
            "unknown wait strategy '{}', expected 'stdout', 'ipc' or a delay in milliseconds",
            name
        ))),
        WaitSetting::Other(value) => Err(Error::Configuration(format!(
            "wait must be 'stdout', 'ipc' or a delay in milliseconds, got {}",
            value
        ))),
    }
}

/// Full configuration validation
///
/// Returns the readiness strategy the run will use. Port values are checked
/// later by the port resolver.
pub fn validate_config(config: &GenerationConfig) -> Result<ReadinessStrategy> {
    if config.command.trim().is_empty() {
        return Err(Error::Configuration("server command is empty".to_string()));
    }

    if config.ready_timeout == Some(0) {
        return Err(Error::Configuration(
            "readyTimeout must be greater than zero".to_string(),
        ));
    }

    readiness_strategy(&config.wait)
}
