//! Configuration module for SSG Runner.
//!
//! This module handles parsing, defaulting and validation of the settings for
//! a generation run. Configurations can be built in code, or loaded from JSON
//! files or strings, with every omitted field falling back to its default.
//!
//! # Examples
//!
//! Loading a configuration from a file:
//!
//! ```no_run
//! use ssg_runner::config::GenerationConfig;
//!
//! let config = GenerationConfig::from_file("ssg.json").unwrap();
//! println!("Writing output to {}", config.output_dir().display());
//! ```
//!
//! Creating a configuration programmatically:
//!
//! ```
//! use ssg_runner::config::{validate_config, GenerationConfig, ReadinessStrategy, WaitSetting};
//! use std::time::Duration;
//!
//! let config = GenerationConfig {
//!     wait: WaitSetting::Millis(50.0),
//!     ..Default::default()
//! };
//!
//! let strategy = validate_config(&config).unwrap();
//! assert_eq!(strategy, ReadinessStrategy::FixedDelay(Duration::from_millis(50)));
//! ```
mod parser;
pub mod validator;

pub use parser::{
    DirConfig, GenerationConfig, PORT_ENV, PortSetting, ReadinessStrategy, WaitSetting,
};
pub use validator::validate_config;
