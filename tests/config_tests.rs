use ssg_runner::config::{
    GenerationConfig, PortSetting, ReadinessStrategy, WaitSetting, validate_config,
};
use ssg_runner::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_parse_config() -> Result<()> {
    let config_str = r#"{
        "cwd": "/srv/shop",
        "port": 8080,
        "wait": "ipc",
        "dir": {
            "ssr": "build/server",
            "static": "build/server/public",
            "ssg": "build/static"
        },
        "command": "bun",
        "args": ["run"],
        "env": { "NODE_ENV": "production" },
        "readyTimeout": 15000
    }"#;

    let config = GenerationConfig::parse_from_str(config_str)?;

    assert_eq!(config.cwd, PathBuf::from("/srv/shop"));
    assert_eq!(config.port, Some(PortSetting::Fixed(8080)));
    assert_eq!(config.wait, WaitSetting::Named("ipc".to_string()));
    assert_eq!(config.command, "bun");
    assert_eq!(config.args, vec!["run"]);
    assert_eq!(
        config.env.get("NODE_ENV"),
        Some(&"production".to_string())
    );
    assert_eq!(config.ready_timeout(), Some(Duration::from_secs(15)));
    assert_eq!(config.ssr_dir(), PathBuf::from("/srv/shop/build/server"));
    assert_eq!(
        config.static_dir(),
        PathBuf::from("/srv/shop/build/server/public")
    );
    assert_eq!(config.output_dir(), PathBuf::from("/srv/shop/build/static"));

    Ok(())
}

#[test]
fn test_parse_rejects_malformed_json() {
    let result = GenerationConfig::parse_from_str(r#"{ "port": "#);
    assert!(matches!(result, Err(Error::ConfigParse(_))));

    let result = GenerationConfig::from_file("/definitely/not/here/ssg.json");
    assert!(matches!(result, Err(Error::ConfigParse(_))));
}

#[test]
fn test_validate_config() -> Result<()> {
    let config = GenerationConfig::default();
    assert_eq!(validate_config(&config)?, ReadinessStrategy::Stdout);

    let config = GenerationConfig {
        wait: WaitSetting::Named("ipc".to_string()),
        ..Default::default()
    };
    assert_eq!(validate_config(&config)?, ReadinessStrategy::Ipc);

    let config = GenerationConfig {
        wait: WaitSetting::Millis(50.0),
        ..Default::default()
    };
    assert_eq!(
        validate_config(&config)?,
        ReadinessStrategy::FixedDelay(Duration::from_millis(50))
    );

    Ok(())
}

#[test]
fn test_validate_rejects_bad_wait_values() {
    let invalid = [
        WaitSetting::Named("soon".to_string()),
        WaitSetting::Named("STDOUT".to_string()),
        WaitSetting::Millis(0.0),
        WaitSetting::Millis(-25.0),
        WaitSetting::Millis(f64::NAN),
        WaitSetting::Other(serde_json::json!({ "ms": 50 })),
    ];

    for wait in invalid {
        let config = GenerationConfig {
            wait: wait.clone(),
            ..Default::default()
        };
        assert!(
            matches!(validate_config(&config), Err(Error::Configuration(_))),
            "{:?} should be rejected",
            wait
        );
    }
}

#[test]
fn test_validate_rejects_empty_command_and_zero_timeout() {
    let config = GenerationConfig {
        command: "  ".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        validate_config(&config),
        Err(Error::Configuration(_))
    ));

    let config = GenerationConfig {
        ready_timeout: Some(0),
        ..Default::default()
    };
    assert!(matches!(
        validate_config(&config),
        Err(Error::Configuration(_))
    ));
}

#[test]
fn test_port_override_wins_over_explicit_settings() {
    let config = GenerationConfig {
        port: Some(PortSetting::Range(5000, 5010)),
        ..Default::default()
    }
    .with_port_override(Some("4321"));
    assert_eq!(config.port, Some(PortSetting::Fixed(4321)));

    let config = GenerationConfig {
        port: Some(PortSetting::Fixed(3000)),
        ..Default::default()
    }
    .with_port_override(Some(" 9000 "));
    assert_eq!(config.port, Some(PortSetting::Fixed(9000)));

    let config = GenerationConfig::default().with_port_override(Some("70000"));
    assert_eq!(config.port, Some(PortSetting::Fixed(70000)));
}

#[test]
fn test_port_override_ignored_when_absent_or_not_numeric() {
    let config = GenerationConfig {
        port: Some(PortSetting::Range(5000, 5010)),
        ..Default::default()
    };

    let unchanged = config.clone().with_port_override(None);
    assert_eq!(unchanged.port, Some(PortSetting::Range(5000, 5010)));

    let unchanged = config.with_port_override(Some("auto"));
    assert_eq!(unchanged.port, Some(PortSetting::Range(5000, 5010)));
}
