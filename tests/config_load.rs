// Copyright (c) 2026 Pulsechain
// Licensed under the Apache License, Version 2.0

#![forbid(unsafe_code)]

use pulsechain::core::config::{ConfigError, LogFormat, NodeConfig};
use std::collections::HashMap;
use std::fs;
use std::time::Duration;

#[test]
fn loads_toml_file_with_defaults_for_missing_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("node.toml");
    fs::write(
        &path,
        r#"
[node]
name = "node2"
log_format = "json"

[p2p]
listen_addr = "127.0.0.1:4002"
dial = "127.0.0.1:4001"
broadcast_interval_ms = 250
"#,
    )
    .expect("write");

    let cfg = NodeConfig::load(&path).expect("load");
    assert_eq!(cfg.node.name, "node2");
    assert_eq!(cfg.node.log_format, LogFormat::Json);
    assert_eq!(cfg.p2p.dial.as_deref(), Some("127.0.0.1:4001"));
    assert_eq!(cfg.p2p.identity_seed, 0);
    assert_eq!(cfg.http.listen_addr, None);
    cfg.validate().expect("valid");

    let p2p = cfg.p2p();
    assert_eq!(p2p.listen_addr.as_deref(), Some("127.0.0.1:4002"));
    assert_eq!(p2p.session.broadcast_interval, Duration::from_millis(250));
    assert_eq!(p2p.session.max_message_bytes, 4 * 1024 * 1024);
}

#[test]
fn environment_overrides_file_values() {
    let mut cfg = NodeConfig::from_toml_str("[p2p]\nlisten_addr = \"127.0.0.1:1\"\n").unwrap();
    let env: HashMap<&str, &str> = [
        ("PULSE_LISTEN", "127.0.0.1:4010"),
        ("PULSE_DIAL", "127.0.0.1:4011"),
        ("PULSE_SEED", "7"),
        ("PULSE_HTTP", ""),
    ]
    .into_iter()
    .collect();

    cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string())).unwrap();
    assert_eq!(cfg.p2p.listen_addr.as_deref(), Some("127.0.0.1:4010"));
    assert_eq!(cfg.p2p.dial.as_deref(), Some("127.0.0.1:4011"));
    assert_eq!(cfg.p2p.identity_seed, 7);
    assert_eq!(cfg.http.listen_addr, None);
}

#[test]
fn bad_seed_and_unusable_settings_are_rejected() {
    let mut cfg = NodeConfig::default();
    let err = cfg
        .apply_overrides(|k| (k == "PULSE_SEED").then(|| "seven".to_string()))
        .unwrap_err();
    assert!(matches!(err, ConfigError::BadEnv { key: "PULSE_SEED", .. }));

    // Neither listener nor dial target.
    assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

    cfg.p2p.listen_addr = Some("127.0.0.1:0".to_string());
    cfg.p2p.broadcast_interval_ms = 0;
    assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

    assert!(matches!(
        NodeConfig::from_toml_str("[p2p]\nbroadcast_interval_ms = \"soon\"\n"),
        Err(ConfigError::Parse(_))
    ));
}
