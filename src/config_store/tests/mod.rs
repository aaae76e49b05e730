//! Unit tests for config_store module
//! No filesystem, timing, or external dependencies.

#![allow(clippy::panic, clippy::unwrap_used)]


use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::config_store::{ChangeSource, ConfigChange, ConfigError, LoadReport, SchemaError};

crate::config_enum! {
    pub(super) enum Style {
        Scroll,
        Static,
        Fade,
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(super) struct Proxy {
    pub host: String,
    pub port: u16,
}

crate::impl_settings! {
    Proxy {
        host: String { name: "Host" },
        port: u16 { name: "Port" },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Sample {
    pub volume: f32,
    pub enabled: bool,
    pub banned_words: Vec<String>,
    pub port: u16,
    pub style: Style,
    pub proxy: Proxy,
    pub token: String,
    pub seen_at: DateTime<Utc>,
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            volume: 1.0,
            enabled: true,
            banned_words: Vec::new(),
            port: 8338,
            style: Style::Scroll,
            proxy: Proxy::default(),
            token: String::new(),
            seen_at: DateTime::UNIX_EPOCH,
        }
    }
}

crate::impl_settings! {
    #[header("Sample settings", "", "edit freely")]
    Sample {
        volume: f32 { name: "Volume", section: "Global", comment: "0.0 to 1.0" },
        enabled: bool { name: "Enabled" },
        banned_words: Vec<String> { name: "BannedWords", section: "Global" },
        port: u16 { name: "WebApp_Port", section: "Web App", comment: "listen port" },
        style: Style { name: "Style", section: "Web App" },
        proxy: Proxy { name: "Proxy", section: "Network" },
        token: String { name: "Token", section: "Network", hidden },
        seen_at: DateTime<Utc> { name: "SeenAt", hidden },
    }
}

pub(super) struct Timer {
    pub label: String,
    pub started: Instant,
}

impl Default for Timer {
    fn default() -> Self {
        Self {
            label: String::new(),
            started: Instant::now(),
        }
    }
}

crate::impl_settings! {
    Timer {
        label: String,
        started: Instant,
    }
}

#[derive(Default)]
pub(super) struct WithTimer {
    pub timer: Timer,
}

crate::impl_settings! {
    WithTimer {
        timer: Timer,
    }
}

#[test]
fn config_change_from_load_report() {
    let report = LoadReport {
        applied: vec!["Volume".to_string(), "WebApp.Port".to_string()],
        unknown: vec!["Legacy".to_string()],
        rejected: vec!["Style".to_string()],
    };

    let change = ConfigChange::new(ChangeSource::FileEdit, report);

    assert_eq!(change.source, ChangeSource::FileEdit);
    assert_eq!(change.keys, vec!["Volume", "WebApp.Port"]);
    assert_eq!(change.rejected, vec!["Style"]);
    assert!(change.touches("WebApp.Port"));
    assert!(!change.touches("Legacy"));
    assert!(change.timestamp.elapsed() < Duration::from_secs(1));
}

#[test]
fn path_matching_on_keys() {
    use super::path_ops::path_matches;

    assert!(path_matches("WebApp.Port", "WebApp.Port"));
    assert!(path_matches("WebApp.Port", "WebApp.*"));
    assert!(path_matches("Volume", "*"));
    assert!(!path_matches("WebApp.Port", "Twitch.*"));
    assert!(!path_matches("Volume", "Volume.Level"));
}

#[test]
fn config_error_variants() {
    let schema = ConfigError::from(SchemaError::UnsupportedType {
        type_name: "std::time::Instant",
        field: "timer.started".to_string(),
    });
    assert!(schema.to_string().contains("timer.started"));
    assert!(schema.to_string().contains("std::time::Instant"));

    let io = ConfigError::io("/tmp/settings.ini", "permission denied");
    match io {
        ConfigError::IoError { path, details } => {
            assert_eq!(path.to_str(), Some("/tmp/settings.ini"));
            assert_eq!(details, "permission denied");
        }
        other => panic!("unexpected error: {other}"),
    }

    let persistence = ConfigError::persistence("/tmp/settings.ini.tmp", "disk full");
    assert!(persistence.to_string().contains("disk full"));
}
