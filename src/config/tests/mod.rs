//! Unit tests for config module
//!
//! Tests settings defaults, schema metadata and the rendered document.
//! No filesystem dependencies - all in-memory.

#![allow(clippy::panic, clippy::unwrap_used)]

use std::sync::Arc;

use crate::config::{ChatCoreSettings, ConfigPaths, DanmakuStyle, ProxySettings};
use crate::config_store::{
    ConfigEnum, ConverterRegistry, Settings, SettingsSerializer, to_structured,
};

const DEFAULT_DOCUMENT: &str = r#"// ChatCore settings
// Edits are picked up while ChatCore is running.

[Global]
DisableWebApp=false // Set to true to disable the web app entirely.
LaunchWebAppOnStartup=true // Whether to launch the web app in your default browser on startup.
Volume=1
BannedWords="" // Comma separated, matched case-insensitively.

[Web App]
WebApp.Port=8338 // The port the web app will run on.
WebApp.Proxy={"Host":"\"\"","Port":"0","UseTunnel":"false"} // Leave Host empty to connect directly.

[Twitch]
Twitch.OAuthToken=""
Twitch.Channels=""
ParseBTTVEmotes=true
ParseFFZEmotes=true
ParseTwitchEmotes=true
ParseCheermotes=true
ParseEmojis=true

[BiliBili]
BiliBili.RoomId=0 // Numeric id of the live room, 0 to disable.
BiliBili.DanmakuStyle=Scroll
LastLogin=116444736000000000
"#;

#[test]
fn settings_schema_is_fully_convertible() {
    let registry = ConverterRegistry::new();

    assert!(registry.validate(&ChatCoreSettings::schema()).is_ok());
}

#[test]
fn default_document_layout() {
    let serializer = SettingsSerializer::new(Arc::new(ConverterRegistry::new()));

    assert_eq!(serializer.render(&ChatCoreSettings::default()), DEFAULT_DOCUMENT);
}

#[test]
fn default_document_loads_back_unchanged() {
    let mut serializer = SettingsSerializer::new(Arc::new(ConverterRegistry::new()));
    let mut settings = ChatCoreSettings {
        volume: 0.2,
        ..ChatCoreSettings::default()
    };

    let report = serializer.apply(&mut settings, DEFAULT_DOCUMENT);

    assert!(report.rejected.is_empty(), "rejected: {:?}", report.rejected);
    assert!(report.unknown.is_empty(), "unknown: {:?}", report.unknown);
    assert_eq!(settings, ChatCoreSettings::default());
}

#[test]
fn projection_hides_secrets_and_composites() {
    let projected = to_structured(&ChatCoreSettings::default());

    assert!(!projected.contains_key("Twitch.OAuthToken"));
    assert!(!projected.contains_key("LastLogin"));
    assert!(!projected.contains_key("WebApp.Proxy"));
    assert_eq!(projected["WebApp.Port"], 8338);
    assert_eq!(projected["BiliBili.DanmakuStyle"], "Scroll");
}

#[test]
fn danmaku_style_names() {
    assert_eq!(DanmakuStyle::default(), DanmakuStyle::Scroll);
    assert_eq!(DanmakuStyle::from_name("Inline"), Some(DanmakuStyle::Inline));
    assert_eq!(DanmakuStyle::from_name("inline"), None);
    assert_eq!(DanmakuStyle::Hidden.to_string(), "Hidden");
}

#[test]
fn proxy_enabled_only_with_host_and_port() {
    let mut proxy = ProxySettings::default();
    assert!(!proxy.is_enabled());

    proxy.host = "127.0.0.1".to_string();
    assert!(!proxy.is_enabled());

    proxy.port = 3128;
    assert!(proxy.is_enabled());
}

#[test]
fn config_paths() {
    if std::env::var("HOME").is_ok() || std::env::var("XDG_CONFIG_HOME").is_ok() {
        let dir = ConfigPaths::config_dir().unwrap();
        let file = ConfigPaths::settings_file().unwrap();

        assert!(dir.ends_with("chatcore"));
        assert_eq!(file.parent(), Some(dir.as_path()));
        assert!(file.to_string_lossy().ends_with("settings.ini"));
    }
}
