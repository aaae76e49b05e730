//! Unit tests for CLI module
//!
//! Tests value formatting, key handling and the one-shot commands against a
//! temporary settings directory.

#![allow(clippy::panic, clippy::unwrap_used)]

use serde_json::json;
use tempfile::TempDir;

use crate::{
    ChatCoreError,
    cli::{
        commands::canonical_key, formatting::format_value, get, open_store, path, set, show, watch,
    },
    config::DanmakuStyle,
    config_store::{ChangeSource, ConfigChange, LoadReport},
};

#[test]
fn format_value_scalars() {
    assert_eq!(format_value(&json!("hello world")), "\"hello world\"");
    assert_eq!(format_value(&json!("")), "\"\"");
    assert_eq!(format_value(&json!(8338)), "8338");
    assert_eq!(format_value(&json!(0.5)), "0.5");
    assert_eq!(format_value(&json!(true)), "true");
}

#[test]
fn format_value_lists() {
    assert_eq!(format_value(&json!([])), "[]");
    assert_eq!(format_value(&json!(["spam", "eggs"])), "[spam, eggs]");
}

#[test]
fn keys_accept_dotted_and_field_form() {
    assert_eq!(canonical_key("WebApp.Port"), "WebApp.Port");
    assert_eq!(canonical_key("WebApp_Port"), "WebApp.Port");
    assert_eq!(canonical_key(" Volume "), "Volume");
}

#[test]
fn path_points_at_settings_ini() {
    let dir = TempDir::new().unwrap();

    let output = path::run(dir.path());

    assert_eq!(output, dir.path().join("settings.ini").display().to_string());
    assert!(!dir.path().join("settings.ini").exists());
}

#[test]
fn show_json_lists_visible_settings() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path(), false).unwrap();

    let output = show::run(&store, true).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(parsed["WebApp.Port"], 8338);
    assert!(parsed.get("Twitch.OAuthToken").is_none());
}

#[test]
fn get_reads_one_setting() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path(), false).unwrap();

    assert_eq!(get::run(&store, "WebApp_Port").unwrap(), "8338");
    assert!(matches!(
        get::run(&store, "Twitch.OAuthToken"),
        Err(ChatCoreError::UnknownKey { .. })
    ));
}

#[test]
fn set_updates_and_saves() {
    let dir = TempDir::new().unwrap();

    {
        let store = open_store(dir.path(), false).unwrap();
        set::run(&store, "BiliBili.DanmakuStyle", "Inline").unwrap();
        set::run(&store, "BannedWords", r#"["Spam", "EGGS"]"#).unwrap();
        set::run(&store, "Volume", "0.5").unwrap();
    }

    let store = open_store(dir.path(), false).unwrap();
    let settings = store.get_current();
    assert_eq!(settings.danmaku_style, DanmakuStyle::Inline);
    assert_eq!(settings.banned_words, vec!["spam", "eggs"]);
    assert_eq!(settings.volume, 0.5);

    let text = std::fs::read_to_string(store.path()).unwrap();
    assert!(text.contains("\nBiliBili.DanmakuStyle=Inline\n"));
    assert!(text.contains("\nVolume=0.5\n"));
}

#[test]
fn set_rejects_bad_input() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path(), false).unwrap();

    assert!(matches!(
        set::run(&store, "NoSuchKey", "1"),
        Err(ChatCoreError::UnknownKey { .. })
    ));
    assert!(matches!(
        set::run(&store, "WebApp.Port", "eighty"),
        Err(ChatCoreError::InvalidValue { .. })
    ));
    assert!(matches!(
        set::run(&store, "BiliBili.DanmakuStyle", "Sideways"),
        Err(ChatCoreError::InvalidValue { .. })
    ));
    assert_eq!(store.get_current().web_app_port, 8338);
}

#[test]
fn watch_output_hides_secret_values() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path(), false).unwrap();
    let change = ConfigChange::new(
        ChangeSource::FileEdit,
        LoadReport {
            applied: vec!["WebApp.Port".to_string(), "Twitch.OAuthToken".to_string()],
            ..LoadReport::default()
        },
    );

    let encoded = watch::to_json(&store, &change);
    assert_eq!(encoded["source"], "file_edit");
    assert_eq!(encoded["values"], json!({ "WebApp.Port": 8338 }));
    assert_eq!(encoded["keys"], json!(["WebApp.Port", "Twitch.OAuthToken"]));

    let text = watch::describe(&store, &change);
    assert!(text.contains("8338"));
    assert!(text.contains("(hidden)"));
    assert!(!text.contains("oauth"));
}
