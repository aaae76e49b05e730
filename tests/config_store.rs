//! Integration tests for the config store functionality.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

use std::{
    fs,
    path::Path,
    sync::mpsc,
    thread,
    time::{Duration, Instant},
};

use chatcore::{
    config::{ChatCoreSettings, DanmakuStyle, ProxySettings, SETTINGS_NAME},
    config_store::{ConfigError, ConfigStore, SchemaError, StoreOptions},
};
use tempfile::TempDir;

fn settings_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join(format!("{SETTINGS_NAME}.ini"))
}

fn write_settings(dir: &TempDir, content: &str) {
    fs::write(settings_path(dir), content).unwrap();
}

fn read_settings(dir: &TempDir) -> String {
    fs::read_to_string(settings_path(dir)).unwrap()
}

fn unwatched() -> StoreOptions {
    StoreOptions {
        watch: false,
        ..StoreOptions::default()
    }
}

fn open(dir: &Path) -> ConfigStore<ChatCoreSettings> {
    ConfigStore::with_options(ChatCoreSettings::default(), dir, SETTINGS_NAME, unwatched()).unwrap()
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(25));
    }
    condition()
}

mod basic_operations {
    use super::*;

    #[test]
    fn creates_file_with_defaults_on_first_open() {
        let temp = TempDir::new().unwrap();

        let store = open(temp.path());

        assert_eq!(store.get_current(), ChatCoreSettings::default());
        let text = read_settings(&temp);
        assert!(text.starts_with("// ChatCore settings\n"));
        assert!(text.contains("\n[Global]\n"));
        assert!(text.contains("\nWebApp.Port=8338 // The port the web app will run on.\n"));
    }

    #[test]
    fn creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b/chatcore");

        let store = open(&nested);

        assert!(store.path().exists());
        assert_eq!(store.path(), nested.join("settings.ini"));
    }

    #[test]
    fn save_then_load_round_trips_and_is_stable() {
        let temp = TempDir::new().unwrap();

        let first = {
            let store = open(temp.path());
            store.update(|s| {
                s.volume = 0.25;
                s.banned_words = vec!["spam".to_string(), "eggs".to_string()];
                s.twitch_oauth_token = "oauth:abc123".to_string();
                s.twitch_channels = vec!["somechannel".to_string()];
                s.danmaku_style = DanmakuStyle::Hidden;
                s.proxy = ProxySettings {
                    host: "proxy.local".to_string(),
                    port: 3128,
                    use_tunnel: true,
                };
            });
            store.save().unwrap();
            (store.get_current(), read_settings(&temp))
        };

        let store = open(temp.path());

        assert_eq!(store.get_current(), first.0);
        assert_eq!(read_settings(&temp), first.1);
    }

    #[test]
    fn volume_without_entry_loads_default_and_saves_as_integer_text() {
        let temp = TempDir::new().unwrap();
        write_settings(&temp, "[Global]\nDisableWebApp=true\n");

        let store = open(temp.path());

        assert_eq!(store.read().volume, 1.0);
        assert!(store.read().disable_web_app);
        assert!(read_settings(&temp).contains("\nVolume=1\n"));
    }

    #[test]
    fn banned_words_are_normalized() {
        let temp = TempDir::new().unwrap();
        write_settings(&temp, "BannedWords=\"Foo, BAR,,baz\"\n");

        let store = open(temp.path());

        assert_eq!(store.read().banned_words, vec!["foo", "bar", "baz"]);
        assert!(read_settings(&temp).contains(
            "\nBannedWords=\"foo,bar,baz\" // Comma separated, matched case-insensitively.\n"
        ));
    }

    #[test]
    fn sections_are_written_once_in_order() {
        let temp = TempDir::new().unwrap();
        let _store = open(temp.path());

        let text = read_settings(&temp);
        let sections: Vec<&str> = text.lines().filter(|line| line.starts_with('[')).collect();

        assert_eq!(sections, vec!["[Global]", "[Web App]", "[Twitch]", "[BiliBili]"]);
        assert!(text.contains("\n\n[Twitch]\n"));
    }

    #[test]
    fn structured_updates_are_saved() {
        let temp = TempDir::new().unwrap();
        let store = open(temp.path());

        let report = store
            .apply_from_structured(&serde_json::json!({
                "WebApp.Port": 9000,
                "BiliBili.DanmakuStyle": "Inline",
            }))
            .unwrap();

        assert_eq!(report.applied.len(), 2);
        assert_eq!(store.read().web_app_port, 9000);
        let text = read_settings(&temp);
        assert!(text.contains("\nWebApp.Port=9000 "));
        assert!(text.contains("\nBiliBili.DanmakuStyle=Inline\n"));
    }

    #[test]
    fn rejected_structured_update_changes_nothing() {
        let temp = TempDir::new().unwrap();
        let store = open(temp.path());
        let before = read_settings(&temp);

        let err = store
            .apply_from_structured(&serde_json::json!({ "Volume": [1, 2] }))
            .unwrap_err();

        assert!(matches!(err, ConfigError::Projection(_)));
        assert_eq!(store.read().volume, 1.0);
        assert_eq!(read_settings(&temp), before);
    }
}

mod compatibility {
    use super::*;

    #[test]
    fn user_comments_survive_rewrites() {
        let temp = TempDir::new().unwrap();
        write_settings(&temp, "[Web App]\nWebApp.Port=8080 //mycomment\nVolume=0.5 # quieter\n");

        let store = open(temp.path());
        store.save().unwrap();

        let text = read_settings(&temp);
        assert!(text.contains("\nWebApp.Port=8080 //mycomment\n"));
        assert!(text.contains("\nVolume=0.5 // quieter\n"));
        assert!(!text.contains("The port the web app will run on."));
    }

    #[test]
    fn missing_keys_are_added_with_defaults() {
        let temp = TempDir::new().unwrap();
        write_settings(&temp, "[Global]\nVolume=0.8\n");

        let store = open(temp.path());

        assert_eq!(store.read().web_app_port, 8338);
        let text = read_settings(&temp);
        assert!(text.contains("\nVolume=0.8\n"));
        assert!(text.contains("\nWebApp.Port=8338 // The port the web app will run on.\n"));
        assert!(text.contains("\nParseEmojis=true\n"));
    }

    #[test]
    fn unknown_keys_are_dropped() {
        let temp = TempDir::new().unwrap();
        write_settings(&temp, "Obsolete=1\nVolume=0.4\n");

        let store = open(temp.path());

        assert_eq!(store.read().volume, 0.4);
        assert!(!read_settings(&temp).contains("Obsolete"));

        write_settings(&temp, "Obsolete=2\n");
        let report = store.reload().unwrap();
        assert_eq!(report.unknown, vec!["Obsolete"]);
        assert!(report.applied.is_empty());
    }

    #[test]
    fn unparsable_values_keep_defaults() {
        let temp = TempDir::new().unwrap();
        write_settings(
            &temp,
            "WebApp.Port=not-a-port\nBiliBili.DanmakuStyle=Sideways\nBiliBili.RoomId=42\n",
        );

        let store = open(temp.path());

        assert_eq!(store.read().web_app_port, 8338);
        assert_eq!(store.read().danmaku_style, DanmakuStyle::Scroll);
        assert_eq!(store.read().bilibili_room_id, 42);
    }
}

mod crash_safety {
    use super::*;

    #[test]
    fn promotes_backup_when_primary_is_missing() {
        let temp = TempDir::new().unwrap();
        let backup = temp.path().join("settings.ini.bak");
        fs::write(&backup, "Volume=0.3\n").unwrap();

        let store = open(temp.path());

        assert_eq!(store.read().volume, 0.3);
        assert!(settings_path(&temp).exists());
        assert!(read_settings(&temp).contains("\nVolume=0.3\n"));
    }

    #[test]
    fn save_keeps_previous_file_as_backup() {
        let temp = TempDir::new().unwrap();
        let store = open(temp.path());
        let before = read_settings(&temp);

        store.update(|s| s.bilibili_room_id = 7);
        store.save().unwrap();

        let backup = fs::read_to_string(store.file().backup()).unwrap();
        assert_eq!(backup, before);
        assert!(!store.file().temp().exists());
        assert!(read_settings(&temp).contains("\nBiliBili.RoomId=7 "));
    }

    #[test]
    fn failed_save_is_reported_and_retried_once() {
        let temp = TempDir::new().unwrap();
        let blocked = temp.path().join("blocked");
        fs::write(&blocked, "not a directory").unwrap();

        let options = StoreOptions {
            watch: false,
            retry_delay: Duration::from_millis(300),
            ..StoreOptions::default()
        };
        let store =
            ConfigStore::with_options(ChatCoreSettings::default(), &blocked, SETTINGS_NAME, options)
                .unwrap();

        fs::remove_file(&blocked).unwrap();

        assert!(wait_until(Duration::from_secs(5), || store.path().exists()));
    }

    #[test]
    fn failed_retry_is_abandoned() {
        let temp = TempDir::new().unwrap();
        let blocked = temp.path().join("blocked");
        fs::write(&blocked, "not a directory").unwrap();

        let options = StoreOptions {
            watch: false,
            retry_delay: Duration::from_millis(100),
            ..StoreOptions::default()
        };
        let store =
            ConfigStore::with_options(ChatCoreSettings::default(), &blocked, SETTINGS_NAME, options)
                .unwrap();

        // The retry runs and fails while the blocking file is still there.
        thread::sleep(Duration::from_millis(500));
        fs::remove_file(&blocked).unwrap();

        thread::sleep(Duration::from_millis(800));
        assert!(!store.path().exists());
        assert!(!blocked.exists());
    }

    #[test]
    fn save_error_is_returned_to_caller() {
        let temp = TempDir::new().unwrap();
        let blocked = temp.path().join("blocked");
        fs::write(&blocked, "not a directory").unwrap();

        let options = StoreOptions {
            watch: false,
            retry_delay: Duration::from_millis(10),
            ..StoreOptions::default()
        };
        let store =
            ConfigStore::with_options(ChatCoreSettings::default(), &blocked, SETTINGS_NAME, options)
                .unwrap();

        assert!(matches!(store.save(), Err(ConfigError::PersistenceError { .. })));

        // Let the scheduled retries fail while the blocking file still exists.
        thread::sleep(Duration::from_millis(200));
    }
}

mod composite_types {
    use std::time::Instant;

    use chatcore::config_store::Settings;

    use super::*;

    struct Session {
        name: String,
        started: Instant,
    }

    impl Default for Session {
        fn default() -> Self {
            Self {
                name: String::new(),
                started: Instant::now(),
            }
        }
    }

    chatcore::impl_settings! {
        Session {
            name: String,
            started: Instant,
        }
    }

    #[derive(Default)]
    struct WithSession {
        session: Session,
    }

    chatcore::impl_settings! {
        WithSession {
            session: Session { section: "Runtime" },
        }
    }

    #[test]
    fn composite_with_primitive_fields_round_trips() {
        let temp = TempDir::new().unwrap();
        write_settings(
            &temp,
            "WebApp.Proxy={\"Host\":\"\\\"10.0.0.2\\\"\",\"Port\":\"8080\",\"UseTunnel\":\"on\"}\n",
        );

        let store = open(temp.path());

        assert_eq!(
            store.read().proxy,
            ProxySettings {
                host: "10.0.0.2".to_string(),
                port: 8080,
                use_tunnel: true,
            }
        );
        assert!(read_settings(&temp).contains(
            "\nWebApp.Proxy={\"Host\":\"\\\"10.0.0.2\\\"\",\"Port\":\"8080\",\"UseTunnel\":\"true\"}"
        ));
    }

    #[test]
    fn composite_with_unsupported_field_fails_construction() {
        let temp = TempDir::new().unwrap();

        let result = ConfigStore::with_options(
            WithSession::default(),
            temp.path(),
            "session",
            unwatched(),
        );

        match result {
            Err(ConfigError::Schema(SchemaError::UnsupportedType { type_name, field })) => {
                assert_eq!(type_name, std::any::type_name::<Instant>());
                assert_eq!(field, "session.started");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("store accepted an unsupported field"),
        }
        assert!(!temp.path().join("session.ini").exists());
        assert_eq!(WithSession::schema().fields().len(), 1);
    }
}

mod change_monitoring {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use futures::StreamExt;

    use super::*;

    const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

    fn watched(dir: &Path, save_triggers_reload: bool) -> ConfigStore<ChatCoreSettings> {
        let options = StoreOptions {
            save_triggers_reload,
            ..StoreOptions::default()
        };
        ConfigStore::with_options(ChatCoreSettings::default(), dir, SETTINGS_NAME, options).unwrap()
    }

    fn wait_for_port(receiver: &mpsc::Receiver<u16>, port: u16) -> bool {
        let deadline = Instant::now() + EVENT_TIMEOUT;
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            match receiver.recv_timeout(remaining) {
                Ok(seen) if seen == port => return true,
                Ok(_) => continue,
                Err(_) => return false,
            }
        }
        false
    }

    #[test]
    fn external_edit_reloads_and_notifies() {
        let temp = TempDir::new().unwrap();
        let store = watched(temp.path(), false);
        assert!(store.is_watching());

        let (sender, receiver) = mpsc::channel();
        store.on_config_changed(move |settings| {
            let _ = sender.send(settings.web_app_port);
        });

        let edited = read_settings(&temp).replace("WebApp.Port=8338", "WebApp.Port=9100");
        write_settings(&temp, &edited);

        assert!(wait_for_port(&receiver, 9100));
        assert_eq!(store.read().web_app_port, 9100);
    }

    #[test]
    fn own_save_does_not_notify() {
        let temp = TempDir::new().unwrap();
        let store = watched(temp.path(), false);

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        store.on_config_changed(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.update(|s| s.web_app_port = 9200);
        store.save().unwrap();
        thread::sleep(Duration::from_millis(750));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.read().web_app_port, 9200);
    }

    #[test]
    fn own_save_notifies_when_configured() {
        let temp = TempDir::new().unwrap();
        let store = watched(temp.path(), true);

        let (sender, receiver) = mpsc::channel();
        store.on_config_changed(move |settings| {
            let _ = sender.send(settings.web_app_port);
        });

        store.update(|s| s.web_app_port = 9300);
        store.save().unwrap();

        assert!(wait_for_port(&receiver, 9300));
    }

    #[test]
    fn closed_store_stops_reloading() {
        let temp = TempDir::new().unwrap();
        let store = watched(temp.path(), false);

        store.close();
        assert!(!store.is_watching());

        let edited = read_settings(&temp).replace("WebApp.Port=8338", "WebApp.Port=9400");
        write_settings(&temp, &edited);
        thread::sleep(Duration::from_millis(500));

        assert_eq!(store.read().web_app_port, 8338);
    }

    #[tokio::test]
    async fn change_stream_reports_edited_keys() {
        let temp = TempDir::new().unwrap();
        let store = watched(temp.path(), false);
        let mut changes = Box::pin(store.subscribe_to_key("BiliBili.*"));

        let edited = read_settings(&temp).replace("BiliBili.RoomId=0", "BiliBili.RoomId=55");
        write_settings(&temp, &edited);

        let change = tokio::time::timeout(EVENT_TIMEOUT, async {
            loop {
                let change = changes.next().await.unwrap();
                if change.touches("BiliBili.RoomId") {
                    return change;
                }
            }
        })
        .await
        .unwrap();

        assert!(change.keys.iter().any(|key| key == "BiliBili.RoomId"));
        assert_eq!(store.read().bilibili_room_id, 55);
    }
}
