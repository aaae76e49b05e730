//! Settings of the chat aggregation library.
//!
//! Defines the settings object persisted by the store, its nested types and
//! the directories it is stored in.

mod danmaku;
mod paths;
mod proxy;

#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};

pub use danmaku::DanmakuStyle;
pub use paths::ConfigPaths;
pub use proxy::ProxySettings;

/// File name (without extension) of the main settings file.
pub const SETTINGS_NAME: &str = "settings";

/// Main settings shared by every platform connector.
///
/// Field order is the order of the settings file. All fields have sensible
/// defaults, so a missing or partial file still yields usable settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCoreSettings {
    /// Disables the local web app entirely.
    pub disable_web_app: bool,

    /// Opens the web app in the default browser on startup.
    pub launch_web_app_on_startup: bool,

    /// Notification sound volume, 0.0 to 1.0.
    pub volume: f32,

    /// Words removed from every incoming message, lower case.
    pub banned_words: Vec<String>,

    /// Port the web app listens on.
    pub web_app_port: u16,

    /// Outgoing proxy for platform connections.
    pub proxy: ProxySettings,

    /// Twitch OAuth token, never shown in the web app.
    pub twitch_oauth_token: String,

    /// Channels joined on connect.
    pub twitch_channels: Vec<String>,

    /// Parse BetterTTV emotes.
    pub parse_bttv_emotes: bool,

    /// Parse FrankerFaceZ emotes.
    pub parse_ffz_emotes: bool,

    /// Parse Twitch emotes.
    pub parse_twitch_emotes: bool,

    /// Parse cheermotes.
    pub parse_cheermotes: bool,

    /// Parse emoji.
    pub parse_emojis: bool,

    /// BiliBili live room to join, 0 for none.
    pub bilibili_room_id: u64,

    /// How danmaku are displayed.
    pub danmaku_style: DanmakuStyle,

    /// Last successful platform login.
    pub last_login: DateTime<Utc>,
}

impl Default for ChatCoreSettings {
    fn default() -> Self {
        Self {
            disable_web_app: false,
            launch_web_app_on_startup: true,
            volume: 1.0,
            banned_words: Vec::new(),
            web_app_port: 8338,
            proxy: ProxySettings::default(),
            twitch_oauth_token: String::new(),
            twitch_channels: Vec::new(),
            parse_bttv_emotes: true,
            parse_ffz_emotes: true,
            parse_twitch_emotes: true,
            parse_cheermotes: true,
            parse_emojis: true,
            bilibili_room_id: 0,
            danmaku_style: DanmakuStyle::Scroll,
            last_login: DateTime::UNIX_EPOCH,
        }
    }
}

crate::impl_settings! {
    #[header(
        "ChatCore settings",
        "Edits are picked up while ChatCore is running."
    )]
    ChatCoreSettings {
        disable_web_app: bool {
            name: "DisableWebApp",
            section: "Global",
            comment: "Set to true to disable the web app entirely."
        },
        launch_web_app_on_startup: bool {
            name: "LaunchWebAppOnStartup",
            section: "Global",
            comment: "Whether to launch the web app in your default browser on startup."
        },
        volume: f32 { name: "Volume", section: "Global" },
        banned_words: Vec<String> {
            name: "BannedWords",
            section: "Global",
            comment: "Comma separated, matched case-insensitively."
        },
        web_app_port: u16 {
            name: "WebApp_Port",
            section: "Web App",
            comment: "The port the web app will run on."
        },
        proxy: ProxySettings {
            name: "WebApp_Proxy",
            section: "Web App",
            comment: "Leave Host empty to connect directly."
        },
        twitch_oauth_token: String { name: "Twitch_OAuthToken", section: "Twitch", hidden },
        twitch_channels: Vec<String> { name: "Twitch_Channels", section: "Twitch" },
        parse_bttv_emotes: bool { name: "ParseBTTVEmotes", section: "Twitch" },
        parse_ffz_emotes: bool { name: "ParseFFZEmotes", section: "Twitch" },
        parse_twitch_emotes: bool { name: "ParseTwitchEmotes", section: "Twitch" },
        parse_cheermotes: bool { name: "ParseCheermotes", section: "Twitch" },
        parse_emojis: bool { name: "ParseEmojis", section: "Twitch" },
        bilibili_room_id: u64 {
            name: "BiliBili_RoomId",
            section: "BiliBili",
            comment: "Numeric id of the live room, 0 to disable."
        },
        danmaku_style: DanmakuStyle { name: "BiliBili_DanmakuStyle", section: "BiliBili" },
        last_login: DateTime<Utc> { name: "LastLogin", hidden },
    }
}
