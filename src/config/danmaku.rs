crate::config_enum! {
    /// How BiliBili danmaku (bullet comments) are shown in the chat overlay.
    pub enum DanmakuStyle {
        /// Scroll across the overlay like the BiliBili player.
        Scroll,
        /// Append to the chat list like any other message.
        Inline,
        /// Do not show danmaku.
        Hidden,
    }
}
