/// Outgoing proxy used by platform connectors.
///
/// Persisted as one JSON object on the `WebApp.Proxy` line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProxySettings {
    /// Host name or address, empty to connect directly.
    pub host: String,

    /// Proxy port.
    pub port: u16,

    /// Whether to tunnel through the proxy with `CONNECT`.
    pub use_tunnel: bool,
}

crate::impl_settings! {
    ProxySettings {
        host: String { name: "Host" },
        port: u16 { name: "Port" },
        use_tunnel: bool { name: "UseTunnel" },
    }
}

impl ProxySettings {
    /// Whether a proxy is configured.
    pub fn is_enabled(&self) -> bool {
        !self.host.trim().is_empty() && self.port != 0
    }
}
