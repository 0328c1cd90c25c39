use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Which of the three services this process runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceRole {
    /// Hospital information hub: FHIR gateway, canonical store, MLLP listener.
    #[default]
    Hub,
    /// Patient intake front door.
    Intake,
    /// Clinician-facing gateway.
    Clinician,
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hub => write!(f, "hub"),
            Self::Intake => write!(f, "intake"),
            Self::Clinician => write!(f, "clinician"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub role: ServiceRole,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub mllp: MllpConfig,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub fhir: FhirConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub websocket: WebSocketConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.websocket.client_queue == 0 || self.websocket.command_queue == 0 {
            return Err("websocket queue sizes must be > 0".into());
        }
        if self.websocket.ping_interval_secs == 0 {
            return Err("websocket.ping_interval_secs must be > 0".into());
        }
        if self.mllp.timeout_ms == 0 {
            return Err("mllp.timeout_ms must be > 0".into());
        }
        if self.notifications.timeout_ms == 0 {
            return Err("notifications.timeout_ms must be > 0".into());
        }
        if self.tls.cert_path.is_some() != self.tls.key_path.is_some() {
            return Err("tls.cert_path and tls.key_path must be set together".into());
        }

        match self.role {
            ServiceRole::Hub => {
                if self.mllp.port == 0 {
                    return Err("mllp.port must be > 0".into());
                }
                if self.notifications.intake_url.as_deref().unwrap_or("").is_empty()
                    || self
                        .notifications
                        .clinician_url
                        .as_deref()
                        .unwrap_or("")
                        .is_empty()
                {
                    return Err(
                        "role=hub requires notifications.intake_url and notifications.clinician_url"
                            .into(),
                    );
                }
            }
            ServiceRole::Intake => {
                if self.mllp.hub_addr.as_deref().unwrap_or("").is_empty() {
                    return Err("role=intake requires mllp.hub_addr".into());
                }
                if self.fhir.hub_url.as_deref().unwrap_or("").is_empty() {
                    return Err("role=intake requires fhir.hub_url".into());
                }
            }
            ServiceRole::Clinician => {
                if self.fhir.hub_url.as_deref().unwrap_or("").is_empty() {
                    return Err("role=clinician requires fhir.hub_url".into());
                }
            }
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        socket_addr(&self.server.host, self.server.port)
    }

    pub fn mllp_addr(&self) -> SocketAddr {
        socket_addr(&self.mllp.host, self.mllp.port)
    }
}

fn socket_addr(host: &str, port: u16) -> SocketAddr {
    use std::net::{IpAddr, Ipv4Addr};
    let host: IpAddr = host.parse().unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
    SocketAddr::from((host, port))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    9090
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// MLLP listener (hub) and client (intake) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MllpConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_mllp_port")]
    pub port: u16,
    /// `host:port` of the hub's MLLP listener, used by intake.
    #[serde(default)]
    pub hub_addr: Option<String>,
    /// TLS server name to verify against; defaults to the host of `hub_addr`.
    #[serde(default)]
    pub server_name: Option<String>,
    #[serde(default = "default_mllp_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_mllp_port() -> u16 {
    2575
}
fn default_mllp_timeout_ms() -> u64 {
    10_000
}

impl Default for MllpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_mllp_port(),
            hub_addr: None,
            server_name: None,
            timeout_ms: default_mllp_timeout_ms(),
        }
    }
}

impl MllpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Server name for the TLS handshake with the hub.
    pub fn tls_server_name(&self) -> Option<String> {
        self.server_name.clone().or_else(|| {
            self.hub_addr
                .as_deref()
                .and_then(|addr| addr.rsplit_once(':').map(|(host, _)| host.to_string()))
        })
    }
}

/// PEM material for the MLLP link. Absent paths mean plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TlsConfig {
    #[serde(default)]
    pub cert_path: Option<String>,
    #[serde(default)]
    pub key_path: Option<String>,
    /// CA bundle trusted by intake for the hub's MLLP certificate, and by
    /// the HTTP clients for hub / satellite certificates.
    #[serde(default)]
    pub ca_path: Option<String>,
}

impl TlsConfig {
    pub fn server_enabled(&self) -> bool {
        self.cert_path.is_some() && self.key_path.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FhirConfig {
    /// Base URL of the hub's HTTP surface, used by the satellites.
    #[serde(default)]
    pub hub_url: Option<String>,
}

/// Satellite endpoints the hub notifies about encounter changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub intake_url: Option<String>,
    #[serde(default)]
    pub clinician_url: Option<String>,
    #[serde(default = "default_notification_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_notification_timeout_ms() -> u64 {
    5_000
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            intake_url: None,
            clinician_url: None,
            timeout_ms: default_notification_timeout_ms(),
        }
    }
}

impl NotificationsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketConfig {
    #[serde(default = "default_client_queue")]
    pub client_queue: usize,
    #[serde(default = "default_command_queue")]
    pub command_queue: usize,
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
}

fn default_client_queue() -> usize {
    256
}
fn default_command_queue() -> usize {
    256
}
fn default_ping_interval_secs() -> u64 {
    54
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            client_queue: default_client_queue(),
            command_queue: default_command_queue(),
            ping_interval_secs: default_ping_interval_secs(),
        }
    }
}

impl WebSocketConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_FILE: &str = "medbridge.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., MEDBRIDGE__SERVER__PORT=8081
        builder = builder.add_source(
            Environment::with_prefix("MEDBRIDGE")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub() -> AppConfig {
        AppConfig {
            notifications: NotificationsConfig {
                intake_url: Some("http://intake:8080".into()),
                clinician_url: Some("http://clinician:8081".into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.role, ServiceRole::Hub);
        assert_eq!(cfg.mllp.port, 2575);
        assert_eq!(cfg.mllp.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.notifications.timeout(), Duration::from_secs(5));
        assert!(!cfg.tls.server_enabled());
    }

    #[test]
    fn hub_requires_satellites() {
        assert!(hub().validate().is_ok());
        let err = AppConfig::default().validate().unwrap_err();
        assert!(err.contains("notifications.intake_url"));
    }

    #[test]
    fn satellites_require_hub() {
        let mut cfg = AppConfig {
            role: ServiceRole::Clinician,
            ..Default::default()
        };
        assert!(cfg.validate().unwrap_err().contains("fhir.hub_url"));
        cfg.fhir.hub_url = Some("http://hub:9090".into());
        assert!(cfg.validate().is_ok());

        cfg.role = ServiceRole::Intake;
        assert!(cfg.validate().unwrap_err().contains("mllp.hub_addr"));
        cfg.mllp.hub_addr = Some("hub:2575".into());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn half_configured_tls_is_rejected() {
        let mut cfg = hub();
        cfg.tls.cert_path = Some("server.crt".into());
        assert!(cfg.validate().unwrap_err().contains("tls.cert_path"));
        cfg.tls.key_path = Some("server.key".into());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn bad_log_level_and_port() {
        let mut cfg = hub();
        cfg.logging.level = "verbose".into();
        assert!(cfg.validate().is_err());
        let mut cfg = hub();
        cfg.server.port = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn tls_server_name_from_hub_addr() {
        let mut mllp = MllpConfig {
            hub_addr: Some("his.hospital.local:2575".into()),
            ..Default::default()
        };
        assert_eq!(mllp.tls_server_name().as_deref(), Some("his.hospital.local"));
        mllp.server_name = Some("his".into());
        assert_eq!(mllp.tls_server_name().as_deref(), Some("his"));
    }
}
