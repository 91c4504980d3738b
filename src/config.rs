//! Client configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::codec_adapter::CodecAdapter;
use crate::error::ConfigError;

/// Default idle timeout for a voice transmission
pub const DEFAULT_USER_VOICE_TIMEOUT: Duration = Duration::from_millis(200);
/// Default period between liveness pings
pub const DEFAULT_DATA_PING_INTERVAL: Duration = Duration::from_millis(5000);
/// Default in-flight-ping threshold before declaring a timeout.
pub const DEFAULT_MAX_IN_FLIGHT_DATA_PINGS: u32 = 2;
/// Default preferred outgoing voice bitrate, before the server's
/// `max_bandwidth` cap is applied
pub const DEFAULT_PREFERRED_BITRATE: u32 = 40_000;

/// A stable identifier for this implementation, used as the default
/// `clientSoftware` release string in the outgoing `Version` message.
pub const DEFAULT_CLIENT_SOFTWARE: &str = concat!("mumble-client-core/", env!("CARGO_PKG_VERSION"));

/// Construction-time configuration for a [`crate::client::Client`].
pub struct ClientConfig {
    pub username: String,
    pub password: Option<String>,
    pub tokens: Vec<String>,
    pub client_software: String,
    pub os_name: String,
    pub os_version: String,
    pub codecs: Option<Arc<dyn CodecAdapter>>,
    pub user_voice_timeout: Duration,
    pub data_ping_interval: Duration,
    pub max_in_flight_data_pings: u32,
    pub preferred_bitrate: u32,
}

impl ClientConfig {
    /// Build a config with every default filled in except `username`, which
    /// is required; an empty username fails construction with
    /// `ConfigError`.
    pub fn new(username: impl Into<String>) -> Result<Self, ConfigError> {
        let username = username.into();
        if username.is_empty() {
            return Err(ConfigError::MissingUsername);
        }
        Ok(Self {
            username,
            password: None,
            tokens: Vec::new(),
            client_software: DEFAULT_CLIENT_SOFTWARE.to_string(),
            os_name: probe_os_name().to_string(),
            os_version: probe_os_version(),
            codecs: None,
            user_voice_timeout: DEFAULT_USER_VOICE_TIMEOUT,
            data_ping_interval: DEFAULT_DATA_PING_INTERVAL,
            max_in_flight_data_pings: DEFAULT_MAX_IN_FLIGHT_DATA_PINGS,
            preferred_bitrate: DEFAULT_PREFERRED_BITRATE,
        })
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_tokens(mut self, tokens: Vec<String>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_client_software(mut self, value: impl Into<String>) -> Self {
        self.client_software = value.into();
        self
    }

    pub fn with_os(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.os_name = name.into();
        self.os_version = version.into();
        self
    }

    pub fn with_codecs(mut self, codecs: Arc<dyn CodecAdapter>) -> Self {
        self.codecs = Some(codecs);
        self
    }

    pub fn with_user_voice_timeout(mut self, timeout: Duration) -> Self {
        self.user_voice_timeout = timeout;
        self
    }

    pub fn with_data_ping_interval(mut self, interval: Duration) -> Self {
        self.data_ping_interval = interval;
        self
    }

    pub fn with_max_in_flight_data_pings(mut self, max: u32) -> Self {
        self.max_in_flight_data_pings = max;
        self
    }

    pub fn with_preferred_bitrate(mut self, bitrate: u32) -> Self {
        self.preferred_bitrate = bitrate;
        self
    }
}

/// Pure probe of the host OS family name. Overridable via
/// [`ClientConfig::with_os`].
pub fn probe_os_name() -> &'static str {
    std::env::consts::OS
}

/// Pure probe of a host OS version string. No portable API exposes an exact
/// kernel/build version from stable std, so this returns the target triple's
/// architecture as a best-effort placeholder; callers that need an exact
/// version should supply one via [`ClientConfig::with_os`].
pub fn probe_os_version() -> String {
    std::env::consts::ARCH.to_string()
}
