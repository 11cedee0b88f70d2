use std::time::Duration;

use serde::Deserialize;

use crate::address::{Network, ECHO_PREFIX};
use crate::block::DEFAULT_EXPIRATION_SECONDS;
use crate::error::Result;

pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 30_000;

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LoginSettings {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Everything an [`EchoClient`](crate::networking::client::EchoClient) needs to reach a node.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub url: String,
    #[serde(default = "default_address_prefix")]
    pub address_prefix: String,
    /// 0 waits forever
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    #[serde(default = "default_expiration_seconds")]
    pub expiration_seconds: u32,
    #[serde(default)]
    pub login: LoginSettings,
    #[serde(default = "default_apis")]
    pub apis: Vec<String>,
}

fn default_address_prefix() -> String {
    String::from(ECHO_PREFIX)
}

fn default_call_timeout_ms() -> u64 {
    DEFAULT_CALL_TIMEOUT_MS
}

fn default_expiration_seconds() -> u32 {
    DEFAULT_EXPIRATION_SECONDS
}

fn default_apis() -> Vec<String> {
    vec![
        String::from("database"),
        String::from("network_broadcast"),
        String::from("history"),
    ]
}

impl ClientSettings {
    pub fn new(url: &str) -> Self {
        ClientSettings {
            url: url.to_string(),
            address_prefix: default_address_prefix(),
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            expiration_seconds: DEFAULT_EXPIRATION_SECONDS,
            login: LoginSettings::default(),
            apis: default_apis(),
        }
    }

    /// Read `config_name` (any format the `config` crate knows, extension optional), then let
    /// `ECHO_*` environment variables override it.
    pub fn load(config_name: &str) -> Result<Self> {
        let mut settings = config::Config::default();
        settings
            .merge(config::File::with_name(config_name))?
            .merge(config::Environment::with_prefix("ECHO"))?;
        Ok(settings.try_into::<ClientSettings>()?)
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        match self.call_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn network(&self) -> Network {
        Network::new(&self.address_prefix)
    }
}
