//! Client configuration
//!
//! [`ClientConfig`] is the programmatic configuration. [`FileConfig`] is the
//! optional `config.toml` in the realtime config directory; a missing file
//! yields defaults and a malformed one is logged and ignored.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::client::ConnectOptions;
use crate::error::{RealtimeError, Result};
use crate::ws::async_ws::{TungsteniteDialer, TungsteniteOptions};
use crate::ws::blocking::{BlockingDialer, BlockingOptions};
use crate::ws::WebSocketDialer;

/// Public OpenAI realtime endpoint
pub const OPENAI_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

/// API version sent to Azure by default
pub const AZURE_API_VERSION: &str = "2024-10-01-preview";

/// Environment variable holding the auth token
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// Environment variable overriding the base URL
pub const BASE_URL_ENV_VAR: &str = "REALTIME_BASE_URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiType {
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    Azure,
}

#[derive(Clone)]
pub struct ClientConfig {
    auth_token: String,
    pub base_url: String,
    pub api_type: ApiType,
    /// Required by Azure
    pub api_version: Option<String>,
}

impl ClientConfig {
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
            base_url: OPENAI_REALTIME_URL.to_string(),
            api_type: ApiType::OpenAI,
            api_version: None,
        }
    }

    pub fn azure(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            auth_token: api_key.into(),
            base_url: base_url.into(),
            api_type: ApiType::Azure,
            api_version: Some(AZURE_API_VERSION.to_string()),
        }
    }

    /// Token from `OPENAI_API_KEY`, base URL from `REALTIME_BASE_URL` if set
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(API_KEY_ENV_VAR)
            .map_err(|_| RealtimeError::config(format!("{} is not set", API_KEY_ENV_VAR)))?;
        let mut config = Self::new(token);
        if let Ok(base_url) = std::env::var(BASE_URL_ENV_VAR) {
            config.base_url = base_url;
        }
        Ok(config)
    }

    /// Overlay the `[client]` section of a config file
    pub fn with_file(mut self, file: &FileConfig) -> Self {
        let section = &file.client;
        if let Some(api_type) = section.api_type {
            self.api_type = api_type;
            if api_type == ApiType::Azure && self.api_version.is_none() {
                self.api_version = Some(AZURE_API_VERSION.to_string());
            }
        }
        if let Some(base_url) = &section.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(api_version) = &section.api_version {
            self.api_version = Some(api_version.clone());
        }
        self
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }
}

// The token never appears in logs
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<Realtime API ClientConfig>")
    }
}

impl fmt::Display for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<Realtime API ClientConfig>")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Async,
    Blocking,
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub client: ClientSection,
    pub transport: TransportSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    pub base_url: Option<String>,
    pub api_type: Option<ApiType>,
    pub api_version: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransportSection {
    pub kind: TransportKind,
    /// Largest inbound message in bytes; `0` disables the limit
    pub read_limit: Option<usize>,
    /// Blocking transport only
    pub poll_interval_ms: Option<u64>,
}

impl FileConfig {
    /// Load from the default location
    ///
    /// Returns defaults if the file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        Self::load_from(&realtime_utils::config_file())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match Self::parse(&content) {
                Ok(config) => {
                    tracing::debug!(path = %path.display(), "Loaded config file");
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| RealtimeError::config(e.to_string()))
    }

    fn read_limit(&self) -> Option<usize> {
        match self.transport.read_limit {
            Some(0) => None,
            Some(limit) => Some(limit),
            None => Some(realtime_protocol::MAX_MESSAGE_SIZE),
        }
    }

    /// Dialer for the configured transport
    pub fn dialer(&self) -> Arc<dyn WebSocketDialer> {
        match self.transport.kind {
            TransportKind::Async => Arc::new(TungsteniteDialer::with_options(TungsteniteOptions {
                read_limit: self.read_limit(),
                ..TungsteniteOptions::default()
            })),
            TransportKind::Blocking => {
                let mut options = BlockingOptions {
                    read_limit: self.read_limit(),
                    ..BlockingOptions::default()
                };
                if let Some(ms) = self.transport.poll_interval_ms.filter(|ms| *ms > 0) {
                    options.poll_interval = Duration::from_millis(ms);
                }
                Arc::new(BlockingDialer::with_options(options))
            }
        }
    }

    /// Connect options carrying the configured model and transport
    pub fn connect_options(&self) -> ConnectOptions {
        let options = ConnectOptions::new().shared_dialer(self.dialer());
        match &self.client.model {
            Some(model) => options.model(model.clone()),
            None => options,
        }
    }
}
