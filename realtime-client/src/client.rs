//! Connect factory

use std::fmt;
use std::sync::Arc;

use tracing::info;
use tungstenite::http::HeaderMap;
use url::Url;

use crate::config::{ApiType, ClientConfig};
use crate::conn::Conn;
use crate::context::Context;
use crate::error::{RealtimeError, Result};
use crate::logger::{Logger, TracingLogger};
use crate::ws::async_ws::TungsteniteDialer;
use crate::ws::{header, WebSocketDialer};

// Speech-to-speech models
pub const GPT_REALTIME: &str = "gpt-realtime";
pub const GPT_REALTIME_2025_08_28: &str = "gpt-realtime-2025-08-28";
pub const GPT_REALTIME_MINI: &str = "gpt-realtime-mini";
pub const GPT_REALTIME_MINI_2025_10_06: &str = "gpt-realtime-mini-2025-10-06";

// Preview models, scheduled for shutdown
pub const GPT_4O_REALTIME_PREVIEW: &str = "gpt-4o-realtime-preview";
pub const GPT_4O_REALTIME_PREVIEW_2024_12_17: &str = "gpt-4o-realtime-preview-2024-12-17";
pub const GPT_4O_REALTIME_PREVIEW_2025_06_03: &str = "gpt-4o-realtime-preview-2025-06-03";
pub const GPT_4O_MINI_REALTIME_PREVIEW: &str = "gpt-4o-mini-realtime-preview";
pub const GPT_4O_MINI_REALTIME_PREVIEW_2024_12_17: &str = "gpt-4o-mini-realtime-preview-2024-12-17";

// Transcription models
pub const GPT_4O_TRANSCRIBE: &str = "gpt-4o-transcribe";
pub const GPT_4O_MINI_TRANSCRIBE: &str = "gpt-4o-mini-transcribe";
pub const WHISPER_1: &str = "whisper-1";

/// Purpose of a session opened without a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Transcription,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcription => "transcription",
        }
    }
}

/// Per-connection settings for [`Client::connect`]
pub struct ConnectOptions {
    model: String,
    intent: Option<Intent>,
    dialer: Arc<dyn WebSocketDialer>,
    logger: Arc<dyn Logger>,
    headers: Vec<(String, String)>,
}

impl ConnectOptions {
    pub fn new() -> Self {
        Self {
            model: GPT_REALTIME.to_string(),
            intent: None,
            dialer: Arc::new(TungsteniteDialer::new()),
            logger: Arc::new(TracingLogger),
            headers: Vec::new(),
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Open the session by intent instead of model
    pub fn intent(mut self, intent: Intent) -> Self {
        self.intent = Some(intent);
        self
    }

    pub fn dialer(mut self, dialer: impl WebSocketDialer + 'static) -> Self {
        self.dialer = Arc::new(dialer);
        self
    }

    pub fn shared_dialer(mut self, dialer: Arc<dyn WebSocketDialer>) -> Self {
        self.dialer = dialer;
        self
    }

    pub fn logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    /// Extra handshake header, validated on connect
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("model", &self.model)
            .field("intent", &self.intent)
            .field("headers", &self.headers.len())
            .finish_non_exhaustive()
    }
}

/// Client for the realtime service
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
}

impl Client {
    /// Client for the public OpenAI endpoint
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self::with_config(ClientConfig::new(auth_token))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Dial the service and return the open session
    ///
    /// `ctx` bounds the handshake only. Dial failures are returned as-is and
    /// never retried.
    pub async fn connect(&self, ctx: &Context, options: ConnectOptions) -> Result<Conn> {
        let url = self.url(&options)?;
        let headers = self.headers(&options)?;

        let conn = options.dialer.dial(ctx, &url, &headers).await?;
        info!(model = %options.model, "Connected to realtime service");
        Ok(Conn::new(conn, options.logger))
    }

    pub(crate) fn url(&self, options: &ConnectOptions) -> Result<String> {
        let mut url = Url::parse(&self.config.base_url).map_err(|e| RealtimeError::InvalidUrl {
            url: self.config.base_url.clone(),
            message: e.to_string(),
        })?;

        match options.intent {
            None => {
                let mut query = url.query_pairs_mut();
                query.append_pair("model", &options.model);
                if self.config.api_type == ApiType::Azure {
                    if let Some(version) = &self.config.api_version {
                        query.append_pair("api-version", version);
                    }
                }
            }
            Some(_) if self.config.api_type == ApiType::Azure => {
                return Err(RealtimeError::config(
                    "intent is not supported for the Azure API type",
                ));
            }
            Some(intent) => {
                url.query_pairs_mut().append_pair("intent", intent.as_str());
            }
        }
        Ok(url.to_string())
    }

    pub(crate) fn headers(&self, options: &ConnectOptions) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let (name, value) = match self.config.api_type {
            ApiType::Azure => header("api-key", self.config.auth_token())?,
            ApiType::OpenAI => header(
                "Authorization",
                &format!("Bearer {}", self.config.auth_token()),
            )?,
        };
        headers.insert(name, value);

        for (name, value) in &options.headers {
            let (name, value) = header(name, value)?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}
