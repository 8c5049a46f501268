//! OpenAI API client struct and builder.

use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use marginalia_stream::{FixedPacing, ResponseStream};
use marginalia_types::{CancelHandle, ProviderError, StreamOutcome, TargetMessage};

use crate::config::{DEFAULT_BASE_URL, DEFAULT_CONTEXT_WINDOW, DEFAULT_MODEL, OpenAiConfig};
use crate::error::map_reqwest_error;
use crate::mapping::to_api_request;

/// Response body as delivered by reqwest.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Client for the OpenAI Chat Completions API and compatible servers.
///
/// # Example
///
/// ```no_run
/// use marginalia_provider_openai::OpenAi;
///
/// let client = OpenAi::new("sk-...")
///     .model("gpt-4o-mini")
///     .base_url("http://localhost:8080")
///     .context_window(8192);
/// ```
pub struct OpenAi {
    /// OpenAI API key (`OPENAI_API_KEY`).
    pub(crate) api_key: String,
    /// Model identifier sent with every request.
    pub(crate) model: String,
    /// API base URL (override for testing or proxies).
    pub(crate) base_url: String,
    /// Sampling temperature.
    pub(crate) temperature: f64,
    /// Tokens shared by prompt and completion.
    pub(crate) context_window: u32,
    /// Optional organization ID sent as `OpenAI-Organization`.
    pub(crate) organization: Option<String>,
    /// Delay between deltas of one chunk, if any.
    pub(crate) pacing: Option<Duration>,
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
}

impl std::fmt::Debug for OpenAi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAi")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("context_window", &self.context_window)
            .field("organization", &self.organization)
            .field("pacing", &self.pacing)
            .finish_non_exhaustive()
    }
}

impl OpenAi {
    /// Create a new client with the given API key and sensible defaults.
    ///
    /// Default model: `gpt-3.5-turbo`.
    /// Default base URL: `https://api.openai.com`.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            temperature: 0.0,
            context_window: DEFAULT_CONTEXT_WINDOW,
            organization: None,
            pacing: None,
            client: reqwest::Client::new(),
        }
    }

    /// Build a client from loaded settings.
    #[must_use]
    pub fn from_config(config: &OpenAiConfig) -> Self {
        let mut client = Self::new(config.api_key.clone())
            .model(config.model.clone())
            .base_url(config.base_url.clone())
            .temperature(config.temperature)
            .context_window(config.context_window);
        client.organization = config.organization.clone();
        client.pacing = config.pacing();
        client
    }

    /// Override the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL.
    ///
    /// Useful for testing with a local mock server or an API proxy.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the context window used to size `max_tokens`.
    #[must_use]
    pub fn context_window(mut self, tokens: u32) -> Self {
        self.context_window = tokens;
        self
    }

    /// Set the organization ID sent with every request.
    #[must_use]
    pub fn organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    /// Space out visible updates by `delay` between deltas of one chunk.
    #[must_use]
    pub fn pacing(mut self, delay: Duration) -> Self {
        self.pacing = Some(delay);
        self
    }

    /// Build the chat completions endpoint URL.
    pub(crate) fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Open a streaming completion for `prompt`.
    ///
    /// Fails only when the request cannot be sent. A non-2xx status is carried
    /// by the returned stream, which reports the API's error text when read.
    pub async fn stream_prompt(&self, prompt: &str) -> Result<ResponseStream<ByteStream>, ProviderError> {
        let url = self.completions_url();
        let body = to_api_request(prompt, &self.model, self.temperature, self.context_window);

        tracing::debug!(
            url = %url,
            model = %self.model,
            max_tokens = body.max_tokens,
            "sending streaming completion request"
        );

        let mut request = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json");
        if let Some(org) = &self.organization {
            request = request.header("OpenAI-Organization", org);
        }

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, None))?;

        let status = response.status().as_u16();
        if status != 200 {
            tracing::warn!(status, "streaming completion returned non-success status");
        }

        let body: ByteStream = response.bytes_stream().boxed();
        let stream = ResponseStream::new(status, body);
        Ok(match self.pacing {
            Some(delay) => stream.with_pacing(FixedPacing(delay)),
            None => stream,
        })
    }

    /// Stream the answer to `prompt` into `message`.
    ///
    /// `cancel` is honoured while the request is still being sent as well as
    /// during reading. A request cancelled before the response arrives yields
    /// [`StreamOutcome::Cancelled`] and leaves `message` untouched.
    pub async fn ask(
        &self,
        prompt: &str,
        message: &mut TargetMessage,
        cancel: &CancelHandle,
    ) -> Result<StreamOutcome, ProviderError> {
        let stream = tokio::select! {
            biased;
            () = cancel.token().cancelled() => {
                tracing::debug!("request cancelled before response");
                cancel.settle();
                return Ok(StreamOutcome::Cancelled);
            }
            opened = self.stream_prompt(prompt) => opened?,
        };

        Ok(stream
            .with_cancel_handle(cancel.clone())
            .read_into(message)
            .await)
    }
}
