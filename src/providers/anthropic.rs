//! Anthropic provider implementation for WebQA
//!
//! This module implements the Provider trait for the Anthropic Messages
//! API. Transient failures (transport errors, 429, 5xx) are retried with
//! exponential backoff.

use crate::config::{endpoint_url, ProviderConfig};
use crate::error::{Result, WebQaError};
use crate::providers::{CompletionRequest, CompletionResponse, Message, Provider, TokenUsage};
use crate::retry::{retry_async, RetryPolicy};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// API version header sent with every request
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API provider
///
/// # Examples
///
/// ```no_run
/// use webqa::config::ProviderConfig;
/// use webqa::providers::{AnthropicProvider, CompletionRequest, Provider};
/// use webqa::retry::RetryPolicy;
///
/// # async fn example() -> webqa::error::Result<()> {
/// let config = ProviderConfig {
///     api_key: Some("sk-ant-...".to_string()),
///     ..Default::default()
/// };
/// let provider = AnthropicProvider::new(config, RetryPolicy::default())?;
/// let response = provider
///     .complete(&CompletionRequest::single("Hello!", 100, 0.3))
///     .await?;
/// println!("{}", response.text);
/// # Ok(())
/// # }
/// ```
pub struct AnthropicProvider {
    client: Client,
    messages_url: Url,
    config: ProviderConfig,
    api_key: String,
    retry: RetryPolicy,
}

/// Request body for /v1/messages
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [Message],
}

/// Response body from /v1/messages
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<MessagesUsage>,
    #[serde(default)]
    stop_reason: Option<String>,
}

/// Content block in a Messages response
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Usage block in a Messages response
#[derive(Debug, Deserialize)]
struct MessagesUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider instance
    ///
    /// # Arguments
    ///
    /// * `config` - Provider configuration (base URL, model, key, timeout)
    /// * `retry` - Backoff policy for transient failures
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` when no API key is configured, or a
    /// provider error if the HTTP client cannot be built
    pub fn new(config: ProviderConfig, retry: RetryPolicy) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| WebQaError::MissingCredentials("ANTHROPIC_API_KEY".to_string()))?;

        let messages_url = endpoint_url("provider.api_base", &config.api_base, "v1/messages")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("webqa/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WebQaError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Anthropic provider: base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self {
            client,
            messages_url,
            config,
            api_key,
            retry,
        })
    }

    async fn send_once(
        &self,
        request: &CompletionRequest,
    ) -> std::result::Result<CompletionResponse, WebQaError> {
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system.as_deref(),
            messages: &request.messages,
        };

        tracing::debug!(
            "Sending Anthropic request: {} messages, max_tokens={}",
            request.messages.len(),
            request.max_tokens
        );

        let response = self
            .client
            .post(self.messages_url.clone())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Anthropic returned error {}: {}", status, error_text);
            return Err(WebQaError::ProviderStatus {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let parsed: MessagesResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Anthropic response: {}", e);
            WebQaError::Provider(format!("Failed to parse Anthropic response: {}", e))
        })?;

        tracing::debug!(
            "Anthropic response: {} content blocks, stop_reason={:?}",
            parsed.content.len(),
            parsed.stop_reason
        );

        let text = parsed
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        let model = parsed.model.unwrap_or_else(|| self.config.model.clone());

        Ok(match parsed.usage {
            Some(usage) => CompletionResponse::with_usage(
                text,
                model,
                TokenUsage::new(usage.input_tokens, usage.output_tokens),
            ),
            None => CompletionResponse::new(text, model),
        })
    }
}

/// Transport failures, rate limits, and server errors are worth retrying
fn is_transient(error: &WebQaError) -> bool {
    match error {
        WebQaError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        WebQaError::ProviderStatus { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let response = retry_async(&self.retry, "Anthropic request", is_transient, || {
            self.send_once(request)
        })
        .await?;
        Ok(response)
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }
}
