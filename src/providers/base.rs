//! Base provider trait and common types for WebQA
//!
//! This module defines the Provider trait that language-model backends
//! implement, along with the request, message, and response types the
//! reasoning loop and the context answerer exchange with it.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message structure for a completion request
///
/// Messages alternate between the user and the assistant; the system
/// prompt travels separately in [`CompletionRequest::system`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (user or assistant)
    pub role: String,
    /// Text content of the message
    pub content: String,
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use webqa::providers::Message;
    ///
    /// let msg = Message::user("What is 2 + 2?");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    ///
    /// # Examples
    ///
    /// ```
    /// use webqa::providers::Message;
    ///
    /// let msg = Message::assistant("4");
    /// assert_eq!(msg.role, "assistant");
    /// ```
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// A single completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Optional system prompt
    pub system: Option<String>,
    /// Conversation messages, oldest first
    pub messages: Vec<Message>,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl CompletionRequest {
    /// Request consisting of a single user prompt and no system prompt
    ///
    /// # Examples
    ///
    /// ```
    /// use webqa::providers::CompletionRequest;
    ///
    /// let request = CompletionRequest::single("Think step by step", 500, 0.3);
    /// assert!(request.system.is_none());
    /// assert_eq!(request.messages.len(), 1);
    /// ```
    pub fn single(prompt: impl Into<String>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            system: None,
            messages: vec![Message::user(prompt)],
            max_tokens,
            temperature,
        }
    }

    /// Attach a system prompt
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Token usage information from a completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub input_tokens: u32,
    /// Number of tokens in the completion
    pub output_tokens: u32,
    /// Total tokens used (input + output)
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Create a new TokenUsage instance
    ///
    /// # Examples
    ///
    /// ```
    /// use webqa::providers::TokenUsage;
    ///
    /// let usage = TokenUsage::new(100, 50);
    /// assert_eq!(usage.total_tokens, 150);
    /// ```
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
        }
    }
}

/// Response from a completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// Generated text; empty when the model returned no content
    pub text: String,
    /// Token usage when the backend reports it
    pub usage: Option<TokenUsage>,
    /// Model that produced the response
    pub model: String,
}

impl CompletionResponse {
    /// Create a response without usage information
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
            model: model.into(),
        }
    }

    /// Create a response with usage information
    pub fn with_usage(text: impl Into<String>, model: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            text: text.into(),
            usage: Some(usage),
            model: model.into(),
        }
    }
}

/// Language-model backend
///
/// Implementations turn a [`CompletionRequest`] into generated text. The
/// reasoning loop treats the backend as an opaque text-completion service.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate a completion for the request
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails or its response is invalid
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;

    /// Name of the model requests are sent to
    fn model(&self) -> String;
}
