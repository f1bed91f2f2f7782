//! Provider module for WebQA
//!
//! This module contains the language-model provider abstraction and the
//! Anthropic Messages API implementation.

pub mod anthropic;
pub mod base;

pub use anthropic::AnthropicProvider;
pub use base::{CompletionRequest, CompletionResponse, Message, Provider, TokenUsage};

use crate::config::Config;
use crate::error::Result;

/// Create the configured provider
///
/// # Arguments
///
/// * `config` - Full configuration; the provider and retry sections are used
///
/// # Returns
///
/// Returns a boxed provider instance
///
/// # Errors
///
/// Returns error if credentials are missing or initialization fails
pub fn create_provider(config: &Config) -> Result<Box<dyn Provider>> {
    Ok(Box::new(AnthropicProvider::new(
        config.provider.clone(),
        config.retry.policy(),
    )?))
}
