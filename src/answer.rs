//! Answering a question from supplied context
//!
//! A single model call with a system prompt chosen by question type. The
//! model is told to stay within the context it is given.

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::prompts::answer_prompt::{
    classify_question, render_user_prompt, system_prompt_for, QuestionType,
};
use crate::providers::{CompletionRequest, Provider, TokenUsage};
use serde::Serialize;
use std::sync::Arc;

/// Characters of context sent to the model
pub const MAX_CONTEXT_CHARS: usize = 10_000;

/// Minimum length of an acceptable answer, after trimming
const MIN_ANSWER_CHARS: usize = 10;

/// Answer text used when the model returns nothing
const EMPTY_RESPONSE: &str = "No response generated";

/// A generated answer with usage metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerResponse {
    /// The answer text
    pub answer: String,
    /// How the question was classified
    pub question_type: QuestionType,
    /// Token usage, when the provider reports it
    pub usage: Option<TokenUsage>,
    /// Model that produced the answer
    pub model: String,
}

/// Answers questions strictly from caller-supplied text
pub struct ContextAnswerer {
    provider: Arc<dyn Provider>,
    max_tokens: u32,
    temperature: f32,
}

impl ContextAnswerer {
    /// Create an answerer over a provider
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            max_tokens: 1000,
            temperature: 0.3,
        }
    }

    /// Take answer token limit and temperature from provider configuration
    pub fn with_config(mut self, config: &ProviderConfig) -> Self {
        self.max_tokens = config.answer_max_tokens;
        self.temperature = config.answer_temperature;
        self
    }

    /// Answer `question` using only `context`
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the model call fails
    pub async fn answer(&self, question: &str, context: &str) -> Result<AnswerResponse> {
        let question_type = classify_question(question);
        tracing::debug!("Question classified as {}", question_type);

        let context = truncate_context(context);
        let request = CompletionRequest::single(
            render_user_prompt(question, context),
            self.max_tokens,
            self.temperature,
        )
        .with_system(system_prompt_for(question_type));

        let response = self.provider.complete(&request).await?;
        let answer = if response.text.is_empty() {
            EMPTY_RESPONSE.to_string()
        } else {
            response.text
        };

        Ok(AnswerResponse {
            answer,
            question_type,
            usage: response.usage,
            model: response.model,
        })
    }
}

fn truncate_context(context: &str) -> &str {
    match context.char_indices().nth(MAX_CONTEXT_CHARS) {
        Some((cut, _)) => &context[..cut],
        None => context,
    }
}

/// Whether an answer is substantial enough to show
///
/// # Examples
///
/// ```
/// use webqa::answer::validate_response;
///
/// assert!(validate_response("Paris is the capital of France."));
/// assert!(!validate_response("  Paris  "));
/// ```
pub fn validate_response(answer: &str) -> bool {
    answer.trim().chars().count() >= MIN_ANSWER_CHARS
}
