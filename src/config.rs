//! Configuration management for WebQA
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! Precedence is file < environment < command line.

use crate::error::{Result, WebQaError};
use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Longest single retry wait accepted from configuration (seconds)
pub const MAX_RETRY_WAIT_SECONDS: f64 = 3600.0;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Main configuration structure for WebQA
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Language model provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Web search settings
    #[serde(default)]
    pub search: SearchConfig,
    /// Reasoning loop limits
    #[serde(default)]
    pub agent: AgentConfig,
    /// Retry policy for external calls
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Anthropic Messages API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the Messages API
    #[serde(default = "default_provider_api_base")]
    pub api_base: String,

    /// Model used for both reasoning and answering
    #[serde(default = "default_model")]
    pub model: String,

    /// API key; `ANTHROPIC_API_KEY` is preferred over storing it here
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Token budget for a single reasoning reply
    #[serde(default = "default_reasoning_max_tokens")]
    pub reasoning_max_tokens: u32,

    /// Token budget for a context answer
    #[serde(default = "default_answer_max_tokens")]
    pub answer_max_tokens: u32,

    /// Sampling temperature for reasoning replies
    #[serde(default = "default_temperature")]
    pub reasoning_temperature: f32,

    /// Sampling temperature for context answers
    #[serde(default = "default_temperature")]
    pub answer_temperature: f32,

    /// HTTP timeout for a single request (seconds)
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
}

fn default_provider_api_base() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_reasoning_max_tokens() -> u32 {
    500
}

fn default_answer_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_provider_timeout() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_provider_api_base(),
            model: default_model(),
            api_key: None,
            reasoning_max_tokens: default_reasoning_max_tokens(),
            answer_max_tokens: default_answer_max_tokens(),
            reasoning_temperature: default_temperature(),
            answer_temperature: default_temperature(),
            timeout_seconds: default_provider_timeout(),
        }
    }
}

/// Google Custom Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the Custom Search API
    #[serde(default = "default_search_api_base")]
    pub api_base: String,

    /// API key; `GOOGLE_API_KEY` overrides it
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Search engine id; `GOOGLE_SEARCH_ENGINE_ID` overrides it
    #[serde(default)]
    pub engine_id: Option<String>,

    /// Maximum number of characters kept from a fetched page
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,

    /// Timeout for fetching the top result page (seconds)
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,

    /// User agent sent when fetching result pages
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_search_api_base() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_max_content_length() -> usize {
    3000
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_base: default_search_api_base(),
            api_key: None,
            engine_id: None,
            max_content_length: default_max_content_length(),
            fetch_timeout_seconds: default_fetch_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl SearchConfig {
    /// Returns `(api_key, engine_id)` when both are present and non-empty
    pub fn credentials(&self) -> Option<(String, String)> {
        let key = self.api_key.as_deref().filter(|k| !k.is_empty())?;
        let cx = self.engine_id.as_deref().filter(|c| !c.is_empty())?;
        Some((key.to_string(), cx.to_string()))
    }
}

/// Reasoning loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Number of recorded steps after which a final answer is demanded
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Hard cap on executed phases (reason + tool) per question
    #[serde(default = "default_recursion_limit")]
    pub recursion_limit: usize,

    /// Number of identical consecutive tool calls treated as a loop
    #[serde(default = "default_loop_window")]
    pub loop_window: usize,

    /// Maximum size of a tool observation in bytes
    #[serde(default = "default_max_output_size")]
    pub max_output_size: usize,
}

fn default_max_steps() -> usize {
    10
}

fn default_recursion_limit() -> usize {
    25
}

fn default_loop_window() -> usize {
    3
}

fn default_max_output_size() -> usize {
    16_384
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            recursion_limit: default_recursion_limit(),
            loop_window: default_loop_window(),
            max_output_size: default_max_output_size(),
        }
    }
}

/// Exponential backoff settings shared by the provider and search clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base of the exponential wait (seconds)
    #[serde(default = "default_multiplier")]
    pub multiplier_seconds: f64,

    /// Lower bound of a single wait (seconds)
    #[serde(default = "default_min_wait")]
    pub min_wait_seconds: f64,

    /// Upper bound of a single wait (seconds)
    #[serde(default = "default_max_wait")]
    pub max_wait_seconds: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_min_wait() -> f64 {
    2.0
}

fn default_max_wait() -> f64 {
    10.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            multiplier_seconds: default_multiplier(),
            min_wait_seconds: default_min_wait(),
            max_wait_seconds: default_max_wait(),
        }
    }
}

impl RetryConfig {
    /// Build the runtime retry policy from this configuration
    ///
    /// Values outside `[0, MAX_RETRY_WAIT_SECONDS]` are clamped; NaN is zero.
    pub fn policy(&self) -> crate::retry::RetryPolicy {
        crate::retry::RetryPolicy::new(
            self.max_attempts,
            wait_duration(self.multiplier_seconds),
            wait_duration(self.min_wait_seconds),
            wait_duration(self.max_wait_seconds),
        )
    }
}

fn wait_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds.clamp(0.0, MAX_RETRY_WAIT_SECONDS)).unwrap_or_default()
}

/// Parse an API base URL, accepting only http and https
///
/// # Errors
///
/// Returns `WebQaError::Config` naming `field` when the value is not an
/// absolute http(s) URL
pub fn parse_base_url(field: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value)
        .map_err(|e| WebQaError::Config(format!("{} is not a valid URL: {}", field, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(WebQaError::Config(format!(
            "{} must use http or https, got '{}'",
            field,
            url.scheme()
        ))
        .into());
    }
    Ok(url)
}

/// Join an endpoint path onto a base URL, keeping any path the base has
///
/// # Errors
///
/// Returns `WebQaError::Config` when the base is not a valid http(s) URL
pub fn endpoint_url(field: &str, base: &str, endpoint: &str) -> Result<Url> {
    parse_base_url(
        field,
        &format!("{}/{}", base.trim_end_matches('/'), endpoint.trim_start_matches('/')),
    )
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(WebQaError::from)
            .with_context(|| format!("Failed to read config file {}", path))?;
        let config = serde_yaml::from_str(&contents)
            .map_err(WebQaError::from)
            .with_context(|| format!("Failed to parse config file {}", path))?;
        Ok(config)
    }

    fn apply_env_vars(&mut self) {
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            self.provider.api_key = Some(key);
        }

        if let Ok(base) = std::env::var("ANTHROPIC_BASE_URL") {
            self.provider.api_base = base;
        }

        if let Ok(model) = std::env::var("WEBQA_MODEL") {
            self.provider.model = model;
        }

        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            self.search.api_key = Some(key);
        }

        if let Ok(cx) = std::env::var("GOOGLE_SEARCH_ENGINE_ID") {
            self.search.engine_id = Some(cx);
        }

        if let Ok(base) = std::env::var("WEBQA_SEARCH_BASE_URL") {
            self.search.api_base = base;
        }

        if let Ok(max_steps) = std::env::var("WEBQA_MAX_STEPS") {
            if let Ok(value) = max_steps.parse() {
                self.agent.max_steps = value;
            } else {
                tracing::warn!("Invalid WEBQA_MAX_STEPS: {}", max_steps);
            }
        }

        if let Ok(limit) = std::env::var("WEBQA_RECURSION_LIMIT") {
            if let Ok(value) = limit.parse() {
                self.agent.recursion_limit = value;
            } else {
                tracing::warn!("Invalid WEBQA_RECURSION_LIMIT: {}", limit);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(model) = &cli.model {
            self.provider.model = model.clone();
        }

        if let Some(max_steps) = cli.max_steps {
            self.agent.max_steps = max_steps;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        parse_base_url("provider.api_base", &self.provider.api_base)?;
        parse_base_url("search.api_base", &self.search.api_base)?;

        if self.provider.model.trim().is_empty() {
            return Err(WebQaError::Config("provider.model cannot be empty".to_string()).into());
        }

        if self.provider.reasoning_max_tokens == 0 || self.provider.answer_max_tokens == 0 {
            return Err(WebQaError::Config(
                "provider max_tokens values must be greater than 0".to_string(),
            )
            .into());
        }

        for (name, value) in [
            ("reasoning_temperature", self.provider.reasoning_temperature),
            ("answer_temperature", self.provider.answer_temperature),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(WebQaError::Config(format!(
                    "provider.{} must be between 0.0 and 1.0",
                    name
                ))
                .into());
            }
        }

        if self.provider.timeout_seconds == 0 {
            return Err(WebQaError::Config(
                "provider.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.search.max_content_length == 0 {
            return Err(WebQaError::Config(
                "search.max_content_length must be greater than 0".to_string(),
            )
            .into());
        }

        if self.agent.max_steps == 0 {
            return Err(
                WebQaError::Config("agent.max_steps must be greater than 0".to_string()).into(),
            );
        }

        if self.agent.recursion_limit == 0 {
            return Err(WebQaError::Config(
                "agent.recursion_limit must be greater than 0".to_string(),
            )
            .into());
        }

        if self.agent.loop_window < 2 {
            return Err(
                WebQaError::Config("agent.loop_window must be at least 2".to_string()).into(),
            );
        }

        if self.agent.max_output_size == 0 {
            return Err(WebQaError::Config(
                "agent.max_output_size must be greater than 0".to_string(),
            )
            .into());
        }

        if self.retry.max_attempts == 0 {
            return Err(
                WebQaError::Config("retry.max_attempts must be greater than 0".to_string()).into(),
            );
        }

        for (name, value) in [
            ("multiplier_seconds", self.retry.multiplier_seconds),
            ("min_wait_seconds", self.retry.min_wait_seconds),
            ("max_wait_seconds", self.retry.max_wait_seconds),
        ] {
            if !value.is_finite() || !(0.0..=MAX_RETRY_WAIT_SECONDS).contains(&value) {
                return Err(WebQaError::Config(format!(
                    "retry.{} must be between 0 and {} seconds",
                    name, MAX_RETRY_WAIT_SECONDS
                ))
                .into());
            }
        }

        if self.retry.min_wait_seconds > self.retry.max_wait_seconds {
            return Err(WebQaError::Config(
                "retry.min_wait_seconds cannot exceed retry.max_wait_seconds".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const ENV_VARS: &[&str] = &[
        "ANTHROPIC_API_KEY",
        "ANTHROPIC_BASE_URL",
        "WEBQA_MODEL",
        "GOOGLE_API_KEY",
        "GOOGLE_SEARCH_ENGINE_ID",
        "WEBQA_SEARCH_BASE_URL",
        "WEBQA_MAX_STEPS",
        "WEBQA_RECURSION_LIMIT",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.model, "claude-sonnet-4-20250514");
        assert_eq!(config.provider.reasoning_max_tokens, 500);
        assert_eq!(config.agent.max_steps, 10);
        assert_eq!(config.agent.recursion_limit, 25);
        assert_eq!(config.agent.loop_window, 3);
        assert_eq!(config.search.max_content_length, 3000);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_max_steps() {
        let mut config = Config::default();
        config.agent.max_steps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_loop_window_too_small() {
        let mut config = Config::default();
        config.agent.loop_window = 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("loop_window"));
    }

    #[test]
    fn test_config_validation_rejects_unusable_retry_waits() {
        for yaml in [
            "retry:\n  max_wait_seconds: 1.0e30\n",
            "retry:\n  max_wait_seconds: .inf\n",
            "retry:\n  multiplier_seconds: .nan\n",
            "retry:\n  min_wait_seconds: -1.0\n",
        ] {
            let config: Config = serde_yaml::from_str(yaml).unwrap();
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("retry."), "{}", yaml);
        }
    }

    #[test]
    fn test_retry_policy_clamps_out_of_range_waits() {
        let retry = RetryConfig {
            multiplier_seconds: f64::NAN,
            min_wait_seconds: 1.0e30,
            max_wait_seconds: f64::INFINITY,
            ..Default::default()
        };
        let policy = retry.policy();
        assert_eq!(
            policy.delay_for_attempt(1),
            Duration::from_secs_f64(MAX_RETRY_WAIT_SECONDS)
        );
    }

    #[test]
    fn test_config_validation_rejects_bad_base_urls() {
        let mut config = Config::default();
        config.provider.api_base = "not a url".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("provider.api_base"));

        let mut config = Config::default();
        config.search.api_base = "ftp://example.com".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("search.api_base must use http or https"));
    }

    #[test]
    fn test_endpoint_url_keeps_base_path() {
        let url = endpoint_url("f", "http://localhost:8080/proxy/", "/v1/messages").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/proxy/v1/messages");
    }

    #[test]
    fn test_config_validation_temperature_out_of_range() {
        let mut config = Config::default();
        config.provider.answer_temperature = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_retry_waits() {
        let mut config = Config::default();
        config.retry.min_wait_seconds = 20.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
provider:
  model: claude-3-haiku-20240307
  reasoning_max_tokens: 800
search:
  engine_id: abc123
  max_content_length: 5000
agent:
  max_steps: 6
  recursion_limit: 40
retry:
  max_attempts: 5
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider.model, "claude-3-haiku-20240307");
        assert_eq!(config.provider.reasoning_max_tokens, 800);
        assert_eq!(config.provider.answer_max_tokens, 1000);
        assert_eq!(config.search.engine_id.as_deref(), Some("abc123"));
        assert_eq!(config.search.max_content_length, 5000);
        assert_eq!(config.agent.max_steps, 6);
        assert_eq!(config.agent.recursion_limit, 40);
        assert_eq!(config.agent.loop_window, 3);
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_search_credentials_require_both_values() {
        let mut search = SearchConfig::default();
        assert!(search.credentials().is_none());
        search.api_key = Some("key".to_string());
        assert!(search.credentials().is_none());
        search.engine_id = Some(String::new());
        assert!(search.credentials().is_none());
        search.engine_id = Some("cx".to_string());
        assert_eq!(
            search.credentials(),
            Some(("key".to_string(), "cx".to_string()))
        );
    }

    #[test]
    fn test_api_keys_are_not_serialized() {
        let mut config = Config::default();
        config.provider.api_key = Some("sk-secret".to_string());
        config.search.api_key = Some("google-secret".to_string());
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("sk-secret"));
        assert!(!yaml.contains("google-secret"));
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        clear_env();
        let config = Config::load("nonexistent.yaml", &crate::cli::Cli::default()).unwrap();
        assert_eq!(config.provider.model, "claude-sonnet-4-20250514");
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    #[serial]
    fn test_env_overrides_file_and_cli_overrides_env() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "provider:\n  model: from-file\nagent:\n  max_steps: 3").unwrap();

        std::env::set_var("WEBQA_MODEL", "from-env");
        std::env::set_var("WEBQA_MAX_STEPS", "7");
        std::env::set_var("GOOGLE_API_KEY", "gkey");
        std::env::set_var("GOOGLE_SEARCH_ENGINE_ID", "gcx");

        let path = file.path().to_str().unwrap().to_string();
        let config = Config::load(&path, &crate::cli::Cli::default()).unwrap();
        assert_eq!(config.provider.model, "from-env");
        assert_eq!(config.agent.max_steps, 7);
        assert!(config.search.credentials().is_some());

        let cli = crate::cli::Cli {
            model: Some("from-cli".to_string()),
            max_steps: Some(2),
            ..Default::default()
        };
        let config = Config::load(&path, &cli).unwrap();
        assert_eq!(config.provider.model, "from-cli");
        assert_eq!(config.agent.max_steps, 2);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_env_number_is_ignored() {
        clear_env();
        std::env::set_var("WEBQA_RECURSION_LIMIT", "lots");
        let config = Config::load("nonexistent.yaml", &crate::cli::Cli::default()).unwrap();
        assert_eq!(config.agent.recursion_limit, 25);
        clear_env();
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "agent: [not, a, map").unwrap();
        let err = Config::load(file.path().to_str().unwrap(), &crate::cli::Cli::default())
            .unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
        assert!(matches!(
            err.downcast_ref::<WebQaError>(),
            Some(WebQaError::Yaml(_))
        ));
    }

    #[test]
    fn test_retry_policy_from_config() {
        let policy = RetryConfig::default().policy();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
    }
}
