//! Tool registry builder
//!
//! Assembles the agent's tool set from configuration. The clock and the
//! search backend can be swapped out, which is how tests get deterministic
//! dates and offline search.

use std::sync::Arc;

use crate::config::Config;
use crate::tools::web_search::{GoogleSearchClient, SearchBackend};
use crate::tools::{
    CalculatorTool, Clock, DateCalculatorTool, DateTimeTool, SystemClock, ToolRegistry,
    WebSearchTool,
};

/// Builder for the agent's tool registry
///
/// # Examples
///
/// ```
/// use webqa::config::Config;
/// use webqa::tools::registry_builder::ToolRegistryBuilder;
///
/// let registry = ToolRegistryBuilder::new(&Config::default()).build();
/// // No Google credentials in the default config, so web_search is skipped
/// assert_eq!(registry.names(), vec!["calculator", "datetime", "datecalculator"]);
/// ```
pub struct ToolRegistryBuilder<'a> {
    config: &'a Config,
    clock: Arc<dyn Clock>,
    search_backend: Option<Arc<dyn SearchBackend>>,
}

impl<'a> ToolRegistryBuilder<'a> {
    /// Create a builder using the system clock and Google search
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            search_backend: None,
        }
    }

    /// Use the given clock for the date tools
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use the given backend for web search instead of Google
    pub fn with_search_backend(mut self, backend: Arc<dyn SearchBackend>) -> Self {
        self.search_backend = Some(backend);
        self
    }

    fn search_backend(&self) -> Option<Arc<dyn SearchBackend>> {
        if let Some(backend) = &self.search_backend {
            return Some(Arc::clone(backend));
        }
        match GoogleSearchClient::new(self.config.search.clone(), self.config.retry.policy()) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!("web_search tool disabled: {}", e);
                None
            }
        }
    }

    /// Build the registry
    ///
    /// Registers calculator, datetime, datecalculator, and web_search, in
    /// that order. web_search is left out when no backend is available.
    pub fn build(&self) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CalculatorTool::new()));
        registry.register(Arc::new(DateTimeTool::new(Arc::clone(&self.clock))));
        registry.register(Arc::new(DateCalculatorTool::new(Arc::clone(&self.clock))));

        if let Some(backend) = self.search_backend() {
            registry.register(Arc::new(WebSearchTool::new(backend)));
        }

        tracing::debug!("Registered tools: {:?}", registry.names());
        registry
    }
}

/// Build the default tool registry for a configuration
pub fn build_default_registry(config: &Config) -> ToolRegistry {
    ToolRegistryBuilder::new(config).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::tools::web_search::SearchResult;
    use crate::tools::FixedClock;
    use async_trait::async_trait;

    struct NoSearch;

    #[async_trait]
    impl SearchBackend for NoSearch {
        async fn search_and_extract(&self, query: &str) -> Result<SearchResult> {
            Ok(SearchResult {
                title: "stub".to_string(),
                url: String::new(),
                content: query.to_string(),
            })
        }
    }

    #[test]
    fn test_default_registry_without_credentials_skips_search() {
        let registry = build_default_registry(&Config::default());
        assert_eq!(
            registry.names(),
            vec!["calculator", "datetime", "datecalculator"]
        );
    }

    #[test]
    fn test_registry_with_credentials_includes_search() {
        let mut config = Config::default();
        config.search.api_key = Some("key".to_string());
        config.search.engine_id = Some("cx".to_string());
        let registry = build_default_registry(&config);
        assert_eq!(registry.len(), 4);
        assert!(registry.get("web_search").is_some());
    }

    #[test]
    fn test_builder_with_custom_backend() {
        let config = Config::default();
        let registry = ToolRegistryBuilder::new(&config)
            .with_search_backend(Arc::new(NoSearch))
            .build();
        assert_eq!(
            registry.names(),
            vec!["calculator", "datetime", "datecalculator", "web_search"]
        );
    }

    #[tokio::test]
    async fn test_builder_clock_reaches_date_tools() {
        let config = Config::default();
        let clock = FixedClock::parse("2030-01-01T00:00:00+00:00").unwrap();
        let registry = ToolRegistryBuilder::new(&config)
            .with_clock(Arc::new(clock))
            .build();
        let tool = registry.get("datecalculator").unwrap();
        let result = tool.execute(serde_json::json!({})).await.unwrap();
        assert_eq!(result.output, "Today is Tuesday, January 01, 2030");
    }
}
