//! Web search tool backed by the Google Custom Search API
//!
//! The search itself is one JSON request for the top hit. The hit's page is
//! then fetched and reduced to plain text; when the page cannot be fetched
//! the search snippet is used instead.

use crate::config::{endpoint_url, SearchConfig};
use crate::error::{Result, WebQaError};
use crate::retry::{retry_async, RetryPolicy};
use crate::tools::{string_arg, ToolExecutor, ToolResult};

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use url::Url;

/// Top search hit with its extracted page text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    /// Page title reported by the search engine
    pub title: String,
    /// Page URL
    pub url: String,
    /// Cleaned page text, or the search snippet as a fallback
    pub content: String,
}

/// A web search backend
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Search for `query` and extract the content of the top result
    async fn search_and_extract(&self, query: &str) -> Result<SearchResult>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: Option<String>,
}

/// Google Custom Search client
pub struct GoogleSearchClient {
    client: Client,
    search_url: Url,
    page_client: Client,
    config: SearchConfig,
    api_key: String,
    engine_id: String,
    retry: RetryPolicy,
}

impl GoogleSearchClient {
    /// Create a new search client
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` when the API key or engine id is
    /// absent, or a search error if the HTTP clients cannot be built
    pub fn new(config: SearchConfig, retry: RetryPolicy) -> Result<Self> {
        let (api_key, engine_id) = config.credentials().ok_or_else(|| {
            WebQaError::MissingCredentials("GOOGLE_API_KEY / GOOGLE_SEARCH_ENGINE_ID".to_string())
        })?;

        let search_url = endpoint_url("search.api_base", &config.api_base, "customsearch/v1")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WebQaError::Search(format!("Failed to create HTTP client: {}", e)))?;

        let page_client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| WebQaError::Search(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            search_url,
            page_client,
            config,
            api_key,
            engine_id,
            retry,
        })
    }

    async fn top_item(
        &self,
        query: &str,
    ) -> std::result::Result<Option<SearchItem>, reqwest::Error> {
        let response: SearchResponse = self
            .client
            .get(self.search_url.clone())
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::debug!("Search for '{}' returned {} items", query, response.items.len());

        Ok(response.items.into_iter().next())
    }

    async fn fetch_page_text(&self, url: &str) -> std::result::Result<String, reqwest::Error> {
        let html = self
            .page_client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(truncate_chars(
            &extract_text(&html),
            self.config.max_content_length,
        ))
    }
}

/// Rate limits, server errors, and transport failures are worth retrying
fn is_transient(error: &reqwest::Error) -> bool {
    match error.status() {
        Some(status) => status.as_u16() == 429 || status.is_server_error(),
        None => error.is_timeout() || error.is_connect() || error.is_request(),
    }
}

#[async_trait]
impl SearchBackend for GoogleSearchClient {
    async fn search_and_extract(&self, query: &str) -> Result<SearchResult> {
        let item = retry_async(&self.retry, "Google search", is_transient, || {
            self.top_item(query)
        })
        .await
        .map_err(|e| WebQaError::Search(format!("search request failed: {}", e)))?;

        let Some(item) = item else {
            return Err(WebQaError::Search(format!(
                "No Google search results found for query: {}",
                query
            ))
            .into());
        };

        let content = match self.fetch_page_text(&item.link).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    "Failed to extract content from {}: {}; using snippet",
                    item.link,
                    e
                );
                item.snippet
                    .clone()
                    .unwrap_or_else(|| "Content extraction failed".to_string())
            }
        };

        Ok(SearchResult {
            title: item.title,
            url: item.link,
            content,
        })
    }
}

fn script_or_style() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>|<!--.*?-->")
            .expect("script regex is valid")
    })
}

fn html_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag regex is valid"))
}

fn html_entity() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("entity regex is valid")
    })
}

fn decode_entity(entity: &str) -> Option<String> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        return u32::from_str_radix(hex, 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from);
    }
    if let Some(dec) = entity.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32).map(String::from);
    }
    let decoded = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "hellip" => "\u{2026}",
        "copy" => "\u{a9}",
        _ => return None,
    };
    Some(decoded.to_string())
}

/// Reduce an HTML document to whitespace-normalized plain text
///
/// Scripts, styles, and comments are dropped, tags removed, and common
/// entities decoded. Each line is trimmed and split on runs of two spaces;
/// the non-empty pieces are joined with single spaces.
pub fn extract_text(html: &str) -> String {
    let without_scripts = script_or_style().replace_all(html, "");
    let without_tags = html_tag().replace_all(&without_scripts, "");
    let decoded = html_entity().replace_all(&without_tags, |caps: &regex::Captures<'_>| {
        decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    });

    decoded
        .lines()
        .map(str::trim)
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep at most `max_chars` characters, marking a cut with `...`
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Tool for searching the web
pub struct WebSearchTool {
    backend: Arc<dyn SearchBackend>,
}

impl WebSearchTool {
    /// Create a web search tool over the given backend
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ToolExecutor for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Searches the web for current information. Use for facts, news, general knowledge, and any questions requiring up-to-date information from the internet."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let Some(query) = string_arg(&args, "query") else {
            return Ok(ToolResult::error(
                "Could not search the web. missing required argument 'query'",
            ));
        };

        tracing::info!("Searching the web for '{}'", query);
        match self.backend.search_and_extract(query).await {
            Ok(result) => Ok(ToolResult::success(format!(
                "Found information from {}:\n\n{}",
                result.title, result.content
            ))),
            Err(e) => {
                tracing::warn!("Web search failed: {}", e);
                Ok(ToolResult::error(format!("Could not search the web. {}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> SearchConfig {
        SearchConfig {
            api_base: server.uri(),
            api_key: Some("g-key".to_string()),
            engine_id: Some("engine".to_string()),
            max_content_length: 40,
            ..Default::default()
        }
    }

    fn search_body(server: &MockServer, page: &str) -> serde_json::Value {
        serde_json::json!({
            "items": [{
                "title": "Example Page",
                "link": format!("{}{}", server.uri(), page),
                "snippet": "A short snippet"
            }]
        })
    }

    #[test]
    fn test_extract_text_strips_markup() {
        let html = "<html><head><style>p { color: red; }</style>\
                    <script>var x = 1;</script></head>\
                    <body><h1>Title</h1>\n<p>Fish &amp; chips   cost &#163;5</p><!-- hidden --></body></html>";
        assert_eq!(extract_text(html), "Title Fish & chips cost \u{a3}5");
    }

    #[test]
    fn test_extract_text_keeps_unknown_entities() {
        assert_eq!(extract_text("a &bogus; b"), "a &bogus; b");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("ééé", 2), "éé...");
    }

    #[test]
    fn test_new_requires_credentials() {
        let err = GoogleSearchClient::new(SearchConfig::default(), RetryPolicy::none())
            .err()
            .unwrap();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_new_rejects_invalid_api_base() {
        let config = SearchConfig {
            api_base: "::not a url::".to_string(),
            api_key: Some("g-key".to_string()),
            engine_id: Some("engine".to_string()),
            ..Default::default()
        };
        let err = GoogleSearchClient::new(config, RetryPolicy::none())
            .err()
            .unwrap();
        assert!(err.to_string().contains("search.api_base"));
    }

    #[tokio::test]
    async fn test_search_fetches_top_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .and(query_param("key", "g-key"))
            .and(query_param("cx", "engine"))
            .and(query_param("q", "rust language"))
            .and(query_param("num", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&server, "/page")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body><p>Rust is a systems programming language focused on safety.</p></body></html>",
            ))
            .mount(&server)
            .await;

        let client = GoogleSearchClient::new(config_for(&server), RetryPolicy::none()).unwrap();
        let result = client.search_and_extract("rust language").await.unwrap();

        assert_eq!(result.title, "Example Page");
        assert!(result.url.ends_with("/page"));
        assert_eq!(result.content, "Rust is a systems programming language f...");
    }

    #[tokio::test]
    async fn test_search_falls_back_to_snippet() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&server, "/gone")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = GoogleSearchClient::new(config_for(&server), RetryPolicy::none()).unwrap();
        let result = client.search_and_extract("anything").await.unwrap();
        assert_eq!(result.content, "A short snippet");
    }

    #[tokio::test]
    async fn test_search_without_results_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "searchInformation": {"totalResults": "0"}
            })))
            .mount(&server)
            .await;

        let client = GoogleSearchClient::new(config_for(&server), RetryPolicy::none()).unwrap();
        let err = client.search_and_extract("zzqx").await.unwrap_err();
        assert!(err
            .to_string()
            .contains("No Google search results found for query: zzqx"));
    }

    #[tokio::test]
    async fn test_search_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&server, "/missing")))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            GoogleSearchClient::new(config_for(&server), RetryPolicy::immediate(3)).unwrap();
        let result = client.search_and_extract("retry me").await.unwrap();
        assert_eq!(result.title, "Example Page");
    }

    #[tokio::test]
    async fn test_search_does_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            GoogleSearchClient::new(config_for(&server), RetryPolicy::immediate(3)).unwrap();
        assert!(client.search_and_extract("forbidden").await.is_err());
    }

    struct StaticBackend(std::result::Result<SearchResult, String>);

    #[async_trait]
    impl SearchBackend for StaticBackend {
        async fn search_and_extract(&self, _query: &str) -> Result<SearchResult> {
            self.0
                .clone()
                .map_err(|e| WebQaError::Search(e).into())
        }
    }

    #[tokio::test]
    async fn test_tool_formats_result() {
        let tool = WebSearchTool::new(Arc::new(StaticBackend(Ok(SearchResult {
            title: "Paris - Wikipedia".to_string(),
            url: "https://example.org".to_string(),
            content: "Paris is the capital of France.".to_string(),
        }))));
        let result = tool
            .execute(serde_json::json!({"query": "capital of France"}))
            .await
            .unwrap();
        assert_eq!(
            result.to_message(),
            "Found information from Paris - Wikipedia:\n\nParis is the capital of France."
        );
    }

    #[tokio::test]
    async fn test_tool_reports_failure_as_observation() {
        let tool = WebSearchTool::new(Arc::new(StaticBackend(Err("quota exceeded".to_string()))));
        let result = tool
            .execute(serde_json::json!({"query": "anything"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result
            .to_message()
            .starts_with("Error: Could not search the web."));
        assert!(result.to_message().contains("quota exceeded"));
    }
}
