//! # Web Search Capability
//!
//! Instant-answer lookups against the DuckDuckGo API (no key required). The tool returns a
//! short summary plus a handful of related links, which is what an agent needs to ground a
//! reply. It never follows links or fetches full pages.
//!
//! ```rust,ignore
//! use agentcrew::tools::WebSearch;
//!
//! let search = WebSearch::new().with_max_results(3);
//! let result = search.search("Rust programming language").await?;
//! println!("{}", result);
//! ```

use crate::agentcrew::clients::http_pool::get_http_client;
use crate::agentcrew::tools::ToolError;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.duckduckgo.com/";
pub const DEFAULT_MAX_RESULTS: usize = 5;
/// Queries longer than this are rejected before any request is made.
pub const MAX_QUERY_LEN: usize = 256;

/// One related link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub text: String,
    pub url: String,
}

/// What a lookup produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct SearchResult {
    pub query: String,
    pub heading: Option<String>,
    /// Direct answer or abstract, whichever the API filled in.
    pub summary: Option<String>,
    pub source_url: Option<String>,
    pub related: Vec<SearchHit>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.related.is_empty()
    }

    /// Extract a result from an instant-answer JSON payload.
    pub fn parse_response(query: &str, body: &Value, max_results: usize) -> SearchResult {
        let text_field = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let summary = text_field("Answer")
            .or_else(|| text_field("AbstractText"))
            .or_else(|| text_field("Definition"));

        let mut related = Vec::new();
        if let Some(topics) = body.get("RelatedTopics").and_then(Value::as_array) {
            collect_hits(topics, max_results, &mut related);
        }

        SearchResult {
            query: query.to_string(),
            heading: text_field("Heading"),
            summary,
            source_url: text_field("AbstractURL"),
            related,
        }
    }
}

// Topics are either hits ({Text, FirstURL}) or groups ({Name, Topics: [...]}).
fn collect_hits(topics: &[Value], max_results: usize, out: &mut Vec<SearchHit>) {
    for topic in topics {
        if out.len() >= max_results {
            return;
        }
        if let Some(nested) = topic.get("Topics").and_then(Value::as_array) {
            collect_hits(nested, max_results, out);
            continue;
        }
        let text = topic.get("Text").and_then(Value::as_str);
        let url = topic.get("FirstURL").and_then(Value::as_str);
        if let (Some(text), Some(url)) = (text, url) {
            out.push(SearchHit {
                text: text.to_string(),
                url: url.to_string(),
            });
        }
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "No results for '{}'.", self.query);
        }
        if let Some(heading) = &self.heading {
            writeln!(f, "{}", heading)?;
        }
        if let Some(summary) = &self.summary {
            writeln!(f, "{}", summary)?;
        }
        if let Some(url) = &self.source_url {
            writeln!(f, "Source: {}", url)?;
        }
        for hit in &self.related {
            writeln!(f, "- {} ({})", hit.text, hit.url)?;
        }
        Ok(())
    }
}

/// Instant-answer search client.
#[derive(Debug, Clone)]
pub struct WebSearch {
    endpoint: String,
    max_results: usize,
}

impl Default for WebSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSearch {
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Point at a compatible endpoint (a mirror, or a local stub in tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn search(&self, query: &str) -> Result<SearchResult, ToolError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ToolError::invalid("web_search", "query must not be empty"));
        }
        if query.len() > MAX_QUERY_LEN {
            return Err(ToolError::invalid(
                "web_search",
                format!("query longer than {} characters", MAX_QUERY_LEN),
            ));
        }

        log::debug!("agentcrew::web_search: querying '{}'", query);
        let client = get_http_client(&self.endpoint);
        let response = client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| ToolError::Search(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Search(format!("search endpoint returned {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ToolError::Search(format!("undecodable search response: {}", e)))?;

        Ok(SearchResult::parse_response(query, &body, self.max_results))
    }
}
