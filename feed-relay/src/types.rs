use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
// Use the interfaces crate for core types
pub use interfaces::defs::{
    Embed, External, FeedItem, HtmlRenderer, LinkCard, LinkResolver, MediaRef, Outgoing, Post,
    PostRef, Publisher, Thread,
};

/// Settings for the redirect decoder's outbound HTTP calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Per-request timeout for every scrape and RPC call.
    pub timeout_seconds: u64,
    /// Overall budget for resolving one link during a batch fan-out.
    pub resolve_timeout_seconds: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: "https://news.google.com".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36".to_string(),
            timeout_seconds: 10,
            resolve_timeout_seconds: 25,
        }
    }
}

/// Upstream feed flavours, one per webhook endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Blog,
    Youtube,
    Tiktok,
    News,
    Twitter,
}

impl SourceKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            SourceKind::Blog => "/blog",
            SourceKind::Youtube => "/youtube",
            SourceKind::Tiktok => "/tiktok",
            SourceKind::News => "/news",
            SourceKind::Twitter => "/twitter",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The batch produced nothing to publish. Not an error.
    NothingToPost,
    Published { posted: usize, skipped: usize },
}

/// Pull the `items` array out of a webhook body.
///
/// A body without `items` is a caller error. Individual entries that do not
/// deserialize are logged and skipped so one bad item never sinks the batch.
pub fn parse_items(body: &Value) -> Result<Vec<FeedItem>> {
    let entries = body
        .get("items")
        .and_then(Value::as_array)
        .ok_or(RelayError::MissingField("items"))?;

    let mut items = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match serde_json::from_value::<FeedItem>(entry.clone()) {
            Ok(item) => items.push(item),
            Err(e) => warn!("Skipping malformed feed item at index {}: {}", index, e),
        }
    }
    Ok(items)
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid blacklist pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Publish failed: {0}")]
    Publish(#[source] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RelayError>;
