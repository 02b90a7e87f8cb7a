use crate::config::{Catalog, RelayConfig};
use crate::render::MarkerRenderer;
use crate::resolver::GoogleNewsResolver;
use crate::sources::{generic, microblog, news, short_video};
use crate::types::{FeedItem, HtmlRenderer, LinkResolver, Outgoing, Result, SourceKind};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Turns a batch of feed items of one kind into outgoing payloads, in item order.
pub struct FeedPipeline {
    catalog: Arc<Catalog>,
    resolver: Arc<dyn LinkResolver>,
    renderer: Arc<dyn HtmlRenderer>,
    resolve_timeout: Duration,
}

impl FeedPipeline {
    pub fn new(
        catalog: Arc<Catalog>,
        resolver: Arc<dyn LinkResolver>,
        renderer: Arc<dyn HtmlRenderer>,
        resolve_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            resolver,
            renderer,
            resolve_timeout,
        }
    }

    /// Production wiring: the news redirect decoder and the marker renderer.
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let catalog = Arc::new(config.compile()?);
        let resolver = Arc::new(GoogleNewsResolver::new(&config.resolver)?);
        Ok(Self::new(
            catalog,
            resolver,
            Arc::new(MarkerRenderer),
            Duration::from_secs(config.resolver.resolve_timeout_seconds),
        ))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn process(&self, kind: SourceKind, items: &[FeedItem]) -> Vec<Outgoing> {
        let outgoing = match kind {
            SourceKind::Blog | SourceKind::Youtube => self.generic(items),
            SourceKind::Tiktok => self.short_video(items),
            SourceKind::News => self.news(items).await,
            SourceKind::Twitter => self.microblog(items),
        };
        info!(
            "Pipeline {} turned {} items into {} payloads",
            kind.endpoint(),
            items.len(),
            outgoing.len()
        );
        outgoing
    }

    pub fn generic(&self, items: &[FeedItem]) -> Vec<Outgoing> {
        generic::build(items)
    }

    pub fn short_video(&self, items: &[FeedItem]) -> Vec<Outgoing> {
        short_video::build(items, &self.catalog)
    }

    pub fn microblog(&self, items: &[FeedItem]) -> Vec<Outgoing> {
        microblog::build(items, &self.catalog, self.renderer.as_ref(), Utc::now())
    }

    pub async fn news(&self, items: &[FeedItem]) -> Vec<Outgoing> {
        let selected = news::select(items, &self.catalog, Utc::now());
        let urls: Vec<&str> = selected.iter().map(|item| item.permalink_url.as_str()).collect();
        let resolved = self.resolve_all(&urls).await;

        selected
            .iter()
            .zip(resolved)
            .map(|(item, url)| news::compose(&item.title, &url, &self.catalog))
            .collect()
    }

    /// Resolve every link concurrently. The result at index `i` belongs to
    /// `urls[i]`; a link that times out keeps its original value.
    async fn resolve_all(&self, urls: &[&str]) -> Vec<String> {
        let lookups = urls.iter().map(|url| async move {
            match tokio::time::timeout(self.resolve_timeout, self.resolver.resolve(url)).await {
                Ok(resolved) => resolved,
                Err(_) => {
                    warn!("Resolving {} timed out after {:?}", url, self.resolve_timeout);
                    url.to_string()
                }
            }
        });
        join_all(lookups).await
    }
}
