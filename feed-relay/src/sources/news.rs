use crate::config::Catalog;
use crate::entities::decorated;
use crate::filter::is_recent_at;
use crate::text::{truncate, POST_LIMIT};
use crate::types::{FeedItem, Outgoing, Post};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

const HASHTAG: &str = "#CriticalRole";

fn show_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Critical Role('s|’s)?").expect("valid show name pattern"))
}

/// Items worth posting: recent and not blacklisted.
pub fn select<'a>(items: &'a [FeedItem], catalog: &Catalog, now: DateTime<Utc>) -> Vec<&'a FeedItem> {
    items
        .iter()
        .filter(|item| {
            if !is_recent_at(item.published, now) {
                debug!("Skipping stale news item: {}", item.title);
                return false;
            }
            if catalog.blacklist.is_blacklisted(&item.title) {
                debug!("Skipping blacklisted news item: {}", item.title);
                return false;
            }
            true
        })
        .collect()
}

/// Replace the first mention of the show with its hashtag, keeping a possessive.
pub fn mark_hashtag(title: &str) -> String {
    show_name().replace(title, format!("{}${{1}}", HASHTAG).as_str()).into_owned()
}

/// Headline text for a news item already pointed at its real destination.
pub fn compose(title: &str, resolved_url: &str, catalog: &Catalog) -> Outgoing {
    let text = mark_hashtag(title);
    let text = catalog.entities.annotate(&text, decorated);
    let text = catalog.news_sources.decorate_trailing(&text);
    Outgoing::Post(Post::new(truncate(&text, POST_LIMIT)).with_link(resolved_url))
}
