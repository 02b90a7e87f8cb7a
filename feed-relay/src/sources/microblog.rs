use crate::config::Catalog;
use crate::entities::handle_or_name;
use crate::filter::{is_recent_at, is_retweet_or_reply};
use crate::media::extract_media;
use crate::text::{split, POST_LIMIT};
use crate::types::{FeedItem, HtmlRenderer, Outgoing, Post, Thread};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Microblog posts, re-threaded to fit the post limit.
pub fn build(items: &[FeedItem], catalog: &Catalog, renderer: &dyn HtmlRenderer, now: DateTime<Utc>) -> Vec<Outgoing> {
    items
        .iter()
        .filter(|item| {
            if is_retweet_or_reply(&item.title) {
                debug!("Skipping retweet or reply: {}", item.title);
                return false;
            }
            if !is_recent_at(item.published, now) {
                debug!("Skipping stale microblog item: {}", item.title);
                return false;
            }
            true
        })
        .filter_map(|item| thread_for(item, catalog, renderer))
        .collect()
}

fn thread_for(item: &FeedItem, catalog: &Catalog, renderer: &dyn HtmlRenderer) -> Option<Outgoing> {
    let rendered = renderer.render(&item.summary);
    let media = extract_media(&rendered);

    let text = format!("{}{}", catalog.microblog_tag, media.text);
    let text = text.trim_end_matches(['\n', '\r']);
    let text = catalog.entities.annotate(text, handle_or_name);
    if text.trim().is_empty() && media.embed.is_none() {
        debug!("Skipping microblog item with nothing to post: {}", item.permalink_url);
        return None;
    }

    let mut chunks = split(&text, POST_LIMIT).into_iter();
    let root = Post::new(chunks.next().unwrap_or_default()).with_embed(media.embed);
    if chunks.len() == 0 {
        Some(Outgoing::Post(root))
    } else {
        Some(Outgoing::Thread(Thread::new(root, chunks)))
    }
}
