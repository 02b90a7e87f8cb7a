use crate::text::{truncate, POST_LIMIT};
use crate::types::{FeedItem, Outgoing, Post};

/// Blog and long-form video items: the title with a link to the item.
pub fn build(items: &[FeedItem]) -> Vec<Outgoing> {
    items
        .iter()
        .map(|item| Outgoing::Post(Post::new(truncate(&item.title, POST_LIMIT)).with_link(&item.permalink_url)))
        .collect()
}
