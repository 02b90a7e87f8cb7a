use crate::config::Catalog;
use crate::entities::handle_or_name;
use crate::media::first_image_src;
use crate::text::{truncate, POST_LIMIT};
use crate::types::{Embed, External, FeedItem, LinkCard, MediaRef, Outgoing, Post};
use regex::Regex;
use std::sync::OnceLock;

fn trailing_tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[@#][\s@#A-Za-z0-9_'`’]*$").expect("valid trailing tag pattern"))
}

/// Drop the run of `@mention` and `#hashtag` tokens that ends a caption.
///
/// The run may contain plain words, so `"Text #foo Text @bar"` loses
/// everything from `#foo` on.
pub fn strip_trailing_tags(title: &str) -> String {
    trailing_tags().replace(title, "").into_owned()
}

/// Short-form video items become link cards carrying the caption and thumbnail.
pub fn build(items: &[FeedItem], catalog: &Catalog) -> Vec<Outgoing> {
    items.iter().map(|item| Outgoing::Post(card_post(item, catalog))).collect()
}

fn card_post(item: &FeedItem, catalog: &Catalog) -> Post {
    let caption = strip_trailing_tags(&item.title);
    let caption = catalog.entities.annotate(&caption, handle_or_name);
    let text = truncate(&caption, POST_LIMIT);

    let card = LinkCard {
        uri: item.permalink_url.clone(),
        title: text.clone(),
        description: catalog.video_description.clone(),
        thumb: first_image_src(&item.summary).map(|data| MediaRef { data }),
    };
    Post::new(text).with_embed(Some(Embed::External(External::Card(card))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;

    #[test]
    fn test_strip_trailing_tags() {
        assert_eq!(strip_trailing_tags("Text #hashtag @mention"), "Text ");
        assert_eq!(strip_trailing_tags("Text"), "Text");
        assert_eq!(strip_trailing_tags("Text @mention Text"), "Text ");
        assert_eq!(strip_trailing_tags("Ask @sam #fyp #dnd"), "Ask ");
        assert_eq!(strip_trailing_tags("Support #CriticalRole! today"), "Support #CriticalRole! today");
    }

    #[test]
    fn test_card_post_with_thumbnail() {
        let catalog = RelayConfig::default().compile().unwrap();
        let item = FeedItem {
            permalink_url: "https://www.tiktok.com/@critrole/video/1".to_string(),
            published: 1_700_000_000,
            summary: r#"<p><img class="thumb" src="https://example.com/thumb.jpg"></p>"#.to_string(),
            title: "Replaces @LauraBaileyVO w/ handle #dnd #criticalrole".to_string(),
        };

        let post = card_post(&item, &catalog);
        assert_eq!(post.text, "Replaces @laurabaileyvo.bsky.social w/ handle");
        assert_eq!(
            post.external(),
            Some(&External::Card(LinkCard {
                uri: "https://www.tiktok.com/@critrole/video/1".to_string(),
                title: "Replaces @laurabaileyvo.bsky.social w/ handle".to_string(),
                description: "TikTok video by Critical Role".to_string(),
                thumb: Some(MediaRef {
                    data: "https://example.com/thumb.jpg".to_string()
                }),
            }))
        );
    }

    #[test]
    fn test_card_post_without_thumbnail() {
        let catalog = RelayConfig::default().compile().unwrap();
        let item = FeedItem {
            permalink_url: "https://www.tiktok.com/@critrole/video/2".to_string(),
            published: 1_700_000_000,
            summary: String::new(),
            title: "Replaces @Marisha Ray641 w/ Marisha Ray.".to_string(),
        };

        let post = card_post(&item, &catalog);
        assert_eq!(post.text, "Replaces Marisha Ray w/ Marisha Ray.");
        match post.external() {
            Some(External::Card(card)) => assert!(card.thumb.is_none()),
            other => panic!("expected a link card, got {:?}", other),
        }
    }
}
