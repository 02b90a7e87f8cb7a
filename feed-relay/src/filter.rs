use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::debug;

/// Items published longer ago than this are stale.
pub const RECENCY_WINDOW_HOURS: i64 = 48;

/// Whole hours from `now` until `published`, rounded up. Negative for the past.
pub fn hours_until(published: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = published.signed_duration_since(now).num_milliseconds();
    (millis as f64 / 3_600_000.0).ceil() as i64
}

/// Published within the recency window, or at any time in the future.
pub fn is_recently_published(published: i64) -> bool {
    is_recent_at(published, Utc::now())
}

pub fn is_recent_at(published: i64, now: DateTime<Utc>) -> bool {
    match DateTime::from_timestamp(published, 0) {
        Some(published) => hours_until(published, now) >= -RECENCY_WINDOW_HOURS,
        None => {
            debug!("Publish timestamp {} is out of range", published);
            false
        }
    }
}

pub fn is_retweet_or_reply(title: &str) -> bool {
    title.starts_with("RT ") || title.starts_with("Re ")
}

#[derive(Debug, Clone)]
pub enum BlacklistEntry {
    Literal(String),
    Pattern(Regex),
}

impl BlacklistEntry {
    pub fn matches(&self, title: &str) -> bool {
        match self {
            BlacklistEntry::Literal(needle) => title.contains(needle.as_str()),
            BlacklistEntry::Pattern(pattern) => pattern.is_match(title),
        }
    }
}

/// Headline fragments and patterns that mark an item as unwanted.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    entries: Vec<BlacklistEntry>,
}

impl Blacklist {
    pub fn new(entries: Vec<BlacklistEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_blacklisted(&self, title: &str) -> bool {
        self.entries.iter().any(|entry| entry.matches(title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_hours_until() {
        let now = Utc::now();
        assert_eq!(hours_until(now + Duration::hours(13), now), 13);
        assert_eq!(hours_until(now - Duration::days(7), now), -7 * 24);
        assert_eq!(hours_until(now - Duration::minutes(90), now), -1);
    }

    #[test]
    fn test_recency_window() {
        let now = Utc::now();
        let hours_ago = |h: i64| (now - Duration::hours(h)).timestamp();

        assert!(is_recent_at(hours_ago(2), now));
        assert!(is_recent_at(hours_ago(48), now));
        assert!(!is_recent_at(hours_ago(49), now));
        assert!(!is_recent_at((now - Duration::days(3)).timestamp(), now));
        assert!(is_recent_at((now + Duration::hours(2)).timestamp(), now));
    }

    #[test]
    fn test_is_recently_published_uses_clock() {
        let now = Utc::now();
        assert!(is_recently_published((now + Duration::hours(2)).timestamp()));
        assert!(!is_recently_published((now - Duration::hours(49)).timestamp()));
    }

    #[test]
    fn test_retweet_or_reply() {
        assert!(is_retweet_or_reply("RT @handle Retweet"));
        assert!(is_retweet_or_reply("Re @handle Reply"));
        assert!(!is_retweet_or_reply("Regular post"));
        assert!(!is_retweet_or_reply("ART show tonight"));
    }

    #[test]
    fn test_blacklist_literal_and_pattern() {
        let blacklist = Blacklist::new(vec![
            BlacklistEntry::Literal(" - MSN".to_string()),
            BlacklistEntry::Pattern(Regex::new(r"(?i)\ba critical role\b").unwrap()),
        ]);

        assert!(blacklist.is_blacklisted("A post - MSN"));
        assert!(blacklist.is_blacklisted("Something played a Critical Role in something random"));
        assert!(!blacklist.is_blacklisted("A post w/ Critical Role"));
        assert!(!Blacklist::default().is_blacklisted("anything"));
    }
}
