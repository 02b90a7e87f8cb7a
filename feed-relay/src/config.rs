use crate::entities::{Entity, EntityMatcher, NewsSources};
use crate::filter::{Blacklist, BlacklistEntry};
use crate::types::{RelayError, ResolverConfig, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use tracing::info;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "FEED_RELAY_CONFIG";

/// A blacklist entry as written in the config file: a bare string is a
/// literal substring, `{ "pattern": "..." }` is a regular expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlacklistRule {
    Literal(String),
    Pattern { pattern: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub entities: Vec<Entity>,
    /// Trailing headline label -> handle.
    pub news_sources: BTreeMap<String, String>,
    pub blacklist: Vec<BlacklistRule>,
    /// Prefix put in front of every microblog post.
    pub microblog_tag: String,
    /// Description on short-form video link cards.
    pub video_description: String,
    pub resolver: ResolverConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            entities: default_entities(),
            news_sources: default_news_sources(),
            blacklist: default_blacklist(),
            microblog_tag: "🐦 ".to_string(),
            video_description: "TikTok video by Critical Role".to_string(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl RelayConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: RelayConfig = serde_json::from_str(&raw)?;
        info!(
            "Loaded config from {} ({} entities, {} news sources, {} blacklist rules)",
            path.display(),
            config.entities.len(),
            config.news_sources.len(),
            config.blacklist.len()
        );
        Ok(config)
    }

    /// Load the file named by `FEED_RELAY_CONFIG`, or fall back to the built-in tables.
    pub fn from_env() -> Result<Self> {
        match env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Validate and build the lookup structures the pipelines run on.
    pub fn compile(&self) -> Result<Catalog> {
        if let Some(position) = self.entities.iter().position(|e| e.canonical_name.trim().is_empty()) {
            return Err(RelayError::Config(format!("entity #{} has an empty canonical_name", position)));
        }
        if self.resolver.timeout_seconds == 0 || self.resolver.resolve_timeout_seconds == 0 {
            return Err(RelayError::Config("resolver timeouts must be positive".to_string()));
        }

        let mut entries = Vec::with_capacity(self.blacklist.len());
        for rule in &self.blacklist {
            entries.push(match rule {
                BlacklistRule::Literal(text) => BlacklistEntry::Literal(text.clone()),
                BlacklistRule::Pattern { pattern } => BlacklistEntry::Pattern(Regex::new(pattern)?),
            });
        }

        Ok(Catalog {
            entities: EntityMatcher::new(self.entities.clone()),
            news_sources: NewsSources::new(&self.news_sources),
            blacklist: Blacklist::new(entries),
            microblog_tag: self.microblog_tag.clone(),
            video_description: self.video_description.clone(),
        })
    }
}

/// Compiled, read-only tables shared by every pipeline run.
pub struct Catalog {
    pub entities: EntityMatcher,
    pub news_sources: NewsSources,
    pub blacklist: Blacklist,
    pub microblog_tag: String,
    pub video_description: String,
}

fn default_entities() -> Vec<Entity> {
    vec![
        Entity::new("Matthew Mercer")
            .with_handle("@matthewmercer.bsky.social")
            .with_twitter("@matthewmercer"),
        Entity::new("Laura Bailey")
            .with_handle("@laurabaileyvo.bsky.social")
            .with_tiktok("@LauraBaileyVO")
            .with_twitter("@LauraBaileyVO"),
        Entity::new("Marisha Ray")
            .with_tiktok("@Marisha Ray641")
            .with_twitter("@Marisha_Ray"),
        Entity::new("Brennan Lee Mulligan")
            .with_handle("@brennanleemulligan.bsky.social")
            .with_twitter("@BrennanLM"),
        Entity::new("Travis Willingham").with_twitter("@WillingBlam"),
        Entity::new("Sam Riegel").with_twitter("@samriegel"),
        Entity::new("Taliesin Jaffe").with_twitter("@executivegoth"),
        Entity::new("Liam O'Brien").with_twitter("@VoiceOfOBrien"),
        Entity::new("Ashley Johnson").with_twitter("@TheVulcanSalute"),
    ]
}

fn default_news_sources() -> BTreeMap<String, String> {
    [
        ("Variety", "@variety.com"),
        ("Polygon", "@polygon.com"),
        ("The Hollywood Reporter", "@hollywoodreporter.com"),
        ("Deadline", "@deadline.com"),
        ("GamesRadar+", "@gamesradar.com"),
    ]
    .into_iter()
    .map(|(label, handle)| (label.to_string(), handle.to_string()))
    .collect()
}

fn default_blacklist() -> Vec<BlacklistRule> {
    vec![
        BlacklistRule::Literal(" - MSN".to_string()),
        BlacklistRule::Literal(" - Yahoo Entertainment".to_string()),
        // lowercase use is the phrase, not the show
        BlacklistRule::Pattern {
            pattern: r"\bcritical role\b".to_string(),
        },
        BlacklistRule::Pattern {
            pattern: r"(?i)\bplay(?:s|ed|ing)? a critical role\b".to_string(),
        },
        BlacklistRule::Pattern {
            pattern: r"(?i)\ba critical role (?:in|for|on)\b".to_string(),
        },
    ]
}
