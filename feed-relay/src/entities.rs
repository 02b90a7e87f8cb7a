use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A known person or organization that gets a handle when mentioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub canonical_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bsky_handle: Option<String>,
    #[serde(default)]
    pub platform_aliases: PlatformAliases,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformAliases {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiktok: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
}

impl Entity {
    pub fn new(canonical_name: &str) -> Self {
        Self {
            canonical_name: canonical_name.to_string(),
            bsky_handle: None,
            platform_aliases: PlatformAliases::default(),
        }
    }

    pub fn with_handle(mut self, handle: &str) -> Self {
        self.bsky_handle = Some(handle.to_string());
        self
    }

    pub fn with_tiktok(mut self, alias: &str) -> Self {
        self.platform_aliases.tiktok = Some(alias.to_string());
        self
    }

    pub fn with_twitter(mut self, alias: &str) -> Self {
        self.platform_aliases.twitter = Some(alias.to_string());
        self
    }

    fn spellings(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical_name.as_str())
            .chain(self.platform_aliases.tiktok.as_deref())
            .chain(self.platform_aliases.twitter.as_deref())
    }
}

/// Renders the first mention of an entity.
pub type Formatter = fn(&Entity) -> String;

/// `"Name (handle)"`, or just the name when there is no handle.
pub fn decorated(entity: &Entity) -> String {
    match &entity.bsky_handle {
        Some(handle) => format!("{} ({})", entity.canonical_name, handle),
        None => entity.canonical_name.clone(),
    }
}

/// The handle in place of the mention, or the name when there is no handle.
pub fn handle_or_name(entity: &Entity) -> String {
    entity
        .bsky_handle
        .clone()
        .unwrap_or_else(|| entity.canonical_name.clone())
}

/// Finds entity mentions by name or platform alias.
///
/// Every spelling is matched case-insensitively. At each position the longest
/// spelling wins, and a match directly followed by `.` and a word character is
/// rejected so `@someone` never matches inside `@someone.bsky.social`.
pub struct EntityMatcher {
    entities: Vec<Entity>,
    // (spelling, owning entity index), longest first
    table: Vec<(Vec<char>, usize)>,
}

impl EntityMatcher {
    pub fn new(entities: Vec<Entity>) -> Self {
        let mut table: Vec<(Vec<char>, usize)> = Vec::new();
        for (index, entity) in entities.iter().enumerate() {
            for spelling in entity.spellings() {
                let chars: Vec<char> = spelling.chars().collect();
                if chars.is_empty() {
                    continue;
                }
                let duplicate = table
                    .iter()
                    .any(|(existing, owner)| *owner == index && same_ignoring_case(existing, &chars));
                if !duplicate {
                    table.push((chars, index));
                }
            }
        }
        table.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        debug!("Built entity matcher with {} spellings for {} entities", table.len(), entities.len());
        Self { entities, table }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Case-insensitive lookup by canonical name or alias.
    pub fn find(&self, spelling: &str) -> Option<&Entity> {
        let chars: Vec<char> = spelling.chars().collect();
        self.table
            .iter()
            .find(|(candidate, _)| same_ignoring_case(candidate, &chars))
            .map(|(_, index)| &self.entities[*index])
    }

    /// Replace the first mention of each entity with `formatter(entity)` and
    /// any later mention of the same entity with its bare canonical name.
    pub fn annotate(&self, text: &str, formatter: Formatter) -> String {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut decorated = vec![false; self.entities.len()];
        let mut output = String::with_capacity(text.len());
        let mut copied_to = 0;
        let mut position = 0;

        while position < chars.len() {
            let Some((length, index)) = self.match_at(&chars, position) else {
                position += 1;
                continue;
            };

            let start = chars[position].0;
            let end = chars.get(position + length).map(|(byte, _)| *byte).unwrap_or(text.len());
            output.push_str(&text[copied_to..start]);

            let entity = &self.entities[index];
            if decorated[index] {
                output.push_str(&entity.canonical_name);
            } else {
                output.push_str(&formatter(entity));
                decorated[index] = true;
            }

            copied_to = end;
            position += length;
        }

        output.push_str(&text[copied_to..]);
        output
    }

    fn match_at(&self, chars: &[(usize, char)], position: usize) -> Option<(usize, usize)> {
        self.table.iter().find_map(|(spelling, index)| {
            let end = position + spelling.len();
            if end > chars.len() {
                return None;
            }
            let matches = chars[position..end]
                .iter()
                .zip(spelling)
                .all(|((_, a), b)| chars_eq_ignoring_case(*a, *b));
            if !matches || continues_as_domain(chars, end) {
                return None;
            }
            Some((spelling.len(), *index))
        })
    }
}

/// Publication labels that end news headlines, e.g. `"... - Variety"`.
pub struct NewsSources {
    // (label, handle), longest label first
    labels: Vec<(String, String)>,
}

impl NewsSources {
    pub fn new(sources: &BTreeMap<String, String>) -> Self {
        let mut labels: Vec<(String, String)> = sources
            .iter()
            .filter(|(label, _)| !label.is_empty())
            .map(|(label, handle)| (label.clone(), handle.clone()))
            .collect();
        labels.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        Self { labels }
    }

    pub fn handle_for(&self, label: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(candidate, _)| candidate == label)
            .map(|(_, handle)| handle.as_str())
    }

    /// Append `" (handle)"` when the text ends with a known label.
    pub fn decorate_trailing(&self, text: &str) -> String {
        let trimmed = text.trim_end();
        for (label, handle) in &self.labels {
            if trimmed.ends_with(label.as_str()) {
                return format!("{} ({})", trimmed, handle);
            }
        }
        text.to_string()
    }
}

fn chars_eq_ignoring_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn same_ignoring_case(a: &[char], b: &[char]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| chars_eq_ignoring_case(*x, *y))
}

fn continues_as_domain(chars: &[(usize, char)], end: usize) -> bool {
    match (chars.get(end), chars.get(end + 1)) {
        (Some((_, '.')), Some((_, next))) => next.is_alphanumeric() || *next == '_',
        _ => false,
    }
}
