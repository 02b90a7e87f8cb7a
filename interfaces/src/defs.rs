use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

/// One syndicated unit as delivered by the upstream aggregator webhook.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub permalink_url: String,
    /// Unix seconds. Fractional values are floored.
    #[serde(deserialize_with = "unix_seconds")]
    pub published: i64,
    #[serde(default)]
    pub summary: String,
    pub title: String,
}

fn unix_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    let seconds = f64::deserialize(deserializer)?;
    if !seconds.is_finite() {
        return Err(serde::de::Error::custom("published must be a finite number"));
    }
    Ok(seconds.floor() as i64)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub data: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCard {
    pub uri: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb: Option<MediaRef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum External {
    Url(String),
    Card(LinkCard),
}

/// Attachment of a post. A post carries at most one of these.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Embed {
    External(External),
    Images(Vec<MediaRef>),
    Video(MediaRef),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Post {
    pub text: String,
    #[serde(flatten)]
    pub embed: Option<Embed>,
}

impl Post {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            embed: None,
        }
    }

    pub fn with_embed(mut self, embed: Option<Embed>) -> Self {
        self.embed = embed;
        self
    }

    pub fn with_link(self, uri: impl Into<String>) -> Self {
        self.with_embed(Some(Embed::External(External::Url(uri.into()))))
    }

    pub fn external(&self) -> Option<&External> {
        match &self.embed {
            Some(Embed::External(external)) => Some(external),
            _ => None,
        }
    }

    pub fn images(&self) -> &[MediaRef] {
        match &self.embed {
            Some(Embed::Images(images)) => images,
            _ => &[],
        }
    }

    pub fn video(&self) -> Option<&MediaRef> {
        match &self.embed {
            Some(Embed::Video(video)) => Some(video),
            _ => None,
        }
    }
}

/// A root post followed by plain-text replies, each replying to the one before it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Thread {
    posts: Vec<Post>,
}

impl Thread {
    pub fn new(root: Post, replies: impl IntoIterator<Item = String>) -> Self {
        let mut posts = vec![root];
        posts.extend(replies.into_iter().map(Post::new));
        Self { posts }
    }

    pub fn root(&self) -> &Post {
        &self.posts[0]
    }

    pub fn replies(&self) -> &[Post] {
        &self.posts[1..]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Post> {
        self.posts.iter()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    // A thread always has its root.
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Outgoing {
    Post(Post),
    Thread(Thread),
}

impl Outgoing {
    /// Text of the post, or of the thread's root.
    pub fn text(&self) -> &str {
        match self {
            Outgoing::Post(post) => &post.text,
            Outgoing::Thread(thread) => &thread.root().text,
        }
    }
}

/// Identity of a published post on the destination platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRef {
    pub uri: String,
    pub cid: String,
}

// Collaborator note:
// The destination platform session, the redirect decoder and the HTML renderer
// live outside the relay core. The relay only talks to them through the traits
// below, so a webhook host can plug in real clients and tests can plug in fakes.

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one post, optionally as a reply, and return its identity.
    async fn post(&self, post: &Post, reply_to: Option<&PostRef>) -> Result<PostRef>;

    /// Publish a thread strictly in order; each segment replies to the previous one.
    async fn post_thread(&self, thread: &Thread) -> Result<Vec<PostRef>> {
        let mut published: Vec<PostRef> = Vec::with_capacity(thread.len());
        for post in thread.iter() {
            let post_ref = self.post(post, published.last()).await?;
            published.push(post_ref);
        }
        Ok(published)
    }
}

#[async_trait]
pub trait LinkResolver: Send + Sync {
    /// Resolve `url` to its real destination. Never fails: an unresolvable
    /// link comes back unchanged.
    async fn resolve(&self, url: &str) -> String;
}

/// Renders an HTML fragment to plain text.
///
/// Contract: block-level elements become separate lines, newlines are kept,
/// and inline media become `[img:URL]` / `[video:URL]` markers at their
/// original position.
pub trait HtmlRenderer: Send + Sync {
    fn render(&self, html: &str) -> String;
}
