use crate::dedup::DedupGuard;
use crate::types::{DispatchOutcome, Outgoing, Post, PostRef, Publisher, RelayError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Delivers pipeline output to a publisher one payload at a time, skipping
/// texts the dedup guard has already seen.
pub struct Dispatcher {
    publisher: Arc<dyn Publisher>,
    guard: Arc<DedupGuard>,
}

impl Dispatcher {
    pub fn new(publisher: Arc<dyn Publisher>, guard: Arc<DedupGuard>) -> Self {
        Self { publisher, guard }
    }

    pub fn guard(&self) -> &DedupGuard {
        &self.guard
    }

    /// Send `outgoing` in order. Stops at the first publish failure. A payload
    /// that failed before anything went out is forgotten by the guard so a
    /// redelivery can retry it; once its first segment is published the claim
    /// stays.
    pub async fn dispatch(&self, outgoing: &[Outgoing]) -> Result<DispatchOutcome> {
        if outgoing.is_empty() {
            info!("There are no new updates to post");
            return Ok(DispatchOutcome::NothingToPost);
        }

        let mut posted = 0;
        let mut skipped = 0;
        for payload in outgoing {
            let text = payload.text();
            if !self.guard.claim(text).await {
                debug!("Already posted, skipping: {}", text);
                skipped += 1;
                continue;
            }

            if let Err((e, published)) = self.send(payload).await {
                warn!(
                    "Could not post feed update after {} segments were published: {}",
                    published, e
                );
                if published == 0 {
                    self.guard.release(text).await;
                }
                return Err(RelayError::Publish(e));
            }
            posted += 1;
        }

        info!("Dispatched batch: {} posted, {} skipped", posted, skipped);
        Ok(DispatchOutcome::Published { posted, skipped })
    }

    /// Publish every segment, each replying to the one before it. On failure,
    /// reports how many segments made it out.
    async fn send(&self, payload: &Outgoing) -> std::result::Result<Vec<PostRef>, (anyhow::Error, usize)> {
        let segments: Vec<&Post> = match payload {
            Outgoing::Post(post) => vec![post],
            Outgoing::Thread(thread) => thread.iter().collect(),
        };

        let mut published: Vec<PostRef> = Vec::with_capacity(segments.len());
        for post in segments {
            match self.publisher.post(post, published.last()).await {
                Ok(post_ref) => published.push(post_ref),
                Err(e) => return Err((e, published.len())),
            }
        }
        Ok(published)
    }
}

/// Publisher that only logs what it would send. Used for dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    async fn post(&self, post: &Post, reply_to: Option<&PostRef>) -> anyhow::Result<PostRef> {
        let post_ref = PostRef {
            uri: format!("at://dry-run/app.bsky.feed.post/{}", Uuid::new_v4().simple()),
            cid: Uuid::new_v4().to_string(),
        };
        match reply_to {
            Some(parent) => info!("Would reply to {}: {}", parent.uri, post.text),
            None => info!("Would post: {}", post.text),
        }
        Ok(post_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Thread;

    #[tokio::test]
    async fn test_log_publisher_chains_thread() {
        let thread = Thread::new(Post::new("root"), vec!["one".to_string(), "two".to_string()]);
        let refs = LogPublisher.post_thread(&thread).await.unwrap();
        assert_eq!(refs.len(), 3);
        assert!(refs.iter().all(|r| r.uri.starts_with("at://dry-run/")));
        assert_ne!(refs[0].uri, refs[1].uri);
    }

    #[tokio::test]
    async fn test_empty_batch_is_nothing_to_post() {
        let dispatcher = Dispatcher::new(Arc::new(LogPublisher), Arc::new(DedupGuard::new()));
        assert_eq!(dispatcher.dispatch(&[]).await.unwrap(), DispatchOutcome::NothingToPost);
        assert!(dispatcher.guard().is_empty().await);
    }
}
