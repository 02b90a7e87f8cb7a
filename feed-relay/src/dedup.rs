use std::collections::VecDeque;
use tokio::sync::Mutex;
use tracing::debug;

/// How many published texts are remembered.
pub const DEDUP_CAPACITY: usize = 100;

/// Bounded memory of recently published post texts.
///
/// Lives as long as the process. Membership is exact text equality. All access
/// goes through one async mutex, and [`DedupGuard::claim`] checks and records
/// in a single critical section so two overlapping deliveries of the same
/// text cannot both get through.
pub struct DedupGuard {
    recent: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl DedupGuard {
    pub fn new() -> Self {
        Self::with_capacity(DEDUP_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            recent: Mutex::new(VecDeque::with_capacity(capacity + 1)),
            capacity,
        }
    }

    pub async fn has(&self, text: &str) -> bool {
        self.recent.lock().await.iter().any(|seen| seen == text)
    }

    /// Remember `text`, evicting the oldest entry past capacity.
    pub async fn add(&self, text: &str) {
        let mut recent = self.recent.lock().await;
        Self::push(&mut recent, text, self.capacity);
    }

    /// Record `text` unless it is already remembered. Returns `false` for a duplicate.
    pub async fn claim(&self, text: &str) -> bool {
        let mut recent = self.recent.lock().await;
        if recent.iter().any(|seen| seen == text) {
            debug!("Duplicate post text rejected");
            return false;
        }
        Self::push(&mut recent, text, self.capacity);
        true
    }

    /// Undo a claim whose send failed, so a later delivery may retry it.
    pub async fn release(&self, text: &str) {
        let mut recent = self.recent.lock().await;
        if let Some(index) = recent.iter().rposition(|seen| seen == text) {
            recent.remove(index);
        }
    }

    pub async fn len(&self) -> usize {
        self.recent.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.recent.lock().await.is_empty()
    }

    fn push(recent: &mut VecDeque<String>, text: &str, capacity: usize) {
        recent.push_back(text.to_string());
        while recent.len() > capacity {
            recent.pop_front();
        }
    }
}

impl Default for DedupGuard {
    fn default() -> Self {
        Self::new()
    }
}
