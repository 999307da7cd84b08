use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::info;
use uuid::Uuid;

/// How long a prompt survives between the analyze and generate steps.
pub const SESSION_TTL: Duration = Duration::from_secs(2 * 60 * 60);
/// How often the background sweeper evicts expired entries.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(30 * 60);

struct PromptSession {
    prompt: String,
    created_at: Instant,
}

/// Short-lived cache binding a generated session id to the user's original
/// free-text prompt, bridging the two-step analyze -> generate flow.
///
/// This is a convenience cache, not a durability boundary: a lost entry
/// means the caller resupplies the prompt directly, nothing worse. Entries
/// are written once by analyze and never mutated.
pub struct PromptSessionCache {
    entries: Mutex<HashMap<Uuid, PromptSession>>,
    ttl: Duration,
}

impl PromptSessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn create(&self, prompt: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.entries.lock().unwrap().insert(
            id,
            PromptSession {
                prompt: prompt.to_string(),
                created_at: Instant::now(),
            },
        );
        id
    }

    /// Entries past the retention window are absent even before the sweeper
    /// gets to them.
    pub fn get(&self, id: &Uuid) -> Option<String> {
        let entries = self.entries.lock().unwrap();
        let session = entries.get(id)?;
        if session.created_at.elapsed() >= self.ttl {
            return None;
        }
        Some(session.prompt.clone())
    }

    /// Evict expired entries. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, s| s.created_at.elapsed() < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl Default for PromptSessionCache {
    fn default() -> Self {
        Self::new(SESSION_TTL)
    }
}

/// Run the eviction sweep on a fixed interval, off the request path. A tick
/// that lands while the previous sweep is still running is skipped rather
/// than queued.
pub fn spawn_sweeper(cache: Arc<PromptSessionCache>, every: Duration) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tick.tick().await;
            let evicted = cache.sweep();
            if evicted > 0 {
                info!("Evicted {} expired prompt sessions", evicted);
            }
        }
    });
}
