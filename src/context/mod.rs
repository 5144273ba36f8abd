//! Conversation context storage.
//!
//! Continuous prompts keep the inference server's continuation tokens between
//! invocations so a follow-up generation picks up the conversation. Entries
//! are keyed by note path plus prompt source, expire after a fixed TTL, and a
//! background reaper sweeps the map on a long cadence so it cannot grow
//! unboundedly across a long session.
//!
//! Two racing generations for the same key resolve last-write-wins; the lock
//! guards map integrity only.

use crate::current_timestamp;
use chrono::TimeZone;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

/// Time-to-live of a continuation entry.
pub const CONTEXT_TTL_SECS: u64 = 30 * 60;

/// Cadence of the background reaper sweep.
pub const REAPER_INTERVAL: Duration = Duration::from_secs(3 * 60 * 60);

/// A stored continuation: opaque token list plus storage timestamp.
#[derive(Debug, Clone)]
struct ContinuationEntry {
    tokens: Vec<i64>,
    stored_at: u64,
}

/// In-memory, time-expiring map from (note, prompt source) to continuation
/// tokens.
#[derive(Debug)]
pub struct ConversationContextStore {
    entries: Mutex<HashMap<String, ContinuationEntry>>,
    ttl_secs: u64,
}

impl Default for ConversationContextStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationContextStore {
    /// Creates a store with the standard TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(CONTEXT_TTL_SECS)
    }

    /// Creates a store with a custom TTL in seconds.
    #[must_use]
    pub fn with_ttl(ttl_secs: u64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl_secs,
        }
    }

    /// Builds the composite key for a note and prompt source.
    #[must_use]
    pub fn key(note_path: &str, prompt_source: &str) -> String {
        format!("{note_path}::{prompt_source}")
    }

    /// Returns the stored tokens for a key, unless the entry has expired.
    ///
    /// An expired entry is evicted and reported absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Vec<i64>> {
        self.get_at(key, current_timestamp())
    }

    fn get_at(&self, key: &str, now: u64) -> Option<Vec<i64>> {
        let mut entries = self.lock();
        let fresh = entries
            .get(key)
            .map(|entry| now.saturating_sub(entry.stored_at) <= self.ttl_secs);
        match fresh {
            Some(true) => entries.get(key).map(|entry| entry.tokens.clone()),
            Some(false) => {
                entries.remove(key);
                tracing::debug!(key, "Evicted expired conversation context");
                None
            }
            None => None,
        }
    }

    /// Stores tokens for a key with the current timestamp.
    ///
    /// An empty token list deletes the entry instead.
    pub fn put(&self, key: &str, tokens: Vec<i64>) {
        self.put_at(key, tokens, current_timestamp());
    }

    fn put_at(&self, key: &str, tokens: Vec<i64>, now: u64) {
        let mut entries = self.lock();
        if tokens.is_empty() {
            entries.remove(key);
        } else {
            entries.insert(
                key.to_string(),
                ContinuationEntry {
                    tokens,
                    stored_at: now,
                },
            );
        }
    }

    /// Evicts every expired entry, returning the number removed.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(current_timestamp())
    }

    fn sweep_expired_at(&self, now: u64) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_sub(entry.stored_at) <= self.ttl_secs);
        let removed = before - entries.len();
        drop(entries);

        if removed > 0 {
            let cutoff = now.saturating_sub(self.ttl_secs);
            let cutoff_utc = chrono::Utc
                .timestamp_opt(i64::try_from(cutoff).unwrap_or(0), 0)
                .single();
            tracing::info!(removed, cutoff = ?cutoff_utc, "Context reaper evicted expired entries");
        }
        removed
    }

    /// Number of live entries (expired-but-unswept entries included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ContinuationEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawns the background reaper, sweeping every `interval`.
    ///
    /// The returned handle stops the reaper when dropped; hosts must keep it
    /// alive for the session and drop it on unload.
    #[must_use]
    pub fn spawn_reaper(store: Arc<Self>, interval: Duration) -> ReaperHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = std::thread::spawn(move || {
            const TICK: Duration = Duration::from_millis(100);
            let mut elapsed = Duration::ZERO;
            while !stop_flag.load(Ordering::Relaxed) {
                std::thread::sleep(TICK);
                elapsed += TICK;
                if elapsed >= interval {
                    elapsed = Duration::ZERO;
                    let _ = store.sweep_expired();
                }
            }
        });

        ReaperHandle {
            stop,
            handle: Some(handle),
        }
    }
}

/// Handle to the background reaper task.
///
/// Stopping (or dropping) the handle terminates the reaper thread; leaking it
/// would leave a recurring task running after unload.
#[derive(Debug)]
pub struct ReaperHandle {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ReaperHandle {
    /// Stops the reaper and waits for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ReaperHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
