//! Bounded history of recently spoken utterances.
//!
//! Local state is authoritative for in-process decisions. Every record is
//! mirrored best-effort to the remote conversation log, and the remote log
//! seeds local state once at startup.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::remote::RemoteLog;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    /// ISO-8601 time the utterance was spoken.
    pub timestamp: String,
}

pub struct HistoryStore {
    capacity: usize,
    entries: Mutex<VecDeque<Utterance>>,
    remote: Option<Arc<RemoteLog>>,
}

impl HistoryStore {
    pub fn new(capacity: usize, remote: Option<Arc<RemoteLog>>) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity + 1)),
            remote,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn entries(&self) -> MutexGuard<'_, VecDeque<Utterance>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an utterance, evicting the oldest past capacity, then forward
    /// it to the remote log without waiting for the result.
    pub fn record(&self, text: &str, at: DateTime<Utc>) {
        {
            let mut entries = self.entries();
            entries.push_back(Utterance {
                text: text.to_string(),
                timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            });
            while entries.len() > self.capacity {
                entries.pop_front();
            }
        }

        let Some(remote) = &self.remote else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No async runtime, skipping remote log append");
            return;
        };
        let remote = remote.clone();
        let text = text.to_string();
        runtime.spawn(async move {
            if let Err(e) = remote.append(&text).await {
                warn!("Remote log append failed: {e}");
            }
        });
    }

    /// Exact, case-sensitive match against local history.
    pub fn was_recently_said(&self, text: &str) -> bool {
        self.entries().iter().any(|u| u.text == text)
    }

    /// Ask the remote log first; fall back to local history if it fails.
    pub async fn was_recently_said_remote(&self, text: &str) -> bool {
        let Some(remote) = &self.remote else {
            return self.was_recently_said(text);
        };
        match remote.check(text).await {
            Ok(said) => said,
            Err(e) => {
                warn!("Remote repetition check failed, using local history: {e}");
                self.was_recently_said(text)
            }
        }
    }

    /// Replace local state with the most recent persisted entries.
    /// Any failure leaves history empty.
    pub async fn load_from_remote(&self) {
        let Some(remote) = &self.remote else {
            debug!("Remote log disabled, keeping local history");
            return;
        };

        let loaded: VecDeque<Utterance> = match remote.fetch().await {
            Ok(logs) => {
                let skip = logs.len().saturating_sub(self.capacity);
                logs.into_iter()
                    .skip(skip)
                    .map(|entry| Utterance {
                        text: entry.text,
                        timestamp: entry.spoken_at.unwrap_or_default(),
                    })
                    .collect()
            }
            Err(e) => {
                warn!("Failed to load history for {}: {e}", remote.persona());
                VecDeque::new()
            }
        };

        info!("Loaded {} history entries for {}", loaded.len(), remote.persona());
        *self.entries() = loaded;
    }

    pub fn snapshot(&self) -> Vec<Utterance> {
        self.entries().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }
}
