//! Cooldown throttle and the single choke point for speech.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use super::history::HistoryStore;
use super::sink::VoiceSink;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    Spoken,
    Throttled,
}

/// Minimum spacing between speech acts.
pub struct Throttle {
    cooldown: Duration,
    last_speech: Option<DateTime<Utc>>,
}

impl Throttle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_speech: None,
        }
    }

    pub fn last_speech(&self) -> Option<DateTime<Utc>> {
        self.last_speech
    }

    /// Claim the right to speak at `now`. Forced claims ignore the cooldown.
    pub fn try_acquire(&mut self, now: DateTime<Utc>, force: bool) -> bool {
        let cooling = self
            .last_speech
            .is_some_and(|last| now - last < self.cooldown);
        if cooling && !force {
            return false;
        }
        self.last_speech = Some(now);
        true
    }
}

pub struct Speaker {
    throttle: Mutex<Throttle>,
    history: Arc<HistoryStore>,
    sink: Option<Arc<dyn VoiceSink>>,
    clock: Arc<dyn Clock>,
}

impl Speaker {
    pub fn new(
        cooldown: Duration,
        history: Arc<HistoryStore>,
        sink: Option<Arc<dyn VoiceSink>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            throttle: Mutex::new(Throttle::new(cooldown)),
            history,
            sink,
            clock,
        }
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    pub fn last_speech(&self) -> Option<DateTime<Utc>> {
        self.throttle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_speech()
    }

    /// Throttle, record, then emit.
    ///
    /// A missing sink still updates the cooldown and history.
    pub fn speak(&self, text: &str, force: bool) -> SpeakOutcome {
        // Held for the whole act so speech stays serialized
        let mut throttle = self.throttle.lock().unwrap_or_else(PoisonError::into_inner);

        let now = self.clock.now();
        if !throttle.try_acquire(now, force) {
            debug!("Cooldown active, skipping: \"{text}\"");
            return SpeakOutcome::Throttled;
        }

        self.history.record(text, now);
        info!("Speaking{}: \"{text}\"", if force { " (forced)" } else { "" });

        match &self.sink {
            Some(sink) => sink.speak(text),
            None => warn!("No voice sink available, utterance not emitted"),
        }
        SpeakOutcome::Spoken
    }
}
