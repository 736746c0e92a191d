//! Deterministic clock, random source and capturing sink for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::RngCore;

use super::sink::VoiceSink;
use super::speaker::Clock;

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap()),
        }
    }
}

impl ManualClock {
    pub fn advance_ms(&self, ms: i64) {
        *self.now.lock().unwrap() += Duration::milliseconds(ms);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Default)]
pub struct RecordingSink {
    spoken: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

impl VoiceSink for RecordingSink {
    fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}

/// Replays fixed `u64` draws, then yields zeros.
pub struct ScriptedRng {
    values: VecDeque<u64>,
}

impl ScriptedRng {
    pub fn new(values: &[u64]) -> Self {
        Self {
            values: values.iter().copied().collect(),
        }
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.values.pop_front().unwrap_or(0)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
