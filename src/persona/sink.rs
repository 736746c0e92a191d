//! Voice sinks: where spoken text ends up.
//!
//! - `TtsApiSink`: hands text to the Code Speaker TTS API (`POST /speak`)
//! - `NotifySink`: shows text as a desktop notification (D-Bus)

use std::sync::Arc;
use std::time::Duration;

use notify_rust::Notification;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{SinkKind, VoiceConfig};

pub trait VoiceSink: Send + Sync {
    fn speak(&self, text: &str);
}

/// Build the configured sink. `SinkKind::None` yields no sink at all.
pub fn from_config(config: &VoiceConfig) -> Option<Arc<dyn VoiceSink>> {
    match config.sink {
        SinkKind::Tts => Some(Arc::new(TtsApiSink::new(&config.tts_url, &config.event_type))),
        SinkKind::Notify => Some(Arc::new(NotifySink::new("Persona"))),
        SinkKind::None => None,
    }
}

#[derive(Serialize)]
struct SpeakRequest<'a> {
    text: &'a str,
    summarize: bool,
    event_type: &'a str,
    start_reminder: bool,
}

pub struct TtsApiSink {
    url: String,
    event_type: String,
    client: Client,
}

impl TtsApiSink {
    pub fn new(base_url: &str, event_type: &str) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(300))
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            url: format!("{}/speak", base_url.trim_end_matches('/')),
            event_type: event_type.to_string(),
            client,
        }
    }
}

impl VoiceSink for TtsApiSink {
    fn speak(&self, text: &str) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime, dropping utterance");
            return;
        };

        let request = self.client.post(&self.url).json(&SpeakRequest {
            text,
            summarize: false,
            event_type: &self.event_type,
            start_reminder: false,
        });
        let url = self.url.clone();

        // Fire-and-forget: the TTS API queues playback itself
        runtime.spawn(async move {
            match request.send().await {
                Ok(resp) if resp.status().is_success() => debug!("TTS API accepted utterance"),
                Ok(resp) => warn!("TTS API returned status {}", resp.status()),
                Err(e) if e.is_connect() => warn!("Cannot connect to TTS API at {url}"),
                Err(e) => warn!("TTS API request failed: {e}"),
            }
        });
    }
}

pub struct NotifySink {
    summary: String,
}

impl NotifySink {
    pub fn new(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
        }
    }
}

impl VoiceSink for NotifySink {
    fn speak(&self, text: &str) {
        debug!("Notification: {text}");

        let mut notification = Notification::new();
        notification
            .summary(&self.summary)
            .body(text)
            .icon("user-available")
            .timeout(5000);

        // D-Bus round trip blocks; keep it off the caller's thread
        run_blocking(move || {
            if let Err(e) = notification.show() {
                warn!("Failed to show notification: {e}");
            }
        });
    }
}

/// Run `job` on the blocking pool when a runtime is around, inline otherwise.
fn run_blocking<F>(job: F)
where
    F: FnOnce() + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn_blocking(job);
        }
        Err(_) => job(),
    }
}
