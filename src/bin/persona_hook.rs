//! persona-hook: coding-assistant hook binary feeding task events to the persona.
//!
//! Reads hook event JSON from stdin and posts the matching task transition
//! to the persona API:
//! - `UserPromptSubmit` → `processing-started`
//! - `Stop` → `complete`
//!
//! Anything else is ignored. The hook never fails the calling process.

use std::io::Read;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const PERSONA_API: &str = "http://127.0.0.1:8768";

// --- Event JSON from the hook runner ---

#[derive(Deserialize)]
struct HookEvent {
    hook_event_name: Option<String>,
    session_id: Option<String>,
}

// --- Persona API request ---

#[derive(Serialize)]
struct TaskEventRequest<'a> {
    task: &'a str,
    #[serde(rename = "newState")]
    new_state: &'a str,
}

fn task_state(event_name: &str) -> Option<&'static str> {
    match event_name {
        "UserPromptSubmit" => Some("processing-started"),
        "Stop" => Some("complete"),
        _ => None,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Hooks share stderr with the host; only speak up when asked to
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("PERSONA_HOOK_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let mut input = String::new();
    if std::io::stdin().read_to_string(&mut input).is_err() {
        return;
    }

    let event: HookEvent = match serde_json::from_str(&input) {
        Ok(e) => e,
        Err(e) => {
            debug!("Unparsable hook event: {e}");
            return;
        }
    };

    let Some(event_name) = event.hook_event_name.as_deref() else {
        return;
    };
    let Some(new_state) = task_state(event_name) else {
        debug!("Ignoring hook event {event_name}");
        return;
    };
    let task = event.session_id.as_deref().unwrap_or("session");

    let api = std::env::var("PERSONA_API").unwrap_or_else(|_| PERSONA_API.to_string());
    let client = Client::builder()
        .connect_timeout(Duration::from_millis(300))
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap_or_else(|_| Client::new());

    match client
        .post(format!("{api}/task-event"))
        .json(&TaskEventRequest { task, new_state })
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => debug!("Posted {task} → {new_state}"),
        Ok(resp) => warn!("Persona API returned status {}", resp.status()),
        Err(e) => debug!("Persona API unreachable: {e}"),
    }
}
