//! HTTP control API for the persona.
//!
//! Exposes direct speech triggers, the extended monologue, idle chat
//! control, history, and a task-event inbox for hooks.
//! Runs on port 8768 (configurable) using axum.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::context::Persona;
use super::events::{TaskEvent, TaskEventBus};
use super::history::Utterance;
use super::phrases::Category;
use super::speaker::SpeakOutcome;

#[derive(Clone)]
pub struct ApiState {
    pub persona: Arc<Persona>,
    pub bus: Arc<TaskEventBus>,
}

// --- Request/Response types ---

/// `force` may come as `?force=true` or as a JSON body `{"force": true}`.
#[derive(Deserialize, Default)]
struct ForceOptions {
    #[serde(default)]
    force: bool,
}

#[derive(Deserialize)]
struct RecentlySaidQuery {
    text: String,
    #[serde(default)]
    remote: bool,
}

#[derive(Serialize)]
struct StatusResponse {
    persona: String,
    idle_running: bool,
    history_len: usize,
    history_capacity: usize,
    sink_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_spoken_at: Option<String>,
}

#[derive(Serialize)]
struct RecentlySaidResponse {
    #[serde(rename = "wasRecentlySaid")]
    was_recently_said: bool,
}

#[derive(Serialize)]
struct SimpleResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subscribers: Option<usize>,
}

impl SimpleResponse {
    fn ok(status: &str) -> Self {
        Self {
            status: status.into(),
            text: None,
            error: None,
            subscribers: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            error: Some(message.into()),
            text: None,
            subscribers: None,
        }
    }

    fn spoken(text: impl Into<String>, outcome: SpeakOutcome) -> Self {
        let status = match outcome {
            SpeakOutcome::Spoken => "spoken",
            SpeakOutcome::Throttled => "throttled",
        };
        Self {
            text: Some(text.into()),
            ..Self::ok(status)
        }
    }
}

/// Build the axum router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/status", get(handle_status))
        .route("/history", get(handle_history))
        .route("/recently-said", get(handle_recently_said))
        .route("/speak/{category}", post(handle_speak))
        .route("/speak-extended", post(handle_speak_extended))
        .route("/idle/start", post(handle_idle_start))
        .route("/idle/stop", post(handle_idle_stop))
        .route("/task-event", post(handle_task_event))
        .with_state(state)
}

/// Start the control API as a background tokio task.
pub async fn start_api(state: ApiState, port: u16) {
    let app = router(state);
    let addr = format!("127.0.0.1:{port}");
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            warn!("Failed to bind persona API on {addr}: {e}");
            return;
        }
    };
    info!("Persona API listening on {addr}");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            warn!("Persona API server error: {e}");
        }
    });
}

// --- Handlers ---

async fn handle_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let persona = &state.persona;
    Json(StatusResponse {
        persona: persona.id().to_string(),
        idle_running: persona.idle_running(),
        history_len: persona.history().len(),
        history_capacity: persona.history().capacity(),
        sink_available: persona.has_sink(),
        last_spoken_at: persona.last_spoken_at().map(|t| t.to_rfc3339()),
    })
}

async fn handle_history(State(state): State<ApiState>) -> Json<Vec<Utterance>> {
    Json(state.persona.snapshot())
}

async fn handle_recently_said(
    State(state): State<ApiState>,
    Query(query): Query<RecentlySaidQuery>,
) -> Json<RecentlySaidResponse> {
    let history = state.persona.history();
    let was_recently_said = if query.remote {
        history.was_recently_said_remote(&query.text).await
    } else {
        history.was_recently_said(&query.text)
    };
    Json(RecentlySaidResponse { was_recently_said })
}

async fn handle_speak(
    State(state): State<ApiState>,
    Path(category): Path<String>,
    Query(query): Query<ForceOptions>,
    body: Option<Json<ForceOptions>>,
) -> Json<SimpleResponse> {
    let category = match category.parse::<Category>() {
        Ok(c) => c,
        Err(e) => return Json(SimpleResponse::err(e)),
    };

    let force = query.force || body.is_some_and(|Json(b)| b.force);
    let (text, outcome) = state.persona.say(category, force);
    info!("HTTP /speak/{category}: {outcome:?}");
    Json(SimpleResponse::spoken(text, outcome))
}

async fn handle_speak_extended(State(state): State<ApiState>) -> Json<SimpleResponse> {
    let (text, outcome) = state.persona.speak_extended();
    Json(SimpleResponse::spoken(text, outcome))
}

async fn handle_idle_start(State(state): State<ApiState>) -> Json<SimpleResponse> {
    if state.persona.start_idle() {
        Json(SimpleResponse::ok("started"))
    } else {
        Json(SimpleResponse::ok("already running"))
    }
}

async fn handle_idle_stop(State(state): State<ApiState>) -> Json<SimpleResponse> {
    if state.persona.stop_idle() {
        Json(SimpleResponse::ok("stopped"))
    } else {
        Json(SimpleResponse::ok("not running"))
    }
}

async fn handle_task_event(
    State(state): State<ApiState>,
    Json(event): Json<TaskEvent>,
) -> Json<SimpleResponse> {
    let subscribers = state.bus.publish(&event);
    Json(SimpleResponse {
        subscribers: Some(subscribers),
        ..SimpleResponse::ok("published")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::persona::context::PersonaDeps;
    use crate::persona::events::EventBridge;
    use crate::persona::test_support::{ManualClock, RecordingSink};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::{json, Value};

    struct TestServer {
        base: String,
        sink: Arc<RecordingSink>,
        clock: Arc<ManualClock>,
        client: reqwest::Client,
    }

    async fn serve() -> TestServer {
        let sink = Arc::new(RecordingSink::default());
        let clock = Arc::new(ManualClock::default());
        let persona = Arc::new(Persona::new(
            &Config::default(),
            PersonaDeps {
                remote: None,
                sink: Some(sink.clone()),
                clock: clock.clone(),
                rng: Box::new(StdRng::seed_from_u64(5)),
            },
        ));
        let bus = Arc::new(TaskEventBus::new());
        EventBridge::attach(&persona, Some(bus.as_ref()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(ApiState { persona, bus });
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer {
            base: format!("http://{addr}"),
            sink,
            clock,
            client: reqwest::Client::new(),
        }
    }

    impl TestServer {
        async fn post(&self, path: &str, body: Option<Value>) -> Value {
            let mut req = self.client.post(format!("{}{path}", self.base));
            if let Some(body) = body {
                req = req.json(&body);
            }
            req.send().await.unwrap().json().await.unwrap()
        }

        async fn get(&self, path: &str) -> Value {
            self.client
                .get(format!("{}{path}", self.base))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_speak_category_then_throttle_then_force() {
        let server = serve().await;

        let first = server.post("/speak/greeting", None).await;
        assert_eq!(first["status"], "spoken");

        server.clock.advance_ms(5_000);
        let second = server.post("/speak/status", None).await;
        assert_eq!(second["status"], "throttled");

        let forced = server.post("/speak/status?force=true", None).await;
        assert_eq!(forced["status"], "spoken");
        assert_eq!(server.sink.spoken().len(), 2);

        let history = server.get("/history").await;
        assert_eq!(history.as_array().unwrap().len(), 2);
        assert_eq!(history[1]["text"], forced["text"]);
    }

    #[tokio::test]
    async fn test_force_in_json_body_overrides_cooldown() {
        let server = serve().await;
        assert_eq!(server.post("/speak/greeting", None).await["status"], "spoken");

        server.clock.advance_ms(5_000);
        let unforced = server
            .post("/speak/status", Some(json!({"force": false})))
            .await;
        assert_eq!(unforced["status"], "throttled");

        let forced = server
            .post("/speak/status", Some(json!({"force": true})))
            .await;
        assert_eq!(forced["status"], "spoken");
        assert_eq!(server.sink.spoken().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_category_is_rejected() {
        let server = serve().await;
        let resp = server.post("/speak/weather", None).await;
        assert_eq!(resp["status"], "error");
        assert!(server.sink.spoken().is_empty());
    }

    #[tokio::test]
    async fn test_task_event_reaches_bridge() {
        let server = serve().await;
        let resp = server
            .post(
                "/task-event",
                Some(json!({"task": "deploy", "newState": "processing-started"})),
            )
            .await;
        assert_eq!(resp["subscribers"], 1);
        assert_eq!(server.sink.spoken().len(), 1);
    }

    #[tokio::test]
    async fn test_idle_start_stop_and_status() {
        let server = serve().await;
        assert_eq!(server.post("/idle/start", None).await["status"], "started");
        assert_eq!(server.post("/idle/start", None).await["status"], "already running");
        assert_eq!(server.get("/status").await["idle_running"], true);

        assert_eq!(server.post("/idle/stop", None).await["status"], "stopped");
        assert_eq!(server.post("/idle/stop", None).await["status"], "not running");

        let status = server.get("/status").await;
        assert_eq!(status["idle_running"], false);
        assert_eq!(status["persona"], "companion");
        assert_eq!(status["history_capacity"], 20);
    }

    #[tokio::test]
    async fn test_extended_and_recently_said() {
        let server = serve().await;
        let resp = server.post("/speak-extended", None).await;
        assert_eq!(resp["status"], "spoken");
        let text = resp["text"].as_str().unwrap().to_string();

        let check = server
            .client
            .get(format!("{}/recently-said", server.base))
            .query(&[("text", text.as_str())])
            .send()
            .await
            .unwrap()
            .json::<Value>()
            .await
            .unwrap();
        assert_eq!(check["wasRecentlySaid"], true);
    }
}
