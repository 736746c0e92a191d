//! Client for the remote conversation log service.
//!
//! Endpoints:
//! - `POST /api/conversation-logs` append `{persona, text}`
//! - `GET /api/conversation-logs/{persona}` fetch `{logs: [{text, spoken_at}]}`
//! - `GET /api/conversation-logs/{persona}/check?text=..` → `{wasRecentlySaid}`
//!
//! Each call is attempted once. Callers decide what a failure means.

use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RemoteLogError;

#[derive(Serialize)]
struct AppendRequest<'a> {
    persona: &'a str,
    text: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogEntry {
    pub text: String,
    #[serde(default)]
    pub spoken_at: Option<String>,
}

impl LogEntry {
    /// Parsed `spoken_at`; missing or unparsable values sort first.
    fn spoken_at_time(&self) -> Option<DateTime<FixedOffset>> {
        self.spoken_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    }
}

#[derive(Deserialize)]
struct LogsResponse {
    logs: Vec<LogEntry>,
}

#[derive(Deserialize)]
struct CheckResponse {
    #[serde(rename = "wasRecentlySaid")]
    was_recently_said: bool,
}

pub struct RemoteLog {
    base_url: String,
    persona: String,
    client: Client,
}

impl RemoteLog {
    pub fn new(base_url: &str, persona: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            persona: persona.to_string(),
            client,
        }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    fn logs_url(&self) -> String {
        format!("{}/api/conversation-logs/{}", self.base_url, self.persona)
    }

    pub async fn append(&self, text: &str) -> Result<(), RemoteLogError> {
        let url = format!("{}/api/conversation-logs", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&AppendRequest {
                persona: &self.persona,
                text,
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(RemoteLogError::Status(resp.status()));
        }
        debug!("Appended to remote log for {}", self.persona);
        Ok(())
    }

    /// Fetch the persisted log, ordered oldest first by `spoken_at`.
    pub async fn fetch(&self) -> Result<Vec<LogEntry>, RemoteLogError> {
        let resp = self.client.get(self.logs_url()).send().await?;
        if !resp.status().is_success() {
            return Err(RemoteLogError::Status(resp.status()));
        }

        let body = resp.text().await?;
        let mut logs = serde_json::from_str::<LogsResponse>(&body)
            .map_err(|e| RemoteLogError::Decode(e.to_string()))?
            .logs;
        // Stable: entries sharing an instant keep server order.
        logs.sort_by_key(LogEntry::spoken_at_time);
        Ok(logs)
    }

    pub async fn check(&self, text: &str) -> Result<bool, RemoteLogError> {
        let url = format!("{}/check", self.logs_url());
        let resp = self
            .client
            .get(&url)
            .query(&[("text", text)])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(RemoteLogError::Status(resp.status()));
        }

        let body = resp.text().await?;
        serde_json::from_str::<CheckResponse>(&body)
            .map(|c| c.was_recently_said)
            .map_err(|e| RemoteLogError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> RemoteLog {
        RemoteLog::new(&server.uri(), "companion", Duration::from_secs(2))
    }

    #[tokio::test]
    async fn test_append_posts_persona_and_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/conversation-logs"))
            .and(body_json(json!({"persona": "companion", "text": "hello"})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).append("hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_sorts_by_spoken_at() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/conversation-logs/companion"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logs": [
                    {"text": "second", "spoken_at": "2026-01-01T10:00:02Z"},
                    {"text": "first", "spoken_at": "2026-01-01T10:00:01Z"},
                ]
            })))
            .mount(&server)
            .await;

        let logs = client(&server).fetch().await.unwrap();
        let texts: Vec<_> = logs.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_fetch_orders_by_instant_across_offsets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/conversation-logs/companion"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "logs": [
                    {"text": "newest", "spoken_at": "2026-01-01T10:30:00Z"},
                    {"text": "older", "spoken_at": "2026-01-01T11:00:00+02:00"},
                    {"text": "undated"},
                    {"text": "newer", "spoken_at": "2026-01-01T10:00:00Z"},
                    {"text": "garbled", "spoken_at": "yesterday"},
                ]
            })))
            .mount(&server)
            .await;

        let logs = client(&server).fetch().await.unwrap();
        let texts: Vec<_> = logs.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["undated", "garbled", "older", "newer", "newest"]);
    }

    #[tokio::test]
    async fn test_fetch_rejects_malformed_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/conversation-logs/companion"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server).fetch().await.unwrap_err();
        assert!(matches!(err, RemoteLogError::Decode(_)));
    }

    #[tokio::test]
    async fn test_check_sends_encoded_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/conversation-logs/companion/check"))
            .and(query_param("text", "On it & done?"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"wasRecentlySaid": true})),
            )
            .mount(&server)
            .await;

        assert!(client(&server).check("On it & done?").await.unwrap());
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server).append("x").await.unwrap_err();
        assert!(matches!(err, RemoteLogError::Status(s) if s.as_u16() == 503));
    }
}
