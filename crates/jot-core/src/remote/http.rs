//! HTTP implementation of the remote store

use reqwest::StatusCode;
use serde::Deserialize;

use crate::models::{Note, NoteId, NotePatch};
use crate::util::{compact_text, normalize_text_option};

use super::{RemoteError, RemoteResult, RemoteStore};

/// Client for the Jot document API.
///
/// Thin JSON-over-HTTP plumbing: `POST /v1/notes`,
/// `PATCH /v1/notes/{id}`, `GET /v1/notes`. Authentication is a bearer
/// token; all connectivity and server-side failures surface as
/// [`RemoteError`] for the facade to recover from.
#[derive(Clone)]
pub struct HttpRemoteStore {
    endpoint: String,
    token: String,
    client: reqwest::Client,
}

impl HttpRemoteStore {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> RemoteResult<Self> {
        let endpoint = normalize_endpoint(endpoint.into())?;
        let token = normalize_text_option(Some(token.into())).ok_or_else(|| {
            RemoteError::InvalidConfiguration("API token must not be empty".to_string())
        })?;
        Ok(Self {
            endpoint,
            token,
            client: reqwest::Client::builder().build()?,
        })
    }

    fn notes_url(&self) -> String {
        format!("{}/v1/notes", self.endpoint)
    }

    fn note_url(&self, note_id: NoteId) -> String {
        format!("{}/v1/notes/{note_id}", self.endpoint)
    }

    async fn parse_note(response: reqwest::Response) -> RemoteResult<Note> {
        let response = check_status(response).await?;
        response
            .json::<Note>()
            .await
            .map_err(|error| RemoteError::InvalidPayload(error.to_string()))
    }
}

impl RemoteStore for HttpRemoteStore {
    async fn create_note(&self, note: &Note) -> RemoteResult<Note> {
        let response = self
            .client
            .post(self.notes_url())
            .bearer_auth(&self.token)
            .json(note)
            .send()
            .await?;
        Self::parse_note(response).await
    }

    async fn update_note(&self, note_id: NoteId, patch: &NotePatch) -> RemoteResult<Note> {
        let response = self
            .client
            .patch(self.note_url(note_id))
            .bearer_auth(&self.token)
            .json(patch)
            .send()
            .await?;
        Self::parse_note(response).await
    }

    async fn list_notes(&self, owner_id: &str, limit: usize) -> RemoteResult<Vec<Note>> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(self.notes_url())
            .bearer_auth(&self.token)
            .query(&[("owner_id", owner_id), ("limit", limit.as_str())])
            .send()
            .await?;

        let response = check_status(response).await?;
        let payload = response
            .json::<NoteListResponse>()
            .await
            .map_err(|error| RemoteError::InvalidPayload(error.to_string()))?;
        Ok(payload.notes)
    }
}

#[derive(Debug, Deserialize)]
struct NoteListResponse {
    notes: Vec<Note>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

async fn check_status(response: reqwest::Response) -> RemoteResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Api {
        status: status.as_u16(),
        message: parse_api_error(status, &body),
    })
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return message.trim().to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        compact_text(trimmed)
    }
}

fn normalize_endpoint(raw: String) -> RemoteResult<String> {
    let endpoint = normalize_text_option(Some(raw)).ok_or_else(|| {
        RemoteError::InvalidConfiguration("endpoint must not be empty".to_string())
    })?;
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Ok(endpoint.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::InvalidConfiguration(
            "endpoint must include http:// or https://".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_endpoint_rejects_invalid_values() {
        assert!(normalize_endpoint(String::new()).is_err());
        assert!(normalize_endpoint("api.example.com".to_string()).is_err());
    }

    #[test]
    fn normalize_endpoint_strips_trailing_slash() {
        assert_eq!(
            normalize_endpoint("https://api.example.com/".to_string()).unwrap(),
            "https://api.example.com"
        );
    }

    #[test]
    fn new_rejects_blank_token() {
        assert!(HttpRemoteStore::new("https://api.example.com", "  ").is_err());
    }

    #[test]
    fn parse_api_error_prefers_structured_message() {
        let message = parse_api_error(
            StatusCode::CONFLICT,
            r#"{"message": "note version conflict"}"#,
        );
        assert_eq!(message, "note version conflict");
    }

    #[test]
    fn parse_api_error_falls_back_to_body_then_status() {
        assert_eq!(
            parse_api_error(StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down"
        );
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, "  "), "HTTP 502");
    }

    #[test]
    fn note_urls_are_under_v1() {
        let store = HttpRemoteStore::new("https://api.example.com/", "token").unwrap();
        let id = NoteId::new();
        assert_eq!(store.notes_url(), "https://api.example.com/v1/notes");
        assert_eq!(
            store.note_url(id),
            format!("https://api.example.com/v1/notes/{id}")
        );
    }
}
