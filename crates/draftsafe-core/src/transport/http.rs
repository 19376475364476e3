//! HTTP save transport for a REST document endpoint.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::SaveTransport;
use crate::error::{Error, Result};
use crate::models::{SaveOutcome, SaveRequest};
use crate::util::{compact_text, is_http_url, normalize_text_option};

const SAVE_HTTP_TIMEOUT_SECS: u64 = 30;

/// Saves documents with `PUT {base}/documents/{id}`
///
/// The body carries the content and the expected update time; the server is
/// expected to answer 409 or 412 when that precondition no longer holds.
#[derive(Clone)]
pub struct HttpSaveTransport {
    base_url: String,
    bearer_token: Option<String>,
    client: reqwest::Client,
}

impl fmt::Debug for HttpSaveTransport {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HttpSaveTransport")
            .field("base_url", &self.base_url)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct SaveDocumentBody<'a> {
    content: &'a str,
    expected_updated_at: i64,
}

#[derive(Debug, Deserialize)]
struct SaveDocumentResponse {
    updated_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl HttpSaveTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(SAVE_HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            base_url,
            bearer_token: None,
            client,
        })
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = normalize_text_option(token);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn document_url(&self, request: &SaveRequest) -> String {
        format!(
            "{}/documents/{}",
            self.base_url,
            urlencoding::encode(request.document_id.as_str())
        )
    }

    async fn send(&self, request: &SaveRequest) -> Result<SaveOutcome> {
        let body = SaveDocumentBody {
            content: &request.content,
            expected_updated_at: request.expected_version_token,
        };
        let mut builder = self
            .client
            .put(self.document_url(request))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body);
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        Ok(classify_response(status, &text))
    }
}

impl SaveTransport for HttpSaveTransport {
    async fn save(&self, request: SaveRequest) -> Result<SaveOutcome> {
        match self.send(&request).await {
            Ok(outcome) => Ok(outcome),
            Err(Error::Http(error)) => Ok(SaveOutcome::TransientFailure {
                message: format!("request failed: {error}"),
            }),
            Err(error) => Err(error),
        }
    }
}

/// Map an HTTP status and body onto a save outcome
pub fn classify_response(status: StatusCode, body: &str) -> SaveOutcome {
    if status.is_success() {
        return match serde_json::from_str::<SaveDocumentResponse>(body) {
            Ok(SaveDocumentResponse {
                updated_at: Some(new_version_token),
            }) => SaveOutcome::Success { new_version_token },
            _ => SaveOutcome::TransientFailure {
                message: "save response did not include updated_at".to_string(),
            },
        };
    }

    match status {
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => SaveOutcome::Conflict {
            message: parse_api_error(status, body),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SaveOutcome::Unauthorized,
        _ => SaveOutcome::TransientFailure {
            message: parse_api_error(status, body),
        },
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_base_url(raw: String) -> Result<String> {
    let base_url = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::InvalidInput("API base URL must not be empty".to_string()))?;
    if is_http_url(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(Error::InvalidInput(
            "API base URL must include http:// or https://".to_string(),
        ))
    }
}
