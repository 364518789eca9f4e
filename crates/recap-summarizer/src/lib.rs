//! HTTP client for the external summarization collaborator.
//!
//! The collaborator owns all of the actual NLP work; this crate only speaks
//! its small JSON contract: POST /summarize with `{query, length}`, success
//! is `{summary, image_urls}`, failure is FastAPI-style `{"detail": "..."}`.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::error;

use recap_types::api::SummarizeResponse;

/// The collaborator signals "not enough sources" only through this phrase in
/// its error detail. There is no structured error code to match on instead,
/// so the coupling is kept in this one place.
const INSUFFICIENT_DATA_MARKER: &str = "Failed to fetch sufficient data";

const INSUFFICIENT_DATA_MESSAGE: &str =
    "Failed to fetch sufficient data from the internet. Please try again later or try with a more specific query.";
const GENERIC_FAILURE_MESSAGE: &str = "Error occurred while processing the request";

#[derive(Debug, Error)]
pub enum SummarizerError {
    /// The collaborator could not be reached, or timed out.
    #[error("summarizer unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The collaborator answered with an error status.
    #[error("summarizer returned {status}: {detail}")]
    Upstream { status: u16, detail: String },
}

impl SummarizerError {
    /// Best-effort translation of an upstream failure into the message shown
    /// to the end user. Never exposes transport details.
    pub fn user_message(&self) -> &'static str {
        match self {
            SummarizerError::Upstream { detail, .. }
                if detail.contains(INSUFFICIENT_DATA_MARKER) =>
            {
                INSUFFICIENT_DATA_MESSAGE
            }
            _ => GENERIC_FAILURE_MESSAGE,
        }
    }
}

#[derive(Serialize)]
struct SummarizeBody<'a> {
    query: &'a str,
    length: u32,
}

#[derive(Clone)]
pub struct SummarizerClient {
    http: reqwest::Client,
    base_url: String,
}

impl SummarizerClient {
    /// The timeout bounds the whole request; the collaborator scrapes the web
    /// before answering, so callers should allow a generous budget.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn summarize(&self, query: &str, length: u32) -> Result<SummarizeResponse, SummarizerError> {
        let url = format!("{}/summarize", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&SummarizeBody { query, length })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = extract_detail(&body);
            error!("Summarizer returned {}: {}", status, detail);
            return Err(SummarizerError::Upstream {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(response.json::<SummarizeResponse>().await?)
    }
}

/// Pulls the `detail` field out of a FastAPI error body, falling back to the
/// raw body when it is not the expected JSON shape.
fn extract_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_detail_gets_the_specific_message() {
        let err = SummarizerError::Upstream {
            status: 500,
            detail: "Failed to fetch sufficient data from the internet. Please try again later."
                .to_string(),
        };
        assert!(err.user_message().contains("more specific query"));
    }

    #[test]
    fn other_upstream_failures_get_the_generic_message() {
        let err = SummarizerError::Upstream {
            status: 500,
            detail: "search quota exceeded".to_string(),
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn detail_extraction_handles_fastapi_and_plain_bodies() {
        assert_eq!(extract_detail(r#"{"detail": "boom"}"#), "boom");
        assert_eq!(extract_detail("gateway timeout"), "gateway timeout");
    }
}
