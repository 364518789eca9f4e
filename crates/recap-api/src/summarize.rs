use axum::{Json, extract::State};

use recap_types::api::{SummarizeRequest, SummarizeResponse};

use crate::error::ApiError;
use crate::state::AppState;

/// Length the collaborator is asked for when the client does not say.
const DEFAULT_SUMMARY_LENGTH: u32 = 1;

/// Forwards the query to the summarization collaborator and relays its
/// answer. All NLP work happens on the other side of this call.
pub async fn summarize(
    State(state): State<AppState>,
    Json(req): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let query = match req.query {
        Some(query) if !query.is_empty() => query,
        _ => return Err(ApiError::invalid("Query is required")),
    };
    let length = req.length.unwrap_or(DEFAULT_SUMMARY_LENGTH);

    let response = state.summarizer.summarize(&query, length).await?;
    Ok(Json(response))
}
