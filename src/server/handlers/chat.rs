use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::rag::{dedup_sources, Language};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    pub query: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "pl".to_string()
}

#[derive(Debug, Serialize)]
pub struct ChatResponseBody {
    pub answer: String,
    pub sources: Vec<String>,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequestBody>,
) -> Result<Json<ChatResponseBody>, ApiError> {
    if body.query.trim().is_empty() {
        return Err(ApiError::BadRequest("Query cannot be empty".to_string()));
    }

    tracing::info!("Received query: {}", body.query);

    let language = Language::from_code(&body.language);
    let result = state.answerer.answer(&body.query, language).await;

    Ok(Json(ChatResponseBody {
        answer: result.answer,
        sources: dedup_sources(&result.sources),
    }))
}
