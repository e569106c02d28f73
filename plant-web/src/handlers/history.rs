use crate::models::{Prediction, SessionUser};
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use service_core::error::AppError;

#[derive(Template)]
#[template(path = "history.html")]
pub struct HistoryTemplate {
    pub username: Option<String>,
    pub all_results: Vec<Prediction>,
}

pub async fn history_page(
    State(state): State<AppState>,
    user: SessionUser,
) -> Result<impl IntoResponse, AppError> {
    let all_results = state.repository.list_predictions(&user.username).await?;

    Ok(HistoryTemplate {
        username: Some(user.username),
        all_results,
    })
}

/// Remove a prediction along with its plant entry and stored photo.
pub async fn delete_handler(
    State(state): State<AppState>,
    user: SessionUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let removed = state
        .repository
        .delete_prediction(&id, &user.username)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Entry not found")))?;

    if let Some(entry_id) = &removed.entry_id {
        state.repository.delete_plant(entry_id, &user.username).await?;
    }

    // The record is gone either way; a leftover file is only logged.
    if let Err(e) = state.photos.delete(&removed.photo).await {
        tracing::warn!(photo = %removed.photo, "Failed to delete photo file: {}", e);
    }

    tracing::info!(username = %user.username, prediction_id = %id, "Prediction deleted");

    Ok(Redirect::to("/history"))
}
