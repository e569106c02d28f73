use crate::models::{Prediction, SessionUser};
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use service_core::error::AppError;

#[derive(Template)]
#[template(path = "results.html")]
pub struct ResultsTemplate {
    pub username: Option<String>,
    pub result: Prediction,
}

pub async fn results_page(
    State(state): State<AppState>,
    user: SessionUser,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = state
        .repository
        .find_prediction(&filename, &user.username)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Result not found")))?;

    Ok(ResultsTemplate {
        username: Some(user.username),
        result,
    })
}
