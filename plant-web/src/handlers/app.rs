use crate::models::{user::current_username, PlantEntry};
use crate::AppState;
use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use service_core::error::AppError;
use tower_sessions::Session;

/// Number of plants shown on the logged-in home page.
const RECENT_PLANTS: usize = 3;

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub username: Option<String>,
    pub entries: Vec<PlantEntry>,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub username: Option<String>,
}

pub async fn home(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let username = current_username(&session).await;

    let entries = match &username {
        Some(user) => state.repository.recent_plants(user, RECENT_PLANTS).await?,
        None => Vec::new(),
    };

    Ok(HomeTemplate { username, entries })
}

pub async fn not_found(session: Session) -> impl IntoResponse {
    let username = current_username(&session).await;
    (StatusCode::NOT_FOUND, NotFoundTemplate { username })
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.repository.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "plant-web",
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "service": "plant-web",
                "version": env!("CARGO_PKG_VERSION"),
                "error": e.to_string()
            })),
        ),
    }
}

pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        crate::services::get_metrics(),
    )
}
