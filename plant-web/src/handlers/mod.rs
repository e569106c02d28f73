pub mod app;
pub mod auth;
pub mod entries;
pub mod history;
pub mod results;
pub mod upload;

use service_core::error::AppError;

pub(crate) fn session_error(e: tower_sessions::session::Error) -> AppError {
    tracing::error!("Session store error: {}", e);
    AppError::InternalError(anyhow::Error::new(e))
}
