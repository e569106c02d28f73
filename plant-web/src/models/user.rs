use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

/// Session key holding the logged-in username.
pub const SESSION_USERNAME_KEY: &str = "username";

/// Stored account. `password_hash` is an Argon2 PHC string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// Logged-in user taken from the session cookie.
///
/// Rejects with a redirect to `/login` when nobody is logged in.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub username: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to extract session",
                )
                    .into_response()
            })?;

        match current_username(&session).await {
            Some(username) => Ok(SessionUser { username }),
            None => Err(Redirect::to("/login").into_response()),
        }
    }
}

/// Username of the current session, if any. Used by pages that render for
/// both anonymous and logged-in visitors.
///
/// A session store failure is logged and treated as anonymous.
pub async fn current_username(session: &Session) -> Option<String> {
    session
        .get::<String>(SESSION_USERNAME_KEY)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read session, treating as anonymous");
            None
        })
}
