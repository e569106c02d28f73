use super::session_error;
use crate::models::{User, SESSION_USERNAME_KEY};
use crate::utils::password::{hash_password, verify_login};
use crate::AppState;
use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use service_core::error::AppError;
use tower_sessions::Session;
use validator::{Validate, ValidationErrors};

#[derive(Template, Default)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub username: Option<String>,
    pub error: Option<String>,
}

#[derive(Template, Default)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub username: Option<String>,
    pub error: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct CredentialsForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 64, message = "Username must be 1-64 characters"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 256, message = "Password is required"))]
    pub password: String,
}

fn first_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid form data".to_string())
}

async fn start_session(session: &Session, username: &str) -> Result<(), AppError> {
    // fresh id on every login
    session.cycle_id().await.map_err(session_error)?;
    session
        .insert(SESSION_USERNAME_KEY, username)
        .await
        .map_err(session_error)
}

pub async fn login_page() -> impl IntoResponse {
    LoginTemplate::default()
}

pub async fn signup_page() -> impl IntoResponse {
    SignupTemplate::default()
}

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    if let Err(errors) = form.validate() {
        let template = LoginTemplate {
            username: None,
            error: Some(first_message(&errors)),
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response());
    }

    let user = state.repository.find_user(&form.username).await?;

    let authenticated = verify_login(
        &form.password,
        user.as_ref().map(|user| user.password_hash.as_str()),
    );

    if !authenticated {
        tracing::info!(username = %form.username, "Rejected login attempt");
        let template = LoginTemplate {
            username: None,
            error: Some("Invalid username or password".to_string()),
        };
        return Ok((StatusCode::UNAUTHORIZED, template).into_response());
    }

    start_session(&session, &form.username).await?;

    tracing::info!(username = %form.username, "User logged in successfully");

    Ok(Redirect::to("/").into_response())
}

pub async fn signup_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    if let Err(errors) = form.validate() {
        let template = SignupTemplate {
            username: None,
            error: Some(first_message(&errors)),
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, template).into_response());
    }

    let password_hash = hash_password(&form.password)?;

    match state
        .repository
        .create_user(User::new(form.username.clone(), password_hash))
        .await
    {
        Ok(()) => {}
        Err(AppError::Conflict(_)) => {
            let template = SignupTemplate {
                username: None,
                error: Some("Username already exists".to_string()),
            };
            return Ok((StatusCode::CONFLICT, template).into_response());
        }
        Err(e) => return Err(e),
    }

    start_session(&session, &form.username).await?;

    tracing::info!(username = %form.username, "User signed up");

    Ok(Redirect::to("/").into_response())
}

pub async fn logout_handler(session: Session) -> Result<Redirect, AppError> {
    session.flush().await.map_err(session_error)?;
    Ok(Redirect::to("/"))
}
