use crate::models::{PlantEntry, SessionUser};
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    Form,
};
use serde::Deserialize;
use service_core::error::AppError;
use validator::Validate;

#[derive(Template)]
#[template(path = "new_entry.html")]
pub struct NewEntryTemplate {
    pub username: Option<String>,
    pub entry: PlantEntry,
}

#[derive(Deserialize)]
pub struct EntryParams {
    pub new_entry_id: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct InstructionsForm {
    #[serde(default)]
    #[validate(length(max = 2000, message = "Instructions are limited to 2000 characters"))]
    pub instructions: String,
}

fn entry_id(params: EntryParams) -> Result<String, AppError> {
    params
        .new_entry_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No entry ID provided")))
}

fn entry_not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Entry not found"))
}

pub async fn new_entry_page(
    State(state): State<AppState>,
    user: SessionUser,
    Query(params): Query<EntryParams>,
) -> Result<impl IntoResponse, AppError> {
    let id = entry_id(params)?;

    let entry = state
        .repository
        .find_plant(&id, &user.username)
        .await?
        .ok_or_else(entry_not_found)?;

    Ok(NewEntryTemplate {
        username: Some(user.username),
        entry,
    })
}

pub async fn new_entry_handler(
    State(state): State<AppState>,
    user: SessionUser,
    Query(params): Query<EntryParams>,
    Form(form): Form<InstructionsForm>,
) -> Result<impl IntoResponse, AppError> {
    let id = entry_id(params)?;
    form.validate()?;

    let updated = state
        .repository
        .set_instructions(&id, &user.username, form.instructions.trim())
        .await?;

    if !updated {
        return Err(entry_not_found());
    }

    tracing::info!(username = %user.username, entry_id = %id, "Care instructions saved");

    Ok(Redirect::to("/"))
}
