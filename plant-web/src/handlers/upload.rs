use crate::models::{PlantEntry, Prediction, SessionUser};
use crate::services::{decode_photo, DecodedPhoto};
use crate::AppState;
use anyhow::Context;
use askama::Template;
use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect},
    Form,
};
use serde::Deserialize;
use service_core::error::AppError;
use service_core::observability::extract_request_id;

#[derive(Template)]
#[template(path = "upload.html")]
pub struct UploadTemplate {
    pub username: Option<String>,
}

#[derive(Deserialize)]
pub struct UploadForm {
    /// `data:image/...;base64,...` produced by the browser.
    pub photo: Option<String>,
}

pub async fn upload_page(user: SessionUser) -> impl IntoResponse {
    UploadTemplate {
        username: Some(user.username),
    }
}

pub async fn upload_handler(
    State(state): State<AppState>,
    user: SessionUser,
    headers: HeaderMap,
    Form(form): Form<UploadForm>,
) -> Result<impl IntoResponse, AppError> {
    let data_url = form
        .photo
        .filter(|photo| !photo.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No photo data received")))?;

    let request_id = extract_request_id(&headers);

    let prediction = identify_upload(&state, &user.username, &data_url, request_id.as_deref())
        .await
        .map_err(|e| {
            tracing::error!(username = %user.username, "Photo upload failed: {:#}", e);
            AppError::InternalError(e.context("Error processing the photo"))
        })?;

    Ok(Redirect::to(&format!("/results/{}", prediction.photo)))
}

async fn identify_upload(
    state: &AppState,
    username: &str,
    data_url: &str,
    request_id: Option<&str>,
) -> anyhow::Result<Prediction> {
    let photo = decode_photo(data_url)?;
    process_photo(state, username, photo, request_id).await
}

async fn discard_photo(state: &AppState, filename: &str) {
    if let Err(e) = state.photos.delete(filename).await {
        tracing::warn!(filename = %filename, "Failed to remove orphaned photo: {}", e);
    }
}

/// Store the photo, ask the classifier for a label and record the outcome.
///
/// Writes a plant entry (for care instructions) and a prediction linked to
/// it. On any failure after the save, the photo and a partly written plant
/// entry are removed again.
pub async fn process_photo(
    state: &AppState,
    username: &str,
    photo: DecodedPhoto,
    request_id: Option<&str>,
) -> anyhow::Result<Prediction> {
    let saved = state.photos.save(&photo).await.context("Failed to save photo")?;

    let identification = match state
        .prediction_client
        .identify(&saved.filename, &photo.mime_type, photo.bytes, request_id)
        .await
    {
        Ok(identification) => identification,
        Err(e) => {
            discard_photo(state, &saved.filename).await;
            return Err(anyhow::Error::from(e).context("Identification failed"));
        }
    };

    let entry = PlantEntry::new(
        saved.filename.clone(),
        identification.plant_name.clone(),
        username.to_string(),
    );
    let entry_id = entry.id.clone();
    let prediction = Prediction::new(
        saved.filename,
        saved.filepath,
        identification.plant_name,
        username.to_string(),
    )
    .with_entry(&entry_id);

    if let Err(e) = state.repository.insert_plant(entry).await {
        discard_photo(state, &prediction.photo).await;
        return Err(anyhow::anyhow!("Failed to record plant entry: {}", e));
    }

    if let Err(e) = state.repository.insert_prediction(prediction.clone()).await {
        if let Err(cleanup) = state.repository.delete_plant(&entry_id, username).await {
            tracing::warn!(entry_id = %entry_id, "Failed to remove orphaned plant entry: {}", cleanup);
        }
        discard_photo(state, &prediction.photo).await;
        return Err(anyhow::anyhow!("Failed to record prediction: {}", e));
    }

    tracing::info!(
        username = %username,
        photo = %prediction.photo,
        plant_name = %prediction.plant_name,
        "Prediction recorded"
    );

    Ok(prediction)
}
