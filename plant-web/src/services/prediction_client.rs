use crate::config::PredictionSettings;
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use service_core::error::AppError;
use service_core::observability::TracedClientExt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Prediction service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Prediction service returned {0}")]
    Status(StatusCode),

    #[error("Prediction service response missing plant_name")]
    MissingLabel,
}

/// Label returned by the classifier.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Identification {
    pub plant_name: String,
}

/// HTTP client for the external plant classification endpoint.
pub struct PredictionClient {
    client: Client,
    settings: PredictionSettings,
}

impl PredictionClient {
    pub fn new(settings: PredictionSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client, settings })
    }

    pub fn url(&self) -> &str {
        &self.settings.url
    }

    /// Submit one image as multipart field `image` and read back the label.
    ///
    /// `request_id` is forwarded as `x-request-id` when present.
    pub async fn identify(
        &self,
        filename: &str,
        mime_type: &str,
        bytes: Vec<u8>,
        request_id: Option<&str>,
    ) -> Result<Identification, PredictionError> {
        let part = multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime_type)?;
        let form = multipart::Form::new().part("image", part);

        let request = self.client.traced_post(&self.settings.url).multipart(form);
        let sent = match request_id {
            Some(id) => request.send_with_request_id(id).await,
            None => request.send().await,
        };

        let response = sent.map_err(|e| {
            tracing::error!(url = %self.settings.url, "Failed to reach prediction service: {}", e);
            e
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(url = %self.settings.url, status = %status, "Prediction request rejected");
            return Err(PredictionError::Status(status));
        }

        let identification: Identification = response.json().await.map_err(|e| {
            tracing::error!("Prediction response was not the expected JSON: {}", e);
            if e.is_decode() {
                PredictionError::MissingLabel
            } else {
                PredictionError::Transport(e)
            }
        })?;

        tracing::info!(
            filename = %filename,
            plant_name = %identification.plant_name,
            "Photo identified"
        );

        Ok(identification)
    }
}
