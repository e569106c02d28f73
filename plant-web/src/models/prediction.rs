use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one identification request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "_id")]
    pub id: String,
    /// File name of the stored photo, also the key used by `/results/:filename`.
    pub photo: String,
    pub filepath: String,
    pub plant_name: String,
    pub user: String,
    /// Plant entry created from the same upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Prediction {
    pub fn new(photo: String, filepath: String, plant_name: String, user: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            photo,
            filepath,
            plant_name,
            user,
            entry_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_entry(mut self, entry_id: &str) -> Self {
        self.entry_id = Some(entry_id.to_string());
        self
    }

    pub fn identified_at(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M").to_string()
    }
}
