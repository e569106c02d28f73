use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A plant in the user's collection: the stored photo, the identified name
/// and the care instructions the user wrote for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantEntry {
    #[serde(rename = "_id")]
    pub id: String,
    /// File name of the stored photo.
    pub photo: String,
    pub name: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl PlantEntry {
    pub fn new(photo: String, name: String, user: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            photo,
            name,
            user,
            instructions: None,
            created_at: Utc::now(),
        }
    }

    pub fn instructions_text(&self) -> &str {
        self.instructions.as_deref().unwrap_or("")
    }
}
