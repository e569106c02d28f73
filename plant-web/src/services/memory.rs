use crate::models::{PlantEntry, Prediction, User};
use crate::services::repository::PlantRepository;
use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local store for development without MongoDB.
///
/// Data is lost on restart.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, User>>, // username -> user
    plants: RwLock<HashMap<String, PlantEntry>>,
    predictions: RwLock<HashMap<String, Prediction>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlantRepository for InMemoryStore {
    async fn create_user(&self, user: User) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Err(AppError::Conflict(anyhow::anyhow!("Username already exists")));
        }
        users.insert(user.username.clone(), user);
        Ok(())
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn insert_plant(&self, entry: PlantEntry) -> Result<(), AppError> {
        self.plants.write().await.insert(entry.id.clone(), entry);
        Ok(())
    }

    async fn find_plant(&self, id: &str, user: &str) -> Result<Option<PlantEntry>, AppError> {
        Ok(self
            .plants
            .read()
            .await
            .get(id)
            .filter(|entry| entry.user == user)
            .cloned())
    }

    async fn recent_plants(&self, user: &str, limit: usize) -> Result<Vec<PlantEntry>, AppError> {
        let plants = self.plants.read().await;
        let mut entries: Vec<PlantEntry> = plants
            .values()
            .filter(|entry| entry.user == user)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn set_instructions(
        &self,
        id: &str,
        user: &str,
        instructions: &str,
    ) -> Result<bool, AppError> {
        let mut plants = self.plants.write().await;
        match plants.get_mut(id).filter(|entry| entry.user == user) {
            Some(entry) => {
                entry.instructions = Some(instructions.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_plant(&self, id: &str, user: &str) -> Result<bool, AppError> {
        let mut plants = self.plants.write().await;
        if plants.get(id).is_some_and(|entry| entry.user == user) {
            plants.remove(id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn insert_prediction(&self, prediction: Prediction) -> Result<(), AppError> {
        self.predictions
            .write()
            .await
            .insert(prediction.id.clone(), prediction);
        Ok(())
    }

    async fn find_prediction(
        &self,
        photo: &str,
        user: &str,
    ) -> Result<Option<Prediction>, AppError> {
        Ok(self
            .predictions
            .read()
            .await
            .values()
            .find(|prediction| prediction.photo == photo && prediction.user == user)
            .cloned())
    }

    async fn list_predictions(&self, user: &str) -> Result<Vec<Prediction>, AppError> {
        let predictions = self.predictions.read().await;
        let mut owned: Vec<Prediction> = predictions
            .values()
            .filter(|prediction| prediction.user == user)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn delete_prediction(
        &self,
        id: &str,
        user: &str,
    ) -> Result<Option<Prediction>, AppError> {
        let mut predictions = self.predictions.write().await;
        if predictions.get(id).is_some_and(|prediction| prediction.user == user) {
            return Ok(predictions.remove(id));
        }
        Ok(None)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
