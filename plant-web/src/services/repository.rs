use crate::models::{PlantEntry, Prediction, User};
use async_trait::async_trait;
use service_core::error::AppError;

/// Document-store operations the web app needs.
///
/// Every plant and prediction lookup is scoped by owner username; records of
/// other users behave as if they did not exist.
#[async_trait]
pub trait PlantRepository: Send + Sync {
    /// Fails with `AppError::Conflict` when the username is taken.
    async fn create_user(&self, user: User) -> Result<(), AppError>;
    async fn find_user(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn insert_plant(&self, entry: PlantEntry) -> Result<(), AppError>;
    async fn find_plant(&self, id: &str, user: &str) -> Result<Option<PlantEntry>, AppError>;
    /// Newest first.
    async fn recent_plants(&self, user: &str, limit: usize) -> Result<Vec<PlantEntry>, AppError>;
    /// Returns whether an entry matched.
    async fn set_instructions(
        &self,
        id: &str,
        user: &str,
        instructions: &str,
    ) -> Result<bool, AppError>;
    async fn delete_plant(&self, id: &str, user: &str) -> Result<bool, AppError>;

    async fn insert_prediction(&self, prediction: Prediction) -> Result<(), AppError>;
    async fn find_prediction(
        &self,
        photo: &str,
        user: &str,
    ) -> Result<Option<Prediction>, AppError>;
    /// Newest first.
    async fn list_predictions(&self, user: &str) -> Result<Vec<Prediction>, AppError>;
    /// Returns the removed record.
    async fn delete_prediction(&self, id: &str, user: &str)
        -> Result<Option<Prediction>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}
