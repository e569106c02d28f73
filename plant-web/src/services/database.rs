use crate::models::{PlantEntry, Prediction, User};
use crate::services::repository::PlantRepository;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoDb {
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes");

        let username_index = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(
                IndexOptions::builder()
                    .name("username_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.users()
            .create_index(username_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create username index on users collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created unique index on users.username");

        let plants_index = IndexModel::builder()
            .keys(doc! { "user": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_recent".to_string())
                    .build(),
            )
            .build();
        self.plants()
            .create_index(plants_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create index on plants collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created index on plants.(user, created_at)");

        let predictions_index = IndexModel::builder()
            .keys(doc! { "user": 1, "photo": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_photo_lookup".to_string())
                    .build(),
            )
            .build();
        self.predictions()
            .create_index(predictions_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create index on predictions collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created index on predictions.(user, photo)");

        Ok(())
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn plants(&self) -> Collection<PlantEntry> {
        self.db.collection("plants")
    }

    pub fn predictions(&self) -> Collection<Prediction> {
        self.db.collection("predictions")
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

fn newest_first(limit: Option<i64>) -> FindOptions {
    FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .limit(limit)
        .build()
}

#[async_trait]
impl PlantRepository for MongoDb {
    async fn create_user(&self, user: User) -> Result<(), AppError> {
        match self.users().insert_one(&user, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(AppError::Conflict(anyhow::anyhow!(
                "Username already exists"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users()
            .find_one(doc! { "username": username }, None)
            .await?)
    }

    async fn insert_plant(&self, entry: PlantEntry) -> Result<(), AppError> {
        self.plants().insert_one(&entry, None).await?;
        Ok(())
    }

    async fn find_plant(&self, id: &str, user: &str) -> Result<Option<PlantEntry>, AppError> {
        Ok(self
            .plants()
            .find_one(doc! { "_id": id, "user": user }, None)
            .await?)
    }

    async fn recent_plants(&self, user: &str, limit: usize) -> Result<Vec<PlantEntry>, AppError> {
        let cursor = self
            .plants()
            .find(doc! { "user": user }, newest_first(Some(limit as i64)))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn set_instructions(
        &self,
        id: &str,
        user: &str,
        instructions: &str,
    ) -> Result<bool, AppError> {
        let result = self
            .plants()
            .update_one(
                doc! { "_id": id, "user": user },
                doc! { "$set": { "instructions": instructions } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_plant(&self, id: &str, user: &str) -> Result<bool, AppError> {
        let result = self
            .plants()
            .delete_one(doc! { "_id": id, "user": user }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_prediction(&self, prediction: Prediction) -> Result<(), AppError> {
        self.predictions().insert_one(&prediction, None).await?;
        Ok(())
    }

    async fn find_prediction(
        &self,
        photo: &str,
        user: &str,
    ) -> Result<Option<Prediction>, AppError> {
        Ok(self
            .predictions()
            .find_one(doc! { "photo": photo, "user": user }, None)
            .await?)
    }

    async fn list_predictions(&self, user: &str) -> Result<Vec<Prediction>, AppError> {
        let cursor = self
            .predictions()
            .find(doc! { "user": user }, newest_first(None))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn delete_prediction(
        &self,
        id: &str,
        user: &str,
    ) -> Result<Option<Prediction>, AppError> {
        Ok(self
            .predictions()
            .find_one_and_delete(doc! { "_id": id, "user": user }, None)
            .await?)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.db
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }
}
