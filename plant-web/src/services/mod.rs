pub mod database;
pub mod memory;
pub mod metrics;
pub mod photos;
pub mod prediction_client;
pub mod repository;

pub use database::MongoDb;
pub use memory::InMemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use photos::{decode_photo, DecodedPhoto, PhotoError, PhotoStore, SavedPhoto};
pub use prediction_client::{Identification, PredictionClient, PredictionError};
pub use repository::PlantRepository;
