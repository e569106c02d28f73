pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use services::{PhotoStore, PlantRepository, PredictionClient};
use std::sync::Arc;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn PlantRepository>,
    pub photos: Arc<PhotoStore>,
    pub prediction_client: Arc<PredictionClient>,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn PlantRepository>,
        photos: Arc<PhotoStore>,
        prediction_client: Arc<PredictionClient>,
    ) -> Self {
        Self {
            repository,
            photos,
            prediction_client,
        }
    }
}
