use secrecy::Secret;
use serde::Deserialize;
use service_core::error::AppError;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub prediction: PredictionSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Signs the session cookie. Any length; a 64-byte key is derived from it.
    pub session_secret: Secret<String>,
    /// Set when served over HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
    /// Upper bound on request bodies, base64 photo included.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Mongo,
    Memory,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    #[serde(default = "default_backend")]
    pub backend: DatabaseBackend,
    pub uri: String,
    pub name: String,
}

fn default_backend() -> DatabaseBackend {
    DatabaseBackend::Mongo
}

#[derive(Deserialize, Clone)]
pub struct StorageSettings {
    /// Directory holding uploaded photos, served under `/uploads`.
    pub uploads_dir: String,
}

#[derive(Deserialize, Clone)]
pub struct PredictionSettings {
    #[serde(default = "default_prediction_url")]
    pub url: String,
    #[serde(default = "default_prediction_timeout")]
    pub timeout_secs: u64,
}

fn default_prediction_url() -> String {
    "http://ml-client:3001/predict".to_string()
}

fn default_prediction_timeout() -> u64 {
    10
}

#[derive(Deserialize, Clone)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let configuration_directory = service_core::config::configuration_directory("plant-web")?;
    service_core::config::load_settings(&configuration_directory)
}
