use crate::config::{DatabaseBackend, ServerSettings, Settings};
use crate::handlers::{
    app::{health_check, home, metrics, not_found},
    auth::{login_handler, login_page, logout_handler, signup_handler, signup_page},
    entries::{new_entry_handler, new_entry_page},
    history::{delete_handler, history_page},
    results::results_page,
    upload::{upload_handler, upload_page},
};
use crate::services::{InMemoryStore, MongoDb, PhotoStore, PlantRepository, PredictionClient};
use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use sha2::{Digest, Sha512};
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use time::Duration;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::Key, Expiry, MemoryStore, SessionManagerLayer};

const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Connect the configured repository, photo directory and prediction client.
pub async fn build_state(settings: &Settings) -> Result<AppState, AppError> {
    let repository: Arc<dyn PlantRepository> = match settings.database.backend {
        DatabaseBackend::Mongo => {
            let db = MongoDb::connect(&settings.database.uri, &settings.database.name).await?;
            db.initialize_indexes().await?;
            Arc::new(db)
        }
        DatabaseBackend::Memory => {
            tracing::warn!("Using in-memory repository; data will not survive a restart");
            Arc::new(InMemoryStore::new())
        }
    };

    let photos = PhotoStore::new(&settings.storage.uploads_dir)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to initialize photo storage at {}: {}",
                settings.storage.uploads_dir,
                e
            );
            e
        })?;

    let prediction_client = PredictionClient::new(settings.prediction.clone())?;
    tracing::info!(url = %prediction_client.url(), "Prediction service configured");

    Ok(AppState::new(
        repository,
        Arc::new(photos),
        Arc::new(prediction_client),
    ))
}

fn session_key(server: &ServerSettings) -> Key {
    let digest = Sha512::digest(server.session_secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

pub fn build_router(state: AppState, server: &ServerSettings) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(server.secure_cookies)
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)))
        .with_signed(session_key(server));

    let uploads = ServeDir::new(state.photos.base_path());

    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/login", get(login_page).post(login_handler))
        .route("/signup", get(signup_page).post(signup_handler))
        .route("/logout", get(logout_handler))
        .route("/upload", get(upload_page).post(upload_handler))
        .route("/new_entry", get(new_entry_page).post(new_entry_handler))
        .route("/results/:filename", get(results_page))
        .route("/history", get(history_page))
        .route("/delete/:id", post(delete_handler))
        .nest_service("/uploads", uploads)
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

type ServerFuture = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>;

pub struct Application {
    port: u16,
    server: ServerFuture,
}

impl Application {
    pub async fn build(settings: Settings) -> Result<Self, AppError> {
        let state = build_state(&settings).await?;
        let app = build_router(state, &settings.server);

        let address = format!("{}:{}", settings.server.host, settings.server.port);
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}:{}", settings.server.host, port);

        let server = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .into_future();

        Ok(Self {
            port,
            server: Box::pin(server),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
