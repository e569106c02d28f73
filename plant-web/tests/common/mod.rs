#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use http_body_util::BodyExt;
use plant_web::config::{PredictionSettings, ServerSettings};
use plant_web::models::{PlantEntry, Prediction, User};
use plant_web::services::{InMemoryStore, PhotoStore, PlantRepository, PredictionClient};
use plant_web::startup::build_router;
use plant_web::AppState;
use secrecy::Secret;
use serde_json::json;
use service_core::error::AppError;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower::ServiceExt;
use uuid::Uuid;

pub const PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAA";

/// What the fake classifier answers with.
#[derive(Clone)]
pub enum PredictionReply {
    Label(&'static str),
    /// 200 with a body that has no `plant_name`.
    Unlabelled,
    Status(StatusCode),
}

/// One image the fake classifier received.
#[derive(Clone, Debug)]
pub struct ReceivedImage {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
    pub request_id: Option<String>,
}

#[derive(Clone)]
struct FakeClassifier {
    reply: PredictionReply,
    received: Arc<Mutex<Vec<ReceivedImage>>>,
}

async fn predict(
    State(fake): State<FakeClassifier>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let request_id = headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let size = field.bytes().await.map(|b| b.len()).unwrap_or(0);
        fake.received.lock().unwrap().push(ReceivedImage {
            field: name,
            file_name,
            content_type,
            size,
            request_id: request_id.clone(),
        });
    }

    match fake.reply {
        PredictionReply::Label(label) => Json(json!({ "plant_name": label })).into_response(),
        PredictionReply::Unlabelled => Json(json!({ "label": "Rose" })).into_response(),
        PredictionReply::Status(status) => (status, "classifier unavailable").into_response(),
    }
}

/// Start a classifier stand-in on an ephemeral port. Returns its URL.
async fn spawn_classifier(fake: FakeClassifier) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake classifier");
    let port = listener.local_addr().unwrap().port();

    let app = Router::new()
        .route("/predict", post(predict))
        .with_state(fake);

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://127.0.0.1:{}/predict", port)
}

/// Which repository calls should fail.
#[derive(Clone, Copy, Default)]
pub struct Faults {
    pub insert_prediction: bool,
    pub health_check: bool,
}

/// In-memory repository with switchable failures.
pub struct FaultyStore {
    inner: InMemoryStore,
    faults: Faults,
}

impl FaultyStore {
    pub fn new(faults: Faults) -> Self {
        Self {
            inner: InMemoryStore::new(),
            faults,
        }
    }
}

fn store_down() -> AppError {
    AppError::DatabaseError(anyhow::anyhow!("store unavailable"))
}

#[async_trait]
impl PlantRepository for FaultyStore {
    async fn create_user(&self, user: User) -> Result<(), AppError> {
        self.inner.create_user(user).await
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, AppError> {
        self.inner.find_user(username).await
    }

    async fn insert_plant(&self, entry: PlantEntry) -> Result<(), AppError> {
        self.inner.insert_plant(entry).await
    }

    async fn find_plant(&self, id: &str, user: &str) -> Result<Option<PlantEntry>, AppError> {
        self.inner.find_plant(id, user).await
    }

    async fn recent_plants(&self, user: &str, limit: usize) -> Result<Vec<PlantEntry>, AppError> {
        self.inner.recent_plants(user, limit).await
    }

    async fn set_instructions(
        &self,
        id: &str,
        user: &str,
        instructions: &str,
    ) -> Result<bool, AppError> {
        self.inner.set_instructions(id, user, instructions).await
    }

    async fn delete_plant(&self, id: &str, user: &str) -> Result<bool, AppError> {
        self.inner.delete_plant(id, user).await
    }

    async fn insert_prediction(&self, prediction: Prediction) -> Result<(), AppError> {
        if self.faults.insert_prediction {
            return Err(store_down());
        }
        self.inner.insert_prediction(prediction).await
    }

    async fn find_prediction(
        &self,
        photo: &str,
        user: &str,
    ) -> Result<Option<Prediction>, AppError> {
        self.inner.find_prediction(photo, user).await
    }

    async fn list_predictions(&self, user: &str) -> Result<Vec<Prediction>, AppError> {
        self.inner.list_predictions(user).await
    }

    async fn delete_prediction(
        &self,
        id: &str,
        user: &str,
    ) -> Result<Option<Prediction>, AppError> {
        self.inner.delete_prediction(id, user).await
    }

    async fn health_check(&self) -> Result<(), AppError> {
        if self.faults.health_check {
            return Err(store_down());
        }
        self.inner.health_check().await
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub uploads_dir: PathBuf,
    pub received: Arc<Mutex<Vec<ReceivedImage>>>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(PredictionReply::Label("Rose")).await
    }

    pub async fn spawn_with(reply: PredictionReply) -> Self {
        Self::spawn_with_repository(reply, Arc::new(InMemoryStore::new())).await
    }

    pub async fn spawn_with_faults(faults: Faults) -> Self {
        let repository = Arc::new(FaultyStore::new(faults));
        Self::spawn_with_repository(PredictionReply::Label("Rose"), repository).await
    }

    pub async fn spawn_with_repository(
        reply: PredictionReply,
        repository: Arc<dyn PlantRepository>,
    ) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let prediction_url = spawn_classifier(FakeClassifier {
            reply,
            received: received.clone(),
        })
        .await;

        let uploads_dir = std::env::temp_dir().join(format!("plant-web-test-{}", Uuid::new_v4()));
        let photos = PhotoStore::new(&uploads_dir)
            .await
            .expect("Failed to create uploads dir");
        let prediction_client = PredictionClient::new(PredictionSettings {
            url: prediction_url,
            timeout_secs: 5,
        })
        .expect("Failed to build prediction client");

        let state = AppState::new(
            repository,
            Arc::new(photos),
            Arc::new(prediction_client),
        );

        let server = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            session_secret: Secret::new("test-session-secret".to_string()),
            secure_cookies: false,
            max_upload_bytes: 5 * 1024 * 1024,
        };

        TestApp {
            router: build_router(state.clone(), &server),
            state,
            uploads_dir,
            received,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed to respond")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> Response {
        let body = serde_urlencoded::to_string(fields).expect("Failed to encode form");
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Sign up and return the session cookie.
    pub async fn signup(&self, username: &str, password: &str) -> String {
        let response = self
            .post_form(
                "/signup",
                &[("username", username), ("password", password)],
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).expect("signup did not set a session cookie")
    }

    /// Upload the sample PNG and return the redirect location.
    pub async fn upload_sample(&self, cookie: &str) -> String {
        let response = self
            .post_form("/upload", &[("photo", PNG_DATA_URL)], Some(cookie))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        location(&response)
    }

    pub fn cleanup(&self) {
        let _ = std::fs::remove_dir_all(&self.uploads_dir);
    }
}

/// `name=value` pair from the first Set-Cookie header.
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn body_text(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}
