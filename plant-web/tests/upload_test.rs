mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{body_text, Faults, PredictionReply, TestApp};

#[tokio::test]
async fn upload_requires_login() {
    let app = TestApp::spawn().await;

    let page = app.get("/upload", None).await;
    assert_eq!(page.status(), StatusCode::SEE_OTHER);
    assert_eq!(common::location(&page), "/login");

    let post = app
        .post_form("/upload", &[("photo", common::PNG_DATA_URL)], None)
        .await;
    assert_eq!(post.status(), StatusCode::SEE_OTHER);
    assert!(app.received.lock().unwrap().is_empty());

    app.cleanup();
}

#[tokio::test]
async fn upload_page_renders_for_logged_in_user() {
    let app = TestApp::spawn().await;
    let cookie = app.signup("testuser", "password").await;

    let response = app.get("/upload", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(r#"name="photo""#));

    app.cleanup();
}

#[tokio::test]
async fn upload_identifies_photo_and_redirects_to_result() {
    let app = TestApp::spawn().await;
    let cookie = app.signup("testuser", "password").await;

    let location = app.upload_sample(&cookie).await;
    let filename = location
        .strip_prefix("/results/")
        .expect("unexpected redirect target")
        .to_string();
    assert!(filename.ends_with(".png"));
    assert!(app.uploads_dir.join(&filename).exists());

    {
        let received = app.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].field, "image");
        assert_eq!(received[0].file_name.as_deref(), Some(filename.as_str()));
        assert_eq!(received[0].content_type.as_deref(), Some("image/png"));
        assert!(received[0].size > 0);
    }

    let prediction = app
        .state
        .repository
        .find_prediction(&filename, "testuser")
        .await
        .unwrap()
        .expect("prediction was not stored");
    assert_eq!(prediction.plant_name, "Rose");
    assert!(prediction.entry_id.is_some());

    let result = app.get(&location, Some(&cookie)).await;
    assert_eq!(result.status(), StatusCode::OK);
    let body = body_text(result).await;
    assert!(body.contains("Rose"));
    assert!(body.contains(&format!("/uploads/{}", filename)));

    let photo = app.get(&format!("/uploads/{}", filename), None).await;
    assert_eq!(photo.status(), StatusCode::OK);

    app.cleanup();
}

#[tokio::test]
async fn upload_without_photo_is_bad_request() {
    let app = TestApp::spawn().await;
    let cookie = app.signup("testuser", "password").await;

    let response = app.post_form("/upload", &[], Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("No photo data received"));

    let blank = app
        .post_form("/upload", &[("photo", "  ")], Some(&cookie))
        .await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    app.cleanup();
}

#[tokio::test]
async fn upload_with_invalid_data_fails_without_side_effects() {
    let app = TestApp::spawn().await;
    let cookie = app.signup("testuser", "password").await;

    let response = app
        .post_form("/upload", &[("photo", "invaliddata")], Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response)
        .await
        .contains("Error processing the photo"));

    assert!(app.received.lock().unwrap().is_empty());
    assert!(app
        .state
        .repository
        .list_predictions("testuser")
        .await
        .unwrap()
        .is_empty());

    app.cleanup();
}

#[tokio::test]
async fn classifier_failure_removes_saved_photo() {
    let app = TestApp::spawn_with(PredictionReply::Status(StatusCode::SERVICE_UNAVAILABLE)).await;
    let cookie = app.signup("testuser", "password").await;

    let response = app
        .post_form("/upload", &[("photo", common::PNG_DATA_URL)], Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response)
        .await
        .contains("Error processing the photo"));

    assert_eq!(app.received.lock().unwrap().len(), 1);
    let leftover = std::fs::read_dir(&app.uploads_dir).unwrap().count();
    assert_eq!(leftover, 0);
    assert!(app
        .state
        .repository
        .list_predictions("testuser")
        .await
        .unwrap()
        .is_empty());

    app.cleanup();
}

#[tokio::test]
async fn results_are_private_to_their_owner() {
    let app = TestApp::spawn().await;
    let owner = app.signup("owner", "password").await;
    let location = app.upload_sample(&owner).await;

    let stranger = app.signup("stranger", "password").await;
    let response = app.get(&location, Some(&stranger)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Result not found"));

    app.cleanup();
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = TestApp::spawn().await;
    let cookie = app.signup("testuser", "password").await;

    let huge = format!("data:image/png;base64,{}", "A".repeat(6 * 1024 * 1024));
    let response = app
        .post_form("/upload", &[("photo", huge.as_str())], Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.received.lock().unwrap().is_empty());

    app.cleanup();
}

#[tokio::test]
async fn unlabelled_classifier_reply_removes_saved_photo() {
    let app = TestApp::spawn_with(PredictionReply::Unlabelled).await;
    let cookie = app.signup("testuser", "password").await;

    let response = app
        .post_form("/upload", &[("photo", common::PNG_DATA_URL)], Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response)
        .await
        .contains("Error processing the photo"));

    assert_eq!(app.received.lock().unwrap().len(), 1);
    assert_eq!(std::fs::read_dir(&app.uploads_dir).unwrap().count(), 0);

    app.cleanup();
}

#[tokio::test]
async fn store_failure_leaves_no_entry_or_photo() {
    let app = TestApp::spawn_with_faults(Faults {
        insert_prediction: true,
        ..Faults::default()
    })
    .await;
    let cookie = app.signup("testuser", "password").await;

    let response = app
        .post_form("/upload", &[("photo", common::PNG_DATA_URL)], Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response)
        .await
        .contains("Error processing the photo"));

    assert!(app
        .state
        .repository
        .recent_plants("testuser", 3)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(std::fs::read_dir(&app.uploads_dir).unwrap().count(), 0);

    app.cleanup();
}

#[tokio::test]
async fn request_id_is_forwarded_to_classifier() {
    let app = TestApp::spawn().await;
    let cookie = app.signup("testuser", "password").await;

    let body = serde_urlencoded::to_string([("photo", common::PNG_DATA_URL)]).unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::COOKIE, cookie.as_str())
        .header("x-request-id", "upload-req-7")
        .body(Body::from(body))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let received = app.received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].request_id.as_deref(), Some("upload-req-7"));
    drop(received);

    app.cleanup();
}
