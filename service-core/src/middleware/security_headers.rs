use axum::{extract::Request, http::header, middleware::Next, response::IntoResponse};

/// Standard hardening headers for server-rendered pages.
///
/// Images may come from the app itself or from `data:`/`blob:` URLs so the
/// upload form can preview a photo before it is submitted.
pub async fn security_headers_middleware(req: Request, next: Next) -> impl IntoResponse {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        header::HeaderValue::from_static("DENY"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        header::HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        header::HeaderValue::from_static(
            "default-src 'self'; \
             img-src 'self' data: blob:; \
             style-src 'self'; \
             script-src 'self'; \
             frame-ancestors 'none'",
        ),
    );

    response
}
