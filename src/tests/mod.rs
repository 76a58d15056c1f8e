mod mock;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, Response};
use tower::ServiceExt;
use uuid::Uuid;

use crate::cache::PageCache;
use crate::media::MediaStore;
use crate::routes;
use crate::state::{load_templates, AppState};

use mock::MockService;

const TEST_BOUNDARY: &str = "quill-test-boundary";

/// The real router over the in-memory service.
fn app(svc: MockService) -> axum::Router {
    let state = AppState {
        svc,
        tera: Arc::new(load_templates().expect("templates parse")),
        cache: PageCache::new(Duration::from_secs(20)),
        media: MediaStore::new(tempfile::tempdir().expect("tempdir").into_path()),
        session_ttl: chrono::Duration::hours(2),
    };
    routes::router::<MockService>().with_state(state)
}

async fn send(app: &axum::Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.expect("router is infallible")
}

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("request")
}

fn get_as(path: &str, session: Uuid) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(header::COOKIE, format!("sessionid={session}"))
        .body(Body::empty())
        .expect("request")
}

fn post_form(path: &str, form: &str, session: Option<Uuid>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(session) = session {
        builder = builder.header(header::COOKIE, format!("sessionid={session}"));
    }
    builder.body(Body::from(form.to_string())).expect("request")
}

/// Multipart body as a browser would send the post form, text fields only.
fn post_multipart(path: &str, fields: &[(&str, &str)], session: Option<Uuid>) -> Request<Body> {
    post_multipart_with_file(path, fields, None, session)
}

fn post_multipart_with_file(
    path: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
    session: Option<Uuid>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{TEST_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{TEST_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{TEST_BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={TEST_BOUNDARY}"),
        );
    if let Some(session) = session {
        builder = builder.header(header::COOKIE, format!("sessionid={session}"));
    }
    builder.body(Body::from(body)).expect("request")
}

async fn body_text(resp: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

fn location(resp: &Response<Body>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
