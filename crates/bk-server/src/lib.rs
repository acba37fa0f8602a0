//! HTTP server for brandkit.
//!
//! Exposes projects, deduplicated reference uploads, asset download and
//! deletion, and per-project selection as a JSON API over a shared
//! [`Studio`](bk_studio::Studio) and one logical session.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::BrandkitServer;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use bk_studio::Studio;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn app() -> Router {
        router::build_router(
            AppState::new(Arc::new(Studio::in_memory())),
            &ServerConfig::default(),
        )
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Body) -> (StatusCode, Vec<u8>) {
        let response = app
            .clone()
            .oneshot(Request::builder().method(method).uri(uri).body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(
        app: &Router,
        method: Method,
        uri: &str,
        body: Value,
    ) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn json(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    async fn create(app: &Router, name: &str) {
        let (status, _) =
            send_json(app, Method::POST, "/v1/projects", json!({ "name": name })).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (status, body) = send(&app(), Method::GET, "/v1/health", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["status"], "ok");
    }

    #[tokio::test]
    async fn project_lifecycle() {
        let app = app();
        create(&app, "demo").await;

        let (status, body) =
            send_json(&app, Method::POST, "/v1/projects", json!({ "name": "demo" })).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["retryable"], false);

        let (status, _) =
            send_json(&app, Method::POST, "/v1/projects", json!({ "name": "a/b" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, Method::GET, "/v1/projects", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)[0]["name"], "demo");

        let (status, body) = send(&app, Method::DELETE, "/v1/projects/demo", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["existed"], true);

        let (status, body) = send(&app, Method::DELETE, "/v1/projects/demo", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["existed"], false);
    }

    #[tokio::test]
    async fn reference_upload_is_deduplicated() {
        let app = app();
        create(&app, "demo").await;

        let uri = "/v1/projects/demo/references?filename=a.png";
        let (status, first) = send(&app, Method::POST, uri, Body::from("B1")).await;
        assert_eq!(status, StatusCode::CREATED);
        let first = json(&first);
        assert_eq!(first["created"], true);

        let uri = "/v1/projects/demo/references?filename=b.png";
        let (status, second) = send(&app, Method::POST, uri, Body::from("B1")).await;
        assert_eq!(status, StatusCode::OK);
        let second = json(&second);
        assert_eq!(second["created"], false);
        assert_eq!(second["id"], first["id"]);

        let (status, body) = send(
            &app,
            Method::GET,
            "/v1/projects/demo/assets?category=reference",
            Body::empty(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body).as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upload_to_unknown_project_is_not_found() {
        let (status, _) = send(
            &app(),
            Method::POST,
            "/v1/projects/ghost/references",
            Body::from("B1"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn asset_download_and_delete() {
        let app = app();
        create(&app, "demo").await;

        let (_, body) = send(
            &app,
            Method::POST,
            "/v1/projects/demo/imports?filename=mine.png",
            Body::from("pixels"),
        )
        .await;
        let id = json(&body)["id"].as_str().unwrap().to_string();

        let uri = format!("/v1/assets/{id}");
        let (status, content) = send(&app, Method::GET, &uri, Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content, b"pixels");

        let (status, body) = send(&app, Method::DELETE, &uri, Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["deleted"], true);

        let (status, _) = send(&app, Method::GET, &uri, Body::empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, Method::DELETE, &uri, Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["deleted"], false);

        let (status, _) = send(&app, Method::GET, "/v1/assets/not-an-id", Body::empty()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn selection_roundtrip_and_fallback() {
        let app = app();
        create(&app, "demo").await;

        let mut ids = Vec::new();
        for name in ["g1.png", "g2.png"] {
            let (_, body) = send(
                &app,
                Method::POST,
                &format!("/v1/projects/demo/imports?filename={name}"),
                Body::from(name),
            )
            .await;
            ids.push(json(&body)["id"].as_str().unwrap().to_string());
        }

        let (status, body) = send_json(
            &app,
            Method::PUT,
            "/v1/projects/demo/selection",
            json!({ "id": ids[1] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], ids[1].as_str());

        send(&app, Method::DELETE, &format!("/v1/assets/{}", ids[1]), Body::empty()).await;

        let (status, body) =
            send(&app, Method::GET, "/v1/projects/demo/selection", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["id"], ids[0].as_str());
    }

    #[tokio::test]
    async fn selecting_a_reference_is_rejected() {
        let app = app();
        create(&app, "demo").await;
        let (_, body) = send(
            &app,
            Method::POST,
            "/v1/projects/demo/references",
            Body::from("B1"),
        )
        .await;
        let id = json(&body)["id"].clone();

        let (status, _) =
            send_json(&app, Method::PUT, "/v1/projects/demo/selection", json!({ "id": id })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let studio = Arc::new(Studio::in_memory());
        studio
            .create_project(&"demo".parse().unwrap())
            .unwrap();
        let config = ServerConfig {
            max_upload_bytes: 4,
            ..ServerConfig::default()
        };
        let app = router::build_router(AppState::new(studio), &config);

        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/projects/demo/references",
            Body::from("way too large"),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }
}
