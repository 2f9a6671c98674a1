//! HTTP routing for the mock API.
//!
//! Binds the CRUD and spec routes and wraps the whole surface with the
//! chaos middleware. Request bodies are decoded by hand from raw bytes so
//! that malformed JSON maps through the project error taxonomy instead of
//! a transport-level rejection.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde_json::Value;
use tower_http::trace::TraceLayer;

use crate::chaos::{self, ChaosConfig};
use crate::error::ApiError;
use crate::patch::PatchOp;
use crate::spec::SpecDocument;
use crate::store::{Document, ObjectStore};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ObjectStore>,
    pub spec: Arc<SpecDocument>,
}

/// Build the axum router with all mock API endpoints.
pub fn build_router(state: AppState, chaos: ChaosConfig) -> Router {
    Router::new()
        .route("/openapi.yaml", get(serve_spec))
        .route("/openapi.yml", get(serve_spec))
        .route("/:object_type", get(list_objects).post(create_object))
        .route(
            "/:object_type/:object_id",
            get(get_object)
                .put(replace_object)
                .patch(patch_object)
                .delete(delete_object),
        )
        .layer(middleware::from_fn_with_state(chaos, chaos::inject))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn serve_spec(State(state): State<AppState>) -> Result<String, ApiError> {
    state
        .spec
        .render()
        .map_err(|e| ApiError::Internal(e.to_string()))
}

async fn list_objects(
    State(state): State<AppState>,
    Path(object_type): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    state.store.list(&object_type).await.map(Json)
}

async fn get_object(
    State(state): State<AppState>,
    Path((object_type, object_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    state.store.get(&object_type, &object_id).await.map(Json)
}

async fn create_object(
    State(state): State<AppState>,
    Path(object_type): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let doc = decode_document(&body)?;
    let created = state.store.create(&object_type, doc).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn replace_object(
    State(state): State<AppState>,
    Path((object_type, object_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let doc = decode_document(&body)?;
    state.store.replace(&object_type, &object_id, doc).await?;
    Ok(StatusCode::OK)
}

async fn patch_object(
    State(state): State<AppState>,
    Path((object_type, object_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let ops: Vec<PatchOp> =
        serde_json::from_slice(&body).map_err(|e| ApiError::InvalidPatch(e.to_string()))?;
    state
        .store
        .apply_patch(&object_type, &object_id, &ops)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_object(
    State(state): State<AppState>,
    Path((object_type, object_id)): Path<(String, String)>,
) -> StatusCode {
    state.store.delete(&object_type, &object_id).await;
    StatusCode::NO_CONTENT
}

/// Decode a request body as a JSON object.
fn decode_document(body: &[u8]) -> Result<Document, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidDocument(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::json;
    use tower::util::ServiceExt;
    use uuid::Uuid;

    fn test_state() -> AppState {
        let dataset = serde_json::from_value(json!({
            "weather": {
                "0": { "city": "Lyon", "weather": "Moderate rain" },
                "1": { "city": "Brest", "weather": "Sunny" }
            }
        }))
        .unwrap();
        AppState {
            store: Arc::new(ObjectStore::from_dataset(dataset)),
            spec: Arc::new(SpecDocument::empty()),
        }
    }

    fn app() -> Router {
        build_router(test_state(), ChaosConfig::default())
    }

    fn request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn get_object_includes_id() {
        let response = app()
            .oneshot(request("GET", "/weather/0", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"id": "0", "city": "Lyon", "weather": "Moderate rain"})
        );
    }

    #[tokio::test]
    async fn get_unknown_object_is_404() {
        let response = app()
            .oneshot(request("GET", "/weather/4", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({"error": "weather/4 not found"})
        );
    }

    #[tokio::test]
    async fn list_returns_every_object_with_id() {
        let response = app().oneshot(request("GET", "/weather", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let docs = body_json(response).await;
        let docs = docs.as_array().unwrap();
        assert_eq!(docs.len(), 2);
        let lyon = docs.iter().find(|d| d["id"] == "0").unwrap();
        assert_eq!(lyon["city"], "Lyon");
    }

    #[tokio::test]
    async fn list_unknown_type_is_404_with_error_body() {
        let response = app().oneshot(request("GET", "/obj", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response
                .headers()
                .get(header::X_CONTENT_TYPE_OPTIONS)
                .unwrap(),
            "nosniff"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(
            body_json(response).await,
            json!({"error": "unknown object type: obj"})
        );
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let app = app();

        let response = app
            .clone()
            .oneshot(request("POST", "/weather", r#"{"data": "x"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let created = body_json(response).await;
        let id = created["id"].as_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
        assert_eq!(created["data"], "x");

        let response = app
            .oneshot(request("GET", &format!("/weather/{id}"), ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, created);
    }

    #[tokio::test]
    async fn create_ignores_client_supplied_id() {
        let response = app()
            .oneshot(request("POST", "/weather", r#"{"id": "mine", "data": "x"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_ne!(created["id"], "mine");
    }

    #[tokio::test]
    async fn create_unknown_type_is_404() {
        let response = app()
            .oneshot(request("POST", "/obj", r#"{"data": "x"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_malformed_body_is_500() {
        let response = app()
            .oneshot(request("POST", "/weather", r#"{"data"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn put_replaces_document() {
        let app = app();

        let response = app
            .clone()
            .oneshot(request("PUT", "/weather/0", r#"{"data": "test"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(request("GET", "/weather/0", "")).await.unwrap();
        assert_eq!(
            body_json(response).await,
            json!({"id": "0", "data": "test"})
        );
    }

    #[tokio::test]
    async fn put_unknown_object_is_404() {
        let response = app()
            .oneshot(request("PUT", "/weather/4", r#"{"data": "test"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn put_malformed_body_is_500() {
        let response = app()
            .oneshot(request("PUT", "/weather/0", r#"{"data": "test""#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn patch_updates_document() {
        let app = app();

        let response = app
            .clone()
            .oneshot(request(
                "PATCH",
                "/weather/0",
                r#"[{"op": "add", "path": "/country", "value": "France"},
                    {"op": "replace", "path": "/city", "value": "Nantes"}]"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.oneshot(request("GET", "/weather/0", "")).await.unwrap();
        assert_eq!(
            body_json(response).await,
            json!({
                "id": "0",
                "city": "Nantes",
                "country": "France",
                "weather": "Moderate rain"
            })
        );
    }

    #[tokio::test]
    async fn failed_patch_leaves_document_unchanged() {
        let app = app();

        let response = app
            .clone()
            .oneshot(request(
                "PATCH",
                "/weather/0",
                r#"[{"op": "replace", "path": "/city", "value": "Nantes"},
                    {"op": "test", "path": "/weather", "value": "wrong"}]"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = app.oneshot(request("GET", "/weather/0", "")).await.unwrap();
        assert_eq!(
            body_json(response).await,
            json!({"id": "0", "city": "Lyon", "weather": "Moderate rain"})
        );
    }

    #[tokio::test]
    async fn patch_with_unknown_op_is_500() {
        let response = app()
            .oneshot(request("PATCH", "/weather/0", r#"[{"data": "test"}]"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn patch_with_invalid_json_is_500() {
        let response = app()
            .oneshot(request("PATCH", "/weather/0", r#"[{"data": "test"]"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn patch_unknown_object_is_404() {
        let response = app()
            .oneshot(request(
                "PATCH",
                "/weather/4",
                r#"[{"op": "remove", "path": "/city"}]"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let app = app();

        let response = app
            .clone()
            .oneshot(request("DELETE", "/weather/0", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .clone()
            .oneshot(request("GET", "/weather/0", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Deleting the same object again reports the same success.
        let response = app
            .oneshot(request("DELETE", "/weather/0", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn spec_route_serves_loaded_document() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/openapi.yaml");
        let state = AppState {
            store: Arc::new(ObjectStore::new()),
            spec: Arc::new(SpecDocument::from_file(std::path::Path::new(path)).unwrap()),
        };
        let app = build_router(state, ChaosConfig::default());

        for uri in ["/openapi.yaml", "/openapi.yml"] {
            let response = app.clone().oneshot(request("GET", uri, "")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body = String::from_utf8(bytes.to_vec()).unwrap();
            assert!(body.contains("openapi: 3.0.0"));
        }
    }

    #[tokio::test]
    async fn spec_route_without_document_is_empty_200() {
        let response = app()
            .oneshot(request("GET", "/openapi.yaml", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }
}
