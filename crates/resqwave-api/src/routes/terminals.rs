//! Terminal registry routes

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use resqwave_core::{validate_coordinates, validate_terminal_id};
use resqwave_db::{NewTerminal, Terminal};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Register terminal request
#[derive(Debug, Deserialize)]
pub struct CreateTerminalRequest {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Terminal list response
#[derive(Serialize)]
pub struct TerminalListResponse {
    pub terminals: Vec<Terminal>,
    pub total: usize,
}

/// GET /api/v1/terminals
async fn list_terminals(
    State(state): State<AppState>,
) -> Result<Json<TerminalListResponse>, ApiError> {
    let terminals = state.db.list_terminals().await?;

    Ok(Json(TerminalListResponse {
        total: terminals.len(),
        terminals,
    }))
}

/// POST /api/v1/terminals
async fn create_terminal(
    State(state): State<AppState>,
    Json(request): Json<CreateTerminalRequest>,
) -> Result<(StatusCode, Json<Terminal>), ApiError> {
    validate_terminal_id(&request.id)?;
    validate_coordinates(request.latitude, request.longitude)?;

    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Terminal name must not be empty".to_string()));
    }

    let terminal = state
        .db
        .insert_terminal(NewTerminal {
            id: request.id,
            name: name.to_string(),
            latitude: request.latitude,
            longitude: request.longitude,
        })
        .await?;

    info!(
        "Registered terminal {} at ({}, {})",
        terminal.id, terminal.latitude, terminal.longitude
    );

    Ok((StatusCode::CREATED, Json(terminal)))
}

/// GET /api/v1/terminals/{id}
async fn get_terminal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Terminal>, ApiError> {
    let terminal = state
        .db
        .get_terminal(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Terminal '{}' not found", id)))?;

    Ok(Json(terminal))
}

/// DELETE /api/v1/terminals/{id}
async fn delete_terminal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.db.delete_terminal(&id).await? {
        return Err(ApiError::NotFound(format!("Terminal '{}' not found", id)));
    }

    info!("Deleted terminal {} and its cached forecast", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Create terminal routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/terminals", get(list_terminals).post(create_terminal))
        .route(
            "/api/v1/terminals/{id}",
            get(get_terminal).delete(delete_terminal),
        )
}

#[cfg(test)]
mod tests {
    use crate::routes::create_router;
    use crate::routes::test_support::harness;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    fn create_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/terminals")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_terminal_lifecycle() {
        let h = harness().await;
        let app = create_router(h.state.clone(), None);

        let response = app
            .clone()
            .oneshot(create_request(serde_json::json!({
                "id": "RSQW-171",
                "name": "Barangay 171",
                "latitude": 14.7566,
                "longitude": 121.0447
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(request("GET", "/api/v1/terminals"))
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["terminals"][0]["id"], "RSQW-171");

        // Populate the cache so the delete has something to cascade to
        h.state.weather.get_forecast("RSQW-171").await.unwrap();
        assert!(h.state.weather.peek("RSQW-171").await.unwrap().is_some());

        let response = app
            .clone()
            .oneshot(request("DELETE", "/api/v1/terminals/RSQW-171"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(h.state.weather.peek("RSQW-171").await.unwrap().is_none());

        let response = app
            .oneshot(request("GET", "/api/v1/terminals/RSQW-171"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_duplicate_terminal_conflicts() {
        let h = harness().await;
        let app = create_router(h.state, None);
        let body = serde_json::json!({
            "id": "RSQW-171",
            "name": "Barangay 171",
            "latitude": 14.7566,
            "longitude": 121.0447
        });

        let first = app.clone().oneshot(create_request(body.clone())).await.unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app.oneshot(create_request(body)).await.unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_invalid_registration_is_rejected() {
        let h = harness().await;
        let app = create_router(h.state, None);

        for body in [
            serde_json::json!({"id": "", "name": "x", "latitude": 0.0, "longitude": 0.0}),
            serde_json::json!({"id": "T1", "name": "x", "latitude": 91.0, "longitude": 0.0}),
            serde_json::json!({"id": "T1", "name": " ", "latitude": 0.0, "longitude": 0.0}),
        ] {
            let response = app.clone().oneshot(create_request(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        let response = app
            .oneshot(request("DELETE", "/api/v1/terminals/ghost"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
