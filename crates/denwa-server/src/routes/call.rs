//! Call Routes - Outbound Phone Calls
//!
//! HTTP handlers that delegate to CallService for the call lifecycle.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use crate::application::CallInitiation;
use crate::models::{
    CallDetailResponse, CallFailedResponse, CallListResponse, CallSummary, InitiateCallRequest,
    InitiateCallResponse, ListCallsQuery,
};
use crate::routes::{error_response, ApiError};
use crate::AppState;

/// Place an outbound phone call
#[utoipa::path(
    post,
    path = "/api/calls",
    request_body = InitiateCallRequest,
    responses(
        (status = 201, description = "Call placed with the provider", body = InitiateCallResponse),
        (status = 400, description = "Missing destination, caller ID or agent"),
        (status = 502, description = "Provider rejected the call", body = CallFailedResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Call"
)]
pub async fn initiate_call(
    State(state): State<AppState>,
    Json(payload): Json<InitiateCallRequest>,
) -> Result<Response, ApiError> {
    let initiation = state
        .call_service
        .initiate_call(payload.into())
        .await
        .map_err(error_response)?;

    match initiation {
        CallInitiation::Placed(record) => Ok((
            StatusCode::CREATED,
            Json(InitiateCallResponse::from(&record)),
        )
            .into_response()),
        CallInitiation::Failed { record, error } => Ok((
            StatusCode::BAD_GATEWAY,
            Json(CallFailedResponse {
                id: record.id,
                status: record.status.to_string(),
                error: error.to_string(),
            }),
        )
            .into_response()),
    }
}

/// List calls, newest first
#[utoipa::path(
    get,
    path = "/api/calls",
    params(ListCallsQuery),
    responses(
        (status = 200, description = "Calls, newest first", body = CallListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Call"
)]
pub async fn list_calls(
    State(state): State<AppState>,
    Query(query): Query<ListCallsQuery>,
) -> Result<Json<CallListResponse>, ApiError> {
    let calls = state
        .call_service
        .list_calls(query.limit.map(|limit| limit.max(0)))
        .await
        .map_err(error_response)?;

    let calls: Vec<CallSummary> = calls.into_iter().map(CallSummary::from).collect();
    Ok(Json(CallListResponse {
        total: calls.len(),
        calls,
    }))
}

/// Get a call by internal ID or provider call ID
#[utoipa::path(
    get,
    path = "/api/calls/{id}",
    params(
        ("id" = String, Path, description = "Internal call ID or provider call ID")
    ),
    responses(
        (status = 200, description = "Call found", body = CallDetailResponse),
        (status = 404, description = "Call not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Call"
)]
pub async fn get_call(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CallDetailResponse>, ApiError> {
    let record = state
        .call_service
        .get_call(&id)
        .await
        .map_err(error_response)?;

    Ok(Json(record.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/calls", get(list_calls).post(initiate_call))
        .route("/api/calls/:id", get(get_call))
        .route("/call-initiate", post(initiate_call))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::application::testing::FakeProvider;
    use crate::routes::testing::{config, get, json_request, send, setup_app};
    use denwa::{CallRepository, CallStatus};

    #[tokio::test]
    async fn test_initiate_call_returns_created() {
        let (app, repo) = setup_app(FakeProvider::new(), config(&[]));

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/calls",
                json!({ "to_number": "+15551234567", "lead_name": "Ada" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["remote_call_id"], "rc_1");
        assert_eq!(body["status"], "initiated");

        let calls = repo.list(None).await.unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].lead_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_alias_route_places_call() {
        let (app, _) = setup_app(FakeProvider::new(), config(&[]));

        let (status, _) = send(
            &app,
            json_request("POST", "/call-initiate", json!({ "to_number": "+15551234567" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_missing_destination_is_bad_request() {
        let (app, repo) = setup_app(FakeProvider::new(), config(&[]));

        let (status, _) = send(&app, json_request("POST", "/api/calls", json!({}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(repo.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_is_bad_gateway_with_record() {
        let (app, repo) = setup_app(FakeProvider::failing("carrier down"), config(&[]));

        let (status, body) = send(
            &app,
            json_request("POST", "/api/calls", json!({ "to_number": "+15551234567" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["status"], "failed");
        assert!(body["error"].as_str().unwrap().contains("carrier down"));

        let calls = repo.list(None).await.unwrap();
        assert_eq!(calls[0].status, CallStatus::Failed);
    }

    #[tokio::test]
    async fn test_list_and_get_calls() {
        let (app, _) = setup_app(FakeProvider::new(), config(&[]));
        for number in ["+15550000001", "+15550000002", "+15550000003"] {
            send(
                &app,
                json_request("POST", "/api/calls", json!({ "to_number": number })),
            )
            .await;
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let (status, body) = send(&app, get("/api/calls?limit=2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["calls"][0]["lead_phone"], "+15550000003");
        assert_eq!(body["calls"][0]["has_transcript"], false);

        let id = body["calls"][0]["id"].as_str().unwrap().to_string();
        let (status, body) = send(&app, get(&format!("/api/calls/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["remote_call_id"], "rc_3");

        let (status, body) = send(&app, get("/api/calls/rc_3")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id.as_str());
    }

    #[tokio::test]
    async fn test_unknown_call_is_not_found() {
        let (app, _) = setup_app(FakeProvider::new(), config(&[]));
        let (status, _) = send(&app, get("/api/calls/rc_missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_key_is_enforced_when_configured() {
        let (app, _) = setup_app(
            FakeProvider::new(),
            config(&[("DENWA_API_KEY", "secret")]),
        );

        let (status, _) = send(&app, get("/api/calls")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let request = axum::http::Request::builder()
            .uri("/api/calls")
            .header("authorization", "Bearer secret")
            .body(axum::body::Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
    }
}
