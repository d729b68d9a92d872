//! Web Call Routes - Browser Test Calls

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use crate::application::CallInitiation;
use crate::models::{CallFailedResponse, InitiateWebCallRequest, WebCallResponse};
use crate::routes::{error_response, ApiError};
use crate::AppState;

/// Open a browser-based call with an agent (no phone number needed)
#[utoipa::path(
    post,
    path = "/api/web-calls",
    request_body = InitiateWebCallRequest,
    responses(
        (status = 201, description = "Web call session created", body = WebCallResponse),
        (status = 400, description = "No agent configured"),
        (status = 502, description = "Provider rejected the call", body = CallFailedResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Call"
)]
pub async fn initiate_web_call(
    State(state): State<AppState>,
    Json(payload): Json<InitiateWebCallRequest>,
) -> Result<Response, ApiError> {
    let initiation = state
        .call_service
        .initiate_web_call(payload.into())
        .await
        .map_err(error_response)?;

    match initiation {
        CallInitiation::Placed(session) => {
            Ok((StatusCode::CREATED, Json(WebCallResponse::from(session))).into_response())
        }
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

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/web-calls", post(initiate_web_call))
        .route("/web-call-initiate", post(initiate_web_call))
}
