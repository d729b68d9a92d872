//! Phone Number Routes - SIP Trunk Numbers
//!
//! Pass-through to the provider; numbers are not stored locally.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};

use denwa::PhoneNumberImport;

use crate::models::{
    ImportPhoneNumberRequest, PhoneNumberListResponse, PhoneNumberResponse, StatusResponse,
};
use crate::routes::{error_response, ApiError};
use crate::AppState;

/// Import a phone number from a SIP trunk
#[utoipa::path(
    post,
    path = "/api/phone-numbers",
    request_body = ImportPhoneNumberRequest,
    responses(
        (status = 201, description = "Number imported", body = PhoneNumberResponse),
        (status = 400, description = "Invalid request or transport"),
        (status = 502, description = "Provider error")
    ),
    tag = "PhoneNumber"
)]
pub async fn import_phone_number(
    State(state): State<AppState>,
    Json(payload): Json<ImportPhoneNumberRequest>,
) -> Result<(StatusCode, Json<PhoneNumberResponse>), ApiError> {
    let request = PhoneNumberImport::try_from(payload).map_err(error_response)?;
    let number = state
        .phone_numbers
        .import(request)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(number.into())))
}

/// List phone numbers registered with the provider
#[utoipa::path(
    get,
    path = "/api/phone-numbers",
    responses(
        (status = 200, description = "Registered numbers", body = PhoneNumberListResponse),
        (status = 502, description = "Provider error")
    ),
    tag = "PhoneNumber"
)]
pub async fn list_phone_numbers(
    State(state): State<AppState>,
) -> Result<Json<PhoneNumberListResponse>, ApiError> {
    let numbers = state.phone_numbers.list().await.map_err(error_response)?;
    let phone_numbers: Vec<PhoneNumberResponse> =
        numbers.into_iter().map(PhoneNumberResponse::from).collect();

    Ok(Json(PhoneNumberListResponse {
        count: phone_numbers.len(),
        phone_numbers,
    }))
}

/// Remove a phone number from the provider (the carrier keeps it)
#[utoipa::path(
    delete,
    path = "/api/phone-numbers/{phone_number}",
    params(
        ("phone_number" = String, Path, description = "Number in E.164 format")
    ),
    responses(
        (status = 200, description = "Number removed", body = StatusResponse),
        (status = 502, description = "Provider error")
    ),
    tag = "PhoneNumber"
)]
pub async fn remove_phone_number(
    State(state): State<AppState>,
    Path(phone_number): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    state
        .phone_numbers
        .remove(&phone_number)
        .await
        .map_err(error_response)?;

    Ok(Json(StatusResponse::ok()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/phone-numbers",
            get(list_phone_numbers).post(import_phone_number),
        )
        .route("/api/phone-numbers/:phone_number", delete(remove_phone_number))
}
