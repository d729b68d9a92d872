//! Denwa API Routes
//!
//! - /api/calls - Outbound phone calls and call records
//! - /api/web-calls - Browser test calls
//! - /api/phone-numbers - SIP trunk number management
//! - /webhook/retell - Provider lifecycle events

use axum::http::StatusCode;

use denwa::DomainError;

pub mod call;
pub mod phone_number;
pub mod swagger;
pub mod web_call;
pub mod webhook;

/// Error type returned by every handler
pub type ApiError = (StatusCode, String);

/// Map a domain error onto the HTTP status it stands for
pub fn error_response(error: DomainError) -> ApiError {
    let status = match &error {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Provider(_) => StatusCode::BAD_GATEWAY,
        DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error.to_string())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use tower::ServiceExt;

    use crate::adapters::memory::InMemoryCallRepository;
    use crate::application::testing::FakeProvider;
    use crate::config::AppConfig;
    use crate::{app, AppState};

    pub const PROVIDER_KEY: &str = "key_test";

    pub fn config(extra: &[(&str, &str)]) -> AppConfig {
        let mut values: HashMap<String, String> = HashMap::from([
            ("RETELL_API_KEY".to_string(), PROVIDER_KEY.to_string()),
            ("RETELL_AGENT_ID".to_string(), "agent_1".to_string()),
            ("RETELL_FROM_NUMBER".to_string(), "+15550000000".to_string()),
        ]);
        for (key, value) in extra {
            values.insert(key.to_string(), value.to_string());
        }
        AppConfig::from_lookup(|key| values.get(key).cloned()).unwrap()
    }

    pub fn setup_app(provider: FakeProvider, config: AppConfig) -> (Router, Arc<InMemoryCallRepository>) {
        let repo = Arc::new(InMemoryCallRepository::new());
        let state = AppState::new(repo.clone(), Arc::new(provider), config);
        (app(state), repo)
    }

    pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    /// Send one request and decode the JSON body (`Null` when not JSON)
    pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }
}
