//! Denwa API Client

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

/// API Client for Denwa
pub struct DenwaClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

// ============================================
// API Request / Response Types
// ============================================

#[derive(Debug, Default, Serialize)]
pub struct InitiateCallRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InitiateCallResponse {
    pub id: Uuid,
    pub remote_call_id: Option<String>,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct CallFailedResponse {
    pub id: Uuid,
    pub error: String,
}

#[derive(Debug, Default, Serialize)]
pub struct InitiateWebCallRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WebCallResponse {
    pub id: Uuid,
    pub remote_call_id: Option<String>,
    pub access_token: String,
    pub test_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CallSummary {
    pub id: Uuid,
    pub remote_call_id: Option<String>,
    pub lead_name: Option<String>,
    pub lead_phone: Option<String>,
    pub kind: String,
    pub status: String,
    pub duration_ms: Option<i64>,
    pub has_transcript: bool,
    pub has_summary: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CallListResponse {
    pub total: usize,
    pub calls: Vec<CallSummary>,
}

#[derive(Debug, Deserialize)]
pub struct CallDetail {
    pub id: Uuid,
    pub remote_call_id: Option<String>,
    pub lead_id: Option<String>,
    pub lead_name: Option<String>,
    pub lead_phone: Option<String>,
    pub kind: String,
    pub status: String,
    pub transcript: Option<String>,
    pub call_summary: Option<String>,
    pub recording_url: Option<String>,
    pub duration_ms: Option<i64>,
    pub disconnection_reason: Option<String>,
    pub error_detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ImportPhoneNumberRequest {
    pub phone_number: String,
    pub termination_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sip_trunk_auth_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sip_trunk_auth_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PhoneNumberResponse {
    pub phone_number: String,
    pub nickname: Option<String>,
    pub outbound_agent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PhoneNumberListResponse {
    pub count: usize,
    pub phone_numbers: Vec<PhoneNumberResponse>,
}

impl DenwaClient {
    /// Create a new API client
    pub fn new(base_url: &str, api_key: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(|k| k.to_string()),
        }
    }

    /// Test connection with health check
    pub async fn health(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        let resp = self.client.get(&url).send().await?;
        Ok(resp.status().is_success())
    }

    /// Check that the API key is accepted
    pub async fn check_auth(&self) -> Result<()> {
        let resp = self.send(self.client.get(self.url("/config/check"))).await?;
        expect_success(resp).await.map(|_| ())
    }

    /// Place an outbound phone call
    pub async fn place_call(&self, request: &InitiateCallRequest) -> Result<InitiateCallResponse> {
        let resp = self
            .send(self.client.post(self.url("/api/calls")).json(request))
            .await?;

        if resp.status() == StatusCode::BAD_GATEWAY {
            let failed: CallFailedResponse =
                resp.json().await.context("Failed to parse response")?;
            bail!("Call {} failed: {}", failed.id, failed.error);
        }

        decode(resp).await
    }

    /// Open a browser web call
    pub async fn place_web_call(&self, request: &InitiateWebCallRequest) -> Result<WebCallResponse> {
        let resp = self
            .send(self.client.post(self.url("/api/web-calls")).json(request))
            .await?;

        if resp.status() == StatusCode::BAD_GATEWAY {
            let failed: CallFailedResponse =
                resp.json().await.context("Failed to parse response")?;
            bail!("Web call {} failed: {}", failed.id, failed.error);
        }

        decode(resp).await
    }

    /// List calls, newest first
    pub async fn list_calls(&self, limit: Option<i64>) -> Result<CallListResponse> {
        let mut request = self.client.get(self.url("/api/calls"));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        decode(self.send(request).await?).await
    }

    /// Get one call by internal or provider ID
    pub async fn get_call(&self, id: &str) -> Result<CallDetail> {
        let path = format!("/api/calls/{}", urlencoding::encode(id));
        decode(self.send(self.client.get(self.url(&path))).await?).await
    }

    /// Import a SIP trunk number
    pub async fn import_number(
        &self,
        request: &ImportPhoneNumberRequest,
    ) -> Result<PhoneNumberResponse> {
        let resp = self
            .send(self.client.post(self.url("/api/phone-numbers")).json(request))
            .await?;
        decode(resp).await
    }

    /// List registered numbers
    pub async fn list_numbers(&self) -> Result<PhoneNumberListResponse> {
        decode(self.send(self.client.get(self.url("/api/phone-numbers"))).await?).await
    }

    /// Remove a number from the provider
    pub async fn remove_number(&self, phone_number: &str) -> Result<()> {
        let path = format!("/api/phone-numbers/{}", urlencoding::encode(phone_number));
        let resp = self.send(self.client.delete(self.url(&path))).await?;
        expect_success(resp).await.map(|_| ())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        };
        request
            .send()
            .await
            .context("Failed to connect to Denwa API")
    }
}

async fn expect_success(resp: Response) -> Result<Response> {
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("API error ({}): {}", status, body);
    }
    Ok(resp)
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    expect_success(resp)
        .await?
        .json()
        .await
        .context("Failed to parse response")
}
