//! Retell REST Gateway
//!
//! Implements `CallProvider` against the Retell HTTP API using reqwest.
//! Retell request/response shapes stay private to this module.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use denwa::{
    CallProvider, DomainError, PhoneCallRequest, PhoneNumber, PhoneNumberImport, PlacedCall,
    PlacedWebCall, WebCallRequest,
};

use crate::config::ProviderConfig;

/// Dashboard page that lets a person talk to an agent from the browser
const TEST_AGENT_URL: &str = "https://dashboard.retellai.com/test-agent";

/// Retell implementation of CallProvider
pub struct RetellGateway {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RetellGateway {
    pub fn new(config: &ProviderConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("denwa/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, DomainError> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| DomainError::Provider(format!("Retell request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(DomainError::Provider(format!(
            "Retell returned {}: {}",
            status,
            body.trim()
        )))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, DomainError> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| DomainError::Provider(format!("Unexpected Retell response: {e}")))
    }
}

// ============================================
// Retell wire types
// ============================================

#[derive(Serialize)]
struct CreatePhoneCallBody<'a> {
    from_number: &'a str,
    to_number: &'a str,
    override_agent_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retell_llm_dynamic_variables: Option<&'a HashMap<String, String>>,
}

#[derive(Serialize)]
struct CreateWebCallBody<'a> {
    agent_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retell_llm_dynamic_variables: Option<&'a HashMap<String, String>>,
}

fn non_empty_map(
    map: &serde_json::Map<String, serde_json::Value>,
) -> Option<&serde_json::Map<String, serde_json::Value>> {
    (!map.is_empty()).then_some(map)
}

fn non_empty_vars(vars: &HashMap<String, String>) -> Option<&HashMap<String, String>> {
    (!vars.is_empty()).then_some(vars)
}

#[derive(Deserialize)]
struct CallResponse {
    call_id: String,
    call_status: Option<String>,
    access_token: Option<String>,
    agent_id: Option<String>,
}

#[derive(Serialize)]
struct ImportPhoneNumberBody<'a> {
    phone_number: &'a str,
    termination_uri: &'a str,
    transport: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sip_trunk_auth_username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sip_trunk_auth_password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inbound_agent_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outbound_agent_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nickname: Option<&'a str>,
}

#[async_trait]
impl CallProvider for RetellGateway {
    async fn place_call(&self, request: PhoneCallRequest) -> Result<PlacedCall, DomainError> {
        let body = CreatePhoneCallBody {
            from_number: &request.from_number,
            to_number: &request.to_number,
            override_agent_id: &request.agent_id,
            metadata: non_empty_map(&request.metadata),
            retell_llm_dynamic_variables: non_empty_vars(&request.dynamic_variables),
        };

        let call: CallResponse = self
            .send_json(self.client.post(self.url("/v2/create-phone-call")).json(&body))
            .await?;

        tracing::info!(
            "Retell call created | call_id={} | status={}",
            call.call_id,
            call.call_status.as_deref().unwrap_or("unknown")
        );

        Ok(PlacedCall {
            remote_call_id: call.call_id,
            provider_status: call.call_status,
        })
    }

    async fn place_web_call(
        &self,
        request: WebCallRequest,
    ) -> Result<PlacedWebCall, DomainError> {
        let body = CreateWebCallBody {
            agent_id: &request.agent_id,
            metadata: non_empty_map(&request.metadata),
            retell_llm_dynamic_variables: non_empty_vars(&request.dynamic_variables),
        };

        let call: CallResponse = self
            .send_json(self.client.post(self.url("/v2/create-web-call")).json(&body))
            .await?;

        let access_token = call.access_token.ok_or_else(|| {
            DomainError::Provider("Retell web call response has no access_token".to_string())
        })?;
        let agent_id = call.agent_id.unwrap_or(request.agent_id);

        Ok(PlacedWebCall {
            remote_call_id: call.call_id,
            access_token,
            test_url: format!("{}/{}", TEST_AGENT_URL, agent_id),
        })
    }

    async fn import_number(
        &self,
        request: PhoneNumberImport,
    ) -> Result<PhoneNumber, DomainError> {
        let body = ImportPhoneNumberBody {
            phone_number: &request.phone_number,
            termination_uri: &request.termination_uri,
            transport: request.transport.to_string(),
            sip_trunk_auth_username: request.sip_trunk_auth_username.as_deref(),
            sip_trunk_auth_password: request.sip_trunk_auth_password.as_deref(),
            inbound_agent_id: request.inbound_agent_id.as_deref(),
            outbound_agent_id: request.outbound_agent_id.as_deref(),
            nickname: request.nickname.as_deref(),
        };

        tracing::info!(
            "Importing phone number {} into Retell (trunk={})",
            request.phone_number,
            request.termination_uri
        );

        self.send_json(self.client.post(self.url("/import-phone-number")).json(&body))
            .await
    }

    async fn list_numbers(&self) -> Result<Vec<PhoneNumber>, DomainError> {
        self.send_json(self.client.get(self.url("/list-phone-numbers")))
            .await
    }

    async fn remove_number(&self, phone_number: &str) -> Result<(), DomainError> {
        let mut url = reqwest::Url::parse(&self.url("/delete-phone-number"))
            .map_err(|e| DomainError::Provider(format!("Invalid Retell base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| DomainError::Provider("Invalid Retell base URL".to_string()))?
            .push(phone_number);

        tracing::info!("Deleting phone number {} from Retell", phone_number);
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer) -> RetellGateway {
        RetellGateway::new(&ProviderConfig {
            api_key: "key_test".to_string(),
            api_base_url: server.uri(),
            default_agent_id: None,
            default_from_number: None,
            default_to_number: None,
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_place_call_sends_override_agent_and_variables() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/create-phone-call"))
            .and(header("authorization", "Bearer key_test"))
            .and(body_json(json!({
                "from_number": "+15550000000",
                "to_number": "+15551234567",
                "override_agent_id": "agent_1",
                "retell_llm_dynamic_variables": { "customer_name": "Ada" }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "call_id": "rc_1",
                "call_status": "registered"
            })))
            .mount(&server)
            .await;

        let placed = gateway(&server)
            .place_call(PhoneCallRequest {
                to_number: "+15551234567".to_string(),
                from_number: "+15550000000".to_string(),
                agent_id: "agent_1".to_string(),
                dynamic_variables: HashMap::from([(
                    "customer_name".to_string(),
                    "Ada".to_string(),
                )]),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(placed.remote_call_id, "rc_1");
        assert_eq!(placed.provider_status.as_deref(), Some("registered"));
    }

    #[tokio::test]
    async fn test_error_status_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/create-phone-call"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid to_number"))
            .mount(&server)
            .await;

        let result = gateway(&server)
            .place_call(PhoneCallRequest {
                to_number: "bogus".to_string(),
                from_number: "+15550000000".to_string(),
                agent_id: "agent_1".to_string(),
                ..Default::default()
            })
            .await;

        match result {
            Err(DomainError::Provider(message)) => assert!(message.contains("invalid to_number")),
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_web_call_builds_test_url_from_agent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/create-web-call"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "call_id": "rc_web",
                "access_token": "tok_123",
                "agent_id": "agent_7"
            })))
            .mount(&server)
            .await;

        let placed = gateway(&server)
            .place_web_call(WebCallRequest {
                agent_id: "agent_7".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(placed.remote_call_id, "rc_web");
        assert_eq!(placed.access_token, "tok_123");
        assert_eq!(
            placed.test_url,
            "https://dashboard.retellai.com/test-agent/agent_7"
        );
    }

    #[tokio::test]
    async fn test_list_numbers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list-phone-numbers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "phone_number": "+15550000000",
                    "nickname": "Main line",
                    "phone_number_type": "custom",
                    "inbound_agent_id": null,
                    "outbound_agent_id": "agent_1"
                }
            ])))
            .mount(&server)
            .await;

        let numbers = gateway(&server).list_numbers().await.unwrap();
        assert_eq!(numbers.len(), 1);
        assert_eq!(numbers[0].nickname.as_deref(), Some("Main line"));
    }

    #[tokio::test]
    async fn test_remove_number_hits_number_path() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/delete-phone-number/+15550000000"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        gateway(&server)
            .remove_number("+15550000000")
            .await
            .unwrap();
    }
}
