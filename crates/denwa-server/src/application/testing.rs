//! Test doubles for application and route tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use denwa::{
    CallProvider, CallRepository, CallStatus, DomainError, PhoneCallRequest, PhoneNumber,
    PhoneNumberImport, PlacedCall, PlacedWebCall, WebCallRequest,
};

use crate::adapters::memory::InMemoryCallRepository;

/// Provider that hands out `rc_1`, `rc_2`, ... or fails every request
#[derive(Default)]
pub struct FakeProvider {
    failure: Option<String>,
    next_id: AtomicUsize,
    repo: OnceLock<Arc<InMemoryCallRepository>>,
    phone_requests: Mutex<Vec<PhoneCallRequest>>,
    statuses_seen: Mutex<Vec<Option<CallStatus>>>,
    numbers: Mutex<Vec<PhoneNumber>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Record the status of each call at the moment it is placed
    pub fn watch(&self, repo: Arc<InMemoryCallRepository>) {
        let _ = self.repo.set(repo);
    }

    pub async fn phone_requests(&self) -> Vec<PhoneCallRequest> {
        self.phone_requests.lock().await.clone()
    }

    pub async fn statuses_seen(&self) -> Vec<Option<CallStatus>> {
        self.statuses_seen.lock().await.clone()
    }

    fn check(&self) -> Result<String, DomainError> {
        match &self.failure {
            Some(message) => Err(DomainError::Provider(message.clone())),
            None => Ok(format!(
                "rc_{}",
                self.next_id.fetch_add(1, Ordering::SeqCst) + 1
            )),
        }
    }
}

#[async_trait]
impl CallProvider for FakeProvider {
    async fn place_call(&self, request: PhoneCallRequest) -> Result<PlacedCall, DomainError> {
        if let Some(repo) = self.repo.get() {
            let id = request
                .metadata
                .get("internal_call_id")
                .and_then(|v| v.as_str())
                .and_then(|v| Uuid::parse_str(v).ok());
            if let Some(id) = id {
                let status = repo.find_by_id(id).await?.map(|c| c.status);
                self.statuses_seen.lock().await.push(status);
            }
        }
        self.phone_requests.lock().await.push(request);

        Ok(PlacedCall {
            remote_call_id: self.check()?,
            provider_status: Some("registered".to_string()),
        })
    }

    async fn place_web_call(
        &self,
        request: WebCallRequest,
    ) -> Result<PlacedWebCall, DomainError> {
        let remote_call_id = self.check()?;
        Ok(PlacedWebCall {
            access_token: format!("token_{}", remote_call_id),
            test_url: format!("https://dashboard.example/test-agent/{}", request.agent_id),
            remote_call_id,
        })
    }

    async fn import_number(
        &self,
        request: PhoneNumberImport,
    ) -> Result<PhoneNumber, DomainError> {
        self.check()?;
        let number = PhoneNumber {
            phone_number: request.phone_number,
            nickname: request.nickname,
            phone_number_type: Some("custom".to_string()),
            inbound_agent_id: request.inbound_agent_id,
            outbound_agent_id: request.outbound_agent_id,
        };
        self.numbers.lock().await.push(number.clone());
        Ok(number)
    }

    async fn list_numbers(&self) -> Result<Vec<PhoneNumber>, DomainError> {
        self.check()?;
        Ok(self.numbers.lock().await.clone())
    }

    async fn remove_number(&self, phone_number: &str) -> Result<(), DomainError> {
        self.check()?;
        self.numbers
            .lock()
            .await
            .retain(|n| n.phone_number != phone_number);
        Ok(())
    }
}
