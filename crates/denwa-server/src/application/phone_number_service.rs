//! Phone Number Application Service
//!
//! Pass-through to the provider for SIP trunk number management. Nothing
//! is stored locally.

use std::sync::Arc;

use denwa::{CallProvider, DomainError, PhoneNumber, PhoneNumberImport};

/// Application service for provider phone numbers
pub struct PhoneNumberService<P: CallProvider + ?Sized> {
    provider: Arc<P>,
    default_agent_id: Option<String>,
}

impl<P: CallProvider + ?Sized> PhoneNumberService<P> {
    pub fn new(provider: Arc<P>, default_agent_id: Option<String>) -> Self {
        Self {
            provider,
            default_agent_id,
        }
    }

    /// Import a number; unset agents fall back to the default agent
    pub async fn import(&self, mut request: PhoneNumberImport) -> Result<PhoneNumber, DomainError> {
        if request.phone_number.trim().is_empty() {
            return Err(DomainError::Validation("phone_number is required".to_string()));
        }
        if request.termination_uri.trim().is_empty() {
            return Err(DomainError::Validation(
                "termination_uri is required".to_string(),
            ));
        }

        if request.inbound_agent_id.is_none() {
            request.inbound_agent_id = self.default_agent_id.clone();
        }
        if request.outbound_agent_id.is_none() {
            request.outbound_agent_id = self.default_agent_id.clone();
        }

        let number = self.provider.import_number(request).await?;
        tracing::info!("Imported phone number {}", number.phone_number);
        Ok(number)
    }

    pub async fn list(&self) -> Result<Vec<PhoneNumber>, DomainError> {
        self.provider.list_numbers().await
    }

    pub async fn remove(&self, phone_number: &str) -> Result<(), DomainError> {
        if phone_number.trim().is_empty() {
            return Err(DomainError::Validation("phone_number is required".to_string()));
        }
        self.provider.remove_number(phone_number).await?;
        tracing::info!("Removed phone number {}", phone_number);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::FakeProvider;
    use denwa::SipTransport;

    fn import(number: &str) -> PhoneNumberImport {
        PhoneNumberImport {
            phone_number: number.to_string(),
            termination_uri: "trunk-1.sip.example.net".to_string(),
            transport: SipTransport::Udp,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_import_defaults_agents() {
        let service =
            PhoneNumberService::new(Arc::new(FakeProvider::new()), Some("agent_1".to_string()));

        let number = service.import(import("+15550000000")).await.unwrap();
        assert_eq!(number.inbound_agent_id.as_deref(), Some("agent_1"));
        assert_eq!(number.outbound_agent_id.as_deref(), Some("agent_1"));
    }

    #[tokio::test]
    async fn test_import_list_remove() {
        let service = PhoneNumberService::new(Arc::new(FakeProvider::new()), None);

        service.import(import("+15550000000")).await.unwrap();
        service.import(import("+15550000001")).await.unwrap();
        assert_eq!(service.list().await.unwrap().len(), 2);

        service.remove("+15550000000").await.unwrap();
        let numbers = service.list().await.unwrap();
        assert_eq!(numbers.len(), 1);
        assert_eq!(numbers[0].phone_number, "+15550000001");
    }

    #[tokio::test]
    async fn test_import_requires_termination_uri() {
        let service = PhoneNumberService::new(Arc::new(FakeProvider::new()), None);
        let mut request = import("+15550000000");
        request.termination_uri = String::new();

        assert!(matches!(
            service.import(request).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let service = PhoneNumberService::new(Arc::new(FakeProvider::failing("down")), None);
        assert!(matches!(
            service.list().await,
            Err(DomainError::Provider(_))
        ));
    }
}
