use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Serialize;
use teetime_core::credentials::CredentialResolver;
use teetime_core::notify::{NotificationReceipt, Notifier, NotifyError};
use tracing::{debug, warn};

use crate::receipt;

#[derive(Serialize)]
struct ProviderMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Sends through an external mail API authenticated with a vault-held key.
///
/// The key is resolved on every send, so rotation takes effect immediately
/// unless the resolver cache is enabled.
pub struct ThirdPartyChannelNotifier {
    client: Client,
    endpoint: String,
    sender_address: String,
    secret_name: String,
    resolver: Arc<CredentialResolver>,
}

impl ThirdPartyChannelNotifier {
    pub fn new(
        client: Client,
        api_base_url: String,
        sender_address: String,
        secret_name: String,
        resolver: Arc<CredentialResolver>,
    ) -> Self {
        let endpoint = format!("{}/messages", api_base_url.trim_end_matches('/'));
        Self { client, endpoint, sender_address, secret_name, resolver }
    }
}

#[async_trait]
impl Notifier for ThirdPartyChannelNotifier {
    fn provider(&self) -> &'static str {
        "third_party"
    }

    async fn send(
        &self,
        destination: &str,
        subject: &str,
        body: &str,
    ) -> Result<NotificationReceipt, NotifyError> {
        let credential = self.resolver.resolve(&self.secret_name).await.map_err(|error| {
            warn!(
                event_name = "notify.third_party.credential_unavailable",
                secret_name = %self.secret_name,
                error = %error,
                "notifier credential could not be resolved"
            );
            NotifyError::CredentialUnavailable(error)
        })?;

        debug!(event_name = "notify.third_party.send", endpoint = %self.endpoint, "posting to mail provider");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential.expose_secret())
            .json(&ProviderMessage {
                from: &self.sender_address,
                to: destination,
                subject,
                text: body,
            })
            .send()
            .await
            .map_err(|error| receipt::transport_error(self.provider(), error))?;

        receipt::from_response(self.provider(), response).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;
    use teetime_core::config::{SecretBinding, VaultBackend, VaultConfig};
    use teetime_core::credentials::{CredentialError, CredentialResolver, InMemorySecretStore};
    use teetime_core::notify::{Notifier, NotifyError};

    use super::ThirdPartyChannelNotifier;
    use crate::test_support::{spawn, MockReply};

    async fn resolver_with(payload: Option<&str>) -> Arc<CredentialResolver> {
        let store = Arc::new(InMemorySecretStore::default());
        if let Some(payload) = payload {
            store.insert("prod/notifier/api_key", payload).await;
        }
        let mut secrets = BTreeMap::new();
        secrets.insert(
            "notifier".to_string(),
            SecretBinding {
                path: "prod/notifier/api_key".to_string(),
                fields: vec!["API_KEY".to_string()],
            },
        );
        let vault = VaultConfig { backend: VaultBackend::Database, cache_credentials: false, secrets };
        Arc::new(CredentialResolver::new(store, &vault))
    }

    fn notifier(base_url: String, resolver: Arc<CredentialResolver>) -> ThirdPartyChannelNotifier {
        ThirdPartyChannelNotifier::new(
            reqwest::Client::new(),
            format!("{base_url}/v1/"),
            "tee-times@club.example".to_string(),
            "notifier".to_string(),
            resolver,
        )
    }

    #[tokio::test]
    async fn sends_bearer_credential_and_verified_sender() {
        let provider = spawn(
            "/v1/messages",
            MockReply { status: StatusCode::OK, body: json!({"messageId": "pm-123"}), message_id_header: None },
        )
        .await;
        let resolver = resolver_with(Some(r#"{"API_KEY":"abc"}"#)).await;

        let receipt = notifier(provider.base_url.clone(), resolver)
            .send("a@b.com", "Tee Time Booked", "booked")
            .await
            .expect("provider accepts");

        assert_eq!(receipt.provider, "third_party");
        assert_eq!(receipt.message_id, "pm-123");

        let captured = provider.captured();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].authorization.as_deref(), Some("Bearer abc"));
        assert_eq!(captured[0].body["from"], "tee-times@club.example");
        assert_eq!(captured[0].body["to"], "a@b.com");
        assert_eq!(captured[0].body["text"], "booked");
    }

    #[tokio::test]
    async fn missing_credential_never_reaches_provider() {
        let provider = spawn(
            "/v1/messages",
            MockReply { status: StatusCode::OK, body: json!({"id": "x"}), message_id_header: None },
        )
        .await;
        let resolver = resolver_with(None).await;

        let error = notifier(provider.base_url.clone(), resolver)
            .send("a@b.com", "s", "b")
            .await
            .expect_err("no credential");

        assert_eq!(
            error,
            NotifyError::CredentialUnavailable(CredentialError::NotFound {
                name: "notifier".to_string()
            })
        );
        assert!(!error.is_retryable());
        assert!(provider.captured().is_empty());
    }

    #[tokio::test]
    async fn missing_message_id_gets_generated_one() {
        let provider = spawn(
            "/v1/messages",
            MockReply { status: StatusCode::OK, body: json!({}), message_id_header: None },
        )
        .await;
        let resolver = resolver_with(Some("raw-key-123")).await;

        let receipt = notifier(provider.base_url.clone(), resolver)
            .send("a@b.com", "s", "b")
            .await
            .expect("provider accepts");

        assert!(uuid::Uuid::parse_str(&receipt.message_id).is_ok());
        assert_eq!(provider.captured()[0].authorization.as_deref(), Some("Bearer raw-key-123"));
    }
}
