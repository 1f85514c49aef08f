use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use teetime_core::config::AssistantConfig;
use teetime_core::credentials::CredentialResolver;
use tracing::debug;

use crate::llm::{LlmClient, LlmError};

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChatClient {
    client: Client,
    endpoint: String,
    model: String,
    secret_name: String,
    resolver: Arc<CredentialResolver>,
}

impl OpenAiChatClient {
    pub fn from_config(
        config: &AssistantConfig,
        resolver: Arc<CredentialResolver>,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|error| LlmError::Transport(error.to_string()))?;
        Ok(Self::new(client, config, resolver))
    }

    pub fn new(client: Client, config: &AssistantConfig, resolver: Arc<CredentialResolver>) -> Self {
        Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            secret_name: config.secret_name.clone(),
            resolver,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn complete(&self, system_prompt: &str, message: &str) -> Result<String, LlmError> {
        let credential = self.resolver.resolve(&self.secret_name).await?;
        debug!(event_name = "assistant.llm.request", model = %self.model, "sending chat completion");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential.expose_secret())
            .json(&ChatCompletionRequest {
                model: &self.model,
                messages: [
                    ChatMessage { role: "system", content: system_prompt },
                    ChatMessage { role: "user", content: message },
                ],
            })
            .send()
            .await
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                detail: detail.chars().take(200).collect(),
            });
        }

        let completion: ChatCompletionResponse =
            response.json().await.map_err(|error| LlmError::Decode(error.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Decode("response carried no choices".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use teetime_core::config::{AppConfig, AssistantConfig, SecretBinding, VaultBackend, VaultConfig};
    use teetime_core::credentials::{CredentialError, CredentialResolver, InMemorySecretStore};

    use super::OpenAiChatClient;
    use crate::llm::{LlmClient, LlmError};

    type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    async fn spawn_provider(status: StatusCode, reply: Value) -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/v1/chat/completions",
                post(
                    move |State(captured): State<Captured>,
                          headers: HeaderMap,
                          Json(body): Json<Value>| {
                        let reply = reply.clone();
                        async move {
                            let auth = headers
                                .get("authorization")
                                .and_then(|value| value.to_str().ok())
                                .map(str::to_string);
                            captured.lock().expect("lock").push((auth, body));
                            (status, Json(reply))
                        }
                    },
                ),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}/v1"), captured)
    }

    async fn client_for(base_url: String, payload: Option<&str>) -> OpenAiChatClient {
        let store = Arc::new(InMemorySecretStore::default());
        if let Some(payload) = payload {
            store.insert("prod/openai/api_key", payload).await;
        }
        let mut secrets = BTreeMap::new();
        secrets.insert(
            "assistant".to_string(),
            SecretBinding {
                path: "prod/openai/api_key".to_string(),
                fields: vec!["OPENAI_API_KEY".to_string(), "openai_api_key".to_string()],
            },
        );
        let vault = VaultConfig { backend: VaultBackend::Database, cache_credentials: false, secrets };
        let resolver = Arc::new(CredentialResolver::new(store, &vault));
        let config = AssistantConfig { base_url, ..AppConfig::default().assistant };
        OpenAiChatClient::new(reqwest::Client::new(), &config, resolver)
    }

    #[tokio::test]
    async fn forwards_system_prompt_and_message_with_bearer_key() {
        let (base_url, captured) = spawn_provider(
            StatusCode::OK,
            json!({"choices": [{"message": {"role": "assistant", "content": "Try 7:30 AM."}}]}),
        )
        .await;
        let client = client_for(base_url, Some(r#"{"openai_api_key":"sk-test"}"#)).await;

        let reply = client.complete("be helpful", "any slots tomorrow?").await.expect("reply");
        assert_eq!(reply, "Try 7:30 AM.");

        let captured = captured.lock().expect("lock").clone();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].0.as_deref(), Some("Bearer sk-test"));
        assert_eq!(captured[0].1["model"], "gpt-4");
        assert_eq!(captured[0].1["messages"][0]["role"], "system");
        assert_eq!(captured[0].1["messages"][0]["content"], "be helpful");
        assert_eq!(captured[0].1["messages"][1]["content"], "any slots tomorrow?");
    }

    #[tokio::test]
    async fn provider_error_status_is_reported() {
        let (base_url, _captured) =
            spawn_provider(StatusCode::TOO_MANY_REQUESTS, json!({"error": "rate limited"})).await;
        let client = client_for(base_url, Some("sk-raw")).await;

        let error = client.complete("p", "m").await.expect_err("rate limited");
        assert!(matches!(error, LlmError::Status { status: 429, .. }));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let (base_url, captured) = spawn_provider(StatusCode::OK, json!({"choices": []})).await;
        let client = client_for(base_url, None).await;

        let error = client.complete("p", "m").await.expect_err("no key");
        assert!(matches!(error, LlmError::Credential(CredentialError::NotFound { .. })));
        assert!(captured.lock().expect("lock").is_empty());
    }
}
