//! Delivery backends for booking confirmations.
//!
//! Both backends speak HTTP through a shared `reqwest::Client`. Which one runs is
//! decided once from [`NotifierConfig::provider`] by [`build_notifier`].

use std::sync::Arc;
use std::time::Duration;

use teetime_core::config::{NotifierConfig, NotifierProvider};
use teetime_core::credentials::CredentialResolver;
use teetime_core::notify::Notifier;
use thiserror::Error;

pub mod direct;
pub mod receipt;
pub mod third_party;

pub use direct::DirectChannelNotifier;
pub use third_party::ThirdPartyChannelNotifier;

#[derive(Debug, Error)]
pub enum NotifierBuildError {
    #[error("notifier.{0} is required for the configured provider")]
    MissingSetting(&'static str),
    #[error("failed to build notifier http client: {0}")]
    Client(#[from] reqwest::Error),
}

pub fn http_client(config: &NotifierConfig) -> Result<reqwest::Client, NotifierBuildError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs.max(1)))
        .user_agent(concat!("teetime-notify/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

pub fn build_notifier(
    config: &NotifierConfig,
    resolver: Arc<CredentialResolver>,
    client: reqwest::Client,
) -> Result<Arc<dyn Notifier>, NotifierBuildError> {
    match config.provider {
        NotifierProvider::Direct => {
            let relay_url =
                config.relay_url.clone().ok_or(NotifierBuildError::MissingSetting("relay_url"))?;
            Ok(Arc::new(DirectChannelNotifier::new(
                client,
                relay_url,
                config.sender_address.clone(),
            )))
        }
        NotifierProvider::ThirdParty => {
            let api_base_url = config
                .api_base_url
                .clone()
                .ok_or(NotifierBuildError::MissingSetting("api_base_url"))?;
            Ok(Arc::new(ThirdPartyChannelNotifier::new(
                client,
                api_base_url,
                config.sender_address.clone(),
                config.secret_name.clone(),
                resolver,
            )))
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{HeaderMap, HeaderValue, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;

    #[derive(Clone, Debug)]
    pub struct CapturedRequest {
        pub authorization: Option<String>,
        pub body: Value,
    }

    #[derive(Clone)]
    pub struct MockReply {
        pub status: StatusCode,
        pub body: Value,
        pub message_id_header: Option<&'static str>,
    }

    #[derive(Clone)]
    struct MockState {
        reply: MockReply,
        captured: Arc<Mutex<Vec<CapturedRequest>>>,
    }

    pub struct MockProvider {
        pub base_url: String,
        captured: Arc<Mutex<Vec<CapturedRequest>>>,
    }

    impl MockProvider {
        pub fn captured(&self) -> Vec<CapturedRequest> {
            self.captured.lock().expect("captured lock").clone()
        }
    }

    async fn accept(
        State(state): State<MockState>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Response {
        let authorization = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        state.captured.lock().expect("captured lock").push(CapturedRequest { authorization, body });

        let mut response = (state.reply.status, Json(state.reply.body.clone())).into_response();
        if let Some(id) = state.reply.message_id_header {
            response.headers_mut().insert("x-message-id", HeaderValue::from_static(id));
        }
        response
    }

    /// Serves `POST {path}` on an ephemeral local port.
    pub async fn spawn(path: &str, reply: MockReply) -> MockProvider {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(path, post(accept))
            .with_state(MockState { reply, captured: captured.clone() });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind mock");
        let addr = listener.local_addr().expect("mock addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        MockProvider { base_url: format!("http://{addr}"), captured }
    }
}
