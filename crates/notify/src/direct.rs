use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use teetime_core::notify::{NotificationReceipt, Notifier, NotifyError};
use tracing::debug;

use crate::receipt;

#[derive(Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Hands messages to a platform mail relay. The relay trusts the caller's network
/// identity, so no credential is resolved here.
pub struct DirectChannelNotifier {
    client: Client,
    relay_url: String,
    sender_address: String,
}

impl DirectChannelNotifier {
    pub fn new(client: Client, relay_url: String, sender_address: String) -> Self {
        Self { client, relay_url, sender_address }
    }
}

#[async_trait]
impl Notifier for DirectChannelNotifier {
    fn provider(&self) -> &'static str {
        "direct"
    }

    async fn send(
        &self,
        destination: &str,
        subject: &str,
        body: &str,
    ) -> Result<NotificationReceipt, NotifyError> {
        debug!(event_name = "notify.direct.send", relay_url = %self.relay_url, "posting to mail relay");

        let response = self
            .client
            .post(&self.relay_url)
            .json(&RelayMessage { from: &self.sender_address, to: destination, subject, body })
            .send()
            .await
            .map_err(|error| receipt::transport_error(self.provider(), error))?;

        receipt::from_response(self.provider(), response).await
    }
}
