use chrono::Utc;
use reqwest::Response;
use serde_json::Value;
use teetime_core::notify::{NotificationReceipt, NotifyError};
use uuid::Uuid;

const MESSAGE_ID_HEADER: &str = "x-message-id";
const MESSAGE_ID_FIELDS: [&str; 3] = ["id", "messageId", "message_id"];

/// Turns a backend response into a receipt, or `Undeliverable` for any non-2xx status.
pub async fn from_response(
    provider: &str,
    response: Response,
) -> Result<NotificationReceipt, NotifyError> {
    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        return Err(NotifyError::Undeliverable(format!(
            "{provider} returned {status}: {}",
            truncate(&detail, 200)
        )));
    }

    let header_id = response
        .headers()
        .get(MESSAGE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let body = response.text().await.unwrap_or_default();
    let message_id = message_id_from_body(&body)
        .or(header_id)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    Ok(NotificationReceipt { provider: provider.to_string(), message_id, accepted_at: Utc::now() })
}

pub fn message_id_from_body(body: &str) -> Option<String> {
    let payload: Value = serde_json::from_str(body).ok()?;
    MESSAGE_ID_FIELDS.iter().find_map(|field| match payload.get(*field)? {
        Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    })
}

pub(crate) fn transport_error(provider: &str, error: reqwest::Error) -> NotifyError {
    if error.is_timeout() {
        NotifyError::Undeliverable(format!("{provider} timed out"))
    } else {
        NotifyError::Undeliverable(format!("{provider} request failed: {error}"))
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
