use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

use crate::backend::router::EventRouter;
use crate::backend::twitch::{InboundEvent, WebhookPayload};

type HmacSha256 = Hmac<Sha256>;

const MESSAGE_ID: &str = "twitch-eventsub-message-id";
const MESSAGE_TIMESTAMP: &str = "twitch-eventsub-message-timestamp";
const MESSAGE_SIGNATURE: &str = "twitch-eventsub-message-signature";
const MESSAGE_TYPE: &str = "twitch-eventsub-message-type";

/// State for the EventSub callback route
#[derive(Clone)]
pub struct WebhookState {
    router: Arc<EventRouter>,
    secret: Arc<str>,
}

impl WebhookState {
    pub fn new(router: Arc<EventRouter>, secret: &str) -> Self {
        Self {
            router,
            secret: Arc::from(secret),
        }
    }
}

/// Check `sha256=<hex>` against HMAC-SHA256(secret, id + timestamp + body)
pub fn verify_signature(
    secret: &str,
    message_id: &str,
    timestamp: &str,
    body: &[u8],
    signature: &str,
) -> bool {
    let Some(expected) = signature
        .strip_prefix("sha256=")
        .and_then(|hex_sig| hex::decode(hex_sig).ok())
    else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(message_id.as_bytes());
    mac.update(timestamp.as_bytes());
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// EventSub webhook callback
pub async fn eventsub_handler(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let (Some(message_id), Some(timestamp), Some(signature), Some(message_type)) = (
        header_str(&headers, MESSAGE_ID),
        header_str(&headers, MESSAGE_TIMESTAMP),
        header_str(&headers, MESSAGE_SIGNATURE),
        header_str(&headers, MESSAGE_TYPE),
    ) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    if !verify_signature(&state.secret, message_id, timestamp, &body, signature) {
        log::warn!("Rejected EventSub message {} with a bad signature", message_id);
        return StatusCode::FORBIDDEN.into_response();
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            log::warn!("Malformed EventSub message {}: {}", message_id, e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match message_type {
        "webhook_callback_verification" => match payload.challenge {
            Some(challenge) => {
                log::info!(
                    "Verified callback for {} subscription {}",
                    payload.subscription.subscription_type,
                    payload.subscription.id
                );
                (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, "text/plain")],
                    challenge,
                )
                    .into_response()
            }
            None => StatusCode::BAD_REQUEST.into_response(),
        },
        "notification" => {
            let Some(event) = payload.event else {
                return StatusCode::BAD_REQUEST.into_response();
            };
            log::debug!("EventSub message {} accepted", message_id);

            match InboundEvent::from_notification(payload.subscription, event) {
                Ok(event) => {
                    let router = state.router.clone();
                    tokio::spawn(async move {
                        router.handle_event(event).await;
                    });
                    StatusCode::NO_CONTENT.into_response()
                }
                Err(e) => {
                    log::warn!("Unreadable notification {}: {}", message_id, e);
                    StatusCode::BAD_REQUEST.into_response()
                }
            }
        }
        "revocation" => {
            log::warn!(
                "Twitch revoked {} subscription {} ({:?}), it will be recreated on next start",
                payload.subscription.subscription_type,
                payload.subscription.id,
                payload.subscription.status
            );
            StatusCode::NO_CONTENT.into_response()
        }
        other => {
            log::debug!("Ignoring EventSub message type {}", other);
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, id: &str, timestamp: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(id.as_bytes());
        mac.update(timestamp.as_bytes());
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_valid_signature() {
        let body = br#"{"hello":"world"}"#;
        let signature = sign("0123456789abc", "msg-1", "2023-01-01T00:00:00Z", body);
        assert!(verify_signature(
            "0123456789abc",
            "msg-1",
            "2023-01-01T00:00:00Z",
            body,
            &signature
        ));
    }

    #[test]
    fn test_tampered_body_is_rejected() {
        let signature = sign("0123456789abc", "msg-1", "ts", b"original");
        assert!(!verify_signature("0123456789abc", "msg-1", "ts", b"tampered", &signature));
    }

    #[test]
    fn test_malformed_signature_is_rejected() {
        assert!(!verify_signature("0123456789abc", "msg-1", "ts", b"{}", "md5=abcd"));
        assert!(!verify_signature("0123456789abc", "msg-1", "ts", b"{}", "sha256=zz"));
    }
}
