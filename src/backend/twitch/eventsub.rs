use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::error::{Result, TwitchError};

pub const HELIX_URL: &str = "https://api.twitch.tv/helix";

/// Key/value filter attached to a subscription, e.g. `broadcaster_user_id`
pub type Condition = BTreeMap<String, String>;

/// Event kinds this service knows how to subscribe to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionType {
    ChannelFollow,
    ChannelSubscribe,
    ChannelCheer,
    ChannelRaid,
    RewardRedemptionAdd,
    StreamOnline,
    StreamOffline,
    /// Anything else Twitch reports; kept so listing never fails on new types
    Other(String),
}

impl SubscriptionType {
    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionType::ChannelFollow => "channel.follow",
            SubscriptionType::ChannelSubscribe => "channel.subscribe",
            SubscriptionType::ChannelCheer => "channel.cheer",
            SubscriptionType::ChannelRaid => "channel.raid",
            SubscriptionType::RewardRedemptionAdd => {
                "channel.channel_points_custom_reward_redemption.add"
            }
            SubscriptionType::StreamOnline => "stream.online",
            SubscriptionType::StreamOffline => "stream.offline",
            SubscriptionType::Other(name) => name,
        }
    }
}

impl From<String> for SubscriptionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "channel.follow" => SubscriptionType::ChannelFollow,
            "channel.subscribe" => SubscriptionType::ChannelSubscribe,
            "channel.cheer" => SubscriptionType::ChannelCheer,
            "channel.raid" => SubscriptionType::ChannelRaid,
            "channel.channel_points_custom_reward_redemption.add" => {
                SubscriptionType::RewardRedemptionAdd
            }
            "stream.online" => SubscriptionType::StreamOnline,
            "stream.offline" => SubscriptionType::StreamOffline,
            _ => SubscriptionType::Other(value),
        }
    }
}

impl From<SubscriptionType> for String {
    fn from(value: SubscriptionType) -> Self {
        match value {
            SubscriptionType::Other(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription status as reported by Helix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Enabled,
    #[serde(rename = "webhook_callback_verification_pending")]
    PendingVerification,
    #[serde(rename = "webhook_callback_verification_failed")]
    VerificationFailed,
    #[serde(rename = "notification_failures_exceeded")]
    FailureExceeded,
    #[serde(rename = "authorization_revoked")]
    Revoked,
    #[serde(rename = "user_removed")]
    Removed,
    /// Any status not listed above (e.g. `version_removed`)
    #[serde(other)]
    Unknown,
}

impl SubscriptionStatus {
    /// Enabled and pending-verification subscriptions are left alone
    pub fn is_healthy(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Enabled | SubscriptionStatus::PendingVerification
        )
    }
}

/// Webhook transport as configured on a subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transport {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl Transport {
    pub fn webhook(callback: &str, secret: &str) -> Self {
        Self {
            method: "webhook".to_string(),
            callback: Some(callback.to_string()),
            secret: Some(secret.to_string()),
        }
    }
}

/// A remote EventSub subscription
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Subscription {
    pub id: String,
    #[serde(rename = "type")]
    pub subscription_type: SubscriptionType,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub condition: Condition,
    pub transport: Transport,
    #[serde(default)]
    pub cost: u32,
}

/// EventSub subscription request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateSubscription {
    #[serde(rename = "type")]
    pub subscription_type: SubscriptionType,
    pub version: String,
    pub condition: Condition,
    pub transport: Transport,
}

#[derive(Debug, Clone, Deserialize)]
struct SubscriptionList {
    data: Vec<Subscription>,
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Pagination {
    cursor: Option<String>,
}

/// Remote subscription store
#[async_trait]
pub trait SubscriptionRegistry: Send + Sync {
    /// List every subscription owned by the client, in the order Twitch returns them
    async fn list(&self, token: &str, client_id: &str) -> Result<Vec<Subscription>>;

    /// Create a subscription
    async fn create(
        &self,
        token: &str,
        client_id: &str,
        request: &CreateSubscription,
    ) -> Result<()>;

    /// Delete a subscription by id
    async fn delete(&self, token: &str, client_id: &str, subscription_id: &str) -> Result<()>;
}

/// Helix-backed subscription registry
pub struct HelixRegistry {
    client: reqwest::Client,
    subscriptions_url: String,
}

impl HelixRegistry {
    pub fn new(helix_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            subscriptions_url: format!(
                "{}/eventsub/subscriptions",
                helix_url.trim_end_matches('/')
            ),
        }
    }
}

#[async_trait]
impl SubscriptionRegistry for HelixRegistry {
    async fn list(&self, token: &str, client_id: &str) -> Result<Vec<Subscription>> {
        let mut subscriptions = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let url = match &cursor {
                Some(after) => format!(
                    "{}?after={}",
                    self.subscriptions_url,
                    urlencoding::encode(after)
                ),
                None => self.subscriptions_url.clone(),
            };

            let response = self
                .client
                .get(&url)
                .header("Authorization", format!("Bearer {}", token))
                .header("Client-Id", client_id)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(TwitchError::from_response(response).await);
            }

            let page = response.json::<SubscriptionList>().await?;
            subscriptions.extend(page.data);

            match page.pagination.cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        Ok(subscriptions)
    }

    async fn create(
        &self,
        token: &str,
        client_id: &str,
        request: &CreateSubscription,
    ) -> Result<()> {
        let response = self
            .client
            .post(&self.subscriptions_url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Client-Id", client_id)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TwitchError::from_response(response).await);
        }

        Ok(())
    }

    async fn delete(&self, token: &str, client_id: &str, subscription_id: &str) -> Result<()> {
        let url = format!(
            "{}?id={}",
            self.subscriptions_url,
            urlencoding::encode(subscription_id)
        );

        let response = self
            .client
            .delete(&url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Client-Id", client_id)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TwitchError::from_response(response).await);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_subscription_list_parses_helix_payload() {
        let json = r#"{
            "data": [{
                "id": "f1c2a387-161a-49f9-a165-0f21d7a4e1c4",
                "status": "authorization_revoked",
                "type": "channel.raid",
                "version": "1",
                "cost": 1,
                "condition": { "to_broadcaster_user_id": "1337" },
                "transport": { "method": "webhook", "callback": "https://example.com/eventsub" },
                "created_at": "2019-11-16T10:11:12.634234626Z"
            }, {
                "id": "26b1c993-bfcf-44d9-b876-379dacafe75a",
                "status": "version_removed",
                "type": "channel.goal.begin",
                "version": "1",
                "cost": 0,
                "condition": { "broadcaster_user_id": "1337" },
                "transport": { "method": "webhook", "callback": "https://example.com/eventsub" },
                "created_at": "2019-11-16T10:11:12.634234626Z"
            }],
            "total": 2,
            "pagination": {}
        }"#;

        let list: SubscriptionList = serde_json::from_str(json).unwrap();
        assert_eq!(list.data.len(), 2);
        assert_eq!(list.data[0].subscription_type, SubscriptionType::ChannelRaid);
        assert_eq!(list.data[0].status, SubscriptionStatus::Revoked);
        assert_eq!(
            list.data[0].condition.get("to_broadcaster_user_id"),
            Some(&"1337".to_string())
        );
        assert_eq!(
            list.data[1].subscription_type,
            SubscriptionType::Other("channel.goal.begin".to_string())
        );
        assert_eq!(list.data[1].status, SubscriptionStatus::Unknown);
        assert!(list.pagination.cursor.is_none());
    }

    #[test]
    fn test_create_request_body() {
        let mut condition = Condition::new();
        condition.insert("broadcaster_user_id".to_string(), "42".to_string());
        let request = CreateSubscription {
            subscription_type: SubscriptionType::ChannelFollow,
            version: "1".to_string(),
            condition,
            transport: Transport::webhook("https://example.com/eventsub", "s3cr3t-value"),
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "type": "channel.follow",
                "version": "1",
                "condition": { "broadcaster_user_id": "42" },
                "transport": {
                    "method": "webhook",
                    "callback": "https://example.com/eventsub",
                    "secret": "s3cr3t-value"
                }
            })
        );
    }

    fn remote(id: &str, subscription_type: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "status": "enabled",
            "type": subscription_type,
            "version": "1",
            "cost": 1,
            "condition": { "broadcaster_user_id": "1337" },
            "transport": { "method": "webhook", "callback": "https://example.com/eventsub" },
            "created_at": "2019-11-16T10:11:12.634234626Z"
        })
    }

    #[tokio::test]
    async fn test_list_follows_pagination_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/eventsub/subscriptions"))
            .and(query_param_is_missing("after"))
            .and(header("Authorization", "Bearer app-token"))
            .and(header("Client-Id", "client"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [remote("sub-1", "channel.follow")],
                "total": 2,
                "pagination": { "cursor": "page-2" }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/eventsub/subscriptions"))
            .and(query_param("after", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [remote("sub-2", "channel.raid")],
                "total": 2,
                "pagination": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let registry = HelixRegistry::new(&server.uri());
        let subscriptions = registry.list("app-token", "client").await.unwrap();

        let ids: Vec<&str> = subscriptions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["sub-1", "sub-2"]);
        assert_eq!(subscriptions[1].subscription_type, SubscriptionType::ChannelRaid);
    }

    #[tokio::test]
    async fn test_list_error_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/eventsub/subscriptions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid access token"))
            .mount(&server)
            .await;

        let registry = HelixRegistry::new(&server.uri());

        match registry.list("expired", "client").await {
            Err(TwitchError::ApiError { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid access token");
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_posts_authenticated_json() {
        let mut condition = Condition::new();
        condition.insert("broadcaster_user_id".to_string(), "42".to_string());
        let request = CreateSubscription {
            subscription_type: SubscriptionType::StreamOnline,
            version: "1".to_string(),
            condition,
            transport: Transport::webhook("https://example.com/eventsub", "s3cr3t-value"),
        };

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/eventsub/subscriptions"))
            .and(header("Authorization", "Bearer app-token"))
            .and(header("Client-Id", "client"))
            .and(body_json(serde_json::to_value(&request).unwrap()))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({
                "data": [remote("new-sub", "stream.online")],
                "total": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let registry = HelixRegistry::new(&server.uri());
        registry.create("app-token", "client", &request).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_conflict_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/eventsub/subscriptions"))
            .respond_with(ResponseTemplate::new(409).set_body_string("subscription already exists"))
            .mount(&server)
            .await;

        let request = CreateSubscription {
            subscription_type: SubscriptionType::ChannelFollow,
            version: "1".to_string(),
            condition: Condition::new(),
            transport: Transport::webhook("https://example.com/eventsub", "s3cr3t-value"),
        };
        let registry = HelixRegistry::new(&server.uri());

        assert!(matches!(
            registry.create("app-token", "client", &request).await,
            Err(TwitchError::ApiError { status: 409, .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_passes_id_in_query() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/eventsub/subscriptions"))
            .and(query_param("id", "f1c2a387-161a-49f9-a165-0f21d7a4e1c4"))
            .and(header("Authorization", "Bearer app-token"))
            .and(header("Client-Id", "client"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let registry = HelixRegistry::new(&format!("{}/", server.uri()));
        registry
            .delete("app-token", "client", "f1c2a387-161a-49f9-a165-0f21d7a4e1c4")
            .await
            .unwrap();
    }

    #[test]
    fn test_healthy_statuses() {
        assert!(SubscriptionStatus::Enabled.is_healthy());
        assert!(SubscriptionStatus::PendingVerification.is_healthy());
        assert!(!SubscriptionStatus::VerificationFailed.is_healthy());
        assert!(!SubscriptionStatus::FailureExceeded.is_healthy());
        assert!(!SubscriptionStatus::Revoked.is_healthy());
        assert!(!SubscriptionStatus::Removed.is_healthy());
        assert!(!SubscriptionStatus::Unknown.is_healthy());
    }
}
