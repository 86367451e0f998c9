use serde::{Deserialize, Serialize};

use super::error::Result;
use super::eventsub::{SubscriptionStatus, SubscriptionType};

/// Webhook body sent by Twitch for every message type
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    pub subscription: SubscriptionEnvelope,
    /// Present on `notification` messages
    #[serde(default)]
    pub event: Option<serde_json::Value>,
    /// Present on `webhook_callback_verification` messages
    #[serde(default)]
    pub challenge: Option<String>,
}

/// Subscription metadata attached to every delivery
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SubscriptionEnvelope {
    pub id: String,
    pub status: SubscriptionStatus,
    #[serde(rename = "type")]
    pub subscription_type: SubscriptionType,
    pub version: String,
    pub created_at: String,
}

/// A verified notification, keyed by its subscription type
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub subscription: SubscriptionEnvelope,
    pub payload: EventPayload,
}

#[derive(Debug, Clone)]
pub enum EventPayload {
    Follow(FollowEvent),
    Subscribe(SubscribeEvent),
    Cheer(CheerEvent),
    Raid(RaidEvent),
    Redemption(RedemptionEvent),
    StreamOnline(StreamOnlineEvent),
    StreamOffline(StreamOfflineEvent),
    /// Types without a typed payload are carried through untouched
    Other(serde_json::Value),
}

impl InboundEvent {
    /// Build a typed event from the envelope and the raw `event` object
    pub fn from_notification(
        subscription: SubscriptionEnvelope,
        event: serde_json::Value,
    ) -> Result<Self> {
        let payload = match subscription.subscription_type {
            SubscriptionType::ChannelFollow => EventPayload::Follow(serde_json::from_value(event)?),
            SubscriptionType::ChannelSubscribe => {
                EventPayload::Subscribe(serde_json::from_value(event)?)
            }
            SubscriptionType::ChannelCheer => EventPayload::Cheer(serde_json::from_value(event)?),
            SubscriptionType::ChannelRaid => EventPayload::Raid(serde_json::from_value(event)?),
            SubscriptionType::RewardRedemptionAdd => {
                EventPayload::Redemption(serde_json::from_value(event)?)
            }
            SubscriptionType::StreamOnline => {
                EventPayload::StreamOnline(serde_json::from_value(event)?)
            }
            SubscriptionType::StreamOffline => {
                EventPayload::StreamOffline(serde_json::from_value(event)?)
            }
            SubscriptionType::Other(_) => EventPayload::Other(event),
        };

        Ok(Self {
            subscription,
            payload,
        })
    }
}

/// channel.follow
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FollowEvent {
    pub user_id: String,
    pub user_login: String,
    pub user_name: String,
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
    pub followed_at: String,
}

/// channel.subscribe
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubscribeEvent {
    pub user_id: String,
    pub user_login: String,
    pub user_name: String,
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
    pub tier: String,
    pub is_gift: bool,
}

/// channel.cheer
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheerEvent {
    pub is_anonymous: bool,
    pub user_id: Option<String>,
    pub user_login: Option<String>,
    pub user_name: Option<String>,
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
    pub message: String,
    pub bits: u32,
}

/// channel.raid
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RaidEvent {
    pub from_broadcaster_user_id: String,
    pub from_broadcaster_user_login: String,
    pub from_broadcaster_user_name: String,
    pub to_broadcaster_user_id: String,
    pub to_broadcaster_user_login: String,
    pub to_broadcaster_user_name: String,
    pub viewers: u32,
}

/// channel.channel_points_custom_reward_redemption.add
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedemptionEvent {
    pub id: String,
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
    pub user_id: String,
    pub user_login: String,
    pub user_name: String,
    #[serde(default)]
    pub user_input: String,
    pub status: String,
    pub reward: RedeemedReward,
    pub redeemed_at: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedeemedReward {
    pub id: String,
    pub title: String,
    pub cost: u32,
    #[serde(default)]
    pub prompt: String,
}

/// stream.online
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamOnlineEvent {
    pub id: String,
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
    #[serde(rename = "type")]
    pub stream_type: String,
    pub started_at: String,
}

/// stream.offline
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamOfflineEvent {
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
}
