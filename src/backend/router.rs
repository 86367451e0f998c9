use std::sync::Arc;

use crate::backend::web::{EventSink, UiEvent};
use crate::backend::rewards::{DispatchOutcome, RewardDispatcher};
use crate::backend::twitch::{ChatEvent, EventPayload, InboundEvent};

/// Routes verified EventSub notifications and chat messages to their handlers
pub struct EventRouter {
    rewards: RewardDispatcher,
    sink: Arc<dyn EventSink>,
}

impl EventRouter {
    pub fn new(rewards: RewardDispatcher, sink: Arc<dyn EventSink>) -> Self {
        Self { rewards, sink }
    }

    /// Dispatch on the notification type. Only redemptions trigger side
    /// effects; every other type is accepted and logged.
    pub async fn handle_event(&self, event: InboundEvent) {
        log::debug!(
            "Routing {} notification from subscription {}",
            event.subscription.subscription_type,
            event.subscription.id
        );

        match &event.payload {
            EventPayload::Redemption(redemption) => {
                if self.rewards.dispatch(redemption).await == DispatchOutcome::UnknownReward {
                    log::warn!(
                        "No reward configured for '{}' ({}), redemption by {} ignored",
                        redemption.reward.title,
                        redemption.reward.id,
                        redemption.user_name
                    );
                }
            }
            EventPayload::Follow(follow) => {
                log::info!("New follower: {}", follow.user_name);
            }
            EventPayload::Subscribe(sub) => {
                log::info!("New subscriber: {} (tier {})", sub.user_name, sub.tier);
            }
            EventPayload::Cheer(cheer) => {
                log::info!(
                    "{} cheered {} bits",
                    cheer.user_name.as_deref().unwrap_or("Anonymous"),
                    cheer.bits
                );
            }
            EventPayload::Raid(raid) => {
                log::info!(
                    "Raid from {} with {} viewers",
                    raid.from_broadcaster_user_name,
                    raid.viewers
                );
            }
            EventPayload::StreamOnline(online) => {
                log::info!("{} went live", online.broadcaster_user_name);
            }
            EventPayload::StreamOffline(offline) => {
                log::info!("{} went offline", offline.broadcaster_user_name);
            }
            EventPayload::Other(_) => {
                log::debug!(
                    "No handler for {}, ignoring",
                    event.subscription.subscription_type
                );
            }
        }
    }

    /// Forward a chat message to the UI
    pub fn handle_chat(&self, event: ChatEvent) {
        self.sink.emit(UiEvent::Chat(event));
    }
}
