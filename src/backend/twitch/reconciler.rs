use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

use super::auth::AppTokenSource;
use super::eventsub::{
    Condition, CreateSubscription, Subscription, SubscriptionRegistry, SubscriptionType,
    Transport,
};

const BROADCASTER_PLACEHOLDER: &str = "{broadcaster_id}";

fn default_version() -> String {
    "1".to_string()
}

/// One entry of the statically configured subscription set
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DesiredSubscription {
    #[serde(rename = "type")]
    pub subscription_type: SubscriptionType,
    #[serde(default = "default_version")]
    pub version: String,
    /// Type-specific condition; values may reference `{broadcaster_id}`.
    /// When absent the condition is `broadcaster_user_id = <broadcaster>`.
    #[serde(default)]
    pub condition: Option<Condition>,
}

impl DesiredSubscription {
    pub fn new(subscription_type: SubscriptionType) -> Self {
        Self {
            subscription_type,
            version: default_version(),
            condition: None,
        }
    }

    pub fn with_condition(mut self, key: &str, value: &str) -> Self {
        self.condition
            .get_or_insert_with(Condition::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Build the concrete condition sent to Twitch
    pub fn resolve_condition(&self, broadcaster_id: &str) -> Condition {
        match &self.condition {
            Some(template) => template
                .iter()
                .map(|(key, value)| {
                    (
                        key.clone(),
                        value.replace(BROADCASTER_PLACEHOLDER, broadcaster_id),
                    )
                })
                .collect(),
            None => {
                let mut condition = Condition::new();
                condition.insert(
                    "broadcaster_user_id".to_string(),
                    broadcaster_id.to_string(),
                );
                condition
            }
        }
    }
}

/// Subscriptions used when the config file does not list any
pub fn default_subscriptions() -> Vec<DesiredSubscription> {
    vec![
        DesiredSubscription::new(SubscriptionType::ChannelFollow),
        DesiredSubscription::new(SubscriptionType::ChannelSubscribe),
        DesiredSubscription::new(SubscriptionType::ChannelCheer),
        DesiredSubscription::new(SubscriptionType::ChannelRaid)
            .with_condition("to_broadcaster_user_id", BROADCASTER_PLACEHOLDER),
        DesiredSubscription::new(SubscriptionType::RewardRedemptionAdd),
        DesiredSubscription::new(SubscriptionType::StreamOnline),
        DesiredSubscription::new(SubscriptionType::StreamOffline),
    ]
}

/// Outcome counters of one reconciliation pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub skipped: usize,
    pub deleted: usize,
    pub created: usize,
    pub failed: usize,
}

/// Drives the remote subscription set towards the desired one
pub struct Reconciler {
    registry: Arc<dyn SubscriptionRegistry>,
    tokens: Arc<dyn AppTokenSource>,
    client_id: String,
    broadcaster_id: String,
    transport: Transport,
    desired: Vec<DesiredSubscription>,
}

impl Reconciler {
    pub fn new(
        registry: Arc<dyn SubscriptionRegistry>,
        tokens: Arc<dyn AppTokenSource>,
        client_id: String,
        broadcaster_id: String,
        transport: Transport,
        desired: Vec<DesiredSubscription>,
    ) -> Self {
        Self {
            registry,
            tokens,
            client_id,
            broadcaster_id,
            transport,
            desired,
        }
    }

    /// Run one pass over the desired set.
    ///
    /// Types are handled one after another so a stale subscription is always
    /// deleted before its replacement is created. A failure on one type is
    /// logged and the pass moves on to the next.
    pub async fn run(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let token = match self.tokens.app_token().await {
            Ok(token) => token,
            Err(e) => {
                log::error!("Skipping EventSub reconciliation, no app token: {}", e);
                return report;
            }
        };

        let existing = match self.registry.list(&token, &self.client_id).await {
            Ok(existing) => existing,
            Err(e) => {
                log::error!("Skipping EventSub reconciliation, listing failed: {}", e);
                return report;
            }
        };
        log::info!("Found {} existing EventSub subscriptions", existing.len());

        let mut seen = HashSet::new();
        for desired in &self.desired {
            if !seen.insert(&desired.subscription_type) {
                log::warn!(
                    "{} is listed more than once, only the first entry is used",
                    desired.subscription_type
                );
                continue;
            }
            self.converge(&token, desired, &existing, &mut report).await;
        }

        log::info!(
            "EventSub reconciliation complete: {} healthy, {} deleted, {} created, {} failed",
            report.skipped,
            report.deleted,
            report.created,
            report.failed
        );

        report
    }

    async fn converge(
        &self,
        token: &str,
        desired: &DesiredSubscription,
        existing: &[Subscription],
        report: &mut ReconcileReport,
    ) {
        let subscription_type = &desired.subscription_type;
        let matching: Vec<&Subscription> = existing
            .iter()
            .filter(|s| &s.subscription_type == subscription_type)
            .collect();

        if let Some(healthy) = matching.iter().find(|s| s.status.is_healthy()) {
            log::debug!(
                "{} already subscribed ({}, {:?})",
                subscription_type,
                healthy.id,
                healthy.status
            );
            report.skipped += 1;
            return;
        }

        for stale in matching {
            log::warn!(
                "{} subscription {} is {:?}, deleting",
                subscription_type,
                stale.id,
                stale.status
            );
            match self
                .registry
                .delete(token, &self.client_id, &stale.id)
                .await
            {
                Ok(()) => report.deleted += 1,
                Err(e) => log::error!("Failed to delete subscription {}: {}", stale.id, e),
            }
        }

        let request = CreateSubscription {
            subscription_type: subscription_type.clone(),
            version: desired.version.clone(),
            condition: desired.resolve_condition(&self.broadcaster_id),
            transport: self.transport.clone(),
        };

        match self.registry.create(token, &self.client_id, &request).await {
            Ok(()) => {
                log::info!("✓ Subscribed to {}", subscription_type);
                report.created += 1;
            }
            Err(e) => {
                log::error!("✗ Failed to subscribe to {}: {}", subscription_type, e);
                report.failed += 1;
            }
        }
    }
}
