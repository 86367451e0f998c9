use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::actions::{ActionResult, Giveaways, ProcessLauncher, SceneSwitcher, SnapFilter};
use crate::backend::twitch::RedemptionEvent;

/// What a reward does when redeemed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewardKind {
    /// Run an external script
    Shell,
    /// Toggle a Snap Camera filter
    SnapFilter,
    /// Add the redeemer to the giveaway
    GiveawayEntry,
}

/// A configured channel-points reward
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Reward {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RewardKind,
    /// OBS scene to switch to after the action
    #[serde(default)]
    pub scene: Option<String>,
    /// Script path for `shell` rewards
    #[serde(default)]
    pub script: Option<String>,
    /// Filter hotkey for `snap-filter` rewards
    #[serde(default)]
    pub key: Option<String>,
}

/// Handles to every side-effect collaborator
#[derive(Clone)]
pub struct Collaborators {
    pub scenes: Arc<dyn SceneSwitcher>,
    pub snap: Arc<dyn SnapFilter>,
    pub giveaways: Arc<dyn Giveaways>,
    pub launcher: Arc<dyn ProcessLauncher>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No reward is configured for the redeemed id
    UnknownReward,
    /// The reward action (and scene switch, if any) was attempted
    Handled,
}

/// Maps redeemed reward ids to side effects
pub struct RewardDispatcher {
    rewards: HashMap<String, Reward>,
    actions: Collaborators,
}

impl RewardDispatcher {
    pub fn new(rewards: Vec<Reward>, actions: Collaborators) -> Self {
        let mut table = HashMap::with_capacity(rewards.len());
        for reward in rewards {
            if let Some(previous) = table.insert(reward.id.clone(), reward) {
                log::warn!("Reward {} is configured twice, keeping the last entry", previous.id);
            }
        }

        Self {
            rewards: table,
            actions,
        }
    }

    /// Run the reward action, then the scene switch.
    ///
    /// Failures are logged and never stop the scene switch.
    pub async fn dispatch(&self, redemption: &RedemptionEvent) -> DispatchOutcome {
        let Some(reward) = self.rewards.get(&redemption.reward.id) else {
            return DispatchOutcome::UnknownReward;
        };

        log::info!(
            "{} redeemed '{}' for {} points",
            redemption.user_name,
            redemption.reward.title,
            redemption.reward.cost
        );

        if let Err(e) = self.run_action(reward, redemption).await {
            log::error!("Reward {} action failed: {}", reward.id, e);
        }

        if let Some(scene) = &reward.scene {
            if let Err(e) = self.actions.scenes.switch_scene(scene).await {
                log::error!("Reward {} scene switch failed: {}", reward.id, e);
            }
        }

        DispatchOutcome::Handled
    }

    async fn run_action(&self, reward: &Reward, redemption: &RedemptionEvent) -> ActionResult {
        match reward.kind {
            RewardKind::Shell => match &reward.script {
                Some(script) => self.actions.launcher.launch(script).await,
                None => {
                    log::debug!("Reward {} has no script configured", reward.id);
                    Ok(())
                }
            },
            RewardKind::SnapFilter => match &reward.key {
                Some(key) => self.actions.snap.toggle(key).await,
                None => {
                    log::debug!("Reward {} has no filter key configured", reward.id);
                    Ok(())
                }
            },
            RewardKind::GiveawayEntry => {
                self.actions
                    .giveaways
                    .new_entry(&redemption.user_name)
                    .await
            }
        }
    }
}
