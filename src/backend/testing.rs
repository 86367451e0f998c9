//! Recording fakes shared by unit tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::actions::{
    ActionError, ActionResult, Giveaways, ProcessLauncher, SceneSwitcher, SnapFilter,
};
use super::web::{EventSink, UiEvent};
use super::rewards::Collaborators;
use super::twitch::{SubscriptionEnvelope, SubscriptionStatus, SubscriptionType};

/// Ordered log of every collaborator call
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, call: String) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Implements every collaborator trait, recording calls into one log
#[derive(Clone, Default)]
pub struct FakeActions {
    pub log: CallLog,
    /// Calls whose name starts with one of these prefixes fail
    pub failing: Vec<&'static str>,
}

impl FakeActions {
    fn record(&self, call: String) -> ActionResult {
        let fails = self.failing.iter().any(|prefix| call.starts_with(prefix));
        self.log.push(call.clone());
        if fails {
            Err(ActionError::Process(format!("{} failed", call)))
        } else {
            Ok(())
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        let shared = Arc::new(self.clone());
        Collaborators {
            scenes: shared.clone(),
            snap: shared.clone(),
            giveaways: shared.clone(),
            launcher: shared,
        }
    }
}

#[async_trait]
impl SceneSwitcher for FakeActions {
    async fn switch_scene(&self, scene: &str) -> ActionResult {
        self.record(format!("scene {}", scene))
    }
}

#[async_trait]
impl SnapFilter for FakeActions {
    async fn toggle(&self, key: &str) -> ActionResult {
        self.record(format!("snap {}", key))
    }
}

#[async_trait]
impl Giveaways for FakeActions {
    async fn new_entry(&self, user_name: &str) -> ActionResult {
        self.record(format!("entry {}", user_name))
    }

    async fn select_winner(&self) -> ActionResult {
        self.record("winner".to_string())
    }
}

#[async_trait]
impl ProcessLauncher for FakeActions {
    async fn launch(&self, path: &str) -> ActionResult {
        self.record(format!("launch {}", path))
    }
}

#[derive(Default)]
pub struct RecordingSink(Mutex<Vec<UiEvent>>);

impl RecordingSink {
    pub fn events(&self) -> Vec<UiEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: UiEvent) {
        self.0.lock().unwrap().push(event);
    }
}

pub fn redemption_json(reward_id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "17fa2df1-ad76-4804-bfa5-a40ef63efe63",
        "broadcaster_user_id": "1337",
        "broadcaster_user_login": "cool_user",
        "broadcaster_user_name": "Cool_User",
        "user_id": "9001",
        "user_login": "cooler_user",
        "user_name": "Cooler_User",
        "user_input": "pogchamp",
        "status": "unfulfilled",
        "reward": {
            "id": reward_id,
            "title": "title",
            "cost": 100,
            "prompt": "reward prompt"
        },
        "redeemed_at": "2020-07-15T17:16:03.17106713Z"
    })
}

pub fn envelope(subscription_type: &str) -> SubscriptionEnvelope {
    SubscriptionEnvelope {
        id: "f1c2a387-161a-49f9-a165-0f21d7a4e1c4".to_string(),
        status: SubscriptionStatus::Enabled,
        subscription_type: SubscriptionType::from(subscription_type.to_string()),
        version: "1".to_string(),
        created_at: "2019-11-16T10:11:12.634234626Z".to_string(),
    }
}
