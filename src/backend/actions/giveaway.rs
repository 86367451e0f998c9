use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{ActionError, ActionResult, Giveaways};
use crate::backend::web::{EventSink, UiEvent};

/// In-memory giveaway entrant list.
///
/// Drawing the winner happens in the UI: selecting a winner publishes the
/// current entrants and leaves the pool untouched.
pub struct GiveawayPool {
    entrants: Mutex<Vec<String>>,
    sink: Arc<dyn EventSink>,
}

impl GiveawayPool {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            entrants: Mutex::new(Vec::new()),
            sink,
        }
    }

    pub async fn entrants(&self) -> Vec<String> {
        self.entrants.lock().await.clone()
    }
}

#[async_trait]
impl Giveaways for GiveawayPool {
    async fn new_entry(&self, user_name: &str) -> ActionResult {
        let user_name = user_name.trim();
        if user_name.is_empty() {
            return Err(ActionError::Giveaway("empty user name".to_string()));
        }

        let mut entrants = self.entrants.lock().await;
        if entrants.iter().any(|e| e.eq_ignore_ascii_case(user_name)) {
            log::debug!("{} already entered the giveaway", user_name);
            return Ok(());
        }

        entrants.push(user_name.to_string());
        log::info!("{} entered the giveaway ({} entrants)", user_name, entrants.len());
        self.sink.emit(UiEvent::GiveawayEntry {
            user_name: user_name.to_string(),
            entrants: entrants.len(),
        });
        Ok(())
    }

    async fn select_winner(&self) -> ActionResult {
        let entrants = self.entrants().await;
        if entrants.is_empty() {
            return Err(ActionError::Giveaway("no entrants".to_string()));
        }

        log::info!("Drawing giveaway winner from {} entrants", entrants.len());
        self.sink.emit(UiEvent::GiveawayDraw { entrants });
        Ok(())
    }
}
