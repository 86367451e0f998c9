use async_trait::async_trait;
use obws::Client;
use tokio::sync::Mutex;

use super::{ActionError, ActionResult, SceneSwitcher};

/// Switches the OBS program scene over obs-websocket.
///
/// The connection is opened on first use and dropped after a failed request,
/// so the next switch reconnects.
pub struct ObsSceneSwitcher {
    host: String,
    port: u16,
    password: Option<String>,
    client: Mutex<Option<Client>>,
}

impl ObsSceneSwitcher {
    pub fn new(host: String, port: u16, password: Option<String>) -> Self {
        Self {
            host,
            port,
            password,
            client: Mutex::new(None),
        }
    }

    async fn connect(&self) -> Result<Client, ActionError> {
        log::info!("Connecting to OBS at {}:{}", self.host, self.port);
        Client::connect(&self.host, self.port, self.password.as_deref())
            .await
            .map_err(|e| ActionError::Obs(format!("connect failed: {}", e)))
    }
}

#[async_trait]
impl SceneSwitcher for ObsSceneSwitcher {
    async fn switch_scene(&self, scene: &str) -> ActionResult {
        let mut guard = self.client.lock().await;

        if guard.is_none() {
            *guard = Some(self.connect().await?);
        }

        let result = match guard.as_ref() {
            Some(client) => client.scenes().set_current_program_scene(scene).await,
            None => return Err(ActionError::Obs("not connected".to_string())),
        };

        match result {
            Ok(()) => {
                log::info!("Switched OBS scene to '{}'", scene);
                Ok(())
            }
            Err(e) => {
                *guard = None;
                Err(ActionError::Obs(format!(
                    "switching to '{}' failed: {}",
                    scene, e
                )))
            }
        }
    }
}
