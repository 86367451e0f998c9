use async_trait::async_trait;
use tokio::process::Command;

use super::{ActionError, ActionResult, SnapFilter};

const KEY_PLACEHOLDER: &str = "{key}";

/// Toggles a Snap Camera filter by sending its hotkey through a helper program
/// (e.g. `xdotool key {key}`).
#[derive(Debug, Clone)]
pub struct SnapHotkey {
    program: String,
    args: Vec<String>,
}

impl SnapHotkey {
    pub fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }

    fn render_args(&self, key: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(KEY_PLACEHOLDER, key))
            .collect()
    }
}

#[async_trait]
impl SnapFilter for SnapHotkey {
    async fn toggle(&self, key: &str) -> ActionResult {
        let status = Command::new(&self.program)
            .args(self.render_args(key))
            .status()
            .await
            .map_err(|e| {
                ActionError::Process(format!("failed to run {}: {}", self.program, e))
            })?;

        if !status.success() {
            return Err(ActionError::Process(format!(
                "{} exited with {}",
                self.program, status
            )));
        }

        log::info!("Toggled Snap filter '{}'", key);
        Ok(())
    }
}
