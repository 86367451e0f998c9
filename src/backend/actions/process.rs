use async_trait::async_trait;
use tokio::process::Command;

use super::{ActionError, ActionResult, ProcessLauncher};

/// Starts external scripts without waiting for them to finish
#[derive(Debug, Default)]
pub struct ShellLauncher;

#[async_trait]
impl ProcessLauncher for ShellLauncher {
    async fn launch(&self, path: &str) -> ActionResult {
        let child = Command::new(path)
            .kill_on_drop(false)
            .spawn()
            .map_err(|e| ActionError::Process(format!("failed to start {}: {}", path, e)))?;

        log::info!("Launched {} (pid {:?})", path, child.id());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_an_error() {
        let result = ShellLauncher
            .launch("/nonexistent/definitely-not-a-script.sh")
            .await;
        assert!(matches!(result, Err(ActionError::Process(_))));
    }
}
