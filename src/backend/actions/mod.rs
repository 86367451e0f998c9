//! Side-effect collaborators triggered by rewards and chat commands.
//!
//! Each collaborator sits behind a narrow trait so the router and the chat
//! session never depend on how OBS, the Snap hotkey or the giveaway pool are
//! actually driven.

mod giveaway;
mod obs;
mod process;
mod snap;

use async_trait::async_trait;
use std::fmt;

pub use giveaway::GiveawayPool;
pub use obs::ObsSceneSwitcher;
pub use process::ShellLauncher;
pub use snap::SnapHotkey;

/// Errors raised by a side effect
#[derive(Debug)]
pub enum ActionError {
    /// OBS connection or request failed
    Obs(String),

    /// An external program could not be started or exited non-zero
    Process(String),

    /// The giveaway pool rejected the request
    Giveaway(String),
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::Obs(msg) => write!(f, "OBS error: {}", msg),
            ActionError::Process(msg) => write!(f, "Process error: {}", msg),
            ActionError::Giveaway(msg) => write!(f, "Giveaway error: {}", msg),
        }
    }
}

impl std::error::Error for ActionError {}

pub type ActionResult = std::result::Result<(), ActionError>;

#[async_trait]
pub trait SceneSwitcher: Send + Sync {
    async fn switch_scene(&self, scene: &str) -> ActionResult;
}

#[async_trait]
pub trait SnapFilter: Send + Sync {
    async fn toggle(&self, key: &str) -> ActionResult;
}

#[async_trait]
pub trait Giveaways: Send + Sync {
    async fn new_entry(&self, user_name: &str) -> ActionResult;
    async fn select_winner(&self) -> ActionResult;
}

#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    async fn launch(&self, path: &str) -> ActionResult;
}
