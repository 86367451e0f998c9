use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::rewards::Reward;
use crate::backend::twitch::{
    default_subscriptions, DesiredSubscription, TwitchError, HELIX_URL, TOKEN_URL,
};

const CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub twitch: TwitchSettings,
    pub webhook: WebhookSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub obs: ObsSettings,
    #[serde(default)]
    pub snap: SnapSettings,
    #[serde(default)]
    pub chat: ChatSettings,
    /// Desired EventSub subscriptions, in reconciliation order
    #[serde(default = "default_subscriptions")]
    pub subscriptions: Vec<DesiredSubscription>,
    #[serde(default)]
    pub rewards: Vec<Reward>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TwitchSettings {
    pub client_id: String,
    pub client_secret: String,
    /// Chat channel to join
    pub channel: String,
    pub broadcaster_id: String,
    /// Persisted user credential, relative to the project root unless absolute
    #[serde(default = "default_user_token_path")]
    pub user_token_path: PathBuf,
    #[serde(default = "default_helix_url")]
    pub helix_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct WebhookSettings {
    /// Public HTTPS URL Twitch delivers notifications to
    pub callback: String,
    pub secret: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerSettings {
    pub port: u16,
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ObsSettings {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SnapSettings {
    pub program: String,
    /// Arguments passed to `program`; `{key}` is replaced with the filter key
    pub args: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ChatSettings {
    pub winner_command: String,
}

fn default_user_token_path() -> PathBuf {
    PathBuf::from("tokens.json")
}

fn default_helix_url() -> String {
    HELIX_URL.to_string()
}

fn default_token_url() -> String {
    TOKEN_URL.to_string()
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets/overlay")
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8080,
            assets_dir: default_assets_dir(),
        }
    }
}

impl Default for ObsSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 4455,
            password: None,
        }
    }
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            program: "xdotool".to_string(),
            args: vec!["key".to_string(), "{key}".to_string()],
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            winner_command: "!winner".to_string(),
        }
    }
}

impl AppConfig {
    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), TwitchError> {
        let secret_len = self.webhook.secret.len();
        if !(10..=100).contains(&secret_len) {
            return Err(TwitchError::ConfigError(format!(
                "webhook.secret must be 10-100 characters, got {}",
                secret_len
            )));
        }
        if !self.webhook.callback.starts_with("https://") {
            return Err(TwitchError::ConfigError(
                "webhook.callback must be an https:// URL".to_string(),
            ));
        }
        if self.twitch.broadcaster_id.trim().is_empty() {
            return Err(TwitchError::ConfigError(
                "twitch.broadcaster_id is required".to_string(),
            ));
        }
        if self.chat.winner_command.trim().is_empty() {
            return Err(TwitchError::ConfigError(
                "chat.winner_command must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve a configured path against the project root
    pub fn resolve(root: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }
}

pub fn project_root() -> Result<PathBuf, Box<dyn std::error::Error>> {
    Ok(project_root::get_project_root()?)
}

pub fn load_config(root: &Path) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config_path = root.join(CONFIG_FILE);
    AppConfig::from_file(&config_path)
        .map_err(|e| format!("Failed to load {}: {}", config_path.display(), e).into())
}
