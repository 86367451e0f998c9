use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use super::error::{Result, TwitchError};

pub const TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";
const VALIDATE_URL: &str = "https://id.twitch.tv/oauth2/validate";

/// Response from the client-credentials grant
#[derive(Debug, Clone, Deserialize)]
pub struct AppTokenResponse {
    pub access_token: String,
    #[allow(dead_code)] // Part of Twitch API response
    pub expires_in: Option<u64>,
    #[allow(dead_code)] // Part of Twitch API response
    pub token_type: Option<String>,
}

/// Response from the refresh-token grant
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Vec<String>,
    #[allow(dead_code)] // Part of Twitch API response
    pub token_type: String,
}

/// Response from the validate endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatedToken {
    #[allow(dead_code)] // Part of Twitch API response
    pub client_id: String,
    pub login: String,
    pub user_id: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[allow(dead_code)] // Part of Twitch API response
    pub expires_in: u64,
}

/// Source of app access tokens for the subscription management API
#[async_trait]
pub trait AppTokenSource: Send + Sync {
    async fn app_token(&self) -> Result<String>;
}

/// Obtains app access tokens with the client-credentials grant.
///
/// Nothing is cached: every call performs a fresh exchange, which is fine
/// because reconciliation only runs once per process start.
pub struct TokenProvider {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    token_url: String,
}

impl TokenProvider {
    pub fn new(client_id: String, client_secret: String, token_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
            client_secret,
            token_url,
        }
    }
}

#[async_trait]
impl AppTokenSource for TokenProvider {
    async fn app_token(&self) -> Result<String> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| TwitchError::AuthError(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TwitchError::AuthError(format!(
                "App token request failed: HTTP {} - {}",
                status, error_text
            )));
        }

        let token = response
            .json::<AppTokenResponse>()
            .await
            .map_err(|e| TwitchError::AuthError(format!("Malformed token response: {}", e)))?;

        Ok(token.access_token)
    }
}

/// On-disk representation of the user credential
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Vec<String>,
    /// Milliseconds since the epoch when the access token was obtained
    #[serde(default)]
    pub obtainment_timestamp: i64,
}

impl StoredToken {
    fn from_refresh(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in,
            scope: response.scope,
            obtainment_timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Refreshable user credential backed by a JSON file
pub struct UserAuth {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    path: PathBuf,
    token: RwLock<StoredToken>,
}

impl UserAuth {
    /// Load the persisted credential from `path`
    pub fn load<P: AsRef<Path>>(
        path: P,
        client_id: String,
        client_secret: String,
        token_url: String,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = fs::read_to_string(&path).map_err(|e| {
            TwitchError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let token: StoredToken = serde_json::from_str(&content)?;

        Ok(Self {
            client: reqwest::Client::new(),
            client_id,
            client_secret,
            token_url,
            path,
            token: RwLock::new(token),
        })
    }

    /// Get the current access token
    pub async fn access_token(&self) -> String {
        self.token.read().await.access_token.clone()
    }

    /// Exchange the refresh token for a new credential and write it back to disk.
    ///
    /// The file is replaced before the new token becomes visible to callers.
    pub async fn refresh(&self) -> Result<String> {
        let mut token = self.token.write().await;

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", token.refresh_token.as_str()),
        ];

        let response = self.client.post(&self.token_url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TwitchError::AuthError(format!(
                "Token refresh failed: HTTP {} - {}",
                status, error_text
            )));
        }

        let refreshed = StoredToken::from_refresh(response.json::<TokenResponse>().await?);
        persist_token(&self.path, &refreshed)?;
        log::info!("User token refreshed and saved to {}", self.path.display());

        *token = refreshed;
        Ok(token.access_token.clone())
    }

    /// Validate the current access token.
    ///
    /// Returns `None` when Twitch rejects the token as expired or revoked.
    pub async fn validate(&self) -> Result<Option<ValidatedToken>> {
        let access_token = self.access_token().await;

        let response = self
            .client
            .get(VALIDATE_URL)
            .header("Authorization", format!("OAuth {}", access_token))
            .send()
            .await?;

        if response.status().as_u16() == 401 {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(TwitchError::from_response(response).await);
        }

        Ok(Some(response.json::<ValidatedToken>().await?))
    }

    /// Validate the token, refreshing once if it has expired
    pub async fn ensure_valid(&self) -> Result<ValidatedToken> {
        if let Some(validated) = self.validate().await? {
            return Ok(validated);
        }

        log::warn!("User token rejected, refreshing...");
        self.refresh().await?;

        self.validate().await?.ok_or_else(|| {
            TwitchError::AuthError("User token still invalid after refresh".to_string())
        })
    }
}

/// Replace the credential file as a whole: write a sibling temp file, then rename over it
fn persist_token(path: &Path, token: &StoredToken) -> Result<()> {
    let content = serde_json::to_string_pretty(token)?;
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, content)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
