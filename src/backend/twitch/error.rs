use std::fmt;

/// Errors that can occur while talking to Twitch
#[derive(Debug)]
pub enum TwitchError {
    /// Token exchange, refresh or validation failed
    AuthError(String),

    /// Helix answered with a non-2xx status
    ApiError { status: u16, body: String },

    /// Chat connection or login failed
    ConnectionError(String),

    /// WebSocket transport error
    WebSocketError(String),

    /// HTTP transport error
    HttpError(String),

    /// JSON parsing error
    JsonError(String),

    /// Reading or writing a local file failed
    IoError(String),

    /// Configuration error
    ConfigError(String),
}

impl fmt::Display for TwitchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TwitchError::AuthError(msg) => write!(f, "Authentication error: {}", msg),
            TwitchError::ApiError { status, body } => {
                write!(f, "API error: HTTP {} - {}", status, body)
            }
            TwitchError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            TwitchError::WebSocketError(msg) => write!(f, "WebSocket error: {}", msg),
            TwitchError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            TwitchError::JsonError(msg) => write!(f, "JSON error: {}", msg),
            TwitchError::IoError(msg) => write!(f, "I/O error: {}", msg),
            TwitchError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for TwitchError {}

impl From<serde_json::Error> for TwitchError {
    fn from(err: serde_json::Error) -> Self {
        TwitchError::JsonError(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for TwitchError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        TwitchError::WebSocketError(err.to_string())
    }
}

impl From<reqwest::Error> for TwitchError {
    fn from(err: reqwest::Error) -> Self {
        TwitchError::HttpError(err.to_string())
    }
}

impl From<std::io::Error> for TwitchError {
    fn from(err: std::io::Error) -> Self {
        TwitchError::IoError(err.to_string())
    }
}

impl TwitchError {
    /// Build an `ApiError` from a failed response, consuming its body
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        TwitchError::ApiError { status, body }
    }
}

pub type Result<T> = std::result::Result<T, TwitchError>;
