use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::auth::UserAuth;
use super::error::{Result, TwitchError};
use super::irc::IrcMessage;
use crate::backend::actions::Giveaways;
use crate::backend::router::EventRouter;

pub const CHAT_WS_URL: &str = "wss://irc-ws.chat.twitch.tv:443";

/// A chat message, normalized for routing and the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatEvent {
    pub channel: String,
    pub user: String,
    pub message: String,
    pub broadcaster: bool,
    pub moderator: bool,
}

impl ChatEvent {
    /// Build from a PRIVMSG line; `None` for any other command
    pub fn from_privmsg(message: &IrcMessage) -> Option<Self> {
        if message.command != "PRIVMSG" || message.params.len() < 2 {
            return None;
        }

        let channel = message.params[0].trim_start_matches('#').to_string();
        let login = message.nick()?.to_string();
        let badges = message.badges();

        Some(Self {
            broadcaster: badges.contains(&"broadcaster") || login.eq_ignore_ascii_case(&channel),
            moderator: message.tag("mod") == Some("1") || badges.contains(&"moderator"),
            user: message
                .tag("display-name")
                .map(str::to_string)
                .unwrap_or(login),
            message: message.trailing().unwrap_or_default().to_string(),
            channel,
        })
    }
}

/// What happens to each chat message once it is parsed
pub struct ChatHandler {
    router: Arc<EventRouter>,
    giveaways: Arc<dyn Giveaways>,
    winner_command: String,
}

impl ChatHandler {
    pub fn new(
        router: Arc<EventRouter>,
        giveaways: Arc<dyn Giveaways>,
        winner_command: String,
    ) -> Self {
        Self {
            router,
            giveaways,
            winner_command,
        }
    }

    fn is_winner_command(&self, event: &ChatEvent) -> bool {
        event.broadcaster && event.message.trim_start().starts_with(&self.winner_command)
    }

    /// Forward to the router; the broadcaster's winner command also draws the giveaway
    pub async fn on_message(&self, event: ChatEvent) {
        let draw = self.is_winner_command(&event);
        if draw {
            log::info!("{} asked for a giveaway winner", event.user);
        }

        self.router.handle_chat(event);

        if draw {
            if let Err(e) = self.giveaways.select_winner().await {
                log::error!("Failed to select giveaway winner: {}", e);
            }
        }
    }
}

/// One persistent chat connection for a single channel
pub struct ChatSession {
    url: String,
    channel: String,
    auth: Arc<UserAuth>,
    handler: ChatHandler,
}

impl ChatSession {
    pub fn new(channel: &str, auth: Arc<UserAuth>, handler: ChatHandler) -> Self {
        Self {
            url: CHAT_WS_URL.to_string(),
            channel: channel.trim_start_matches('#').to_lowercase(),
            auth,
            handler,
        }
    }

    /// Connect and process messages until the connection ends.
    ///
    /// Failures are logged; restarting is left to the process supervisor.
    pub async fn run(&self) {
        match self.connect().await {
            Ok(()) => log::warn!("Chat connection to #{} closed", self.channel),
            Err(e) => log::error!("Chat session for #{} failed: {}", self.channel, e),
        }
    }

    async fn connect(&self) -> Result<()> {
        let validated = self
            .auth
            .ensure_valid()
            .await
            .map_err(|e| TwitchError::ConnectionError(format!("chat login unavailable: {}", e)))?;
        log::debug!(
            "Chat token for {} ({}) has scopes {:?}",
            validated.login,
            validated.user_id,
            validated.scopes
        );

        let (ws_stream, _) = connect_async(&self.url)
            .await
            .map_err(|e| TwitchError::ConnectionError(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        let access_token = self.auth.access_token().await;
        let handshake = [
            "CAP REQ :twitch.tv/tags twitch.tv/commands".to_string(),
            format!("PASS oauth:{}", access_token),
            format!("NICK {}", validated.login.to_lowercase()),
            format!("JOIN #{}", self.channel),
        ];
        for line in handshake {
            write.send(Message::Text(line.into())).await?;
        }

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    for line in text.lines() {
                        let Some(irc) = IrcMessage::parse(line) else {
                            continue;
                        };
                        if let Some(reply) = self.handle_line(&irc).await? {
                            write.send(Message::Text(reply.into())).await?;
                        }
                    }
                }
                Ok(Message::Ping(payload)) => {
                    if let Err(e) = write.send(Message::Pong(payload)).await {
                        log::error!("Failed to send pong: {}", e);
                        break;
                    }
                }
                Ok(Message::Close(frame)) => {
                    let reason = frame
                        .as_ref()
                        .map(|f| f.reason.to_string())
                        .unwrap_or_else(|| "Unknown".to_string());
                    log::warn!("Chat WebSocket closed: {}", reason);
                    break;
                }
                Err(e) => return Err(e.into()),
                _ => {}
            }
        }

        Ok(())
    }

    /// React to one IRC line, returning a line to send back if needed
    async fn handle_line(&self, irc: &IrcMessage) -> Result<Option<String>> {
        match irc.command.as_str() {
            "PING" => Ok(Some(format!(
                "PONG :{}",
                irc.trailing().unwrap_or("tmi.twitch.tv")
            ))),
            "PRIVMSG" => {
                if let Some(event) = ChatEvent::from_privmsg(irc) {
                    self.handler.on_message(event).await;
                }
                Ok(None)
            }
            "NOTICE" => {
                let text = irc.trailing().unwrap_or_default();
                if text.contains("Login authentication failed")
                    || text.contains("Improperly formatted auth")
                {
                    return Err(TwitchError::ConnectionError(text.to_string()));
                }
                log::info!("Chat notice: {}", text);
                Ok(None)
            }
            "JOIN" if irc.nick().is_some() => {
                log::debug!("{} joined {}", irc.nick().unwrap_or_default(), irc.params.join(" "));
                Ok(None)
            }
            "001" => {
                log::info!("Logged in to chat, joining #{}", self.channel);
                Ok(None)
            }
            "RECONNECT" => {
                log::warn!("Chat server requested a reconnect");
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}
