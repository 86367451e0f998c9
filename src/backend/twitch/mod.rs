//! Twitch integration: EventSub subscription management and chat.
//!
//! - `auth`: app access tokens (client credentials) and the refreshable user
//!   credential persisted on disk
//! - `eventsub`: the Helix subscription registry
//! - `reconciler`: converges remote subscriptions with the configured set
//! - `messages`: typed webhook notifications
//! - `chat` / `irc`: the chat connection and its line parser
mod auth;
mod chat;
mod error;
mod eventsub;
mod irc;
mod messages;
mod reconciler;

pub use auth::{AppTokenSource, TokenProvider, UserAuth, TOKEN_URL};
pub use chat::{ChatEvent, ChatHandler, ChatSession};
pub use error::{Result, TwitchError};
pub use eventsub::{
    HelixRegistry, SubscriptionRegistry, SubscriptionStatus, SubscriptionType, Transport,
    HELIX_URL,
};
pub use messages::{
    EventPayload, InboundEvent, RedemptionEvent, SubscriptionEnvelope, WebhookPayload,
};
pub use reconciler::{default_subscriptions, DesiredSubscription, Reconciler};
