pub mod server;
pub mod webhook;
pub mod websocket;

pub use server::{bind_server, serve, ServerState};
pub use webhook::WebhookState;
pub use websocket::{EventSink, UiEvent, WebSocketState};
