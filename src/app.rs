use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::actions::{GiveawayPool, Giveaways, ObsSceneSwitcher, ShellLauncher, SnapHotkey};
use crate::backend::config::AppConfig;
use crate::backend::rewards::{Collaborators, RewardDispatcher};
use crate::backend::router::EventRouter;
use crate::backend::twitch::{
    ChatHandler, ChatSession, HelixRegistry, Reconciler, TokenProvider, Transport, UserAuth,
};
use crate::backend::web::{bind_server, serve, ServerState, WebSocketState, WebhookState};

/// Every long-lived service, built once from configuration
pub struct AppContext {
    port: u16,
    assets_dir: PathBuf,
    server: ServerState,
    reconciler: Reconciler,
    chat: Option<ChatSession>,
}

impl AppContext {
    pub fn build(config: AppConfig, root: &Path) -> Self {
        let ui = WebSocketState::new();
        let sink = Arc::new(ui.clone());

        let giveaways: Arc<dyn Giveaways> = Arc::new(GiveawayPool::new(sink.clone()));
        let collaborators = Collaborators {
            scenes: Arc::new(ObsSceneSwitcher::new(
                config.obs.host.clone(),
                config.obs.port,
                config.obs.password.clone(),
            )),
            snap: Arc::new(SnapHotkey::new(
                config.snap.program.clone(),
                config.snap.args.clone(),
            )),
            giveaways: giveaways.clone(),
            launcher: Arc::new(ShellLauncher),
        };

        let router = Arc::new(EventRouter::new(
            RewardDispatcher::new(config.rewards.clone(), collaborators),
            sink,
        ));

        let reconciler = Reconciler::new(
            Arc::new(HelixRegistry::new(&config.twitch.helix_url)),
            Arc::new(TokenProvider::new(
                config.twitch.client_id.clone(),
                config.twitch.client_secret.clone(),
                config.twitch.token_url.clone(),
            )),
            config.twitch.client_id.clone(),
            config.twitch.broadcaster_id.clone(),
            Transport::webhook(&config.webhook.callback, &config.webhook.secret),
            config.subscriptions.clone(),
        );

        let token_path = AppConfig::resolve(root, &config.twitch.user_token_path);
        let chat = match UserAuth::load(
            &token_path,
            config.twitch.client_id.clone(),
            config.twitch.client_secret.clone(),
            config.twitch.token_url.clone(),
        ) {
            Ok(auth) => Some(ChatSession::new(
                &config.twitch.channel,
                Arc::new(auth),
                ChatHandler::new(router.clone(), giveaways, config.chat.winner_command.clone()),
            )),
            Err(e) => {
                log::error!("Chat disabled, no usable user token: {}", e);
                None
            }
        };

        Self {
            port: config.server.port,
            assets_dir: AppConfig::resolve(root, &config.server.assets_dir),
            server: ServerState {
                ui,
                webhook: WebhookState::new(router, &config.webhook.secret),
            },
            reconciler,
            chat,
        }
    }

    /// Start the HTTP server, then reconcile subscriptions and run chat
    /// side by side until the server stops. The listener is bound first so
    /// Twitch can reach the callback while verifying new subscriptions.
    pub async fn run(self) -> std::io::Result<()> {
        let listener = bind_server(self.port).await?;
        let server = tokio::spawn(serve(listener, self.assets_dir, self.server));

        let reconcile = async {
            let report = self.reconciler.run().await;
            if report.failed > 0 {
                log::warn!(
                    "{} subscriptions could not be created, they will be retried on next start",
                    report.failed
                );
            }
        };
        let chat = async {
            if let Some(chat) = &self.chat {
                chat.run().await;
            }
        };
        tokio::join!(reconcile, chat);

        match server.await {
            Ok(result) => result,
            Err(e) => Err(std::io::Error::other(e)),
        }
    }
}
