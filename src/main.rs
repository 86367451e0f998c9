use log::{error, info};

mod app;
pub mod backend;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let root = match backend::config::project_root() {
        Ok(root) => root,
        Err(e) => {
            error!("Could not locate project root: {}", e);
            std::process::exit(1);
        }
    };

    let config = match backend::config::load_config(&root) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Starting stream companion for #{} (broadcaster {})",
        config.twitch.channel, config.twitch.broadcaster_id
    );

    let context = app::AppContext::build(config, &root);
    if let Err(e) = context.run().await {
        error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}
