//! Board API server command (`inquiry-board serve`).

use anyhow::Result;

use inquiry_board::board::server::{ServerConfig, start_server};

pub async fn cmd_serve(config: ServerConfig) -> Result<()> {
    if let Some(seed) = &config.seed_path {
        tracing::info!(seed = %seed.display(), "serving inquiries from seed file");
    }
    start_server(config).await
}
