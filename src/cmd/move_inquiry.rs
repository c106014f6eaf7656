//! Phase change command (`inquiry-board move`).

use std::str::FromStr;

use anyhow::{Context, Result};

use inquiry_board::board::models::Phase;
use inquiry_board::board::source::{DataSource, HttpSource};
use inquiry_board::format::format_date_time;

pub async fn cmd_move(base_url: &str, id: &str, phase: &str) -> Result<()> {
    let phase = Phase::from_str(phase).map_err(anyhow::Error::msg)?;
    let source = HttpSource::new(base_url);

    let inquiry = source
        .update_phase(id, phase)
        .await
        .with_context(|| format!("Failed to move {} to {}", id, phase.title()))?;

    tracing::info!(id = %inquiry.id, phase = %inquiry.phase, "phase change persisted");
    println!(
        "Moved {} ({}) to {} at {}",
        inquiry.id,
        inquiry.client_name,
        inquiry.phase.title(),
        format_date_time(&inquiry.updated_at)
    );
    Ok(())
}
