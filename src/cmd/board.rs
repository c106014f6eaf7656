//! Board listing command (`inquiry-board board`).

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};

use inquiry_board::board::source::{HttpSource, SharedSource};
use inquiry_board::dashboard::{Dashboard, Timing};
use inquiry_board::engine::BoardEngine;
use inquiry_board::format::{format_chf, format_date};

#[derive(Debug, Default, Clone)]
pub struct BoardQuery {
    pub search: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub min_value: Option<f64>,
}

pub async fn cmd_board(base_url: &str, query: BoardQuery, timing: Timing) -> Result<()> {
    let source: SharedSource = Arc::new(HttpSource::new(base_url));
    let mut dashboard = Dashboard::new(source, Vec::new(), timing);

    if let Some(search) = query.search {
        dashboard.type_search(search);
        dashboard.commit_search();
    }
    if let Some(from) = query.date_from {
        dashboard.set_date_from(from);
    }
    if let Some(to) = query.date_to {
        dashboard.set_date_to(to);
    }
    if let Some(min) = query.min_value {
        dashboard.set_min_value(min);
    }
    dashboard.start();
    dashboard.settle_updates().await;

    if let Some(err) = dashboard.fetch_state().error {
        anyhow::bail!("Failed to load inquiries from {}: {}", base_url, err);
    }

    let active = dashboard.filters().active_filter_count();
    if active > 0 {
        println!(
            "Filters: {} active ({})",
            active,
            dashboard.filters().criteria().to_query_string()
        );
    }
    print!("{}", render_board(dashboard.board(), Utc::now()));
    Ok(())
}

/// Plain-text rendering of every column with its cards.
pub fn render_board(board: &BoardEngine, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    for column in board.columns() {
        let _ = writeln!(
            out,
            "{} ({}) · {}",
            column.title(),
            column.count(),
            format_chf(column.total_value)
        );
        if column.cards.is_empty() {
            let _ = writeln!(out, "  (empty)");
        }
        for card in &column.cards {
            let inquiry = card.inquiry;
            let marker = if card.is_high_value() { " ★" } else { "" };
            let _ = writeln!(
                out,
                "  [{}] {} · {} · {} ({}) · {} guests · {}{}",
                inquiry.id,
                inquiry.client_name,
                inquiry.event_type,
                format_date(&inquiry.event_date),
                card.relative_event_date(now),
                inquiry.guest_count,
                format_chf(inquiry.potential_value),
                marker
            );
        }
    }
    out
}
