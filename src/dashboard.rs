//! The board shell: owns filters, the fetch pipeline, the engine and the
//! side panel, and routes events between them.

use std::time::Duration;

use tokio::sync::watch;

use crate::board::models::{Inquiry, Phase};
use crate::board::source::SharedSource;
use crate::debounce::Debouncer;
use crate::engine::{BoardEngine, CommitOutcome, DropTarget, PendingCommit};
use crate::errors::EngineError;
use crate::fetch::{FetchController, FetchState};
use crate::filters::{FilterPatch, FilterStore};
use crate::panel::{InquiryDetail, SidePanel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Quiet period between the last keystroke and committing the search.
    pub search_debounce: Duration,
    /// Quiet period between the last filter change and issuing a fetch.
    pub fetch_debounce: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(300),
            fetch_debounce: crate::fetch::DEFAULT_FETCH_DEBOUNCE,
        }
    }
}

pub struct Dashboard {
    source: SharedSource,
    filters: FilterStore,
    search_debounce: Debouncer,
    fetch: FetchController,
    feed: watch::Receiver<FetchState>,
    board: BoardEngine,
    panel: SidePanel,
}

impl Dashboard {
    /// `fallback` is shown when a fetch fails.
    pub fn new(source: SharedSource, fallback: Vec<Inquiry>, timing: Timing) -> Self {
        let fetch = FetchController::new(source.clone(), fallback, timing.fetch_debounce);
        let feed = fetch.subscribe();
        Self {
            source,
            filters: FilterStore::new(),
            search_debounce: Debouncer::new(timing.search_debounce),
            fetch,
            feed,
            board: BoardEngine::default(),
            panel: SidePanel::new(),
        }
    }

    pub fn filters(&self) -> &FilterStore {
        &self.filters
    }

    pub fn board(&self) -> &BoardEngine {
        &self.board
    }

    pub fn fetch_state(&self) -> FetchState {
        self.fetch.snapshot()
    }

    /// Kick off the first load with the current filters.
    pub fn start(&mut self) {
        self.refetch();
    }

    fn refetch(&mut self) {
        self.fetch.filters_changed(self.filters.criteria());
    }

    pub fn retry(&mut self) {
        self.fetch.retry();
    }

    // ── Filters ───────────────────────────────────────────────────────

    pub fn type_search(&mut self, value: impl Into<String>) {
        self.filters.set_ui_search(value);
        self.search_debounce.reset();
    }

    /// Commit the typed search now (also what the debounce does on expiry).
    pub fn commit_search(&mut self) {
        self.search_debounce.cancel();
        if self.filters.commit_search() {
            self.refetch();
        }
    }

    pub fn set_date_from(&mut self, value: impl Into<String>) {
        self.filters.set_date_from(value);
        self.refetch();
    }

    pub fn set_date_to(&mut self, value: impl Into<String>) {
        self.filters.set_date_to(value);
        self.refetch();
    }

    pub fn set_min_value(&mut self, value: f64) {
        self.filters.set_min_value(value);
        self.refetch();
    }

    pub fn set_filters(&mut self, patch: FilterPatch) {
        self.filters.set_filters(patch);
        self.refetch();
    }

    pub fn clear_filters(&mut self) {
        self.search_debounce.cancel();
        self.filters.clear_filters();
        self.refetch();
    }

    pub fn hydrate(&mut self, query: &str) {
        self.filters.hydrate(query);
        self.refetch();
    }

    // ── Feed ──────────────────────────────────────────────────────────

    /// Pull the latest fetch output into the engine if it changed.
    pub fn sync(&mut self) -> bool {
        if !self.feed.has_changed().unwrap_or(false) {
            return false;
        }
        let items = self.feed.borrow_and_update().items.clone();
        self.board.sync(items);
        true
    }

    /// Wait for the next event that changes the dashboard: the search
    /// debounce expiring or a new fetch result. Returns false once the feed
    /// is closed.
    pub async fn next_update(&mut self) -> bool {
        tokio::select! {
            _ = self.search_debounce.wait() => {
                if self.filters.commit_search() {
                    self.refetch();
                }
                true
            }
            changed = self.feed.changed() => {
                if changed.is_err() {
                    return false;
                }
                let items = self.feed.borrow_and_update().items.clone();
                self.board.sync(items);
                true
            }
        }
    }

    /// Drive updates until no fetch or debounce is outstanding.
    pub async fn settle_updates(&mut self) {
        loop {
            if !self.search_debounce.is_armed() && !self.fetch.is_busy() {
                self.sync();
                return;
            }
            if !self.next_update().await {
                return;
            }
        }
    }

    // ── Drag ──────────────────────────────────────────────────────────

    pub fn drag_start(&mut self, id: &str) -> Result<(), EngineError> {
        self.board.start(id)
    }

    pub fn drag_over(&mut self, target: &DropTarget) -> bool {
        self.board.hover(target)
    }

    pub fn drag_end(&mut self, target: Option<&DropTarget>) -> Option<PendingCommit> {
        self.board.end(target)
    }

    pub fn drag_cancel(&mut self) {
        self.board.cancel();
    }

    /// Apply a persist result from a drag or the panel.
    pub fn settle(&mut self, outcome: &CommitOutcome) {
        self.board.settle(outcome);
        self.panel.settle(outcome);
        if let Ok(resolved) = &outcome.result {
            self.fetch.merge_updated(resolved);
        }
    }

    /// End the gesture and persist the move inline.
    pub async fn drop_card(&mut self, target: Option<&DropTarget>) -> Option<CommitOutcome> {
        let commit = self.drag_end(target)?;
        let outcome = commit.run(self.source.as_ref()).await;
        self.settle(&outcome);
        Some(outcome)
    }

    // ── Side panel ────────────────────────────────────────────────────

    pub fn open_inquiry(&mut self, id: &str) -> Result<(), EngineError> {
        self.panel.open(id, &self.board)
    }

    pub fn close_panel(&mut self) {
        self.panel.close();
    }

    pub fn panel_detail(&self) -> Option<InquiryDetail> {
        self.panel.detail(&self.board)
    }

    pub async fn panel_change_phase(
        &mut self,
        phase: Phase,
    ) -> Result<Option<CommitOutcome>, EngineError> {
        let Some(commit) = self.panel.change_phase(phase, &mut self.board)? else {
            return Ok(None);
        };
        let outcome = commit.run(self.source.as_ref()).await;
        self.settle(&outcome);
        Ok(Some(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::models::{ListFilters, sample};
    use crate::board::source::testing::ScriptedSource;
    use crate::errors::SourceError;

    fn items() -> Vec<Inquiry> {
        vec![
            sample("X", "Acme Corp", 15000.0, Phase::New),
            sample("W", "Acme Corp", 5000.0, Phase::New),
            sample("Y", "Globex AG", 80000.0, Phase::SentToHotels),
        ]
    }

    async fn loaded(source: std::sync::Arc<ScriptedSource>) -> Dashboard {
        let mut dashboard = Dashboard::new(source, Vec::new(), Timing::default());
        dashboard.start();
        dashboard.settle_updates().await;
        dashboard
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_load_populates_board() {
        let source = ScriptedSource::new(items());
        let dashboard = loaded(source.clone()).await;
        assert_eq!(dashboard.board().items().len(), 3);
        assert_eq!(source.list_calls(), vec![ListFilters::default()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_commits_once_and_fetches_once() {
        let source = ScriptedSource::new(items());
        let mut dashboard = loaded(source.clone()).await;

        for partial in ["a", "ac", "acm", "acme "] {
            dashboard.type_search(partial);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        dashboard.set_min_value(10000.0);
        dashboard.settle_updates().await;

        let calls = source.list_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].search, "acme");
        assert_eq!(calls[1].min_value, 10000.0);
        let ids: Vec<_> = dashboard.board().items().iter().map(|x| x.id.as_str()).collect();
        assert_eq!(ids, vec!["X"]);
        assert_eq!(dashboard.filters().active_filter_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drag_commit_success_updates_feed() {
        let source = ScriptedSource::new(items());
        let mut dashboard = loaded(source.clone()).await;

        dashboard.drag_start("X").unwrap();
        dashboard.drag_over(&DropTarget::Column(Phase::OffersReceived));
        let outcome = dashboard
            .drop_card(Some(&DropTarget::Column(Phase::Completed)))
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert_eq!(source.update_calls(), vec![("X".to_string(), Phase::Completed)]);
        assert_eq!(dashboard.board().phase_of("X"), Some(Phase::Completed));
        let feed = dashboard.fetch_state();
        let x = feed.items.iter().find(|x| x.id == "X").unwrap();
        assert_eq!(x.phase, Phase::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drag_commit_failure_rolls_back() {
        let source = ScriptedSource::new(items());
        source.fail_updates(SourceError::Http {
            status: 500,
            message: "Failed to update phase".into(),
        });
        let mut dashboard = loaded(source.clone()).await;

        dashboard.drag_start("X").unwrap();
        dashboard.drag_over(&DropTarget::Card("Y".into()));
        let outcome = dashboard
            .drop_card(Some(&DropTarget::Card("Y".into())))
            .await
            .unwrap();

        assert!(!outcome.is_success());
        assert_eq!(dashboard.board().phase_of("X"), Some(Phase::New));
        assert_eq!(dashboard.board().error_for("X"), Some("Failed to update phase"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_drag_while_first_commit_persists() {
        let source = ScriptedSource::new(items());
        let mut dashboard = loaded(source.clone()).await;

        dashboard.drag_start("X").unwrap();
        let commit = dashboard
            .drag_end(Some(&DropTarget::Column(Phase::Completed)))
            .unwrap();
        assert!(dashboard.board().is_saving("X"));
        assert_eq!(dashboard.board().phase_of("X"), Some(Phase::Completed));

        dashboard.drag_start("W").unwrap();
        dashboard.drag_over(&DropTarget::Column(Phase::OffersReceived));
        assert_eq!(dashboard.board().phase_of("W"), Some(Phase::OffersReceived));

        let outcome = commit.run(source.as_ref()).await;
        dashboard.settle(&outcome);
        assert!(!dashboard.board().is_saving("X"));
        assert_eq!(dashboard.board().phase_of("X"), Some(Phase::Completed));
        assert_eq!(dashboard.board().dragging_id(), Some("W"));

        dashboard.drag_cancel();
        assert!(dashboard.board().dragging_id().is_none());
        assert_eq!(dashboard.board().phase_of("W"), Some(Phase::New));
        assert!(dashboard.drag_end(Some(&DropTarget::Column(Phase::Completed))).is_none());
        assert_eq!(source.update_calls(), vec![("X".to_string(), Phase::Completed)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_shows_fallback_and_retry_recovers() {
        let source = ScriptedSource::new(items());
        source.fail_search("");
        let fallback = vec![sample("S", "Static", 1.0, Phase::New)];
        let mut dashboard = Dashboard::new(source.clone(), fallback, Timing::default());
        dashboard.start();
        dashboard.settle_updates().await;

        assert!(dashboard.fetch_state().error.is_some());
        assert_eq!(dashboard.board().items()[0].id, "S");

        source.failing_searches.lock().unwrap().clear();
        dashboard.retry();
        dashboard.settle_updates().await;
        assert!(dashboard.fetch_state().error.is_none());
        assert_eq!(dashboard.board().items().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panel_phase_change_through_dashboard() {
        let source = ScriptedSource::new(items());
        let mut dashboard = loaded(source.clone()).await;

        dashboard.open_inquiry("Y").unwrap();
        let outcome = dashboard
            .panel_change_phase(Phase::Completed)
            .await
            .unwrap()
            .unwrap();
        assert!(outcome.is_success());
        let detail = dashboard.panel_detail().unwrap();
        assert_eq!(detail.phase, Phase::Completed);
        assert_eq!(dashboard.board().phase_of("Y"), Some(Phase::Completed));

        dashboard.close_panel();
        assert!(dashboard.panel_detail().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hydrate_and_clear() {
        let source = ScriptedSource::new(items());
        let mut dashboard = loaded(source.clone()).await;

        dashboard.hydrate("q=globex");
        dashboard.settle_updates().await;
        assert_eq!(dashboard.filters().ui_search(), "globex");
        assert_eq!(dashboard.board().items().len(), 1);

        dashboard.clear_filters();
        dashboard.settle_updates().await;
        assert_eq!(dashboard.board().items().len(), 3);
    }
}
