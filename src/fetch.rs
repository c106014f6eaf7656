//! Filter-driven fetch pipeline.
//!
//! `FetchController` turns a stream of filter changes into at most one list
//! request per settled filter state:
//!
//! 1. `filters_changed` (re)starts the quiet-period timer.
//! 2. When the timer fires, the previous in-flight request is aborted and a
//!    new one is spawned under a fresh generation number.
//! 3. A result is applied only if its generation is still current, so a
//!    superseded response can never overwrite a newer one.
//! 4. Failures surface as `error` and substitute the fallback item set.
//!
//! Consumers observe the working set through `subscribe()`; every applied
//! result bumps `revision`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::board::models::{Inquiry, ListFilters};
use crate::board::source::SharedSource;
use crate::debounce::DelayedTask;

pub const DEFAULT_FETCH_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchState {
    pub items: Vec<Inquiry>,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Incremented whenever `items` is replaced or reconciled.
    pub revision: u64,
}

#[derive(Default)]
struct Inflight {
    generation: u64,
    request: Option<JoinHandle<()>>,
    last_filters: ListFilters,
}

struct Shared {
    source: SharedSource,
    fallback: Vec<Inquiry>,
    state: watch::Sender<FetchState>,
    inflight: Mutex<Inflight>,
}

impl Shared {
    fn inflight(&self) -> std::sync::MutexGuard<'_, Inflight> {
        self.inflight.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct FetchController {
    shared: Arc<Shared>,
    timer: DelayedTask,
}

impl FetchController {
    pub fn new(source: SharedSource, fallback: Vec<Inquiry>, debounce: Duration) -> Self {
        let (state, _) = watch::channel(FetchState::default());
        Self {
            shared: Arc::new(Shared {
                source,
                fallback,
                state,
                inflight: Mutex::new(Inflight::default()),
            }),
            timer: DelayedTask::new(debounce),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.shared.state.subscribe()
    }

    pub fn snapshot(&self) -> FetchState {
        self.shared.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.state.borrow().is_loading
    }

    /// True while a fetch is scheduled or in flight.
    pub fn is_busy(&self) -> bool {
        self.timer.is_pending() || self.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.shared.state.borrow().error.clone()
    }

    /// Filters of the most recently issued request.
    pub fn last_filters(&self) -> ListFilters {
        self.shared.inflight().last_filters.clone()
    }

    /// Schedule a fetch for `filters` after the quiet period. Edits arriving
    /// within the window replace the pending ones.
    pub fn filters_changed(&mut self, filters: ListFilters) {
        tracing::trace!(query = %filters.to_query_string(), "fetch scheduled");
        let shared = self.shared.clone();
        self.timer.schedule(async move {
            issue(&shared, filters);
        });
    }

    /// Re-issue the last request immediately.
    pub fn retry(&mut self) {
        self.timer.cancel();
        let filters = self.last_filters();
        issue(&self.shared, filters);
    }

    /// Issue a request right away, skipping the quiet period.
    pub fn fetch_now(&mut self, filters: ListFilters) {
        self.timer.cancel();
        issue(&self.shared, filters);
    }

    /// Reconcile a server-confirmed record into the working set.
    pub fn merge_updated(&self, updated: &Inquiry) {
        self.shared.state.send_if_modified(|state| {
            match state.items.iter_mut().find(|x| x.id == updated.id) {
                Some(slot) if slot != updated => {
                    *slot = updated.clone();
                    state.revision += 1;
                    true
                }
                _ => false,
            }
        });
    }

    /// Wait for the next applied result (success or fallback).
    pub async fn next_result(&self) -> FetchState {
        let seen = self.shared.state.borrow().revision;
        self.wait_for_revision(seen + 1).await
    }

    /// Wait until a result with at least `revision` has been applied and no
    /// request is outstanding.
    pub async fn wait_for_revision(&self, revision: u64) -> FetchState {
        let mut rx = self.subscribe();
        loop {
            {
                let state = rx.borrow_and_update();
                if state.revision >= revision && !state.is_loading {
                    return state.clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }
}

impl Drop for FetchController {
    fn drop(&mut self) {
        if let Some(handle) = self.shared.inflight().request.take() {
            handle.abort();
        }
    }
}

fn issue(shared: &Arc<Shared>, filters: ListFilters) {
    let mut inflight = shared.inflight();
    if let Some(previous) = inflight.request.take() {
        if !previous.is_finished() {
            tracing::debug!(generation = inflight.generation, "cancelling superseded fetch");
        }
        previous.abort();
    }
    inflight.generation += 1;
    inflight.last_filters = filters.clone();
    let generation = inflight.generation;

    shared.state.send_modify(|state| {
        state.is_loading = true;
        state.error = None;
    });
    tracing::debug!(generation, query = %filters.to_query_string(), "fetch issued");

    let task_shared = shared.clone();
    inflight.request = Some(tokio::spawn(async move {
        let result = task_shared.source.list(&filters).await;
        let inflight = task_shared.inflight();
        if inflight.generation != generation {
            tracing::debug!(generation, "discarding stale fetch result");
            return;
        }
        task_shared.state.send_modify(|state| {
            match result {
                Ok(items) => {
                    tracing::debug!(generation, count = items.len(), "fetch applied");
                    state.items = items;
                    state.error = None;
                }
                Err(e) => {
                    tracing::warn!(generation, error = %e, "fetch failed, using fallback data");
                    state.items = task_shared.fallback.clone();
                    state.error = Some(e.to_string());
                }
            }
            state.is_loading = false;
            state.revision += 1;
        });
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::models::{Phase, sample};
    use crate::board::source::testing::ScriptedSource;

    fn items() -> Vec<Inquiry> {
        vec![
            sample("inq-1", "Acme Corp", 15000.0, Phase::New),
            sample("inq-2", "Acme Corp", 5000.0, Phase::New),
            sample("inq-3", "Globex AG", 80000.0, Phase::Completed),
        ]
    }

    fn search(s: &str) -> ListFilters {
        ListFilters {
            search: s.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_within_window_produce_one_fetch() {
        let source = ScriptedSource::new(items());
        let mut fetch = FetchController::new(source.clone(), Vec::new(), DEFAULT_FETCH_DEBOUNCE);

        for s in ["a", "ac", "acm", "acme"] {
            fetch.filters_changed(search(s));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        let state = fetch.next_result().await;

        assert_eq!(source.list_calls(), vec![search("acme")]);
        assert_eq!(state.items.len(), 2);
        assert!(!state.is_loading);
        assert_eq!(state.revision, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_request_never_overwrites_newer() {
        let source = ScriptedSource::new(items());
        source.delay_search("acme", Duration::from_secs(2));
        let mut fetch = FetchController::new(source.clone(), Vec::new(), DEFAULT_FETCH_DEBOUNCE);

        fetch.fetch_now(search("acme"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        fetch.fetch_now(search("globex"));

        let state = fetch.next_result().await;
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].id, "inq-3");

        tokio::time::sleep(Duration::from_secs(5)).await;
        let state = fetch.snapshot();
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].id, "inq-3");
        assert_eq!(state.revision, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_sets_error_and_substitutes_fallback() {
        let source = ScriptedSource::new(items());
        source.fail_search("boom");
        let fallback = vec![sample("static", "Static Data", 1.0, Phase::New)];
        let mut fetch = FetchController::new(source.clone(), fallback, DEFAULT_FETCH_DEBOUNCE);

        fetch.fetch_now(search("acme"));
        let first = fetch.next_result().await;
        assert_eq!(first.items.len(), 2);

        fetch.fetch_now(search("boom"));
        let second = fetch.next_result().await;
        assert_eq!(second.error.as_deref(), Some("Failed to load inquiries"));
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].id, "static");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_request_produces_no_error() {
        let source = ScriptedSource::new(items());
        source.delay_search("boom", Duration::from_secs(1));
        source.fail_search("boom");
        let mut fetch = FetchController::new(source.clone(), Vec::new(), DEFAULT_FETCH_DEBOUNCE);

        fetch.fetch_now(search("boom"));
        tokio::time::sleep(Duration::from_millis(10)).await;
        fetch.fetch_now(search(""));
        let state = fetch.next_result().await;
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert!(state.error.is_none());
        assert!(fetch.error().is_none());
        assert_eq!(fetch.snapshot().items.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_reissues_last_filters() {
        let source = ScriptedSource::new(items());
        let mut fetch = FetchController::new(source.clone(), Vec::new(), DEFAULT_FETCH_DEBOUNCE);

        fetch.fetch_now(search("globex"));
        fetch.next_result().await;
        fetch.retry();
        let state = fetch.next_result().await;

        assert_eq!(source.list_calls(), vec![search("globex"), search("globex")]);
        assert_eq!(state.revision, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_flag_tracks_request() {
        let source = ScriptedSource::new(items());
        source.delay_search("", Duration::from_millis(500));
        let mut fetch = FetchController::new(source.clone(), Vec::new(), DEFAULT_FETCH_DEBOUNCE);

        fetch.fetch_now(ListFilters::default());
        assert!(fetch.is_loading());
        fetch.next_result().await;
        assert!(!fetch.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_merge_updated_replaces_record() {
        let source = ScriptedSource::new(items());
        let mut fetch = FetchController::new(source.clone(), Vec::new(), DEFAULT_FETCH_DEBOUNCE);
        fetch.fetch_now(ListFilters::default());
        let before = fetch.next_result().await;

        let mut updated = before.items[0].clone();
        updated.phase = Phase::Completed;
        fetch.merge_updated(&updated);

        let after = fetch.snapshot();
        assert_eq!(after.items[0].phase, Phase::Completed);
        assert_eq!(after.revision, before.revision + 1);

        fetch.merge_updated(&updated);
        assert_eq!(fetch.snapshot().revision, before.revision + 1);
    }
}
