//! Board engine: phase columns plus the drag-and-drop state machine.
//!
//! ```text
//!            start(id)                    end(target)
//!   Idle ───────────────> Dragging ───────────────────> Idle
//!                          │   ^                         │
//!                          └───┘ hover(target)           └─> Option<PendingCommit>
//! ```
//!
//! Moves are applied to local state synchronously. A move that needs to be
//! persisted is handed back as a [`PendingCommit`]; the caller runs it
//! against a data source whenever it likes and feeds the [`CommitOutcome`]
//! to [`BoardEngine::settle`], which confirms the move or rolls it back to
//! the phase the card had when the gesture began.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::board::models::{Inquiry, Phase};
use crate::board::source::DataSource;
use crate::errors::{EngineError, SourceError};
use crate::format::relative_date;

/// Cards above this potential value are flagged on the board.
pub const HIGH_VALUE_THRESHOLD: f64 = 50_000.0;

const DEFAULT_UPDATE_ERROR: &str = "Failed to update phase";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Column(Phase),
    /// Another card; resolves to that card's current phase.
    Card(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { id: String, origin: Phase },
}

/// A phase change that has been applied locally and awaits persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommit {
    pub id: String,
    pub from: Phase,
    pub to: Phase,
}

impl PendingCommit {
    pub async fn run(self, source: &dyn DataSource) -> CommitOutcome {
        let result = source.update_phase(&self.id, self.to).await;
        CommitOutcome {
            commit: self,
            result,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub commit: PendingCommit,
    pub result: Result<Inquiry, SourceError>,
}

impl CommitOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Message shown on the card when the commit failed.
    pub fn error_message(&self) -> Option<String> {
        self.result.as_ref().err().map(|e| {
            let msg = e.to_string();
            if msg.trim().is_empty() {
                DEFAULT_UPDATE_ERROR.to_string()
            } else {
                msg
            }
        })
    }
}

/// One card as the board renders it.
#[derive(Debug, Clone, PartialEq)]
pub struct CardView<'a> {
    pub inquiry: &'a Inquiry,
    pub is_saving: bool,
    pub is_dragging: bool,
    pub error: Option<&'a str>,
}

impl CardView<'_> {
    pub fn is_high_value(&self) -> bool {
        self.inquiry.potential_value > HIGH_VALUE_THRESHOLD
    }

    /// Event date relative to `now`, e.g. "in 3 months".
    pub fn relative_event_date(&self, now: DateTime<Utc>) -> String {
        relative_date(&self.inquiry.event_date, now)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnView<'a> {
    pub phase: Phase,
    pub cards: Vec<CardView<'a>>,
    pub total_value: f64,
}

impl ColumnView<'_> {
    pub fn title(&self) -> &'static str {
        self.phase.title()
    }

    pub fn count(&self) -> usize {
        self.cards.len()
    }
}

#[derive(Debug, Default)]
struct BoardIndex {
    phase_by_id: HashMap<String, Phase>,
    members: HashMap<Phase, Vec<usize>>,
    totals: HashMap<Phase, f64>,
}

impl BoardIndex {
    fn build(items: &[Inquiry]) -> Self {
        let mut index = Self::default();
        for (pos, item) in items.iter().enumerate() {
            index.phase_by_id.insert(item.id.clone(), item.phase);
            index.members.entry(item.phase).or_default().push(pos);
            *index.totals.entry(item.phase).or_default() += item.potential_value;
        }
        index
    }
}

#[derive(Debug, Default)]
pub struct BoardEngine {
    items: Vec<Inquiry>,
    index: BoardIndex,
    drag: DragState,
    /// Outstanding persists keyed by inquiry id.
    pending: HashMap<String, PendingCommit>,
    errors: HashMap<String, String>,
}

impl BoardEngine {
    pub fn new(items: Vec<Inquiry>) -> Self {
        let mut engine = Self::default();
        engine.sync(items);
        engine
    }

    /// Replace local items with a fresh working set. The local phases of
    /// cards that are mid-drag or awaiting a persist are carried over onto
    /// the new records.
    pub fn sync(&mut self, items: Vec<Inquiry>) {
        let held = self
            .pending
            .keys()
            .map(String::as_str)
            .chain(self.dragging_id());
        let overlay: HashMap<String, Phase> = held
            .filter_map(|id| self.phase_of(id).map(|phase| (id.to_string(), phase)))
            .collect();

        self.items = items;
        for item in &mut self.items {
            if let Some(phase) = overlay.get(&item.id) {
                item.phase = *phase;
            }
        }
        self.reindex();

        if let DragState::Dragging { id, .. } = &self.drag
            && !self.index.phase_by_id.contains_key(id)
        {
            tracing::debug!(id = %id, "dragged inquiry left the working set");
            self.drag = DragState::Idle;
        }
        let index = &self.index;
        self.errors.retain(|id, _| index.phase_by_id.contains_key(id));
    }

    fn reindex(&mut self) {
        self.index = BoardIndex::build(&self.items);
    }

    fn set_phase(&mut self, id: &str, phase: Phase) -> bool {
        let Some(item) = self.items.iter_mut().find(|x| x.id == id) else {
            return false;
        };
        if item.phase == phase {
            return false;
        }
        item.phase = phase;
        self.reindex();
        true
    }

    pub fn items(&self) -> &[Inquiry] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Inquiry> {
        self.items.iter().find(|x| x.id == id)
    }

    pub fn phase_of(&self, id: &str) -> Option<Phase> {
        self.index.phase_by_id.get(id).copied()
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn dragging_id(&self) -> Option<&str> {
        match &self.drag {
            DragState::Dragging { id, .. } => Some(id),
            DragState::Idle => None,
        }
    }

    pub fn is_saving(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    pub fn error_for(&self, id: &str) -> Option<&str> {
        self.errors.get(id).map(String::as_str)
    }

    pub fn card(&self, id: &str) -> Option<CardView<'_>> {
        self.get(id).map(|inquiry| self.card_view(inquiry))
    }

    fn card_view<'a>(&'a self, inquiry: &'a Inquiry) -> CardView<'a> {
        CardView {
            inquiry,
            is_saving: self.is_saving(&inquiry.id),
            is_dragging: self.dragging_id() == Some(inquiry.id.as_str()),
            error: self.error_for(&inquiry.id),
        }
    }

    /// Columns in display order with their members and value totals.
    pub fn columns(&self) -> Vec<ColumnView<'_>> {
        Phase::ALL
            .iter()
            .map(|phase| {
                let cards = self
                    .index
                    .members
                    .get(phase)
                    .map(|positions| {
                        positions
                            .iter()
                            .map(|&pos| self.card_view(&self.items[pos]))
                            .collect()
                    })
                    .unwrap_or_default();
                ColumnView {
                    phase: *phase,
                    cards,
                    total_value: self.index.totals.get(phase).copied().unwrap_or(0.0),
                }
            })
            .collect()
    }

    fn resolve(&self, target: &DropTarget) -> Option<Phase> {
        match target {
            DropTarget::Column(phase) => Some(*phase),
            DropTarget::Card(id) => self.phase_of(id),
        }
    }

    // ── Drag protocol ─────────────────────────────────────────────────

    pub fn start(&mut self, id: &str) -> Result<(), EngineError> {
        if let DragState::Dragging { id: active, .. } = &self.drag {
            return Err(EngineError::DragInProgress { id: active.clone() });
        }
        let origin = self.phase_of(id).ok_or_else(|| EngineError::UnknownInquiry {
            id: id.to_string(),
        })?;
        if self.is_saving(id) {
            return Err(EngineError::AlreadySaving { id: id.to_string() });
        }
        self.drag = DragState::Dragging {
            id: id.to_string(),
            origin,
        };
        Ok(())
    }

    /// Preview the dragged card in the hovered target's phase. Returns true
    /// when the card moved.
    pub fn hover(&mut self, target: &DropTarget) -> bool {
        let DragState::Dragging { id, .. } = &self.drag else {
            return false;
        };
        let id = id.clone();
        match self.resolve(target) {
            Some(phase) => self.set_phase(&id, phase),
            None => false,
        }
    }

    /// Finish the gesture. Returns the commit to persist when the card ends
    /// up in a phase other than the one it started in.
    pub fn end(&mut self, target: Option<&DropTarget>) -> Option<PendingCommit> {
        let DragState::Dragging { id, origin } = std::mem::take(&mut self.drag) else {
            return None;
        };

        let Some(to) = target.and_then(|t| self.resolve(t)) else {
            // Dropped outside the board: undo any hover preview.
            self.set_phase(&id, origin);
            return None;
        };

        self.set_phase(&id, to);
        if to == origin {
            return None;
        }

        self.errors.remove(&id);
        let commit = PendingCommit {
            id: id.clone(),
            from: origin,
            to,
        };
        self.pending.insert(id, commit.clone());
        tracing::info!(id = %commit.id, from = %commit.from, to = %commit.to, "phase change pending");
        Some(commit)
    }

    /// Abandon the gesture and restore the card's original phase.
    pub fn cancel(&mut self) {
        if let DragState::Dragging { id, origin } = std::mem::take(&mut self.drag) {
            self.set_phase(&id, origin);
        }
    }

    /// Start a non-optimistic phase change (no local move until confirmed).
    pub fn request_phase(
        &mut self,
        id: &str,
        to: Phase,
    ) -> Result<Option<PendingCommit>, EngineError> {
        let from = self.phase_of(id).ok_or_else(|| EngineError::UnknownInquiry {
            id: id.to_string(),
        })?;
        if self.is_saving(id) {
            return Err(EngineError::AlreadySaving { id: id.to_string() });
        }
        if self.dragging_id() == Some(id) {
            return Err(EngineError::DragInProgress { id: id.to_string() });
        }
        if from == to {
            return Ok(None);
        }
        self.errors.remove(id);
        let commit = PendingCommit {
            id: id.to_string(),
            from,
            to,
        };
        self.pending.insert(id.to_string(), commit.clone());
        Ok(Some(commit))
    }

    /// Apply a persist result. On success the resolved record replaces the
    /// local one; on failure the card returns to `commit.from` and carries
    /// the error message.
    pub fn settle(&mut self, outcome: &CommitOutcome) {
        let id = &outcome.commit.id;
        self.pending.remove(id);
        match &outcome.result {
            Ok(resolved) => {
                if let Some(item) = self.items.iter_mut().find(|x| x.id == *id) {
                    *item = resolved.clone();
                }
                self.reindex();
                tracing::info!(id = %id, phase = %resolved.phase, "phase change confirmed");
            }
            Err(e) => {
                self.set_phase(id, outcome.commit.from);
                let message = outcome
                    .error_message()
                    .unwrap_or_else(|| DEFAULT_UPDATE_ERROR.to_string());
                tracing::warn!(id = %id, error = %e, "phase change failed, rolled back");
                self.errors.insert(id.clone(), message);
            }
        }
    }
}
