//! Side panel: detail view of the selected inquiry.
//!
//! The panel reads through the board engine and never previews moves. A
//! phase picked here goes through `BoardEngine::request_phase`, so the card
//! is locked against dragging until the persist resolves.

use crate::board::models::Phase;
use crate::engine::{BoardEngine, CommitOutcome, PendingCommit};
use crate::errors::EngineError;
use crate::format::{format_chf, format_date, format_date_time};

/// Formatted fields for the selected inquiry.
#[derive(Debug, Clone, PartialEq)]
pub struct InquiryDetail {
    pub id: String,
    pub client_name: String,
    pub contact_person: String,
    pub event_type: String,
    pub event_date: String,
    pub guest_count: u32,
    pub potential_value: String,
    /// Draft phase while a change is saving, otherwise the card's phase.
    pub phase: Phase,
    pub hotels: Vec<String>,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
    pub is_saving: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct SidePanel {
    selected: Option<String>,
    draft: Option<Phase>,
    error: Option<String>,
}

impl SidePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, id: &str, engine: &BoardEngine) -> Result<(), EngineError> {
        if engine.get(id).is_none() {
            return Err(EngineError::UnknownInquiry { id: id.to_string() });
        }
        self.selected = Some(id.to_string());
        self.draft = None;
        self.error = None;
        Ok(())
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    /// `None` when nothing is selected or the selection left the board.
    pub fn detail(&self, engine: &BoardEngine) -> Option<InquiryDetail> {
        let id = self.selected.as_deref()?;
        let inquiry = engine.get(id)?;
        let notes = inquiry
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("No notes yet.")
            .to_string();
        Some(InquiryDetail {
            id: inquiry.id.clone(),
            client_name: inquiry.client_name.clone(),
            contact_person: inquiry.contact_person.clone(),
            event_type: inquiry.event_type.clone(),
            event_date: format_date(&inquiry.event_date),
            guest_count: inquiry.guest_count,
            potential_value: format_chf(inquiry.potential_value),
            phase: self.draft.unwrap_or(inquiry.phase),
            hotels: inquiry.hotels.clone(),
            notes,
            created_at: format_date_time(&inquiry.created_at),
            updated_at: format_date_time(&inquiry.updated_at),
            is_saving: engine.is_saving(id),
            error: self.error.clone(),
        })
    }

    /// Request a phase change for the selected inquiry.
    pub fn change_phase(
        &mut self,
        phase: Phase,
        engine: &mut BoardEngine,
    ) -> Result<Option<PendingCommit>, EngineError> {
        let Some(id) = self.selected.clone() else {
            return Ok(None);
        };
        let commit = engine.request_phase(&id, phase)?;
        if commit.is_some() {
            self.draft = Some(phase);
            self.error = None;
        }
        Ok(commit)
    }

    /// Observe a persist result for the selected inquiry. The board engine
    /// settles the same outcome separately.
    pub fn settle(&mut self, outcome: &CommitOutcome) {
        if self.selected.as_deref() != Some(outcome.commit.id.as_str()) {
            return;
        }
        self.draft = None;
        self.error = outcome.error_message();
    }
}
