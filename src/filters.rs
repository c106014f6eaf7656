//! Filter state for the board.
//!
//! `FilterStore` separates what the user is typing (`ui_search`) from the
//! committed search used for querying. Only `commit_search` moves typed input
//! into the query, so keystrokes never reach the data source directly.

use crate::board::models::{ListFilters, ListQuery, parse_amount};

pub const MIN_VALUE_MIN: f64 = 0.0;
pub const MIN_VALUE_MAX: f64 = 200_000.0;

/// Partial update for `FilterStore::set_filters`. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch {
    pub ui_search: Option<String>,
    pub search: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub min_value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterStore {
    ui_search: String,
    search: String,
    date_from: String,
    date_to: String,
    min_value: f64,
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ui_search(&self) -> &str {
        &self.ui_search
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn date_from(&self) -> &str {
        &self.date_from
    }

    pub fn date_to(&self) -> &str {
        &self.date_to
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    /// Shallow merge; no validation beyond what the caller applied.
    pub fn set_filters(&mut self, patch: FilterPatch) {
        if let Some(v) = patch.ui_search {
            self.ui_search = v;
        }
        if let Some(v) = patch.search {
            self.search = v;
        }
        if let Some(v) = patch.date_from {
            self.date_from = v;
        }
        if let Some(v) = patch.date_to {
            self.date_to = v;
        }
        if let Some(v) = patch.min_value {
            self.min_value = v;
        }
    }

    pub fn set_ui_search(&mut self, value: impl Into<String>) {
        self.ui_search = value.into();
    }

    /// Returns true when the committed search actually changed.
    pub fn commit_search(&mut self) -> bool {
        let next = self.ui_search.trim();
        if next == self.search {
            return false;
        }
        self.search = next.to_string();
        true
    }

    pub fn clear_filters(&mut self) {
        *self = Self::default();
    }

    /// Set the lower date bound; an upper bound that is now earlier snaps forward.
    pub fn set_date_from(&mut self, value: impl Into<String>) {
        let next = value.into();
        let date_to = if !next.is_empty() && !self.date_to.is_empty() && next > self.date_to {
            next.clone()
        } else {
            self.date_to.clone()
        };
        self.set_filters(FilterPatch {
            date_from: Some(next),
            date_to: Some(date_to),
            ..Default::default()
        });
    }

    /// Set the upper date bound; a lower bound that is now later snaps back.
    pub fn set_date_to(&mut self, value: impl Into<String>) {
        let next = value.into();
        let date_from = if !next.is_empty() && !self.date_from.is_empty() && next < self.date_from
        {
            next.clone()
        } else {
            self.date_from.clone()
        };
        self.set_filters(FilterPatch {
            date_to: Some(next),
            date_from: Some(date_from),
            ..Default::default()
        });
    }

    pub fn set_min_value(&mut self, value: f64) {
        let safe = if value.is_finite() { value } else { 0.0 };
        self.min_value = safe.clamp(MIN_VALUE_MIN, MIN_VALUE_MAX);
    }

    pub fn active_filter_count(&self) -> usize {
        [
            !self.search.trim().is_empty(),
            !self.date_from.is_empty(),
            !self.date_to.is_empty(),
            self.min_value > MIN_VALUE_MIN,
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    /// The committed criteria used for querying and URL sync.
    pub fn criteria(&self) -> ListFilters {
        ListFilters {
            search: self.search.clone(),
            date_from: self.date_from.clone(),
            date_to: self.date_to.clone(),
            min_value: self.min_value,
        }
    }

    /// Restore state from a `q`/`from`/`to`/`min` query string. The typed and
    /// committed search are both set so the input box matches the query.
    pub fn hydrate(&mut self, query: &str) {
        let query = ListQuery::parse(query);
        let q = query.q.unwrap_or_default();
        self.set_filters(FilterPatch {
            search: Some(q.trim().to_string()),
            ui_search: Some(q),
            date_from: Some(query.from.unwrap_or_default()),
            date_to: Some(query.to.unwrap_or_default()),
            min_value: Some(parse_amount(query.min.as_deref())),
        });
    }
}
