use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    New,
    SentToHotels,
    OffersReceived,
    Completed,
}

impl Phase {
    /// Display order of the board columns.
    pub const ALL: [Phase; 4] = [
        Phase::New,
        Phase::SentToHotels,
        Phase::OffersReceived,
        Phase::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::SentToHotels => "sent_to_hotels",
            Self::OffersReceived => "offers_received",
            Self::Completed => "completed",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::SentToHotels => "Sent to Hotels",
            Self::OffersReceived => "Offers Received",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "sent_to_hotels" => Ok(Self::SentToHotels),
            "offers_received" => Ok(Self::OffersReceived),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Invalid phase: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: String,
    pub client_name: String,
    pub contact_person: String,
    pub event_type: String,
    /// `YYYY-MM-DD`; compared lexically.
    pub event_date: String,
    pub guest_count: u32,
    pub potential_value: f64,
    pub phase: Phase,
    #[serde(default)]
    pub hotels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Committed filter criteria sent to a data source.
///
/// Every field is optional in effect: an empty string or a zero minimum
/// imposes no constraint. Active constraints are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilters {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub date_from: String,
    #[serde(default)]
    pub date_to: String,
    #[serde(default)]
    pub min_value: f64,
}

impl ListFilters {
    pub fn matches(&self, inquiry: &Inquiry) -> bool {
        let needle = self.search.trim().to_lowercase();
        if !needle.is_empty() && !inquiry.client_name.to_lowercase().contains(&needle) {
            return false;
        }
        let from = self.date_from.trim();
        if !from.is_empty() && inquiry.event_date.as_str() < from {
            return false;
        }
        let to = self.date_to.trim();
        if !to.is_empty() && inquiry.event_date.as_str() > to {
            return false;
        }
        if self.min_value > 0.0 && inquiry.potential_value < self.min_value {
            return false;
        }
        true
    }

    /// Query pairs using the board API's parameter names (`q`, `from`, `to`,
    /// `min`), omitting inactive constraints.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.search.is_empty() {
            pairs.push(("q", self.search.clone()));
        }
        if !self.date_from.is_empty() {
            pairs.push(("from", self.date_from.clone()));
        }
        if !self.date_to.is_empty() {
            pairs.push(("to", self.date_to.clone()));
        }
        if self.min_value > 0.0 {
            pairs.push(("min", format_number(self.min_value)));
        }
        pairs
    }

    pub fn to_query_string(&self) -> String {
        serde_urlencoded::to_string(self.query_pairs()).unwrap_or_default()
    }
}

/// `q`/`from`/`to`/`min` query as sent to `GET /api/inquiries`. `min` stays a
/// string so junk input can be treated as "no minimum" instead of rejected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub min: Option<String>,
}

impl ListQuery {
    /// Decode a query string, with or without the leading `?`. Malformed
    /// input yields an empty query.
    pub fn parse(query: &str) -> Self {
        serde_urlencoded::from_str(query.trim_start_matches('?')).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "ignoring malformed query string");
            Self::default()
        })
    }

    pub fn into_filters(self) -> ListFilters {
        let trimmed = |v: Option<String>| v.map(|s| s.trim().to_string()).unwrap_or_default();
        ListFilters {
            min_value: parse_amount(self.min.as_deref()),
            search: trimmed(self.q),
            date_from: trimmed(self.from),
            date_to: trimmed(self.to),
        }
    }
}

/// Parse a numeric query value, treating missing or non-finite input as 0.
pub fn parse_amount(raw: Option<&str>) -> f64 {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// API view types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhaseUpdate {
    pub phase: String,
}

#[cfg(test)]
pub(crate) fn sample(id: &str, client: &str, value: f64, phase: Phase) -> Inquiry {
    Inquiry {
        id: id.to_string(),
        client_name: client.to_string(),
        contact_person: "Anna Keller".to_string(),
        event_type: "Conference".to_string(),
        event_date: "2026-03-14".to_string(),
        guest_count: 80,
        potential_value: value,
        phase,
        hotels: Vec::new(),
        notes: None,
        created_at: "2026-01-02T09:00:00.000Z".to_string(),
        updated_at: "2026-01-02T09:00:00.000Z".to_string(),
    }
}
