use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;

use super::models::{Inquiry, ListFilters, Phase, PhaseUpdate};
use crate::errors::SourceError;

/// Latency the in-memory store simulates on every call by default.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(500);

const SEED_JSON: &str = include_str!("../../data/inquiries.json");

/// Remote store of inquiries consumed by the fetch controller and board engine.
/// Real implementation: `HttpSource`. Local/mock: `InMemorySource`.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn list(&self, filters: &ListFilters) -> Result<Vec<Inquiry>, SourceError>;

    async fn update_phase(&self, id: &str, phase: Phase) -> Result<Inquiry, SourceError>;
}

pub type SharedSource = Arc<dyn DataSource>;

/// Current time in the `toISOString` shape used for `createdAt`/`updatedAt`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse the bundled seed data set.
pub fn seed_inquiries() -> Result<Vec<Inquiry>, SourceError> {
    parse_inquiries(SEED_JSON)
}

pub fn parse_inquiries(json: &str) -> Result<Vec<Inquiry>, SourceError> {
    serde_json::from_str(json).map_err(|e| SourceError::Decode(e.to_string()))
}

// ── In-memory store ───────────────────────────────────────────────────

/// Constructible stand-in for a backend. Each instance owns its own records;
/// the simulated latency is applied before every operation.
pub struct InMemorySource {
    inquiries: Mutex<Vec<Inquiry>>,
    latency: Duration,
}

impl InMemorySource {
    pub fn new(inquiries: Vec<Inquiry>, latency: Duration) -> Self {
        Self {
            inquiries: Mutex::new(inquiries),
            latency,
        }
    }

    /// Store seeded with the bundled inquiries.
    pub fn seeded(latency: Duration) -> Result<Self, SourceError> {
        Ok(Self::new(seed_inquiries()?, latency))
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Inquiry>> {
        // A panic while holding the lock leaves the records intact; keep serving them.
        self.inquiries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look up a single record without the simulated latency.
    pub fn get(&self, id: &str) -> Option<Inquiry> {
        self.lock().iter().find(|x| x.id == id).cloned()
    }
}

#[async_trait]
impl DataSource for InMemorySource {
    async fn list(&self, filters: &ListFilters) -> Result<Vec<Inquiry>, SourceError> {
        self.delay().await;
        let inquiries = self.lock();
        Ok(inquiries
            .iter()
            .filter(|x| filters.matches(x))
            .cloned()
            .collect())
    }

    async fn update_phase(&self, id: &str, phase: Phase) -> Result<Inquiry, SourceError> {
        self.delay().await;
        let mut inquiries = self.lock();
        let inquiry = inquiries
            .iter_mut()
            .find(|x| x.id == id)
            .ok_or_else(|| SourceError::NotFound { id: id.to_string() })?;
        inquiry.phase = phase;
        inquiry.updated_at = now_timestamp();
        tracing::debug!(id, phase = %phase, "inquiry phase updated");
        Ok(inquiry.clone())
    }
}

// ── HTTP client ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Data source backed by the board HTTP API (`/api/inquiries`).
#[derive(Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `base_url` extended by `segments`, each escaped as a single path
    /// segment.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, SourceError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| SourceError::Transport(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| SourceError::Transport(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn error_from(response: reqwest::Response, fallback: &str) -> SourceError {
        let status = response.status().as_u16();
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string());
        SourceError::Http { status, message }
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn list(&self, filters: &ListFilters) -> Result<Vec<Inquiry>, SourceError> {
        let response = self
            .client
            .get(self.endpoint(&["api", "inquiries"])?)
            .query(&filters.query_pairs())
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "Failed to load inquiries").await);
        }

        response
            .json::<Vec<Inquiry>>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }

    async fn update_phase(&self, id: &str, phase: Phase) -> Result<Inquiry, SourceError> {
        let response = self
            .client
            .patch(self.endpoint(&["api", "inquiries", id])?)
            .json(&PhaseUpdate {
                phase: phase.as_str().to_string(),
            })
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "Failed to update phase").await);
        }

        response
            .json::<Inquiry>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }
}

// ── Test double ───────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::models::sample;

    fn store() -> InMemorySource {
        InMemorySource::new(
            vec![
                sample("inq-1", "Acme Corp", 15000.0, Phase::New),
                sample("inq-2", "Acme Corp", 5000.0, Phase::New),
                sample("inq-3", "Globex AG", 80000.0, Phase::Completed),
            ],
            Duration::ZERO,
        )
    }

    #[test]
    fn test_seed_data_parses_with_unique_ids() {
        let seed = seed_inquiries().unwrap();
        assert!(!seed.is_empty());
        let mut ids: Vec<_> = seed.iter().map(|x| x.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), seed.len());
    }

    #[tokio::test]
    async fn test_list_applies_filters() {
        let source = store();
        let filters = ListFilters {
            search: "ACME".to_string(),
            min_value: 10000.0,
            ..Default::default()
        };
        let items = source.list(&filters).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "inq-1");
    }

    #[tokio::test]
    async fn test_list_satisfies_every_active_filter_on_seed_data() {
        let source = InMemorySource::seeded(Duration::ZERO).unwrap();
        let combos = [
            ListFilters::default(),
            ListFilters {
                search: "a".into(),
                ..Default::default()
            },
            ListFilters {
                date_from: "2026-03-01".into(),
                date_to: "2026-06-30".into(),
                ..Default::default()
            },
            ListFilters {
                search: "e".into(),
                date_from: "2026-02-01".into(),
                min_value: 20000.0,
                ..Default::default()
            },
        ];
        for filters in combos {
            for item in source.list(&filters).await.unwrap() {
                if !filters.search.is_empty() {
                    assert!(item.client_name.to_lowercase().contains(&filters.search.to_lowercase()));
                }
                if !filters.date_from.is_empty() {
                    assert!(item.event_date >= filters.date_from);
                }
                if !filters.date_to.is_empty() {
                    assert!(item.event_date <= filters.date_to);
                }
                assert!(item.potential_value >= filters.min_value);
            }
        }
    }

    #[tokio::test]
    async fn test_update_phase_refreshes_updated_at() {
        let source = store();
        let before = source.get("inq-1").unwrap();
        let updated = source.update_phase("inq-1", Phase::Completed).await.unwrap();
        assert_eq!(updated.phase, Phase::Completed);
        assert_ne!(updated.updated_at, before.updated_at);
        assert_eq!(source.get("inq-1").unwrap().phase, Phase::Completed);
    }

    #[tokio::test]
    async fn test_update_phase_unknown_id() {
        let source = store();
        let err = source.update_phase("missing", Phase::New).await.unwrap_err();
        assert_eq!(err, SourceError::NotFound { id: "missing".into() });
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_simulated() {
        let source = InMemorySource::new(Vec::new(), Duration::from_millis(500));
        let start = tokio::time::Instant::now();
        source.list(&ListFilters::default()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[test]
    fn test_http_source_trims_trailing_slash() {
        let source = HttpSource::new("http://localhost:3141/");
        assert_eq!(source.base_url(), "http://localhost:3141");
    }

    #[test]
    fn test_endpoint_escapes_each_segment() {
        let source = HttpSource::new("http://localhost:3141/");
        let url = source.endpoint(&["api", "inquiries", "a/b?c#d e%"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3141/api/inquiries/a%2Fb%3Fc%23d%20e%25"
        );

        let nested = HttpSource::new("http://localhost:3141/board/");
        let url = nested.endpoint(&["api", "inquiries"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3141/board/api/inquiries");

        assert!(matches!(
            HttpSource::new("not a url").endpoint(&["api"]),
            Err(SourceError::Transport(_))
        ));
    }
}
