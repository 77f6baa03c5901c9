use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;
use time::UtcDateTime;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Health {
    /// Not refreshed yet.
    #[default]
    Unknown,
    Up,
    Down,
}
impl Display for Health {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.pad(match self {
            Health::Unknown => "unknown",
            Health::Up => "up",
            Health::Down => "down",
        })
    }
}

/// What the last refreshes said about one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderStatus {
    pub provider: String,
    pub health: Health,
    pub last_success: Option<UtcDateTime>,
    pub last_error: Option<String>,
    /// Entries currently served from this provider's slice, which may be left
    /// over from an earlier refresh.
    pub entries: usize,
}
impl ProviderStatus {
    pub(crate) fn unknown(provider: impl Into<String>) -> Self {
        Self { provider: provider.into(), health: Health::Unknown, last_success: None, last_error: None, entries: 0 }
    }

    pub(crate) fn succeeded(&self, at: UtcDateTime, entries: usize) -> Self {
        Self { provider: self.provider.clone(), health: Health::Up, last_success: Some(at), last_error: None, entries }
    }

    pub(crate) fn failed(&self, error: String) -> Self {
        Self { health: Health::Down, last_error: Some(error), ..self.clone() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Refreshed { entries: usize },
    /// The provider failed; its previous slice was kept.
    Failed { error: String, retained: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderOutcome {
    pub provider: String,
    pub outcome: Outcome,
}

/// Summary of one call to `refresh()`.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshReport {
    /// The generation published by this refresh, or the one still current if
    /// the refresh was skipped.
    pub generation: u64,
    /// Another refresh of the same aggregator was already running.
    pub skipped: bool,
    pub outcomes: Vec<ProviderOutcome>,
    /// Distinct identities in the published generation.
    pub entries: usize,
    pub elapsed: Duration,
}
impl RefreshReport {
    pub(crate) fn skipped(generation: u64) -> Self {
        Self { generation, skipped: true, outcomes: Vec::new(), entries: 0, elapsed: Duration::ZERO }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProviderOutcome> {
        self.outcomes.iter().filter(|outcome| matches!(outcome.outcome, Outcome::Failed { .. }))
    }

    /// Every provider failed (and there was at least one to fail).
    pub fn is_total_failure(&self) -> bool {
        !self.outcomes.is_empty() && self.failures().count() == self.outcomes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(provider: &str, outcome: Outcome) -> ProviderOutcome {
        ProviderOutcome { provider: provider.to_string(), outcome }
    }

    #[test]
    fn test_status_transitions() {
        let status = ProviderStatus::unknown("gaze");
        assert_eq!(status.health, Health::Unknown);

        let now = UtcDateTime::now();
        let up = status.succeeded(now, 12);
        assert_eq!(up.health, Health::Up);
        assert_eq!(up.entries, 12);

        let down = up.failed("source unavailable: gaze".to_string());
        assert_eq!(down.health, Health::Down);
        assert_eq!(down.last_success, Some(now));
        assert_eq!(down.entries, 12);
        assert_eq!(down.last_error.as_deref(), Some("source unavailable: gaze"));

        assert_eq!(down.succeeded(now, 3).last_error, None);
    }

    #[test]
    fn test_report_failures() {
        let mut report = RefreshReport::skipped(1);
        assert!(!report.is_total_failure());
        report.outcomes = vec![
            outcome("a", Outcome::Refreshed { entries: 1 }),
            outcome("b", Outcome::Failed { error: "down".to_string(), retained: 0 }),
        ];
        assert_eq!(report.failures().count(), 1);
        assert!(!report.is_total_failure());
        report.outcomes.remove(0);
        assert!(report.is_total_failure());
    }
}
