//! # Domain Models
//!
//! A `Submission` is one persisted check-in record. The full set is rebuilt
//! from the log on every load and indexed by name and address so duplicate
//! checks never rescan the records.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Field separator of the persisted line format.
pub const FIELD_DELIMITER: char = ',';

/// Timestamp layout written into the `time` field.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One accepted check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// The extracted nickname
    pub name: String,
    /// Local acceptance time, formatted with [`TIME_FORMAT`]
    pub time: String,
    /// Submitter address as observed by the HTTP layer; may be empty
    pub ip: String,
}

impl Submission {
    pub fn new(name: impl Into<String>, time: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time: time.into(),
            ip: ip.into(),
        }
    }
}

/// Ordered submissions plus the name/address index used for duplicate checks.
#[derive(Debug, Clone, Default)]
pub struct SubmissionSet {
    records: Vec<Submission>,
    names: HashSet<String>,
    ips: HashSet<String>,
}

impl SubmissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record at the end, keeping arrival order.
    pub fn push(&mut self, submission: Submission) {
        self.names.insert(submission.name.clone());
        self.ips.insert(submission.ip.clone());
        self.records.push(submission);
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn contains_ip(&self, ip: &str) -> bool {
        self.ips.contains(ip)
    }

    /// Returns the first record whose name or address collides with the
    /// candidate, name collisions taking precedence.
    pub fn find_conflict(&self, name: &str, ip: &str) -> Option<&Submission> {
        if self.contains_name(name) {
            return self.records.iter().find(|s| s.name == name);
        }
        if self.contains_ip(ip) {
            return self.records.iter().find(|s| s.ip == ip);
        }
        None
    }

    pub fn records(&self) -> &[Submission] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Submission> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<Submission> for SubmissionSet {
    fn from_iter<I: IntoIterator<Item = Submission>>(iter: I) -> Self {
        let mut set = SubmissionSet::new();
        for submission in iter {
            set.push(submission);
        }
        set
    }
}

/// Why a submission produced no nickname.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionFailure {
    /// The OCR provider returned no text at all
    NoText,
    /// Text was recognized but no line qualified as a nickname
    NoNickname,
    /// The OCR provider call failed
    ProviderError,
    /// The OCR provider did not answer within the configured timeout
    Timeout,
}

/// Result of a single submit request. None of these are faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    ExtractionFailed(ExtractionFailure),
    /// The nickname or address is already on the list
    Duplicate {
        nickname: String,
        existing: Submission,
    },
    Accepted(Submission),
}

impl SubmitOutcome {
    /// Metric/log label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            SubmitOutcome::ExtractionFailed(_) => "extraction_failed",
            SubmitOutcome::Duplicate { .. } => "duplicate",
            SubmitOutcome::Accepted(_) => "accepted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_prefers_name_match() {
        let set: SubmissionSet = vec![
            Submission::new("alice1", "2024-01-01 10:00:00", "9.9.9.9"),
            Submission::new("bob2", "2024-01-01 10:01:00", "1.2.3.4"),
        ]
        .into_iter()
        .collect();

        let hit = set.find_conflict("alice1", "1.2.3.4").unwrap();
        assert_eq!(hit.name, "alice1");

        let hit = set.find_conflict("carol", "1.2.3.4").unwrap();
        assert_eq!(hit.name, "bob2");

        assert!(set.find_conflict("carol", "5.5.5.5").is_none());
    }

    #[test]
    fn name_match_is_case_sensitive() {
        let set: SubmissionSet = std::iter::once(Submission::new("Alice", "t", "1.1.1.1")).collect();
        assert!(set.contains_name("Alice"));
        assert!(!set.contains_name("alice"));
    }

    #[test]
    fn push_keeps_arrival_order() {
        let mut set = SubmissionSet::new();
        set.push(Submission::new("b", "t", "1"));
        set.push(Submission::new("a", "t", "2"));
        let names: Vec<_> = set.records().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn submission_serializes_with_dashboard_field_names() {
        let json = serde_json::to_value(Submission::new("bob2", "2024-01-01 10:00:00", "")).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "bob2", "time": "2024-01-01 10:00:00", "ip": "" }));
    }
}
