use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use ballot::BallotError;
use once_cell::sync::OnceCell;
use serde_json::json;

use crate::database::DbLocation;
use crate::error::ApiError;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum SubmissionOutcome {
    Accepted,
    AlreadyVoted,
    InvalidChoice,
    Ineligible,
    VotingClosed,
    StorageFailure,
    MalformedPayload,
}

impl SubmissionOutcome {
    pub fn from_error(err: &ApiError) -> Option<Self> {
        match err {
            ApiError::Ballot(err) => Some(match err {
                BallotError::AlreadyVoted(_) => Self::AlreadyVoted,
                BallotError::InvalidChoice(_) => Self::InvalidChoice,
                BallotError::Ineligible(_) => Self::Ineligible,
                BallotError::VotingClosed => Self::VotingClosed,
                BallotError::StorageFailure(_) => Self::StorageFailure,
            }),
            ApiError::MalformedPayload(_) => Some(Self::MalformedPayload),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::AlreadyVoted => "already_voted",
            Self::InvalidChoice => "invalid_choice",
            Self::Ineligible => "ineligible",
            Self::VotingClosed => "voting_closed",
            Self::StorageFailure => "storage_failure",
            Self::MalformedPayload => "malformed_payload",
        }
    }
}

#[derive(Default)]
pub struct Metrics {
    submissions_total: HashMap<SubmissionOutcome, u64>,
    admin_unauthorized_total: u64,
}

static METRICS: OnceCell<Mutex<Metrics>> = OnceCell::new();

fn get() -> MutexGuard<'static, Metrics> {
    METRICS
        .get_or_init(|| Mutex::new(Metrics::default()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

pub fn record_submission(outcome: SubmissionOutcome) {
    *get().submissions_total.entry(outcome).or_insert(0) += 1;
}

pub fn record_admin_unauthorized() {
    get().admin_unauthorized_total += 1;
}

pub fn submission_count(outcome: SubmissionOutcome) -> u64 {
    get().submissions_total.get(&outcome).copied().unwrap_or(0)
}

/// Counters plus storage info. `append_retries` and `ledger_votes` come from
/// the running service.
pub fn snapshot_as_json(
    db_location: &DbLocation,
    append_retries: u64,
    ledger_votes: u64,
) -> serde_json::Value {
    let m = get();

    let mut outcomes: Vec<_> = m.submissions_total.iter().collect();
    outcomes.sort();
    let submissions: Vec<serde_json::Value> = outcomes
        .into_iter()
        .map(|(outcome, count)| json!({ "outcome": outcome.as_str(), "count": count }))
        .collect();

    let db_bytes = db_location.file_path().and_then(file_size);
    let db_mb = db_bytes.map(|b| round2(bytes_to_mb(b)));
    let fs_free_mb = db_location
        .file_path()
        .and_then(filesystem_free_mb_from_db_path);

    json!({
        "submissions_total": submissions,
        "admin_unauthorized_total": m.admin_unauthorized_total,
        "append_retries_total": append_retries,
        "ledger_votes": ledger_votes,
        "storage": {
            "db_path": db_location.to_string(),
            "db_size_mb": db_mb,
            "free_storage_mb": fs_free_mb,
        }
    })
}

fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path)
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}

fn bytes_to_mb(bytes: u64) -> f64 {
    let mb = 1024.0 * 1024.0;
    (bytes as f64) / mb
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn filesystem_free_mb_from_db_path(db_path: &Path) -> Option<f64> {
    use sysinfo::Disks;
    let disks = Disks::new_with_refreshed_list();
    let path = db_path.canonicalize().ok()?;
    disks
        .iter()
        .filter(|d| path.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len())
        .map(|d| round2(bytes_to_mb(d.available_space())))
}
