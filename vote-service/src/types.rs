//! Types for HTTP requests

use serde::Deserialize;

pub const MAX_VOTES_PAGE: u64 = 1000;

/// Paging of `GET /votes`. Without `limit` the whole ledger is returned.
#[derive(Debug, Default, Deserialize)]
pub struct VotesQuery {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl VotesQuery {
    pub fn is_paged(&self) -> bool {
        self.offset.is_some() || self.limit.is_some()
    }

    pub fn page(&self) -> (u64, u64) {
        let limit = self.limit.unwrap_or(MAX_VOTES_PAGE).min(MAX_VOTES_PAGE);
        (self.offset.unwrap_or(0), limit)
    }
}
