use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SetupError;

/// Period during which submissions are accepted. Open-ended on a missing bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingWindow {
    pub opens_at: Option<DateTime<Utc>>,
    pub closes_at: Option<DateTime<Utc>>,
}

impl VotingWindow {
    /// Bounds are kept to microseconds, the precision submission times carry.
    pub fn new(
        opens_at: Option<DateTime<Utc>>,
        closes_at: Option<DateTime<Utc>>,
    ) -> Result<Self, SetupError> {
        let opens_at = opens_at.map(|t| t.trunc_subsecs(6));
        let closes_at = closes_at.map(|t| t.trunc_subsecs(6));
        if let (Some(open), Some(close)) = (opens_at, closes_at) {
            if close <= open {
                return Err(SetupError::InvalidWindow);
            }
        }
        Ok(Self {
            opens_at,
            closes_at,
        })
    }

    /// Always open.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_open(&self, at: DateTime<Utc>) -> bool {
        let opened = self.opens_at.map_or(true, |open| at >= open);
        let not_closed = self.closes_at.map_or(true, |close| at < close);
        opened && not_closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_window_bounds() {
        let now = Utc::now();
        let window = VotingWindow::new(Some(now), Some(now + Duration::hours(1))).unwrap();

        assert!(!window.is_open(now - Duration::seconds(1)));
        assert!(window.is_open(now));
        assert!(window.is_open(now + Duration::minutes(59)));
        // Close bound is exclusive
        assert!(!window.is_open(now + Duration::hours(1)));
    }

    #[test]
    fn test_window_close_at_submission_precision() {
        let open = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let close = DateTime::from_timestamp(1_700_003_600, 123_456_789).unwrap();
        let window = VotingWindow::new(Some(open), Some(close)).unwrap();

        // A request stamped at the close instant is truncated before the check
        assert!(!window.is_open(close.trunc_subsecs(6)));
        assert!(!window.is_open(close));
        assert!(window.is_open(close.trunc_subsecs(6) - Duration::microseconds(1)));
    }

    #[test]
    fn test_window_unbounded() {
        assert!(VotingWindow::unbounded().is_open(Utc::now()));
    }

    #[test]
    fn test_window_rejects_inverted_bounds() {
        let now = Utc::now();
        assert_eq!(
            VotingWindow::new(Some(now), Some(now)),
            Err(SetupError::InvalidWindow)
        );
    }
}
