use ballot::{BallotError, Tally, VoteReceipt};

pub fn assert_ballot_err(res: Result<VoteReceipt, BallotError>, code: &str) {
    assert_eq!(res.unwrap_err().code(), code)
}

/// Percentages of a non-empty tally add up to roughly 100.
pub fn assert_percentages_sum(tally: &Tally) {
    if tally.total_votes() == 0 {
        assert_eq!(tally.percentage_sum(), 0.0);
    } else {
        let sum = tally.percentage_sum();
        assert!((sum - 100.0).abs() <= 0.5, "percentages sum to {}", sum);
    }
}
