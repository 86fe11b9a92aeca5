use std::collections::HashMap;

use ballot::{BallotError, ChoiceId, SubmissionContext};
use rand::{seq::SliceRandom, thread_rng};

use crate::utils::{assert::assert_percentages_sum, data_types::TestElection};

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_thousand_voters_random_choices() {
    let election = TestElection::demo(1000);
    let choices = election.choice_ids();

    let mut rng = thread_rng();
    let picks: Vec<_> = election
        .voter_ids()
        .into_iter()
        .map(|voter| (voter, choices.choose(&mut rng).unwrap().clone()))
        .collect();

    let mut expected: HashMap<ChoiceId, u64> = HashMap::new();
    for (_, choice) in &picks {
        *expected.entry(choice.clone()).or_insert(0) += 1;
    }

    let handles: Vec<_> = picks
        .into_iter()
        .map(|(voter, choice)| {
            let service = election.service.clone();
            tokio::spawn(async move {
                service
                    .submit_vote(&SubmissionContext::new(voter), &choice)
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let tally = election.service.tally();
    assert_eq!(tally.total_votes(), 1000);
    for (choice, entry) in tally.iter() {
        assert_eq!(entry.count, expected.get(choice).copied().unwrap_or(0));
    }
    assert_percentages_sum(&tally);
    assert_eq!(election.service.compute_tally().await.unwrap(), tally);
    assert!(election.service.audit().await.unwrap().consistent);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_same_voter_races() {
    let election = TestElection::demo(10);
    let choices = election.choice_ids();

    // 20 racing submissions per voter, exactly one wins each race
    let mut handles = Vec::new();
    for voter in election.voter_ids() {
        for attempt in 0..20 {
            let service = election.service.clone();
            let voter = voter.clone();
            let choice = choices[attempt % choices.len()].clone();
            handles.push(tokio::spawn(async move {
                service
                    .submit_vote(&SubmissionContext::new(voter), &choice)
                    .await
            }));
        }
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(BallotError::AlreadyVoted(_)) => {}
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }
    assert_eq!(accepted, 10);

    let tally = election.service.tally();
    assert_eq!(tally.total_votes(), 10);
    assert_eq!(election.service.all_votes().await.unwrap().len(), 10);
    assert_eq!(election.service.turnout().voted, 10);
}
