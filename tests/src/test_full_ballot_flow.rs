use ballot::{
    ChoiceId, InMemoryLedger, SetupError, SubmissionContext, VoteLedger, VoterId, VotingWindow,
};
use chrono::{Duration, Utc};
use cli::ElectionRoll;

use crate::utils::{
    assert::{assert_ballot_err, assert_percentages_sum},
    data_types::TestElection,
};

#[tokio::test]
async fn test_full_ballot_flow() {
    let election = TestElection::demo(3);
    let service = &election.service;
    let democratic = ChoiceId::new("democratic");
    let green = ChoiceId::new("green");

    // Fresh election lists every choice at zero
    let tally = service.tally();
    assert_eq!(tally.total_votes(), 0);
    assert_eq!(tally.iter().count(), 5);
    assert!(tally.iter().all(|(_, entry)| entry.count == 0));
    assert_percentages_sum(&tally);

    // v1 -> democratic
    let receipt = service
        .submit_vote(&SubmissionContext::new("voter-1"), &democratic)
        .await
        .unwrap();
    assert_eq!(receipt.choice_id, democratic);
    let tally = service.tally();
    assert_eq!(tally.get(&democratic).unwrap().count, 1);
    assert_eq!(tally.get(&democratic).unwrap().percentage, 100.0);

    // v1 again, with a different choice
    assert_ballot_err(
        service
            .submit_vote(&SubmissionContext::new("voter-1"), &green)
            .await,
        "AlreadyVoted",
    );
    assert_eq!(service.tally(), tally);

    // Unknown choice and unknown voter leave everything untouched
    assert_ballot_err(
        service
            .submit_vote(&SubmissionContext::new("voter-2"), &ChoiceId::new("socialist"))
            .await,
        "InvalidChoice",
    );
    assert_ballot_err(
        service
            .submit_vote(&SubmissionContext::new("stranger"), &green)
            .await,
        "Ineligible",
    );
    assert!(!service.check_eligibility(&VoterId::new("voter-2")).has_voted);

    // v2 -> green, v3 -> green
    for voter in ["voter-2", "voter-3"] {
        service
            .submit_vote(&SubmissionContext::new(voter), &green)
            .await
            .unwrap();
    }
    let tally = service.tally();
    assert_eq!(tally.total_votes(), 3);
    assert_eq!(tally.get(&green).unwrap().percentage, 66.7);
    assert_eq!(tally.get(&democratic).unwrap().percentage, 33.3);
    assert_eq!(tally.leader().map(|(id, _)| id), Some(&green));
    assert_percentages_sum(&tally);

    // Ledger and aggregator agree
    assert_eq!(service.compute_tally().await.unwrap(), tally);
    assert!(service.audit().await.unwrap().consistent);
    assert_eq!(service.turnout().voted, 3);
    assert_eq!(service.turnout().percentage, 100.0);

    let votes = service.all_votes().await.unwrap();
    assert_eq!(votes.len(), 3);
    assert_eq!(votes[0].voter_id, VoterId::new("voter-1"));
    assert_eq!(
        service
            .receipt_for(&VoterId::new("voter-1"))
            .await
            .unwrap(),
        Some(receipt)
    );
}

#[tokio::test]
async fn test_restore_from_existing_ledger() {
    let roll = ElectionRoll::demo(4);
    let ledger = InMemoryLedger::new();
    let now = Utc::now();
    ledger
        .append(&VoterId::new("voter-1"), &ChoiceId::new("green"), now)
        .await
        .unwrap();
    ledger
        .append(&VoterId::new("voter-1"), &ChoiceId::new("democratic"), now)
        .await
        .unwrap_err();
    ledger
        .append(&VoterId::new("voter-2"), &ChoiceId::new("republican"), now)
        .await
        .unwrap();

    let service = roll.build_service(ledger).unwrap();
    assert_eq!(service.restore().await.unwrap(), 2);

    // Replayed voters cannot vote again
    assert_ballot_err(
        service
            .submit_vote(&SubmissionContext::new("voter-1"), &ChoiceId::new("green"))
            .await,
        "AlreadyVoted",
    );
    let tally = service.tally();
    assert_eq!(tally.total_votes(), 2);
    assert_eq!(tally.get(&ChoiceId::new("green")).unwrap().count, 1);
    assert_eq!(tally.leader(), None);

    service
        .submit_vote(&SubmissionContext::new("voter-3"), &ChoiceId::new("green"))
        .await
        .unwrap();
    assert_eq!(
        service.tally().leader().map(|(id, _)| id.clone()),
        Some(ChoiceId::new("green"))
    );
}

#[tokio::test]
async fn test_restore_rejects_foreign_votes() {
    let roll = ElectionRoll::demo(2);
    let ledger = InMemoryLedger::new();
    ledger
        .append(&VoterId::new("voter-9"), &ChoiceId::new("green"), Utc::now())
        .await
        .unwrap();

    let service = roll.build_service(ledger).unwrap();
    assert!(matches!(
        service.restore().await,
        Err(SetupError::UnknownVoter(_))
    ));
}

#[tokio::test]
async fn test_voting_window() {
    let now = Utc::now();
    let roll = ElectionRoll::demo(2);
    let window = VotingWindow::new(Some(now), Some(now + Duration::hours(1))).unwrap();
    let service = roll
        .build_service(InMemoryLedger::new())
        .unwrap()
        .with_voting_window(window);
    let green = ChoiceId::new("green");

    assert_ballot_err(
        service
            .submit_vote(
                &SubmissionContext::at("voter-1", now - Duration::seconds(1)),
                &green,
            )
            .await,
        "VotingClosed",
    );
    assert_ballot_err(
        service
            .submit_vote(
                &SubmissionContext::at("voter-1", now + Duration::hours(1)),
                &green,
            )
            .await,
        "VotingClosed",
    );
    service
        .submit_vote(
            &SubmissionContext::at("voter-1", now + Duration::minutes(5)),
            &green,
        )
        .await
        .unwrap();
    assert_eq!(service.tally().total_votes(), 1);
}
