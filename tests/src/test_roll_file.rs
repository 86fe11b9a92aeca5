use ballot::{ChoiceId, InMemoryLedger, SubmissionContext, VoterId};
use cli::ElectionRoll;
use rand::{distributions::Alphanumeric, Rng};
use serde_json::json;

use crate::utils::assert::assert_ballot_err;

fn temp_path(ext: &str) -> std::path::PathBuf {
    let name: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();
    std::env::temp_dir().join(format!("roll_{}.{}", name, ext))
}

#[tokio::test]
async fn test_compressed_roll_drives_service() {
    let path = temp_path("json.gz");
    ElectionRoll::demo(25).save(&path).unwrap();

    let roll = ElectionRoll::read(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(roll.eligible_voters(), 25);

    let service = roll.build_service(InMemoryLedger::new()).unwrap();
    service
        .submit_vote(&SubmissionContext::new("voter-25"), &ChoiceId::new("independent"))
        .await
        .unwrap();
    assert_eq!(service.turnout().eligible_voters, 25);
    assert_eq!(service.turnout().percentage, 4.0);
}

#[tokio::test]
async fn test_ineligible_roll_entry() {
    let roll: ElectionRoll = serde_json::from_value(json!({
        "name": "Board Election",
        "choices": [
            {"id": "yes", "name": "Yes"},
            {"id": "no", "name": "No"}
        ],
        "voters": [
            {"id": "alice"},
            {"id": "bob", "eligible": false}
        ]
    }))
    .unwrap();
    roll.validate().unwrap();
    assert_eq!(roll.eligible_voters(), 1);

    let service = roll.build_service(InMemoryLedger::new()).unwrap();
    let bob = VoterId::new("bob");
    assert!(service.is_registered(&bob));
    assert!(!service.check_eligibility(&bob).eligible);
    assert_ballot_err(
        service
            .submit_vote(&SubmissionContext::new("bob"), &ChoiceId::new("yes"))
            .await,
        "Ineligible",
    );
    service
        .submit_vote(&SubmissionContext::new("alice"), &ChoiceId::new("no"))
        .await
        .unwrap();
    assert_eq!(service.turnout().eligible_voters, 1);
    assert_eq!(service.turnout().percentage, 100.0);
}

#[test]
fn test_invalid_rolls_are_rejected() {
    let duplicate_voter = json!({
        "name": "Dup",
        "choices": [{"id": "yes", "name": "Yes"}],
        "voters": [{"id": "alice"}, {"id": "alice"}]
    });
    assert!(ElectionRoll::read_from_bytes(duplicate_voter.to_string().as_bytes()).is_err());

    let no_choices = json!({"name": "Empty", "choices": [], "voters": []});
    assert!(ElectionRoll::read_from_bytes(no_choices.to_string().as_bytes()).is_err());
}
