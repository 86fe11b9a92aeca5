//! HTTP front of the ballot ledger: vote submission, tallies and an admin
//! surface, backed by an append-only SQLite ledger.

pub mod auth_middleware;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod state;
pub mod types;
pub mod utils;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    middleware::from_fn,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use auth_middleware::admin_auth_middleware;
use handlers::*;
use middleware::inject_client_ip;
use state::AppState;

pub fn cors_layer(allow_origin: Option<&str>) -> Result<CorsLayer> {
    let origin = match allow_origin {
        Some(origin) => AllowOrigin::exact(HeaderValue::from_str(origin)?),
        None => AllowOrigin::from(Any),
    };
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any))
}

pub fn build_router(app_state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/meta", get(get_meta))
        .route("/choices", get(get_choices))
        .route("/votes", post(submit_vote).get(list_votes))
        .route("/votes/tally", get(get_tally))
        .route("/votes/summary", get(get_summary))
        .route("/voters/{voter_id}", get(get_voter))
        .route("/voters/{voter_id}/receipt", get(get_receipt))
        .route("/admin/stats", get(admin_stats))
        .route("/admin/audit", get(admin_audit))
        .layer(from_fn_with_state(app_state.clone(), admin_auth_middleware))
        .layer(from_fn(inject_client_ip))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::database::DbLocation;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use ballot::{RetryPolicy, Tally, VoteReceipt};
    use cli::{ElectionRoll, ErrorBody, SummaryResponse, VoterStatusResponse};
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tower::ServiceExt;

    const TOKEN: &str = "test-token";

    fn test_config() -> Config {
        Config {
            port: 0,
            db_location: DbLocation::Memory,
            db_max_connections: 1,
            election_path: PathBuf::from("unused.json"),
            metrics_token: Some(TOKEN.to_string()),
            retry: RetryPolicy::default(),
            cors_allow_origin: None,
        }
    }

    async fn app_with(roll: ElectionRoll) -> Router {
        let state = AppState::initialize(&test_config(), roll).await.unwrap();
        build_router(state, cors_layer(None).unwrap())
    }

    async fn app() -> Router {
        let mut roll = ElectionRoll::demo(3);
        roll.voters.push(ballot::Voter::ineligible("minor"));
        app_with(roll).await
    }

    async fn send(app: &Router, req: Request<Body>) -> Response {
        app.clone().oneshot(req).await.unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn vote_req(voter: &str, choice: &str) -> Request<Body> {
        Request::post("/votes")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({"voterId": voter, "choiceId": choice}).to_string(),
            ))
            .unwrap()
    }

    async fn body<T: DeserializeOwned>(resp: Response) -> T {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn error_code(resp: Response) -> String {
        body::<ErrorBody>(resp).await.error
    }

    #[tokio::test]
    async fn test_healthz() {
        let app = app().await;
        let resp = send(&app, get_req("/healthz")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn test_vote_flow() {
        let app = app().await;

        // v1 -> democratic
        let resp = send(&app, vote_req("voter-1", "democratic")).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let receipt: VoteReceipt = body(resp).await;
        assert_eq!(receipt.choice_id.as_str(), "democratic");

        let tally: Value = body(send(&app, get_req("/votes/tally")).await).await;
        assert_eq!(tally["democratic"], json!({"count": 1, "percentage": 100.0}));
        assert_eq!(tally["green"], json!({"count": 0, "percentage": 0.0}));

        // v1 again, different choice
        let resp = send(&app, vote_req("voter-1", "republican")).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(error_code(resp).await, "AlreadyVoted");

        // Unregistered choice
        let resp = send(&app, vote_req("voter-2", "socialist")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_code(resp).await, "InvalidChoice");

        // Not on the roll, and on the roll but ineligible
        for voter in ["stranger", "minor"] {
            let resp = send(&app, vote_req(voter, "democratic")).await;
            assert_eq!(resp.status(), StatusCode::FORBIDDEN);
            assert_eq!(error_code(resp).await, "Ineligible");
        }

        // Tally is unchanged by the rejections and stable between reads
        let first: Tally = body(send(&app, get_req("/votes/tally")).await).await;
        let second: Tally = body(send(&app, get_req("/votes/tally")).await).await;
        assert_eq!(first, second);
        assert_eq!(first.total_votes(), 1);
    }

    #[tokio::test]
    async fn test_malformed_payloads() {
        let app = app().await;

        let bad_json = Request::post("/votes")
            .header("content-type", "application/json")
            .body(Body::from("{\"voterId\": "))
            .unwrap();
        let resp = send(&app, bad_json).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(resp).await, "MalformedPayload");

        let snake_case = Request::post("/votes")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({"voter_id": "voter-1", "choice_id": "green"}).to_string(),
            ))
            .unwrap();
        let resp = send(&app, snake_case).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = send(&app, vote_req(" ", "green")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(resp).await, "MalformedPayload");
    }

    #[tokio::test]
    async fn test_voting_window_closed() {
        let mut roll = ElectionRoll::demo(1);
        let now = chrono::Utc::now();
        roll.opens_at = Some(now - chrono::Duration::days(2));
        roll.closes_at = Some(now - chrono::Duration::days(1));
        let app = app_with(roll).await;

        let resp = send(&app, vote_req("voter-1", "green")).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(error_code(resp).await, "VotingClosed");
    }

    #[tokio::test]
    async fn test_voter_status_and_receipt() {
        let app = app().await;

        let resp = send(&app, get_req("/voters/voter-2/receipt")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_code(resp).await, "NoVote");

        let resp = send(&app, vote_req("voter-2", "green")).await;
        let receipt: VoteReceipt = body(resp).await;

        let status: VoterStatusResponse = body(send(&app, get_req("/voters/voter-2")).await).await;
        assert!(status.eligible);
        assert!(status.has_voted);

        let stored: VoteReceipt = body(send(&app, get_req("/voters/voter-2/receipt")).await).await;
        assert_eq!(stored, receipt);

        let resp = send(&app, get_req("/voters/nobody")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_code(resp).await, "UnknownVoter");
    }

    #[tokio::test]
    async fn test_ledger_listing_and_summary() {
        let app = app().await;
        for (voter, choice) in [
            ("voter-1", "green"),
            ("voter-2", "green"),
            ("voter-3", "independent"),
        ] {
            assert_eq!(
                send(&app, vote_req(voter, choice)).await.status(),
                StatusCode::CREATED
            );
        }

        let votes: Vec<ballot::Vote> = body(send(&app, get_req("/votes")).await).await;
        assert_eq!(votes.len(), 3);
        let page: Vec<ballot::Vote> =
            body(send(&app, get_req("/votes?offset=1&limit=1")).await).await;
        assert_eq!(page, votes[1..2].to_vec());

        let summary: SummaryResponse = body(send(&app, get_req("/votes/summary")).await).await;
        assert_eq!(summary.total_votes, 3);
        assert_eq!(summary.leader.unwrap().as_str(), "green");
        assert_eq!(summary.turnout.voted, 3);
        // "minor" is on the roll but not eligible
        assert_eq!(summary.turnout.eligible_voters, 3);
        assert_eq!(summary.turnout.percentage, 100.0);
    }

    #[tokio::test]
    async fn test_choices_and_meta() {
        let app = app().await;
        let choices: Vec<ballot::Choice> = body(send(&app, get_req("/choices")).await).await;
        assert_eq!(choices.len(), 5);
        assert_eq!(choices[0].color.as_deref(), Some("blue"));

        let meta: cli::MetaResponse = body(send(&app, get_req("/meta")).await).await;
        assert_eq!(meta.choices, 5);
        assert_eq!(meta.voters, 4);
        assert_eq!(meta.build.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_admin_requires_token() {
        let app = app().await;

        let resp = send(&app, get_req("/admin/stats")).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(resp).await, "Unauthorized");

        let wrong = Request::get("/admin/audit")
            .header("x-metrics-token", "nope")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, wrong).await.status(), StatusCode::UNAUTHORIZED);

        send(&app, vote_req("voter-1", "democratic")).await;

        let stats = Request::get("/admin/stats")
            .header("x-metrics-token", TOKEN)
            .body(Body::empty())
            .unwrap();
        let resp = send(&app, stats).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let stats: Value = body(resp).await;
        assert_eq!(stats["ledger_votes"], 1);
        assert_eq!(stats["storage"]["db_path"], ":memory:");

        let audit = Request::get("/admin/audit")
            .header("x-metrics-token", TOKEN)
            .body(Body::empty())
            .unwrap();
        let audit: Value = body(send(&app, audit).await).await;
        assert_eq!(audit["consistent"], true);
        assert_eq!(audit["ledgerVotes"], 1);
    }

    #[tokio::test]
    async fn test_admin_disabled_without_token() {
        let config = Config {
            metrics_token: None,
            ..test_config()
        };
        let state = AppState::initialize(&config, ElectionRoll::demo(1))
            .await
            .unwrap();
        let app = build_router(state, cors_layer(None).unwrap());

        let req = Request::get("/admin/stats")
            .header("x-metrics-token", TOKEN)
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_double_submission_over_http() {
        let app = app().await;

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let app = app.clone();
                let choice = if i % 2 == 0 { "green" } else { "republican" };
                tokio::spawn(async move {
                    app.oneshot(vote_req("voter-3", choice))
                        .await
                        .unwrap()
                        .status()
                })
            })
            .collect();

        let mut statuses = Vec::new();
        for handle in handles {
            statuses.push(handle.await.unwrap());
        }
        assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CREATED).count(), 1);
        assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(), 9);
    }

    #[tokio::test]
    async fn test_restart_restores_registry_from_ledger() {
        let path = std::env::temp_dir().join(format!(
            "ballot_restart_{}.db",
            rand::random::<u32>()
        ));
        let config = Config {
            db_location: DbLocation::File(path.clone()),
            db_max_connections: 2,
            ..test_config()
        };

        let state = AppState::initialize(&config, ElectionRoll::demo(2)).await.unwrap();
        let app = build_router(state.clone(), cors_layer(None).unwrap());
        assert_eq!(
            send(&app, vote_req("voter-1", "libertarian")).await.status(),
            StatusCode::CREATED
        );
        state.service.ledger().pool().close().await;
        drop(app);

        let state = AppState::initialize(&config, ElectionRoll::demo(2)).await.unwrap();
        let service = Arc::clone(&state.service);
        let app = build_router(state, cors_layer(None).unwrap());

        let resp = send(&app, vote_req("voter-1", "green")).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let tally: Tally = body(send(&app, get_req("/votes/tally")).await).await;
        assert_eq!(tally.total_votes(), 1);
        assert!(service.audit().await.unwrap().consistent);

        service.ledger().pool().close().await;
        for suffix in ["", "-wal", "-shm"] {
            std::fs::remove_file(format!("{}{}", path.display(), suffix)).ok();
        }
    }
}
