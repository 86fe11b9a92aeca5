//! HTTP handlers

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use ballot::{
    BallotError, Choice, SubmissionContext, Tally, TallyAudit, Vote, VoteReceipt, VoterId,
};
use cli::{MetaResponse, SubmitVoteRequest, SummaryResponse, VoterStatusResponse};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::metrics::{self, SubmissionOutcome};
use crate::middleware::ClientIp;
use crate::state::AppState;
use crate::types::VotesQuery;

pub async fn health_check() -> &'static str {
    debug!("GET /healthz - Health check requested");
    "ok"
}

pub async fn get_meta(State(app_state): State<AppState>) -> Json<MetaResponse> {
    info!("GET /meta - Metadata requested");
    Json(app_state.election.meta())
}

pub async fn get_choices(State(app_state): State<AppState>) -> Json<Vec<Choice>> {
    info!("GET /choices - Choices requested");
    Json(app_state.service.choices().iter().cloned().collect())
}

/// Handle POST /votes
pub async fn submit_vote(
    State(app_state): State<AppState>,
    client_ip: Option<Extension<ClientIp>>,
    payload: Result<Json<SubmitVoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<VoteReceipt>), ApiError> {
    let result = cast_vote(&app_state, payload).await;

    let client_ip = client_ip.map(|Extension(ClientIp(ip))| ip);
    let client_ip = client_ip.as_deref().unwrap_or("unknown");
    match &result {
        Ok(receipt) => {
            metrics::record_submission(SubmissionOutcome::Accepted);
            info!(
                "POST /votes - Vote {} accepted from {}",
                receipt.vote_id, client_ip
            );
        }
        Err(err) => {
            if let Some(outcome) = SubmissionOutcome::from_error(err) {
                metrics::record_submission(outcome);
            }
            info!("POST /votes - Rejected from {}: {}", client_ip, err.code());
        }
    }

    result.map(|receipt| (StatusCode::CREATED, Json(receipt)))
}

async fn cast_vote(
    app_state: &AppState,
    payload: Result<Json<SubmitVoteRequest>, JsonRejection>,
) -> Result<VoteReceipt, ApiError> {
    let Json(request) = payload?;
    if request.voter_id.is_empty() || request.choice_id.is_empty() {
        return Err(ApiError::MalformedPayload(
            "voterId and choiceId must not be empty".to_string(),
        ));
    }

    // Detached so a client hanging up cannot strand a written vote
    let ctx = SubmissionContext::new(request.voter_id);
    Ok(app_state
        .service
        .submit_vote_detached(ctx, request.choice_id)
        .await?)
}

/// Handle GET /votes: the ledger in order, whole or paged
pub async fn list_votes(
    State(app_state): State<AppState>,
    Query(query): Query<VotesQuery>,
) -> Result<Json<Vec<Vote>>, ApiError> {
    info!("GET /votes - Ledger requested {:?}", query);

    let votes = if query.is_paged() {
        let (offset, limit) = query.page();
        app_state
            .service
            .ledger()
            .votes_page(offset, limit)
            .await
            .map_err(BallotError::from)?
    } else {
        app_state.service.all_votes().await?
    };
    Ok(Json(votes))
}

pub async fn get_tally(State(app_state): State<AppState>) -> Json<Tally> {
    debug!("GET /votes/tally - Tally requested");
    Json(app_state.service.tally())
}

pub async fn get_summary(State(app_state): State<AppState>) -> Json<SummaryResponse> {
    info!("GET /votes/summary - Summary requested");
    let tally = app_state.service.tally();
    Json(SummaryResponse {
        total_votes: tally.total_votes(),
        turnout: app_state.service.turnout(),
        leader: tally.leader().map(|(id, _)| id.clone()),
        tally,
    })
}

pub async fn get_voter(
    State(app_state): State<AppState>,
    Path(voter_id): Path<String>,
) -> Result<Json<VoterStatusResponse>, ApiError> {
    info!("GET /voters/{} - Voter status requested", voter_id);

    let voter = VoterId::new(voter_id);
    if !app_state.service.is_registered(&voter) {
        return Err(ApiError::UnknownVoter(voter));
    }

    let eligibility = app_state.service.check_eligibility(&voter);
    Ok(Json(VoterStatusResponse {
        voter_id: voter,
        eligible: eligibility.eligible,
        has_voted: eligibility.has_voted,
    }))
}

pub async fn get_receipt(
    State(app_state): State<AppState>,
    Path(voter_id): Path<String>,
) -> Result<Json<VoteReceipt>, ApiError> {
    info!("GET /voters/{}/receipt - Receipt requested", voter_id);

    let voter = VoterId::new(voter_id);
    if !app_state.service.is_registered(&voter) {
        return Err(ApiError::UnknownVoter(voter));
    }

    match app_state.service.receipt_for(&voter).await? {
        Some(receipt) => Ok(Json(receipt)),
        None => Err(ApiError::NoVote(voter)),
    }
}

/// Handle GET /admin/stats
pub async fn admin_stats(State(app_state): State<AppState>) -> Result<Json<Value>, ApiError> {
    info!("GET /admin/stats - Stats requested");
    let ledger_votes = app_state
        .service
        .ledger()
        .vote_count()
        .await
        .map_err(BallotError::from)?;

    Ok(Json(metrics::snapshot_as_json(
        &app_state.db_location,
        app_state.service.append_retries(),
        ledger_votes,
    )))
}

/// Handle GET /admin/audit: recompute the tally from the ledger and compare
pub async fn admin_audit(
    State(app_state): State<AppState>,
) -> Result<Json<TallyAudit>, ApiError> {
    info!("GET /admin/audit - Tally audit requested");
    let audit = app_state.service.audit().await?;
    if !audit.consistent {
        warn!(
            "Incremental tally diverges from the ledger ({} votes)",
            audit.ledger_votes
        );
    }
    Ok(Json(audit))
}
