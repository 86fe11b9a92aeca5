use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use ballot::{BallotError, VoterId};
use cli::ErrorBody;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Ballot(#[from] BallotError),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Voter {0} is not on the roll")]
    UnknownVoter(VoterId),

    #[error("Voter {0} has not voted")]
    NoVote(VoterId),

    #[error("Missing or invalid admin token")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Ballot(err) => err.code(),
            ApiError::MalformedPayload(_) => "MalformedPayload",
            ApiError::UnknownVoter(_) => "UnknownVoter",
            ApiError::NoVote(_) => "NoVote",
            ApiError::Unauthorized => "Unauthorized",
            ApiError::Internal(_) => "InternalError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Ballot(err) => match err {
                BallotError::AlreadyVoted(_) => StatusCode::CONFLICT,
                BallotError::InvalidChoice(_) => StatusCode::NOT_FOUND,
                BallotError::Ineligible(_) | BallotError::VotingClosed => StatusCode::FORBIDDEN,
                BallotError::StorageFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::UnknownVoter(_) | ApiError::NoVote(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedPayload(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Request failed: {}", self);
        }

        // Storage details stay in the logs
        let message = match &self {
            ApiError::Ballot(BallotError::StorageFailure(_)) => {
                "The ledger is temporarily unavailable".to_string()
            }
            ApiError::Internal(_) => "Internal error".to_string(),
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: self.code().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
