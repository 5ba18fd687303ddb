//! Quiz assembly endpoint

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::engine::{Quiz, QuizRequest, Requester};
use crate::AppState;

/// POST /api/quiz
///
/// Assemble one quiz. The optional `X-User-Id` header ties the request
/// to an account for quota purposes; without it the quiz is served
/// anonymously with no quota accounting.
pub async fn create_quiz(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<QuizRequest>,
) -> Result<Json<Quiz>, QuizError> {
    let requester = resolve_requester(&state, &headers).await?;
    let quiz = state.assembler.assemble(&request, &requester).await?;
    Ok(Json(quiz))
}

/// Turn the identity header into a [`Requester`], consulting the quota
/// ledger for the caller's allowance.
///
/// An unreachable accounts service must not block quizzes: on lookup
/// failure the request proceeds without quota accounting.
async fn resolve_requester(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Requester, QuizError> {
    let Some(raw) = headers.get("X-User-Id") else {
        return Ok(Requester::anonymous());
    };

    let user_id = raw
        .to_str()
        .ok()
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .ok_or(QuizError::BadUserId)?;

    match state.ledger.status(user_id).await {
        Ok(status) => {
            if !status.unlimited && status.remaining <= 0 {
                return Err(QuizError::QuotaExhausted);
            }
            Ok(Requester {
                user_id: Some(user_id),
                unlimited: status.unlimited,
            })
        }
        Err(e) => {
            warn!(
                user_id = %user_id,
                error = %e,
                "Quota lookup failed, serving without accounting"
            );
            Ok(Requester {
                user_id: Some(user_id),
                unlimited: true,
            })
        }
    }
}

/// Quiz endpoint errors
#[derive(Debug)]
pub enum QuizError {
    InvalidRequest(String),
    BadUserId,
    QuotaExhausted,
    Internal(String),
}

impl From<qprep_common::Error> for QuizError {
    fn from(e: qprep_common::Error) -> Self {
        match e {
            qprep_common::Error::InvalidInput(msg) => QuizError::InvalidRequest(msg),
            other => QuizError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for QuizError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            QuizError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            QuizError::BadUserId => (
                StatusCode::BAD_REQUEST,
                "X-User-Id must be a UUID".to_string(),
            ),
            QuizError::QuotaExhausted => (
                StatusCode::FORBIDDEN,
                "Question quota exhausted".to_string(),
            ),
            QuizError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
