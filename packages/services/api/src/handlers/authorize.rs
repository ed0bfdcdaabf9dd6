//! 인가 엔드포인트
//!
//! 대시보드가 버튼/메뉴 노출 여부를 묻는 경로입니다.
//! 거부는 에러가 아니라 `allowed: false` 응답입니다.

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};

use akt_core::permissions::{AuthorizationCheck, AuthorizationOutcome, DecisionReason};

use crate::error::Result;
use crate::handlers::current_subject;
use crate::state::AppState;

/// 배치 요청 본문
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub checks: Vec<AuthorizationCheck>,
}

/// 배치 응답 본문
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: Vec<OutcomeBody>,
}

/// 검사 결과 JSON
#[derive(Debug, Serialize)]
pub struct OutcomeBody {
    pub allowed: bool,
    pub reason: Option<DecisionReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OutcomeError>,
}

#[derive(Debug, Serialize)]
pub struct OutcomeError {
    pub code: String,
    pub message: String,
}

impl From<AuthorizationOutcome> for OutcomeBody {
    fn from(outcome: AuthorizationOutcome) -> Self {
        Self {
            allowed: outcome.allowed,
            reason: outcome.reason,
            error: outcome.error.map(|e| OutcomeError {
                code: e.code().to_string(),
                message: e.to_string(),
            }),
        }
    }
}

/// POST /api/authorize
///
/// 저장소 장애만 503으로 응답합니다. 그 외의 실패는 본문의 `error`로 전달됩니다.
pub async fn authorize(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(check): Json<AuthorizationCheck>,
) -> Result<Json<OutcomeBody>> {
    let subject = current_subject(&state, &headers).await?;
    let mut outcomes = state
        .authorizer
        .authorize_batch(subject.as_ref(), std::slice::from_ref(&check))
        .await?;

    let outcome = outcomes.pop().ok_or_else(|| crate::error::ApiError::Internal {
        message: "empty authorization result".to_string(),
    })?;

    let AuthorizationOutcome {
        allowed,
        reason,
        error,
    } = outcome;
    match error {
        Some(e @ akt_core::Error::StorageUnavailable { .. }) => Err(e.into()),
        error => Ok(Json(
            AuthorizationOutcome {
                allowed,
                reason,
                error,
            }
            .into(),
        )),
    }
}

/// POST /api/authorize/batch
pub async fn authorize_batch(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>> {
    let subject = current_subject(&state, &headers).await?;
    let outcomes = state
        .authorizer
        .authorize_batch(subject.as_ref(), &request.checks)
        .await?;

    tracing::debug!(
        checks = request.checks.len(),
        allowed = outcomes.iter().filter(|o| o.allowed).count(),
        "batch authorization"
    );

    Ok(Json(BatchResponse {
        results: outcomes.into_iter().map(OutcomeBody::from).collect(),
    }))
}
