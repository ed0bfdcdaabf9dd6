//! 정책 관리 엔드포인트
//!
//! 조건식은 저장 전에 파싱하여 검증합니다. 파싱할 수 없는 조건은 저장되지 않습니다.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use akt_core::permissions::{Condition, Effect, Permission, PolicyId, RoleId};

use crate::db::PolicyRow;
use crate::error::{ApiError, Result};
use crate::handlers::guard;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub role_id: Option<RoleId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePolicyRequest {
    pub role_id: RoleId,
    pub effect: String,
    pub permission: String,
    #[serde(default)]
    pub condition: Option<Value>,
}

/// 정책 JSON
///
/// 저장된 조건 문자열은 JSON으로 풀어서 내보냅니다.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyView {
    pub id: PolicyId,
    pub effect: String,
    pub permission: String,
    pub role_id: RoleId,
    pub condition: Option<Value>,
}

impl From<PolicyRow> for PolicyView {
    fn from(row: PolicyRow) -> Self {
        let condition = row
            .condition
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| serde_json::from_str(&raw).unwrap_or(Value::String(raw)));
        Self {
            id: row.id,
            effect: row.effect,
            permission: row.permission,
            role_id: row.role_id,
            condition,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PoliciesResponse {
    pub policies: Vec<PolicyView>,
}

/// GET /api/policies
pub async fn list_policies(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<PoliciesResponse>> {
    guard(&state, &headers, Permission::PolicyList).await?;
    let rows = state.db.list_policies(query.role_id).await?;
    Ok(Json(PoliciesResponse {
        policies: rows.into_iter().map(PolicyView::from).collect(),
    }))
}

/// POST /api/policies
pub async fn create_policy(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreatePolicyRequest>,
) -> Result<(StatusCode, Json<PolicyView>)> {
    let subject = guard(&state, &headers, Permission::PolicyCreate).await?;

    let effect: Effect = request
        .effect
        .parse()
        .map_err(|e: akt_core::Error| ApiError::bad_request(e.to_string()))?;
    let permission: Permission = request
        .permission
        .parse()
        .map_err(|e: akt_core::Error| ApiError::bad_request(e.to_string()))?;
    let condition = match request.condition {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            Condition::from_value(&value).map_err(|e| ApiError::bad_request(e.to_string()))?,
        ),
    };

    if state.db.get_role(request.role_id).await?.is_none() {
        return Err(ApiError::not_found(format!("role {}", request.role_id)));
    }

    let policy = state
        .db
        .insert_policy(effect, permission, request.role_id, condition.as_ref())
        .await?;

    tracing::info!(
        actor = %subject.id,
        policy_id = policy.id,
        role_id = policy.role_id,
        %permission,
        effect = effect.as_str(),
        "policy created"
    );

    Ok((
        StatusCode::CREATED,
        Json(PolicyView {
            id: policy.id,
            effect: effect.as_str().to_string(),
            permission: permission.as_str().to_string(),
            role_id: policy.role_id,
            condition: policy.condition.map(|c| c.to_value()),
        }),
    ))
}

/// DELETE /api/policies/{id}
pub async fn delete_policy(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<PolicyId>,
) -> Result<StatusCode> {
    let subject = guard(&state, &headers, Permission::PolicyDelete).await?;

    if !state.db.delete_policy(id).await? {
        return Err(ApiError::not_found(format!("policy {}", id)));
    }

    tracing::info!(actor = %subject.id, policy_id = id, "policy deleted");
    Ok(StatusCode::NO_CONTENT)
}
