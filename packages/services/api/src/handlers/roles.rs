use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;

use akt_core::permissions::{Permission, Role};

use crate::error::Result;
use crate::handlers::guard;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RolesResponse {
    pub roles: Vec<Role>,
}

/// GET /api/roles
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<RolesResponse>> {
    guard(&state, &headers, Permission::RoleList).await?;
    let roles = state.db.list_roles().await?;
    Ok(Json(RolesResponse { roles }))
}
