//! API 핸들러
//!
//! 세션 토큰으로 주체를 구성하고, 관리 엔드포인트는 권한 가드를 거칩니다.

pub mod authorize;
pub mod health;
pub mod policies;
pub mod roles;

use axum::http::{header, HeaderMap};

use akt_core::auth::SessionToken;
use akt_core::permissions::{Permission, Subject};

use crate::error::Result;
use crate::state::AppState;

/// 요청 주체 조회
///
/// 토큰이 없거나 세션이 유효하지 않으면 `None`입니다.
pub async fn current_subject(state: &AppState, headers: &HeaderMap) -> Result<Option<Subject>> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let cookie = headers.get(header::COOKIE).and_then(|v| v.to_str().ok());

    let Some(token) = SessionToken::from_headers(auth, cookie) else {
        return Ok(None);
    };

    Ok(state.db.resolve_subject(token.as_str()).await?)
}

/// 라우트 가드
///
/// 세션 없음은 401, 거부는 403, 저장소 장애는 503으로 응답됩니다.
pub async fn guard(
    state: &AppState,
    headers: &HeaderMap,
    permission: Permission,
) -> Result<Subject> {
    let subject = current_subject(state, headers).await?;
    state
        .authorizer
        .require(subject.as_ref(), permission, None)
        .await?;

    subject.ok_or_else(|| akt_core::Error::unauthenticated("no authenticated session").into())
}
