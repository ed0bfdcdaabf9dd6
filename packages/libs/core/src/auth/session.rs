//! 세션 토큰

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 세션 쿠키 이름
pub const SESSION_COOKIE: &str = "akt_session";

/// 요청에서 추출한 세션 토큰
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

impl SessionToken {
    /// HTTP 헤더에서 토큰 추출
    ///
    /// # 추출 우선순위
    /// 1. `Authorization: Bearer ...`
    /// 2. `Cookie: akt_session=...`
    pub fn from_headers(auth_header: Option<&str>, cookie_header: Option<&str>) -> Option<Self> {
        if let Some(value) = auth_header {
            if let Some(token) = value.strip_prefix("Bearer ") {
                let token = token.trim();
                if !token.is_empty() {
                    return Some(SessionToken(token.to_string()));
                }
            }
        }

        cookie_header.and_then(|cookies| {
            cookies
                .split(';')
                .filter_map(|pair| pair.trim().split_once('='))
                .find(|(name, _)| *name == SESSION_COOKIE)
                .map(|(_, value)| value.trim())
                .filter(|value| !value.is_empty())
                .map(|value| SessionToken(value.to_string()))
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 저장된 세션
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// 새 세션 생성
    pub fn new(token: String, user_id: String, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            token,
            user_id,
            expires_at: now + chrono::Duration::seconds(ttl_seconds),
            created_at: now,
        }
    }

    /// 만료 여부 확인
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_takes_precedence() {
        let token = SessionToken::from_headers(Some("Bearer abc"), Some("akt_session=xyz"));
        assert_eq!(token, Some(SessionToken("abc".to_string())));
    }

    #[test]
    fn test_cookie_fallback() {
        let token = SessionToken::from_headers(None, Some("theme=dark; akt_session=xyz; lang=ko"));
        assert_eq!(token.unwrap().as_str(), "xyz");

        let token = SessionToken::from_headers(Some("Basic dXNlcg=="), Some("akt_session=xyz"));
        assert_eq!(token.unwrap().as_str(), "xyz");
    }

    #[test]
    fn test_missing_or_empty_token() {
        assert!(SessionToken::from_headers(None, None).is_none());
        assert!(SessionToken::from_headers(Some("Bearer "), None).is_none());
        assert!(SessionToken::from_headers(None, Some("akt_session=")).is_none());
        assert!(SessionToken::from_headers(None, Some("other=1")).is_none());
    }

    #[test]
    fn test_session_expiry() {
        let live = SessionRecord::new("t".to_string(), "u1".to_string(), 3600);
        assert!(!live.is_expired());

        let dead = SessionRecord::new("t".to_string(), "u1".to_string(), -1);
        assert!(dead.is_expired());
    }
}
