//! 공통 에러 타입
//!
//! Adminkit 전체에서 사용되는 에러 타입을 정의합니다.
//! 인가 관련 에러는 모두 fail-closed로 취급됩니다.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Adminkit 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Auth Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("unauthenticated: {reason}")]
    Unauthenticated { reason: String },

    #[error("access denied: {reason}")]
    AccessDenied { reason: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Policy Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("policy configuration error: {message}")]
    Configuration { message: String },

    #[error("policy storage unavailable: {message}")]
    StorageUnavailable { message: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // IO/Serialization Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Error::StorageUnavailable {
            message: message.into(),
        }
    }

    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        Error::Unauthenticated {
            reason: reason.into(),
        }
    }

    /// 결정을 Deny로 강제하는 에러인지 여부
    ///
    /// 정책 데이터 오류나 저장소 장애는 "조건 불일치"와 구분되어야 하지만,
    /// 결과는 항상 거부입니다.
    pub fn is_fail_closed(&self) -> bool {
        matches!(
            self,
            Error::Configuration { .. } | Error::StorageUnavailable { .. }
        )
    }

    /// HTTP 상태 코드로 변환
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::Yaml(_) | Error::Json(_) => 400,

            // 401 Unauthorized
            Error::Unauthenticated { .. } => 401,

            // 403 Forbidden
            Error::AccessDenied { .. } => 403,

            // 503 Service Unavailable
            Error::StorageUnavailable { .. } => 503,

            // 500 Internal Server Error
            Error::Configuration { .. } => 500,
        }
    }

    /// 에러 코드 (클라이언트용)
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unauthenticated { .. } => "UNAUTHENTICATED",
            Error::AccessDenied { .. } => "ACCESS_DENIED",
            Error::Configuration { .. } => "POLICY_CONFIGURATION_ERROR",
            Error::StorageUnavailable { .. } => "STORAGE_UNAVAILABLE",
            Error::Yaml(_) => "YAML_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }
    }
}
