//! API 설정

use std::env;

/// API 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 서버 포트
    pub port: u16,

    /// SQLite URL
    pub database_url: String,

    /// DB 커넥션 수
    pub db_max_connections: u32,

    /// CORS 전체 허용 (개발용)
    pub cors_permissive: bool,

    /// 부트스트랩 관리자 이메일
    pub bootstrap_admin_email: String,

    /// 부트스트랩 관리자 세션 토큰 (설정 시에만 생성)
    pub bootstrap_token: Option<String>,

    /// 세션 TTL (초)
    pub session_ttl_secs: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: "sqlite://data/adminkit.db".to_string(),
            db_max_connections: 5,
            cors_permissive: true,
            bootstrap_admin_email: "admin@localhost".to_string(),
            bootstrap_token: None,
            session_ttl_secs: 60 * 60 * 24,
        }
    }
}

impl Config {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            port: env::var("AKT_API_PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()?,

            database_url: env::var("AKT_DATABASE_URL").unwrap_or(defaults.database_url),

            db_max_connections: env::var("AKT_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| defaults.db_max_connections.to_string())
                .parse()
                .unwrap_or(defaults.db_max_connections),

            cors_permissive: env::var("AKT_CORS_PERMISSIVE")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(defaults.cors_permissive),

            bootstrap_admin_email: env::var("AKT_BOOTSTRAP_ADMIN_EMAIL")
                .unwrap_or(defaults.bootstrap_admin_email),

            bootstrap_token: env::var("AKT_BOOTSTRAP_TOKEN")
                .ok()
                .filter(|v| !v.trim().is_empty()),

            session_ttl_secs: env::var("AKT_SESSION_TTL_SECS")
                .unwrap_or_else(|_| defaults.session_ttl_secs.to_string())
                .parse()
                .unwrap_or(defaults.session_ttl_secs),
        })
    }
}
