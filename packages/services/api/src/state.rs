//! API 앱 상태

use akt_core::permissions::Authorizer;

use crate::config::Config;
use crate::db::{Db, SqlitePolicyStore};

/// 앱 상태
///
/// 모든 핸들러에서 공유하는 상태입니다.
pub struct AppState {
    /// 설정
    pub config: Config,

    /// 저장소
    pub db: Db,

    /// 인가기 (DB 정책 저장소 사용)
    pub authorizer: Authorizer<SqlitePolicyStore>,
}

impl AppState {
    /// 새 상태 생성
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        if let Some(path) = sqlite_file_path(&config.database_url) {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let db = Db::connect(&config.database_url, config.db_max_connections).await?;
        db.ensure_default_roles().await?;
        if let Some(token) = &config.bootstrap_token {
            db.bootstrap_admin(&config.bootstrap_admin_email, token, config.session_ttl_secs)
                .await?;
        }

        Ok(Self::with_db(config.clone(), db))
    }

    pub fn with_db(config: Config, db: Db) -> Self {
        let authorizer = Authorizer::new(db.policy_store());
        Self {
            config,
            db,
            authorizer,
        }
    }
}

fn sqlite_file_path(url: &str) -> Option<&str> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(":memory:") {
        None
    } else {
        Some(path)
    }
}
