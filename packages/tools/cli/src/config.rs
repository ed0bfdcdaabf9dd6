//! CLI 설정

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// CLI 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// 저장된 세션 토큰
    pub auth_token: Option<String>,

    /// 기본 API URL
    pub default_api: Option<String>,
}

impl CliConfig {
    /// 설정 파일 경로
    fn config_path() -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?;
        Ok(home.join(".akt").join("config.json"))
    }

    /// 설정 로드
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: CliConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// 설정 저장
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// API URL 결정 (`--api` > `AKT_API_URL` > 설정 파일 > 기본값)
    pub fn api_url(&self, flag: Option<&str>) -> String {
        resolve_api_url(
            flag,
            std::env::var("AKT_API_URL").ok().as_deref(),
            self.default_api.as_deref(),
        )
    }

    /// 인증 토큰 결정 (`AKT_AUTH_TOKEN` > 설정 파일)
    pub fn get_auth_token(&self) -> anyhow::Result<String> {
        std::env::var("AKT_AUTH_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.auth_token.clone())
            .ok_or_else(|| anyhow::anyhow!("Not logged in. Use 'akt login --token <token>' first."))
    }
}

/// 빈 값은 설정되지 않은 것으로 보고 다음 후보로 넘어갑니다.
fn resolve_api_url(flag: Option<&str>, env: Option<&str>, saved: Option<&str>) -> String {
    [flag, env, saved]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(DEFAULT_API_URL)
        .trim_end_matches('/')
        .to_string()
}
