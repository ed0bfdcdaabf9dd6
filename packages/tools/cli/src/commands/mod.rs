//! CLI 명령어 구현

pub mod auth;
pub mod authorize;
pub mod http;
pub mod policy;
pub mod roles;

use serde::Serialize;

use crate::config::CliConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// 명령 실행 컨텍스트
pub struct Invocation {
    pub config: CliConfig,
    pub api_url: String,
    pub format: OutputFormat,
}

impl Invocation {
    pub fn new(config: CliConfig, api: Option<&str>, format: OutputFormat) -> Self {
        let api_url = config.api_url(api);
        Self {
            config,
            api_url,
            format,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
