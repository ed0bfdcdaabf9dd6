use anyhow::Context as _;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::CliConfig;

pub fn client() -> Client {
    Client::new()
}

pub fn with_auth(config: &CliConfig, req: RequestBuilder) -> anyhow::Result<RequestBuilder> {
    let token = config.get_auth_token()?;
    Ok(req.bearer_auth(token))
}

pub async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> anyhow::Result<T> {
    let resp = send(req).await?;
    let body = resp.json::<T>().await.context("invalid json response")?;
    Ok(body)
}

/// 본문 없는 응답 (204 등)
pub async fn send_empty(req: RequestBuilder) -> anyhow::Result<StatusCode> {
    let resp = send(req).await?;
    Ok(resp.status())
}

async fn send(req: RequestBuilder) -> anyhow::Result<reqwest::Response> {
    let resp = req.send().await.context("request failed")?;
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(anyhow::anyhow!("request failed ({}): {}", status, error_message(&text)));
    }
    Ok(resp)
}

/// `{ error: { code, message } }` 본문이면 `CODE: message` 형태로 줄입니다.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            let error = v.get("error")?;
            Some(format!(
                "{}: {}",
                error.get("code")?.as_str()?,
                error.get("message")?.as_str()?
            ))
        })
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_api_body() {
        let body = r#"{"error":{"code":"ACCESS_DENIED","message":"access denied: missing permission role:list","requestId":"r1"}}"#;
        assert_eq!(
            error_message(body),
            "ACCESS_DENIED: access denied: missing permission role:list"
        );
        assert_eq!(error_message("bad gateway"), "bad gateway");
    }
}
