//! 원격 권한 검사

use akt_core::permissions::{AttributeBag, Permission};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::commands::{http, print_json, Invocation};

#[derive(Debug, Serialize)]
struct Req<'a> {
    permission: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource: Option<AttributeBag>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Outcome {
    pub allowed: bool,
    #[serde(default)]
    pub reason: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

/// `--resource` JSON 파싱
pub fn parse_resource(raw: Option<&str>) -> anyhow::Result<Option<AttributeBag>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| anyhow::anyhow!("--resource is not valid JSON: {}", e))?;
    Ok(Some(AttributeBag::try_from(value)?))
}

pub async fn authorize(
    inv: &Invocation,
    permission: &str,
    resource: Option<&str>,
) -> anyhow::Result<()> {
    // 로컬에서 먼저 권한 태그를 확인
    let permission: Permission = permission.parse()?;
    let resource = parse_resource(resource)?;

    let outcome: Outcome = http::send_json(
        http::with_auth(&inv.config, http::client().post(inv.url("/api/authorize")))?.json(&Req {
            permission: permission.as_str(),
            resource,
        }),
    )
    .await?;

    if inv.is_json() {
        return print_json(&outcome);
    }

    println!(
        "{} {}{}",
        if outcome.allowed { "ALLOW" } else { "DENY" },
        permission,
        describe(outcome.reason.as_ref(), outcome.error.as_ref())
    );
    Ok(())
}

/// 결정 사유 한 줄 요약
pub fn describe(reason: Option<&Value>, error: Option<&Value>) -> String {
    if let Some(error) = error {
        let code = error.get("code").and_then(Value::as_str).unwrap_or("ERROR");
        return format!(" ({})", code);
    }
    match reason.and_then(|r| r.get("kind")).and_then(Value::as_str) {
        Some("allowed") => {
            let ids = reason
                .and_then(|r| r.get("policyIds"))
                .map(|ids| ids.to_string())
                .unwrap_or_default();
            format!(" (allowed by policies {})", ids)
        }
        Some("denied_by_policy") => {
            let id = reason
                .and_then(|r| r.get("policyId"))
                .map(|id| id.to_string())
                .unwrap_or_default();
            format!(" (denied by policy {})", id)
        }
        Some(kind) => format!(" ({})", kind.replace('_', " ")),
        None => String::new(),
    }
}
