//! 정책 명령어
//!
//! `check`는 API 없이 YAML 문서만으로 결정 엔진을 실행합니다.

use std::path::Path;

use akt_core::permissions::{
    AuthorizationCheck, AuthorizationOutcome, Authorizer, Condition, Effect, MemoryPolicyStore,
    Permission, PolicyFixture, RoleId,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::commands::authorize::describe;
use crate::commands::{http, print_json, Invocation};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyView {
    pub id: i64,
    pub effect: String,
    pub permission: String,
    pub role_id: RoleId,
    #[serde(default)]
    pub condition: Option<Value>,
}

impl PolicyView {
    fn print(&self) {
        print!(
            "- {} {} {} role={}",
            self.id, self.effect, self.permission, self.role_id
        );
        if let Some(condition) = &self.condition {
            print!(" when {}", condition);
        }
        println!();
    }
}

pub async fn list(inv: &Invocation, role: Option<RoleId>) -> anyhow::Result<()> {
    #[derive(Deserialize)]
    struct Resp {
        policies: Vec<PolicyView>,
    }

    let mut req = http::client().get(inv.url("/api/policies"));
    if let Some(role) = role {
        req = req.query(&[("roleId", role)]);
    }

    let resp: Resp = http::send_json(http::with_auth(&inv.config, req)?).await?;

    if inv.is_json() {
        return print_json(&resp.policies);
    }

    if resp.policies.is_empty() {
        println!("No policies.");
        return Ok(());
    }

    for policy in &resp.policies {
        policy.print();
    }
    Ok(())
}

pub async fn create(
    inv: &Invocation,
    role: RoleId,
    effect: &str,
    permission: &str,
    condition: Option<&str>,
) -> anyhow::Result<()> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Req<'a> {
        role_id: RoleId,
        effect: &'a str,
        permission: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        condition: Option<Value>,
    }

    // 서버에 보내기 전에 형식을 확인
    let effect: Effect = effect.parse()?;
    let permission: Permission = permission.parse()?;
    let condition = condition
        .map(|raw| Condition::parse(raw).map(|c| c.to_value()))
        .transpose()?;

    let created: PolicyView = http::send_json(
        http::with_auth(&inv.config, http::client().post(inv.url("/api/policies")))?.json(&Req {
            role_id: role,
            effect: effect.as_str(),
            permission: permission.as_str(),
            condition,
        }),
    )
    .await?;

    if inv.is_json() {
        return print_json(&created);
    }

    println!("Created policy {}", created.id);
    created.print();
    Ok(())
}

pub async fn delete(inv: &Invocation, id: i64) -> anyhow::Result<()> {
    http::send_empty(http::with_auth(
        &inv.config,
        http::client().delete(inv.url(&format!("/api/policies/{}", id))),
    )?)
    .await?;

    println!("Deleted policy {}", id);
    Ok(())
}

/// 오프라인 검사 결과 한 줄
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckLine {
    pub permission: String,
    pub allowed: bool,
    pub reason: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expect: Option<bool>,
}

impl CheckLine {
    pub fn is_mismatch(&self) -> bool {
        self.expect.is_some_and(|expect| expect != self.allowed)
    }
}

/// 문서의 검사 목록을 메모리 저장소로 평가
pub async fn run_fixture(fixture: &PolicyFixture) -> anyhow::Result<Vec<CheckLine>> {
    let store = MemoryPolicyStore::from_records(fixture.policy_records()?)?;
    let subject = fixture.subject()?;
    let authorizer = Authorizer::new(store);

    let checks: Vec<AuthorizationCheck> = fixture
        .checks
        .iter()
        .map(|c| AuthorizationCheck {
            permission: c.permission.clone(),
            resource: c.resource.clone(),
        })
        .collect();

    let outcomes = authorizer.authorize_batch(Some(&subject), &checks).await?;

    Ok(fixture
        .checks
        .iter()
        .zip(outcomes)
        .map(|(check, outcome)| {
            let AuthorizationOutcome {
                allowed,
                reason,
                error,
            } = outcome;
            CheckLine {
                permission: check.permission.clone(),
                allowed,
                reason: reason.and_then(|r| serde_json::to_value(r).ok()),
                error: error.map(|e| e.to_string()),
                expect: check.expect,
            }
        })
        .collect())
}

pub async fn check(inv: &Invocation, path: &Path) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
    let fixture = PolicyFixture::from_yaml(&source)?;
    let lines = run_fixture(&fixture).await?;

    if inv.is_json() {
        print_json(&lines)?;
    } else {
        for line in &lines {
            let detail = match &line.error {
                Some(error) => format!(" ({})", error),
                None => describe(line.reason.as_ref(), None),
            };
            let marker = if line.is_mismatch() { "  <- unexpected" } else { "" };
            println!(
                "{} {}{}{}",
                if line.allowed { "ALLOW" } else { "DENY " },
                line.permission,
                detail,
                marker
            );
        }
    }

    let mismatches = lines.iter().filter(|l| l.is_mismatch()).count();
    if mismatches > 0 {
        anyhow::bail!("{} check(s) did not match the expected result", mismatches);
    }
    Ok(())
}
