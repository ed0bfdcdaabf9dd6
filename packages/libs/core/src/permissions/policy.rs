//! 역할 및 정책 정의
//!
//! 저장소의 role/policy 행과, 이를 파싱한 평가용 타입입니다.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::context::{AttributeBag, Subject};
use super::permission::Permission;
use crate::error::{Error, Result};

pub type RoleId = i64;
pub type PolicyId = i64;

/// 역할
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: RoleId,

    /// 고유 이름
    pub name: String,

    #[serde(default)]
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 정렬 순서
    #[serde(default)]
    pub index: i64,

    /// 신규 사용자 기본 역할 여부
    #[serde(default)]
    pub is_default: bool,

    /// 정책 평가를 건너뛰는 super admin 여부
    #[serde(default)]
    pub is_super_admin: bool,
}

impl Role {
    pub fn new(id: RoleId, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id,
            label: name.clone(),
            name,
            description: None,
            index: 0,
            is_default: false,
            is_super_admin: false,
        }
    }

    pub fn super_admin(id: RoleId, name: impl Into<String>) -> Self {
        Self {
            is_super_admin: true,
            ..Self::new(id, name)
        }
    }
}

/// 정책 효과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "allow",
            Effect::Deny => "deny",
        }
    }
}

impl FromStr for Effect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "allow" => Ok(Effect::Allow),
            "deny" => Ok(Effect::Deny),
            other => Err(Error::configuration(format!(
                "unknown policy effect '{}'",
                other
            ))),
        }
    }
}

/// 평가용 정책
///
/// 조건이 없으면 해당 권한의 모든 리소스에 무조건 적용됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: PolicyId,
    pub effect: Effect,
    pub permission: Permission,
    pub role_id: RoleId,
    #[serde(default)]
    pub condition: Option<Condition>,
}

impl Policy {
    /// 무조건 정책 생성
    pub fn new(id: PolicyId, effect: Effect, permission: Permission, role_id: RoleId) -> Self {
        Self {
            id,
            effect,
            permission,
            role_id,
            condition: None,
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// 이 결정에 대해 활성인지 평가
    pub fn is_active(&self, subject: &Subject, resource: Option<&AttributeBag>) -> Result<bool> {
        super::condition::evaluate(self.condition.as_ref(), subject, resource)
    }
}

/// 저장소 행 형태의 정책
///
/// 조건은 직렬화된 JSON 문자열입니다. `into_policy`로 저장소 경계에서 한 번만 파싱합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRecord {
    pub id: PolicyId,
    pub effect: String,
    pub permission: String,
    pub role_id: RoleId,
    #[serde(default)]
    pub condition: Option<String>,
}

impl PolicyRecord {
    /// 평가용 정책으로 변환
    pub fn into_policy(self) -> Result<Policy> {
        let effect: Effect = self.effect.parse()?;
        let permission: Permission = self.permission.parse()?;
        let condition = match self.condition.as_deref().map(str::trim) {
            None | Some("") | Some("null") => None,
            Some(raw) => Some(Condition::parse(raw).map_err(|e| {
                Error::configuration(format!("policy {}: {}", self.id, e))
            })?),
        };

        Ok(Policy {
            id: self.id,
            effect,
            permission,
            role_id: self.role_id,
            condition,
        })
    }
}

/// 오프라인 정책 검사용 문서 (YAML/JSON)
///
/// ```yaml
/// roles:
///   - { id: 1, name: admin, isSuperAdmin: true }
///   - { id: 2, name: user }
/// policies:
///   - effect: allow
///     permission: "user:update"
///     roleId: 2
///     condition: { op: eq, left: { user_attr: id }, right: { resource_attr: id } }
/// subject:
///   id: u1
///   roles: [user]
/// checks:
///   - permission: "user:update"
///     resource: { id: u1 }
///     expect: true
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyFixture {
    #[serde(default)]
    pub roles: Vec<Role>,

    #[serde(default)]
    pub policies: Vec<FixturePolicy>,

    pub subject: FixtureSubject,

    #[serde(default)]
    pub checks: Vec<FixtureCheck>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixturePolicy {
    pub effect: String,
    pub permission: String,
    pub role_id: RoleId,
    #[serde(default)]
    pub condition: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureSubject {
    pub id: String,

    /// 역할 이름 목록
    #[serde(default)]
    pub roles: Vec<String>,

    #[serde(default)]
    pub attributes: AttributeBag,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureCheck {
    pub permission: String,
    #[serde(default)]
    pub resource: Option<AttributeBag>,

    /// 기대 결과 (없으면 검증하지 않음)
    #[serde(default)]
    pub expect: Option<bool>,
}

impl PolicyFixture {
    /// YAML 문서 파싱
    pub fn from_yaml(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// 정책 행 목록 (1부터 순서대로 ID 부여)
    pub fn policy_records(&self) -> Result<Vec<PolicyRecord>> {
        self.policies
            .iter()
            .enumerate()
            .map(|(idx, p)| -> Result<PolicyRecord> {
                let condition = match &p.condition {
                    None | Some(serde_json::Value::Null) => None,
                    Some(value) => Some(serde_json::to_string(value)?),
                };
                Ok(PolicyRecord {
                    id: idx as PolicyId + 1,
                    effect: p.effect.clone(),
                    permission: p.permission.clone(),
                    role_id: p.role_id,
                    condition,
                })
            })
            .collect()
    }

    /// 역할 이름을 정의된 역할로 해석한 주체
    pub fn subject(&self) -> Result<Subject> {
        let roles = self
            .subject
            .roles
            .iter()
            .map(|name| {
                self.roles
                    .iter()
                    .find(|r| &r.name == name)
                    .cloned()
                    .ok_or_else(|| Error::configuration(format!("undefined role '{}'", name)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Subject::new(self.subject.id.clone(), roles)
            .with_attributes(self.subject.attributes.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_record_parses_condition_once() {
        let record = PolicyRecord {
            id: 7,
            effect: "allow".to_string(),
            permission: "user:update".to_string(),
            role_id: 2,
            condition: Some(
                r#"{"op":"eq","left":{"type":"user_attr","key":"id"},"right":{"type":"resource_attr","key":"id"}}"#
                    .to_string(),
            ),
        };

        let policy = record.into_policy().unwrap();
        assert_eq!(policy.effect, Effect::Allow);
        assert_eq!(policy.permission, Permission::UserUpdate);
        assert!(policy.condition.is_some());
    }

    #[test]
    fn test_policy_record_without_condition_is_wildcard() {
        for raw in [None, Some(""), Some("null")] {
            let record = PolicyRecord {
                id: 1,
                effect: "deny".to_string(),
                permission: "role:list".to_string(),
                role_id: 2,
                condition: raw.map(str::to_string),
            };
            let policy = record.into_policy().unwrap();
            assert!(policy.condition.is_none());
        }
    }

    #[test]
    fn test_policy_record_rejects_bad_data() {
        let base = PolicyRecord {
            id: 1,
            effect: "allow".to_string(),
            permission: "user:update".to_string(),
            role_id: 2,
            condition: None,
        };

        let bad_effect = PolicyRecord {
            effect: "maybe".to_string(),
            ..base.clone()
        };
        assert!(matches!(
            bad_effect.into_policy(),
            Err(Error::Configuration { .. })
        ));

        let bad_permission = PolicyRecord {
            permission: "user:fly".to_string(),
            ..base.clone()
        };
        assert!(matches!(
            bad_permission.into_policy(),
            Err(Error::Configuration { .. })
        ));

        let bad_condition = PolicyRecord {
            condition: Some("{not json".to_string()),
            ..base
        };
        assert!(matches!(
            bad_condition.into_policy(),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_parse_fixture_yaml() {
        let yaml = r#"
roles:
  - { id: 1, name: admin, isSuperAdmin: true }
  - { id: 2, name: user }
policies:
  - effect: allow
    permission: "user:update"
    roleId: 2
    condition: { op: eq, left: { user_attr: id }, right: { resource_attr: id } }
  - effect: allow
    permission: "role:list"
    roleId: 2
subject:
  id: u1
  roles: [user]
checks:
  - permission: "user:update"
    resource: { id: u1 }
    expect: true
  - permission: "role:list"
"#;

        let fixture = PolicyFixture::from_yaml(yaml).unwrap();
        assert_eq!(fixture.roles.len(), 2);
        assert!(fixture.roles[0].is_super_admin);

        let records = fixture.policy_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert!(records[0].condition.is_some());
        assert!(records[1].condition.is_none());

        let subject = fixture.subject().unwrap();
        assert_eq!(subject.roles.len(), 1);
        assert_eq!(subject.roles[0].id, 2);
        assert_eq!(fixture.checks.len(), 2);
        assert!(fixture.checks[1].resource.is_none());
        assert_eq!(fixture.checks[0].expect, Some(true));
        assert_eq!(fixture.checks[1].expect, None);
    }

    #[test]
    fn test_fixture_subject_with_undefined_role() {
        let yaml = r#"
subject:
  id: u1
  roles: [ghost]
"#;
        let fixture = PolicyFixture::from_yaml(yaml).unwrap();
        assert!(fixture.subject().is_err());
    }
}
