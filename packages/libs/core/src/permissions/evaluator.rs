//! 인가 결정 엔진
//!
//! 역할 멤버십, 정책의 allow/deny 효과, super admin 우회를 하나의 결정으로 합칩니다.
//!
//! # 규칙
//!
//! 1. super admin 역할이 하나라도 있으면 정책 조회 없이 허용
//! 2. 역할별 정책을 조회 (역할 간 조회는 동시에 수행)
//! 3. 조건이 참인 정책만 활성
//! 4. 활성 deny가 하나라도 있으면 거부 (역할이 달라도 동일)
//! 5. 활성 정책이 없으면 거부
//! 6. 조건 평가/조회 에러는 에러로 반환하며, 호출자는 거부로 취급

use futures::future::join_all;
use serde::Serialize;

use super::context::{AttributeBag, Subject};
use super::permission::Permission;
use super::policy::{Effect, PolicyId};
use super::store::PolicyStore;
use crate::error::Result;

/// 결정
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// 결정 사유
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionReason {
    /// super admin 역할 보유
    SuperAdmin,

    /// 활성 allow 정책이 있고 활성 deny는 없음
    Allowed {
        #[serde(rename = "policyIds")]
        policy_ids: Vec<PolicyId>,
    },

    /// 활성 deny 정책 (처음 발견된 것)
    DeniedByPolicy {
        #[serde(rename = "policyId")]
        policy_id: PolicyId,
    },

    /// 활성 정책 없음 (기본 거부)
    NoMatchingPolicy,
}

/// 결정 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub decision: Decision,
    pub reason: DecisionReason,
}

impl Verdict {
    fn allow(reason: DecisionReason) -> Self {
        Self {
            decision: Decision::Allow,
            reason,
        }
    }

    fn deny(reason: DecisionReason) -> Self {
        Self {
            decision: Decision::Deny,
            reason,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.decision.is_allowed()
    }
}

/// 결정 엔진
///
/// 상태를 갖지 않으며 공유 상태를 변경하지 않으므로 동시에 호출해도 안전합니다.
pub struct DecisionEngine<S> {
    store: S,
}

impl<S: PolicyStore> DecisionEngine<S> {
    /// 새 엔진 생성
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 권한 결정
    ///
    /// # Arguments
    /// * `subject` - 인증된 주체 (역할 순서는 저장된 순서)
    /// * `permission` - 요청 권한
    /// * `resource` - 대상 리소스 속성 (없으면 리소스 조건은 모두 undefined)
    pub async fn decide(
        &self,
        subject: &Subject,
        permission: Permission,
        resource: Option<&AttributeBag>,
    ) -> Result<Verdict> {
        // 1. super admin 우회
        if subject.is_super_admin() {
            tracing::debug!(subject = %subject.id, %permission, "allowed by super admin role");
            return Ok(Verdict::allow(DecisionReason::SuperAdmin));
        }

        // 2. 역할별 정책 조회 (동시)
        let fetches = subject
            .roles
            .iter()
            .map(|role| self.store.load_policies(role.id, permission));
        let loaded = join_all(fetches).await;

        // 3~4. 역할 순서대로 활성 정책 수집
        let mut allowed_by = Vec::new();
        let mut denied_by = None;

        for (role, policies) in subject.roles.iter().zip(loaded) {
            let policies = policies.map_err(|e| {
                tracing::error!(
                    role = %role.name,
                    %permission,
                    error = %e,
                    "failed to load policies"
                );
                e
            })?;

            for policy in policies {
                let active = policy.is_active(subject, resource).map_err(|e| {
                    tracing::warn!(
                        policy_id = policy.id,
                        role = %role.name,
                        %permission,
                        error = %e,
                        "policy condition is malformed"
                    );
                    e
                })?;
                if !active {
                    continue;
                }

                match policy.effect {
                    Effect::Deny => {
                        denied_by.get_or_insert(policy.id);
                    }
                    Effect::Allow => allowed_by.push(policy.id),
                }
            }
        }

        // 4. deny 우선
        let verdict = if let Some(policy_id) = denied_by {
            Verdict::deny(DecisionReason::DeniedByPolicy { policy_id })
        } else if !allowed_by.is_empty() {
            Verdict::allow(DecisionReason::Allowed {
                policy_ids: allowed_by,
            })
        } else {
            // 5. 기본 거부
            Verdict::deny(DecisionReason::NoMatchingPolicy)
        };

        tracing::debug!(
            subject = %subject.id,
            %permission,
            decision = ?verdict.decision,
            "authorization decided"
        );

        Ok(verdict)
    }
}
