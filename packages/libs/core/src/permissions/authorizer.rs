//! 인가 API
//!
//! 라우트 가드와 대시보드 API가 호출하는 진입점입니다.
//! 주체는 항상 명시적으로 전달받으며 전역 상태에서 읽지 않습니다.

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use super::context::{AttributeBag, Subject};
use super::evaluator::{DecisionEngine, DecisionReason};
use super::permission::Permission;
use super::store::PolicyStore;
use crate::error::{Error, Result};

/// 배치 검사 항목
///
/// 권한은 클라이언트가 보낸 문자열 그대로 받습니다.
/// 목록에 없는 권한은 해당 항목만 거부됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCheck {
    pub permission: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<AttributeBag>,
}

impl AuthorizationCheck {
    pub fn new(permission: Permission, resource: Option<AttributeBag>) -> Self {
        Self {
            permission: permission.as_str().to_string(),
            resource,
        }
    }
}

/// 검사 결과
///
/// 에러는 결과와 별도로 전달됩니다. 에러가 있으면 `allowed`는 항상 false입니다.
#[derive(Debug)]
pub struct AuthorizationOutcome {
    pub allowed: bool,
    pub reason: Option<DecisionReason>,
    pub error: Option<Error>,
}

impl AuthorizationOutcome {
    fn failed(error: Error) -> Self {
        Self {
            allowed: false,
            reason: None,
            error: Some(error),
        }
    }
}

/// 인가기
pub struct Authorizer<S> {
    engine: DecisionEngine<S>,
}

impl<S: PolicyStore> Authorizer<S> {
    pub fn new(store: S) -> Self {
        Self {
            engine: DecisionEngine::new(store),
        }
    }

    pub fn engine(&self) -> &DecisionEngine<S> {
        &self.engine
    }

    /// 단일 권한 검사
    ///
    /// 일반적인 거부는 `Ok(false)`입니다. 세션이 없을 때만 `Err(Unauthenticated)`를 반환합니다.
    /// 정책 설정 오류나 저장소 장애는 로그를 남기고 거부합니다.
    pub async fn authorize(
        &self,
        subject: Option<&Subject>,
        permission: Permission,
        resource: Option<&AttributeBag>,
    ) -> Result<bool> {
        let subject = require_subject(subject)?;
        Ok(self.check(subject, permission, resource).await.allowed)
    }

    /// 라우트 가드용 검사
    ///
    /// 거부(에러 포함)는 `Err(AccessDenied)`, 세션 없음은 `Err(Unauthenticated)`,
    /// 저장소 장애는 그대로 `Err(StorageUnavailable)`입니다.
    pub async fn require(
        &self,
        subject: Option<&Subject>,
        permission: Permission,
        resource: Option<&AttributeBag>,
    ) -> Result<()> {
        let subject = require_subject(subject)?;
        let outcome = self.check(subject, permission, resource).await;
        match outcome.error {
            Some(e @ Error::StorageUnavailable { .. }) => Err(e),
            _ if outcome.allowed => Ok(()),
            _ => Err(Error::AccessDenied {
                reason: format!("missing permission {}", permission),
            }),
        }
    }

    /// 결정과 에러를 함께 반환하는 검사
    pub async fn check(
        &self,
        subject: &Subject,
        permission: Permission,
        resource: Option<&AttributeBag>,
    ) -> AuthorizationOutcome {
        match self.engine.decide(subject, permission, resource).await {
            Ok(verdict) => AuthorizationOutcome {
                allowed: verdict.is_allowed(),
                reason: Some(verdict.reason),
                error: None,
            },
            Err(e) => {
                tracing::error!(
                    subject = %subject.id,
                    %permission,
                    error = %e,
                    "authorization failed closed"
                );
                AuthorizationOutcome::failed(e)
            }
        }
    }

    /// 배치 권한 검사
    ///
    /// 각 항목은 독립적으로 (동시에) 평가되며 결과는 입력 순서를 유지합니다.
    /// 한 항목의 에러는 다른 항목에 영향을 주지 않습니다.
    pub async fn authorize_batch(
        &self,
        subject: Option<&Subject>,
        checks: &[AuthorizationCheck],
    ) -> Result<Vec<AuthorizationOutcome>> {
        let subject = require_subject(subject)?;

        let evaluations = checks.iter().map(|check| async move {
            match check.permission.parse::<Permission>() {
                Ok(permission) => {
                    self.check(subject, permission, check.resource.as_ref())
                        .await
                }
                Err(e) => {
                    tracing::error!(
                        subject = %subject.id,
                        permission = %check.permission,
                        "rejecting check for unknown permission"
                    );
                    AuthorizationOutcome::failed(e)
                }
            }
        });

        Ok(join_all(evaluations).await)
    }
}

fn require_subject(subject: Option<&Subject>) -> Result<&Subject> {
    subject.ok_or_else(|| Error::unauthenticated("no authenticated session"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::condition::Condition;
    use crate::permissions::policy::{Effect, Policy, Role};
    use crate::permissions::policy::RoleId;
    use crate::permissions::store::MemoryPolicyStore;
    use async_trait::async_trait;

    /// 특정 권한 조회만 저장소 장애로 실패
    struct OutageStore {
        inner: MemoryPolicyStore,
        failing: Permission,
    }

    #[async_trait]
    impl PolicyStore for OutageStore {
        async fn load_policies(
            &self,
            role_id: RoleId,
            permission: Permission,
        ) -> Result<Vec<Policy>> {
            if permission == self.failing {
                return Err(Error::storage("connection refused"));
            }
            self.inner.load_policies(role_id, permission).await
        }
    }

    fn outage_authorizer() -> Authorizer<OutageStore> {
        Authorizer::new(OutageStore {
            inner: MemoryPolicyStore::with_policies(vec![
                Policy::new(1, Effect::Allow, Permission::RoleList, 2),
                Policy::new(2, Effect::Allow, Permission::UserRead, 2),
            ]),
            failing: Permission::UserRead,
        })
    }

    fn authorizer() -> Authorizer<MemoryPolicyStore> {
        let owner = Condition::parse(
            r#"{"op":"eq","left":{"user_attr":"id"},"right":{"resource_attr":"id"}}"#,
        )
        .unwrap();
        let broken = Condition::parse(
            r#"{"op":"startsWith","left":{"user_attr":"id"},"right":"u"}"#,
        )
        .unwrap();

        Authorizer::new(MemoryPolicyStore::with_policies(vec![
            Policy::new(1, Effect::Allow, Permission::UserUpdate, 2).with_condition(owner),
            Policy::new(2, Effect::Allow, Permission::RoleList, 2),
            Policy::new(3, Effect::Allow, Permission::AuditLogList, 2).with_condition(broken),
        ]))
    }

    fn subject() -> Subject {
        Subject::new("u1", vec![Role::new(2, "user")])
    }

    fn resource(id: &str) -> AttributeBag {
        AttributeBag::new().with("id", id)
    }

    #[tokio::test]
    async fn test_authorize_owner_scenario() {
        let authorizer = authorizer();
        let subject = subject();

        assert!(authorizer
            .authorize(Some(&subject), Permission::UserUpdate, Some(&resource("u1")))
            .await
            .unwrap());
        assert!(!authorizer
            .authorize(Some(&subject), Permission::UserUpdate, Some(&resource("u2")))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_authorize_without_session_is_unauthenticated() {
        let authorizer = authorizer();

        let err = authorizer
            .authorize(None, Permission::RoleList, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));

        let err = authorizer.authorize_batch(None, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn test_configuration_error_denies_without_raising() {
        let authorizer = authorizer();
        let subject = subject();

        let allowed = authorizer
            .authorize(Some(&subject), Permission::AuditLogList, None)
            .await
            .unwrap();
        assert!(!allowed);

        let outcome = authorizer
            .check(&subject, Permission::AuditLogList, None)
            .await;
        assert!(!outcome.allowed);
        assert!(matches!(outcome.error, Some(Error::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_isolates_failures() {
        let authorizer = authorizer();
        let subject = subject();
        let checks = vec![
            AuthorizationCheck::new(Permission::UserUpdate, Some(resource("u1"))),
            AuthorizationCheck::new(Permission::AuditLogList, None),
            AuthorizationCheck::new(Permission::RoleList, None),
            AuthorizationCheck {
                permission: "role:explode".to_string(),
                resource: None,
            },
            AuthorizationCheck::new(Permission::UserUpdate, Some(resource("u2"))),
        ];

        let outcomes = authorizer
            .authorize_batch(Some(&subject), &checks)
            .await
            .unwrap();

        let allowed: Vec<bool> = outcomes.iter().map(|o| o.allowed).collect();
        assert_eq!(allowed, vec![true, false, true, false, false]);

        assert!(outcomes[0].error.is_none());
        assert!(matches!(outcomes[1].error, Some(Error::Configuration { .. })));
        assert!(outcomes[2].error.is_none());
        assert!(matches!(outcomes[3].error, Some(Error::Configuration { .. })));
        assert!(outcomes[4].error.is_none());
        assert_eq!(outcomes[4].reason, Some(DecisionReason::NoMatchingPolicy));
    }

    #[tokio::test]
    async fn test_require_maps_deny_to_access_denied() {
        let authorizer = authorizer();
        let subject = subject();

        assert!(authorizer
            .require(Some(&subject), Permission::RoleList, None)
            .await
            .is_ok());

        let err = authorizer
            .require(Some(&subject), Permission::RoleDelete, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AccessDenied { .. }));
    }

    #[tokio::test]
    async fn test_storage_outage_denies_without_raising() {
        let authorizer = outage_authorizer();
        let subject = subject();

        let allowed = authorizer
            .authorize(Some(&subject), Permission::UserRead, None)
            .await
            .unwrap();
        assert!(!allowed);

        let outcome = authorizer.check(&subject, Permission::UserRead, None).await;
        assert!(!outcome.allowed);
        assert!(outcome.reason.is_none());
        assert!(matches!(outcome.error, Some(Error::StorageUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_require_surfaces_storage_outage() {
        let authorizer = outage_authorizer();
        let subject = subject();

        let err = authorizer
            .require(Some(&subject), Permission::UserRead, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable { .. }));

        assert!(authorizer
            .require(Some(&subject), Permission::RoleList, None)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_batch_isolates_storage_outage() {
        let authorizer = outage_authorizer();
        let subject = subject();
        let checks = vec![
            AuthorizationCheck::new(Permission::RoleList, None),
            AuthorizationCheck::new(Permission::UserRead, None),
            AuthorizationCheck::new(Permission::RoleList, None),
        ];

        let outcomes = authorizer
            .authorize_batch(Some(&subject), &checks)
            .await
            .unwrap();

        let allowed: Vec<bool> = outcomes.iter().map(|o| o.allowed).collect();
        assert_eq!(allowed, vec![true, false, true]);
        assert!(outcomes[0].error.is_none());
        assert!(matches!(
            outcomes[1].error,
            Some(Error::StorageUnavailable { .. })
        ));
        assert!(outcomes[2].error.is_none());
    }
}
