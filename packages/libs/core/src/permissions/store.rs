//! 정책 저장소
//!
//! 결정 엔진이 `(role, permission)` 단위로 정책을 읽어오는 경계입니다.
//! 실제 DB 구현은 API 서비스에 있습니다.

use std::sync::RwLock;

use async_trait::async_trait;

use super::permission::Permission;
use super::policy::{Policy, PolicyRecord, RoleId};
use crate::error::{Error, Result};

/// 정책 저장소
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// `(role_id, permission)`에 해당하는 정책 목록
    ///
    /// 일치하는 행이 없으면 빈 목록을 반환합니다. 순서는 저장 순서입니다.
    /// 저장소 장애는 `Error::StorageUnavailable`,
    /// 파싱할 수 없는 행은 `Error::Configuration`입니다.
    async fn load_policies(&self, role_id: RoleId, permission: Permission) -> Result<Vec<Policy>>;
}

#[async_trait]
impl<S: PolicyStore + ?Sized> PolicyStore for std::sync::Arc<S> {
    async fn load_policies(&self, role_id: RoleId, permission: Permission) -> Result<Vec<Policy>> {
        (**self).load_policies(role_id, permission).await
    }
}

/// 메모리 정책 저장소
///
/// 테스트와 오프라인 검사(`akt policy check`)에 사용합니다.
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    policies: RwLock<Vec<Policy>>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 정책 목록으로 생성
    pub fn with_policies(policies: Vec<Policy>) -> Self {
        Self {
            policies: RwLock::new(policies),
        }
    }

    /// 저장소 행 목록으로 생성 (조건 파싱 포함)
    pub fn from_records(records: Vec<PolicyRecord>) -> Result<Self> {
        let policies = records
            .into_iter()
            .map(PolicyRecord::into_policy)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::with_policies(policies))
    }

    /// 정책 추가 (삽입 순서 유지)
    pub fn insert(&self, policy: Policy) -> Result<()> {
        self.policies
            .write()
            .map_err(|_| Error::storage("policy store lock poisoned"))?
            .push(policy);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.policies.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn load_policies(&self, role_id: RoleId, permission: Permission) -> Result<Vec<Policy>> {
        let policies = self
            .policies
            .read()
            .map_err(|_| Error::storage("policy store lock poisoned"))?;

        Ok(policies
            .iter()
            .filter(|p| p.role_id == role_id && p.permission == permission)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::policy::Effect;

    #[tokio::test]
    async fn test_load_filters_by_role_and_permission() {
        let store = MemoryPolicyStore::with_policies(vec![
            Policy::new(1, Effect::Allow, Permission::UserUpdate, 2),
            Policy::new(2, Effect::Allow, Permission::UserRead, 2),
            Policy::new(3, Effect::Deny, Permission::UserUpdate, 3),
            Policy::new(4, Effect::Deny, Permission::UserUpdate, 2),
        ]);

        let loaded = store.load_policies(2, Permission::UserUpdate).await.unwrap();
        let ids: Vec<_> = loaded.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[tokio::test]
    async fn test_no_match_is_empty_not_error() {
        let store = MemoryPolicyStore::new();
        let loaded = store.load_policies(9, Permission::RoleList).await.unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_from_records_rejects_malformed_rows() {
        let records = vec![PolicyRecord {
            id: 1,
            effect: "allow".to_string(),
            permission: "user:update".to_string(),
            role_id: 2,
            condition: Some(r#"{"op":"eq"}"#.to_string()),
        }];
        assert!(MemoryPolicyStore::from_records(records).is_err());
    }
}
