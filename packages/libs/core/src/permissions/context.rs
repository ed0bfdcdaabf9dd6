//! 평가 컨텍스트
//!
//! 조건식이 참조하는 주체(사용자)와 리소스의 속성 묶음입니다.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::policy::Role;
use crate::error::{Error, Result};

/// 속성 묶음
///
/// 키 → JSON 값. 중첩 객체는 `a.b.c` 경로로 조회할 수 있습니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeBag(Map<String, Value>);

impl AttributeBag {
    /// 빈 묶음 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 속성 추가 (builder)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// 최상위 키 조회
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// 속성 조회
    ///
    /// 정확히 일치하는 키를 먼저 찾고, 없으면 `.` 구분 경로로 중첩 객체를 따라갑니다.
    /// 찾지 못하면 `None`(undefined)입니다.
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.0.get(key) {
            return Some(value);
        }

        let mut segments = key.split('.');
        let mut current = self.0.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for AttributeBag {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for AttributeBag {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(Error::configuration(format!(
                "attribute bag must be a JSON object, got {}",
                other
            ))),
        }
    }
}

/// 인가 주체 (인증된 사용자)
///
/// 세션/인증 서브시스템이 만들어 전달합니다. 평가기는 이 값을 변경하지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    /// 사용자 ID
    pub id: String,

    /// 역할 목록 (저장된 할당 순서)
    #[serde(default)]
    pub roles: Vec<Role>,

    /// 사용자 속성 (`user_attr`로 조회)
    #[serde(default)]
    pub attributes: AttributeBag,
}

impl Subject {
    /// 새 주체 생성
    pub fn new(id: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            id: id.into(),
            roles,
            attributes: AttributeBag::new(),
        }
    }

    /// 속성 설정
    pub fn with_attributes(mut self, attributes: AttributeBag) -> Self {
        self.attributes = attributes;
        self
    }

    /// super admin 역할 보유 여부
    pub fn is_super_admin(&self) -> bool {
        self.roles.iter().any(|r| r.is_super_admin)
    }

    /// 특정 role 보유 확인
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name == name)
    }

    /// `user_attr` 조회
    ///
    /// `id`와 `roles`는 항상 주체 자체의 값을 반환합니다.
    pub fn attribute(&self, key: &str) -> Option<Value> {
        match key {
            "id" => Some(Value::String(self.id.clone())),
            "roles" => Some(Value::Array(
                self.roles
                    .iter()
                    .map(|r| Value::String(r.name.clone()))
                    .collect(),
            )),
            _ => self.attributes.lookup(key).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_exact_and_nested() {
        let bag: AttributeBag = json!({
            "id": "u1",
            "profile": { "team": { "name": "ops" } },
            "a.b": 1
        })
        .try_into()
        .unwrap();

        assert_eq!(bag.lookup("id"), Some(&json!("u1")));
        assert_eq!(bag.lookup("profile.team.name"), Some(&json!("ops")));
        // 정확한 키가 경로보다 우선
        assert_eq!(bag.lookup("a.b"), Some(&json!(1)));
        assert_eq!(bag.lookup("profile.missing"), None);
        assert_eq!(bag.lookup("missing"), None);
    }

    #[test]
    fn test_attribute_bag_rejects_non_object() {
        assert!(AttributeBag::try_from(json!([1, 2])).is_err());
        assert!(AttributeBag::try_from(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_subject_builtin_attributes() {
        let subject = Subject::new("u1", vec![Role::new(2, "user")])
            .with_attributes(AttributeBag::new().with("id", "spoofed").with("team", "ops"));

        assert_eq!(subject.attribute("id"), Some(json!("u1")));
        assert_eq!(subject.attribute("roles"), Some(json!(["user"])));
        assert_eq!(subject.attribute("team"), Some(json!("ops")));
        assert!(subject.has_role("user"));
        assert!(!subject.is_super_admin());
    }
}
