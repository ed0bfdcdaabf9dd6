//! 속성 기반 권한 평가 (ABAC)
//!
//! # 개요
//!
//! 정책 행(`effect`, `permission`, `roleId`, `condition`)을 역할과 조건식에 따라 평가하여
//! 허용/거부를 결정합니다. 모든 오류 상태는 거부로 귀결됩니다(fail-closed).
//!
//! # 모듈 구조
//!
//! - `permission`: 닫힌 권한 태그 목록
//! - `condition`: 조건식 AST 및 평가
//! - `context`: 주체/리소스 속성
//! - `policy`: 역할/정책 정의
//! - `store`: 정책 저장소 경계
//! - `evaluator`: 결정 엔진
//! - `authorizer`: 라우트 가드용 API

mod authorizer;
mod condition;
mod context;
mod evaluator;
mod permission;
mod policy;
mod store;

pub use authorizer::{AuthorizationCheck, AuthorizationOutcome, Authorizer};
pub use condition::{evaluate, AttributeRef, AttributeSource, ComparisonOp, Condition, Operand};
pub use context::{AttributeBag, Subject};
pub use evaluator::{Decision, DecisionEngine, DecisionReason, Verdict};
pub use permission::Permission;
pub use policy::{
    Effect, FixtureCheck, FixturePolicy, FixtureSubject, Policy, PolicyFixture, PolicyId,
    PolicyRecord, Role, RoleId,
};
pub use store::{MemoryPolicyStore, PolicyStore};
