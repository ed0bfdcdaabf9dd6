//! 인증 관련 타입
//!
//! 세션 자체의 발급/관리는 세션 서브시스템이 담당합니다.
//! 이 모듈은 요청에서 세션 토큰을 꺼내고, 세션 행의 유효성을 판단하는 부분만 다룹니다.

mod session;

pub use session::{SessionRecord, SessionToken, SESSION_COOKIE};
