//! akt-core: Adminkit 공통 핵심 라이브러리
//!
//! 이 크레이트는 API 서비스와 CLI가 공유하는 인가 타입과 로직을 제공합니다.
//!
//! # 모듈 구조
//!
//! - `permissions`: 권한 태그, 조건식 평가, 정책 결정
//! - `auth`: 세션 토큰 추출 및 세션 유효성
//! - `error`: 공통 에러 타입

pub mod auth;
pub mod error;
pub mod permissions;

pub use error::{Error, Result};
