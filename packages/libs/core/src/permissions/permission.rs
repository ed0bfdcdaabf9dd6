//! 권한 태그
//!
//! `<resource>:<action>` 형식의 닫힌 권한 목록입니다.
//! 문자열 표현은 대시보드 클라이언트와 바이트 단위로 일치해야 합니다.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

macro_rules! permissions {
    ($($variant:ident => $tag:literal,)+) => {
        /// 권한 태그
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Permission {
            $($variant,)+
        }

        impl Permission {
            /// 정의된 모든 권한
            pub const ALL: &'static [Permission] = &[$(Permission::$variant,)+];

            /// 문자열로 변환
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Permission::$variant => $tag,)+
                }
            }

            fn parse(s: &str) -> Option<Self> {
                match s {
                    $($tag => Some(Permission::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

permissions! {
    UserList => "user:list",
    UserRead => "user:read",
    UserCreate => "user:create",
    UserUpdate => "user:update",
    UserDelete => "user:delete",

    RoleList => "role:list",
    RoleRead => "role:read",
    RoleCreate => "role:create",
    RoleUpdate => "role:update",
    RoleDelete => "role:delete",

    InvitationList => "invitation:list",
    InvitationCreate => "invitation:create",
    InvitationRevoke => "invitation:revoke",

    SessionList => "session:list",
    SessionRevoke => "session:revoke",

    ConfigRead => "config:read",
    ConfigUpdate => "config:update",

    CronTaskList => "cron_task:list",
    CronTaskCreate => "cron_task:create",
    CronTaskUpdate => "cron_task:update",
    CronTaskDelete => "cron_task:delete",
    CronTaskTrigger => "cron_task:trigger",

    AuditLogList => "audit_log:list",

    PolicyList => "policy:list",
    PolicyCreate => "policy:create",
    PolicyDelete => "policy:delete",
}

impl Permission {
    /// 리소스 부분 (예: `user:update` → `user`)
    pub fn resource(&self) -> &'static str {
        self.split().0
    }

    /// 액션 부분 (예: `user:update` → `update`)
    pub fn action(&self) -> &'static str {
        self.split().1
    }

    fn split(&self) -> (&'static str, &'static str) {
        let tag = self.as_str();
        tag.split_once(':').unwrap_or((tag, ""))
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::parse(s).ok_or_else(|| Error::Configuration {
            message: format!("unknown permission '{}'", s),
        })
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Permission {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}
