//! API 저장소 (SQLite)
//!
//! 역할, 사용자, 세션, 정책 테이블을 다룹니다.
//! 인가 결정에 필요한 읽기는 `SqlitePolicyStore`와 `resolve_subject`가 담당합니다.

use std::str::FromStr;

use akt_core::auth::SessionRecord;
use akt_core::permissions::{
    AttributeBag, Condition, Effect, Permission, Policy, PolicyId, PolicyRecord, PolicyStore, Role,
    RoleId, Subject,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

pub const ADMIN_ROLE: &str = "admin";
pub const USER_ROLE: &str = "user";

#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// 연결 및 테이블 초기화
    pub async fn connect(db_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(db_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init().await?;
        Ok(db)
    }

    /// 테스트용 메모리 DB
    ///
    /// 메모리 DB는 연결마다 분리되므로 연결을 하나로 고정합니다.
    #[cfg(test)]
    pub async fn in_memory() -> anyhow::Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init(&self) -> anyhow::Result<()> {
        let queries = [
            r#"CREATE TABLE IF NOT EXISTS roles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                label TEXT NOT NULL,
                description TEXT,
                sort_index INTEGER NOT NULL DEFAULT 0,
                is_default INTEGER NOT NULL DEFAULT 0,
                is_super_admin INTEGER NOT NULL DEFAULT 0
            );"#,
            r#"CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                attributes_json TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL
            );"#,
            r#"CREATE TABLE IF NOT EXISTS user_roles (
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                role_id INTEGER NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
                PRIMARY KEY (user_id, role_id)
            );"#,
            r#"CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                expires_at TEXT NOT NULL,
                created_at TEXT NOT NULL
            );"#,
            r#"CREATE TABLE IF NOT EXISTS policies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                effect TEXT NOT NULL,
                permission TEXT NOT NULL,
                role_id INTEGER NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
                condition TEXT,
                created_at TEXT NOT NULL
            );"#,
            r#"CREATE INDEX IF NOT EXISTS idx_policies_role_permission
                ON policies (role_id, permission);"#,
        ];

        for q in queries {
            sqlx::query(q).execute(&self.pool).await?;
        }

        Ok(())
    }

    /// 결정 엔진용 정책 저장소
    pub fn policy_store(&self) -> SqlitePolicyStore {
        SqlitePolicyStore {
            pool: self.pool.clone(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Roles
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn insert_role(&self, role: &NewRole) -> anyhow::Result<Role> {
        let result = sqlx::query(
            r#"INSERT INTO roles (name, label, description, sort_index, is_default, is_super_admin)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
        )
        .bind(&role.name)
        .bind(role.label.as_deref().unwrap_or(&role.name))
        .bind(&role.description)
        .bind(role.index)
        .bind(role.is_default)
        .bind(role.is_super_admin)
        .execute(&self.pool)
        .await?;

        self.get_role(result.last_insert_rowid())
            .await?
            .ok_or_else(|| anyhow::anyhow!("role missing after insert"))
    }

    pub async fn get_role(&self, id: RoleId) -> anyhow::Result<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"SELECT id, name, label, description, sort_index, is_default, is_super_admin
               FROM roles WHERE id = ?1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(RoleRow::into_role))
    }

    pub async fn list_roles(&self) -> anyhow::Result<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"SELECT id, name, label, description, sort_index, is_default, is_super_admin
               FROM roles ORDER BY sort_index, id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(RoleRow::into_role).collect())
    }

    pub async fn get_role_by_name(&self, name: &str) -> anyhow::Result<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"SELECT id, name, label, description, sort_index, is_default, is_super_admin
               FROM roles WHERE name = ?1"#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(RoleRow::into_role))
    }

    /// 기본 역할 보장
    ///
    /// `admin`(슈퍼 관리자)과 `user`(기본 역할)가 없으면 생성합니다.
    pub async fn ensure_default_roles(&self) -> anyhow::Result<()> {
        let defaults = [
            NewRole {
                name: ADMIN_ROLE.to_string(),
                label: Some("Administrator".to_string()),
                index: 0,
                is_super_admin: true,
                ..Default::default()
            },
            NewRole {
                name: USER_ROLE.to_string(),
                label: Some("User".to_string()),
                index: 1,
                is_default: true,
                ..Default::default()
            },
        ];

        for role in defaults {
            if self.get_role_by_name(&role.name).await?.is_none() {
                let created = self.insert_role(&role).await?;
                tracing::info!(role = %created.name, id = created.id, "created default role");
            }
        }
        Ok(())
    }

    /// 사용자 역할 (할당 순서)
    pub async fn roles_for_user(&self, user_id: &str) -> sqlx::Result<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"SELECT r.id, r.name, r.label, r.description, r.sort_index,
                      r.is_default, r.is_super_admin
               FROM user_roles ur JOIN roles r ON r.id = ur.role_id
               WHERE ur.user_id = ?1
               ORDER BY ur.rowid"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(RoleRow::into_role).collect())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Users & Sessions
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn insert_user(
        &self,
        email: &str,
        name: &str,
        attributes: &AttributeBag,
    ) -> anyhow::Result<UserRow> {
        let id = ulid::Ulid::new().to_string();
        let created_at = Utc::now().to_rfc3339();
        sqlx::query(
            r#"INSERT INTO users (id, email, name, attributes_json, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
        )
        .bind(&id)
        .bind(email)
        .bind(name)
        .bind(serde_json::to_string(attributes)?)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        Ok(UserRow {
            id,
            email: email.to_string(),
            name: name.to_string(),
            attributes_json: serde_json::to_string(attributes)?,
            created_at,
        })
    }

    pub async fn get_user_by_email(&self, email: &str) -> sqlx::Result<Option<UserRow>> {
        sqlx::query_as::<_, UserRow>(
            r#"SELECT id, email, name, attributes_json, created_at FROM users WHERE email = ?1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_user(&self, id: &str) -> sqlx::Result<Option<UserRow>> {
        sqlx::query_as::<_, UserRow>(
            r#"SELECT id, email, name, attributes_json, created_at FROM users WHERE id = ?1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn assign_role(&self, user_id: &str, role_id: RoleId) -> anyhow::Result<()> {
        sqlx::query(r#"INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?1, ?2)"#)
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_session(&self, session: &SessionRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"INSERT INTO sessions (token, user_id, expires_at, created_at)
               VALUES (?1, ?2, ?3, ?4)"#,
        )
        .bind(&session.token)
        .bind(&session.user_id)
        .bind(session.expires_at.to_rfc3339())
        .bind(session.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_session(&self, token: &str) -> sqlx::Result<Option<SessionRow>> {
        sqlx::query_as::<_, SessionRow>(
            r#"SELECT token, user_id, expires_at, created_at FROM sessions WHERE token = ?1"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
    }

    /// 관리자 세션 부트스트랩
    ///
    /// 이메일의 사용자가 없으면 만들고 `admin` 역할을 할당한 뒤 주어진 토큰으로 세션을 엽니다.
    /// 같은 토큰의 세션이 이미 있으면 아무것도 하지 않습니다.
    pub async fn bootstrap_admin(
        &self,
        email: &str,
        token: &str,
        ttl_seconds: i64,
    ) -> anyhow::Result<()> {
        if self.get_session(token).await?.is_some() {
            return Ok(());
        }

        self.ensure_default_roles().await?;
        let admin = self
            .get_role_by_name(ADMIN_ROLE)
            .await?
            .ok_or_else(|| anyhow::anyhow!("admin role missing"))?;

        let user = match self.get_user_by_email(email).await? {
            Some(user) => user,
            None => self.insert_user(email, "Administrator", &AttributeBag::new()).await?,
        };
        self.assign_role(&user.id, admin.id).await?;
        self.insert_session(&SessionRecord::new(
            token.to_string(),
            user.id.clone(),
            ttl_seconds,
        ))
        .await?;

        tracing::info!(user_id = %user.id, %email, "bootstrapped admin session");
        Ok(())
    }

    /// 세션 토큰으로 주체 구성
    ///
    /// 세션이 없거나 만료되었거나 사용자가 없으면 `Ok(None)`입니다.
    /// DB 오류는 `StorageUnavailable`로 변환합니다.
    pub async fn resolve_subject(&self, token: &str) -> akt_core::Result<Option<Subject>> {
        let Some(session) = self.get_session(token).await.map_err(storage_error)? else {
            return Ok(None);
        };
        let session = session.into_record()?;
        if session.is_expired() {
            tracing::debug!(user_id = %session.user_id, "session expired");
            return Ok(None);
        }

        let Some(user) = self.get_user(&session.user_id).await.map_err(storage_error)? else {
            return Ok(None);
        };
        let roles = self
            .roles_for_user(&user.id)
            .await
            .map_err(storage_error)?;

        Ok(Some(user.into_subject(roles)?))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Policies
    // ─────────────────────────────────────────────────────────────────────────

    /// 정책 저장
    ///
    /// 조건은 정규 형식 JSON으로 저장합니다.
    pub async fn insert_policy(
        &self,
        effect: Effect,
        permission: Permission,
        role_id: RoleId,
        condition: Option<&Condition>,
    ) -> anyhow::Result<Policy> {
        let condition_json = condition.map(|c| c.to_value().to_string());
        let result = sqlx::query(
            r#"INSERT INTO policies (effect, permission, role_id, condition, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
        )
        .bind(effect.as_str())
        .bind(permission.as_str())
        .bind(role_id)
        .bind(condition_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Policy {
            id: result.last_insert_rowid(),
            effect,
            permission,
            role_id,
            condition: condition.cloned(),
        })
    }

    /// 정책 행 목록 (파싱하지 않은 원본)
    pub async fn list_policies(&self, role_id: Option<RoleId>) -> anyhow::Result<Vec<PolicyRow>> {
        let rows = match role_id {
            Some(role_id) => {
                sqlx::query_as::<_, PolicyRow>(
                    r#"SELECT id, effect, permission, role_id, condition
                       FROM policies WHERE role_id = ?1 ORDER BY id"#,
                )
                .bind(role_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, PolicyRow>(
                    r#"SELECT id, effect, permission, role_id, condition
                       FROM policies ORDER BY id"#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    pub async fn delete_policy(&self, id: PolicyId) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM policies WHERE id = ?1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// SQLite 정책 저장소
#[derive(Clone)]
pub struct SqlitePolicyStore {
    pool: SqlitePool,
}

#[async_trait]
impl PolicyStore for SqlitePolicyStore {
    async fn load_policies(
        &self,
        role_id: RoleId,
        permission: Permission,
    ) -> akt_core::Result<Vec<Policy>> {
        let rows = sqlx::query_as::<_, PolicyRow>(
            r#"SELECT id, effect, permission, role_id, condition
               FROM policies WHERE role_id = ?1 AND permission = ?2 ORDER BY id"#,
        )
        .bind(role_id)
        .bind(permission.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter()
            .map(|row| PolicyRecord::from(row).into_policy())
            .collect()
    }
}

fn storage_error(e: sqlx::Error) -> akt_core::Error {
    akt_core::Error::storage(e.to_string())
}

fn parse_timestamp(value: &str) -> akt_core::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| akt_core::Error::storage(format!("invalid timestamp '{}': {}", value, e)))
}

/// 역할 생성 입력
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRole {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub index: i64,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_super_admin: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoleRow {
    pub id: i64,
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    pub sort_index: i64,
    pub is_default: bool,
    pub is_super_admin: bool,
}

impl RoleRow {
    pub fn into_role(self) -> Role {
        Role {
            id: self.id,
            name: self.name,
            label: self.label,
            description: self.description,
            index: self.sort_index,
            is_default: self.is_default,
            is_super_admin: self.is_super_admin,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub name: String,
    pub attributes_json: String,
    pub created_at: String,
}

impl UserRow {
    /// 주체로 변환
    ///
    /// 저장된 속성에 `email`, `name`을 더합니다. `id`는 주체 자체의 값이 우선합니다.
    pub fn into_subject(self, roles: Vec<Role>) -> akt_core::Result<Subject> {
        let value: serde_json::Value = serde_json::from_str(&self.attributes_json)
            .map_err(|e| {
                akt_core::Error::configuration(format!(
                    "user {}: invalid attributes: {}",
                    self.id, e
                ))
            })?;
        let mut attributes = AttributeBag::try_from(value)?;
        attributes.insert("email", self.email);
        attributes.insert("name", self.name);
        Ok(Subject::new(self.id, roles).with_attributes(attributes))
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    pub token: String,
    pub user_id: String,
    pub expires_at: String,
    pub created_at: String,
}

impl SessionRow {
    pub fn into_record(self) -> akt_core::Result<SessionRecord> {
        Ok(SessionRecord {
            expires_at: parse_timestamp(&self.expires_at)?,
            created_at: parse_timestamp(&self.created_at)?,
            token: self.token,
            user_id: self.user_id,
        })
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRow {
    pub id: i64,
    pub effect: String,
    pub permission: String,
    pub role_id: i64,
    pub condition: Option<String>,
}

impl From<PolicyRow> for PolicyRecord {
    fn from(row: PolicyRow) -> Self {
        PolicyRecord {
            id: row.id,
            effect: row.effect,
            permission: row.permission,
            role_id: row.role_id,
            condition: row.condition,
        }
    }
}
