use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{AuthError, AuthMethod, AuthUser};

/// Resolves a session cookie into the user it belongs to
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_key: &str) -> Result<Option<AuthUser>, AuthError>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, (AuthUser, Option<DateTime<Utc>>)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session_key: impl Into<String>, user: AuthUser, expires: Option<DateTime<Utc>>) {
        let user = AuthUser { method: AuthMethod::Session, ..user };
        self.sessions.write().await.insert(session_key.into(), (user, expires));
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_key: &str) -> Result<Option<AuthUser>, AuthError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_key)
            .filter(|(_, expires)| expires.map_or(true, |at| at > Utc::now()))
            .map(|(user, _)| user.clone()))
    }
}

const CREATE_USER_SESSIONS: &str = r#"
    CREATE TABLE IF NOT EXISTS user_sessions (
        session_key TEXT PRIMARY KEY,
        user_id BIGINT NOT NULL,
        username TEXT NOT NULL,
        administrator BOOLEAN NOT NULL DEFAULT FALSE,
        roles JSONB NOT NULL DEFAULT '[]'::jsonb,
        expire_date TIMESTAMPTZ NOT NULL
    )
"#;

/// Sessions written by the host platform into a shared `user_sessions` table
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub async fn new(pool: PgPool) -> Result<Self, AuthError> {
        sqlx::query(CREATE_USER_SESSIONS)
            .execute(&pool)
            .await
            .map_err(|e| AuthError::Session(e.to_string()))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load(&self, session_key: &str) -> Result<Option<AuthUser>, AuthError> {
        let query = r#"
            SELECT user_id, username, administrator, roles
            FROM user_sessions
            WHERE session_key = $1
            AND expire_date > NOW()
        "#;

        let row = sqlx::query(query)
            .bind(session_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Session(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let user_id: i64 = row.try_get("user_id").map_err(|e| AuthError::Session(e.to_string()))?;
        let username: String = row.try_get("username").map_err(|e| AuthError::Session(e.to_string()))?;
        let administrator: bool = row
            .try_get("administrator")
            .map_err(|e| AuthError::Session(e.to_string()))?;
        let roles: Value = row.try_get("roles").map_err(|e| AuthError::Session(e.to_string()))?;
        let roles = roles
            .as_array()
            .map(|items| items.iter().filter_map(|r| r.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        Ok(Some(AuthUser {
            user_id: user_id as u64,
            username,
            administrator,
            roles,
            method: AuthMethod::Session,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> AuthUser {
        AuthUser {
            user_id: 3,
            username: "staff".into(),
            administrator: true,
            roles: vec![],
            method: AuthMethod::Jwt,
        }
    }

    #[tokio::test]
    async fn loads_live_sessions_as_session_users() {
        let store = MemorySessionStore::new();
        store.insert("abc", user(), None).await;

        let loaded = store.load("abc").await.unwrap().unwrap();
        assert_eq!(loaded.user_id, 3);
        assert_eq!(loaded.method, AuthMethod::Session);
        assert!(store.load("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_sessions_are_ignored() {
        let store = MemorySessionStore::new();
        store.insert("old", user(), Some(Utc::now() - Duration::minutes(1))).await;
        assert!(store.load("old").await.unwrap().is_none());
    }
}
