use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    repo_types::{Identity, NewUser, User},
};

/// Persistence port for user records.
///
/// Emails reaching this layer are already normalized; adapters compare them verbatim.
/// Every mutation is applied atomically per record, so a concurrent reader sees either
/// the old row or the new one.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// Fails with [`AuthError::DuplicateEmail`] when the email is taken.
    async fn insert(&self, new: NewUser) -> Result<User, AuthError>;
    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<User, AuthError>;
    /// Moves `last_login` forward to `at`; never moves it backwards.
    async fn record_login(&self, id: Uuid, at: OffsetDateTime) -> Result<User, AuthError>;
    async fn set_active(&self, id: Uuid, active: bool) -> Result<User, AuthError>;
}

const USER_COLUMNS: &str = "id, created_at, updated_at, email, password_hash, \
                            first_name, second_name, is_active, last_login";

pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code == "23505"),
        _ => false,
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, new: NewUser) -> Result<User, AuthError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, first_name, second_name)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.first_name)
        .bind(&new.second_name)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::DuplicateEmail
            } else {
                AuthError::Store(e.into())
            }
        })
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<User, AuthError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET password_hash = $2, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AuthError::Store(e.into()))?
        .ok_or(AuthError::UserNotFound)
    }

    async fn record_login(&self, id: Uuid, at: OffsetDateTime) -> Result<User, AuthError> {
        // GREATEST skips NULL, so the first login simply takes `at`.
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET last_login = GREATEST(last_login, $2)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AuthError::Store(e.into()))?
        .ok_or(AuthError::UserNotFound)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<User, AuthError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET is_active = $2, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AuthError::Store(e.into()))?
        .ok_or(AuthError::UserNotFound)
    }
}

#[derive(Default)]
struct MemoryTables {
    users: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
}

/// Process-local adapter, selected with `STORE_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryUserRepo {
    tables: RwLock<MemoryTables>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<F>(&self, id: Uuid, f: F) -> Result<User, AuthError>
    where
        F: FnOnce(&mut User) + Send,
    {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(&id).ok_or(AuthError::UserNotFound)?;
        f(user);
        Ok(user.clone())
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn insert(&self, new: NewUser) -> Result<User, AuthError> {
        let mut tables = self.tables.write().await;
        if tables.by_email.contains_key(&new.email) {
            return Err(AuthError::DuplicateEmail);
        }
        let user = User {
            identity: Identity::new(),
            email: new.email,
            password_hash: new.password_hash,
            first_name: new.first_name,
            second_name: new.second_name,
            is_active: true,
            last_login: None,
        };
        tables.by_email.insert(user.email.clone(), user.id());
        tables.users.insert(user.id(), user.clone());
        Ok(user)
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<User, AuthError> {
        let password_hash = password_hash.to_owned();
        self.update(id, move |u| {
            u.password_hash = password_hash;
            u.identity.updated_at = OffsetDateTime::now_utc();
        })
        .await
    }

    async fn record_login(&self, id: Uuid, at: OffsetDateTime) -> Result<User, AuthError> {
        self.update(id, move |u| {
            u.last_login = Some(u.last_login.map_or(at, |prev| prev.max(at)));
        })
        .await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<User, AuthError> {
        self.update(id, move |u| {
            u.is_active = active;
            u.identity.updated_at = OffsetDateTime::now_utc();
        })
        .await
    }
}
