use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Identity and bookkeeping timestamps shared by persisted records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Identity {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Identity {
    pub fn new() -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    #[sqlx(flatten)]
    pub identity: Identity,
    pub email: String,
    pub password_hash: String, // Argon2 PHC string, never plaintext
    pub first_name: String,
    pub second_name: String,
    pub is_active: bool,
    pub last_login: Option<OffsetDateTime>,
}

impl User {
    pub fn id(&self) -> Uuid {
        self.identity.id
    }

    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.second_name)
    }
}

/// Row to insert; the hash is computed before this is built.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub second_name: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicUser {
    #[serde(flatten)]
    pub identity: Identity,
    pub email: String,
    pub first_name: String,
    pub second_name: String,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            identity: u.identity,
            email: u.email,
            first_name: u.first_name,
            second_name: u.second_name,
            is_active: u.is_active,
            last_login: u.last_login,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User {
            identity: Identity::new(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA".into(),
            first_name: "Ada".into(),
            second_name: "Lovelace".into(),
            is_active: true,
            last_login: None,
        }
    }

    #[test]
    fn public_user_has_no_password_hash() {
        let json = serde_json::to_value(PublicUser::from(sample())).unwrap();
        assert_eq!(json["email"], "ada@example.com");
        assert!(json.get("id").is_some());
        assert!(json.get("created_at").is_some());
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("argon2"));
        assert!(json["last_login"].is_null());
    }

    #[test]
    fn name_joins_first_and_second() {
        assert_eq!(sample().name(), "Ada Lovelace");
    }
}
