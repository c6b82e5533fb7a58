use std::{sync::Arc, time::Duration};

use anyhow::Context;
use tracing::warn;

use crate::{
    auth::{
        login::LoginVerifier,
        password::Hasher,
        repo::{MemoryUserRepo, PgUserRepo, UserRepo},
        services::{CredentialStore, EmailPolicy},
    },
    config::{AppConfig, HashConfig, StoreBackend},
    db,
};

#[derive(Clone)]
pub struct AppState {
    pub store: CredentialStore,
    pub verifier: LoginVerifier,
}

impl AppState {
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let repo: Arc<dyn UserRepo> = match config.store_backend {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is not set")?;
                let pool = db::connect_with_retry(
                    url,
                    config.db_max_connections,
                    Duration::from_secs(config.db_reconnect_seconds),
                )
                .await;
                db::run_migrations(&pool).await?;
                Arc::new(PgUserRepo::new(pool))
            }
            StoreBackend::Memory => {
                warn!("using in-memory user store; records are lost on exit");
                Arc::new(MemoryUserRepo::new())
            }
        };

        Self::from_parts(
            repo,
            config.hash,
            EmailPolicy {
                case_sensitive: config.email_case_sensitive,
            },
        )
    }

    pub fn from_parts(
        repo: Arc<dyn UserRepo>,
        hash: HashConfig,
        policy: EmailPolicy,
    ) -> anyhow::Result<Self> {
        let hasher = Hasher::new(hash).context("build password hasher")?;
        let store = CredentialStore::new(repo, hasher, policy);
        let verifier = LoginVerifier::new(store.clone());
        Ok(Self { store, verifier })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::from_parts(
            Arc::new(MemoryUserRepo::new()),
            HashConfig {
                m_cost: 1024,
                t_cost: 1,
                p_cost: 1,
            },
            EmailPolicy {
                case_sensitive: false,
            },
        )
        .expect("fake state")
    }
}
