use std::{env, sync::Arc};

use anyhow::{Context, Result, anyhow};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;
use uuid::Uuid;

use crate::{llm::LlmClient, web::auth};

pub const SEED_ADMIN_USERNAME: &str = "admin";
pub const SEED_ADMIN_EMAIL: &str = "admin@netsanet.local";

#[derive(Clone)]
pub struct AppState {
    pool: PgPool,
    token_secret: Arc<String>,
    llm: LlmClient,
}

impl AppState {
    pub async fn new() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL env var is missing")?;
        let token_secret = env::var("TOKEN_SECRET").context("TOKEN_SECRET env var is missing")?;

        let llm = LlmClient::from_env();

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&database_url)
            .await
            .context("failed to connect to Postgres")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;

        Ok(Self {
            pool,
            token_secret: Arc::new(token_secret),
            llm,
        })
    }

    /// Creates a default administrator account when none exists, replacing an
    /// out-of-band bootstrap script.
    pub async fn ensure_seed_admin(&self) -> Result<()> {
        let has_admin: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE is_admin = TRUE)")
                .fetch_one(&self.pool)
                .await
                .context("failed to verify admin presence")?;

        if !has_admin {
            let password_hash = auth::hash_password("change-me")
                .map_err(|err| anyhow!("failed to hash seed admin password: {err}"))?;

            sqlx::query(
                "INSERT INTO users (id, username, email, password_hash, is_admin) VALUES ($1, $2, $3, $4, TRUE)",
            )
            .bind(Uuid::new_v4())
            .bind(SEED_ADMIN_USERNAME)
            .bind(SEED_ADMIN_EMAIL)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .context("failed to insert seed admin user")?;

            info!(
                "Seeded default admin user '{SEED_ADMIN_USERNAME}' (password: 'change-me'). Update it promptly."
            );
        }

        Ok(())
    }

    pub fn llm_client(&self) -> LlmClient {
        self.llm.clone()
    }

    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }

    pub fn pool_ref(&self) -> &PgPool {
        &self.pool
    }

    pub fn token_secret(&self) -> &str {
        self.token_secret.as_str()
    }
}
