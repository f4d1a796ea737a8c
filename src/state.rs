use std::sync::Arc;

use crate::auth::jwt::JwtKeys;
use crate::auth::repo::{MemoryUserRepo, PgUserRepo, UserRepo};
use crate::config::{AppConfig, JwtConfig, RateLimitConfig};
use crate::db;
use crate::products::repo::{MemoryProductRepo, PgProductRepo, ProductRepo};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub users: Arc<dyn UserRepo>,
    pub products: Arc<dyn ProductRepo>,
    /// Index of the worker serving this state.
    pub worker: usize,
}

impl AppState {
    /// Connects the configured store. Without `DATABASE_URL` the memory
    /// store is used.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let (users, products): (Arc<dyn UserRepo>, Arc<dyn ProductRepo>) =
            match &config.database_url {
                Some(url) => {
                    let pool = db::connect(url).await?;
                    (
                        Arc::new(PgUserRepo::new(pool.clone())),
                        Arc::new(PgProductRepo::new(pool)),
                    )
                }
                None => {
                    tracing::warn!("DATABASE_URL not set; using in-memory store");
                    (
                        Arc::new(MemoryUserRepo::new()),
                        Arc::new(MemoryProductRepo::new()),
                    )
                }
            };
        Ok(Self::from_parts(Arc::new(config), users, products))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepo>,
        products: Arc<dyn ProductRepo>,
    ) -> Self {
        Self {
            keys: JwtKeys::new(&config.jwt),
            config,
            users,
            products,
            worker: 0,
        }
    }

    pub fn for_worker(&self, worker: usize) -> Self {
        Self {
            worker,
            ..self.clone()
        }
    }

    /// Memory-backed state with a fixed test secret.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            host: "127.0.0.1".into(),
            port: 0,
            cors_origin: "http://localhost:3000".into(),
            workers: 1,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_days: 7,
            },
            rate_limit: RateLimitConfig::default(),
        });
        Self::from_parts(
            config,
            Arc::new(MemoryUserRepo::new()),
            Arc::new(MemoryProductRepo::new()),
        )
    }
}
