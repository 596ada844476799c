use std::sync::Arc;

use redis::Client as RedisClient;
use sqlx::PgPool;

use config::Config;
use email::Mailer;
use storage::BlobStore;

pub mod api;
pub mod cache;
pub mod config;
pub mod email;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod storage;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub redis: Arc<RedisClient>,
    pub mailer: Arc<Mailer>,
    pub blobs: Arc<BlobStore>,
}
