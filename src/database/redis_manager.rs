// Start of file: /src/database/redis_manager.rs

// * Optional shared cache on Redis. Values are stored as JSON strings.

use anyhow::{Context, Result};
use redis::{aio::MultiplexedConnection, Client};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

#[derive(Debug, Clone)]
pub struct RedisService {
    client: Client,
    prefix: String,
}

impl RedisService {
    pub fn new(redis_url: &str) -> Result<Self> {
        let client: Client = Client::open(redis_url).context("Failed to create Redis client")?;
        Ok(Self {
            client,
            prefix: "llamasearch".to_owned(),
        })
    }

    /// Verifies the server answers a PING.
    pub async fn initialize(&self) -> Result<()> {
        let mut conn: MultiplexedConnection = self.get_connection().await?;

        let _: () = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("Failed to ping Redis")?;

        info!("Redis connection established successfully");
        Ok(())
    }

    pub async fn get_connection(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to get Redis multiplexed connection")
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn: MultiplexedConnection = self.get_connection().await?;

        let raw: Option<String> = redis::cmd("GET")
            .arg(self.key(key))
            .query_async(&mut conn)
            .await
            .context("Failed to read from Redis")?;

        raw.map(|s| serde_json::from_str(&s).context("Cached value is not valid JSON"))
            .transpose()
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: u64) -> Result<()> {
        let mut conn: MultiplexedConnection = self.get_connection().await?;
        let payload: String = serde_json::to_string(value)?;

        let _: () = redis::cmd("SET")
            .arg(self.key(key))
            .arg(payload)
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .context("Failed to write to Redis")?;

        Ok(())
    }
}

// End of file: /src/database/redis_manager.rs
