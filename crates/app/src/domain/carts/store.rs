//! Cart persistence.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use mockall::automock;
use redis::{AsyncCommands as _, Client, aio::ConnectionManager};
use thiserror::Error;

use crate::domain::carts::records::{CartRecord, SessionKey};

#[derive(Debug, Error)]
pub enum CartStoreError {
    #[error("redis command failed")]
    Redis(#[from] redis::RedisError),

    #[error("stored cart could not be encoded or decoded")]
    Encoding(#[from] serde_json::Error),
}

#[automock]
#[async_trait]
/// Key-value storage for carts, keyed by session.
pub trait CartStore: Send + Sync {
    /// Load the cart for `session`, `None` when absent or expired.
    async fn load(&self, session: &SessionKey) -> Result<Option<CartRecord>, CartStoreError>;

    /// Replace the cart for `session` and restart its expiry window.
    async fn save(
        &self,
        session: &SessionKey,
        cart: &CartRecord,
        ttl: Duration,
    ) -> Result<(), CartStoreError>;

    /// Remove the cart for `session`. Missing carts are not an error.
    async fn delete(&self, session: &SessionKey) -> Result<(), CartStoreError>;
}

/// Redis-backed [`CartStore`] holding JSON values under `cart:{session}`.
#[derive(Clone)]
pub struct RedisCartStore {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisCartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCartStore").finish_non_exhaustive()
    }
}

impl RedisCartStore {
    #[must_use]
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Connect to Redis at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the connection fails.
    pub async fn connect(url: &str) -> Result<Self, CartStoreError> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self::new(conn))
    }

    fn key(session: &SessionKey) -> String {
        format!("cart:{session}")
    }
}

#[async_trait]
impl CartStore for RedisCartStore {
    async fn load(&self, session: &SessionKey) -> Result<Option<CartRecord>, CartStoreError> {
        let mut conn = self.conn.clone();

        let value: Option<String> = conn.get(Self::key(session)).await?;

        value
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(CartStoreError::from)
    }

    async fn save(
        &self,
        session: &SessionKey,
        cart: &CartRecord,
        ttl: Duration,
    ) -> Result<(), CartStoreError> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(cart)?;

        // Redis rejects a zero expiry.
        let seconds = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(Self::key(session), json, seconds)
            .await?;

        Ok(())
    }

    async fn delete(&self, session: &SessionKey) -> Result<(), CartStoreError> {
        let mut conn = self.conn.clone();

        conn.del::<_, ()>(Self::key(session)).await?;

        Ok(())
    }
}
