//! SQLite-backed [`SubscriptionStore`] bound to one open transaction

use async_trait::async_trait;
use shared::models::{Subscription, SubscriptionCreate};
use sqlx::SqliteConnection;

use super::{StoreResult, SubscriptionStore};
use crate::db::subscriptions;

/// Reads and writes go through the caller's transaction; commit stays with the caller.
pub struct SqliteStore<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SubscriptionStore for SqliteStore<'_> {
    async fn find_by_name(&mut self, name: &str) -> StoreResult<Option<Subscription>> {
        Ok(subscriptions::find_by_name(&mut *self.conn, name).await?)
    }

    async fn insert(&mut self, new: SubscriptionCreate) -> StoreResult<Subscription> {
        Ok(subscriptions::insert(&mut *self.conn, new).await?)
    }

    async fn save(&mut self, sub: &Subscription) -> StoreResult<()> {
        subscriptions::update(&mut *self.conn, sub).await?;
        Ok(())
    }
}
