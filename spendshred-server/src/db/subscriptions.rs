//! Subscription queries

use shared::models::{
    DEFAULT_TEAM, Subscription, SubscriptionCreate, SubscriptionStatus, UNKNOWN_LAST_USED,
};
use sqlx::{SqliteExecutor, SqlitePool};

const COLUMNS: &str = "id, name, team, amount, seats_total, seats_unused, status, last_used";

pub async fn list(pool: &SqlitePool) -> Result<Vec<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(&format!("SELECT {COLUMNS} FROM subscriptions ORDER BY id"))
        .fetch_all(pool)
        .await
}

pub async fn find_by_id<'e>(
    exec: impl SqliteExecutor<'e>,
    id: i64,
) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(&format!("SELECT {COLUMNS} FROM subscriptions WHERE id = ?"))
        .bind(id)
        .fetch_optional(exec)
        .await
}

/// Oldest record with this exact name
pub async fn find_by_name<'e>(
    exec: impl SqliteExecutor<'e>,
    name: &str,
) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(&format!(
        "SELECT {COLUMNS} FROM subscriptions WHERE name = ? ORDER BY id LIMIT 1"
    ))
    .bind(name)
    .fetch_optional(exec)
    .await
}

pub async fn insert<'e>(
    exec: impl SqliteExecutor<'e>,
    data: SubscriptionCreate,
) -> Result<Subscription, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(&format!(
        "INSERT INTO subscriptions (name, team, amount, seats_total, seats_unused, status, last_used)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         RETURNING {COLUMNS}"
    ))
    .bind(data.name.trim())
    .bind(data.team.unwrap_or_else(|| DEFAULT_TEAM.to_string()))
    .bind(data.amount)
    .bind(data.seats_total)
    .bind(data.seats_unused)
    .bind(data.status.unwrap_or_default())
    .bind(data.last_used.unwrap_or_else(|| UNKNOWN_LAST_USED.to_string()))
    .fetch_one(exec)
    .await
}

/// Overwrite every mutable column. Returns false if the id does not exist.
pub async fn update<'e>(
    exec: impl SqliteExecutor<'e>,
    sub: &Subscription,
) -> Result<bool, sqlx::Error> {
    let rows = sqlx::query(
        "UPDATE subscriptions
         SET name = ?, team = ?, amount = ?, seats_total = ?, seats_unused = ?, status = ?, last_used = ?
         WHERE id = ?",
    )
    .bind(&sub.name)
    .bind(&sub.team)
    .bind(sub.amount)
    .bind(sub.seats_total)
    .bind(sub.seats_unused)
    .bind(sub.status)
    .bind(&sub.last_used)
    .bind(sub.id)
    .execute(exec)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Insert the demo portfolio if the table is empty. Returns rows inserted.
pub async fn seed_if_empty(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(0);
    }

    use SubscriptionStatus::*;
    let demo = [
        ("Notion", "Engineering", 120.0, 12, 0, Active, "2h ago"),
        ("Figma", "Design", 450.0, 10, 3, Zombie, "3mo ago"),
        ("ChatGPT Plus", "Marketing", 200.0, 10, 8, Critical, "Unknown"),
        ("Linear", "Product", 80.0, 8, 0, Active, "1d ago"),
        ("Adobe CC", "Design", 600.0, 5, 1, Zombie, "4mo ago"),
    ];

    let mut tx = pool.begin().await?;
    for (name, team, amount, seats_total, seats_unused, status, last_used) in demo {
        insert(
            &mut *tx,
            SubscriptionCreate {
                name: name.to_string(),
                team: Some(team.to_string()),
                amount,
                seats_total,
                seats_unused,
                status: Some(status),
                last_used: Some(last_used.to_string()),
            },
        )
        .await?;
    }
    tx.commit().await?;
    Ok(demo.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn create(name: &str) -> SubscriptionCreate {
        SubscriptionCreate {
            name: name.to_string(),
            team: None,
            amount: 12.5,
            seats_total: 3,
            seats_unused: 1,
            status: None,
            last_used: None,
        }
    }

    #[tokio::test]
    async fn insert_applies_defaults() {
        let pool = test_pool().await;
        let sub = insert(&pool, create("Slack")).await.unwrap();

        assert!(sub.id > 0);
        assert_eq!(sub.team, DEFAULT_TEAM);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.last_used, UNKNOWN_LAST_USED);
        assert_eq!(find_by_name(&pool, "Slack").await.unwrap(), Some(sub));
    }

    #[tokio::test]
    async fn update_round_trip() {
        let pool = test_pool().await;
        let mut sub = insert(&pool, create("Slack")).await.unwrap();
        sub.status = SubscriptionStatus::Cancelled;
        sub.amount = 0.0;

        assert!(update(&pool, &sub).await.unwrap());
        assert_eq!(find_by_id(&pool, sub.id).await.unwrap(), Some(sub.clone()));

        sub.id = 999;
        assert!(!update(&pool, &sub).await.unwrap());
    }

    #[tokio::test]
    async fn uncommitted_transaction_is_rolled_back() {
        let pool = test_pool().await;
        {
            let mut tx = pool.begin().await.unwrap();
            insert(&mut *tx, create("Ghost")).await.unwrap();
            assert!(find_by_name(&mut *tx, "Ghost").await.unwrap().is_some());
        }
        assert!(find_by_name(&pool, "Ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn seeds_only_once() {
        let pool = test_pool().await;
        assert_eq!(seed_if_empty(&pool).await.unwrap(), 5);
        assert_eq!(seed_if_empty(&pool).await.unwrap(), 0);

        let all = list(&pool).await.unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].name, "Notion");
        assert_eq!(all[2].status, SubscriptionStatus::Critical);
    }
}
