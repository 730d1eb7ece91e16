use crate::domain::funnel::ProductConfig;
use anyhow::{Context, Result};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

pub const MEMORY_URL: &str = "sqlite::memory:";

/// Shared handle to the funnel database.
///
/// The schema repeats the record invariants as CHECK / UNIQUE / FOREIGN KEY
/// constraints, so rows written around the domain layer are still rejected.
#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str, max_connections: u32) -> Result<Self> {
        let in_memory = db_url.contains(":memory:") || db_url.contains("mode=memory");

        // Ensure the directory exists if it's a file path
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let mut options = SqliteConnectOptions::from_str(db_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // Each in-memory connection is its own database: pin a single one
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        info!("Connected to database: {}", db_url);

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Fresh private database, used by tests and dry runs
    pub async fn in_memory() -> Result<Self> {
        Self::new(MEMORY_URL, 1).await
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        // 1. Product reference data
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                name TEXT PRIMARY KEY CHECK (length(trim(name)) > 0),
                recognition_lag_months INTEGER NOT NULL DEFAULT 0
                    CHECK (recognition_lag_months >= 0),
                default_probability REAL NOT NULL
                    CHECK (default_probability BETWEEN 0 AND 1),
                active BOOLEAN NOT NULL DEFAULT 1,
                updated_at INTEGER
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create products table")?;

        // 2. Captures
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS captures (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                user_id TEXT NOT NULL,
                advisor TEXT NOT NULL CHECK (length(trim(advisor)) > 0),
                client TEXT NOT NULL CHECK (length(trim(client)) > 0),
                reference TEXT,
                product TEXT NOT NULL REFERENCES products (name),
                expected_amount TEXT NOT NULL
                    CHECK (CAST(expected_amount AS REAL) >= 0),
                realized_amount TEXT
                    CHECK (realized_amount IS NULL OR CAST(realized_amount AS REAL) >= 0),
                capture_date TEXT NOT NULL,
                expected_close_month TEXT NOT NULL
                    CHECK (substr(expected_close_month, 9, 2) = '01'),
                visit_date TEXT,
                category TEXT NOT NULL CHECK (category IN ('New', 'BAU')),
                status TEXT NOT NULL
                    CHECK (status IN ('Prospect', 'Proposal', 'Documentation', 'Client')),
                probability_adjusted REAL
                    CHECK (probability_adjusted IS NULL OR probability_adjusted BETWEEN 0 AND 1),
                CHECK (status <> 'Client' OR realized_amount IS NOT NULL)
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create captures table")?;

        // Index for scoped, date-bounded listings
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_captures_owner_date
            ON captures (user_id, capture_date);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create capture index")?;

        // 3. Monthly goals
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS monthly_goals (
                id TEXT PRIMARY KEY,
                advisor_id TEXT NOT NULL,
                month TEXT NOT NULL CHECK (substr(month, 9, 2) = '01'),
                amount TEXT NOT NULL CHECK (CAST(amount AS REAL) >= 0),
                updated_at INTEGER,
                UNIQUE (advisor_id, month)
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create monthly_goals table")?;

        // 4. Admin set
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS admins (
                user_id TEXT PRIMARY KEY,
                granted_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create admins table")?;

        // 5. Observations
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS observations (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                advisor_id TEXT NOT NULL,
                advisor_alias TEXT NOT NULL,
                client TEXT,
                message TEXT NOT NULL CHECK (length(trim(message)) > 0),
                created_by TEXT NOT NULL,
                done BOOLEAN NOT NULL DEFAULT 0,
                done_at TEXT,
                done_by TEXT,
                CHECK (done = 1 OR (done_at IS NULL AND done_by IS NULL))
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create observations table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_observations_advisor
            ON observations (advisor_id, done);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create observation index")?;

        info!("Database schema initialized.");
        Ok(())
    }

    /// Seed reference data once: the default product catalogue and, when
    /// given, the first admin. Existing rows are left untouched.
    ///
    /// The admin is only inserted into an empty admin set; returns whether it was.
    pub async fn seed(&self, first_admin: Option<Uuid>) -> Result<bool> {
        for product in ProductConfig::default_catalogue() {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO products
                    (name, recognition_lag_months, default_probability, active, updated_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&product.name)
            .bind(product.recognition_lag_months as i64)
            .bind(product.default_probability.value())
            .bind(product.active)
            .bind(chrono::Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .context("Failed to seed products")?;
        }
        info!("Reference data seeded.");

        let Some(user_id) = first_admin else {
            return Ok(false);
        };

        let result = sqlx::query(
            r#"
            INSERT INTO admins (user_id)
            SELECT ? WHERE NOT EXISTS (SELECT 1 FROM admins)
            "#,
        )
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to seed admin")?;

        if result.rows_affected() == 0 {
            warn!(
                "Admin set is not empty, {} was not seeded. Ask an existing admin to grant it.",
                user_id
            );
            return Ok(false);
        }
        info!("Seeded first admin {}", user_id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn admins(db: &Database) -> Vec<String> {
        sqlx::query_scalar("SELECT user_id FROM admins ORDER BY user_id")
            .fetch_all(&db.pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_admin_only_seeded_into_empty_set() {
        let db = Database::in_memory().await.unwrap();
        let first = Uuid::new_v4();
        let intruder = Uuid::new_v4();

        assert!(db.seed(Some(first)).await.unwrap());
        assert!(!db.seed(Some(intruder)).await.unwrap());
        assert!(!db.seed(None).await.unwrap());

        assert_eq!(admins(&db).await, vec![first.to_string()]);
    }

    #[tokio::test]
    async fn test_seed_keeps_existing_products() {
        let db = Database::in_memory().await.unwrap();
        db.seed(None).await.unwrap();
        sqlx::query("UPDATE products SET recognition_lag_months = 3 WHERE name = 'Leasing'")
            .execute(&db.pool)
            .await
            .unwrap();
        db.seed(None).await.unwrap();

        let lag: i64 =
            sqlx::query_scalar("SELECT recognition_lag_months FROM products WHERE name = 'Leasing'")
                .fetch_one(&db.pool)
                .await
                .unwrap();
        assert_eq!(lag, 3);
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(count, 7);
    }

    /// Rows written around the domain layer still hit the schema constraints.
    #[tokio::test]
    async fn test_schema_rejects_invalid_rows() {
        let db = Database::in_memory().await.unwrap();
        db.seed(None).await.unwrap();
        let owner = Uuid::new_v4().to_string();

        let insert = |product: &'static str,
                      status: &'static str,
                      realized: Option<&'static str>,
                      probability: Option<f64>| {
            sqlx::query(
                r#"
                INSERT INTO captures (
                    id, created_at, user_id, advisor, client, reference, product,
                    expected_amount, realized_amount, capture_date, expected_close_month,
                    visit_date, category, status, probability_adjusted
                )
                VALUES (?, '2025-06-03T10:00:00Z', ?, 'ana', 'Raw', NULL, ?,
                        '100', ?, '2025-06-03', '2025-07-01', NULL, 'New', ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(owner.clone())
            .bind(product)
            .bind(realized)
            .bind(status)
            .bind(probability)
        };

        assert!(insert("Leasing", "Client", None, None).execute(&db.pool).await.is_err());
        assert!(insert("Leasing", "Proposal", None, Some(1.5)).execute(&db.pool).await.is_err());
        assert!(insert("Leasing", "Cancelled", None, None).execute(&db.pool).await.is_err());
        assert!(insert("Crypto", "Prospect", None, None).execute(&db.pool).await.is_err());
        assert!(
            insert("Leasing", "Client", Some("120"), Some(0.9))
                .execute(&db.pool)
                .await
                .is_ok()
        );

        let goal = |month: &'static str, amount: &'static str| {
            sqlx::query("INSERT INTO monthly_goals (id, advisor_id, month, amount) VALUES (?, ?, ?, ?)")
                .bind(Uuid::new_v4().to_string())
                .bind(owner.clone())
                .bind(month)
                .bind(amount)
        };
        assert!(goal("2025-06-01", "1000").execute(&db.pool).await.is_ok());
        assert!(goal("2025-06-01", "5").execute(&db.pool).await.is_err());
        assert!(goal("2025-08-01", "-5").execute(&db.pool).await.is_err());
        assert!(goal("2025-09-15", "5").execute(&db.pool).await.is_err());
    }
}
