use async_trait::async_trait;
use snip_core::repository::Result;
use snip_core::{ReadRepository, Repository, SequenceRepository, ShortKey, StorageError, UrlRecord};
use sqlx::PgPool;
use tracing::info;

const SHORT_URLS_DDL: &str = include_str!("../ddl/postgres/short_urls.sql");
const SEQUENTIAL_URLS_DDL: &str = include_str!("../ddl/postgres/sequential_urls.sql");

/// PostgreSQL store for the random scheme.
///
/// One row per key in `short_urls`; the primary key on `short_key` turns a
/// duplicate random key into [`StorageError::Conflict`].
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// Creates a repository from an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `short_urls` table if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        create_table(&self.pool, "short_urls", SHORT_URLS_DDL).await
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// PostgreSQL store for the sequential scheme.
///
/// `sequential_urls` pairs a `BIGSERIAL` id with a unique URL, so the same
/// URL always maps to the same id.
#[derive(Debug, Clone)]
pub struct PgSequenceRepository {
    pool: PgPool,
}

impl PgSequenceRepository {
    /// Creates a repository from an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `sequential_urls` table if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        create_table(&self.pool, "sequential_urls", SEQUENTIAL_URLS_DDL).await
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

async fn create_table(pool: &PgPool, table: &'static str, ddl: &str) -> Result<()> {
    let existed: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
        .bind(table)
        .fetch_one(pool)
        .await
        .map_err(map_sqlx_error)?;

    sqlx::query(ddl)
        .execute(pool)
        .await
        .map_err(map_sqlx_error)?;

    if existed {
        info!(table, "table already exists");
    } else {
        info!(table, "table created");
    }
    Ok(())
}

async fn ping_pool(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(map_sqlx_error)?;
    Ok(())
}

#[async_trait]
impl ReadRepository for PgRepository {
    async fn get(&self, key: &ShortKey) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT original_url
            FROM short_urls
            WHERE short_key = $1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn ping(&self) -> Result<()> {
        ping_pool(&self.pool).await
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn insert(&self, record: &UrlRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO short_urls (short_key, original_url)
            VALUES ($1, $2)
            "#,
        )
        .bind(record.key.as_str())
        .bind(record.target.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::Conflict(record.key.to_string()))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }
}

#[async_trait]
impl ReadRepository for PgSequenceRepository {
    async fn get(&self, key: &ShortKey) -> Result<Option<String>> {
        // A key that does not decode to a valid id cannot have been assigned.
        let Some(id) = key.to_id().ok().and_then(|id| i64::try_from(id).ok()) else {
            return Ok(None);
        };

        sqlx::query_scalar::<_, String>(
            r#"
            SELECT original_url
            FROM sequential_urls
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn ping(&self) -> Result<()> {
        ping_pool(&self.pool).await
    }
}

#[async_trait]
impl SequenceRepository for PgSequenceRepository {
    async fn insert_returning_id(&self, target: &str) -> Result<i64> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO sequential_urls (original_url)
            VALUES ($1)
            ON CONFLICT (original_url) DO UPDATE SET original_url = EXCLUDED.original_url
            RETURNING id
            "#,
        )
        .bind(target)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }
}
