use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Row as _};
use tracing::info;
use uuid::Uuid;

use super::{validate_identifier, Filter, Row, Scope, Store, StoreError, OWNER_COLUMN};
use crate::config::DatabaseConfig;

/// PostgreSQL store. Rows travel as JSONB: inserts and updates go through
/// `jsonb_populate_record`, reads come back as `to_jsonb(table.*)`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the bundled `migrations/` directory
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    fn decode(row: sqlx::postgres::PgRow) -> Result<Row, StoreError> {
        match row.try_get::<Value, _>("row")? {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Malformed(format!("expected object, got {}", other))),
        }
    }
}

/// Quote SQL identifier after validating it
fn ident(name: &str) -> Result<String, StoreError> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name))
}

pub(crate) fn select_sql(table: &str, filters: &[Filter], order_by: &str) -> Result<String, StoreError> {
    let table = ident(table)?;
    let mut sql = format!(
        "SELECT to_jsonb(t.*) AS row FROM {} t WHERE t.{} = $1",
        table,
        ident(OWNER_COLUMN)?
    );
    for (i, filter) in filters.iter().enumerate() {
        sql.push_str(&format!(" AND t.{}::text = ${}", ident(&filter.column)?, i + 2));
    }
    sql.push_str(&format!(" ORDER BY t.{} ASC, t.\"id\" ASC", ident(order_by)?));
    Ok(sql)
}

pub(crate) fn insert_sql(table: &str, row: &Row) -> Result<String, StoreError> {
    let table = ident(table)?;
    let columns = row
        .keys()
        .map(|k| ident(k))
        .collect::<Result<Vec<_>, _>>()?
        .join(", ");
    Ok(format!(
        "INSERT INTO {table} ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1) RETURNING to_jsonb({table}.*) AS row"
    ))
}

pub(crate) fn update_sql(table: &str, patch: &Row) -> Result<String, StoreError> {
    let table = ident(table)?;
    let mut assignments = patch
        .keys()
        .map(|k| ident(k).map(|c| format!("{c} = r.{c}")))
        .collect::<Result<Vec<_>, _>>()?;
    assignments.push("\"updated_at\" = now()".to_string());
    Ok(format!(
        "UPDATE {table} SET {} FROM jsonb_populate_record(NULL::{table}, $1) AS r WHERE {table}.\"id\" = $2 AND {table}.{} = $3 RETURNING to_jsonb({table}.*) AS row",
        assignments.join(", "),
        ident(OWNER_COLUMN)?
    ))
}

/// Map constraint violations onto [`StoreError::Conflict`]
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            // unique_violation
            Some("23505") => {
                let constraint = db_err.constraint().unwrap_or("unknown");
                return StoreError::Conflict(format!("Duplicate value violates unique constraint: {constraint}"));
            }
            // foreign_key_violation
            Some("23503") => {
                return StoreError::Conflict("Record is still referenced by other records".to_string());
            }
            _ => {}
        }
    }
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::PoolClosed => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Sqlx(other),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn select(&self, scope: Scope<'_>, filters: &[Filter], order_by: &str) -> Result<Vec<Row>, StoreError> {
        let sql = select_sql(scope.table, filters, order_by)?;
        let mut query = sqlx::query(&sql).bind(scope.owner);
        for filter in filters {
            query = query.bind(&filter.value);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(classify)?;
        rows.into_iter().map(Self::decode).collect()
    }

    async fn insert(&self, scope: Scope<'_>, mut row: Row) -> Result<Row, StoreError> {
        let now = Utc::now();
        row.entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        row.insert(OWNER_COLUMN.to_string(), Value::String(scope.owner.to_string()));
        row.insert("created_at".to_string(), Value::String(now.to_rfc3339()));
        row.insert("updated_at".to_string(), Value::String(now.to_rfc3339()));

        let sql = insert_sql(scope.table, &row)?;
        let inserted = sqlx::query(&sql)
            .bind(Value::Object(row))
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;
        Self::decode(inserted)
    }

    async fn update(&self, scope: Scope<'_>, id: Uuid, mut patch: Row) -> Result<Option<Row>, StoreError> {
        // The owner and server-assigned columns are never patched
        for column in ["id", OWNER_COLUMN, "created_at", "updated_at"] {
            patch.remove(column);
        }

        let sql = update_sql(scope.table, &patch)?;
        let updated = sqlx::query(&sql)
            .bind(Value::Object(patch))
            .bind(id)
            .bind(scope.owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;
        updated.map(Self::decode).transpose()
    }

    async fn delete(&self, scope: Scope<'_>, id: Uuid) -> Result<bool, StoreError> {
        let sql = format!(
            "DELETE FROM {} WHERE \"id\" = $1 AND {} = $2",
            ident(scope.table)?,
            ident(OWNER_COLUMN)?
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(scope.owner)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map_err(classify)?;
        Ok(())
    }
}
