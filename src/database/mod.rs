pub mod memory;
pub mod postgres;
pub mod repository;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::Repository;

/// Column holding the owner identifier on every table
pub const OWNER_COLUMN: &str = "user_id";

/// A JSON object as stored: column name → value
pub type Row = Map<String, Value>;

/// Errors from a [`Store`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Malformed row: {0}")]
    Malformed(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Table plus owner: every store call is scoped to one owner's rows.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub table: &'a str,
    pub owner: Uuid,
}

impl<'a> Scope<'a> {
    pub fn new(table: &'a str, owner: Uuid) -> Self {
        Self { table, owner }
    }
}

/// Equality filter on a column; values are compared in their text form.
#[derive(Debug, Clone)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl ToString) -> Self {
        Self {
            column: column.into(),
            value: value.to_string(),
        }
    }
}

/// The external store. Implementations assign `id` (unless the row carries
/// one), `created_at` and `updated_at`, and never read or write rows of
/// another owner.
#[async_trait]
pub trait Store: Send + Sync {
    /// Rows matching every filter, ordered ascending by `order_by`
    async fn select(&self, scope: Scope<'_>, filters: &[Filter], order_by: &str) -> Result<Vec<Row>, StoreError>;

    async fn insert(&self, scope: Scope<'_>, row: Row) -> Result<Row, StoreError>;

    /// `None` when no row with that id belongs to the owner
    async fn update(&self, scope: Scope<'_>, id: Uuid, patch: Row) -> Result<Option<Row>, StoreError>;

    /// `false` when no row with that id belongs to the owner
    async fn delete(&self, scope: Scope<'_>, id: Uuid) -> Result<bool, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Identifiers are interpolated into SQL, so only plain snake_case names pass.
pub fn validate_identifier(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {
            chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        }
        _ => false,
    };
    if valid && name.len() <= 63 {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

/// Text form used for filter comparison and ordering
pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
