use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{validate_identifier, value_text, Filter, Row, Scope, Store, StoreError, OWNER_COLUMN};

/// In-process store keyed by table name. Used by the integration tests and
/// by `PRESUX_STORE=memory` for local work without a database.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn owned_by(row: &Row, owner: Uuid) -> bool {
    row.get(OWNER_COLUMN).and_then(Value::as_str) == Some(owner.to_string().as_str())
}

fn has_id(row: &Row, id: Uuid) -> bool {
    row.get("id").and_then(Value::as_str) == Some(id.to_string().as_str())
}

fn matches(row: &Row, filters: &[Filter]) -> bool {
    filters
        .iter()
        .all(|f| row.get(&f.column).and_then(value_text).as_deref() == Some(f.value.as_str()))
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(&self, scope: Scope<'_>, filters: &[Filter], order_by: &str) -> Result<Vec<Row>, StoreError> {
        validate_identifier(scope.table)?;
        validate_identifier(order_by)?;

        let tables = self.tables.read().await;
        let mut rows: Vec<Row> = tables
            .get(scope.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| owned_by(row, scope.owner) && matches(row, filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        // Case-insensitive like a database collation, bytes as tie-break
        rows.sort_by(|a, b| {
            let key = |row: &Row| row.get(order_by).and_then(value_text);
            let (ka, kb) = (key(a), key(b));
            let folded = |k: &Option<String>| k.as_deref().map(str::to_lowercase);
            folded(&ka)
                .cmp(&folded(&kb))
                .then_with(|| ka.cmp(&kb))
                .then_with(|| key_id(a).cmp(&key_id(b)))
        });
        Ok(rows)
    }

    async fn insert(&self, scope: Scope<'_>, mut row: Row) -> Result<Row, StoreError> {
        validate_identifier(scope.table)?;

        let now = Value::String(Utc::now().to_rfc3339());
        row.entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        row.insert(OWNER_COLUMN.to_string(), Value::String(scope.owner.to_string()));
        row.insert("created_at".to_string(), now.clone());
        row.insert("updated_at".to_string(), now);

        let mut tables = self.tables.write().await;
        tables.entry(scope.table.to_string()).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, scope: Scope<'_>, id: Uuid, patch: Row) -> Result<Option<Row>, StoreError> {
        validate_identifier(scope.table)?;

        let mut tables = self.tables.write().await;
        let Some(row) = tables
            .get_mut(scope.table)
            .and_then(|rows| rows.iter_mut().find(|row| has_id(row, id) && owned_by(row, scope.owner)))
        else {
            return Ok(None);
        };

        for (column, value) in patch {
            if matches!(column.as_str(), "id" | OWNER_COLUMN | "created_at" | "updated_at") {
                continue;
            }
            row.insert(column, value);
        }
        row.insert("updated_at".to_string(), Value::String(Utc::now().to_rfc3339()));
        Ok(Some(row.clone()))
    }

    async fn delete(&self, scope: Scope<'_>, id: Uuid) -> Result<bool, StoreError> {
        validate_identifier(scope.table)?;

        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(scope.table) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|row| !(has_id(row, id) && owned_by(row, scope.owner)));
        Ok(rows.len() != before)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

fn key_id(row: &Row) -> Option<String> {
    row.get("id").and_then(value_text)
}
