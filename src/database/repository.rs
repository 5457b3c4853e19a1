use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use super::{Filter, Row, Scope, Store, StoreError};
use crate::models::{Resource, Schema};

/// Typed, owner-scoped access to the table of one [`Resource`].
pub struct Repository<R: Resource> {
    store: Arc<dyn Store>,
    owner: Uuid,
    _resource: PhantomData<R>,
}

impl<R: Resource> Repository<R> {
    pub fn new(store: Arc<dyn Store>, owner: Uuid) -> Self {
        Self {
            store,
            owner,
            _resource: PhantomData,
        }
    }

    fn scope(&self) -> Scope<'static> {
        Scope::new(R::TABLE, self.owner)
    }

    fn decode(row: Row) -> Result<R::Record, StoreError> {
        serde_json::from_value(Value::Object(row)).map_err(|e| StoreError::Malformed(format!("{}: {}", R::TABLE, e)))
    }

    pub async fn select_all(&self) -> Result<Vec<R::Record>, StoreError> {
        self.select_where(&[]).await
    }

    pub async fn select_where(&self, filters: &[Filter]) -> Result<Vec<R::Record>, StoreError> {
        self.store
            .select(self.scope(), filters, R::ORDER_BY)
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    pub async fn select_id(&self, id: Uuid) -> Result<Option<R::Record>, StoreError> {
        let rows = self.select_where(&[Filter::eq("id", id)]).await?;
        Ok(rows.into_iter().next())
    }

    /// Whether another of the owner's records already uses `name`
    pub async fn name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, StoreError> {
        let rows = self
            .store
            .select(self.scope(), &[Filter::eq("name", name)], "id")
            .await?;
        let except = except.map(|id| id.to_string());
        Ok(rows
            .iter()
            .any(|row| row.get("id").and_then(Value::as_str) != except.as_deref()))
    }

    /// Whether `id` is a row of the owner's in `table`
    pub async fn owns(&self, table: &str, id: Uuid) -> Result<bool, StoreError> {
        let rows = self
            .store
            .select(Scope::new(table, self.owner), &[Filter::eq("id", id)], "id")
            .await?;
        Ok(!rows.is_empty())
    }

    /// Whether any of the owner's rows in [`Resource::REFERENCED_BY`] still point at `id`
    pub async fn is_referenced(&self, id: Uuid) -> Result<bool, StoreError> {
        for (table, column) in R::REFERENCED_BY {
            let rows = self
                .store
                .select(Scope::new(table, self.owner), &[Filter::eq(*column, id)], "id")
                .await?;
            if !rows.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Delete the owner's rows in [`Resource::CASCADE`] that point at `id`;
    /// returns how many went
    pub async fn delete_dependents(&self, id: Uuid) -> Result<usize, StoreError> {
        let mut deleted = 0;
        for (table, column) in R::CASCADE {
            let scope = Scope::new(table, self.owner);
            let rows = self.store.select(scope, &[Filter::eq(*column, id)], "id").await?;
            for row in rows {
                let child = row
                    .get("id")
                    .and_then(Value::as_str)
                    .and_then(|raw| Uuid::parse_str(raw).ok())
                    .ok_or_else(|| StoreError::Malformed(format!("{}: row without id", table)))?;
                if self.store.delete(scope, child).await? {
                    deleted += 1;
                }
            }
        }
        Ok(deleted)
    }

    pub async fn insert<S: Schema>(&self, input: &S) -> Result<R::Record, StoreError> {
        let row = match serde_json::to_value(input) {
            Ok(Value::Object(row)) => row,
            Ok(_) => return Err(StoreError::Malformed(format!("{}: payload is not an object", R::TABLE))),
            Err(e) => return Err(StoreError::Malformed(e.to_string())),
        };
        self.insert_row(row).await
    }

    pub async fn insert_row(&self, row: Row) -> Result<R::Record, StoreError> {
        let inserted = self.store.insert(self.scope(), row).await?;
        Self::decode(inserted)
    }

    pub async fn update(&self, id: Uuid, patch: Row) -> Result<Option<R::Record>, StoreError> {
        self.store
            .update(self.scope(), id, patch)
            .await?
            .map(Self::decode)
            .transpose()
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.store.delete(self.scope(), id).await
    }
}
