//! In-memory store with the same collection semantics as the PostgREST layer.
//!
//! Rows are kept as JSON objects per collection name, so one store serves
//! every record type. Used by the API server when no Supabase project is
//! configured, and by tests.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use tracing::debug;
use uuid::Uuid;

use sicoop_core::filter::term_matches;
use sicoop_core::{
    CollectionProvider, Error, ListQuery, Record, RecordId, RemoteCollection, Result,
};

type Tables = HashMap<String, Vec<Map<String, JsonValue>>>;

/// Shared in-memory tables. Cloning shares the data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert fully formed rows, keeping their ids.
    pub fn seed<R: Record>(&self, rows: &[R]) -> Result<()> {
        let mut tables = self.write();
        let table = tables.entry(R::COLLECTION.to_string()).or_default();
        for row in rows {
            table.push(to_object(row)?);
        }
        Ok(())
    }

    /// Typed snapshot of a collection in insertion order.
    pub fn rows<R: Record>(&self) -> Result<Vec<R>> {
        let tables = self.read();
        tables
            .get(R::COLLECTION)
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        serde_json::from_value(JsonValue::Object(row.clone())).map_err(Error::from)
                    })
                    .collect()
            })
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    pub fn count(&self, collection: &str) -> usize {
        self.read().get(collection).map(Vec::len).unwrap_or(0)
    }

    /// Append a row built from `draft`, assigning `id` and `created_at`.
    pub fn insert<T: Serialize + ?Sized>(&self, collection: &str, draft: &T) -> Result<RecordId> {
        let mut row = to_object(draft)?;
        let id = RecordId::from(Uuid::new_v4());
        row.insert("id".into(), JsonValue::String(id.to_string()));
        row.entry("created_at")
            .or_insert_with(|| JsonValue::String(Utc::now().to_rfc3339()));
        self.write()
            .entry(collection.to_string())
            .or_default()
            .push(row);
        Ok(id)
    }

    /// Merge `fields` into the row with `id`.
    pub fn patch(
        &self,
        collection: &str,
        id: &RecordId,
        fields: Map<String, JsonValue>,
    ) -> Result<()> {
        let mut tables = self.write();
        let row = tables
            .get_mut(collection)
            .and_then(|rows| rows.iter_mut().find(|row| row_id(row) == Some(id.as_str())))
            .ok_or_else(|| Error::NotFound(format!("{} {}", collection, id)))?;
        for (key, value) in fields {
            row.insert(key, value);
        }
        Ok(())
    }

    pub fn remove(&self, collection: &str, id: &RecordId) -> Result<()> {
        let mut tables = self.write();
        let rows = tables
            .get_mut(collection)
            .ok_or_else(|| Error::NotFound(format!("{} {}", collection, id)))?;
        let before = rows.len();
        rows.retain(|row| row_id(row) != Some(id.as_str()));
        if rows.len() == before {
            return Err(Error::NotFound(format!("{} {}", collection, id)));
        }
        Ok(())
    }

    /// Rows matching the equality filters and search, in query order.
    fn select(
        &self,
        collection: &str,
        query: &ListQuery,
        search_columns: &[&str],
    ) -> Vec<Map<String, JsonValue>> {
        let tables = self.read();
        let mut rows: Vec<Map<String, JsonValue>> = tables
            .get(collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| {
                        query
                            .equals
                            .iter()
                            .all(|(column, value)| column_text(row.get(column)) == *value)
                    })
                    .filter(|row| match query.search.as_deref() {
                        Some(term) => {
                            let fields: Vec<String> = search_columns
                                .iter()
                                .map(|column| column_text(row.get(*column)))
                                .collect();
                            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
                            term_matches(&fields, term)
                        }
                        None => true,
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_json(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }
        rows
    }
}

fn to_object<T: Serialize + ?Sized>(value: &T) -> Result<Map<String, JsonValue>> {
    match serde_json::to_value(value)? {
        JsonValue::Object(map) => Ok(map),
        other => Err(Error::Serialization(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

fn row_id(row: &Map<String, JsonValue>) -> Option<&str> {
    row.get("id").and_then(JsonValue::as_str)
}

/// Text form of a column as PostgREST compares it in `eq.` filters.
fn column_text(value: Option<&JsonValue>) -> String {
    match value {
        None | Some(JsonValue::Null) => "null".to_string(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Nulls sort last, like PostgreSQL's default for ascending order.
fn compare_json(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(JsonValue::Bool(x)), Some(JsonValue::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => column_text(Some(x)).cmp(&column_text(Some(y))),
    }
}

impl CollectionProvider for MemoryStore {
    fn collection<R: Record>(&self) -> Arc<dyn RemoteCollection<R>> {
        Arc::new(MemoryCollection::<R>::new(self.clone()))
    }
}

/// One collection of a [`MemoryStore`].
pub struct MemoryCollection<R> {
    store: MemoryStore,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> MemoryCollection<R> {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Record> RemoteCollection<R> for MemoryCollection<R> {
    async fn list(&self, query: &ListQuery) -> Result<Vec<R>> {
        let rows = self.store.select(R::COLLECTION, query, R::SEARCH_COLUMNS);
        debug!(
            subsystem = "db",
            component = "memory",
            op = "list",
            collection = R::COLLECTION,
            result_count = rows.len(),
            "Listed rows"
        );
        rows.into_iter()
            .map(|row| serde_json::from_value(JsonValue::Object(row)).map_err(Error::from))
            .collect()
    }

    async fn create(&self, draft: &R::Draft) -> Result<()> {
        let id = self.store.insert(R::COLLECTION, draft)?;
        debug!(
            subsystem = "db",
            component = "memory",
            op = "create",
            collection = R::COLLECTION,
            record_id = %id,
            "Row created"
        );
        Ok(())
    }

    async fn update(&self, id: &RecordId, draft: &R::Draft) -> Result<()> {
        self.store.patch(R::COLLECTION, id, to_object(draft)?)
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        self.store.remove(R::COLLECTION, id)
    }

    async fn set_status(&self, id: &RecordId, status: R::Status) -> Result<()> {
        let mut fields = Map::new();
        fields.insert(R::STATUS_FIELD.to_string(), R::status_value(status));
        self.store.patch(R::COLLECTION, id, fields)
    }

    async fn assign(&self, id: &RecordId, assignee: Option<RecordId>) -> Result<()> {
        let field = R::ASSIGNEE_FIELD.ok_or_else(|| {
            Error::InvalidInput(format!("{} rows cannot be assigned", R::COLLECTION))
        })?;
        let mut fields = Map::new();
        fields.insert(
            field.to_string(),
            assignee
                .map(|a| JsonValue::String(a.to_string()))
                .unwrap_or(JsonValue::Null),
        );
        self.store.patch(R::COLLECTION, id, fields)
    }
}
