//! Core traits for Sicoop abstractions.
//!
//! These traits define the interfaces the remote store adapters must
//! satisfy, enabling the PostgREST client, the in-memory store and test
//! doubles to sit behind the same list manager.

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::{ProcessingResponse, RecordId};
use crate::pagination::{Page, PageRequest};

// =============================================================================
// RECORD
// =============================================================================

/// Remote procedure that replaces a plain status PATCH.
///
/// Called as `POST rpc/{function}` with body `{id_arg: id, value_arg: status}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusProcedure {
    pub function: &'static str,
    pub id_arg: &'static str,
    pub value_arg: &'static str,
}

/// A row type held by a named remote collection.
pub trait Record: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Closed status (or role) enumeration of the row.
    type Status: Copy
        + Eq
        + Hash
        + Debug
        + Display
        + FromStr<Err = String>
        + Serialize
        + Send
        + Sync
        + 'static;

    /// Writable fields sent on create and update.
    type Draft: Serialize + Debug + Send + Sync;

    /// Remote collection (table) name.
    const COLLECTION: &'static str;

    /// Column holding the status.
    const STATUS_FIELD: &'static str;

    /// Column holding the assignee, for collections that support `assign`.
    const ASSIGNEE_FIELD: Option<&'static str> = None;

    /// Procedure used instead of a PATCH when the status changes.
    const STATUS_PROCEDURE: Option<StatusProcedure> = None;

    /// Columns searched server-side by a paginated list.
    const SEARCH_COLUMNS: &'static [&'static str] = &[];

    fn id(&self) -> &RecordId;

    /// Textual fields matched by the free-text search term.
    fn search_fields(&self) -> Vec<&str>;

    fn status(&self) -> Self::Status;

    fn set_status(&mut self, status: Self::Status);

    /// User the row is assigned to or belongs to.
    fn assignee(&self) -> Option<&RecordId> {
        None
    }

    fn set_assignee(&mut self, _assignee: Option<RecordId>) {}

    fn created_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Column value written for a status.
    fn status_value(status: Self::Status) -> JsonValue {
        serde_json::to_value(status).unwrap_or(JsonValue::Null)
    }
}

/// Rows that can label a reference field of another collection.
pub trait Labeled {
    fn label(&self) -> String;
}

// =============================================================================
// LIST QUERY
// =============================================================================

/// Column ordering of a list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

/// Server-side filters for `list`.
///
/// Only equality filters, a single ordering and a search term are
/// modelled; everything else is filtered locally by the view filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Column equality filters (AND).
    pub equals: Vec<(String, String)>,
    pub order: Option<OrderBy>,
    /// Case-insensitive substring search over the record's search columns.
    pub search: Option<String>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest rows first, the order every manager screen uses.
    pub fn newest_first() -> Self {
        Self::new().order_by("created_at", false)
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Display) -> Self {
        self.equals.push((column.into(), value.to_string()));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(OrderBy {
            column: column.into(),
            ascending,
        });
        self
    }

    /// Blank terms clear the search.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        let trimmed = term.trim();
        self.search = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }
}

// =============================================================================
// REMOTE COLLECTION
// =============================================================================

/// Access to one remote collection.
///
/// Every call is a single request: no retry, no idempotency (calling
/// `create` twice inserts two rows). `Ok(())` reports success; the error
/// carries the message shown to the user.
#[async_trait]
pub trait RemoteCollection<R: Record>: Send + Sync {
    /// Fetch the rows matching the server-side query.
    async fn list(&self, query: &ListQuery) -> Result<Vec<R>>;

    /// Fetch one page plus the total count.
    async fn list_page(&self, query: &ListQuery, page: PageRequest) -> Result<Page<R>> {
        let rows = self.list(query).await?;
        let total = rows.len() as u64;
        let items = rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.page_size as usize)
            .collect();
        Ok(Page::new(items, total, page))
    }

    /// Insert a new row.
    async fn create(&self, draft: &R::Draft) -> Result<()>;

    /// Overwrite the writable fields of a row.
    async fn update(&self, id: &RecordId, draft: &R::Draft) -> Result<()>;

    /// Delete a row.
    async fn delete(&self, id: &RecordId) -> Result<()>;

    /// Change the status (or role) of a row.
    async fn set_status(&self, id: &RecordId, status: R::Status) -> Result<()>;

    /// Assign a row to a user, or clear the assignee with `None`.
    async fn assign(&self, id: &RecordId, assignee: Option<RecordId>) -> Result<()>;
}

/// Hands out collection accessors for any record type.
pub trait CollectionProvider: Send + Sync {
    fn collection<R: Record>(&self) -> Arc<dyn RemoteCollection<R>>;
}

// =============================================================================
// NOTIFICATION PROCESSING
// =============================================================================

/// Runs one batch of pending notification deliveries.
#[async_trait]
pub trait NotificationProcessor: Send + Sync {
    async fn process_pending(&self) -> Result<ProcessingResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_builder() {
        let query = ListQuery::newest_first()
            .eq("status", "pendente")
            .search("  João ");

        assert_eq!(query.equals, vec![("status".into(), "pendente".into())]);
        assert_eq!(
            query.order,
            Some(OrderBy {
                column: "created_at".into(),
                ascending: false
            })
        );
        assert_eq!(query.search.as_deref(), Some("João"));
    }

    #[test]
    fn test_blank_search_clears() {
        let query = ListQuery::new().search("abc").search("   ");
        assert!(query.search.is_none());
    }
}
