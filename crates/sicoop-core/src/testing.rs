//! Recording collection double for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::filter::term_matches;
use crate::models::RecordId;
use crate::traits::{ListQuery, Record, RemoteCollection};

struct StubState<R: Record> {
    rows: Vec<R>,
    list_calls: usize,
    last_query: Option<ListQuery>,
    status_calls: Vec<(RecordId, R::Status)>,
    updates: Vec<(RecordId, serde_json::Value)>,
    created: usize,
    fail_list: Option<String>,
    fail_write: Option<String>,
}

/// Holds rows in memory, records every call and fails on request.
pub struct StubCollection<R: Record> {
    state: Mutex<StubState<R>>,
}

impl<R: Record> StubCollection<R> {
    pub fn with_rows(rows: Vec<R>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(StubState {
                rows,
                list_calls: 0,
                last_query: None,
                status_calls: Vec::new(),
                updates: Vec::new(),
                created: 0,
                fail_list: None,
                fail_write: None,
            }),
        })
    }

    pub fn fail_next_list(&self, msg: &str) {
        self.state.lock().unwrap().fail_list = Some(msg.to_string());
    }

    pub fn fail_next_write(&self, msg: &str) {
        self.state.lock().unwrap().fail_write = Some(msg.to_string());
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn status_calls(&self) -> Vec<(RecordId, R::Status)> {
        self.state.lock().unwrap().status_calls.clone()
    }

    /// Drafts passed to `update`, as the JSON body a store would receive.
    pub fn updates(&self) -> Vec<(RecordId, serde_json::Value)> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn created(&self) -> usize {
        self.state.lock().unwrap().created
    }

    pub fn last_query(&self) -> Option<ListQuery> {
        self.state.lock().unwrap().last_query.clone()
    }

    fn write<F>(&self, id: &RecordId, apply: F) -> Result<()>
    where
        F: FnOnce(&mut StubState<R>, usize),
    {
        let mut state = self.state.lock().unwrap();
        if let Some(msg) = state.fail_write.take() {
            return Err(Error::Remote(msg));
        }
        let index = state
            .rows
            .iter()
            .position(|row| row.id() == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        apply(&mut state, index);
        Ok(())
    }
}

#[async_trait]
impl<R: Record> RemoteCollection<R> for StubCollection<R> {
    async fn list(&self, query: &ListQuery) -> Result<Vec<R>> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        state.last_query = Some(query.clone());
        if let Some(msg) = state.fail_list.take() {
            return Err(Error::Remote(msg));
        }
        let term = query.search.clone().unwrap_or_default();
        Ok(state
            .rows
            .iter()
            .filter(|row| term_matches(&row.search_fields(), &term))
            .cloned()
            .collect())
    }

    async fn create(&self, _draft: &R::Draft) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(msg) = state.fail_write.take() {
            return Err(Error::Remote(msg));
        }
        state.created += 1;
        Ok(())
    }

    async fn update(&self, id: &RecordId, draft: &R::Draft) -> Result<()> {
        let body = serde_json::to_value(draft)?;
        self.write(id, |state, _| {
            state.updates.push((id.clone(), body));
        })
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        self.write(id, |state, index| {
            state.rows.remove(index);
        })
    }

    async fn set_status(&self, id: &RecordId, status: R::Status) -> Result<()> {
        self.write(id, |state, index| {
            state.status_calls.push((id.clone(), status));
            state.rows[index].set_status(status);
        })
    }

    async fn assign(&self, id: &RecordId, assignee: Option<RecordId>) -> Result<()> {
        self.write(id, |state, index| {
            state.rows[index].set_assignee(assignee);
        })
    }
}
