//! Integration tests for the stage/confirm/cancel workflow of role changes.
//!
//! Uses a recording accessor so every remote call the manager makes is
//! visible to the assertions.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sicoop_core::{
    ActionKey, BusyTransition, Error, ListQuery, PendingState, RecordId, RemoteCollection,
    RemoteListManager, Result, User, UserDraft, UserRole,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    List,
    SetStatus(String, String),
    Other(&'static str),
}

struct RecordingUsers {
    rows: Mutex<Vec<User>>,
    calls: Mutex<Vec<Call>>,
    reject_writes: bool,
}

impl RecordingUsers {
    fn new(rows: Vec<User>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows),
            calls: Mutex::new(Vec::new()),
            reject_writes: false,
        })
    }

    fn rejecting(rows: Vec<User>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows),
            calls: Mutex::new(Vec::new()),
            reject_writes: true,
        })
    }

    fn writes(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c != Call::List)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RemoteCollection<User> for RecordingUsers {
    async fn list(&self, _query: &ListQuery) -> Result<Vec<User>> {
        self.calls.lock().unwrap().push(Call::List);
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn create(&self, _draft: &UserDraft) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Other("create"));
        Ok(())
    }

    async fn update(&self, _id: &RecordId, _draft: &UserDraft) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Other("update"));
        Ok(())
    }

    async fn delete(&self, _id: &RecordId) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Other("delete"));
        Ok(())
    }

    async fn set_status(&self, id: &RecordId, role: UserRole) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::SetStatus(id.to_string(), role.to_string()));
        if self.reject_writes {
            return Err(Error::Forbidden("Permissão negada".into()));
        }
        let mut rows = self.rows.lock().unwrap();
        if let Some(user) = rows.iter_mut().find(|u| &u.id == id) {
            user.role = role;
        }
        Ok(())
    }

    async fn assign(&self, _id: &RecordId, _assignee: Option<RecordId>) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Other("assign"));
        Ok(())
    }
}

fn users() -> Vec<User> {
    vec![
        User {
            id: "1".into(),
            email: "ana@sicoop.com".into(),
            full_name: Some("Ana".into()),
            role: UserRole::Client,
            created_at: None,
        },
        User {
            id: "2".into(),
            email: "bruno@sicoop.com".into(),
            full_name: None,
            role: UserRole::Client,
            created_at: None,
        },
    ]
}

async fn manager_for(source: Arc<RecordingUsers>) -> RemoteListManager<User> {
    let mut manager = RemoteListManager::new(source as Arc<dyn RemoteCollection<User>>);
    manager.load().await.expect("initial load");
    manager
}

#[tokio::test]
async fn test_confirm_sends_exactly_one_update_with_pending_value() {
    let source = RecordingUsers::new(users());
    let mut manager = manager_for(source.clone()).await;
    let one = RecordId::from("1");

    manager.propose_status(&one, UserRole::Technician).unwrap();
    manager.confirm(&one).await.unwrap();

    assert_eq!(
        source.writes(),
        vec![Call::SetStatus("1".into(), "technician".into())]
    );
    assert_eq!(manager.pending_state(&one), PendingState::Committed);
}

#[tokio::test]
async fn test_confirm_leaves_other_pending_rows_untouched() {
    let source = RecordingUsers::new(users());
    let mut manager = manager_for(source.clone()).await;
    let one = RecordId::from("1");
    let two = RecordId::from("2");

    manager.propose_status(&one, UserRole::Technician).unwrap();
    manager.propose_status(&two, UserRole::Admin).unwrap();
    manager.confirm(&one).await.unwrap();

    assert_eq!(manager.pending_state(&two), PendingState::Pending(&UserRole::Admin));
    assert_eq!(source.writes().len(), 1);
}

#[tokio::test]
async fn test_cancel_makes_no_remote_call() {
    let source = RecordingUsers::new(users());
    let mut manager = manager_for(source.clone()).await;
    let one = RecordId::from("1");

    manager.propose_status(&one, UserRole::Admin).unwrap();
    manager.cancel(&one);

    assert!(source.writes().is_empty());
    assert_eq!(manager.pending_state(&one), PendingState::Committed);
    assert_eq!(manager.get(&one).unwrap().role, UserRole::Client);
}

#[tokio::test]
async fn test_rejected_confirm_keeps_pending_and_reports() {
    let source = RecordingUsers::rejecting(users());
    let mut manager = manager_for(source.clone()).await;
    let one = RecordId::from("1");
    let mut transitions = manager.dispatcher().subscribe();

    manager.propose_status(&one, UserRole::Admin).unwrap();
    let err = manager.confirm(&one).await.unwrap_err();

    assert!(err.is_permission());
    assert_eq!(manager.pending_state(&one), PendingState::Pending(&UserRole::Admin));
    assert_eq!(
        manager.dispatcher().last_error(&ActionKey::row("1")).as_deref(),
        Some("Permissão negada")
    );

    let mut seen = Vec::new();
    while let Ok(BusyTransition { busy, .. }) = transitions.try_recv() {
        seen.push(busy);
    }
    assert_eq!(seen, vec![true, false]);
}
