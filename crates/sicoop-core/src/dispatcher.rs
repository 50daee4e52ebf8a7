//! Mutation dispatcher: one remote write per action key, with a busy flag
//! and a captured error message.
//!
//! The busy flag is set before the write starts and cleared by a drop guard,
//! so it is released on success, on failure and when the future is dropped
//! mid-flight. Every change of a busy flag is broadcast as a
//! [`BusyTransition`] so a view can disable the triggering control.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::RecordId;

const TRANSITION_CHANNEL_CAPACITY: usize = 64;

/// Identity of a user action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKey {
    /// Per-row action (assign, status change, delete).
    Row(RecordId),
    /// The screen's create/edit form.
    Form,
    /// Screen-wide actions such as "process pending notifications".
    Named(String),
}

impl ActionKey {
    pub fn row(id: impl Into<RecordId>) -> Self {
        Self::Row(id.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl std::fmt::Display for ActionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Row(id) => write!(f, "row:{}", id),
            Self::Form => write!(f, "form"),
            Self::Named(name) => write!(f, "{}", name),
        }
    }
}

/// A busy flag flipped on or off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusyTransition {
    pub key: ActionKey,
    pub busy: bool,
}

#[derive(Debug, Default)]
struct DispatchState {
    busy: HashSet<ActionKey>,
    errors: HashMap<ActionKey, String>,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<DispatchState>,
    transitions: broadcast::Sender<BusyTransition>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, DispatchState> {
        // A panic while holding the lock leaves plain sets behind; keep going.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Wraps remote writes with busy tracking and error capture.
///
/// Cloning shares the same state, so a renderer can hold a clone and read
/// busy flags while the owning screen awaits a write.
#[derive(Debug, Clone)]
pub struct MutationDispatcher {
    inner: Arc<Inner>,
}

impl Default for MutationDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationDispatcher {
    pub fn new() -> Self {
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(DispatchState::default()),
                transitions,
            }),
        }
    }

    /// Run `action` under `key`.
    ///
    /// Refuses with [`Error::Busy`] when the same key is already in flight;
    /// different keys run independently. On failure the user-facing message
    /// is stored for the key and the error is returned unchanged.
    pub async fn run<T, F>(&self, key: ActionKey, action: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _guard = self.begin(key.clone())?;
        let started = Instant::now();

        let outcome = action.await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(_) => debug!(
                subsystem = "core",
                component = "dispatcher",
                action_key = %key,
                duration_ms,
                success = true,
                "Mutation completed"
            ),
            Err(e) => {
                warn!(
                    subsystem = "core",
                    component = "dispatcher",
                    action_key = %key,
                    duration_ms,
                    error = %e,
                    "Mutation failed"
                );
                self.inner.lock().errors.insert(key, e.user_message());
            }
        }

        outcome
    }

    fn begin(&self, key: ActionKey) -> Result<BusyGuard> {
        {
            let mut state = self.inner.lock();
            if state.busy.contains(&key) {
                return Err(Error::Busy(format!("{} is already in progress", key)));
            }
            state.busy.insert(key.clone());
            state.errors.remove(&key);
        }
        let _ = self.inner.transitions.send(BusyTransition {
            key: key.clone(),
            busy: true,
        });
        Ok(BusyGuard {
            inner: Arc::clone(&self.inner),
            key,
        })
    }

    pub fn is_busy(&self, key: &ActionKey) -> bool {
        self.inner.lock().busy.contains(key)
    }

    pub fn any_busy(&self) -> bool {
        !self.inner.lock().busy.is_empty()
    }

    pub fn busy_keys(&self) -> Vec<ActionKey> {
        self.inner.lock().busy.iter().cloned().collect()
    }

    /// Message of the last failed run for `key`, cleared when the key runs again.
    pub fn last_error(&self, key: &ActionKey) -> Option<String> {
        self.inner.lock().errors.get(key).cloned()
    }

    pub fn clear_error(&self, key: &ActionKey) {
        self.inner.lock().errors.remove(key);
    }

    /// Drop the stored errors of the given rows.
    pub fn clear_row_errors<'a>(&self, ids: impl IntoIterator<Item = &'a RecordId>) {
        let mut state = self.inner.lock();
        for id in ids {
            state.errors.remove(&ActionKey::Row(id.clone()));
        }
    }

    /// Stream of busy-flag changes.
    pub fn subscribe(&self) -> broadcast::Receiver<BusyTransition> {
        self.inner.transitions.subscribe()
    }
}

struct BusyGuard {
    inner: Arc<Inner>,
    key: ActionKey,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.inner.lock().busy.remove(&self.key);
        let _ = self.inner.transitions.send(BusyTransition {
            key: self.key.clone(),
            busy: false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut broadcast::Receiver<BusyTransition>) -> Vec<bool> {
        let mut seen = Vec::new();
        while let Ok(t) = rx.try_recv() {
            seen.push(t.busy);
        }
        seen
    }

    #[tokio::test]
    async fn test_busy_flag_cycles_once_on_success() {
        let dispatcher = MutationDispatcher::new();
        let mut rx = dispatcher.subscribe();
        let key = ActionKey::row("1");

        assert!(!dispatcher.is_busy(&key));
        let watcher = dispatcher.clone();
        let watched_key = key.clone();
        let value = dispatcher
            .run(key.clone(), async move {
                assert!(watcher.is_busy(&watched_key));
                Ok(7)
            })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert!(!dispatcher.is_busy(&key));
        assert_eq!(drain(&mut rx), vec![true, false]);
    }

    #[tokio::test]
    async fn test_busy_flag_cycles_once_on_failure() {
        let dispatcher = MutationDispatcher::new();
        let mut rx = dispatcher.subscribe();
        let key = ActionKey::Form;

        let result: Result<()> = dispatcher
            .run(key.clone(), async { Err(Error::Remote("duplicate key".into())) })
            .await;

        assert!(result.is_err());
        assert!(!dispatcher.is_busy(&key));
        assert_eq!(drain(&mut rx), vec![true, false]);
        assert_eq!(
            dispatcher.last_error(&key).as_deref(),
            Some("Remote error: duplicate key")
        );
    }

    #[tokio::test]
    async fn test_same_key_reentry_is_refused() {
        let dispatcher = MutationDispatcher::new();
        let key = ActionKey::row("1");
        let inner = dispatcher.clone();
        let inner_key = key.clone();

        let outcome = dispatcher
            .run(key.clone(), async move {
                let nested: Result<()> = inner.run(inner_key, async { Ok(()) }).await;
                assert!(matches!(nested, Err(Error::Busy(_))));
                Ok(())
            })
            .await;

        assert!(outcome.is_ok());
        assert!(!dispatcher.is_busy(&key));
    }

    #[tokio::test]
    async fn test_different_keys_run_independently() {
        let dispatcher = MutationDispatcher::new();
        let inner = dispatcher.clone();

        let outcome = dispatcher
            .run(ActionKey::row("1"), async move {
                inner.run(ActionKey::row("2"), async { Ok(()) }).await
            })
            .await;

        assert!(outcome.is_ok());
        assert!(!dispatcher.any_busy());
    }

    #[tokio::test]
    async fn test_error_cleared_on_next_run() {
        let dispatcher = MutationDispatcher::new();
        let key = ActionKey::named("process_pending_notifications");

        let _: Result<()> = dispatcher
            .run(key.clone(), async { Err(Error::Request("timeout".into())) })
            .await;
        assert!(dispatcher.last_error(&key).is_some());

        dispatcher.run(key.clone(), async { Ok(()) }).await.unwrap();
        assert!(dispatcher.last_error(&key).is_none());
    }

    #[tokio::test]
    async fn test_clear_row_errors_keeps_other_keys() {
        let dispatcher = MutationDispatcher::new();
        for key in [ActionKey::row("1"), ActionKey::row("2"), ActionKey::Form] {
            let _: Result<()> = dispatcher
                .run(key, async { Err(Error::Remote("down".into())) })
                .await;
        }

        dispatcher.clear_row_errors([&RecordId::from("1")]);

        assert!(dispatcher.last_error(&ActionKey::row("1")).is_none());
        assert!(dispatcher.last_error(&ActionKey::row("2")).is_some());
        assert!(dispatcher.last_error(&ActionKey::Form).is_some());
    }

    #[tokio::test]
    async fn test_dropped_future_releases_flag() {
        let dispatcher = MutationDispatcher::new();
        let key = ActionKey::row("slow");

        let fut = dispatcher.run(key.clone(), async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok(())
        });
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(10), fut).await;

        assert!(timed_out.is_err());
        assert!(!dispatcher.is_busy(&key));
    }

    #[test]
    fn test_action_key_display() {
        assert_eq!(ActionKey::row("9").to_string(), "row:9");
        assert_eq!(ActionKey::Form.to_string(), "form");
        assert_eq!(ActionKey::named("bulk").to_string(), "bulk");
    }
}
