//! Transient notification queue.
//!
//! A bounded FIFO of `{message, kind, expires_at}` rendered by the shell.
//! Expired toasts are removed by a single eviction pass driven from the
//! UI timer; pushing the same message twice in a row refreshes the last
//! toast instead of stacking a duplicate.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::defaults;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub expires_at: Instant,
}

#[derive(Debug, Clone)]
pub struct ToastQueue {
    entries: VecDeque<Toast>,
    ttl: Duration,
    limit: usize,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(defaults::TOAST_TTL_MS),
            defaults::TOAST_LIMIT,
        )
    }
}

impl ToastQueue {
    pub fn new(ttl: Duration, limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            ttl,
            limit: limit.max(1),
        }
    }

    pub fn push(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.push_at(message, kind, Instant::now());
    }

    pub fn push_at(&mut self, message: impl Into<String>, kind: ToastKind, now: Instant) {
        let message = message.into();
        if let Some(last) = self.entries.back_mut() {
            if last.message == message && last.kind == kind {
                last.expires_at = now + self.ttl;
                return;
            }
        }
        self.entries.push_back(Toast {
            message,
            kind,
            expires_at: now + self.ttl,
        });
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message, ToastKind::Success);
    }

    pub fn error(&mut self, err: &Error) {
        self.push(err.user_message(), ToastKind::Error);
    }

    /// Remove every toast whose expiry is at or before `now`.
    /// Returns how many were evicted.
    pub fn evict_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|toast| toast.expires_at > now);
        before - self.entries.len()
    }

    /// Earliest expiry, for scheduling the next eviction tick.
    pub fn next_expiry(&self) -> Option<Instant> {
        self.entries.iter().map(|t| t.expires_at).min()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
