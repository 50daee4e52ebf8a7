//! Pending-change buffer for edits that need explicit confirmation.
//!
//! Each row is either `Committed` (the store's value is current) or
//! `Pending(v)` (the user picked `v` but has not confirmed yet). There is at
//! most one pending value per row; a second edit overwrites the first.

use std::collections::HashMap;

use crate::models::RecordId;

/// Confirmation state of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingState<'a, V> {
    Committed,
    Pending(&'a V),
}

/// Map from row id to the proposed, unconfirmed value.
#[derive(Debug, Clone)]
pub struct PendingChanges<V> {
    entries: HashMap<RecordId, V>,
}

impl<V> Default for PendingChanges<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V: Clone + PartialEq> PendingChanges<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a selector change for `id`.
    ///
    /// Choosing the committed value again drops the pending entry.
    pub fn propose(&mut self, id: RecordId, value: V, committed: &V) {
        if &value == committed {
            self.entries.remove(&id);
        } else {
            self.entries.insert(id, value);
        }
    }

    pub fn state(&self, id: &RecordId) -> PendingState<'_, V> {
        match self.entries.get(id) {
            Some(value) => PendingState::Pending(value),
            None => PendingState::Committed,
        }
    }

    pub fn get(&self, id: &RecordId) -> Option<&V> {
        self.entries.get(id)
    }

    pub fn is_pending(&self, id: &RecordId) -> bool {
        self.entries.contains_key(id)
    }

    /// Discard the pending value. Purely local.
    pub fn cancel(&mut self, id: &RecordId) -> Option<V> {
        self.entries.remove(id)
    }

    /// Drop the entry once the write went through; the value is now committed.
    pub fn commit(&mut self, id: &RecordId) -> Option<V> {
        self.entries.remove(id)
    }

    /// Value the selector for `id` should display.
    pub fn effective<'a>(&'a self, id: &RecordId, committed: &'a V) -> &'a V {
        self.entries.get(id).unwrap_or(committed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RecordId, &V)> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop entries whose rows disappeared from the snapshot.
    pub fn retain_ids<'a>(&mut self, live: impl IntoIterator<Item = &'a RecordId>) {
        let live: std::collections::HashSet<&RecordId> = live.into_iter().collect();
        self.entries.retain(|id, _| live.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    #[test]
    fn test_propose_moves_to_pending() {
        let mut buffer = PendingChanges::new();
        let id = RecordId::from("1");
        buffer.propose(id.clone(), UserRole::Technician, &UserRole::Client);

        assert_eq!(buffer.state(&id), PendingState::Pending(&UserRole::Technician));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_same_value_twice_keeps_one_entry() {
        let mut buffer = PendingChanges::new();
        let id = RecordId::from("1");
        buffer.propose(id.clone(), UserRole::Technician, &UserRole::Client);
        buffer.propose(id.clone(), UserRole::Technician, &UserRole::Client);

        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.get(&id), Some(&UserRole::Technician));
    }

    #[test]
    fn test_last_write_wins() {
        let mut buffer = PendingChanges::new();
        let id = RecordId::from("1");
        buffer.propose(id.clone(), UserRole::Technician, &UserRole::Client);
        buffer.propose(id.clone(), UserRole::Admin, &UserRole::Client);

        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.get(&id), Some(&UserRole::Admin));
    }

    #[test]
    fn test_reselecting_committed_value_clears() {
        let mut buffer = PendingChanges::new();
        let id = RecordId::from("1");
        buffer.propose(id.clone(), UserRole::Admin, &UserRole::Client);
        buffer.propose(id.clone(), UserRole::Client, &UserRole::Client);

        assert_eq!(buffer.state(&id), PendingState::Committed);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_cancel_and_commit_remove_only_their_id() {
        let mut buffer = PendingChanges::new();
        buffer.propose("1".into(), UserRole::Admin, &UserRole::Client);
        buffer.propose("2".into(), UserRole::Technician, &UserRole::Client);

        assert_eq!(buffer.cancel(&"1".into()), Some(UserRole::Admin));
        assert!(buffer.is_pending(&"2".into()));
        assert_eq!(buffer.commit(&"2".into()), Some(UserRole::Technician));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_effective_value() {
        let mut buffer = PendingChanges::new();
        let id = RecordId::from("1");
        let committed = UserRole::Client;
        assert_eq!(buffer.effective(&id, &committed), &UserRole::Client);
        buffer.propose(id.clone(), UserRole::Admin, &committed);
        assert_eq!(buffer.effective(&id, &committed), &UserRole::Admin);
    }

    #[test]
    fn test_retain_ids_drops_vanished_rows() {
        let mut buffer = PendingChanges::new();
        buffer.propose("1".into(), UserRole::Admin, &UserRole::Client);
        buffer.propose("2".into(), UserRole::Admin, &UserRole::Client);

        let live = [RecordId::from("2")];
        buffer.retain_ids(live.iter());
        assert!(!buffer.is_pending(&"1".into()));
        assert!(buffer.is_pending(&"2".into()));
    }
}
