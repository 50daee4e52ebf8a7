//! Display labels for reference fields.
//!
//! Rows store foreign ids (`user_id`, `category_id`, assignee); tables show
//! labels resolved through a separately fetched lookup collection.

use std::collections::HashMap;

use crate::defaults;
use crate::models::RecordId;
use crate::traits::{Labeled, Record};

#[derive(Debug, Clone, Default)]
pub struct LabelLookup {
    labels: HashMap<RecordId, String>,
}

impl LabelLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<R: Record + Labeled>(records: &[R]) -> Self {
        Self {
            labels: records
                .iter()
                .map(|r| (r.id().clone(), r.label()))
                .collect(),
        }
    }

    pub fn insert(&mut self, id: RecordId, label: impl Into<String>) {
        self.labels.insert(id, label.into());
    }

    /// Label for `id`; unknown ids show the raw id, `None` shows the
    /// unassigned label.
    pub fn resolve<'a>(&'a self, id: Option<&'a RecordId>) -> &'a str {
        match id {
            None => defaults::UNASSIGNED_LABEL,
            Some(id) => self
                .labels
                .get(id)
                .map(String::as_str)
                .unwrap_or(id.as_str()),
        }
    }

    /// `(id, label)` pairs sorted by label, for selector options.
    pub fn options(&self) -> Vec<(&RecordId, &str)> {
        let mut options: Vec<_> = self
            .labels
            .iter()
            .map(|(id, label)| (id, label.as_str()))
            .collect();
        options.sort_by(|a, b| a.1.cmp(b.1));
        options
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{User, UserRole};

    fn user(id: &str, name: Option<&str>, email: &str) -> User {
        User {
            id: id.into(),
            email: email.into(),
            full_name: name.map(String::from),
            role: UserRole::Technician,
            created_at: None,
        }
    }

    #[test]
    fn test_resolve_known_unknown_and_empty() {
        let lookup = LabelLookup::from_records(&[
            user("u1", Some("Ana Costa"), "ana@sicoop.com"),
            user("u2", None, "bruno@sicoop.com"),
        ]);

        let u1 = RecordId::from("u1");
        let u2 = RecordId::from("u2");
        let u3 = RecordId::from("u3");
        assert_eq!(lookup.resolve(Some(&u1)), "Ana Costa");
        assert_eq!(lookup.resolve(Some(&u2)), "bruno@sicoop.com");
        assert_eq!(lookup.resolve(Some(&u3)), "u3");
        assert_eq!(lookup.resolve(None), "Não atribuído");
    }

    #[test]
    fn test_options_sorted_by_label() {
        let lookup = LabelLookup::from_records(&[
            user("u1", Some("Zeca"), "z@sicoop.com"),
            user("u2", Some("Ana"), "a@sicoop.com"),
        ]);
        let labels: Vec<_> = lookup.options().into_iter().map(|(_, l)| l).collect();
        assert_eq!(labels, vec!["Ana", "Zeca"]);
    }
}
