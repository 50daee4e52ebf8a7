//! Local view filter: derives the visible rows from the fetched snapshot.
//!
//! A row is visible when it satisfies every active predicate: the free-text
//! term, the status selector and the assignee selector. Inactive predicates
//! (empty term, `All`, `Any`) match everything. The reducer is pure and is
//! recomputed on every render.

use std::str::FromStr;

use crate::models::RecordId;
use crate::traits::Record;

/// Status selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter<S> {
    #[default]
    All,
    Only(S),
}

impl<S: FromStr<Err = String>> StatusFilter<S> {
    /// Parse a selector value; `""` and `"all"` mean no filter.
    pub fn parse(value: &str) -> Result<Self, String> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        S::from_str(value).map(Self::Only)
    }
}

impl<S: PartialEq> StatusFilter<S> {
    pub fn matches(&self, status: &S) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

/// Assignee selector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AssigneeFilter {
    #[default]
    Any,
    Unassigned,
    User(RecordId),
}

impl AssigneeFilter {
    /// Parse a selector value; `""`/`"all"` = any, `"unassigned"` = null.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "all" => Self::Any,
            "unassigned" => Self::Unassigned,
            id => Self::User(RecordId::new(id)),
        }
    }

    pub fn matches(&self, assignee: Option<&RecordId>) -> bool {
        match self {
            Self::Any => true,
            Self::Unassigned => assignee.is_none(),
            Self::User(id) => assignee == Some(id),
        }
    }
}

/// Ordering applied after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Keep the order the store returned.
    #[default]
    Unsorted,
    NewestFirst,
    OldestFirst,
}

/// Transient filter inputs of one screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewFilter<S> {
    pub term: String,
    pub status: StatusFilter<S>,
    pub assignee: AssigneeFilter,
    pub sort: SortOrder,
}

impl<S> Default for ViewFilter<S> {
    fn default() -> Self {
        Self {
            term: String::new(),
            status: StatusFilter::All,
            assignee: AssigneeFilter::Any,
            sort: SortOrder::Unsorted,
        }
    }
}

impl<S> ViewFilter<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = term.into();
        self
    }

    pub fn with_status(mut self, status: S) -> Self {
        self.status = StatusFilter::Only(status);
        self
    }

    pub fn with_assignee(mut self, assignee: AssigneeFilter) -> Self {
        self.assignee = assignee;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// True when no predicate is active.
    pub fn is_empty(&self) -> bool {
        self.term.trim().is_empty()
            && matches!(self.status, StatusFilter::All)
            && matches!(self.assignee, AssigneeFilter::Any)
    }
}

/// Case-insensitive substring match of `term` against any of `fields`.
pub fn term_matches(fields: &[&str], term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Whether a single row passes every active predicate.
pub fn matches<R: Record>(item: &R, filter: &ViewFilter<R::Status>) -> bool {
    term_matches(&item.search_fields(), &filter.term)
        && filter.status.matches(&item.status())
        && filter.assignee.matches(item.assignee())
}

/// Apply the filter and ordering to a snapshot.
pub fn apply<'a, R: Record>(items: &'a [R], filter: &ViewFilter<R::Status>) -> Vec<&'a R> {
    let mut visible: Vec<&R> = items.iter().filter(|item| matches(*item, filter)).collect();

    match filter.sort {
        SortOrder::Unsorted => {}
        // Rows without a timestamp sort as oldest.
        SortOrder::NewestFirst => visible.sort_by(|a, b| b.created_at().cmp(&a.created_at())),
        SortOrder::OldestFirst => visible.sort_by(|a, b| a.created_at().cmp(&b.created_at())),
    }

    visible
}
