//! # sicoop-core
//!
//! Core types, traits, and list-management state for the Sicoop back-office.
//!
//! This crate holds the record types of every managed collection, the remote
//! collection abstraction, and the client-side machinery built on it: view
//! filters, pending changes, the mutation dispatcher, form validation, the
//! generic list manager, screens and the application shell.

pub mod defaults;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod logging;
pub mod lookup;
pub mod manager;
pub mod models;
pub mod pagination;
pub mod pending;
pub mod records;
pub mod screens;
pub mod shell;
pub mod toast;
pub mod traits;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types at crate root
pub use dispatcher::{ActionKey, BusyTransition, MutationDispatcher};
pub use error::{Error, Result};
pub use filter::{AssigneeFilter, SortOrder, StatusFilter, ViewFilter};
pub use lookup::LabelLookup;
pub use manager::{InvalidationPolicy, LoadState, PageInfo, RemoteListManager};
pub use models::*;
pub use pagination::{Page, PageRequest};
pub use pending::{PendingChanges, PendingState};
pub use screens::{
    AnalysesScreen, AuthorizationsScreen, MessagesScreen, NotificationTab, NotificationsScreen,
    UsersScreen,
};
pub use shell::{menu, AppShell, Capability, MenuEntry, Screen, ScreenView, Session};
pub use toast::{Toast, ToastKind, ToastQueue};
pub use traits::*;
pub use validation::{AnalysisForm, MessageForm, NotificationCategoryForm, UserForm};
