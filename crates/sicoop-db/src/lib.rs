//! # sicoop-db
//!
//! Data layer for the Sicoop back-office.
//!
//! This crate provides:
//! - A PostgREST client for the Supabase tables and procedures
//! - An in-memory store with the same collection semantics
//! - A client for the batch notification processing endpoint
//!
//! ## Example
//!
//! ```rust,ignore
//! use sicoop_db::{RestClient, SupabaseConfig};
//! use sicoop_core::{AppShell, Screen, Session, UserRole};
//!
//! let client = RestClient::new(SupabaseConfig::from_env())?;
//! let session = Session::new("user-id", "admin@sicoop.com", UserRole::Admin);
//! let mut shell = AppShell::new(std::sync::Arc::new(client), session);
//! shell.navigate(Screen::Analyses).await?;
//! ```

pub mod config;
pub mod memory;
pub mod processing;
pub mod rest;

pub use config::SupabaseConfig;
pub use memory::{MemoryCollection, MemoryStore};
pub use processing::NotificationProcessingClient;
pub use rest::{RestClient, RestCollection};

// Re-export core types
pub use sicoop_core::*;
