//! # Bankdesk Database Crate
//!
//! This crate is the PostgreSQL adapter behind the onboarding workflow.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All SQL lives here. The workflow in the `onboarding` crate
//!   only sees the `CustomerStore` / `CustomerTx` traits this crate implements.
//! - **Explicit configuration:** Credentials arrive as a `DatabaseSettings`
//!   value built once at start-up; nothing is read from ambient state.
//! - **Constraints are authoritative:** unique violations on the phone and
//!   document id constraints are reported as `DuplicateField`, exactly like
//!   the workflow's own pre-insert checks.
//!
//! ## Public API
//!
//! - `connect` / `connect_options`: the connection provider.
//! - `check_connection`: a `SELECT 1` probe; `check_database` connects first.
//! - `DbRepository`: implements `CustomerStore`; `DbTransaction` implements `CustomerTx`.
//! - `DbError`: the specific error types that can be returned from this crate.
//!
//! The expected schema is documented in `sql/schema.sql`; this crate never applies it.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{check_connection, check_database, connect, connect_options};
pub use error::DbError;
pub use repository::{DbRepository, DbTransaction};
