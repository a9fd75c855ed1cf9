//! # Onboarding
//!
//! Opening a customer: one customer row, one contact row and one account row,
//! created together or not at all.
//!
//! ## Public API
//!
//! - `CustomerService`: create / read / delete, sequencing validation,
//!   uniqueness checks, key generation, account number composition and the
//!   three inserts inside a single transaction.
//! - `validate` / `CustomerPayload` / `NewCustomer`: the inbound payload and its rules.
//! - `identifiers`: next-key derivation for numeric and prefixed keys.
//! - `account_number`: the synthetic account number algorithm.
//! - `CustomerStore` / `CustomerTx`: the storage seam, implemented by the
//!   `database` crate and by `InMemoryStore`.
//! - `OnboardingError`: every failure the workflow can report.

pub mod account_number;
pub mod error;
pub mod identifiers;
pub mod memory;
pub mod service;
pub mod store;
pub mod validation;

pub use account_number::{AccountTypeCode, ComposedAccount};
pub use error::{OnboardingError, UniqueField};
pub use identifiers::KeyColumn;
pub use memory::InMemoryStore;
pub use service::{CreationStage, CustomerService};
pub use store::{CustomerLinks, CustomerStore, CustomerTx};
pub use validation::{validate, CustomerPayload, NewCustomer, Violation};
