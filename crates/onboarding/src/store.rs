use crate::error::OnboardingError;
use crate::identifiers::KeyColumn;
use core_types::{AccountRow, AccountType, ContactRow, CustomerRecord, CustomerRow};
use std::future::Future;

/// The foreign keys a customer row holds, needed to delete its dependents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerLinks {
    pub contact_id: i64,
    pub account_slno: String,
}

/// Storage backing the onboarding workflow.
///
/// Implemented by the PostgreSQL repository in the `database` crate and by
/// `InMemoryStore` for tests.
pub trait CustomerStore: Clone + Send + Sync + 'static {
    type Tx: CustomerTx;

    /// Opens a transaction.
    ///
    /// # Errors
    ///
    /// `ConnectionUnavailable` when no database session can be acquired.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx, OnboardingError>> + Send;

    /// Reads the joined customer, contact and account rows.
    fn fetch_customer(
        &self,
        cust_dbid: i64,
    ) -> impl Future<Output = Result<Option<CustomerRecord>, OnboardingError>> + Send;

    /// A trivial round trip proving the database answers.
    fn ping(&self) -> impl Future<Output = Result<(), OnboardingError>> + Send;
}

/// One open transaction. Dropping it without `commit` discards every write.
pub trait CustomerTx: Send {
    fn phone_exists(&mut self, phone: i64) -> impl Future<Output = Result<bool, OnboardingError>> + Send;

    fn routing_exists(&mut self, routing: &str) -> impl Future<Output = Result<bool, OnboardingError>> + Send;

    fn document_id_exists(
        &mut self,
        document_id: &str,
    ) -> impl Future<Output = Result<bool, OnboardingError>> + Send;

    /// The current maximum of a key column, as text. `None` for an empty table.
    fn max_key(
        &mut self,
        column: KeyColumn,
    ) -> impl Future<Output = Result<Option<String>, OnboardingError>> + Send;

    /// The raw code registered for an account type, if any.
    fn account_type_code(
        &mut self,
        account_type: AccountType,
    ) -> impl Future<Output = Result<Option<String>, OnboardingError>> + Send;

    /// The highest issued account number that starts with `series_prefix`.
    fn max_account_number(
        &mut self,
        series_prefix: &str,
    ) -> impl Future<Output = Result<Option<String>, OnboardingError>> + Send;

    /// # Errors
    ///
    /// `DuplicateField` when the document id unique constraint rejects the row.
    fn insert_customer(&mut self, row: &CustomerRow) -> impl Future<Output = Result<(), OnboardingError>> + Send;

    /// # Errors
    ///
    /// `DuplicateField` when the phone unique constraint rejects the row.
    fn insert_contact(&mut self, row: &ContactRow) -> impl Future<Output = Result<(), OnboardingError>> + Send;

    fn insert_account(&mut self, row: &AccountRow) -> impl Future<Output = Result<(), OnboardingError>> + Send;

    fn customer_links(
        &mut self,
        cust_dbid: i64,
    ) -> impl Future<Output = Result<Option<CustomerLinks>, OnboardingError>> + Send;

    fn delete_contact(&mut self, contact_id: i64) -> impl Future<Output = Result<(), OnboardingError>> + Send;

    fn delete_account(&mut self, slno: &str) -> impl Future<Output = Result<(), OnboardingError>> + Send;

    fn delete_customer(&mut self, cust_dbid: i64) -> impl Future<Output = Result<(), OnboardingError>> + Send;

    /// # Errors
    ///
    /// Deferred constraint violations surface here, mapped like insert errors.
    fn commit(self) -> impl Future<Output = Result<(), OnboardingError>> + Send;

    fn rollback(self) -> impl Future<Output = Result<(), OnboardingError>> + Send;
}
