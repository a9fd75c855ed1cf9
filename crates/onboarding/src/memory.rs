//! In-memory storage for tests.
//!
//! Transactions read committed state and stage their writes; `commit` applies
//! the staged writes to a copy of the tables and swaps it in only when every
//! constraint holds, so a failed commit leaves nothing behind. Unique-value
//! constraints (phone, document id) are checked before key collisions, and
//! account numbers are unique like `accounts.account_no`.

use crate::account_number::SEQUENCE_WIDTH;
use crate::error::{OnboardingError, UniqueField};
use crate::identifiers::KeyColumn;
use crate::store::{CustomerLinks, CustomerStore, CustomerTx};
use core_types::{AccountRow, AccountType, ContactRow, CustomerRecord, CustomerRow};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
struct Tables {
    customers: BTreeMap<i64, CustomerRow>,
    contacts: BTreeMap<i64, ContactRow>,
    accounts: BTreeMap<String, AccountRow>,
    branches: BTreeSet<String>,
    account_type_codes: HashMap<AccountType, String>,
}

#[derive(Debug, Default)]
struct Faults {
    unavailable: AtomicBool,
    fail_account_inserts: AtomicBool,
}

/// Row counts of the three owned tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCounts {
    pub customers: usize,
    pub contacts: usize,
    pub accounts: usize,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    faults: Arc<Faults>,
}

fn lock(tables: &Mutex<Tables>) -> Result<MutexGuard<'_, Tables>, OnboardingError> {
    tables
        .lock()
        .map_err(|_| OnboardingError::QueryExecutionError("in-memory store lock poisoned".to_string()))
}

impl InMemoryStore {
    /// An empty store with no branches and no account type codes.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with codes for every account type (CHECKING 1, SAVINGS 2, CD 3) and the given branches.
    pub fn with_reference_data(routing_numbers: &[&str]) -> Self {
        let store = Self::new();
        store.add_account_type_code(AccountType::Checking, "1");
        store.add_account_type_code(AccountType::Savings, "2");
        store.add_account_type_code(AccountType::Cd, "3");
        for routing in routing_numbers {
            store.add_branch(routing);
        }
        store
    }

    pub fn add_branch(&self, routing: &str) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.branches.insert(routing.to_string());
        }
    }

    pub fn add_account_type_code(&self, account_type: AccountType, code: &str) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.account_type_codes.insert(account_type, code.to_string());
        }
    }

    /// Writes an account row directly, bypassing the workflow.
    pub fn seed_account(&self, row: AccountRow) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.accounts.insert(row.slno.clone(), row);
        }
    }

    /// Makes `begin` fail as if the database could not be reached.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes every `insert_account` fail with a query error.
    pub fn fail_account_inserts(&self, fail: bool) {
        self.faults.fail_account_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn row_counts(&self) -> RowCounts {
        match self.tables.lock() {
            Ok(tables) => RowCounts {
                customers: tables.customers.len(),
                contacts: tables.contacts.len(),
                accounts: tables.accounts.len(),
            },
            Err(_) => RowCounts { customers: 0, contacts: 0, accounts: 0 },
        }
    }

    pub fn account(&self, slno: &str) -> Option<AccountRow> {
        self.tables.lock().ok()?.accounts.get(slno).cloned()
    }
}

impl CustomerStore for InMemoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx, OnboardingError> {
        if self.faults.unavailable.load(Ordering::SeqCst) {
            return Err(OnboardingError::ConnectionUnavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(InMemoryTx {
            tables: Arc::clone(&self.tables),
            faults: Arc::clone(&self.faults),
            staged: Vec::new(),
        })
    }

    async fn fetch_customer(&self, cust_dbid: i64) -> Result<Option<CustomerRecord>, OnboardingError> {
        let tables = lock(&self.tables)?;
        let Some(customer) = tables.customers.get(&cust_dbid) else {
            return Ok(None);
        };
        let contact = tables.contacts.get(&customer.contact_id);
        let account = tables.accounts.get(&customer.account_slno);

        // Inner-join semantics: a customer missing a dependent row is not returned.
        Ok(contact
            .zip(account)
            .map(|(contact, account)| CustomerRecord::from_rows(customer, contact, account)))
    }

    async fn ping(&self) -> Result<(), OnboardingError> {
        if self.faults.unavailable.load(Ordering::SeqCst) {
            return Err(OnboardingError::ConnectionUnavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug)]
enum Write {
    InsertCustomer(CustomerRow),
    InsertContact(ContactRow),
    InsertAccount(AccountRow),
    DeleteContact(i64),
    DeleteAccount(String),
    DeleteCustomer(i64),
}

#[derive(Debug)]
pub struct InMemoryTx {
    tables: Arc<Mutex<Tables>>,
    faults: Arc<Faults>,
    staged: Vec<Write>,
}

fn duplicate_key(column: KeyColumn, value: impl ToString) -> OnboardingError {
    OnboardingError::QueryExecutionError(format!(
        "duplicate key value violates primary key of {}: {}",
        column,
        value.to_string()
    ))
}

fn apply(tables: &mut Tables, write: Write) -> Result<(), OnboardingError> {
    match write {
        Write::InsertCustomer(row) => {
            if tables.customers.values().any(|c| c.document_id == row.document_id) {
                return Err(OnboardingError::DuplicateField(UniqueField::DocumentId));
            }
            if tables.customers.contains_key(&row.cust_dbid) {
                return Err(duplicate_key(KeyColumn::CustomerId, row.cust_dbid));
            }
            tables.customers.insert(row.cust_dbid, row);
        }
        Write::InsertContact(row) => {
            if tables.contacts.values().any(|c| c.phone == row.phone) {
                return Err(OnboardingError::DuplicateField(UniqueField::Phone));
            }
            if tables.contacts.contains_key(&row.contact_id) {
                return Err(duplicate_key(KeyColumn::ContactId, row.contact_id));
            }
            tables.contacts.insert(row.contact_id, row);
        }
        Write::InsertAccount(row) => {
            if tables.accounts.contains_key(&row.slno) {
                return Err(duplicate_key(KeyColumn::AccountSlno, &row.slno));
            }
            if tables.accounts.values().any(|a| a.account_number == row.account_number) {
                return Err(OnboardingError::QueryExecutionError(format!(
                    "duplicate key value violates unique constraint on accounts.account_no: {}",
                    row.account_number
                )));
            }
            if !tables.branches.contains(&row.routing_number) {
                return Err(OnboardingError::QueryExecutionError(format!(
                    "routing number {} violates foreign key to branches",
                    row.routing_number
                )));
            }
            tables.accounts.insert(row.slno.clone(), row);
        }
        Write::DeleteContact(id) => {
            tables.contacts.remove(&id);
        }
        Write::DeleteAccount(slno) => {
            tables.accounts.remove(&slno);
        }
        Write::DeleteCustomer(id) => {
            tables.customers.remove(&id);
        }
    }
    Ok(())
}

impl CustomerTx for InMemoryTx {
    async fn phone_exists(&mut self, phone: i64) -> Result<bool, OnboardingError> {
        Ok(lock(&self.tables)?.contacts.values().any(|c| c.phone == phone))
    }

    async fn routing_exists(&mut self, routing: &str) -> Result<bool, OnboardingError> {
        Ok(lock(&self.tables)?.branches.contains(routing))
    }

    async fn document_id_exists(&mut self, document_id: &str) -> Result<bool, OnboardingError> {
        Ok(lock(&self.tables)?
            .customers
            .values()
            .any(|c| c.document_id == document_id))
    }

    async fn max_key(&mut self, column: KeyColumn) -> Result<Option<String>, OnboardingError> {
        let tables = lock(&self.tables)?;
        let max = match column {
            KeyColumn::CustomerId => tables.customers.keys().max().map(i64::to_string),
            KeyColumn::ContactId => tables.contacts.keys().max().map(i64::to_string),
            KeyColumn::AccountSlno => tables.accounts.keys().max().cloned(),
        };
        Ok(max)
    }

    async fn account_type_code(&mut self, account_type: AccountType) -> Result<Option<String>, OnboardingError> {
        Ok(lock(&self.tables)?.account_type_codes.get(&account_type).cloned())
    }

    async fn max_account_number(&mut self, series_prefix: &str) -> Result<Option<String>, OnboardingError> {
        Ok(lock(&self.tables)?
            .accounts
            .values()
            .map(|a| &a.account_number)
            .filter(|n| n.len() == series_prefix.len() + SEQUENCE_WIDTH && n.starts_with(series_prefix))
            .max()
            .cloned())
    }

    async fn insert_customer(&mut self, row: &CustomerRow) -> Result<(), OnboardingError> {
        self.staged.push(Write::InsertCustomer(row.clone()));
        Ok(())
    }

    async fn insert_contact(&mut self, row: &ContactRow) -> Result<(), OnboardingError> {
        self.staged.push(Write::InsertContact(row.clone()));
        Ok(())
    }

    async fn insert_account(&mut self, row: &AccountRow) -> Result<(), OnboardingError> {
        if self.faults.fail_account_inserts.load(Ordering::SeqCst) {
            return Err(OnboardingError::QueryExecutionError("injected account insert failure".to_string()));
        }
        self.staged.push(Write::InsertAccount(row.clone()));
        Ok(())
    }

    async fn customer_links(&mut self, cust_dbid: i64) -> Result<Option<CustomerLinks>, OnboardingError> {
        Ok(lock(&self.tables)?.customers.get(&cust_dbid).map(|c| CustomerLinks {
            contact_id: c.contact_id,
            account_slno: c.account_slno.clone(),
        }))
    }

    async fn delete_contact(&mut self, contact_id: i64) -> Result<(), OnboardingError> {
        self.staged.push(Write::DeleteContact(contact_id));
        Ok(())
    }

    async fn delete_account(&mut self, slno: &str) -> Result<(), OnboardingError> {
        self.staged.push(Write::DeleteAccount(slno.to_string()));
        Ok(())
    }

    async fn delete_customer(&mut self, cust_dbid: i64) -> Result<(), OnboardingError> {
        self.staged.push(Write::DeleteCustomer(cust_dbid));
        Ok(())
    }

    async fn commit(self) -> Result<(), OnboardingError> {
        let mut tables = lock(&self.tables)?;
        let mut next = tables.clone();
        for write in self.staged {
            apply(&mut next, write)?;
        }
        *tables = next;
        Ok(())
    }

    async fn rollback(self) -> Result<(), OnboardingError> {
        Ok(())
    }
}
