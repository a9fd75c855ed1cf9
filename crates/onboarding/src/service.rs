use crate::account_number::{self, AccountTypeCode, ComposedAccount};
use crate::error::{OnboardingError, UniqueField};
use crate::identifiers::{self, KeyColumn};
use crate::store::{CustomerStore, CustomerTx};
use crate::validation::{CustomerPayload, NewCustomer};
use configuration::OnboardingSettings;
use core_types::{AccountRow, ContactRow, CreatedAccount, CreatedCustomer, CustomerRecord, CustomerRow};
use std::fmt;

/// The steps of customer creation, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationStage {
    Validate,
    CheckPhoneUnique,
    CheckRoutingExists,
    CheckDocIdUnique,
    GenerateKeys,
    ComposeAccount,
    InsertCustomer,
    InsertContact,
    InsertAccount,
    Commit,
}

impl fmt::Display for CreationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CreationStage::Validate => "validate",
            CreationStage::CheckPhoneUnique => "check_phone_unique",
            CreationStage::CheckRoutingExists => "check_routing_exists",
            CreationStage::CheckDocIdUnique => "check_docid_unique",
            CreationStage::GenerateKeys => "generate_keys",
            CreationStage::ComposeAccount => "compose_account",
            CreationStage::InsertCustomer => "insert_customer",
            CreationStage::InsertContact => "insert_contact",
            CreationStage::InsertAccount => "insert_account",
            CreationStage::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// An error tagged with the stage that raised it.
#[derive(Debug)]
struct StageFailure {
    stage: CreationStage,
    error: OnboardingError,
}

trait AtStage<T> {
    fn at(self, stage: CreationStage) -> Result<T, StageFailure>;
}

impl<T> AtStage<T> for Result<T, OnboardingError> {
    fn at(self, stage: CreationStage) -> Result<T, StageFailure> {
        self.map_err(|error| StageFailure { stage, error })
    }
}

/// Keys generated for one new customer.
#[derive(Debug)]
struct GeneratedKeys {
    cust_dbid: i64,
    contact_id: i64,
    account_slno: String,
}

/// Create, read and delete for customer records.
///
/// Owns the storage handle it was built with; construct one at start-up and
/// share it (it is cheap to clone when the store is).
#[derive(Debug, Clone)]
pub struct CustomerService<S> {
    store: S,
    settings: OnboardingSettings,
}

impl<S: CustomerStore> CustomerService<S> {
    pub fn new(store: S, settings: OnboardingSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates the payload and persists customer, contact and account atomically.
    ///
    /// Validation runs before a transaction is opened. Every later failure
    /// rolls the transaction back before the error is returned.
    pub async fn create(&self, payload: CustomerPayload) -> Result<CreatedCustomer, OnboardingError> {
        let customer = NewCustomer::try_from(payload).map_err(|e| {
            tracing::info!(stage = %CreationStage::Validate, error = %e, "Customer payload rejected.");
            e
        })?;

        let mut tx = self.store.begin().await?;

        match self.run_creation(&mut tx, &customer).await {
            Ok(created) => {
                if let Err(error) = tx.commit().await {
                    tracing::warn!(stage = %CreationStage::Commit, error = %error, "Customer creation aborted.");
                    return Err(error);
                }
                tracing::info!(
                    customer_id = created.customer_id,
                    contact_id = created.contact_id,
                    slno = %created.account.slno,
                    "Customer created."
                );
                Ok(created)
            }
            Err(StageFailure { stage, error }) => {
                tracing::warn!(stage = %stage, error = %error, "Customer creation aborted.");
                if let Err(rollback_error) = tx.rollback().await {
                    tracing::error!(error = %rollback_error, "Rollback after aborted creation failed.");
                }
                Err(error)
            }
        }
    }

    async fn run_creation(
        &self,
        tx: &mut S::Tx,
        customer: &NewCustomer,
    ) -> Result<CreatedCustomer, StageFailure> {
        // --- 1. Uniqueness and reference checks ---
        if tx.phone_exists(customer.phone).await.at(CreationStage::CheckPhoneUnique)? {
            return Err(OnboardingError::DuplicateField(UniqueField::Phone)).at(CreationStage::CheckPhoneUnique);
        }
        if !tx.routing_exists(&customer.routing).await.at(CreationStage::CheckRoutingExists)? {
            return Err(OnboardingError::UnknownReference {
                field: "account.routing",
                value: customer.routing.clone(),
            })
            .at(CreationStage::CheckRoutingExists);
        }
        if tx
            .document_id_exists(&customer.document_id)
            .await
            .at(CreationStage::CheckDocIdUnique)?
        {
            return Err(OnboardingError::DuplicateField(UniqueField::DocumentId)).at(CreationStage::CheckDocIdUnique);
        }

        // --- 2. Keys and account number ---
        let keys = self.generate_keys(tx).await.at(CreationStage::GenerateKeys)?;
        let composed = self.compose_account(tx, customer).await.at(CreationStage::ComposeAccount)?;

        // --- 3. Inserts ---
        let (customer_row, contact_row, account_row) = self.rows(customer, &keys, &composed);
        tx.insert_customer(&customer_row).await.at(CreationStage::InsertCustomer)?;
        tx.insert_contact(&contact_row).await.at(CreationStage::InsertContact)?;
        tx.insert_account(&account_row).await.at(CreationStage::InsertAccount)?;

        Ok(CreatedCustomer {
            customer_id: keys.cust_dbid,
            contact_id: keys.contact_id,
            account: CreatedAccount {
                slno: keys.account_slno,
                number: composed.number,
                routing: composed.routing,
            },
        })
    }

    async fn generate_keys(&self, tx: &mut S::Tx) -> Result<GeneratedKeys, OnboardingError> {
        let max_customer = tx.max_key(KeyColumn::CustomerId).await?;
        let max_contact = tx.max_key(KeyColumn::ContactId).await?;
        let max_slno = tx.max_key(KeyColumn::AccountSlno).await?;

        Ok(GeneratedKeys {
            cust_dbid: identifiers::next_numeric(KeyColumn::CustomerId, max_customer.as_deref())?,
            contact_id: identifiers::next_numeric(KeyColumn::ContactId, max_contact.as_deref())?,
            account_slno: identifiers::next_prefixed(
                KeyColumn::AccountSlno,
                max_slno.as_deref(),
                &self.settings.account_slno_prefix,
            )?,
        })
    }

    async fn compose_account(
        &self,
        tx: &mut S::Tx,
        customer: &NewCustomer,
    ) -> Result<ComposedAccount, OnboardingError> {
        let raw_code = tx
            .account_type_code(customer.account_type)
            .await?
            .ok_or(OnboardingError::UnknownAccountType(customer.account_type))?;
        let code = AccountTypeCode::parse(&raw_code)?;

        let prefix = account_number::series_prefix(&customer.routing, &code)?;
        let last_sequence = match tx.max_account_number(&prefix).await? {
            Some(number) => account_number::sequence_of(&number)?,
            None => 0,
        };

        account_number::compose(&code, &customer.routing, last_sequence)
    }

    fn rows(
        &self,
        customer: &NewCustomer,
        keys: &GeneratedKeys,
        composed: &ComposedAccount,
    ) -> (CustomerRow, ContactRow, AccountRow) {
        let customer_row = CustomerRow {
            cust_dbid: keys.cust_dbid,
            first_name: customer.first_name.clone(),
            middle_name: customer.middle_name.clone(),
            last_name: customer.last_name.clone(),
            customer_type: customer.customer_type,
            document_id: customer.document_id.clone(),
            document_type: customer.document_type.clone(),
            contact_id: keys.contact_id,
            account_slno: keys.account_slno.clone(),
        };
        let contact_row = ContactRow {
            contact_id: keys.contact_id,
            line1: customer.line1.clone(),
            line2: customer.line2.clone(),
            line3: customer.line3.clone(),
            city: customer.city.clone(),
            zip: customer.zip.clone(),
            state: customer.state.clone(),
            country: customer.country.clone(),
            email: customer.email.clone(),
            phone: customer.phone,
        };
        let account_row = AccountRow {
            slno: keys.account_slno.clone(),
            account_number: composed.number.clone(),
            routing_number: composed.routing.clone(),
            account_type: customer.account_type,
            balance: self.settings.initial_balance,
            status: self.settings.initial_status.clone(),
        };
        (customer_row, contact_row, account_row)
    }

    pub async fn read(&self, cust_dbid: i64) -> Result<CustomerRecord, OnboardingError> {
        self.store
            .fetch_customer(cust_dbid)
            .await?
            .ok_or(OnboardingError::CustomerNotFound(cust_dbid))
    }

    /// Deletes contact, account and customer, in that order, in one transaction.
    ///
    /// An unknown id is `CustomerNotFound`; nothing is deleted.
    pub async fn delete(&self, cust_dbid: i64) -> Result<(), OnboardingError> {
        let mut tx = self.store.begin().await?;

        let result = async {
            let links = tx
                .customer_links(cust_dbid)
                .await?
                .ok_or(OnboardingError::CustomerNotFound(cust_dbid))?;
            tx.delete_contact(links.contact_id).await?;
            tx.delete_account(&links.account_slno).await?;
            tx.delete_customer(cust_dbid).await?;
            Ok::<(), OnboardingError>(())
        }
        .await;

        match result {
            Ok(()) => {
                tx.commit().await?;
                tracing::info!(customer_id = cust_dbid, "Customer deleted.");
                Ok(())
            }
            Err(error) => {
                if let Err(rollback_error) = tx.rollback().await {
                    tracing::error!(error = %rollback_error, "Rollback after aborted deletion failed.");
                }
                Err(error)
            }
        }
    }

    /// Probes the database with a trivial query.
    pub async fn health(&self) -> Result<(), OnboardingError> {
        self.store.ping().await
    }
}
