use crate::error::DbError;
use core_types::{
    AccountRow, AccountType, AccountView, ContactRow, ContactView, CustomerRecord, CustomerRow, CustomerType,
    CustomerView,
};
use onboarding::{CustomerLinks, CustomerStore, CustomerTx, KeyColumn, OnboardingError};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, Postgres};
use sqlx::{FromRow, Row, Transaction};

/// Key for the transaction-scoped advisory lock that serialises writers.
///
/// Creation derives keys from `MAX(..) + 1`; holding this lock from the start
/// of every write transaction keeps two writers from computing the same keys.
const WRITER_LOCK_KEY: i64 = 0x6261_6e6b_6465_736b;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

// This struct represents a row of the read query joining the three owned tables.
#[derive(FromRow, Debug, Clone)]
pub struct DbCustomerRecord {
    pub cust_dbid: i64,
    pub cust_firstname: String,
    pub cust_middlename: Option<String>,
    pub cust_lastname: String,
    pub cust_type: String,
    pub cust_docid: String,
    pub cust_docid_type: String,
    pub cntct_line1: String,
    pub cntct_line2: Option<String>,
    pub cntct_line3: Option<String>,
    pub cntct_city: String,
    pub cntct_zip: String,
    pub cntct_state: String,
    pub cntct_country: String,
    pub cntct_email: String,
    pub cntct_phone: i64,
    pub acc_type: String,
    pub account_no: String,
    pub routing_number: String,
    pub balance: Decimal,
    pub acc_status: String,
}

impl TryFrom<DbCustomerRecord> for CustomerRecord {
    type Error = DbError;

    fn try_from(row: DbCustomerRecord) -> Result<Self, Self::Error> {
        let customer_type = row
            .cust_type
            .trim()
            .parse::<CustomerType>()
            .map_err(|e| DbError::Decode(e.to_string()))?;
        let account_type = row
            .acc_type
            .trim()
            .parse::<AccountType>()
            .map_err(|e| DbError::Decode(e.to_string()))?;

        Ok(CustomerRecord {
            customer: CustomerView {
                id: row.cust_dbid,
                first_name: row.cust_firstname,
                middle_name: row.cust_middlename,
                last_name: row.cust_lastname,
                customer_type,
                document_id: row.cust_docid,
                document_type: row.cust_docid_type,
            },
            contact: ContactView {
                line1: row.cntct_line1,
                line2: row.cntct_line2,
                line3: row.cntct_line3,
                city: row.cntct_city,
                zip: row.cntct_zip,
                state: row.cntct_state,
                country: row.cntct_country,
                email: row.cntct_email,
                phone: row.cntct_phone,
            },
            account: AccountView {
                account_type,
                number: row.account_no,
                routing: row.routing_number,
                balance: row.balance,
                status: row.acc_status,
            },
        })
    }
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches the joined customer, contact and account rows for one customer.
    pub async fn get_customer_record(&self, cust_dbid: i64) -> Result<Option<CustomerRecord>, DbError> {
        let row = sqlx::query_as::<_, DbCustomerRecord>(
            r#"
            SELECT
                cu.cust_dbid, cu.cust_firstname, cu.cust_middlename, cu.cust_lastname,
                cu.cust_type, cu.cust_docid, cu.cust_docid_type,
                co.cntct_line1, co.cntct_line2, co.cntct_line3, co.cntct_city, co.cntct_zip,
                co.cntct_state, co.cntct_country, co.cntct_email, co.cntct_phone,
                ac.acc_type, ac.account_no, ac.routing_number, ac.balance, ac.acc_status
            FROM
                customers AS cu
            JOIN
                customer_contacts_info AS co ON cu.cust_contactid = co.cust_contactid
            JOIN
                accounts AS ac ON cu.cust_accslno = ac.cust_accslno
            WHERE
                cu.cust_dbid = $1
            "#,
        )
        .bind(cust_dbid)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CustomerRecord::try_from).transpose()
    }

    /// Begins a write transaction holding the writer lock.
    pub async fn begin_write(&self) -> Result<DbTransaction, DbError> {
        let mut tx: Transaction<'static, Postgres> = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(WRITER_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        Ok(DbTransaction { tx })
    }
}

impl CustomerStore for DbRepository {
    type Tx = DbTransaction;

    async fn begin(&self) -> Result<DbTransaction, OnboardingError> {
        Ok(self.begin_write().await?)
    }

    async fn fetch_customer(&self, cust_dbid: i64) -> Result<Option<CustomerRecord>, OnboardingError> {
        Ok(self.get_customer_record(cust_dbid).await?)
    }

    async fn ping(&self) -> Result<(), OnboardingError> {
        Ok(crate::connection::check_connection(&self.pool).await?)
    }
}

/// A write transaction on the owned tables.
///
/// Dropping it without `commit` rolls back, as `sqlx::Transaction` does.
pub struct DbTransaction {
    tx: Transaction<'static, Postgres>,
}

impl std::fmt::Debug for DbTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbTransaction").finish_non_exhaustive()
    }
}

impl DbTransaction {
    async fn exists(&mut self, sql: &str, bind: impl ToString) -> Result<bool, DbError> {
        let found: bool = sqlx::query_scalar(sql)
            .bind(bind.to_string())
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(found)
    }
}

impl CustomerTx for DbTransaction {
    async fn phone_exists(&mut self, phone: i64) -> Result<bool, OnboardingError> {
        let found: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM customer_contacts_info WHERE cntct_phone = $1)")
                .bind(phone)
                .fetch_one(&mut *self.tx)
                .await
                .map_err(DbError::from)?;
        Ok(found)
    }

    async fn routing_exists(&mut self, routing: &str) -> Result<bool, OnboardingError> {
        Ok(self
            .exists("SELECT EXISTS (SELECT 1 FROM branches WHERE routing_number = $1)", routing)
            .await?)
    }

    async fn document_id_exists(&mut self, document_id: &str) -> Result<bool, OnboardingError> {
        Ok(self
            .exists("SELECT EXISTS (SELECT 1 FROM customers WHERE cust_docid = $1)", document_id)
            .await?)
    }

    async fn max_key(&mut self, column: KeyColumn) -> Result<Option<String>, OnboardingError> {
        // Table and column names come from a closed enum, never from input.
        let sql = format!("SELECT MAX({})::TEXT FROM {}", column.column(), column.table());
        let row = sqlx::query(&sql)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(DbError::from)?;
        let max: Option<String> = row.try_get(0).map_err(DbError::from)?;
        Ok(max)
    }

    async fn account_type_code(&mut self, account_type: AccountType) -> Result<Option<String>, OnboardingError> {
        let code: Option<String> =
            sqlx::query_scalar("SELECT acctypeid::TEXT FROM account_type_table WHERE acc_type = $1")
                .bind(account_type.as_str())
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(DbError::from)?;
        Ok(code)
    }

    async fn max_account_number(&mut self, series_prefix: &str) -> Result<Option<String>, OnboardingError> {
        // The prefix is digits only, so it carries no LIKE wildcards.
        let max: Option<String> = sqlx::query_scalar(
            "SELECT MAX(account_no) FROM accounts WHERE account_no LIKE $1 AND LENGTH(account_no) = $2",
        )
        .bind(format!("{}%", series_prefix))
        .bind((series_prefix.len() + onboarding::account_number::SEQUENCE_WIDTH) as i32)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(DbError::from)?;
        Ok(max)
    }

    async fn insert_customer(&mut self, row: &CustomerRow) -> Result<(), OnboardingError> {
        sqlx::query(
            r#"
            INSERT INTO customers (
                cust_dbid, cust_firstname, cust_middlename, cust_lastname, cust_type,
                cust_docid, cust_docid_type, cust_contactid, cust_accslno
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(row.cust_dbid)
        .bind(&row.first_name)
        .bind(row.middle_name.as_deref())
        .bind(&row.last_name)
        .bind(row.customer_type.as_str())
        .bind(&row.document_id)
        .bind(&row.document_type)
        .bind(row.contact_id)
        .bind(&row.account_slno)
        .execute(&mut *self.tx)
        .await
        .map_err(DbError::from)?;
        Ok(())
    }

    async fn insert_contact(&mut self, row: &ContactRow) -> Result<(), OnboardingError> {
        sqlx::query(
            r#"
            INSERT INTO customer_contacts_info (
                cust_contactid, cntct_line1, cntct_line2, cntct_line3, cntct_city,
                cntct_zip, cntct_state, cntct_country, cntct_email, cntct_phone
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(row.contact_id)
        .bind(&row.line1)
        .bind(row.line2.as_deref())
        .bind(row.line3.as_deref())
        .bind(&row.city)
        .bind(&row.zip)
        .bind(&row.state)
        .bind(&row.country)
        .bind(&row.email)
        .bind(row.phone)
        .execute(&mut *self.tx)
        .await
        .map_err(DbError::from)?;
        Ok(())
    }

    async fn insert_account(&mut self, row: &AccountRow) -> Result<(), OnboardingError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                cust_accslno, account_no, routing_number, acc_type, balance, acc_status
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&row.slno)
        .bind(&row.account_number)
        .bind(&row.routing_number)
        .bind(row.account_type.as_str())
        .bind(row.balance)
        .bind(&row.status)
        .execute(&mut *self.tx)
        .await
        .map_err(DbError::from)?;
        Ok(())
    }

    async fn customer_links(&mut self, cust_dbid: i64) -> Result<Option<CustomerLinks>, OnboardingError> {
        let row = sqlx::query("SELECT cust_contactid, cust_accslno FROM customers WHERE cust_dbid = $1 FOR UPDATE")
            .bind(cust_dbid)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(DbError::from)?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(CustomerLinks {
            contact_id: row.try_get("cust_contactid").map_err(DbError::from)?,
            account_slno: row.try_get("cust_accslno").map_err(DbError::from)?,
        }))
    }

    async fn delete_contact(&mut self, contact_id: i64) -> Result<(), OnboardingError> {
        sqlx::query("DELETE FROM customer_contacts_info WHERE cust_contactid = $1")
            .bind(contact_id)
            .execute(&mut *self.tx)
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn delete_account(&mut self, slno: &str) -> Result<(), OnboardingError> {
        sqlx::query("DELETE FROM accounts WHERE cust_accslno = $1")
            .bind(slno)
            .execute(&mut *self.tx)
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn delete_customer(&mut self, cust_dbid: i64) -> Result<(), OnboardingError> {
        sqlx::query("DELETE FROM customers WHERE cust_dbid = $1")
            .bind(cust_dbid)
            .execute(&mut *self.tx)
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn commit(self) -> Result<(), OnboardingError> {
        self.tx.commit().await.map_err(DbError::from)?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), OnboardingError> {
        self.tx.rollback().await.map_err(DbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cust_type: &str, acc_type: &str) -> DbCustomerRecord {
        DbCustomerRecord {
            cust_dbid: 12,
            cust_firstname: "Grace".to_string(),
            cust_middlename: None,
            cust_lastname: "Hopper".to_string(),
            cust_type: cust_type.to_string(),
            cust_docid: "987654321".to_string(),
            cust_docid_type: "SSN".to_string(),
            cntct_line1: "1 Navy Yard".to_string(),
            cntct_line2: None,
            cntct_line3: None,
            cntct_city: "Arlington".to_string(),
            cntct_zip: "02474".to_string(),
            cntct_state: "VA".to_string(),
            cntct_country: "US".to_string(),
            cntct_email: "grace@example.com".to_string(),
            cntct_phone: 7035550199,
            acc_type: acc_type.to_string(),
            account_no: "021999003000001".to_string(),
            routing_number: "021000021999".to_string(),
            balance: Decimal::new(20000, 2),
            acc_status: "ACTIVE".to_string(),
        }
    }

    #[test]
    fn flat_row_becomes_the_nested_record() {
        let record = CustomerRecord::try_from(record("Personal", "CD ")).unwrap();

        assert_eq!(record.customer.id, 12);
        assert_eq!(record.customer.customer_type, CustomerType::Personal);
        assert_eq!(record.contact.zip, "02474");
        assert_eq!(record.account.account_type, AccountType::Cd);
        assert_eq!(record.account.balance.to_string(), "200.00");
    }

    #[test]
    fn unknown_stored_enum_values_fail_to_decode() {
        assert!(matches!(
            CustomerRecord::try_from(record("Trust", "CD")),
            Err(DbError::Decode(_))
        ));
        assert!(matches!(
            CustomerRecord::try_from(record("Personal", "IRA")),
            Err(DbError::Decode(_))
        ));
    }
}
