use onboarding::{OnboardingError, UniqueField};
use thiserror::Error;

// Both names must match the constraints declared in `sql/schema.sql`; a
// mismatch turns duplicates into query errors.

/// Unique constraint guarding `customer_contacts_info.cntct_phone`.
pub const PHONE_UNIQUE_CONSTRAINT: &str = "uq_contacts_phone";
/// Unique constraint guarding `customers.cust_docid`.
pub const DOCID_UNIQUE_CONSTRAINT: &str = "uq_customers_docid";

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database connection settings: {0}")]
    ConnectionConfigError(String),

    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Stored row could not be decoded: {0}")]
    Decode(String),

    #[error("Connectivity probe returned {0} instead of 1")]
    UnexpectedProbeResult(i32),
}

impl DbError {
    /// True when the database could not be reached at all, as opposed to a query failing.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            DbError::Sqlx(
                sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::WorkerCrashed
            )
        )
    }

    /// The owned field whose unique constraint this error reports, if any.
    pub fn unique_field(&self) -> Option<UniqueField> {
        let DbError::Sqlx(sqlx::Error::Database(db_err)) = self else {
            return None;
        };
        if !db_err.is_unique_violation() {
            return None;
        }
        match db_err.constraint() {
            Some(PHONE_UNIQUE_CONSTRAINT) => Some(UniqueField::Phone),
            Some(DOCID_UNIQUE_CONSTRAINT) => Some(UniqueField::DocumentId),
            _ => None,
        }
    }
}

impl From<DbError> for OnboardingError {
    fn from(err: DbError) -> Self {
        if let Some(field) = err.unique_field() {
            return OnboardingError::DuplicateField(field);
        }
        if err.is_connection_failure() {
            return OnboardingError::ConnectionUnavailable(err.to_string());
        }
        OnboardingError::QueryExecutionError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_exhaustion_is_a_connection_failure() {
        let err: OnboardingError = DbError::Sqlx(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(err, OnboardingError::ConnectionUnavailable(_)));

        let err: OnboardingError = DbError::Sqlx(sqlx::Error::PoolClosed).into();
        assert!(matches!(err, OnboardingError::ConnectionUnavailable(_)));
    }

    #[test]
    fn other_failures_are_query_errors() {
        let err: OnboardingError = DbError::Sqlx(sqlx::Error::RowNotFound).into();
        assert!(matches!(err, OnboardingError::QueryExecutionError(_)));

        let err: OnboardingError = DbError::Decode("bad customer type".to_string()).into();
        assert!(matches!(err, OnboardingError::QueryExecutionError(_)));
    }

    #[test]
    fn non_database_errors_name_no_unique_field() {
        assert_eq!(DbError::Sqlx(sqlx::Error::RowNotFound).unique_field(), None);
    }

    #[test]
    fn constraint_names_match_the_schema() {
        let schema = include_str!("../sql/schema.sql");
        assert!(schema.contains(&format!("CONSTRAINT {} UNIQUE (cntct_phone)", PHONE_UNIQUE_CONSTRAINT)));
        assert!(schema.contains(&format!("CONSTRAINT {} UNIQUE (cust_docid)", DOCID_UNIQUE_CONSTRAINT)));
    }
}
