use crate::identifiers::KeyColumn;
use crate::validation::Violation;
use core_types::AccountType;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The customer fields whose values must be unique across the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueField {
    Phone,
    DocumentId,
}

impl UniqueField {
    pub fn as_str(&self) -> &'static str {
        match self {
            UniqueField::Phone => "phone",
            UniqueField::DocumentId => "document_id",
        }
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OnboardingError {
    #[error("Customer payload failed validation with {} violation(s)", .0.len())]
    ValidationFailed(Vec<Violation>),

    #[error("A customer with this {0} already exists")]
    DuplicateField(UniqueField),

    #[error("Unknown {field}: '{value}'")]
    UnknownReference { field: &'static str, value: String },

    #[error("Stored value '{value}' in {column} does not have the expected shape")]
    MalformedIdentifier { column: String, value: String },

    #[error("Stored key '{value}' in {column} is not a non-negative integer")]
    InvalidKeyFormat { column: KeyColumn, value: String },

    #[error("No account type code is registered for {0}")]
    UnknownAccountType(AccountType),

    #[error("The sequence for {0} is exhausted")]
    SequenceOverflow(String),

    #[error("Database connection unavailable: {0}")]
    ConnectionUnavailable(String),

    #[error("Database query failed: {0}")]
    QueryExecutionError(String),

    #[error("No customer found with ID {0}")]
    CustomerNotFound(i64),
}

impl OnboardingError {
    /// A stable, machine-readable name for the failure category.
    pub fn category(&self) -> &'static str {
        match self {
            OnboardingError::ValidationFailed(_) => "validation_failed",
            OnboardingError::DuplicateField(_) => "duplicate_field",
            OnboardingError::UnknownReference { .. } => "unknown_reference",
            OnboardingError::MalformedIdentifier { .. } => "malformed_identifier",
            OnboardingError::InvalidKeyFormat { .. } => "invalid_key_format",
            OnboardingError::UnknownAccountType(_) => "unknown_account_type",
            OnboardingError::SequenceOverflow(_) => "sequence_overflow",
            OnboardingError::ConnectionUnavailable(_) => "connection_unavailable",
            OnboardingError::QueryExecutionError(_) => "query_execution_error",
            OnboardingError::CustomerNotFound(_) => "not_found",
        }
    }

    pub(crate) fn malformed(column: impl Into<String>, value: impl Into<String>) -> Self {
        OnboardingError::MalformedIdentifier {
            column: column.into(),
            value: value.into(),
        }
    }
}
