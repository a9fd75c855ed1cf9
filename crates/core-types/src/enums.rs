use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a customer is a natural person or a legal entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerType {
    Personal,
    Organization,
}

impl CustomerType {
    pub const ALL: [CustomerType; 2] = [CustomerType::Personal, CustomerType::Organization];

    /// The exact spelling stored in the `customers` table and accepted over HTTP.
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerType::Personal => "Personal",
            CustomerType::Organization => "Organization",
        }
    }
}

impl FromStr for CustomerType {
    type Err = CoreError;

    /// Matching is exact; "personal" is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CustomerType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CoreError::InvalidInput(
                    "customer type".to_string(),
                    format!("'{}' is not one of Personal, Organization", s),
                )
            })
    }
}

impl fmt::Display for CustomerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The product an account is opened as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    Checking,
    Savings,
    Cd,
}

impl AccountType {
    pub const ALL: [AccountType; 3] = [AccountType::Checking, AccountType::Savings, AccountType::Cd];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "CHECKING",
            AccountType::Savings => "SAVINGS",
            AccountType::Cd => "CD",
        }
    }
}

impl FromStr for AccountType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CoreError::InvalidInput(
                    "account type".to_string(),
                    format!("'{}' is not one of CHECKING, SAVINGS, CD", s),
                )
            })
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
