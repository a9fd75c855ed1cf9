use crate::enums::{AccountType, CustomerType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==============================================================================
// Persisted rows
// ==============================================================================
// One struct per owned table. They are produced by the onboarding workflow and
// written as-is by the storage layer.

/// A row of the `customers` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRow {
    pub cust_dbid: i64,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub customer_type: CustomerType,
    pub document_id: String,
    pub document_type: String,
    /// Foreign key into `customer_contacts_info`.
    pub contact_id: i64,
    /// Foreign key into `accounts`.
    pub account_slno: String,
}

/// A row of the `customer_contacts_info` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRow {
    pub contact_id: i64,
    pub line1: String,
    pub line2: Option<String>,
    pub line3: Option<String>,
    pub city: String,
    /// Always five digits, zero-padded.
    pub zip: String,
    pub state: String,
    pub country: String,
    pub email: String,
    pub phone: i64,
}

/// A row of the `accounts` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRow {
    pub slno: String,
    pub account_number: String,
    pub routing_number: String,
    pub account_type: AccountType,
    pub balance: Decimal,
    pub status: String,
}

// ==============================================================================
// Read model
// ==============================================================================

/// The nested shape returned by `GET /readCustomer/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer: CustomerView,
    pub contact: ContactView,
    pub account: AccountView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerView {
    pub id: i64,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    #[serde(rename = "type")]
    pub customer_type: CustomerType,
    pub document_id: String,
    pub document_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactView {
    pub line1: String,
    pub line2: Option<String>,
    pub line3: Option<String>,
    pub city: String,
    pub zip: String,
    pub state: String,
    pub country: String,
    pub email: String,
    pub phone: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub number: String,
    pub routing: String,
    pub balance: Decimal,
    pub status: String,
}

impl CustomerRecord {
    /// Assembles the read model from the three rows written at creation time.
    pub fn from_rows(customer: &CustomerRow, contact: &ContactRow, account: &AccountRow) -> Self {
        Self {
            customer: CustomerView {
                id: customer.cust_dbid,
                first_name: customer.first_name.clone(),
                middle_name: customer.middle_name.clone(),
                last_name: customer.last_name.clone(),
                customer_type: customer.customer_type,
                document_id: customer.document_id.clone(),
                document_type: customer.document_type.clone(),
            },
            contact: ContactView {
                line1: contact.line1.clone(),
                line2: contact.line2.clone(),
                line3: contact.line3.clone(),
                city: contact.city.clone(),
                zip: contact.zip.clone(),
                state: contact.state.clone(),
                country: contact.country.clone(),
                email: contact.email.clone(),
                phone: contact.phone,
            },
            account: AccountView {
                account_type: account.account_type,
                number: account.account_number.clone(),
                routing: account.routing_number.clone(),
                balance: account.balance,
                status: account.status.clone(),
            },
        }
    }
}

// ==============================================================================
// Creation result
// ==============================================================================

/// The identifiers assigned by a successful customer creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedCustomer {
    pub customer_id: i64,
    pub contact_id: i64,
    pub account: CreatedAccount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedAccount {
    pub slno: String,
    pub number: String,
    pub routing: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn record_serializes_with_nested_type_keys() {
        let customer = CustomerRow {
            cust_dbid: 7,
            first_name: "Ada".to_string(),
            middle_name: None,
            last_name: "Lovelace".to_string(),
            customer_type: CustomerType::Personal,
            document_id: "123456789".to_string(),
            document_type: "SSN".to_string(),
            contact_id: 3,
            account_slno: "A00001".to_string(),
        };
        let contact = ContactRow {
            contact_id: 3,
            line1: "1 Main St".to_string(),
            line2: None,
            line3: None,
            city: "Boston".to_string(),
            zip: "02134".to_string(),
            state: "MA".to_string(),
            country: "US".to_string(),
            email: "ada@example.com".to_string(),
            phone: 6175550100,
        };
        let account = AccountRow {
            slno: "A00001".to_string(),
            account_number: "021999007000001".to_string(),
            routing_number: "021000021999".to_string(),
            account_type: AccountType::Checking,
            balance: dec!(200.00),
            status: "ACTIVE".to_string(),
        };

        let json = serde_json::to_value(CustomerRecord::from_rows(&customer, &contact, &account)).unwrap();
        assert_eq!(json["customer"]["id"], 7);
        assert_eq!(json["customer"]["type"], "Personal");
        assert_eq!(json["contact"]["zip"], "02134");
        assert_eq!(json["account"]["type"], "CHECKING");
        assert_eq!(json["account"]["balance"], "200.00");
    }
}
