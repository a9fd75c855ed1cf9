//! Inbound customer payload and the rules it has to satisfy.
//!
//! `CustomerPayload` mirrors the JSON body of `POST /createCustomer` and is
//! deliberately loose: every leaf is optional so that a missing field becomes
//! a violation message instead of a deserialization failure. Unknown keys are
//! still rejected structurally. `NewCustomer` is the strongly typed result of
//! a payload that passed every rule.

use crate::error::OnboardingError;
use core_types::{AccountType, CustomerType};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PHONE_DIGITS: usize = 10;
pub const ZIP_DIGITS: usize = 5;
pub const SSN_DIGITS: usize = 9;

// ==============================================================================
// Payload
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerPayload {
    #[serde(default)]
    pub name: NamePayload,
    #[serde(default, rename = "type")]
    pub customer_type: Option<String>,
    #[serde(default)]
    pub document: DocumentPayload,
    #[serde(default)]
    pub address: AddressPayload,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<DigitsField>,
    #[serde(default)]
    pub account: AccountPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamePayload {
    pub first: Option<String>,
    pub middle: Option<String>,
    pub last: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentPayload {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub document_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddressPayload {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub line3: Option<String>,
    pub city: Option<String>,
    pub zip: Option<DigitsField>,
    pub state: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountPayload {
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    pub routing: Option<String>,
}

/// A numeric field clients send either as a JSON number or as a digit string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DigitsField {
    Number(u64),
    Text(String),
}

impl DigitsField {
    fn text(&self) -> String {
        match self {
            DigitsField::Number(n) => n.to_string(),
            DigitsField::Text(s) => s.trim().to_string(),
        }
    }
}

// ==============================================================================
// Violations
// ==============================================================================

/// A single broken rule, addressed by the dotted path of the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn present_digits(value: &Option<DigitsField>) -> Option<String> {
    value.as_ref().map(DigitsField::text).filter(|s| !s.is_empty())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_valid_email(email: &str) -> bool {
    email.matches('@').count() == 1 && email.contains('.')
}

/// Integer semantics: exactly ten digits and no leading zero.
fn is_valid_phone(phone: &str) -> bool {
    is_digits(phone) && phone.len() == PHONE_DIGITS && !phone.starts_with('0')
}

/// Checks every rule and collects every violation, in rule order.
pub fn validate(payload: &CustomerPayload) -> Vec<Violation> {
    let mut violations = Vec::new();

    // --- 1. Required, non-blank fields ---
    let required: [(&'static str, bool); 11] = [
        ("name.first", present(&payload.name.first).is_some()),
        ("name.last", present(&payload.name.last).is_some()),
        ("type", present(&payload.customer_type).is_some()),
        ("document.id", present(&payload.document.id).is_some()),
        ("document.type", present(&payload.document.document_type).is_some()),
        ("address.line1", present(&payload.address.line1).is_some()),
        ("address.city", present(&payload.address.city).is_some()),
        ("address.zip", present_digits(&payload.address.zip).is_some()),
        ("address.state", present(&payload.address.state).is_some()),
        ("address.country", present(&payload.address.country).is_some()),
        ("email", present(&payload.email).is_some()),
    ];
    for (field, ok) in required {
        if !ok {
            violations.push(Violation::new(field, "is required"));
        }
    }
    if present_digits(&payload.phone).is_none() {
        violations.push(Violation::new("phone", "is required"));
    }
    if present(&payload.account.account_type).is_none() {
        violations.push(Violation::new("account.type", "is required"));
    }

    // --- 2. Formats, checked only for fields that are present ---
    if let Some(email) = present(&payload.email) {
        if !is_valid_email(email) {
            violations.push(Violation::new(
                "email",
                "must contain exactly one '@' and at least one '.'",
            ));
        }
    }
    if let Some(phone) = present_digits(&payload.phone) {
        if !is_valid_phone(&phone) {
            violations.push(Violation::new("phone", "must be a 10-digit integer"));
        }
    }
    if let (Some(doc_type), Some(doc_id)) = (
        present(&payload.document.document_type),
        present(&payload.document.id),
    ) {
        if doc_type.eq_ignore_ascii_case("SSN") && !(is_digits(doc_id) && doc_id.len() == SSN_DIGITS) {
            violations.push(Violation::new(
                "document.id",
                "must be exactly 9 digits when document.type is SSN",
            ));
        }
    }
    if let Some(zip) = present_digits(&payload.address.zip) {
        if !is_digits(&zip) || zip.len() > ZIP_DIGITS {
            violations.push(Violation::new("address.zip", "must be 1 to 5 digits"));
        }
    }

    // --- 3. Enumerations ---
    if let Some(customer_type) = present(&payload.customer_type) {
        if customer_type.parse::<CustomerType>().is_err() {
            violations.push(Violation::new("type", "must be one of Personal, Organization"));
        }
    }
    if let Some(account_type) = present(&payload.account.account_type) {
        if account_type.parse::<AccountType>().is_err() {
            violations.push(Violation::new("account.type", "must be one of CHECKING, SAVINGS, CD"));
        }
    }

    violations
}

// ==============================================================================
// Validated input
// ==============================================================================

/// A customer payload that passed `validate`, with every field in its final form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub customer_type: CustomerType,
    pub document_id: String,
    pub document_type: String,
    pub line1: String,
    pub line2: Option<String>,
    pub line3: Option<String>,
    pub city: String,
    /// Zero-padded to five digits.
    pub zip: String,
    pub state: String,
    pub country: String,
    pub email: String,
    pub phone: i64,
    pub account_type: AccountType,
    /// Not validated here; its existence is checked against the branch table.
    pub routing: String,
}

impl TryFrom<CustomerPayload> for NewCustomer {
    type Error = OnboardingError;

    fn try_from(payload: CustomerPayload) -> Result<Self, Self::Error> {
        let violations = validate(&payload);
        if !violations.is_empty() {
            return Err(OnboardingError::ValidationFailed(violations));
        }

        // Every unwrap-like step below is guarded by `validate`; the fallbacks
        // only keep this function total.
        let text = |value: &Option<String>| present(value).unwrap_or_default().to_string();
        let optional = |value: &Option<String>| present(value).map(str::to_string);
        let invalid = |field: &'static str, message: &str| {
            OnboardingError::ValidationFailed(vec![Violation::new(field, message)])
        };

        let customer_type = text(&payload.customer_type)
            .parse::<CustomerType>()
            .map_err(|e| invalid("type", &e.to_string()))?;
        let account_type = text(&payload.account.account_type)
            .parse::<AccountType>()
            .map_err(|e| invalid("account.type", &e.to_string()))?;
        let phone = present_digits(&payload.phone)
            .and_then(|p| p.parse::<i64>().ok())
            .ok_or_else(|| invalid("phone", "must be a 10-digit integer"))?;
        let zip = present_digits(&payload.address.zip).unwrap_or_default();

        Ok(Self {
            first_name: text(&payload.name.first),
            middle_name: optional(&payload.name.middle),
            last_name: text(&payload.name.last),
            customer_type,
            document_id: text(&payload.document.id),
            document_type: text(&payload.document.document_type),
            line1: text(&payload.address.line1),
            line2: optional(&payload.address.line2),
            line3: optional(&payload.address.line3),
            city: text(&payload.address.city),
            zip: format!("{:0>width$}", zip, width = ZIP_DIGITS),
            state: text(&payload.address.state),
            country: text(&payload.address.country),
            email: text(&payload.email),
            phone,
            account_type,
            routing: text(&payload.account.routing),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn valid_payload() -> CustomerPayload {
        serde_json::from_value(json!({
            "name": { "first": "Ada", "middle": "King", "last": "Lovelace" },
            "type": "Personal",
            "document": { "id": "123456789", "type": "SSN" },
            "address": {
                "line1": "12 Analytical Way",
                "line2": "Suite 4",
                "city": "Boston",
                "zip": 2134,
                "state": "MA",
                "country": "US"
            },
            "email": "ada@example.com",
            "phone": 6175550100u64,
            "account": { "type": "CHECKING", "routing": "021000021999" }
        }))
        .unwrap()
    }

    fn fields(violations: &[Violation]) -> Vec<&'static str> {
        violations.iter().map(|v| v.field).collect()
    }

    #[test]
    fn valid_payload_has_no_violations() {
        assert!(validate(&valid_payload()).is_empty());
    }

    #[test]
    fn each_missing_required_field_is_reported_alone() {
        type Blank = fn(&mut CustomerPayload);
        let cases: [(&str, Blank); 13] = [
            ("name.first", |p| p.name.first = None),
            ("name.last", |p| p.name.last = Some("  ".to_string())),
            ("type", |p| p.customer_type = None),
            ("document.id", |p| p.document.id = None),
            ("document.type", |p| p.document.document_type = None),
            ("address.line1", |p| p.address.line1 = None),
            ("address.city", |p| p.address.city = None),
            ("address.zip", |p| p.address.zip = None),
            ("address.state", |p| p.address.state = None),
            ("address.country", |p| p.address.country = Some(String::new())),
            ("email", |p| p.email = None),
            ("phone", |p| p.phone = None),
            ("account.type", |p| p.account.account_type = None),
        ];

        for (field, blank) in cases {
            let mut payload = valid_payload();
            blank(&mut payload);
            let violations = validate(&payload);
            assert_eq!(fields(&violations), vec![field], "blanking {}", field);
            assert_eq!(violations[0].message, "is required");
        }
    }

    #[test]
    fn all_violations_are_collected() {
        let mut payload = valid_payload();
        payload.email = Some("ada.example.com".to_string());
        payload.phone = Some(DigitsField::Number(12345));
        payload.customer_type = Some("personal".to_string());
        payload.account.account_type = Some("BROKERAGE".to_string());

        assert_eq!(
            fields(&validate(&payload)),
            vec!["email", "phone", "type", "account.type"]
        );
    }

    #[test]
    fn email_needs_exactly_one_at_and_a_dot() {
        for (email, ok) in [
            ("a@b.com", true),
            ("first.last@bank", true),
            ("a@@b.com", false),
            ("a@b@c.com", false),
            ("a@bcom", false),
            ("abc.com", false),
        ] {
            assert_eq!(is_valid_email(email), ok, "{}", email);
        }
    }

    #[test]
    fn phone_must_be_a_ten_digit_integer() {
        let mut payload = valid_payload();
        for (phone, ok) in [
            (DigitsField::Number(6175550100), true),
            (DigitsField::Text("6175550100".to_string()), true),
            (DigitsField::Text("0175550100".to_string()), false),
            (DigitsField::Number(617555010), false),
            (DigitsField::Number(61755501000), false),
            (DigitsField::Text("617-555-010".to_string()), false),
        ] {
            payload.phone = Some(phone.clone());
            assert_eq!(validate(&payload).is_empty(), ok, "{:?}", phone);
        }
    }

    #[test]
    fn ssn_documents_need_nine_digits_case_insensitively() {
        let mut payload = valid_payload();
        payload.document.document_type = Some("ssn".to_string());
        payload.document.id = Some("12345678".to_string());
        assert_eq!(fields(&validate(&payload)), vec!["document.id"]);

        payload.document.id = Some("12345678X".to_string());
        assert_eq!(fields(&validate(&payload)), vec!["document.id"]);

        payload.document.document_type = Some("PASSPORT".to_string());
        assert!(validate(&payload).is_empty());
    }

    #[test]
    fn zip_longer_than_five_digits_is_rejected() {
        let mut payload = valid_payload();
        payload.address.zip = Some(DigitsField::Text("021345".to_string()));
        assert_eq!(fields(&validate(&payload)), vec!["address.zip"]);
    }

    #[test]
    fn unknown_fields_are_rejected_structurally() {
        let result = serde_json::from_value::<CustomerPayload>(json!({
            "name": { "first": "Ada", "nickname": "Countess" }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn missing_nested_objects_report_each_field() {
        let payload: CustomerPayload = serde_json::from_value(json!({ "type": "Organization" })).unwrap();
        let reported = fields(&validate(&payload));
        assert!(reported.contains(&"address.line1"));
        assert!(reported.contains(&"account.type"));
        assert!(!reported.contains(&"type"));
    }

    #[test]
    fn conversion_normalises_the_payload() {
        let customer = NewCustomer::try_from(valid_payload()).unwrap();

        assert_eq!(customer.zip, "02134");
        assert_eq!(customer.phone, 6175550100);
        assert_eq!(customer.customer_type, CustomerType::Personal);
        assert_eq!(customer.account_type, AccountType::Checking);
        assert_eq!(customer.middle_name.as_deref(), Some("King"));
        assert_eq!(customer.line3, None);
    }

    #[test]
    fn conversion_fails_with_every_violation() {
        let mut payload = valid_payload();
        payload.email = None;
        payload.account.account_type = Some("cd".to_string());

        match NewCustomer::try_from(payload) {
            Err(OnboardingError::ValidationFailed(violations)) => {
                assert_eq!(fields(&violations), vec!["email", "account.type"]);
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }
}
