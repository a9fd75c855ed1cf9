//! Next-key derivation for the three owned tables.
//!
//! Keys are derived from the current maximum of the key column, which the
//! storage layer hands over as text. Customer and contact ids are plain
//! integers; account slnos are `<letters><digits>` with a five digit suffix.

use crate::error::OnboardingError;
use serde::Serialize;
use std::fmt;

/// First value handed out by an empty numeric key column.
pub const NUMERIC_SEED: i64 = 1;
/// Width of the numeric part of a prefixed key such as `A00042`.
pub const PREFIXED_SUFFIX_WIDTH: usize = 5;
const PREFIXED_SUFFIX_MAX: u64 = 99_999;

/// A key column whose next value is derived from its current maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum KeyColumn {
    CustomerId,
    ContactId,
    AccountSlno,
}

impl KeyColumn {
    pub fn table(&self) -> &'static str {
        match self {
            KeyColumn::CustomerId => "customers",
            KeyColumn::ContactId => "customer_contacts_info",
            KeyColumn::AccountSlno => "accounts",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            KeyColumn::CustomerId => "cust_dbid",
            KeyColumn::ContactId => "cust_contactid",
            KeyColumn::AccountSlno => "cust_accslno",
        }
    }
}

impl fmt::Display for KeyColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table(), self.column())
    }
}

/// Returns `max + 1`, or `NUMERIC_SEED` when the column is empty.
pub fn next_numeric(column: KeyColumn, max: Option<&str>) -> Result<i64, OnboardingError> {
    let Some(raw) = max else {
        return Ok(NUMERIC_SEED);
    };

    let current = raw
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|n| *n >= 0)
        .ok_or_else(|| OnboardingError::InvalidKeyFormat {
            column,
            value: raw.to_string(),
        })?;

    current
        .checked_add(1)
        .ok_or_else(|| OnboardingError::SequenceOverflow(column.to_string()))
}

/// Splits `C10025` into `("C", "10025")`. Both parts must be non-empty.
pub fn split_prefixed(value: &str) -> Option<(&str, &str)> {
    let digits_start = value.find(|c: char| c.is_ascii_digit())?;
    let (prefix, digits) = value.split_at(digits_start);

    let well_formed = !prefix.is_empty()
        && prefix.chars().all(|c| c.is_ascii_alphabetic())
        && digits.chars().all(|c| c.is_ascii_digit());

    well_formed.then_some((prefix, digits))
}

/// Returns the key following `max`, keeping its prefix.
///
/// An empty column starts at `seed_prefix` followed by `00001`. A stored value
/// that is not `<letters><digits>` is reported, never guessed around.
pub fn next_prefixed(
    column: KeyColumn,
    max: Option<&str>,
    seed_prefix: &str,
) -> Result<String, OnboardingError> {
    let Some(raw) = max else {
        return Ok(format!("{}{:0width$}", seed_prefix, 1, width = PREFIXED_SUFFIX_WIDTH));
    };

    let value = raw.trim();
    let (prefix, digits) =
        split_prefixed(value).ok_or_else(|| OnboardingError::malformed(column.to_string(), raw))?;

    let next = digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_add(1))
        .filter(|n| *n <= PREFIXED_SUFFIX_MAX)
        .ok_or_else(|| OnboardingError::SequenceOverflow(column.to_string()))?;

    Ok(format!("{}{:0width$}", prefix, next, width = PREFIXED_SUFFIX_WIDTH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_keys_increment_the_stored_maximum() {
        assert_eq!(next_numeric(KeyColumn::CustomerId, Some("41")), Ok(42));
        assert_eq!(next_numeric(KeyColumn::ContactId, Some(" 0 ")), Ok(1));
    }

    #[test]
    fn empty_numeric_column_seeds_at_one() {
        assert_eq!(next_numeric(KeyColumn::CustomerId, None), Ok(1));
        assert_eq!(next_numeric(KeyColumn::ContactId, None), Ok(NUMERIC_SEED));
    }

    #[test]
    fn unparseable_numeric_maximum_is_an_invalid_key() {
        for raw in ["C100", "", "12.5", "-3"] {
            assert_eq!(
                next_numeric(KeyColumn::CustomerId, Some(raw)),
                Err(OnboardingError::InvalidKeyFormat {
                    column: KeyColumn::CustomerId,
                    value: raw.to_string(),
                })
            );
        }
    }

    #[test]
    fn numeric_overflow_is_reported() {
        let max = i64::MAX.to_string();
        assert!(matches!(
            next_numeric(KeyColumn::ContactId, Some(&max)),
            Err(OnboardingError::SequenceOverflow(_))
        ));
    }

    #[test]
    fn prefixed_keys_keep_prefix_and_width() {
        assert_eq!(next_prefixed(KeyColumn::AccountSlno, Some("C10025"), "A").unwrap(), "C10026");
        assert_eq!(next_prefixed(KeyColumn::AccountSlno, Some("A00099"), "A").unwrap(), "A00100");
        assert_eq!(next_prefixed(KeyColumn::AccountSlno, Some("ACC00009"), "A").unwrap(), "ACC00010");
    }

    #[test]
    fn empty_prefixed_column_starts_at_the_seed_prefix() {
        assert_eq!(next_prefixed(KeyColumn::AccountSlno, None, "A").unwrap(), "A00001");
        assert_eq!(next_prefixed(KeyColumn::AccountSlno, None, "SL").unwrap(), "SL00001");
    }

    #[test]
    fn malformed_prefixed_keys_are_reported() {
        for raw in ["10025", "C", "C10A25", "C-10025", "é10025"] {
            assert_eq!(
                next_prefixed(KeyColumn::AccountSlno, Some(raw), "A"),
                Err(OnboardingError::MalformedIdentifier {
                    column: "accounts.cust_accslno".to_string(),
                    value: raw.to_string(),
                }),
                "{}",
                raw
            );
        }
    }

    #[test]
    fn prefixed_suffix_never_widens() {
        assert!(matches!(
            next_prefixed(KeyColumn::AccountSlno, Some("A99999"), "A"),
            Err(OnboardingError::SequenceOverflow(_))
        ));
        assert!(matches!(
            next_prefixed(KeyColumn::AccountSlno, Some("A100000"), "A"),
            Err(OnboardingError::SequenceOverflow(_))
        ));
    }
}
