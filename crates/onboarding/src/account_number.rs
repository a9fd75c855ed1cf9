//! Synthetic account numbers.
//!
//! An account number is `routing tail + type code + sequence`:
//!
//! ```text
//! routing 021000021999, CHECKING code 7, previous sequence 42
//!         ^^^^^^------ routing tail starts at offset 6
//! => 021999 | 007 | 000043
//! ```
//!
//! Routing tail and type code together form the series prefix; sequences are
//! counted per series. Every part is fixed width and a value that does not
//! fit is an error, never truncated.

use crate::error::OnboardingError;

pub const ROUTING_TAIL_OFFSET: usize = 6;
pub const TYPE_CODE_WIDTH: usize = 3;
pub const SEQUENCE_WIDTH: usize = 6;
pub const SEQUENCE_MAX: u32 = 999_999;

/// A validated, zero-padded account type code such as `007`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountTypeCode(String);

impl AccountTypeCode {
    /// Accepts one to three digits as stored in the account type table.
    pub fn parse(raw: &str) -> Result<Self, OnboardingError> {
        let code = raw.trim();
        if code.is_empty() || code.len() > TYPE_CODE_WIDTH || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OnboardingError::malformed("account_type_table.acctypeid", raw));
        }
        Ok(Self(format!("{:0>width$}", code, width = TYPE_CODE_WIDTH)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The new account number plus the routing number it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedAccount {
    pub number: String,
    pub routing: String,
}

/// The routing number from `ROUTING_TAIL_OFFSET` onward.
pub fn routing_tail(routing: &str) -> Result<&str, OnboardingError> {
    let well_formed = routing.len() > ROUTING_TAIL_OFFSET && routing.bytes().all(|b| b.is_ascii_digit());
    if !well_formed {
        return Err(OnboardingError::malformed("accounts.routing_number", routing));
    }
    Ok(&routing[ROUTING_TAIL_OFFSET..])
}

/// The prefix shared by every account number of one routing number and type.
pub fn series_prefix(routing: &str, code: &AccountTypeCode) -> Result<String, OnboardingError> {
    Ok(format!("{}{}", routing_tail(routing)?, code.as_str()))
}

/// Reads the sequence from the trailing `SEQUENCE_WIDTH` digits of an issued account number.
pub fn sequence_of(account_number: &str) -> Result<u32, OnboardingError> {
    let number = account_number.trim();
    let malformed = || OnboardingError::malformed("accounts.account_no", account_number);

    if !number.is_ascii() || number.len() < SEQUENCE_WIDTH {
        return Err(malformed());
    }
    let suffix = &number[number.len() - SEQUENCE_WIDTH..];
    if !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    suffix.parse::<u32>().map_err(|_| malformed())
}

/// `last + 1`, zero-padded to `SEQUENCE_WIDTH`.
pub fn next_sequence(last: u32) -> Result<String, OnboardingError> {
    let next = last
        .checked_add(1)
        .filter(|n| *n <= SEQUENCE_MAX)
        .ok_or_else(|| OnboardingError::SequenceOverflow("accounts.account_no".to_string()))?;
    Ok(format!("{:0width$}", next, width = SEQUENCE_WIDTH))
}

/// Builds the next account number of the series after `last_sequence` (0 for a new series).
pub fn compose(
    code: &AccountTypeCode,
    routing: &str,
    last_sequence: u32,
) -> Result<ComposedAccount, OnboardingError> {
    let prefix = series_prefix(routing, code)?;
    let sequence = next_sequence(last_sequence)?;

    Ok(ComposedAccount {
        number: format!("{}{}", prefix, sequence),
        routing: routing.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(raw: &str) -> AccountTypeCode {
        AccountTypeCode::parse(raw).unwrap()
    }

    #[test]
    fn composes_tail_code_and_next_sequence() {
        let routing = "021000021999";
        let composed = compose(&code("007"), routing, 42).unwrap();

        assert_eq!(composed.number, format!("{}{}{}", &routing[6..], "007", "000043"));
        assert_eq!(composed.number, "021999007000043");
        assert_eq!(composed.routing, routing);
    }

    #[test]
    fn first_account_of_a_series_gets_sequence_one() {
        let composed = compose(&code("2"), "021000021", 0).unwrap();
        assert_eq!(composed.number, "021002000001");
    }

    #[test]
    fn type_codes_are_zero_padded_to_three_digits() {
        assert_eq!(code("7").as_str(), "007");
        assert_eq!(code(" 12 ").as_str(), "012");
        assert_eq!(code("123").as_str(), "123");
        for raw in ["", "1234", "A1", "-1"] {
            assert!(matches!(
                AccountTypeCode::parse(raw),
                Err(OnboardingError::MalformedIdentifier { .. })
            ));
        }
    }

    #[test]
    fn sequence_is_read_from_the_trailing_digits() {
        assert_eq!(sequence_of("021999007000042"), Ok(42));
        assert_eq!(sequence_of("021002999999"), Ok(999_999));
        assert!(sequence_of("00042").is_err());
        assert!(sequence_of("021999007OOO042").is_err());
    }

    #[test]
    fn last_sequence_overflows_instead_of_wrapping() {
        assert_eq!(next_sequence(999_998).unwrap(), "999999");
        assert_eq!(
            next_sequence(SEQUENCE_MAX),
            Err(OnboardingError::SequenceOverflow("accounts.account_no".to_string()))
        );
        assert!(compose(&code("1"), "021000021999", SEQUENCE_MAX).is_err());
    }

    #[test]
    fn routing_numbers_without_a_tail_are_malformed() {
        assert_eq!(routing_tail("0210000219"), Ok("0219"));
        assert!(routing_tail("021000").is_err());
        assert!(routing_tail("02100002X").is_err());
    }
}
