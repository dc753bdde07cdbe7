//! Native-asset amounts and validation of user-entered donation input.
//!
//! Amounts are carried as stroops (7 fixed decimal places), the smallest
//! unit of the native asset, so totals never accumulate float error.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::connection::{ConnectionState, Identity};
use crate::errors::DonationError;

/// Stroops per display unit.
pub const STROOPS_PER_UNIT: i64 = 10_000_000;
const DECIMALS: usize = 7;

/// A non-negative native-asset quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_stroops(stroops: i64) -> Self {
        Amount(stroops.max(0))
    }

    /// Whole display units, e.g. a campaign target of `1000`.
    pub fn from_units(units: i64) -> Option<Self> {
        units.checked_mul(STROOPS_PER_UNIT).map(Amount::from_stroops)
    }

    pub fn stroops(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    /// Ratio of `self` to `other` as a percentage, unbounded.
    pub fn percent_of(self, other: Amount) -> f64 {
        if other.is_zero() {
            return 0.0;
        }
        self.0 as f64 / other.0 as f64 * 100.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / STROOPS_PER_UNIT;
        let frac = self.0 % STROOPS_PER_UNIT;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{frac:0width$}", width = DECIMALS);
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Input that is not a well-formed decimal amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAmountError;

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("malformed amount")
    }
}

impl std::error::Error for ParseAmountError {}

impl FromStr for Amount {
    type Err = ParseAmountError;

    /// Accepts `[+]digits[.digits]` with at most seven fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('+').unwrap_or(s);
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(ParseAmountError);
        }
        if frac.len() > DECIMALS {
            return Err(ParseAmountError);
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ParseAmountError);
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| ParseAmountError)?
        };
        let frac: i64 = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<width$}", width = DECIMALS)
                .parse()
                .map_err(|_| ParseAmountError)?
        };

        whole
            .checked_mul(STROOPS_PER_UNIT)
            .and_then(|w| w.checked_add(frac))
            .map(Amount)
            .ok_or(ParseAmountError)
    }
}

/// A validated, strictly positive donation quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DonationAmount(Amount);

impl DonationAmount {
    pub fn new(amount: Amount) -> Option<Self> {
        (!amount.is_zero()).then_some(DonationAmount(amount))
    }

    pub fn amount(self) -> Amount {
        self.0
    }
}

impl fmt::Display for DonationAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Gate raw input before a donation flow starts.
///
/// The connection check comes first: without an identity there is nobody
/// to pay from, whatever the amount says. The caller is responsible for
/// asking the identity provider to connect on [`DonationError::NotConnected`].
pub fn validate(
    input: &str,
    connection: &ConnectionState,
) -> Result<(Identity, DonationAmount), DonationError> {
    let identity = connection
        .identity()
        .cloned()
        .ok_or(DonationError::NotConnected)?;

    let amount = input
        .parse::<Amount>()
        .ok()
        .and_then(DonationAmount::new)
        .ok_or(DonationError::InvalidAmount)?;

    Ok((identity, amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected() -> ConnectionState {
        let mut c = ConnectionState::default();
        c.connect(Identity::new("GDGQVOKHW4VEJRU2TETD6DBRKEO5ERCNF353LW5WBFW3JJWQ2BRQ6KDD"));
        c
    }

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!("150".parse::<Amount>().unwrap().stroops(), 1_500_000_000);
        assert_eq!("12.5".parse::<Amount>().unwrap().stroops(), 125_000_000);
        assert_eq!("0.0000001".parse::<Amount>().unwrap().stroops(), 1);
        assert_eq!(" +3. ".parse::<Amount>().unwrap().stroops(), 30_000_000);
        assert_eq!(".5".parse::<Amount>().unwrap().stroops(), 5_000_000);
    }

    #[test]
    fn rejects_malformed_amounts() {
        for raw in ["", " ", ".", "-5", "abc", "1e3", "NaN", "inf", "1.00000001", "1,5", "99999999999999999999"] {
            assert!(raw.parse::<Amount>().is_err(), "{raw:?} should not parse");
        }
    }

    #[test]
    fn displays_shortest_form() {
        assert_eq!(Amount::from_units(150).unwrap().to_string(), "150");
        assert_eq!(Amount::from_stroops(125_000_000).to_string(), "12.5");
        assert_eq!(Amount::from_stroops(1).to_string(), "0.0000001");
        assert_eq!(Amount::ZERO.to_string(), "0");
    }

    #[test]
    fn validate_requires_connection_before_amount() {
        let disconnected = ConnectionState::default();
        assert_eq!(
            validate("abc", &disconnected).unwrap_err(),
            DonationError::NotConnected
        );
        assert_eq!(
            validate("10", &disconnected).unwrap_err(),
            DonationError::NotConnected
        );
    }

    #[test]
    fn validate_rejects_non_positive_and_non_numeric() {
        let conn = connected();
        for raw in ["", "0", "0.0", "-1", "ten", "-0.5"] {
            assert_eq!(
                validate(raw, &conn).unwrap_err(),
                DonationError::InvalidAmount,
                "{raw:?}"
            );
        }
    }

    #[test]
    fn validate_returns_identity_and_amount() {
        let conn = connected();
        let (identity, amount) = validate("150", &conn).unwrap();
        assert_eq!(identity, *conn.identity().unwrap());
        assert_eq!(amount.amount(), Amount::from_units(150).unwrap());
    }
}
