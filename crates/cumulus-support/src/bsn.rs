//! Dutch citizen service numbers (BSN).
//!
//! Only formal validity is checked: the value is eight or nine digits and
//! passes the elfproef, the weighted mod-11 checksum. Whether the number is
//! actually issued is out of scope.

use std::str::FromStr;

use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};

/// Why a value is not a valid BSN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BsnError {
    #[error("provided BSN is not a number")]
    NotANumber,

    #[error("provided BSN is of incorrect length, provided length is {0}")]
    InvalidLength(usize),

    #[error("provided BSN does not satisfy elfproef")]
    Elfproef,
}

/// A formally valid BSN.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deref, Display, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bsn(String);

impl Bsn {
    /// Checks that `value` is eight or nine digits and passes the elfproef.
    pub fn validate(value: &str) -> Result<(), BsnError> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BsnError::NotANumber);
        }
        if !(8..=9).contains(&value.len()) {
            return Err(BsnError::InvalidLength(value.len()));
        }
        if !Self::elfproef(value) {
            return Err(BsnError::Elfproef);
        }
        Ok(())
    }

    /// Weighted mod-11 checksum every BSN satisfies.
    ///
    /// Eight-digit numbers are left-padded with a zero. Digits are weighted
    /// from the length down to 2, the last digit with -1, and the total must
    /// be divisible by 11. Returns `false` for anything that is not all
    /// digits.
    pub fn elfproef(value: &str) -> bool {
        let Some(mut digits) = value
            .chars()
            .map(|c| c.to_digit(10).map(|d| d as i64))
            .collect::<Option<Vec<_>>>()
        else {
            return false;
        };
        if digits.is_empty() {
            return false;
        }

        // Numbers issued before 2007 may have eight digits.
        if digits.len() == 8 {
            digits.insert(0, 0);
        }

        let len = digits.len() as i64;
        let last = digits.len() - 1;
        let total: i64 = digits
            .iter()
            .enumerate()
            .map(|(i, &digit)| {
                if i == last {
                    -digit
                } else {
                    digit * (len - i as i64)
                }
            })
            .sum();

        total % 11 == 0
    }

    /// The number as given.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the value, returning the number.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FromStr for Bsn {
    type Err = BsnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::validate(s)?;
        Ok(Self(s.to_owned()))
    }
}

impl TryFrom<&str> for Bsn {
    type Error = BsnError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for Bsn {
    type Error = BsnError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::validate(&value)?;
        Ok(Self(value))
    }
}

impl From<Bsn> for String {
    fn from(bsn: Bsn) -> Self {
        bsn.0
    }
}

impl AsRef<str> for Bsn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
