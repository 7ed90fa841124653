//! Postcode normalization and syntax checks.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Error returned when a postcode-like string fails the syntax check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{input} is not a valid {what}")]
pub struct InvalidPostcode {
    input: String,
    what: &'static str,
}

impl InvalidPostcode {
    /// The string as the caller supplied it.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// Strip all whitespace and uppercase, then check length and charset.
fn normalize(
    raw: &str,
    min: usize,
    max: usize,
    what: &'static str,
) -> Result<String, InvalidPostcode> {
    let normalized: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let len_ok = (min..=max).contains(&normalized.len());
    if !len_ok || !normalized.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(InvalidPostcode {
            input: raw.to_string(),
            what,
        });
    }

    Ok(normalized)
}

/// A syntactically valid UK postcode in API form.
///
/// Whitespace is removed and letters are uppercased; what remains must be
/// 6 to 8 ASCII letters or digits. The check is purely syntactic: the API's
/// `validate` endpoint decides whether the postcode actually exists.
///
/// # Examples
///
/// ```
/// use postcodes_client::postcode::Postcode;
///
/// let pc = Postcode::parse("bh12 2bl").unwrap();
/// assert_eq!(pc.as_str(), "BH122BL");
///
/// // Too short once spaces are gone
/// assert!(Postcode::parse("W1 A").is_err());
///
/// // Punctuation is rejected
/// assert!(Postcode::parse("!5G %tg").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Postcode(String);

impl Postcode {
    pub fn parse(raw: &str) -> Result<Self, InvalidPostcode> {
        normalize(raw, 6, 8, "postcode").map(Postcode)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The leading part of a postcode, as typed into an autocomplete box.
///
/// Normalized like [`Postcode`] but only 1 to 8 characters are required.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PostcodePrefix(String);

impl PostcodePrefix {
    pub fn parse(raw: &str) -> Result<Self, InvalidPostcode> {
        normalize(raw, 1, 8, "postcode prefix").map(PostcodePrefix)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The outward code of a postcode (e.g. "BH12"), 2 to 4 characters.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Outcode(String);

impl Outcode {
    pub fn parse(raw: &str) -> Result<Self, InvalidPostcode> {
        normalize(raw, 2, 4, "outcode").map(Outcode)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_newtype_impls {
    ($ty:ident) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($ty), "({})"), self.0)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $ty {
            type Err = InvalidPostcode;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::parse(s)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_newtype_impls!(Postcode);
string_newtype_impls!(PostcodePrefix);
string_newtype_impls!(Outcode);
