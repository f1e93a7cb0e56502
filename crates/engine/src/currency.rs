use serde::{Deserialize, Serialize};

use crate::EngineError;

/// ISO-like currency code attached to an account.
///
/// The engine never converts between currencies: balances are compared and
/// summed in each account's own minor units. The code is kept so callers can
/// render amounts correctly.
///
/// Codes are three ASCII letters, normalized to uppercase. The default is
/// `INR`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub const DEFAULT_CODE: &'static str = "INR";

    /// Canonical currency code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self(Self::DEFAULT_CODE.to_string())
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let code = value.trim().to_ascii_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(EngineError::InvalidInput(format!(
                "invalid currency code: {value}"
            )));
        }
        Ok(Self(code))
    }
}

impl core::str::FromStr for Currency {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}
