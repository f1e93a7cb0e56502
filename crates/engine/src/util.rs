//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine};

pub(crate) const ACCOUNT_NAME_MAX_CHARS: usize = 50;
pub(crate) const DESCRIPTION_MAX_CHARS: usize = 200;
pub(crate) const DEFAULT_ACCOUNT_COLOR: &str = "#3B82F6";

/// Declares a closed set of string-backed values stored as `snake_case` text.
///
/// Generates `as_str`, `TryFrom<&str>` (unknown values are `InvalidInput`),
/// `Display` and `FromStr`.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($label:literal) {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl TryFrom<&str> for $name {
            type Error = $crate::EngineError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                match value.trim() {
                    $($text => Ok(Self::$variant),)+
                    other => Err($crate::EngineError::InvalidInput(format!(
                        concat!("invalid ", $label, ": {}"),
                        other
                    ))),
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl core::str::FromStr for $name {
            type Err = $crate::EngineError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::try_from(s)
            }
        }
    };
}

pub(crate) use string_enum;

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidInput(format!("invalid {label} id")))
}

/// Parse a currency code stored in the DB.
pub(crate) fn model_currency(value: &str) -> ResultEngine<Currency> {
    Currency::try_from(value)
}

/// Trim and NFC-normalize an account name, enforcing the length bound.
pub(crate) fn normalize_account_name(value: &str) -> ResultEngine<String> {
    let name: String = value.trim().nfc().collect();
    if name.is_empty() {
        return Err(EngineError::InvalidInput(
            "account name is required".to_string(),
        ));
    }
    if name.chars().count() > ACCOUNT_NAME_MAX_CHARS {
        return Err(EngineError::InvalidInput(format!(
            "account name cannot exceed {ACCOUNT_NAME_MAX_CHARS} characters"
        )));
    }
    Ok(name)
}

pub(crate) fn normalize_required_text(
    value: &str,
    label: &str,
    max_chars: Option<usize>,
) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!("{label} is required")));
    }
    if let Some(max) = max_chars
        && trimmed.chars().count() > max
    {
        return Err(EngineError::InvalidInput(format!(
            "{label} cannot exceed {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Accepts `#RGB` and `#RRGGBB` hex colors.
pub(crate) fn validate_color(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    let valid = trimmed
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        return Err(EngineError::InvalidInput(format!(
            "invalid color format: {value}"
        )));
    }
    Ok(trimmed.to_string())
}
