//! Draft validation
//!
//! Two profiles exist. `PriceOnly` is the canonical one; `Strict` is kept for
//! deployments that still require the full device form.

use crate::error::ValidationError;
use crate::types::Element;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Form fields that `Strict` additionally requires.
pub const STRICT_REQUIRED_FIELDS: [&str; 4] = ["capacity", "color", "screenSize", "generation"];

pub const REJECTION_MESSAGE: &str =
    "Please fill in all required fields and make sure the price is a positive number.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationProfile {
    /// Name plus a positive numeric price.
    #[default]
    PriceOnly,
    /// Everything `PriceOnly` checks, plus the four device fields.
    Strict,
}

impl ValidationProfile {
    pub fn name(&self) -> &'static str {
        match self {
            ValidationProfile::PriceOnly => "price-only",
            ValidationProfile::Strict => "strict",
        }
    }

    /// First rule the draft breaks, in form order.
    pub fn validate(self, draft: &Element) -> Result<(), ValidationError> {
        if draft.name.is_empty() {
            return Err(ValidationError::MissingName);
        }

        if self == ValidationProfile::Strict {
            if let Some(field) = STRICT_REQUIRED_FIELDS
                .iter()
                .find(|field| draft.data.is_blank(field))
            {
                return Err(ValidationError::MissingField(field.to_string()));
            }
        }

        if draft.data.is_blank("price") {
            return Err(ValidationError::MissingPrice);
        }
        let price = draft
            .data
            .number("price")
            .ok_or_else(|| ValidationError::PriceNotNumeric(draft.data.text("price")))?;
        if price <= 0.0 {
            return Err(ValidationError::PriceNotPositive(price));
        }
        Ok(())
    }

    pub fn is_valid(self, draft: &Element) -> bool {
        self.validate(draft).is_ok()
    }
}

impl FromStr for ValidationProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "price-only" | "price_only" | "price" => Ok(ValidationProfile::PriceOnly),
            "strict" | "full" => Ok(ValidationProfile::Strict),
            other => Err(format!(
                "Unknown validation profile '{}'. Valid values: price-only, strict",
                other
            )),
        }
    }
}

impl fmt::Display for ValidationProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Parse a user-typed attribute value: JSON literals (numbers, booleans, null,
/// quoted strings, arrays, objects) are kept typed, anything else is a plain string.
pub fn parse_attribute_value(raw: &str) -> Value {
    let raw = raw.trim();
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
