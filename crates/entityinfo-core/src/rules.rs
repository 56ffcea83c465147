//! Admissibility rules for manifest attribute values and names.
//!
//! [`validate`] checks a submitted attribute map against a manifest's
//! definitions. It is shared by attachment, the dry-run validate endpoint,
//! and single-file manifest edits. The name and choice-set checks guard
//! manifest import and attribute creation.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::defaults::TEXT_MAX_LEN;
use crate::models::{
    AttributeDefinition, AttributeType, AttributeValue, SubmittedAttributes, TypedAttributes,
};

static ATTRIBUTE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9]{1,32}$").expect("attribute name pattern is valid")
});

static CHOICE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9\-_!%&/()=?*+#.;,]{1,32}$").expect("choice token pattern is valid")
});

/// Why a submission or a definition was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("Missing required attribute")]
    MissingRequired { attribute: String },

    #[error("Invalid choice field")]
    InvalidChoice { attribute: String },

    #[error("Field required")]
    FieldRequired { attribute: String },

    #[error("text too long")]
    TextTooLong { attribute: String },

    #[error("regex validation error")]
    InvalidName { name: String },

    #[error("regex value error")]
    InvalidChoiceSet { attribute: String },
}

impl RuleViolation {
    /// Attribute (or candidate name) the violation refers to.
    pub fn attribute(&self) -> &str {
        match self {
            Self::MissingRequired { attribute }
            | Self::InvalidChoice { attribute }
            | Self::FieldRequired { attribute }
            | Self::TextTooLong { attribute }
            | Self::InvalidChoiceSet { attribute } => attribute,
            Self::InvalidName { name } => name,
        }
    }
}

impl From<RuleViolation> for crate::Error {
    fn from(v: RuleViolation) -> Self {
        crate::Error::InvalidInput(v.to_string())
    }
}

/// Check `submitted` against `definitions` in definition order, stopping at the first failure.
///
/// Requiredness looks at key presence only. The type rules treat `null` and
/// an empty string the same as an absent value. Keys without a definition are
/// ignored here; see [`unknown_key`].
pub fn validate(
    definitions: &[AttributeDefinition],
    submitted: &SubmittedAttributes,
) -> Result<(), RuleViolation> {
    for def in definitions {
        let raw = submitted.get(&def.name);
        if def.is_required() && raw.is_none() {
            return Err(RuleViolation::MissingRequired {
                attribute: def.name.clone(),
            });
        }

        let value = raw
            .and_then(|v| v.as_deref())
            .filter(|v| !v.is_empty());
        match (def.attr_type, value) {
            (AttributeType::MultipleChoice, Some(v)) => {
                if !def.choices().any(|choice| choice == v) {
                    return Err(RuleViolation::InvalidChoice {
                        attribute: def.name.clone(),
                    });
                }
            }
            (AttributeType::Text, Some(v)) => {
                if v.chars().count() > TEXT_MAX_LEN {
                    return Err(RuleViolation::TextTooLong {
                        attribute: def.name.clone(),
                    });
                }
            }
            (_, None) if def.is_required() => {
                return Err(RuleViolation::FieldRequired {
                    attribute: def.name.clone(),
                });
            }
            (_, None) => {}
        }
    }
    Ok(())
}

/// First submitted key that no definition declares.
pub fn unknown_key<'a>(
    definitions: &[AttributeDefinition],
    submitted: &'a SubmittedAttributes,
) -> Option<&'a str> {
    submitted
        .keys()
        .find(|key| !definitions.iter().any(|d| &d.name == *key))
        .map(String::as_str)
}

/// Type every submitted value by its definition. Undeclared keys become text.
pub fn typed_values(
    definitions: &[AttributeDefinition],
    submitted: &SubmittedAttributes,
) -> TypedAttributes {
    submitted
        .iter()
        .map(|(name, raw)| {
            let def = definitions.iter().find(|d| &d.name == name);
            let value = raw.as_deref().map(|r| AttributeValue::typed(def, r));
            (name.clone(), value)
        })
        .collect()
}

/// Attribute names are 1 to 32 ASCII letters or digits.
pub fn validate_attribute_name(name: &str) -> Result<(), RuleViolation> {
    if ATTRIBUTE_NAME.is_match(name) {
        Ok(())
    } else {
        Err(RuleViolation::InvalidName {
            name: name.to_string(),
        })
    }
}

/// Every comma-separated token of a choice set must match the token class.
pub fn validate_choice_set(attribute: &str, value: Option<&str>) -> Result<(), RuleViolation> {
    let value = value.unwrap_or_default();
    if value.split(',').all(|token| CHOICE_TOKEN.is_match(token)) {
        Ok(())
    } else {
        Err(RuleViolation::InvalidChoiceSet {
            attribute: attribute.to_string(),
        })
    }
}

/// Name and value checks for a definition about to be created.
pub fn validate_definition(
    name: &str,
    attr_type: AttributeType,
    value: Option<&str>,
) -> Result<(), RuleViolation> {
    match attr_type {
        AttributeType::MultipleChoice => validate_choice_set(name, value)?,
        AttributeType::Text => {
            if value.map(|v| v.chars().count()).unwrap_or(0) > TEXT_MAX_LEN {
                return Err(RuleViolation::TextTooLong {
                    attribute: name.to_string(),
                });
            }
        }
    }
    validate_attribute_name(name)
}
