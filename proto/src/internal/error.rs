use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/* ===== errors ===== */
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "lowercase")]
pub enum SchemaError {
    /// The attribute is not described by the schema, or the name was empty.
    InvalidAttributeName(String),
    /// The candidate value failed a type, bounds, pattern, enum, cardinality or
    /// immutability check.
    InvalidAttributeValue { attr: String, reason: String },
    /// Two definitions fold to the same attribute name.
    DuplicateDefinition(String),
    /// A definition in the schema source is unusable.
    InvalidDefinition { attr: String, reason: String },
}

impl SchemaError {
    pub fn invalid_value(attr: &str, reason: impl Into<String>) -> Self {
        SchemaError::InvalidAttributeValue {
            attr: attr.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_definition(attr: &str, reason: impl Into<String>) -> Self {
        SchemaError::InvalidDefinition {
            attr: attr.to_string(),
            reason: reason.into(),
        }
    }
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            SchemaError::InvalidAttributeName(attr) => write!(f, "invalid attr name: {}", attr),
            SchemaError::InvalidAttributeValue { attr, reason } => {
                write!(f, "invalid attr value: {}: {}", attr, reason)
            }
            SchemaError::DuplicateDefinition(attr) => write!(f, "duplicate definition: {}", attr),
            SchemaError::InvalidDefinition { attr, reason } => {
                write!(f, "invalid definition: {}: {}", attr, reason)
            }
        }
    }
}

/// A pre-modify callback refused the value it was shown.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct CallbackError {
    pub attr: String,
    pub reason: String,
}

impl Display for CallbackError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "callback rejected {}: {}", self.attr, self.reason)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "lowercase")]
pub enum OperationError {
    SchemaViolation(SchemaError),
    Callback(CallbackError),
    InvalidSchemaState(String),
    InvalidRequest(String),
    InvalidConfiguration(String),
    UnsupportedCacheKey(String),
    FsError,
    SerdeTomlError,
}

impl PartialEq for OperationError {
    fn eq(&self, other: &Self) -> bool {
        // Only used by tests, where the variant is what matters.
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl Display for OperationError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let mut output = format!("{:?}", self)
            .split(['(', ' '])
            .next()
            .unwrap_or("")
            .to_string();

        if let Some(msg) = self.message() {
            output += &format!(" - {}", msg);
        };
        f.write_str(&output)
    }
}

impl OperationError {
    /// Return the message associated with the error if there is one.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::SchemaViolation(err) => Some(err.to_string()),
            Self::Callback(err) => Some(err.to_string()),
            Self::InvalidSchemaState(val) => Some(format!("Schema could not be loaded: {}", val)),
            Self::InvalidRequest(val) => Some(val.clone()),
            Self::InvalidConfiguration(val) => Some(format!("Invalid configuration: {}", val)),
            Self::UnsupportedCacheKey(val) => {
                Some(format!("Key type {} is not supported by this cache", val))
            }
            Self::FsError => None,
            Self::SerdeTomlError => None,
        }
    }
}

impl From<SchemaError> for OperationError {
    fn from(value: SchemaError) -> Self {
        OperationError::SchemaViolation(value)
    }
}

impl From<CallbackError> for OperationError {
    fn from(value: CallbackError) -> Self {
        OperationError::Callback(value)
    }
}

#[test]
fn test_operationerror_as_nice_string() {
    assert_eq!(
        OperationError::FsError.to_string(),
        "FsError".to_string()
    );
    assert_eq!(
        OperationError::SchemaViolation(SchemaError::invalid_value(
            "maxLoginFailures",
            "value must be at most 100"
        ))
        .to_string(),
        "SchemaViolation - invalid attr value: maxLoginFailures: value must be at most 100"
            .to_string()
    );
    assert_eq!(
        OperationError::UnsupportedCacheKey("krb5Principal".into()).to_string(),
        "UnsupportedCacheKey - Key type krb5Principal is not supported by this cache".to_string()
    );
}
