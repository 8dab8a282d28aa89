//! The public error envelope.
//!
//! Every non-2xx response from the relay carries an `application/json`
//! body of this shape:
//!
//! ```json
//! {"code":100,"reason":"Validation Failed","validationErrors":
//!   [{"field":"makerFee","code":1004,"reason":"Total fee must be at least: 1000"}]}
//! ```
//!
//! `validationErrors` is omitted entirely when empty.

use serde::{Deserialize, Serialize};

/// Top-level and per-field error codes.
pub mod codes {
    /// Generic failure; also the envelope code for validation failures.
    pub const GENERIC: u32 = 100;
    /// Request body was not valid JSON.
    pub const MALFORMED_JSON: u32 = 101;
    /// A field value is not in the expected format.
    pub const INCORRECT_FORMAT: u32 = 1001;
    /// A field references something the relay does not know.
    pub const INVALID_REFERENCE: u32 = 1002;
    /// A field value is out of the acceptable range.
    pub const OUT_OF_RANGE: u32 = 1004;
    /// Signature validation failed.
    pub const SIGNATURE: u32 = 1005;
}

/// A single field-scoped validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub code: u32,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, code: u32, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            reason: reason.into(),
        }
    }
}

/// The error envelope returned for every rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub code: u32,
    pub reason: String,
    #[serde(
        rename = "validationErrors",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub validation_errors: Vec<ValidationError>,
}

impl ErrorEnvelope {
    /// An envelope with no per-field detail.
    pub fn new(code: u32, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
            validation_errors: Vec::new(),
        }
    }

    /// The standard `Validation Failed` envelope wrapping field errors.
    pub fn validation(errors: Vec<ValidationError>) -> Self {
        Self {
            code: codes::GENERIC,
            reason: "Validation Failed".to_owned(),
            validation_errors: errors,
        }
    }
}
