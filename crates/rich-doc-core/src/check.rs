//! Validation followed by the length policy, in one call.
//!
//! This is the gate a persistence layer runs before accepting a document:
//! structure first, then length. Length is only measured for documents that
//! decoded successfully.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::length::{LengthPolicy, LengthReport};
use crate::schema::{DOCUMENT, IssueReport, SchemaOptions, ValidationReport};

/// Combined outcome of [`check_value`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CheckReport {
    /// Whether the document passed schema validation.
    pub valid: bool,
    /// Schema issues (empty when valid).
    pub issues: Vec<IssueReport>,
    /// Length measurement, present only for valid documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<LengthReport>,
    /// Whether the document is valid and within the length limit.
    pub pass: bool,
}

/// Validate `value` and, if it is a document, measure it.
#[tracing::instrument(skip(value, options), fields(max_length = policy.max_length))]
pub fn check_value(value: &Value, options: &SchemaOptions, policy: &LengthPolicy) -> CheckReport {
    match DOCUMENT.parse(value, options) {
        Ok(doc) => {
            let length = policy.check(&doc);
            CheckReport {
                valid: true,
                issues: Vec::new(),
                length: Some(length),
                pass: length.within_limit,
            }
        }
        Err(err) => {
            let ValidationReport { issues, .. } = ValidationReport::from(&err);
            CheckReport {
                valid: false,
                issues,
                length: None,
                pass: false,
            }
        }
    }
}
