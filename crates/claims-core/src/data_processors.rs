//! Record validation and field coercion.
//!
//! Raw JSON records are checked for their required fields and converted into
//! typed [`Claim`] and [`Revert`] values. A record that fails validation is
//! reported as a [`RejectReason`]; callers drop it and move on.

use serde_json::Value;

use crate::models::{Claim, Revert, RevertAdmission};

// ── RejectReason ──────────────────────────────────────────────────────────────

/// Why a raw record was not admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The record is not a JSON object.
    NotAnObject,
    /// A required key is absent.
    MissingField(&'static str),
    /// A required key is present but its value cannot be coerced.
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
    /// Revert admission is switched off (legacy behavior).
    RevertsDisabled,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::NotAnObject => f.write_str("record is not an object"),
            RejectReason::MissingField(field) => write!(f, "missing field `{}`", field),
            RejectReason::InvalidField { field, expected } => {
                write!(f, "field `{}` is not {}", field, expected)
            }
            RejectReason::RevertsDisabled => f.write_str("revert admission disabled"),
        }
    }
}

// ── FieldExtractor ────────────────────────────────────────────────────────────

/// Coerces individual JSON values into the primitive types used by records.
pub struct FieldExtractor;

impl FieldExtractor {
    /// Pharmacy NPIs must be JSON strings to match the CSV reference data.
    pub fn text(value: &Value) -> Option<String> {
        value.as_str().map(str::to_string)
    }

    /// Record ids and drug codes: strings verbatim, numbers in their JSON
    /// text form (`7` becomes `"7"`). Null, booleans and compound values are
    /// rejected.
    pub fn identifier(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// A decimal from a JSON number or a numeric string.
    ///
    /// Strings are trimmed before parsing. Booleans, null and non-finite
    /// values (`"NaN"`, `"inf"`) are rejected.
    pub fn decimal(value: &Value) -> Option<f64> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        parsed.is_finite().then_some(parsed)
    }

    /// An integer from a JSON number or an integer string.
    ///
    /// Fractional JSON numbers are truncated toward zero. Strings must hold an
    /// integer literal (surrounding whitespace allowed); `"10.5"` is rejected.
    pub fn integer(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Timestamps are only required to be present. Strings are kept verbatim,
    /// null becomes empty and anything else keeps its JSON text form.
    pub fn timestamp(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

// ── RecordValidator ───────────────────────────────────────────────────────────

/// Required keys of a claim record.
pub const CLAIM_FIELDS: [&str; 6] = ["id", "npi", "ndc", "price", "quantity", "timestamp"];

/// Required keys of a revert record.
pub const REVERT_FIELDS: [&str; 3] = ["id", "claim_id", "timestamp"];

/// Schema checks for raw claim and revert records.
pub struct RecordValidator;

impl RecordValidator {
    /// Validate a raw claim record.
    ///
    /// All of [`CLAIM_FIELDS`] must be present, `price` must parse as a
    /// decimal and `quantity` as an integer. Whether the pharmacy is known is
    /// checked by the loader, not here.
    pub fn validate_claim(record: &Value) -> Result<Claim, RejectReason> {
        let object = record.as_object().ok_or(RejectReason::NotAnObject)?;
        for field in CLAIM_FIELDS {
            if !object.contains_key(field) {
                return Err(RejectReason::MissingField(field));
            }
        }

        Ok(Claim {
            id: required_identifier(&object["id"], "id")?,
            npi: FieldExtractor::text(&object["npi"]).ok_or(RejectReason::InvalidField {
                field: "npi",
                expected: "a string",
            })?,
            ndc: required_identifier(&object["ndc"], "ndc")?,
            price: FieldExtractor::decimal(&object["price"]).ok_or(
                RejectReason::InvalidField {
                    field: "price",
                    expected: "a decimal number",
                },
            )?,
            quantity: FieldExtractor::integer(&object["quantity"]).ok_or(
                RejectReason::InvalidField {
                    field: "quantity",
                    expected: "an integer",
                },
            )?,
            timestamp: FieldExtractor::timestamp(&object["timestamp"]),
        })
    }

    /// Validate a raw revert record under the given admission policy.
    ///
    /// Under [`RevertAdmission::Validate`] a revert is admitted when all of
    /// [`REVERT_FIELDS`] are present. Under [`RevertAdmission::Legacy`] every
    /// revert is rejected.
    pub fn validate_revert(
        record: &Value,
        admission: RevertAdmission,
    ) -> Result<Revert, RejectReason> {
        let object = record.as_object().ok_or(RejectReason::NotAnObject)?;
        for field in REVERT_FIELDS {
            if !object.contains_key(field) {
                return Err(RejectReason::MissingField(field));
            }
        }

        if admission == RevertAdmission::Legacy {
            return Err(RejectReason::RevertsDisabled);
        }

        Ok(Revert {
            id: required_identifier(&object["id"], "id")?,
            claim_id: required_identifier(&object["claim_id"], "claim_id")?,
            timestamp: FieldExtractor::timestamp(&object["timestamp"]),
        })
    }
}

fn required_identifier(value: &Value, field: &'static str) -> Result<String, RejectReason> {
    FieldExtractor::identifier(value).ok_or(RejectReason::InvalidField {
        field,
        expected: "a string or number",
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
