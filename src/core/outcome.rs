//! Normalized probe results
//!
//! Every exported probe call ends in a [`ProbeOutcome`]. Callers can match on
//! the variant instead of probing a JSON object for `error`/`success` keys.

use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// Result of one exported probe call
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// The probe's natural result
    Ok(Value),
    /// The probe returned nothing, or the remote layer swallowed a failure
    Empty,
    /// The outermost layer caught a failure
    Failed(String),
}

impl ProbeOutcome {
    /// Non-null values become `Ok`, null becomes `Empty`
    pub fn from_value(value: Value) -> Self {
        if value.is_null() {
            ProbeOutcome::Empty
        } else {
            ProbeOutcome::Ok(value)
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ProbeOutcome::Failed(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            ProbeOutcome::Ok(v) => Some(v),
            _ => None,
        }
    }

    /// JSON shape: natural value, `{}`, or `{"error": .., "success": false}`
    pub fn to_value(&self) -> Value {
        match self {
            ProbeOutcome::Ok(v) => v.clone(),
            ProbeOutcome::Empty => json!({}),
            ProbeOutcome::Failed(message) => json!({ "error": message, "success": false }),
        }
    }
}

impl Serialize for ProbeOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}
