use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Every error envelope `type` must be an absolute https uri.
pub const PROBLEM_TYPE_PREFIX: &str = "https://";

/// Problem-details body returned on 4xx responses.
///
/// ```json
/// {
///   "type": "https://tools.ietf.org/html/rfc9110#section-15.5.1",
///   "title": "One or more validation errors occurred.",
///   "status": 400,
///   "traceId": "00-5b1f...-00",
///   "errors": { "$.id": ["The JSON value could not be converted to System.Int32. ..."] }
/// }
/// ```
///
/// `errors` is absent on not-found responses; a key mapped to `null` is kept
/// as `None` so it can be told apart from a missing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub status: u16,
    pub trace_id: String,
    #[serde(default)]
    pub errors: BTreeMap<String, Option<Vec<String>>>,
}

impl ErrorEnvelope {
    pub fn field_errors(&self, field_path: &str) -> Option<&[String]> {
        self.errors
            .get(field_path)
            .and_then(|messages| messages.as_deref())
    }
}
