use serde::Deserialize;

// Wording of the errors the bookstore api returns.

pub const VALIDATION_TITLE: &str = "One or more validation errors occurred.";
pub const NOT_FOUND_TITLE: &str = "Not Found";

/// A non-numeric identifier.
pub const MALFORMED_ID: &str = "invalidID";

/// An identifier carrying a SQL fragment; it must be rejected by validation.
pub const SQL_INJECTION_ID: &str = "' OR 1=1; --";

/// Field path of the route-parameter validation error.
pub const ID_ROUTE_FIELD: &str = "id";

pub fn invalid_id_message(raw: &str) -> String {
    format!("The value '{}' is not valid.", raw)
}

/// Envelope title the api uses for a client-error status, following the
/// framework's default problem-details mapping.
pub fn problem_title(status: u16) -> Option<&'static str> {
    let title = match status {
        400 => VALIDATION_TITLE,
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => NOT_FOUND_TITLE,
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        408 => "Request Timeout",
        409 => "Conflict",
        412 => "Precondition Failed",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        426 => "Upgrade Required",
        _ => return None,
    };
    Some(title)
}

/// Expected error for one absent payload field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldErrorRule {
    /// Wire name of the payload field, e.g. `idBook`.
    pub field: String,
    /// Key in the envelope's `errors` map, e.g. `$.idBook`.
    pub field_path: String,
    pub message: String,
}

impl FieldErrorRule {
    fn new(field: &str, field_path: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            field_path: field_path.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldErrorCatalog {
    rules: Vec<FieldErrorRule>,
    first_only: bool,
}

impl FieldErrorCatalog {
    pub fn new(rules: Vec<FieldErrorRule>, first_only: bool) -> Self {
        Self { rules, first_only }
    }

    /// Built-in catalogue for a logical endpoint. Unknown endpoints get an
    /// empty catalogue, so only the envelope itself is checked.
    pub fn defaults_for(endpoint: &str) -> Self {
        match endpoint {
            // the authors deserializer stops at the first conversion failure
            "authors" => Self::new(
                vec![
                    FieldErrorRule::new(
                        "id",
                        "$.id",
                        "The JSON value could not be converted to System.Int32. Path: $.id | LineNumber: 0 | BytePositionInLine: 10.",
                    ),
                    FieldErrorRule::new(
                        "idBook",
                        "$.idBook",
                        "The JSON value could not be converted to System.Int32. Path: $.idBook | LineNumber: 0 | BytePositionInLine: 21.",
                    ),
                ],
                true,
            ),
            "books" => Self::new(
                vec![
                    FieldErrorRule::new(
                        "id",
                        "$.id",
                        "The JSON value could not be converted to System.Int32. Path: $.id | LineNumber: 0.",
                    ),
                    FieldErrorRule::new(
                        "title",
                        "$.title",
                        "The JSON value could not be converted to System.String. Path: $.title | LineNumber: 1.",
                    ),
                    FieldErrorRule::new(
                        "pageCount",
                        "$.pageCount",
                        "The JSON value could not be converted to System.Int32. Path: $.pageCount | LineNumber: 2.",
                    ),
                ],
                false,
            ),
            _ => Self::new(Vec::new(), false),
        }
    }

    /// Replaces the rules, keeping the first-only behaviour of `self`.
    pub fn with_rules(self, rules: Vec<FieldErrorRule>) -> Self {
        Self { rules, ..self }
    }

    pub fn rules(&self) -> &[FieldErrorRule] {
        &self.rules
    }

    /// Rules that apply to the given absent fields, in the order the fields
    /// were given.
    pub fn expected_for<'c>(&'c self, absent_fields: &[&str]) -> Vec<&'c FieldErrorRule> {
        let matching = absent_fields
            .iter()
            .filter_map(|field| self.rules.iter().find(|rule| rule.field == *field));

        if self.first_only {
            matching.take(1).collect()
        } else {
            matching.collect()
        }
    }
}
