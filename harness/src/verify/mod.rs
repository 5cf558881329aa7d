use std::any::type_name;
use std::hash::Hash;

use serde::{de::DeserializeOwned, Serialize};

use crate::compare::{find_duplicates, find_missing};
use crate::error::VerificationFailure;
use crate::model::{ErrorEnvelope, PROBLEM_TYPE_PREFIX};
use crate::transport::ApiResponse;

mod report;

pub use report::{Outcome, RecordingReporter, Reporter, Tee, TracingReporter, VerificationEvent};

type Verdict<T> = Result<T, VerificationFailure>;

pub struct ResponseVerifier<'a> {
    reporter: &'a dyn Reporter,
}

impl<'a> ResponseVerifier<'a> {
    pub fn new(reporter: &'a dyn Reporter) -> Self {
        Self { reporter }
    }

    fn observe<T>(
        &self,
        check: &'static str,
        verdict: Verdict<T>,
        describe: impl FnOnce(&T) -> String,
    ) -> Verdict<T> {
        let event = match &verdict {
            Ok(value) => VerificationEvent::passed(check, describe(value)),
            Err(failure) => VerificationEvent::failed(check, failure.to_string()),
        };
        self.reporter.record(&event);
        verdict
    }

    pub fn assert_status(&self, response: &ApiResponse, expected: u16) -> Verdict<()> {
        let verdict = if response.status == expected {
            Ok(())
        } else {
            Err(VerificationFailure::Status {
                expected,
                actual: response.status,
            })
        };
        self.observe("status", verdict, |_| format!("status {}", expected))
    }

    /// Soft SLA check: `elapsed <= max_millis`.
    pub fn assert_latency(&self, response: &ApiResponse, max_millis: u64) -> Verdict<()> {
        let observed_millis = response.elapsed_millis();
        let verdict = if observed_millis <= max_millis {
            Ok(())
        } else {
            Err(VerificationFailure::Latency {
                max_millis,
                observed_millis,
            })
        };
        self.observe("latency", verdict, |_| {
            format!("{}ms <= {}ms", observed_millis, max_millis)
        })
    }

    /// Decodes the body as `T`; a body of the wrong shape is a failure.
    pub fn decode<T: DeserializeOwned>(&self, response: &ApiResponse) -> Verdict<T> {
        let verdict = serde_json::from_slice::<T>(&response.body).map_err(|e| {
            VerificationFailure::Decode {
                target: type_name::<T>(),
                message: e.to_string(),
                body: response.body_text().into_owned(),
            }
        });
        self.observe("decode", verdict, |_| type_name::<T>().to_string())
    }

    /// Decodes the body as `T` and compares it structurally with `expected`.
    pub fn assert_body_equals<T>(&self, response: &ApiResponse, expected: &T) -> Verdict<T>
    where
        T: DeserializeOwned + Serialize + PartialEq,
    {
        let actual: T = self.decode(response)?;
        let verdict = if &actual == expected {
            Ok(actual)
        } else {
            Err(VerificationFailure::BodyMismatch {
                expected: to_pretty(expected),
                actual: to_pretty(&actual),
            })
        };
        self.observe("body", verdict, |_| "body matches".to_string())
    }

    /// Decodes the problem-details envelope and checks its fixed fields.
    pub fn assert_error_envelope(
        &self,
        response: &ApiResponse,
        expected_title: &str,
        expected_status: u16,
    ) -> Verdict<ErrorEnvelope> {
        let envelope: ErrorEnvelope = self.decode(response)?;
        let verdict = check_envelope(envelope, expected_title, expected_status);
        self.observe("envelope", verdict, |envelope| {
            format!("{} ({})", envelope.title, envelope.status)
        })
    }

    /// `errors[field_path]` exists, is not null and contains `expected_message`
    /// among its entries.
    pub fn assert_field_error(
        &self,
        envelope: &ErrorEnvelope,
        field_path: &str,
        expected_message: &str,
    ) -> Verdict<()> {
        let verdict = match envelope.errors.get(field_path) {
            None => Err(VerificationFailure::FieldErrorAbsent {
                field_path: field_path.to_string(),
                present: envelope.errors.keys().cloned().collect(),
            }),
            Some(None) => Err(VerificationFailure::FieldErrorNull {
                field_path: field_path.to_string(),
            }),
            Some(Some(messages)) if messages.iter().any(|m| m == expected_message) => Ok(()),
            Some(Some(messages)) => Err(VerificationFailure::FieldErrorMessage {
                field_path: field_path.to_string(),
                expected: expected_message.to_string(),
                actual: messages.clone(),
            }),
        };
        self.observe("field-error", verdict, |_| {
            format!("{}: {}", field_path, expected_message)
        })
    }

    /// Every expected item is present in `actual`, counting repeats.
    pub fn assert_no_missing<T>(
        &self,
        expected: &[T],
        actual: &[T],
        response: &ApiResponse,
    ) -> Verdict<()>
    where
        T: Eq + Hash + Clone + Serialize,
    {
        let missing = find_missing(expected, actual);
        let verdict = if missing.is_empty() {
            Ok(())
        } else {
            Err(VerificationFailure::MissingItems {
                missing: to_pretty(&missing),
                response: response.pretty_body(),
            })
        };
        self.observe("missing-items", verdict, |_| {
            format!("all {} expected items present", expected.len())
        })
    }

    pub fn assert_no_duplicates<T>(&self, actual: &[T], response: &ApiResponse) -> Verdict<()>
    where
        T: Eq + Hash + Clone + Serialize,
    {
        let duplicates = find_duplicates(actual);
        let verdict = if duplicates.is_empty() {
            Ok(())
        } else {
            Err(VerificationFailure::DuplicateItems {
                duplicates: to_pretty(&duplicates),
                response: response.pretty_body(),
            })
        };
        self.observe("duplicate-items", verdict, |_| {
            format!("{} items, no duplicates", actual.len())
        })
    }
}

fn check_envelope(
    envelope: ErrorEnvelope,
    expected_title: &str,
    expected_status: u16,
) -> Verdict<ErrorEnvelope> {
    if envelope.title != expected_title {
        return Err(VerificationFailure::Envelope {
            field: "title",
            expected: expected_title.to_string(),
            actual: envelope.title,
        });
    }
    if envelope.status != expected_status {
        return Err(VerificationFailure::Envelope {
            field: "status",
            expected: expected_status.to_string(),
            actual: envelope.status.to_string(),
        });
    }
    if envelope.kind.trim().is_empty() || !envelope.kind.starts_with(PROBLEM_TYPE_PREFIX) {
        return Err(VerificationFailure::Envelope {
            field: "type",
            expected: format!("a non-empty uri starting with '{}'", PROBLEM_TYPE_PREFIX),
            actual: envelope.kind,
        });
    }
    if envelope.trace_id.trim().is_empty() {
        return Err(VerificationFailure::Envelope {
            field: "traceId",
            expected: "a non-empty string".to_string(),
            actual: envelope.trace_id,
        });
    }
    Ok(envelope)
}

fn to_pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unserializable: {}>", e))
}
