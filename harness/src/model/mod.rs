use std::fmt::Debug;
use std::hash::Hash;

use serde::{de::DeserializeOwned, Serialize};

mod author;
mod book;
mod envelope;

pub use author::{Author, AuthorPayload};
pub use book::{Book, BookPayload};
pub use envelope::{ErrorEnvelope, PROBLEM_TYPE_PREFIX};

/// A resource served by the api under test.
pub trait Resource:
    Serialize + DeserializeOwned + Clone + PartialEq + Eq + Hash + Debug + Send + Sync
{
    type Payload: Payload;

    /// Logical endpoint name, as used in `api.endpoint.<name>`.
    const ENDPOINT: &'static str;

    /// Human-readable singular, used in check names.
    const LABEL: &'static str;

    fn id(&self) -> Option<i64>;

    fn with_id(&self, id: i64) -> Self;

    /// A copy with one descriptive field changed, used to prove an update
    /// was persisted.
    fn edited(&self) -> Self;

    fn to_payload(&self) -> Self::Payload;

    /// Golden dataset, relative to the environment directory.
    fn golden_fixture() -> String {
        format!("{0}/{0}", Self::ENDPOINT)
    }

    fn create_scenarios_fixture() -> String {
        format!("{0}/create_{0}_test_data", Self::ENDPOINT)
    }

    fn update_scenarios_fixture() -> String {
        format!("{0}/update_{0}_test_data", Self::ENDPOINT)
    }

    fn field_errors_fixture() -> String {
        format!("{}/field_errors", Self::ENDPOINT)
    }
}

/// A request body in which any field may be absent.
pub trait Payload:
    Serialize + DeserializeOwned + Clone + PartialEq + Debug + Send + Sync
{
    fn id(&self) -> Option<i64>;

    /// Wire names of the fields that are absent, in declaration order.
    fn absent_fields(&self) -> Vec<&'static str>;
}
