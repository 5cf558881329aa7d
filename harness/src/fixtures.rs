use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, instrument};

use crate::error::FixtureError;

/// One parameterized case: a request payload plus the status it must produce.
///
/// ```json
/// {"testName": "missing id", "expectedStatusCode": 400,
///  "id": null, "idBook": 5, "firstName": "Jane", "lastName": "Doe"}
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestScenario<P> {
    pub test_name: String,
    pub expected_status_code: u16,
    /// Envelope title for a client-error status, when it differs from the
    /// api's default for that status.
    #[serde(default)]
    pub expected_title: Option<String>,
    #[serde(flatten)]
    pub payload: P,
}

#[derive(Debug, Clone)]
pub struct FixtureLoader {
    root: PathBuf,
}

impl FixtureLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, environment: &str, logical_name: &str) -> PathBuf {
        self.root
            .join(environment)
            .join(format!("{}.json", logical_name))
    }

    /// Loads an ordered list of records; the file is re-read on every call.
    #[instrument(skip(self))]
    pub fn load<T: DeserializeOwned>(
        &self,
        environment: &str,
        logical_name: &str,
    ) -> Result<Vec<T>, FixtureError> {
        let path = self.path_for(environment, logical_name);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FixtureError::NotFound { path })
            }
            Err(source) => return Err(FixtureError::Io { path, source }),
        };

        let records: Vec<T> = serde_json::from_str(&text)
            .map_err(|source| FixtureError::Parse { path: path.clone(), source })?;
        debug!(path = %path.display(), count = records.len(), "loaded fixture");
        Ok(records)
    }

    pub fn load_scenarios<P: DeserializeOwned>(
        &self,
        environment: &str,
        logical_name: &str,
    ) -> Result<Vec<TestScenario<P>>, FixtureError> {
        self.load(environment, logical_name)
    }

    /// Like [`load`](Self::load) but a missing file yields `None`.
    pub fn load_optional<T: DeserializeOwned>(
        &self,
        environment: &str,
        logical_name: &str,
    ) -> Result<Option<Vec<T>>, FixtureError> {
        match self.load(environment, logical_name) {
            Ok(records) => Ok(Some(records)),
            Err(FixtureError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
