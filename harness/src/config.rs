//! Property-file configuration and endpoint resolution.
//!
//! Two property sets drive a run. `api.properties` maps environments to base
//! urls, api versions to path prefixes and logical endpoint names to relative
//! paths. `path.properties` points at the fixture directories.
//!
//! ```text
//! base.url.dev=https://bookstore.dev.example.com
//! api.v1=/api/v1
//! api.endpoint.books=/Books
//! max.api.response.time=2000
//! ```
//!
//! Both files are read through the `config` crate, so dotted keys become
//! nested tables and `BOOKCHECK_API_*` / `BOOKCHECK_PATH_*` environment
//! variables override file values.

use std::collections::HashMap;
use std::error::Error;
use std::path::{Path, PathBuf};

use config::{
    Config, ConfigError, Environment, File, FileStoredFormat, Format, Map, Value, ValueKind,
};

use crate::error::ConfigurationError;

const BASE_URL_TABLE: &str = "base.url";
const VERSION_TABLE: &str = "api";
const ENDPOINT_TABLE: &str = "api.endpoint";
const MAX_RESPONSE_TIME_KEY: &str = "max.api.response.time";
const FIXTURE_ROOT_KEY: &str = "test.data.provider";
const GOLDEN_ROOT_KEY: &str = "test.data.golden";

/// `config` file format for Java-style `.properties` files.
///
/// Supports `key=value` and `key: value` pairs, `#` and `!` comment lines and
/// blank lines. Values are kept as strings; typed access happens through the
/// `config` getters.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertiesFormat;

impl Format for PropertiesFormat {
    fn parse(
        &self,
        uri: Option<&String>,
        text: &str,
    ) -> Result<Map<String, Value>, Box<dyn Error + Send + Sync>> {
        let mut map = Map::new();

        for (number, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let split = line
                .find(|c: char| c == '=' || c == ':')
                .ok_or_else(|| format!("line {}: expected 'key=value', got {:?}", number + 1, raw))?;
            let key = line[..split].trim();
            let value = line[split + 1..].trim();
            if key.is_empty() {
                return Err(format!("line {}: empty key", number + 1).into());
            }

            map.insert(
                key.to_string(),
                Value::new(uri, ValueKind::String(value.to_string())),
            );
        }

        Ok(map)
    }
}

impl FileStoredFormat for PropertiesFormat {
    fn file_extensions(&self) -> &'static [&'static str] {
        &["properties"]
    }
}

/// The two loaded property sets.
#[derive(Debug, Clone)]
pub struct Settings {
    api: Config,
    paths: Config,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigurationError> {
        Self::new_from_folder("config")
    }

    /// Loads `api.properties` and `path.properties` from `folder`, layering the
    /// optional `*.local.properties` overrides and environment variables on top.
    pub fn new_from_folder(folder: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let folder = folder.as_ref();
        let api = Self::layered(folder, "api", "BOOKCHECK_API")?;
        let paths = Self::layered(folder, "path", "BOOKCHECK_PATH")?;
        Ok(Self { api, paths })
    }

    /// Builds settings from in-memory property text, without files or
    /// environment overrides.
    pub fn from_properties(api: &str, paths: &str) -> Result<Self, ConfigurationError> {
        let api = Config::builder()
            .add_source(File::from_str(api, PropertiesFormat))
            .build()?;
        let paths = Config::builder()
            .add_source(File::from_str(paths, PropertiesFormat))
            .build()?;
        Ok(Self { api, paths })
    }

    fn layered(folder: &Path, name: &str, env_prefix: &str) -> Result<Config, ConfigError> {
        let base = folder.join(name);
        let local = folder.join(format!("{}.local", name));

        Config::builder()
            .add_source(File::new(&base.to_string_lossy(), PropertiesFormat))
            .add_source(File::new(&local.to_string_lossy(), PropertiesFormat).required(false))
            .add_source(Environment::with_prefix(env_prefix).separator("_"))
            .build()
    }

    /// Raw lookup in the api property set.
    pub fn api_property(&self, key: &str) -> Option<String> {
        self.api.get_string(key).ok()
    }

    /// Raw lookup in the path property set.
    pub fn path_property(&self, key: &str) -> Option<String> {
        self.paths.get_string(key).ok()
    }

    /// Directory holding the scenario tables.
    pub fn fixture_root(&self) -> Result<PathBuf, ConfigurationError> {
        self.path_property(FIXTURE_ROOT_KEY)
            .map(PathBuf::from)
            .ok_or_else(|| ConfigurationError::MissingKey {
                key: FIXTURE_ROOT_KEY.to_string(),
            })
    }

    /// Directory holding the golden datasets; falls back to the scenario root.
    pub fn golden_root(&self) -> Result<PathBuf, ConfigurationError> {
        match self.path_property(GOLDEN_ROOT_KEY) {
            Some(path) => Ok(PathBuf::from(path)),
            None => self.fixture_root(),
        }
    }

    /// Snapshots the api property set into an [`EndpointConfig`] bound to the
    /// given environment and api version.
    ///
    /// The environment and version are not validated here; an unknown one
    /// surfaces on the first [`EndpointConfig::resolve`].
    pub fn endpoint_config(
        &self,
        environment: &str,
        api_version: &str,
    ) -> Result<EndpointConfig, ConfigurationError> {
        let max_response_time = match self.api.get_int(MAX_RESPONSE_TIME_KEY) {
            Ok(value) => value,
            Err(ConfigError::NotFound(_)) => {
                return Err(ConfigurationError::MissingKey {
                    key: MAX_RESPONSE_TIME_KEY.to_string(),
                })
            }
            Err(e) => {
                return Err(ConfigurationError::InvalidValue {
                    key: MAX_RESPONSE_TIME_KEY.to_string(),
                    reason: e.to_string(),
                })
            }
        };
        let max_response_time_millis =
            u64::try_from(max_response_time).map_err(|_| ConfigurationError::InvalidValue {
                key: MAX_RESPONSE_TIME_KEY.to_string(),
                reason: format!("{} is negative", max_response_time),
            })?;

        Ok(EndpointConfig {
            environment: environment.to_string(),
            api_version: api_version.to_string(),
            base_url_by_env: string_table(&self.api, BASE_URL_TABLE)?,
            version_path_by_version: string_table(&self.api, VERSION_TABLE)?,
            endpoint_path_by_name: string_table(&self.api, ENDPOINT_TABLE)?,
            max_response_time_millis,
        })
    }
}

// Collects the string leaves of a table; nested tables (such as
// `api.endpoint` inside `api`) are skipped. `config` lowercases keys on load,
// so names are stored lowercase.
fn string_table(config: &Config, key: &str) -> Result<HashMap<String, String>, ConfigurationError> {
    let table = match config.get_table(key) {
        Ok(table) => table,
        Err(ConfigError::NotFound(_)) => return Ok(HashMap::new()),
        Err(e) => return Err(e.into()),
    };

    Ok(table
        .into_iter()
        .filter(|(_, value)| !matches!(value.kind, ValueKind::Table(_) | ValueKind::Array(_)))
        .filter_map(|(name, value)| {
            value
                .into_string()
                .ok()
                .map(|v| (name.to_lowercase(), v))
        })
        .collect())
}

fn lookup<'t>(table: &'t HashMap<String, String>, name: &str) -> Option<&'t String> {
    table.get(&name.to_lowercase())
}

/// Immutable endpoint configuration for one run. Table keys are lowercase.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointConfig {
    pub environment: String,
    pub api_version: String,
    pub base_url_by_env: HashMap<String, String>,
    pub version_path_by_version: HashMap<String, String>,
    pub endpoint_path_by_name: HashMap<String, String>,
    pub max_response_time_millis: u64,
}

impl EndpointConfig {
    /// Resolves `(environment, api_version, endpoint)` to
    /// `base url + version prefix + endpoint path`. Names match the property
    /// keys case-insensitively.
    pub fn resolve(
        &self,
        environment: &str,
        api_version: &str,
        endpoint: &str,
    ) -> Result<String, ConfigurationError> {
        let version_path = lookup(&self.version_path_by_version, api_version).ok_or_else(|| {
            ConfigurationError::UnknownVersion {
                version: api_version.to_string(),
            }
        })?;
        let endpoint_path = lookup(&self.endpoint_path_by_name, endpoint).ok_or_else(|| {
            ConfigurationError::UnknownEndpoint {
                endpoint: endpoint.to_string(),
            }
        })?;
        let base_url = lookup(&self.base_url_by_env, environment).ok_or_else(|| {
            ConfigurationError::UnknownEnvironment {
                environment: environment.to_string(),
            }
        })?;

        Ok(format!("{}{}{}", base_url, version_path, endpoint_path))
    }

    /// Resolves `endpoint` against this run's environment and api version.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<String, ConfigurationError> {
        self.resolve(&self.environment, &self.api_version, endpoint)
    }
}
