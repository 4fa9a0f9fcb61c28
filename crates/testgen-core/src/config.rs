//! Run configuration for test generation.
//!
//! This module defines the `RunConfig` struct: which rendering dialect and assertion
//! style to target, which paths to generate, the explicit parameter values to
//! inject, load-test entries and sequence definitions. Keys use the camelCase names
//! of the configuration file. It can be loaded from a YAML, JSON or TOML file or
//! created programmatically.
//!
//! # Examples
//!
//! ```no_run
//! use testgen_core::config::{RunConfig, TestModule};
//!
//! let mut config = RunConfig::new(TestModule::Request);
//! config.path_names = vec!["/pets".to_string()];
//! config.max_len = Some(120);
//! ```

// Internal imports (std, crate)
use std::fmt;
use std::path::Path;

use crate::openapi::Method;

// External imports (alphabetized)
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use serde_value::Value as SerdeValue;
use tokio::fs;

/// Description width assumed when `maxLen` is not configured
pub const DEFAULT_MAX_LEN: usize = 80;

/// Characters of `maxLen` reserved for the surrounding test scaffolding
const DESCRIPTION_MARGIN: usize = 50;

/// Default number of requests issued by a load test
pub const DEFAULT_LOAD_REQUESTS: u32 = 1000;

/// Default number of concurrent requests issued by a load test
pub const DEFAULT_LOAD_CONCURRENT: u32 = 100;

/// Named explicit values, e.g. `{"id": 42}`
pub type ValuePool = IndexMap<String, JsonValue>;

/// Settings for one generation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    /// Rendering dialect of the generated tests
    #[serde(default)]
    pub test_module: TestModule,

    /// Assertion style of the generated tests
    #[serde(default)]
    pub assertion_format: AssertionStyle,

    /// Paths to generate, in output order; empty means every path of the description
    #[serde(rename = "pathName", default)]
    pub path_names: Vec<String>,

    /// Explicit path placeholder values, shared by every path
    #[serde(default)]
    pub path_params: ValuePool,

    /// Explicit query values keyed by request path
    #[serde(default)]
    pub query_vals: IndexMap<String, ValuePool>,

    /// Explicit body values keyed by request path
    #[serde(default)]
    pub body_vals: IndexMap<String, ValuePool>,

    /// Maximum width of a generated description line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,

    /// Operations that also get load-test scaffolding
    #[serde(default)]
    pub load_test: Vec<LoadTestEntry>,

    /// Named sequences of chained operations, in output order
    #[serde(default)]
    pub sequences: IndexMap<String, Vec<SequenceStep>>,
}

impl RunConfig {
    /// Create a new RunConfig with default values
    pub fn new(test_module: TestModule) -> Self {
        Self {
            test_module,
            ..Default::default()
        }
    }

    /// Load configuration from a file; the format follows the extension (`json`, `toml`,
    /// otherwise YAML)
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        Ok(config)
    }

    /// Save configuration to a file as JSON or YAML, following the extension
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = if path.as_ref().extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else {
            serde_yaml::to_string(self)?
        };
        fs::write(path, content).await?;
        Ok(())
    }

    /// Number of characters a one-line description may take
    pub fn description_limit(&self) -> usize {
        self.max_len
            .filter(|len| *len > 0)
            .unwrap_or(DEFAULT_MAX_LEN)
            .saturating_sub(DESCRIPTION_MARGIN)
    }

    /// Whether the dialect needs absolute request URLs
    pub fn needs_origin(&self) -> bool {
        self.test_module.needs_origin()
    }

    /// Explicit query values configured for a request path
    pub fn query_values(&self, request_path: &str) -> Option<&ValuePool> {
        self.query_vals.get(request_path)
    }

    /// Explicit body values configured for a request path
    pub fn body_values(&self, request_path: &str) -> Option<&ValuePool> {
        self.body_vals.get(request_path)
    }

    /// Load-test entry targeting exactly this path and operation
    pub fn load_test_for(&self, path: &str, method: Method) -> Option<&LoadTestEntry> {
        self.load_test
            .iter()
            .find(|entry| entry.path_name == path && entry.operation == method)
    }
}

/// Rendering dialect of the generated test files
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TestModule {
    /// `request` library calls against an absolute URL
    Request,
    /// `supertest` fluent calls against a relative path
    #[default]
    Supertest,
}

impl TestModule {
    /// Returns the dialect identifier as a string slice
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Supertest => "supertest",
        }
    }

    /// Whether request paths must carry scheme and host
    pub fn needs_origin(&self) -> bool {
        matches!(self, Self::Request)
    }
}

impl fmt::Display for TestModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Assertion style of the generated test files
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AssertionStyle {
    #[default]
    Should,
    Expect,
    Assert,
}

impl AssertionStyle {
    /// Returns the assertion style identifier as a string slice
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Should => "should",
            Self::Expect => "expect",
            Self::Assert => "assert",
        }
    }
}

impl fmt::Display for AssertionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Load-test scaffolding request for one operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTestEntry {
    pub path_name: String,
    pub operation: Method,
    #[serde(default)]
    pub load: LoadSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrent: Option<u32>,
}

impl LoadSettings {
    pub fn requests(&self) -> u32 {
        self.requests.unwrap_or(DEFAULT_LOAD_REQUESTS)
    }

    pub fn concurrent(&self) -> u32 {
        self.concurrent.unwrap_or(DEFAULT_LOAD_CONCURRENT)
    }
}

/// One step of a sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceStep {
    /// Label later steps use to reference this step's output
    pub step: String,
    pub path: String,
    #[serde(rename = "op")]
    pub operation: Method,
    /// Earlier step label mapped to the output fields this step consumes
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub deps: DependencyMap,
}

/// Step label mapped to the output field names drawn from it, in declaration order
pub type DependencyMap = IndexMap<String, DependencyFields>;

/// Field names drawn from one earlier step; accepts a single name or a list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyFields(#[serde(deserialize_with = "deserialize_field_names")] pub Vec<String>);

impl DependencyFields {
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|name| name == field)
    }
}

impl<S: Into<String>> FromIterator<S> for DependencyFields {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Helper function to deserialize either a single field name or a list of names
fn deserialize_field_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = SerdeValue::deserialize(deserializer)?;

    match value {
        SerdeValue::String(s) => Ok(vec![s]),
        SerdeValue::Seq(seq) => seq
            .into_iter()
            .map(|item| match item {
                SerdeValue::String(s) => Ok(s),
                _ => Err(serde::de::Error::custom(
                    "Expected field name or array of field names",
                )),
            })
            .collect(),
        _ => Err(serde::de::Error::custom(
            "Expected field name or array of field names",
        )),
    }
}
