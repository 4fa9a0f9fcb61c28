//! Swagger 2.0 description model and loading.
//!
//! [`ApiDescription`] is the immutable input of the descriptor engine. It keeps the
//! document's key order (paths, methods, responses, schema properties) because the
//! generated tests follow it.
//!
//! # Examples
//!
//! ```no_run
//! use testgen_core::openapi::ApiDescription;
//! use testgen_core::error::Result;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let description = ApiDescription::from_file_or_url("swagger.yaml").await?;
//! for (path, item) in &description.paths {
//!     println!("{path}: {} operations", item.operations.len());
//! }
//! # Ok(())
//! # }
//! ```

// Internal imports (std, crate)
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::Error;

// External imports (alphabetized)
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::fs;

/// Scheme used when the description declares none
pub const DEFAULT_SCHEME: &str = "http";

/// Host used when the description declares none
pub const DEFAULT_HOST: &str = "localhost:10010";

const DEFINITIONS_PREFIX: &str = "#/definitions/";
const PARAMETERS_PREFIX: &str = "#/parameters/";

/// A security requirement: scheme name mapped to its scopes
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// A parsed Swagger 2.0 document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiDescription {
    #[serde(default)]
    pub swagger: Option<String>,
    #[serde(default)]
    pub info: Option<Info>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(rename = "basePath", default)]
    pub base_path: Option<String>,
    #[serde(default)]
    pub schemes: Vec<String>,
    /// Document-wide request content types
    #[serde(default)]
    pub consumes: Vec<String>,
    /// Document-wide response content types
    #[serde(default)]
    pub produces: Vec<String>,
    /// Document-wide security requirements
    #[serde(default)]
    pub security: Vec<SecurityRequirement>,
    #[serde(rename = "securityDefinitions", default)]
    pub security_definitions: IndexMap<String, SecurityScheme>,
    /// Reusable schemas addressed by `#/definitions/<name>`
    #[serde(default)]
    pub definitions: IndexMap<String, JsonValue>,
    /// Reusable parameters addressed by `#/parameters/<name>`
    #[serde(default)]
    pub parameters: IndexMap<String, Parameter>,
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Info {
    pub title: Option<String>,
    pub version: Option<String>,
}

impl ApiDescription {
    /// Load a description from a file or URL (supports both YAML and JSON)
    pub async fn from_file_or_url<P: AsRef<str>>(location: P) -> crate::Result<Self> {
        let location = location.as_ref();

        if location.starts_with("http://") || location.starts_with("https://") {
            return Self::from_url(location).await;
        }

        Self::from_file(location).await
    }

    /// Load a description from a file (supports both YAML and JSON)
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        Self::parse_content(&content).map_err(|e| {
            Error::openapi(format!(
                "Failed to parse description at {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load a description from a URL (supports both YAML and JSON)
    pub async fn from_url(url: &str) -> crate::Result<Self> {
        let response = reqwest::get(url).await.map_err(|e| {
            Error::openapi(format!("Failed to fetch description from {}: {}", url, e))
        })?;

        if !response.status().is_success() {
            return Err(Error::openapi(format!(
                "Failed to fetch description from {}: HTTP {}",
                url,
                response.status()
            )));
        }

        let content = response.text().await.map_err(|e| {
            Error::openapi(format!("Failed to read response from {}: {}", url, e))
        })?;

        Self::parse_content(&content).map_err(|e| {
            Error::openapi(format!("Failed to parse description from {}: {}", url, e))
        })
    }

    /// Parse a description held in memory (JSON first, then YAML)
    pub fn parse(content: &str) -> crate::Result<Self> {
        Self::parse_content(content).map_err(Error::openapi)
    }

    fn parse_content(content: &str) -> Result<Self, String> {
        let json_err = match serde_json::from_str(content) {
            Ok(description) => return Ok(description),
            Err(e) => e,
        };

        match serde_yaml::from_str(content) {
            Ok(description) => Ok(description),
            Err(yaml_err) => Err(format!(
                "content is neither a valid JSON ({json_err}) nor YAML ({yaml_err}) description"
            )),
        }
    }

    /// Get the title of the API
    pub fn title(&self) -> Option<&str> {
        self.info.as_ref()?.title.as_deref()
    }

    /// First declared scheme, `http` when none is declared
    pub fn scheme(&self) -> &str {
        self.schemes
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_SCHEME)
    }

    /// Declared host, `localhost:10010` when none is declared
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    /// Scheme and host joined into an origin, e.g. `http://localhost:10010`
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme(), self.host())
    }

    /// Base path to prefix operation paths with; a missing or `/` base path yields `""`
    pub fn base_path_prefix(&self) -> &str {
        match self.base_path.as_deref() {
            Some("/") | None => "",
            Some(base) => base,
        }
    }

    /// Look up a path item, failing when the description does not declare it
    pub fn path_item(&self, path: &str) -> crate::Result<&PathItem> {
        self.paths
            .get(path)
            .ok_or_else(|| Error::openapi(format!("Path '{}' is not declared", path)))
    }

    /// Look up one operation of a path
    pub fn operation(&self, path: &str, method: Method) -> crate::Result<&Operation> {
        self.path_item(path)?.operations.get(&method).ok_or_else(|| {
            Error::openapi(format!(
                "Operation '{}' is not declared on path '{}'",
                method, path
            ))
        })
    }

    /// Follow local `#/definitions/...` references until a concrete schema is reached
    pub fn resolve_schema<'a>(&'a self, schema: &'a JsonValue) -> crate::Result<&'a JsonValue> {
        let mut current = schema;
        // A reference chain longer than the definition table must loop
        for _ in 0..=self.definitions.len() {
            let Some(reference) = current.get("$ref").and_then(JsonValue::as_str) else {
                return Ok(current);
            };
            let name = reference.strip_prefix(DEFINITIONS_PREFIX).ok_or_else(|| {
                Error::openapi(format!("Unexpected schema ref '{}'", reference))
            })?;
            current = self
                .definitions
                .get(name)
                .ok_or_else(|| Error::openapi(format!("Schema '{}' not found", name)))?;
        }
        Err(Error::openapi("Schema reference cycle detected"))
    }

    /// Resolve a parameter entry, following `#/parameters/...` references
    pub fn resolve_parameter<'a>(
        &'a self,
        entry: &'a ParameterEntry,
    ) -> crate::Result<&'a Parameter> {
        match entry {
            ParameterEntry::Inline(parameter) => Ok(parameter),
            ParameterEntry::Ref { reference } => {
                let name = reference.strip_prefix(PARAMETERS_PREFIX).ok_or_else(|| {
                    Error::openapi(format!("Unexpected parameter ref '{}'", reference))
                })?;
                self.parameters
                    .get(name)
                    .ok_or_else(|| Error::openapi(format!("Parameter '{}' not found", name)))
            }
        }
    }

    /// Security scheme names in declaration order, normalized to SCREAMING_SNAKE_CASE
    pub fn security_scheme_env_names(&self) -> Vec<String> {
        self.security_definitions
            .keys()
            .map(|name| crate::utils::to_screaming_snake_case(name))
            .collect()
    }
}

/// HTTP methods that may appear as operation keys on a path item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get" => Ok(Method::Get),
            "put" => Ok(Method::Put),
            "post" => Ok(Method::Post),
            "delete" => Ok(Method::Delete),
            "options" => Ok(Method::Options),
            "head" => Ok(Method::Head),
            "patch" => Ok(Method::Patch),
            _ => Err(format!("Unknown operation key: {}", s)),
        }
    }
}

impl<'de> Deserialize<'de> for Method {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.to_lowercase().parse().map_err(serde::de::Error::custom)
    }
}

impl Method {
    /// Returns the lowercase operation key
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Options => "options",
            Self::Head => "head",
            Self::Patch => "patch",
        }
    }

    /// Returns the uppercase HTTP verb
    pub fn verb(&self) -> String {
        self.as_str().to_uppercase()
    }

    /// Returns an iterator over all valid operation keys
    pub fn all() -> impl Iterator<Item = Self> {
        use Method::*;
        [Get, Put, Post, Delete, Options, Head, Patch].into_iter()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One path entry: its shared parameters and its operations, in document order.
///
/// Keys other than `parameters` and the seven operation keys are ignored, which
/// leaves room for vendor extensions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "IndexMap<String, JsonValue>")]
pub struct PathItem {
    pub parameters: Vec<ParameterEntry>,
    pub operations: IndexMap<Method, Operation>,
}

impl TryFrom<IndexMap<String, JsonValue>> for PathItem {
    type Error = serde_json::Error;

    fn try_from(entries: IndexMap<String, JsonValue>) -> Result<Self, Self::Error> {
        let mut item = PathItem::default();
        for (key, value) in entries {
            if key == "parameters" {
                item.parameters = serde_json::from_value(value)?;
            } else if let Ok(method) = key.parse::<Method>() {
                item.operations.insert(method, serde_json::from_value(value)?);
            }
        }
        Ok(item)
    }
}

impl PathItem {
    /// Operations that are not flagged deprecated, in document order
    pub fn active_operations(&self) -> impl Iterator<Item = (Method, &Operation)> {
        self.operations
            .iter()
            .filter(|(_, operation)| !operation.deprecated)
            .map(|(method, operation)| (*method, operation))
    }
}

/// Method-level declaration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    #[serde(rename = "operationId", default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterEntry>,
    /// Responses keyed by status code or `default`
    #[serde(default)]
    pub responses: IndexMap<String, Response>,
    #[serde(default)]
    pub consumes: Vec<String>,
    #[serde(default)]
    pub produces: Vec<String>,
    #[serde(default)]
    pub security: Vec<SecurityRequirement>,
    #[serde(default)]
    pub deprecated: bool,
}

/// A declared response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub schema: Option<JsonValue>,
}

/// A parameter declaration, either inline or a reference into `#/parameters`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParameterEntry {
    Ref {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Inline(Parameter),
}

/// A parameter declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Only body parameters carry a schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<JsonValue>,
    /// Remaining declaration keys (`format`, `enum`, `items`, vendor extensions ...)
    #[serde(flatten)]
    pub extra: IndexMap<String, JsonValue>,
}

/// Where a parameter travels. Unknown tags are kept so the builder can reject them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    FormData,
    Body,
    Unknown(String),
}

impl From<String> for ParameterLocation {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "path" => Self::Path,
            "query" => Self::Query,
            "header" => Self::Header,
            "formData" => Self::FormData,
            "body" => Self::Body,
            _ => Self::Unknown(tag),
        }
    }
}

impl From<ParameterLocation> for String {
    fn from(location: ParameterLocation) -> Self {
        match location {
            ParameterLocation::Path => "path".to_string(),
            ParameterLocation::Query => "query".to_string(),
            ParameterLocation::Header => "header".to_string(),
            ParameterLocation::FormData => "formData".to_string(),
            ParameterLocation::Body => "body".to_string(),
            ParameterLocation::Unknown(tag) => tag,
        }
    }
}

/// A `securityDefinitions` entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawSecurityScheme")]
pub enum SecurityScheme {
    Basic,
    ApiKey { location: ApiKeyLocation, name: String },
    OAuth2,
    Unknown(String),
}

/// Where an apiKey credential travels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKeyLocation {
    Query,
    Header,
    Unknown(String),
}

#[derive(Deserialize)]
struct RawSecurityScheme {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(rename = "in", default)]
    location: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl From<RawSecurityScheme> for SecurityScheme {
    fn from(raw: RawSecurityScheme) -> Self {
        match raw.kind.as_str() {
            "basic" => Self::Basic,
            "oauth2" => Self::OAuth2,
            "apiKey" => Self::ApiKey {
                location: match raw.location.as_deref() {
                    Some("query") => ApiKeyLocation::Query,
                    Some("header") => ApiKeyLocation::Header,
                    other => ApiKeyLocation::Unknown(other.unwrap_or_default().to_string()),
                },
                name: raw.name.unwrap_or_default(),
            },
            _ => Self::Unknown(raw.kind),
        }
    }
}
