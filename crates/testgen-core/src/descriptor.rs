//! Renderer-facing descriptor types.
//!
//! A [`TestDescriptor`] is the fully resolved, language-neutral form of one generated
//! test case. Descriptors are grouped into [`PathBlock`]s and [`SequenceBlock`]s, which
//! also carry the cross-cutting [`ContextFlags`] the renderer needs to emit imports.
//!
//! Every resolved value carries both its structured [`Expression`] and `code`, the
//! expression text for the JavaScript dialects.

use crate::config::DependencyMap;
use crate::openapi::{Method, Parameter};

use serde::Serialize;
use serde_json::Value as JsonValue;

/// Code emitted when a value must be filled in by hand
pub const MISSING_VALUE_CODE: &str = "'DATA GOES HERE'";

/// Content type assumed when neither the operation nor the document declares one
pub const TYPE_JSON: &str = "application/json";

/// How a parameter value is obtained in the generated test
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    /// A value supplied in the run configuration
    Literal { value: JsonValue },
    /// A field of an earlier sequence step's response body
    Dependency { step: String, field: String },
    /// Nothing is known; a human has to supply the value
    Missing,
}

impl Expression {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Expression text as a standalone JavaScript value
    pub fn code(&self) -> String {
        match self {
            Self::Literal { value } => literal_code(value),
            Self::Dependency { step, field } => format!("deps.{step}.{field}"),
            Self::Missing => MISSING_VALUE_CODE.to_string(),
        }
    }
}

/// Render a JSON value as a JavaScript literal. Strings are single-quoted, objects
/// become `{ key: value }` literals and keys starting with `_` are dropped.
pub fn literal_code(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => quote(s),
        JsonValue::Array(items) if items.is_empty() => "[]".to_string(),
        JsonValue::Array(items) => {
            let items: Vec<_> = items.iter().map(literal_code).collect();
            format!("[ {} ]", items.join(", "))
        }
        JsonValue::Object(map) => {
            let fields: Vec<_> = map
                .iter()
                .filter(|(key, _)| !key.starts_with('_'))
                .map(|(key, value)| format!("{}: {}", object_key(key), literal_code(value)))
                .collect();
            if fields.is_empty() {
                "{}".to_string()
            } else {
                format!("{{ {} }}", fields.join(", "))
            }
        }
        other => other.to_string(),
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn object_key(key: &str) -> String {
    let mut chars = key.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if is_identifier {
        key.to_string()
    } else {
        quote(key)
    }
}

/// A named value resolved for the generated request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedValue {
    pub name: String,
    pub expression: Expression,
    pub code: String,
}

impl ResolvedValue {
    pub fn new(name: impl Into<String>, expression: Expression) -> Self {
        let code = expression.code();
        Self {
            name: name.into(),
            expression,
            code,
        }
    }
}

/// A piece of a request path template
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathSegment {
    Text { text: String },
    Placeholder { name: String, expression: Expression },
}

/// A request path with every `{name}` placeholder resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPath {
    pub segments: Vec<PathSegment>,
    /// The path as one JavaScript string expression
    pub code: String,
}

impl ResolvedPath {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        let code = path_code(&segments);
        Self { segments, code }
    }

    /// Placeholders that fell back to the missing-value marker
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            PathSegment::Placeholder {
                name,
                expression: Expression::Missing,
            } => Some(name.as_str()),
            _ => None,
        })
    }
}

/// Explicit values splice into the string, dependencies split it into a
/// concatenation and missing values leave a `{name PARAM GOES HERE}` marker.
fn path_code(segments: &[PathSegment]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut text = String::new();

    for segment in segments {
        match segment {
            PathSegment::Text { text: t } => text.push_str(t),
            PathSegment::Placeholder { name, expression } => match expression {
                Expression::Literal { value } => match value {
                    JsonValue::String(s) => text.push_str(s),
                    other => text.push_str(&other.to_string()),
                },
                Expression::Missing => text.push_str(&format!("{{{name} PARAM GOES HERE}}")),
                Expression::Dependency { .. } => {
                    if !text.is_empty() {
                        parts.push(quote(&std::mem::take(&mut text)));
                    }
                    parts.push(expression.code());
                }
            },
        }
    }

    if !text.is_empty() || parts.is_empty() {
        parts.push(quote(&text));
    }
    parts.join(" + ")
}

/// Declared parameters partitioned by location
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParameterBuckets {
    pub path: Vec<Parameter>,
    pub query: Vec<Parameter>,
    pub header: Vec<Parameter>,
    pub form_data: Vec<Parameter>,
    pub body: Vec<Parameter>,
}

/// Credential sent in the `Authorization` header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderSecurity {
    /// Environment variable holding the credential
    pub name: String,
    #[serde(rename = "type")]
    pub scheme: AuthScheme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuthScheme {
    Basic,
    Bearer,
}

/// apiKey credential sent as a query parameter or a named header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiKeyCredential {
    /// Environment variable holding the credential
    pub name: String,
    /// Query parameter or header carrying it
    #[serde(rename = "type")]
    pub key: String,
}

/// Load-test scaffolding attached to a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadTest {
    pub name: String,
    pub requests: u32,
    pub concurrent: u32,
}

/// Sequence metadata of a step descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepInfo {
    pub step: String,
    pub deps: DependencyMap,
}

/// One generated test case: a (path, operation, response, content type pair)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestDescriptor {
    /// Path template as declared
    pub path: String,
    pub method: Method,
    pub response_code: String,
    pub is_default: bool,
    /// Response code followed by the response description
    pub description: String,
    /// `description` on one line, cut to the configured width
    pub summary: String,
    pub content_type: String,
    pub return_type: String,
    pub has_schema: bool,
    /// Pretty-printed response schema
    pub schema: Option<String>,
    pub parameters: ParameterBuckets,
    pub header_security: Option<HeaderSecurity>,
    pub query_api_key: Option<ApiKeyCredential>,
    pub header_api_key: Option<ApiKeyCredential>,
    pub request_path: ResolvedPath,
    /// Base path + path, the key of `queryVals`/`bodyVals`
    pub request_key: String,
    pub query_values: Vec<ResolvedValue>,
    pub body_values: Vec<ResolvedValue>,
    pub load_test: Option<LoadTest>,
    pub step: Option<StepInfo>,
}

impl TestDescriptor {
    /// Whether the generated test should validate the body against the schema
    pub fn validates_response(&self) -> bool {
        self.has_schema && self.return_type == TYPE_JSON
    }
}

/// Imports the rendered file needs, accumulated over one path or sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContextFlags {
    pub import_validator: bool,
    pub import_env: bool,
    pub import_load_test: bool,
}

/// The descriptors of one operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationBlock {
    pub method: Method,
    pub tests: Vec<TestDescriptor>,
}

/// Everything generated for one path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathBlock {
    pub path: String,
    pub scheme: String,
    pub host: String,
    pub operations: Vec<OperationBlock>,
    pub flags: ContextFlags,
}

impl PathBlock {
    pub fn descriptors(&self) -> impl Iterator<Item = &TestDescriptor> {
        self.operations.iter().flat_map(|operation| operation.tests.iter())
    }
}

/// Everything generated for one sequence, steps in declared order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceBlock {
    pub name: String,
    pub scheme: String,
    pub host: String,
    pub steps: Vec<TestDescriptor>,
    pub flags: ContextFlags,
}

/// Environment template listing every declared security scheme
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentBlock {
    pub env_vars: Vec<String>,
}
