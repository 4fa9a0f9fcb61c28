//! Placeholder resolution.
//!
//! Decides what a generated test sends for each path placeholder, query parameter and
//! body field. Resolution is tiered and the first tier that answers wins:
//!
//! 1. a non-null explicit value from the run configuration becomes a literal,
//! 2. otherwise the first dependency source (in declaration order) listing the name
//!    among its fields becomes a reference to that step's output,
//! 3. otherwise the value is marked missing.
//!
//! All functions here are stateless and may be called for any number of descriptors.

use crate::config::{DependencyMap, ValuePool};
use crate::descriptor::{Expression, PathSegment, ResolvedPath};

use serde_json::Value as JsonValue;

/// Resolve a single named value
pub fn resolve(
    name: &str,
    explicit: Option<&ValuePool>,
    dependencies: Option<&DependencyMap>,
) -> Expression {
    if let Some(value) = explicit
        .and_then(|pool| pool.get(name))
        .filter(|value| !value.is_null())
    {
        return Expression::Literal {
            value: value.clone(),
        };
    }

    if let Some((step, _)) = dependencies
        .into_iter()
        .flatten()
        .find(|(_, fields)| fields.contains(name))
    {
        return Expression::Dependency {
            step: step.clone(),
            field: name.to_string(),
        };
    }

    log::debug!("No value or dependency for '{}', leaving it to be filled in", name);
    Expression::Missing
}

/// Resolve every `{name}` placeholder of a request path
pub fn resolve_path(
    path: &str,
    explicit: Option<&ValuePool>,
    dependencies: Option<&DependencyMap>,
) -> ResolvedPath {
    let decoded = decode_braces(path);
    let segments = tokenize(&decoded)
        .into_iter()
        .map(|token| match token {
            PathToken::Text(text) => PathSegment::Text {
                text: text.to_string(),
            },
            PathToken::Placeholder(name) => PathSegment::Placeholder {
                name: name.to_string(),
                expression: resolve(name, explicit, dependencies),
            },
        })
        .collect();
    ResolvedPath::new(segments)
}

/// A piece of a path template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathToken<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

/// Split a path template into literal text and placeholder names.
///
/// Runs of braces collapse, so `{{id}}` yields the placeholder `id`. An opening
/// brace without a closing one is kept as text.
pub fn tokenize(path: &str) -> Vec<PathToken<'_>> {
    let mut tokens = Vec::new();
    let mut rest = path;

    while let Some(open) = rest.find('{') {
        let name_start = open + rest[open..].len() - rest[open..].trim_start_matches('{').len();
        let Some(name_len) = rest[name_start..].find('}') else {
            break;
        };
        let name_end = name_start + name_len;
        let close_end =
            name_end + rest[name_end..].len() - rest[name_end..].trim_start_matches('}').len();

        if open > 0 {
            tokens.push(PathToken::Text(&rest[..open]));
        }
        tokens.push(PathToken::Placeholder(&rest[name_start..name_end]));
        rest = &rest[close_end..];
    }

    if !rest.is_empty() {
        tokens.push(PathToken::Text(rest));
    }
    tokens
}

/// Names of the placeholders of a path template, in order
pub fn placeholders(path: &str) -> Vec<&str> {
    tokenize(path)
        .into_iter()
        .filter_map(|token| match token {
            PathToken::Placeholder(name) => Some(name),
            PathToken::Text(_) => None,
        })
        .collect()
}

/// Key of the `queryVals`/`bodyVals` entries of a path: base path and operation path,
/// never the origin, with encoded braces restored. The key is the same for every
/// dialect.
pub fn request_key(base_path: &str, path: &str) -> String {
    decode_braces(&format!("{base_path}{path}"))
}

fn decode_braces(path: &str) -> String {
    path.replace("%7B", "{")
        .replace("%7b", "{")
        .replace("%7D", "}")
        .replace("%7d", "}")
}

/// Field names a body parameter's schema contributes to the request body
pub fn object_fields(schema: &JsonValue) -> Vec<&str> {
    schema
        .get("properties")
        .and_then(JsonValue::as_object)
        .map(|properties| properties.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DependencyFields;
    use serde_json::json;

    fn pool(value: JsonValue) -> ValuePool {
        serde_json::from_value(value).expect("value pool")
    }

    fn deps(entries: &[(&str, &[&str])]) -> DependencyMap {
        entries
            .iter()
            .map(|(step, fields)| {
                (
                    step.to_string(),
                    fields.iter().copied().collect::<DependencyFields>(),
                )
            })
            .collect()
    }

    #[test]
    fn test_explicit_value_wins_over_dependency() {
        let explicit = pool(json!({"id": 5}));
        let dependencies = deps(&[("create", &["id"])]);
        let expression = resolve("id", Some(&explicit), Some(&dependencies));
        assert_eq!(expression, Expression::Literal { value: json!(5) });
        assert_eq!(expression.code(), "5");
    }

    #[test]
    fn test_textual_value_is_quoted() {
        let explicit = pool(json!({"name": "fido"}));
        assert_eq!(resolve("name", Some(&explicit), None).code(), "'fido'");
    }

    #[test]
    fn test_null_value_falls_through() {
        let explicit = pool(json!({"id": null}));
        let dependencies = deps(&[("create", &["id"])]);
        assert_eq!(
            resolve("id", Some(&explicit), Some(&dependencies)).code(),
            "deps.create.id"
        );
        assert!(resolve("id", Some(&explicit), None).is_missing());
    }

    #[test]
    fn test_first_matching_dependency_wins() {
        let dependencies = deps(&[("list", &["name"]), ("create", &["id"]), ("update", &["id"])]);
        assert_eq!(
            resolve("id", None, Some(&dependencies)),
            Expression::Dependency {
                step: "create".into(),
                field: "id".into()
            }
        );
    }

    #[test]
    fn test_dependency_fields_match_exactly() {
        let dependencies = deps(&[("create", &["identifier"])]);
        assert!(resolve("id", None, Some(&dependencies)).is_missing());
    }

    #[test]
    fn test_missing_without_sources() {
        assert!(resolve("id", None, None).is_missing());
        assert!(resolve("id", Some(&ValuePool::new()), Some(&DependencyMap::new())).is_missing());
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("/pets/{id}/toys/{{toyId}}"),
            vec![
                PathToken::Text("/pets/"),
                PathToken::Placeholder("id"),
                PathToken::Text("/toys/"),
                PathToken::Placeholder("toyId"),
            ]
        );
        assert_eq!(tokenize("/plain"), vec![PathToken::Text("/plain")]);
        assert_eq!(tokenize("/broken/{id"), vec![PathToken::Text("/broken/{id")]);
        assert_eq!(placeholders("/{id}/{loc}"), vec!["id", "loc"]);
        // Stateless: scanning twice gives the same answer
        assert_eq!(placeholders("/{id}/{loc}"), vec!["id", "loc"]);
    }

    #[test]
    fn test_resolve_path_mixes_tiers() {
        let explicit = pool(json!({"loc": 94043}));
        let dependencies = deps(&[("create", &["id"])]);
        let path = resolve_path(
            "http://localhost:10010/{id}/{loc}/{other}",
            Some(&explicit),
            Some(&dependencies),
        );
        assert_eq!(
            path.code,
            "'http://localhost:10010/' + deps.create.id + '/94043/{other PARAM GOES HERE}'"
        );
    }

    #[test]
    fn test_resolve_path_decodes_braces() {
        let path = resolve_path("/pets/%7Bid%7D", None, None);
        assert_eq!(path.code, "'/pets/{id PARAM GOES HERE}'");
    }

    #[test]
    fn test_request_key() {
        assert_eq!(request_key("/v1", "/pets/{id}"), "/v1/pets/{id}");
        assert_eq!(request_key("", "/"), "/");
        assert_eq!(request_key("", "/v1/%7Bid%7D"), "/v1/{id}");
        assert_eq!(request_key("", "/café/{id}"), "/café/{id}");
    }

    #[test]
    fn test_object_fields() {
        let schema = json!({"type": "object", "properties": {"name": {}, "age": {}}});
        assert_eq!(object_fields(&schema), vec!["name", "age"]);
        assert!(object_fields(&json!({"type": "string"})).is_empty());
    }
}
