//! Builds one [`TestDescriptor`] for a (path, operation, response, content type pair).

use super::RunContext;
use crate::config::{DependencyMap, RunConfig, SequenceStep};
use crate::descriptor::{
    ApiKeyCredential, AuthScheme, HeaderSecurity, LoadTest, ParameterBuckets, ResolvedValue,
    StepInfo, TestDescriptor,
};
use crate::openapi::{
    ApiDescription, ApiKeyLocation, Method, Operation, Parameter, ParameterLocation, PathItem,
    SecurityScheme,
};
use crate::resolver::{object_fields, request_key, resolve, resolve_path};
use crate::utils::{
    collapse_whitespace, to_lower_camel_case, to_screaming_snake_case, truncate_words,
};
use crate::Error;

/// What to build: one response of one operation, paired with content types
#[derive(Debug, Clone, Copy)]
pub struct DescriptorRequest<'a> {
    pub path: &'a str,
    pub method: Method,
    pub response_code: &'a str,
    /// Request content type
    pub content_type: &'a str,
    /// Response content type
    pub return_type: &'a str,
    /// Set when the descriptor is a step of a sequence
    pub step: Option<&'a SequenceStep>,
}

/// Credentials placed by the effective security requirement
#[derive(Debug, Default)]
struct Credentials {
    header_security: Option<HeaderSecurity>,
    query_api_key: Option<ApiKeyCredential>,
    header_api_key: Option<ApiKeyCredential>,
}

#[derive(Debug, Clone, Copy)]
pub struct DescriptorBuilder<'a> {
    description: &'a ApiDescription,
    config: &'a RunConfig,
}

impl<'a> DescriptorBuilder<'a> {
    pub fn new(description: &'a ApiDescription, config: &'a RunConfig) -> Self {
        Self {
            description,
            config,
        }
    }

    /// Build the descriptor. Security and content types are read from `context`,
    /// which must already hold the operation's effective declarations.
    pub fn build(
        &self,
        request: &DescriptorRequest<'_>,
        context: &mut RunContext,
    ) -> crate::Result<TestDescriptor> {
        let item = self.description.path_item(request.path)?;
        let operation = self.description.operation(request.path, request.method)?;
        let response = operation.responses.get(request.response_code).ok_or_else(|| {
            Error::openapi(format!(
                "Response '{}' is not declared on {} {}",
                request.response_code,
                request.method.verb(),
                request.path
            ))
        })?;

        let parameters = self.parameters(item, operation)?;
        let credentials = self.credentials(context)?;

        let schema = response
            .schema
            .as_ref()
            .map(serde_json::to_string_pretty)
            .transpose()?;

        let request_url = self.request_url(request.path);
        let request_key = request_key(self.description.base_path_prefix(), request.path);
        let dependencies = request.step.map(|step| &step.deps);

        let request_path = resolve_path(&request_url, Some(&self.config.path_params), dependencies);
        let query_values = self.query_values(&parameters, &request_key, dependencies);
        let body_values = self.body_values(&parameters, &request_key, dependencies)?;

        let load_test = self
            .config
            .load_test_for(request.path, request.method)
            .map(|entry| LoadTest {
                name: format!(
                    "{}_{}_load_test",
                    request.path.replace('/', "_"),
                    request.method
                ),
                requests: entry.load.requests(),
                concurrent: entry.load.concurrent(),
            });
        if load_test.is_some() {
            context.flags.import_load_test = true;
        }

        let description = format!("{} {}", request.response_code, response.description);
        let summary = truncate_words(
            &collapse_whitespace(&description),
            self.config.description_limit(),
        );

        Ok(TestDescriptor {
            path: request.path.to_string(),
            method: request.method,
            response_code: request.response_code.to_string(),
            is_default: request.response_code == "default",
            description,
            summary,
            content_type: request.content_type.to_string(),
            return_type: request.return_type.to_string(),
            has_schema: schema.is_some(),
            schema,
            parameters,
            header_security: credentials.header_security,
            query_api_key: credentials.query_api_key,
            header_api_key: credentials.header_api_key,
            request_path,
            request_key,
            query_values,
            body_values,
            load_test,
            step: request.step.map(|step| StepInfo {
                step: step.step.clone(),
                deps: step.deps.clone(),
            }),
        })
    }

    /// Origin (request dialect only), base path and operation path
    fn request_url(&self, path: &str) -> String {
        let origin = if self.config.needs_origin() {
            self.description.origin()
        } else {
            String::new()
        };
        format!("{}{}{}", origin, self.description.base_path_prefix(), path)
    }

    /// Partition path-level and operation-level parameters by location.
    ///
    /// Operation-level declarations replace path-level ones of the same name.
    fn parameters(
        &self,
        item: &PathItem,
        operation: &Operation,
    ) -> crate::Result<ParameterBuckets> {
        let own = operation
            .parameters
            .iter()
            .map(|entry| self.description.resolve_parameter(entry))
            .collect::<crate::Result<Vec<_>>>()?;

        let mut buckets = ParameterBuckets::default();
        for entry in &item.parameters {
            let parameter = self.description.resolve_parameter(entry)?;
            if own.iter().any(|p| p.name == parameter.name) {
                continue;
            }
            if parameter.location == ParameterLocation::Body {
                return Err(Error::config(format!(
                    "Body parameter '{}' may only be declared on an operation",
                    parameter.name
                )));
            }
            place(&mut buckets, parameter)?;
        }
        for parameter in own {
            place(&mut buckets, parameter)?;
        }
        Ok(buckets)
    }

    /// Place every scheme of the first effective security requirement
    fn credentials(&self, context: &RunContext) -> crate::Result<Credentials> {
        let mut credentials = Credentials::default();
        let Some(requirement) = context.security.first() else {
            return Ok(credentials);
        };

        for scheme_name in requirement.keys() {
            let scheme = self
                .description
                .security_definitions
                .get(scheme_name)
                .ok_or_else(|| {
                    Error::config(format!("Security scheme '{}' is not defined", scheme_name))
                })?;
            let env_name = to_screaming_snake_case(scheme_name);

            match scheme {
                SecurityScheme::Basic => {
                    credentials.header_security = Some(HeaderSecurity {
                        name: env_name,
                        scheme: AuthScheme::Basic,
                    });
                }
                SecurityScheme::OAuth2 => {
                    credentials.header_security = Some(HeaderSecurity {
                        name: env_name,
                        scheme: AuthScheme::Bearer,
                    });
                }
                SecurityScheme::ApiKey { location, name } => match location {
                    ApiKeyLocation::Query => {
                        credentials.query_api_key = Some(ApiKeyCredential {
                            name: env_name,
                            key: to_lower_camel_case(name),
                        });
                    }
                    ApiKeyLocation::Header => {
                        credentials.header_api_key = Some(ApiKeyCredential {
                            name: env_name,
                            key: name.clone(),
                        });
                    }
                    ApiKeyLocation::Unknown(tag) => {
                        return Err(Error::config(format!(
                            "Security scheme '{}' places its key in unknown location '{}'",
                            scheme_name, tag
                        )));
                    }
                },
                SecurityScheme::Unknown(kind) => {
                    return Err(Error::config(format!(
                        "Security scheme '{}' has unknown type '{}'",
                        scheme_name, kind
                    )));
                }
            }
        }
        Ok(credentials)
    }

    fn query_values(
        &self,
        parameters: &ParameterBuckets,
        request_key: &str,
        dependencies: Option<&DependencyMap>,
    ) -> Vec<ResolvedValue> {
        let explicit = self.config.query_values(request_key);
        parameters
            .query
            .iter()
            .map(|parameter| {
                ResolvedValue::new(
                    &parameter.name,
                    resolve(&parameter.name, explicit, dependencies),
                )
            })
            .collect()
    }

    /// One value per property of each body schema, or per body parameter when its
    /// schema declares no properties
    fn body_values(
        &self,
        parameters: &ParameterBuckets,
        request_key: &str,
        dependencies: Option<&DependencyMap>,
    ) -> crate::Result<Vec<ResolvedValue>> {
        let explicit = self.config.body_values(request_key);
        let mut values = Vec::new();

        for parameter in &parameters.body {
            let fields = match &parameter.schema {
                Some(schema) => object_fields(self.description.resolve_schema(schema)?),
                None => Vec::new(),
            };
            let fields = if fields.is_empty() {
                vec![parameter.name.as_str()]
            } else {
                fields
            };

            values.extend(
                fields
                    .into_iter()
                    .map(|field| ResolvedValue::new(field, resolve(field, explicit, dependencies))),
            );
        }
        Ok(values)
    }
}

fn place(buckets: &mut ParameterBuckets, parameter: &Parameter) -> crate::Result<()> {
    let bucket = match &parameter.location {
        ParameterLocation::Path => &mut buckets.path,
        ParameterLocation::Query => &mut buckets.query,
        ParameterLocation::Header => &mut buckets.header,
        ParameterLocation::FormData => &mut buckets.form_data,
        ParameterLocation::Body => &mut buckets.body,
        ParameterLocation::Unknown(tag) => {
            return Err(Error::config(format!(
                "Parameter '{}' has unknown location '{}'",
                parameter.name, tag
            )));
        }
    };
    bucket.push(parameter.clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TestModule;
    use crate::descriptor::{Expression, TYPE_JSON};
    use serde_json::{json, Value as JsonValue};

    fn description(value: JsonValue) -> ApiDescription {
        serde_json::from_value(value).expect("valid description")
    }

    fn request<'a>(path: &'a str, method: Method, code: &'a str) -> DescriptorRequest<'a> {
        DescriptorRequest {
            path,
            method,
            response_code: code,
            content_type: TYPE_JSON,
            return_type: TYPE_JSON,
            step: None,
        }
    }

    fn build(
        description: &ApiDescription,
        config: &RunConfig,
        request: DescriptorRequest<'_>,
    ) -> crate::Result<TestDescriptor> {
        let operation = description.operation(request.path, request.method)?;
        let mut context = RunContext::new();
        context.adopt(description, operation);
        DescriptorBuilder::new(description, config).build(&request, &mut context)
    }

    fn pets() -> ApiDescription {
        description(json!({
            "swagger": "2.0",
            "basePath": "/v1",
            "paths": {
                "/pets/{id}": {
                    "parameters": [
                        {"name": "id", "in": "path", "required": true, "type": "string"},
                        {"name": "verbose", "in": "query", "type": "boolean"}
                    ],
                    "put": {
                        "parameters": [
                            {"name": "verbose", "in": "header", "type": "boolean"},
                            {"name": "pet", "in": "body", "schema": {"$ref": "#/definitions/Pet"}}
                        ],
                        "responses": {
                            "200": {"description": "updated   the\n pet", "schema": {"$ref": "#/definitions/Pet"}},
                            "default": {"description": "error"}
                        }
                    }
                }
            },
            "definitions": {
                "Pet": {"type": "object", "properties": {"name": {"type": "string"}, "age": {"type": "integer"}}}
            }
        }))
    }

    #[test]
    fn test_operation_parameters_replace_path_parameters() -> crate::Result<()> {
        let api = pets();
        let config = RunConfig::default();
        let descriptor = build(&api, &config, request("/pets/{id}", Method::Put, "200"))?;

        let names = |params: &[Parameter]| {
            params.iter().map(|p| p.name.clone()).collect::<Vec<_>>()
        };
        assert_eq!(names(&descriptor.parameters.path), vec!["id"]);
        assert!(descriptor.parameters.query.is_empty());
        assert_eq!(names(&descriptor.parameters.header), vec!["verbose"]);
        assert_eq!(names(&descriptor.parameters.body), vec!["pet"]);
        Ok(())
    }

    #[test]
    fn test_body_fields_follow_schema_reference() -> crate::Result<()> {
        let api = pets();
        let mut config = RunConfig::default();
        config
            .body_vals
            .insert("/v1/pets/{id}".into(), serde_json::from_value(json!({"name": "rex"}))?);

        let descriptor = build(&api, &config, request("/pets/{id}", Method::Put, "200"))?;
        let body: Vec<_> = descriptor
            .body_values
            .iter()
            .map(|value| (value.name.as_str(), value.code.as_str()))
            .collect();
        assert_eq!(body, vec![("name", "'rex'"), ("age", "'DATA GOES HERE'")]);
        Ok(())
    }

    #[test]
    fn test_request_path_and_key() -> crate::Result<()> {
        let api = pets();
        let mut config = RunConfig::new(TestModule::Request);
        config.path_params.insert("id".into(), json!(7));

        let descriptor = build(&api, &config, request("/pets/{id}", Method::Put, "200"))?;
        assert_eq!(descriptor.request_path.code, "'http://localhost:10010/v1/pets/7'");
        assert_eq!(descriptor.request_key, "/v1/pets/{id}");

        let config = RunConfig::new(TestModule::Supertest);
        let descriptor = build(&api, &config, request("/pets/{id}", Method::Put, "200"))?;
        assert_eq!(descriptor.request_path.code, "'/v1/pets/{id PARAM GOES HERE}'");
        assert_eq!(descriptor.request_key, "/v1/pets/{id}");
        Ok(())
    }

    #[test]
    fn test_schema_and_description() -> crate::Result<()> {
        let api = pets();
        let mut config = RunConfig::default();
        config.max_len = Some(65);

        let ok = build(&api, &config, request("/pets/{id}", Method::Put, "200"))?;
        assert!(ok.has_schema);
        assert!(ok.validates_response());
        assert!(ok.schema.as_deref().is_some_and(|s| s.contains("#/definitions/Pet")));
        assert_eq!(ok.description, "200 updated   the\n pet");
        assert_eq!(ok.summary, "200 updated the...");
        assert!(!ok.is_default);

        let fallback = build(&api, &config, request("/pets/{id}", Method::Put, "default"))?;
        assert!(!fallback.has_schema);
        assert!(fallback.is_default);
        Ok(())
    }

    #[test]
    fn test_undeclared_response_is_rejected() {
        let api = pets();
        let config = RunConfig::default();
        let err = build(&api, &config, request("/pets/{id}", Method::Put, "404")).unwrap_err();
        assert!(matches!(err, Error::OpenApi(_)));
    }

    #[test]
    fn test_security_placement() -> crate::Result<()> {
        let api = description(json!({
            "securityDefinitions": {
                "basicAuth": {"type": "basic"},
                "petstore_auth": {"type": "oauth2"},
                "accessToken": {"type": "apiKey", "in": "query", "name": "access_token"},
                "apiKey": {"type": "apiKey", "in": "header", "name": "X-API-KEY"}
            },
            "security": [{"basicAuth": [], "apiKey": []}, {"accessToken": []}],
            "paths": {
                "/": {
                    "get": {"responses": {"200": {"description": "ok"}}},
                    "post": {
                        "security": [{"petstore_auth": ["write"], "accessToken": []}],
                        "responses": {"200": {"description": "ok"}}
                    }
                }
            }
        }));
        let config = RunConfig::default();

        let get = build(&api, &config, request("/", Method::Get, "200"))?;
        assert_eq!(
            get.header_security,
            Some(HeaderSecurity {
                name: "BASIC_AUTH".into(),
                scheme: AuthScheme::Basic
            })
        );
        assert_eq!(
            get.header_api_key,
            Some(ApiKeyCredential {
                name: "API_KEY".into(),
                key: "X-API-KEY".into()
            })
        );
        // Only the first requirement object applies
        assert_eq!(get.query_api_key, None);

        let post = build(&api, &config, request("/", Method::Post, "200"))?;
        assert_eq!(
            post.header_security,
            Some(HeaderSecurity {
                name: "PETSTORE_AUTH".into(),
                scheme: AuthScheme::Bearer
            })
        );
        assert_eq!(
            post.query_api_key,
            Some(ApiKeyCredential {
                name: "ACCESS_TOKEN".into(),
                key: "accessToken".into()
            })
        );
        assert_eq!(post.header_api_key, None);
        Ok(())
    }

    #[test]
    fn test_request_key_is_the_same_in_every_dialect() -> crate::Result<()> {
        let api = description(json!({
            "basePath": "/v1",
            "paths": {
                "/café/{id}": {
                    "post": {
                        "parameters": [
                            {"name": "q", "in": "query"},
                            {"name": "label", "in": "body"}
                        ],
                        "responses": {"200": {"description": "ok"}}
                    }
                }
            }
        }));

        for module in [TestModule::Request, TestModule::Supertest] {
            let config: RunConfig = serde_json::from_value(json!({
                "testModule": module.as_str(),
                "queryVals": {"/v1/café/{id}": {"q": "x"}},
                "bodyVals": {"/v1/café/{id}": {"label": "latte"}}
            }))?;

            let descriptor = build(&api, &config, request("/café/{id}", Method::Post, "200"))?;
            assert_eq!(descriptor.request_key, "/v1/café/{id}", "{module:?}");
            assert_eq!(descriptor.query_values[0].code, "'x'", "{module:?}");
            assert_eq!(descriptor.body_values[0].code, "'latte'", "{module:?}");
        }
        Ok(())
    }

    #[test]
    fn test_acronym_scheme_names() -> crate::Result<()> {
        let api = description(json!({
            "securityDefinitions": {
                "APIKey": {"type": "apiKey", "in": "query", "name": "APIKey"},
                "HTTPBearer": {"type": "oauth2"}
            },
            "security": [{"APIKey": [], "HTTPBearer": []}],
            "paths": {"/": {"get": {"responses": {"200": {"description": "ok"}}}}}
        }));
        let config = RunConfig::default();

        let descriptor = build(&api, &config, request("/", Method::Get, "200"))?;
        assert_eq!(
            descriptor.query_api_key,
            Some(ApiKeyCredential {
                name: "API_KEY".into(),
                key: "apiKey".into()
            })
        );
        assert_eq!(
            descriptor.header_security,
            Some(HeaderSecurity {
                name: "HTTP_BEARER".into(),
                scheme: AuthScheme::Bearer
            })
        );
        Ok(())
    }

    #[test]
    fn test_unknown_tags_are_config_errors() {
        let api = description(json!({
            "securityDefinitions": {
                "cookieKey": {"type": "apiKey", "in": "cookie", "name": "sid"},
                "mtls": {"type": "mutualTLS"}
            },
            "paths": {
                "/a": {"get": {"security": [{"cookieKey": []}], "responses": {"200": {"description": "ok"}}}},
                "/b": {"get": {"security": [{"mtls": []}], "responses": {"200": {"description": "ok"}}}},
                "/c": {"get": {"security": [{"nobody": []}], "responses": {"200": {"description": "ok"}}}},
                "/d": {"get": {"parameters": [{"name": "sid", "in": "cookie"}], "responses": {"200": {"description": "ok"}}}},
                "/e": {
                    "parameters": [{"name": "payload", "in": "body"}],
                    "get": {"responses": {"200": {"description": "ok"}}}
                }
            }
        }));
        let config = RunConfig::default();

        for path in ["/a", "/b", "/c", "/d", "/e"] {
            let err = build(&api, &config, request(path, Method::Get, "200")).unwrap_err();
            assert!(err.is_config(), "{path}: {err}");
        }
    }

    #[test]
    fn test_load_test_attachment() -> crate::Result<()> {
        let api = pets();
        let config: RunConfig = serde_json::from_value(json!({
            "loadTest": [{"pathName": "/pets/{id}", "operation": "put", "load": {"concurrent": 5}}]
        }))?;

        let operation = api.operation("/pets/{id}", Method::Put)?;
        let mut context = RunContext::new();
        context.adopt(&api, operation);
        let descriptor = DescriptorBuilder::new(&api, &config)
            .build(&request("/pets/{id}", Method::Put, "200"), &mut context)?;

        assert_eq!(
            descriptor.load_test,
            Some(LoadTest {
                name: "_pets_{id}_put_load_test".into(),
                requests: 1000,
                concurrent: 5
            })
        );
        assert!(context.flags.import_load_test);
        Ok(())
    }

    #[test]
    fn test_step_dependencies_feed_the_resolver() -> crate::Result<()> {
        let api = description(json!({
            "paths": {
                "/{id}": {
                    "get": {
                        "parameters": [
                            {"name": "id", "in": "path", "required": true},
                            {"name": "id", "in": "query"}
                        ],
                        "responses": {"200": {"description": "ok"}}
                    }
                }
            }
        }));
        let step: SequenceStep = serde_json::from_value(json!({
            "step": "retrieve", "path": "/{id}", "op": "get", "deps": {"create": "id"}
        }))?;
        let config = RunConfig::new(TestModule::Request);
        let mut req = request("/{id}", Method::Get, "200");
        req.step = Some(&step);

        let descriptor = build(&api, &config, req)?;
        assert_eq!(descriptor.request_path.code, "'http://localhost:10010/' + deps.create.id");
        assert_eq!(
            descriptor.query_values[0].expression,
            Expression::Dependency { step: "create".into(), field: "id".into() }
        );
        assert_eq!(descriptor.step.as_ref().map(|s| s.step.as_str()), Some("retrieve"));
        Ok(())
    }
}
