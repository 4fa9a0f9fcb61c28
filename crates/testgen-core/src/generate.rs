//! Generation entry point.
//!
//! Walks the selected paths, then the configured sequences, and finally adds the
//! environment block when the description declares security schemes. A failure
//! aborts only the path or sequence it occurred in; the remaining outputs are still
//! produced and the failures are reported next to them.

use crate::builders::{PathBuilder, SequenceBuilder};
use crate::config::RunConfig;
use crate::descriptor::{EnvironmentBlock, PathBlock, SequenceBlock};
use crate::openapi::ApiDescription;
use crate::Error;

use serde::Serialize;

/// Output name of the root path `/`
pub const ROOT_PATH_NAME: &str = "base-path";

/// Output name of the environment block
pub const ENVIRONMENT_NAME: &str = ".env";

/// A finished block waiting to be rendered
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "block", rename_all = "snake_case")]
pub enum OutputBlock {
    Path(PathBlock),
    Sequence(SequenceBlock),
    Environment(EnvironmentBlock),
}

/// A named output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedOutput {
    pub name: String,
    pub block: OutputBlock,
}

/// A path or sequence that could not be built
#[derive(Debug)]
pub struct GenerationFailure {
    pub name: String,
    pub error: Error,
}

/// Everything one run produced
#[derive(Debug, Default)]
pub struct Generation {
    pub outputs: Vec<GeneratedOutput>,
    pub failures: Vec<GenerationFailure>,
}

impl Generation {
    /// Whether every selected path and sequence was built
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The outputs, or the first failure when anything failed
    pub fn into_result(self) -> crate::Result<Vec<GeneratedOutput>> {
        match self.failures.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(self.outputs),
        }
    }

    fn push(&mut self, name: String, built: crate::Result<Option<OutputBlock>>) {
        match built {
            Ok(Some(block)) => self.outputs.push(GeneratedOutput { name, block }),
            Ok(None) => {}
            Err(error) => {
                log::warn!("Generation of '{}' failed: {}", name, error);
                self.failures.push(GenerationFailure { name, error });
            }
        }
    }
}

/// Build every output selected by `config`
pub fn generate(description: &ApiDescription, config: &RunConfig) -> Generation {
    let mut generation = Generation::default();
    let paths = PathBuilder::new(description, config);
    let sequences = SequenceBuilder::new(description, config);

    let targets: Vec<&str> = if config.path_names.is_empty() {
        description.paths.keys().map(String::as_str).collect()
    } else {
        config.path_names.iter().map(String::as_str).collect()
    };

    for path in targets {
        let built = paths.build(path).map(|block| block.map(OutputBlock::Path));
        generation.push(output_name(path), built);
    }

    for (name, steps) in &config.sequences {
        let built = sequences
            .build(name, steps)
            .map(|block| Some(OutputBlock::Sequence(block)));
        generation.push(name.clone(), built);
    }

    if !description.security_definitions.is_empty() {
        let block = EnvironmentBlock {
            env_vars: description.security_scheme_env_names(),
        };
        generation.push(
            ENVIRONMENT_NAME.to_string(),
            Ok(Some(OutputBlock::Environment(block))),
        );
    }

    log::info!(
        "Generated {} output(s), {} failure(s)",
        generation.outputs.len(),
        generation.failures.len()
    );
    generation
}

/// Derive an output name from a path: `/hello/world` becomes `hello-world` and `/`
/// becomes `base-path`
pub fn output_name(path: &str) -> String {
    if path == "/" {
        return ROOT_PATH_NAME.to_string();
    }
    path.strip_prefix('/').unwrap_or(path).replace('/', "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api() -> ApiDescription {
        serde_json::from_value(json!({
            "securityDefinitions": {
                "accessToken": {"type": "apiKey", "in": "query", "name": "accessToken"},
                "basicAuth": {"type": "basic"}
            },
            "paths": {
                "/": {"get": {"responses": {"200": {"description": "ok"}}}},
                "/hello/world": {"post": {"responses": {"200": {"description": "ok"}}}},
                "/old": {"get": {"deprecated": true, "responses": {"200": {"description": "ok"}}}},
                "/broken": {"get": {"parameters": [{"name": "x", "in": "cookie"}], "responses": {"200": {"description": "ok"}}}}
            }
        }))
        .expect("valid description")
    }

    #[test]
    fn test_output_name() {
        assert_eq!(output_name("/"), "base-path");
        assert_eq!(output_name("/hello"), "hello");
        assert_eq!(output_name("/hello/{id}/world"), "hello-{id}-world");
    }

    #[test]
    fn test_all_paths_in_document_order() {
        let api = api();
        let config = RunConfig::default();
        let generation = generate(&api, &config);

        let names: Vec<_> = generation.outputs.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["base-path", "hello-world", ".env"]);
        assert_eq!(generation.failures.len(), 1);
        assert_eq!(generation.failures[0].name, "broken");
        assert!(generation.failures[0].error.is_config());
        assert!(!generation.is_complete());

        match &generation.outputs[2].block {
            OutputBlock::Environment(env) => {
                assert_eq!(env.env_vars, vec!["ACCESS_TOKEN", "BASIC_AUTH"]);
            }
            other => panic!("expected environment block, got {other:?}"),
        }
    }

    #[test]
    fn test_selected_paths_then_sequences() -> crate::Result<()> {
        let api = api();
        let config: RunConfig = serde_json::from_value(json!({
            "pathName": ["/hello/world", "/"],
            "sequences": {"smoke": [{"step": "root", "path": "/", "op": "get"}]}
        }))?;

        let outputs = generate(&api, &config).into_result()?;
        let names: Vec<_> = outputs.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["hello-world", "base-path", "smoke", ".env"]);
        assert!(matches!(outputs[2].block, OutputBlock::Sequence(_)));
        Ok(())
    }

    #[test]
    fn test_unknown_target_path_fails_alone() -> crate::Result<()> {
        let api = api();
        let config: RunConfig = serde_json::from_value(json!({"pathName": ["/missing", "/"]}))?;

        let generation = generate(&api, &config);
        assert_eq!(generation.outputs.len(), 2);
        assert!(matches!(generation.failures[0].error, Error::OpenApi(_)));
        assert!(generation.into_result().is_err());
        Ok(())
    }
}
