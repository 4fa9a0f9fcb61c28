//! Testgen Core Library
//!
//! This library turns a Swagger 2.0 API description into integration test scaffolds.
//! It walks the description, layers path-level declarations under operation-level
//! ones, resolves path/query/body placeholders (including values produced by earlier
//! steps of a sequence) and produces renderer-ready test descriptors.
//!
//! ```no_run
//! use testgen_core::{generate, ApiDescription, Renderer, RunConfig, TeraRenderer};
//!
//! # #[tokio::main]
//! # async fn main() -> testgen_core::Result<()> {
//! let description = ApiDescription::from_file_or_url("swagger.yaml").await?;
//! let config = RunConfig::from_file("testgen.yaml").await?;
//! let renderer = TeraRenderer::for_config(&config)?;
//!
//! for output in generate(&description, &config).into_result()? {
//!     println!("{}:\n{}", output.name, renderer.render(&output.block)?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod builders;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod generate;
pub mod openapi;
pub mod render;
pub mod resolver;
pub mod utils;

pub use crate::{
    builders::RunContext,
    config::{AssertionStyle, RunConfig, TestModule},
    descriptor::TestDescriptor,
    error::{Error, Result},
    generate::{generate, GeneratedOutput, Generation, OutputBlock},
    openapi::ApiDescription,
    render::{Renderer, TeraRenderer},
};
