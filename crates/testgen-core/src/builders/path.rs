//! Builds the block of one path from its active operations.

use super::{OperationBuilder, RunContext};
use crate::config::RunConfig;
use crate::descriptor::PathBlock;
use crate::openapi::ApiDescription;

#[derive(Debug, Clone, Copy)]
pub struct PathBuilder<'a> {
    description: &'a ApiDescription,
    operations: OperationBuilder<'a>,
}

impl<'a> PathBuilder<'a> {
    pub fn new(description: &'a ApiDescription, config: &'a RunConfig) -> Self {
        Self {
            description,
            operations: OperationBuilder::new(description, config),
        }
    }

    /// Build the block of `path`, or `None` when it has no active operation.
    ///
    /// A fresh [`RunContext`] is used for the path, so flags never leak between paths.
    pub fn build(&self, path: &str) -> crate::Result<Option<PathBlock>> {
        let item = self.description.path_item(path)?;
        let mut context = RunContext::new();

        let operations = item
            .active_operations()
            .map(|(method, _)| self.operations.build(path, method, &mut context))
            .collect::<crate::Result<Vec<_>>>()?;

        if operations.is_empty() {
            log::info!("Skipping {}: no active operations", path);
            return Ok(None);
        }

        Ok(Some(PathBlock {
            path: path.to_string(),
            scheme: self.description.scheme().to_string(),
            host: self.description.host().to_string(),
            operations,
            flags: context.flags,
        }))
    }
}
