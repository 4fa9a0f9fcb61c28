//! Enumerates the responses and content types of one operation.

use super::{DescriptorBuilder, DescriptorRequest, RunContext};
use crate::config::RunConfig;
use crate::descriptor::{OperationBlock, TYPE_JSON};
use crate::openapi::{ApiDescription, Method};

#[derive(Debug, Clone, Copy)]
pub struct OperationBuilder<'a> {
    description: &'a ApiDescription,
    descriptors: DescriptorBuilder<'a>,
}

impl<'a> OperationBuilder<'a> {
    pub fn new(description: &'a ApiDescription, config: &'a RunConfig) -> Self {
        Self {
            description,
            descriptors: DescriptorBuilder::new(description, config),
        }
    }

    /// One descriptor per response x consumes x produces, in declaration order.
    ///
    /// Raises the validator flag for every JSON response with a schema and the
    /// environment flag when the operation is secured.
    pub fn build(
        &self,
        path: &str,
        method: Method,
        context: &mut RunContext,
    ) -> crate::Result<OperationBlock> {
        let operation = self.description.operation(path, method)?;
        context.adopt(self.description, operation);

        let consumes = or_json(&context.consumes);
        let produces = or_json(&context.produces);

        let mut tests =
            Vec::with_capacity(operation.responses.len() * consumes.len() * produces.len());
        for response_code in operation.responses.keys() {
            for content_type in &consumes {
                for return_type in &produces {
                    let request = DescriptorRequest {
                        path,
                        method,
                        response_code,
                        content_type,
                        return_type,
                        step: None,
                    };
                    let descriptor = self.descriptors.build(&request, context)?;

                    if descriptor.validates_response() {
                        context.flags.import_validator = true;
                    }
                    if context.is_secured() {
                        context.flags.import_env = true;
                    }
                    tests.push(descriptor);
                }
            }
        }

        log::debug!(
            "Built {} descriptor(s) for {} {}",
            tests.len(),
            method.verb(),
            path
        );
        Ok(OperationBlock { method, tests })
    }
}

/// Declared content types, or `application/json` alone when none are declared
fn or_json(types: &[String]) -> Vec<String> {
    if types.is_empty() {
        vec![TYPE_JSON.to_string()]
    } else {
        types.to_vec()
    }
}
