//! Builds an ordered sequence block where later steps consume earlier responses.

use super::{DescriptorBuilder, DescriptorRequest, RunContext};
use crate::config::{RunConfig, SequenceStep};
use crate::descriptor::{SequenceBlock, TYPE_JSON};
use crate::openapi::ApiDescription;
use crate::Error;

/// Response every sequence step expects
pub const STEP_RESPONSE: &str = "200";

#[derive(Debug, Clone, Copy)]
pub struct SequenceBuilder<'a> {
    description: &'a ApiDescription,
    descriptors: DescriptorBuilder<'a>,
}

impl<'a> SequenceBuilder<'a> {
    pub fn new(description: &'a ApiDescription, config: &'a RunConfig) -> Self {
        Self {
            description,
            descriptors: DescriptorBuilder::new(description, config),
        }
    }

    /// Build one descriptor per step, in declared order.
    ///
    /// Every step targets the `200` response with JSON on both sides. A step may only
    /// depend on steps declared before it. One [`RunContext`] spans the sequence.
    pub fn build(&self, name: &str, steps: &[SequenceStep]) -> crate::Result<SequenceBlock> {
        let mut context = RunContext::new();
        let mut labels: Vec<&str> = Vec::with_capacity(steps.len());
        let mut descriptors = Vec::with_capacity(steps.len());

        for step in steps {
            if labels.contains(&step.step.as_str()) {
                return Err(Error::config(format!(
                    "Sequence '{}' declares step '{}' twice",
                    name, step.step
                )));
            }
            if let Some(source) = step
                .deps
                .keys()
                .find(|source| !labels.contains(&source.as_str()))
            {
                return Err(Error::config(format!(
                    "Step '{}' of sequence '{}' depends on '{}', which is not an earlier step",
                    step.step, name, source
                )));
            }

            let operation = self.description.operation(&step.path, step.operation)?;
            if !operation.responses.contains_key(STEP_RESPONSE) {
                return Err(Error::missing_response(&step.path, step.operation.verb()));
            }
            context.adopt(self.description, operation);

            let request = DescriptorRequest {
                path: &step.path,
                method: step.operation,
                response_code: STEP_RESPONSE,
                content_type: TYPE_JSON,
                return_type: TYPE_JSON,
                step: Some(step),
            };
            let descriptor = self.descriptors.build(&request, &mut context)?;

            if descriptor.has_schema {
                context.flags.import_validator = true;
            }
            if context.is_secured() {
                context.flags.import_env = true;
            }

            log::debug!(
                "Sequence '{}': step '{}' resolved to {} {}",
                name,
                step.step,
                step.operation.verb(),
                step.path
            );
            labels.push(&step.step);
            descriptors.push(descriptor);
        }

        Ok(SequenceBlock {
            name: name.to_string(),
            scheme: self.description.scheme().to_string(),
            host: self.description.host().to_string(),
            steps: descriptors,
            flags: context.flags,
        })
    }
}
