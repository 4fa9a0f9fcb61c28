//! Descriptor builders.
//!
//! The builders walk an [`ApiDescription`](crate::openapi::ApiDescription) from the
//! inside out: [`DescriptorBuilder`] resolves one (path, operation, response, content
//! type pair), [`OperationBuilder`] enumerates the responses and content types of one
//! operation, [`PathBuilder`] the active operations of one path and
//! [`SequenceBuilder`] the ordered steps of one sequence.
//!
//! Builders are stateless; everything that accumulates while a path or a sequence is
//! processed lives in the [`RunContext`] threaded through them.

pub mod descriptor;
pub mod operation;
pub mod path;
pub mod sequence;

pub use descriptor::{DescriptorBuilder, DescriptorRequest};
pub use operation::OperationBuilder;
pub use path::PathBuilder;
pub use sequence::SequenceBuilder;

use crate::descriptor::ContextFlags;
use crate::openapi::{ApiDescription, Operation, SecurityRequirement};

/// Accumulator scoped to one path or one sequence.
///
/// Created when processing of the path or sequence starts, passed by `&mut` to every
/// builder call and dropped once its block is assembled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunContext {
    pub flags: ContextFlags,
    /// Effective request content types of the current operation
    pub consumes: Vec<String>,
    /// Effective response content types of the current operation
    pub produces: Vec<String>,
    /// Effective security requirements of the current operation
    pub security: Vec<SecurityRequirement>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take over the operation's content types and security, falling back to the
    /// document-wide declarations when the operation declares none
    pub fn adopt(&mut self, description: &ApiDescription, operation: &Operation) {
        self.consumes = inherit(&operation.consumes, &description.consumes);
        self.produces = inherit(&operation.produces, &description.produces);
        self.security = inherit(&operation.security, &description.security);
    }

    /// Whether the current operation carries any security requirement
    pub fn is_secured(&self) -> bool {
        !self.security.is_empty()
    }
}

fn inherit<T: Clone>(own: &[T], global: &[T]) -> Vec<T> {
    if own.is_empty() {
        global.to_vec()
    } else {
        own.to_vec()
    }
}
