//! Rendering of finished blocks into test source text.
//!
//! The [`Renderer`] trait is the seam between the descriptor engine and the text it
//! becomes. [`TeraRenderer`] ships built-in Tera templates for both dialects:
//!
//! - `request/path.js.tera` and `request/sequence.js.tera`
//! - `supertest/path.js.tera` and `supertest/sequence.js.tera`
//! - `env.tera` for the environment file
//! - `macros.tera` with the assertion macros shared by all of them
//!
//! A custom template directory may override any of these by name.

// Internal imports (std, crate)
use std::collections::HashMap;
use std::path::Path;

use crate::config::{AssertionStyle, RunConfig, TestModule};
use crate::descriptor::{EnvironmentBlock, PathBlock, SequenceBlock};
use crate::generate::OutputBlock;
use crate::Error;

// External imports (alphabetized)
use serde::Serialize;
use tera::{Context, Tera, Value};
use tokio::fs;

const BUILTIN_TEMPLATES: [(&str, &str); 6] = [
    ("macros.tera", include_str!("../templates/macros.tera")),
    ("env.tera", include_str!("../templates/env.tera")),
    ("request/path.js.tera", include_str!("../templates/request/path.js.tera")),
    ("request/sequence.js.tera", include_str!("../templates/request/sequence.js.tera")),
    ("supertest/path.js.tera", include_str!("../templates/supertest/path.js.tera")),
    ("supertest/sequence.js.tera", include_str!("../templates/supertest/sequence.js.tera")),
];

const ENVIRONMENT_TEMPLATE: &str = "env.tera";

/// Turns finished blocks into file contents
pub trait Renderer {
    fn render_path(&self, block: &PathBlock) -> crate::Result<String>;

    fn render_sequence(&self, block: &SequenceBlock) -> crate::Result<String>;

    fn render_environment(&self, block: &EnvironmentBlock) -> crate::Result<String>;

    fn render(&self, block: &OutputBlock) -> crate::Result<String> {
        match block {
            OutputBlock::Path(block) => self.render_path(block),
            OutputBlock::Sequence(block) => self.render_sequence(block),
            OutputBlock::Environment(block) => self.render_environment(block),
        }
    }
}

/// Renders blocks with Tera templates for one dialect and assertion style
#[derive(Debug, Clone)]
pub struct TeraRenderer {
    tera: Tera,
    test_module: TestModule,
    assertion: AssertionStyle,
}

impl TeraRenderer {
    /// Create a renderer using the built-in templates
    pub fn new(test_module: TestModule, assertion: AssertionStyle) -> crate::Result<Self> {
        Ok(Self {
            tera: builtin_tera()?,
            test_module,
            assertion,
        })
    }

    /// Create a renderer for the dialect and assertion style of a run configuration
    pub fn for_config(config: &RunConfig) -> crate::Result<Self> {
        Self::new(config.test_module, config.assertion_format)
    }

    /// Create a renderer whose templates in `dir` take precedence over the built-in ones.
    ///
    /// A file in `dir` replaces the built-in template with the same relative name, e.g.
    /// `supertest/path.js.tera`. Overrides may import the built-in `macros.tera`.
    pub async fn with_template_dir<P: AsRef<Path>>(
        dir: P,
        test_module: TestModule,
        assertion: AssertionStyle,
    ) -> crate::Result<Self> {
        let dir = dir.as_ref();
        let is_dir = fs::metadata(dir).await.is_ok_and(|meta| meta.is_dir());
        if !is_dir {
            return Err(Error::template(format!(
                "Template directory not found: {}",
                dir.display()
            )));
        }

        let mut templates = Vec::with_capacity(BUILTIN_TEMPLATES.len());
        for (name, builtin) in BUILTIN_TEMPLATES {
            let custom = dir.join(name);
            let is_file = fs::metadata(&custom).await.is_ok_and(|meta| meta.is_file());
            let source = if is_file {
                log::debug!("Using custom template {}", custom.display());
                fs::read_to_string(&custom).await?
            } else {
                builtin.to_string()
            };
            templates.push((name, source));
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)?;
        configure(&mut tera);

        Ok(Self {
            tera,
            test_module,
            assertion,
        })
    }

    pub fn test_module(&self) -> TestModule {
        self.test_module
    }

    pub fn assertion(&self) -> AssertionStyle {
        self.assertion
    }

    fn dialect_template(&self, kind: &str) -> String {
        format!("{}/{}.js.tera", self.test_module.as_str(), kind)
    }

    fn render_block<T: Serialize>(&self, template: &str, block: &T) -> crate::Result<String> {
        let mut context = Context::new();
        context.insert("block", block);
        context.insert("assertion", self.assertion.as_str());
        context.insert("test_module", self.test_module.as_str());

        self.tera.render(template, &context).map_err(|e| {
            Error::template(format!("Failed to render {}: {}", template, render_error_chain(&e)))
        })
    }
}

impl Renderer for TeraRenderer {
    fn render_path(&self, block: &PathBlock) -> crate::Result<String> {
        self.render_block(&self.dialect_template("path"), block)
    }

    fn render_sequence(&self, block: &SequenceBlock) -> crate::Result<String> {
        self.render_block(&self.dialect_template("sequence"), block)
    }

    fn render_environment(&self, block: &EnvironmentBlock) -> crate::Result<String> {
        self.render_block(ENVIRONMENT_TEMPLATE, block)
    }
}

fn builtin_tera() -> crate::Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(BUILTIN_TEMPLATES.to_vec())?;
    configure(&mut tera);
    Ok(tera)
}

fn configure(tera: &mut Tera) {
    // Generated files are JavaScript, never HTML
    tera.autoescape_on(vec![]);
    tera.register_filter("indent_lines", indent_lines);
}

/// Indent every line but the first by `width` spaces (default 2)
fn indent_lines(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = tera::try_get_value!("indent_lines", "value", String, value);
    let width = match args.get("width") {
        Some(width) => tera::try_get_value!("indent_lines", "width", usize, width),
        None => 2,
    };

    let pad = " ".repeat(width);
    let indented = text
        .lines()
        .enumerate()
        .map(|(index, line)| {
            if index == 0 || line.is_empty() {
                line.to_string()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Value::String(indented))
}

/// Tera nests the useful message in the error sources
fn render_error_chain(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    message
}
