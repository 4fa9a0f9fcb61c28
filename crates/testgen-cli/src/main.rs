//! testgen CLI entrypoint
//! Parses command-line arguments, builds the test descriptors and writes the rendered files.

mod logger;
mod package;

// Internal imports (std, crate)
use std::path::PathBuf;

// External imports (alphabetized)
use anyhow::Context;
use clap::Parser;
use testgen_core::{
    generate, ApiDescription, AssertionStyle, Renderer, RunConfig, TeraRenderer, TestModule,
};
use tokio::fs;

#[derive(Parser)]
#[command(name = "testgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Generate integration tests from a Swagger description
    Generate {
        /// Path or URL to the Swagger description (YAML or JSON)
        ///
        /// Example: --schema-path path/to/swagger.yaml
        /// Example: --schema-path https://example.com/swagger.json
        #[arg(long)]
        schema_path: String,
        /// Run configuration file (YAML, JSON or TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output directory for the generated tests
        #[arg(long, default_value = "test")]
        output_dir: PathBuf,
        /// Override the configured test module
        #[arg(long, value_enum)]
        test_module: Option<TestModule>,
        /// Override the configured assertion style
        #[arg(long, value_enum)]
        assertion_format: Option<AssertionStyle>,
        /// Only generate these paths (repeatable); replaces the configured list
        #[arg(long = "path")]
        paths: Vec<String>,
        /// Override the maximum description width
        #[arg(long)]
        max_len: Option<usize>,
        /// Directory with templates overriding the built-in ones
        #[arg(long)]
        template_dir: Option<PathBuf>,
    },
    /// Write a starter run configuration
    Init {
        /// Where to write the configuration (YAML unless the extension is .json)
        #[arg(default_value = "testgen.yaml")]
        path: PathBuf,
        /// Test module of the starter configuration
        #[arg(long, value_enum, default_value_t = TestModule::Supertest)]
        test_module: TestModule,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init_logger();
    let cli = Cli::parse();
    match cli.command {
        Commands::Generate {
            schema_path,
            config,
            output_dir,
            test_module,
            assertion_format,
            paths,
            max_len,
            template_dir,
        } => {
            let mut run_config = match &config {
                Some(path) => RunConfig::from_file(path).await.with_context(|| {
                    format!("Failed to load run configuration {}", path.display())
                })?,
                None => RunConfig::default(),
            };
            if let Some(test_module) = test_module {
                run_config.test_module = test_module;
            }
            if let Some(assertion_format) = assertion_format {
                run_config.assertion_format = assertion_format;
            }
            if !paths.is_empty() {
                run_config.path_names = paths;
            }
            if max_len.is_some() {
                run_config.max_len = max_len;
            }

            tracing::info!("Loading Swagger description from: {}", schema_path);
            let description = ApiDescription::from_file_or_url(&schema_path)
                .await
                .with_context(|| format!("Failed to load Swagger description {}", schema_path))?;

            let renderer = match &template_dir {
                Some(dir) => {
                    TeraRenderer::with_template_dir(
                        dir,
                        run_config.test_module,
                        run_config.assertion_format,
                    )
                    .await
                }
                None => TeraRenderer::for_config(&run_config),
            }
            .context("Failed to initialize templates")?;

            let generation = generate(&description, &run_config);

            if !output_dir.exists() {
                tracing::info!("Creating output directory: {}", output_dir.display());
                fs::create_dir_all(&output_dir).await.with_context(|| {
                    format!("Failed to create output directory {}", output_dir.display())
                })?;
            }

            for output in &generation.outputs {
                let content = renderer
                    .render(&output.block)
                    .with_context(|| format!("Failed to render {}", output.name))?;
                let file = output_dir.join(package::file_name(output));
                fs::write(&file, content)
                    .await
                    .with_context(|| format!("Failed to write {}", file.display()))?;
                tracing::info!("Wrote {}", file.display());
            }

            for failure in &generation.failures {
                tracing::error!("Skipped {}: {}", failure.name, failure.error);
            }
            if !generation.is_complete() {
                anyhow::bail!(
                    "{} of {} outputs could not be generated",
                    generation.failures.len(),
                    generation.failures.len() + generation.outputs.len()
                );
            }

            tracing::info!(
                "Generated {} file(s) in {}",
                generation.outputs.len(),
                output_dir.display()
            );
        }
        Commands::Init { path, test_module } => {
            if path.exists() {
                anyhow::bail!("{} already exists", path.display());
            }
            RunConfig::new(test_module)
                .save(&path)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote starter configuration to {}", path.display());
        }
    }
    Ok(())
}
