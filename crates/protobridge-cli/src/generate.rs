//! Project files and the generate/check commands.

use anyhow::{Context, Result, bail};
use protobridge_codegen::{CodeGenerator, Config};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

fn default_typescript() -> bool {
    true
}

/// protobridge.toml project file.
///
/// ```toml
/// sources = ["schema"]
/// output = "generated/solar"
/// types = ["SolarSystem"]
///
/// [discriminators]
/// PlanetOrStar = { field = "size", present = "Star", absent = "Planet" }
///
/// [number_encoding]
/// default = "float"
/// overrides = { "Star.size" = "int32" }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Declaration files or directories, relative to the project file.
    pub sources: Vec<PathBuf>,

    /// Output path without extension, relative to the project file.
    pub output: PathBuf,

    #[serde(default)]
    pub header: Option<String>,

    #[serde(default = "default_typescript")]
    pub typescript: bool,

    #[serde(flatten)]
    pub compile: Config,
}

impl ProjectConfig {
    /// Load a project file; relative paths are resolved against its directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read project file: {:?}", path))?;

        let project = Self::parse(&content)
            .with_context(|| format!("Invalid project file: {:?}", path))?;
        Ok(match path.parent() {
            Some(base) => project.resolve(base),
            None => project,
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        let project: Self = toml::from_str(content).context("Failed to parse project file")?;
        if project.sources.is_empty() {
            bail!("`sources` must list at least one file or directory");
        }
        Ok(project)
    }

    fn resolve(mut self, base: &Path) -> Self {
        self.sources = self.sources.iter().map(|s| base.join(s)).collect();
        self.output = base.join(&self.output);
        self
    }

    /// A generator loaded with every configured source.
    pub fn code_generator(&self) -> Result<CodeGenerator> {
        let mut codegen = CodeGenerator::new();
        codegen
            .set_config(self.compile.clone())
            .allow_typescript_syntax(self.typescript);
        if let Some(header) = &self.header {
            codegen.set_header(header);
        }

        for source in &self.sources {
            if source.is_dir() {
                codegen
                    .add_source_dir(source)
                    .with_context(|| format!("Failed to load declarations from {:?}", source))?;
            } else {
                codegen
                    .add_source_file(source)
                    .with_context(|| format!("Failed to load declarations from {:?}", source))?;
            }
        }
        Ok(codegen)
    }
}

/// Generate the schema and translator module. Returns the written paths.
pub fn run(config: &Path, javascript: bool) -> Result<(PathBuf, PathBuf)> {
    let mut project = ProjectConfig::from_file(config)?;
    if javascript {
        project.typescript = false;
    }

    let artifacts = project
        .code_generator()?
        .generate()
        .context("Compilation failed")?;
    let paths = artifacts
        .write_to_files(&project.output)
        .with_context(|| format!("Failed to write artifacts to {:?}", project.output))?;

    info!(entities = artifacts.translators.len(), "generation complete");
    Ok(paths)
}

/// Compile without writing. Returns the emitted entity names in order.
pub fn check(config: &Path) -> Result<Vec<String>> {
    let project = ProjectConfig::from_file(config)?;
    let artifacts = project
        .code_generator()?
        .generate()
        .context("Compilation failed")?;
    Ok(artifacts.translators.names().map(str::to_string).collect())
}
