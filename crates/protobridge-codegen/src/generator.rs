//! Code generator front door.

use crate::compiler::compile;
use crate::config::Config;
use crate::error::Result;
use crate::graph::TypeGraph;
use crate::plan::TranslatorSet;
use crate::translator::{DEFAULT_HEADER, RenderOptions, render_module};
use crate::types::TypeNode;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// The two coupled outputs of one generation run.
#[derive(Debug, Clone)]
pub struct Artifacts {
    /// Proto3 schema text.
    pub schema: String,

    /// The TypeScript (or JavaScript) translator module.
    pub translator_source: String,

    /// The translator plans, usable directly through
    /// [`TranslatorSet::to_wire`] and [`TranslatorSet::from_wire`].
    pub translators: TranslatorSet,
}

impl Artifacts {
    /// Write `<basename>.proto` and `<basename>.proto.lib.ts`.
    ///
    /// Returns the two paths written.
    pub fn write_to_files(&self, basename: impl AsRef<Path>) -> io::Result<(PathBuf, PathBuf)> {
        let basename = basename.as_ref();
        let schema_path = with_suffix(basename, ".proto");
        let module_path = with_suffix(basename, ".proto.lib.ts");

        if let Some(parent) = schema_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&schema_path, &self.schema)?;
        fs::write(&module_path, &self.translator_source)?;

        info!(
            schema = %schema_path.display(),
            module = %module_path.display(),
            "wrote artifacts"
        );
        Ok((schema_path, module_path))
    }

    /// Write the translator module to a writer.
    pub fn write_module_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.translator_source.as_bytes())
    }
}

fn with_suffix(basename: &Path, suffix: &str) -> PathBuf {
    let mut path = basename.as_os_str().to_owned();
    path.push(suffix);
    PathBuf::from(path)
}

/// Code generator that collects declarations and produces the schema and
/// translator module.
///
/// Declarations come from the builder methods below or from Rust-syntax
/// source files (see [`add_source_file`](CodeGenerator::add_source_file)).
///
/// # Example
///
/// ```
/// use protobridge_codegen::{CodeGenerator, TypeNode};
///
/// let mut generator = CodeGenerator::new();
/// generator
///     .add_enum("Status", &["Running", "Paused"])
///     .add_struct("Star", &[
///         ("size", TypeNode::union([TypeNode::number(), TypeNode::named("Star")])),
///         ("status", TypeNode::named("Status")),
///         ("children", TypeNode::array(TypeNode::named("Star"))),
///     ]);
///
/// let artifacts = generator.generate().unwrap();
/// assert!(artifacts.schema.contains("repeated Star children = 3;"));
/// assert!(artifacts.translator_source.contains("export function encodeStar"));
/// ```
#[derive(Debug)]
pub struct CodeGenerator {
    graph: TypeGraph,

    config: Config,

    /// Custom header comment
    header: Option<String>,

    /// Whether to emit TypeScript type annotations.
    ///
    /// When `false` the module is plain JavaScript, usable as `.js`/`.mjs`.
    allow_typescript_syntax: bool,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self {
            graph: TypeGraph::new(),
            config: Config::default(),
            header: None,
            allow_typescript_syntax: true,
        }
    }
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom header comment for the generated module.
    pub fn set_header(&mut self, header: impl Into<String>) -> &mut Self {
        self.header = Some(header.into());
        self
    }

    /// Enable or disable TypeScript type annotations in the generated module.
    pub fn allow_typescript_syntax(&mut self, enabled: bool) -> &mut Self {
        self.allow_typescript_syntax = enabled;
        self
    }

    pub fn set_config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut TypeGraph {
        &mut self.graph
    }

    /// Add a struct definition.
    pub fn add_struct(
        &mut self,
        name: impl Into<String>,
        fields: &[(impl AsRef<str>, TypeNode)],
    ) -> &mut Self {
        self.graph.add_struct(name, fields);
        self
    }

    /// Add a numeric enum; members take the values `0..n`.
    pub fn add_enum(&mut self, name: impl Into<String>, members: &[impl AsRef<str>]) -> &mut Self {
        self.graph.add_enum(name, members);
        self
    }

    /// Add an enum with string values.
    ///
    /// ```
    /// use protobridge_codegen::CodeGenerator;
    ///
    /// let mut generator = CodeGenerator::new();
    /// generator.add_string_enum("StatusString", &[("Running", "RunnN"), ("Paused", "PausD")]);
    /// let artifacts = generator.generate().unwrap();
    /// assert!(artifacts.schema.contains("STATUSSTRING_PAUSED = 1;"));
    /// ```
    pub fn add_string_enum(
        &mut self,
        name: impl Into<String>,
        members: &[(impl AsRef<str>, impl AsRef<str>)],
    ) -> &mut Self {
        self.graph.add_string_enum(name, members);
        self
    }

    /// Add a type alias. Aliases of unions name the oneof wrappers built for
    /// structurally equal field types.
    pub fn add_alias(&mut self, name: impl Into<String>, ty: TypeNode) -> &mut Self {
        self.graph.add_alias(name, ty);
        self
    }

    fn render_options(&self) -> RenderOptions<'_> {
        RenderOptions {
            header: self.header.as_deref().unwrap_or(DEFAULT_HEADER),
            typescript: self.allow_typescript_syntax,
            encoding: self.config.encoding_module,
            decoding: self.config.decoding_module,
        }
    }

    /// Compile the collected declarations.
    pub fn generate(&self) -> Result<Artifacts> {
        let compilation = compile(&self.graph, &self.config)?;
        let translator_source = render_module(
            &compilation.schema,
            &compilation.translators,
            &self.render_options(),
        )?;

        Ok(Artifacts {
            schema: compilation.schema,
            translator_source,
            translators: compilation.translators,
        })
    }

    /// Generate and write `<basename>.proto` and `<basename>.proto.lib.ts`.
    pub fn write_to_files(&self, basename: impl AsRef<Path>) -> Result<Artifacts> {
        let artifacts = self.generate()?;
        artifacts.write_to_files(basename)?;
        Ok(artifacts)
    }
}
