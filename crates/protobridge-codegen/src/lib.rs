//! # protobridge-codegen
//!
//! Compiles structural type declarations into a proto3 schema plus a
//! TypeScript module that translates plain objects to and from the shape a
//! protobuf library accepts.
//!
//! ## Features
//!
//! - Unions become `oneof` wrapper messages, named after a matching type alias
//!   when one exists
//! - String-literal unions become enums; single literals are dropped from the
//!   wire and restored on decode
//! - `null` is carried through a sentinel enum
//! - Field names are escaped for protobuf and mapped back on decode
//! - The same translator plans drive the generated module and an in-process
//!   runtime over `serde_json::Value`
//! - Declarations come from the builder API or from Rust-syntax source files
//!
//! ## Quick Start
//!
//! ### Using `CodeGenerator` directly
//!
//! ```rust
//! use protobridge_codegen::{CodeGenerator, TypeNode};
//!
//! let mut generator = CodeGenerator::new();
//!
//! generator
//!     .add_enum("Status", &["Running", "Paused"])
//!     .add_struct("Star", &[
//!         ("size", TypeNode::union([TypeNode::number(), TypeNode::named("Star")])),
//!         ("status", TypeNode::named("Status")),
//!         ("star_name", TypeNode::optional(TypeNode::string())),
//!     ]);
//!
//! let artifacts = generator.generate().unwrap();
//! assert!(artifacts.schema.contains("message Union_1_Star_size {"));
//! assert!(artifacts.schema.contains("optional string starname = 3;"));
//! // Or write `solar.proto` and `solar.proto.lib.ts`:
//! // generator.write_to_files("generated/solar").unwrap();
//! ```
//!
//! ### Reading declarations from source files
//!
//! ```no_run
//! use protobridge_codegen::{CodeGenerator, Config, DiscriminatorSpec};
//!
//! fn main() -> protobridge_codegen::Result<()> {
//!     let config = Config::new().with_discriminator_spec(
//!         "PlanetOrStar",
//!         DiscriminatorSpec::Tag { tag: "kind".to_string() },
//!     );
//!
//!     CodeGenerator::new()
//!         .set_config(config)
//!         .add_source_dir("schema")?
//!         .write_to_files("generated/solar")?;
//!     Ok(())
//! }
//! ```
//!
//! ### Translating at runtime
//!
//! ```rust
//! use protobridge_codegen::{CodeGenerator, TypeNode};
//! use serde_json::json;
//!
//! let mut generator = CodeGenerator::new();
//! generator.add_struct("Moon", &[("moon_name", TypeNode::string())]);
//! let translators = generator.generate().unwrap().translators;
//!
//! let mut value = json!({ "moon_name": "Io" });
//! translators.to_wire("Moon", &mut value).unwrap();
//! assert_eq!(value, json!({ "moonname": "Io" }));
//! ```
//!
//! ## Type Mappings
//!
//! | Rust syntax | `TypeNode` | Proto3 |
//! |-------------|------------|--------|
//! | `String`, `&str`, `char` | `TypeNode::string()` | `string` |
//! | `f32`, `f64`, `i8`-`i128`, `u8`-`u128` | `TypeNode::number()` | `float` or `int32` |
//! | `bool` | `TypeNode::boolean()` | `bool` |
//! | `()`, `null` | `TypeNode::null()` | `SpecialNullSubstitute` |
//! | `Vec<T>`, `[T]`, `[T; N]` | `TypeNode::array(T)` | `repeated T` |
//! | `Option<T>` | `TypeNode::optional(T)` | `optional T` |
//! | `Box<T>`, `&T` | `T` | `T` |
//! | `union!(A \| B)` | `TypeNode::union([A, B])` | `oneof` wrapper |
//! | `union!("a" \| "b")` | literal union | enum `Literal_<Struct>_<field>` |
//! | `lit!("x")` | `TypeNode::literal("x")` | `reserved` |
//! | Other names | `TypeNode::named(name)` | message or enum |

pub mod classify;
mod compiler;
pub mod config;
pub mod discriminator;
pub mod error;
mod extractor;
mod generator;
pub mod graph;
pub mod mapping;
pub mod normalize;
pub mod plan;
pub mod registry;
mod runtime;
mod schema;
mod translator;
pub mod types;
mod writer;

pub use compiler::{Compilation, compile, escape_field_name};
pub use config::{CodecModule, Config, NumberEncoding, NumberWidth};
pub use discriminator::{Discriminator, DiscriminatorSpec};
pub use error::{CompileError, Result, TranslateError};
pub use generator::{Artifacts, CodeGenerator};
pub use graph::TypeGraph;
pub use mapping::Mapping;
pub use plan::{Translator, TranslatorSet};
pub use schema::emit_schema;
pub use translator::{RenderOptions, render_module};
pub use types::{EnumValue, LiteralValue, ScalarKind, TypeNode};
