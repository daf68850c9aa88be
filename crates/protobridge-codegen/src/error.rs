//! Error types for compilation and runtime translation.

use thiserror::Error;

/// Result type for compilation operations.
pub type Result<T> = std::result::Result<T, CompileError>;

/// Errors raised while compiling a type graph.
///
/// Every variant is fatal: compilation stops at the first error and no
/// partial artifacts are produced.
#[derive(Error, Debug)]
pub enum CompileError {
    /// A root or field referenced a name that is not declared.
    #[error("unknown type `{0}`")]
    UnknownType(String),

    /// Two fields of the same struct collapse to the same wire name.
    #[error("{owner}.{field} is ambiguous when escaped to `{escaped}`")]
    AmbiguousField {
        owner: String,
        field: String,
        escaped: String,
    },

    /// A field whose name is nothing but underscores.
    #[error("{owner}.{field} has an empty wire name")]
    EmptyFieldName { owner: String, field: String },

    #[error("cannot handle union of arrays and non-arrays at {owner}.{field}")]
    MixedArrayUnion { owner: String, field: String },

    #[error("cannot handle optional array at {owner}.{field}")]
    OptionalRepeated { owner: String, field: String },

    #[error("nested arrays are not supported at {owner}.{field}")]
    NestedArray { owner: String, field: String },

    /// The field type normalizes to nothing representable on the wire.
    #[error("could not determine field type of {owner}.{field}")]
    Unrepresentable { owner: String, field: String },

    /// A union member that cannot be told apart from other members at runtime.
    #[error("union member `{member}` at {owner}.{field} cannot be discriminated")]
    UnsupportedUnionMember {
        owner: String,
        field: String,
        member: String,
    },

    #[error("type alias `{0}` refers to itself")]
    RecursiveAlias(String),

    /// A union with several object members has no configured discriminator.
    #[error("config is missing a union discriminator for entry `{key}` (union `{union}`)")]
    MissingDiscriminator { union: String, key: String },

    #[error("failed to parse declarations: {0}")]
    Parse(#[from] syn::Error),

    #[error("unsupported declaration syntax in `{context}`: {detail}")]
    UnsupportedSyntax { context: String, detail: String },

    #[error("failed to serialize lookup table: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub(crate) fn unsupported(context: impl Into<String>, detail: impl Into<String>) -> Self {
        CompileError::UnsupportedSyntax {
            context: context.into(),
            detail: detail.into(),
        }
    }
}

/// Errors raised while applying translators to runtime values.
#[derive(Error, Debug, PartialEq)]
pub enum TranslateError {
    #[error("no translator for entity `{0}`")]
    UnknownEntity(String),

    #[error("{entity}: expected an object")]
    ExpectedObject { entity: String },

    #[error("{entity}.{field}: expected an array")]
    ExpectedArray { entity: String, field: String },

    #[error("{entity}: unknown value {value}")]
    UnknownEnumValue { entity: String, value: String },

    #[error("{entity}: unknown ordinal {value}")]
    UnknownOrdinal { entity: String, value: String },

    #[error("{union}: no variant for `{tag}`")]
    NoMatchingVariant { union: String, tag: String },

    /// The union's discriminator could not classify the value.
    #[error("{union}: value cannot be discriminated")]
    Undiscriminated { union: String },
}
