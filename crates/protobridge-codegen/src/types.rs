//! Type definitions for the input type graph.

use serde::Serialize;
use serde_json::{Number, Value};
use std::fmt;

/// Leaf scalar kinds of the source type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Number,
    Boolean,
    Null,
}

/// The value of a literal type such as `"Constant"`, `3` or `true`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    String(String),
    Number(Number),
    Boolean(bool),
}

impl LiteralValue {
    /// The literal as a JSON value, which is also its JavaScript spelling.
    pub fn to_json(&self) -> Value {
        match self {
            LiteralValue::String(s) => Value::String(s.clone()),
            LiteralValue::Number(n) => Value::Number(n.clone()),
            LiteralValue::Boolean(b) => Value::Bool(*b),
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// A node of the structural type algebra.
///
/// This is what the declaration frontend produces for every field and alias.
/// The compiler never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeNode {
    // Leaf scalars
    Scalar(ScalarKind),

    // `T[]`
    Array(Box<TypeNode>),

    // `T | undefined`
    Optional(Box<TypeNode>),

    // Reference to a named struct, enum or type alias
    Reference(String),

    // `"value"`, `3`, `true`
    Literal(LiteralValue),

    // `A | B | ...`
    Union(Vec<TypeNode>),
}

impl TypeNode {
    pub fn string() -> Self {
        TypeNode::Scalar(ScalarKind::String)
    }

    pub fn number() -> Self {
        TypeNode::Scalar(ScalarKind::Number)
    }

    pub fn boolean() -> Self {
        TypeNode::Scalar(ScalarKind::Boolean)
    }

    pub fn null() -> Self {
        TypeNode::Scalar(ScalarKind::Null)
    }

    pub fn array(element: TypeNode) -> Self {
        TypeNode::Array(Box::new(element))
    }

    pub fn optional(inner: TypeNode) -> Self {
        TypeNode::Optional(Box::new(inner))
    }

    pub fn named(name: impl Into<String>) -> Self {
        TypeNode::Reference(name.into())
    }

    pub fn literal(value: impl Into<String>) -> Self {
        TypeNode::Literal(LiteralValue::String(value.into()))
    }

    pub fn union(members: impl IntoIterator<Item = TypeNode>) -> Self {
        TypeNode::Union(members.into_iter().collect())
    }

    /// Render the node in TypeScript notation, used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TypeNode::Scalar(ScalarKind::String) => "string".to_string(),
            TypeNode::Scalar(ScalarKind::Number) => "number".to_string(),
            TypeNode::Scalar(ScalarKind::Boolean) => "boolean".to_string(),
            TypeNode::Scalar(ScalarKind::Null) => "null".to_string(),
            TypeNode::Array(inner) => match inner.as_ref() {
                TypeNode::Union(_) | TypeNode::Optional(_) => format!("({})[]", inner.describe()),
                _ => format!("{}[]", inner.describe()),
            },
            TypeNode::Optional(inner) => format!("{} | undefined", inner.describe()),
            TypeNode::Reference(name) => name.clone(),
            TypeNode::Literal(value) => value.to_string(),
            TypeNode::Union(members) => members
                .iter()
                .map(TypeNode::describe)
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

/// A field of a struct declaration, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeNode,
}

/// A struct ("interface") declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
}

/// The runtime value of an enum member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum EnumValue {
    Number(i64),
    String(String),
}

impl EnumValue {
    pub fn to_json(&self) -> Value {
        match self {
            EnumValue::Number(n) => Value::from(*n),
            EnumValue::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub value: EnumValue,
}

/// An enum declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<EnumMember>,
}

impl EnumDecl {
    /// Whether no member carries a numeric value.
    ///
    /// Only these enums are discovered as roots; numeric enums are emitted
    /// when something references them.
    pub fn is_string_valued(&self) -> bool {
        self.members
            .iter()
            .all(|m| !matches!(m.value, EnumValue::Number(_)))
    }
}

/// A named type alias, e.g. `type PlanetOrStar = Planet | Star`.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasDecl {
    pub name: String,
    pub ty: TypeNode,
}
