//! Scalar and shape classification of type nodes.

use crate::types::{LiteralValue, ScalarKind, TypeNode};
use serde_json::Value;
use std::fmt;

/// The leaf scalar kind of a node, or `None` for anything that is not a scalar.
pub fn scalar_kind(ty: &TypeNode) -> Option<ScalarKind> {
    match ty {
        TypeNode::Scalar(kind) => Some(*kind),
        _ => None,
    }
}

/// The base scalar of a literal type (`"a"` is a string, `3` a number).
pub fn literal_base(value: &LiteralValue) -> ScalarKind {
    match value {
        LiteralValue::String(_) => ScalarKind::String,
        LiteralValue::Number(_) => ScalarKind::Number,
        LiteralValue::Boolean(_) => ScalarKind::Boolean,
    }
}

pub fn is_string_literal(ty: &TypeNode) -> bool {
    matches!(ty, TypeNode::Literal(LiteralValue::String(_)))
}

impl ScalarKind {
    /// The discriminator a JavaScript value of this kind produces:
    /// its `typeof` result, or `"null"` for null.
    pub fn type_of(self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Number => "number",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Null => "null",
        }
    }

    /// The kind of a JSON value, if it is a scalar.
    pub fn of_value(value: &Value) -> Option<ScalarKind> {
        match value {
            Value::Null => Some(ScalarKind::Null),
            Value::Bool(_) => Some(ScalarKind::Boolean),
            Value::Number(_) => Some(ScalarKind::Number),
            Value::String(_) => Some(ScalarKind::String),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

/// Which member of a union a runtime value belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VariantTag {
    Scalar(ScalarKind),
    Entity(String),
}

impl VariantTag {
    /// The string the generated discriminator expression evaluates to.
    pub fn key(&self) -> &str {
        match self {
            VariantTag::Scalar(kind) => kind.type_of(),
            VariantTag::Entity(name) => name,
        }
    }
}

impl fmt::Display for VariantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_kind() {
        assert_eq!(scalar_kind(&TypeNode::number()), Some(ScalarKind::Number));
        assert_eq!(scalar_kind(&TypeNode::null()), Some(ScalarKind::Null));
        assert_eq!(scalar_kind(&TypeNode::named("Star")), None);
        assert_eq!(scalar_kind(&TypeNode::array(TypeNode::string())), None);
        assert_eq!(scalar_kind(&TypeNode::literal("a")), None);
    }

    #[test]
    fn test_literal_base() {
        assert_eq!(
            literal_base(&LiteralValue::String("a".into())),
            ScalarKind::String
        );
        assert_eq!(
            literal_base(&LiteralValue::Number(3.into())),
            ScalarKind::Number
        );
        assert_eq!(literal_base(&LiteralValue::Boolean(true)), ScalarKind::Boolean);
    }

    #[test]
    fn test_value_kinds() {
        assert_eq!(ScalarKind::of_value(&json!(null)), Some(ScalarKind::Null));
        assert_eq!(ScalarKind::of_value(&json!(1.5)), Some(ScalarKind::Number));
        assert_eq!(ScalarKind::of_value(&json!({})), None);
        assert_eq!(ScalarKind::of_value(&json!([])), None);
    }

    #[test]
    fn test_variant_tag_keys() {
        assert_eq!(VariantTag::Scalar(ScalarKind::Boolean).key(), "boolean");
        assert_eq!(VariantTag::Scalar(ScalarKind::Null).key(), "null");
        assert_eq!(VariantTag::Entity("Star".into()).key(), "Star");
    }
}
