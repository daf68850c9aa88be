//! Union normalization.
//!
//! Every field type is reduced to one of three wire-representable shapes:
//! a single type, a union of string literals (which becomes a literal enum),
//! or a union of distinguishable variants (which becomes a `oneof` message).
//! Alongside the shape the normalizer decides the field rule.

use crate::classify::{is_string_literal, literal_base};
use crate::error::{CompileError, Result};
use crate::graph::{Declaration, TypeGraph};
use crate::types::{AliasDecl, LiteralValue, TypeNode};

/// Where a field lives, for error messages.
#[derive(Debug, Clone, Copy)]
pub struct FieldSite<'a> {
    pub owner: &'a str,
    pub field: &'a str,
}

impl FieldSite<'_> {
    fn owner(&self) -> String {
        self.owner.to_string()
    }

    fn field(&self) -> String {
        self.field.to_string()
    }
}

/// The protobuf field rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    Required,
    Optional,
    Repeated,
}

impl FieldRule {
    /// The rule prefix as written in schema text.
    pub fn keyword(self) -> &'static str {
        match self {
            FieldRule::Required => "",
            FieldRule::Optional => "optional ",
            FieldRule::Repeated => "repeated ",
        }
    }
}

/// The canonical shape of a field type.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// Exactly one required variant: a scalar or a struct/enum reference.
    Single(TypeNode),

    /// Only string literals, in first-seen order without duplicates.
    LiteralUnion(Vec<String>),

    /// Two or more distinguishable variants.
    Union(Vec<TypeNode>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedField {
    pub rule: FieldRule,
    pub shape: Normalized,
}

#[derive(Debug, Default)]
struct Flattened {
    members: Vec<TypeNode>,
    undefined: bool,
}

/// Expand unions, optional wrappers and alias references into a flat member list.
fn flatten(
    graph: &TypeGraph,
    ty: &TypeNode,
    out: &mut Flattened,
    expanding: &mut Vec<String>,
) -> Result<()> {
    match ty {
        TypeNode::Union(members) => {
            for member in members {
                flatten(graph, member, out, expanding)?;
            }
        }
        TypeNode::Optional(inner) => {
            out.undefined = true;
            flatten(graph, inner, out, expanding)?;
        }
        TypeNode::Reference(name) => match graph.lookup(name) {
            Some(Declaration::Alias(alias)) => {
                if expanding.contains(name) {
                    return Err(CompileError::RecursiveAlias(name.clone()));
                }
                expanding.push(name.clone());
                flatten(graph, &alias.ty, out, expanding)?;
                expanding.pop();
            }
            Some(_) => out.members.push(ty.clone()),
            None => return Err(CompileError::UnknownType(name.clone())),
        },
        _ => out.members.push(ty.clone()),
    }
    Ok(())
}

fn is_array(ty: &TypeNode) -> bool {
    matches!(ty, TypeNode::Array(_))
}

/// Replace literals by their base scalars and drop duplicates.
///
/// Non-literal members keep their order and come first; collapsed literal
/// bases follow in first-seen order.
fn collapse_literals(members: Vec<TypeNode>) -> Vec<TypeNode> {
    let mut collapsed: Vec<TypeNode> = Vec::with_capacity(members.len());
    let mut bases = Vec::new();

    for member in members {
        match member {
            TypeNode::Literal(value) => {
                let base = TypeNode::Scalar(literal_base(&value));
                if !bases.contains(&base) {
                    bases.push(base);
                }
            }
            other => {
                if !collapsed.contains(&other) {
                    collapsed.push(other);
                }
            }
        }
    }

    for base in bases {
        if !collapsed.contains(&base) {
            collapsed.push(base);
        }
    }
    collapsed
}

/// Normalize the type of one struct field.
pub fn normalize_field(
    graph: &TypeGraph,
    ty: &TypeNode,
    site: FieldSite<'_>,
) -> Result<NormalizedField> {
    let mut flat = Flattened::default();
    flatten(graph, ty, &mut flat, &mut Vec::new())?;

    let mut rule = FieldRule::Required;

    let members = if flat.members.iter().any(is_array) {
        if flat.members.iter().any(|m| !is_array(m)) {
            return Err(CompileError::MixedArrayUnion {
                owner: site.owner(),
                field: site.field(),
            });
        }
        rule = FieldRule::Repeated;

        let mut elements = Flattened::default();
        for member in &flat.members {
            if let TypeNode::Array(element) = member {
                flatten(graph, element, &mut elements, &mut Vec::new())?;
            }
        }
        if elements.undefined {
            return Err(CompileError::OptionalRepeated {
                owner: site.owner(),
                field: site.field(),
            });
        }
        if elements.members.iter().any(is_array) {
            return Err(CompileError::NestedArray {
                owner: site.owner(),
                field: site.field(),
            });
        }
        elements.members
    } else {
        flat.members
    };

    if flat.undefined {
        if rule == FieldRule::Repeated {
            return Err(CompileError::OptionalRepeated {
                owner: site.owner(),
                field: site.field(),
            });
        }
        rule = FieldRule::Optional;
    }

    if members.is_empty() {
        return Err(CompileError::Unrepresentable {
            owner: site.owner(),
            field: site.field(),
        });
    }

    if members.iter().all(is_string_literal) {
        let mut values: Vec<String> = Vec::new();
        for member in &members {
            if let TypeNode::Literal(LiteralValue::String(value)) = member
                && !values.contains(value)
            {
                values.push(value.clone());
            }
        }
        return Ok(NormalizedField {
            rule,
            shape: Normalized::LiteralUnion(values),
        });
    }

    let mut members = collapse_literals(members);

    if members.len() == 1 {
        let single = members.remove(0);
        return Ok(NormalizedField {
            rule,
            shape: Normalized::Single(single),
        });
    }

    for member in &members {
        if let TypeNode::Reference(name) = member
            && graph.enum_decl(name).is_some()
            && graph.struct_decl(name).is_none()
        {
            return Err(CompileError::UnsupportedUnionMember {
                owner: site.owner(),
                field: site.field(),
                member: name.clone(),
            });
        }
    }

    Ok(NormalizedField {
        rule,
        shape: Normalized::Union(members),
    })
}

/// The required variants of a type alias, if the alias is a candidate for
/// naming an anonymous union.
///
/// Only aliases that normalize to two or more non-array, non-optional,
/// non-literal-only variants qualify.
pub fn alias_variants(graph: &TypeGraph, alias: &AliasDecl) -> Option<Vec<TypeNode>> {
    let mut flat = Flattened::default();
    flatten(graph, &alias.ty, &mut flat, &mut vec![alias.name.clone()]).ok()?;

    if flat.undefined
        || flat.members.iter().any(is_array)
        || flat.members.iter().all(is_string_literal)
    {
        return None;
    }

    let members = collapse_literals(flat.members);
    (members.len() > 1).then_some(members)
}

/// Order-independent equality of two variant lists.
pub fn same_variants(a: &[TypeNode], b: &[TypeNode]) -> bool {
    a.len() == b.len() && a.iter().all(|t| b.contains(t)) && b.iter().all(|t| a.contains(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: FieldSite<'static> = FieldSite {
        owner: "Star",
        field: "size",
    };

    fn graph() -> TypeGraph {
        let mut graph = TypeGraph::new();
        graph
            .add_enum("Status", &["Running", "Paused"])
            .add_struct("Star", &[("name", TypeNode::string())])
            .add_struct("Planet", &[("population", TypeNode::number())])
            .add_alias(
                "PlanetOrStar",
                TypeNode::union([TypeNode::named("Planet"), TypeNode::named("Star")]),
            )
            .add_alias("Alias", TypeNode::union([TypeNode::boolean(), TypeNode::null()]));
        graph
    }

    #[test]
    fn test_plain_scalar_is_single() {
        let field = normalize_field(&graph(), &TypeNode::string(), SITE).unwrap();
        assert_eq!(field.rule, FieldRule::Required);
        assert_eq!(field.shape, Normalized::Single(TypeNode::string()));
    }

    #[test]
    fn test_optional_degenerates_to_single() {
        let ty = TypeNode::union([TypeNode::number(), TypeNode::optional(TypeNode::null())]);
        let field = normalize_field(&graph(), &ty, SITE).unwrap();
        assert_eq!(field.rule, FieldRule::Optional);
        assert_eq!(
            field.shape,
            Normalized::Union(vec![TypeNode::number(), TypeNode::null()])
        );

        let ty = TypeNode::optional(TypeNode::number());
        let field = normalize_field(&graph(), &ty, SITE).unwrap();
        assert_eq!(field.rule, FieldRule::Optional);
        assert_eq!(field.shape, Normalized::Single(TypeNode::number()));
    }

    #[test]
    fn test_array_of_union_is_repeated_union() {
        let ty = TypeNode::array(TypeNode::union([TypeNode::number(), TypeNode::named("Star")]));
        let field = normalize_field(&graph(), &ty, SITE).unwrap();
        assert_eq!(field.rule, FieldRule::Repeated);
        assert_eq!(
            field.shape,
            Normalized::Union(vec![TypeNode::number(), TypeNode::named("Star")])
        );
    }

    #[test]
    fn test_union_of_arrays_is_repeated() {
        let ty = TypeNode::union([
            TypeNode::array(TypeNode::string()),
            TypeNode::array(TypeNode::number()),
        ]);
        let field = normalize_field(&graph(), &ty, SITE).unwrap();
        assert_eq!(field.rule, FieldRule::Repeated);
        assert_eq!(
            field.shape,
            Normalized::Union(vec![TypeNode::string(), TypeNode::number()])
        );
    }

    #[test]
    fn test_mixed_array_union_rejected() {
        let ty = TypeNode::union([TypeNode::array(TypeNode::string()), TypeNode::number()]);
        let err = normalize_field(&graph(), &ty, SITE).unwrap_err();
        assert!(matches!(err, CompileError::MixedArrayUnion { .. }));
    }

    #[test]
    fn test_optional_array_rejected() {
        let ty = TypeNode::optional(TypeNode::array(TypeNode::string()));
        let err = normalize_field(&graph(), &ty, SITE).unwrap_err();
        assert!(matches!(err, CompileError::OptionalRepeated { .. }));
        assert_eq!(err.to_string(), "cannot handle optional array at Star.size");
    }

    #[test]
    fn test_nested_array_rejected() {
        let ty = TypeNode::array(TypeNode::array(TypeNode::number()));
        let err = normalize_field(&graph(), &ty, SITE).unwrap_err();
        assert!(matches!(err, CompileError::NestedArray { .. }));
    }

    #[test]
    fn test_string_literals_become_literal_union() {
        let ty = TypeNode::optional(TypeNode::union([
            TypeNode::literal("a"),
            TypeNode::literal("b"),
            TypeNode::literal("a"),
        ]));
        let field = normalize_field(&graph(), &ty, SITE).unwrap();
        assert_eq!(field.rule, FieldRule::Optional);
        assert_eq!(
            field.shape,
            Normalized::LiteralUnion(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_mixed_literals_collapse_to_base() {
        let ty = TypeNode::union([
            TypeNode::literal("a"),
            TypeNode::Literal(LiteralValue::Number(1.into())),
            TypeNode::named("Star"),
        ]);
        let field = normalize_field(&graph(), &ty, SITE).unwrap();
        assert_eq!(
            field.shape,
            Normalized::Union(vec![
                TypeNode::named("Star"),
                TypeNode::string(),
                TypeNode::number()
            ])
        );
    }

    #[test]
    fn test_alias_reference_is_expanded() {
        let ty = TypeNode::optional(TypeNode::named("Alias"));
        let field = normalize_field(&graph(), &ty, SITE).unwrap();
        assert_eq!(field.rule, FieldRule::Optional);
        assert_eq!(
            field.shape,
            Normalized::Union(vec![TypeNode::boolean(), TypeNode::null()])
        );
    }

    #[test]
    fn test_unknown_reference_rejected() {
        let err = normalize_field(&graph(), &TypeNode::named("Comet"), SITE).unwrap_err();
        assert!(matches!(err, CompileError::UnknownType(name) if name == "Comet"));
    }

    #[test]
    fn test_enum_in_union_rejected() {
        let ty = TypeNode::union([TypeNode::named("Status"), TypeNode::string()]);
        let err = normalize_field(&graph(), &ty, SITE).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedUnionMember { member, .. } if member == "Status"));
    }

    #[test]
    fn test_recursive_alias_rejected() {
        let mut graph = graph();
        graph.add_alias(
            "Loop",
            TypeNode::union([TypeNode::string(), TypeNode::named("Loop")]),
        );
        let err = normalize_field(&graph, &TypeNode::named("Loop"), SITE).unwrap_err();
        assert!(matches!(err, CompileError::RecursiveAlias(name) if name == "Loop"));
    }

    #[test]
    fn test_alias_variants() {
        let graph = graph();
        let alias = graph.alias("PlanetOrStar").unwrap();
        let variants = alias_variants(&graph, alias).unwrap();
        assert!(same_variants(
            &variants,
            &[TypeNode::named("Star"), TypeNode::named("Planet")]
        ));
        assert!(!same_variants(&variants, &[TypeNode::named("Star")]));
    }
}
