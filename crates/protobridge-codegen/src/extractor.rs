//! Declaration frontend: extracts structs, enums and type aliases from Rust
//! syntax.
//!
//! Declarations are ordinary Rust items. Two type-position macros cover the
//! parts of the type algebra Rust has no syntax for:
//!
//! - `union!(A | B | "literal" | 3 | null | undefined)` is a union; `undefined`
//!   marks it optional.
//! - `lit!("x")` is a single literal type.
//!
//! ```
//! use protobridge_codegen::CodeGenerator;
//!
//! let mut generator = CodeGenerator::new();
//! generator.add_source_str(r#"
//!     enum Status { Running, Paused }
//!
//!     struct Star {
//!         size: union!(f64 | Star),
//!         status: Status,
//!         children: Vec<Star>,
//!         kind: lit!("Constant"),
//!     }
//! "#).unwrap();
//! assert!(generator.graph().struct_decl("Star").is_some());
//! ```
//!
//! Fields may be renamed with `#[serde(rename = "...")]`. Items of any other
//! kind (functions, impls, `use`) are skipped.

use crate::CodeGenerator;
use crate::error::{CompileError, Result};
use crate::graph::TypeGraph;
use crate::types::{
    AliasDecl, EnumDecl, EnumMember, EnumValue, FieldDecl, LiteralValue, StructDecl, TypeNode,
};
use serde_json::Number;
use std::fs;
use std::path::Path;
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{
    Attribute, Expr, ExprLit, ExprUnary, Fields, GenericArgument, Ident, ItemEnum, ItemStruct,
    ItemType, Lit, PathArguments, Token, Type, TypePath, UnOp,
};
use tracing::debug;
use walkdir::WalkDir;

const NUMBER_TYPES: &[&str] = &[
    "f32", "f64", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128",
    "usize",
];

/// One member of a `union!(...)` body.
enum MemberSyntax {
    Undefined,
    Literal(LiteralValue),
    Type(Box<Type>),
}

impl Parse for MemberSyntax {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(Token![-]) {
            input.parse::<Token![-]>()?;
            let lit: Lit = input.parse()?;
            return negated(&lit).map(MemberSyntax::Literal);
        }
        if input.peek(Lit) {
            let lit: Lit = input.parse()?;
            return literal_value(&lit).map(MemberSyntax::Literal);
        }
        if input.peek(Ident) && input.fork().parse::<Ident>()? == "undefined" {
            input.parse::<Ident>()?;
            return Ok(MemberSyntax::Undefined);
        }
        Ok(MemberSyntax::Type(Box::new(input.parse()?)))
    }
}

fn literal_value(lit: &Lit) -> syn::Result<LiteralValue> {
    match lit {
        Lit::Str(s) => Ok(LiteralValue::String(s.value())),
        Lit::Bool(b) => Ok(LiteralValue::Boolean(b.value)),
        Lit::Int(i) => Ok(LiteralValue::Number(Number::from(i.base10_parse::<i64>()?))),
        Lit::Float(f) => Number::from_f64(f.base10_parse::<f64>()?)
            .map(LiteralValue::Number)
            .ok_or_else(|| syn::Error::new(f.span(), "literal is not a finite number")),
        other => Err(syn::Error::new(other.span(), "unsupported literal type")),
    }
}

fn negated(lit: &Lit) -> syn::Result<LiteralValue> {
    match lit {
        Lit::Int(i) => Ok(LiteralValue::Number(Number::from(-i.base10_parse::<i64>()?))),
        Lit::Float(f) => Number::from_f64(-f.base10_parse::<f64>()?)
            .map(LiteralValue::Number)
            .ok_or_else(|| syn::Error::new(f.span(), "literal is not a finite number")),
        other => Err(syn::Error::new(other.span(), "only numbers can be negated")),
    }
}

fn single_generic_arg<'a>(segment: &'a syn::PathSegment, context: &str) -> Result<&'a Type> {
    if let PathArguments::AngleBracketed(args) = &segment.arguments
        && args.args.len() == 1
        && let Some(GenericArgument::Type(ty)) = args.args.first()
    {
        return Ok(ty);
    }
    Err(CompileError::unsupported(
        context,
        format!("`{}` takes exactly one type argument", segment.ident),
    ))
}

/// Convert a syn type to a [`TypeNode`]. `context` names the item for errors.
fn type_node(ty: &Type, context: &str) -> Result<TypeNode> {
    match ty {
        Type::Path(TypePath { qself: None, path }) => {
            let Some(segment) = path.segments.last() else {
                return Err(CompileError::unsupported(context, "empty type path"));
            };
            let ident = segment.ident.unraw().to_string();

            match ident.as_str() {
                "String" | "str" | "char" => Ok(TypeNode::string()),
                "bool" => Ok(TypeNode::boolean()),
                "null" => Ok(TypeNode::null()),
                n if NUMBER_TYPES.contains(&n) => Ok(TypeNode::number()),
                "Vec" => Ok(TypeNode::array(type_node(
                    single_generic_arg(segment, context)?,
                    context,
                )?)),
                "Option" => Ok(TypeNode::optional(type_node(
                    single_generic_arg(segment, context)?,
                    context,
                )?)),
                "Box" => type_node(single_generic_arg(segment, context)?, context),
                _ if !segment.arguments.is_empty() => Err(CompileError::unsupported(
                    context,
                    format!("generic type `{ident}`"),
                )),
                _ => Ok(TypeNode::named(ident)),
            }
        }
        Type::Array(array) => Ok(TypeNode::array(type_node(&array.elem, context)?)),
        Type::Slice(slice) => Ok(TypeNode::array(type_node(&slice.elem, context)?)),
        Type::Reference(reference) => type_node(&reference.elem, context),
        Type::Paren(paren) => type_node(&paren.elem, context),
        Type::Group(group) => type_node(&group.elem, context),
        Type::Tuple(tuple) if tuple.elems.is_empty() => Ok(TypeNode::null()),
        Type::Macro(mac) if mac.mac.path.is_ident("union") => {
            let members = mac
                .mac
                .parse_body_with(Punctuated::<MemberSyntax, Token![|]>::parse_separated_nonempty)?;
            union_node(members, context)
        }
        Type::Macro(mac) if mac.mac.path.is_ident("lit") => {
            match mac.mac.parse_body::<MemberSyntax>()? {
                MemberSyntax::Literal(value) => Ok(TypeNode::Literal(value)),
                _ => Err(CompileError::unsupported(
                    context,
                    "`lit!` expects a string, number or boolean literal",
                )),
            }
        }
        _ => Err(CompileError::unsupported(
            context,
            "type has no wire representation",
        )),
    }
}

fn union_node(members: Punctuated<MemberSyntax, Token![|]>, context: &str) -> Result<TypeNode> {
    let mut nodes = Vec::with_capacity(members.len());
    let mut optional = false;

    for member in members {
        match member {
            MemberSyntax::Undefined => optional = true,
            MemberSyntax::Literal(value) => nodes.push(TypeNode::Literal(value)),
            MemberSyntax::Type(ty) => nodes.push(type_node(&ty, context)?),
        }
    }

    let union = TypeNode::Union(nodes);
    Ok(if optional {
        TypeNode::optional(union)
    } else {
        union
    })
}

/// The value of `#[serde(rename = "...")]`, if present.
fn serde_rename(attrs: &[Attribute]) -> Option<String> {
    for attr in attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }
        if let Ok(nested) =
            attr.parse_args_with(Punctuated::<syn::Meta, Token![,]>::parse_terminated)
        {
            for meta in &nested {
                if let syn::Meta::NameValue(nv) = meta
                    && nv.path.is_ident("rename")
                    && let Expr::Lit(ExprLit {
                        lit: Lit::Str(s), ..
                    }) = &nv.value
                {
                    return Some(s.value());
                }
            }
        }
    }
    None
}

fn extract_struct(item: &ItemStruct) -> Result<StructDecl> {
    let name = item.ident.unraw().to_string();

    let fields = match &item.fields {
        Fields::Named(named) => named
            .named
            .iter()
            .map(|f| {
                let rust_name = f
                    .ident
                    .as_ref()
                    .map(|i| i.unraw().to_string())
                    .unwrap_or_default();
                let context = format!("{name}.{rust_name}");
                Ok(FieldDecl {
                    name: serde_rename(&f.attrs).unwrap_or(rust_name),
                    ty: type_node(&f.ty, &context)?,
                })
            })
            .collect::<Result<Vec<_>>>()?,
        Fields::Unit => Vec::new(),
        Fields::Unnamed(_) => {
            return Err(CompileError::unsupported(name, "tuple structs have no field names"));
        }
    };

    Ok(StructDecl { name, fields })
}

fn discriminant(expr: &Expr, context: &str) -> Result<EnumValue> {
    match expr {
        Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => Ok(EnumValue::String(s.value())),
        Expr::Lit(ExprLit { lit: Lit::Int(i), .. }) => Ok(EnumValue::Number(i.base10_parse()?)),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => match discriminant(expr, context)? {
            EnumValue::Number(n) => Ok(EnumValue::Number(-n)),
            EnumValue::String(_) => Err(CompileError::unsupported(
                context,
                "string discriminants cannot be negated",
            )),
        },
        _ => Err(CompileError::unsupported(
            context,
            "discriminant must be a string or integer literal",
        )),
    }
}

fn extract_enum(item: &ItemEnum) -> Result<EnumDecl> {
    let name = item.ident.unraw().to_string();
    let mut next = 0i64;
    let mut members = Vec::with_capacity(item.variants.len());

    for variant in &item.variants {
        let member = variant.ident.unraw().to_string();
        let context = format!("{name}::{member}");
        if !matches!(variant.fields, Fields::Unit) {
            return Err(CompileError::unsupported(context, "enum variants cannot carry data"));
        }

        let value = match &variant.discriminant {
            Some((_, expr)) => discriminant(expr, &context)?,
            None => EnumValue::Number(next),
        };
        if let EnumValue::Number(n) = value {
            next = n + 1;
        }
        members.push(EnumMember {
            name: member,
            value,
        });
    }

    Ok(EnumDecl { name, members })
}

fn extract_alias(item: &ItemType) -> Result<AliasDecl> {
    let name = item.ident.unraw().to_string();
    let ty = type_node(&item.ty, &name)?;
    Ok(AliasDecl { name, ty })
}

fn parse_source(graph: &mut TypeGraph, source: &str) -> Result<()> {
    let file = syn::parse_file(source)?;

    for item in &file.items {
        match item {
            syn::Item::Struct(item) => {
                let decl = extract_struct(item)?;
                debug!(name = %decl.name, fields = decl.fields.len(), "extracted struct");
                graph.insert_struct(decl);
            }
            syn::Item::Enum(item) => {
                let decl = extract_enum(item)?;
                debug!(name = %decl.name, members = decl.members.len(), "extracted enum");
                graph.insert_enum(decl);
            }
            syn::Item::Type(item) => {
                let decl = extract_alias(item)?;
                debug!(name = %decl.name, "extracted type alias");
                graph.add_alias(decl.name, decl.ty);
            }
            _ => {}
        }
    }
    Ok(())
}

impl CodeGenerator {
    /// Parse a single declaration file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # fn main() -> protobridge_codegen::Result<()> {
    /// use protobridge_codegen::CodeGenerator;
    ///
    /// let mut generator = CodeGenerator::new();
    /// generator.add_source_file("schema/solar.rs")?;
    /// generator.write_to_files("generated/solar")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn add_source_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let source = fs::read_to_string(path)?;
        parse_source(self.graph_mut(), &source)?;
        Ok(self)
    }

    /// Parse declarations from a string.
    pub fn add_source_str(&mut self, source: &str) -> Result<&mut Self> {
        parse_source(self.graph_mut(), source)?;
        Ok(self)
    }

    /// Recursively scan a directory for `.rs` files, in file-name order.
    pub fn add_source_dir(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.extension().map(|e| e == "rs").unwrap_or(false) {
                let source = fs::read_to_string(path)?;
                parse_source(self.graph_mut(), &source)?;
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarKind;

    fn extract(source: &str) -> TypeGraph {
        let mut codegen = CodeGenerator::new();
        codegen.add_source_str(source).unwrap();
        codegen.graph().clone()
    }

    fn field_type(graph: &TypeGraph, owner: &str, field: &str) -> TypeNode {
        graph
            .struct_decl(owner)
            .and_then(|s| s.fields.iter().find(|f| f.name == field))
            .map(|f| f.ty.clone())
            .unwrap()
    }

    #[test]
    fn test_extract_scalars() {
        let graph = extract(
            r#"
            struct Point { x: f64, y: u32, label: String, tag: &'static str, on: bool, nothing: () }
        "#,
        );
        assert_eq!(field_type(&graph, "Point", "x"), TypeNode::number());
        assert_eq!(field_type(&graph, "Point", "y"), TypeNode::number());
        assert_eq!(field_type(&graph, "Point", "label"), TypeNode::string());
        assert_eq!(field_type(&graph, "Point", "tag"), TypeNode::string());
        assert_eq!(field_type(&graph, "Point", "on"), TypeNode::boolean());
        assert_eq!(field_type(&graph, "Point", "nothing"), TypeNode::null());
    }

    #[test]
    fn test_extract_containers() {
        let graph = extract(
            r#"
            struct Star { children: Vec<Box<Star>>, moons: [Moon; 3], nick: Option<String> }
        "#,
        );
        assert_eq!(
            field_type(&graph, "Star", "children"),
            TypeNode::array(TypeNode::named("Star"))
        );
        assert_eq!(
            field_type(&graph, "Star", "moons"),
            TypeNode::array(TypeNode::named("Moon"))
        );
        assert_eq!(
            field_type(&graph, "Star", "nick"),
            TypeNode::optional(TypeNode::string())
        );
    }

    #[test]
    fn test_extract_union_macro() {
        let graph = extract(
            r#"
            struct Planet {
                value: union!(f64 | bool | null | undefined),
                mood: union!("happy" | "sad"),
                lists: union!(Vec<String> | Vec<f64>),
            }
        "#,
        );
        assert_eq!(
            field_type(&graph, "Planet", "value"),
            TypeNode::optional(TypeNode::union([
                TypeNode::number(),
                TypeNode::boolean(),
                TypeNode::null()
            ]))
        );
        assert_eq!(
            field_type(&graph, "Planet", "mood"),
            TypeNode::union([TypeNode::literal("happy"), TypeNode::literal("sad")])
        );
        assert_eq!(
            field_type(&graph, "Planet", "lists"),
            TypeNode::union([
                TypeNode::array(TypeNode::string()),
                TypeNode::array(TypeNode::number())
            ])
        );
    }

    #[test]
    fn test_extract_literals() {
        let graph = extract(
            r#"
            struct Planet { kind: lit!("Constant"), level: lit!(-3), flag: lit!(true) }
        "#,
        );
        assert_eq!(field_type(&graph, "Planet", "kind"), TypeNode::literal("Constant"));
        assert_eq!(
            field_type(&graph, "Planet", "level"),
            TypeNode::Literal(LiteralValue::Number((-3).into()))
        );
        assert_eq!(
            field_type(&graph, "Planet", "flag"),
            TypeNode::Literal(LiteralValue::Boolean(true))
        );
    }

    #[test]
    fn test_extract_serde_rename() {
        let graph = extract(
            r#"
            struct Planet {
                #[serde(rename = "some_field")]
                some: String,
                r#type: String,
            }
        "#,
        );
        let planet = graph.struct_decl("Planet").unwrap();
        assert_eq!(planet.fields[0].name, "some_field");
        assert_eq!(planet.fields[1].name, "type");
    }

    #[test]
    fn test_extract_enums() {
        let graph = extract(
            r#"
            enum Status { Running, Paused = 5, Stopped }
            enum StatusString { Running = "RunnN", Paused = "PausD" }
        "#,
        );
        let status = graph.enum_decl("Status").unwrap();
        let values: Vec<_> = status.members.iter().map(|m| m.value.clone()).collect();
        assert_eq!(
            values,
            vec![EnumValue::Number(0), EnumValue::Number(5), EnumValue::Number(6)]
        );
        assert!(graph.enum_decl("StatusString").unwrap().is_string_valued());
    }

    #[test]
    fn test_extract_alias() {
        let graph = extract("type PlanetOrStar = union!(Planet | Star);");
        assert_eq!(
            graph.alias("PlanetOrStar").unwrap().ty,
            TypeNode::union([TypeNode::named("Planet"), TypeNode::named("Star")])
        );
    }

    #[test]
    fn test_ignores_other_items() {
        let graph = extract(
            r#"
            use std::collections::HashMap;
            fn helper() {}
            impl Star {}
            struct Star { size: f64 }
        "#,
        );
        assert_eq!(graph.structs().count(), 1);
        assert_eq!(
            field_type(&graph, "Star", "size"),
            TypeNode::Scalar(ScalarKind::Number)
        );
    }

    #[test]
    fn test_unsupported_syntax_names_item() {
        let mut codegen = CodeGenerator::new();
        let err = codegen
            .add_source_str("struct Star { lookup: HashMap<String, f64> }")
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnsupportedSyntax { ref context, .. } if context == "Star.lookup"
        ));

        let err = codegen
            .add_source_str("enum Shape { Circle(f64) }")
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnsupportedSyntax { ref context, .. } if context == "Shape::Circle"
        ));
    }

    #[test]
    fn test_parse_error() {
        let mut codegen = CodeGenerator::new();
        let err = codegen.add_source_str("struct {").unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
    }

    #[test]
    fn test_add_source_dir_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.rs"), "struct Star { size: f64 }").unwrap();
        fs::write(dir.path().join("a.rs"), "struct Planet { population: f64 }").unwrap();
        fs::write(dir.path().join("notes.txt"), "struct Ignored {}").unwrap();

        let mut codegen = CodeGenerator::new();
        codegen.add_source_dir(dir.path()).unwrap();
        let names: Vec<_> = codegen.graph().structs().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec!["Planet", "Star"]);
    }
}
