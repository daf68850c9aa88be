//! The resolved set of named declarations a compilation reads from.

use crate::types::{AliasDecl, EnumDecl, EnumMember, EnumValue, FieldDecl, StructDecl, TypeNode};
use indexmap::IndexMap;

/// A named declaration looked up by [`TypeGraph::lookup`].
#[derive(Debug, Clone, Copy)]
pub enum Declaration<'a> {
    Struct(&'a StructDecl),
    Enum(&'a EnumDecl),
    Alias(&'a AliasDecl),
}

/// Insertion-ordered store of struct, enum and alias declarations.
///
/// Declaration order matters: it decides the default root order and the
/// order in which aliases are tried when a union looks for a matching name.
/// Adding a declaration under an existing name replaces the earlier one.
///
/// # Example
///
/// ```
/// use protobridge_codegen::{TypeGraph, TypeNode};
///
/// let mut graph = TypeGraph::new();
/// graph
///     .add_enum("Status", &["Running", "Paused"])
///     .add_struct("Star", &[
///         ("size", TypeNode::union([TypeNode::number(), TypeNode::named("Star")])),
///         ("status", TypeNode::named("Status")),
///         ("children", TypeNode::array(TypeNode::named("Star"))),
///     ]);
/// assert!(graph.struct_decl("Star").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    structs: IndexMap<String, StructDecl>,
    enums: IndexMap<String, EnumDecl>,
    aliases: IndexMap<String, AliasDecl>,
}

impl TypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a struct with fields in declaration order.
    pub fn add_struct(
        &mut self,
        name: impl Into<String>,
        fields: &[(impl AsRef<str>, TypeNode)],
    ) -> &mut Self {
        let name = name.into();
        let fields = fields
            .iter()
            .map(|(n, ty)| FieldDecl {
                name: n.as_ref().to_string(),
                ty: ty.clone(),
            })
            .collect();
        self.insert_struct(StructDecl { name, fields })
    }

    /// Add a numeric enum whose members take the values `0..n`.
    pub fn add_enum(&mut self, name: impl Into<String>, members: &[impl AsRef<str>]) -> &mut Self {
        let members = members
            .iter()
            .enumerate()
            .map(|(idx, m)| EnumMember {
                name: m.as_ref().to_string(),
                value: EnumValue::Number(idx as i64),
            })
            .collect();
        self.insert_enum(EnumDecl {
            name: name.into(),
            members,
        })
    }

    /// Add an enum whose members carry string values.
    pub fn add_string_enum(
        &mut self,
        name: impl Into<String>,
        members: &[(impl AsRef<str>, impl AsRef<str>)],
    ) -> &mut Self {
        let members = members
            .iter()
            .map(|(m, v)| EnumMember {
                name: m.as_ref().to_string(),
                value: EnumValue::String(v.as_ref().to_string()),
            })
            .collect();
        self.insert_enum(EnumDecl {
            name: name.into(),
            members,
        })
    }

    /// Add a type alias.
    pub fn add_alias(&mut self, name: impl Into<String>, ty: TypeNode) -> &mut Self {
        let name = name.into();
        self.aliases.insert(name.clone(), AliasDecl { name, ty });
        self
    }

    pub fn insert_struct(&mut self, decl: StructDecl) -> &mut Self {
        self.structs.insert(decl.name.clone(), decl);
        self
    }

    pub fn insert_enum(&mut self, decl: EnumDecl) -> &mut Self {
        self.enums.insert(decl.name.clone(), decl);
        self
    }

    pub fn struct_decl(&self, name: &str) -> Option<&StructDecl> {
        self.structs.get(name)
    }

    pub fn enum_decl(&self, name: &str) -> Option<&EnumDecl> {
        self.enums.get(name)
    }

    pub fn alias(&self, name: &str) -> Option<&AliasDecl> {
        self.aliases.get(name)
    }

    /// Find any declaration by name. Structs shadow enums, which shadow aliases.
    pub fn lookup(&self, name: &str) -> Option<Declaration<'_>> {
        if let Some(decl) = self.structs.get(name) {
            Some(Declaration::Struct(decl))
        } else if let Some(decl) = self.enums.get(name) {
            Some(Declaration::Enum(decl))
        } else {
            self.aliases.get(name).map(Declaration::Alias)
        }
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructDecl> {
        self.structs.values()
    }

    pub fn aliases(&self) -> impl Iterator<Item = &AliasDecl> {
        self.aliases.values()
    }

    /// The roots compiled when no explicit type list is configured:
    /// string-valued enums first, then every struct, each in declaration order.
    pub fn default_roots(&self) -> Vec<String> {
        self.enums
            .values()
            .filter(|e| e.is_string_valued())
            .map(|e| e.name.clone())
            .chain(self.structs.keys().cloned())
            .collect()
    }
}
