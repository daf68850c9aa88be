//! Definition registry for one compilation.
//!
//! The registry is the arena every emitted definition lives in. It owns the
//! FIFO worklist of entities still to be processed, the visited set that keeps
//! every name to a single emission, the counter behind synthetic union names,
//! and the emission order the schema and the translators are written in.
//!
//! A registry is created per compilation and dropped with it.

use crate::classify::VariantTag;
use crate::config::NumberWidth;
use crate::error::Result;
use crate::graph::TypeGraph;
use crate::normalize::{FieldRule, alias_variants, same_variants};
use crate::types::{EnumValue, TypeNode};
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};

/// A unit of work on the discovery worklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingType {
    Struct(String),
    Enum(String),
    Union(String),
    LiteralEnum(String),
}

impl PendingType {
    pub fn name(&self) -> &str {
        match self {
            PendingType::Struct(name)
            | PendingType::Enum(name)
            | PendingType::Union(name)
            | PendingType::LiteralEnum(name) => name,
        }
    }
}

/// Wire scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireScalar {
    String,
    Float,
    Int32,
    Bool,
}

impl WireScalar {
    pub fn number(width: NumberWidth) -> Self {
        match width {
            NumberWidth::Int32 => WireScalar::Int32,
            NumberWidth::Float => WireScalar::Float,
        }
    }

    pub fn proto_type(self) -> &'static str {
        match self {
            WireScalar::String => "string",
            WireScalar::Float => "float",
            WireScalar::Int32 => "int32",
            WireScalar::Bool => "bool",
        }
    }
}

/// Name of the enum standing in for `null` on the wire.
pub const NULL_SENTINEL: &str = "SpecialNullSubstitute";

/// How a struct field is carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(WireScalar),
    NullSentinel,
    Message(String),
    Enum(String),
    Union(String),
    LiteralEnum(String),
    /// A single string literal. Not on the wire; restored on decode.
    Constant(String),
}

impl FieldKind {
    /// The schema type name, or `None` for fields that are not on the wire.
    pub fn proto_type(&self) -> Option<&str> {
        match self {
            FieldKind::Scalar(scalar) => Some(scalar.proto_type()),
            FieldKind::NullSentinel => Some(NULL_SENTINEL),
            FieldKind::Message(name)
            | FieldKind::Enum(name)
            | FieldKind::Union(name)
            | FieldKind::LiteralEnum(name) => Some(name),
            FieldKind::Constant(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub original_name: String,
    pub escaped_name: String,
    pub number: u32,
    pub rule: FieldRule,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumOrigin {
    /// Declared in the source.
    Source,
    /// Derived from a string-literal union.
    Literal,
}

/// One wire enum value. `value` is `None` for the unset slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumEntry {
    pub wire_name: String,
    pub ordinal: u32,
    pub value: Option<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    pub name: String,
    pub origin: EnumOrigin,
    pub entries: Vec<EnumEntry>,
}

impl EnumDef {
    /// Whether ordinal 0 is the unset sentinel.
    pub fn has_unset(&self) -> bool {
        self.entries.first().is_some_and(|e| e.value.is_none())
    }
}

/// How a union member is carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberWire {
    Scalar(WireScalar),
    NullSentinel,
    Message(String),
}

impl MemberWire {
    pub fn proto_type(&self) -> &str {
        match self {
            MemberWire::Scalar(scalar) => scalar.proto_type(),
            MemberWire::NullSentinel => NULL_SENTINEL,
            MemberWire::Message(name) => name,
        }
    }
}

/// Member `option` of a union; its tag number is `option + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionMember {
    pub option: u32,
    pub tag: VariantTag,
    pub wire: MemberWire,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionDef {
    pub name: String,
    /// Named after a declared type alias rather than synthesized.
    pub alias: bool,
    /// The configuration key its discriminator is looked up under.
    pub resolver_key: String,
    pub members: Vec<UnionMember>,
}

impl UnionDef {
    pub fn null_option(&self) -> Option<u32> {
        self.members
            .iter()
            .find(|m| m.wire == MemberWire::NullSentinel)
            .map(|m| m.option)
    }

    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.members.iter().filter_map(|m| match &m.wire {
            MemberWire::Message(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

/// An emitted definition, borrowed from the registry.
#[derive(Debug, Clone, Copy)]
pub enum Definition<'a> {
    Struct(&'a StructDef),
    Enum(&'a EnumDef),
    Union(&'a UnionDef),
}

#[derive(Debug)]
pub struct Registry {
    structs: IndexMap<String, StructDef>,
    enums: IndexMap<String, EnumDef>,
    unions: IndexMap<String, UnionDef>,
    /// Names already queued or created, across all kinds.
    visited: HashSet<String>,
    worklist: VecDeque<PendingType>,
    order: Vec<String>,
    union_counter: usize,
    /// Declared aliases usable as union names, in declaration order.
    alias_unions: Vec<(String, Vec<TypeNode>)>,
}

impl Registry {
    /// Create an empty registry for compiling `graph`.
    pub fn new(graph: &TypeGraph) -> Self {
        let alias_unions = graph
            .aliases()
            .filter_map(|alias| alias_variants(graph, alias).map(|v| (alias.name.clone(), v)))
            .collect();

        Self {
            structs: IndexMap::new(),
            enums: IndexMap::new(),
            unions: IndexMap::new(),
            visited: HashSet::new(),
            worklist: VecDeque::new(),
            order: Vec::new(),
            union_counter: 1,
            alias_unions,
        }
    }

    fn enqueue(&mut self, pending: PendingType) -> bool {
        if self.visited.insert(pending.name().to_string()) {
            self.worklist.push_back(pending);
            true
        } else {
            false
        }
    }

    /// Queue a struct for processing unless it was seen before.
    pub fn collect_struct(&mut self, name: &str) -> bool {
        self.enqueue(PendingType::Struct(name.to_string()))
    }

    /// Queue a source enum for processing unless it was seen before.
    pub fn collect_enum(&mut self, name: &str) -> bool {
        self.enqueue(PendingType::Enum(name.to_string()))
    }

    /// The declared alias whose variants equal `members`, first in declaration order.
    pub fn find_alias_union(&self, members: &[TypeNode]) -> Option<&str> {
        self.alias_unions
            .iter()
            .find(|(_, variants)| same_variants(variants, members))
            .map(|(name, _)| name.as_str())
    }

    /// Return the union for `members`, creating it on first use.
    ///
    /// A matching alias names the union; otherwise a fresh name
    /// `Union_<n>_<hint>` is minted. `build` receives the chosen name and
    /// whether it is an alias, and is only called for new unions.
    pub fn collect_or_create_union<F>(
        &mut self,
        members: &[TypeNode],
        hint: &str,
        build: F,
    ) -> Result<String>
    where
        F: FnOnce(&str, bool) -> Result<UnionDef>,
    {
        let (name, alias) = match self.find_alias_union(members) {
            Some(alias) => (alias.to_string(), true),
            None => {
                let name = format!("Union_{}_{hint}", self.union_counter);
                self.union_counter += 1;
                (name, false)
            }
        };

        if !self.unions.contains_key(&name) {
            let def = build(&name, alias)?;
            self.unions.insert(name.clone(), def);
            self.enqueue(PendingType::Union(name.clone()));
        }
        Ok(name)
    }

    /// Store a literal enum and queue it for emission.
    pub fn create_literal_enum(&mut self, def: EnumDef) -> String {
        let name = def.name.clone();
        if !self.enums.contains_key(&name) {
            self.enums.insert(name.clone(), def);
            self.enqueue(PendingType::LiteralEnum(name.clone()));
        }
        name
    }

    pub fn next_pending(&mut self) -> Option<PendingType> {
        self.worklist.pop_front()
    }

    pub fn insert_struct(&mut self, def: StructDef) {
        self.structs.insert(def.name.clone(), def);
    }

    pub fn insert_enum(&mut self, def: EnumDef) {
        self.enums.insert(def.name.clone(), def);
    }

    /// Append `name` to the emission order.
    pub fn record(&mut self, name: &str) {
        self.order.push(name.to_string());
    }

    pub fn struct_def(&self, name: &str) -> Option<&StructDef> {
        self.structs.get(name)
    }

    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums.get(name)
    }

    pub fn union_def(&self, name: &str) -> Option<&UnionDef> {
        self.unions.get(name)
    }

    pub fn get(&self, name: &str) -> Option<Definition<'_>> {
        if let Some(def) = self.structs.get(name) {
            Some(Definition::Struct(def))
        } else if let Some(def) = self.enums.get(name) {
            Some(Definition::Enum(def))
        } else {
            self.unions.get(name).map(Definition::Union)
        }
    }

    /// Every emitted definition in emission order.
    pub fn emitted(&self) -> impl Iterator<Item = Definition<'_>> {
        self.order.iter().filter_map(|name| self.get(name))
    }

    pub fn emission_order(&self) -> &[String] {
        &self.order
    }
}
