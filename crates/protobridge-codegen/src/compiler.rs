//! Type-graph compilation: discovery, normalization and identity assignment.

use crate::classify::{VariantTag, scalar_kind};
use crate::config::{Config, NumberWidth};
use crate::error::{CompileError, Result};
use crate::graph::{Declaration, TypeGraph};
use crate::normalize::{FieldRule, FieldSite, Normalized, normalize_field};
use crate::plan::TranslatorSet;
use crate::registry::{
    EnumDef, EnumEntry, EnumOrigin, FieldDef, FieldKind, MemberWire, PendingType, Registry,
    StructDef, UnionDef, UnionMember, WireScalar,
};
use crate::schema::emit_schema;
use crate::types::{EnumValue, ScalarKind, TypeNode};
use std::collections::HashSet;
use tracing::{debug, trace, warn};

/// The wire name of a field: underscores removed, lower-cased.
pub fn escape_field_name(name: &str) -> String {
    name.replace('_', "").to_lowercase()
}

/// Everything one compilation produces.
#[derive(Debug)]
pub struct Compilation {
    pub registry: Registry,
    pub schema: String,
    pub translators: TranslatorSet,
}

/// Compile `graph` into a schema and a translator set.
///
/// Each call owns a fresh [`Registry`]; nothing is shared between calls.
pub fn compile(graph: &TypeGraph, config: &Config) -> Result<Compilation> {
    let mut compiler = Compiler {
        graph,
        config,
        registry: Registry::new(graph),
    };
    compiler.collect_roots()?;
    compiler.drain()?;
    compiler.check_overrides();

    let registry = compiler.registry;
    let schema = emit_schema(&registry);
    let translators = TranslatorSet::build(&registry, config)?;

    debug!(
        entities = registry.emission_order().len(),
        "compiled type graph"
    );

    Ok(Compilation {
        registry,
        schema,
        translators,
    })
}

struct Compiler<'a> {
    graph: &'a TypeGraph,
    config: &'a Config,
    registry: Registry,
}

impl Compiler<'_> {
    fn collect_roots(&mut self) -> Result<()> {
        let roots = match &self.config.types {
            Some(types) => types.clone(),
            None => self.graph.default_roots(),
        };

        for root in &roots {
            match self.graph.lookup(root) {
                Some(Declaration::Struct(_)) => {
                    self.registry.collect_struct(root);
                }
                Some(Declaration::Enum(_)) => {
                    self.registry.collect_enum(root);
                }
                Some(Declaration::Alias(_)) | None => {
                    return Err(CompileError::UnknownType(root.clone()));
                }
            }
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<()> {
        while let Some(pending) = self.registry.next_pending() {
            trace!(?pending, "processing");
            match pending {
                PendingType::Struct(name) => self.process_struct(&name)?,
                PendingType::Enum(name) => self.process_enum(&name)?,
                PendingType::Union(name) => self.process_union(&name),
                PendingType::LiteralEnum(name) => {
                    debug!(name = %name, "collected literal enum");
                    self.registry.record(&name);
                }
            }
        }
        Ok(())
    }

    fn process_struct(&mut self, name: &str) -> Result<()> {
        let graph = self.graph;
        let decl = graph
            .struct_decl(name)
            .ok_or_else(|| CompileError::UnknownType(name.to_string()))?;

        self.registry.record(name);

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(decl.fields.len());

        for (idx, field) in decl.fields.iter().enumerate() {
            let escaped = escape_field_name(&field.name);
            if escaped.is_empty() {
                return Err(CompileError::EmptyFieldName {
                    owner: name.to_string(),
                    field: field.name.clone(),
                });
            }
            if !seen.insert(escaped.clone()) {
                return Err(CompileError::AmbiguousField {
                    owner: name.to_string(),
                    field: field.name.clone(),
                    escaped,
                });
            }

            let site = FieldSite {
                owner: name,
                field: &field.name,
            };
            let normalized = normalize_field(graph, &field.ty, site)?;
            let width = self.config.number_width(name, &field.name);

            let kind = match normalized.shape {
                Normalized::Single(ty) => self.single_kind(&ty, width, site)?,
                Normalized::LiteralUnion(values) => {
                    self.literal_kind(name, &escaped, normalized.rule, values)
                }
                Normalized::Union(members) => {
                    let hint = format!("{name}_{escaped}");
                    let key = format!("{name}.{}", field.name);
                    FieldKind::Union(self.union_for(&members, &hint, &key, width, site)?)
                }
            };

            fields.push(FieldDef {
                original_name: field.name.clone(),
                escaped_name: escaped,
                number: idx as u32 + 1,
                rule: normalized.rule,
                kind,
            });
        }

        debug!(name, fields = fields.len(), "collected struct");
        self.registry.insert_struct(StructDef {
            name: name.to_string(),
            fields,
        });
        Ok(())
    }

    fn single_kind(&mut self, ty: &TypeNode, width: NumberWidth, site: FieldSite<'_>) -> Result<FieldKind> {
        match ty {
            TypeNode::Scalar(ScalarKind::String) => Ok(FieldKind::Scalar(WireScalar::String)),
            TypeNode::Scalar(ScalarKind::Number) => Ok(FieldKind::Scalar(WireScalar::number(width))),
            TypeNode::Scalar(ScalarKind::Boolean) => Ok(FieldKind::Scalar(WireScalar::Bool)),
            TypeNode::Scalar(ScalarKind::Null) => Ok(FieldKind::NullSentinel),
            TypeNode::Reference(name) => match self.graph.lookup(name) {
                Some(Declaration::Struct(_)) => {
                    self.registry.collect_struct(name);
                    Ok(FieldKind::Message(name.clone()))
                }
                Some(Declaration::Enum(_)) => {
                    self.registry.collect_enum(name);
                    Ok(FieldKind::Enum(name.clone()))
                }
                Some(Declaration::Alias(_)) | None => Err(CompileError::UnknownType(name.clone())),
            },
            _ => Err(CompileError::Unrepresentable {
                owner: site.owner.to_string(),
                field: site.field.to_string(),
            }),
        }
    }

    fn literal_kind(
        &mut self,
        owner: &str,
        escaped: &str,
        rule: FieldRule,
        mut values: Vec<String>,
    ) -> FieldKind {
        if values.len() == 1 && rule != FieldRule::Repeated {
            return FieldKind::Constant(values.remove(0));
        }

        let name = format!("Literal_{owner}_{escaped}");
        let unset = rule == FieldRule::Optional && values.len() > 1;

        let mut entries = Vec::with_capacity(values.len() + 1);
        if unset {
            entries.push(EnumEntry {
                wire_name: format!("{name}_UNSET"),
                ordinal: 0,
                value: None,
            });
        }
        for value in values {
            let ordinal = entries.len() as u32;
            entries.push(EnumEntry {
                wire_name: format!("{name}_{ordinal}"),
                ordinal,
                value: Some(EnumValue::String(value)),
            });
        }

        FieldKind::LiteralEnum(self.registry.create_literal_enum(EnumDef {
            name,
            origin: EnumOrigin::Literal,
            entries,
        }))
    }

    fn union_for(
        &mut self,
        members: &[TypeNode],
        hint: &str,
        key: &str,
        width: NumberWidth,
        site: FieldSite<'_>,
    ) -> Result<String> {
        let graph = self.graph;
        let default_width = self.config.number_encoding.default;

        self.registry
            .collect_or_create_union(members, hint, |name, alias| {
                // Field overrides only reach unions minted for that field.
                let width = if alias { default_width } else { width };
                let members = members
                    .iter()
                    .enumerate()
                    .map(|(idx, member)| {
                        let (tag, wire) = union_member(graph, member, width, site)?;
                        Ok(UnionMember {
                            option: idx as u32 + 1,
                            tag,
                            wire,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(UnionDef {
                    name: name.to_string(),
                    alias,
                    resolver_key: if alias {
                        name.to_string()
                    } else {
                        key.to_string()
                    },
                    members,
                })
            })
    }

    fn process_union(&mut self, name: &str) {
        self.registry.record(name);
        let entities: Vec<String> = self
            .registry
            .union_def(name)
            .map(|def| def.entities().map(str::to_string).collect())
            .unwrap_or_default();
        for entity in &entities {
            self.registry.collect_struct(entity);
        }
        debug!(name, "collected union");
    }

    fn process_enum(&mut self, name: &str) -> Result<()> {
        let decl = self
            .graph
            .enum_decl(name)
            .ok_or_else(|| CompileError::UnknownType(name.to_string()))?;

        let prefix = name.to_uppercase();
        let entries = decl
            .members
            .iter()
            .enumerate()
            .map(|(idx, member)| EnumEntry {
                wire_name: format!("{prefix}_{}", member.name.to_uppercase()),
                ordinal: idx as u32,
                value: Some(member.value.clone()),
            })
            .collect();

        self.registry.record(name);
        self.registry.insert_enum(EnumDef {
            name: name.to_string(),
            origin: EnumOrigin::Source,
            entries,
        });
        debug!(name, "collected enum");
        Ok(())
    }

    /// Warn about number overrides that name no field of a compiled struct.
    fn check_overrides(&self) {
        for key in self.config.number_encoding.overrides.keys() {
            let known = key.split_once('.').is_some_and(|(owner, field)| {
                self.registry
                    .struct_def(owner)
                    .is_some_and(|def| def.fields.iter().any(|f| f.original_name == field))
            });
            if !known {
                warn!(key = %key, "number encoding override matches no compiled field");
            }
        }
    }
}

fn union_member(
    graph: &TypeGraph,
    member: &TypeNode,
    width: NumberWidth,
    site: FieldSite<'_>,
) -> Result<(VariantTag, MemberWire)> {
    if let Some(kind) = scalar_kind(member) {
        let wire = match kind {
            ScalarKind::String => MemberWire::Scalar(WireScalar::String),
            ScalarKind::Number => MemberWire::Scalar(WireScalar::number(width)),
            ScalarKind::Boolean => MemberWire::Scalar(WireScalar::Bool),
            ScalarKind::Null => MemberWire::NullSentinel,
        };
        return Ok((VariantTag::Scalar(kind), wire));
    }

    match member {
        TypeNode::Reference(name) if graph.struct_decl(name).is_some() => Ok((
            VariantTag::Entity(name.clone()),
            MemberWire::Message(name.clone()),
        )),
        other => Err(CompileError::UnsupportedUnionMember {
            owner: site.owner.to_string(),
            field: site.field.to_string(),
            member: other.describe(),
        }),
    }
}
