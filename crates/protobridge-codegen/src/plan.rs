//! Translator plans.
//!
//! A plan is the data form of a translator. The TypeScript renderer and the
//! runtime translator both read the same plans, so the generated code and the
//! runtime cannot disagree on field names, ordinals or option numbers.

use crate::classify::VariantTag;
use crate::config::Config;
use crate::discriminator::Discriminator;
use crate::error::{CompileError, Result};
use crate::mapping::Mapping;
use crate::normalize::FieldRule;
use crate::registry::{Definition, EnumDef, FieldKind, Registry, StructDef, UnionDef};
use crate::types::EnumValue;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// How one field value is converted between its natural and wire forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    Identity,
    Message(String),
    Enum(String),
    /// `null` on one side, `0` on the other.
    Null,
    Union(String),
    LiteralEnum(String),
    /// Not on the wire. Dropped on encode and restored on decode.
    Constant(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPlan {
    /// Name in the natural object.
    pub original: String,
    /// Name in the wire object.
    pub wire: String,
    pub rule: FieldRule,
    pub conversion: Conversion,
}

impl FieldPlan {
    /// Whether the field passes through untouched.
    pub fn is_passthrough(&self) -> bool {
        self.original == self.wire && self.conversion == Conversion::Identity
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructTranslator {
    pub name: String,
    pub fields: Vec<FieldPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumTranslator {
    pub name: String,
    /// Value to ordinal. The unset slot has no entry.
    pub table: Mapping<EnumValue, u32>,
    /// Whether ordinal 0 decodes to "absent".
    pub unset: bool,
}

impl EnumTranslator {
    /// Values indexed by ordinal, `None` for the unset slot.
    pub fn by_ordinal(&self) -> Vec<Option<&EnumValue>> {
        let mut values = Vec::with_capacity(self.table.len() + 1);
        if self.unset {
            values.push(None);
        }
        values.extend(self.table.keys().map(Some));
        values
    }
}

/// One option of a oneof wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionOption {
    pub option: u32,
    pub tag: VariantTag,
}

impl UnionOption {
    /// The property holding this option's payload, e.g. `option2`.
    pub fn key(&self) -> String {
        format!("option{}", self.option)
    }

    pub fn entity(&self) -> Option<&str> {
        match &self.tag {
            VariantTag::Entity(name) => Some(name),
            VariantTag::Scalar(_) => None,
        }
    }
}

/// How object values of a union are told apart.
#[derive(Clone)]
pub enum Discrimination {
    /// The union has no struct members.
    None,
    /// Exactly one struct member; every object belongs to it.
    Single(String),
    /// Several struct members, resolved by a configured discriminator.
    Resolver {
        key: String,
        discriminator: Arc<dyn Discriminator>,
    },
}

impl fmt::Debug for Discrimination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrimination::None => f.write_str("None"),
            Discrimination::Single(name) => f.debug_tuple("Single").field(name).finish(),
            Discrimination::Resolver { key, discriminator } => f
                .debug_struct("Resolver")
                .field("key", key)
                .field("discriminator", discriminator)
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UnionTranslator {
    pub name: String,
    pub options: Vec<UnionOption>,
    pub null_option: Option<u32>,
    pub discrimination: Discrimination,
}

impl UnionTranslator {
    /// Variant tag to option property.
    pub fn option_table(&self) -> Mapping<String, String> {
        self.options
            .iter()
            .map(|o| (o.tag.key().to_string(), o.key()))
            .collect()
    }

    pub fn option_for(&self, tag: &str) -> Option<&UnionOption> {
        self.options.iter().find(|o| o.tag.key() == tag)
    }
}

#[derive(Debug, Clone)]
pub enum Translator {
    Struct(StructTranslator),
    Enum(EnumTranslator),
    Union(UnionTranslator),
}

impl Translator {
    pub fn name(&self) -> &str {
        match self {
            Translator::Struct(t) => &t.name,
            Translator::Enum(t) => &t.name,
            Translator::Union(t) => &t.name,
        }
    }
}

/// Translators for every emitted entity, in emission order.
#[derive(Debug, Clone, Default)]
pub struct TranslatorSet {
    translators: IndexMap<String, Translator>,
}

impl TranslatorSet {
    /// Build plans for everything in `registry`.
    ///
    /// Fails when a union with several struct members has no discriminator.
    pub fn build(registry: &Registry, config: &Config) -> Result<Self> {
        let mut translators = IndexMap::new();
        let mut used_keys = HashSet::new();

        for def in registry.emitted() {
            let translator = match def {
                Definition::Struct(def) => Translator::Struct(struct_plan(def)),
                Definition::Enum(def) => Translator::Enum(enum_plan(def)),
                Definition::Union(def) => {
                    Translator::Union(union_plan(def, config, &mut used_keys)?)
                }
            };
            translators.insert(translator.name().to_string(), translator);
        }

        for key in config.discriminator_keys() {
            if !used_keys.contains(key) {
                warn!(key, "configured discriminator matches no union");
            }
        }

        Ok(Self { translators })
    }

    pub fn get(&self, name: &str) -> Option<&Translator> {
        self.translators.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Translator> {
        self.translators.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.translators.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.translators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }
}

fn struct_plan(def: &StructDef) -> StructTranslator {
    let fields = def
        .fields
        .iter()
        .map(|field| FieldPlan {
            original: field.original_name.clone(),
            wire: field.escaped_name.clone(),
            rule: field.rule,
            conversion: match &field.kind {
                FieldKind::Scalar(_) => Conversion::Identity,
                FieldKind::NullSentinel => Conversion::Null,
                FieldKind::Message(name) => Conversion::Message(name.clone()),
                FieldKind::Enum(name) => Conversion::Enum(name.clone()),
                FieldKind::Union(name) => Conversion::Union(name.clone()),
                FieldKind::LiteralEnum(name) => Conversion::LiteralEnum(name.clone()),
                FieldKind::Constant(value) => Conversion::Constant(value.clone()),
            },
        })
        .collect();

    StructTranslator {
        name: def.name.clone(),
        fields,
    }
}

fn enum_plan(def: &EnumDef) -> EnumTranslator {
    let table = def
        .entries
        .iter()
        .filter_map(|entry| entry.value.clone().map(|value| (value, entry.ordinal)))
        .collect();

    EnumTranslator {
        name: def.name.clone(),
        table,
        unset: def.has_unset(),
    }
}

fn union_plan(
    def: &UnionDef,
    config: &Config,
    used_keys: &mut HashSet<String>,
) -> Result<UnionTranslator> {
    let options = def
        .members
        .iter()
        .map(|member| UnionOption {
            option: member.option,
            tag: member.tag.clone(),
        })
        .collect();

    let entities: Vec<&str> = def.entities().collect();
    let discrimination = match entities.as_slice() {
        [] => Discrimination::None,
        [single] => Discrimination::Single(single.to_string()),
        _ => {
            let discriminator = config.discriminator(&def.resolver_key).ok_or_else(|| {
                CompileError::MissingDiscriminator {
                    union: def.name.clone(),
                    key: def.resolver_key.clone(),
                }
            })?;
            used_keys.insert(def.resolver_key.clone());
            Discrimination::Resolver {
                key: def.resolver_key.clone(),
                discriminator,
            }
        }
    };

    Ok(UnionTranslator {
        name: def.name.clone(),
        options,
        null_option: def.null_option(),
        discrimination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::discriminator::DiscriminatorSpec;
    use crate::graph::TypeGraph;
    use crate::types::{ScalarKind, TypeNode};

    fn solar() -> TypeGraph {
        let mut graph = TypeGraph::new();
        graph
            .add_struct("Star", &[("star_name", TypeNode::string())])
            .add_struct("Planet", &[("population", TypeNode::number())])
            .add_alias(
                "PlanetOrStar",
                TypeNode::union([TypeNode::named("Planet"), TypeNode::named("Star")]),
            )
            .add_struct(
                "SolarSystem",
                &[
                    ("sun", TypeNode::named("PlanetOrStar")),
                    (
                        "flag",
                        TypeNode::union([TypeNode::number(), TypeNode::boolean(), TypeNode::null()]),
                    ),
                ],
            );
        graph
    }

    fn presence() -> DiscriminatorSpec {
        DiscriminatorSpec::Presence {
            field: "star_name".to_string(),
            present: "Star".to_string(),
            absent: "Planet".to_string(),
        }
    }

    #[test]
    fn test_missing_discriminator() {
        let err = compile(&solar(), &Config::new()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::MissingDiscriminator { ref union, ref key }
                if union == "PlanetOrStar" && key == "PlanetOrStar"
        ));
    }

    #[test]
    fn test_struct_plan_renames() {
        let config = Config::new().with_discriminator_spec("PlanetOrStar", presence());
        let set = compile(&solar(), &config).unwrap().translators;
        let Some(Translator::Struct(star)) = set.get("Star") else {
            panic!("missing Star translator");
        };
        assert_eq!(star.fields[0].original, "star_name");
        assert_eq!(star.fields[0].wire, "starname");
        assert!(!star.fields[0].is_passthrough());
    }

    #[test]
    fn test_union_plan() {
        let config = Config::new().with_discriminator_spec("PlanetOrStar", presence());
        let set = compile(&solar(), &config).unwrap().translators;

        let Some(Translator::Union(flag)) = set.get("Union_1_SolarSystem_flag") else {
            panic!("missing flag union");
        };
        assert_eq!(flag.null_option, Some(3));
        assert!(matches!(flag.discrimination, Discrimination::None));
        assert_eq!(
            flag.option_for("boolean").map(|o| o.tag.clone()),
            Some(VariantTag::Scalar(ScalarKind::Boolean))
        );
        assert_eq!(
            serde_json::to_string(&flag.option_table()).unwrap(),
            r#"[["number","option1"],["boolean","option2"],["null","option3"]]"#
        );

        let Some(Translator::Union(sun)) = set.get("PlanetOrStar") else {
            panic!("missing alias union");
        };
        assert!(matches!(sun.discrimination, Discrimination::Resolver { ref key, .. } if key == "PlanetOrStar"));
    }

    #[test]
    fn test_enum_plan_by_ordinal() {
        let mut graph = TypeGraph::new();
        graph.add_struct(
            "Planet",
            &[(
                "mood",
                TypeNode::optional(TypeNode::union([
                    TypeNode::literal("happy"),
                    TypeNode::literal("sad"),
                ])),
            )],
        );
        let set = compile(&graph, &Config::new()).unwrap().translators;
        let Some(Translator::Enum(mood)) = set.get("Literal_Planet_mood") else {
            panic!("missing literal enum");
        };
        assert!(mood.unset);
        let happy = EnumValue::String("happy".to_string());
        assert_eq!(mood.table.get(&happy), Some(&1));
        assert_eq!(mood.by_ordinal(), vec![
            None,
            Some(&happy),
            Some(&EnumValue::String("sad".to_string()))
        ]);
    }
}
