//! Runtime translation of JSON values.
//!
//! Applies the same plans the TypeScript renderer emits, to `serde_json`
//! values. A natural value models an in-memory JavaScript object: `undefined`
//! is a missing key and `null` is [`Value::Null`]. A wire value is what the
//! protobuf codec consumes: escaped keys, enum ordinals, `0` for null, and
//! `{"optionN": payload}` for unions.
//!
//! ```
//! use protobridge_codegen::{CodeGenerator, TypeNode};
//! use serde_json::json;
//!
//! let mut generator = CodeGenerator::new();
//! generator.add_struct("Planet", &[
//!     ("planet_name", TypeNode::string()),
//!     ("moon", TypeNode::optional(TypeNode::null())),
//! ]);
//! let translators = generator.generate().unwrap().translators;
//!
//! let mut value = json!({ "planet_name": "Earth", "moon": null });
//! translators.to_wire("Planet", &mut value).unwrap();
//! assert_eq!(value, json!({ "planetname": "Earth", "moon": 0 }));
//!
//! translators.from_wire("Planet", &mut value).unwrap();
//! assert_eq!(value, json!({ "planet_name": "Earth", "moon": null }));
//! ```

use crate::classify::VariantTag;
use crate::error::TranslateError;
use crate::normalize::FieldRule;
use crate::plan::{
    Conversion, Discrimination, EnumTranslator, FieldPlan, StructTranslator, Translator,
    TranslatorSet, UnionTranslator,
};
use crate::types::{EnumValue, ScalarKind};
use serde_json::{Map, Value};

type Result<T> = std::result::Result<T, TranslateError>;

impl TranslatorSet {
    /// Convert a natural value of `entity` into its wire form, in place.
    pub fn to_wire(&self, entity: &str, value: &mut Value) -> Result<()> {
        match self.translator(entity)? {
            Translator::Struct(plan) => self.struct_to_wire(plan, value),
            Translator::Enum(plan) => {
                *value = enum_to_wire(plan, value)?;
                Ok(())
            }
            Translator::Union(plan) => {
                *value = self.union_to_wire(plan, value)?;
                Ok(())
            }
        }
    }

    /// Convert a wire value of `entity` back into its natural form, in place.
    ///
    /// A value that decodes to "absent" (an unset literal, an empty union)
    /// becomes [`Value::Null`] at the top level; inside structs the key is
    /// simply left out.
    pub fn from_wire(&self, entity: &str, value: &mut Value) -> Result<()> {
        let decoded = match self.translator(entity)? {
            Translator::Struct(plan) => {
                self.struct_from_wire(plan, value)?;
                return Ok(());
            }
            Translator::Enum(plan) => enum_from_wire(plan, Some(&*value))?,
            Translator::Union(plan) => self.union_from_wire(plan, value)?,
        };
        *value = decoded.unwrap_or(Value::Null);
        Ok(())
    }

    fn translator(&self, entity: &str) -> Result<&Translator> {
        self.get(entity)
            .ok_or_else(|| TranslateError::UnknownEntity(entity.to_string()))
    }

    fn struct_to_wire(&self, plan: &StructTranslator, value: &mut Value) -> Result<()> {
        let object = as_object(&plan.name, value)?;

        for field in &plan.fields {
            let Some(taken) = object.remove(&field.original) else {
                continue;
            };
            if matches!(field.conversion, Conversion::Constant(_)) {
                continue;
            }

            let converted = if field.rule == FieldRule::Repeated {
                let Value::Array(items) = taken else {
                    return Err(expected_array(plan, field));
                };
                Value::Array(
                    items
                        .into_iter()
                        .map(|mut item| {
                            self.convert_to_wire(&field.conversion, &mut item)?;
                            Ok(item)
                        })
                        .collect::<Result<_>>()?,
                )
            } else {
                let mut item = taken;
                self.convert_to_wire(&field.conversion, &mut item)?;
                item
            };
            object.insert(field.wire.clone(), converted);
        }
        Ok(())
    }

    fn convert_to_wire(&self, conversion: &Conversion, value: &mut Value) -> Result<()> {
        match conversion {
            Conversion::Identity | Conversion::Constant(_) => Ok(()),
            Conversion::Null => {
                *value = Value::from(0);
                Ok(())
            }
            Conversion::Message(name)
            | Conversion::Enum(name)
            | Conversion::Union(name)
            | Conversion::LiteralEnum(name) => self.to_wire(name, value),
        }
    }

    fn struct_from_wire(&self, plan: &StructTranslator, value: &mut Value) -> Result<()> {
        let object = as_object(&plan.name, value)?;

        for field in &plan.fields {
            let taken = object.remove(&field.wire).filter(|v| !v.is_null());

            if let Conversion::Constant(constant) = &field.conversion {
                object.insert(field.original.clone(), Value::from(constant.as_str()));
                continue;
            }

            let decoded = match (taken, field.rule) {
                (Some(Value::Array(items)), FieldRule::Repeated) => {
                    let mut decoded = Vec::with_capacity(items.len());
                    for item in items {
                        // Elements keep their index; an absent element reads as null.
                        let item = self.convert_from_wire(&field.conversion, Some(item))?;
                        decoded.push(item.unwrap_or(Value::Null));
                    }
                    Some(Value::Array(decoded))
                }
                (Some(_), FieldRule::Repeated) => return Err(expected_array(plan, field)),
                (None, FieldRule::Repeated) => Some(Value::Array(Vec::new())),
                (None, FieldRule::Optional) => None,
                (taken, _) => self.convert_from_wire(&field.conversion, taken)?,
            };

            if let Some(decoded) = decoded {
                object.insert(field.original.clone(), decoded);
            }
        }
        Ok(())
    }

    /// Decode one wire value. `None` input means the field was absent; `None`
    /// output means the natural field stays absent.
    fn convert_from_wire(&self, conversion: &Conversion, value: Option<Value>) -> Result<Option<Value>> {
        match conversion {
            Conversion::Identity => Ok(value),
            Conversion::Constant(constant) => Ok(Some(Value::from(constant.as_str()))),
            Conversion::Null => Ok(Some(Value::Null)),
            Conversion::Enum(name) | Conversion::LiteralEnum(name) => match self.translator(name)? {
                Translator::Enum(plan) => enum_from_wire(plan, value.as_ref()),
                _ => Err(TranslateError::UnknownEntity(name.clone())),
            },
            Conversion::Message(name) => match value {
                Some(mut value) => {
                    self.from_wire(name, &mut value)?;
                    Ok(Some(value))
                }
                None => Ok(None),
            },
            Conversion::Union(name) => match (self.translator(name)?, value) {
                (Translator::Union(plan), Some(value)) => self.union_from_wire(plan, &value),
                (Translator::Union(_), None) => Ok(None),
                _ => Err(TranslateError::UnknownEntity(name.clone())),
            },
        }
    }

    fn union_to_wire(&self, plan: &UnionTranslator, value: &Value) -> Result<Value> {
        let tag = match value {
            Value::Object(_) | Value::Array(_) => match &plan.discrimination {
                Discrimination::Single(entity) => VariantTag::Entity(entity.clone()),
                Discrimination::Resolver { discriminator, .. } => VariantTag::Entity(
                    discriminator
                        .classify(value)
                        .ok_or_else(|| TranslateError::Undiscriminated {
                            union: plan.name.clone(),
                        })?,
                ),
                Discrimination::None => {
                    return Err(TranslateError::NoMatchingVariant {
                        union: plan.name.clone(),
                        tag: "object".to_string(),
                    });
                }
            },
            scalar => match ScalarKind::of_value(scalar) {
                Some(kind) => VariantTag::Scalar(kind),
                None => {
                    return Err(TranslateError::NoMatchingVariant {
                        union: plan.name.clone(),
                        tag: "object".to_string(),
                    });
                }
            },
        };

        let option = plan
            .option_for(tag.key())
            .ok_or_else(|| TranslateError::NoMatchingVariant {
                union: plan.name.clone(),
                tag: tag.key().to_string(),
            })?;

        let payload = match (&tag, option.entity()) {
            (VariantTag::Scalar(ScalarKind::Null), _) => Value::from(0),
            (_, Some(entity)) => {
                let mut payload = value.clone();
                self.to_wire(entity, &mut payload)?;
                payload
            }
            (_, None) => value.clone(),
        };

        let mut wrapper = Map::new();
        wrapper.insert(option.key(), payload);
        Ok(Value::Object(wrapper))
    }

    fn union_from_wire(&self, plan: &UnionTranslator, value: &Value) -> Result<Option<Value>> {
        for option in &plan.options {
            let Some(payload) = value.get(option.key()).filter(|v| !v.is_null()) else {
                continue;
            };
            if plan.null_option == Some(option.option) {
                return Ok(Some(Value::Null));
            }
            let mut payload = payload.clone();
            if let Some(entity) = option.entity() {
                self.from_wire(entity, &mut payload)?;
            }
            return Ok(Some(payload));
        }
        Ok(None)
    }
}

fn as_object<'v>(entity: &str, value: &'v mut Value) -> Result<&'v mut Map<String, Value>> {
    value
        .as_object_mut()
        .ok_or_else(|| TranslateError::ExpectedObject {
            entity: entity.to_string(),
        })
}

fn expected_array(plan: &StructTranslator, field: &FieldPlan) -> TranslateError {
    TranslateError::ExpectedArray {
        entity: plan.name.clone(),
        field: field.original.clone(),
    }
}

fn enum_value_of(value: &Value) -> Option<EnumValue> {
    match value {
        Value::String(s) => Some(EnumValue::String(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(EnumValue::Number),
        _ => None,
    }
}

fn enum_to_wire(plan: &EnumTranslator, value: &Value) -> Result<Value> {
    enum_value_of(value)
        .and_then(|v| plan.table.get(&v).copied())
        .map(Value::from)
        .ok_or_else(|| TranslateError::UnknownEnumValue {
            entity: plan.name.clone(),
            value: value.to_string(),
        })
}

/// Ordinal to value. A missing ordinal reads as 0.
fn enum_from_wire(plan: &EnumTranslator, value: Option<&Value>) -> Result<Option<Value>> {
    let ordinal = match value {
        None | Some(Value::Null) => 0,
        Some(v) => v.as_u64().ok_or_else(|| TranslateError::UnknownOrdinal {
            entity: plan.name.clone(),
            value: v.to_string(),
        })?,
    };

    let values = plan.by_ordinal();
    match values.get(ordinal as usize) {
        Some(Some(value)) => Ok(Some(value.to_json())),
        Some(None) => Ok(None),
        None => Err(TranslateError::UnknownOrdinal {
            entity: plan.name.clone(),
            value: ordinal.to_string(),
        }),
    }
}
