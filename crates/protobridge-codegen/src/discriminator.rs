//! Entity discrimination for unions with several object members.
//!
//! A union whose members include more than one struct cannot tell its
//! object variants apart with `typeof`. Such unions need a [`Discriminator`],
//! registered in the [`Config`](crate::Config) under the union's alias name or
//! under `"<Struct>.<field>"` for anonymous unions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Names the struct an object value belongs to.
pub trait Discriminator: fmt::Debug + Send + Sync {
    /// A JavaScript expression that evaluates to the entity name.
    ///
    /// `data` is the expression holding the value being classified.
    fn expression(&self, data: &str) -> String;

    /// Classify a runtime value. `None` means the value cannot be classified.
    fn classify(&self, value: &Value) -> Option<String>;
}

/// Discriminators that can be written in a configuration file.
///
/// ```toml
/// [discriminators]
/// PlanetOrStar = { field = "size", present = "Star", absent = "Planet" }
/// "Event.payload" = { tag = "kind" }
/// "Legacy.data" = "({data}).isStar ? 'Star' : 'Planet'"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiscriminatorSpec {
    /// Pick `present` when the object has `field`, `absent` otherwise.
    Presence {
        field: String,
        present: String,
        absent: String,
    },

    /// Read the entity name from a string property.
    Tag { tag: String },

    /// A raw expression template; `{data}` is replaced by the value expression.
    ///
    /// Templates only exist in generated code, so the runtime translator
    /// cannot classify with them.
    Template(String),
}

pub(crate) fn js_string(value: &str) -> String {
    Value::from(value).to_string()
}

impl Discriminator for DiscriminatorSpec {
    fn expression(&self, data: &str) -> String {
        match self {
            DiscriminatorSpec::Presence {
                field,
                present,
                absent,
            } => format!(
                "({data})[{}] !== undefined ? {} : {}",
                js_string(field),
                js_string(present),
                js_string(absent)
            ),
            DiscriminatorSpec::Tag { tag } => format!("({data})[{}]", js_string(tag)),
            DiscriminatorSpec::Template(template) => template.replace("{data}", data),
        }
    }

    fn classify(&self, value: &Value) -> Option<String> {
        match self {
            DiscriminatorSpec::Presence {
                field,
                present,
                absent,
            } => {
                let object = value.as_object()?;
                Some(if object.contains_key(field) {
                    present.clone()
                } else {
                    absent.clone()
                })
            }
            DiscriminatorSpec::Tag { tag } => value.get(tag)?.as_str().map(str::to_string),
            DiscriminatorSpec::Template(_) => None,
        }
    }
}
