//! Compilation configuration.

use crate::discriminator::{Discriminator, DiscriminatorSpec};
use indexmap::IndexMap;
use serde::Deserialize;
use std::sync::Arc;

/// How a `number` is represented on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberWidth {
    Int32,
    #[default]
    Float,
}

/// Number encoding: a default plus per-field overrides keyed `"<Struct>.<field>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NumberEncoding {
    pub default: NumberWidth,
    pub overrides: IndexMap<String, NumberWidth>,
}

/// The JavaScript protobuf runtime the generated wrappers call into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodecModule {
    #[default]
    Protobufjs,
    ProtocolBuffers,
}

/// Configuration for one compilation.
///
/// Every key is optional; an empty configuration compiles every string-valued
/// enum and every struct with `float` numbers and `protobufjs` wrappers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Explicit root types. When absent, the roots are every string-valued
    /// enum followed by every struct.
    pub types: Option<Vec<String>>,

    /// Discriminators keyed by union alias name or `"<Struct>.<field>"`.
    #[serde(alias = "union_interface_name_getter")]
    pub discriminators: IndexMap<String, DiscriminatorSpec>,

    pub number_encoding: NumberEncoding,

    pub encoding_module: CodecModule,

    pub decoding_module: CodecModule,

    /// Discriminators registered in code. These shadow `discriminators`.
    #[serde(skip)]
    custom_discriminators: IndexMap<String, Arc<dyn Discriminator>>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_types(mut self, types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_discriminator_spec(mut self, key: impl Into<String>, spec: DiscriminatorSpec) -> Self {
        self.discriminators.insert(key.into(), spec);
        self
    }

    /// Register a discriminator implemented in code.
    pub fn with_discriminator(
        mut self,
        key: impl Into<String>,
        discriminator: impl Discriminator + 'static,
    ) -> Self {
        self.custom_discriminators
            .insert(key.into(), Arc::new(discriminator));
        self
    }

    pub fn with_number_default(mut self, width: NumberWidth) -> Self {
        self.number_encoding.default = width;
        self
    }

    pub fn with_number_override(mut self, key: impl Into<String>, width: NumberWidth) -> Self {
        self.number_encoding.overrides.insert(key.into(), width);
        self
    }

    pub fn with_codec(mut self, encoding: CodecModule, decoding: CodecModule) -> Self {
        self.encoding_module = encoding;
        self.decoding_module = decoding;
        self
    }

    /// Look up the discriminator registered under `key`.
    pub fn discriminator(&self, key: &str) -> Option<Arc<dyn Discriminator>> {
        if let Some(custom) = self.custom_discriminators.get(key) {
            return Some(Arc::clone(custom));
        }
        self.discriminators
            .get(key)
            .map(|spec| Arc::new(spec.clone()) as Arc<dyn Discriminator>)
    }

    /// All configured discriminator keys, code-registered first.
    pub fn discriminator_keys(&self) -> impl Iterator<Item = &str> {
        self.custom_discriminators
            .keys()
            .chain(
                self.discriminators
                    .keys()
                    .filter(|k| !self.custom_discriminators.contains_key(*k)),
            )
            .map(String::as_str)
    }

    /// The number width of `owner.field`.
    pub fn number_width(&self, owner: &str, field: &str) -> NumberWidth {
        self.number_encoding
            .overrides
            .get(&format!("{owner}.{field}"))
            .copied()
            .unwrap_or(self.number_encoding.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert!(config.types.is_none());
        assert_eq!(config.number_width("Star", "size"), NumberWidth::Float);
        assert_eq!(config.encoding_module, CodecModule::Protobufjs);
        assert!(config.discriminator("PlanetOrStar").is_none());
    }

    #[test]
    fn test_deserialize_full() {
        let config: Config = serde_json::from_value(json!({
            "types": ["SolarSystem"],
            "union_interface_name_getter": {
                "PlanetOrStar": { "field": "size", "present": "Star", "absent": "Planet" }
            },
            "number_encoding": {
                "default": "int32",
                "overrides": { "Star.size": "float" }
            },
            "encoding_module": "protocol-buffers"
        }))
        .unwrap();

        assert_eq!(config.types, Some(vec!["SolarSystem".to_string()]));
        assert!(config.discriminator("PlanetOrStar").is_some());
        assert_eq!(config.number_width("Star", "size"), NumberWidth::Float);
        assert_eq!(config.number_width("Planet", "population"), NumberWidth::Int32);
        assert_eq!(config.encoding_module, CodecModule::ProtocolBuffers);
        assert_eq!(config.decoding_module, CodecModule::Protobufjs);
    }

    #[test]
    fn test_deserialize_toml() {
        let config: Config = toml::from_str(
            r#"
            [discriminators]
            PlanetOrStar = { field = "size", present = "Star", absent = "Planet" }
            "Event.payload" = { tag = "kind" }
            "Legacy.data" = "({data}).isStar ? 'Star' : 'Planet'"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.discriminators.get("Event.payload"),
            Some(&DiscriminatorSpec::Tag {
                tag: "kind".to_string()
            })
        );
        assert_eq!(
            config
                .discriminator("Legacy.data")
                .map(|d| d.expression("value")),
            Some("(value).isStar ? 'Star' : 'Planet'".to_string())
        );
        assert_eq!(config.number_encoding, NumberEncoding::default());
    }

    #[derive(Debug)]
    struct AlwaysStar;

    impl Discriminator for AlwaysStar {
        fn expression(&self, _data: &str) -> String {
            "\"Star\"".to_string()
        }

        fn classify(&self, _value: &Value) -> Option<String> {
            Some("Star".to_string())
        }
    }

    #[test]
    fn test_custom_discriminator_shadows_spec() {
        let config = Config::new()
            .with_discriminator_spec("U", DiscriminatorSpec::Tag { tag: "kind".to_string() })
            .with_discriminator("U", AlwaysStar);
        let found = config.discriminator("U").unwrap();
        assert_eq!(found.classify(&json!({})), Some("Star".to_string()));
        assert_eq!(config.discriminator_keys().collect::<Vec<_>>(), vec!["U"]);
    }
}
