//! TypeScript translator module rendering.
//!
//! The generated module embeds the schema, builds the codec from it, and
//! exports one `<Name>ToWire`/`<Name>FromWire` pair per entity plus
//! `encode<Name>`/`decode<Name>` for every message. Lookup tables are written
//! as JSON data (`new Map([...])` and arrays) rather than as code.

use crate::classify::VariantTag;
use crate::config::CodecModule;
use crate::discriminator::js_string;
use crate::error::Result;
use crate::normalize::FieldRule;
use crate::plan::{
    Conversion, Discrimination, EnumTranslator, FieldPlan, StructTranslator, Translator,
    TranslatorSet, UnionTranslator,
};
use crate::types::ScalarKind;
use crate::writer::CodeWriter;

pub(crate) const DEFAULT_HEADER: &str = "Auto-generated by protobridge-codegen\nDO NOT EDIT MANUALLY";

/// Rendering options for the translator module.
#[derive(Debug, Clone)]
pub struct RenderOptions<'a> {
    pub header: &'a str,
    pub typescript: bool,
    pub encoding: CodecModule,
    pub decoding: CodecModule,
}

impl Default for RenderOptions<'_> {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER,
            typescript: true,
            encoding: CodecModule::default(),
            decoding: CodecModule::default(),
        }
    }
}

/// Render the translator module for `translators` and `schema`.
pub fn render_module(
    schema: &str,
    translators: &TranslatorSet,
    options: &RenderOptions<'_>,
) -> Result<String> {
    let renderer = Renderer { options };
    let mut w = CodeWriter::new();

    renderer.header(&mut w);
    renderer.imports(&mut w);
    w.line("");
    w.line(format!("export const SCHEMA = {};", js_string(schema)));
    w.line("");
    renderer.codec_setup(&mut w);

    w.line("");
    for translator in translators.iter() {
        renderer.tables(&mut w, translator)?;
    }

    for translator in translators.iter() {
        w.line("");
        match translator {
            Translator::Struct(plan) => renderer.struct_functions(&mut w, plan),
            Translator::Enum(plan) => renderer.enum_functions(&mut w, plan),
            Translator::Union(plan) => renderer.union_functions(&mut w, plan),
        }
    }

    for translator in translators.iter() {
        if matches!(translator, Translator::Struct(_) | Translator::Union(_)) {
            w.line("");
            renderer.codec_functions(&mut w, translator.name());
        }
    }

    Ok(w.finish())
}

struct Renderer<'o, 'a> {
    options: &'o RenderOptions<'a>,
}

fn field(name: &str) -> String {
    format!("object[{}]", js_string(name))
}

impl Renderer<'_, '_> {
    /// A type annotation, or nothing for plain JavaScript.
    fn ty(&self, ty: &str) -> String {
        if self.options.typescript {
            format!(": {ty}")
        } else {
            String::new()
        }
    }

    fn generics(&self, params: &str) -> String {
        if self.options.typescript {
            format!("<{params}>")
        } else {
            String::new()
        }
    }

    fn header(&self, w: &mut CodeWriter) {
        w.line("/**");
        for line in self.options.header.lines() {
            if line.is_empty() {
                w.line(" *");
            } else {
                w.line(format!(" * {line}"));
            }
        }
        w.line(" */");
        w.line("");
    }

    fn modules(&self) -> Vec<CodecModule> {
        let mut modules = vec![self.options.encoding];
        if self.options.decoding != self.options.encoding {
            modules.push(self.options.decoding);
        }
        modules
    }

    fn imports(&self, w: &mut CodeWriter) {
        for module in self.modules() {
            match module {
                CodecModule::Protobufjs => w.line("import * as protobuf from 'protobufjs';"),
                CodecModule::ProtocolBuffers => {
                    w.line("import protocolBuffers from 'protocol-buffers';")
                }
            }
        }
    }

    fn codec_setup(&self, w: &mut CodeWriter) {
        for module in self.modules() {
            match module {
                CodecModule::Protobufjs => {
                    w.line("const root = protobuf.parse(SCHEMA, { keepCase: true }).root;")
                }
                CodecModule::ProtocolBuffers => w.line("const messages = protocolBuffers(SCHEMA);"),
            }
        }
    }

    fn tables(&self, w: &mut CodeWriter, translator: &Translator) -> Result<()> {
        match translator {
            Translator::Enum(plan) => {
                w.line(format!(
                    "const {}_toWire = new Map{}({});",
                    plan.name,
                    self.generics("any, number"),
                    serde_json::to_string(&plan.table)?
                ));
                let values = plan
                    .by_ordinal()
                    .into_iter()
                    .map(|value| match value {
                        Some(value) => serde_json::to_string(value),
                        None => Ok("undefined".to_string()),
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                w.line(format!(
                    "const {}_fromWire{} = [{}];",
                    plan.name,
                    self.ty("any[]"),
                    values.join(", ")
                ));
            }
            Translator::Union(plan) => {
                w.line(format!(
                    "const {}_options = new Map{}({});",
                    plan.name,
                    self.generics("string, string"),
                    serde_json::to_string(&plan.option_table())?
                ));
            }
            Translator::Struct(_) => {}
        }
        Ok(())
    }

    // ── Structs ────────────────────────────────────────────────────────────

    fn struct_functions(&self, w: &mut CodeWriter, plan: &StructTranslator) {
        let any = self.ty("any");

        w.block(
            format!("export function {}ToWire(object{any}){any}", plan.name),
            |w| {
                let fields: Vec<_> = plan.fields.iter().filter(|f| !f.is_passthrough()).collect();
                if fields.iter().any(|f| !matches!(f.conversion, Conversion::Constant(_))) {
                    w.line(format!("let value{any};"));
                }
                for field in fields {
                    w.line("");
                    self.field_to_wire(w, field);
                }
                w.line("");
                w.line("return object;");
            },
        );

        w.line("");

        w.block(
            format!("export function {}FromWire(object{any}){any}", plan.name),
            |w| {
                let fields: Vec<_> = plan.fields.iter().filter(|f| !f.is_passthrough()).collect();
                if fields.iter().any(|f| !matches!(f.conversion, Conversion::Constant(_))) {
                    w.line(format!("let value{any};"));
                }
                for field in fields {
                    w.line("");
                    self.field_from_wire(w, field);
                }
                w.line("");
                w.line("return object;");
            },
        );
    }

    fn take(&self, w: &mut CodeWriter, name: &str) {
        w.line(format!("value = {};", field(name)));
        w.line(format!("delete {};", field(name)));
    }

    fn field_to_wire(&self, w: &mut CodeWriter, plan: &FieldPlan) {
        if let Conversion::Constant(_) = plan.conversion {
            w.line(format!("delete {};", field(&plan.original)));
            return;
        }

        self.take(w, &plan.original);
        let converted = if plan.rule == FieldRule::Repeated {
            self.map_items(&plan.conversion, "value", "ToWire")
        } else {
            convert_expr(&plan.conversion, "value", "ToWire")
        };
        w.block("if (value !== undefined)", |w| {
            w.line(format!("{} = {converted};", field(&plan.wire)));
        });
    }

    fn field_from_wire(&self, w: &mut CodeWriter, plan: &FieldPlan) {
        if let Conversion::Constant(value) = &plan.conversion {
            w.line(format!("{} = {};", field(&plan.original), js_string(value)));
            return;
        }

        self.take(w, &plan.wire);
        let target = field(&plan.original);

        if plan.rule == FieldRule::Repeated {
            let items = self.map_items(&plan.conversion, "(value ?? [])", "FromWire");
            w.line(format!("{target} = {items};"));
            return;
        }

        let converted = convert_expr(&plan.conversion, "value", "FromWire");
        let defaults = plan.rule == FieldRule::Required
            && matches!(
                plan.conversion,
                Conversion::Enum(_) | Conversion::LiteralEnum(_) | Conversion::Null
            );
        if defaults {
            w.line(format!("{target} = {converted};"));
        } else {
            w.block("if (value != null)", |w| {
                w.line(format!("{target} = {converted};"));
            });
        }
    }

    fn map_items(&self, conversion: &Conversion, source: &str, direction: &str) -> String {
        match conversion {
            Conversion::Identity => source.to_string(),
            _ => format!(
                "{source}.map((item{}) => {})",
                self.ty("any"),
                convert_expr(conversion, "item", direction)
            ),
        }
    }

    // ── Enums ──────────────────────────────────────────────────────────────

    fn enum_functions(&self, w: &mut CodeWriter, plan: &EnumTranslator) {
        let name = &plan.name;
        w.block(
            format!(
                "export function {name}ToWire(value{}){}",
                self.ty("any"),
                self.ty("number")
            ),
            |w| {
                w.line(format!("const ordinal = {name}_toWire.get(value);"));
                w.block("if (ordinal === undefined)", |w| {
                    w.line(format!(
                        "throw new Error({} + JSON.stringify(value));",
                        js_string(&format!("{name}: unknown value "))
                    ));
                });
                w.line("return ordinal;");
            },
        );
        w.line("");
        w.block(
            format!(
                "export function {name}FromWire(ordinal{}){}",
                self.ty("any"),
                self.ty("any")
            ),
            |w| {
                w.line(format!("return {name}_fromWire[ordinal ?? 0];"));
            },
        );
    }

    // ── Unions ─────────────────────────────────────────────────────────────

    fn union_functions(&self, w: &mut CodeWriter, plan: &UnionTranslator) {
        let name = &plan.name;
        let any = self.ty("any");

        let entity_tag = match &plan.discrimination {
            Discrimination::None => js_string("object"),
            Discrimination::Single(entity) => js_string(entity),
            Discrimination::Resolver { discriminator, .. } => {
                format!("({})", discriminator.expression("value"))
            }
        };

        w.block(format!("export function {name}ToWire(value{any}){any}"), |w| {
            w.line(format!(
                "const tag = value === null ? \"null\" : typeof value === \"object\" ? {entity_tag} : typeof value;"
            ));
            w.line(format!("const option = {name}_options.get(tag);"));
            w.block("if (option === undefined)", |w| {
                w.line(format!(
                    "throw new Error({} + tag);",
                    js_string(&format!("{name}: no variant for "))
                ));
            });
            for option in &plan.options {
                match &option.tag {
                    VariantTag::Scalar(ScalarKind::Null) => {
                        w.block("if (tag === \"null\")", |w| {
                            w.line("return { [option]: 0 };");
                        });
                    }
                    VariantTag::Entity(entity) => {
                        w.block(format!("if (tag === {})", js_string(entity)), |w| {
                            w.line(format!("return {{ [option]: {entity}ToWire(value) }};"));
                        });
                    }
                    VariantTag::Scalar(_) => {}
                }
            }
            w.line("return { [option]: value };");
        });

        w.line("");

        w.block(format!("export function {name}FromWire(wire{any}){any}"), |w| {
            w.block("if (wire == null)", |w| w.line("return undefined;"));
            for option in &plan.options {
                let payload = format!("wire.{}", option.key());
                w.block(format!("if ({payload} != null)"), |w| {
                    if plan.null_option == Some(option.option) {
                        w.line("return null;");
                    } else if let Some(entity) = option.entity() {
                        w.line(format!("return {entity}FromWire({payload});"));
                    } else {
                        w.line(format!("return {payload};"));
                    }
                });
            }
            w.line("return undefined;");
        });
    }

    // ── Codec wrappers ─────────────────────────────────────────────────────

    fn codec_functions(&self, w: &mut CodeWriter, name: &str) {
        let any = self.ty("any");
        let bytes = self.ty("Uint8Array");

        w.block(
            format!("export function encode{name}(object{any}){bytes}"),
            |w| match self.options.encoding {
                CodecModule::Protobufjs => {
                    w.line(format!("const Message = root.lookupType({});", js_string(name)));
                    w.line(format!(
                        "return Message.encode(Message.fromObject({name}ToWire(object))).finish();"
                    ));
                }
                CodecModule::ProtocolBuffers => {
                    w.line(format!("return messages.{name}.encode({name}ToWire(object));"));
                }
            },
        );

        w.line("");

        w.block(
            format!("export function decode{name}(bytes{bytes}){any}"),
            |w| match self.options.decoding {
                CodecModule::Protobufjs => {
                    w.line(format!("const Message = root.lookupType({});", js_string(name)));
                    w.line(format!(
                        "return {name}FromWire(Message.toObject(Message.decode(bytes), {{ arrays: true }}));"
                    ));
                }
                CodecModule::ProtocolBuffers => {
                    w.line(format!("return {name}FromWire(messages.{name}.decode(bytes));"));
                }
            },
        );
    }
}

/// The expression converting `expr` in `direction` (`ToWire` or `FromWire`).
fn convert_expr(conversion: &Conversion, expr: &str, direction: &str) -> String {
    match conversion {
        Conversion::Identity => expr.to_string(),
        Conversion::Null if direction == "ToWire" => "0".to_string(),
        Conversion::Null => "null".to_string(),
        Conversion::Constant(value) => js_string(value),
        Conversion::Message(name)
        | Conversion::Enum(name)
        | Conversion::Union(name)
        | Conversion::LiteralEnum(name) => format!("{name}{direction}({expr})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::config::Config;
    use crate::discriminator::DiscriminatorSpec;
    use crate::graph::TypeGraph;
    use crate::types::TypeNode;

    fn render(graph: &TypeGraph, config: &Config, options: &RenderOptions<'_>) -> String {
        let compilation = compile(graph, config).unwrap();
        render_module(&compilation.schema, &compilation.translators, options).unwrap()
    }

    fn star_graph() -> TypeGraph {
        let mut graph = TypeGraph::new();
        graph
            .add_enum("Status", &["Running", "Paused"])
            .add_struct(
                "Star",
                &[
                    (
                        "size",
                        TypeNode::union([TypeNode::number(), TypeNode::named("Star")]),
                    ),
                    ("status", TypeNode::named("Status")),
                    ("children", TypeNode::array(TypeNode::named("Star"))),
                    ("no_value", TypeNode::optional(TypeNode::null())),
                ],
            );
        graph
    }

    #[test]
    fn test_module_preamble() {
        let code = render(&star_graph(), &Config::new(), &RenderOptions::default());
        assert!(code.starts_with(
            "/**\n * Auto-generated by protobridge-codegen\n * DO NOT EDIT MANUALLY\n */\n\nimport * as protobuf from 'protobufjs';\n"
        ));
        assert!(code.contains("export const SCHEMA = \"syntax = \\\"proto3\\\";\\n"));
        assert!(code.contains("const root = protobuf.parse(SCHEMA, { keepCase: true }).root;"));
    }

    #[test]
    fn test_lookup_tables() {
        let code = render(&star_graph(), &Config::new(), &RenderOptions::default());
        assert!(code.contains("const Status_toWire = new Map<any, number>([[0,0],[1,1]]);"));
        assert!(code.contains("const Status_fromWire: any[] = [0, 1];"));
        assert!(code.contains(
            r#"const Union_1_Star_size_options = new Map<string, string>([["number","option1"],["Star","option2"]]);"#
        ));
    }

    #[test]
    fn test_struct_functions() {
        let code = render(&star_graph(), &Config::new(), &RenderOptions::default());
        assert!(code.contains("export function StarToWire(object: any): any {"));
        assert!(code.contains("    object[\"size\"] = Union_1_Star_sizeToWire(value);"));
        assert!(code.contains(
            "    object[\"children\"] = value.map((item: any) => StarToWire(item));"
        ));
        assert!(code.contains("    object[\"novalue\"] = 0;"));
        assert!(code.contains("  object[\"status\"] = StatusFromWire(value);"));
        assert!(code.contains(
            "  object[\"children\"] = (value ?? []).map((item: any) => StarFromWire(item));"
        ));
        assert!(code.contains("    object[\"no_value\"] = null;"));
    }

    #[test]
    fn test_repeated_null_items() {
        let mut graph = TypeGraph::new();
        graph.add_struct("Gaps", &[("items", TypeNode::array(TypeNode::null()))]);
        let code = render(&graph, &Config::new(), &RenderOptions::default());
        assert!(code.contains("    object[\"items\"] = value.map((item: any) => 0);"));
        assert!(code.contains("  object[\"items\"] = (value ?? []).map((item: any) => null);"));
    }

    #[test]
    fn test_union_functions() {
        let code = render(&star_graph(), &Config::new(), &RenderOptions::default());
        assert!(code.contains(
            r#"  const tag = value === null ? "null" : typeof value === "object" ? "Star" : typeof value;"#
        ));
        assert!(code.contains("    return { [option]: StarToWire(value) };"));
        assert!(code.contains("  if (wire.option2 != null) {\n    return StarFromWire(wire.option2);\n  }"));
    }

    #[test]
    fn test_resolver_expression() {
        let mut graph = TypeGraph::new();
        graph
            .add_struct("Star", &[("size", TypeNode::number())])
            .add_struct("Planet", &[("population", TypeNode::number())])
            .add_alias(
                "PlanetOrStar",
                TypeNode::union([TypeNode::named("Planet"), TypeNode::named("Star")]),
            )
            .add_struct("System", &[("sun", TypeNode::named("PlanetOrStar"))]);
        let config = Config::new().with_discriminator_spec(
            "PlanetOrStar",
            DiscriminatorSpec::Presence {
                field: "size".to_string(),
                present: "Star".to_string(),
                absent: "Planet".to_string(),
            },
        );
        let code = render(&graph, &config, &RenderOptions::default());
        assert!(code.contains(
            r#"typeof value === "object" ? ((value)["size"] !== undefined ? "Star" : "Planet") : typeof value;"#
        ));
        assert!(code.contains("export function encodePlanetOrStar(object: any): Uint8Array {"));
    }

    #[test]
    fn test_plain_javascript() {
        let options = RenderOptions {
            typescript: false,
            ..RenderOptions::default()
        };
        let code = render(&star_graph(), &Config::new(), &options);
        assert!(code.contains("export function StarToWire(object) {"));
        assert!(code.contains("export function decodeStar(bytes) {"));
        assert!(code.contains("const Status_toWire = new Map([[0,0],[1,1]]);"));
        assert!(!code.contains(": any"));
    }

    #[test]
    fn test_protocol_buffers_codec() {
        let options = RenderOptions {
            encoding: CodecModule::ProtocolBuffers,
            ..RenderOptions::default()
        };
        let code = render(&star_graph(), &Config::new(), &options);
        assert!(code.contains("import protocolBuffers from 'protocol-buffers';"));
        assert!(code.contains("import * as protobuf from 'protobufjs';"));
        assert!(code.contains("const messages = protocolBuffers(SCHEMA);"));
        assert!(code.contains("  return messages.Star.encode(StarToWire(object));"));
        assert!(code.contains(
            "  return StarFromWire(Message.toObject(Message.decode(bytes), { arrays: true }));"
        ));
    }

    #[test]
    fn test_custom_header() {
        let options = RenderOptions {
            header: "Solar system bindings\n\nRegenerate with protobridge",
            ..RenderOptions::default()
        };
        let code = render(&star_graph(), &Config::new(), &options);
        assert!(code.starts_with(
            "/**\n * Solar system bindings\n *\n * Regenerate with protobridge\n */\n"
        ));
    }
}
