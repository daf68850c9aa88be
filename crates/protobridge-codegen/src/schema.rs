//! Proto3 schema text emission.

use crate::discriminator::js_string;
use crate::registry::{
    Definition, EnumDef, FieldKind, NULL_SENTINEL, Registry, StructDef, UnionDef,
};
use crate::writer::CodeWriter;

/// Render every definition in `registry` in emission order.
///
/// The output always starts with the `proto3` syntax line followed by the
/// null sentinel enum.
pub fn emit_schema(registry: &Registry) -> String {
    let mut w = CodeWriter::new();
    w.line("syntax = \"proto3\";");
    w.line("");
    w.block(format!("enum {NULL_SENTINEL}"), |w| {
        w.line("NullSubstitution_0 = 0;");
    });

    for def in registry.emitted() {
        w.line("");
        match def {
            Definition::Struct(def) => write_struct(&mut w, def),
            Definition::Enum(def) => write_enum(&mut w, def),
            Definition::Union(def) => write_union(&mut w, def),
        }
    }

    w.finish()
}

fn write_struct(w: &mut CodeWriter, def: &StructDef) {
    w.block(format!("message {}", def.name), |w| {
        for field in &def.fields {
            match (&field.kind, field.kind.proto_type()) {
                (FieldKind::Constant(value), _) => w.line(format!(
                    "reserved {}; // {} = {}",
                    field.number,
                    field.original_name,
                    js_string(value)
                )),
                (_, Some(ty)) => w.line(format!(
                    "{}{ty} {} = {};",
                    field.rule.keyword(),
                    field.escaped_name,
                    field.number
                )),
                (_, None) => {}
            }
        }
    });
}

fn write_enum(w: &mut CodeWriter, def: &EnumDef) {
    w.block(format!("enum {}", def.name), |w| {
        for entry in &def.entries {
            w.line(format!("{} = {};", entry.wire_name, entry.ordinal));
        }
    });
}

fn write_union(w: &mut CodeWriter, def: &UnionDef) {
    w.block(format!("message {}", def.name), |w| {
        w.block("oneof options", |w| {
            for member in &def.members {
                w.line(format!(
                    "{} option{} = {};",
                    member.wire.proto_type(),
                    member.option,
                    member.option + 1
                ));
            }
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::config::Config;
    use crate::graph::TypeGraph;
    use crate::types::TypeNode;

    #[test]
    fn test_empty_schema_has_sentinel() {
        let registry = Registry::new(&TypeGraph::new());
        assert_eq!(
            emit_schema(&registry),
            "syntax = \"proto3\";\n\nenum SpecialNullSubstitute {\n  NullSubstitution_0 = 0;\n}\n"
        );
    }

    #[test]
    fn test_star_schema() {
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
                    ("kind", TypeNode::literal("Constant")),
                    ("no_value", TypeNode::optional(TypeNode::null())),
                ],
            );
        let schema = compile(&graph, &Config::new()).unwrap().schema;

        let expected = r#"syntax = "proto3";

enum SpecialNullSubstitute {
  NullSubstitution_0 = 0;
}

message Star {
  Union_1_Star_size size = 1;
  Status status = 2;
  repeated Star children = 3;
  reserved 4; // kind = "Constant"
  optional SpecialNullSubstitute novalue = 5;
}

message Union_1_Star_size {
  oneof options {
    float option1 = 2;
    Star option2 = 3;
  }
}

enum Status {
  STATUS_RUNNING = 0;
  STATUS_PAUSED = 1;
}
"#;
        assert_eq!(schema, expected);
    }

    #[test]
    fn test_literal_enum_with_unset() {
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
        let schema = compile(&graph, &Config::new()).unwrap().schema;
        assert!(schema.contains("  optional Literal_Planet_mood mood = 1;\n"));
        assert!(schema.contains(
            "enum Literal_Planet_mood {\n  Literal_Planet_mood_UNSET = 0;\n  Literal_Planet_mood_1 = 1;\n  Literal_Planet_mood_2 = 2;\n}\n"
        ));
    }
}
