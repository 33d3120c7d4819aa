use crate::document::{Document, Node, NodeId};

/// Render `node` in canonical form.
///
/// `prefix` is the indentation of the line the node starts on; nested fields
/// are indented by `prefix + indent_unit`. The closing brace of an object is
/// not followed by a newline.
///
/// Leaf values are emitted verbatim between quotes. There is no escaping, so a
/// value containing `"` renders text the parser cannot read back.
pub fn write(doc: &Document, node: NodeId, indent_unit: &str, prefix: &str) -> String {
    let mut out = String::new();
    write_node(&mut out, doc, node, indent_unit, prefix);
    out
}

fn write_node(out: &mut String, doc: &Document, node: NodeId, indent_unit: &str, prefix: &str) {
    match doc.node(node) {
        Node::Leaf(value) => {
            out.push('"');
            out.push_str(value);
            out.push('"');
        }
        Node::Object(fields) => {
            let nested = format!("{prefix}{indent_unit}");
            out.push_str(".{\n");
            for field in fields {
                out.push_str(&nested);
                out.push('.');
                out.push_str(&field.name);
                out.push_str(" = ");
                write_node(out, doc, field.value, indent_unit, &nested);
                out.push_str(",\n");
            }
            out.push_str(prefix);
            out.push('}');
        }
    }
}
