//! Parse → edit → write behaviour over whole manifest files.

use zonpin_schema::{
    parse, parse_manifest_str, write, Document, Node, NodeId, PackageHash, ParseError,
};

const MACH: &str = r#".{
    .name = "mach",
    .version = "0.2.0",
    .dependencies = .{
        .mach_ecs = .{
            .url = "https://example.org/mach-ecs/archive/abc123.tar.gz",
            .hash = "1220aaaa...",
        },
    },
}"#;

/// Flatten a document into (dotted path, leaf value) pairs in field order.
fn leaves(doc: &Document) -> Vec<(String, String)> {
    fn walk(doc: &Document, id: NodeId, prefix: &str, out: &mut Vec<(String, String)>) {
        for field in doc.fields(id) {
            let path = if prefix.is_empty() {
                field.name.clone()
            } else {
                format!("{prefix}.{}", field.name)
            };
            match doc.node(field.value) {
                Node::Leaf(value) => out.push((path, value.clone())),
                Node::Object(_) => {
                    out.push((path.clone(), String::new()));
                    walk(doc, field.value, &path, out);
                }
            }
        }
    }
    let mut out = Vec::new();
    walk(doc, doc.root(), "", &mut out);
    out
}

#[test]
fn canonical_text_is_reproduced_exactly() {
    let doc = parse(MACH).unwrap();
    assert_eq!(write(&doc, doc.root(), "    ", ""), MACH);
}

#[test]
fn round_trip_preserves_names_order_and_values() {
    let squashed = MACH.replace('\n', " ").replace("    ", "");
    let original = parse(&squashed).unwrap();
    let text = write(&original, original.root(), "\t", "");
    let reparsed = parse(&text).unwrap();
    assert_eq!(leaves(&original), leaves(&reparsed));
    assert_eq!(
        leaves(&reparsed)
            .iter()
            .map(|(p, _)| p.as_str())
            .collect::<Vec<_>>(),
        [
            "name",
            "version",
            "dependencies",
            "dependencies.mach_ecs",
            "dependencies.mach_ecs.url",
            "dependencies.mach_ecs.hash",
        ]
    );
}

#[test]
fn writing_is_idempotent() {
    let inputs = [
        MACH.to_owned(),
        ".{.a=\"1\",.b=.{.c=\"2\"}}".to_owned(),
        ".{ }".to_owned(),
    ];
    for input in inputs {
        let once = parse(&input).unwrap().render();
        let twice = parse(&once).unwrap().render();
        assert_eq!(once, twice, "render not idempotent for {input:?}");
    }
}

#[test]
fn hash_edit_touches_only_the_hash() {
    let mut manifest = parse_manifest_str(MACH).unwrap();
    let hash = PackageHash::from_hex_digest(&"0f".repeat(32)).unwrap();
    manifest.set_dependency_hash("mach_ecs", &hash).unwrap();

    let rendered = manifest.render();
    let expected = format!("{}\n", MACH.replace("1220aaaa...", hash.as_str()));
    assert_eq!(rendered, expected);
    assert!(parse(&rendered).is_ok());
}

#[test]
fn malformed_input_returns_errors() {
    let cases = [
        ".{ .a = \"x\" }}",
        ".{ .a = .{ .b = \"x\" }",
        ".{ .a = .{",
        "}",
        ".{ .a = \"x\", } }",
    ];
    for case in cases {
        let err = parse(case).unwrap_err();
        assert!(
            matches!(
                err,
                ParseError::Syntax(_) | ParseError::UnbalancedScope { .. }
            ),
            "unexpected error for {case:?}: {err:?}"
        );
    }
}
