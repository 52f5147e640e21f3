//! Output followed by a rebuild must not lose or invent content.

use pretty_assertions::assert_eq;

use xml_arbor::{
    build_file, build_str, AdapterKind, DefaultNodeFactory, Format, Namespace, NodeFactory,
    NodeInner, NodeRef, Style, XmlBuilder, XmlContent, XmlOutputter,
};

const SOURCES: [&str; 7] = [
    r#"<a x="1"><b/>text</a>"#,
    "<?xml version=\"1.0\"?>\n<!-- top -->\n<r>\n  <i n=\"1\">one</i>\n  <i n=\"2\"/>\n</r>\n<?after x?>",
    r#"<r xmlns="urn:d" xmlns:p="urn:p"><p:e p:k="&quot;q&quot;" k="&lt;&amp;&gt;"/><f xmlns=""/></r>"#,
    r#"<!DOCTYPE a [<!ENTITY x "y">]><a>&x;<![CDATA[ <raw> & ]]>tail</a>"#,
    "<a>line\r\nbreak&#13;kept</a>",
    "<a v=\"tab&#9;nl&#10;cr&#13;\">\u{e9}\u{20ac}\u{1F600}</a>",
    "<a><b><c><d>deep</d></c></b><e/></a>",
];

fn raw(node: &NodeRef) -> String {
    XmlOutputter::new(Format::raw()).output_to_string(node).unwrap()
}

#[test]
fn test_raw_output_is_idempotent() {
    for src in SOURCES {
        let first = raw(build_str(src).unwrap().node());
        let second = raw(build_str(&first).unwrap().node());
        assert_eq!(second, first, "source {:?}", src);
    }
}

#[test]
fn test_every_adapter_outputs_the_same_bytes() {
    let builder = XmlBuilder::new(DefaultNodeFactory);
    for src in [SOURCES[0], SOURCES[1], SOURCES[2], SOURCES[6]] {
        let expected = raw(builder.build_str_with(AdapterKind::Push, src).unwrap().node());
        for kind in AdapterKind::ALL {
            let doc = builder.build_str_with(kind, src).unwrap();
            assert_eq!(raw(doc.node()), expected, "{} on {:?}", kind, src);
        }
    }
}

#[test]
fn test_rebuilt_tree_is_structurally_equal() {
    for src in SOURCES {
        let doc = build_str(src).unwrap();
        let rebuilt = build_str(&raw(doc.node())).unwrap();
        assert!(rebuilt.structurally_equal(&doc), "source {:?}", src);
    }
}

#[test]
fn test_escaped_text_survives_rebuild() {
    let f = DefaultNodeFactory;
    let samples = ["a<b", "x & y", "say \"hi\"", "]]>", "&amp; literal", "<\"&\">", " \r\n "];
    for sample in samples {
        let element = f.element("t", Namespace::none()).unwrap();
        f.add_content(&element, f.text(sample).unwrap()).unwrap();
        let attr = f
            .attribute("v", Namespace::none(), sample, Default::default())
            .unwrap();
        f.add_attribute(&element, attr).unwrap();

        let rebuilt = build_str(&raw(&element)).unwrap().root_element().unwrap();
        assert_eq!(NodeInner::text_content(&rebuilt), sample);
        let rebuilt = rebuilt.borrow();
        assert_eq!(rebuilt.as_element().unwrap().attribute_value("v"), Some(sample));
    }
}

#[test]
fn test_doctype_internal_subset_is_verbatim() {
    let src = r#"<!DOCTYPE a [<!ENTITY x "y">]><a/>"#;
    let doc = build_str(src).unwrap();
    let subset = doc.doc_type().unwrap().internal_subset().map(str::to_string);
    assert_eq!(subset.as_deref(), Some(r#"<!ENTITY x "y">"#));

    let out = raw(doc.node());
    let again = build_str(&out).unwrap();
    assert_eq!(again.doc_type(), doc.doc_type());
    assert_eq!(raw(again.node()), out);
}

#[test]
fn test_mixed_content_pretty_equals_raw() {
    let pretty = XmlOutputter::new(Format::pretty());
    for src in [
        r#"<a x="1"><b/>text</a>"#,
        "<p>Some <em>emphasis</em> and <b><i>nesting</i></b>.</p>",
        "<p>\n  lead <br/>\n</p>",
    ] {
        let root = build_str(src).unwrap().root_element().unwrap();
        assert_eq!(pretty.output_to_string(&root).unwrap(), raw(&root), "{:?}", src);
    }
}

#[test]
fn test_pretty_output_rebuilds_to_same_elements() {
    let src = "<r><a><b/></a><c>text</c><d>mixed<e/></d></r>";
    let doc = build_str(src).unwrap();
    let pretty = XmlOutputter::new(Format::pretty())
        .document_to_string(&doc)
        .unwrap();
    let reread = XmlBuilder::with_options(
        DefaultNodeFactory,
        xml_arbor::BuildOptions::default().with_ignore_boundary_whitespace(true),
    )
    .build_str_with(AdapterKind::Push, &pretty)
    .unwrap();
    assert!(reread.structurally_equal(&doc));
    assert_eq!(
        pretty,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<r>\n  <a>\n    <b/>\n  </a>\n  <c>text</c>\n  <d>mixed<e/></d>\n</r>\n"
    );
}

#[test]
fn test_compact_then_raw_is_stable() {
    let src = "<r>\n  <a>  spaced   out  </a>\n  <b/>\n</r>";
    let compact = XmlOutputter::new(Format::compact().with_omit_declaration(true));
    let once = compact.document_to_string(&build_str(src).unwrap()).unwrap();
    assert_eq!(once, "<r><a> spaced out </a><b/></r>\n");
    let twice = compact.document_to_string(&build_str(&once).unwrap()).unwrap();
    assert_eq!(twice, once);
}

#[test]
fn test_encoded_output_rebuilds() {
    let src = "<a t=\"\u{e9}\">caf\u{e9} \u{20ac}</a>";
    let doc = build_str(src).unwrap();
    for encoding in ["US-ASCII", "ISO-8859-1"] {
        let format = Format::raw().with_encoding(encoding).with_style(Style::Raw);
        let mut bytes = Vec::new();
        XmlOutputter::new(format).output_document(&doc, &mut bytes).unwrap();
        assert!(bytes.iter().all(|&b| encoding != "US-ASCII" || b.is_ascii()));

        // Latin-1 bytes above 0x7F are not UTF-8; widen them for the rebuild.
        let text: String = bytes.iter().map(|&b| b as char).collect();
        let text = text.replacen(encoding, "UTF-8", 1);
        let rebuilt = build_str(&text).unwrap();
        assert!(rebuilt.structurally_equal(&doc), "{}", encoding);
    }
}

#[test]
fn test_build_file_sets_base_uri() {
    let path = std::env::temp_dir().join(format!("arbor-round-trip-{}.xml", std::process::id()));
    std::fs::write(&path, SOURCES[1]).unwrap();

    let doc = build_file(&path).unwrap();
    assert_eq!(doc.base_uri(), Some(path.display().to_string()));
    let root = doc.root_element().unwrap();
    assert_eq!(NodeInner::child_elements(&root).len(), 2);

    let foreign = XmlBuilder::new(DefaultNodeFactory)
        .build_file_with(AdapterKind::ForeignTree, &path)
        .unwrap();
    assert!(foreign.structurally_equal(&doc));
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_deep_clone_is_independent() {
    let doc = build_str(SOURCES[2]).unwrap();
    let copy = doc.deep_clone();
    assert!(copy.structurally_equal(&doc));

    let root = copy.root_element().unwrap();
    let f = DefaultNodeFactory;
    f.add_content(&root, f.comment("added").unwrap()).unwrap();
    assert!(!copy.structurally_equal(&doc));
    assert!(matches!(
        root.borrow().children().last().unwrap().borrow().content(),
        XmlContent::Comment(_)
    ));
}
