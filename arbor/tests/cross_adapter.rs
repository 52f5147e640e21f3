//! Every adapter must produce the same tree for the same content, whether
//! it arrives as text or in the adapter's own native form.

use pretty_assertions::assert_eq;

use xml_arbor::xml::{EntityReference, NamespaceDeclaration, RawAttribute};
use xml_arbor::{
    AdapterKind, BuildOptions, ContentHandler, CursorAdapter, DefaultNodeFactory, Document,
    Error, EventAdapter, EventKind, ForeignTreeAdapter, NodeInner, PushAdapter, PushSource,
    Result, StructuralErrorKind, XmlBuilder, XmlContent, XmlCursor, XmlEvent,
};

fn builder() -> XmlBuilder<DefaultNodeFactory> {
    XmlBuilder::new(DefaultNodeFactory)
}

fn build_all(kinds: &[AdapterKind], xml: &str) -> Vec<(AdapterKind, Document)> {
    let builder = builder();
    kinds
        .iter()
        .map(|&kind| match builder.build_str_with(kind, xml) {
            Ok(doc) => (kind, doc),
            Err(e) => panic!("{} adapter failed on {:?}: {}", kind, xml, e),
        })
        .collect()
}

fn assert_all_equal(kinds: &[AdapterKind], xml: &str) {
    let docs = build_all(kinds, xml);
    let (first_kind, first) = &docs[0];
    for (kind, doc) in &docs[1..] {
        assert!(
            doc.structurally_equal(first),
            "{} and {} disagree on {:?}",
            first_kind,
            kind,
            xml
        );
    }
}

const STREAMING: [AdapterKind; 3] = [AdapterKind::Push, AdapterKind::Cursor, AdapterKind::Events];

#[test]
fn test_simple_document_shape() {
    for (kind, doc) in build_all(&AdapterKind::ALL, r#"<a x="1"><b/>text</a>"#) {
        let root = doc.root_element().unwrap();
        let root = root.borrow();
        let a = root.as_element().unwrap();
        assert_eq!(a.name(), "a", "{}", kind);
        assert_eq!(a.attributes().len(), 1);
        assert_eq!(a.attribute_value("x"), Some("1"));
        assert_eq!(root.child_count(), 2);

        let b = root.child(0).unwrap().borrow();
        assert!(matches!(b.content(), XmlContent::Element(e) if e.name() == "b"));
        assert_eq!(b.child_count(), 0);
        let text = root.child(1).unwrap().borrow();
        assert!(matches!(text.content(), XmlContent::Text(t) if t.text() == "text"));
    }
}

#[test]
fn test_all_adapters_agree() {
    let inputs = [
        "<a/>",
        "<a>  <b>x</b>\n  <c/>\n</a>",
        r#"<r xmlns="urn:d" xmlns:p="urn:p"><p:e p:k="v" k="w"/><f xmlns=""/></r>"#,
        r#"<r xmlns:p="urn:1"><p:a><p:b xmlns:p="urn:2"/></p:a></r>"#,
        "<!-- lead --><?go now?><a><!-- c --><?t?>x &amp; y &lt; &#x41;</a><!-- tail -->",
        r#"<a xml:lang="en" v="a&#10;b">tab&#9;here</a>"#,
    ];
    for xml in inputs {
        assert_all_equal(&AdapterKind::ALL, xml);
    }
}

#[test]
fn test_streaming_adapters_agree_on_dtd_features() {
    let inputs = [
        r#"<!DOCTYPE a [<!ENTITY x "y">]><a>&x;</a>"#,
        r#"<!DOCTYPE a SYSTEM "a.dtd"><a><![CDATA[<not markup> & ]]></a>"#,
        "<a>before<![CDATA[]]>after</a>",
    ];
    for xml in inputs {
        assert_all_equal(&STREAMING, xml);
    }

    let kept = XmlBuilder::with_options(
        DefaultNodeFactory,
        BuildOptions::default().with_expand_entities(false),
    );
    let xml = r#"<!DOCTYPE a [<!ENTITY x "y">]><a>1&x;2</a>"#;
    let docs: Vec<Document> = STREAMING
        .iter()
        .map(|&k| kept.build_str_with(k, xml).unwrap())
        .collect();
    assert!(docs[0].structurally_equal(&docs[1]));
    assert!(docs[1].structurally_equal(&docs[2]));
}

#[test]
fn test_prefix_kept_when_default_namespace_has_same_uri() {
    let inputs = [
        r#"<p:a xmlns="urn:x" xmlns:p="urn:x"><p:b/><c/></p:a>"#,
        r#"<a xmlns="urn:x" xmlns:p="urn:x" xmlns:q="urn:x" q:k="1"><p:b/></a>"#,
    ];
    for xml in inputs {
        assert_all_equal(&AdapterKind::ALL, xml);
        for (kind, doc) in build_all(&AdapterKind::ALL, xml) {
            let out = xml_arbor::output_to_string(doc.node(), &xml_arbor::Format::raw())
                .unwrap();
            assert!(out.contains("<p:b/>"), "{} wrote {:?}", kind, out);
        }
    }
}

#[test]
fn test_entity_markup_builds_same_elements_everywhere() {
    let xml = r#"<!DOCTYPE a [<!ENTITY e "<b k='v'>x</b>tail">]><a>&e;</a>"#;
    let docs = build_all(&AdapterKind::ALL, xml);
    let (_, first) = &docs[0];
    let expected = first.root_element().unwrap();
    assert_eq!(NodeInner::child_elements(&expected).len(), 1);
    for (kind, doc) in &docs[1..] {
        let root = doc.root_element().unwrap();
        assert!(NodeInner::structurally_equal(&root, &expected), "{} disagrees", kind);
    }
}

#[test]
fn test_namespace_shadowing() {
    let doc = builder()
        .build_str_with(
            AdapterKind::Cursor,
            r#"<p:a xmlns:p="urn:outer"><p:b xmlns:p="urn:inner"/><p:c/></p:a>"#,
        )
        .unwrap();
    let root = doc.root_element().unwrap();
    let children = NodeInner::child_elements(&root);
    let uri = |n: &xml_arbor::NodeRef| n.borrow().as_element().unwrap().namespace_uri().to_string();
    assert_eq!(uri(&root), "urn:outer");
    assert_eq!(uri(&children[0]), "urn:inner");
    assert_eq!(uri(&children[1]), "urn:outer");
}

fn native_events() -> Vec<XmlEvent> {
    vec![
        XmlEvent::StartDocument,
        XmlEvent::StartElement {
            name: "a".into(),
            attributes: vec![RawAttribute::new("x", "1")],
            namespaces: vec![],
        },
        XmlEvent::StartElement {
            name: "b".into(),
            attributes: vec![],
            namespaces: vec![],
        },
        XmlEvent::EndElement { name: "b".into() },
        XmlEvent::Characters("te".into()),
        XmlEvent::Characters("xt".into()),
        XmlEvent::EndElement { name: "a".into() },
        XmlEvent::EndDocument,
    ]
}

#[test]
fn test_native_event_stream_matches_text() {
    let from_text = builder()
        .build_str_with(AdapterKind::Push, r#"<a x="1"><b/>text</a>"#)
        .unwrap();
    let from_events = builder()
        .build(EventAdapter::new(native_events().into_iter().map(Ok)))
        .unwrap();
    assert!(from_events.structurally_equal(&from_text));
}

#[test]
fn test_event_stream_error_aborts_build() {
    let mut events: Vec<Result<XmlEvent>> = native_events().into_iter().map(Ok).collect();
    events.insert(3, Err(Error::parse("source went away", Some(7))));
    let err = builder().build(EventAdapter::new(events)).unwrap_err();
    assert!(matches!(err, Error::Parse { position: Some(7), .. }));
}

/// A push source that reports a fixed document without any parsing.
struct Scripted;

impl PushSource for Scripted {
    fn parse(self, handler: &mut dyn ContentHandler) -> Result<()> {
        handler.start_document()?;
        handler.start_element(
            "q:a",
            &[RawAttribute::new("q:x", "1")],
            &[NamespaceDeclaration::new("q", "urn:q")],
        )?;
        handler.comment("note")?;
        handler.entity_reference(&EntityReference {
            name: "e".into(),
            replacement: Some("expanded".into()),
            public_id: None,
            system_id: None,
        })?;
        handler.end_element("q:a")?;
        handler.end_document()
    }
}

#[test]
fn test_native_push_source_matches_text() {
    let from_push = builder().build(PushAdapter::new(Scripted)).unwrap();
    let from_text = builder()
        .build_str_with(
            AdapterKind::Events,
            r#"<q:a xmlns:q="urn:q" q:x="1"><!--note-->expanded</q:a>"#,
        )
        .unwrap();
    assert!(from_push.structurally_equal(&from_text));
}

/// A cursor over a prepared list of events.
struct ListCursor {
    events: Vec<XmlEvent>,
    index: Option<usize>,
}

impl ListCursor {
    fn new(events: Vec<XmlEvent>) -> Self {
        ListCursor {
            events,
            index: None,
        }
    }

    fn current(&self) -> Option<&XmlEvent> {
        self.events.get(self.index?)
    }
}

impl XmlCursor for ListCursor {
    fn advance(&mut self) -> Result<bool> {
        let next = self.index.map_or(0, |i| i + 1);
        self.index = Some(next);
        Ok(next < self.events.len())
    }

    fn event_kind(&self) -> Option<EventKind> {
        Some(match self.current()? {
            XmlEvent::StartDocument => EventKind::StartDocument,
            XmlEvent::DocType(_) => EventKind::DocType,
            XmlEvent::StartElement { .. } => EventKind::StartElement,
            XmlEvent::EndElement { .. } => EventKind::EndElement,
            XmlEvent::Characters(_) => EventKind::Characters,
            XmlEvent::CData(_) => EventKind::CData,
            XmlEvent::Comment(_) => EventKind::Comment,
            XmlEvent::ProcessingInstruction { .. } => EventKind::ProcessingInstruction,
            XmlEvent::EntityReference(_) => EventKind::EntityReference,
            XmlEvent::EndDocument => EventKind::EndDocument,
        })
    }

    fn name(&self) -> Option<&str> {
        match self.current()? {
            XmlEvent::StartElement { name, .. } | XmlEvent::EndElement { name } => Some(name),
            _ => None,
        }
    }

    fn attributes(&self) -> Option<&[RawAttribute]> {
        match self.current()? {
            XmlEvent::StartElement { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    fn namespaces(&self) -> Option<&[NamespaceDeclaration]> {
        match self.current()? {
            XmlEvent::StartElement { namespaces, .. } => Some(namespaces),
            _ => None,
        }
    }

    fn text(&self) -> Option<&str> {
        match self.current()? {
            XmlEvent::Characters(t) => Some(t),
            _ => None,
        }
    }

    fn pi_target(&self) -> Option<&str> {
        None
    }

    fn public_id(&self) -> Option<&str> {
        None
    }

    fn system_id(&self) -> Option<&str> {
        None
    }

    fn internal_subset(&self) -> Option<&str> {
        None
    }

    fn replacement_text(&self) -> Option<&str> {
        None
    }
}

#[test]
fn test_native_cursor_matches_text() {
    let from_cursor = builder()
        .build(CursorAdapter::new(ListCursor::new(native_events())))
        .unwrap();
    let from_text = builder()
        .build_str_with(AdapterKind::ForeignTree, r#"<a x="1"><b/>text</a>"#)
        .unwrap();
    assert!(from_cursor.structurally_equal(&from_text));
}

#[test]
fn test_rewalking_a_document_reproduces_it() {
    let original = builder()
        .build_str_with(
            AdapterKind::Push,
            r#"<!DOCTYPE r><r xmlns="urn:d"><x xmlns:m="urn:m" m:a="1"><![CDATA[c]]></x><y xmlns=""/></r>"#,
        )
        .unwrap();
    let copy = builder().build(ForeignTreeAdapter::new(&original)).unwrap();
    assert!(copy.structurally_equal(&original));
}

#[test]
fn test_structural_errors_from_every_streaming_adapter() {
    let cases: [(&str, fn(&StructuralErrorKind) -> bool); 3] = [
        (
            r#"<a xmlns:p="urn:x" xmlns:q="urn:x" p:k="1" q:k="2"/>"#,
            |k| matches!(k, StructuralErrorKind::DuplicateAttribute { .. }),
        ),
        ("<a><p:b/></a>", |k| {
            matches!(k, StructuralErrorKind::UnboundPrefix(p) if p == "p")
        }),
        ("<a><!-- a -- b --></a>", |k| {
            matches!(k, StructuralErrorKind::IllegalData { .. })
        }),
    ];
    let builder = builder();
    for (xml, expected) in cases {
        for kind in STREAMING {
            let err = builder.build_str_with(kind, xml).unwrap_err();
            match err.structural_kind() {
                Some(k) => assert!(expected(k), "{} on {:?} gave {}", kind, xml, err),
                None => panic!("{} on {:?} gave non-structural {}", kind, xml, err),
            }
        }
    }
}

#[test]
fn test_malformed_input_is_parse_error_everywhere() {
    let builder = builder();
    for kind in AdapterKind::ALL {
        for xml in ["<a><b></a>", "<a>", "", "<a x=1/>"] {
            let err = builder.build_str_with(kind, xml).unwrap_err();
            let missing_root = matches!(
                err.structural_kind(),
                Some(StructuralErrorKind::MissingRoot)
            );
            assert!(
                matches!(err, Error::Parse { .. }) || missing_root,
                "{} on {:?} gave {}",
                kind,
                xml,
                err
            );
        }
    }
}
