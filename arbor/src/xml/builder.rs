//! Builds documents from any supported source.
//!
//! An adapter turns its source's protocol into [`ContentHandler`] calls; the
//! builder hands every adapter the same freshly created assembler, so the
//! resulting tree does not depend on which adapter produced it.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use super::assembler::TreeAssembler;
use super::cursor::{CursorAdapter, QuickXmlCursor};
use super::events::{EventAdapter, QuickXmlEventReader};
use super::foreign::ForeignTreeAdapter;
use super::sax::{ContentHandler, PushAdapter, QuickXmlPushParser};
use super::{DefaultNodeFactory, NodeFactory};
use crate::error::{Error, Result};
use crate::node::Document;

/// Something a builder can read a document from.
pub trait DocumentSource {
    /// Short adapter name used in log output.
    fn adapter_name(&self) -> &'static str;

    /// Delivers the whole document to `handler`, consuming the source.
    fn drive(self, handler: &mut dyn ContentHandler) -> Result<()>;
}

/// Options controlling how source content maps onto the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Inline the replacement text of internal entities. When false, or when
    /// the replacement is unknown, an `EntityRef` node is kept instead.
    pub expand_entities: bool,
    /// Drop whitespace-only text inside elements.
    pub ignore_boundary_whitespace: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            expand_entities: true,
            ignore_boundary_whitespace: false,
        }
    }
}

impl BuildOptions {
    pub fn with_expand_entities(mut self, expand: bool) -> Self {
        self.expand_entities = expand;
        self
    }

    pub fn with_ignore_boundary_whitespace(mut self, ignore: bool) -> Self {
        self.ignore_boundary_whitespace = ignore;
        self
    }
}

/// The built-in adapters, for callers that pick one at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// Callback-driven quick-xml parser.
    Push,
    /// Cursor over quick-xml.
    Cursor,
    /// Iterator of quick-xml events.
    Events,
    /// Walk of a roxmltree document.
    ForeignTree,
}

impl AdapterKind {
    /// Every built-in adapter.
    pub const ALL: [AdapterKind; 4] = [
        AdapterKind::Push,
        AdapterKind::Cursor,
        AdapterKind::Events,
        AdapterKind::ForeignTree,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AdapterKind::Push => "push",
            AdapterKind::Cursor => "cursor",
            AdapterKind::Events => "events",
            AdapterKind::ForeignTree => "foreign",
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AdapterKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        AdapterKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| format!("unknown adapter '{}'", s))
    }
}

/// Builds documents with a given factory and options.
///
/// A builder holds no per-build state, so one instance can be reused for any
/// number of sequential builds.
///
/// ```
/// use xml_arbor::{AdapterKind, DefaultNodeFactory, XmlBuilder};
///
/// let builder = XmlBuilder::new(DefaultNodeFactory);
/// let a = builder.build_str_with(AdapterKind::Push, "<a x=\"1\"><b/>text</a>").unwrap();
/// let b = builder.build_str_with(AdapterKind::Cursor, "<a x=\"1\"><b/>text</a>").unwrap();
/// assert!(a.structurally_equal(&b));
/// ```
pub struct XmlBuilder<F: NodeFactory> {
    factory: F,
    options: BuildOptions,
}

impl<F: NodeFactory> XmlBuilder<F> {
    /// Creates a builder with default options.
    pub fn new(factory: F) -> Self {
        Self::with_options(factory, BuildOptions::default())
    }

    pub fn with_options(factory: F, options: BuildOptions) -> Self {
        XmlBuilder { factory, options }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn options(&self) -> BuildOptions {
        self.options
    }

    /// Builds a document from `source`.
    pub fn build<S: DocumentSource>(&self, source: S) -> Result<Document> {
        let adapter = source.adapter_name();
        debug!(adapter, "building document");
        let mut assembler = TreeAssembler::new(&self.factory, self.options)?;
        source.drive(&mut assembler)?;
        let nodes = assembler.nodes_created();
        let document = assembler.finish()?;
        debug!(adapter, nodes, "document built");
        Ok(document)
    }

    /// Builds a document from a string with one of the built-in adapters.
    pub fn build_str_with(&self, kind: AdapterKind, xml: &str) -> Result<Document> {
        match kind {
            AdapterKind::Push => self.build(PushAdapter::new(QuickXmlPushParser::from_str(xml))),
            AdapterKind::Cursor => self.build(CursorAdapter::new(QuickXmlCursor::from_str(xml))),
            AdapterKind::Events => {
                self.build(EventAdapter::new(QuickXmlEventReader::from_str(xml)))
            }
            AdapterKind::ForeignTree => {
                let options = roxmltree::ParsingOptions {
                    allow_dtd: true,
                    ..roxmltree::ParsingOptions::default()
                };
                let tree = roxmltree::Document::parse_with_options(xml, options)
                    .map_err(|e| Error::parse(e.to_string(), None))?;
                self.build(ForeignTreeAdapter::new(&tree))
            }
        }
    }

    /// Builds a document from a file with one of the built-in adapters.
    ///
    /// The document's base URI is set to the path.
    pub fn build_file_with<P: AsRef<Path>>(&self, kind: AdapterKind, path: P) -> Result<Document> {
        let path = path.as_ref();
        let document = match kind {
            AdapterKind::Push => {
                self.build(PushAdapter::new(QuickXmlPushParser::from_file(path)?))?
            }
            AdapterKind::Cursor => self.build(CursorAdapter::new(QuickXmlCursor::from_file(path)?))?,
            AdapterKind::Events => {
                self.build(EventAdapter::new(QuickXmlEventReader::from_file(path)?))?
            }
            AdapterKind::ForeignTree => {
                let text = std::fs::read_to_string(path)?;
                self.build_str_with(kind, &text)?
            }
        };
        document.set_base_uri(Some(path.display().to_string()));
        Ok(document)
    }

    /// Builds a document from a file with the push adapter.
    pub fn build_file<P: AsRef<Path>>(&self, path: P) -> Result<Document> {
        self.build_file_with(AdapterKind::Push, path)
    }
}

/// Builds a document from a string with the default factory.
pub fn build_str(xml: &str) -> Result<Document> {
    XmlBuilder::new(DefaultNodeFactory).build_str_with(AdapterKind::Push, xml)
}

/// Builds a document from a file with the default factory.
pub fn build_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    XmlBuilder::new(DefaultNodeFactory).build_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeInner, XmlContent};
    use std::cell::Cell;

    #[test]
    fn test_build_simple_document() {
        let doc = build_str(r#"<root id="foo">text</root>"#).unwrap();
        let root = doc.root_element().unwrap();
        let root = root.borrow();
        let element = root.as_element().unwrap();
        assert_eq!(element.name(), "root");
        assert_eq!(element.attribute_value("id"), Some("foo"));
        assert_eq!(root.child_count(), 1);
    }

    #[test]
    fn test_builder_is_reusable() {
        let builder = XmlBuilder::new(DefaultNodeFactory);
        let first = builder.build_str_with(AdapterKind::Events, "<a/>").unwrap();
        let second = builder.build_str_with(AdapterKind::Events, "<a/>").unwrap();
        assert!(first.structurally_equal(&second));
        assert!(!std::rc::Rc::ptr_eq(first.node(), second.node()));
    }

    #[test]
    fn test_parse_errors_carry_position() {
        let err = build_str("<a><b></a>").unwrap_err();
        match err {
            Error::Parse { position, .. } => assert!(position.is_some()),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_foreign_parse_error() {
        let builder = XmlBuilder::new(DefaultNodeFactory);
        let err = builder
            .build_str_with(AdapterKind::ForeignTree, "<a>")
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    struct CountingFactory {
        elements: Cell<usize>,
        texts: Cell<usize>,
    }

    impl NodeFactory for CountingFactory {
        fn element(
            &self,
            name: &str,
            namespace: crate::node::Namespace,
        ) -> Result<crate::node::NodeRef> {
            self.elements.set(self.elements.get() + 1);
            DefaultNodeFactory.element(name, namespace)
        }

        fn text(&self, text: &str) -> Result<crate::node::NodeRef> {
            self.texts.set(self.texts.get() + 1);
            DefaultNodeFactory.text(text)
        }
    }

    #[test]
    fn test_custom_factory_sees_every_construction() {
        let factory = CountingFactory {
            elements: Cell::new(0),
            texts: Cell::new(0),
        };
        let builder = XmlBuilder::new(&factory);
        for kind in AdapterKind::ALL {
            builder.build_str_with(kind, "<a><b>x</b><c/>y</a>").unwrap();
        }
        assert_eq!(factory.elements.get(), 12);
        assert_eq!(factory.texts.get(), 8);
    }

    #[test]
    fn test_adapter_kind_names() {
        for kind in AdapterKind::ALL {
            assert_eq!(kind.name().parse::<AdapterKind>().unwrap(), kind);
        }
        assert!("sax".parse::<AdapterKind>().is_err());
    }

    #[test]
    fn test_expand_entities_option() {
        let xml = r#"<!DOCTYPE a [<!ENTITY e "value">]><a>x&e;y</a>"#;
        let expanded = build_str(xml).unwrap();
        let root = expanded.root_element().unwrap();
        assert_eq!(NodeInner::text_content(&root), "xvaluey");

        let builder = XmlBuilder::with_options(
            DefaultNodeFactory,
            BuildOptions::default().with_expand_entities(false),
        );
        let kept = builder.build_str_with(AdapterKind::Cursor, xml).unwrap();
        let root = kept.root_element().unwrap();
        let root = root.borrow();
        assert_eq!(root.child_count(), 3);
        assert!(matches!(
            root.child(1).unwrap().borrow().content(),
            XmlContent::EntityRef(e) if e.name() == "e"
        ));
    }
}
