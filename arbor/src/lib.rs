//! xml-arbor - an XML document tree with interchangeable builders
//!
//! This library provides a mutable, in-memory XML tree together with the
//! machinery to build it from several kinds of XML sources and to write it
//! back out.
//!
//! # Overview
//!
//! A tree is made of [`NodeRef`]s, each holding one [`XmlContent`] variant:
//! document, element, text, CDATA, comment, processing instruction, entity
//! reference or doctype. Structural rules (single parent, one root element,
//! unique attributes, legal names) are checked on every change.
//!
//! Trees are built by [`XmlBuilder`] from one of four source styles:
//!
//! - push: a callback parser driving a [`ContentHandler`]
//! - cursor: a pull cursor implementing [`XmlCursor`]
//! - events: any iterator of [`XmlEvent`]s
//! - foreign tree: an already-parsed tree implementing [`ForeignTree`]
//!   (roxmltree documents and this crate's own [`Document`])
//!
//! Every adapter feeds the same assembler, so equivalent input gives
//! structurally identical trees whichever adapter read it. Nodes are created
//! through a [`NodeFactory`] value passed to the builder.
//!
//! [`XmlOutputter`] renders a tree under a [`Format`] (raw, pretty or
//! compact), escaping for the chosen output encoding.
//!
//! # Example
//!
//! ```
//! use xml_arbor::{build_str, Format, XmlOutputter};
//!
//! let doc = build_str(r#"<a x="1"><b/>text</a>"#).unwrap();
//! let root = doc.root_element().unwrap();
//! let raw = XmlOutputter::new(Format::raw()).output_to_string(&root).unwrap();
//! assert_eq!(raw, r#"<a x="1"><b/>text</a>"#);
//! ```

pub mod constants;
pub mod error;
pub mod node;
pub mod xml;

// Re-export commonly used types
pub use constants::*;
pub use error::{Error, Result, StructuralErrorKind};
pub use node::{
    new_node_ref, AttributeType, ContentFilter, Document, Namespace, NamespaceScope, NodeInner,
    NodeRef, WeakNodeRef, XmlAttribute, XmlCData, XmlComment, XmlContent, XmlDocType,
    XmlDocument, XmlElement, XmlEntityRef, XmlProcessingInstruction, XmlText,
};
pub use xml::{
    build_file, build_str, output_to_string, AdapterKind, BuildOptions, ContentHandler,
    CursorAdapter, DefaultNodeFactory, DocumentSource, EventAdapter, EventKind, ForeignTree,
    ForeignTreeAdapter, Format, NodeFactory, PushAdapter, PushSource, Style, TextMode,
    UncheckedNodeFactory, XmlBuilder, XmlCursor, XmlEvent, XmlOutputter,
};
