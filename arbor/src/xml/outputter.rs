//! Serializes trees under a [`Format`].
//!
//! Rendering happens into a `String` with every character the target
//! encoding cannot carry already turned into a character reference; the
//! byte-level encode at the end can then only fail for markup that has no
//! escape syntax, which is checked while rendering.

use std::io::{self, Write};

use super::escape::{write_cdata, write_escaped_attribute, write_escaped_text, Charset};
use super::format::{Format, Style, TextMode};
use crate::error::{Error, Result};
use crate::node::verifier::is_all_whitespace;
use crate::node::{
    collapse_whitespace, Document, NamespaceScope, NodeInner, NodeRef, XmlContent, XmlDocType,
    XmlElement,
};

/// Writes nodes and documents as XML text.
///
/// An outputter holds only its format, so the same instance can be used for
/// any number of calls; output never modifies the tree.
///
/// ```
/// use xml_arbor::{build_str, Format, XmlOutputter};
///
/// let doc = build_str("<c><d/><e/></c>").unwrap();
/// let root = doc.root_element().unwrap();
/// let out = XmlOutputter::new(Format::pretty()).output_to_string(&root).unwrap();
/// assert_eq!(out, "<c>\n  <d/>\n  <e/>\n</c>");
/// ```
#[derive(Debug, Clone, Default)]
pub struct XmlOutputter {
    format: Format,
}

impl XmlOutputter {
    pub fn new(format: Format) -> Self {
        XmlOutputter { format }
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    /// Renders any node. A document node gets the full document treatment
    /// (declaration and top-level line separators); anything else is written
    /// as a fragment whose namespace context starts empty.
    pub fn output_to_string(&self, node: &NodeRef) -> Result<String> {
        let mut renderer = Renderer::new(&self.format);
        renderer.top(node)?;
        Ok(renderer.out)
    }

    /// Renders a document.
    pub fn document_to_string(&self, document: &Document) -> Result<String> {
        self.output_to_string(document.node())
    }

    /// Writes a node as bytes in the format's encoding, preceded by the
    /// encoding's byte order mark if it has one.
    pub fn output<W: Write>(&self, node: &NodeRef, mut writer: W) -> Result<()> {
        let text = self.output_to_string(node)?;
        let charset = Charset::for_name(self.format.encoding());
        let mut bytes = Vec::with_capacity(text.len() + 2);
        bytes.extend_from_slice(charset.preamble());
        charset.encode(&text, &mut bytes)?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes a document as bytes in the format's encoding.
    pub fn output_document<W: Write>(&self, document: &Document, writer: W) -> Result<()> {
        self.output(document.node(), writer)
    }
}

/// Renders `node` with `format`.
pub fn output_to_string(node: &NodeRef, format: &Format) -> Result<String> {
    XmlOutputter::new(format.clone()).output_to_string(node)
}

struct Renderer<'f> {
    format: &'f Format,
    charset: Charset,
    out: String,
    /// Names of the elements being written, outermost first.
    path: Vec<String>,
}

impl<'f> Renderer<'f> {
    fn new(format: &'f Format) -> Self {
        Renderer {
            format,
            charset: Charset::for_name(format.encoding()),
            out: String::new(),
            path: Vec::new(),
        }
    }

    fn top(&mut self, node: &NodeRef) -> Result<()> {
        let pretty = self.format.style() == Style::Pretty;
        let inner = node.borrow();
        if !inner.content().is_document() {
            if let Some(parent) = inner.parent() {
                self.path = NodeInner::path(&parent)
                    .split('/')
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            drop(inner);
            return self.node(node, &NamespaceScope::new(), 0, pretty);
        }
        self.declaration();
        for child in inner.children() {
            self.node(child, &NamespaceScope::new(), 0, pretty)?;
            self.out.push_str(self.format.line_separator());
        }
        Ok(())
    }

    fn declaration(&mut self) {
        if self.format.omit_declaration() {
            return;
        }
        self.out.push_str("<?xml version=\"1.0\"");
        if !self.format.omit_encoding() {
            self.out.push_str(" encoding=\"");
            self.out.push_str(self.format.encoding());
            self.out.push('"');
        }
        self.out.push_str("?>");
        self.out.push_str(self.format.line_separator());
    }

    /// `indenting` is false anywhere inside a mixed-content element.
    fn node(
        &mut self,
        node: &NodeRef,
        scope: &NamespaceScope,
        depth: usize,
        indenting: bool,
    ) -> Result<()> {
        if node.borrow().content().is_document() {
            return self.top(node);
        }
        let inner = node.borrow();
        match inner.content() {
            XmlContent::Document(_) => Ok(()),
            XmlContent::Element(element) => {
                self.element(element, inner.children(), scope, depth, indenting)
            }
            XmlContent::Text(text) => {
                self.text(text.text());
                Ok(())
            }
            XmlContent::CData(cdata) => {
                write_cdata(&mut self.out, cdata.text(), self.charset);
                Ok(())
            }
            XmlContent::Comment(comment) => {
                self.out.push_str("<!--");
                self.markup(comment.text(), "comment")?;
                self.out.push_str("-->");
                Ok(())
            }
            XmlContent::ProcessingInstruction(pi) => {
                self.out.push_str("<?");
                self.markup(pi.target(), "processing instruction target")?;
                if !pi.data().is_empty() {
                    self.out.push(' ');
                    self.markup(pi.data(), "processing instruction")?;
                }
                self.out.push_str("?>");
                Ok(())
            }
            XmlContent::EntityRef(entity) => {
                self.out.push('&');
                self.markup(entity.name(), "entity name")?;
                self.out.push(';');
                Ok(())
            }
            XmlContent::DocType(doc_type) => self.doc_type(doc_type),
        }
    }

    fn element(
        &mut self,
        element: &XmlElement,
        children: &[NodeRef],
        scope: &NamespaceScope,
        depth: usize,
        indenting: bool,
    ) -> Result<()> {
        let (declared, scope) = scope.declarations_for(element);
        let qname = element.qualified_name();
        self.path.push(qname.clone());

        self.out.push('<');
        self.markup(&qname, "element name")?;
        for ns in &declared {
            if ns.prefix().is_empty() {
                self.out.push_str(" xmlns=\"");
            } else {
                self.out.push_str(" xmlns:");
                self.markup(ns.prefix(), "namespace prefix")?;
                self.out.push_str("=\"");
            }
            write_escaped_attribute(&mut self.out, ns.uri(), self.charset);
            self.out.push('"');
        }
        for attribute in element.attributes() {
            self.out.push(' ');
            self.markup(&attribute.qualified_name(), "attribute name")?;
            self.out.push_str("=\"");
            write_escaped_attribute(&mut self.out, attribute.value(), self.charset);
            self.out.push('"');
        }

        let mixed = is_mixed(children);
        let indenting = indenting && !mixed;
        let drop_whitespace = match self.format.style() {
            Style::Raw => false,
            Style::Compact => true,
            Style::Pretty => indenting,
        };
        let visible: Vec<&NodeRef> = children
            .iter()
            .filter(|child| !(drop_whitespace && is_whitespace_text(child)))
            .collect();

        if visible.is_empty() {
            if self.format.expand_empty_elements() {
                self.out.push_str("></");
                self.out.push_str(&qname);
                self.out.push('>');
            } else {
                self.out.push_str("/>");
            }
            self.path.pop();
            return Ok(());
        }

        self.out.push('>');
        for child in &visible {
            if indenting {
                self.newline(depth + 1);
            }
            self.node(child, &scope, depth + 1, indenting)?;
        }
        if indenting {
            self.newline(depth);
        }
        self.out.push_str("</");
        self.out.push_str(&qname);
        self.out.push('>');
        self.path.pop();
        Ok(())
    }

    fn text(&mut self, text: &str) {
        match self.format.text_mode() {
            TextMode::Preserve => write_escaped_text(&mut self.out, text, self.charset),
            TextMode::Trim => {
                let trimmed = text.trim_matches(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
                write_escaped_text(&mut self.out, trimmed, self.charset)
            }
            TextMode::Normalize => {
                write_escaped_text(&mut self.out, &collapse_whitespace(text), self.charset)
            }
        }
    }

    fn doc_type(&mut self, doc_type: &XmlDocType) -> Result<()> {
        self.out.push_str("<!DOCTYPE ");
        self.markup(doc_type.element_name(), "doctype name")?;
        match (doc_type.public_id(), doc_type.system_id()) {
            (Some(public_id), system_id) => {
                self.out.push_str(" PUBLIC \"");
                self.markup(public_id, "public id")?;
                self.out.push('"');
                if let Some(system_id) = system_id {
                    self.out.push_str(" \"");
                    self.markup(system_id, "system id")?;
                    self.out.push('"');
                }
            }
            (None, Some(system_id)) => {
                self.out.push_str(" SYSTEM \"");
                self.markup(system_id, "system id")?;
                self.out.push('"');
            }
            (None, None) => {}
        }
        if let Some(subset) = doc_type.internal_subset() {
            self.out.push_str(" [");
            self.markup(subset, "internal subset")?;
            self.out.push(']');
        }
        self.out.push('>');
        Ok(())
    }

    /// Appends text that has no escape syntax in its position.
    fn markup(&mut self, text: &str, what: &str) -> Result<()> {
        if let Some(c) = text.chars().find(|&c| !self.charset.can_encode(c)) {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{} at /{} contains U+{:04X}, which {} cannot represent",
                    what,
                    self.path.join("/"),
                    c as u32,
                    self.format.encoding()
                ),
            )));
        }
        self.out.push_str(text);
        Ok(())
    }

    fn newline(&mut self, depth: usize) {
        self.out.push_str(self.format.line_separator());
        for _ in 0..depth {
            self.out.push_str(self.format.indent());
        }
    }
}

/// True when adding whitespace between the children could change the
/// element's character data.
fn is_mixed(children: &[NodeRef]) -> bool {
    children.iter().any(|child| match child.borrow().content() {
        XmlContent::Text(t) => !t.is_whitespace(),
        XmlContent::CData(c) => !is_all_whitespace(c.text()),
        XmlContent::EntityRef(_) => true,
        _ => false,
    })
}

fn is_whitespace_text(node: &NodeRef) -> bool {
    matches!(node.borrow().content(), XmlContent::Text(t) if t.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Namespace, NodeInner};
    use crate::xml::{build_str, DefaultNodeFactory, NodeFactory};
    use pretty_assertions::assert_eq;

    fn root_of(xml: &str) -> NodeRef {
        build_str(xml).unwrap().root_element().unwrap()
    }

    fn render(node: &NodeRef, format: Format) -> String {
        XmlOutputter::new(format).output_to_string(node).unwrap()
    }

    #[test]
    fn test_raw_reproduces_source() {
        let root = root_of(r#"<a x="1"><b/>text</a>"#);
        assert_eq!(render(&root, Format::raw()), r#"<a x="1"><b/>text</a>"#);
    }

    #[test]
    fn test_pretty_suppressed_for_mixed_content() {
        let root = root_of(r#"<a x="1"><b/>text</a>"#);
        assert_eq!(render(&root, Format::pretty()), r#"<a x="1"><b/>text</a>"#);
    }

    #[test]
    fn test_pretty_mixed_subtree_stays_raw() {
        let root = root_of("<a>t<b><c/><d/></b></a>");
        assert_eq!(render(&root, Format::pretty()), render(&root, Format::raw()));
    }

    #[test]
    fn test_pretty_indents_element_only_content() {
        let f = DefaultNodeFactory;
        let c = f.element("c", Namespace::none()).unwrap();
        f.add_content(&c, f.element("d", Namespace::none()).unwrap()).unwrap();
        f.add_content(&c, f.element("e", Namespace::none()).unwrap()).unwrap();
        assert_eq!(render(&c, Format::pretty()), "<c>\n  <d/>\n  <e/>\n</c>");
    }

    #[test]
    fn test_pretty_replaces_existing_whitespace() {
        let root = root_of("<c>\n<d>\n\n</d>    <e/></c>");
        assert_eq!(render(&root, Format::pretty()), "<c>\n  <d/>\n  <e/>\n</c>");
    }

    #[test]
    fn test_compact_drops_whitespace_text() {
        let root = root_of("<a>\n  <b>  x   y </b>\n</a>");
        assert_eq!(render(&root, Format::compact()), "<a><b> x y </b></a>");
    }

    #[test]
    fn test_text_modes() {
        let root = root_of("<a>  x \n y  </a>");
        let trim = Format::raw().with_text_mode(TextMode::Trim);
        assert_eq!(render(&root, trim), "<a>x \n y</a>");
        let normalize = Format::raw().with_text_mode(TextMode::Normalize);
        assert_eq!(render(&root, normalize), "<a> x y </a>");
    }

    #[test]
    fn test_expand_empty_elements() {
        let root = root_of("<a><b/></a>");
        let format = Format::raw().with_expand_empty_elements(true);
        assert_eq!(render(&root, format), "<a><b></b></a>");
    }

    #[test]
    fn test_document_declaration_and_separators() {
        let doc = build_str("<!--c--><a/><?pi data?>").unwrap();
        let out = XmlOutputter::default().document_to_string(&doc).unwrap();
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!--c-->\n<a/>\n<?pi data?>\n"
        );

        let bare = Format::raw().with_omit_declaration(true);
        assert_eq!(render(doc.node(), bare), "<!--c-->\n<a/>\n<?pi data?>\n");

        let no_encoding = Format::raw().with_omit_encoding(true);
        assert!(render(doc.node(), no_encoding).starts_with("<?xml version=\"1.0\"?>\n"));
    }

    #[test]
    fn test_doctype_rendering() {
        let doc = build_str(r#"<!DOCTYPE a [<!ENTITY x "y">]><a/>"#).unwrap();
        let out = render(doc.node(), Format::raw().with_omit_declaration(true));
        assert_eq!(out, "<!DOCTYPE a [<!ENTITY x \"y\">]>\n<a/>\n");

        let doc = build_str(r#"<!DOCTYPE a PUBLIC "-//p" "s.dtd"><a/>"#).unwrap();
        let out = render(doc.node(), Format::raw().with_omit_declaration(true));
        assert_eq!(out, "<!DOCTYPE a PUBLIC \"-//p\" \"s.dtd\">\n<a/>\n");
    }

    #[test]
    fn test_escaping() {
        let root = root_of(r#"<a v="&quot;&lt;&amp;&#9;">x &lt; &amp; "y" &gt;</a>"#);
        assert_eq!(
            render(&root, Format::raw()),
            r#"<a v="&quot;&lt;&amp;&#x9;">x &lt; &amp; "y" &gt;</a>"#
        );
    }

    #[test]
    fn test_encoding_escapes() {
        let root = root_of("<a v=\"\u{e9}\">\u{e9}\u{20ac}</a>");
        let ascii = Format::raw().with_encoding("US-ASCII");
        assert_eq!(render(&root, ascii), "<a v=\"&#xE9;\">&#xE9;&#x20AC;</a>");
        let latin1 = Format::raw().with_encoding("ISO-8859-1");
        assert_eq!(render(&root, latin1), "<a v=\"\u{e9}\">\u{e9}&#x20AC;</a>");
    }

    #[test]
    fn test_unencodable_comment_is_io_error() {
        let root = root_of("<a><!--\u{e9}--></a>");
        let outputter = XmlOutputter::new(Format::raw().with_encoding("US-ASCII"));
        let err = outputter.output_to_string(&root).unwrap_err();
        match err {
            Error::Io(e) => {
                assert_eq!(e.kind(), io::ErrorKind::InvalidData);
                assert!(e.to_string().starts_with("comment at /a contains U+00E9"), "{}", e);
            }
            other => panic!("unexpected error {other}"),
        }

        let doc = crate::xml::build_str("<r><s><t n\u{e9}='1'/></s></r>").unwrap();
        let err = outputter.document_to_string(&doc).unwrap_err();
        assert!(err.to_string().contains("attribute name at /r/s/t contains"), "{}", err);

        let s = NodeInner::child_elements(&doc.root_element().unwrap()).remove(0);
        let err = outputter.output_to_string(&s).unwrap_err();
        assert!(err.to_string().contains("at /r/s/t contains"), "{}", err);
    }

    #[test]
    fn test_output_bytes() {
        let root = root_of("<a>\u{e9}</a>");
        let mut bytes = Vec::new();
        XmlOutputter::new(Format::raw().with_encoding("ISO-8859-1"))
            .output(&root, &mut bytes)
            .unwrap();
        assert_eq!(bytes, b"<a>\xE9</a>".to_vec());

        let mut bytes = Vec::new();
        XmlOutputter::new(Format::raw().with_encoding("UTF-16"))
            .output(&root, &mut bytes)
            .unwrap();
        assert_eq!(&bytes[..4], &[0xFE, 0xFF, 0x00, b'<']);
    }

    #[test]
    fn test_namespace_declarations() {
        let xml = r#"<p:a xmlns:p="urn:p" xmlns:q="urn:q"><b xmlns="urn:d"><p:c/></b></p:a>"#;
        let root = root_of(xml);
        assert_eq!(render(&root, Format::raw()), xml);

        // A detached subtree still declares what it uses.
        let b = NodeInner::child_elements(&root).remove(0);
        let c = NodeInner::child_elements(&b).remove(0);
        assert_eq!(render(&c, Format::raw()), r#"<p:c xmlns:p="urn:p"/>"#);
    }

    #[test]
    fn test_entity_ref_and_cdata() {
        let doc = crate::xml::XmlBuilder::with_options(
            DefaultNodeFactory,
            crate::xml::BuildOptions::default().with_expand_entities(false),
        )
        .build_str_with(
            crate::xml::AdapterKind::Push,
            r#"<!DOCTYPE a [<!ENTITY e "v">]><a>&e;<![CDATA[<x>]]></a>"#,
        )
        .unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(render(&root, Format::pretty()), "<a>&e;<![CDATA[<x>]]></a>");
    }

    #[test]
    fn test_cdata_with_terminator_rebuilds() {
        let f = crate::xml::UncheckedNodeFactory;
        let root = f.element("a", Namespace::none()).unwrap();
        f.add_content(&root, f.cdata("x]]>y").unwrap()).unwrap();
        let out = render(&root, Format::raw());
        assert_eq!(out, "<a><![CDATA[x]]]]><![CDATA[>y]]></a>");

        let rebuilt = crate::xml::build_str(&out).unwrap().root_element().unwrap();
        assert_eq!(NodeInner::text_content(&rebuilt), "x]]>y");
    }

    #[test]
    fn test_output_is_deterministic() {
        let root = root_of(r#"<a z="1" y="2" xmlns:m="urn:m" m:k="v"><b/></a>"#);
        let first = render(&root, Format::pretty());
        for _ in 0..5 {
            assert_eq!(render(&root, Format::pretty()), first);
        }
    }
}
