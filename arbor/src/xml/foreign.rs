//! Building from an existing tree that walks itself.
//!
//! roxmltree resolves names to namespace URIs and folds CDATA sections and
//! entity references into text, and it does not expose the doctype. Prefixes
//! are read back from the source text at each node's position; the rest is
//! lost before the walk starts.

use roxmltree::NodeType;

use super::builder::DocumentSource;
use super::doctype::DocTypeDecl;
use super::events::{EntityReference, NamespaceDeclaration, RawAttribute};
use super::sax::ContentHandler;
use crate::constants::XML_NAMESPACE_URI;
use crate::error::Result;
use crate::node::{Document, NamespaceScope, NodeRef, XmlContent};

/// A tree that can report its content depth-first to a handler.
///
/// The walk is read-only.
pub trait ForeignTree {
    fn walk(&self, handler: &mut dyn ContentHandler) -> Result<()>;
}

/// Adapts a [`ForeignTree`] for `XmlBuilder::build`.
pub struct ForeignTreeAdapter<'t, T: ForeignTree + ?Sized> {
    tree: &'t T,
}

impl<'t, T: ForeignTree + ?Sized> ForeignTreeAdapter<'t, T> {
    pub fn new(tree: &'t T) -> Self {
        ForeignTreeAdapter { tree }
    }
}

impl<T: ForeignTree + ?Sized> DocumentSource for ForeignTreeAdapter<'_, T> {
    fn adapter_name(&self) -> &'static str {
        "foreign"
    }

    fn drive(self, handler: &mut dyn ContentHandler) -> Result<()> {
        self.tree.walk(handler)
    }
}

impl ForeignTree for roxmltree::Document<'_> {
    fn walk(&self, handler: &mut dyn ContentHandler) -> Result<()> {
        handler.start_document()?;
        let source = self.input_text();
        for child in self.root().children() {
            walk_roxmltree(child, source, handler)?;
        }
        handler.end_document()
    }
}

fn walk_roxmltree(
    node: roxmltree::Node<'_, '_>,
    source: &str,
    handler: &mut dyn ContentHandler,
) -> Result<()> {
    match node.node_type() {
        NodeType::Root => Ok(()),
        NodeType::Element => {
            let local = node.tag_name().name();
            let name = match source_qname(source, node.range().start + 1, local) {
                Some(qname) => qname.to_string(),
                None => qualify(element_prefix(node, node.tag_name().namespace()), local),
            };
            let attributes: Vec<RawAttribute> = node
                .attributes()
                .map(|a| {
                    let name = match source_qname(source, a.range_qname().start, a.name()) {
                        Some(qname) => qname.to_string(),
                        None => qualify(attribute_prefix(node, a.namespace()), a.name()),
                    };
                    RawAttribute::new(name, a.value())
                })
                .collect();
            let namespaces = declared_namespaces(node);

            handler.start_element(&name, &attributes, &namespaces)?;
            for child in node.children() {
                walk_roxmltree(child, source, handler)?;
            }
            handler.end_element(&name)
        }
        NodeType::Text => handler.characters(node.text().unwrap_or_default()),
        NodeType::Comment => handler.comment(node.text().unwrap_or_default()),
        NodeType::PI => match node.pi() {
            Some(pi) => handler.processing_instruction(pi.target, pi.value.unwrap_or_default()),
            None => Ok(()),
        },
    }
}

/// The qualified name written at `start`, if it ends in `local`.
fn source_qname<'s>(source: &'s str, start: usize, local: &str) -> Option<&'s str> {
    let rest = source.get(start..)?;
    let end = rest
        .find(|c: char| c.is_whitespace() || matches!(c, '=' | '/' | '>'))
        .unwrap_or(rest.len());
    let qname = &rest[..end];
    let (_, found) = crate::node::namespace::split_qname(qname);
    (found == local).then_some(qname)
}

fn qualify(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{}:{}", p, local),
        _ => local.to_string(),
    }
}

/// Bindings in scope at `node` that its parent element does not have.
fn declared_namespaces(node: roxmltree::Node<'_, '_>) -> Vec<NamespaceDeclaration> {
    let binding = |ns: &roxmltree::Namespace<'_>| (ns.name().unwrap_or("").to_string(), ns.uri().to_string());
    let inherited: Vec<(String, String)> = node
        .parent_element()
        .map(|p| p.namespaces().map(|ns| binding(&ns)).collect())
        .unwrap_or_default();

    let mut declared: Vec<NamespaceDeclaration> = node
        .namespaces()
        .map(|ns| binding(&ns))
        .filter(|(_, uri)| uri != XML_NAMESPACE_URI)
        .filter(|b| !inherited.contains(b))
        .map(|(prefix, uri)| NamespaceDeclaration::new(prefix, uri))
        .collect();

    // An empty default namespace is an undeclaration when the parent had one
    let parent_default = inherited.iter().any(|(p, u)| p.is_empty() && !u.is_empty());
    let own_default = node.namespaces().any(|ns| ns.name().is_none());
    if parent_default && !own_default {
        declared.push(NamespaceDeclaration::new("", ""));
    }
    declared
}

fn element_prefix<'a>(node: roxmltree::Node<'a, '_>, uri: Option<&str>) -> Option<&'a str> {
    let uri = uri?;
    let mut prefixed = None;
    for ns in node.namespaces() {
        if ns.uri() != uri {
            continue;
        }
        match ns.name() {
            None => return None,
            Some(p) if prefixed.is_none() => prefixed = Some(p),
            Some(_) => {}
        }
    }
    prefixed
}

fn attribute_prefix<'a>(node: roxmltree::Node<'a, '_>, uri: Option<&str>) -> Option<&'a str> {
    let uri = uri?;
    if uri == XML_NAMESPACE_URI {
        return Some("xml");
    }
    node.namespaces()
        .find(|ns| ns.uri() == uri && ns.name().is_some())
        .and_then(|ns| ns.name())
}

/// Re-walks a tree built by this crate, e.g. to copy it through a
/// different factory.
impl ForeignTree for Document {
    fn walk(&self, handler: &mut dyn ContentHandler) -> Result<()> {
        handler.start_document()?;
        let scope = NamespaceScope::new();
        for child in self.content() {
            walk_node(&child, &scope, handler)?;
        }
        handler.end_document()
    }
}

fn walk_node(
    node: &NodeRef,
    scope: &NamespaceScope,
    handler: &mut dyn ContentHandler,
) -> Result<()> {
    let inner = node.borrow();
    match inner.content() {
        XmlContent::Document(_) => Ok(()),
        XmlContent::Element(element) => {
            let (declared, scope) = scope.declarations_for(element);
            let namespaces: Vec<NamespaceDeclaration> = declared
                .iter()
                .map(|ns| NamespaceDeclaration::new(ns.prefix(), ns.uri()))
                .collect();
            let attributes: Vec<RawAttribute> = element
                .attributes()
                .iter()
                .map(|a| RawAttribute {
                    name: a.qualified_name(),
                    value: a.value().to_string(),
                    attr_type: a.attr_type(),
                })
                .collect();
            let name = element.qualified_name();

            handler.start_element(&name, &attributes, &namespaces)?;
            for child in inner.children() {
                walk_node(child, &scope, handler)?;
            }
            handler.end_element(&name)
        }
        XmlContent::Text(t) => handler.characters(t.text()),
        XmlContent::CData(c) => handler.cdata(c.text()),
        XmlContent::Comment(c) => handler.comment(c.text()),
        XmlContent::ProcessingInstruction(pi) => {
            handler.processing_instruction(pi.target(), pi.data())
        }
        XmlContent::EntityRef(e) => handler.entity_reference(&EntityReference {
            name: e.name().to_string(),
            replacement: None,
            public_id: e.public_id().map(str::to_string),
            system_id: e.system_id().map(str::to_string),
        }),
        XmlContent::DocType(dt) => handler.doc_type(&DocTypeDecl {
            name: dt.element_name().to_string(),
            public_id: dt.public_id().map(str::to_string),
            system_id: dt.system_id().map(str::to_string),
            internal_subset: dt.internal_subset().map(str::to_string),
        }),
    }
}
