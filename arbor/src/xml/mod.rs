//! Building trees from XML sources and writing them back out.
//!
//! Every node is created through a [`NodeFactory`]. The builder adapters
//! translate their source's protocol into [`ContentHandler`] calls on one
//! shared assembler, which is the only code that decides how a tree is put
//! together; the outputter renders a tree under a [`Format`].

mod assembler;
mod builder;
mod cursor;
pub mod doctype;
pub mod escape;
mod events;
mod foreign;
mod format;
mod outputter;
mod sax;
mod scanner;

pub use builder::{build_file, build_str, AdapterKind, BuildOptions, DocumentSource, XmlBuilder};
pub use cursor::{CursorAdapter, EventKind, QuickXmlCursor, XmlCursor};
pub use doctype::DocTypeDecl;
pub use events::{
    EntityReference, EventAdapter, NamespaceDeclaration, QuickXmlEventReader, RawAttribute,
    XmlEvent,
};
pub use foreign::{ForeignTree, ForeignTreeAdapter};
pub use format::{Format, Style, TextMode};
pub use outputter::{output_to_string, XmlOutputter};
pub use sax::{ContentHandler, PushAdapter, PushSource, QuickXmlPushParser};
pub use scanner::QuickXmlScanner;

use crate::error::Result;
use crate::node::{
    new_node_ref, AttributeType, Namespace, NodeInner, NodeRef, XmlAttribute, XmlCData,
    XmlComment, XmlContent, XmlDocType, XmlDocument, XmlElement, XmlEntityRef,
    XmlProcessingInstruction, XmlText,
};

/// Factory for every node a builder or edit helper creates.
///
/// All methods have checked default implementations, so a custom factory
/// only overrides what it wants to change: instrumenting construction,
/// restricting content, or relaxing validation.
///
/// ```
/// use xml_arbor::{DefaultNodeFactory, Namespace, NodeFactory};
///
/// let factory = DefaultNodeFactory;
/// assert!(factory.element("ok", Namespace::none()).is_ok());
/// assert!(factory.element("not ok", Namespace::none()).is_err());
/// ```
pub trait NodeFactory {
    /// Creates an empty document node.
    fn document(&self) -> Result<NodeRef> {
        Ok(new_node_ref(XmlContent::Document(XmlDocument::new())))
    }

    /// Creates an element with a local name and namespace.
    fn element(&self, name: &str, namespace: Namespace) -> Result<NodeRef> {
        let element = XmlElement::new(name, namespace)?;
        Ok(new_node_ref(XmlContent::Element(element)))
    }

    /// Creates an attribute value. It is attached with
    /// [`NodeFactory::add_attribute`] or [`NodeFactory::set_attribute`].
    fn attribute(
        &self,
        name: &str,
        namespace: Namespace,
        value: &str,
        attr_type: AttributeType,
    ) -> Result<XmlAttribute> {
        XmlAttribute::new(name, namespace, value, attr_type)
    }

    fn text(&self, text: &str) -> Result<NodeRef> {
        Ok(new_node_ref(XmlContent::Text(XmlText::new(text)?)))
    }

    fn cdata(&self, text: &str) -> Result<NodeRef> {
        Ok(new_node_ref(XmlContent::CData(XmlCData::new(text)?)))
    }

    fn comment(&self, text: &str) -> Result<NodeRef> {
        Ok(new_node_ref(XmlContent::Comment(XmlComment::new(text)?)))
    }

    fn processing_instruction(&self, target: &str, data: &str) -> Result<NodeRef> {
        let pi = XmlProcessingInstruction::new(target, data)?;
        Ok(new_node_ref(XmlContent::ProcessingInstruction(pi)))
    }

    fn entity_ref(
        &self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<NodeRef> {
        let entity = XmlEntityRef::new(name, public_id, system_id)?;
        Ok(new_node_ref(XmlContent::EntityRef(entity)))
    }

    fn doc_type(
        &self,
        element_name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        internal_subset: Option<&str>,
    ) -> Result<NodeRef> {
        let doc_type = XmlDocType::new(element_name, public_id, system_id, internal_subset)?;
        Ok(new_node_ref(XmlContent::DocType(doc_type)))
    }

    /// Appends `child` to `parent`.
    fn add_content(&self, parent: &NodeRef, child: NodeRef) -> Result<()> {
        NodeInner::add_content(parent, child)
    }

    /// Adds an attribute, failing on a duplicate identity.
    fn add_attribute(&self, element: &NodeRef, attribute: XmlAttribute) -> Result<()> {
        NodeInner::add_attribute(element, attribute)
    }

    /// Adds or replaces an attribute.
    fn set_attribute(&self, element: &NodeRef, attribute: XmlAttribute) -> Result<()> {
        NodeInner::set_attribute(element, attribute)
    }

    fn add_namespace_declaration(&self, element: &NodeRef, namespace: Namespace) -> Result<()> {
        NodeInner::add_namespace_declaration(element, namespace)
    }
}

impl<F: NodeFactory + ?Sized> NodeFactory for &F {
    fn document(&self) -> Result<NodeRef> {
        (**self).document()
    }

    fn element(&self, name: &str, namespace: Namespace) -> Result<NodeRef> {
        (**self).element(name, namespace)
    }

    fn attribute(
        &self,
        name: &str,
        namespace: Namespace,
        value: &str,
        attr_type: AttributeType,
    ) -> Result<XmlAttribute> {
        (**self).attribute(name, namespace, value, attr_type)
    }

    fn text(&self, text: &str) -> Result<NodeRef> {
        (**self).text(text)
    }

    fn cdata(&self, text: &str) -> Result<NodeRef> {
        (**self).cdata(text)
    }

    fn comment(&self, text: &str) -> Result<NodeRef> {
        (**self).comment(text)
    }

    fn processing_instruction(&self, target: &str, data: &str) -> Result<NodeRef> {
        (**self).processing_instruction(target, data)
    }

    fn entity_ref(
        &self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<NodeRef> {
        (**self).entity_ref(name, public_id, system_id)
    }

    fn doc_type(
        &self,
        element_name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        internal_subset: Option<&str>,
    ) -> Result<NodeRef> {
        (**self).doc_type(element_name, public_id, system_id, internal_subset)
    }

    fn add_content(&self, parent: &NodeRef, child: NodeRef) -> Result<()> {
        (**self).add_content(parent, child)
    }

    fn add_attribute(&self, element: &NodeRef, attribute: XmlAttribute) -> Result<()> {
        (**self).add_attribute(element, attribute)
    }

    fn set_attribute(&self, element: &NodeRef, attribute: XmlAttribute) -> Result<()> {
        (**self).set_attribute(element, attribute)
    }

    fn add_namespace_declaration(&self, element: &NodeRef, namespace: Namespace) -> Result<()> {
        (**self).add_namespace_declaration(element, namespace)
    }
}

/// Factory that checks names and character data.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNodeFactory;

impl NodeFactory for DefaultNodeFactory {}

/// Factory that skips name and character checks.
///
/// Structural rules (single parent, one root, no duplicate attributes) are
/// still enforced: they are what keep the tree a tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct UncheckedNodeFactory;

impl NodeFactory for UncheckedNodeFactory {
    fn element(&self, name: &str, namespace: Namespace) -> Result<NodeRef> {
        Ok(new_node_ref(XmlContent::Element(XmlElement::new_unchecked(
            name, namespace,
        ))))
    }

    fn attribute(
        &self,
        name: &str,
        namespace: Namespace,
        value: &str,
        attr_type: AttributeType,
    ) -> Result<XmlAttribute> {
        Ok(XmlAttribute::new_unchecked(name, namespace, value, attr_type))
    }

    fn text(&self, text: &str) -> Result<NodeRef> {
        Ok(new_node_ref(XmlContent::Text(XmlText::new_unchecked(text))))
    }

    fn cdata(&self, text: &str) -> Result<NodeRef> {
        Ok(new_node_ref(XmlContent::CData(XmlCData::new_unchecked(text))))
    }

    fn comment(&self, text: &str) -> Result<NodeRef> {
        Ok(new_node_ref(XmlContent::Comment(XmlComment::new_unchecked(
            text,
        ))))
    }

    fn processing_instruction(&self, target: &str, data: &str) -> Result<NodeRef> {
        Ok(new_node_ref(XmlContent::ProcessingInstruction(
            XmlProcessingInstruction::new_unchecked(target, data),
        )))
    }

    fn entity_ref(
        &self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<NodeRef> {
        Ok(new_node_ref(XmlContent::EntityRef(
            XmlEntityRef::new_unchecked(name, public_id, system_id),
        )))
    }

    fn doc_type(
        &self,
        element_name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        internal_subset: Option<&str>,
    ) -> Result<NodeRef> {
        Ok(new_node_ref(XmlContent::DocType(XmlDocType::new_unchecked(
            element_name,
            public_id,
            system_id,
            internal_subset,
        ))))
    }
}
