//! Typed handle over a document node.

use super::{ContentFilter, NodeInner, NodeRef, XmlContent, XmlDocType};
use crate::error::{Error, Result, StructuralErrorKind};

/// A document: the node at the top of a built tree.
///
/// Cloning the handle shares the tree; use [`Document::deep_clone`] for an
/// independent copy.
#[derive(Debug, Clone)]
pub struct Document {
    node: NodeRef,
}

impl Document {
    /// Wraps a node that holds `XmlContent::Document`.
    pub fn from_node(node: NodeRef) -> Result<Self> {
        if !node.borrow().content().is_document() {
            let kind = node.borrow().content().kind_name();
            return Err(Error::structural(StructuralErrorKind::IllegalPlacement {
                child: kind,
                parent: "a document handle",
            }));
        }
        Ok(Document { node })
    }

    /// Returns the underlying document node.
    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    /// Returns the top-level nodes in order.
    pub fn content(&self) -> Vec<NodeRef> {
        self.node.borrow().children().to_vec()
    }

    /// Returns the root element, if one has been attached.
    pub fn root_element(&self) -> Option<NodeRef> {
        NodeInner::child_elements(&self.node).into_iter().next()
    }

    /// Returns true once a root element is attached.
    pub fn has_root_element(&self) -> bool {
        self.root_element().is_some()
    }

    /// Returns a copy of the doctype, if present.
    pub fn doc_type(&self) -> Option<XmlDocType> {
        NodeInner::filtered_children(&self.node, ContentFilter::DOC_TYPE)
            .first()
            .and_then(|n| n.borrow().content().as_doc_type().cloned())
    }

    /// Replaces the root element, keeping its position among the
    /// surrounding comments and processing instructions.
    ///
    /// Returns the previous root, now detached.
    pub fn set_root_element(&self, element: NodeRef) -> Result<Option<NodeRef>> {
        if !element.borrow().content().is_element() {
            let kind = element.borrow().content().kind_name();
            return Err(Error::structural(StructuralErrorKind::IllegalPlacement {
                child: kind,
                parent: "the root element slot",
            }));
        }
        if element.borrow().is_attached() {
            return Err(Error::structural(StructuralErrorKind::AlreadyAttached));
        }

        match self.root_element() {
            Some(old) => {
                let index = NodeInner::index_of(&old).unwrap_or(0);
                NodeInner::remove_content(&self.node, index);
                if let Err(e) = NodeInner::insert_content(&self.node, index, element) {
                    NodeInner::insert_content(&self.node, index, old)?;
                    return Err(e);
                }
                Ok(Some(old))
            }
            None => {
                NodeInner::add_content(&self.node, element)?;
                Ok(None)
            }
        }
    }

    /// Returns the base URI.
    pub fn base_uri(&self) -> Option<String> {
        match self.node.borrow().content() {
            XmlContent::Document(d) => d.base_uri().map(str::to_string),
            _ => None,
        }
    }

    /// Sets the base URI.
    pub fn set_base_uri(&self, uri: Option<String>) {
        if let XmlContent::Document(d) = self.node.borrow_mut().content_mut() {
            d.set_base_uri(uri);
        }
    }

    /// Copies the whole document.
    pub fn deep_clone(&self) -> Document {
        Document {
            node: NodeInner::deep_clone(&self.node),
        }
    }

    /// Compares two documents by canonical content.
    pub fn structurally_equal(&self, other: &Document) -> bool {
        NodeInner::structurally_equal(&self.node, &other.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{new_node_ref, Namespace, XmlComment, XmlDocument, XmlElement};

    fn element(name: &str) -> NodeRef {
        new_node_ref(XmlContent::Element(
            XmlElement::new(name, Namespace::none()).unwrap(),
        ))
    }

    fn empty_document() -> Document {
        Document::from_node(new_node_ref(XmlContent::Document(XmlDocument::new()))).unwrap()
    }

    #[test]
    fn test_from_node_requires_document() {
        assert!(Document::from_node(element("a")).is_err());
    }

    #[test]
    fn test_set_root_element_keeps_position() {
        let doc = empty_document();
        let comment = new_node_ref(XmlContent::Comment(XmlComment::new("before").unwrap()));
        NodeInner::add_content(doc.node(), comment).unwrap();
        assert!(doc.set_root_element(element("first")).unwrap().is_none());
        NodeInner::add_content(
            doc.node(),
            new_node_ref(XmlContent::Comment(XmlComment::new("after").unwrap())),
        )
        .unwrap();

        let old = doc.set_root_element(element("second")).unwrap().unwrap();
        assert!(!old.borrow().is_attached());

        let content = doc.content();
        assert_eq!(content.len(), 3);
        let root = doc.root_element().unwrap();
        assert!(std::rc::Rc::ptr_eq(&content[1], &root));
        assert_eq!(root.borrow().as_element().unwrap().name(), "second");
    }

    #[test]
    fn test_base_uri() {
        let doc = empty_document();
        assert_eq!(doc.base_uri(), None);
        doc.set_base_uri(Some("file:///tmp/a.xml".into()));
        assert_eq!(doc.base_uri().as_deref(), Some("file:///tmp/a.xml"));
    }

    #[test]
    fn test_doc_type_lookup() {
        let doc = empty_document();
        let dt = XmlDocType::new("html", None, Some("about:legacy-compat"), None).unwrap();
        NodeInner::add_content(doc.node(), new_node_ref(XmlContent::DocType(dt.clone()))).unwrap();
        assert_eq!(doc.doc_type(), Some(dt));
        assert!(!doc.has_root_element());
    }
}
