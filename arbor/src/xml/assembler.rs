//! The construction algorithm shared by every builder adapter.

use rustc_hash::FxHashMap;
use tracing::trace;

use super::builder::BuildOptions;
use super::doctype::{self, DocTypeDecl, EntityDecl};
use super::events::{EntityReference, NamespaceDeclaration, RawAttribute, XmlEvent};
use super::scanner::QuickXmlScanner;
use super::sax::ContentHandler;
use super::NodeFactory;
use crate::constants::XML_NAMESPACE_URI;
use crate::error::{Error, Result, StructuralErrorKind};
use crate::node::namespace::split_qname;
use crate::node::verifier::is_all_whitespace;
use crate::node::{Document, Namespace, NamespaceInterner, NamespaceScope, NodeInner, NodeRef};

/// Builds a tree from [`ContentHandler`] calls.
///
/// Keeps a stack of open parents (starting with the document) and, in
/// parallel, the namespace scope in effect at each of them. Character data is
/// buffered so that adjacent text, expanded entities and character
/// references end up in a single Text node.
pub(crate) struct TreeAssembler<'f, F: NodeFactory + ?Sized> {
    factory: &'f F,
    options: BuildOptions,
    document: NodeRef,
    stack: Vec<NodeRef>,
    scopes: Vec<NamespaceScope>,
    interner: NamespaceInterner,
    pending_text: String,
    nodes_created: usize,
    /// Internal entities declared by the doctype seen so far.
    entities: FxHashMap<String, EntityDecl>,
    /// Entities whose replacement text is being read as content.
    expanding: Vec<String>,
}

impl<'f, F: NodeFactory + ?Sized> TreeAssembler<'f, F> {
    pub(crate) fn new(factory: &'f F, options: BuildOptions) -> Result<Self> {
        let document = factory.document()?;
        Ok(TreeAssembler {
            factory,
            options,
            stack: vec![document.clone()],
            document,
            scopes: vec![NamespaceScope::new()],
            interner: NamespaceInterner::new(),
            pending_text: String::new(),
            nodes_created: 0,
            entities: FxHashMap::default(),
            expanding: Vec::new(),
        })
    }

    /// Number of nodes created so far, the document excluded.
    pub(crate) fn nodes_created(&self) -> usize {
        self.nodes_created
    }

    /// Completes the build.
    pub(crate) fn finish(mut self) -> Result<Document> {
        self.flush_text()?;
        if self.stack.len() > 1 {
            return Err(Error::parse(
                format!("unclosed element <{}>", self.open_element_name()),
                None,
            ));
        }
        let document = Document::from_node(self.document)?;
        if !document.has_root_element() {
            return Err(Error::structural(StructuralErrorKind::MissingRoot).at_path(|| "/".into()));
        }
        Ok(document)
    }

    fn top(&self) -> &NodeRef {
        // The document is pushed at construction and never popped
        &self.stack[self.stack.len() - 1]
    }

    fn at_document_level(&self) -> bool {
        self.stack.len() == 1
    }

    fn open_element_name(&self) -> String {
        self.top()
            .borrow()
            .as_element()
            .map(|e| e.qualified_name())
            .unwrap_or_default()
    }

    fn locate(&self, error: Error) -> Error {
        error.at_path(|| NodeInner::path(self.top()))
    }

    fn append(&mut self, node: NodeRef) -> Result<()> {
        self.factory.add_content(self.top(), node)?;
        self.nodes_created += 1;
        Ok(())
    }

    fn flush_text(&mut self) -> Result<()> {
        if self.pending_text.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.pending_text);
        if is_all_whitespace(&text) {
            if self.at_document_level() {
                return Ok(());
            }
            if self.options.ignore_boundary_whitespace {
                trace!("dropping whitespace-only text");
                return Ok(());
            }
        }
        let node = self.factory.text(&text)?;
        self.append(node)
    }

    fn open_element(
        &mut self,
        name: &str,
        attributes: &[RawAttribute],
        namespaces: &[NamespaceDeclaration],
    ) -> Result<()> {
        self.flush_text()?;

        let mut scope = self.scopes[self.scopes.len() - 1].clone();
        let mut declared = Vec::with_capacity(namespaces.len());
        for decl in namespaces {
            if decl.prefix == "xml" && decl.uri == XML_NAMESPACE_URI {
                trace!("skipping redundant xml namespace declaration");
                continue;
            }
            let ns = self.interner.intern(&decl.prefix, &decl.uri)?;
            scope = scope.with(ns.clone());
            declared.push(ns);
        }

        let (prefix, local) = split_qname(name);
        let namespace = resolve_prefix(&scope, prefix.unwrap_or(""))?;
        let element = self.factory.element(local, namespace)?;
        for ns in declared {
            self.factory.add_namespace_declaration(&element, ns)?;
        }
        for attr in attributes {
            let (prefix, local) = split_qname(&attr.name);
            let namespace = match prefix {
                Some(p) => resolve_prefix(&scope, p)?,
                None => Namespace::none(),
            };
            let attribute = self
                .factory
                .attribute(local, namespace, &attr.value, attr.attr_type)?;
            self.factory.add_attribute(&element, attribute)?;
        }

        self.append(element.clone())?;
        self.stack.push(element);
        self.scopes.push(scope);
        Ok(())
    }

    fn close_element(&mut self, name: &str) -> Result<()> {
        self.flush_text()?;
        if self.at_document_level() {
            return Err(Error::parse(format!("unexpected end tag </{}>", name), None));
        }
        let open = self.open_element_name();
        if open != name {
            return Err(Error::parse(
                format!("end tag </{}> does not match <{}>", name, open),
                None,
            ));
        }
        self.stack.pop();
        self.scopes.pop();
        Ok(())
    }

    fn add_doc_type(&mut self, decl: &DocTypeDecl) -> Result<()> {
        self.flush_text()?;
        let node = self.factory.doc_type(
            &decl.name,
            decl.public_id.as_deref(),
            decl.system_id.as_deref(),
            decl.internal_subset.as_deref(),
        )?;
        self.factory.add_content(&self.document, node)?;
        self.nodes_created += 1;
        if let Some(subset) = &decl.internal_subset {
            for entity in doctype::parse_entity_declarations(subset) {
                self.entities.insert(entity.name.clone(), entity);
            }
        }
        Ok(())
    }

    fn add_entity_reference(&mut self, reference: &EntityReference) -> Result<()> {
        match (&reference.replacement, self.options.expand_entities) {
            (Some(text), true) => {
                let markup = self
                    .entities
                    .get(&reference.name)
                    .and_then(|d| d.literal.clone())
                    .filter(|literal| literal.contains('<'));
                match markup {
                    Some(markup) => self.expand_markup(&reference.name, &markup),
                    None => {
                        trace!(name = %reference.name, "expanding entity");
                        self.pending_text.push_str(text);
                        Ok(())
                    }
                }
            }
            _ => {
                trace!(name = %reference.name, "keeping entity reference");
                self.flush_text()?;
                let node = self.factory.entity_ref(
                    &reference.name,
                    reference.public_id.as_deref(),
                    reference.system_id.as_deref(),
                )?;
                self.append(node)
            }
        }
    }

    /// Reads replacement text that contains markup as if it appeared in
    /// place of the reference.
    fn expand_markup(&mut self, name: &str, markup: &str) -> Result<()> {
        if self.expanding.iter().any(|n| n == name) {
            return Err(Error::parse(format!("entity &{}; refers to itself", name), None));
        }
        trace!(name, "expanding entity as content");
        let depth = self.stack.len();
        self.expanding.push(name.to_string());
        let mut scanner = QuickXmlScanner::for_replacement(markup, self.entities.clone());
        while let Some(event) = scanner.next_event()? {
            match event {
                XmlEvent::StartDocument | XmlEvent::EndDocument => {}
                event => event.dispatch(self)?,
            }
        }
        self.expanding.pop();
        if self.stack.len() != depth {
            return Err(Error::parse(
                format!("replacement text of &{}; is not well-balanced", name),
                None,
            ));
        }
        Ok(())
    }

    fn add_leaf(&mut self, make: impl FnOnce(&F) -> Result<NodeRef>) -> Result<()> {
        self.flush_text()?;
        let node = make(self.factory)?;
        self.append(node)
    }
}

fn resolve_prefix(scope: &NamespaceScope, prefix: &str) -> Result<Namespace> {
    match scope.resolve(prefix) {
        Some(ns) => Ok(ns),
        None if prefix.is_empty() => Ok(Namespace::none()),
        None => Err(StructuralErrorKind::UnboundPrefix(prefix.to_string()).into()),
    }
}

impl<F: NodeFactory + ?Sized> ContentHandler for TreeAssembler<'_, F> {
    fn start_document(&mut self) -> Result<()> {
        trace!("start of document");
        Ok(())
    }

    fn doc_type(&mut self, decl: &DocTypeDecl) -> Result<()> {
        self.add_doc_type(decl).map_err(|e| self.locate(e))
    }

    fn start_element(
        &mut self,
        name: &str,
        attributes: &[RawAttribute],
        namespaces: &[NamespaceDeclaration],
    ) -> Result<()> {
        self.open_element(name, attributes, namespaces)
            .map_err(|e| self.locate(e))
    }

    fn end_element(&mut self, name: &str) -> Result<()> {
        self.close_element(name).map_err(|e| self.locate(e))
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        self.pending_text.push_str(text);
        Ok(())
    }

    fn cdata(&mut self, text: &str) -> Result<()> {
        self.add_leaf(|f| f.cdata(text)).map_err(|e| self.locate(e))
    }

    fn comment(&mut self, text: &str) -> Result<()> {
        self.add_leaf(|f| f.comment(text)).map_err(|e| self.locate(e))
    }

    fn processing_instruction(&mut self, target: &str, data: &str) -> Result<()> {
        self.add_leaf(|f| f.processing_instruction(target, data))
            .map_err(|e| self.locate(e))
    }

    fn entity_reference(&mut self, reference: &EntityReference) -> Result<()> {
        self.add_entity_reference(reference)
            .map_err(|e| self.locate(e))
    }

    fn end_document(&mut self) -> Result<()> {
        self.flush_text().map_err(|e| self.locate(e))?;
        if !self.at_document_level() {
            return Err(Error::parse(
                format!("unclosed element <{}>", self.open_element_name()),
                None,
            ));
        }
        trace!("end of document");
        Ok(())
    }
}
