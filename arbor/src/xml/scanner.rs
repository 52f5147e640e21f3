//! Turns quick-xml's token stream into [`XmlEvent`] values.
//!
//! This is the one place that talks to quick-xml; the push parser, the cursor
//! and the event reader all sit on top of it, so they see identical input.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::escape::{resolve_predefined_entity, unescape_with};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use rustc_hash::FxHashMap;
use tracing::trace;

use super::doctype::{self, EntityDecl};
use super::events::{EntityReference, NamespaceDeclaration, RawAttribute, XmlEvent};
use crate::error::{Error, Result};
use crate::node::namespace::declared_prefix;

/// Reads events from quick-xml, one at a time.
pub struct QuickXmlScanner<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    pending: VecDeque<XmlEvent>,
    entities: FxHashMap<String, EntityDecl>,
    started: bool,
    finished: bool,
}

impl<'a> QuickXmlScanner<&'a [u8]> {
    pub fn from_str(xml: &'a str) -> Self {
        Self::new(Reader::from_str(xml))
    }

    /// Scans an entity's replacement text as content, knowing the entities
    /// declared by the document it came from.
    pub(crate) fn for_replacement(text: &'a str, entities: FxHashMap<String, EntityDecl>) -> Self {
        let mut scanner = Self::from_str(text);
        scanner.entities = entities;
        scanner
    }
}

impl QuickXmlScanner<BufReader<File>> {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> QuickXmlScanner<R> {
    pub fn from_reader(reader: R) -> Self {
        Self::new(Reader::from_reader(reader))
    }

    fn new(mut reader: Reader<R>) -> Self {
        // Whitespace handling belongs to the assembler
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        QuickXmlScanner {
            reader,
            buf: Vec::new(),
            pending: VecDeque::new(),
            entities: FxHashMap::default(),
            started: false,
            finished: false,
        }
    }

    /// Byte offset of the reader in the input.
    pub fn position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    /// Returns the next event, or `None` after `EndDocument`.
    pub fn next_event(&mut self) -> Result<Option<XmlEvent>> {
        if !self.started {
            self.started = true;
            return Ok(Some(XmlEvent::StartDocument));
        }
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }
        if self.finished {
            return Ok(None);
        }

        loop {
            self.buf.clear();
            let decoder = self.reader.decoder();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => {
                    return Err(Error::parse(
                        e.to_string(),
                        Some(self.reader.error_position() as u64),
                    ))
                }
            };
            let decode = |bytes: &[u8]| -> Result<String> {
                decoder
                    .decode(bytes)
                    .map(Cow::into_owned)
                    .map_err(|e| Error::parse(e.to_string(), None))
            };

            match event {
                Event::Decl(_) => {}
                Event::DocType(ref t) => {
                    let decl = doctype::parse_doctype(&decode(t.as_ref())?)?;
                    if let Some(subset) = &decl.internal_subset {
                        for entity in doctype::parse_entity_declarations(subset) {
                            trace!(name = %entity.name, "declared entity");
                            self.entities.insert(entity.name.clone(), entity);
                        }
                    }
                    return Ok(Some(XmlEvent::DocType(decl)));
                }
                Event::Start(ref e) => {
                    return Ok(Some(start_event(e, &decode, &self.entities)?));
                }
                Event::Empty(ref e) => {
                    let start = start_event(e, &decode, &self.entities)?;
                    if let XmlEvent::StartElement { name, .. } = &start {
                        self.pending
                            .push_back(XmlEvent::EndElement { name: name.clone() });
                    }
                    return Ok(Some(start));
                }
                Event::End(ref e) => {
                    let name = decode(e.name().as_ref())?;
                    return Ok(Some(XmlEvent::EndElement { name }));
                }
                Event::Text(ref t) => {
                    let text = decode(t.as_ref())?;
                    if !text.is_empty() {
                        return Ok(Some(XmlEvent::Characters(normalize_newlines(&text))));
                    }
                }
                Event::CData(ref t) => {
                    let text = decode(t.as_ref())?;
                    return Ok(Some(XmlEvent::CData(normalize_newlines(&text))));
                }
                Event::Comment(ref t) => {
                    return Ok(Some(XmlEvent::Comment(normalize_newlines(&decode(t.as_ref())?))));
                }
                Event::PI(ref pi) => {
                    let target = decode(pi.target())?;
                    let data = decode(pi.content())?;
                    return Ok(Some(XmlEvent::ProcessingInstruction {
                        target,
                        data: normalize_newlines(data.trim_start()),
                    }));
                }
                Event::GeneralRef(ref r) => {
                    let name = decode(r.as_ref())?;
                    let position = self.reader.buffer_position() as u64;
                    return reference_event(&name, &self.entities, position).map(Some);
                }
                Event::Eof => {
                    self.finished = true;
                    return Ok(Some(XmlEvent::EndDocument));
                }
            }
        }
    }
}

fn start_event(
    e: &BytesStart,
    decode: &dyn Fn(&[u8]) -> Result<String>,
    entities: &FxHashMap<String, EntityDecl>,
) -> Result<XmlEvent> {
    let name = decode(e.name().as_ref())?;
    let mut attributes = Vec::new();
    let mut namespaces = Vec::new();

    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| Error::parse(format!("attribute error: {}", e), None))?;
        let key = decode(attr.key.as_ref())?;
        let raw = decode(attr.value.as_ref())?;
        let value = attribute_value(&raw, entities)?;
        match declared_prefix(&key) {
            Some(prefix) => namespaces.push(NamespaceDeclaration::new(prefix, value)),
            None => attributes.push(RawAttribute::new(key, value)),
        }
    }

    Ok(XmlEvent::StartElement {
        name,
        attributes,
        namespaces,
    })
}

/// Normalizes literal whitespace to spaces, then replaces references.
fn attribute_value(raw: &str, entities: &FxHashMap<String, EntityDecl>) -> Result<String> {
    let spaced: String = normalize_newlines(raw)
        .chars()
        .map(|c| if matches!(c, '\t' | '\n') { ' ' } else { c })
        .collect();
    unescape_with(&spaced, |name| {
        resolve_predefined_entity(name)
            .or_else(|| entities.get(name).and_then(|d| d.value.as_deref()))
    })
    .map(Cow::into_owned)
    .map_err(|e| Error::parse(format!("attribute value: {}", e), None))
}

fn reference_event(
    name: &str,
    entities: &FxHashMap<String, EntityDecl>,
    position: u64,
) -> Result<XmlEvent> {
    if let Some(code) = name.strip_prefix('#') {
        let c = parse_char_ref(code).ok_or_else(|| {
            Error::parse(format!("invalid character reference &{};", name), Some(position))
        })?;
        return Ok(XmlEvent::Characters(c.to_string()));
    }
    if let Some(text) = resolve_predefined_entity(name) {
        return Ok(XmlEvent::Characters(text.to_string()));
    }
    match entities.get(name) {
        Some(decl) => Ok(XmlEvent::EntityReference(EntityReference {
            name: decl.name.clone(),
            replacement: decl.value.clone(),
            public_id: decl.public_id.clone(),
            system_id: decl.system_id.clone(),
        })),
        None => Err(Error::parse(
            format!("undeclared entity &{};", name),
            Some(position),
        )),
    }
}

fn parse_char_ref(code: &str) -> Option<char> {
    let value = match code.strip_prefix('x') {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => code.parse::<u32>().ok()?,
    };
    char::from_u32(value).filter(|c| crate::node::verifier::is_xml_char(*c))
}

/// Replaces `\r\n` and lone `\r` with `\n`.
fn normalize_newlines(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(xml: &str) -> Vec<XmlEvent> {
        let mut scanner = QuickXmlScanner::from_str(xml);
        let mut out = Vec::new();
        while let Some(event) = scanner.next_event().unwrap() {
            out.push(event);
        }
        out
    }

    #[test]
    fn test_empty_element_becomes_start_end() {
        let evs = events("<a/>");
        assert_eq!(evs.len(), 4);
        assert!(matches!(&evs[1], XmlEvent::StartElement { name, .. } if name == "a"));
        assert_eq!(evs[2], XmlEvent::EndElement { name: "a".into() });
        assert_eq!(evs[3], XmlEvent::EndDocument);
    }

    #[test]
    fn test_namespace_declarations_split_from_attributes() {
        let evs = events(r#"<p:a xmlns:p="urn:p" xmlns="urn:d" p:x="1" y="2"/>"#);
        match &evs[1] {
            XmlEvent::StartElement {
                name,
                attributes,
                namespaces,
            } => {
                assert_eq!(name, "p:a");
                assert_eq!(
                    namespaces,
                    &vec![
                        NamespaceDeclaration::new("p", "urn:p"),
                        NamespaceDeclaration::new("", "urn:d")
                    ]
                );
                assert_eq!(
                    attributes,
                    &vec![RawAttribute::new("p:x", "1"), RawAttribute::new("y", "2")]
                );
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_references_resolved() {
        let evs = events("<a>x&amp;&#65;&#x42;</a>");
        let text: String = evs
            .iter()
            .filter_map(|e| match e {
                XmlEvent::Characters(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "x&AB");
    }

    #[test]
    fn test_declared_entity_reported() {
        let evs = events(r#"<!DOCTYPE a [<!ENTITY e "value">]><a>&e;</a>"#);
        assert!(matches!(&evs[1], XmlEvent::DocType(d) if d.name == "a"));
        assert!(evs.iter().any(|e| matches!(
            e,
            XmlEvent::EntityReference(r) if r.name == "e" && r.replacement.as_deref() == Some("value")
        )));
    }

    #[test]
    fn test_undeclared_entity_is_parse_error() {
        let mut scanner = QuickXmlScanner::from_str("<a>&nope;</a>");
        let err = loop {
            match scanner.next_event() {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("expected an error"),
                Err(e) => break e,
            }
        };
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_attribute_value_normalization() {
        let evs = events("<a x=\"1\n2&#10;3&lt;\"/>");
        match &evs[1] {
            XmlEvent::StartElement { attributes, .. } => {
                assert_eq!(attributes[0].value, "1 2\n3<");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_newlines_normalized() {
        let evs = events("<a>1\r\n2\r3</a>");
        assert_eq!(evs[2], XmlEvent::Characters("1\n2\n3".into()));
    }
}
