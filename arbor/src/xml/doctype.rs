//! Scanning of `<!DOCTYPE ...>` declarations.
//!
//! The internal subset is kept as opaque text. The only thing read out of it
//! is the list of general entity declarations, so that references in content
//! can be expanded or reported with their identifiers.

use quick_xml::escape::unescape;

use crate::error::{Error, Result};

/// The parts of a doctype declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocTypeDecl {
    pub name: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
    /// Text between `[` and `]`, verbatim.
    pub internal_subset: Option<String>,
}

/// A general entity declared in the internal subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDecl {
    pub name: String,
    /// Replacement text of an internal entity.
    pub value: Option<String>,
    /// The internal entity's value as written, references untouched.
    pub literal: Option<String>,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

/// Parses the content of a doctype declaration, i.e. everything between
/// `<!DOCTYPE` and the closing `>`.
pub fn parse_doctype(content: &str) -> Result<DocTypeDecl> {
    let mut scan = Scanner::new(content.trim());
    let name = scan.name();
    if name.is_empty() {
        return Err(Error::parse("DOCTYPE without a root element name", None));
    }

    let mut decl = DocTypeDecl {
        name: name.to_string(),
        ..Default::default()
    };
    scan.skip_ws();
    let (public_id, system_id) = scan.external_id()?;
    decl.public_id = public_id;
    decl.system_id = system_id;
    scan.skip_ws();

    let rest = scan.rest();
    if let Some(after_open) = rest.strip_prefix('[') {
        let close = after_open
            .rfind(']')
            .ok_or_else(|| Error::parse("unterminated DOCTYPE internal subset", None))?;
        decl.internal_subset = Some(after_open[..close].to_string());
    }
    Ok(decl)
}

/// Lists the general entities declared in an internal subset, in order.
///
/// Parameter entities and unparsed (`NDATA`) entities are skipped. When an
/// entity is declared twice the first declaration is binding, as in XML.
pub fn parse_entity_declarations(subset: &str) -> Vec<EntityDecl> {
    let mut decls: Vec<EntityDecl> = Vec::new();
    let mut scan = Scanner::new(subset);

    while !scan.at_end() {
        if scan.eat("<!--") {
            scan.skip_past("-->");
        } else if scan.eat("<?") {
            scan.skip_past("?>");
        } else if scan.eat("<!ENTITY") {
            if let Some(decl) = scan.entity_decl() {
                if !decls.iter().any(|d| d.name == decl.name) {
                    decls.push(decl);
                }
            }
            scan.skip_markup_end();
        } else if scan.eat("<!") {
            scan.skip_markup_end();
        } else {
            scan.bump();
        }
    }
    decls
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Scanner { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn bump(&mut self) {
        if let Some(c) = self.rest().chars().next() {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches([' ', '\t', '\r', '\n']);
        self.pos += rest.len() - trimmed.len();
    }

    fn skip_past(&mut self, token: &str) {
        match self.rest().find(token) {
            Some(i) => self.pos += i + token.len(),
            None => self.pos = self.input.len(),
        }
    }

    /// Skips to just after the `>` closing the current declaration,
    /// ignoring any `>` inside quoted literals.
    fn skip_markup_end(&mut self) {
        let mut quote: Option<char> = None;
        while let Some(c) = self.rest().chars().next() {
            self.bump();
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"') | (None, '\'') => quote = Some(c),
                (None, '>') => return,
                _ => {}
            }
        }
    }

    fn name(&mut self) -> &'a str {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '[' | '>' | '"' | '\''))
            .unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn literal(&mut self) -> Result<String> {
        let quote = match self.rest().chars().next() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(Error::parse("expected a quoted literal in DOCTYPE", None)),
        };
        self.bump();
        let rest = self.rest();
        let end = rest
            .find(quote)
            .ok_or_else(|| Error::parse("unterminated literal in DOCTYPE", None))?;
        self.pos += end + 1;
        Ok(rest[..end].to_string())
    }

    fn external_id(&mut self) -> Result<(Option<String>, Option<String>)> {
        if self.eat("PUBLIC") {
            self.skip_ws();
            let public_id = self.literal()?;
            self.skip_ws();
            let system_id = match self.rest().chars().next() {
                Some('"' | '\'') => Some(self.literal()?),
                _ => None,
            };
            Ok((Some(public_id), system_id))
        } else if self.eat("SYSTEM") {
            self.skip_ws();
            Ok((None, Some(self.literal()?)))
        } else {
            Ok((None, None))
        }
    }

    fn entity_decl(&mut self) -> Option<EntityDecl> {
        self.skip_ws();
        if self.rest().starts_with('%') {
            return None;
        }
        let name = self.name().to_string();
        if name.is_empty() {
            return None;
        }
        self.skip_ws();

        let mut decl = EntityDecl {
            name,
            value: None,
            literal: None,
            public_id: None,
            system_id: None,
        };
        if matches!(self.rest().chars().next(), Some('"' | '\'')) {
            let raw = self.literal().ok()?;
            let value = unescape(&raw).map(|v| v.into_owned()).unwrap_or_else(|_| raw.clone());
            decl.value = Some(value);
            decl.literal = Some(raw);
        } else {
            let (public_id, system_id) = self.external_id().ok()?;
            self.skip_ws();
            if self.rest().starts_with("NDATA") {
                return None;
            }
            decl.public_id = public_id;
            decl.system_id = system_id;
        }
        Some(decl)
    }
}
