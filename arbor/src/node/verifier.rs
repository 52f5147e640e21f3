//! Checks names and character data against the XML 1.0 and Namespaces in
//! XML productions before a node is created.

use crate::error::StructuralErrorKind;

/// Returns `true` if `c` is a valid `NameStartChar` (XML 1.0 §2.3 [4]).
pub fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' |
        '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' |
        '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' |
        '\u{10000}'..='\u{EFFFF}'
    )
}

/// Returns `true` if `c` is a valid `NameChar` (XML 1.0 §2.3 [4a]).
pub fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

/// Returns `true` if `c` matches the `Char` production (XML 1.0 §2.2 [2]).
pub fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}' |
        '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Returns `true` for the four XML whitespace characters.
pub fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// Returns `true` if `s` is empty or consists only of XML whitespace.
pub fn is_all_whitespace(s: &str) -> bool {
    s.chars().all(is_xml_whitespace)
}

fn illegal_name(role: &'static str, name: &str, reason: &str) -> StructuralErrorKind {
    StructuralErrorKind::IllegalName {
        role,
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn illegal_data(role: &'static str, reason: String) -> StructuralErrorKind {
    StructuralErrorKind::IllegalData { role, reason }
}

/// Checks that `name` is a non-colonized name (`NCName`).
pub fn check_ncname(role: &'static str, name: &str) -> Result<(), StructuralErrorKind> {
    let mut chars = name.chars();
    match chars.next() {
        None => return Err(illegal_name(role, name, "name is empty")),
        Some(':') => return Err(illegal_name(role, name, "name contains a colon")),
        Some(c) if !is_name_start_char(c) => {
            return Err(illegal_name(role, name, "name cannot start with this character"))
        }
        Some(_) => {}
    }
    for c in chars {
        if c == ':' {
            return Err(illegal_name(role, name, "name contains a colon"));
        }
        if !is_name_char(c) {
            return Err(illegal_name(
                role,
                name,
                &format!("character {:?} is not allowed in names", c),
            ));
        }
    }
    Ok(())
}

/// Checks an element local name.
pub fn check_element_name(name: &str) -> Result<(), StructuralErrorKind> {
    check_ncname("element", name)
}

/// Checks an attribute local name. `xmlns` is reserved for declarations.
pub fn check_attribute_name(name: &str) -> Result<(), StructuralErrorKind> {
    check_ncname("attribute", name)?;
    if name == "xmlns" {
        return Err(illegal_name(
            "attribute",
            name,
            "xmlns is reserved for namespace declarations",
        ));
    }
    Ok(())
}

/// Checks a namespace prefix. The empty prefix is the default namespace.
pub fn check_namespace_prefix(prefix: &str) -> Result<(), StructuralErrorKind> {
    if prefix.is_empty() {
        return Ok(());
    }
    check_ncname("namespace prefix", prefix)?;
    if prefix.eq_ignore_ascii_case("xmlns") {
        return Err(illegal_name(
            "namespace prefix",
            prefix,
            "xmlns cannot be used as a prefix",
        ));
    }
    Ok(())
}

/// Checks that character data only contains legal XML characters.
pub fn check_character_data(role: &'static str, text: &str) -> Result<(), StructuralErrorKind> {
    match text.chars().find(|c| !is_xml_char(*c)) {
        Some(c) => Err(illegal_data(
            role,
            format!("U+{:04X} is not a legal XML character", c as u32),
        )),
        None => Ok(()),
    }
}

/// Checks CDATA content: legal characters and no `]]>`.
pub fn check_cdata(text: &str) -> Result<(), StructuralErrorKind> {
    check_character_data("CDATA", text)?;
    if text.contains("]]>") {
        return Err(illegal_data(
            "CDATA",
            "CDATA sections cannot contain ']]>'".into(),
        ));
    }
    Ok(())
}

/// Checks comment content: no `--` and no trailing `-`.
pub fn check_comment(text: &str) -> Result<(), StructuralErrorKind> {
    check_character_data("comment", text)?;
    if text.contains("--") {
        return Err(illegal_data("comment", "comments cannot contain '--'".into()));
    }
    if text.ends_with('-') {
        return Err(illegal_data("comment", "comments cannot end with '-'".into()));
    }
    Ok(())
}

/// Checks a processing-instruction target.
pub fn check_pi_target(target: &str) -> Result<(), StructuralErrorKind> {
    check_ncname("processing instruction target", target)?;
    if target.eq_ignore_ascii_case("xml") {
        return Err(illegal_name(
            "processing instruction target",
            target,
            "targets matching 'xml' are reserved",
        ));
    }
    Ok(())
}

/// Checks processing-instruction data: legal characters and no `?>`.
pub fn check_pi_data(data: &str) -> Result<(), StructuralErrorKind> {
    check_character_data("processing instruction", data)?;
    if data.contains("?>") {
        return Err(illegal_data(
            "processing instruction",
            "data cannot contain '?>'".into(),
        ));
    }
    Ok(())
}

/// Checks a public identifier (`PubidChar`, XML 1.0 §2.3 [13]).
pub fn check_public_id(id: &str) -> Result<(), StructuralErrorKind> {
    let legal = |c: char| {
        matches!(c,
            ' ' | '\r' | '\n' | 'a'..='z' | 'A'..='Z' | '0'..='9' |
            '-' | '\'' | '(' | ')' | '+' | ',' | '.' | '/' | ':' |
            '=' | '?' | ';' | '!' | '*' | '#' | '@' | '$' | '_' | '%'
        )
    };
    match id.chars().find(|c| !legal(*c)) {
        Some(c) => Err(illegal_data(
            "public id",
            format!("{:?} is not a legal public id character", c),
        )),
        None => Ok(()),
    }
}

/// Checks a system literal: it cannot contain both quote characters.
pub fn check_system_id(id: &str) -> Result<(), StructuralErrorKind> {
    check_character_data("system id", id)?;
    if id.contains('"') && id.contains('\'') {
        return Err(illegal_data(
            "system id",
            "system literals cannot contain both quote characters".into(),
        ));
    }
    Ok(())
}
