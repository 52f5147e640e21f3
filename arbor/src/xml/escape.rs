//! Character escaping and output encodings.

use std::io;

/// The character repertoire of an output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// UTF-8: every character is representable.
    Utf8,
    /// UTF-16, written big-endian with a byte order mark.
    Utf16,
    /// ISO-8859-1: code points up to U+00FF.
    Latin1,
    /// US-ASCII, also used for encodings this crate does not know.
    Ascii,
}

impl Charset {
    /// Maps an encoding name (case-insensitive) to its repertoire.
    pub fn for_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "UTF-8" | "UTF8" => Charset::Utf8,
            "UTF-16" | "UTF-16BE" | "UTF16" => Charset::Utf16,
            "ISO-8859-1" | "ISO8859-1" | "ISO_8859_1" | "LATIN1" | "LATIN-1" => Charset::Latin1,
            _ => Charset::Ascii,
        }
    }

    /// Returns true if `c` can be written directly.
    pub fn can_encode(self, c: char) -> bool {
        match self {
            Charset::Utf8 | Charset::Utf16 => true,
            Charset::Latin1 => (c as u32) <= 0xFF,
            Charset::Ascii => c.is_ascii(),
        }
    }

    /// Bytes written before any content.
    pub fn preamble(self) -> &'static [u8] {
        match self {
            Charset::Utf16 => &[0xFE, 0xFF],
            _ => &[],
        }
    }

    /// Encodes already-escaped text.
    ///
    /// Fails with `InvalidData` if a character cannot be represented; callers
    /// escape character data first, so this only happens for markup that has
    /// no escape syntax (comment and PI content, names).
    pub fn encode(self, text: &str, out: &mut Vec<u8>) -> io::Result<()> {
        match self {
            Charset::Utf8 => out.extend_from_slice(text.as_bytes()),
            Charset::Utf16 => {
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
            }
            Charset::Latin1 | Charset::Ascii => {
                for c in text.chars() {
                    if !self.can_encode(c) {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("U+{:04X} cannot be written in {:?}", c as u32, self),
                        ));
                    }
                    out.push(c as u8);
                }
            }
        }
        Ok(())
    }
}

fn push_char_ref(out: &mut String, c: char) {
    out.push_str(&format!("&#x{:X};", c as u32));
}

/// Appends `text` escaped for element content.
pub fn write_escaped_text(out: &mut String, text: &str, charset: Charset) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            c if !charset.can_encode(c) => push_char_ref(out, c),
            c => out.push(c),
        }
    }
}

/// Appends `value` escaped for a double-quoted attribute value.
pub fn write_escaped_attribute(out: &mut String, value: &str, charset: Charset) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            c if !charset.can_encode(c) => push_char_ref(out, c),
            c => out.push(c),
        }
    }
}

/// Appends a CDATA section. Characters the charset cannot carry close the
/// section, appear as a character reference, and a new section opens. A
/// `]]>` in the text is split across two sections the same way.
pub fn write_cdata(out: &mut String, text: &str, charset: Charset) {
    out.push_str("<![CDATA[");
    for (i, c) in text.char_indices() {
        if c == '>' && text[..i].ends_with("]]") {
            out.push_str("]]><![CDATA[>");
        } else if charset.can_encode(c) {
            out.push(c);
        } else {
            out.push_str("]]>");
            push_char_ref(out, c);
            out.push_str("<![CDATA[");
        }
    }
    out.push_str("]]>");
}

/// Escapes element content into a new string.
pub fn escape_text(text: &str, charset: Charset) -> String {
    let mut out = String::with_capacity(text.len());
    write_escaped_text(&mut out, text, charset);
    out
}

/// Escapes an attribute value into a new string.
pub fn escape_attribute(value: &str, charset: Charset) -> String {
    let mut out = String::with_capacity(value.len());
    write_escaped_attribute(&mut out, value, charset);
    out
}
