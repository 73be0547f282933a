//! Locations: the identity of a matched node.
//!
//! A [`JsonLocation`] is the sequence of member names and array indices that
//! leads from the document root to a node. Locations order element by
//! element (indices before names, a prefix before its descendants), render as
//! normalized paths such as `$['store']['book'][0]`, and can be parsed back.

use crate::document::Document;
use crate::error::{ErrorKind, JsonPathError};
use std::fmt::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathElement {
    Index(usize),
    Name(String),
}

impl From<usize> for PathElement {
    fn from(index: usize) -> Self {
        PathElement::Index(index)
    }
}

impl From<&str> for PathElement {
    fn from(name: &str) -> Self {
        PathElement::Name(name.to_string())
    }
}

impl From<String> for PathElement {
    fn from(name: String) -> Self {
        PathElement::Name(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JsonLocation {
    elements: Vec<PathElement>,
}

impl JsonLocation {
    /// The location of the root node.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(elements: Vec<PathElement>) -> Self {
        Self { elements }
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// A new location one step below this one.
    pub fn child(&self, element: PathElement) -> Self {
        let mut elements = Vec::with_capacity(self.elements.len() + 1);
        elements.extend_from_slice(&self.elements);
        elements.push(element);
        Self { elements }
    }

    pub fn parent(&self) -> Option<JsonLocation> {
        let (_, init) = self.elements.split_last()?;
        Some(Self::new(init.to_vec()))
    }

    pub fn last(&self) -> Option<&PathElement> {
        self.elements.last()
    }

    /// Parse a normalized path such as `$['foo'][3]["bar"]` or `$.'foo'.3.bar`.
    pub fn parse(input: &str) -> Result<JsonLocation, JsonPathError> {
        LocationParser::new(input).parse()
    }

    /// Render as an RFC 6901 JSON Pointer.
    pub fn to_json_pointer(&self) -> String {
        let mut out = String::new();
        for element in &self.elements {
            out.push('/');
            match element {
                PathElement::Index(index) => {
                    let _ = write!(out, "{index}");
                }
                PathElement::Name(name) => {
                    out.push_str(&name.replace('~', "~0").replace('/', "~1"));
                }
            }
        }
        out
    }

    pub fn get<'a, D: Document>(&self, root: &'a D) -> Option<&'a D> {
        let mut current = root;
        for element in &self.elements {
            current = match element {
                PathElement::Name(name) => current.member(name)?,
                PathElement::Index(index) => current.element(*index)?,
            };
        }
        Some(current)
    }

    pub fn get_mut<'a, D: Document>(&self, root: &'a mut D) -> Option<&'a mut D> {
        let mut current = root;
        for element in &self.elements {
            current = match element {
                PathElement::Name(name) => current.member_mut(name)?,
                PathElement::Index(index) => current.element_mut(*index)?,
            };
        }
        Some(current)
    }

    /// Overwrite the node at this location. Returns `false` if it does not exist.
    pub fn replace<D: Document>(&self, root: &mut D, value: D) -> bool {
        match self.get_mut(root) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Remove the node at this location from its parent. The root cannot be
    /// removed.
    pub fn remove<D: Document>(&self, root: &mut D) -> bool {
        let Some((last, init)) = self.elements.split_last() else {
            return false;
        };
        let parent = JsonLocation::new(init.to_vec());
        let Some(container) = parent.get_mut(root) else {
            return false;
        };
        match last {
            PathElement::Name(name) => container.remove_member(name),
            PathElement::Index(index) => container.remove_element(*index),
        }
    }
}

impl From<Vec<PathElement>> for JsonLocation {
    fn from(elements: Vec<PathElement>) -> Self {
        Self::new(elements)
    }
}

impl fmt::Display for JsonLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('$')?;
        for element in &self.elements {
            match element {
                PathElement::Index(index) => write!(f, "[{index}]")?,
                PathElement::Name(name) => {
                    f.write_str("['")?;
                    write_escaped(f, name)?;
                    f.write_str("']")?;
                }
            }
        }
        Ok(())
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    for c in name.chars() {
        match c {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\u{08}' => f.write_str("\\b")?,
            '\u{0C}' => f.write_str("\\f")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if (c as u32) < 0x20 => write!(f, "\\u{:04x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    Ok(())
}

struct LocationParser<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> LocationParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn parse(mut self) -> Result<JsonLocation, JsonPathError> {
        self.skip_whitespace();
        match self.peek() {
            Some('$') | Some('@') => self.advance(),
            Some(_) => return Err(self.error(ErrorKind::ExpectedRootOrCurrentNode)),
            None => return Err(self.error(ErrorKind::UnexpectedEof)),
        }

        let mut elements = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some('[') => {
                    self.advance();
                    self.skip_whitespace();
                    let element = match self.peek() {
                        Some(q @ ('\'' | '"')) => {
                            self.advance();
                            PathElement::Name(self.quoted(q)?)
                        }
                        Some(c) if c.is_ascii_digit() => PathElement::Index(self.index()?),
                        Some(_) => return Err(self.error(ErrorKind::ExpectedSingleQuoteOrDigit)),
                        None => return Err(self.error(ErrorKind::UnexpectedEof)),
                    };
                    self.skip_whitespace();
                    match self.peek() {
                        Some(']') => self.advance(),
                        Some(_) => return Err(self.error(ErrorKind::ExpectedRightBracket)),
                        None => return Err(self.error(ErrorKind::UnexpectedEof)),
                    }
                    elements.push(element);
                }
                Some('.') => {
                    self.advance();
                    let element = match self.peek() {
                        Some(q @ ('\'' | '"')) => {
                            self.advance();
                            PathElement::Name(self.quoted(q)?)
                        }
                        Some(c) if c.is_ascii_digit() => PathElement::Index(self.index()?),
                        Some('.') | Some('[') => return Err(self.error(ErrorKind::ExpectedKey)),
                        Some(_) => PathElement::Name(self.unquoted()),
                        None => return Err(self.error(ErrorKind::UnexpectedEof)),
                    };
                    elements.push(element);
                }
                Some(_) => return Err(self.error(ErrorKind::ExpectedSeparator)),
            }
        }
        Ok(JsonLocation::new(elements))
    }

    fn index(&mut self) -> Result<usize, JsonPathError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        self.input[start..self.pos]
            .parse()
            .map_err(|_| self.error(ErrorKind::InvalidNumber))
    }

    fn unquoted(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c != '.' && c != '[' && !c.is_whitespace()) {
            self.advance();
        }
        self.input[start..self.pos].to_string()
    }

    fn quoted(&mut self, quote: char) -> Result<String, JsonPathError> {
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(out);
                }
                Some('\\') => {
                    self.advance();
                    let c = self.escape()?;
                    out.push(c);
                }
                Some(c) => {
                    self.advance();
                    out.push(c);
                }
            }
        }
    }

    fn escape(&mut self) -> Result<char, JsonPathError> {
        let c = self
            .peek()
            .ok_or_else(|| self.error(ErrorKind::UnexpectedEof))?;
        let decoded = match c {
            '\\' | '\'' | '"' | '/' => c,
            'b' => '\u{08}',
            'f' => '\u{0C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => {
                self.advance();
                let high = self.hex4()?;
                if !(0xD800..0xDC00).contains(&high) {
                    return char::from_u32(high).ok_or_else(|| self.error(ErrorKind::InvalidCodepoint));
                }
                if self.peek() != Some('\\') {
                    return Err(self.error(ErrorKind::InvalidCodepoint));
                }
                self.advance();
                if self.peek() != Some('u') {
                    return Err(self.error(ErrorKind::InvalidCodepoint));
                }
                self.advance();
                let low = self.hex4()?;
                if !(0xDC00..0xE000).contains(&low) {
                    return Err(self.error(ErrorKind::InvalidCodepoint));
                }
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(code).ok_or_else(|| self.error(ErrorKind::InvalidCodepoint));
            }
            _ => return Err(self.error(ErrorKind::IllegalEscapedCharacter)),
        };
        self.advance();
        Ok(decoded)
    }

    fn hex4(&mut self) -> Result<u32, JsonPathError> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = match self.peek() {
                Some(c) => c.to_digit(16).ok_or_else(|| self.error(ErrorKind::InvalidCodepoint))?,
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
            };
            self.advance();
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn error(&self, kind: ErrorKind) -> JsonPathError {
        JsonPathError::new(kind, self.line, self.column)
    }
}
