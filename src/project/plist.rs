//! Reader for the OpenStep ("old-style ASCII") property-list format.
//!
//! `project.pbxproj` files are written in this format:
//!
//! ```text
//! // !$*UTF8*$!
//! {
//!     archiveVersion = 1;
//!     objects = {
//!         13B07F861A680F5B00A75B9A /* App */ = {
//!             isa = PBXNativeTarget;
//!             buildPhases = ( A, B, );
//!         };
//!     };
//! }
//! ```
//!
//! Only reading is supported.
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;

pub type Dictionary = BTreeMap<String, Value>;

/// Deepest dictionary/array nesting accepted before parsing fails.
pub const MAX_NESTING_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Array(Vec<Value>),
    Dictionary(Dictionary),
    Data(Vec<u8>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// Dictionary lookup; `None` for missing keys and non-dictionaries.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_dictionary()?.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }
}

/// Parse a complete document holding a single root value.
pub fn parse(text: &str) -> Result<Value> {
    let mut parser = Parser::new(text);
    parser.skip_trivia()?;
    let value = parser.parse_value()?;
    parser.skip_trivia()?;
    if parser.peek().is_some() {
        return Err(parser.error("unexpected content after root value"));
    }
    Ok(value)
}

fn is_unquoted_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '$' | '+' | '/' | ':' | '.' | '-')
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        Self {
            text,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.text[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn error(&self, message: &str) -> anyhow::Error {
        let consumed = &self.text[..self.pos];
        let line = consumed.matches('\n').count() + 1;
        let column = consumed
            .rsplit('\n')
            .next()
            .map(|tail| tail.chars().count() + 1)
            .unwrap_or(1);
        anyhow!("plist {line}:{column}: {message}")
    }

    fn expect(&mut self, wanted: char) -> Result<()> {
        self.skip_trivia()?;
        match self.peek() {
            Some(ch) if ch == wanted => {
                self.bump();
                Ok(())
            }
            Some(ch) => Err(self.error(&format!("expected '{wanted}', found '{ch}'"))),
            None => Err(self.error(&format!("expected '{wanted}', found end of input"))),
        }
    }

    /// Skip whitespace and both comment styles.
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(ch), _) if ch.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(ch) = self.bump() {
                        if ch == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.pos;
                    match self.text[self.pos + 2..].find("*/") {
                        Some(offset) => self.pos += 2 + offset + 2,
                        None => {
                            self.pos = start;
                            return Err(self.error("unterminated comment"));
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value> {
        self.skip_trivia()?;
        match self.peek() {
            Some('{') => self.nested(Self::parse_dictionary),
            Some('(') => self.nested(Self::parse_array),
            Some('<') => self.parse_data(),
            Some('"') | Some('\'') => self.parse_quoted().map(Value::String),
            Some(ch) if is_unquoted_char(ch) => Ok(Value::String(self.parse_unquoted())),
            Some(ch) => Err(self.error(&format!("unexpected character '{ch}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn nested(&mut self, parse: fn(&mut Self) -> Result<Value>) -> Result<Value> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error(&format!(
                "nesting deeper than {MAX_NESTING_DEPTH} levels"
            )));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn parse_dictionary(&mut self) -> Result<Value> {
        self.expect('{')?;
        let mut dict = Dictionary::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Dictionary(dict));
            }
            let key = match self.parse_value()? {
                Value::String(key) => key,
                _ => return Err(self.error("dictionary key must be a string")),
            };
            self.expect('=')?;
            let value = self.parse_value()?;
            self.expect(';')?;
            dict.insert(key, value);
        }
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.expect('(')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(')') {
                self.bump();
                return Ok(Value::Array(items));
            }
            items.push(self.parse_value()?);
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(')') => {}
                Some(ch) => return Err(self.error(&format!("expected ',' or ')', found '{ch}'"))),
                None => return Err(self.error("unterminated array")),
            }
        }
    }

    fn parse_data(&mut self) -> Result<Value> {
        self.expect('<')?;
        let mut digits = Vec::new();
        loop {
            match self.bump() {
                Some('>') => break,
                Some(ch) if ch.is_whitespace() => {}
                Some(ch) => match ch.to_digit(16) {
                    Some(digit) => digits.push(digit as u8),
                    None => return Err(self.error(&format!("invalid hex digit '{ch}' in data"))),
                },
                None => return Err(self.error("unterminated data")),
            }
        }
        let pairs = digits.chunks_exact(2);
        if !pairs.remainder().is_empty() {
            return Err(self.error("data has an odd number of hex digits"));
        }
        Ok(Value::Data(pairs.map(|pair| (pair[0] << 4) | pair[1]).collect()))
    }

    fn parse_unquoted(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(ch) if is_unquoted_char(ch)) {
            self.bump();
        }
        self.text[start..self.pos].to_string()
    }

    fn parse_quoted(&mut self) -> Result<String> {
        let quote = self
            .bump()
            .ok_or_else(|| self.error("expected quoted string"))?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(ch) if ch == quote => return Ok(out),
                Some('\\') => out.push(self.parse_escape()?),
                Some(ch) => out.push(ch),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn parse_escape(&mut self) -> Result<char> {
        let ch = self
            .bump()
            .ok_or_else(|| self.error("unterminated escape"))?;
        let escaped = match ch {
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{b}',
            'U' => {
                let code = self.take_digits(16, 4);
                match code.and_then(char::from_u32) {
                    Some(decoded) => decoded,
                    None => return Err(self.error("invalid \\U escape")),
                }
            }
            '0'..='7' => {
                let mut code = ch.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    match self.peek().and_then(|next| next.to_digit(8)) {
                        Some(digit) => {
                            self.bump();
                            code = code * 8 + digit;
                        }
                        None => break,
                    }
                }
                char::from_u32(code).ok_or_else(|| self.error("invalid octal escape"))?
            }
            // `\"`, `\'`, `\\`, and escaped newlines stand for themselves.
            other => other,
        };
        Ok(escaped)
    }

    fn take_digits(&mut self, radix: u32, max: usize) -> Option<u32> {
        let mut code = None;
        for _ in 0..max {
            let Some(digit) = self.peek().and_then(|next| next.to_digit(radix)) else {
                break;
            };
            self.bump();
            code = Some(code.unwrap_or(0) * radix + digit);
        }
        code
    }
}
