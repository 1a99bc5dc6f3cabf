// src/parser.rs
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    InvalidSyntax { pos: usize, msg: String },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidSyntax { pos, msg } => write!(f, "{msg} at offset {pos}"),
        }
    }
}

/// Deepest nesting of groups, calls and negations a script may use.
pub const MAX_DEPTH: usize = 128;

/// Character cursor shared by the script expression parser.
pub struct Parser<'a> {
    s: &'a str,
    i: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0, depth: 0 }
    }

    /// Enters one nesting level; pair every successful call with `leave`.
    pub fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!("nesting deeper than {MAX_DEPTH} levels")));
        }
        self.depth += 1;
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn error(&self, msg: impl Into<String>) -> ParseError {
        ParseError::InvalidSyntax { pos: self.i, msg: msg.into() }
    }

    pub fn parse_identifier(&mut self) -> Result<String, ParseError> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == '_' || c == '$' || c.is_ascii_alphanumeric() {
                self.i += 1;
            } else {
                break;
            }
        }
        if self.i == start || self.s[start..].starts_with(|c: char| c.is_ascii_digit()) {
            self.i = start;
            return Err(self.error("identifier expected"));
        }
        Ok(self.s[start..self.i].to_string())
    }

    pub fn parse_int(&mut self) -> Result<i64, ParseError> {
        let start = self.i;
        if self.peek_char() == Some('-') {
            self.i += 1;
        }
        self.skip_digits();
        if self.i == start || &self.s[start..self.i] == "-" {
            return Err(self.error("expected integer"));
        }
        self.s[start..self.i]
            .parse::<i64>()
            .map_err(|_| self.error("bad integer"))
    }

    pub fn parse_number_literal(&mut self) -> Result<Value, ParseError> {
        let start = self.i;
        if self.peek_char() == Some('-') {
            self.i += 1;
        }
        self.skip_digits();
        if self.peek_char() == Some('.') {
            self.i += 1;
            self.skip_digits();
        }
        let s = &self.s[start..self.i];
        if s.is_empty() || s == "-" {
            return Err(self.error("number expected"));
        }
        if s.contains('.') {
            let f: f64 = s.parse().map_err(|_| self.error("bad float"))?;
            Ok(Value::from(f))
        } else {
            let i: i64 = s.parse().map_err(|_| self.error("bad int"))?;
            Ok(Value::from(i))
        }
    }

    pub fn parse_quoted_string(&mut self) -> Result<String, ParseError> {
        let quote = self.peek_char().ok_or_else(|| self.error("string expected"))?;
        if quote != '\'' && quote != '"' {
            return Err(self.error("expected quoted string"));
        }
        self.i += 1;
        let mut out = String::new();
        while let Some(c) = self.peek_char() {
            self.i += c.len_utf8();
            if c == quote {
                return Ok(out);
            }
            if c == '\\' {
                if let Some(nc) = self.peek_char() {
                    self.i += nc.len_utf8();
                    match nc {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '\\' => out.push('\\'),
                        '"' => out.push('"'),
                        '\'' => out.push('\''),
                        _ => {
                            out.push('\\');
                            out.push(nc);
                        }
                    }
                } else {
                    break;
                }
            } else {
                out.push(c);
            }
        }
        Err(self.error("unterminated string"))
    }

    pub fn expect(&mut self, c: char) -> Result<(), ParseError> {
        self.skip_ws();
        if self.consume_char(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    pub fn consume_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.i += c.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn consume_str(&mut self, lit: &str) -> bool {
        if self.peek_str(lit) {
            self.i += lit.len();
            true
        } else {
            false
        }
    }

    /// Consumes `kw` only when it is not the prefix of a longer identifier.
    pub fn consume_keyword(&mut self, kw: &str) -> bool {
        if !self.peek_str(kw) {
            return false;
        }
        let next = self.s[self.i + kw.len()..].chars().next();
        if next.is_some_and(|c| c == '_' || c.is_ascii_alphanumeric()) {
            return false;
        }
        self.i += kw.len();
        true
    }

    pub fn peek_char(&self) -> Option<char> {
        self.s[self.i..].chars().next()
    }

    pub fn peek_str(&self, lit: &str) -> bool {
        self.s[self.i..].starts_with(lit)
    }

    pub fn skip_ws(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.i += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn skip_digits(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.i += 1;
            } else {
                break;
            }
        }
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keywords_need_a_boundary() {
        let mut p = Parser::new("trueish");
        assert!(!p.consume_keyword("true"));
        assert_eq!(p.parse_identifier().unwrap(), "trueish");
    }

    #[test]
    fn quoted_strings_unescape() {
        let mut p = Parser::new(r#"'it\'s' "é\n""#);
        assert_eq!(p.parse_quoted_string().unwrap(), "it's");
        p.skip_ws();
        assert_eq!(p.parse_quoted_string().unwrap(), "é\n");
        assert!(p.eof());
    }

    #[test]
    fn depth_is_bounded() {
        let mut p = Parser::new("");
        for _ in 0..MAX_DEPTH {
            p.enter().unwrap();
        }
        assert!(p.enter().is_err());
        p.leave();
        assert!(p.enter().is_ok());
    }

    #[test]
    fn numbers() {
        assert_eq!(Parser::new("-12").parse_number_literal().unwrap(), Value::from(-12));
        assert_eq!(Parser::new("2.5").parse_number_literal().unwrap(), Value::from(2.5));
        assert!(Parser::new("-").parse_number_literal().is_err());
    }
}
