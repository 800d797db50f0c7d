// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Tolerant JavaScript/TypeScript lexer for the source rewrite passes.
//!
//! Produces tokens with byte spans over the original source. Punctuation is
//! deliberately emitted one character at a time (`>>` is two tokens); the
//! rewrite passes check span adjacency when they need a multi-character
//! operator, which keeps angle-bracket matching in type positions trivial.

use unicode_xid::UnicodeXID;

/// A byte range in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length of this span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if this span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// The kinds of tokens the rewrite passes care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword (the passes distinguish by text)
    Ident,
    /// Numeric literal
    Number,
    /// Quoted string literal, quotes included
    String,
    /// One chunk of a template literal: `` `..${ ``, `}..${`, or `` }..` ``
    TemplateChunk,
    /// Regular expression literal
    Regex,
    /// Single punctuation character
    Punct(char),
    /// `// ...` comment (newline excluded)
    LineComment,
    /// `/* ... */` comment
    BlockComment,
}

/// A token with its span in the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The span in the source
    pub span: Span,
}

/// Lexer failure at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Byte offset of the failure
    pub offset: usize,
    /// Human-readable description
    pub message: String,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at byte {}", self.message, self.offset)
    }
}

/// Keywords after which a `/` starts a regular expression literal.
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

/// Tokenize `source`, skipping whitespace.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).run()
}

struct Lexer<'s> {
    src: &'s str,
    bytes: &'s [u8],
    pos: usize,
    tokens: Vec<Token>,
    /// Brace depth per open template interpolation.
    template_stack: Vec<u32>,
}

impl<'s> Lexer<'s> {
    fn new(src: &'s str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
            template_stack: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        while self.pos < self.bytes.len() {
            let start = self.pos;
            let c = self.current_char();
            match c {
                c if c.is_whitespace() => {
                    self.pos += c.len_utf8();
                }
                '/' if self.peek_byte(1) == Some(b'/') => self.line_comment(start),
                '/' if self.peek_byte(1) == Some(b'*') => self.block_comment(start)?,
                '/' if self.regex_allowed() => self.regex(start)?,
                '\'' | '"' => self.string(start, c)?,
                '`' => self.template_chunk(start)?,
                '}' if self.resumes_template() => {
                    self.template_stack.pop();
                    self.template_chunk(start)?;
                }
                '{' => {
                    if let Some(depth) = self.template_stack.last_mut() {
                        *depth += 1;
                    }
                    self.punct(start, '{');
                }
                '}' => {
                    if let Some(depth) = self.template_stack.last_mut() {
                        *depth -= 1;
                    }
                    self.punct(start, '}');
                }
                c if is_ident_start(c) => self.ident(start),
                c if c.is_ascii_digit() => self.number(start),
                '.' if self.peek_byte(1).is_some_and(|b| b.is_ascii_digit()) => self.number(start),
                c => self.punct(start, c),
            }
        }
        if self.template_stack.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.error(self.pos, "unterminated template literal"))
        }
    }

    fn current_char(&self) -> char {
        self.src[self.pos..].chars().next().unwrap_or('\0')
    }

    fn peek_byte(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn error(&self, offset: usize, message: &str) -> LexError {
        LexError {
            offset,
            message: message.to_string(),
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, self.pos),
        });
    }

    fn punct(&mut self, start: usize, c: char) {
        self.pos += c.len_utf8();
        self.push(TokenKind::Punct(c), start);
    }

    fn ident(&mut self, start: usize) {
        while self.pos < self.bytes.len() && is_ident_continue(self.current_char()) {
            self.pos += self.current_char().len_utf8();
        }
        self.push(TokenKind::Ident, start);
    }

    fn number(&mut self, start: usize) {
        // Numeric shape does not matter to the rewrite passes; consume the
        // maximal run of digit-ish characters (hex, exponents, separators,
        // bigint suffix).
        while self.pos < self.bytes.len() {
            let c = self.current_char();
            let at_exponent_sign = (c == '+' || c == '-')
                && matches!(self.bytes.get(self.pos.wrapping_sub(1)), Some(b'e' | b'E'))
                && self.src[start..self.pos].starts_with(|f: char| f.is_ascii_digit() || f == '.');
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || at_exponent_sign {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.push(TokenKind::Number, start);
    }

    fn line_comment(&mut self, start: usize) {
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
        self.push(TokenKind::LineComment, start);
    }

    fn block_comment(&mut self, start: usize) -> Result<(), LexError> {
        self.pos += 2;
        while self.pos + 1 < self.bytes.len() {
            if self.bytes[self.pos] == b'*' && self.bytes[self.pos + 1] == b'/' {
                self.pos += 2;
                self.push(TokenKind::BlockComment, start);
                return Ok(());
            }
            self.pos += 1;
        }
        Err(self.error(start, "unterminated block comment"))
    }

    fn string(&mut self, start: usize, quote: char) -> Result<(), LexError> {
        self.pos += 1;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'\n' => return Err(self.error(start, "unterminated string literal")),
                b if b == quote as u8 => {
                    self.pos += 1;
                    self.push(TokenKind::String, start);
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Err(self.error(start, "unterminated string literal"))
    }

    /// Scan a template chunk starting at a backtick or at the `}` that closes
    /// an interpolation. Ends at `${` (pushing interpolation state) or at the
    /// closing backtick.
    fn template_chunk(&mut self, start: usize) -> Result<(), LexError> {
        self.pos += 1; // the opening backtick or resuming `}`
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'`' => {
                    self.pos += 1;
                    self.push(TokenKind::TemplateChunk, start);
                    return Ok(());
                }
                b'$' if self.peek_byte(1) == Some(b'{') => {
                    self.pos += 2;
                    self.push(TokenKind::TemplateChunk, start);
                    self.template_stack.push(0);
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Err(self.error(start, "unterminated template literal"))
    }

    fn resumes_template(&self) -> bool {
        self.template_stack.last() == Some(&0)
    }

    fn regex(&mut self, start: usize) -> Result<(), LexError> {
        self.pos += 1;
        let mut in_class = false;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'\n' => return Err(self.error(start, "unterminated regular expression")),
                b'[' => {
                    in_class = true;
                    self.pos += 1;
                }
                b']' => {
                    in_class = false;
                    self.pos += 1;
                }
                b'/' if !in_class => {
                    self.pos += 1;
                    while self.pos < self.bytes.len()
                        && self.bytes[self.pos].is_ascii_lowercase()
                    {
                        self.pos += 1;
                    }
                    self.push(TokenKind::Regex, start);
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Err(self.error(start, "unterminated regular expression"))
    }

    /// Standard heuristic: `/` starts a regex when the previous significant
    /// token cannot end an expression.
    fn regex_allowed(&self) -> bool {
        let prev = self
            .tokens
            .iter()
            .rev()
            .find(|t| !matches!(t.kind, TokenKind::LineComment | TokenKind::BlockComment));
        match prev {
            None => true,
            Some(tok) => match tok.kind {
                TokenKind::Ident => {
                    let text = &self.src[tok.span.start..tok.span.end];
                    REGEX_PRECEDING_KEYWORDS.contains(&text)
                }
                TokenKind::Number | TokenKind::String | TokenKind::Regex => false,
                TokenKind::TemplateChunk => self.src[..tok.span.end].ends_with("${"),
                TokenKind::Punct(c) => !matches!(c, ')' | ']' | '}'),
                TokenKind::LineComment | TokenKind::BlockComment => true,
            },
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '$' || c == '_' || UnicodeXID::is_xid_start(c)
}

fn is_ident_continue(c: char) -> bool {
    c == '$' || c == '_' || UnicodeXID::is_xid_continue(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn texts(source: &str) -> Vec<String> {
        lex(source)
            .unwrap()
            .into_iter()
            .map(|t| source[t.span.start..t.span.end].to_string())
            .collect()
    }

    #[test]
    fn test_idents_and_puncts_are_single_chars() {
        assert_eq!(
            texts("a >>= b"),
            vec!["a", ">", ">", "=", "b"],
        );
        assert_eq!(texts("x=>y"), vec!["x", "=", ">", "y"]);
    }

    #[test]
    fn test_strings_and_comments() {
        let toks = kinds(r#"'a\'b' "c" // tail"#);
        assert_eq!(
            toks,
            vec![TokenKind::String, TokenKind::String, TokenKind::LineComment]
        );
        assert_eq!(kinds("/* x */ y"), vec![TokenKind::BlockComment, TokenKind::Ident]);
    }

    #[test]
    fn test_template_with_interpolation() {
        let toks = texts("`a${x + 1}b`");
        assert_eq!(toks, vec!["`a${", "x", "+", "1", "}b`"]);
    }

    #[test]
    fn test_nested_braces_inside_interpolation() {
        let toks = texts("`v=${ {a: 1}.a }!`");
        assert_eq!(toks.first().map(String::as_str), Some("`v=${"));
        assert_eq!(toks.last().map(String::as_str), Some("}!`"));
    }

    #[test]
    fn test_regex_versus_division() {
        assert_eq!(
            kinds("a / b"),
            vec![TokenKind::Ident, TokenKind::Punct('/'), TokenKind::Ident]
        );
        let toks = lex("return /ab+c/g;").unwrap();
        assert_eq!(toks[1].kind, TokenKind::Regex);
        let toks = lex("x = /[/]/;").unwrap();
        assert_eq!(toks[2].kind, TokenKind::Regex);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("0x1f 1_000 1.5e-3 10n"), vec![TokenKind::Number; 4]);
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        assert!(lex("'oops").is_err());
    }
}
