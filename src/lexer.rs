//! Lexer for the Mini-C source language.
//!
//! Produces a flat token stream over the raw source bytes. Keywords and
//! fixed-spelling punctuation carry no lexeme; the kind alone determines
//! their text; identifier and integer literal tokens intern their text in
//! the compilation arena. Positions are byte offsets of a token's first
//! character.
//!
//! Unrecognised characters become `Unknown` tokens rather than failing the
//! lexer itself; the consuming stage reports them as lexical errors.

use crate::arena::Arena;
use std::fmt;

/// Closed set of token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    IntLiteral,
    KwInt,
    KwVoid,
    KwReturn,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semicolon,
    Tilde,
    Minus,
    MinusMinus,
    Plus,
    Star,
    Slash,
    Percent,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    EqualEqual,
    BangEqual,
    Bang,
    AmpAmp,
    PipePipe,
    Equal,
    /// A character outside the language; the token's lexeme carries it
    Unknown,
    Eof,
}

impl TokenKind {
    /// Spelling for kinds whose text is determined by the kind alone.
    pub fn fixed_spelling(self) -> Option<&'static str> {
        match self {
            TokenKind::KwInt => Some("int"),
            TokenKind::KwVoid => Some("void"),
            TokenKind::KwReturn => Some("return"),
            TokenKind::LParen => Some("("),
            TokenKind::RParen => Some(")"),
            TokenKind::LBrace => Some("{"),
            TokenKind::RBrace => Some("}"),
            TokenKind::Semicolon => Some(";"),
            TokenKind::Tilde => Some("~"),
            TokenKind::Minus => Some("-"),
            TokenKind::MinusMinus => Some("--"),
            TokenKind::Plus => Some("+"),
            TokenKind::Star => Some("*"),
            TokenKind::Slash => Some("/"),
            TokenKind::Percent => Some("%"),
            TokenKind::Less => Some("<"),
            TokenKind::Greater => Some(">"),
            TokenKind::LessEqual => Some("<="),
            TokenKind::GreaterEqual => Some(">="),
            TokenKind::EqualEqual => Some("=="),
            TokenKind::BangEqual => Some("!="),
            TokenKind::Bang => Some("!"),
            TokenKind::AmpAmp => Some("&&"),
            TokenKind::PipePipe => Some("||"),
            TokenKind::Equal => Some("="),
            TokenKind::Identifier
            | TokenKind::IntLiteral
            | TokenKind::Unknown
            | TokenKind::Eof => None,
        }
    }
}

/// How a kind reads in diagnostics: fixed spellings quoted, classes named.
impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fixed_spelling() {
            Some(text) => write!(f, "'{}'", text),
            None => match self {
                TokenKind::Identifier => write!(f, "identifier"),
                TokenKind::IntLiteral => write!(f, "integer literal"),
                TokenKind::Unknown => write!(f, "unknown character"),
                _ => write!(f, "end of input"),
            },
        }
    }
}

/// A single token: kind, optional arena-interned lexeme, byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Present only for identifiers, integer literals and unknown characters
    pub lexeme: Option<&'a str>,
    pub offset: usize,
}

impl<'a> Token<'a> {
    /// The token's exact source text (empty only for `Eof`).
    pub fn source_text(&self) -> &str {
        self.lexeme
            .or_else(|| self.kind.fixed_spelling())
            .unwrap_or("")
    }
}

/// One line of `--lex` output: offset, kind, lexeme when present.
impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5}  {:?}", self.offset, self.kind)?;
        if let Some(lexeme) = self.lexeme {
            write!(f, " {}", lexeme)?;
        }
        Ok(())
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    arena: &'a Arena,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, arena: &'a Arena) -> Self {
        Lexer {
            source,
            pos: 0,
            arena,
        }
    }

    /// Scan the next token. Returns `Eof` forever once the input is spent.
    pub fn next_token(&mut self) -> Token<'a> {
        self.skip_whitespace();
        let start = self.pos;
        let bytes = self.source.as_bytes();
        let Some(&byte) = bytes.get(self.pos) else {
            return Token {
                kind: TokenKind::Eof,
                lexeme: None,
                offset: start,
            };
        };
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.identifier_or_keyword(start),
            b'0'..=b'9' => self.integer_literal(start),
            _ => self.operator_or_unknown(start),
        }
    }

    /// Run the lexer to completion, `Eof` token included.
    pub fn tokenize(mut self) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.source.as_bytes();
        while let Some(&byte) = bytes.get(self.pos) {
            if byte.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn identifier_or_keyword(&mut self, start: usize) -> Token<'a> {
        let bytes = self.source.as_bytes();
        while let Some(&byte) = bytes.get(self.pos) {
            if byte == b'_' || byte.is_ascii_alphanumeric() {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = &self.source[start..self.pos];
        let kind = match text {
            "int" => TokenKind::KwInt,
            "void" => TokenKind::KwVoid,
            "return" => TokenKind::KwReturn,
            _ => TokenKind::Identifier,
        };
        let lexeme = match kind {
            TokenKind::Identifier => Some(self.arena.alloc_str(text)),
            _ => None,
        };
        Token {
            kind,
            lexeme,
            offset: start,
        }
    }

    fn integer_literal(&mut self, start: usize) -> Token<'a> {
        let bytes = self.source.as_bytes();
        while let Some(&byte) = bytes.get(self.pos) {
            if byte.is_ascii_digit() {
                self.pos += 1;
            } else {
                break;
            }
        }
        Token {
            kind: TokenKind::IntLiteral,
            lexeme: Some(self.arena.alloc_str(&self.source[start..self.pos])),
            offset: start,
        }
    }

    /// Multi-character operators first (longest match), then single
    /// characters, then `Unknown`.
    fn operator_or_unknown(&mut self, start: usize) -> Token<'a> {
        let rest = &self.source.as_bytes()[self.pos..];
        let two: Option<TokenKind> = match rest {
            [b'<', b'=', ..] => Some(TokenKind::LessEqual),
            [b'>', b'=', ..] => Some(TokenKind::GreaterEqual),
            [b'=', b'=', ..] => Some(TokenKind::EqualEqual),
            [b'!', b'=', ..] => Some(TokenKind::BangEqual),
            [b'&', b'&', ..] => Some(TokenKind::AmpAmp),
            [b'|', b'|', ..] => Some(TokenKind::PipePipe),
            [b'-', b'-', ..] => Some(TokenKind::MinusMinus),
            _ => None,
        };
        if let Some(kind) = two {
            self.pos += 2;
            return Token {
                kind,
                lexeme: None,
                offset: start,
            };
        }
        let one: Option<TokenKind> = match rest[0] {
            b'(' => Some(TokenKind::LParen),
            b')' => Some(TokenKind::RParen),
            b'{' => Some(TokenKind::LBrace),
            b'}' => Some(TokenKind::RBrace),
            b';' => Some(TokenKind::Semicolon),
            b'~' => Some(TokenKind::Tilde),
            b'-' => Some(TokenKind::Minus),
            b'+' => Some(TokenKind::Plus),
            b'*' => Some(TokenKind::Star),
            b'/' => Some(TokenKind::Slash),
            b'%' => Some(TokenKind::Percent),
            b'<' => Some(TokenKind::Less),
            b'>' => Some(TokenKind::Greater),
            b'!' => Some(TokenKind::Bang),
            b'=' => Some(TokenKind::Equal),
            _ => None,
        };
        if let Some(kind) = one {
            self.pos += 1;
            return Token {
                kind,
                lexeme: None,
                offset: start,
            };
        }
        // Advance by a whole character so multi-byte input cannot wedge the
        // scanner on a non-boundary position.
        let ch_len = self.source[self.pos..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        self.pos += ch_len;
        Token {
            kind: TokenKind::Unknown,
            lexeme: Some(self.arena.alloc_str(&self.source[start..start + ch_len])),
            offset: start,
        }
    }
}
