//! Query lexer (tokenizer).
//!
//! Converts a query string into a stream of positioned tokens for the
//! parser. Escape sequences are resolved here, exactly once: token text
//! never contains a backslash-escaped form, and the parser never
//! re-applies unescaping.

use std::{iter::Peekable, str::Chars};

use serde::Serialize;

use crate::error::ParseError;

/// Characters that must be escaped with a backslash to appear literally
/// in a word, and that [`escape`] prefixes with one.
const RESERVED: &str = "!(){}[]^\"~*?\\:+-";

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    /// A bare word (search term, field name, or range bound).
    Word,
    /// A double-quoted phrase (quotes stripped, content unescaped).
    Phrase,
    /// A word consisting entirely of `digits[.digits]`.
    Number,
    /// `:` field separator.
    Colon,
    /// `[` inclusive range open.
    LBrack,
    /// `]` inclusive range close.
    RBrack,
    /// `{` exclusive range open.
    LBrace,
    /// `}` exclusive range close.
    RBrace,
    /// `~` fuzzy/proximity marker.
    Tilde,
    /// `^` boost marker.
    Carat,
    /// `(` group open.
    LParen,
    /// `)` group close.
    RParen,
    /// The `AND` keyword or `&&`.
    And,
    /// The `OR` keyword or `||`.
    Or,
    /// The `NOT` keyword or `!`.
    Not,
    /// The `TO` keyword between range bounds.
    To,
    /// `+` required modifier.
    Plus,
    /// `-` prohibited modifier.
    Minus,
}

/// A token in the query language. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    /// What was recognized.
    pub kind: TokenKind,
    /// Literal text, with escape sequences already resolved.
    pub text: String,
    /// Byte offset of the token's first character in the input.
    pub offset: usize,
}

impl Token {
    /// Creates a token.
    fn new(kind: TokenKind, text: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            offset,
        }
    }
}

/// Returns true for characters that may appear unescaped in a word.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '*' | '?' | '_' | '+' | '.' | '-')
}

/// Returns true if `text` is entirely `digits` or `digits.digits`.
fn is_number(text: &str) -> bool {
    let parts: Vec<&str> = text.split('.').collect();
    parts.len() <= 2
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}

/// Classifies a finished word run as a number or a plain word.
fn number_or_word(text: &str) -> TokenKind {
    if is_number(text) {
        TokenKind::Number
    } else {
        TokenKind::Word
    }
}

/// Tokenizes a query string.
struct Lexer<'a> {
    /// The original input string.
    input: &'a str,
    /// Character iterator with one-character lookahead.
    chars: Peekable<Chars<'a>>,
    /// Current byte position in input.
    position: usize,
    /// Whether the cursor is between a range opener and its closer.
    /// `TO` is a keyword only here, and `and`/`or`/`not` never are.
    in_range: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
            in_range: false,
        }
    }

    /// Creates an error at a specific position.
    fn error_at(&self, message: impl Into<String>, position: usize) -> ParseError {
        ParseError::lex(message, position, self.input)
    }

    /// Tokenizes the entire input, returning all tokens or an error.
    fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        Ok(tokens)
    }

    /// Returns the next token, or None if at end of input.
    fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        self.skip_whitespace();

        let Some(&ch) = self.chars.peek() else {
            return Ok(None);
        };

        let token = match ch {
            '"' => self.read_phrase()?,
            '(' => self.punct(TokenKind::LParen, ch),
            ')' => self.punct(TokenKind::RParen, ch),
            '[' => {
                self.in_range = true;
                self.punct(TokenKind::LBrack, ch)
            }
            ']' => {
                self.in_range = false;
                self.punct(TokenKind::RBrack, ch)
            }
            '{' => {
                self.in_range = true;
                self.punct(TokenKind::LBrace, ch)
            }
            '}' => {
                self.in_range = false;
                self.punct(TokenKind::RBrace, ch)
            }
            ':' => self.punct(TokenKind::Colon, ch),
            '~' => self.punct(TokenKind::Tilde, ch),
            '^' => self.punct(TokenKind::Carat, ch),
            '!' => self.punct(TokenKind::Not, ch),
            '&' => self.read_pair('&', TokenKind::And)?,
            '|' => self.read_pair('|', TokenKind::Or)?,
            '+' if self.next_starts_term() => self.punct(TokenKind::Plus, ch),
            '-' if self.next_starts_term() => self.punct(TokenKind::Minus, ch),
            c if is_word_char(c) || c == '\\' => self.read_word()?,
            c => {
                return Err(self.error_at(format!("unexpected character '{c}'"), self.position));
            }
        };

        Ok(Some(token))
    }

    /// Consumes a single punctuation character as a token.
    fn punct(&mut self, kind: TokenKind, ch: char) -> Token {
        let offset = self.position;
        self.advance();
        Token::new(kind, ch, offset)
    }

    /// Consumes a doubled operator character (`&&` or `||`).
    fn read_pair(&mut self, ch: char, kind: TokenKind) -> Result<Token, ParseError> {
        let offset = self.position;
        self.advance();

        if self.chars.peek() == Some(&ch) {
            self.advance();
            Ok(Token::new(kind, format!("{ch}{ch}"), offset))
        } else {
            Err(self.error_at(format!("expected '{ch}{ch}'"), offset))
        }
    }

    /// Checks whether the character after the current `+`/`-` can start a
    /// term. Only then is the sign a modifier; otherwise it lexes as a
    /// word character (`a-b`, or a lone `-` between spaces).
    fn next_starts_term(&self) -> bool {
        let mut rest = self.input[self.position..].chars();
        rest.next(); // the sign itself

        match rest.next() {
            Some(c) => is_word_char(c) || matches!(c, '\\' | '"' | '(' | '[' | '{'),
            None => false,
        }
    }

    /// Reads a quoted phrase, resolving escapes inside it.
    fn read_phrase(&mut self) -> Result<Token, ParseError> {
        let start = self.position;
        self.advance(); // consume opening quote

        let mut text = String::new();

        loop {
            match self.chars.peek() {
                Some(&'"') => {
                    self.advance(); // consume closing quote
                    return Ok(Token::new(TokenKind::Phrase, text, start));
                }
                Some(&'\\') => {
                    let escape_pos = self.position;
                    self.advance();
                    text.push(self.read_escaped(escape_pos)?);
                }
                Some(&c) => {
                    text.push(c);
                    self.advance();
                }
                None => {
                    return Err(self.error_at("unterminated phrase", start));
                }
            }
        }
    }

    /// Reads a word run, then classifies it as a keyword, number, or word.
    fn read_word(&mut self) -> Result<Token, ParseError> {
        let start = self.position;
        let mut text = String::new();

        loop {
            match self.chars.peek() {
                Some(&'\\') => {
                    let escape_pos = self.position;
                    self.advance();
                    text.push(self.read_escaped(escape_pos)?);
                }
                Some(&c) if is_word_char(c) => {
                    text.push(c);
                    self.advance();
                }
                _ => break,
            }
        }

        Ok(self.classify_word(text, start))
    }

    /// Consumes the character after a backslash, validating it is in the
    /// reserved set. Unescaping happens here and is never re-applied.
    fn read_escaped(&mut self, escape_pos: usize) -> Result<char, ParseError> {
        match self.chars.peek() {
            Some(&c) if RESERVED.contains(c) => {
                self.advance();
                Ok(c)
            }
            Some(&c) => Err(self.error_at(format!("invalid escape '\\{c}'"), escape_pos)),
            None => Err(self.error_at("trailing backslash", escape_pos)),
        }
    }

    /// Resolves a finished word run to its token kind.
    ///
    /// `AND`/`OR`/`NOT` are keywords (case-insensitive) only as whole
    /// tokens outside a range and not immediately followed by `:` (a
    /// keyword spelling before a colon is a field name). `TO` is a
    /// keyword only between range delimiters.
    fn classify_word(&mut self, text: String, offset: usize) -> Token {
        let followed_by_colon = self.chars.peek() == Some(&':');

        let kind = if self.in_range {
            if text.eq_ignore_ascii_case("TO") {
                TokenKind::To
            } else {
                number_or_word(&text)
            }
        } else if followed_by_colon {
            number_or_word(&text)
        } else if text.eq_ignore_ascii_case("AND") {
            TokenKind::And
        } else if text.eq_ignore_ascii_case("OR") {
            TokenKind::Or
        } else if text.eq_ignore_ascii_case("NOT") {
            TokenKind::Not
        } else {
            number_or_word(&text)
        };

        Token::new(kind, text, offset)
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Advances to the next character.
    fn advance(&mut self) {
        if let Some(ch) = self.chars.next() {
            self.position += ch.len_utf8();
        }
    }
}

/// Tokenizes a query string.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    Lexer::new(input).tokenize()
}

/// Escapes every reserved query character in `text` with a backslash.
///
/// The inverse of the lexer's single-pass unescape: parsing the escaped
/// form yields `text` literally. Not idempotent: escaping an already
/// escaped string escapes its backslashes again, and a single parse will
/// not undo both layers.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for ch in text.chars() {
        if RESERVED.contains(ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }

    escaped
}
