//! Query parser.
//!
//! Parses a token stream into a query AST. Terms are parsed by recursive
//! descent; the boolean composition uses precedence climbing over a
//! static operator table, so parsing is linear in the token count with
//! no backtracking or memoization.
//!
//! # Grammar
//!
//! ```text
//! query → expr
//! expr  → unary (("AND" | "OR" | implicit) unary)*
//! unary → ("NOT" | "!") unary | ("+" | "-")? term
//! term  → [field ":"] (word ["~" [number]]
//!                     | phrase ["~" integer]
//!                     | range
//!                     | "(" expr ")") ["^" number]
//! range → ("[" | "{") bound "TO" bound ("]" | "}")
//! ```
//!
//! # Precedence (highest to lowest)
//!
//! 1. `+` / `-` required/prohibited modifiers (attach to a single term)
//! 2. `NOT` / `!` (right-associative)
//! 3. `AND` / `&&`
//! 4. `OR` / `||`, and the implicit join between adjacent terms, which
//!    produces [`ParseOptions::default_operator`]

use crate::{
    ast::{Bound, Expr, Modifier, RangeSearch, Term, TermBody},
    error::ParseError,
    lexer::{Token, TokenKind, tokenize},
    options::{DefaultOperator, ParseOptions},
};

/// Binding strength of `OR` and the implicit join (lowest).
const PREC_OR: u8 = 1;

/// Binding strength of `AND`.
const PREC_AND: u8 = 2;

/// Similarity used for a word `~` with no explicit value.
const DEFAULT_FUZZY: f32 = 0.5;

/// Returns true if a token of this kind can begin a unary expression.
fn can_start_unary(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Word
            | TokenKind::Number
            | TokenKind::Phrase
            | TokenKind::Not
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::LParen
            | TokenKind::LBrack
            | TokenKind::LBrace
    )
}

/// Precedence-climbing parser over a token stream.
struct Parser<'a> {
    /// The original input, for error context and raw-character checks.
    input: &'a str,
    /// Token stream to parse.
    tokens: Vec<Token>,
    /// Current position in the token stream.
    position: usize,
    /// Parse configuration.
    options: &'a ParseOptions,
    /// Current nesting depth (groups and NOT chains).
    depth: usize,
}

impl Parser<'_> {
    /// Parses the token stream into an expression, requiring the entire
    /// input to be consumed.
    fn parse(mut self) -> Result<Expr, ParseError> {
        if self.tokens.is_empty() {
            return Err(self.grammar("empty query", 0));
        }

        let expr = self.parse_expression(PREC_OR)?;

        if let Some(token) = self.peek() {
            return Err(self.grammar(format!("unexpected '{}'", token.text), token.offset));
        }

        Ok(expr)
    }

    /// Parses a boolean composition of unary expressions, folding in
    /// binary operators of at least `min_precedence`.
    ///
    /// Adjacent terms with no connective join under the configured
    /// default operator at the same (lowest) level as explicit `OR`.
    fn parse_expression(&mut self, min_precedence: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let Some(kind) = self.peek_kind() else { break };

            let (precedence, operator, explicit) = match kind {
                TokenKind::And => (PREC_AND, DefaultOperator::And, true),
                TokenKind::Or => (PREC_OR, DefaultOperator::Or, true),
                _ if can_start_unary(kind) => {
                    (PREC_OR, self.options.default_operator, false)
                }
                _ => break,
            };

            if precedence < min_precedence {
                break;
            }
            if explicit {
                self.advance();
            }

            let right = self.parse_expression(precedence + 1)?;
            left = match operator {
                DefaultOperator::And => Expr::and(left, right),
                DefaultOperator::Or => Expr::or(left, right),
            };
        }

        Ok(left)
    }

    /// Parses: unary → ("NOT" | "!") unary | ("+" | "-")? term
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.peek_kind() == Some(TokenKind::Not) {
            let offset = self.tokens[self.position].offset;
            self.advance();

            self.enter_nested(offset)?;
            let inner = self.parse_unary()?;
            self.depth -= 1;

            return Ok(Expr::not(inner));
        }

        Ok(Expr::Term(self.parse_modified_term()?))
    }

    /// Parses a term with an optional leading `+`/`-` modifier.
    fn parse_modified_term(&mut self) -> Result<Term, ParseError> {
        let modifier = match self.peek_kind() {
            Some(TokenKind::Plus) => {
                self.advance();
                Some(Modifier::Required)
            }
            Some(TokenKind::Minus) => {
                self.advance();
                Some(Modifier::Prohibited)
            }
            _ => None,
        };

        if modifier.is_some()
            && matches!(self.peek_kind(), Some(TokenKind::Plus | TokenKind::Minus))
        {
            let token = &self.tokens[self.position];
            return Err(self.grammar(
                "conflicting modifiers: a term cannot be both required and prohibited",
                token.offset,
            ));
        }

        let mut term = self.parse_term()?;
        term.modifier = modifier;
        Ok(term)
    }

    /// Parses one term: optional field prefix, a body, an optional boost.
    fn parse_term(&mut self) -> Result<Term, ParseError> {
        let field = self.parse_field_prefix();

        let body = match self.peek_kind() {
            Some(TokenKind::Word | TokenKind::Number) => self.parse_word_body()?,
            Some(TokenKind::Phrase) => self.parse_phrase_body()?,
            Some(TokenKind::LBrack) => self.parse_range(true)?,
            Some(TokenKind::LBrace) => self.parse_range(false)?,
            Some(TokenKind::LParen) => self.parse_group()?,
            _ => return Err(self.unexpected("expected a term")),
        };

        let boost = self.parse_boost()?;

        Ok(Term {
            field,
            body,
            boost,
            modifier: None,
        })
    }

    /// Consumes `word ':'` if present, returning the field name.
    fn parse_field_prefix(&mut self) -> Option<String> {
        if !matches!(
            self.peek_kind(),
            Some(TokenKind::Word | TokenKind::Number)
        ) {
            return None;
        }
        if self.peek_next().map(|token| token.kind) != Some(TokenKind::Colon) {
            return None;
        }

        let field = self.tokens[self.position].text.clone();
        self.advance(); // field name
        self.advance(); // colon
        Some(field)
    }

    /// Parses a word (or bare number) body with its optional fuzzy
    /// modifier, enforcing the leading-wildcard policy.
    fn parse_word_body(&mut self) -> Result<TermBody, ParseError> {
        let token = self.tokens[self.position].clone();
        self.advance();

        // An escaped leading `\*`/`\?` is a literal, not a wildcard; the
        // raw input distinguishes the two.
        if !self.options.allow_leading_wildcard
            && (token.text.starts_with('*') || token.text.starts_with('?'))
            && !self.input[token.offset..].starts_with('\\')
        {
            return Err(self.grammar(
                format!("leading wildcard in '{}' is not allowed", token.text),
                token.offset,
            ));
        }

        let fuzzy = self.parse_fuzzy()?;

        Ok(TermBody::Word {
            text: token.text,
            fuzzy,
        })
    }

    /// Parses `~` with an optional similarity in [0.0, 1.0], defaulting
    /// to 0.5 when no number follows.
    fn parse_fuzzy(&mut self) -> Result<Option<f32>, ParseError> {
        if !self.check(TokenKind::Tilde) {
            return Ok(None);
        }
        self.advance(); // consume ~

        let (text, offset) = match self.peek_kind() {
            Some(TokenKind::Number) => {
                let token = &self.tokens[self.position];
                (token.text.clone(), token.offset)
            }
            _ => return Ok(Some(DEFAULT_FUZZY)),
        };
        self.advance();

        let value: f32 = text
            .parse()
            .map_err(|_| self.grammar(format!("invalid fuzzy value '{text}'"), offset))?;

        if !(0.0..=1.0).contains(&value) {
            return Err(self.grammar(
                format!("fuzzy value '{text}' must be between 0.0 and 1.0"),
                offset,
            ));
        }

        Ok(Some(value))
    }

    /// Parses a phrase body with its optional proximity modifier. The
    /// proximity integer is required after `~`; phrases have no default.
    fn parse_phrase_body(&mut self) -> Result<TermBody, ParseError> {
        let text = self.tokens[self.position].text.clone();
        self.advance();

        if !self.check(TokenKind::Tilde) {
            return Ok(TermBody::Phrase {
                text,
                proximity: None,
            });
        }
        self.advance(); // consume ~

        let (value_text, offset) = match self.peek_kind() {
            Some(TokenKind::Number) => {
                let token = &self.tokens[self.position];
                (token.text.clone(), token.offset)
            }
            _ => return Err(self.unexpected("expected a proximity integer after '~'")),
        };
        self.advance();

        let proximity: u32 = value_text.parse().map_err(|_| {
            self.grammar(
                format!("proximity '{value_text}' must be a positive integer"),
                offset,
            )
        })?;
        if proximity == 0 {
            return Err(self.grammar(
                format!("proximity '{value_text}' must be a positive integer"),
                offset,
            ));
        }

        Ok(TermBody::Phrase {
            text,
            proximity: Some(proximity),
        })
    }

    /// Parses a range search. Delimiters must match: brackets are
    /// inclusive, braces exclusive.
    fn parse_range(&mut self, inclusive: bool) -> Result<TermBody, ParseError> {
        self.advance(); // consume [ or {

        let lower = self.parse_range_bound()?;

        if self.check(TokenKind::To) {
            self.advance();
        } else {
            return Err(self.unexpected("expected 'TO' between range bounds"));
        }

        let upper = self.parse_range_bound()?;

        let closer = if inclusive {
            TokenKind::RBrack
        } else {
            TokenKind::RBrace
        };
        match self.peek_kind() {
            Some(kind) if kind == closer => self.advance(),
            Some(TokenKind::RBrack | TokenKind::RBrace) => {
                let token = &self.tokens[self.position];
                return Err(self.grammar(
                    format!("mismatched range delimiter '{}'", token.text),
                    token.offset,
                ));
            }
            _ => {
                let expectation = if inclusive {
                    "expected ']' to close the range"
                } else {
                    "expected '}' to close the range"
                };
                return Err(self.unexpected(expectation));
            }
        }

        Ok(TermBody::Range(RangeSearch {
            lower,
            upper,
            inclusive,
        }))
    }

    /// Parses one range endpoint: a word, number, or phrase. An
    /// unescaped `*` is structurally unbounded; `\*` is a literal star.
    fn parse_range_bound(&mut self) -> Result<Bound, ParseError> {
        if !matches!(
            self.peek_kind(),
            Some(TokenKind::Word | TokenKind::Number | TokenKind::Phrase)
        ) {
            return Err(self.unexpected("expected a range bound"));
        }

        let token = self.tokens[self.position].clone();
        self.advance();

        let unbounded = token.kind == TokenKind::Word
            && token.text == "*"
            && self.input[token.offset..].starts_with('*');
        if unbounded {
            Ok(Bound::Unbounded)
        } else {
            Ok(Bound::Value(token.text))
        }
    }

    /// Parses a parenthesized group into a nested expression.
    fn parse_group(&mut self) -> Result<TermBody, ParseError> {
        let open_offset = self.tokens[self.position].offset;
        self.advance(); // consume (

        self.enter_nested(open_offset)?;
        let inner = self.parse_expression(PREC_OR)?;
        self.depth -= 1;

        if self.check(TokenKind::RParen) {
            self.advance();
            Ok(TermBody::Group(Box::new(inner)))
        } else {
            Err(self.unexpected("expected closing parenthesis"))
        }
    }

    /// Parses `^number`, validating it is strictly positive.
    fn parse_boost(&mut self) -> Result<Option<f32>, ParseError> {
        if !self.check(TokenKind::Carat) {
            return Ok(None);
        }
        self.advance(); // consume ^

        let (text, offset) = match self.peek_kind() {
            Some(TokenKind::Number) => {
                let token = &self.tokens[self.position];
                (token.text.clone(), token.offset)
            }
            _ => return Err(self.unexpected("expected a number after '^'")),
        };
        self.advance();

        let value: f32 = text
            .parse()
            .map_err(|_| self.grammar(format!("invalid boost value '{text}'"), offset))?;

        if value <= 0.0 {
            return Err(self.grammar(format!("boost '{text}' must be positive"), offset));
        }

        Ok(Some(value))
    }

    /// Tracks one level of nesting (groups and NOT chains), failing once
    /// the configured depth limit is exceeded.
    fn enter_nested(&mut self, offset: usize) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.options.max_nesting_depth {
            return Err(ParseError::resource_limit(
                format!(
                    "nesting deeper than {} levels",
                    self.options.max_nesting_depth
                ),
                offset,
                self.input,
            ));
        }
        Ok(())
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// Returns the current token kind without consuming it.
    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    /// Returns the token after the current one.
    fn peek_next(&self) -> Option<&Token> {
        self.tokens.get(self.position + 1)
    }

    /// Checks whether the current token has the given kind.
    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Creates a grammar error at the given byte offset.
    fn grammar(&self, message: impl Into<String>, offset: usize) -> ParseError {
        ParseError::grammar(message, offset, self.input)
    }

    /// Creates a grammar error describing what was expected, pointing at
    /// the current token or the end of the input.
    fn unexpected(&self, expectation: &str) -> ParseError {
        match self.peek() {
            Some(token) => self.grammar(
                format!("{expectation}, found '{}'", token.text),
                token.offset,
            ),
            None => self.grammar(expectation, self.input.len()),
        }
    }
}

/// Parses a query string with default options.
pub fn parse(query: &str) -> Result<Expr, ParseError> {
    parse_with_options(query, &ParseOptions::default())
}

/// Parses a query string into an AST.
///
/// The entire input must form one expression: trailing input is always
/// an error, never silently dropped. On failure the returned error
/// carries the byte offset of the offending input.
pub fn parse_with_options(query: &str, options: &ParseOptions) -> Result<Expr, ParseError> {
    let tokens = tokenize(query)?;
    let parser = Parser {
        input: query,
        tokens,
        position: 0,
        options,
        depth: 0,
    };
    parser.parse()
}
