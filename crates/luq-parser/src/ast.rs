//! Query abstract syntax tree.
//!
//! The data structures produced by parsing. The tree is immutable after
//! construction; downstream consumers (a query compiler, a scorer) walk
//! it by pattern matching over [`Expr`] and [`TermBody`].

use std::fmt;

use serde::Serialize;

use crate::lexer::escape;

/// Required/prohibited marker on a term (`+`/`-` prefix).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Modifier {
    /// The term must be present (`+`).
    Required,
    /// The term must be absent (`-`).
    Prohibited,
}

/// One endpoint of a range search.
///
/// An unescaped `*` bound is represented structurally rather than as a
/// literal word, so consumers can special-case open ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Bound {
    /// No constraint on this end (`*`).
    Unbounded,
    /// An ordinary bound value.
    Value(String),
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => write!(f, "*"),
            Self::Value(value) => write!(f, "{value:?}"),
        }
    }
}

/// An interval query over ordered terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeSearch {
    /// Lower endpoint.
    pub lower: Bound,
    /// Upper endpoint.
    pub upper: Bound,
    /// Whether the endpoints themselves match (brackets) or not (braces).
    pub inclusive: bool,
}

impl fmt::Display for RangeSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (open, close) = if self.inclusive { ('[', ']') } else { ('{', '}') };
        write!(f, "{open}{} TO {}{close}", self.lower, self.upper)
    }
}

/// The body of a [`Term`].
///
/// Fuzziness lives on words and proximity on phrases, so a term can
/// never carry both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TermBody {
    /// A single word, optionally fuzzy-matched.
    Word {
        /// The word text (escapes already resolved).
        text: String,
        /// Permitted edit distance in [0.0, 1.0]; None means exact.
        fuzzy: Option<f32>,
    },
    /// An exact phrase, optionally with word proximity.
    Phrase {
        /// The phrase content (quotes stripped, escapes resolved).
        text: String,
        /// Maximum word distance; None means adjacent.
        proximity: Option<u32>,
    },
    /// An interval of terms.
    Range(RangeSearch),
    /// A parenthesized sub-expression.
    Group(Box<Expr>),
}

/// A leaf query atom: optionally field-scoped, with optional modifiers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Term {
    /// Field to search, or None for the default field.
    pub field: Option<String>,
    /// What to match.
    pub body: TermBody,
    /// Score multiplier (`^2.5`); None means 1.0. Always positive.
    pub boost: Option<f32>,
    /// Required/prohibited marker, if any.
    pub modifier: Option<Modifier>,
}

impl Term {
    /// Creates a plain term from a body.
    pub fn new(body: TermBody) -> Self {
        Self {
            field: None,
            body,
            boost: None,
            modifier: None,
        }
    }

    /// Creates an exact word term.
    pub fn word(text: impl Into<String>) -> Self {
        Self::new(TermBody::Word {
            text: text.into(),
            fuzzy: None,
        })
    }

    /// Creates an exact phrase term.
    pub fn phrase(text: impl Into<String>) -> Self {
        Self::new(TermBody::Phrase {
            text: text.into(),
            proximity: None,
        })
    }

    /// Scopes the term to a field.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Attaches a boost factor.
    #[must_use]
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = Some(boost);
        self
    }

    /// Marks the term required or prohibited.
    #[must_use]
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = Some(modifier);
        self
    }

    /// Formats the term as a subtree at the given indentation level.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);

        let mut notes = Vec::new();
        match self.modifier {
            Some(Modifier::Required) => notes.push("required".to_string()),
            Some(Modifier::Prohibited) => notes.push("prohibited".to_string()),
            None => {}
        }
        if let Some(field) = &self.field {
            notes.push(format!("field: {field:?}"));
        }
        if let Some(boost) = self.boost {
            notes.push(format!("boost: {boost}"));
        }

        if notes.is_empty() {
            writeln!(f, "{prefix}Term")?;
        } else {
            writeln!(f, "{prefix}Term({})", notes.join(", "))?;
        }

        match &self.body {
            TermBody::Word { text, fuzzy: None } => writeln!(f, "{prefix}  Word({text:?})"),
            TermBody::Word {
                text,
                fuzzy: Some(fuzzy),
            } => writeln!(f, "{prefix}  Word({text:?}, fuzzy: {fuzzy})"),
            TermBody::Phrase {
                text,
                proximity: None,
            } => writeln!(f, "{prefix}  Phrase({text:?})"),
            TermBody::Phrase {
                text,
                proximity: Some(proximity),
            } => writeln!(f, "{prefix}  Phrase({text:?}, proximity: {proximity})"),
            TermBody::Range(range) => writeln!(f, "{prefix}  Range({range})"),
            TermBody::Group(expr) => {
                writeln!(f, "{prefix}  Group")?;
                expr.fmt_tree(f, indent + 2)
            }
        }
    }

    /// Renders the term back as query text.
    fn fmt_query(&self) -> String {
        let mut out = String::new();

        match self.modifier {
            Some(Modifier::Required) => out.push('+'),
            Some(Modifier::Prohibited) => out.push('-'),
            None => {}
        }

        if let Some(field) = &self.field {
            out.push_str(&escape(field));
            out.push(':');
        }

        match &self.body {
            TermBody::Word { text, fuzzy } => {
                out.push_str(&escape(text));
                if let Some(fuzzy) = fuzzy {
                    out.push_str(&format!("~{fuzzy}"));
                }
            }
            TermBody::Phrase { text, proximity } => {
                out.push('"');
                for ch in text.chars() {
                    if ch == '"' || ch == '\\' {
                        out.push('\\');
                    }
                    out.push(ch);
                }
                out.push('"');
                if let Some(proximity) = proximity {
                    out.push_str(&format!("~{proximity}"));
                }
            }
            TermBody::Range(range) => {
                let (open, close) = if range.inclusive { ('[', ']') } else { ('{', '}') };
                out.push(open);
                out.push_str(&fmt_bound(&range.lower));
                out.push_str(" TO ");
                out.push_str(&fmt_bound(&range.upper));
                out.push(close);
            }
            TermBody::Group(expr) => {
                out.push('(');
                out.push_str(&expr.fmt_query());
                out.push(')');
            }
        }

        if let Some(boost) = self.boost {
            out.push_str(&format!("^{boost}"));
        }

        out
    }
}

/// Renders a range bound as query text. An escaped `\*` value stays
/// distinguishable from the unbounded `*`.
fn fmt_bound(bound: &Bound) -> String {
    match bound {
        Bound::Unbounded => "*".to_string(),
        Bound::Value(value) => escape(value),
    }
}

/// A parsed query expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// A single query atom.
    Term(Term),
    /// Negation: results must NOT match the inner expression.
    Not(Box<Self>),
    /// Conjunction. Left-associative chains nest on the left.
    And(Box<Self>, Box<Self>),
    /// Disjunction. Left-associative chains nest on the left.
    Or(Box<Self>, Box<Self>),
}

impl Expr {
    /// Creates an And node.
    pub fn and(left: Self, right: Self) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    /// Creates an Or node.
    pub fn or(left: Self, right: Self) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    /// Creates a Not node.
    pub fn not(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Formats the expression as a tree with the given indentation level.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match self {
            Self::Term(term) => term.fmt_tree(f, indent),
            Self::Not(inner) => {
                writeln!(f, "{prefix}Not")?;
                inner.fmt_tree(f, indent + 1)
            }
            Self::And(left, right) => {
                writeln!(f, "{prefix}And")?;
                left.fmt_tree(f, indent + 1)?;
                right.fmt_tree(f, indent + 1)
            }
            Self::Or(left, right) => {
                writeln!(f, "{prefix}Or")?;
                left.fmt_tree(f, indent + 1)?;
                right.fmt_tree(f, indent + 1)
            }
        }
    }

    /// Binding strength for parenthesization when rendering query text.
    fn precedence(&self) -> u8 {
        match self {
            Self::Or(..) => 0,
            Self::And(..) => 1,
            Self::Not(_) => 2,
            Self::Term(_) => 3,
        }
    }

    /// Renders the expression as a parseable, semantically equivalent
    /// query string (e.g. `(a OR b) AND NOT c`).
    ///
    /// Parentheses inserted to preserve evaluation order reparse as
    /// groups, so the round-tripped tree can differ structurally while
    /// meaning the same thing.
    pub fn to_query_string(&self) -> String {
        self.fmt_query()
    }

    /// Internal helper for query string rendering.
    fn fmt_query(&self) -> String {
        match self {
            Self::Term(term) => term.fmt_query(),
            Self::Not(inner) => format!("NOT {}", Self::wrapped(inner, 2)),
            Self::And(left, right) => {
                format!("{} AND {}", Self::wrapped(left, 1), Self::wrapped(right, 2))
            }
            Self::Or(left, right) => {
                format!("{} OR {}", Self::wrapped(left, 0), Self::wrapped(right, 1))
            }
        }
    }

    /// Renders a child, parenthesizing it when it binds looser than its
    /// context requires.
    fn wrapped(expr: &Self, min_precedence: u8) -> String {
        let rendered = expr.fmt_query();
        if expr.precedence() < min_precedence {
            format!("({rendered})")
        } else {
            rendered
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_display() {
        let expr = Expr::or(
            Expr::Term(Term::word("a")),
            Expr::not(Expr::Term(Term::word("b"))),
        );

        assert_eq!(
            expr.to_string(),
            "Or\n  Term\n    Word(\"a\")\n  Not\n    Term\n      Word(\"b\")\n"
        );
    }

    #[test]
    fn tree_display_annotations() {
        let expr = Expr::Term(
            Term::word("dog")
                .with_field("title")
                .with_boost(2.5)
                .with_modifier(Modifier::Required),
        );

        assert_eq!(
            expr.to_string(),
            "Term(required, field: \"title\", boost: 2.5)\n  Word(\"dog\")\n"
        );
    }

    #[test]
    fn query_string_for_terms() {
        let expr = Expr::Term(Term::word("jakarta").with_boost(4.0));
        assert_eq!(expr.to_query_string(), "jakarta^4");

        let expr = Expr::Term(Term::phrase("jakarta apache"));
        assert_eq!(expr.to_query_string(), "\"jakarta apache\"");
    }

    #[test]
    fn query_string_escapes_reserved_characters() {
        let expr = Expr::Term(Term::word("(1+1):2"));
        assert_eq!(expr.to_query_string(), r"\(1\+1\)\:2");
    }

    #[test]
    fn query_string_for_ranges() {
        let range = RangeSearch {
            lower: Bound::Value("20020101".to_string()),
            upper: Bound::Unbounded,
            inclusive: true,
        };
        let expr = Expr::Term(Term::new(TermBody::Range(range)).with_field("mod_date"));
        assert_eq!(expr.to_query_string(), "mod_date:[20020101 TO *]");
    }

    #[test]
    fn query_string_parenthesizes_by_precedence() {
        let a = || Expr::Term(Term::word("a"));
        let b = || Expr::Term(Term::word("b"));
        let c = || Expr::Term(Term::word("c"));

        let expr = Expr::and(Expr::or(a(), b()), c());
        assert_eq!(expr.to_query_string(), "(a OR b) AND c");

        let expr = Expr::or(a(), Expr::and(b(), c()));
        assert_eq!(expr.to_query_string(), "a OR b AND c");

        let expr = Expr::not(Expr::and(a(), b()));
        assert_eq!(expr.to_query_string(), "NOT (a AND b)");
    }

    #[test]
    fn query_string_keeps_left_chains_flat() {
        let a = Expr::Term(Term::word("a"));
        let b = Expr::Term(Term::word("b"));
        let c = Expr::Term(Term::word("c"));

        let expr = Expr::or(Expr::or(a, b), c);
        assert_eq!(expr.to_query_string(), "a OR b OR c");
    }

    #[test]
    fn range_display() {
        let range = RangeSearch {
            lower: Bound::Unbounded,
            upper: Bound::Value("z".to_string()),
            inclusive: false,
        };
        assert_eq!(range.to_string(), "{* TO \"z\"}");
    }
}
