//! Parse configuration.

use serde::Serialize;

/// Default maximum nesting depth for groups and NOT chains.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// The operator used to join adjacent terms written with no explicit
/// connective (`jakarta apache`).
///
/// Reference implementations disagree here: classical Lucene joins with
/// OR, many derived engines with AND. The choice is always explicit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum DefaultOperator {
    /// Adjacent terms must all match.
    And,
    /// Any adjacent term may match (classical Lucene).
    #[default]
    Or,
}

/// Configuration for a parse call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseOptions {
    /// Operator for implicit joins between adjacent terms.
    pub default_operator: DefaultOperator,
    /// Maximum nesting depth of groups and NOT chains before the parse
    /// fails with a resource limit error.
    pub max_nesting_depth: usize,
    /// Whether a word may start with an unescaped `*` or `?`. Off by
    /// default, mirroring common search-engine safety policy.
    pub allow_leading_wildcard: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            default_operator: DefaultOperator::default(),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            allow_leading_wildcard: false,
        }
    }
}

impl ParseOptions {
    /// Sets the implicit join operator.
    #[must_use]
    pub fn with_default_operator(mut self, operator: DefaultOperator) -> Self {
        self.default_operator = operator;
        self
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Allows or forbids leading wildcards in words.
    #[must_use]
    pub fn with_leading_wildcard(mut self, allow: bool) -> Self {
        self.allow_leading_wildcard = allow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classical_lucene() {
        let options = ParseOptions::default();
        assert_eq!(options.default_operator, DefaultOperator::Or);
        assert_eq!(options.max_nesting_depth, DEFAULT_MAX_NESTING_DEPTH);
        assert!(!options.allow_leading_wildcard);
    }

    #[test]
    fn builders_override_fields() {
        let options = ParseOptions::default()
            .with_default_operator(DefaultOperator::And)
            .with_max_nesting_depth(4)
            .with_leading_wildcard(true);
        assert_eq!(options.default_operator, DefaultOperator::And);
        assert_eq!(options.max_nesting_depth, 4);
        assert!(options.allow_leading_wildcard);
    }
}
