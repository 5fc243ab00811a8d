//! JSON wire shape of predicate hints.
//!
//! ```json
//! {"op":"and","children":[
//!   {"op":"equal","children":[
//!     {"op":"column","name":"date","valueType":"date"},
//!     {"op":"literal","value":"2024-01-01","valueType":"date"}]},
//!   {"op":"not","children":[
//!     {"op":"isNull","children":[{"op":"column","name":"id","valueType":"int"}]}]}]}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{PredicateError, PredicateResult};
use crate::value::ValueType;

/// One node of a predicate tree as sent by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Expression {
    /// Reference to a partition or stats column.
    Column {
        /// Column name (dotted for nested fields).
        name: String,
        /// Declared column type.
        value_type: ValueType,
    },
    /// Constant value, carried as text.
    Literal {
        /// Literal text.
        value: String,
        /// Declared literal type.
        value_type: ValueType,
    },
    /// Tests whether a column is null.
    IsNull {
        /// Exactly one leaf.
        children: Vec<Expression>,
    },
    /// `left = right`.
    Equal {
        /// Exactly two leaves.
        children: Vec<Expression>,
    },
    /// `left < right`.
    LessThan {
        /// Exactly two leaves.
        children: Vec<Expression>,
    },
    /// `left <= right`.
    LessThanOrEqual {
        /// Exactly two leaves.
        children: Vec<Expression>,
    },
    /// `left > right`.
    GreaterThan {
        /// Exactly two leaves.
        children: Vec<Expression>,
    },
    /// `left >= right`.
    GreaterThanOrEqual {
        /// Exactly two leaves.
        children: Vec<Expression>,
    },
    /// Conjunction of two or more predicates.
    And {
        /// Two or more predicates.
        children: Vec<Expression>,
    },
    /// Disjunction of two or more predicates.
    Or {
        /// Two or more predicates.
        children: Vec<Expression>,
    },
    /// Negation of one predicate.
    Not {
        /// Exactly one predicate.
        children: Vec<Expression>,
    },
}

impl Expression {
    /// Parses a JSON predicate.
    ///
    /// # Errors
    ///
    /// Returns [`PredicateError::Malformed`] for invalid JSON, unknown `op`
    /// tags, or unknown value types.
    pub fn from_json(json: &str) -> PredicateResult<Self> {
        serde_json::from_str(json).map_err(|e| PredicateError::Malformed {
            message: e.to_string(),
        })
    }

    /// Creates a column reference.
    #[must_use]
    pub fn column(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::Column {
            name: name.into(),
            value_type,
        }
    }

    /// Creates a literal.
    #[must_use]
    pub fn literal(value: impl Into<String>, value_type: ValueType) -> Self {
        Self::Literal {
            value: value.into(),
            value_type,
        }
    }

    /// Returns the wire `op` tag of this node.
    #[must_use]
    pub const fn op_name(&self) -> &'static str {
        match self {
            Self::Column { .. } => "column",
            Self::Literal { .. } => "literal",
            Self::IsNull { .. } => "isNull",
            Self::Equal { .. } => "equal",
            Self::LessThan { .. } => "lessThan",
            Self::LessThanOrEqual { .. } => "lessThanOrEqual",
            Self::GreaterThan { .. } => "greaterThan",
            Self::GreaterThanOrEqual { .. } => "greaterThanOrEqual",
            Self::And { .. } => "and",
            Self::Or { .. } => "or",
            Self::Not { .. } => "not",
        }
    }

    /// Whether this node is a column or literal.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Column { .. } | Self::Literal { .. })
    }
}
