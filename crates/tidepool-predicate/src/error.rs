//! Predicate validation errors.

use crate::value::{EvaluatorVersion, ValueType};

/// Result type for predicate operations.
pub type PredicateResult<T> = Result<T, PredicateError>;

/// Errors raised while parsing or validating a predicate.
///
/// Evaluation itself never fails; every error surfaces before the first file
/// is evaluated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredicateError {
    /// The predicate text is not a well-formed expression tree.
    #[error("malformed predicate: {message}")]
    Malformed {
        /// Parser message.
        message: String,
    },

    /// A literal or column declares a type the evaluator version does not support.
    #[error("value type {value_type} is not supported by evaluator {version}")]
    UnsupportedType {
        /// Declared type.
        value_type: ValueType,
        /// Evaluator version of the request.
        version: EvaluatorVersion,
    },

    /// A literal's text cannot be coerced to its declared type.
    #[error("literal {value:?} is not a valid {value_type}: {message}")]
    InvalidLiteral {
        /// Literal text.
        value: String,
        /// Declared type.
        value_type: ValueType,
        /// Coercion failure.
        message: String,
    },

    /// A node has the wrong number of children.
    #[error("{op} expects {expected} children, got {actual}")]
    InvalidArity {
        /// Operator name.
        op: &'static str,
        /// Expected child count, in words.
        expected: &'static str,
        /// Actual child count.
        actual: usize,
    },

    /// A node expected a column or literal child.
    #[error("{op} expects column or literal children")]
    ExpectedLeaf {
        /// Operator name.
        op: &'static str,
    },

    /// A node expected a boolean predicate child, or the root is a leaf.
    #[error("{op} expects predicate children")]
    ExpectedPredicate {
        /// Operator name.
        op: &'static str,
    },

    /// Comparison operands have incompatible types.
    #[error("{op} cannot compare {left} with {right}")]
    TypeMismatch {
        /// Operator name.
        op: &'static str,
        /// Left operand type.
        left: ValueType,
        /// Right operand type.
        right: ValueType,
    },

    /// A column reference has an empty name.
    #[error("column name cannot be empty")]
    EmptyColumnName,

    /// The tree is nested deeper than allowed.
    #[error("predicate is nested deeper than {max_depth} levels")]
    TooDeep {
        /// Maximum allowed depth.
        max_depth: usize,
    },
}
