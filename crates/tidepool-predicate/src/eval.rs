//! Validated predicate trees and three-valued evaluation.

use std::cmp::Ordering;

use chrono::TimeDelta;

use tidepool_core::model::TableFileToBeSigned;

use crate::context::EvalContext;
use crate::error::{PredicateError, PredicateResult};
use crate::expression::Expression;
use crate::value::{EvaluatorVersion, Value, ValueType};

/// Deepest nesting accepted for a predicate tree.
pub const MAX_DEPTH: usize = 64;

/// Outcome of evaluating a predicate against one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truth {
    /// Every row of the file satisfies the predicate.
    True,
    /// No row of the file can satisfy the predicate.
    False,
    /// The context cannot decide.
    Unknown,
}

impl Truth {
    /// SQL-style conjunction.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::False, _) | (_, Self::False) => Self::False,
            (Self::True, Self::True) => Self::True,
            _ => Self::Unknown,
        }
    }

    /// SQL-style disjunction.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::True, _) | (_, Self::True) => Self::True,
            (Self::False, Self::False) => Self::False,
            _ => Self::Unknown,
        }
    }

    /// SQL-style negation.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Unknown => Self::Unknown,
        }
    }
}

/// Inclusive value range a leaf may take within one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    /// Lower bound.
    pub min: Value,
    /// Upper bound.
    pub max: Value,
}

impl Interval {
    fn point(value: Value) -> Self {
        Self {
            min: value.clone(),
            max: value,
        }
    }

    fn is_point(&self) -> bool {
        self.min.partial_cmp(&self.max) == Some(Ordering::Equal)
    }
}

/// A validated column reference or literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    /// Column reference.
    Column {
        /// Column name.
        name: String,
        /// Declared type.
        value_type: ValueType,
    },
    /// Pre-parsed literal.
    Literal {
        /// Parsed value.
        value: Value,
        /// Declared type.
        value_type: ValueType,
    },
}

impl Leaf {
    fn compile(expr: &Expression, version: EvaluatorVersion) -> PredicateResult<Self> {
        match expr {
            Expression::Column { name, value_type } => {
                check_supported(*value_type, version)?;
                if name.trim().is_empty() {
                    return Err(PredicateError::EmptyColumnName);
                }
                Ok(Self::Column {
                    name: name.clone(),
                    value_type: *value_type,
                })
            }
            Expression::Literal { value, value_type } => {
                check_supported(*value_type, version)?;
                Ok(Self::Literal {
                    value: value_type.parse_value(value)?,
                    value_type: *value_type,
                })
            }
            other => Err(PredicateError::ExpectedLeaf {
                op: other.op_name(),
            }),
        }
    }

    /// Returns the declared type.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Column { value_type, .. } | Self::Literal { value_type, .. } => *value_type,
        }
    }

    /// Returns the range of values this leaf takes in `ctx`.
    ///
    /// A literal is its own point regardless of context. A column resolves to
    /// its partition value, else its statistics, else `None`. Context values
    /// that do not parse as the declared type also yield `None`.
    #[must_use]
    pub fn eval(&self, ctx: &EvalContext) -> Option<Interval> {
        match self {
            Self::Literal { value, .. } => Some(Interval::point(value.clone())),
            Self::Column { name, value_type } => {
                if let Some(raw) = ctx.partition_value(name) {
                    return value_type.parse_value(raw).ok().map(Interval::point);
                }
                let (min, max) = ctx.stats(name)?;
                Some(Interval {
                    min: value_type.parse_value(min).ok()?,
                    max: widen_stats_max(value_type.parse_value(max).ok()?)?,
                })
            }
        }
    }

    /// Whether the leaf has no value in `ctx`. Literals are never null.
    #[must_use]
    pub fn is_null(&self, ctx: &EvalContext) -> bool {
        match self {
            Self::Literal { .. } => false,
            Self::Column { name, .. } => {
                ctx.partition_value(name).is_none() && ctx.stats(name).is_none()
            }
        }
    }
}

/// Timestamp statistics are truncated to whole milliseconds, so the recorded
/// max may sit up to one millisecond below the true column max.
fn widen_stats_max(max: Value) -> Option<Value> {
    match max {
        Value::Timestamp(at) => at
            .checked_add_signed(TimeDelta::milliseconds(1))
            .map(Value::Timestamp),
        other => Some(other),
    }
}

fn check_supported(value_type: ValueType, version: EvaluatorVersion) -> PredicateResult<()> {
    if value_type.is_supported(version) {
        Ok(())
    } else {
        Err(PredicateError::UnsupportedType {
            value_type,
            version,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Equal,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    IsNull(Leaf),
    Compare {
        op: CompareOp,
        left: Leaf,
        right: Leaf,
    },
    And(Vec<Node>),
    Or(Vec<Node>),
    Not(Box<Node>),
}

impl Node {
    fn compile(expr: &Expression, version: EvaluatorVersion, depth: usize) -> PredicateResult<Self> {
        if depth > MAX_DEPTH {
            return Err(PredicateError::TooDeep {
                max_depth: MAX_DEPTH,
            });
        }
        let op = expr.op_name();
        match expr {
            Expression::Column { .. } | Expression::Literal { .. } => {
                Err(PredicateError::ExpectedPredicate { op })
            }
            Expression::IsNull { children } => {
                let [child] = children.as_slice() else {
                    return Err(arity(op, "exactly 1", children.len()));
                };
                Ok(Self::IsNull(Leaf::compile(child, version)?))
            }
            Expression::Equal { children } => compile_compare(CompareOp::Equal, op, children, version),
            Expression::LessThan { children } => {
                compile_compare(CompareOp::LessThan, op, children, version)
            }
            Expression::LessThanOrEqual { children } => {
                compile_compare(CompareOp::LessThanOrEqual, op, children, version)
            }
            Expression::GreaterThan { children } => {
                compile_compare(CompareOp::GreaterThan, op, children, version)
            }
            Expression::GreaterThanOrEqual { children } => {
                compile_compare(CompareOp::GreaterThanOrEqual, op, children, version)
            }
            Expression::And { children } | Expression::Or { children } => {
                if children.len() < 2 {
                    return Err(arity(op, "at least 2", children.len()));
                }
                let nodes = children
                    .iter()
                    .map(|child| Self::compile_child(child, op, version, depth))
                    .collect::<PredicateResult<Vec<_>>>()?;
                if matches!(expr, Expression::And { .. }) {
                    Ok(Self::And(nodes))
                } else {
                    Ok(Self::Or(nodes))
                }
            }
            Expression::Not { children } => {
                let [child] = children.as_slice() else {
                    return Err(arity(op, "exactly 1", children.len()));
                };
                Ok(Self::Not(Box::new(Self::compile_child(
                    child, op, version, depth,
                )?)))
            }
        }
    }

    fn compile_child(
        child: &Expression,
        parent_op: &'static str,
        version: EvaluatorVersion,
        depth: usize,
    ) -> PredicateResult<Self> {
        if child.is_leaf() {
            return Err(PredicateError::ExpectedPredicate { op: parent_op });
        }
        Self::compile(child, version, depth + 1)
    }

    fn evaluate(&self, ctx: &EvalContext) -> Truth {
        match self {
            Self::IsNull(leaf) => match leaf {
                Leaf::Literal { .. } => Truth::False,
                Leaf::Column { name, .. } => {
                    if ctx.partition_value(name).is_some() {
                        Truth::False
                    } else {
                        Truth::Unknown
                    }
                }
            },
            Self::Compare { op, left, right } => match (left.eval(ctx), right.eval(ctx)) {
                (Some(left), Some(right)) => compare(*op, &left, &right),
                _ => Truth::Unknown,
            },
            Self::And(children) => children
                .iter()
                .fold(Truth::True, |acc, child| acc.and(child.evaluate(ctx))),
            Self::Or(children) => children
                .iter()
                .fold(Truth::False, |acc, child| acc.or(child.evaluate(ctx))),
            Self::Not(child) => child.evaluate(ctx).negate(),
        }
    }
}

fn arity(op: &'static str, expected: &'static str, actual: usize) -> PredicateError {
    PredicateError::InvalidArity {
        op,
        expected,
        actual,
    }
}

fn compile_compare(
    compare_op: CompareOp,
    op: &'static str,
    children: &[Expression],
    version: EvaluatorVersion,
) -> PredicateResult<Node> {
    let [left, right] = children else {
        return Err(arity(op, "exactly 2", children.len()));
    };
    let left = Leaf::compile(left, version)?;
    let right = Leaf::compile(right, version)?;
    if !left.value_type().is_comparable_with(right.value_type()) {
        return Err(PredicateError::TypeMismatch {
            op,
            left: left.value_type(),
            right: right.value_type(),
        });
    }
    Ok(Node::Compare {
        op: compare_op,
        left,
        right,
    })
}

fn compare(op: CompareOp, left: &Interval, right: &Interval) -> Truth {
    let decided = match op {
        CompareOp::Equal => equal(left, right),
        CompareOp::LessThan => less_than(left, right),
        CompareOp::LessThanOrEqual => less_than_or_equal(left, right),
        CompareOp::GreaterThan => less_than(right, left),
        CompareOp::GreaterThanOrEqual => less_than_or_equal(right, left),
    };
    decided.unwrap_or(Truth::Unknown)
}

fn equal(left: &Interval, right: &Interval) -> Option<Truth> {
    let disjoint = left.max.partial_cmp(&right.min)? == Ordering::Less
        || right.max.partial_cmp(&left.min)? == Ordering::Less;
    if disjoint {
        return Some(Truth::False);
    }
    let same_point = left.is_point()
        && right.is_point()
        && left.min.partial_cmp(&right.min)? == Ordering::Equal;
    Some(if same_point {
        Truth::True
    } else {
        Truth::Unknown
    })
}

fn less_than(left: &Interval, right: &Interval) -> Option<Truth> {
    if left.max.partial_cmp(&right.min)? == Ordering::Less {
        return Some(Truth::True);
    }
    Some(if left.min.partial_cmp(&right.max)? == Ordering::Less {
        Truth::Unknown
    } else {
        Truth::False
    })
}

fn less_than_or_equal(left: &Interval, right: &Interval) -> Option<Truth> {
    if left.max.partial_cmp(&right.min)? != Ordering::Greater {
        return Some(Truth::True);
    }
    Some(if left.min.partial_cmp(&right.max)? == Ordering::Greater {
        Truth::False
    } else {
        Truth::Unknown
    })
}

/// A validated predicate, ready to evaluate against many files.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    root: Node,
    version: EvaluatorVersion,
}

impl Predicate {
    /// Validates `expr` against `version`.
    ///
    /// # Errors
    ///
    /// Returns a [`PredicateError`] when a type is unsupported by `version`, a
    /// literal does not parse, a node has the wrong children, operands are
    /// incomparable, or the tree is too deep.
    pub fn compile(expr: &Expression, version: EvaluatorVersion) -> PredicateResult<Self> {
        Ok(Self {
            root: Node::compile(expr, version, 1)?,
            version,
        })
    }

    /// Parses and validates a JSON predicate.
    ///
    /// # Errors
    ///
    /// Returns [`PredicateError::Malformed`] for unparseable input, or any
    /// validation error from [`Predicate::compile`].
    pub fn from_json(json: &str, version: EvaluatorVersion) -> PredicateResult<Self> {
        Self::compile(&Expression::from_json(json)?, version)
    }

    /// Returns the evaluator version this predicate was validated for.
    #[must_use]
    pub const fn version(&self) -> EvaluatorVersion {
        self.version
    }

    /// Evaluates the predicate against one file's context.
    #[must_use]
    pub fn evaluate(&self, ctx: &EvalContext) -> Truth {
        self.root.evaluate(ctx)
    }

    /// Whether a file with this context may contain matching rows.
    #[must_use]
    pub fn may_match(&self, ctx: &EvalContext) -> bool {
        self.evaluate(ctx) != Truth::False
    }
}

/// Drops files the predicate proves cannot match, preserving order.
#[must_use]
pub fn prune_files(
    predicate: &Predicate,
    files: Vec<TableFileToBeSigned>,
) -> Vec<TableFileToBeSigned> {
    let before = files.len();
    let kept: Vec<_> = files
        .into_iter()
        .filter(|file| predicate.may_match(&EvalContext::for_file(file)))
        .collect();
    tracing::debug!(before, after = kept.len(), "pruned files with predicate hint");
    kept
}
