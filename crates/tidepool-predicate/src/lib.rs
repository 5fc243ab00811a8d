//! # tidepool-predicate
//!
//! Evaluates client-supplied JSON predicate hints against per-file partition
//! values and column statistics, so files that cannot match are skipped.
//!
//! Evaluation is three-valued: a file is excluded only when the predicate is
//! provably false for it. Validation happens once, before any file is seen.
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use tidepool_predicate::{EvalContext, EvaluatorVersion, Predicate};
//!
//! let pred = Predicate::from_json(
//!     r#"{"op":"equal","children":[
//!         {"op":"column","name":"date","valueType":"date"},
//!         {"op":"literal","value":"2024-01-01","valueType":"date"}]}"#,
//!     EvaluatorVersion::V1,
//! )
//! .unwrap();
//!
//! let other_day = EvalContext::new(
//!     BTreeMap::from([("date".to_string(), "2024-01-02".to_string())]),
//!     BTreeMap::new(),
//! );
//! assert!(!pred.may_match(&other_day));
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod context;
pub mod error;
pub mod eval;
pub mod expression;
pub mod value;

pub use context::EvalContext;
pub use error::{PredicateError, PredicateResult};
pub use eval::{Interval, Leaf, MAX_DEPTH, Predicate, Truth, prune_files};
pub use expression::Expression;
pub use value::{EvaluatorVersion, Value, ValueType};
