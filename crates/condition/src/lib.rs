//! Per-row trigger conditions.
//!
//! Operators author a boolean expression per tracked row, referencing
//! the row's state through a fixed set of uppercase symbols (`STOCK`,
//! `PREV_STOCK`, `MAX_PURCHASE`, `STATUS`). The text is parsed and
//! evaluated by a closed expression grammar; there is no host-level
//! code execution, so a hostile condition can at worst be wrong.
//!
//! - [`compile`]: parse only, for upfront validation
//! - [`evaluate`]: resolve symbols, evaluate, and return the trigger
//!   plus a substitution trace for the alert body

pub mod cache;
pub mod error;
pub mod eval;
pub mod symbols;
pub mod token;
pub mod value;

pub use cache::{EvalCache, FactSource};
pub use error::{ConditionError, Result};
pub use eval::{compile, evaluate, Condition, Evaluation};
pub use symbols::Field;
pub use value::Value;
