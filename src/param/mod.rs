//! Parameter data model
//!
//! Values with an explicit NA sentinel, reconciliation operators, ordered
//! per-instance maps and the immutable [`Parameter`] value object.

mod instance;
mod kind;
mod operator;
mod parameter;
mod value;

pub use instance::{InstanceMap, ALL};
pub use kind::*;
pub use operator::Operator;
pub use parameter::{Compliance, Parameter, Recommendation};
pub use value::{max_of, min_of, Value, NA};
