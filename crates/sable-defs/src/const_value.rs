//! Compile-time constant values.

use std::sync::Arc;

use serde::Serialize;

use sable_common::Namespace;

/// The result of folding a constant initializer at compile time.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub enum ConstValue {
    Undefined,
    Null,
    Bool(bool),
    Int(i32),
    Uint(u32),
    Number(f64),
    Str(Arc<str>),
    /// A namespace-valued constant (`namespace ns = "uri"`).
    Namespace(Namespace),
}

impl ConstValue {
    pub fn string(value: &str) -> Self {
        ConstValue::Str(Arc::from(value))
    }
}
