//! JSON values exchanged with the execution engine.

use serde_json_bytes::ByteString;
use serde_json_bytes::Map;
pub use serde_json_bytes::Value;

/// A JSON object.
pub type Object = Map<ByteString, Value>;

/// Extension trait for [`serde_json_bytes::Value`].
pub(crate) trait ValueExt {
    /// Returns `true` if the value can be coerced to a GraphQL `Int`.
    fn is_valid_int_input(&self) -> bool;

    /// Returns `true` if the value can be coerced to a GraphQL `Float`.
    fn is_valid_float_input(&self) -> bool;
}

impl ValueExt for Value {
    // Spec: https://spec.graphql.org/October2021/#sec-Int.Input-Coercion
    fn is_valid_int_input(&self) -> bool {
        self.as_i64().is_some_and(|int| i32::try_from(int).is_ok())
    }

    // Spec: https://spec.graphql.org/October2021/#sec-Float.Input-Coercion
    fn is_valid_float_input(&self) -> bool {
        self.as_f64().is_some_and(f64::is_finite)
    }
}
