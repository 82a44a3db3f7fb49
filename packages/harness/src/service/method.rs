// packages/harness/src/service/method.rs
//! Mockable method descriptors
//!
//! A `MockableMethod` names a method and says how its wire arguments and
//! result convert to Rust types, so test callbacks can be written against
//! typed signatures.

use crate::service::handler::Callback;
use crate::utils::errors::{HarnessError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

pub trait MockableMethod {
    /// Arguments as the callback receives them, decoded from the wire array
    type Args: DeserializeOwned;

    /// Callback result, encoded back onto the wire
    type Output: Serialize;

    fn name(&self) -> &str;
}

/// Any method by name, with raw wire values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicMethod(pub String);

impl DynamicMethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl MockableMethod for DynamicMethod {
    type Args = Vec<Value>;
    type Output = Value;

    fn name(&self) -> &str {
        &self.0
    }
}

/// Wrap a typed callback into a wire-level `Callback`
///
/// Argument decoding failures surface as `InvalidArguments`; callback
/// failures as `Handler` with the callback's error as the source.
pub fn typed_callback<M, F>(method: &M, callback: F) -> Callback
where
    M: MockableMethod + 'static,
    F: Fn(M::Args) -> anyhow::Result<M::Output> + Send + Sync + 'static,
{
    let name = method.name().to_string();

    Arc::new(move |args: Vec<Value>| -> Result<Value> {
        let args: M::Args = serde_json::from_value(Value::Array(args)).map_err(|e| {
            HarnessError::InvalidArguments {
                method: name.clone(),
                reason: e.to_string(),
            }
        })?;

        let output = callback(args).map_err(|e| HarnessError::handler(name.as_str(), e))?;
        Ok(serde_json::to_value(output)?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Resize;

    impl MockableMethod for Resize {
        type Args = (u32, u32);
        type Output = String;

        fn name(&self) -> &str {
            "resize"
        }
    }

    #[test]
    fn test_typed_arguments() {
        let callback = typed_callback(&Resize, |(w, h)| Ok(format!("{}x{}", w, h)));
        assert_eq!(callback(vec![json!(640), json!(480)]).unwrap(), json!("640x480"));
    }

    #[test]
    fn test_bad_arguments() {
        let callback = typed_callback(&Resize, |_| Ok(String::new()));
        let err = callback(vec![json!("wide"), json!(480)]).unwrap_err();
        assert!(matches!(err, HarnessError::InvalidArguments { ref method, .. } if method == "resize"));
    }

    #[test]
    fn test_callback_error_propagates() {
        let callback = typed_callback(&Resize, |_| Err(anyhow::anyhow!("display gone")));
        let err = callback(vec![json!(1), json!(1)]).unwrap_err();

        match err {
            HarnessError::Handler { method, source } => {
                assert_eq!(method, "resize");
                assert_eq!(source.to_string(), "display gone");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_dynamic_method_passes_raw_values() {
        let method = DynamicMethod::new("echo");
        let callback = typed_callback(&method, |args| Ok(Value::Array(args)));
        assert_eq!(callback(vec![json!(1), json!("x")]).unwrap(), json!([1, "x"]));
    }
}
