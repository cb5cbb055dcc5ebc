// ABOUTME: Native functions installed into the global environment

use crate::env::Environment;
use crate::value::{NativeFn, Value};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock seconds since the Unix epoch, truncated to a whole number.
fn native_clock(_args: &[Value]) -> Result<Value, String> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| "system clock is set before the Unix epoch".to_string())?;
    Ok(Value::Number(elapsed.as_secs() as f64))
}

/// Register every native function in the given (global) environment
pub fn register(env: &Rc<Environment>) {
    env.define(
        "clock".to_string(),
        Value::Native(NativeFn {
            name: "clock",
            arity: 0,
            handler: native_clock,
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_registered() {
        let env = Environment::new();
        register(&env);
        assert!(matches!(env.get("clock"), Some(Value::Native(_))));
    }

    #[test]
    fn test_clock_returns_integral_seconds() {
        let value = native_clock(&[]).expect("clock should not fail");
        match value {
            Value::Number(n) => {
                assert!(n > 0.0);
                assert_eq!(n.fract(), 0.0);
            }
            other => panic!("expected a number, got {other}"),
        }
    }
}
