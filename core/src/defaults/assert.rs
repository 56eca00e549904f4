//! `assert(condition)` / `assert(condition, message)`: the only control a
//! script has over failing itself deliberately rather than hitting a
//! runtime error.

use crate::bindings::Param;
use crate::engine::Engine;
use crate::error::RuntimeError;
use crate::type_registry::TypeId;
use crate::value::{Value, ValueBox};

fn as_bool(v: &Value) -> Result<bool, RuntimeError> {
    v.as_bool().ok_or(RuntimeError::BadCast { from: "non-bool", to: "assert condition" })
}

pub fn install(engine: &mut Engine) {
    let bool_id = TypeId::of::<bool>();

    engine.register_global_fn("assert", vec![Param::by_value(bool_id)], |args| {
        if as_bool(&args[0].value()?)? {
            Ok(ValueBox::empty())
        } else {
            Err(RuntimeError::AssertionFailure("assertion failed".to_string()))
        }
    });

    engine.register_global_fn(
        "assert",
        vec![Param::by_value(bool_id), Param::by_value(TypeId::of::<String>())],
        |args| {
            if as_bool(&args[0].value()?)? {
                Ok(ValueBox::empty())
            } else {
                let message = args[1].value()?;
                let message = message.downcast_ref::<String>().cloned().unwrap_or_default();
                Err(RuntimeError::AssertionFailure(message))
            }
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    #[test]
    fn failing_assertion_without_message() {
        let mut engine = Engine::new();
        install(&mut engine);
        let err = engine.call_global("assert", &[ValueBox::owned(Value::Bool(false))]).unwrap_err();
        assert!(matches!(err, RuntimeError::AssertionFailure(_)));
    }

    #[test]
    fn failing_assertion_carries_its_message() {
        let mut engine = Engine::new();
        install(&mut engine);
        let args = [
            ValueBox::owned(Value::Bool(false)),
            ValueBox::owned(Value::host(String::from("oh no"))),
        ];
        match engine.call_global("assert", &args).unwrap_err() {
            RuntimeError::AssertionFailure(message) => assert_eq!(message, "oh no"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn passing_assertion_is_silent() {
        let mut engine = Engine::new();
        install(&mut engine);
        engine.call_global("assert", &[ValueBox::owned(Value::Bool(true))]).unwrap();
    }
}
