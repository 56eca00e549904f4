//! String bindings: `String` flows through the engine as an ordinary
//! `Host` value (it already satisfies `Clone + Debug + 'static`), so this
//! module is entirely operator/member-function registrations, no new type.

use crate::bindings::Param;
use crate::engine::Engine;
use crate::error::RuntimeError;
use crate::operators::BinaryOp;
use crate::type_registry::TypeId;
use crate::value::{Value, ValueBox};

fn as_string<'a>(v: &'a Value, op: &'static str) -> Result<&'a String, RuntimeError> {
    v.downcast_ref::<String>()
        .ok_or(RuntimeError::BadCast { from: "non-string", to: op })
}

fn as_string_mut<'a>(v: &'a mut Value, op: &'static str) -> Result<&'a mut String, RuntimeError> {
    v.downcast_mut::<String>()
        .ok_or(RuntimeError::BadCast { from: "non-string", to: op })
}

pub fn install(engine: &mut Engine) {
    let string_id = TypeId::of::<String>();

    engine.operators_mut().register_binary(BinaryOp::Assign, string_id, string_id, |_, b| Ok(b.clone()));
    engine.operators_mut().register_binary(BinaryOp::Add, string_id, string_id, |a, b| {
        let mut joined = as_string(a, "+")?.clone();
        joined.push_str(as_string(b, "+")?);
        Ok(Value::host(joined))
    });
    engine.operators_mut().register_binary(BinaryOp::Eq, string_id, string_id, |a, b| {
        Ok(Value::Bool(as_string(a, "==")? == as_string(b, "==")?))
    });
    engine.operators_mut().register_binary(BinaryOp::Ne, string_id, string_id, |a, b| {
        Ok(Value::Bool(as_string(a, "!=")? != as_string(b, "!=")?))
    });
    engine.operators_mut().register_binary(BinaryOp::Lt, string_id, string_id, |a, b| {
        Ok(Value::Bool(as_string(a, "<")? < as_string(b, "<")?))
    });
    engine.operators_mut().register_binary(BinaryOp::Le, string_id, string_id, |a, b| {
        Ok(Value::Bool(as_string(a, "<=")? <= as_string(b, "<=")?))
    });
    engine.operators_mut().register_binary(BinaryOp::Gt, string_id, string_id, |a, b| {
        Ok(Value::Bool(as_string(a, ">")? > as_string(b, ">")?))
    });
    engine.operators_mut().register_binary(BinaryOp::Ge, string_id, string_id, |a, b| {
        Ok(Value::Bool(as_string(a, ">=")? >= as_string(b, ">=")?))
    });

    for name in ["size", "length"] {
        engine.register_member_fn::<String>(name, vec![], |instance, _args| {
            let value = instance.value()?;
            Ok(ValueBox::owned(Value::Size(as_string(&value, "size")?.chars().count())))
        });
    }

    engine.register_member_fn::<String>(
        "push_back",
        vec![Param::by_value(TypeId::of::<char>())],
        |instance, args| {
            let ch = match args[0].value()? {
                Value::Char(c) => c,
                _ => unreachable!("resolved against the `char` parameter"),
            };
            crate::value::with_backing_mut(instance, |v| {
                as_string_mut(v, "push_back")?.push(ch);
                Ok::<_, RuntimeError>(())
            })??;
            Ok(ValueBox::empty())
        },
    );

    engine.register_member_fn::<String>(
        "substr",
        vec![Param::by_value(TypeId::of::<i64>()), Param::by_value(TypeId::of::<i64>())],
        |instance, args| {
            let value = instance.value()?;
            let s = as_string(&value, "substr")?;
            let len = s.chars().count();
            let start = match args[0].value()? {
                Value::Int(i) if i >= 0 => i as usize,
                Value::Int(i) => return Err(RuntimeError::IndexOutOfBounds { index: i as usize, len }),
                _ => unreachable!("resolved against the `int` parameter"),
            };
            let count = match args[1].value()? {
                Value::Int(i) if i >= 0 => i as usize,
                Value::Int(i) => return Err(RuntimeError::IndexOutOfBounds { index: i as usize, len }),
                _ => unreachable!("resolved against the `int` parameter"),
            };
            if start > len {
                return Err(RuntimeError::IndexOutOfBounds { index: start, len });
            }
            let sub: String = s.chars().skip(start).take(count).collect();
            Ok(ValueBox::owned(Value::host(sub)))
        },
    );

    engine.register_member_fn::<String>(
        "[]",
        vec![Param::by_value(TypeId::of::<i64>())],
        |instance, args| {
            let value = instance.value()?;
            let s = as_string(&value, "[]")?;
            let index = match args[0].value()? {
                Value::Int(i) if i >= 0 => i as usize,
                Value::Int(i) => return Err(RuntimeError::IndexOutOfBounds { index: i as usize, len: s.chars().count() }),
                _ => unreachable!("resolved against the `int` parameter"),
            };
            let len = s.chars().count();
            let c = s.chars().nth(index).ok_or(RuntimeError::IndexOutOfBounds { index, len })?;
            Ok(ValueBox::owned(Value::Char(c)))
        },
    );

    engine.register_member_fn::<String>("toUpper", vec![], |instance, _args| {
        let value = instance.value()?;
        Ok(ValueBox::owned(Value::host(as_string(&value, "toUpper")?.to_uppercase())))
    });

    engine.register_member_fn::<String>("toLower", vec![], |instance, _args| {
        let value = instance.value()?;
        Ok(ValueBox::owned(Value::host(as_string(&value, "toLower")?.to_lowercase())))
    });

    engine.register_member_fn::<String>("contains", vec![Param::by_value(string_id)], |instance, args| {
        let value = instance.value()?;
        let needle = args[0].value()?;
        Ok(ValueBox::owned(Value::Bool(
            as_string(&value, "contains")?.contains(as_string(&needle, "contains")?.as_str()),
        )))
    });

    engine.register_member_fn::<String>(
        "charAt",
        vec![Param::by_value(TypeId::of::<i64>())],
        |instance, args| {
            let value = instance.value()?;
            let s = as_string(&value, "charAt")?;
            let index = match args[0].value()? {
                Value::Int(i) if i >= 0 => i as usize,
                Value::Int(i) => return Err(RuntimeError::IndexOutOfBounds { index: i as usize, len: s.chars().count() }),
                _ => unreachable!("resolved against the `i64` parameter"),
            };
            let len = s.chars().count();
            let c = s
                .chars()
                .nth(index)
                .ok_or(RuntimeError::IndexOutOfBounds { index, len })?;
            Ok(ValueBox::owned(Value::Char(c)))
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    fn engine_with_strings() -> Engine {
        let mut engine = Engine::new();
        install(&mut engine);
        engine
    }

    #[test]
    fn concatenation_joins_two_strings() {
        let engine = engine_with_strings();
        let a = ValueBox::owned(Value::host(String::from("foo")));
        let b = ValueBox::owned(Value::host(String::from("bar")));
        let sum = engine
            .operators()
            .lookup_binary(BinaryOp::Add, TypeId::of::<String>(), TypeId::of::<String>())
            .unwrap();
        let joined = sum(&a.value().unwrap(), &b.value().unwrap()).unwrap();
        assert_eq!(joined.downcast_ref::<String>().unwrap(), "foobar");
    }

    #[test]
    fn length_counts_chars_not_bytes() {
        let mut engine = engine_with_strings();
        let instance = ValueBox::owned(Value::host(String::from("héllo")));
        let len = engine.call_member(&instance, "length", &[]).unwrap();
        assert!(matches!(len.value().unwrap(), Value::Size(5)));
    }

    #[test]
    fn contains_finds_a_substring() {
        let mut engine = engine_with_strings();
        let instance = ValueBox::owned(Value::host(String::from("hello world")));
        let needle = ValueBox::owned(Value::host(String::from("world")));
        let found = engine.call_member(&instance, "contains", &[needle]).unwrap();
        assert!(matches!(found.value().unwrap(), Value::Bool(true)));
    }
}
