//! The built-in vector type: a growable, heterogeneous sequence of values,
//! exposed to scripts as a `Host` value the same way any host struct would
//! be. `[...]` literals (`AstKind::VectorDecl`) build one directly; indexing
//! (`AstKind::VectorAccess`) dispatches through the `"[]"` member function
//! registered below, same as any other member call.

use crate::bindings::Param;
use crate::engine::Engine;
use crate::error::RuntimeError;
use crate::operators::BinaryOp;
use crate::type_registry::TypeId;
use crate::value::{with_backing_mut, ProjectionGet, ProjectionSet, Value, ValueBox};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct ScriptVector(pub Vec<ValueBox>);

fn get_vector<'a>(v: &'a Value, op: &'static str) -> Result<&'a ScriptVector, RuntimeError> {
    v.downcast_ref::<ScriptVector>()
        .ok_or(RuntimeError::BadCast { from: "non-vector", to: op })
}

/// A getter/setter pair addressing a single element by index, for the
/// `[]`-returned assignable box: read/write a plain resolved [`Value`] in
/// and out of the backing vector, same contract as member variable access.
fn element_projection(index: usize) -> (ProjectionGet, ProjectionSet) {
    let get: ProjectionGet = Rc::new(move |v: &Value| {
        let vector = get_vector(v, "[]")?;
        let len = vector.0.len();
        vector
            .0
            .get(index)
            .ok_or(RuntimeError::IndexOutOfBounds { index, len })?
            .value()
    });
    let set: ProjectionSet = Rc::new(move |v: &mut Value, new_value: Value| {
        let vector = v
            .downcast_mut::<ScriptVector>()
            .ok_or(RuntimeError::BadCast { from: "non-vector", to: "[]" })?;
        let len = vector.0.len();
        let slot = vector
            .0
            .get_mut(index)
            .ok_or(RuntimeError::IndexOutOfBounds { index, len })?;
        *slot = ValueBox::owned(new_value);
        Ok(())
    });
    (get, set)
}

pub fn install(engine: &mut Engine) {
    engine.register_member_fn::<ScriptVector>(
        "[]",
        vec![Param::by_value(TypeId::of::<i64>())],
        |instance, args| {
            let index = match args[0].value()? {
                Value::Int(i) if i >= 0 => i as usize,
                Value::Int(i) => return Err(RuntimeError::IndexOutOfBounds { index: i as usize, len: 0 }),
                _ => unreachable!("resolved against the `i64` parameter"),
            };
            let backing = instance.clone().into_cell();
            let (get, set) = element_projection(index);
            Ok(ValueBox::projected(backing, get, set))
        },
    );

    // `size`/`length`: the binding contract the evaluator requires of any
    // vector-like type (§6) names the member `size`; `length` is kept as an
    // alias since scripts ported from the string type expect both to work.
    for name in ["size", "length"] {
        engine.register_member_fn::<ScriptVector>(name, vec![], |instance, _args| {
            let value = instance.value()?;
            let vector = get_vector(&value, "size")?;
            Ok(ValueBox::owned(Value::Size(vector.0.len())))
        });
    }

    engine.register_member_fn::<ScriptVector>("empty", vec![], |instance, _args| {
        let value = instance.value()?;
        let vector = get_vector(&value, "empty")?;
        Ok(ValueBox::owned(Value::Bool(vector.0.is_empty())))
    });

    engine.register_member_fn::<ScriptVector>("capacity", vec![], |instance, _args| {
        let value = instance.value()?;
        let vector = get_vector(&value, "capacity")?;
        Ok(ValueBox::owned(Value::Size(vector.0.capacity())))
    });

    engine.register_member_fn::<ScriptVector>("reserve", vec![Param::by_value(TypeId::of::<usize>())], |instance, args| {
        let additional = match args[0].value()? {
            Value::Size(n) => n,
            Value::Int(n) if n >= 0 => n as usize,
            _ => unreachable!("resolved against the `size_t` parameter"),
        };
        with_backing_mut(instance, |v| {
            let vector = v
                .downcast_mut::<ScriptVector>()
                .ok_or(RuntimeError::BadCast { from: "non-vector", to: "reserve" })?;
            vector.0.reserve(additional);
            Ok::<_, RuntimeError>(())
        })??;
        Ok(ValueBox::empty())
    });

    engine.register_member_fn::<ScriptVector>("resize", vec![Param::by_value(TypeId::of::<usize>())], |instance, args| {
        let new_len = match args[0].value()? {
            Value::Size(n) => n,
            Value::Int(n) if n >= 0 => n as usize,
            _ => unreachable!("resolved against the `size_t` parameter"),
        };
        with_backing_mut(instance, |v| {
            let vector = v
                .downcast_mut::<ScriptVector>()
                .ok_or(RuntimeError::BadCast { from: "non-vector", to: "resize" })?;
            vector.0.resize_with(new_len, ValueBox::empty);
            Ok::<_, RuntimeError>(())
        })??;
        Ok(ValueBox::empty())
    });

    engine.register_member_fn::<ScriptVector>("begin", vec![], |instance, _args| {
        let backing = instance.clone().into_cell();
        let (get, set) = element_projection(0);
        Ok(ValueBox::projected(backing, get, set))
    });

    engine.register_member_fn::<ScriptVector>("pop_back", vec![], |instance, _args| {
        let popped = with_backing_mut(instance, |v| {
            let vector = v
                .downcast_mut::<ScriptVector>()
                .ok_or(RuntimeError::BadCast { from: "non-vector", to: "pop_back" })?;
            vector.0.pop().ok_or(RuntimeError::IndexOutOfBounds { index: 0, len: 0 })
        })??;
        popped.value().map(ValueBox::owned)
    });

    // `push_back` accepts any of the built-in numeric kinds, a string, or
    // another vector, so scripts can build nested/mixed vectors without
    // needing a single generic parameter type to register against.
    let pushable: Vec<TypeId> = crate::defaults::numeric::type_ids()
        .iter()
        .copied()
        .chain([TypeId::of::<String>(), TypeId::of::<ScriptVector>()])
        .collect();
    for type_id in pushable {
        engine.register_member_fn::<ScriptVector>("push_back", vec![Param::by_value(type_id)], |instance, args| {
            let new_value = args[0].value()?;
            let len = with_backing_mut(instance, |v| {
                let vector = v
                    .downcast_mut::<ScriptVector>()
                    .ok_or(RuntimeError::BadCast { from: "non-vector", to: "push_back" })?;
                vector.0.push(ValueBox::owned(new_value));
                Ok::<_, RuntimeError>(vector.0.len())
            })??;
            Ok(ValueBox::owned(Value::Size(len)))
        });
    }

    engine.operators_mut().register_binary(BinaryOp::Assign, TypeId::of::<ScriptVector>(), TypeId::of::<ScriptVector>(), |_, b| Ok(b.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    fn engine_with_vectors() -> Engine {
        let mut engine = Engine::new();
        crate::defaults::numeric::install(&mut engine);
        install(&mut engine);
        engine
    }

    #[test]
    fn index_reads_and_writes_through_the_backing_vector() {
        let mut engine = engine_with_vectors();
        let scope_cell = engine.scope_mut().declare("v").unwrap();
        scope_cell
            .assign(Value::host(ScriptVector(vec![ValueBox::owned(Value::Int(1)), ValueBox::owned(Value::Int(2))])))
            .unwrap();
        let instance = engine.lookup_variable("v").unwrap();
        let element = engine.call_member(&instance, "[]", &[ValueBox::owned(Value::Int(1))]).unwrap();
        assert!(matches!(element.value().unwrap(), Value::Int(2)));
        element.assign(Value::Int(9)).unwrap();
        let reread = engine.call_member(&instance, "[]", &[ValueBox::owned(Value::Int(1))]).unwrap();
        assert!(matches!(reread.value().unwrap(), Value::Int(9)));
    }

    #[test]
    fn push_and_length_track_each_other() {
        let mut engine = engine_with_vectors();
        let scope_cell = engine.scope_mut().declare("v").unwrap();
        scope_cell.assign(Value::host(ScriptVector(Vec::new()))).unwrap();
        let instance = engine.lookup_variable("v").unwrap();
        engine.call_member(&instance, "push_back", &[ValueBox::owned(Value::Int(42))]).unwrap();
        let len = engine.call_member(&instance, "size", &[]).unwrap();
        assert!(matches!(len.value().unwrap(), Value::Size(1)));
    }

    #[test]
    fn empty_resize_and_pop_back_behave_like_a_sequence() {
        let mut engine = engine_with_vectors();
        let scope_cell = engine.scope_mut().declare("v").unwrap();
        scope_cell.assign(Value::host(ScriptVector(Vec::new()))).unwrap();
        let instance = engine.lookup_variable("v").unwrap();
        let empty = engine.call_member(&instance, "empty", &[]).unwrap();
        assert!(matches!(empty.value().unwrap(), Value::Bool(true)));

        engine
            .call_member(&instance, "resize", &[ValueBox::owned(Value::Size(3))])
            .unwrap();
        let size = engine.call_member(&instance, "size", &[]).unwrap();
        assert!(matches!(size.value().unwrap(), Value::Size(3)));

        engine.call_member(&instance, "push_back", &[ValueBox::owned(Value::Int(7))]).unwrap();
        let popped = engine.call_member(&instance, "pop_back", &[]).unwrap();
        assert!(matches!(popped.value().unwrap(), Value::Int(7)));
    }
}
