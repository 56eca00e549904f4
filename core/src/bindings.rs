//! The binding registry: free functions (with overloads), per-type member
//! functions and variables, global variables, and type conversions.
//!
//! This is the part of the engine a host actually talks to when embedding
//! it — [`crate::engine::Engine::register_global_fn`] and friends build the
//! tables this module defines, and the evaluator (in `ast.rs`) is the only
//! other consumer, via [`Bindings::resolve_overload`].

use crate::error::{EngineError, RuntimeError};
use crate::type_registry::{TypeId, TypePairKey, type_pair_hash};
use crate::value::{Value, ValueBox};
use std::collections::HashMap;

/// One parameter of a registered function signature.
#[derive(Copy, Clone)]
pub struct Param {
    pub type_id: TypeId,
    pub by_ref: bool,
}

impl Param {
    pub fn by_value(type_id: TypeId) -> Self {
        Self { type_id, by_ref: false }
    }
    pub fn by_ref(type_id: TypeId) -> Self {
        Self { type_id, by_ref: true }
    }
}

/// A native function registered under some name: its parameter signature
/// (used by overload resolution) and the closure that actually runs it.
pub struct FunctionBinding {
    pub params: Vec<Param>,
    pub call: Box<dyn Fn(&[ValueBox]) -> Result<ValueBox, RuntimeError>>,
}

/// A group of [`FunctionBinding`]s sharing one name, resolved at call time
/// by arity + convertibility (see [`Bindings::resolve_overload`]).
#[derive(Default)]
pub struct OverloadSet {
    candidates: Vec<FunctionBinding>,
}

impl OverloadSet {
    fn push(&mut self, binding: FunctionBinding) {
        self.candidates.push(binding);
    }
}

/// A native method registered against a host type: its parameter signature
/// (the call's own arguments, not counting the receiver) and a closure that
/// receives the resolved instance box alongside those arguments.
pub struct MemberFunctionBinding {
    pub params: Vec<Param>,
    pub call: Box<dyn Fn(&ValueBox, &[ValueBox]) -> Result<ValueBox, RuntimeError>>,
}

/// A group of [`MemberFunctionBinding`]s sharing one name on the same type.
#[derive(Default)]
pub struct MemberOverloadSet {
    candidates: Vec<MemberFunctionBinding>,
}

impl MemberOverloadSet {
    fn push(&mut self, binding: MemberFunctionBinding) {
        self.candidates.push(binding);
    }
}

/// A getter/setter pair exposing one named field of a host type as a member
/// variable.
pub struct MemberVarBinding {
    pub get: crate::value::ProjectionGet,
    pub set: crate::value::ProjectionSet,
}

/// Function and field bindings registered against one host type.
#[derive(Default)]
pub struct TypeBindings {
    functions: HashMap<String, MemberOverloadSet>,
    variables: HashMap<String, MemberVarBinding>,
}

impl TypeBindings {
    pub fn get_member_func(&self, name: &str) -> Option<&MemberOverloadSet> {
        self.functions.get(name)
    }

    pub fn get_member_var(&self, name: &str) -> Option<&MemberVarBinding> {
        self.variables.get(name)
    }
}

/// The full binding registry owned by [`crate::engine::Engine`].
#[derive(Default)]
pub struct Bindings {
    global_functions: HashMap<String, OverloadSet>,
    global_variables: HashMap<String, ValueBox>,
    type_bindings: HashMap<TypeId, TypeBindings>,
    conversions: HashMap<TypePairKey, Box<dyn Fn(&Value) -> Result<Value, RuntimeError>>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_global_fn(&mut self, name: &str, binding: FunctionBinding) {
        self.global_functions
            .entry(name.to_string())
            .or_default()
            .push(binding);
    }

    pub fn get_global_fn(&self, name: &str) -> Option<&OverloadSet> {
        self.global_functions.get(name)
    }

    pub fn register_global_var(&mut self, name: &str, value: ValueBox) -> Result<(), EngineError> {
        if self.global_variables.contains_key(name) {
            return Err(EngineError::DuplicateBinding(name.to_string()));
        }
        self.global_variables.insert(name.to_string(), value);
        Ok(())
    }

    pub fn get_global_var(&self, name: &str) -> Option<&ValueBox> {
        self.global_variables.get(name)
    }

    pub fn register_member_fn(&mut self, owner: TypeId, name: &str, binding: MemberFunctionBinding) {
        self.type_bindings
            .entry(owner)
            .or_default()
            .functions
            .entry(name.to_string())
            .or_default()
            .push(binding);
    }

    pub fn register_member_var(
        &mut self,
        owner: TypeId,
        name: &str,
        binding: MemberVarBinding,
    ) -> Result<(), EngineError> {
        let variables = &mut self.type_bindings.entry(owner).or_default().variables;
        if variables.contains_key(name) {
            return Err(EngineError::DuplicateBinding(name.to_string()));
        }
        variables.insert(name.to_string(), binding);
        Ok(())
    }

    pub fn get_type_bindings(&self, owner: TypeId) -> Option<&TypeBindings> {
        self.type_bindings.get(&owner)
    }

    pub fn register_conversion(
        &mut self,
        from: TypeId,
        to: TypeId,
        f: impl Fn(&Value) -> Result<Value, RuntimeError> + 'static,
    ) -> Result<(), EngineError> {
        let key = type_pair_hash(from, to);
        if self.conversions.contains_key(&key) {
            return Err(EngineError::DuplicateBinding(format!("{} -> {}", from.name(), to.name())));
        }
        self.conversions.insert(key, Box::new(f));
        Ok(())
    }

    pub fn convert(&self, from: TypeId, to: TypeId, value: &Value) -> Option<Result<Value, RuntimeError>> {
        self.conversions
            .get(&type_pair_hash(from, to))
            .map(|f| f(value))
    }

    fn has_conversion(&self, from: TypeId, to: TypeId) -> bool {
        self.conversions.contains_key(&type_pair_hash(from, to))
    }

    /// Applies each parameter's conversion (if any) to the matching
    /// argument, so a binding resolved via a CONVERTIBLE match actually
    /// receives a value of the type it asked for rather than the caller's
    /// original type. Exact matches pass the argument through unchanged,
    /// preserving by-reference arguments' identity.
    pub fn convert_args(&self, params: &[Param], args: &[ValueBox]) -> Result<Vec<ValueBox>, RuntimeError> {
        params
            .iter()
            .zip(args.iter())
            .map(|(param, arg)| {
                let arg_type = arg.type_id()?;
                if arg_type == param.type_id {
                    return Ok(arg.clone());
                }
                let value = arg.value()?;
                let converted = self
                    .convert(arg_type, param.type_id, &value)
                    .unwrap_or(Ok(value))?;
                Ok(ValueBox::owned(converted))
            })
            .collect()
    }

    /// Implements §4.3's overload resolution algorithm: rejects arity
    /// mismatches, classifies each parameter as EXACT/CONVERTIBLE/
    /// INCOMPATIBLE, disqualifies any candidate with an INCOMPATIBLE
    /// parameter, and returns the candidate with the most EXACT matches,
    /// breaking ties in favor of the earliest-registered candidate.
    pub fn resolve_overload<'a>(
        &self,
        set: &'a OverloadSet,
        args: &[ValueBox],
    ) -> Option<&'a FunctionBinding> {
        let arg_types: Vec<TypeId> = args
            .iter()
            .map(|a| a.type_id())
            .collect::<Result<_, _>>()
            .ok()?;

        let mut best: Option<(usize, &FunctionBinding)> = None;
        for candidate in &set.candidates {
            if candidate.params.len() != arg_types.len() {
                continue;
            }
            let mut score = 0usize;
            let mut disqualified = false;
            for (param, &arg_type) in candidate.params.iter().zip(arg_types.iter()) {
                if arg_type == param.type_id {
                    score += 1;
                } else if param.by_ref {
                    // by-reference parameters require an EXACT match
                    disqualified = true;
                    break;
                } else if self.has_conversion(arg_type, param.type_id) {
                    // CONVERTIBLE, contributes no score
                } else {
                    disqualified = true;
                    break;
                }
            }
            if disqualified {
                continue;
            }
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, candidate));
            }
        }
        best.map(|(_, candidate)| candidate)
    }

    /// Same algorithm as [`Self::resolve_overload`], applied to a member
    /// function's own arguments (the receiver is never part of the scored
    /// signature).
    pub fn resolve_member_overload<'a>(
        &self,
        set: &'a MemberOverloadSet,
        args: &[ValueBox],
    ) -> Option<&'a MemberFunctionBinding> {
        let arg_types: Vec<TypeId> = args
            .iter()
            .map(|a| a.type_id())
            .collect::<Result<_, _>>()
            .ok()?;

        let mut best: Option<(usize, &MemberFunctionBinding)> = None;
        for candidate in &set.candidates {
            if candidate.params.len() != arg_types.len() {
                continue;
            }
            let mut score = 0usize;
            let mut disqualified = false;
            for (param, &arg_type) in candidate.params.iter().zip(arg_types.iter()) {
                if arg_type == param.type_id {
                    score += 1;
                } else if param.by_ref {
                    disqualified = true;
                    break;
                } else if self.has_conversion(arg_type, param.type_id) {
                    // CONVERTIBLE, contributes no score
                } else {
                    disqualified = true;
                    break;
                }
            }
            if disqualified {
                continue;
            }
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, candidate));
            }
        }
        best.map(|(_, candidate)| candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_param() -> Param {
        Param::by_value(TypeId::of::<i64>())
    }
    fn float_param() -> Param {
        Param::by_value(TypeId::of::<f64>())
    }

    fn stub_binding(params: Vec<Param>, tag: i64) -> FunctionBinding {
        FunctionBinding {
            params,
            call: Box::new(move |_| Ok(ValueBox::owned(Value::Int(tag)))),
        }
    }

    #[test]
    fn picks_exact_arity_and_type() {
        let mut bindings = Bindings::new();
        bindings.register_global_fn("foo", stub_binding(vec![int_param()], 1));
        bindings.register_global_fn("foo", stub_binding(vec![int_param(), int_param()], 2));

        let set = bindings.get_global_fn("foo").unwrap();
        let unary_args = [ValueBox::owned(Value::Int(2))];
        let chosen = bindings.resolve_overload(set, &unary_args).unwrap();
        match (chosen.call)(&unary_args).unwrap().value().unwrap() {
            Value::Int(1) => {}
            other => panic!("unexpected {:?}", other),
        }

        let binary_args = [
            ValueBox::owned(Value::Int(2)),
            ValueBox::owned(Value::Int(3)),
        ];
        let chosen = bindings.resolve_overload(set, &binary_args).unwrap();
        match (chosen.call)(&binary_args).unwrap().value().unwrap() {
            Value::Int(2) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn picks_unary_via_conversion_when_no_exact_match() {
        let mut bindings = Bindings::new();
        bindings
            .register_conversion(TypeId::of::<f64>(), TypeId::of::<i64>(), |v| match v {
                Value::Double(d) => Ok(Value::Int(*d as i64)),
                _ => unreachable!(),
            })
            .unwrap();
        bindings.register_global_fn("foo", stub_binding(vec![int_param()], 1));
        bindings.register_global_fn("foo", stub_binding(vec![int_param(), int_param()], 2));

        let set = bindings.get_global_fn("foo").unwrap();
        let args = [ValueBox::owned(Value::Double(2.0))];
        let chosen = bindings.resolve_overload(set, &args).unwrap();
        match (chosen.call)(&args).unwrap().value().unwrap() {
            Value::Int(1) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn ties_favor_earliest_registered() {
        let mut bindings = Bindings::new();
        bindings.register_global_fn("foo", stub_binding(vec![float_param()], 1));
        bindings.register_global_fn("foo", stub_binding(vec![float_param()], 2));
        let set = bindings.get_global_fn("foo").unwrap();
        let args = [ValueBox::owned(Value::Double(1.0))];
        let chosen = bindings.resolve_overload(set, &args).unwrap();
        match (chosen.call)(&args).unwrap().value().unwrap() {
            Value::Int(1) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn registering_a_global_var_twice_is_an_error() {
        let mut bindings = Bindings::new();
        bindings
            .register_global_var("x", ValueBox::owned(Value::Int(1)))
            .unwrap();
        let err = bindings
            .register_global_var("x", ValueBox::owned(Value::Int(2)))
            .unwrap_err();
        assert!(matches!(err, crate::error::EngineError::DuplicateBinding(name) if name == "x"));
    }

    #[test]
    fn registering_a_conversion_pair_twice_is_an_error() {
        let mut bindings = Bindings::new();
        bindings
            .register_conversion(TypeId::of::<f64>(), TypeId::of::<i64>(), |_| {
                Ok(Value::Int(0))
            })
            .unwrap();
        let err = bindings
            .register_conversion(TypeId::of::<f64>(), TypeId::of::<i64>(), |_| {
                Ok(Value::Int(0))
            })
            .unwrap_err();
        assert!(matches!(err, crate::error::EngineError::DuplicateBinding(_)));
    }
}
