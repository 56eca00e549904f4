//! The dispatch engine: owns the scope stack and every registered binding
//! and operator, and drives AST evaluation against them.
//!
//! This is the embedding surface a host actually talks to (see the crate
//! docs on [`crate::Engine`] for a worked example) — registration happens
//! here, `ast::Ast::evaluate` is the only other piece of the crate that
//! reaches into it.

use crate::ast::Ast;
use crate::bindings::{Bindings, FunctionBinding, MemberFunctionBinding, MemberVarBinding, Param};
use crate::error::{EngineError, RuntimeError, SourceErrorWrapper, WithSource};
use crate::operators::OperatorTable;
use crate::scope::ScopeStack;
use crate::type_registry::TypeId;
use crate::value::{ProjectionGet, ProjectionSet, Value, ValueBox};
use tracing::{debug, trace};

/// An embeddable instance of the scripting engine. Holds no default
/// bindings of its own — a bare `Engine::new()` can't run much beyond
/// arithmetic on literals until either the host registers its own bindings
/// or [`crate::defaults::install`] is called to wire up the numeric/string/
/// vector/assert bindings this crate ships.
pub struct Engine {
    scope: ScopeStack,
    bindings: Bindings,
    operators: OperatorTable,
}

impl Engine {
    pub fn new() -> Self {
        debug!("constructing engine");
        Self {
            scope: ScopeStack::new(),
            bindings: Bindings::new(),
            operators: OperatorTable::new(),
        }
    }

    pub(crate) fn scope_mut(&mut self) -> &mut ScopeStack {
        &mut self.scope
    }

    pub fn operators(&self) -> &OperatorTable {
        &self.operators
    }

    pub fn operators_mut(&mut self) -> &mut OperatorTable {
        &mut self.operators
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Registers a free function callable from scripts by `name`. Calling
    /// this more than once for the same name installs an overload, scored
    /// at call time per §4.3.
    pub fn register_global_fn(
        &mut self,
        name: &str,
        params: Vec<Param>,
        f: impl Fn(&[ValueBox]) -> Result<ValueBox, RuntimeError> + 'static,
    ) {
        trace!(name, "registering global function");
        self.bindings.register_global_fn(
            name,
            FunctionBinding {
                params,
                call: Box::new(f),
            },
        );
    }

    /// Registers a global variable, visible to scripts as a bare name. Errs
    /// if a global variable by this name is already registered.
    pub fn register_global_var(&mut self, name: &str, value: Value) -> Result<(), EngineError> {
        trace!(name, "registering global variable");
        self.bindings
            .register_global_var(name, ValueBox::owned(value))
    }

    /// Registers a method on host type `T`, named `name` inside scripts.
    pub fn register_member_fn<T: 'static>(
        &mut self,
        name: &str,
        params: Vec<Param>,
        f: impl Fn(&ValueBox, &[ValueBox]) -> Result<ValueBox, RuntimeError> + 'static,
    ) {
        trace!(name, type_name = TypeId::of::<T>().name(), "registering member function");
        self.bindings.register_member_fn(
            TypeId::of::<T>(),
            name,
            MemberFunctionBinding {
                params,
                call: Box::new(f),
            },
        );
    }

    /// Registers a field on host type `T`, accessed from scripts as
    /// `instance.name`. Errs if `T` already has a member variable by this
    /// name.
    pub fn register_member_var<T: 'static>(
        &mut self,
        name: &str,
        get: ProjectionGet,
        set: ProjectionSet,
    ) -> Result<(), EngineError> {
        trace!(name, type_name = TypeId::of::<T>().name(), "registering member variable");
        self.bindings
            .register_member_var(TypeId::of::<T>(), name, MemberVarBinding { get, set })
    }

    /// Registers a conversion from host type `From` to host type `To`. Errs
    /// if a conversion for this pair is already registered.
    pub fn register_conversion<From: 'static, To: 'static>(
        &mut self,
        f: impl Fn(&Value) -> Result<Value, RuntimeError> + 'static,
    ) -> Result<(), EngineError> {
        self.register_conversion_by_id(TypeId::of::<From>(), TypeId::of::<To>(), f)
    }

    /// Same as [`Self::register_conversion`], for callers that only have the
    /// two types as runtime [`TypeId`]s (e.g. looping over a family of
    /// related host types rather than naming each pair at a call site).
    pub fn register_conversion_by_id(
        &mut self,
        from: TypeId,
        to: TypeId,
        f: impl Fn(&Value) -> Result<Value, RuntimeError> + 'static,
    ) -> Result<(), EngineError> {
        trace!(from = from.name(), to = to.name(), "registering conversion");
        self.bindings.register_conversion(from, to, f)
    }

    /// Looks up a variable by name: local/enclosing scopes first, then the
    /// global-variable binding table.
    pub fn lookup_variable(&self, name: &str) -> Option<ValueBox> {
        self.scope
            .lookup(name)
            .or_else(|| self.bindings.get_global_var(name).cloned())
    }

    /// Reads a variable back out of the engine's global scope after a
    /// script has run. Part of the embedding API (§6): the host's way of
    /// getting results out once `evaluate` returns.
    pub fn get_variable(&self, name: &str) -> Option<Value> {
        self.lookup_variable(name).and_then(|b| b.value().ok())
    }

    /// §4.2 `GlobalFunctionCall`: a registered free function by that name
    /// wins first; failing that, a global variable of a bound type is
    /// dispatched through as a callable (its `"()"` member function).
    pub fn call_global(&mut self, name: &str, args: &[ValueBox]) -> Result<ValueBox, RuntimeError> {
        if let Some(set) = self.bindings.get_global_fn(name) {
            let binding = self
                .bindings
                .resolve_overload(set, args)
                .ok_or_else(|| RuntimeError::NoMatchingOverload { name: name.to_string() })?;
            let converted = self.bindings.convert_args(&binding.params, args)?;
            return (binding.call)(&converted);
        }
        if let Some(var) = self.bindings.get_global_var(name).cloned() {
            return self.call_member(&var, "()", args);
        }
        Err(RuntimeError::UnknownName(name.to_string()))
    }

    /// §4.2 `MemberFunctionCall`: resolves `name` against `instance`'s bare
    /// type's member functions; if none match but a same-named member
    /// *variable* exists, recurses into calling `"()"` on its value (so a
    /// field holding a callable host value can be invoked like `obj.field()`).
    pub fn call_member(&mut self, instance: &ValueBox, name: &str, args: &[ValueBox]) -> Result<ValueBox, RuntimeError> {
        let type_id = instance.type_id()?;
        let type_bindings = self
            .bindings
            .get_type_bindings(type_id)
            .ok_or_else(|| RuntimeError::UnknownName(name.to_string()))?;

        if let Some(set) = type_bindings.get_member_func(name) {
            if let Some(binding) = self.bindings.resolve_member_overload(set, args) {
                let converted = self.bindings.convert_args(&binding.params, args)?;
                return (binding.call)(instance, &converted);
            }
        }

        if let Some(var_binding) = type_bindings.get_member_var(name) {
            let field_box = ValueBox::projected(
                instance.clone().into_cell(),
                var_binding.get.clone(),
                var_binding.set.clone(),
            );
            return self.call_member(&field_box, "()", args);
        }

        Err(RuntimeError::NoMatchingOverload { name: name.to_string() })
    }

    /// §4.2 `MemberVariableAccess`: like [`Self::call_member`]'s field
    /// fallback, but returns the field itself as an assignable reference
    /// box instead of invoking it.
    pub fn member_variable(&self, instance: &ValueBox, name: &str) -> Result<ValueBox, RuntimeError> {
        let type_id = instance.type_id()?;
        let type_bindings = self
            .bindings
            .get_type_bindings(type_id)
            .ok_or_else(|| RuntimeError::UnknownName(name.to_string()))?;
        let var_binding = type_bindings
            .get_member_var(name)
            .ok_or_else(|| RuntimeError::UnknownName(name.to_string()))?;
        Ok(ValueBox::projected(
            instance.clone().into_cell(),
            var_binding.get.clone(),
            var_binding.set.clone(),
        ))
    }

    /// Evaluates a parsed program against this engine. Resets the scope
    /// stack back down to a single (empty) global frame first, so a
    /// previous run's locals can never leak into this one.
    pub fn evaluate(&mut self, ast: &Ast) -> Result<ValueBox, WithSource<RuntimeError>> {
        self.evaluate_with_source(ast, "")
    }

    /// Same as [`Self::evaluate`], but attaches `source` to any error so it
    /// can render a caret diagnostic. [`crate::parse_and_run`] is the usual
    /// entry point that supplies this automatically.
    pub fn evaluate_with_source(&mut self, ast: &Ast, source: &str) -> Result<ValueBox, WithSource<RuntimeError>> {
        self.scope.reset();
        match ast.evaluate(self) {
            Ok(value) => Ok(value),
            Err(crate::ast::Spanned(error, span)) => {
                debug!(?error, %span, "runtime error");
                Err(WithSource::single(SourceErrorWrapper::new(error, span, source), source.to_string()))
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
