//! Dynamically-typed values that flow through the evaluator.
//!
//! A [`ValueBox`] can hold one of the core numeric kinds directly, host data
//! that has been let in through the `Host` escape hatch (see [`HostValue`]),
//! a host-owned variable shared with the script via [`std::rc::Rc`]
//! (`Shared`), or a reference to another value box (`Ref`) — the mechanism
//! that lets a named variable be assigned into from the evaluator.
//!
//! This is the Rust-idiomatic reading of the original engine's `BoxedValue`:
//! where that type aliases storage via a raw `BoxedValue *` for its
//! reference case, here a [`ValueBox`] reference is an `Rc<RefCell<..>>`
//! cell shared between the scope that owns the variable and whoever is
//! holding the reference, so aliasing a live variable never needs `unsafe`.

use crate::error::RuntimeError;
use crate::type_registry::TypeId;
use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// An object a host can pass into the engine through [`Value::host`] without
/// the engine knowing its concrete Rust type ahead of time. Implemented for
/// any `T: Clone + Debug + 'static` via the blanket impl below, so ordinary
/// host structs just work.
pub trait HostValue: fmt::Debug + 'static {
    fn clone_box(&self) -> Box<dyn HostValue>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn host_type_id(&self) -> TypeId;
}

impl<T> HostValue for T
where
    T: Clone + fmt::Debug + 'static,
{
    fn clone_box(&self) -> Box<dyn HostValue> {
        Box::new(self.clone())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn host_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }
}

/// The core tagged value. Carries either one of the engine's built-in
/// numeric kinds or an arbitrary host object behind the `Host` escape hatch
/// (this is how the default string/vector bindings and any host-registered
/// struct are represented).
#[derive(Debug)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Size(usize),
    Char(char),
    Float(f32),
    Double(f64),
    Host(Box<dyn HostValue>),
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Self::Bool(v) => Self::Bool(*v),
            Self::Int(v) => Self::Int(*v),
            Self::UInt(v) => Self::UInt(*v),
            Self::Size(v) => Self::Size(*v),
            Self::Char(v) => Self::Char(*v),
            Self::Float(v) => Self::Float(*v),
            Self::Double(v) => Self::Double(*v),
            Self::Host(v) => Self::Host(HostValue::clone_box(v.as_ref())),
        }
    }
}

impl Value {
    pub fn host<T: Clone + fmt::Debug + 'static>(value: T) -> Self {
        Self::Host(Box::new(value))
    }

    /// The [`TypeId`] of whatever this value is currently holding.
    pub fn type_id(&self) -> TypeId {
        match self {
            Self::Bool(_) => TypeId::of::<bool>(),
            Self::Int(_) => TypeId::of::<i64>(),
            Self::UInt(_) => TypeId::of::<u64>(),
            Self::Size(_) => TypeId::of::<usize>(),
            Self::Char(_) => TypeId::of::<char>(),
            Self::Float(_) => TypeId::of::<f32>(),
            Self::Double(_) => TypeId::of::<f64>(),
            Self::Host(v) => HostValue::host_type_id(v.as_ref()),
        }
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Self::Host(v) => HostValue::as_any(v.as_ref()).downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        match self {
            Self::Host(v) => HostValue::as_any_mut(v.as_mut()).downcast_mut::<T>(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

/// Reads a projected field out of a host value, for member-variable access.
pub type ProjectionGet = Rc<dyn Fn(&Value) -> Result<Value, RuntimeError>>;
/// Writes a projected field back into a host value, for member-variable
/// assignment.
pub type ProjectionSet = Rc<dyn Fn(&mut Value, Value) -> Result<(), RuntimeError>>;

/// The storage modality backing a [`ValueBox`].
#[derive(Clone)]
enum Slot {
    /// No value has ever been assigned here.
    Empty,
    /// The box owns its value outright.
    Owned(Value),
    /// The box shares ownership of a value with something outside the
    /// scope stack, typically a host variable registered via
    /// [`crate::engine::Engine::register_global_shared`]. Models the
    /// "shared pointer to T" storage form.
    Shared(Rc<RefCell<Value>>),
    /// The box is a reference to another value box, i.e. an lvalue. This is
    /// what [`crate::scope::ScopeStack`] hands back for named variables.
    Ref(Rc<RefCell<ValueBox>>),
    /// A reference to a named field of the value living in `backing`,
    /// addressed through a getter/setter pair registered as a member
    /// variable binding. Backs `EXPR.NAME` member-variable access.
    Projected {
        backing: Rc<RefCell<ValueBox>>,
        get: ProjectionGet,
        set: ProjectionSet,
    },
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Owned(v) => write!(f, "Owned({:?})", v),
            Self::Shared(v) => write!(f, "Shared({:?})", v.borrow()),
            Self::Ref(_) => write!(f, "Ref(..)"),
            Self::Projected { .. } => write!(f, "Projected(..)"),
        }
    }
}

/// A boxed, dynamically-typed value as seen by the evaluator. See the
/// module docs for the storage modalities this can represent.
#[derive(Debug, Clone)]
pub struct ValueBox(Slot);

impl ValueBox {
    pub fn empty() -> Self {
        Self(Slot::Empty)
    }

    /// Turns this box into a reference cell: if it's already a `Ref`, reuses
    /// the same backing cell (so aliasing is preserved); otherwise wraps a
    /// clone of the resolved box in a fresh cell. Used to build a stable
    /// backing for member-variable projections and vector elements.
    pub fn into_cell(self) -> Rc<RefCell<ValueBox>> {
        match self.0 {
            Slot::Ref(cell) => cell,
            _ => Rc::new(RefCell::new(self)),
        }
    }

    pub fn owned(value: Value) -> Self {
        Self(Slot::Owned(value))
    }

    pub fn shared(value: Rc<RefCell<Value>>) -> Self {
        Self(Slot::Shared(value))
    }

    /// Builds a reference box pointing at `cell`. This is how
    /// [`crate::scope::ScopeStack`] exposes named variables as assignable
    /// lvalues.
    pub fn reference(cell: Rc<RefCell<ValueBox>>) -> Self {
        Self(Slot::Ref(cell))
    }

    /// Builds a reference box over a named field of the value living in
    /// `backing`, addressed through `get`/`set`. This is how
    /// `MemberVariableAccess` produces an assignable box without the
    /// engine needing to know the host type's layout.
    pub fn projected(backing: Rc<RefCell<ValueBox>>, get: ProjectionGet, set: ProjectionSet) -> Self {
        Self(Slot::Projected { backing, get, set })
    }

    /// True if this box (after following any reference chain) has never
    /// been assigned a value. This is the trigger for first-assignment
    /// semantics on `=`.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Slot::Empty => true,
            Slot::Owned(_) | Slot::Shared(_) | Slot::Projected { .. } => false,
            Slot::Ref(cell) => cell.borrow().is_empty(),
        }
    }

    /// True if this box is an lvalue (a reference to a named variable or a
    /// vector/member slot), i.e. something `=` can write into.
    pub fn is_assignable(&self) -> bool {
        matches!(self.0, Slot::Ref(_) | Slot::Projected { .. })
    }

    /// Resolves this box down to a read-only reference to its underlying
    /// value, following one level of reference indirection. `resolve_ref` in
    /// the original engine; idempotent by construction since it always
    /// bottoms out at a non-`Ref` slot.
    pub fn resolve(&self) -> Result<ResolvedValue<'_>, RuntimeError> {
        match &self.0 {
            Slot::Empty => Err(RuntimeError::UseOfUninitialized),
            Slot::Owned(v) => Ok(ResolvedValue::Borrowed(v)),
            Slot::Shared(rc) => Ok(ResolvedValue::Cell(rc.borrow())),
            Slot::Ref(cell) => {
                // Collapses to an owned clone rather than a borrow, since a
                // reference into a temporary `Ref<ValueBox>` guard can't
                // outlive this call; values are cheap to clone (numeric
                // kinds, or a clone of the host `Box`).
                let inner = cell.borrow();
                let resolved = inner.resolve()?;
                Ok(ResolvedValue::Owned(resolved.to_owned_value()))
            }
            Slot::Projected { backing, get, .. } => {
                let inner = backing.borrow();
                let resolved = inner.resolve()?;
                Ok(ResolvedValue::Owned(get(&resolved)?))
            }
        }
    }

    /// Clones the fully resolved value out of this box. Errors if the box
    /// (after following references) is still empty.
    pub fn value(&self) -> Result<Value, RuntimeError> {
        Ok(self.resolve()?.to_owned_value())
    }

    /// The type id of the fully resolved value.
    pub fn type_id(&self) -> Result<TypeId, RuntimeError> {
        Ok(self.resolve()?.type_id())
    }

    /// Writes `value` into the variable this box references, following the
    /// reference chain to the actual backing storage. Only valid on an
    /// lvalue (a `Ref` box); anything else is a [`RuntimeError::NotAssignable`].
    pub fn assign(&self, value: Value) -> Result<(), RuntimeError> {
        match &self.0 {
            Slot::Ref(cell) => cell.borrow_mut().assign_direct(value),
            Slot::Projected { backing, set, .. } => {
                with_backing_mut_inner(&mut backing.borrow_mut(), |v| set(v, value))?
            }
            _ => Err(RuntimeError::NotAssignable),
        }
    }

    fn assign_direct(&mut self, value: Value) -> Result<(), RuntimeError> {
        match &mut self.0 {
            Slot::Empty => {
                self.0 = Slot::Owned(value);
                Ok(())
            }
            Slot::Owned(slot) => {
                *slot = value;
                Ok(())
            }
            Slot::Shared(rc) => {
                *rc.borrow_mut() = value;
                Ok(())
            }
            Slot::Ref(cell) => cell.borrow_mut().assign_direct(value),
            Slot::Projected { backing, set, .. } => {
                with_backing_mut_inner(&mut backing.borrow_mut(), |v| set(v, value))?
            }
        }
    }
}

/// A snapshot of the value a [`ValueBox`] resolves to, avoiding a clone when
/// the box is a plain owned or shared value.
pub enum ResolvedValue<'a> {
    Borrowed(&'a Value),
    Cell(Ref<'a, Value>),
    Owned(Value),
}

impl<'a> ResolvedValue<'a> {
    pub fn type_id(&self) -> TypeId {
        match self {
            Self::Borrowed(v) => Value::type_id(v),
            Self::Cell(v) => Value::type_id(v),
            Self::Owned(v) => Value::type_id(v),
        }
    }

    pub fn to_owned_value(&self) -> Value {
        match self {
            Self::Borrowed(v) => (*v).clone(),
            Self::Cell(v) => (**v).clone(),
            Self::Owned(v) => v.clone(),
        }
    }
}

impl std::ops::Deref for ResolvedValue<'_> {
    type Target = Value;
    fn deref(&self) -> &Value {
        match self {
            Self::Borrowed(v) => v,
            Self::Cell(v) => v,
            Self::Owned(v) => v,
        }
    }
}

/// Mutable access into the backing storage of an lvalue box, used by
/// in-place unary operators (`++`, `--`).
pub fn with_backing_mut<R>(
    value_box: &ValueBox,
    f: impl FnOnce(&mut Value) -> R,
) -> Result<R, RuntimeError> {
    match &value_box.0 {
        Slot::Ref(cell) => with_backing_mut_inner(&mut cell.borrow_mut(), f),
        Slot::Projected { backing, get, set } => {
            let mut current = {
                let inner = backing.borrow();
                let resolved = inner.resolve()?;
                get(&resolved)?
            };
            let result = f(&mut current);
            with_backing_mut_inner(&mut backing.borrow_mut(), |host| set(host, current))??;
            Ok(result)
        }
        _ => Err(RuntimeError::NotAssignable),
    }
}

fn with_backing_mut_inner<R>(
    value_box: &mut RefMut<'_, ValueBox>,
    f: impl FnOnce(&mut Value) -> R,
) -> Result<R, RuntimeError> {
    match &mut value_box.0 {
        Slot::Empty => Err(RuntimeError::UseOfUninitialized),
        Slot::Owned(v) => Ok(f(v)),
        Slot::Shared(rc) => Ok(f(&mut rc.borrow_mut())),
        Slot::Ref(cell) => with_backing_mut_inner(&mut cell.borrow_mut(), f),
        // A projected field is never itself stored as the content of a
        // scope cell (only produced transiently as the result of member
        // variable access), so this chain never actually gets walked.
        Slot::Projected { .. } => Err(RuntimeError::NotAssignable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_reports_empty() {
        let b = ValueBox::empty();
        assert!(b.is_empty());
        assert!(b.value().is_err());
    }

    #[test]
    fn owned_box_roundtrips() {
        let b = ValueBox::owned(Value::Int(42));
        assert!(!b.is_empty());
        match b.value().unwrap() {
            Value::Int(42) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn reference_assigns_into_backing_cell() {
        let cell = Rc::new(RefCell::new(ValueBox::empty()));
        let reference = ValueBox::reference(cell.clone());
        assert!(reference.is_empty());
        reference.assign(Value::Int(7)).unwrap();
        assert!(!cell.borrow().is_empty());
        let value = cell.borrow().value().unwrap();
        match value {
            Value::Int(7) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn resolve_is_idempotent_through_a_reference() {
        let cell = Rc::new(RefCell::new(ValueBox::owned(Value::Bool(true))));
        let reference = ValueBox::reference(cell);
        let first = reference.value().unwrap();
        let second = reference.value().unwrap();
        assert_eq!(first.as_bool(), second.as_bool());
    }

    #[test]
    fn host_value_roundtrips_through_downcast() {
        let v = Value::host(String::from("hi"));
        assert_eq!(v.downcast_ref::<String>().unwrap(), "hi");
        assert_eq!(v.type_id(), TypeId::of::<String>());
    }
}
