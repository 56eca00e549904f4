//! Binary/unary operator kinds and the dispatch table the evaluator looks
//! them up in.
//!
//! The table is keyed by `(operator, left-type-id, right-type-id)`, exactly
//! as described for the dispatch engine: a binary operator is just a
//! function from two resolved values to a new value, registered once per
//! concrete type pair it supports. `+=`/`-=`/etc. are not stored here at
//! all — the parser desugars them into `NAME = (NAME op EXPR)`, so only the
//! plain operators below ever reach the table.

use crate::error::RuntimeError;
use crate::type_registry::{type_pair_hash, TypeId, TypePairKey};
use crate::value::Value;
use std::collections::HashMap;

/// Every binary operator the grammar can produce, after compound-assignment
/// desugaring.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
    Assign,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::BitAnd => "&",
            Self::BitXor => "^",
            Self::BitOr => "|",
            Self::And => "&&",
            Self::Or => "||",
            Self::Assign => "=",
        }
    }
}

/// Every unary operator the grammar can produce. `UnaryPlus` is handled
/// directly by the evaluator (it's a no-op), never through this table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    UnaryPlus,
    UnaryMinus,
    LogicNot,
    BitwiseNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::UnaryPlus => "+",
            Self::UnaryMinus => "-",
            Self::LogicNot => "!",
            Self::BitwiseNot => "~",
            Self::PreInc => "++",
            Self::PreDec => "--",
            Self::PostInc => "++",
            Self::PostDec => "--",
        }
    }
}

/// A registered binary operator implementation: takes the two resolved
/// operand values and produces a result value.
pub type BinaryOpFn = Box<dyn Fn(&Value, &Value) -> Result<Value, RuntimeError>>;

/// A registered in-place unary operator implementation (`++`/`--`): takes a
/// mutable reference to the operand's current value and returns the new
/// value it was set to.
pub type UnaryMutateFn = Box<dyn Fn(&mut Value) -> Result<Value, RuntimeError>>;

/// A registered pure unary operator implementation (`-x`, `!x`, `~x`):
/// takes the resolved operand value and produces a fresh result.
pub type UnaryPureFn = Box<dyn Fn(&Value) -> Result<Value, RuntimeError>>;

#[derive(Default)]
pub struct OperatorTable {
    binary: HashMap<(BinaryOp, TypePairKey), BinaryOpFn>,
    unary_mutate: HashMap<(UnaryOp, TypeId), UnaryMutateFn>,
    unary_pure: HashMap<(UnaryOp, TypeId), UnaryPureFn>,
}

impl OperatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_binary(
        &mut self,
        op: BinaryOp,
        lhs: TypeId,
        rhs: TypeId,
        f: impl Fn(&Value, &Value) -> Result<Value, RuntimeError> + 'static,
    ) {
        self.binary
            .insert((op, type_pair_hash(lhs, rhs)), Box::new(f));
    }

    pub fn lookup_binary(
        &self,
        op: BinaryOp,
        lhs: TypeId,
        rhs: TypeId,
    ) -> Option<&BinaryOpFn> {
        self.binary.get(&(op, type_pair_hash(lhs, rhs)))
    }

    pub fn register_unary_mutate(
        &mut self,
        op: UnaryOp,
        operand: TypeId,
        f: impl Fn(&mut Value) -> Result<Value, RuntimeError> + 'static,
    ) {
        self.unary_mutate.insert((op, operand), Box::new(f));
    }

    pub fn lookup_unary_mutate(&self, op: UnaryOp, operand: TypeId) -> Option<&UnaryMutateFn> {
        self.unary_mutate.get(&(op, operand))
    }

    pub fn register_unary_pure(
        &mut self,
        op: UnaryOp,
        operand: TypeId,
        f: impl Fn(&Value) -> Result<Value, RuntimeError> + 'static,
    ) {
        self.unary_pure.insert((op, operand), Box::new(f));
    }

    pub fn lookup_unary_pure(&self, op: UnaryOp, operand: TypeId) -> Option<&UnaryPureFn> {
        self.unary_pure.get(&(op, operand))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_lookup_round_trips() {
        let mut table = OperatorTable::new();
        let int_id = TypeId::of::<i64>();
        table.register_binary(BinaryOp::Add, int_id, int_id, |a, b| {
            match (a, b) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
                _ => unreachable!(),
            }
        });
        let f = table.lookup_binary(BinaryOp::Add, int_id, int_id).unwrap();
        let result = f(&Value::Int(2), &Value::Int(3)).unwrap();
        match result {
            Value::Int(5) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_entry_is_none() {
        let table = OperatorTable::new();
        assert!(table
            .lookup_binary(BinaryOp::Add, TypeId::of::<i64>(), TypeId::of::<f64>())
            .is_none());
    }
}
