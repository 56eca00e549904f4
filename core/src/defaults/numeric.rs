//! The built-in numeric tower: `char`, `i64`, `u64`, `usize`, `f32`, `f64`,
//! wired up with arithmetic, bitwise, shift, comparison and increment/
//! decrement operators, plus pairwise conversions between every kind so
//! overload resolution can treat them as interchangeable (§4.3's
//! CONVERTIBLE classification).
//!
//! Every operator is registered by looping over kind pairs rather than
//! hand-writing `6 * 6` closures per operator: each closure is generic over
//! which two concrete `Value` variants it was registered for, and figures
//! out the result kind itself by promotion rank, the same way the engine's
//! dispatch table is type-id-keyed rather than hand-dispatched.

use crate::engine::Engine;
use crate::error::RuntimeError;
use crate::operators::{BinaryOp, UnaryOp};
use crate::type_registry::TypeId;
use crate::value::Value;
use std::cmp::Ordering;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum NumKind {
    Char,
    Int,
    UInt,
    Size,
    Float,
    Double,
}

const ALL: [NumKind; 6] = [
    NumKind::Char,
    NumKind::Int,
    NumKind::UInt,
    NumKind::Size,
    NumKind::Float,
    NumKind::Double,
];

impl NumKind {
    fn of(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Char(_) => Self::Char,
            Value::Int(_) => Self::Int,
            Value::UInt(_) => Self::UInt,
            Value::Size(_) => Self::Size,
            Value::Float(_) => Self::Float,
            Value::Double(_) => Self::Double,
            Value::Bool(_) | Value::Host(_) => return None,
        })
    }

    fn rank(self) -> u8 {
        match self {
            Self::Char => 0,
            Self::Int => 1,
            Self::UInt => 2,
            Self::Size => 3,
            Self::Float => 4,
            Self::Double => 5,
        }
    }

    fn is_float(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    fn is_integral(self) -> bool {
        !self.is_float()
    }

    fn type_id(self) -> TypeId {
        match self {
            Self::Char => TypeId::of::<char>(),
            Self::Int => TypeId::of::<i64>(),
            Self::UInt => TypeId::of::<u64>(),
            Self::Size => TypeId::of::<usize>(),
            Self::Float => TypeId::of::<f32>(),
            Self::Double => TypeId::of::<f64>(),
        }
    }

    /// The result kind of a binary op between `self` and `other`: the
    /// higher-ranked of the two, except `char op char` promotes to `int`
    /// since there's no sensible way to keep the result a `char`.
    fn promote(self, other: Self) -> Self {
        if self == Self::Char && other == Self::Char {
            return Self::Int;
        }
        if self.rank() >= other.rank() {
            self
        } else {
            other
        }
    }

    fn from_f64(self, v: f64) -> Value {
        match self {
            Self::Char => Value::Char(char::from_u32(v as u32).unwrap_or('\0')),
            Self::Int => Value::Int(v as i64),
            Self::UInt => Value::UInt(v as u64),
            Self::Size => Value::Size(v as usize),
            Self::Float => Value::Float(v as f32),
            Self::Double => Value::Double(v),
        }
    }

    fn from_bits(self, bits: u64) -> Value {
        match self {
            Self::Char => Value::Char(char::from_u32(bits as u32).unwrap_or('\0')),
            Self::Int => Value::Int(bits as i64),
            Self::UInt => Value::UInt(bits),
            Self::Size => Value::Size(bits as usize),
            Self::Float => Value::Float(bits as f32),
            Self::Double => Value::Double(bits as f64),
        }
    }
}

fn to_f64(v: &Value) -> f64 {
    match v {
        Value::Char(c) => *c as u32 as f64,
        Value::Int(i) => *i as f64,
        Value::UInt(u) => *u as f64,
        Value::Size(s) => *s as f64,
        Value::Float(f) => *f as f64,
        Value::Double(d) => *d,
        _ => 0.0,
    }
}

fn to_bits(v: &Value) -> u64 {
    match v {
        Value::Char(c) => *c as u32 as u64,
        Value::Int(i) => *i as u64,
        Value::UInt(u) => *u,
        Value::Size(s) => *s as u64,
        _ => 0,
    }
}

/// Signed/unsigned-aware integer value, for the "value-correct" comparison
/// rule: a negative signed integer is always less than any unsigned value
/// and never equal to one, regardless of bit pattern.
enum IntVal {
    Signed(i64),
    Unsigned(u64),
}

fn to_intval(kind: NumKind, v: &Value) -> IntVal {
    match kind {
        NumKind::Int => IntVal::Signed(match v {
            Value::Int(i) => *i,
            _ => unreachable!(),
        }),
        _ => IntVal::Unsigned(to_bits(v)),
    }
}

fn cmp_int(a: IntVal, b: IntVal) -> Ordering {
    match (a, b) {
        (IntVal::Signed(x), IntVal::Signed(y)) => x.cmp(&y),
        (IntVal::Unsigned(x), IntVal::Unsigned(y)) => x.cmp(&y),
        (IntVal::Signed(x), IntVal::Unsigned(y)) => {
            if x < 0 {
                Ordering::Less
            } else {
                (x as u64).cmp(&y)
            }
        }
        (IntVal::Unsigned(x), IntVal::Signed(y)) => {
            if y < 0 {
                Ordering::Greater
            } else {
                x.cmp(&(y as u64))
            }
        }
    }
}

fn compare(lhs_kind: NumKind, rhs_kind: NumKind, lhs: &Value, rhs: &Value) -> Option<Ordering> {
    if lhs_kind.is_float() || rhs_kind.is_float() {
        to_f64(lhs).partial_cmp(&to_f64(rhs))
    } else {
        Some(cmp_int(to_intval(lhs_kind, lhs), to_intval(rhs_kind, rhs)))
    }
}

#[derive(Copy, Clone)]
enum Arith {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

fn as_i64(v: &Value) -> i64 {
    match v {
        Value::Char(c) => *c as i64,
        Value::Int(i) => *i,
        Value::UInt(u) => *u as i64,
        Value::Size(s) => *s as i64,
        _ => unreachable!("only called for integral kinds"),
    }
}

fn as_u64(v: &Value) -> u64 {
    match v {
        Value::Char(c) => *c as u64,
        Value::Int(i) => *i as u64,
        Value::UInt(u) => *u,
        Value::Size(s) => *s as u64,
        _ => unreachable!("only called for integral kinds"),
    }
}

fn as_usize(v: &Value) -> usize {
    match v {
        Value::Char(c) => *c as usize,
        Value::Int(i) => *i as usize,
        Value::UInt(u) => *u as usize,
        Value::Size(s) => *s,
        _ => unreachable!("only called for integral kinds"),
    }
}

/// Native integer arithmetic in the promoted result type's own width,
/// wrapping on overflow the way the underlying machine type does, rather
/// than routing every kind through `f64` and losing precision above 2^53.
/// Floats still go through `f64`/`f32` below, since that's their own native
/// representation.
fn arith(op: Arith, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    let lhs_kind = NumKind::of(lhs).expect("registered only for numeric kinds");
    let rhs_kind = NumKind::of(rhs).expect("registered only for numeric kinds");
    let result_kind = lhs_kind.promote(rhs_kind);

    if result_kind.is_float() {
        let a = to_f64(lhs);
        let b = to_f64(rhs);
        let result = match op {
            Arith::Add => a + b,
            Arith::Sub => a - b,
            Arith::Mul => a * b,
            Arith::Div => a / b,
            Arith::Mod => a % b,
        };
        return Ok(result_kind.from_f64(result));
    }

    macro_rules! int_arith {
        ($a:expr, $b:expr) => {
            match op {
                Arith::Add => $a.wrapping_add($b),
                Arith::Sub => $a.wrapping_sub($b),
                Arith::Mul => $a.wrapping_mul($b),
                Arith::Div => {
                    if $b == 0 {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    $a.wrapping_div($b)
                }
                Arith::Mod => {
                    if $b == 0 {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    $a.wrapping_rem($b)
                }
            }
        };
    }

    Ok(match result_kind {
        NumKind::Int => Value::Int(int_arith!(as_i64(lhs), as_i64(rhs))),
        NumKind::UInt => Value::UInt(int_arith!(as_u64(lhs), as_u64(rhs))),
        NumKind::Size => Value::Size(int_arith!(as_usize(lhs), as_usize(rhs))),
        NumKind::Char | NumKind::Float | NumKind::Double => {
            unreachable!("char op char promotes to Int; float handled above")
        }
    })
}

#[derive(Copy, Clone)]
enum Bitwise {
    And,
    Xor,
    Or,
}

fn bitwise(op: Bitwise, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    let lhs_kind = NumKind::of(lhs).expect("registered only for integral kinds");
    let rhs_kind = NumKind::of(rhs).expect("registered only for integral kinds");
    let result_kind = lhs_kind.promote(rhs_kind);
    let a = to_bits(lhs);
    let b = to_bits(rhs);
    let result = match op {
        Bitwise::And => a & b,
        Bitwise::Xor => a ^ b,
        Bitwise::Or => a | b,
    };
    Ok(result_kind.from_bits(result))
}

fn shift(left: bool, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeError> {
    let lhs_kind = NumKind::of(lhs).expect("registered only for integral kinds");
    let a = to_bits(lhs);
    let amount = (to_bits(rhs) % 64) as u32;
    let result = if left { a.wrapping_shl(amount) } else { a.wrapping_shr(amount) };
    Ok(lhs_kind.from_bits(result))
}

fn compare_result(cmp: Option<Ordering>, op: BinaryOp) -> bool {
    match cmp {
        Some(Ordering::Less) => matches!(op, BinaryOp::Lt | BinaryOp::Le | BinaryOp::Ne),
        Some(Ordering::Equal) => matches!(op, BinaryOp::Le | BinaryOp::Ge | BinaryOp::Eq),
        Some(Ordering::Greater) => matches!(op, BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Ne),
        None => matches!(op, BinaryOp::Ne),
    }
}

/// One step of an in-place `++`/`--`, native to the operand's own kind
/// (rather than routed through the `f64` promotion arithmetic uses, so a
/// `usize` at `0` wraps the way unsigned wraparound should, not the way
/// float subtraction would round it).
fn step(delta: i64, v: &mut Value) -> Result<Value, RuntimeError> {
    *v = match *v {
        Value::Int(i) => Value::Int(i.wrapping_add(delta)),
        Value::UInt(u) => Value::UInt(if delta < 0 { u.wrapping_sub(1) } else { u.wrapping_add(1) }),
        Value::Size(s) => Value::Size(if delta < 0 { s.wrapping_sub(1) } else { s.wrapping_add(1) }),
        Value::Float(f) => Value::Float(f + delta as f32),
        Value::Double(d) => Value::Double(d + delta as f64),
        Value::Char(c) => {
            let code = c as u32 as i64 + delta;
            Value::Char(char::from_u32(code.max(0) as u32).unwrap_or('\0'))
        }
        _ => return Err(RuntimeError::BadCast { from: "non-numeric", to: "<incrementable>" }),
    };
    Ok(v.clone())
}

pub fn install(engine: &mut Engine) {
    for &kind in &ALL {
        engine.operators_mut().register_binary(BinaryOp::Assign, kind.type_id(), kind.type_id(), |_, b| Ok(b.clone()));
    }
    engine.operators_mut().register_binary(BinaryOp::Assign, TypeId::of::<bool>(), TypeId::of::<bool>(), |_, b| Ok(b.clone()));

    for &lhs in &ALL {
        for &rhs in &ALL {
            engine.operators_mut().register_binary(BinaryOp::Add, lhs.type_id(), rhs.type_id(), move |a, b| arith(Arith::Add, a, b));
            engine.operators_mut().register_binary(BinaryOp::Sub, lhs.type_id(), rhs.type_id(), move |a, b| arith(Arith::Sub, a, b));
            engine.operators_mut().register_binary(BinaryOp::Mul, lhs.type_id(), rhs.type_id(), move |a, b| arith(Arith::Mul, a, b));
            engine.operators_mut().register_binary(BinaryOp::Div, lhs.type_id(), rhs.type_id(), move |a, b| arith(Arith::Div, a, b));
            engine.operators_mut().register_binary(BinaryOp::Mod, lhs.type_id(), rhs.type_id(), move |a, b| arith(Arith::Mod, a, b));

            for op in [BinaryOp::Lt, BinaryOp::Le, BinaryOp::Gt, BinaryOp::Ge, BinaryOp::Eq, BinaryOp::Ne] {
                engine.operators_mut().register_binary(op, lhs.type_id(), rhs.type_id(), move |a, b| {
                    let lhs_kind = NumKind::of(a).expect("registered only for numeric kinds");
                    let rhs_kind = NumKind::of(b).expect("registered only for numeric kinds");
                    Ok(Value::Bool(compare_result(compare(lhs_kind, rhs_kind, a, b), op)))
                });
            }

            if lhs.is_integral() && rhs.is_integral() {
                engine.operators_mut().register_binary(BinaryOp::BitAnd, lhs.type_id(), rhs.type_id(), move |a, b| bitwise(Bitwise::And, a, b));
                engine.operators_mut().register_binary(BinaryOp::BitXor, lhs.type_id(), rhs.type_id(), move |a, b| bitwise(Bitwise::Xor, a, b));
                engine.operators_mut().register_binary(BinaryOp::BitOr, lhs.type_id(), rhs.type_id(), move |a, b| bitwise(Bitwise::Or, a, b));
                engine.operators_mut().register_binary(BinaryOp::Shl, lhs.type_id(), rhs.type_id(), move |a, b| shift(true, a, b));
                engine.operators_mut().register_binary(BinaryOp::Shr, lhs.type_id(), rhs.type_id(), move |a, b| shift(false, a, b));
            }
        }
    }

    // Pairwise conversions, so e.g. an `int` argument satisfies a
    // `double`-typed parameter as a CONVERTIBLE (not EXACT) overload match.
    for &from in &ALL {
        for &to in &ALL {
            if from == to {
                continue;
            }
            register_conversion(engine, from, to);
        }
    }

    for &kind in &ALL {
        engine.operators_mut().register_unary_pure(UnaryOp::UnaryMinus, kind.type_id(), move |v| {
            Ok(kind.from_f64(-to_f64(v)))
        });
        engine.operators_mut().register_unary_pure(UnaryOp::BitwiseNot, kind.type_id(), move |v| {
            if kind.is_integral() {
                Ok(kind.from_bits(!to_bits(v)))
            } else {
                Err(RuntimeError::BadCast { from: "float", to: "<bitwise operand>" })
            }
        });
        engine.operators_mut().register_unary_mutate(UnaryOp::PreInc, kind.type_id(), |v| step(1, v));
        engine.operators_mut().register_unary_mutate(UnaryOp::PreDec, kind.type_id(), |v| step(-1, v));
        engine.operators_mut().register_unary_mutate(UnaryOp::PostInc, kind.type_id(), |v| step(1, v));
        engine.operators_mut().register_unary_mutate(UnaryOp::PostDec, kind.type_id(), |v| step(-1, v));
    }

    engine.operators_mut().register_unary_pure(UnaryOp::LogicNot, TypeId::of::<bool>(), |v| match v {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        _ => unreachable!(),
    });
    engine.operators_mut().register_binary(BinaryOp::And, TypeId::of::<bool>(), TypeId::of::<bool>(), |a, b| {
        match (a, b) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(*a && *b)),
            _ => unreachable!(),
        }
    });
    engine.operators_mut().register_binary(BinaryOp::Or, TypeId::of::<bool>(), TypeId::of::<bool>(), |a, b| {
        match (a, b) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(*a || *b)),
            _ => unreachable!(),
        }
    });
    engine.operators_mut().register_binary(BinaryOp::Eq, TypeId::of::<bool>(), TypeId::of::<bool>(), |a, b| {
        match (a, b) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a == b)),
            _ => unreachable!(),
        }
    });
    engine.operators_mut().register_binary(BinaryOp::Ne, TypeId::of::<bool>(), TypeId::of::<bool>(), |a, b| {
        match (a, b) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a != b)),
            _ => unreachable!(),
        }
    });
}

fn register_conversion(engine: &mut Engine, from: NumKind, to: NumKind) {
    engine
        .register_conversion_by_id(from.type_id(), to.type_id(), move |v| Ok(to.from_f64(to_f64(v))))
        .expect("each numeric kind pair is only registered once");
}

/// The [`TypeId`]s of the six built-in numeric kinds, for sibling `defaults`
/// modules that need to register a binding once per numeric kind (e.g.
/// vector's `push`, which accepts any of them).
pub(crate) fn type_ids() -> [TypeId; 6] {
    ALL.map(NumKind::type_id)
}
