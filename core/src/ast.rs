//! Tagged AST node kinds and their evaluation semantics.
//!
//! Every node pairs its [`AstKind`] with the [`Span`] it was parsed from
//! (mirroring the teacher's `Node<T, M>` pairing of AST data with
//! metadata), so a runtime error can always point back at source text.

use crate::engine::Engine;
use crate::error::RuntimeError;
use crate::operators::{BinaryOp, UnaryOp};
use crate::util::Span;
use crate::value::{Value, ValueBox};

/// One node of the parsed AST, together with the span of source it came
/// from.
#[derive(Debug)]
pub struct Ast {
    pub kind: AstKind,
    pub span: Span,
}

impl Ast {
    pub fn new(kind: AstKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug)]
pub enum AstKind {
    Noop,
    Value(Value),
    Statements(Vec<Ast>),
    Scope(Box<Ast>),
    NamedVariable { name: String, is_decl: bool },
    Binary {
        op: BinaryOp,
        lhs: Box<Ast>,
        rhs: Box<Ast>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Ast>,
    },
    If {
        cond: Box<Ast>,
        then_branch: Box<Ast>,
        else_branch: Option<Box<Ast>>,
    },
    While {
        cond: Box<Ast>,
        body: Box<Ast>,
    },
    For {
        init: Box<Ast>,
        cond: Box<Ast>,
        step: Box<Ast>,
        body: Box<Ast>,
    },
    VectorDecl(Vec<Ast>),
    VectorAccess {
        container: Box<Ast>,
        index: Box<Ast>,
    },
    GlobalFunctionCall {
        name: String,
        args: Vec<Ast>,
    },
    MemberFunctionCall {
        name: String,
        instance: Box<Ast>,
        args: Vec<Ast>,
    },
    MemberVariableAccess {
        name: String,
        instance: Box<Ast>,
    },
}

/// Attaches the node's span to a [`RuntimeError`] so the caller can render
/// a full diagnostic without threading the span through every call site.
pub struct Spanned(pub RuntimeError, pub Span);

type EvalResult = Result<ValueBox, Spanned>;

impl Ast {
    fn err(&self, error: RuntimeError) -> Spanned {
        Spanned(error, self.span)
    }

    pub fn evaluate(&self, engine: &mut Engine) -> EvalResult {
        match &self.kind {
            AstKind::Noop => Ok(ValueBox::empty()),

            AstKind::Value(v) => Ok(ValueBox::owned(v.clone())),

            AstKind::Statements(stmts) => {
                let mut result = ValueBox::empty();
                for stmt in stmts {
                    result = stmt.evaluate(engine)?;
                }
                Ok(result)
            }

            AstKind::Scope(body) => {
                // Pushed/popped manually rather than via `ScopeStack`'s
                // RAII guard: the guard would hold a live borrow of
                // `engine.scope` for the duration of `body.evaluate`, which
                // itself needs a fresh `&mut engine`. Popping unconditionally
                // after the match below gives the same "pop on every exit
                // path, including error" guarantee.
                engine.scope_mut().push();
                let result = body.evaluate(engine);
                engine.scope_mut().pop();
                result?;
                Ok(ValueBox::empty())
            }

            AstKind::NamedVariable { name, is_decl } => {
                if *is_decl {
                    engine.scope_mut().declare(name).map_err(|e| self.err(e))
                } else {
                    engine
                        .lookup_variable(name)
                        .ok_or_else(|| self.err(RuntimeError::UnknownName(name.clone())))
                }
            }

            AstKind::Binary { op, lhs, rhs } => self.evaluate_binary(engine, *op, lhs, rhs),

            AstKind::Unary { op, expr } => self.evaluate_unary(engine, *op, expr),

            AstKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_box = cond.evaluate(engine)?;
                let truthy = is_truthy(&cond_box).map_err(|e| self.err(e))?;
                if truthy {
                    then_branch.evaluate(engine)
                } else if let Some(else_branch) = else_branch {
                    else_branch.evaluate(engine)
                } else {
                    Ok(ValueBox::empty())
                }
            }

            AstKind::While { cond, body } => {
                loop {
                    let cond_box = cond.evaluate(engine)?;
                    if !is_truthy(&cond_box).map_err(|e| self.err(e))? {
                        break;
                    }
                    body.evaluate(engine)?;
                }
                Ok(ValueBox::empty())
            }

            AstKind::For {
                init,
                cond,
                step,
                body,
            } => {
                engine.scope_mut().push();
                let result = (|| -> EvalResult {
                    init.evaluate(engine)?;
                    loop {
                        let cond_box = cond.evaluate(engine)?;
                        if !is_truthy(&cond_box).map_err(|e| self.err(e))? {
                            break;
                        }
                        body.evaluate(engine)?;
                        step.evaluate(engine)?;
                    }
                    Ok(ValueBox::empty())
                })();
                engine.scope_mut().pop();
                result
            }

            AstKind::VectorDecl(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(item.evaluate(engine)?);
                }
                Ok(ValueBox::owned(Value::host(crate::defaults::vector::ScriptVector(values))))
            }

            AstKind::VectorAccess { container, index } => {
                let container_box = container.evaluate(engine)?;
                let index_box = index.evaluate(engine)?;
                engine
                    .call_member(&container_box, "[]", &[index_box])
                    .map_err(|e| self.err(e))
            }

            AstKind::GlobalFunctionCall { name, args } => {
                let mut arg_boxes = Vec::with_capacity(args.len());
                for arg in args {
                    arg_boxes.push(arg.evaluate(engine)?);
                }
                engine
                    .call_global(name, &arg_boxes)
                    .map_err(|e| self.err(e))
            }

            AstKind::MemberFunctionCall {
                name,
                instance,
                args,
            } => {
                let instance_box = instance.evaluate(engine)?;
                let mut arg_boxes = Vec::with_capacity(args.len());
                for arg in args {
                    arg_boxes.push(arg.evaluate(engine)?);
                }
                engine
                    .call_member(&instance_box, name, &arg_boxes)
                    .map_err(|e| self.err(e))
            }

            AstKind::MemberVariableAccess { name, instance } => {
                let instance_box = instance.evaluate(engine)?;
                engine
                    .member_variable(&instance_box, name)
                    .map_err(|e| self.err(e))
            }
        }
    }

    fn evaluate_binary(
        &self,
        engine: &mut Engine,
        op: BinaryOp,
        lhs: &Ast,
        rhs: &Ast,
    ) -> EvalResult {
        let left = lhs.evaluate(engine)?;
        let right = rhs.evaluate(engine)?;

        if op == BinaryOp::Assign {
            if left.is_empty() {
                let value = right.value().map_err(|e| self.err(e))?;
                left.assign(value).map_err(|e| self.err(e))?;
                return Ok(left);
            }
            if !left.is_assignable() {
                return Err(self.err(RuntimeError::NotAssignable));
            }
        }

        let left_type = left.type_id().map_err(|e| self.err(e))?;
        let right_type = right.type_id().map_err(|e| self.err(e))?;
        let left_value = left.value().map_err(|e| self.err(e))?;
        let right_value = right.value().map_err(|e| self.err(e))?;

        let func = engine
            .operators()
            .lookup_binary(op, left_type, right_type)
            .ok_or_else(|| {
                self.err(RuntimeError::NoMatchingOverload {
                    name: op.symbol().to_string(),
                })
            })?;
        let result = func(&left_value, &right_value).map_err(|e| self.err(e))?;

        if op == BinaryOp::Assign {
            left.assign(result).map_err(|e| self.err(e))?;
            Ok(left)
        } else {
            Ok(ValueBox::owned(result))
        }
    }

    fn evaluate_unary(&self, engine: &mut Engine, op: UnaryOp, expr: &Ast) -> EvalResult {
        let operand = expr.evaluate(engine)?;

        if op == UnaryOp::UnaryPlus {
            return Ok(ValueBox::owned(operand.value().map_err(|e| self.err(e))?));
        }

        let type_id = operand.type_id().map_err(|e| self.err(e))?;

        match op {
            UnaryOp::PreInc | UnaryOp::PreDec => {
                let func = engine
                    .operators()
                    .lookup_unary_mutate(op, type_id)
                    .ok_or_else(|| {
                        self.err(RuntimeError::NoMatchingOverload {
                            name: op.symbol().to_string(),
                        })
                    })?;
                let new_value = crate::value::with_backing_mut(&operand, |v| func(v))
                    .map_err(|e| self.err(e))?
                    .map_err(|e| self.err(e))?;
                Ok(ValueBox::owned(new_value))
            }
            UnaryOp::PostInc | UnaryOp::PostDec => {
                let old_value = operand.value().map_err(|e| self.err(e))?;
                let func = engine
                    .operators()
                    .lookup_unary_mutate(op, type_id)
                    .ok_or_else(|| {
                        self.err(RuntimeError::NoMatchingOverload {
                            name: op.symbol().to_string(),
                        })
                    })?;
                crate::value::with_backing_mut(&operand, |v| func(v))
                    .map_err(|e| self.err(e))?
                    .map_err(|e| self.err(e))?;
                Ok(ValueBox::owned(old_value))
            }
            _ => {
                let value = operand.value().map_err(|e| self.err(e))?;
                let func = engine
                    .operators()
                    .lookup_unary_pure(op, type_id)
                    .ok_or_else(|| {
                        self.err(RuntimeError::NoMatchingOverload {
                            name: op.symbol().to_string(),
                        })
                    })?;
                let result = func(&value).map_err(|e| self.err(e))?;
                Ok(ValueBox::owned(result))
            }
        }
    }
}

/// "Truthy" per §4.2: bool-true, a non-zero int, or a non-zero float.
fn is_truthy(value_box: &ValueBox) -> Result<bool, RuntimeError> {
    Ok(match value_box.value()? {
        Value::Bool(b) => b,
        Value::Int(i) => i != 0,
        Value::UInt(u) => u != 0,
        Value::Size(s) => s != 0,
        Value::Float(f) => f != 0.0,
        Value::Double(d) => d != 0.0,
        Value::Char(c) => c != '\0',
        Value::Host(_) => true,
    })
}
