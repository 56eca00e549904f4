//! The default [`Consumer`]: folds the parser's event stream into an
//! [`Ast`] tree.
//!
//! Two stacks do all the work: `values` holds already-built nodes, `ops`
//! holds the binary operators accumulated since the last
//! [`AstBuilder::tie_equation`]. Every `tie_*` call pops some fixed number
//! of entries off one or both stacks and pushes back exactly one node, so
//! by the time the parser reaches end of input `values` holds a single
//! root node.

use crate::ast::{Ast, AstKind};
use crate::events::Consumer;
use crate::operators::{BinaryOp, UnaryOp};
use crate::util::Span;
use crate::value::Value;

#[derive(Default)]
pub struct AstBuilder {
    values: Vec<Ast>,
    ops: Vec<(BinaryOp, Span)>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the single remaining node once parsing has finished. Panics if
    /// the parser didn't leave the builder in that state — a parser bug,
    /// not a user-facing error.
    pub fn finish(mut self) -> Ast {
        assert_eq!(self.values.len(), 1, "parser left {} nodes on the stack", self.values.len());
        self.values.pop().unwrap()
    }

    fn pop(&mut self) -> Ast {
        self.values.pop().expect("parser popped more nodes than it pushed")
    }

    fn drain_last(&mut self, n: usize) -> Vec<Ast> {
        let at = self.values.len() - n;
        self.values.split_off(at)
    }

    fn collapse_to_body(&mut self, n: usize, span: Span) -> Ast {
        let mut stmts = self.drain_last(n);
        match stmts.len() {
            0 => Ast::new(AstKind::Noop, span),
            1 => stmts.pop().unwrap(),
            _ => Ast::new(AstKind::Statements(stmts), span),
        }
    }
}

impl Consumer for AstBuilder {
    fn push_value(&mut self, value: Value, span: Span) {
        self.values.push(Ast::new(AstKind::Value(value), span));
    }

    fn push_named_variable(&mut self, name: String, is_decl: bool, span: Span) {
        self.values.push(Ast::new(AstKind::NamedVariable { name, is_decl }, span));
    }

    fn push_noop(&mut self, span: Span) {
        self.values.push(Ast::new(AstKind::Noop, span));
    }

    fn push_operator(&mut self, op: BinaryOp, span: Span) {
        self.ops.push((op, span));
    }

    fn tie_equation(&mut self, op_count: usize, _span: Span) {
        let values = self.drain_last(op_count + 1);
        let at = self.ops.len() - op_count;
        let ops = self.ops.split_off(at);
        self.values.push(tie_precedence(values, ops));
    }

    fn tie_unary(&mut self, op: UnaryOp, span: Span) {
        let expr = self.pop();
        self.values.push(Ast::new(AstKind::Unary { op, expr: Box::new(expr) }, span));
    }

    fn tie_statements(&mut self, n: usize, span: Span) {
        let mut stmts = self.drain_last(n);
        let node = match stmts.len() {
            0 => Ast::new(AstKind::Noop, span),
            1 => stmts.pop().unwrap(),
            _ => Ast::new(AstKind::Statements(stmts), span),
        };
        self.values.push(node);
    }

    fn tie_scope(&mut self, n: usize, span: Span) {
        let body = self.collapse_to_body(n, span);
        self.values.push(Ast::new(AstKind::Scope(Box::new(body)), span));
    }

    fn tie_if(&mut self, has_else: bool, span: Span) {
        let else_branch = if has_else { Some(Box::new(self.pop())) } else { None };
        let then_branch = Box::new(self.pop());
        let cond = Box::new(self.pop());
        self.values.push(Ast::new(AstKind::If { cond, then_branch, else_branch }, span));
    }

    fn tie_while(&mut self, span: Span) {
        let body = Box::new(self.pop());
        let cond = Box::new(self.pop());
        self.values.push(Ast::new(AstKind::While { cond, body }, span));
    }

    fn tie_for(&mut self, has_init: bool, has_cond: bool, has_step: bool, span: Span) {
        let body = Box::new(self.pop());
        let step = Box::new(if has_step { self.pop() } else { Ast::new(AstKind::Noop, span) });
        let cond = Box::new(if has_cond {
            self.pop()
        } else {
            Ast::new(AstKind::Value(Value::Bool(true)), span)
        });
        let init = Box::new(if has_init { self.pop() } else { Ast::new(AstKind::Noop, span) });
        self.values.push(Ast::new(AstKind::For { init, cond, step, body }, span));
    }

    fn tie_vector_decl(&mut self, n: usize, span: Span) {
        let items = self.drain_last(n);
        self.values.push(Ast::new(AstKind::VectorDecl(items), span));
    }

    fn tie_vector_access(&mut self, span: Span) {
        let index = Box::new(self.pop());
        let container = Box::new(self.pop());
        self.values.push(Ast::new(AstKind::VectorAccess { container, index }, span));
    }

    fn tie_global_function_call(&mut self, name: String, argc: usize, span: Span) {
        let args = self.drain_last(argc);
        self.values.push(Ast::new(AstKind::GlobalFunctionCall { name, args }, span));
    }

    fn tie_member_function_call(&mut self, name: String, argc: usize, span: Span) {
        let args = self.drain_last(argc);
        let instance = Box::new(self.pop());
        self.values.push(Ast::new(AstKind::MemberFunctionCall { name, instance, args }, span));
    }

    fn parse_member_variable(&mut self, name: String, span: Span) {
        let instance = Box::new(self.pop());
        self.values.push(Ast::new(AstKind::MemberVariableAccess { name, instance }, span));
    }
}

/// §4.3's precedence-climbing pass: folds a flat `v0 op0 v1 op1 v2...` run
/// into a single tree, one precedence class at a time from highest to
/// lowest, binding left-to-right within a class except for assignment
/// (lowest class, bound right-to-left).
fn tie_precedence(mut values: Vec<Ast>, mut ops: Vec<(BinaryOp, Span)>) -> Ast {
    const CLASSES: &[&[BinaryOp]] = &[
        &[BinaryOp::Mul, BinaryOp::Div, BinaryOp::Mod],
        &[BinaryOp::Add, BinaryOp::Sub],
        &[BinaryOp::Shl, BinaryOp::Shr],
        &[BinaryOp::Lt, BinaryOp::Le, BinaryOp::Gt, BinaryOp::Ge],
        &[BinaryOp::Eq, BinaryOp::Ne],
        &[BinaryOp::BitAnd],
        &[BinaryOp::BitXor],
        &[BinaryOp::BitOr],
        &[BinaryOp::And],
        &[BinaryOp::Or],
    ];

    for class in CLASSES {
        let mut i = 0;
        while i < ops.len() {
            if class.contains(&ops[i].0) {
                let (op, _) = ops.remove(i);
                let rhs = values.remove(i + 1);
                let lhs = values.remove(i);
                let span = lhs.span.merge(rhs.span);
                values.insert(i, Ast::new(AstKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }, span));
            } else {
                i += 1;
            }
        }
    }

    // Assignment is the lowest class and right-associative: fold from the
    // rightmost `=` inward.
    while let Some(pos) = ops.iter().rposition(|(op, _)| *op == BinaryOp::Assign) {
        ops.remove(pos);
        let rhs = values.remove(pos + 1);
        let lhs = values.remove(pos);
        let span = lhs.span.merge(rhs.span);
        values.insert(pos, Ast::new(AstKind::Binary { op: BinaryOp::Assign, lhs: Box::new(lhs), rhs: Box::new(rhs) }, span));
    }

    debug_assert_eq!(values.len(), 1);
    values.pop().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::default()
    }

    #[test]
    fn arithmetic_binds_multiplication_tighter_than_addition() {
        // 1 + 2 * 3
        let mut b = AstBuilder::new();
        b.push_value(Value::Int(1), span());
        b.push_operator(BinaryOp::Add, span());
        b.push_value(Value::Int(2), span());
        b.push_operator(BinaryOp::Mul, span());
        b.push_value(Value::Int(3), span());
        b.tie_equation(2, span());
        let ast = b.finish();
        match ast.kind {
            AstKind::Binary { op: BinaryOp::Add, rhs, .. } => match rhs.kind {
                AstKind::Binary { op: BinaryOp::Mul, .. } => {}
                _ => panic!("expected the multiplication nested on the right"),
            },
            _ => panic!("expected a top-level addition"),
        }
    }

    #[test]
    fn assignment_chains_bind_right_to_left() {
        // a = b = 1
        let mut b = AstBuilder::new();
        b.push_named_variable("a".into(), false, span());
        b.push_operator(BinaryOp::Assign, span());
        b.push_named_variable("b".into(), false, span());
        b.push_operator(BinaryOp::Assign, span());
        b.push_value(Value::Int(1), span());
        b.tie_equation(2, span());
        let ast = b.finish();
        match ast.kind {
            AstKind::Binary { op: BinaryOp::Assign, lhs, rhs } => {
                assert!(matches!(lhs.kind, AstKind::NamedVariable { .. }));
                assert!(matches!(rhs.kind, AstKind::Binary { op: BinaryOp::Assign, .. }));
            }
            _ => panic!("expected a top-level assignment"),
        }
    }

    /// A `Consumer` doesn't have to build an `Ast` at all — it just has to
    /// see the same calls `AstBuilder` does.
    #[test]
    fn consumer_trait_is_swappable_for_a_recorder() {
        struct EventLog(Vec<&'static str>);
        impl Consumer for EventLog {
            fn push_value(&mut self, _: Value, _: Span) { self.0.push("value"); }
            fn push_named_variable(&mut self, _: String, _: bool, _: Span) { self.0.push("named_variable"); }
            fn push_noop(&mut self, _: Span) { self.0.push("noop"); }
            fn push_operator(&mut self, _: BinaryOp, _: Span) { self.0.push("operator"); }
            fn tie_equation(&mut self, _: usize, _: Span) { self.0.push("tie_equation"); }
            fn tie_unary(&mut self, _: UnaryOp, _: Span) { self.0.push("tie_unary"); }
            fn tie_statements(&mut self, _: usize, _: Span) { self.0.push("tie_statements"); }
            fn tie_scope(&mut self, _: usize, _: Span) { self.0.push("tie_scope"); }
            fn tie_if(&mut self, _: bool, _: Span) { self.0.push("tie_if"); }
            fn tie_while(&mut self, _: Span) { self.0.push("tie_while"); }
            fn tie_for(&mut self, _: bool, _: bool, _: bool, _: Span) { self.0.push("tie_for"); }
            fn tie_vector_decl(&mut self, _: usize, _: Span) { self.0.push("tie_vector_decl"); }
            fn tie_vector_access(&mut self, _: Span) { self.0.push("tie_vector_access"); }
            fn tie_global_function_call(&mut self, _: String, _: usize, _: Span) { self.0.push("tie_global_function_call"); }
            fn tie_member_function_call(&mut self, _: String, _: usize, _: Span) { self.0.push("tie_member_function_call"); }
            fn parse_member_variable(&mut self, _: String, _: Span) { self.0.push("parse_member_variable"); }
        }

        let mut log = EventLog(Vec::new());
        log.push_value(Value::Int(1), span());
        log.push_operator(BinaryOp::Add, span());
        log.push_value(Value::Int(2), span());
        log.tie_equation(1, span());
        assert_eq!(log.0, vec!["value", "operator", "value", "tie_equation"]);
    }
}
