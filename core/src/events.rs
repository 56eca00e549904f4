//! The parser's emission interface.
//!
//! `parser.rs` never builds an [`crate::ast::Ast`] node directly — it walks
//! the token stream and calls a [`Consumer`], pushing one event per atom it
//! recognizes and one `tie_*` call per point where a run of already-pushed
//! pieces collapses into a single node. [`crate::ast_builder::AstBuilder`] is
//! the consumer that actually builds `Ast`; anything else implementing this
//! trait (a recorder for tests, say) sees the exact same event stream.

use crate::operators::{BinaryOp, UnaryOp};
use crate::util::Span;
use crate::value::Value;

pub trait Consumer {
    /// A literal value (number, bool, char, string).
    fn push_value(&mut self, value: Value, span: Span);

    /// A bare name: `is_decl` is set for `var NAME`, clear for a reference.
    fn push_named_variable(&mut self, name: String, is_decl: bool, span: Span);

    /// An empty statement (a bare `;` or a loop clause left blank).
    fn push_noop(&mut self, span: Span);

    /// One binary operator in a `v0 op0 v1 op1 v2 ...` run, recorded so the
    /// next [`Consumer::tie_equation`] can fold it in.
    fn push_operator(&mut self, op: BinaryOp, span: Span);

    /// Collapses the last `op_count + 1` pushed values and the `op_count`
    /// operators accumulated since, applying precedence climbing (§4.3's
    /// tying algorithm), and pushes the single resulting node.
    fn tie_equation(&mut self, op_count: usize, span: Span);

    /// Wraps the most-recently pushed node in a unary operator.
    fn tie_unary(&mut self, op: UnaryOp, span: Span);

    /// Collapses the last `n` pushed statements into a flat sequence, with
    /// no new scope frame (used only for the program root).
    fn tie_statements(&mut self, n: usize, span: Span);

    /// Collapses the last `n` pushed statements into a sequence wrapped in a
    /// new scope frame (`{ ... }` blocks and single-statement bodies alike).
    fn tie_scope(&mut self, n: usize, span: Span);

    /// Collapses a parsed `if`: an optional else-branch, a then-branch, and
    /// a condition, in that push order.
    fn tie_if(&mut self, has_else: bool, span: Span);

    /// Collapses a parsed `while`: a body and a condition, in that push
    /// order.
    fn tie_while(&mut self, span: Span);

    /// Collapses a parsed `for`: a body, and whichever of step/cond/init
    /// were present (any can be omitted), in that push order.
    fn tie_for(&mut self, has_init: bool, has_cond: bool, has_step: bool, span: Span);

    /// Collapses `n` pushed elements into a vector literal.
    fn tie_vector_decl(&mut self, n: usize, span: Span);

    /// Collapses a pushed index and a pushed container into an indexed
    /// access, in that push order.
    fn tie_vector_access(&mut self, span: Span);

    /// Collapses `argc` pushed arguments into a call to the free function
    /// `name`.
    fn tie_global_function_call(&mut self, name: String, argc: usize, span: Span);

    /// Collapses `argc` pushed arguments and a pushed receiver into a call
    /// to method `name` on that receiver, in that push order.
    fn tie_member_function_call(&mut self, name: String, argc: usize, span: Span);

    /// Collapses a pushed receiver into a member-variable access on it.
    fn parse_member_variable(&mut self, name: String, span: Span);
}
