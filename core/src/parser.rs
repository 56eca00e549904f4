//! Recursive-descent statement/expression driver.
//!
//! This is the hand-written half of the parsing pipeline: the tokenizer
//! already turned source text into a flat [`Token`] stream, and everything
//! here is driving structure out of that stream — `if`/`while`/`for`,
//! blocks, calls, vector literals — by emitting events to a [`Consumer`]
//! rather than building [`Ast`] nodes directly (see `events.rs`). The only
//! place real precedence climbing happens is inside a single flat
//! expression, via [`Consumer::tie_equation`].

use crate::ast::Ast;
use crate::ast_builder::AstBuilder;
use crate::error::{ParseError, SourceErrorWrapper, WithSource};
use crate::events::Consumer;
use crate::operators::{BinaryOp, UnaryOp};
use crate::tokenizer::{self, SpannedToken, Token};
use crate::util::Span;
use crate::value::Value;
use tracing::debug;

type PResult<T> = Result<T, (ParseError, Span)>;

/// Parses a complete program, returning the root [`Ast`] node.
pub fn parse(source: &str) -> Result<Ast, WithSource<ParseError>> {
    let wrap = |(error, span): (ParseError, Span)| {
        let wrapped = WithSource::single(SourceErrorWrapper::new(error, span, source), source.to_string());
        debug!(error = %wrapped, "parse error");
        wrapped
    };

    let tokens = tokenizer::tokenize(source).map_err(wrap)?;
    let eof = eof_span(&tokens);
    let mut ts = TokenStream::new(&tokens, eof);
    let mut builder = AstBuilder::new();
    let statement_count = parse_program(&mut ts, &mut builder).map_err(wrap)?;

    if !ts.at_end() {
        return Err(wrap((ParseError::Syntax { expected: "end of input" }, ts.current_span())));
    }

    debug!(statement_count, "parse complete");
    Ok(builder.finish())
}

fn eof_span(tokens: &[SpannedToken]) -> Span {
    tokens.last().map(|t| Span { start_line: t.span.end_line, start_col: t.span.end_col, ..t.span }).unwrap_or_default()
}

struct TokenStream<'t> {
    tokens: &'t [SpannedToken],
    pos: usize,
    eof_span: Span,
    last: Span,
}

impl<'t> TokenStream<'t> {
    fn new(tokens: &'t [SpannedToken], eof_span: Span) -> Self {
        Self { tokens, pos: 0, eof_span, last: eof_span }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn peek_at(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|t| &t.token)
    }

    fn current_span(&self) -> Span {
        self.tokens.get(self.pos).map(|t| t.span).unwrap_or(self.eof_span)
    }

    fn last_span(&self) -> Span {
        self.last
    }

    fn advance(&mut self) -> SpannedToken {
        let t = self.tokens[self.pos].clone();
        self.pos += 1;
        self.last = t.span;
        t
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn skip_terminators(&mut self) {
        while matches!(self.peek(), Some(Token::Newline) | Some(Token::Semicolon)) {
            self.advance();
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Some(Token::Newline)) {
            self.advance();
        }
    }
}

fn expect(ts: &mut TokenStream, want: &Token, expected: &'static str) -> PResult<Span> {
    match ts.peek() {
        Some(t) if t == want => Ok(ts.advance().span),
        _ => Err((ParseError::Syntax { expected }, ts.current_span())),
    }
}

fn expect_closing(ts: &mut TokenStream, want: &Token, expected: &'static str) -> PResult<Span> {
    match ts.peek() {
        Some(t) if t == want => Ok(ts.advance().span),
        _ => Err((ParseError::UnclosedDelimiter { expected }, ts.current_span())),
    }
}

fn expect_ident(ts: &mut TokenStream, expected: &'static str) -> PResult<(String, Span)> {
    match ts.peek() {
        Some(Token::Ident(_)) => {
            let t = ts.advance();
            match t.token {
                Token::Ident(name) => Ok((name, t.span)),
                _ => unreachable!(),
            }
        }
        _ => Err((ParseError::Syntax { expected }, ts.current_span())),
    }
}

fn binary_op_from_token(token: Option<&Token>) -> Option<BinaryOp> {
    Some(match token? {
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Star => BinaryOp::Mul,
        Token::Slash => BinaryOp::Div,
        Token::Percent => BinaryOp::Mod,
        Token::ShiftLeft => BinaryOp::Shl,
        Token::ShiftRight => BinaryOp::Shr,
        Token::Lt => BinaryOp::Lt,
        Token::Le => BinaryOp::Le,
        Token::Gt => BinaryOp::Gt,
        Token::Ge => BinaryOp::Ge,
        Token::EqEq => BinaryOp::Eq,
        Token::Ne => BinaryOp::Ne,
        Token::Amp => BinaryOp::BitAnd,
        Token::Caret => BinaryOp::BitXor,
        Token::Pipe => BinaryOp::BitOr,
        Token::AmpAmp => BinaryOp::And,
        Token::PipePipe => BinaryOp::Or,
        Token::Eq => BinaryOp::Assign,
        _ => return None,
    })
}

fn compound_op_from_token(token: Option<&Token>) -> Option<BinaryOp> {
    Some(match token? {
        Token::PlusEq => BinaryOp::Add,
        Token::MinusEq => BinaryOp::Sub,
        Token::StarEq => BinaryOp::Mul,
        Token::SlashEq => BinaryOp::Div,
        Token::PercentEq => BinaryOp::Mod,
        Token::ShlEq => BinaryOp::Shl,
        Token::ShrEq => BinaryOp::Shr,
        Token::AmpEq => BinaryOp::BitAnd,
        Token::CaretEq => BinaryOp::BitXor,
        Token::PipeEq => BinaryOp::BitOr,
        _ => return None,
    })
}

fn prefix_unary_op_from_token(token: Option<&Token>) -> Option<UnaryOp> {
    Some(match token? {
        Token::Plus => UnaryOp::UnaryPlus,
        Token::Minus => UnaryOp::UnaryMinus,
        Token::Bang => UnaryOp::LogicNot,
        Token::Tilde => UnaryOp::BitwiseNot,
        Token::PlusPlus => UnaryOp::PreInc,
        Token::MinusMinus => UnaryOp::PreDec,
        _ => return None,
    })
}

/// Parses every statement until the token stream runs out, folding them
/// into a program root with [`Consumer::tie_statements`] (no new scope
/// frame — top-level code runs in the engine's existing global frame).
/// Returns the number of top-level statements parsed, for the completion
/// log in [`parse`].
fn parse_program<C: Consumer>(ts: &mut TokenStream, c: &mut C) -> PResult<usize> {
    let start = ts.current_span();
    let mut count = 0;
    loop {
        ts.skip_terminators();
        if ts.at_end() {
            break;
        }
        parse_statement(ts, c)?;
        count += 1;
    }
    c.tie_statements(count, start.merge(ts.last_span()));
    Ok(count)
}

fn parse_statement<C: Consumer>(ts: &mut TokenStream, c: &mut C) -> PResult<()> {
    match ts.peek() {
        Some(Token::Var) => parse_var_decl(ts, c),
        Some(Token::If) => parse_if(ts, c),
        Some(Token::While) => parse_while(ts, c),
        Some(Token::For) => parse_for(ts, c),
        Some(Token::LBrace) => parse_block(ts, c),
        _ => parse_expression_statement(ts, c),
    }
}

/// `{ STMTS }`: a new scope frame wrapping zero or more statements.
fn parse_block<C: Consumer>(ts: &mut TokenStream, c: &mut C) -> PResult<()> {
    let start = expect(ts, &Token::LBrace, "`{`")?;
    let mut count = 0;
    loop {
        ts.skip_terminators();
        if matches!(ts.peek(), Some(Token::RBrace)) || ts.at_end() {
            break;
        }
        parse_statement(ts, c)?;
        count += 1;
    }
    let end = expect_closing(ts, &Token::RBrace, "}")?;
    c.tie_scope(count, start.merge(end));
    Ok(())
}

/// A construct body given either as `{ STMTS }` or as a single statement —
/// the latter is still wrapped in its own scope frame, per the grammar's
/// "single-line scope" form.
fn parse_single_or_block<C: Consumer>(ts: &mut TokenStream, c: &mut C) -> PResult<()> {
    if matches!(ts.peek(), Some(Token::LBrace)) {
        return parse_block(ts, c);
    }
    let start = ts.current_span();
    parse_statement(ts, c)?;
    c.tie_scope(1, start.merge(ts.last_span()));
    Ok(())
}

/// `var NAME = EXPR`, desugared to the same assignment shape
/// `NAME = EXPR` produces, but with `is_decl` set on the left-hand side so
/// the evaluator allocates a fresh binding instead of looking one up.
fn parse_var_decl<C: Consumer>(ts: &mut TokenStream, c: &mut C) -> PResult<()> {
    let start = expect(ts, &Token::Var, "`var`")?;
    let (name, name_span) = expect_ident(ts, "a variable name")?;
    let eq_span = expect(ts, &Token::Eq, "`=`")?;
    c.push_named_variable(name, true, name_span);
    c.push_operator(BinaryOp::Assign, eq_span);
    parse_expression(ts, c)?;
    c.tie_equation(1, start.merge(ts.last_span()));
    Ok(())
}

fn parse_if<C: Consumer>(ts: &mut TokenStream, c: &mut C) -> PResult<()> {
    let start = expect(ts, &Token::If, "`if`")?;
    expect(ts, &Token::LParen, "`(`")?;
    parse_expression(ts, c)?;
    expect_closing(ts, &Token::RParen, ")")?;
    parse_single_or_block(ts, c)?;

    ts.skip_newlines();
    let has_else = matches!(ts.peek(), Some(Token::Else));
    if has_else {
        ts.advance();
        ts.skip_newlines();
        if matches!(ts.peek(), Some(Token::If)) {
            parse_if(ts, c)?;
        } else {
            parse_single_or_block(ts, c)?;
        }
    }
    c.tie_if(has_else, start.merge(ts.last_span()));
    Ok(())
}

fn parse_while<C: Consumer>(ts: &mut TokenStream, c: &mut C) -> PResult<()> {
    let start = expect(ts, &Token::While, "`while`")?;
    expect(ts, &Token::LParen, "`(`")?;
    parse_expression(ts, c)?;
    expect_closing(ts, &Token::RParen, ")")?;
    parse_single_or_block(ts, c)?;
    c.tie_while(start.merge(ts.last_span()));
    Ok(())
}

fn parse_for<C: Consumer>(ts: &mut TokenStream, c: &mut C) -> PResult<()> {
    let start = expect(ts, &Token::For, "`for`")?;
    expect(ts, &Token::LParen, "`(`")?;

    let has_init = !matches!(ts.peek(), Some(Token::Semicolon));
    if has_init {
        if matches!(ts.peek(), Some(Token::Var)) {
            parse_var_decl_clause(ts, c)?;
        } else {
            parse_expression(ts, c)?;
        }
    }
    expect(ts, &Token::Semicolon, "`;`")?;

    let has_cond = !matches!(ts.peek(), Some(Token::Semicolon));
    if has_cond {
        parse_expression(ts, c)?;
    }
    expect(ts, &Token::Semicolon, "`;`")?;

    let has_step = !matches!(ts.peek(), Some(Token::RParen));
    if has_step {
        parse_expression(ts, c)?;
    }
    expect_closing(ts, &Token::RParen, ")")?;

    parse_single_or_block(ts, c)?;
    c.tie_for(has_init, has_cond, has_step, start.merge(ts.last_span()));
    Ok(())
}

/// Same shape as [`parse_var_decl`], just without requiring a `var` keyword
/// already consumed by the caller's lookahead — used for a `for` loop's
/// init clause.
fn parse_var_decl_clause<C: Consumer>(ts: &mut TokenStream, c: &mut C) -> PResult<()> {
    parse_var_decl(ts, c)
}

/// A plain expression, an assignment, or `NAME OP= EXPR` (desugared here
/// into `NAME = (NAME OP EXPR)`, since compound assignment only targets a
/// bare name, unlike general assignment).
fn parse_expression_statement<C: Consumer>(ts: &mut TokenStream, c: &mut C) -> PResult<()> {
    let start = ts.current_span();
    if let Some(Token::Ident(name)) = ts.peek().cloned() {
        if let Some(op) = compound_op_from_token(ts.peek_at(1)) {
            let name_span = ts.advance().span;
            let op_span = ts.advance().span;
            c.push_named_variable(name.clone(), false, name_span);
            c.push_operator(BinaryOp::Assign, op_span);
            c.push_named_variable(name, false, name_span);
            c.push_operator(op, op_span);
            parse_expression(ts, c)?;
            c.tie_equation(1, name_span.merge(ts.last_span()));
            c.tie_equation(1, start.merge(ts.last_span()));
            return Ok(());
        }
    }
    parse_expression(ts, c)
}

/// A flat `v0 op0 v1 op1 v2 ...` run, folded by a single
/// [`Consumer::tie_equation`] call once the whole run has been pushed.
fn parse_expression<C: Consumer>(ts: &mut TokenStream, c: &mut C) -> PResult<()> {
    let start = ts.current_span();
    parse_unary(ts, c)?;
    let mut op_count = 0;
    loop {
        match binary_op_from_token(ts.peek()) {
            Some(op) => {
                let op_span = ts.current_span();
                ts.advance();
                c.push_operator(op, op_span);
                parse_unary(ts, c).map_err(|(err, span)| match err {
                    ParseError::Syntax { .. } => (ParseError::DanglingOperator, op_span),
                    other => (other, span),
                })?;
                op_count += 1;
            }
            None => break,
        }
    }
    c.tie_equation(op_count, start.merge(ts.last_span()));
    Ok(())
}

/// A prefix unary operator wrapping a (possibly further-prefixed) operand,
/// or just an operand. `+`/`-`/`!`/`~`/`++`/`--` are only ever read here,
/// at a position where an operand is expected, so they're unambiguously
/// unary — no lookahead needed to rule out a binary reading.
fn parse_unary<C: Consumer>(ts: &mut TokenStream, c: &mut C) -> PResult<()> {
    let start = ts.current_span();
    if let Some(op) = prefix_unary_op_from_token(ts.peek()) {
        ts.advance();
        parse_unary(ts, c)?;
        c.tie_unary(op, start.merge(ts.last_span()));
        return Ok(());
    }
    parse_postfix(ts, c)
}

/// A primary atom followed by any chain of postfix operators: member
/// access/calls, indexing, and postfix `++`/`--`.
fn parse_postfix<C: Consumer>(ts: &mut TokenStream, c: &mut C) -> PResult<()> {
    let start = ts.current_span();
    parse_primary(ts, c)?;
    loop {
        match ts.peek() {
            Some(Token::Dot) => {
                ts.advance();
                let (name, name_span) = expect_ident(ts, "a member name")?;
                if matches!(ts.peek(), Some(Token::LParen)) {
                    ts.advance();
                    let argc = parse_arg_list(ts, c)?;
                    expect_closing(ts, &Token::RParen, ")")?;
                    c.tie_member_function_call(name, argc, start.merge(ts.last_span()));
                } else {
                    c.parse_member_variable(name, start.merge(name_span));
                }
            }
            Some(Token::LBracket) => {
                ts.advance();
                parse_expression(ts, c)?;
                expect_closing(ts, &Token::RBracket, "]")?;
                c.tie_vector_access(start.merge(ts.last_span()));
            }
            Some(Token::PlusPlus) => {
                ts.advance();
                c.tie_unary(UnaryOp::PostInc, start.merge(ts.last_span()));
            }
            Some(Token::MinusMinus) => {
                ts.advance();
                c.tie_unary(UnaryOp::PostDec, start.merge(ts.last_span()));
            }
            _ => break,
        }
    }
    Ok(())
}

fn parse_arg_list<C: Consumer>(ts: &mut TokenStream, c: &mut C) -> PResult<usize> {
    if matches!(ts.peek(), Some(Token::RParen)) {
        return Ok(0);
    }
    let mut argc = 0;
    loop {
        parse_expression(ts, c)?;
        argc += 1;
        if matches!(ts.peek(), Some(Token::Comma)) {
            ts.advance();
            continue;
        }
        break;
    }
    Ok(argc)
}

fn parse_primary<C: Consumer>(ts: &mut TokenStream, c: &mut C) -> PResult<()> {
    match ts.peek().cloned() {
        Some(Token::Int(v)) => {
            let span = ts.advance().span;
            c.push_value(Value::Int(v), span);
        }
        Some(Token::Float(v)) => {
            let span = ts.advance().span;
            c.push_value(Value::Double(v), span);
        }
        Some(Token::Bool(v)) => {
            let span = ts.advance().span;
            c.push_value(Value::Bool(v), span);
        }
        Some(Token::Char(v)) => {
            let span = ts.advance().span;
            c.push_value(Value::Char(v), span);
        }
        Some(Token::Str(v)) => {
            let span = ts.advance().span;
            c.push_value(Value::host(v), span);
        }
        Some(Token::Ident(name)) => {
            let ident_span = ts.advance().span;
            if matches!(ts.peek(), Some(Token::LParen)) {
                ts.advance();
                let argc = parse_arg_list(ts, c)?;
                expect_closing(ts, &Token::RParen, ")")?;
                c.tie_global_function_call(name, argc, ident_span.merge(ts.last_span()));
            } else {
                c.push_named_variable(name, false, ident_span);
            }
        }
        Some(Token::LParen) => {
            ts.advance();
            parse_expression(ts, c)?;
            expect_closing(ts, &Token::RParen, ")")?;
        }
        Some(Token::LBracket) => {
            let start = ts.current_span();
            ts.advance();
            let mut n = 0;
            if !matches!(ts.peek(), Some(Token::RBracket)) {
                loop {
                    parse_expression(ts, c)?;
                    n += 1;
                    if matches!(ts.peek(), Some(Token::Comma)) {
                        ts.advance();
                        continue;
                    }
                    break;
                }
            }
            let end = expect_closing(ts, &Token::RBracket, "]")?;
            c.tie_vector_decl(n, start.merge(end));
        }
        _ => return Err((ParseError::Syntax { expected: "an expression" }, ts.current_span())),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstKind;
    use crate::engine::Engine;

    fn eval_str(source: &str) -> Value {
        let ast = parse(source).unwrap();
        let mut engine = Engine::new();
        crate::defaults::install(&mut engine);
        engine.evaluate(&ast).unwrap().value().unwrap()
    }

    #[test]
    fn parses_a_var_decl_as_top_level_statement() {
        let ast = parse("var a = 1").unwrap();
        match ast.kind {
            AstKind::Binary { op: BinaryOp::Assign, lhs, .. } => {
                assert!(matches!(lhs.kind, AstKind::NamedVariable { is_decl: true, .. }));
            }
            other => panic!("unexpected root {:?}", std::mem::discriminant(&other)),
        }
    }

    #[test]
    fn evaluates_arithmetic_precedence() {
        assert!(matches!(eval_str("1 + 2 * 3"), Value::Int(7)));
    }

    #[test]
    fn evaluates_if_else() {
        assert!(matches!(eval_str("var a = 0\nif (1 > 0) { a = 1 } else { a = 2 }\na"), Value::Int(1)));
    }

    #[test]
    fn evaluates_while_loop() {
        assert!(matches!(eval_str("var a = 0\nwhile (a < 5) { a = a + 1 }\na"), Value::Int(5)));
    }

    #[test]
    fn evaluates_for_loop() {
        assert!(matches!(eval_str("var total = 0\nfor (var i = 0; i < 5; i++) { total = total + i }\ntotal"), Value::Int(10)));
    }

    #[test]
    fn evaluates_compound_assignment() {
        assert!(matches!(eval_str("var a = 10\na += 5\na"), Value::Int(15)));
    }

    #[test]
    fn unclosed_brace_is_reported() {
        let err = parse("if (true) {").unwrap_err();
        assert!(matches!(err.errors()[0].error(), ParseError::UnclosedDelimiter { .. }));
    }

    #[test]
    fn dangling_operator_is_reported() {
        let err = parse("1 +").unwrap_err();
        assert!(matches!(err.errors()[0].error(), ParseError::DanglingOperator));
    }
}
