//! All error-related engine types.
//!
//! Mirrors the source-aware error design of the compiler this engine is
//! built like: every error that can be attributed to a location in the
//! script carries a [`Span`], and knows how to render itself against a
//! slice of the offending source text.

use crate::util::{self, Span};
use std::fmt::{self, Debug, Display, Formatter};
use thiserror::Error;

/// A trait for any error that originates in source code. These rely on
/// having the source text present in order to display themselves.
pub trait SourceError: 'static + Send + Sync + Debug {
    /// A simple type label for this error, e.g. `"Syntax"` or `"Runtime"`.
    fn type_label(&self) -> &'static str;

    /// Formats this error into a simple message. `spanned_src` is the slice
    /// of the source code that corresponds to this error's [`Span`].
    fn fmt_msg(&self, f: &mut Formatter<'_>, spanned_src: &str) -> fmt::Result;
}

/// An error produced while tokenizing or parsing a script. Always indicates
/// a mistake in the script, never a bug in the engine.
#[derive(Clone, Debug)]
pub enum ParseError {
    /// The tokenizer/parser expected one kind of token or construct and
    /// found something else (or ran out of input).
    Syntax { expected: &'static str },
    /// A numeric literal's digits don't fit the type implied by its
    /// suffix/shape (e.g. too many digits for the target width).
    MalformedNumber,
    /// An operator appeared with no left-hand or right-hand operand.
    DanglingOperator,
    /// A scope, parameter list, or vector literal was never closed.
    UnclosedDelimiter { expected: &'static str },
}

impl SourceError for ParseError {
    fn type_label(&self) -> &'static str {
        "Syntax"
    }

    fn fmt_msg(&self, f: &mut Formatter<'_>, spanned_src: &str) -> fmt::Result {
        match self {
            Self::Syntax { expected } => write!(f, "Expected {}", expected),
            Self::MalformedNumber => {
                write!(f, "Malformed numeric literal `{}`", spanned_src)
            }
            Self::DanglingOperator => {
                write!(f, "Operator `{}` is missing an operand", spanned_src)
            }
            Self::UnclosedDelimiter { expected } => {
                write!(f, "Unclosed {}, expected `{}`", spanned_src, expected)
            }
        }
    }
}

/// An error produced while evaluating a parsed script. Always indicates a
/// mistake in the script (bad types, unknown names, failed assertions), not
/// a bug in the engine.
#[derive(Clone, Debug)]
pub enum RuntimeError {
    /// No global variable, member variable, or binding with this name is
    /// visible from the current scope.
    UnknownName(String),
    /// A global function, member function, or operator was invoked with
    /// argument types that don't match any registered overload.
    NoMatchingOverload { name: String },
    /// A cast/conversion from one registered type to another was
    /// requested but no conversion is registered for that pair.
    BadCast { from: &'static str, to: &'static str },
    /// An assignment target does not resolve to an assignable location
    /// (e.g. assigning into the result of an arithmetic expression).
    NotAssignable,
    /// A value box was read before it was ever assigned.
    UseOfUninitialized,
    /// A vector index was out of bounds for the vector being accessed.
    IndexOutOfBounds { index: usize, len: usize },
    /// `assert(...)` evaluated its condition to `false`.
    AssertionFailure(String),
    /// `var NAME = ...` named a variable that already exists in the
    /// current (innermost) scope frame.
    AlreadyDeclared(String),
    /// Integer `/` or `%` with a zero right-hand side.
    DivisionByZero,
}

impl SourceError for RuntimeError {
    fn type_label(&self) -> &'static str {
        "Runtime"
    }

    fn fmt_msg(&self, f: &mut Formatter<'_>, spanned_src: &str) -> fmt::Result {
        match self {
            Self::UnknownName(name) => {
                write!(f, "No variable, function or binding named `{}`", name)
            }
            Self::NoMatchingOverload { name } => write!(
                f,
                "No overload of `{}` matches the given argument types in `{}`",
                name, spanned_src
            ),
            Self::BadCast { from, to } => {
                write!(f, "Cannot convert `{}` to `{}`", from, to)
            }
            Self::NotAssignable => {
                write!(f, "Cannot assign into `{}`, it is not a variable", spanned_src)
            }
            Self::UseOfUninitialized => {
                write!(f, "Use of uninitialized value `{}`", spanned_src)
            }
            Self::IndexOutOfBounds { index, len } => write!(
                f,
                "Index {} out of bounds for vector of length {} in `{}`",
                index, len, spanned_src
            ),
            Self::AssertionFailure(message) => {
                write!(f, "Assertion failed: {}", message)
            }
            Self::AlreadyDeclared(name) => {
                write!(f, "`{}` is already declared in this scope", name)
            }
            Self::DivisionByZero => write!(f, "Division by zero in `{}`", spanned_src),
        }
    }
}

/// A wrapper around a [`SourceError`] that holds the extra data needed to
/// render it: the [`Span`] of the source that caused it, and the offending
/// chunk of source itself.
#[derive(Clone, Debug, Error)]
pub struct SourceErrorWrapper<E: SourceError> {
    error: E,
    span: Span,
    spanned_source: String,
}

impl<E: SourceError> SourceErrorWrapper<E> {
    pub fn new(error: E, span: Span, src: &str) -> Self {
        Self {
            error,
            span,
            spanned_source: span.get_source_slice(src).into(),
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn error(&self) -> &E {
        &self.error
    }
}

impl<E: SourceError> Display for SourceErrorWrapper<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error at {}:{}: ",
            self.error.type_label(),
            self.span.start_line,
            self.span.start_col,
        )?;
        self.error.fmt_msg(f, &self.spanned_source)
    }
}

/// A collection of [`SourceErrorWrapper`]s plus the source they came from,
/// so they can all be rendered (optionally with caret highlights via
/// `{:#}`) without the caller needing to hold onto the source text itself.
#[derive(Clone, Debug, Error)]
pub struct WithSource<E: SourceError> {
    errors: Vec<SourceErrorWrapper<E>>,
    source_code: String,
}

impl<E: SourceError> WithSource<E> {
    pub fn new(
        errors: impl IntoIterator<Item = SourceErrorWrapper<E>>,
        source: String,
    ) -> Self {
        Self {
            errors: errors.into_iter().collect(),
            source_code: source,
        }
    }

    pub fn single(error: SourceErrorWrapper<E>, source: String) -> Self {
        Self::new(std::iter::once(error), source)
    }

    pub fn errors(&self) -> &[SourceErrorWrapper<E>] {
        &self.errors
    }
}

impl<E: SourceError> Display for WithSource<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
            if f.alternate() {
                util::fmt_src_highlights(f, &error.span, &self.source_code)?;
            }
        }
        Ok(())
    }
}

/// Top-level error type returned by [`crate::Engine`] for anything that
/// isn't source-attributable (host-binding mistakes discovered at
/// registration time, mostly).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Parse(#[from] WithSource<ParseError>),
    #[error("{0}")]
    Runtime(#[from] WithSource<RuntimeError>),
    #[error("a binding named `{0}` is already registered")]
    DuplicateBinding(String),
}
