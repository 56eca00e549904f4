//! Span tracking shared between the lexer, parser and error types.
//!
//! The lexer runs over a [`nom_locate`] located span so that every token
//! remembers where it came from; [`Span`] is the detached, `Copy`able
//! summary of that location that survives past the end of parsing and gets
//! carried around in the AST for error reporting.

use nom_locate::LocatedSpan;
use std::fmt;

/// The span type threads through the tokenizer while it still has a live
/// borrow of the full source text.
pub type RawSpan<'a> = LocatedSpan<&'a str>;

/// A detached source location: line/column range plus byte offsets into the
/// original source, so a [`Span`] can still recover the text it points at
/// long after parsing has finished.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Span {
    pub start_line: u32,
    pub start_col: usize,
    pub end_line: u32,
    pub end_col: usize,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Span {
    /// Builds a [`Span`] covering everything between `start` (inclusive) and
    /// `end` (exclusive), both taken from the same source text.
    pub fn from_raw_spans(start: RawSpan<'_>, end: RawSpan<'_>) -> Self {
        Self {
            start_line: start.location_line(),
            start_col: start.get_utf8_column(),
            end_line: end.location_line(),
            end_col: end.get_utf8_column(),
            start_offset: start.location_offset(),
            end_offset: end.location_offset(),
        }
    }

    /// A zero-width span at a single location, used when an error has no
    /// natural extent (e.g. end-of-input).
    pub fn point(at: RawSpan<'_>) -> Self {
        Self::from_raw_spans(at, at)
    }

    /// Slices the bit of `source` that this span covers. Clamps to the
    /// source length so a stale span (e.g. end-of-input) never panics.
    pub fn get_source_slice<'a>(&self, source: &'a str) -> &'a str {
        let start = self.start_offset.min(source.len());
        let end = self.end_offset.max(start).min(source.len());
        &source[start..end]
    }

    /// A span covering everything from `self`'s start to `other`'s end, for
    /// combining the spans of a node's children into the span of the node
    /// that ties them together.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start_line: self.start_line,
            start_col: self.start_col,
            end_line: other.end_line,
            end_col: other.end_col,
            start_offset: self.start_offset,
            end_offset: other.end_offset,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// Renders a `^^^^`-style caret line under the offending span, for the
/// `{:#}` alternate error format.
pub fn fmt_src_highlights(
    f: &mut fmt::Formatter<'_>,
    span: &Span,
    source: &str,
) -> fmt::Result {
    let line = source
        .lines()
        .nth((span.start_line.max(1) - 1) as usize)
        .unwrap_or("");
    writeln!(f)?;
    writeln!(f, "{}", line)?;
    let caret_count = if span.end_col > span.start_col {
        span.end_col - span.start_col
    } else {
        1
    };
    write!(
        f,
        "{}{}",
        " ".repeat(span.start_col.saturating_sub(1)),
        "^".repeat(caret_count)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_round_trip() {
        let src = "abc\ndefg";
        let raw = RawSpan::new(src);
        let (rest, _) = nom::bytes::complete::take::<_, _, nom::error::Error<RawSpan>>(4usize)(raw).unwrap();
        let span = Span::from_raw_spans(raw, rest);
        assert_eq!(span.get_source_slice(src), "abc\n");
    }
}
