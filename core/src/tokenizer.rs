//! One-pass tokenizer: turns raw source text into a flat stream of
//! [`Token`]s, each carrying the [`Span`] it came from.
//!
//! Literal shapes (numbers, strings, identifiers, operator symbols) are
//! recognized with small `nom` combinators over a [`RawSpan`], exactly the
//! part of the original grammar that *is* regular; everything about
//! statement/expression structure is left to `parser.rs`'s hand-written
//! recursive descent, per the rendering note in the crate's design notes.

use crate::error::ParseError;
use crate::util::{RawSpan, Span};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char as nom_char, digit1, none_of, one_of},
    combinator::{map, opt, recognize, value},
    multi::many0,
    sequence::{delimited, pair, tuple},
    IResult,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    // literals
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    Str(String),
    Ident(String),

    // keywords
    Var,
    If,
    Else,
    While,
    For,

    // punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Semicolon,
    Newline,

    // operators, longest-match order doesn't matter here since the lexer
    // already tries longer symbols first
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    ShiftLeft,
    ShiftRight,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
    Amp,
    Caret,
    Pipe,
    AmpAmp,
    PipePipe,
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    ShlEq,
    ShrEq,
    AmpEq,
    CaretEq,
    PipeEq,
    Bang,
    Tilde,
    PlusPlus,
    MinusMinus,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Tokenizes a full source string. Whitespace other than newlines is
/// discarded; line/block comments are discarded; newlines are kept as
/// [`Token::Newline`] since they terminate statements (§4.1).
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, (ParseError, Span)> {
    let mut tokens = Vec::new();
    let mut input = RawSpan::new(source);

    loop {
        input = skip_trivia(input);
        if input.fragment().is_empty() {
            break;
        }
        let start = input;

        // Numbers get their own path rather than living in `lex_one`'s
        // `alt`, so an out-of-range literal can be reported as
        // `MalformedNumber` instead of a generic syntax error.
        if start.fragment().as_bytes()[0].is_ascii_digit() {
            let (rest, token) = lex_number_checked(start)?;
            tokens.push(SpannedToken { token, span: Span::from_raw_spans(start, rest) });
            input = rest;
            continue;
        }

        let (rest, token) = lex_one(input).map_err(|_| {
            (ParseError::Syntax { expected: "a valid token" }, Span::point(start))
        })?;
        let span = Span::from_raw_spans(start, rest);
        tokens.push(SpannedToken { token, span });
        input = rest;
    }

    Ok(tokens)
}

/// Consumes non-newline whitespace and comments, stopping right before the
/// next meaningful token or a newline (newlines are themselves tokens).
fn skip_trivia(mut input: RawSpan<'_>) -> RawSpan<'_> {
    loop {
        let fragment = *input.fragment();
        if let Some(rest) = fragment.strip_prefix(|c: char| c == ' ' || c == '\t' || c == '\r') {
            input = advance(input, fragment.len() - rest.len());
            continue;
        }
        if let Some(rest) = fragment.strip_prefix("//") {
            let end = rest.find('\n').unwrap_or(rest.len());
            input = advance(input, 2 + end);
            continue;
        }
        if fragment.starts_with("/*") {
            if let Some(end) = fragment[2..].find("*/") {
                input = advance(input, 2 + end + 2);
                continue;
            }
            // unterminated block comment: stop here, the caller will hit
            // a dangling `/` and error out trying to lex it as an operator
            break;
        }
        break;
    }
    input
}

fn advance(input: RawSpan<'_>, n: usize) -> RawSpan<'_> {
    use nom::Slice;
    input.slice(n..)
}

type LexResult<'a> = IResult<RawSpan<'a>, Token>;

fn lex_one(input: RawSpan<'_>) -> LexResult<'_> {
    alt((
        lex_newline,
        lex_char_literal,
        lex_string_literal,
        lex_ident_or_keyword,
        lex_operator,
    ))(input)
}

fn lex_newline(input: RawSpan<'_>) -> LexResult<'_> {
    value(Token::Newline, nom_char('\n'))(input)
}

/// D3: a literal is a float iff it has exactly one `.` with digits on both
/// sides; `.5` and `1.` are not accepted (kept unambiguous against
/// member-access syntax). Reports `MalformedNumber` rather than silently
/// saturating when the digits don't fit the target width.
fn lex_number_checked(input: RawSpan<'_>) -> Result<(RawSpan<'_>, Token), (ParseError, Span)> {
    let (rest, span) = recognize(pair(digit1, opt(pair(nom_char('.'), digit1))))(input)
        .map_err(|_: nom::Err<nom::error::Error<RawSpan>>| {
            (ParseError::Syntax { expected: "a number" }, Span::point(input))
        })?;
    let text = *span.fragment();
    if text.contains('.') {
        match text.parse::<f64>() {
            Ok(v) => Ok((rest, Token::Float(v))),
            Err(_) => Err((ParseError::MalformedNumber, Span::from_raw_spans(input, rest))),
        }
    } else {
        match text.parse::<i64>() {
            Ok(v) => Ok((rest, Token::Int(v))),
            Err(_) => Err((ParseError::MalformedNumber, Span::from_raw_spans(input, rest))),
        }
    }
}

fn lex_char_literal(input: RawSpan<'_>) -> LexResult<'_> {
    map(
        delimited(nom_char('\''), alt((escaped_char, none_of("'\\"))), nom_char('\'')),
        Token::Char,
    )(input)
}

fn lex_string_literal(input: RawSpan<'_>) -> LexResult<'_> {
    map(
        delimited(nom_char('"'), many0(alt((escaped_char, none_of("\"\\")))), nom_char('"')),
        |chars: Vec<char>| Token::Str(chars.into_iter().collect()),
    )(input)
}

fn escaped_char(input: RawSpan<'_>) -> IResult<RawSpan<'_>, char> {
    map(
        tuple((nom_char('\\'), one_of("ntr0\"'\\"))),
        |(_, c)| match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            other => other,
        },
    )(input)
}

fn lex_ident_or_keyword(input: RawSpan<'_>) -> LexResult<'_> {
    use nom::bytes::complete::take_while;
    map(
        recognize(pair(
            take_while1(|c: char| c.is_alphabetic() || c == '_'),
            take_while(|c: char| c.is_alphanumeric() || c == '_'),
        )),
        |span: RawSpan| match *span.fragment() {
            "var" => Token::Var,
            "true" => Token::Bool(true),
            "false" => Token::Bool(false),
            "if" => Token::If,
            "else" => Token::Else,
            "while" => Token::While,
            "for" => Token::For,
            other => Token::Ident(other.to_string()),
        },
    )(input)
}

fn lex_operator(input: RawSpan<'_>) -> LexResult<'_> {
    alt((
        alt((
            value(Token::ShlEq, tag("<<=")),
            value(Token::ShrEq, tag(">>=")),
            value(Token::ShiftLeft, tag("<<")),
            value(Token::ShiftRight, tag(">>")),
            value(Token::Le, tag("<=")),
            value(Token::Ge, tag(">=")),
            value(Token::Lt, tag("<")),
            value(Token::Gt, tag(">")),
        )),
        alt((
            value(Token::EqEq, tag("==")),
            value(Token::Ne, tag("!=")),
            value(Token::AmpAmp, tag("&&")),
            value(Token::PipePipe, tag("||")),
            value(Token::PlusPlus, tag("++")),
            value(Token::MinusMinus, tag("--")),
            value(Token::PlusEq, tag("+=")),
            value(Token::MinusEq, tag("-=")),
            value(Token::StarEq, tag("*=")),
            value(Token::SlashEq, tag("/=")),
            value(Token::PercentEq, tag("%=")),
            value(Token::AmpEq, tag("&=")),
            value(Token::CaretEq, tag("^=")),
            value(Token::PipeEq, tag("|=")),
        )),
        alt((
            value(Token::Plus, tag("+")),
            value(Token::Minus, tag("-")),
            value(Token::Star, tag("*")),
            value(Token::Slash, tag("/")),
            value(Token::Percent, tag("%")),
            value(Token::Amp, tag("&")),
            value(Token::Caret, tag("^")),
            value(Token::Pipe, tag("|")),
            value(Token::Eq, tag("=")),
            value(Token::Bang, tag("!")),
            value(Token::Tilde, tag("~")),
        )),
        alt((
            value(Token::LParen, tag("(")),
            value(Token::RParen, tag(")")),
            value(Token::LBrace, tag("{")),
            value(Token::RBrace, tag("}")),
            value(Token::LBracket, tag("[")),
            value(Token::RBracket, tag("]")),
            value(Token::Comma, tag(",")),
            value(Token::Dot, tag(".")),
            value(Token::Semicolon, tag(";")),
        )),
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn lexes_a_declaration() {
        assert_eq!(
            kinds("var a = 0"),
            vec![Token::Var, Token::Ident("a".into()), Token::Eq, Token::Int(0)]
        );
    }

    #[test]
    fn float_requires_digits_on_both_sides() {
        assert_eq!(kinds("1.3"), vec![Token::Float(1.3)]);
    }

    #[test]
    fn skips_comments() {
        assert_eq!(
            kinds("1 // trailing\n/* block */2"),
            vec![Token::Int(1), Token::Newline, Token::Int(2)]
        );
    }

    #[test]
    fn lexes_compound_assignment_and_shift_ops() {
        assert_eq!(
            kinds("a <<= 1 >>= b"),
            vec![
                Token::Ident("a".into()),
                Token::ShlEq,
                Token::Int(1),
                Token::ShrEq,
                Token::Ident("b".into())
            ]
        );
    }

    #[test]
    fn lexes_string_and_char_escapes() {
        assert_eq!(
            kinds(r#" "a\nb" 'x' "#),
            vec![Token::Str("a\nb".into()), Token::Char('x')]
        );
    }

    #[test]
    fn overflowing_integer_literal_is_malformed() {
        let err = tokenize("99999999999999999999").unwrap_err();
        assert!(matches!(err.0, ParseError::MalformedNumber));
    }
}
