//! Integration tests for scripts that fail to parse. Every program here is
//! expected to fail in `parse_and_run`, and the assertions check the exact
//! `Display` rendering of the resulting error, the way the teacher's own
//! `compile_error.rs` asserts exact strings rather than just "it errored".

use scripty::Engine;

fn expect_parse_error(src: &str, expected: &str) {
    let mut engine = Engine::new();
    scripty::defaults::install(&mut engine);
    let err = scripty::parse_and_run(&mut engine, src).unwrap_err();
    assert_eq!(format!("{}", err), expected);
}

#[test]
fn dangling_operator_at_end_of_input() {
    expect_parse_error("var a = ", "Syntax error at 1:8: Expected an expression");
}

#[test]
fn unclosed_vector_literal() {
    expect_parse_error("var v = [1, 2", "Syntax error at 1:14: Unclosed 2, expected `]`");
}

#[test]
fn malformed_float_literal_is_not_silently_accepted() {
    // `1.` has no digits after the dot, so the tokenizer stops at the `1`
    // (decision D3 in tokenizer.rs) and the `.` is parsed as the start of a
    // member access instead, which then has nothing to follow it.
    expect_parse_error("var a = 1.", "Syntax error at 1:11: Expected a member name");
}
