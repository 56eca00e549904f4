//! Integration tests for scripts that parse fine but fail during
//! evaluation. Each asserts the exact `Display` rendering of the resulting
//! error, the way the teacher's own `runtime_error.rs` does.

use scripty::Engine;

fn expect_runtime_error(src: &str, expected: &str) {
    let mut engine = Engine::new();
    scripty::defaults::install(&mut engine);
    let err = scripty::parse_and_run(&mut engine, src).unwrap_err();
    assert_eq!(format!("{}", err), expected);
}

#[test]
fn calling_an_unknown_function_is_a_runtime_error() {
    expect_runtime_error("foo(1)", "Runtime error at 1:1: No variable, function or binding named `foo`");
}

#[test]
fn reading_an_unknown_variable_is_a_runtime_error() {
    expect_runtime_error("var a = b + 1", "Runtime error at 1:9: No variable, function or binding named `b`");
}

#[test]
fn vector_index_out_of_bounds_is_a_runtime_error() {
    expect_runtime_error(
        "var v = [1, 2]\nvar x = v[5]",
        "Runtime error at 2:5: Index 5 out of bounds for vector of length 2 in `x = v[5]`",
    );
}

#[test]
fn redeclaring_a_name_in_the_same_scope_is_a_runtime_error() {
    expect_runtime_error(
        "var a = 1\nvar a = 2",
        "Runtime error at 2:5: `a` is already declared in this scope",
    );
}

#[test]
fn dividing_by_zero_is_a_runtime_error() {
    expect_runtime_error(
        "var a = 1\nvar b = a / 0",
        "Runtime error at 2:9: Division by zero in `a / 0`",
    );
}

#[test]
fn modulo_by_zero_is_a_runtime_error() {
    expect_runtime_error(
        "var a = 1\nvar b = a % 0",
        "Runtime error at 2:9: Division by zero in `a % 0`",
    );
}

#[test]
fn assertion_failure_carries_its_message() {
    expect_runtime_error(
        "assert(1 == 2, \"nope\")",
        "Runtime error at 1:1: Assertion failed: nope",
    );
}
