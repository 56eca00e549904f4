//! Source-to-result scenarios straight out of the language contract: each
//! test feeds a whole program through [`scripty::parse_and_run`] and checks
//! the resulting value, the same way a host embedding this crate would.

use scripty::bindings::Param;
use scripty::type_registry::TypeId;
use scripty::value::{Value, ValueBox};
use scripty::Engine;

fn run(source: &str) -> Value {
    let mut engine = Engine::new();
    scripty::defaults::install(&mut engine);
    scripty::parse_and_run(&mut engine, source)
        .unwrap_or_else(|e| panic!("{:#}", e))
        .value()
        .unwrap()
}

fn run_with(engine: &mut Engine, source: &str) -> Value {
    scripty::parse_and_run(engine, source)
        .unwrap_or_else(|e| panic!("{:#}", e))
        .value()
        .unwrap()
}

#[test]
fn arithmetic_with_precedence() {
    let source = "var a = 0\nvar b = 8\nvar c = a + b * 2";
    let mut engine = Engine::new();
    scripty::defaults::install(&mut engine);
    scripty::parse_and_run(&mut engine, source).unwrap();
    assert!(matches!(engine.get_variable("c"), Some(Value::Int(16))));
}

#[test]
fn nested_vector_literals_index_through_each_level() {
    let mut engine = Engine::new();
    scripty::defaults::install(&mut engine);
    let source = r#"
        var v = ["Hey!", [true, 2], [1.3]]
        var a = v[1][0]
        var b = v[1][1]
        var c = v[2][b-2]
    "#;
    scripty::parse_and_run(&mut engine, source).unwrap();
    assert!(matches!(engine.get_variable("a"), Some(Value::Bool(true))));
    assert!(matches!(engine.get_variable("b"), Some(Value::Int(2))));
    match engine.get_variable("c") {
        Some(Value::Double(d)) => assert!((d - 1.3).abs() < 1e-9),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn nested_for_loops_accumulate() {
    let source = "var count = 0\nvar c = 10\nfor (var a=0; a<c; ++a) { for (var b=0; b<c; ++b) count += 1 }\ncount";
    assert!(matches!(run(source), Value::Int(100)));
}

#[test]
fn if_else_if_chain_falls_through_to_else() {
    let source = "var a = 0\nif (a<0) a=10 else if (a>0) a=10 else a=5\na";
    assert!(matches!(run(source), Value::Int(5)));
}

#[test]
fn string_concatenation_and_compound_assignment() {
    let source = r#"var s = "Hel"
s += "lo "
s += "Worl" + "d!!"
s"#;
    match run(source) {
        Value::Host(_) => {}
        other => panic!("expected a string value, got {:?}", other),
    }
    let mut engine = Engine::new();
    scripty::defaults::install(&mut engine);
    let value = run_with(&mut engine, source);
    assert_eq!(value.downcast_ref::<String>().unwrap(), "Hello World!!");
}

#[test]
fn overload_resolution_prefers_exact_arity_and_exact_type() {
    let mut engine = Engine::new();
    scripty::defaults::install(&mut engine);
    engine.register_global_fn(
        "foo",
        vec![Param::by_value(TypeId::of::<i64>())],
        |args| Ok(ValueBox::owned(Value::Int(match args[0].value()? {
            Value::Int(i) => i * 10,
            _ => unreachable!(),
        }))),
    );
    engine.register_global_fn(
        "foo",
        vec![Param::by_value(TypeId::of::<i64>()), Param::by_value(TypeId::of::<i64>())],
        |args| {
            let a = match args[0].value()? {
                Value::Int(i) => i,
                _ => unreachable!(),
            };
            let b = match args[1].value()? {
                Value::Int(i) => i,
                _ => unreachable!(),
            };
            Ok(ValueBox::owned(Value::Int(a + b)))
        },
    );

    assert!(matches!(run_with(&mut engine, "foo(2)"), Value::Int(20)));
    assert!(matches!(run_with(&mut engine, "foo(2,3)"), Value::Int(5)));
    // `2.0` is a double; it resolves the unary overload via the registered
    // double -> int conversion rather than failing to match either arity.
    assert!(matches!(run_with(&mut engine, "foo(2.0)"), Value::Int(20)));
}

#[test]
fn mixed_signed_unsigned_comparison_is_value_correct() {
    let mut engine = Engine::new();
    scripty::defaults::install(&mut engine);
    engine.register_global_var("neg", Value::Int(-1)).unwrap();
    engine.register_global_var("pos", Value::UInt(1)).unwrap();
    assert!(matches!(run_with(&mut engine, "neg < pos"), Value::Bool(true)));
    assert!(matches!(run_with(&mut engine, "neg == pos"), Value::Bool(false)));
}

#[test]
fn registering_a_global_var_under_a_name_already_in_use_is_an_error() {
    let mut engine = Engine::new();
    engine.register_global_var("count", Value::Int(0)).unwrap();
    let err = engine.register_global_var("count", Value::Int(1)).unwrap_err();
    assert!(matches!(err, scripty::EngineError::DuplicateBinding(name) if name == "count"));
}

#[test]
fn logical_operators_do_not_short_circuit() {
    // Both sides of `&&`/`||` always evaluate (§5): a host-registered
    // function with a side effect on each side proves neither is skipped.
    use std::cell::Cell;
    use std::rc::Rc;

    let mut engine = Engine::new();
    scripty::defaults::install(&mut engine);
    let calls: Rc<Cell<u32>> = Rc::new(Cell::new(0));
    let counter = calls.clone();
    engine.register_global_fn("bump", vec![Param::by_value(TypeId::of::<bool>())], move |args| {
        counter.set(counter.get() + 1);
        args[0].value().map(ValueBox::owned)
    });

    run_with(&mut engine, "var r = bump(false) && bump(true)");
    assert_eq!(calls.get(), 2);
}

#[test]
fn assertion_failure_is_a_distinct_error_kind() {
    let mut engine = Engine::new();
    scripty::defaults::install(&mut engine);
    let err = scripty::parse_and_run(&mut engine, "assert(1 == 2, \"nope\")").unwrap_err();
    let message = format!("{}", err);
    assert!(message.contains("nope"), "unexpected message: {}", message);
}

#[test]
fn redeclaring_a_name_in_the_same_scope_is_an_error() {
    let mut engine = Engine::new();
    scripty::defaults::install(&mut engine);
    let err = scripty::parse_and_run(&mut engine, "var a = 1\nvar a = 2").unwrap_err();
    assert!(!format!("{}", err).is_empty());
}

#[test]
fn vector_member_contract_surface_is_present() {
    let mut engine = Engine::new();
    scripty::defaults::install(&mut engine);
    let source = r#"
        var v = []
        v.push_back(1)
        v.push_back(2)
        v.push_back(3)
        var n = v.size()
        var e = v.empty()
        v.pop_back()
        var m = v.size()
    "#;
    scripty::parse_and_run(&mut engine, source).unwrap();
    assert!(matches!(engine.get_variable("n"), Some(Value::Size(3))));
    assert!(matches!(engine.get_variable("e"), Some(Value::Bool(false))));
    assert!(matches!(engine.get_variable("m"), Some(Value::Size(2))));
}
