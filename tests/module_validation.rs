//! Encoded modules must pass a full WebAssembly validator, and the lowered
//! program must print what the source says when interpreted.

use bumpalo::Bump;
use wabbit::{AstBuilder, BinaryOp, ConstValue, Program, UnaryOp, Unit, ValueType};
use wasmparser::Validator;

/// Compile, validate the bytes and return what the interpreter printed.
fn validate_and_run(program: &Program<'_>) -> Vec<ConstValue> {
    let mut unit = Unit::new(program);
    let printed = unit.run().expect("program should run");
    let bytes = unit.compile().expect("program should compile");
    if let Err(err) = Validator::new().validate_all(&bytes) {
        panic!("invalid module: {err}");
    }
    printed
}

#[test]
fn functions_and_recursion() {
    // func fact(n int) int { if n < 2 { return 1; } return n * fact(n - 1); }
    // func half(x float) float { return x / 2.0; }
    // print fact(5);
    // print half(float(fact(3)));
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let recurse = b.binary(
        BinaryOp::Mul,
        b.var("n"),
        b.call("fact", &[b.binary(BinaryOp::Sub, b.var("n"), b.int(1))]),
    );
    let fact = b.function(
        "fact",
        &[b.param("n", ValueType::Int)],
        ValueType::Int,
        b.block(&[
            b.if_else(
                b.binary(BinaryOp::Less, b.var("n"), b.int(2)),
                b.block(&[b.return_stmt(Some(b.int(1)))]),
                None,
            ),
            b.return_stmt(Some(recurse)),
        ]),
    );
    let half = b.function(
        "half",
        &[b.param("x", ValueType::Float)],
        ValueType::Float,
        b.block(&[b.return_stmt(Some(b.binary(
            BinaryOp::Div,
            b.var("x"),
            b.float(2.0),
        )))]),
    );
    let program = b.program(&[
        fact,
        half,
        b.print(b.call("fact", &[b.int(5)])),
        b.print(b.call(
            "half",
            &[b.cast(ValueType::Float, b.call("fact", &[b.int(3)]))],
        )),
    ]);

    assert_eq!(
        validate_and_run(&program),
        [ConstValue::Int(120), ConstValue::Float(3.0)]
    );
}

#[test]
fn nested_control_with_break_and_continue() {
    // var total = 0;
    // var i = 0;
    // while i < 5 {
    //     i = i + 1;
    //     if i == 2 { continue; }
    //     var j = 0;
    //     while true {
    //         j = j + 1;
    //         if j > i { break; } else { total = total + j; }
    //     }
    // }
    // print total;
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let inner = b.block(&[
        b.assign(b.name("j"), b.binary(BinaryOp::Add, b.var("j"), b.int(1))),
        b.if_else(
            b.binary(BinaryOp::Greater, b.var("j"), b.var("i")),
            b.block(&[b.break_stmt()]),
            Some(b.block(&[b.assign(
                b.name("total"),
                b.binary(BinaryOp::Add, b.var("total"), b.var("j")),
            )])),
        ),
    ]);
    let outer = b.block(&[
        b.assign(b.name("i"), b.binary(BinaryOp::Add, b.var("i"), b.int(1))),
        b.if_else(
            b.binary(BinaryOp::Equal, b.var("i"), b.int(2)),
            b.block(&[b.continue_stmt()]),
            None,
        ),
        b.variable("j", None, Some(b.int(0))),
        b.while_loop(b.bool(true), inner),
    ]);
    let program = b.program(&[
        b.variable("total", None, Some(b.int(0))),
        b.variable("i", None, Some(b.int(0))),
        b.while_loop(b.binary(BinaryOp::Less, b.var("i"), b.int(5)), outer),
        b.print(b.var("total")),
    ]);

    // Triangle numbers of 1, 3, 4 and 5.
    assert_eq!(validate_and_run(&program), [ConstValue::Int(1 + 6 + 10 + 15)]);
}

#[test]
fn folded_and_runtime_global_initializers() {
    // func seven() int { return 7; }
    // const area = 2 * 3;
    // const ratio float = 1.5;
    // var late = seven() + area;
    // print area; print ratio; print late;
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let seven = b.function(
        "seven",
        &[],
        ValueType::Int,
        b.block(&[b.return_stmt(Some(b.int(7)))]),
    );
    let late = b.binary(BinaryOp::Add, b.call("seven", &[]), b.var("area"));
    let program = b.program(&[
        seven,
        b.constant("area", None, b.binary(BinaryOp::Mul, b.int(2), b.int(3))),
        b.constant("ratio", Some(ValueType::Float), b.float(1.5)),
        b.variable("late", None, Some(late)),
        b.print(b.var("area")),
        b.print(b.var("ratio")),
        b.print(b.var("late")),
    ]);

    assert_eq!(
        validate_and_run(&program),
        [
            ConstValue::Int(6),
            ConstValue::Float(1.5),
            ConstValue::Int(13)
        ]
    );
}

#[test]
fn memory_access() {
    // `16 = 40;
    // print `16 + 2;
    // print ^1;
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = b.program(&[
        b.assign(b.address(b.int(16)), b.int(40)),
        b.print(b.binary(BinaryOp::Add, b.load(b.address(b.int(16))), b.int(2))),
        b.print(b.unary(UnaryOp::Grow, b.int(1))),
    ]);

    assert_eq!(
        validate_and_run(&program),
        [ConstValue::Int(42), ConstValue::Int(1)]
    );
}

#[test]
fn every_print_type() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let program = b.program(&[
        b.print(b.int(7)),
        b.print(b.float(0.25)),
        b.print(b.binary(BinaryOp::Less, b.int(1), b.int(2))),
        b.print(b.unary(UnaryOp::Not, b.bool(true))),
        b.print(b.char('\n')),
        b.print(b.cast(ValueType::Bool, b.float(0.5))),
    ]);

    assert_eq!(
        validate_and_run(&program),
        [
            ConstValue::Int(7),
            ConstValue::Float(0.25),
            ConstValue::Bool(true),
            ConstValue::Bool(false),
            ConstValue::Char('\n'),
            ConstValue::Bool(true),
        ]
    );
}
