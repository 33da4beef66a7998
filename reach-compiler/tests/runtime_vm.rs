use std::collections::BTreeMap;

use reach_compiler::runtime::{BytecodeBlock, Constant, Instruction, Register, Value, Vm, VmError};
use reach_compiler::{
    BinaryOperator, Block, Compilation, CompileOptions, Compiler, Declaration, Expression,
    FunctionDeclaration, Identifier, LexicalDeclaration, Literal, MatchCase, MatchStatement,
    Parameter, Pattern, Program, SourceSpan, Statement, Type, TypeExpression, WhileStatement,
};

fn compile(declarations: Vec<Declaration>) -> Compilation {
    let mut compiler = Compiler::new(CompileOptions::default());
    let compilation = compiler
        .compile(Program::new(declarations))
        .expect("code generation succeeds");
    assert!(
        compiler.diagnostics().is_empty(),
        "unexpected diagnostics: {:?}",
        compiler.diagnostics()
    );
    compilation
}

fn run(declarations: Vec<Declaration>) -> Result<Value, VmError> {
    compile(declarations).run()
}

fn function(name: &str, parameters: Vec<Parameter>, body: Vec<Declaration>) -> FunctionDeclaration {
    FunctionDeclaration::new(name, parameters, Block::new(body))
}

fn identity() -> Declaration {
    function(
        "identity",
        vec![Parameter::new("x")],
        vec![Statement::returning(Expression::identifier("x")).into()],
    )
    .into()
}

fn describe() -> Declaration {
    function(
        "describe",
        vec![
            Parameter::inferred("T"),
            Parameter::typed("value", TypeExpression::name("T")),
        ],
        vec![Statement::returning(Expression::identifier("T")).into()],
    )
    .returning(TypeExpression::name("Type"))
    .into()
}

fn call(name: &str, arguments: Vec<Expression>) -> Expression {
    Expression::call(Expression::identifier(name), arguments)
}

fn number(value: Value) -> f64 {
    match value {
        Value::Number(value) => value,
        other => panic!("expected a number, found {other}"),
    }
}

fn literal_pattern(literal: Literal) -> Pattern {
    Pattern::Literal {
        literal,
        span: SourceSpan::default(),
    }
}

fn object_pattern(entries: Vec<(&str, Pattern)>) -> Pattern {
    Pattern::Object {
        entries: entries
            .into_iter()
            .map(|(name, pattern)| (name.to_string(), pattern))
            .collect(),
        span: SourceSpan::default(),
    }
}

fn match_statement(
    scrutinee: Expression,
    cases: Vec<(Pattern, Expression)>,
    default_case: Option<Expression>,
) -> Declaration {
    Statement::Match(MatchStatement {
        scrutinee,
        cases: cases
            .into_iter()
            .map(|(pattern, value)| MatchCase {
                pattern,
                statement: Statement::Expression(value),
            })
            .collect(),
        default_case: default_case.map(|value| Box::new(Statement::Expression(value))),
        span: SourceSpan::default(),
    })
    .into()
}

// ===== Functions and implicit parameters =====

#[test]
fn calls_a_generalized_function() {
    let value = run(vec![
        identity(),
        Declaration::expression(call("identity", vec![Expression::number(5.0)])),
    ])
    .expect("program runs");
    assert_eq!(number(value), 5.0);
}

#[test]
fn baked_implicit_argument_is_passed_as_a_type() {
    let value = run(vec![
        describe(),
        Declaration::expression(call("describe", vec![Expression::number(5.0)])),
    ])
    .expect("program runs");
    match value {
        Value::Type(ty) => assert_eq!(ty, Type::number()),
        other => panic!("expected a type value, found {other}"),
    }
}

#[test]
fn implicit_argument_is_inferred_at_run_time() {
    let relay = function(
        "relay",
        vec![Parameter::new("value")],
        vec![Statement::returning(call("describe", vec![Expression::identifier("value")])).into()],
    );
    let value = run(vec![
        describe(),
        relay.into(),
        Declaration::expression(call("relay", vec![Expression::string("hi")])),
    ])
    .expect("program runs");
    match value {
        Value::Type(ty) => assert_eq!(ty, Type::string()),
        other => panic!("expected a type value, found {other}"),
    }
}

#[test]
fn unresolved_implicit_parameter_fails_at_run_time() {
    let make = function(
        "make",
        vec![Parameter::inferred("T")],
        vec![Statement::returning(Expression::identifier("T")).into()],
    )
    .returning(TypeExpression::name("Type"));
    let error = run(vec![make.into(), Declaration::expression(call("make", vec![]))])
        .expect_err("nothing constrains `T`");
    assert_eq!(
        error,
        VmError::Type("failed to infer type variable `T`".to_string())
    );
}

#[test]
fn function_values_are_called_through_holes() {
    let apply = function(
        "apply",
        vec![Parameter::new("f"), Parameter::new("x")],
        vec![Statement::returning(Expression::call(
            Expression::identifier("f"),
            vec![Expression::identifier("x")],
        ))
        .into()],
    );
    let value = run(vec![
        identity(),
        apply.into(),
        Declaration::expression(call(
            "apply",
            vec![Expression::identifier("identity"), Expression::number(3.0)],
        )),
    ])
    .expect("program runs");
    assert_eq!(number(value), 3.0);
}

#[test]
fn forward_call_infers_implicit_arguments() {
    let value = run(vec![
        LexicalDeclaration::new("kind", call("describe", vec![Expression::number(5.0)])).into(),
        describe(),
        Declaration::expression(Expression::identifier("kind")),
    ])
    .expect("program runs");
    match value {
        Value::Type(ty) => assert_eq!(ty, Type::number()),
        other => panic!("expected a type value, found {other}"),
    }
}

#[test]
fn function_value_with_implicit_parameters_is_called_through_a_hole() {
    let apply = function(
        "apply",
        vec![Parameter::new("f"), Parameter::new("x")],
        vec![Statement::returning(Expression::call(
            Expression::identifier("f"),
            vec![Expression::identifier("x")],
        ))
        .into()],
    );
    let value = run(vec![
        describe(),
        apply.into(),
        Declaration::expression(call(
            "apply",
            vec![Expression::identifier("describe"), Expression::string("hi")],
        )),
    ])
    .expect("program runs");
    match value {
        Value::Type(ty) => assert_eq!(ty, Type::string()),
        other => panic!("expected a type value, found {other}"),
    }
}

#[test]
fn rigid_identity_is_called_with_one_argument() {
    let identity = function(
        "identity",
        vec![Parameter::typed("x", TypeExpression::name("T"))],
        vec![Statement::returning(Expression::identifier("x")).into()],
    )
    .with_type_parameters(&["T"])
    .returning(TypeExpression::name("T"));
    let compilation = compile(vec![
        identity.into(),
        Declaration::expression(call("identity", vec![Expression::number(5.0)])),
    ]);
    assert!(compilation
        .block
        .instructions
        .iter()
        .any(|instruction| matches!(instruction, Instruction::Call { argc: 1, .. })));
    assert_eq!(number(compilation.run().expect("program runs")), 5.0);
}

// ===== Members and run-time checks =====

fn getter() -> Declaration {
    function(
        "get",
        vec![Parameter::new("o")],
        vec![Statement::returning(Expression::member(Expression::identifier("o"), "y")).into()],
    )
    .into()
}

#[test]
fn member_of_an_unknown_object_reads_the_field() {
    let value = run(vec![
        getter(),
        Declaration::expression(call(
            "get",
            vec![Expression::object(vec![("y", Expression::number(4.0))])],
        )),
    ])
    .expect("program runs");
    assert_eq!(number(value), 4.0);
}

#[test]
fn missing_member_of_a_plain_value_is_a_runtime_error() {
    let error = run(vec![
        getter(),
        Declaration::expression(call(
            "get",
            vec![Expression::object(vec![("x", Expression::number(1.0))])],
        )),
    ])
    .expect_err("`y` is missing");
    assert_eq!(
        error,
        VmError::Runtime("Missing field `y` in `{x: 1}`".to_string())
    );
}

#[test]
fn member_of_a_type_level_value_becomes_a_hole() {
    let value = run(vec![
        getter(),
        Declaration::expression(call(
            "get",
            vec![Expression::type_value(TypeExpression::name("Number"))],
        )),
    ])
    .expect("program runs");
    assert!(matches!(value, Value::Hole(_)), "found {value}");
}

fn reader() -> Declaration {
    function(
        "read",
        vec![Parameter::new("o")],
        vec![
            LexicalDeclaration::new("n", Expression::member(Expression::identifier("o"), "size"))
                .annotated(TypeExpression::name("Number"))
                .into(),
            Statement::returning(Expression::identifier("n")).into(),
        ],
    )
    .into()
}

fn read(size: Expression) -> Result<Value, VmError> {
    run(vec![
        reader(),
        Declaration::expression(call("read", vec![Expression::object(vec![("size", size)])])),
    ])
}

#[test]
fn annotated_binding_accepts_a_matching_value() {
    assert_eq!(number(read(Expression::number(3.0)).expect("program runs")), 3.0);
}

#[test]
fn annotated_binding_traps_a_value_of_the_wrong_class() {
    let error =
        read(Expression::array(vec![Expression::number(1.0)])).expect_err("array is not a number");
    assert_eq!(
        error,
        VmError::Type("Runtime type check failed: expected `Number`".to_string())
    );
}

#[test]
fn annotated_binding_unifies_names_at_run_time() {
    let error = read(Expression::string("big")).expect_err("string is not a number");
    assert_eq!(
        error,
        VmError::Type("Unification failure: expected `Number` but found `String`".to_string())
    );
}

// ===== Control flow =====

#[test]
fn match_binds_fields_of_the_first_matching_case() {
    let shape = Expression::object(vec![
        ("kind", Expression::string("circle")),
        ("radius", Expression::number(2.0)),
    ]);
    let value = run(vec![
        Declaration::let_binding("shape", shape),
        match_statement(
            Expression::identifier("shape"),
            vec![
                (
                    object_pattern(vec![("kind", literal_pattern(Literal::String("square".into())))]),
                    Expression::number(4.0),
                ),
                (
                    object_pattern(vec![
                        ("kind", literal_pattern(Literal::String("circle".into()))),
                        ("radius", Pattern::Identifier(Identifier::new("r"))),
                    ]),
                    Expression::identifier("r"),
                ),
            ],
            None,
        ),
    ])
    .expect("program runs");
    assert_eq!(number(value), 2.0);
}

#[test]
fn match_falls_back_to_the_default_case() {
    let value = run(vec![match_statement(
        Expression::number(7.0),
        vec![(literal_pattern(Literal::Number(1.0)), Expression::string("one"))],
        Some(Expression::string("other")),
    )])
    .expect("program runs");
    assert_eq!(value.to_string(), "other");
}

#[test]
fn match_without_a_matching_case_is_a_runtime_error() {
    let error = run(vec![match_statement(
        Expression::number(5.0),
        vec![(literal_pattern(Literal::Number(1.0)), Expression::number(1.0))],
        None,
    )])
    .expect_err("no case matches");
    assert_eq!(error, VmError::Runtime("All patterns failed to match".to_string()));
}

#[test]
fn break_leaves_nested_scopes() {
    let body = Statement::block(vec![Statement::block(vec![
        Declaration::let_binding("inner", Expression::number(1.0)),
        Statement::Break(SourceSpan::default()).into(),
    ])
    .into()]);
    let value = run(vec![
        Declaration::let_binding("result", Expression::number(9.0)),
        Statement::While(WhileStatement {
            condition: Expression::boolean(true),
            body: Box::new(body),
            span: SourceSpan::default(),
        })
        .into(),
        Declaration::expression(Expression::identifier("result")),
    ])
    .expect("loop terminates");
    assert_eq!(number(value), 9.0);
}

fn boom() -> Declaration {
    function(
        "boom",
        vec![],
        vec![match_statement(
            Expression::number(0.0),
            vec![(literal_pattern(Literal::Number(1.0)), Expression::boolean(true))],
            None,
        )],
    )
    .into()
}

#[test]
fn logical_operators_short_circuit() {
    let and = run(vec![
        boom(),
        Declaration::expression(Expression::binary(
            Expression::boolean(false),
            BinaryOperator::And,
            call("boom", vec![]),
        )),
    ])
    .expect("rhs is skipped");
    assert!(matches!(and, Value::Bool(false)));

    let or = run(vec![
        boom(),
        Declaration::expression(Expression::binary(
            Expression::boolean(true),
            BinaryOperator::Or,
            call("boom", vec![]),
        )),
    ])
    .expect("rhs is skipped");
    assert!(matches!(or, Value::Bool(true)));

    let evaluated = run(vec![
        boom(),
        Declaration::expression(Expression::binary(
            Expression::boolean(true),
            BinaryOperator::And,
            call("boom", vec![]),
        )),
    ]);
    assert!(evaluated.is_err());
}

#[test]
fn arithmetic_goes_through_the_operator_table() {
    let value = run(vec![Declaration::expression(Expression::binary(
        Expression::binary(Expression::number(2.0), BinaryOperator::Multiply, Expression::number(3.0)),
        BinaryOperator::Add,
        Expression::number(1.0),
    ))])
    .expect("program runs");
    assert_eq!(number(value), 7.0);
}

// ===== Types as values =====

#[test]
fn type_expressions_evaluate_to_types() {
    let value = run(vec![Declaration::expression(Expression::type_value(
        TypeExpression::array(TypeExpression::name("Number")),
    ))])
    .expect("program runs");
    match value {
        Value::Type(ty) => assert_eq!(ty.to_string(), "Number[]"),
        other => panic!("expected a type value, found {other}"),
    }
}

#[test]
fn new_value_builds_the_zero_value_of_a_type() {
    let mut block = BytecodeBlock::new("<manual>", 0);
    let number = block.add_identifier("Number");
    let key = block.add_constant(Constant::String("count".into()));
    block.emit(Instruction::LoadConstant {
        dst: Register(0),
        constant: key,
    });
    block.emit(Instruction::NewNameType {
        dst: Register(1),
        name: number,
    });
    block.emit(Instruction::NewRecordType {
        dst: Register(2),
        count: 1,
        first_key: Register(0),
        first_type: Register(1),
    });
    block.emit(Instruction::NewValue {
        dst: Register(3),
        ty: Register(2),
    });
    block.emit(Instruction::End { value: Register(3) });
    block.register_count = 4;

    let value = Vm::new().run(&block).expect("block runs");
    let Value::Object(fields) = &value else {
        panic!("expected an object, found {value}");
    };
    let expected: BTreeMap<String, f64> = [("count".to_string(), 0.0)].into_iter().collect();
    let found: BTreeMap<String, f64> = fields
        .borrow()
        .iter()
        .map(|(name, value)| (name.clone(), number_of(value)))
        .collect();
    assert_eq!(found, expected);
    assert_eq!(value.to_string(), "{count: 0}");
}

fn number_of(value: &Value) -> f64 {
    match value {
        Value::Number(value) => *value,
        other => panic!("expected a number, found {other}"),
    }
}
