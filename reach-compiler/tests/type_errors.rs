use reach_compiler::{
    BinaryOperator, Block, CompileOptions, Compiler, Declaration, Expression, FunctionDeclaration,
    LexicalDeclaration, Parameter, Program, SourceSpan, Statement, TypeExpression, WhileStatement,
};

fn messages(compiler: &Compiler) -> Vec<String> {
    compiler
        .diagnostics()
        .entries()
        .iter()
        .map(|diagnostic| diagnostic.message.clone())
        .collect()
}

fn annotated(name: &str, annotation: &str, initializer: Expression) -> Declaration {
    LexicalDeclaration::new(name, initializer)
        .annotated(TypeExpression::name(annotation))
        .into()
}

#[test]
fn reports_every_failing_sibling() {
    let program = Program::new(vec![
        annotated(
            "a",
            "Number",
            Expression::string("x").with_span(SourceSpan::new(1, 17, 1, 20)),
        ),
        Declaration::let_binding(
            "b",
            Expression::binary(
                Expression::identifier("a"),
                BinaryOperator::Add,
                Expression::number(1.0),
            ),
        ),
        Declaration::let_binding(
            "c",
            Expression::binary(
                Expression::boolean(true).with_span(SourceSpan::new(3, 9, 3, 13)),
                BinaryOperator::Add,
                Expression::number(1.0),
            ),
        ),
    ]);

    let mut compiler = Compiler::new(CompileOptions::default());
    let compilation = compiler.compile(program).expect("errors are collected");

    assert_eq!(
        messages(&compiler),
        vec![
            "Unification failure: expected `Number` but found `String`".to_string(),
            "Unification failure: expected `Number` but found `Bool`".to_string(),
        ]
    );
    let rejected = compiler
        .diagnostics()
        .entries()
        .iter()
        .map(|diagnostic| (diagnostic.declaration, diagnostic.span))
        .collect::<Vec<_>>();
    assert_eq!(
        rejected,
        vec![
            (0, SourceSpan::new(1, 17, 1, 20)),
            (2, SourceSpan::new(3, 9, 3, 13)),
        ]
    );
    assert!(compilation.report.is_rejected(0));
    assert!(!compilation.report.is_rejected(1));
    assert!(compilation.report.is_rejected(2));
}

#[test]
fn deny_errors_stops_before_code_generation() {
    let program = Program::new(vec![annotated("flag", "Bool", Expression::number(1.0))]);
    let mut compiler = Compiler::new(CompileOptions {
        deny_errors: true,
        ..CompileOptions::default()
    });
    let error = match compiler.compile(program) {
        Ok(_) => panic!("expected type checking to fail"),
        Err(error) => error,
    };
    assert_eq!(error.to_string(), "Type checking failed");
    assert_eq!(compiler.diagnostics().len(), 1);
}

#[test]
fn unknown_names_are_reported() {
    let program = Program::new(vec![
        Declaration::expression(Expression::identifier("missing")),
        annotated("shape", "Shape", Expression::number(1.0)),
    ]);
    let mut compiler = Compiler::new(CompileOptions::default());
    compiler.compile(program).expect("errors are collected");
    assert_eq!(
        messages(&compiler),
        vec![
            "Unknown variable: `missing`".to_string(),
            "Unknown type: `Shape`".to_string(),
        ]
    );
}

#[test]
fn calls_check_arity_and_callability() {
    let twice = FunctionDeclaration::new(
        "twice",
        vec![Parameter::typed("n", TypeExpression::name("Number"))],
        Block::new(vec![Statement::returning(Expression::binary(
            Expression::identifier("n"),
            BinaryOperator::Multiply,
            Expression::number(2.0),
        ))
        .into()]),
    );
    let program = Program::new(vec![
        twice.into(),
        Declaration::expression(Expression::call(
            Expression::identifier("twice"),
            vec![Expression::number(1.0), Expression::number(2.0)],
        )),
        Declaration::expression(Expression::call(Expression::number(3.0), vec![])),
    ]);
    let mut compiler = Compiler::new(CompileOptions::default());
    compiler.compile(program).expect("errors are collected");
    assert_eq!(
        messages(&compiler),
        vec![
            "Arity mismatch: expected 1 but found 2".to_string(),
            "Value of type `Number` is not callable".to_string(),
        ]
    );
}

fn endless_loop(body: Vec<Declaration>) -> Declaration {
    Statement::While(WhileStatement {
        condition: Expression::boolean(true),
        body: Box::new(Statement::block(body)),
        span: SourceSpan::default(),
    })
    .into()
}

#[test]
fn endless_loop_leaves_the_return_type_to_its_returns() {
    let first = FunctionDeclaration::new(
        "first",
        vec![],
        Block::new(vec![endless_loop(vec![
            Statement::returning(Expression::number(1.0)).into(),
        ])]),
    );
    let program = Program::new(vec![
        first.into(),
        annotated(
            "n",
            "Number",
            Expression::call(Expression::identifier("first"), vec![]),
        ),
    ]);
    let mut compiler = Compiler::new(CompileOptions::default());
    compiler.compile(program).expect("code generation succeeds");
    assert!(compiler.diagnostics().is_empty(), "{:?}", compiler.diagnostics());
}

#[test]
fn loop_that_breaks_completes_with_void() {
    let stop = FunctionDeclaration::new(
        "stop",
        vec![],
        Block::new(vec![endless_loop(vec![
            Statement::Break(SourceSpan::default()).into(),
        ])]),
    )
    .returning(TypeExpression::name("Number"));
    let program = Program::new(vec![stop.into()]);
    let mut compiler = Compiler::new(CompileOptions::default());
    compiler.compile(program).expect("errors are collected");
    assert_eq!(
        messages(&compiler),
        vec!["Unification failure: expected `Number` but found `Void`".to_string()]
    );
}

#[test]
fn control_flow_outside_its_construct_is_rejected() {
    let program = Program::new(vec![
        Statement::returning(Expression::number(1.0)).into(),
        Statement::Break(SourceSpan::default()).into(),
    ]);
    let mut compiler = Compiler::new(CompileOptions::default());
    compiler.compile(program).expect("errors are collected");
    assert_eq!(
        messages(&compiler),
        vec![
            "`return` outside of a function".to_string(),
            "`break` outside of a loop".to_string(),
        ]
    );
}

#[test]
fn diagnostics_serialize_for_tooling() {
    let program = Program::new(vec![annotated("flag", "Bool", Expression::number(1.0))]);
    let mut compiler = Compiler::new(CompileOptions::default());
    compiler.compile(program).expect("errors are collected");
    let json = compiler.diagnostics().to_json().expect("serializable");
    assert!(json.contains("\"declaration\": 0"));
    assert!(json.contains("expected `Bool` but found `Number`"));
}
