use reach_compiler::{
    Block, Declaration, Expression, FunctionDeclaration, Parameter, Program, Statement, Type,
    TypeChecker, TypeExpression,
};

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

fn check(program: &mut Program) -> TypeChecker {
    let mut checker = TypeChecker::new();
    let report = checker.check_program(program);
    assert!(
        checker.diagnostics().is_empty(),
        "expected no diagnostics, found {:?}",
        checker.diagnostics()
    );
    assert!(report.rejected.is_empty());
    checker
}

fn signature_of(program: &Program, index: usize) -> Type {
    match &program.declarations[index] {
        Declaration::Function(function) => function
            .signature
            .clone()
            .expect("checked functions carry a signature"),
        other => panic!("expected a function declaration, found {other:?}"),
    }
}

fn initializer_type(program: &Program, index: usize) -> Type {
    match &program.declarations[index] {
        Declaration::Lexical(lexical) => lexical
            .initializer
            .ty
            .clone()
            .expect("initializer has a type"),
        other => panic!("expected a let declaration, found {other:?}"),
    }
}

#[test]
fn identity_generalizes_its_parameter() {
    let mut program = Program::new(vec![identity()]);
    let mut checker = check(&mut program);

    let signature = signature_of(&program, 0);
    let Type::Function {
        params,
        return_type,
        implicit_count,
    } = &signature
    else {
        panic!("expected a function type, found {signature}");
    };
    assert_eq!(*implicit_count, 0);
    assert_eq!(params.len(), 1);
    assert_eq!(&params[0], return_type.as_ref());

    let Type::Var(var) = &params[0] else {
        panic!("expected a type variable, found {}", params[0]);
    };
    assert!(checker.table().is_generalized(var.id));
    assert_eq!(signature.to_string(), "(x) -> x");
}

#[test]
fn generalized_function_is_used_at_two_types() {
    let mut program = Program::new(vec![
        identity(),
        Declaration::let_binding(
            "n",
            Expression::call(Expression::identifier("identity"), vec![Expression::number(1.0)]),
        ),
        Declaration::let_binding(
            "s",
            Expression::call(Expression::identifier("identity"), vec![Expression::string("a")]),
        ),
    ]);
    check(&mut program);

    assert_eq!(initializer_type(&program, 1), Type::number());
    assert_eq!(initializer_type(&program, 2), Type::string());
}

#[test]
fn type_parameters_stay_rigid_inside_the_body() {
    let first = function(
        "first",
        vec![Parameter::typed(
            "items",
            TypeExpression::array(TypeExpression::name("T")),
        )],
        vec![Statement::returning(Expression::subscript(
            Expression::identifier("items"),
            Expression::number(0.0),
        ))
        .into()],
    )
    .with_type_parameters(&["T"])
    .returning(TypeExpression::name("T"));
    let mut program = Program::new(vec![first.into()]);
    check(&mut program);
    assert_eq!(signature_of(&program, 0).to_string(), "(T[]) -> T");

    let narrowing = function(
        "narrowing",
        vec![Parameter::typed("value", TypeExpression::name("T"))],
        vec![Statement::returning(Expression::identifier("value")).into()],
    )
    .with_type_parameters(&["T"])
    .returning(TypeExpression::name("Number"));
    let mut program = Program::new(vec![narrowing.into()]);
    let mut checker = TypeChecker::new();
    let report = checker.check_program(&mut program);
    assert!(report.is_rejected(0));
    assert_eq!(
        checker.diagnostics().entries()[0].message,
        "Unification failure: expected `Number` but found `T`"
    );
}

#[test]
fn inferred_parameters_count_as_implicit() {
    let describe = function(
        "describe",
        vec![
            Parameter::inferred("T"),
            Parameter::typed("value", TypeExpression::name("T")),
        ],
        vec![Statement::returning(Expression::identifier("T")).into()],
    )
    .returning(TypeExpression::name("Type"));
    let mut program = Program::new(vec![
        describe.into(),
        Declaration::let_binding(
            "t",
            Expression::call(Expression::identifier("describe"), vec![Expression::number(5.0)]),
        ),
    ]);
    check(&mut program);

    let signature = signature_of(&program, 0);
    assert_eq!(signature.to_string(), "(T: T, T) -> Type");
    let Type::Function { implicit_count, .. } = signature else {
        panic!("expected a function type");
    };
    assert_eq!(implicit_count, 1);

    let Declaration::Lexical(lexical) = &program.declarations[1] else {
        panic!("expected a let declaration");
    };
    let reach_compiler::ExpressionKind::Call(call) = &lexical.initializer.kind else {
        panic!("expected a call");
    };
    assert_eq!(call.implicit_arguments, Some(vec![Type::number()]));
}

#[test]
fn inferred_parameters_must_lead() {
    let late = function(
        "late",
        vec![Parameter::new("value"), Parameter::inferred("T")],
        vec![Statement::returning(Expression::identifier("value")).into()],
    );
    let mut program = Program::new(vec![late.into()]);
    let mut checker = TypeChecker::new();
    let report = checker.check_program(&mut program);
    assert!(report.is_rejected(0));
    assert!(checker.diagnostics().entries()[0]
        .message
        .contains("must come before explicit parameters"));
}

#[test]
fn uses_before_the_definition_stay_holes() {
    let mut program = Program::new(vec![
        Declaration::let_binding(
            "early",
            Expression::call(Expression::identifier("later"), vec![Expression::number(1.0)]),
        ),
        function(
            "later",
            vec![Parameter::new("x")],
            vec![Statement::returning(Expression::identifier("x")).into()],
        )
        .into(),
    ]);
    check(&mut program);

    let Declaration::Lexical(lexical) = &program.declarations[0] else {
        panic!("expected a let declaration");
    };
    let reach_compiler::ExpressionKind::Call(call) = &lexical.initializer.kind else {
        panic!("expected a call");
    };
    assert_eq!(call.implicit_arguments, None);
    assert_eq!(signature_of(&program, 1).to_string(), "(x) -> x");
}
