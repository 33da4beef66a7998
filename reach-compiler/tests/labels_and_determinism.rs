use reach_compiler::runtime::{BytecodeBlock, Value, UNPATCHED};
use reach_compiler::{
    BinaryOperator, Block, Compilation, CompileOptions, Compiler, Declaration, Expression,
    ForInitializer, ForStatement, FunctionDeclaration, IfStatement, LexicalDeclaration, Literal,
    MatchCase, MatchStatement, Parameter, Pattern, Program, SourceSpan, Statement, TypeExpression,
    WhileStatement,
};

fn less(lhs: Expression, rhs: Expression) -> Expression {
    Expression::binary(lhs, BinaryOperator::Less, rhs)
}

fn classify() -> Declaration {
    let guard = Statement::If(IfStatement {
        condition: less(Expression::identifier("n"), Expression::number(0.0)),
        consequent: Box::new(Statement::block(vec![
            Statement::returning(Expression::string("negative")).into(),
        ])),
        alternate: None,
        span: SourceSpan::default(),
    });

    let counting = Statement::For(ForStatement {
        initializer: Some(ForInitializer::Lexical(Box::new(LexicalDeclaration::new(
            "i",
            Expression::number(0.0),
        )))),
        condition: Some(less(Expression::identifier("i"), Expression::identifier("n"))),
        increment: Some(Expression::identifier("i")),
        body: Box::new(Statement::If(IfStatement {
            condition: less(Expression::identifier("i"), Expression::number(2.0)),
            consequent: Box::new(Statement::Break(SourceSpan::default())),
            alternate: Some(Box::new(Statement::Continue(SourceSpan::default()))),
            span: SourceSpan::default(),
        })),
        span: SourceSpan::default(),
    });

    let idle = Statement::While(WhileStatement {
        condition: Expression::boolean(false),
        body: Box::new(Statement::block(vec![
            Statement::Continue(SourceSpan::default()).into(),
        ])),
        span: SourceSpan::default(),
    });

    let naming = Statement::Match(MatchStatement {
        scrutinee: Expression::identifier("n"),
        cases: vec![MatchCase {
            pattern: Pattern::Literal {
                literal: Literal::Number(0.0),
                span: SourceSpan::default(),
            },
            statement: Statement::Expression(Expression::string("zero")),
        }],
        default_case: Some(Box::new(Statement::Expression(Expression::string("many")))),
        span: SourceSpan::default(),
    });

    FunctionDeclaration::new(
        "classify",
        vec![Parameter::typed("n", TypeExpression::name("Number"))],
        Block::new(vec![
            guard.into(),
            counting.into(),
            idle.into(),
            naming.into(),
        ]),
    )
    .into()
}

fn program(argument: f64) -> Program {
    Program::new(vec![
        classify(),
        LexicalDeclaration::new("bad", Expression::number(1.0))
            .annotated(TypeExpression::name("Bool"))
            .into(),
        Declaration::expression(Expression::call(
            Expression::identifier("classify"),
            vec![Expression::number(argument)],
        )),
    ])
}

fn compile(argument: f64) -> (Compilation, String) {
    let mut compiler = Compiler::new(CompileOptions::default());
    let compilation = compiler
        .compile(program(argument))
        .expect("code generation succeeds");
    let diagnostics = compiler
        .diagnostics()
        .to_json()
        .expect("diagnostics serialize");
    (compilation, diagnostics)
}

fn all_blocks(block: &BytecodeBlock) -> Vec<&BytecodeBlock> {
    let mut blocks = vec![block];
    for function in &block.functions {
        blocks.extend(all_blocks(function));
    }
    blocks
}

#[test]
fn every_jump_is_patched_and_in_range() {
    let (compilation, _) = compile(5.0);
    compilation.block.verify().expect("bytecode verifies");
    for block in all_blocks(&compilation.block) {
        for instruction in &block.instructions {
            if let Some(target) = instruction.jump_target() {
                assert_ne!(target, UNPATCHED, "unpatched jump in `{}`", block.name);
                assert!((target as usize) < block.len());
            }
        }
    }
}

#[test]
fn compiling_twice_gives_identical_output() {
    let (first, first_diagnostics) = compile(5.0);
    let (second, second_diagnostics) = compile(5.0);
    assert_eq!(first.block, second.block);
    assert_eq!(first.block.encode(), second.block.encode());
    assert_eq!(first.block.disassemble(), second.block.disassemble());
    assert_eq!(first_diagnostics, second_diagnostics);
    assert!(first_diagnostics.contains("expected `Bool` but found `Number`"));
}

#[test]
fn control_flow_reaches_the_expected_case() {
    let cases = [(-1.0, "negative"), (0.0, "zero"), (5.0, "many")];
    for (argument, expected) in cases {
        let (compilation, _) = compile(argument);
        match compilation.run().expect("program runs") {
            Value::String(found) => assert_eq!(&*found, expected),
            other => panic!("expected a string, found {other}"),
        }
    }
}
