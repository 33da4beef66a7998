use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceSpan {
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl SourceSpan {
    pub fn new(line: usize, column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            line,
            column,
            end_line,
            end_column,
        }
    }

    pub fn single_point(line: usize, column: usize) -> Self {
        Self::new(line, column, line, column)
    }

    pub fn union(a: &Self, b: &Self) -> Self {
        if a.line == 0 {
            return *b;
        }
        if b.line == 0 {
            return *a;
        }

        let (start_line, start_column) =
            if (a.line < b.line) || (a.line == b.line && a.column <= b.column) {
                (a.line, a.column)
            } else {
                (b.line, b.column)
            };

        let (end_line, end_column) = if (a.end_line > b.end_line)
            || (a.end_line == b.end_line && a.end_column >= b.end_column)
        {
            (a.end_line, a.end_column)
        } else {
            (b.end_line, b.end_column)
        };

        Self::new(start_line, start_column, end_line, end_column)
    }
}

impl Default for SourceSpan {
    fn default() -> Self {
        Self {
            line: 0,
            column: 0,
            end_line: 0,
            end_column: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
    pub span: SourceSpan,
}

impl Identifier {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            span: SourceSpan::default(),
        }
    }

    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = span;
        self
    }
}

/// The root of a checked compilation unit. Each top-level declaration is
/// checked and generated independently of its siblings.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub declarations: Vec<Declaration>,
}

impl Program {
    pub fn new(declarations: Vec<Declaration>) -> Self {
        Self { declarations }
    }
}

#[derive(Debug, Clone)]
pub enum Declaration {
    Lexical(LexicalDeclaration),
    Function(FunctionDeclaration),
    Statement(Statement),
}

impl Declaration {
    pub fn span(&self) -> SourceSpan {
        match self {
            Declaration::Lexical(lexical) => lexical.span,
            Declaration::Function(function) => function.span,
            Declaration::Statement(statement) => statement.span(),
        }
    }

    pub fn expression(expression: Expression) -> Self {
        Declaration::Statement(Statement::Expression(expression))
    }

    pub fn let_binding<S: Into<String>>(name: S, initializer: Expression) -> Self {
        Declaration::Lexical(LexicalDeclaration::new(name, initializer))
    }
}

impl From<FunctionDeclaration> for Declaration {
    fn from(function: FunctionDeclaration) -> Self {
        Declaration::Function(function)
    }
}

impl From<LexicalDeclaration> for Declaration {
    fn from(lexical: LexicalDeclaration) -> Self {
        Declaration::Lexical(lexical)
    }
}

impl From<Statement> for Declaration {
    fn from(statement: Statement) -> Self {
        Declaration::Statement(statement)
    }
}

#[derive(Debug, Clone)]
pub struct LexicalDeclaration {
    pub is_const: bool,
    pub name: Identifier,
    pub type_annotation: Option<TypeExpression>,
    pub initializer: Expression,
    pub span: SourceSpan,
}

impl LexicalDeclaration {
    pub fn new<S: Into<String>>(name: S, initializer: Expression) -> Self {
        let span = initializer.span;
        Self {
            is_const: false,
            name: Identifier::new(name),
            type_annotation: None,
            initializer,
            span,
        }
    }

    pub fn annotated(mut self, annotation: TypeExpression) -> Self {
        self.type_annotation = Some(annotation);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: Identifier,
    pub type_annotation: Option<TypeExpression>,
    /// Supplied by inference at the call site instead of by the caller.
    pub inferred: bool,
}

impl Parameter {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: Identifier::new(name),
            type_annotation: None,
            inferred: false,
        }
    }

    pub fn typed<S: Into<String>>(name: S, annotation: TypeExpression) -> Self {
        Self {
            type_annotation: Some(annotation),
            ..Self::new(name)
        }
    }

    pub fn inferred<S: Into<String>>(name: S) -> Self {
        Self {
            inferred: true,
            ..Self::new(name)
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionDeclaration {
    pub name: Identifier,
    pub type_parameters: Vec<Identifier>,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeExpression>,
    pub body: Block,
    pub span: SourceSpan,
    /// Generalized signature, filled in by the type checker.
    pub signature: Option<Type>,
}

impl FunctionDeclaration {
    pub fn new<S: Into<String>>(name: S, parameters: Vec<Parameter>, body: Block) -> Self {
        let span = body.span;
        Self {
            name: Identifier::new(name),
            type_parameters: Vec::new(),
            parameters,
            return_type: None,
            body,
            span,
            signature: None,
        }
    }

    pub fn with_type_parameters(mut self, names: &[&str]) -> Self {
        self.type_parameters = names.iter().map(|name| Identifier::new(*name)).collect();
        self
    }

    pub fn returning(mut self, return_type: TypeExpression) -> Self {
        self.return_type = Some(return_type);
        self
    }

    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = span;
        self.name.span = span;
        self
    }

    /// Explicit plus inferred parameters.
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn implicit_count(&self) -> usize {
        self.parameters
            .iter()
            .filter(|parameter| parameter.inferred)
            .count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub declarations: Vec<Declaration>,
    pub span: SourceSpan,
}

impl Block {
    pub fn new(declarations: Vec<Declaration>) -> Self {
        Self {
            declarations,
            span: SourceSpan::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Statement {
    Empty(SourceSpan),
    Block(Block),
    Return(ReturnStatement),
    If(IfStatement),
    While(WhileStatement),
    For(ForStatement),
    Break(SourceSpan),
    Continue(SourceSpan),
    Match(MatchStatement),
    Expression(Expression),
}

impl Statement {
    pub fn span(&self) -> SourceSpan {
        match self {
            Statement::Empty(span) | Statement::Break(span) | Statement::Continue(span) => *span,
            Statement::Block(block) => block.span,
            Statement::Return(statement) => statement.span,
            Statement::If(statement) => statement.span,
            Statement::While(statement) => statement.span,
            Statement::For(statement) => statement.span,
            Statement::Match(statement) => statement.span,
            Statement::Expression(expression) => expression.span,
        }
    }

    pub fn returning(expression: Expression) -> Self {
        let span = expression.span;
        Statement::Return(ReturnStatement {
            expression: Some(expression),
            span,
        })
    }

    pub fn block(declarations: Vec<Declaration>) -> Self {
        Statement::Block(Block::new(declarations))
    }
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub expression: Option<Expression>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct IfStatement {
    pub condition: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Box<Statement>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub enum ForInitializer {
    Expression(Expression),
    Lexical(Box<LexicalDeclaration>),
}

#[derive(Debug, Clone)]
pub struct ForStatement {
    pub initializer: Option<ForInitializer>,
    pub condition: Option<Expression>,
    pub increment: Option<Expression>,
    pub body: Box<Statement>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct MatchStatement {
    pub scrutinee: Expression,
    pub cases: Vec<MatchCase>,
    pub default_case: Option<Box<Statement>>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct MatchCase {
    pub pattern: Pattern,
    pub statement: Statement,
}

#[derive(Debug, Clone)]
pub enum Pattern {
    Identifier(Identifier),
    Underscore(SourceSpan),
    Literal {
        literal: Literal,
        span: SourceSpan,
    },
    Object {
        entries: BTreeMap<String, Pattern>,
        span: SourceSpan,
    },
}

impl Pattern {
    pub fn span(&self) -> SourceSpan {
        match self {
            Pattern::Identifier(identifier) => identifier.span,
            Pattern::Underscore(span) => *span,
            Pattern::Literal { span, .. } | Pattern::Object { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: SourceSpan,
    /// Resolved type, filled in by the type checker.
    pub ty: Option<Type>,
}

#[derive(Debug, Clone)]
pub enum ExpressionKind {
    Identifier(Identifier),
    Literal(Literal),
    Binary(BinaryExpression),
    Parenthesized(Box<Expression>),
    Object(ObjectLiteral),
    Array(Vec<Expression>),
    Tuple(Vec<Expression>),
    Call(CallExpression),
    Subscript(SubscriptExpression),
    Member(MemberExpression),
    Type(TypeExpression),
}

impl Expression {
    pub fn new(kind: ExpressionKind) -> Self {
        Self {
            kind,
            span: SourceSpan::default(),
            ty: None,
        }
    }

    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = span;
        self
    }

    pub fn identifier<S: Into<String>>(name: S) -> Self {
        Self::new(ExpressionKind::Identifier(Identifier::new(name)))
    }

    pub fn number(value: f64) -> Self {
        Self::new(ExpressionKind::Literal(Literal::Number(value)))
    }

    pub fn string<S: Into<String>>(value: S) -> Self {
        Self::new(ExpressionKind::Literal(Literal::String(value.into())))
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(ExpressionKind::Literal(Literal::Boolean(value)))
    }

    pub fn binary(lhs: Expression, operator: BinaryOperator, rhs: Expression) -> Self {
        let span = SourceSpan::union(&lhs.span, &rhs.span);
        Self::new(ExpressionKind::Binary(BinaryExpression {
            lhs: Box::new(lhs),
            operator,
            rhs: Box::new(rhs),
        }))
        .with_span(span)
    }

    pub fn parenthesized(inner: Expression) -> Self {
        let span = inner.span;
        Self::new(ExpressionKind::Parenthesized(Box::new(inner))).with_span(span)
    }

    pub fn object<S: Into<String>>(fields: Vec<(S, Expression)>) -> Self {
        let fields = fields
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();
        Self::new(ExpressionKind::Object(ObjectLiteral { fields }))
    }

    pub fn array(items: Vec<Expression>) -> Self {
        Self::new(ExpressionKind::Array(items))
    }

    pub fn tuple(items: Vec<Expression>) -> Self {
        Self::new(ExpressionKind::Tuple(items))
    }

    pub fn call(callee: Expression, arguments: Vec<Expression>) -> Self {
        let span = callee.span;
        Self::new(ExpressionKind::Call(CallExpression {
            callee: Box::new(callee),
            arguments,
            implicit_arguments: None,
        }))
        .with_span(span)
    }

    pub fn subscript(target: Expression, index: Expression) -> Self {
        let span = SourceSpan::union(&target.span, &index.span);
        Self::new(ExpressionKind::Subscript(SubscriptExpression {
            target: Box::new(target),
            index: Box::new(index),
        }))
        .with_span(span)
    }

    pub fn member<S: Into<String>>(object: Expression, property: S) -> Self {
        let span = object.span;
        Self::new(ExpressionKind::Member(MemberExpression {
            object: Box::new(object),
            property: Identifier::new(property),
        }))
        .with_span(span)
    }

    pub fn type_value(expression: TypeExpression) -> Self {
        Self::new(ExpressionKind::Type(expression))
    }

    /// Non-negative integral numeric literal, as used to index tuples.
    pub fn literal_index(&self) -> Option<u32> {
        match &self.kind {
            ExpressionKind::Literal(Literal::Number(value))
                if *value >= 0.0 && value.fract() == 0.0 && *value <= f64::from(u32::MAX) =>
            {
                Some(*value as u32)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BinaryExpression {
    pub lhs: Box<Expression>,
    pub operator: BinaryOperator,
    pub rhs: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct ObjectLiteral {
    pub fields: BTreeMap<String, Expression>,
}

#[derive(Debug, Clone)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
    /// Types inferred for the callee's implicit parameters. `None` when the
    /// callee was not statically known to be a function.
    pub implicit_arguments: Option<Vec<Type>>,
}

#[derive(Debug, Clone)]
pub struct SubscriptExpression {
    pub target: Box<Expression>,
    pub index: Box<Expression>,
}

#[derive(Debug, Clone)]
pub struct MemberExpression {
    pub object: Box<Expression>,
    pub property: Identifier,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpression {
    Name(Identifier),
    Array(Box<TypeExpression>),
    Tuple(Vec<TypeExpression>),
    Record(BTreeMap<String, TypeExpression>),
    Function {
        parameters: Vec<TypeExpression>,
        return_type: Box<TypeExpression>,
    },
    Union(Box<TypeExpression>, Box<TypeExpression>),
}

impl TypeExpression {
    pub fn name<S: Into<String>>(name: S) -> Self {
        TypeExpression::Name(Identifier::new(name))
    }

    pub fn array(item: TypeExpression) -> Self {
        TypeExpression::Array(Box::new(item))
    }

    pub fn record<S: Into<String>>(fields: Vec<(S, TypeExpression)>) -> Self {
        TypeExpression::Record(
            fields
                .into_iter()
                .map(|(name, ty)| (name.into(), ty))
                .collect(),
        )
    }

    pub fn function(parameters: Vec<TypeExpression>, return_type: TypeExpression) -> Self {
        TypeExpression::Function {
            parameters,
            return_type: Box::new(return_type),
        }
    }

    pub fn union(lhs: TypeExpression, rhs: TypeExpression) -> Self {
        TypeExpression::Union(Box::new(lhs), Box::new(rhs))
    }
}
