mod ast;
mod builtins;
mod compiler;
mod diagnostics;
mod scope;
mod typechecker;
mod types;

pub use crate::ast::{
    BinaryExpression, BinaryOperator, Block, CallExpression, Declaration, Expression,
    ExpressionKind, ForInitializer, ForStatement, FunctionDeclaration, Identifier, IfStatement,
    LexicalDeclaration, Literal, MatchCase, MatchStatement, MemberExpression, ObjectLiteral,
    Parameter, Pattern, Program, ReturnStatement, SourceSpan, Statement, SubscriptExpression,
    TypeExpression, WhileStatement,
};
pub use crate::builtins::{Operator, OPERATORS};
pub use crate::compiler::{Compilation, CompileOptions, Compiler};
pub use crate::diagnostics::{Diagnostic, Diagnostics};
pub use crate::scope::{Scope, UnificationStack};
pub use crate::typechecker::{Check, CheckError, CheckReport, CheckResult, Infer, TypeChecker};
pub use crate::types::{Snapshot, Type, TypeClass, TypeError, TypeTable, TypeVar, VarId};

pub mod runtime;
