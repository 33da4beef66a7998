use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::debug;

use crate::ast::{
    BinaryExpression, BinaryOperator, Block, CallExpression, Declaration, Expression,
    ExpressionKind, ForInitializer, ForStatement, FunctionDeclaration, IfStatement,
    LexicalDeclaration, Literal, MatchStatement, MemberExpression, Pattern, Program,
    ReturnStatement, SourceSpan, Statement, SubscriptExpression, TypeExpression, WhileStatement,
};
use crate::builtins::OPERATORS;
use crate::diagnostics::Diagnostics;
use crate::scope::{Scope, UnificationStack};
use crate::types::{self, Type, TypeError, TypeTable};

#[derive(Debug, Clone, PartialEq)]
pub struct CheckError {
    pub error: TypeError,
    pub span: SourceSpan,
}

impl CheckError {
    pub fn new(error: TypeError, span: SourceSpan) -> Self {
        Self { error, span }
    }
}

pub type CheckResult<T> = Result<T, CheckError>;

pub trait Infer {
    fn infer(&mut self, checker: &mut TypeChecker) -> CheckResult<Type>;

    fn check(&mut self, checker: &mut TypeChecker, expected: &Type) -> CheckResult<()> {
        let found = self.infer(checker)?;
        checker.unify(expected, &found, self.location())
    }

    fn location(&self) -> SourceSpan;
}

pub trait Check {
    fn check(&mut self, checker: &mut TypeChecker, expected: &Type) -> CheckResult<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub rejected: BTreeSet<usize>,
}

impl CheckReport {
    pub fn is_rejected(&self, index: usize) -> bool {
        self.rejected.contains(&index)
    }
}

pub struct TypeChecker {
    table: TypeTable,
    scope: Scope,
    frames: UnificationStack,
    diagnostics: Diagnostics,
    returns: Vec<Type>,
    loop_depth: usize,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        let mut checker = Self {
            table: TypeTable::new(),
            scope: Scope::new(),
            frames: UnificationStack::new(),
            diagnostics: Diagnostics::new(),
            returns: Vec::new(),
            loop_depth: 0,
        };
        checker.declare_builtins();
        checker
    }

    fn declare_builtins(&mut self) {
        self.scope.push();
        self.frames.push();
        for operator in OPERATORS.iter() {
            let any = self.fresh_var("a");
            let signature = operator.signature(&any);
            self.scope.insert(operator.name, signature);
        }
        self.frames.pop(&mut self.table);
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    pub fn table(&mut self) -> &mut TypeTable {
        &mut self.table
    }

    pub fn check_program(&mut self, program: &mut Program) -> CheckReport {
        let mut report = CheckReport::default();
        self.frames.push();
        self.scope.push();
        self.hoist_functions(&program.declarations);

        for (index, declaration) in program.declarations.iter_mut().enumerate() {
            let scope_depth = self.scope.depth();
            let frame_depth = self.frames.depth();
            let return_depth = self.returns.len();
            let loop_depth = self.loop_depth;

            let discard = self.fresh_var("");
            if let Err(error) = declaration.check(self, &discard) {
                debug!("rejecting top-level declaration {index}: {}", error.error);
                self.report(index, error);
                self.unwind(scope_depth, frame_depth, return_depth, loop_depth);
                if let Declaration::Lexical(lexical) = declaration {
                    let placeholder = self.fresh_var(&lexical.name.name);
                    self.scope.insert(&lexical.name.name, placeholder);
                }
                report.rejected.insert(index);
            }
        }

        self.scope.pop();
        self.frames.pop(&mut self.table);

        for (index, declaration) in program.declarations.iter_mut().enumerate() {
            if !report.is_rejected(index) {
                self.resolve_declaration(declaration);
            }
        }
        report
    }

    fn unwind(&mut self, scope_depth: usize, frame_depth: usize, return_depth: usize, loop_depth: usize) {
        while self.frames.depth() > frame_depth {
            self.frames.pop(&mut self.table);
        }
        self.scope.truncate(scope_depth);
        self.returns.truncate(return_depth);
        self.loop_depth = loop_depth;
    }

    fn report(&mut self, declaration: usize, error: CheckError) {
        self.diagnostics
            .reject(declaration, error.error.to_string(), error.span);
    }

    pub fn fresh_var(&mut self, name: &str) -> Type {
        self.frames.new_var(&mut self.table, name, false, false)
    }

    pub fn unify(&mut self, expected: &Type, found: &Type, span: SourceSpan) -> CheckResult<()> {
        self.table
            .unify(expected, found)
            .map_err(|error| CheckError::new(error, span))
    }

    fn lookup(&mut self, name: &str, span: SourceSpan) -> CheckResult<Type> {
        let ty = self
            .scope
            .lookup(name)
            .cloned()
            .ok_or_else(|| CheckError::new(TypeError::UnknownVariable(name.to_string()), span))?;
        Ok(self.frames.instantiate(&mut self.table, &ty))
    }

    fn hoist_functions(&mut self, declarations: &[Declaration]) {
        for declaration in declarations {
            if let Declaration::Function(function) = declaration {
                let placeholder = self.fresh_var(&function.name.name);
                self.scope.insert(&function.name.name, placeholder);
            }
        }
    }

    fn check_lexical(&mut self, lexical: &mut LexicalDeclaration) -> CheckResult<()> {
        let ty = match &lexical.type_annotation {
            Some(annotation) => {
                let ty = self.resolve_type_expression(annotation)?;
                lexical.initializer.check(self, &ty)?;
                ty
            }
            None => lexical.initializer.infer(self)?,
        };
        self.scope.insert(&lexical.name.name, ty);
        Ok(())
    }

    fn check_function(&mut self, function: &mut FunctionDeclaration) -> CheckResult<()> {
        let name = function.name.name.clone();
        self.frames.push();
        self.scope.push();

        for parameter in &function.type_parameters {
            let var = self
                .frames
                .new_var(&mut self.table, &parameter.name, false, true);
            self.scope.insert_type(&parameter.name, var);
        }

        let mut params = Vec::with_capacity(function.parameters.len());
        let mut implicit_count = 0;
        for parameter in &function.parameters {
            let parameter_name = &parameter.name.name;
            if parameter.inferred {
                if implicit_count != params.len() {
                    return Err(CheckError::new(
                        TypeError::Invalid(format!(
                            "Inferred parameter `{parameter_name}` must come before explicit parameters"
                        )),
                        parameter.name.span,
                    ));
                }
                let var = self
                    .frames
                    .new_var(&mut self.table, parameter_name, true, true);
                self.scope.insert_type(parameter_name, var.clone());
                params.push(Type::binding(parameter_name.as_str(), var));
                implicit_count += 1;
            } else {
                let ty = match &parameter.type_annotation {
                    Some(annotation) => self.resolve_type_expression(annotation)?,
                    None => self.fresh_var(parameter_name),
                };
                params.push(ty);
            }
        }

        let return_type = match &function.return_type {
            Some(annotation) => self.resolve_type_expression(annotation)?,
            None => self.fresh_var(""),
        };
        let signature = Type::Function {
            params: params.clone(),
            return_type: Box::new(return_type.clone()),
            implicit_count,
        };

        self.scope.insert(&name, signature.clone());
        for (parameter, ty) in function.parameters.iter().zip(params) {
            let ty = if parameter.inferred { Type::type_type() } else { ty };
            self.scope.insert(&parameter.name.name, ty);
        }

        self.returns.push(return_type.clone());
        let loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        function.body.check(self, &return_type)?;
        self.loop_depth = loop_depth;
        self.returns.pop();

        self.scope.pop();
        let generalized = self.frames.pop(&mut self.table);
        let signature = self.table.resolve_deep(&signature);
        debug!(
            "checked `{name}`: {signature} ({} generalized)",
            generalized.len()
        );

        self.scope.insert(&name, signature.clone());
        function.signature = Some(signature);
        Ok(())
    }

    fn check_return(&mut self, statement: &mut ReturnStatement) -> CheckResult<()> {
        let return_type = self.returns.last().cloned().ok_or_else(|| {
            CheckError::new(
                TypeError::Invalid("`return` outside of a function".to_string()),
                statement.span,
            )
        })?;
        match &mut statement.expression {
            Some(expression) => expression.check(self, &return_type),
            None => self.unify(&return_type, &Type::void(), statement.span),
        }
    }

    fn check_if(&mut self, statement: &mut IfStatement, expected: &Type) -> CheckResult<()> {
        statement.condition.check(self, &Type::bool())?;
        match &mut statement.alternate {
            Some(alternate) => {
                statement.consequent.check(self, expected)?;
                alternate.check(self, expected)
            }
            None => {
                let discard = self.fresh_var("");
                statement.consequent.check(self, &discard)?;
                self.unify(expected, &Type::void(), statement.span)
            }
        }
    }

    fn check_loop_body(&mut self, body: &mut Statement) -> CheckResult<()> {
        self.loop_depth += 1;
        let discard = self.fresh_var("");
        body.check(self, &discard)?;
        self.loop_depth -= 1;
        Ok(())
    }

    fn check_while(&mut self, statement: &mut WhileStatement, expected: &Type) -> CheckResult<()> {
        statement.condition.check(self, &Type::bool())?;
        self.check_loop_body(&mut statement.body)?;
        if never_exits(Some(&statement.condition), &statement.body) {
            return Ok(());
        }
        self.unify(expected, &Type::void(), statement.span)
    }

    fn check_for(&mut self, statement: &mut ForStatement, expected: &Type) -> CheckResult<()> {
        self.scope.push();
        match &mut statement.initializer {
            Some(ForInitializer::Expression(expression)) => {
                expression.infer(self)?;
            }
            Some(ForInitializer::Lexical(lexical)) => self.check_lexical(lexical)?,
            None => {}
        }
        if let Some(condition) = &mut statement.condition {
            condition.check(self, &Type::bool())?;
        }
        if let Some(increment) = &mut statement.increment {
            increment.infer(self)?;
        }
        self.check_loop_body(&mut statement.body)?;
        self.scope.pop();
        if never_exits(statement.condition.as_ref(), &statement.body) {
            return Ok(());
        }
        self.unify(expected, &Type::void(), statement.span)
    }

    fn check_jump(&mut self, keyword: &str, span: SourceSpan) -> CheckResult<()> {
        if self.loop_depth == 0 {
            return Err(CheckError::new(
                TypeError::Invalid(format!("`{keyword}` outside of a loop")),
                span,
            ));
        }
        Ok(())
    }

    fn check_match(&mut self, statement: &mut MatchStatement, expected: &Type) -> CheckResult<()> {
        let scrutinee = statement.scrutinee.infer(self)?;
        for case in &mut statement.cases {
            self.scope.push();
            self.bind_pattern(&case.pattern, &scrutinee)?;
            case.statement.check(self, expected)?;
            self.scope.pop();
        }
        match &mut statement.default_case {
            Some(default_case) => default_case.check(self, expected),
            None => Ok(()),
        }
    }

    fn bind_pattern(&mut self, pattern: &Pattern, ty: &Type) -> CheckResult<()> {
        match pattern {
            Pattern::Identifier(identifier) => {
                self.scope.insert(&identifier.name, ty.clone());
                Ok(())
            }
            Pattern::Underscore(_) => Ok(()),
            Pattern::Literal { literal, span } => self.unify(ty, &literal_type(literal), *span),
            Pattern::Object { entries, span } => match self.table.resolve(ty) {
                Type::Record(fields) => {
                    for (name, subpattern) in entries {
                        let Some(field_type) = fields.get(name).cloned() else {
                            let ty = self.table.resolve_deep(ty);
                            return Err(CheckError::new(
                                TypeError::MissingField {
                                    field: name.clone(),
                                    ty,
                                },
                                *span,
                            ));
                        };
                        self.bind_pattern(subpattern, &field_type)?;
                    }
                    Ok(())
                }
                Type::Var(_) | Type::Union(..) => {
                    for (name, subpattern) in entries {
                        let field_type = self.fresh_var(name);
                        self.bind_pattern(subpattern, &field_type)?;
                    }
                    Ok(())
                }
                other => {
                    let ty = self.table.resolve_deep(&other);
                    Err(CheckError::new(
                        TypeError::Invalid(format!(
                            "Object pattern cannot match a value of type `{ty}`"
                        )),
                        *span,
                    ))
                }
            },
        }
    }

    fn infer_array(&mut self, items: &mut [Expression]) -> CheckResult<Type> {
        let item = match items.split_first_mut() {
            None => self.fresh_var(""),
            Some((first, rest)) => {
                let item = first.infer(self)?;
                for value in rest {
                    value.check(self, &item)?;
                }
                item
            }
        };
        Ok(Type::array(item))
    }

    fn infer_binary(&mut self, binary: &mut BinaryExpression, span: SourceSpan) -> CheckResult<Type> {
        match binary.operator {
            BinaryOperator::And | BinaryOperator::Or => {
                binary.lhs.check(self, &Type::bool())?;
                binary.rhs.check(self, &Type::bool())?;
                Ok(Type::bool())
            }
            BinaryOperator::Equal => {
                let lhs = binary.lhs.infer(self)?;
                binary.rhs.check(self, &lhs)?;
                Ok(Type::bool())
            }
            operator => {
                let callee = self.lookup(operator.symbol(), span)?;
                match self.table.resolve(&callee) {
                    Type::Function {
                        params,
                        return_type,
                        ..
                    } if params.len() == 2 => {
                        binary.lhs.check(self, &params[0])?;
                        binary.rhs.check(self, &params[1])?;
                        Ok(*return_type)
                    }
                    other => Err(CheckError::new(
                        TypeError::Invalid(format!(
                            "Operator `{}` is bound to `{other}`",
                            operator.symbol()
                        )),
                        span,
                    )),
                }
            }
        }
    }

    fn infer_call(&mut self, call: &mut CallExpression, span: SourceSpan) -> CheckResult<Type> {
        let callee = call.callee.infer(self)?;
        match self.table.resolve(&callee) {
            Type::Function {
                params,
                return_type,
                implicit_count,
            } => {
                let explicit = params.len().saturating_sub(implicit_count);
                if call.arguments.len() != explicit {
                    return Err(CheckError::new(
                        TypeError::ArityMismatch {
                            expected: explicit,
                            found: call.arguments.len(),
                        },
                        span,
                    ));
                }
                let (params, return_type, implicit) =
                    self.instantiate_implicit(&params, &return_type, implicit_count, span)?;
                for (argument, parameter) in call
                    .arguments
                    .iter_mut()
                    .zip(params.iter().skip(implicit_count))
                {
                    argument.check(self, parameter)?;
                }
                call.implicit_arguments = Some(implicit);
                Ok(return_type)
            }
            Type::Var(_) => {
                for argument in &mut call.arguments {
                    argument.infer(self)?;
                }
                call.implicit_arguments = None;
                Ok(self.fresh_var(""))
            }
            other => {
                let ty = self.table.resolve_deep(&other);
                Err(CheckError::new(
                    TypeError::Invalid(format!("Value of type `{ty}` is not callable")),
                    span,
                ))
            }
        }
    }

    fn instantiate_implicit(
        &mut self,
        params: &[Type],
        return_type: &Type,
        implicit_count: usize,
        span: SourceSpan,
    ) -> CheckResult<(Vec<Type>, Type, Vec<Type>)> {
        if implicit_count == 0 {
            return Ok((params.to_vec(), return_type.clone(), Vec::new()));
        }

        let mut mapping = HashMap::new();
        let mut implicit = Vec::with_capacity(implicit_count);
        for slot in params.iter().take(implicit_count) {
            let (name, inner) = match slot {
                Type::Binding(name, inner) => (name.clone(), self.table.resolve(inner)),
                other => (String::new(), self.table.resolve(other)),
            };
            let var = self.frames.new_var(&mut self.table, &name, true, false);
            match inner {
                Type::Var(original) => {
                    mapping.insert(original.id, var.clone());
                }
                concrete => self.unify(&var, &concrete, span)?,
            }
            implicit.push(var);
        }

        let params = params
            .iter()
            .map(|param| self.table.substitute(param, &mapping))
            .collect();
        let return_type = self.table.substitute(return_type, &mapping);
        Ok((params, return_type, implicit))
    }

    fn infer_member(&mut self, member: &mut MemberExpression, span: SourceSpan) -> CheckResult<Type> {
        let object = member.object.infer(self)?;
        let field = &member.property.name;
        match self.table.resolve(&object) {
            Type::Record(fields) => match fields.get(field) {
                Some(ty) => Ok(ty.clone()),
                None => Err(CheckError::new(
                    TypeError::MissingField {
                        field: field.clone(),
                        ty: self.table.resolve_deep(&object),
                    },
                    span,
                )),
            },
            Type::Var(_) | Type::Union(..) => Ok(self.fresh_var(field)),
            other => Err(CheckError::new(
                TypeError::MissingField {
                    field: field.clone(),
                    ty: self.table.resolve_deep(&other),
                },
                span,
            )),
        }
    }

    fn infer_subscript(
        &mut self,
        subscript: &mut SubscriptExpression,
        span: SourceSpan,
    ) -> CheckResult<Type> {
        let target = subscript.target.infer(self)?;
        match self.table.resolve(&target) {
            Type::Array(item) => {
                subscript.index.check(self, &Type::number())?;
                Ok(*item)
            }
            Type::Tuple(items) => {
                let ty = self.table.resolve_deep(&target);
                let index = subscript.index.literal_index().ok_or_else(|| {
                    CheckError::new(
                        TypeError::Invalid(format!(
                            "Tuple `{ty}` must be indexed by a numeric literal"
                        )),
                        span,
                    )
                })?;
                let item = items.get(index as usize).cloned().ok_or_else(|| {
                    CheckError::new(
                        TypeError::Invalid(format!("Index {index} is out of range for `{ty}`")),
                        span,
                    )
                })?;
                subscript.index.infer(self)?;
                Ok(item)
            }
            Type::Var(_) => {
                subscript.index.infer(self)?;
                Ok(self.fresh_var(""))
            }
            other => {
                let item = self.fresh_var("");
                let found = self.table.resolve_deep(&other);
                Err(CheckError::new(
                    TypeError::Mismatch {
                        expected: Type::array(item),
                        found,
                    },
                    span,
                ))
            }
        }
    }

    pub fn resolve_type_expression(&mut self, expression: &TypeExpression) -> CheckResult<Type> {
        match expression {
            TypeExpression::Name(identifier) => {
                if let Some(ty) = self.scope.lookup_type(&identifier.name) {
                    return Ok(ty.clone());
                }
                if types::is_builtin(&identifier.name) {
                    Ok(Type::Name(identifier.name.clone()))
                } else {
                    Err(CheckError::new(
                        TypeError::UnknownType(identifier.name.clone()),
                        identifier.span,
                    ))
                }
            }
            TypeExpression::Array(item) => Ok(Type::array(self.resolve_type_expression(item)?)),
            TypeExpression::Tuple(items) => Ok(Type::Tuple(
                items
                    .iter()
                    .map(|item| self.resolve_type_expression(item))
                    .collect::<CheckResult<Vec<_>>>()?,
            )),
            TypeExpression::Record(fields) => {
                let mut resolved = BTreeMap::new();
                for (name, ty) in fields {
                    resolved.insert(name.clone(), self.resolve_type_expression(ty)?);
                }
                Ok(Type::Record(resolved))
            }
            TypeExpression::Function {
                parameters,
                return_type,
            } => {
                let params = parameters
                    .iter()
                    .map(|param| self.resolve_type_expression(param))
                    .collect::<CheckResult<Vec<_>>>()?;
                let return_type = self.resolve_type_expression(return_type)?;
                Ok(Type::function(params, return_type))
            }
            TypeExpression::Union(lhs, rhs) => {
                let lhs = self.resolve_type_expression(lhs)?;
                let rhs = self.resolve_type_expression(rhs)?;
                Ok(Type::union(lhs, rhs))
            }
        }
    }

    fn check_type_value(&mut self, expression: &TypeExpression, span: SourceSpan) -> CheckResult<()> {
        self.resolve_type_expression(expression)?;
        let mut names = Vec::new();
        collect_type_names(expression, &mut names);
        for name in names {
            if let Some(Type::Var(var)) = self.scope.lookup_type(name) {
                if !var.inferred {
                    return Err(CheckError::new(
                        TypeError::Invalid(format!(
                            "Type parameter `{name}` is not available at run time"
                        )),
                        span,
                    ));
                }
            }
        }
        Ok(())
    }

    fn resolve_declaration(&mut self, declaration: &mut Declaration) {
        match declaration {
            Declaration::Lexical(lexical) => self.resolve_expression(&mut lexical.initializer),
            Declaration::Function(function) => {
                if let Some(signature) = function.signature.take() {
                    function.signature = Some(self.table.resolve_deep(&signature));
                }
                for declaration in &mut function.body.declarations {
                    self.resolve_declaration(declaration);
                }
            }
            Declaration::Statement(statement) => self.resolve_statement(statement),
        }
    }

    fn resolve_statement(&mut self, statement: &mut Statement) {
        match statement {
            Statement::Empty(_) | Statement::Break(_) | Statement::Continue(_) => {}
            Statement::Block(block) => {
                for declaration in &mut block.declarations {
                    self.resolve_declaration(declaration);
                }
            }
            Statement::Return(statement) => {
                if let Some(expression) = &mut statement.expression {
                    self.resolve_expression(expression);
                }
            }
            Statement::If(statement) => {
                self.resolve_expression(&mut statement.condition);
                self.resolve_statement(&mut statement.consequent);
                if let Some(alternate) = &mut statement.alternate {
                    self.resolve_statement(alternate);
                }
            }
            Statement::While(statement) => {
                self.resolve_expression(&mut statement.condition);
                self.resolve_statement(&mut statement.body);
            }
            Statement::For(statement) => {
                match &mut statement.initializer {
                    Some(ForInitializer::Expression(expression)) => {
                        self.resolve_expression(expression)
                    }
                    Some(ForInitializer::Lexical(lexical)) => {
                        self.resolve_expression(&mut lexical.initializer)
                    }
                    None => {}
                }
                if let Some(condition) = &mut statement.condition {
                    self.resolve_expression(condition);
                }
                if let Some(increment) = &mut statement.increment {
                    self.resolve_expression(increment);
                }
                self.resolve_statement(&mut statement.body);
            }
            Statement::Match(statement) => {
                self.resolve_expression(&mut statement.scrutinee);
                for case in &mut statement.cases {
                    self.resolve_statement(&mut case.statement);
                }
                if let Some(default_case) = &mut statement.default_case {
                    self.resolve_statement(default_case);
                }
            }
            Statement::Expression(expression) => self.resolve_expression(expression),
        }
    }

    fn resolve_expression(&mut self, expression: &mut Expression) {
        if let Some(ty) = expression.ty.take() {
            expression.ty = Some(self.table.resolve_deep(&ty));
        }
        match &mut expression.kind {
            ExpressionKind::Identifier(_)
            | ExpressionKind::Literal(_)
            | ExpressionKind::Type(_) => {}
            ExpressionKind::Binary(binary) => {
                self.resolve_expression(&mut binary.lhs);
                self.resolve_expression(&mut binary.rhs);
            }
            ExpressionKind::Parenthesized(inner) => self.resolve_expression(inner),
            ExpressionKind::Object(object) => {
                for value in object.fields.values_mut() {
                    self.resolve_expression(value);
                }
            }
            ExpressionKind::Array(items) | ExpressionKind::Tuple(items) => {
                for item in items {
                    self.resolve_expression(item);
                }
            }
            ExpressionKind::Call(call) => {
                self.resolve_expression(&mut call.callee);
                for argument in &mut call.arguments {
                    self.resolve_expression(argument);
                }
                if let Some(implicit) = &mut call.implicit_arguments {
                    for ty in implicit.iter_mut() {
                        *ty = self.table.resolve_deep(ty);
                    }
                }
            }
            ExpressionKind::Subscript(subscript) => {
                self.resolve_expression(&mut subscript.target);
                self.resolve_expression(&mut subscript.index);
            }
            ExpressionKind::Member(member) => self.resolve_expression(&mut member.object),
        }
    }
}

fn literal_type(literal: &Literal) -> Type {
    match literal {
        Literal::Number(_) => Type::number(),
        Literal::String(_) => Type::string(),
        Literal::Boolean(_) => Type::bool(),
    }
}

fn collect_type_names<'a>(expression: &'a TypeExpression, names: &mut Vec<&'a str>) {
    match expression {
        TypeExpression::Name(identifier) => names.push(&identifier.name),
        TypeExpression::Array(item) => collect_type_names(item, names),
        TypeExpression::Tuple(items) => {
            for item in items {
                collect_type_names(item, names);
            }
        }
        TypeExpression::Record(fields) => {
            for ty in fields.values() {
                collect_type_names(ty, names);
            }
        }
        TypeExpression::Function {
            parameters,
            return_type,
        } => {
            for parameter in parameters {
                collect_type_names(parameter, names);
            }
            collect_type_names(return_type, names);
        }
        TypeExpression::Union(lhs, rhs) => {
            collect_type_names(lhs, names);
            collect_type_names(rhs, names);
        }
    }
}

impl Infer for Expression {
    fn infer(&mut self, checker: &mut TypeChecker) -> CheckResult<Type> {
        let span = self.span;
        let ty = match &mut self.kind {
            ExpressionKind::Identifier(identifier) => checker.lookup(&identifier.name, span)?,
            ExpressionKind::Literal(literal) => literal_type(literal),
            ExpressionKind::Binary(binary) => checker.infer_binary(binary, span)?,
            ExpressionKind::Parenthesized(inner) => inner.infer(checker)?,
            ExpressionKind::Object(object) => {
                let mut fields = BTreeMap::new();
                for (name, value) in object.fields.iter_mut() {
                    fields.insert(name.clone(), value.infer(checker)?);
                }
                Type::Record(fields)
            }
            ExpressionKind::Array(items) => checker.infer_array(items)?,
            ExpressionKind::Tuple(items) => Type::Tuple(
                items
                    .iter_mut()
                    .map(|item| item.infer(checker))
                    .collect::<CheckResult<Vec<_>>>()?,
            ),
            ExpressionKind::Call(call) => checker.infer_call(call, span)?,
            ExpressionKind::Subscript(subscript) => checker.infer_subscript(subscript, span)?,
            ExpressionKind::Member(member) => checker.infer_member(member, span)?,
            ExpressionKind::Type(expression) => {
                checker.check_type_value(expression, span)?;
                Type::type_type()
            }
        };
        self.ty = Some(ty.clone());
        Ok(ty)
    }

    fn check(&mut self, checker: &mut TypeChecker, expected: &Type) -> CheckResult<()> {
        let resolved = checker.table.resolve(expected);
        if !pushes_down(&self.kind, &resolved) {
            let found = self.infer(checker)?;
            return checker.unify(expected, &found, self.span);
        }

        match (&mut self.kind, &resolved) {
            (ExpressionKind::Parenthesized(inner), _) => inner.check(checker, expected)?,
            (ExpressionKind::Array(items), Type::Array(item)) => {
                for value in items.iter_mut() {
                    value.check(checker, item)?;
                }
            }
            (ExpressionKind::Tuple(items), Type::Tuple(types)) => {
                for (value, ty) in items.iter_mut().zip(types.iter()) {
                    value.check(checker, ty)?;
                }
            }
            (ExpressionKind::Object(object), Type::Record(fields)) => {
                for (name, value) in object.fields.iter_mut() {
                    if let Some(ty) = fields.get(name) {
                        value.check(checker, ty)?;
                    }
                }
            }
            _ => {}
        }
        self.ty = Some(expected.clone());
        Ok(())
    }

    fn location(&self) -> SourceSpan {
        self.span
    }
}

// A loop with no condition, or a literal `true` one, only ends through
// `break`; without one it has no completion value to constrain.
fn never_exits(condition: Option<&Expression>, body: &Statement) -> bool {
    let unconditional = match condition {
        None => true,
        Some(condition) => matches!(
            condition.kind,
            ExpressionKind::Literal(Literal::Boolean(true))
        ),
    };
    unconditional && !breaks_out(body)
}

fn breaks_out(statement: &Statement) -> bool {
    match statement {
        Statement::Break(_) => true,
        Statement::Block(block) => block.declarations.iter().any(|declaration| {
            matches!(declaration, Declaration::Statement(statement) if breaks_out(statement))
        }),
        Statement::If(statement) => {
            breaks_out(&statement.consequent)
                || statement.alternate.as_deref().map_or(false, breaks_out)
        }
        Statement::Match(statement) => {
            statement.cases.iter().any(|case| breaks_out(&case.statement))
                || statement.default_case.as_deref().map_or(false, breaks_out)
        }
        Statement::While(_)
        | Statement::For(_)
        | Statement::Empty(_)
        | Statement::Return(_)
        | Statement::Continue(_)
        | Statement::Expression(_) => false,
    }
}

// Whether checking `kind` against `expected` can push the expected type
// into the children instead of synthesizing and unifying.
fn pushes_down(kind: &ExpressionKind, expected: &Type) -> bool {
    match (kind, expected) {
        (ExpressionKind::Parenthesized(_), _) => true,
        (ExpressionKind::Array(_), Type::Array(_)) => true,
        (ExpressionKind::Tuple(items), Type::Tuple(types)) => items.len() == types.len(),
        (ExpressionKind::Object(object), Type::Record(fields)) => {
            object.fields.keys().eq(fields.keys())
        }
        _ => false,
    }
}

impl Check for Statement {
    fn check(&mut self, checker: &mut TypeChecker, expected: &Type) -> CheckResult<()> {
        match self {
            Statement::Empty(span) => checker.unify(expected, &Type::void(), *span),
            Statement::Block(block) => block.check(checker, expected),
            Statement::Return(statement) => checker.check_return(statement),
            Statement::If(statement) => checker.check_if(statement, expected),
            Statement::While(statement) => checker.check_while(statement, expected),
            Statement::For(statement) => checker.check_for(statement, expected),
            Statement::Break(span) => checker.check_jump("break", *span),
            Statement::Continue(span) => checker.check_jump("continue", *span),
            Statement::Match(statement) => checker.check_match(statement, expected),
            Statement::Expression(expression) => expression.check(checker, expected),
        }
    }
}

impl Check for Declaration {
    fn check(&mut self, checker: &mut TypeChecker, expected: &Type) -> CheckResult<()> {
        match self {
            Declaration::Lexical(lexical) => {
                checker.check_lexical(lexical)?;
                checker.unify(expected, &Type::void(), lexical.span)
            }
            Declaration::Function(function) => {
                checker.check_function(function)?;
                checker.unify(expected, &Type::void(), function.span)
            }
            Declaration::Statement(statement) => statement.check(checker, expected),
        }
    }
}

impl Check for Block {
    fn check(&mut self, checker: &mut TypeChecker, expected: &Type) -> CheckResult<()> {
        checker.scope.push();
        checker.hoist_functions(&self.declarations);
        if self.declarations.is_empty() {
            checker.unify(expected, &Type::void(), self.span)?;
        }
        let last = self.declarations.len().saturating_sub(1);
        for (index, declaration) in self.declarations.iter_mut().enumerate() {
            if index == last {
                declaration.check(checker, expected)?;
            } else {
                let discard = checker.fresh_var("");
                declaration.check(checker, &discard)?;
            }
        }
        checker.scope.pop();
        Ok(())
    }
}
