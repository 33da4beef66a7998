use std::collections::HashMap;

use anyhow::{anyhow, bail, Result};
use log::debug;

use super::bytecode::{BytecodeBlock, CellKind, Constant, Instruction, Register, UNPATCHED};
use crate::ast::{
    BinaryExpression, BinaryOperator, Block, CallExpression, Declaration, Expression,
    ExpressionKind, ForInitializer, ForStatement, FunctionDeclaration, IfStatement,
    LexicalDeclaration, Literal, MatchStatement, MemberExpression, Pattern, Program, Statement,
    SubscriptExpression, TypeExpression, WhileStatement,
};
use crate::typechecker::CheckReport;
use crate::types::{self, Type, TypeClass, VarId};

#[derive(Debug, Clone)]
pub struct CodeGenerator {
    runtime_checks: bool,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            runtime_checks: true,
        }
    }

    pub fn with_runtime_checks(mut self, enabled: bool) -> Self {
        self.runtime_checks = enabled;
        self
    }

    pub fn generate_program(&self, program: &Program, report: &CheckReport) -> Result<BytecodeBlock> {
        let mut builder = BlockBuilder::new("<program>", 0, self.runtime_checks);
        let result = builder.allocate()?;
        let accepted = program
            .declarations
            .iter()
            .enumerate()
            .filter(|(index, _)| !report.is_rejected(*index))
            .map(|(_, declaration)| declaration)
            .collect::<Vec<_>>();
        builder.compile_declarations(&accepted, result)?;
        builder.emit(Instruction::End { value: result });
        Ok(builder.finish())
    }
}

#[derive(Debug, Default)]
struct Label {
    target: Option<usize>,
    pending: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
struct LabelId(usize);

#[derive(Debug, Clone, Copy)]
struct LoopContext {
    break_label: LabelId,
    continue_label: LabelId,
    scope_depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeMode {
    Signature,
    Value,
}

struct BlockBuilder {
    block: BytecodeBlock,
    labels: Vec<Label>,
    next_register: u16,
    register_count: u32,
    loops: Vec<LoopContext>,
    scope_depth: usize,
    implicit_parameters: HashMap<VarId, String>,
    type_registers: HashMap<VarId, Register>,
    runtime_checks: bool,
}

impl BlockBuilder {
    fn new(name: &str, parameter_count: u32, runtime_checks: bool) -> Self {
        Self {
            block: BytecodeBlock::new(name, parameter_count),
            labels: Vec::new(),
            next_register: parameter_count as u16,
            register_count: parameter_count,
            loops: Vec::new(),
            scope_depth: 0,
            implicit_parameters: HashMap::new(),
            type_registers: HashMap::new(),
            runtime_checks,
        }
    }

    fn finish(mut self) -> BytecodeBlock {
        for label in &self.labels {
            assert!(
                label.pending.is_empty(),
                "unbound label with {} pending jump(s) in `{}`",
                label.pending.len(),
                self.block.name
            );
        }
        self.block.register_count = self.register_count;
        debug!(
            "generated `{}`: {} instruction(s), {} register(s), {} constant(s)",
            self.block.name,
            self.block.len(),
            self.block.register_count,
            self.block.constants.len()
        );
        self.block
    }

    fn allocate(&mut self) -> Result<Register> {
        self.allocate_range(1)
    }

    fn allocate_range(&mut self, count: usize) -> Result<Register> {
        let first = self.next_register;
        let end = first as usize + count;
        if end > u16::MAX as usize {
            bail!("register file exhausted in `{}`", self.block.name);
        }
        self.next_register = end as u16;
        self.register_count = self.register_count.max(end as u32);
        Ok(Register(first))
    }

    fn mark(&self) -> u16 {
        self.next_register
    }

    fn release(&mut self, mark: u16) {
        self.next_register = mark;
    }

    fn emit(&mut self, instruction: Instruction) -> usize {
        self.block.emit(instruction)
    }

    fn identifier(&mut self, name: &str) -> u32 {
        self.block.add_identifier(name)
    }

    fn string_constant(&mut self, value: &str) -> u32 {
        self.block.add_constant(Constant::String(value.to_string()))
    }

    fn load_unit(&mut self, dst: Register) -> Result<()> {
        let constant = self.block.add_constant(Constant::Unit);
        self.emit(Instruction::LoadConstant { dst, constant });
        Ok(())
    }

    fn push_scope(&mut self) {
        self.emit(Instruction::PushScope);
        self.scope_depth += 1;
    }

    fn pop_scope(&mut self) {
        self.emit(Instruction::PopScope);
        self.scope_depth -= 1;
    }

    fn new_label(&mut self) -> LabelId {
        self.labels.push(Label::default());
        LabelId(self.labels.len() - 1)
    }

    fn bind(&mut self, label: LabelId) -> Result<()> {
        let position = self.block.len();
        let pending = std::mem::take(&mut self.labels[label.0].pending);
        for site in pending {
            self.patch(site, position)?;
        }
        self.labels[label.0].target = Some(position);
        Ok(())
    }

    fn patch(&mut self, site: usize, target: usize) -> Result<()> {
        let patched = self
            .block
            .instructions
            .get_mut(site)
            .map(|instruction| instruction.set_jump_target(target as i32))
            .unwrap_or(false);
        if !patched {
            bail!("invalid jump patch location {site} in `{}`", self.block.name);
        }
        Ok(())
    }

    fn emit_jump(&mut self, instruction: Instruction, label: LabelId) -> Result<()> {
        let site = self.emit(instruction);
        match self.labels[label.0].target {
            Some(target) => self.patch(site, target),
            None => {
                self.labels[label.0].pending.push(site);
                Ok(())
            }
        }
    }

    fn jump(&mut self, label: LabelId) -> Result<()> {
        self.emit_jump(Instruction::Jump { target: UNPATCHED }, label)
    }

    fn jump_if_false(&mut self, condition: Register, label: LabelId) -> Result<()> {
        self.emit_jump(
            Instruction::JumpIfFalse {
                condition,
                target: UNPATCHED,
            },
            label,
        )
    }

    fn compile_declarations(&mut self, declarations: &[&Declaration], dst: Register) -> Result<()> {
        for declaration in declarations {
            if let Declaration::Function(function) = declaration {
                self.declare_function(function)?;
            }
        }
        if declarations.is_empty() {
            return self.load_unit(dst);
        }
        for declaration in declarations {
            let mark = self.mark();
            self.compile_declaration(declaration, dst)?;
            self.release(mark);
        }
        Ok(())
    }

    fn compile_declaration(&mut self, declaration: &Declaration, dst: Register) -> Result<()> {
        match declaration {
            Declaration::Lexical(lexical) => self.compile_lexical(lexical, dst),
            Declaration::Function(_) => self.load_unit(dst),
            Declaration::Statement(statement) => self.compile_statement(statement, dst),
        }
    }

    fn declare_function(&mut self, function: &FunctionDeclaration) -> Result<()> {
        let block = compile_function(function, self.runtime_checks)?;
        let index = self.block.add_function(block);
        let mark = self.mark();
        let register = self.allocate()?;
        self.emit(Instruction::NewFunction {
            dst: register,
            function: index,
        });
        let identifier = self.identifier(&function.name.name);
        self.emit(Instruction::SetLocal {
            identifier,
            src: register,
        });
        self.release(mark);
        Ok(())
    }

    fn compile_lexical(&mut self, lexical: &LexicalDeclaration, dst: Register) -> Result<()> {
        self.compile_expression(&lexical.initializer, dst)?;
        if self.runtime_checks
            && lexical.type_annotation.is_some()
            && may_be_hole(&lexical.initializer)
        {
            if let Some(ty) = &lexical.initializer.ty {
                self.emit_runtime_check(dst, ty)?;
            }
        }
        let identifier = self.identifier(&lexical.name.name);
        self.emit(Instruction::SetLocal {
            identifier,
            src: dst,
        });
        self.load_unit(dst)
    }

    fn emit_runtime_check(&mut self, value: Register, ty: &Type) -> Result<()> {
        if !self.bakeable(ty) {
            return Ok(());
        }
        let mark = self.mark();
        let class = ty.class();
        let checks_class = !matches!(class, TypeClass::Union | TypeClass::Var);
        let fail = self.new_label();
        let done = self.new_label();

        if checks_class {
            let matches = self.allocate()?;
            self.emit(Instruction::CheckTypeOf {
                dst: matches,
                value,
                expected: class,
            });
            self.jump_if_false(matches, fail)?;
        }
        let found = self.allocate()?;
        self.emit(Instruction::GetTypeForValue { dst: found, value });
        let expected = self.allocate()?;
        self.emit_type(ty, expected, TypeMode::Value)?;
        self.emit(Instruction::Unify {
            lhs: expected,
            rhs: found,
        });

        if checks_class {
            self.jump(done)?;
            self.bind(fail)?;
            let message = self.string_constant(&format!("Runtime type check failed: expected `{ty}`"));
            self.emit(Instruction::TypeError { message });
        }
        self.bind(done)?;
        self.release(mark);
        Ok(())
    }

    fn compile_block(&mut self, block: &Block, dst: Register) -> Result<()> {
        self.push_scope();
        let declarations = block.declarations.iter().collect::<Vec<_>>();
        self.compile_declarations(&declarations, dst)?;
        self.pop_scope();
        Ok(())
    }

    fn compile_statement(&mut self, statement: &Statement, dst: Register) -> Result<()> {
        match statement {
            Statement::Empty(_) => self.load_unit(dst),
            Statement::Block(block) => self.compile_block(block, dst),
            Statement::Return(statement) => {
                let value = self.allocate()?;
                match &statement.expression {
                    Some(expression) => self.compile_expression(expression, value)?,
                    None => self.load_unit(value)?,
                }
                self.emit(Instruction::End { value });
                Ok(())
            }
            Statement::If(statement) => self.compile_if(statement, dst),
            Statement::While(statement) => self.compile_while(statement, dst),
            Statement::For(statement) => self.compile_for(statement, dst),
            Statement::Break(_) => self.compile_loop_jump(true),
            Statement::Continue(_) => self.compile_loop_jump(false),
            Statement::Match(statement) => self.compile_match(statement, dst),
            Statement::Expression(expression) => self.compile_expression(expression, dst),
        }
    }

    fn compile_if(&mut self, statement: &IfStatement, dst: Register) -> Result<()> {
        let condition = self.allocate()?;
        self.compile_expression(&statement.condition, condition)?;
        let otherwise = self.new_label();
        let end = self.new_label();
        self.jump_if_false(condition, otherwise)?;
        self.compile_statement(&statement.consequent, dst)?;
        self.jump(end)?;
        self.bind(otherwise)?;
        match &statement.alternate {
            Some(alternate) => self.compile_statement(alternate, dst)?,
            None => self.load_unit(dst)?,
        }
        self.bind(end)
    }

    fn compile_while(&mut self, statement: &WhileStatement, dst: Register) -> Result<()> {
        let start = self.new_label();
        let exit = self.new_label();
        self.bind(start)?;
        let condition = self.allocate()?;
        self.compile_expression(&statement.condition, condition)?;
        self.jump_if_false(condition, exit)?;
        self.compile_loop_body(&statement.body, exit, start)?;
        self.jump(start)?;
        self.bind(exit)?;
        self.load_unit(dst)
    }

    fn compile_for(&mut self, statement: &ForStatement, dst: Register) -> Result<()> {
        self.push_scope();
        let scratch = self.allocate()?;
        match &statement.initializer {
            Some(ForInitializer::Expression(expression)) => {
                self.compile_expression(expression, scratch)?
            }
            Some(ForInitializer::Lexical(lexical)) => self.compile_lexical(lexical, scratch)?,
            None => {}
        }

        let start = self.new_label();
        let next = self.new_label();
        let exit = self.new_label();
        self.bind(start)?;
        if let Some(condition) = &statement.condition {
            self.compile_expression(condition, scratch)?;
            self.jump_if_false(scratch, exit)?;
        }
        self.compile_loop_body(&statement.body, exit, next)?;
        self.bind(next)?;
        if let Some(increment) = &statement.increment {
            self.compile_expression(increment, scratch)?;
        }
        self.jump(start)?;
        self.bind(exit)?;
        self.pop_scope();
        self.load_unit(dst)
    }

    fn compile_loop_body(
        &mut self,
        body: &Statement,
        break_label: LabelId,
        continue_label: LabelId,
    ) -> Result<()> {
        self.loops.push(LoopContext {
            break_label,
            continue_label,
            scope_depth: self.scope_depth,
        });
        let mark = self.mark();
        let scratch = self.allocate()?;
        self.compile_statement(body, scratch)?;
        self.release(mark);
        self.loops.pop();
        Ok(())
    }

    fn compile_loop_jump(&mut self, is_break: bool) -> Result<()> {
        let context = *self
            .loops
            .last()
            .ok_or_else(|| anyhow!("loop jump outside of a loop in `{}`", self.block.name))?;
        for _ in context.scope_depth..self.scope_depth {
            self.emit(Instruction::PopScope);
        }
        let label = if is_break {
            context.break_label
        } else {
            context.continue_label
        };
        self.jump(label)
    }

    fn compile_match(&mut self, statement: &MatchStatement, dst: Register) -> Result<()> {
        let scrutinee = self.allocate()?;
        self.compile_expression(&statement.scrutinee, scrutinee)?;
        let end = self.new_label();

        for case in &statement.cases {
            let mark = self.mark();
            let failed = self.new_label();
            self.push_scope();
            self.compile_pattern(&case.pattern, scrutinee, failed)?;
            self.compile_statement(&case.statement, dst)?;
            self.pop_scope();
            self.jump(end)?;
            self.bind(failed)?;
            self.emit(Instruction::PopScope);
            self.release(mark);
        }

        match &statement.default_case {
            Some(default_case) => self.compile_statement(default_case, dst)?,
            None => {
                let message = self.string_constant("All patterns failed to match");
                self.emit(Instruction::RuntimeError { message });
            }
        }
        self.bind(end)
    }

    fn compile_pattern(&mut self, pattern: &Pattern, value: Register, failed: LabelId) -> Result<()> {
        match pattern {
            Pattern::Identifier(identifier) => {
                let identifier = self.identifier(&identifier.name);
                self.emit(Instruction::SetLocal {
                    identifier,
                    src: value,
                });
                Ok(())
            }
            Pattern::Underscore(_) => Ok(()),
            Pattern::Literal { literal, .. } => {
                let expected = self.allocate()?;
                let constant = self.block.add_constant(literal_constant(literal));
                self.emit(Instruction::LoadConstant {
                    dst: expected,
                    constant,
                });
                let matches = self.allocate()?;
                self.emit(Instruction::IsEqual {
                    dst: matches,
                    lhs: value,
                    rhs: expected,
                });
                self.jump_if_false(matches, failed)
            }
            Pattern::Object { entries, .. } => {
                let is_object = self.allocate()?;
                self.emit(Instruction::IsCell {
                    dst: is_object,
                    value,
                    kind: CellKind::Object,
                });
                self.jump_if_false(is_object, failed)?;
                for (field, subpattern) in entries {
                    let field_value = self.allocate()?;
                    let field = self.identifier(field);
                    self.emit_jump(
                        Instruction::TryGetField {
                            dst: field_value,
                            object: value,
                            field,
                            target: UNPATCHED,
                        },
                        failed,
                    )?;
                    self.compile_pattern(subpattern, field_value, failed)?;
                }
                Ok(())
            }
        }
    }

    fn compile_expression(&mut self, expression: &Expression, dst: Register) -> Result<()> {
        match &expression.kind {
            ExpressionKind::Identifier(identifier) => {
                let identifier = self.identifier(&identifier.name);
                self.emit(Instruction::GetLocal { dst, identifier });
            }
            ExpressionKind::Literal(literal) => {
                let constant = self.block.add_constant(literal_constant(literal));
                self.emit(Instruction::LoadConstant { dst, constant });
            }
            ExpressionKind::Binary(binary) => self.compile_binary(binary, dst)?,
            ExpressionKind::Parenthesized(inner) => self.compile_expression(inner, dst)?,
            ExpressionKind::Object(object) => {
                self.emit(Instruction::NewObject {
                    dst,
                    size: object.fields.len() as u32,
                });
                let value = self.allocate()?;
                for (name, field) in &object.fields {
                    self.compile_expression(field, value)?;
                    let field = self.identifier(name);
                    self.emit(Instruction::SetField {
                        object: dst,
                        field,
                        value,
                    });
                }
            }
            ExpressionKind::Array(items) => {
                self.emit(Instruction::NewArray {
                    dst,
                    size: items.len() as u32,
                });
                let value = self.allocate()?;
                for (index, item) in items.iter().enumerate() {
                    self.compile_expression(item, value)?;
                    self.emit(Instruction::SetArrayIndex {
                        array: dst,
                        index: index as u32,
                        value,
                    });
                }
            }
            ExpressionKind::Tuple(items) => {
                self.emit(Instruction::NewTuple {
                    dst,
                    size: items.len() as u32,
                });
                let value = self.allocate()?;
                for (index, item) in items.iter().enumerate() {
                    self.compile_expression(item, value)?;
                    self.emit(Instruction::SetTupleIndex {
                        tuple: dst,
                        index: index as u32,
                        value,
                    });
                }
            }
            ExpressionKind::Call(call) => self.compile_call(call, dst)?,
            ExpressionKind::Subscript(subscript) => self.compile_subscript(subscript, dst)?,
            ExpressionKind::Member(member) => self.compile_member(member, dst)?,
            ExpressionKind::Type(expression) => self.compile_type_expression(expression, dst)?,
        }
        Ok(())
    }

    fn compile_binary(&mut self, binary: &BinaryExpression, dst: Register) -> Result<()> {
        match binary.operator {
            BinaryOperator::And => {
                let end = self.new_label();
                self.compile_expression(&binary.lhs, dst)?;
                self.jump_if_false(dst, end)?;
                self.compile_expression(&binary.rhs, dst)?;
                self.bind(end)
            }
            BinaryOperator::Or => {
                let rhs = self.new_label();
                let end = self.new_label();
                self.compile_expression(&binary.lhs, dst)?;
                self.jump_if_false(dst, rhs)?;
                self.jump(end)?;
                self.bind(rhs)?;
                self.compile_expression(&binary.rhs, dst)?;
                self.bind(end)
            }
            BinaryOperator::Equal => {
                let lhs = self.allocate()?;
                let rhs = self.allocate()?;
                self.compile_expression(&binary.lhs, lhs)?;
                self.compile_expression(&binary.rhs, rhs)?;
                self.emit(Instruction::IsEqual { dst, lhs, rhs });
                Ok(())
            }
            operator => {
                let callee = self.allocate()?;
                let identifier = self.identifier(operator.symbol());
                self.emit(Instruction::GetLocal {
                    dst: callee,
                    identifier,
                });
                let first_arg = self.allocate_range(2)?;
                self.compile_expression(&binary.lhs, first_arg)?;
                self.compile_expression(&binary.rhs, first_arg.offset(1))?;
                self.emit(Instruction::Call {
                    dst,
                    callee,
                    argc: 2,
                    first_arg,
                });
                Ok(())
            }
        }
    }

    fn compile_call(&mut self, call: &CallExpression, dst: Register) -> Result<()> {
        let callee = self.allocate()?;
        self.compile_expression(&call.callee, callee)?;

        let implicit = match &call.implicit_arguments {
            Some(implicit) if is_direct_call(call) => implicit,
            _ => return self.compile_call_hole(call, callee, dst),
        };

        let count = implicit.len();
        let first_arg = self.allocate_range(count + call.arguments.len())?;
        let baked = implicit.iter().all(|ty| self.bakeable(ty));
        if baked {
            for (index, ty) in implicit.iter().enumerate() {
                self.emit_type(ty, first_arg.offset(index), TypeMode::Value)?;
            }
        }
        for (index, argument) in call.arguments.iter().enumerate() {
            self.compile_expression(argument, first_arg.offset(count + index))?;
        }
        if !baked {
            self.emit(Instruction::PushUnificationScope);
            self.emit(Instruction::InferImplicitParameters {
                function: callee,
                count: count as u32,
                first: first_arg,
            });
            self.emit(Instruction::PopUnificationScope);
        }
        self.emit(Instruction::Call {
            dst,
            callee,
            argc: (count + call.arguments.len()) as u32,
            first_arg,
        });
        Ok(())
    }

    fn compile_call_hole(&mut self, call: &CallExpression, callee: Register, dst: Register) -> Result<()> {
        let argc = call.arguments.len();
        let first_arg = self.allocate_range(argc)?;
        for (index, argument) in call.arguments.iter().enumerate() {
            self.compile_expression(argument, first_arg.offset(index))?;
        }

        let is_function = self.allocate()?;
        let hole = self.new_label();
        let done = self.new_label();
        self.emit(Instruction::CheckTypeOf {
            dst: is_function,
            value: callee,
            expected: TypeClass::Function,
        });
        self.jump_if_false(is_function, hole)?;
        self.emit(Instruction::Call {
            dst,
            callee,
            argc: argc as u32,
            first_arg,
        });
        self.jump(done)?;
        self.bind(hole)?;
        self.emit(Instruction::NewCallHole {
            dst,
            callee,
            argc: argc as u32,
            first_arg,
        });
        self.bind(done)
    }

    fn compile_member(&mut self, member: &MemberExpression, dst: Register) -> Result<()> {
        let object = self.allocate()?;
        self.compile_expression(&member.object, object)?;
        let field = self.identifier(&member.property.name);
        if is_direct_member(member) {
            self.emit(Instruction::GetField { dst, object, field });
            return Ok(());
        }

        let fallback = self.new_label();
        let done = self.new_label();
        self.emit_jump(
            Instruction::TryGetField {
                dst,
                object,
                field,
                target: UNPATCHED,
            },
            fallback,
        )?;
        self.jump(done)?;
        self.bind(fallback)?;
        self.emit(Instruction::NewMemberHole { dst, object, field });
        self.bind(done)
    }

    fn compile_subscript(&mut self, subscript: &SubscriptExpression, dst: Register) -> Result<()> {
        let target = self.allocate()?;
        self.compile_expression(&subscript.target, target)?;

        match &subscript.target.ty {
            Some(Type::Tuple(_)) => {
                if let Some(index) = subscript.index.literal_index() {
                    self.emit(Instruction::GetTupleIndex {
                        dst,
                        tuple: target,
                        index,
                    });
                    return Ok(());
                }
            }
            Some(Type::Array(_)) => {
                let index = self.allocate()?;
                self.compile_expression(&subscript.index, index)?;
                self.emit(Instruction::GetArrayIndex {
                    dst,
                    array: target,
                    index,
                });
                return Ok(());
            }
            _ => {}
        }

        let index = self.allocate()?;
        self.compile_expression(&subscript.index, index)?;
        let is_array = self.allocate()?;
        let hole = self.new_label();
        let done = self.new_label();
        self.emit(Instruction::CheckTypeOf {
            dst: is_array,
            value: target,
            expected: TypeClass::Array,
        });
        self.jump_if_false(is_array, hole)?;
        self.emit(Instruction::GetArrayIndex {
            dst,
            array: target,
            index,
        });
        self.jump(done)?;
        self.bind(hole)?;
        self.emit(Instruction::NewSubscriptHole { dst, target, index });
        self.bind(done)
    }

    // A type can be rebuilt at run time when every variable in it is an
    // implicit parameter of the enclosing function.
    fn bakeable(&self, ty: &Type) -> bool {
        ty.variables()
            .iter()
            .all(|var| self.implicit_parameters.contains_key(&var.id))
    }

    fn declare_type_variables(&mut self, ty: &Type) -> Result<()> {
        for var in ty.variables() {
            if self.type_registers.contains_key(&var.id) {
                continue;
            }
            let register = self.allocate()?;
            let name = self.identifier(&var.name);
            self.emit(Instruction::NewVarType {
                dst: register,
                name,
                inferred: var.inferred,
                rigid: var.rigid,
            });
            self.type_registers.insert(var.id, register);
        }
        Ok(())
    }

    fn emit_type(&mut self, ty: &Type, dst: Register, mode: TypeMode) -> Result<()> {
        match ty {
            Type::Var(var) => match mode {
                TypeMode::Signature => {
                    let src = *self
                        .type_registers
                        .get(&var.id)
                        .ok_or_else(|| anyhow!("type variable `{var}` was not declared"))?;
                    self.emit(Instruction::Move { dst, src });
                }
                TypeMode::Value => {
                    let name = self
                        .implicit_parameters
                        .get(&var.id)
                        .cloned()
                        .ok_or_else(|| anyhow!("type variable `{var}` has no run-time value"))?;
                    let identifier = self.identifier(&name);
                    self.emit(Instruction::GetLocal { dst, identifier });
                }
            },
            Type::Name(name) => {
                let name = self.identifier(name);
                self.emit(Instruction::NewNameType { dst, name });
            }
            Type::Array(item) => {
                let item_register = self.allocate()?;
                self.emit_type(item, item_register, mode)?;
                self.emit(Instruction::NewArrayType {
                    dst,
                    item: item_register,
                });
            }
            Type::Tuple(items) => {
                let first = self.allocate_range(items.len())?;
                for (index, item) in items.iter().enumerate() {
                    self.emit_type(item, first.offset(index), mode)?;
                }
                self.emit(Instruction::NewTupleType {
                    dst,
                    count: items.len() as u32,
                    first,
                });
            }
            Type::Record(fields) => {
                let first_key = self.allocate_range(fields.len())?;
                let first_type = self.allocate_range(fields.len())?;
                for (index, (name, field)) in fields.iter().enumerate() {
                    let constant = self.string_constant(name);
                    self.emit(Instruction::LoadConstant {
                        dst: first_key.offset(index),
                        constant,
                    });
                    self.emit_type(field, first_type.offset(index), mode)?;
                }
                self.emit(Instruction::NewRecordType {
                    dst,
                    count: fields.len() as u32,
                    first_key,
                    first_type,
                });
            }
            Type::Function {
                params,
                return_type,
                implicit_count,
            } => {
                let first_param = self.allocate_range(params.len())?;
                for (index, param) in params.iter().enumerate() {
                    self.emit_type(param, first_param.offset(index), mode)?;
                }
                let return_register = self.allocate()?;
                self.emit_type(return_type, return_register, mode)?;
                self.emit(Instruction::NewFunctionType {
                    dst,
                    param_count: params.len() as u32,
                    first_param,
                    return_type: return_register,
                    implicit_count: *implicit_count as u32,
                });
            }
            Type::Union(lhs, rhs) => {
                self.emit_type(lhs, dst, mode)?;
                let rhs_register = self.allocate()?;
                self.emit_type(rhs, rhs_register, mode)?;
                self.emit(Instruction::NewUnionType {
                    dst,
                    lhs: dst,
                    rhs: rhs_register,
                });
            }
            Type::Binding(name, inner) => {
                let inner_register = self.allocate()?;
                self.emit_type(inner, inner_register, mode)?;
                let name = self.identifier(name);
                self.emit(Instruction::NewBindingType {
                    dst,
                    name,
                    ty: inner_register,
                });
            }
        }
        Ok(())
    }

    fn compile_type_expression(&mut self, expression: &TypeExpression, dst: Register) -> Result<()> {
        match expression {
            TypeExpression::Name(identifier) => {
                let name = self.identifier(&identifier.name);
                if types::is_builtin(&identifier.name) {
                    self.emit(Instruction::NewNameType { dst, name });
                } else {
                    self.emit(Instruction::GetLocal {
                        dst,
                        identifier: name,
                    });
                }
            }
            TypeExpression::Array(item) => {
                let item_register = self.allocate()?;
                self.compile_type_expression(item, item_register)?;
                self.emit(Instruction::NewArrayType {
                    dst,
                    item: item_register,
                });
            }
            TypeExpression::Tuple(items) => {
                let first = self.allocate_range(items.len())?;
                for (index, item) in items.iter().enumerate() {
                    self.compile_type_expression(item, first.offset(index))?;
                }
                self.emit(Instruction::NewTupleType {
                    dst,
                    count: items.len() as u32,
                    first,
                });
            }
            TypeExpression::Record(fields) => {
                let first_key = self.allocate_range(fields.len())?;
                let first_type = self.allocate_range(fields.len())?;
                for (index, (name, field)) in fields.iter().enumerate() {
                    let constant = self.string_constant(name);
                    self.emit(Instruction::LoadConstant {
                        dst: first_key.offset(index),
                        constant,
                    });
                    self.compile_type_expression(field, first_type.offset(index))?;
                }
                self.emit(Instruction::NewRecordType {
                    dst,
                    count: fields.len() as u32,
                    first_key,
                    first_type,
                });
            }
            TypeExpression::Function {
                parameters,
                return_type,
            } => {
                let first_param = self.allocate_range(parameters.len())?;
                for (index, parameter) in parameters.iter().enumerate() {
                    self.compile_type_expression(parameter, first_param.offset(index))?;
                }
                let return_register = self.allocate()?;
                self.compile_type_expression(return_type, return_register)?;
                self.emit(Instruction::NewFunctionType {
                    dst,
                    param_count: parameters.len() as u32,
                    first_param,
                    return_type: return_register,
                    implicit_count: 0,
                });
            }
            TypeExpression::Union(lhs, rhs) => {
                self.compile_type_expression(lhs, dst)?;
                let rhs_register = self.allocate()?;
                self.compile_type_expression(rhs, rhs_register)?;
                self.emit(Instruction::NewUnionType {
                    dst,
                    lhs: dst,
                    rhs: rhs_register,
                });
            }
        }
        Ok(())
    }
}

// Compiles a checked function into its own block: a type section that
// evaluates the signature, then the body starting at `code_start`.
fn compile_function(function: &FunctionDeclaration, runtime_checks: bool) -> Result<BytecodeBlock> {
    let name = &function.name.name;
    let signature = function
        .signature
        .as_ref()
        .ok_or_else(|| anyhow!("function `{name}` has no checked signature"))?;
    let Type::Function {
        params,
        implicit_count,
        ..
    } = signature
    else {
        bail!("function `{name}` has non-function signature `{signature}`");
    };

    let parameter_count = params.len() as u32;
    let mut builder = BlockBuilder::new(name, parameter_count, runtime_checks);
    for param in params.iter().take(*implicit_count) {
        if let Type::Binding(binding, inner) = param {
            if let Type::Var(var) = inner.as_ref() {
                builder
                    .implicit_parameters
                    .insert(var.id, binding.clone());
            }
        }
    }

    let signature_register = builder.allocate()?;
    builder.emit(Instruction::PushScope);
    builder.emit(Instruction::PushUnificationScope);
    builder.declare_type_variables(signature)?;
    builder.emit_type(signature, signature_register, TypeMode::Signature)?;
    builder.emit(Instruction::ResolveType {
        dst: signature_register,
        ty: signature_register,
    });
    builder.emit(Instruction::PopUnificationScope);
    builder.emit(Instruction::PopScope);
    builder.emit(Instruction::End {
        value: signature_register,
    });
    builder.type_registers.clear();
    builder.block.code_start = builder.block.len() as u32;
    builder.release(parameter_count as u16);

    for (index, parameter) in function.parameters.iter().enumerate() {
        let register = Register(index as u16);
        if parameter.inferred {
            builder.check_type_argument(register, &parameter.name.name)?;
        }
        let identifier = builder.identifier(&parameter.name.name);
        builder.emit(Instruction::SetLocal {
            identifier,
            src: register,
        });
    }

    let result = builder.allocate()?;
    builder.compile_block(&function.body, result)?;
    builder.emit(Instruction::End { value: result });
    Ok(builder.finish())
}

impl BlockBuilder {
    fn check_type_argument(&mut self, argument: Register, name: &str) -> Result<()> {
        let mark = self.mark();
        let is_type = self.allocate()?;
        let fail = self.new_label();
        let ok = self.new_label();
        self.emit(Instruction::CheckType {
            dst: is_type,
            ty: argument,
            expected: TypeClass::AnyType,
        });
        self.jump_if_false(is_type, fail)?;
        self.jump(ok)?;
        self.bind(fail)?;
        let message = self.string_constant(&format!("Inferred parameter `{name}` expects a type"));
        self.emit(Instruction::TypeError { message });
        self.bind(ok)?;
        self.release(mark);
        Ok(())
    }
}

fn literal_constant(literal: &Literal) -> Constant {
    match literal {
        Literal::Number(value) => Constant::Number(*value),
        Literal::String(value) => Constant::String(value.clone()),
        Literal::Boolean(value) => Constant::Bool(*value),
    }
}

fn is_direct_call(call: &CallExpression) -> bool {
    call.implicit_arguments.is_some() && matches!(call.callee.ty, Some(Type::Function { .. }))
}

fn is_direct_member(member: &MemberExpression) -> bool {
    matches!(
        &member.object.ty,
        Some(Type::Record(fields)) if fields.contains_key(&member.property.name)
    )
}

fn may_be_hole(expression: &Expression) -> bool {
    match &expression.kind {
        ExpressionKind::Call(call) => !is_direct_call(call),
        ExpressionKind::Member(member) => !is_direct_member(member),
        ExpressionKind::Subscript(subscript) => match &subscript.target.ty {
            Some(Type::Array(_)) => false,
            Some(Type::Tuple(_)) => subscript.index.literal_index().is_none(),
            _ => true,
        },
        ExpressionKind::Parenthesized(inner) => may_be_hole(inner),
        _ => false,
    }
}
