use std::collections::BTreeMap;
use std::rc::Rc;

use log::debug;
use thiserror::Error;

use super::bytecode::{BytecodeBlock, Constant, Instruction, Register};
use super::value::{Closure, Environment, Hole, Shared, Value};
use crate::builtins::OPERATORS;
use crate::scope::UnificationStack;
use crate::types::{Type, TypeClass, TypeError, TypeTable};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum VmError {
    #[error("{0}")]
    Runtime(String),
    #[error("{0}")]
    Type(String),
}

impl From<TypeError> for VmError {
    fn from(error: TypeError) -> Self {
        VmError::Type(error.to_string())
    }
}

struct Frame {
    block: Rc<BytecodeBlock>,
    ip: usize,
    registers: Vec<Value>,
    environment: Shared<Environment>,
    return_to: Option<Register>,
}

impl Frame {
    fn new(
        block: Rc<BytecodeBlock>,
        ip: usize,
        environment: Shared<Environment>,
        arguments: Vec<Value>,
    ) -> Self {
        let size = (block.register_count as usize).max(arguments.len());
        let mut registers = arguments;
        registers.resize(size, Value::Unit);
        Self {
            block,
            ip,
            registers,
            environment,
            return_to: None,
        }
    }

    fn get(&self, register: Register) -> Result<Value, VmError> {
        self.registers
            .get(register.index())
            .cloned()
            .ok_or_else(|| self.out_of_range(register))
    }

    fn set(&mut self, register: Register, value: Value) -> Result<(), VmError> {
        match self.registers.get_mut(register.index()) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(self.out_of_range(register)),
        }
    }

    fn range(&self, first: Register, count: u32) -> Result<Vec<Value>, VmError> {
        (0..count as usize)
            .map(|offset| self.get(first.offset(offset)))
            .collect()
    }

    fn out_of_range(&self, register: Register) -> VmError {
        VmError::Runtime(format!(
            "Register {register} is out of range in `{}`",
            self.block.name
        ))
    }

    fn identifier(&self, index: u32) -> Result<String, VmError> {
        self.block
            .identifier(index)
            .map(str::to_string)
            .ok_or_else(|| VmError::Runtime(format!("Unknown identifier index {index}")))
    }

    fn message(&self, index: u32) -> String {
        match self.block.constant(index) {
            Some(Constant::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => format!("<missing message {index}>"),
        }
    }
}

pub struct Vm {
    table: TypeTable,
    unification: UnificationStack,
    globals: Shared<Environment>,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        let mut unification = UnificationStack::new();
        unification.push();
        let globals = Environment::root();
        for operator in OPERATORS.iter() {
            globals
                .borrow_mut()
                .define(operator.name, Value::Native(operator));
        }
        Self {
            table: TypeTable::new(),
            unification,
            globals,
        }
    }

    pub fn run(&mut self, block: &BytecodeBlock) -> Result<Value, VmError> {
        let block = Rc::new(block.clone());
        let environment = Environment::child(&self.globals);
        let ip = block.code_start as usize;
        self.execute(Frame::new(block, ip, environment, Vec::new()))
    }

    fn execute(&mut self, entry: Frame) -> Result<Value, VmError> {
        let mut frames = vec![entry];
        loop {
            let instruction = {
                let frame = current(&mut frames)?;
                let instruction = *frame.block.instructions.get(frame.ip).ok_or_else(|| {
                    VmError::Runtime(format!(
                        "Instruction pointer {} is out of range in `{}`",
                        frame.ip, frame.block.name
                    ))
                })?;
                frame.ip += 1;
                instruction
            };

            match instruction {
                Instruction::End { value } => {
                    let Some(finished) = frames.pop() else {
                        return Err(VmError::Runtime("Frame stack underflow".to_string()));
                    };
                    let result = finished.get(value)?;
                    match frames.last_mut() {
                        Some(caller) => {
                            if let Some(dst) = finished.return_to {
                                caller.set(dst, result)?;
                            }
                        }
                        None => return Ok(result),
                    }
                }
                Instruction::Call {
                    dst,
                    callee,
                    argc,
                    first_arg,
                } => {
                    let frame = current(&mut frames)?;
                    let callee = frame.get(callee)?;
                    let arguments = frame.range(first_arg, argc)?;
                    match callee {
                        Value::Function(closure) => {
                            let arguments = self.complete_arguments(&closure, arguments)?;
                            debug!(
                                "call `{}` with {} argument(s)",
                                closure.block.name,
                                arguments.len()
                            );
                            let environment = Environment::child(&closure.environment);
                            let ip = closure.block.code_start as usize;
                            let mut callee_frame =
                                Frame::new(Rc::clone(&closure.block), ip, environment, arguments);
                            callee_frame.return_to = Some(dst);
                            frames.push(callee_frame);
                        }
                        Value::Native(operator) => {
                            let [lhs, rhs] = arguments.as_slice() else {
                                return Err(VmError::Runtime(format!(
                                    "Operator `{}` expects 2 arguments but found {}",
                                    operator.name,
                                    arguments.len()
                                )));
                            };
                            let result = (operator.apply)(lhs, rhs)?;
                            frame.set(dst, result)?;
                        }
                        other => {
                            return Err(VmError::Runtime(format!(
                                "Value `{other}` is not callable"
                            )))
                        }
                    }
                }
                instruction => {
                    let frame = current(&mut frames)?;
                    self.step(frame, instruction)?;
                }
            }
        }
    }

    fn step(&mut self, frame: &mut Frame, instruction: Instruction) -> Result<(), VmError> {
        match instruction {
            Instruction::End { .. } | Instruction::Call { .. } => {
                return Err(VmError::Runtime(format!(
                    "`{}` must be handled by the frame loop",
                    instruction.opcode()
                )))
            }
            Instruction::Move { dst, src } => {
                let value = frame.get(src)?;
                frame.set(dst, value)?;
            }
            Instruction::LoadConstant { dst, constant } => {
                let value = frame
                    .block
                    .constant(constant)
                    .map(Value::from)
                    .ok_or_else(|| VmError::Runtime(format!("Unknown constant index {constant}")))?;
                frame.set(dst, value)?;
            }
            Instruction::GetLocal { dst, identifier } => {
                let name = frame.identifier(identifier)?;
                let value = frame
                    .environment
                    .borrow()
                    .get(&name)
                    .ok_or_else(|| VmError::Runtime(format!("Unknown variable `{name}`")))?;
                frame.set(dst, value)?;
            }
            Instruction::SetLocal { identifier, src } => {
                let name = frame.identifier(identifier)?;
                let value = frame.get(src)?;
                frame.environment.borrow_mut().define(&name, value);
            }
            Instruction::NewArray { dst, size } => {
                frame.set(dst, Value::array(Vec::with_capacity(size as usize)))?;
            }
            Instruction::SetArrayIndex {
                array,
                index,
                value,
            } => {
                let Value::Array(items) = frame.get(array)? else {
                    return Err(VmError::Runtime(format!("Register {array} is not an array")));
                };
                let value = frame.get(value)?;
                let mut items = items.borrow_mut();
                let index = index as usize;
                if index >= items.len() {
                    items.resize(index + 1, Value::Unit);
                }
                items[index] = value;
            }
            Instruction::GetArrayIndex { dst, array, index } => {
                let target = frame.get(array)?;
                let index = frame.get(index)?;
                let Value::Array(items) = &target else {
                    return Err(VmError::Runtime(format!("Value `{target}` is not an array")));
                };
                let position = array_position(&index)?;
                let item = items.borrow().get(position).cloned().ok_or_else(|| {
                    VmError::Runtime(format!("Index {index} is out of bounds for `{target}`"))
                })?;
                frame.set(dst, item)?;
            }
            Instruction::NewTuple { dst, size } => {
                frame.set(dst, Value::tuple(vec![Value::Unit; size as usize]))?;
            }
            Instruction::SetTupleIndex {
                tuple,
                index,
                value,
            } => {
                let Value::Tuple(items) = frame.get(tuple)? else {
                    return Err(VmError::Runtime(format!("Register {tuple} is not a tuple")));
                };
                let value = frame.get(value)?;
                let mut items = items.borrow_mut();
                let slot = items.get_mut(index as usize).ok_or_else(|| {
                    VmError::Runtime(format!("Tuple index {index} is out of bounds"))
                })?;
                *slot = value;
            }
            Instruction::GetTupleIndex { dst, tuple, index } => {
                let target = frame.get(tuple)?;
                let Value::Tuple(items) = &target else {
                    return Err(VmError::Runtime(format!("Value `{target}` is not a tuple")));
                };
                let item = items.borrow().get(index as usize).cloned().ok_or_else(|| {
                    VmError::Runtime(format!("Index {index} is out of bounds for `{target}`"))
                })?;
                frame.set(dst, item)?;
            }
            Instruction::NewObject { dst, .. } => {
                frame.set(dst, Value::object(BTreeMap::new()))?;
            }
            Instruction::SetField {
                object,
                field,
                value,
            } => {
                let Value::Object(fields) = frame.get(object)? else {
                    return Err(VmError::Runtime(format!("Register {object} is not an object")));
                };
                let name = frame.identifier(field)?;
                let value = frame.get(value)?;
                fields.borrow_mut().insert(name, value);
            }
            Instruction::GetField { dst, object, field } => {
                let name = frame.identifier(field)?;
                let object = frame.get(object)?;
                let value = field_of(&object, &name).ok_or_else(|| {
                    VmError::Runtime(format!("Missing field `{name}` in `{object}`"))
                })?;
                frame.set(dst, value)?;
            }
            Instruction::TryGetField {
                dst,
                object,
                field,
                target,
            } => {
                let name = frame.identifier(field)?;
                match field_of(&frame.get(object)?, &name) {
                    Some(value) => frame.set(dst, value)?,
                    None => frame.ip = jump_target(target)?,
                }
            }
            Instruction::NewFunction { dst, function } => {
                let block = frame.block.function(function).cloned().ok_or_else(|| {
                    VmError::Runtime(format!("Unknown function index {function}"))
                })?;
                let signature = self.function_signature(&block, &frame.environment)?;
                let closure = Closure {
                    block,
                    environment: Rc::clone(&frame.environment),
                    signature,
                };
                frame.set(dst, Value::Function(Rc::new(closure)))?;
            }
            Instruction::Jump { target } => frame.ip = jump_target(target)?,
            Instruction::JumpIfFalse { condition, target } => match frame.get(condition)? {
                Value::Bool(true) => {}
                Value::Bool(false) => frame.ip = jump_target(target)?,
                other => {
                    return Err(VmError::Runtime(format!(
                        "Condition must be a Bool, found `{other}`"
                    )))
                }
            },
            Instruction::IsEqual { dst, lhs, rhs } => {
                let equal = frame.get(lhs)? == frame.get(rhs)?;
                frame.set(dst, Value::Bool(equal))?;
            }
            Instruction::PushScope => {
                frame.environment = Environment::child(&frame.environment);
            }
            Instruction::PopScope => {
                let parent = frame.environment.borrow().parent();
                frame.environment = parent
                    .ok_or_else(|| VmError::Runtime("Scope stack underflow".to_string()))?;
            }
            Instruction::PushUnificationScope => self.unification.push(),
            Instruction::PopUnificationScope => {
                self.unification.pop(&mut self.table);
            }
            Instruction::Unify { lhs, rhs } => {
                let lhs = self.as_type(&frame.get(lhs)?)?;
                let rhs = self.as_type(&frame.get(rhs)?)?;
                self.table.unify(&lhs, &rhs)?;
            }
            Instruction::ResolveType { dst, ty } => {
                let ty = self.as_type(&frame.get(ty)?)?;
                frame.set(dst, Value::Type(self.table.resolve_deep(&ty)))?;
            }
            Instruction::CheckType { dst, ty, expected } => {
                let value = frame.get(ty)?;
                let matches = match (expected, &value) {
                    (TypeClass::AnyValue, value) => !value.is_type_level(),
                    (TypeClass::AnyType, value) => value.is_type_level(),
                    (TypeClass::Hole, value) => matches!(value, Value::Hole(_)),
                    (class, Value::Type(ty)) => self.table.resolve(ty).class() == class,
                    _ => false,
                };
                frame.set(dst, Value::Bool(matches))?;
            }
            Instruction::CheckTypeOf {
                dst,
                value,
                expected,
            } => {
                let value = frame.get(value)?;
                let matches = match (expected, &value) {
                    (TypeClass::Hole, value) => matches!(value, Value::Hole(_)),
                    (_, Value::Hole(_)) => false,
                    (TypeClass::AnyValue, value) => !value.is_type_level(),
                    (TypeClass::AnyType, value) => value.is_type_level(),
                    (class, value) => {
                        let ty = self.type_of(value);
                        self.table.resolve(&ty).class() == class
                    }
                };
                frame.set(dst, Value::Bool(matches))?;
            }
            Instruction::TypeError { message } => {
                return Err(VmError::Type(frame.message(message)));
            }
            Instruction::InferImplicitParameters {
                function,
                count,
                first,
            } => {
                let callee = frame.get(function)?;
                let arguments = frame
                    .registers
                    .get(first.index()..)
                    .map(<[Value]>::to_vec)
                    .unwrap_or_default();
                let inferred = self.infer_implicit_parameters(&callee, count as usize, &arguments)?;
                for (index, ty) in inferred.into_iter().enumerate() {
                    frame.set(first.offset(index), Value::Type(ty))?;
                }
            }
            Instruction::NewVarType {
                dst,
                name,
                inferred,
                rigid,
            } => {
                let name = frame.identifier(name)?;
                let var = self
                    .unification
                    .new_var(&mut self.table, &name, inferred, rigid);
                frame.set(dst, Value::Type(var))?;
            }
            Instruction::NewNameType { dst, name } => {
                let name = frame.identifier(name)?;
                frame.set(dst, Value::Type(Type::Name(name)))?;
            }
            Instruction::NewArrayType { dst, item } => {
                let item = self.as_type(&frame.get(item)?)?;
                frame.set(dst, Value::Type(Type::array(item)))?;
            }
            Instruction::NewTupleType { dst, count, first } => {
                let items = self.types_in(frame, first, count)?;
                frame.set(dst, Value::Type(Type::Tuple(items)))?;
            }
            Instruction::NewRecordType {
                dst,
                count,
                first_key,
                first_type,
            } => {
                let keys = frame.range(first_key, count)?;
                let types = self.types_in(frame, first_type, count)?;
                let mut fields = BTreeMap::new();
                for (key, ty) in keys.into_iter().zip(types) {
                    let Value::String(key) = key else {
                        return Err(VmError::Runtime(format!(
                            "Record key must be a String, found `{key}`"
                        )));
                    };
                    fields.insert(key.to_string(), ty);
                }
                frame.set(dst, Value::Type(Type::Record(fields)))?;
            }
            Instruction::NewFunctionType {
                dst,
                param_count,
                first_param,
                return_type,
                implicit_count,
            } => {
                let params = self.types_in(frame, first_param, param_count)?;
                let return_type = self.as_type(&frame.get(return_type)?)?;
                frame.set(
                    dst,
                    Value::Type(Type::Function {
                        params,
                        return_type: Box::new(return_type),
                        implicit_count: implicit_count as usize,
                    }),
                )?;
            }
            Instruction::NewUnionType { dst, lhs, rhs } => {
                let lhs = self.as_type(&frame.get(lhs)?)?;
                let rhs = self.as_type(&frame.get(rhs)?)?;
                frame.set(dst, Value::Type(Type::union(lhs, rhs)))?;
            }
            Instruction::NewBindingType { dst, name, ty } => {
                let name = frame.identifier(name)?;
                let ty = self.as_type(&frame.get(ty)?)?;
                frame.set(dst, Value::Type(Type::binding(name, ty)))?;
            }
            Instruction::NewValue { dst, ty } => {
                let ty = self.as_type(&frame.get(ty)?)?;
                let ty = self.table.resolve_deep(&ty);
                frame.set(dst, Value::default_for(&ty))?;
            }
            Instruction::GetTypeForValue { dst, value } => {
                let ty = self.type_of(&frame.get(value)?);
                frame.set(dst, Value::Type(ty))?;
            }
            Instruction::NewCallHole {
                dst,
                callee,
                argc,
                first_arg,
            } => {
                let callee = frame.get(callee)?;
                let arguments = frame.range(first_arg, argc)?;
                if !callee.is_type_level() && !arguments.iter().any(Value::is_type_level) {
                    return Err(VmError::Runtime(format!("Value `{callee}` is not callable")));
                }
                frame.set(dst, Value::Hole(Rc::new(Hole::Call { callee, arguments })))?;
            }
            Instruction::NewSubscriptHole { dst, target, index } => {
                let target = frame.get(target)?;
                let index = frame.get(index)?;
                let value = match (&target, &index) {
                    (Value::Tuple(items), Value::Number(_)) => {
                        let position = array_position(&index)?;
                        items.borrow().get(position).cloned().ok_or_else(|| {
                            VmError::Runtime(format!(
                                "Index {index} is out of bounds for `{target}`"
                            ))
                        })?
                    }
                    (Value::Object(fields), Value::String(name)) => {
                        fields.borrow().get(name.as_ref()).cloned().ok_or_else(|| {
                            VmError::Runtime(format!("Missing field `{name}` in `{target}`"))
                        })?
                    }
                    _ if target.is_type_level() || index.is_type_level() => {
                        Value::Hole(Rc::new(Hole::Subscript {
                            target: target.clone(),
                            index: index.clone(),
                        }))
                    }
                    _ => {
                        return Err(VmError::Runtime(format!(
                            "Value `{target}` cannot be indexed by `{index}`"
                        )))
                    }
                };
                frame.set(dst, value)?;
            }
            Instruction::NewMemberHole { dst, object, field } => {
                let field = frame.identifier(field)?;
                let object = frame.get(object)?;
                if !object.is_type_level() {
                    return Err(VmError::Runtime(format!(
                        "Missing field `{field}` in `{object}`"
                    )));
                }
                frame.set(dst, Value::Hole(Rc::new(Hole::Member { object, field })))?;
            }
            Instruction::IsCell { dst, value, kind } => {
                let is_cell = frame.get(value)?.cell_kind() == Some(kind);
                frame.set(dst, Value::Bool(is_cell))?;
            }
            Instruction::RuntimeError { message } => {
                return Err(VmError::Runtime(frame.message(message)));
            }
        }
        Ok(())
    }

    fn function_signature(
        &mut self,
        block: &Rc<BytecodeBlock>,
        environment: &Shared<Environment>,
    ) -> Result<Type, VmError> {
        if block.code_start == 0 {
            let params = (0..block.parameter_count)
                .map(|_| self.fresh_var())
                .collect();
            let return_type = self.fresh_var();
            return Ok(Type::function(params, return_type));
        }
        let frame = Frame::new(
            Rc::clone(block),
            0,
            Environment::child(environment),
            Vec::new(),
        );
        match self.execute(frame)? {
            Value::Type(signature) => Ok(signature),
            other => Err(VmError::Type(format!(
                "Signature of `{}` evaluated to `{other}`",
                block.name
            ))),
        }
    }

    // A call that went through a hole passes only the explicit arguments.
    fn complete_arguments(
        &mut self,
        closure: &Closure,
        arguments: Vec<Value>,
    ) -> Result<Vec<Value>, VmError> {
        let expected = closure.block.parameter_count as usize;
        if arguments.len() == expected {
            return Ok(arguments);
        }
        let implicit_count = match self.table.resolve(&closure.signature) {
            Type::Function { implicit_count, .. } => implicit_count,
            _ => 0,
        };
        if implicit_count == 0 || arguments.len() + implicit_count != expected {
            return Err(VmError::Runtime(format!(
                "Arity mismatch calling `{}`: expected {} but found {}",
                closure.block.name,
                expected.saturating_sub(implicit_count),
                arguments.len()
            )));
        }

        let mut completed = vec![Value::Unit; implicit_count];
        completed.extend(arguments);
        self.unification.push();
        let inferred = self.infer_closure_parameters(closure, implicit_count, &completed);
        self.unification.pop(&mut self.table);
        for (slot, ty) in completed.iter_mut().zip(inferred?) {
            *slot = Value::Type(ty);
        }
        Ok(completed)
    }

    fn infer_implicit_parameters(
        &mut self,
        callee: &Value,
        count: usize,
        arguments: &[Value],
    ) -> Result<Vec<Type>, VmError> {
        let Value::Function(closure) = callee else {
            return Err(VmError::Runtime(format!(
                "Value `{callee}` has no implicit parameters"
            )));
        };
        self.infer_closure_parameters(closure, count, arguments)
    }

    fn infer_closure_parameters(
        &mut self,
        closure: &Closure,
        count: usize,
        arguments: &[Value],
    ) -> Result<Vec<Type>, VmError> {
        let signature = self
            .unification
            .instantiate(&mut self.table, &closure.signature);
        let Type::Function { params, .. } = self.table.resolve(&signature) else {
            return Err(VmError::Type(format!(
                "Signature of `{}` is not a function type",
                closure.block.name
            )));
        };

        for (offset, param) in params.iter().enumerate().skip(count) {
            let argument = arguments.get(offset).ok_or_else(|| {
                VmError::Runtime(format!("Missing argument {offset} for `{}`", closure.block.name))
            })?;
            let found = self.type_of(argument);
            self.table.unify(param, &found)?;
        }

        let mut inferred = Vec::with_capacity(count);
        for param in params.iter().take(count) {
            let (name, inner) = match param {
                Type::Binding(name, inner) => (name.clone(), inner.as_ref().clone()),
                other => (String::new(), other.clone()),
            };
            let resolved = self.table.resolve_deep(&inner);
            if matches!(resolved, Type::Var(_)) {
                return Err(TypeError::CannotInfer(name).into());
            }
            inferred.push(resolved);
        }
        debug!(
            "inferred implicit parameters of `{}`: {}",
            closure.block.name,
            inferred
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(inferred)
    }

    fn fresh_var(&mut self) -> Type {
        self.unification.new_var(&mut self.table, "", false, false)
    }

    fn as_type(&mut self, value: &Value) -> Result<Type, VmError> {
        match value {
            Value::Type(ty) => Ok(ty.clone()),
            Value::Hole(_) => Ok(self.fresh_var()),
            other => Err(VmError::Type(format!("Expected a type, found `{other}`"))),
        }
    }

    fn types_in(&mut self, frame: &Frame, first: Register, count: u32) -> Result<Vec<Type>, VmError> {
        frame
            .range(first, count)?
            .iter()
            .map(|value| self.as_type(value))
            .collect()
    }

    fn type_of(&mut self, value: &Value) -> Type {
        match value {
            Value::Unit => Type::void(),
            Value::Bool(_) => Type::bool(),
            Value::Number(_) => Type::number(),
            Value::String(_) => Type::string(),
            Value::Array(items) => {
                let first = items.borrow().first().cloned();
                let item = match first {
                    Some(item) => self.type_of(&item),
                    None => self.fresh_var(),
                };
                Type::array(item)
            }
            Value::Tuple(items) => {
                let items = items.borrow().clone();
                Type::Tuple(items.iter().map(|item| self.type_of(item)).collect())
            }
            Value::Object(fields) => {
                let fields = fields.borrow().clone();
                Type::Record(
                    fields
                        .iter()
                        .map(|(name, value)| (name.clone(), self.type_of(value)))
                        .collect(),
                )
            }
            Value::Function(closure) => self
                .unification
                .instantiate(&mut self.table, &closure.signature),
            Value::Native(operator) => {
                let any = self.fresh_var();
                operator.signature(&any)
            }
            Value::Type(_) => Type::type_type(),
            Value::Hole(_) => self.fresh_var(),
        }
    }
}

fn current(frames: &mut [Frame]) -> Result<&mut Frame, VmError> {
    frames
        .last_mut()
        .ok_or_else(|| VmError::Runtime("Frame stack underflow".to_string()))
}

fn jump_target(target: i32) -> Result<usize, VmError> {
    usize::try_from(target)
        .map_err(|_| VmError::Runtime(format!("Unpatched jump target {target}")))
}

fn array_position(index: &Value) -> Result<usize, VmError> {
    match index {
        Value::Number(value) if *value >= 0.0 && value.fract() == 0.0 => Ok(*value as usize),
        other => Err(VmError::Runtime(format!(
            "Index must be a non-negative integer, found `{other}`"
        ))),
    }
}

fn field_of(object: &Value, name: &str) -> Option<Value> {
    match object {
        Value::Object(fields) => fields.borrow().get(name).cloned(),
        _ => None,
    }
}
