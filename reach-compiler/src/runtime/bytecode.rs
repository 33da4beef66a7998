use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::types::TypeClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Register(pub u16);

impl Register {
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// The register `by` slots after this one. Callers only offset within a
    /// range they allocated.
    pub fn offset(self, by: usize) -> Register {
        Register(self.0.saturating_add(u16::try_from(by).unwrap_or(u16::MAX)))
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Tag of a heap cell, as tested by `IsCell`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CellKind {
    Object = 0,
    String = 1,
    Array = 2,
    Function = 3,
    Tuple = 4,
    Type = 5,
    Hole = 6,
}

impl CellKind {
    const ALL: [CellKind; 7] = [
        CellKind::Object,
        CellKind::String,
        CellKind::Array,
        CellKind::Function,
        CellKind::Tuple,
        CellKind::Type,
        CellKind::Hole,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            CellKind::Object => "object",
            CellKind::String => "string",
            CellKind::Array => "array",
            CellKind::Function => "function",
            CellKind::Tuple => "tuple",
            CellKind::Type => "type",
            CellKind::Hole => "hole",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Unit,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Constant {
    /// Pool identity. Numbers compare by bit pattern so `0.0` and `-0.0`
    /// stay distinct.
    fn same(&self, other: &Constant) -> bool {
        match (self, other) {
            (Constant::Number(a), Constant::Number(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Unit => write!(f, "()"),
            Constant::Bool(value) => write!(f, "{value}"),
            Constant::Number(value) => write!(f, "{value}"),
            Constant::String(value) => write!(f, "{value:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    End = 0,
    Move,
    LoadConstant,
    GetLocal,
    SetLocal,
    NewArray,
    SetArrayIndex,
    GetArrayIndex,
    NewTuple,
    SetTupleIndex,
    GetTupleIndex,
    NewObject,
    SetField,
    GetField,
    TryGetField,
    NewFunction,
    Call,
    Jump,
    JumpIfFalse,
    IsEqual,
    PushScope,
    PopScope,
    PushUnificationScope,
    PopUnificationScope,
    Unify,
    ResolveType,
    CheckType,
    CheckTypeOf,
    TypeError,
    InferImplicitParameters,
    NewVarType,
    NewNameType,
    NewArrayType,
    NewTupleType,
    NewRecordType,
    NewFunctionType,
    NewUnionType,
    NewBindingType,
    NewValue,
    GetTypeForValue,
    NewCallHole,
    NewSubscriptHole,
    NewMemberHole,
    IsCell,
    RuntimeError,
}

impl Opcode {
    const ALL: [Opcode; 45] = [
        Opcode::End,
        Opcode::Move,
        Opcode::LoadConstant,
        Opcode::GetLocal,
        Opcode::SetLocal,
        Opcode::NewArray,
        Opcode::SetArrayIndex,
        Opcode::GetArrayIndex,
        Opcode::NewTuple,
        Opcode::SetTupleIndex,
        Opcode::GetTupleIndex,
        Opcode::NewObject,
        Opcode::SetField,
        Opcode::GetField,
        Opcode::TryGetField,
        Opcode::NewFunction,
        Opcode::Call,
        Opcode::Jump,
        Opcode::JumpIfFalse,
        Opcode::IsEqual,
        Opcode::PushScope,
        Opcode::PopScope,
        Opcode::PushUnificationScope,
        Opcode::PopUnificationScope,
        Opcode::Unify,
        Opcode::ResolveType,
        Opcode::CheckType,
        Opcode::CheckTypeOf,
        Opcode::TypeError,
        Opcode::InferImplicitParameters,
        Opcode::NewVarType,
        Opcode::NewNameType,
        Opcode::NewArrayType,
        Opcode::NewTupleType,
        Opcode::NewRecordType,
        Opcode::NewFunctionType,
        Opcode::NewUnionType,
        Opcode::NewBindingType,
        Opcode::NewValue,
        Opcode::GetTypeForValue,
        Opcode::NewCallHole,
        Opcode::NewSubscriptHole,
        Opcode::NewMemberHole,
        Opcode::IsCell,
        Opcode::RuntimeError,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::End => "END",
            Opcode::Move => "MOVE",
            Opcode::LoadConstant => "LOAD_CONSTANT",
            Opcode::GetLocal => "GET_LOCAL",
            Opcode::SetLocal => "SET_LOCAL",
            Opcode::NewArray => "NEW_ARRAY",
            Opcode::SetArrayIndex => "SET_ARRAY_INDEX",
            Opcode::GetArrayIndex => "GET_ARRAY_INDEX",
            Opcode::NewTuple => "NEW_TUPLE",
            Opcode::SetTupleIndex => "SET_TUPLE_INDEX",
            Opcode::GetTupleIndex => "GET_TUPLE_INDEX",
            Opcode::NewObject => "NEW_OBJECT",
            Opcode::SetField => "SET_FIELD",
            Opcode::GetField => "GET_FIELD",
            Opcode::TryGetField => "TRY_GET_FIELD",
            Opcode::NewFunction => "NEW_FUNCTION",
            Opcode::Call => "CALL",
            Opcode::Jump => "JUMP",
            Opcode::JumpIfFalse => "JUMP_IF_FALSE",
            Opcode::IsEqual => "IS_EQUAL",
            Opcode::PushScope => "PUSH_SCOPE",
            Opcode::PopScope => "POP_SCOPE",
            Opcode::PushUnificationScope => "PUSH_UNIFICATION_SCOPE",
            Opcode::PopUnificationScope => "POP_UNIFICATION_SCOPE",
            Opcode::Unify => "UNIFY",
            Opcode::ResolveType => "RESOLVE_TYPE",
            Opcode::CheckType => "CHECK_TYPE",
            Opcode::CheckTypeOf => "CHECK_TYPE_OF",
            Opcode::TypeError => "TYPE_ERROR",
            Opcode::InferImplicitParameters => "INFER_IMPLICIT_PARAMETERS",
            Opcode::NewVarType => "NEW_VAR_TYPE",
            Opcode::NewNameType => "NEW_NAME_TYPE",
            Opcode::NewArrayType => "NEW_ARRAY_TYPE",
            Opcode::NewTupleType => "NEW_TUPLE_TYPE",
            Opcode::NewRecordType => "NEW_RECORD_TYPE",
            Opcode::NewFunctionType => "NEW_FUNCTION_TYPE",
            Opcode::NewUnionType => "NEW_UNION_TYPE",
            Opcode::NewBindingType => "NEW_BINDING_TYPE",
            Opcode::NewValue => "NEW_VALUE",
            Opcode::GetTypeForValue => "GET_TYPE_FOR_VALUE",
            Opcode::NewCallHole => "NEW_CALL_HOLE",
            Opcode::NewSubscriptHole => "NEW_SUBSCRIPT_HOLE",
            Opcode::NewMemberHole => "NEW_MEMBER_HOLE",
            Opcode::IsCell => "IS_CELL",
            Opcode::RuntimeError => "RUNTIME_ERROR",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Jump target of an instruction whose label is not bound yet.
pub const UNPATCHED: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    End { value: Register },
    Move { dst: Register, src: Register },
    LoadConstant { dst: Register, constant: u32 },
    GetLocal { dst: Register, identifier: u32 },
    SetLocal { identifier: u32, src: Register },
    NewArray { dst: Register, size: u32 },
    SetArrayIndex { array: Register, index: u32, value: Register },
    GetArrayIndex { dst: Register, array: Register, index: Register },
    NewTuple { dst: Register, size: u32 },
    SetTupleIndex { tuple: Register, index: u32, value: Register },
    GetTupleIndex { dst: Register, tuple: Register, index: u32 },
    NewObject { dst: Register, size: u32 },
    SetField { object: Register, field: u32, value: Register },
    GetField { dst: Register, object: Register, field: u32 },
    TryGetField { dst: Register, object: Register, field: u32, target: i32 },
    NewFunction { dst: Register, function: u32 },
    Call { dst: Register, callee: Register, argc: u32, first_arg: Register },
    Jump { target: i32 },
    JumpIfFalse { condition: Register, target: i32 },
    IsEqual { dst: Register, lhs: Register, rhs: Register },
    PushScope,
    PopScope,
    PushUnificationScope,
    PopUnificationScope,
    Unify { lhs: Register, rhs: Register },
    ResolveType { dst: Register, ty: Register },
    CheckType { dst: Register, ty: Register, expected: TypeClass },
    CheckTypeOf { dst: Register, value: Register, expected: TypeClass },
    TypeError { message: u32 },
    InferImplicitParameters { function: Register, count: u32, first: Register },
    NewVarType { dst: Register, name: u32, inferred: bool, rigid: bool },
    NewNameType { dst: Register, name: u32 },
    NewArrayType { dst: Register, item: Register },
    NewTupleType { dst: Register, count: u32, first: Register },
    NewRecordType { dst: Register, count: u32, first_key: Register, first_type: Register },
    NewFunctionType {
        dst: Register,
        param_count: u32,
        first_param: Register,
        return_type: Register,
        implicit_count: u32,
    },
    NewUnionType { dst: Register, lhs: Register, rhs: Register },
    NewBindingType { dst: Register, name: u32, ty: Register },
    NewValue { dst: Register, ty: Register },
    GetTypeForValue { dst: Register, value: Register },
    NewCallHole { dst: Register, callee: Register, argc: u32, first_arg: Register },
    NewSubscriptHole { dst: Register, target: Register, index: Register },
    NewMemberHole { dst: Register, object: Register, field: u32 },
    IsCell { dst: Register, value: Register, kind: CellKind },
    RuntimeError { message: u32 },
}

/// One encoded operand, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Register(Register),
    Constant(u32),
    Identifier(u32),
    Function(u32),
    Count(u32),
    Target(i32),
    Flag(bool),
    Class(TypeClass),
    Kind(CellKind),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(register) => write!(f, "{register}"),
            Operand::Constant(index) => write!(f, "c{index}"),
            Operand::Identifier(index) => write!(f, "id{index}"),
            Operand::Function(index) => write!(f, "fn{index}"),
            Operand::Count(count) => write!(f, "{count}"),
            Operand::Target(target) => write!(f, "->{target}"),
            Operand::Flag(flag) => write!(f, "{flag}"),
            Operand::Class(class) => write!(f, "{class}"),
            Operand::Kind(kind) => write!(f, "{}", kind.name()),
        }
    }
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::End { .. } => Opcode::End,
            Instruction::Move { .. } => Opcode::Move,
            Instruction::LoadConstant { .. } => Opcode::LoadConstant,
            Instruction::GetLocal { .. } => Opcode::GetLocal,
            Instruction::SetLocal { .. } => Opcode::SetLocal,
            Instruction::NewArray { .. } => Opcode::NewArray,
            Instruction::SetArrayIndex { .. } => Opcode::SetArrayIndex,
            Instruction::GetArrayIndex { .. } => Opcode::GetArrayIndex,
            Instruction::NewTuple { .. } => Opcode::NewTuple,
            Instruction::SetTupleIndex { .. } => Opcode::SetTupleIndex,
            Instruction::GetTupleIndex { .. } => Opcode::GetTupleIndex,
            Instruction::NewObject { .. } => Opcode::NewObject,
            Instruction::SetField { .. } => Opcode::SetField,
            Instruction::GetField { .. } => Opcode::GetField,
            Instruction::TryGetField { .. } => Opcode::TryGetField,
            Instruction::NewFunction { .. } => Opcode::NewFunction,
            Instruction::Call { .. } => Opcode::Call,
            Instruction::Jump { .. } => Opcode::Jump,
            Instruction::JumpIfFalse { .. } => Opcode::JumpIfFalse,
            Instruction::IsEqual { .. } => Opcode::IsEqual,
            Instruction::PushScope => Opcode::PushScope,
            Instruction::PopScope => Opcode::PopScope,
            Instruction::PushUnificationScope => Opcode::PushUnificationScope,
            Instruction::PopUnificationScope => Opcode::PopUnificationScope,
            Instruction::Unify { .. } => Opcode::Unify,
            Instruction::ResolveType { .. } => Opcode::ResolveType,
            Instruction::CheckType { .. } => Opcode::CheckType,
            Instruction::CheckTypeOf { .. } => Opcode::CheckTypeOf,
            Instruction::TypeError { .. } => Opcode::TypeError,
            Instruction::InferImplicitParameters { .. } => Opcode::InferImplicitParameters,
            Instruction::NewVarType { .. } => Opcode::NewVarType,
            Instruction::NewNameType { .. } => Opcode::NewNameType,
            Instruction::NewArrayType { .. } => Opcode::NewArrayType,
            Instruction::NewTupleType { .. } => Opcode::NewTupleType,
            Instruction::NewRecordType { .. } => Opcode::NewRecordType,
            Instruction::NewFunctionType { .. } => Opcode::NewFunctionType,
            Instruction::NewUnionType { .. } => Opcode::NewUnionType,
            Instruction::NewBindingType { .. } => Opcode::NewBindingType,
            Instruction::NewValue { .. } => Opcode::NewValue,
            Instruction::GetTypeForValue { .. } => Opcode::GetTypeForValue,
            Instruction::NewCallHole { .. } => Opcode::NewCallHole,
            Instruction::NewSubscriptHole { .. } => Opcode::NewSubscriptHole,
            Instruction::NewMemberHole { .. } => Opcode::NewMemberHole,
            Instruction::IsCell { .. } => Opcode::IsCell,
            Instruction::RuntimeError { .. } => Opcode::RuntimeError,
        }
    }

    /// Operands in encoding order.
    pub fn operands(&self) -> Vec<Operand> {
        use Operand::{Class, Constant, Count, Flag, Function, Identifier, Kind, Target};
        use Operand::Register as R;

        match *self {
            Instruction::End { value } => vec![R(value)],
            Instruction::Move { dst, src } => vec![R(dst), R(src)],
            Instruction::LoadConstant { dst, constant } => vec![R(dst), Constant(constant)],
            Instruction::GetLocal { dst, identifier } => vec![R(dst), Identifier(identifier)],
            Instruction::SetLocal { identifier, src } => vec![Identifier(identifier), R(src)],
            Instruction::NewArray { dst, size } => vec![R(dst), Count(size)],
            Instruction::SetArrayIndex {
                array,
                index,
                value,
            } => vec![R(array), Count(index), R(value)],
            Instruction::GetArrayIndex { dst, array, index } => vec![R(dst), R(array), R(index)],
            Instruction::NewTuple { dst, size } => vec![R(dst), Count(size)],
            Instruction::SetTupleIndex {
                tuple,
                index,
                value,
            } => vec![R(tuple), Count(index), R(value)],
            Instruction::GetTupleIndex { dst, tuple, index } => {
                vec![R(dst), R(tuple), Count(index)]
            }
            Instruction::NewObject { dst, size } => vec![R(dst), Count(size)],
            Instruction::SetField {
                object,
                field,
                value,
            } => vec![R(object), Identifier(field), R(value)],
            Instruction::GetField { dst, object, field } => {
                vec![R(dst), R(object), Identifier(field)]
            }
            Instruction::TryGetField {
                dst,
                object,
                field,
                target,
            } => vec![R(dst), R(object), Identifier(field), Target(target)],
            Instruction::NewFunction { dst, function } => vec![R(dst), Function(function)],
            Instruction::Call {
                dst,
                callee,
                argc,
                first_arg,
            } => vec![R(dst), R(callee), Count(argc), R(first_arg)],
            Instruction::Jump { target } => vec![Target(target)],
            Instruction::JumpIfFalse { condition, target } => vec![R(condition), Target(target)],
            Instruction::IsEqual { dst, lhs, rhs } => vec![R(dst), R(lhs), R(rhs)],
            Instruction::PushScope
            | Instruction::PopScope
            | Instruction::PushUnificationScope
            | Instruction::PopUnificationScope => Vec::new(),
            Instruction::Unify { lhs, rhs } => vec![R(lhs), R(rhs)],
            Instruction::ResolveType { dst, ty } => vec![R(dst), R(ty)],
            Instruction::CheckType { dst, ty, expected } => vec![R(dst), R(ty), Class(expected)],
            Instruction::CheckTypeOf {
                dst,
                value,
                expected,
            } => vec![R(dst), R(value), Class(expected)],
            Instruction::TypeError { message } => vec![Constant(message)],
            Instruction::InferImplicitParameters {
                function,
                count,
                first,
            } => vec![R(function), Count(count), R(first)],
            Instruction::NewVarType {
                dst,
                name,
                inferred,
                rigid,
            } => vec![R(dst), Identifier(name), Flag(inferred), Flag(rigid)],
            Instruction::NewNameType { dst, name } => vec![R(dst), Identifier(name)],
            Instruction::NewArrayType { dst, item } => vec![R(dst), R(item)],
            Instruction::NewTupleType { dst, count, first } => vec![R(dst), Count(count), R(first)],
            Instruction::NewRecordType {
                dst,
                count,
                first_key,
                first_type,
            } => vec![R(dst), Count(count), R(first_key), R(first_type)],
            Instruction::NewFunctionType {
                dst,
                param_count,
                first_param,
                return_type,
                implicit_count,
            } => vec![
                R(dst),
                Count(param_count),
                R(first_param),
                R(return_type),
                Count(implicit_count),
            ],
            Instruction::NewUnionType { dst, lhs, rhs } => vec![R(dst), R(lhs), R(rhs)],
            Instruction::NewBindingType { dst, name, ty } => {
                vec![R(dst), Identifier(name), R(ty)]
            }
            Instruction::NewValue { dst, ty } => vec![R(dst), R(ty)],
            Instruction::GetTypeForValue { dst, value } => vec![R(dst), R(value)],
            Instruction::NewCallHole {
                dst,
                callee,
                argc,
                first_arg,
            } => vec![R(dst), R(callee), Count(argc), R(first_arg)],
            Instruction::NewSubscriptHole { dst, target, index } => {
                vec![R(dst), R(target), R(index)]
            }
            Instruction::NewMemberHole { dst, object, field } => {
                vec![R(dst), R(object), Identifier(field)]
            }
            Instruction::IsCell { dst, value, kind } => vec![R(dst), R(value), Kind(kind)],
            Instruction::RuntimeError { message } => vec![Constant(message)],
        }
    }

    /// Contiguous register ranges read by the instruction, as
    /// `(first, count)`.
    pub fn register_ranges(&self) -> Vec<(Register, u32)> {
        match *self {
            Instruction::Call {
                argc, first_arg, ..
            }
            | Instruction::NewCallHole {
                argc, first_arg, ..
            } => vec![(first_arg, argc)],
            Instruction::InferImplicitParameters { count, first, .. } => vec![(first, count)],
            Instruction::NewTupleType { count, first, .. } => vec![(first, count)],
            Instruction::NewRecordType {
                count,
                first_key,
                first_type,
                ..
            } => vec![(first_key, count), (first_type, count)],
            Instruction::NewFunctionType {
                param_count,
                first_param,
                ..
            } => vec![(first_param, param_count)],
            _ => Vec::new(),
        }
    }

    pub fn jump_target(&self) -> Option<i32> {
        match *self {
            Instruction::Jump { target }
            | Instruction::JumpIfFalse { target, .. }
            | Instruction::TryGetField { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Rewrites the jump target. Returns `false` for instructions that do
    /// not jump.
    pub fn set_jump_target(&mut self, new_target: i32) -> bool {
        match self {
            Instruction::Jump { target }
            | Instruction::JumpIfFalse { target, .. }
            | Instruction::TryGetField { target, .. } => {
                *target = new_target;
                true
            }
            _ => false,
        }
    }

    /// Appends the opcode byte followed by each operand, big-endian.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.opcode() as u8);
        for operand in self.operands() {
            match operand {
                Operand::Register(register) => out.extend_from_slice(&register.0.to_be_bytes()),
                Operand::Constant(value)
                | Operand::Identifier(value)
                | Operand::Function(value)
                | Operand::Count(value) => out.extend_from_slice(&value.to_be_bytes()),
                Operand::Target(target) => out.extend_from_slice(&target.to_be_bytes()),
                Operand::Flag(flag) => out.push(u8::from(flag)),
                Operand::Class(class) => out.push(class as u8),
                Operand::Kind(kind) => out.push(kind as u8),
            }
        }
    }

    /// Reads one instruction starting at `*offset` and advances past it.
    pub fn decode(bytes: &[u8], offset: &mut usize) -> Result<Instruction, DecodeError> {
        let start = *offset;
        let mut reader = Reader { bytes, offset };
        let byte = reader.byte()?;
        let opcode = Opcode::from_u8(byte).ok_or(DecodeError::UnknownOpcode {
            byte,
            offset: start,
        })?;

        let instruction = match opcode {
            Opcode::End => Instruction::End {
                value: reader.register()?,
            },
            Opcode::Move => Instruction::Move {
                dst: reader.register()?,
                src: reader.register()?,
            },
            Opcode::LoadConstant => Instruction::LoadConstant {
                dst: reader.register()?,
                constant: reader.u32()?,
            },
            Opcode::GetLocal => Instruction::GetLocal {
                dst: reader.register()?,
                identifier: reader.u32()?,
            },
            Opcode::SetLocal => Instruction::SetLocal {
                identifier: reader.u32()?,
                src: reader.register()?,
            },
            Opcode::NewArray => Instruction::NewArray {
                dst: reader.register()?,
                size: reader.u32()?,
            },
            Opcode::SetArrayIndex => Instruction::SetArrayIndex {
                array: reader.register()?,
                index: reader.u32()?,
                value: reader.register()?,
            },
            Opcode::GetArrayIndex => Instruction::GetArrayIndex {
                dst: reader.register()?,
                array: reader.register()?,
                index: reader.register()?,
            },
            Opcode::NewTuple => Instruction::NewTuple {
                dst: reader.register()?,
                size: reader.u32()?,
            },
            Opcode::SetTupleIndex => Instruction::SetTupleIndex {
                tuple: reader.register()?,
                index: reader.u32()?,
                value: reader.register()?,
            },
            Opcode::GetTupleIndex => Instruction::GetTupleIndex {
                dst: reader.register()?,
                tuple: reader.register()?,
                index: reader.u32()?,
            },
            Opcode::NewObject => Instruction::NewObject {
                dst: reader.register()?,
                size: reader.u32()?,
            },
            Opcode::SetField => Instruction::SetField {
                object: reader.register()?,
                field: reader.u32()?,
                value: reader.register()?,
            },
            Opcode::GetField => Instruction::GetField {
                dst: reader.register()?,
                object: reader.register()?,
                field: reader.u32()?,
            },
            Opcode::TryGetField => Instruction::TryGetField {
                dst: reader.register()?,
                object: reader.register()?,
                field: reader.u32()?,
                target: reader.i32()?,
            },
            Opcode::NewFunction => Instruction::NewFunction {
                dst: reader.register()?,
                function: reader.u32()?,
            },
            Opcode::Call => Instruction::Call {
                dst: reader.register()?,
                callee: reader.register()?,
                argc: reader.u32()?,
                first_arg: reader.register()?,
            },
            Opcode::Jump => Instruction::Jump {
                target: reader.i32()?,
            },
            Opcode::JumpIfFalse => Instruction::JumpIfFalse {
                condition: reader.register()?,
                target: reader.i32()?,
            },
            Opcode::IsEqual => Instruction::IsEqual {
                dst: reader.register()?,
                lhs: reader.register()?,
                rhs: reader.register()?,
            },
            Opcode::PushScope => Instruction::PushScope,
            Opcode::PopScope => Instruction::PopScope,
            Opcode::PushUnificationScope => Instruction::PushUnificationScope,
            Opcode::PopUnificationScope => Instruction::PopUnificationScope,
            Opcode::Unify => Instruction::Unify {
                lhs: reader.register()?,
                rhs: reader.register()?,
            },
            Opcode::ResolveType => Instruction::ResolveType {
                dst: reader.register()?,
                ty: reader.register()?,
            },
            Opcode::CheckType => Instruction::CheckType {
                dst: reader.register()?,
                ty: reader.register()?,
                expected: reader.class()?,
            },
            Opcode::CheckTypeOf => Instruction::CheckTypeOf {
                dst: reader.register()?,
                value: reader.register()?,
                expected: reader.class()?,
            },
            Opcode::TypeError => Instruction::TypeError {
                message: reader.u32()?,
            },
            Opcode::InferImplicitParameters => Instruction::InferImplicitParameters {
                function: reader.register()?,
                count: reader.u32()?,
                first: reader.register()?,
            },
            Opcode::NewVarType => Instruction::NewVarType {
                dst: reader.register()?,
                name: reader.u32()?,
                inferred: reader.flag()?,
                rigid: reader.flag()?,
            },
            Opcode::NewNameType => Instruction::NewNameType {
                dst: reader.register()?,
                name: reader.u32()?,
            },
            Opcode::NewArrayType => Instruction::NewArrayType {
                dst: reader.register()?,
                item: reader.register()?,
            },
            Opcode::NewTupleType => Instruction::NewTupleType {
                dst: reader.register()?,
                count: reader.u32()?,
                first: reader.register()?,
            },
            Opcode::NewRecordType => Instruction::NewRecordType {
                dst: reader.register()?,
                count: reader.u32()?,
                first_key: reader.register()?,
                first_type: reader.register()?,
            },
            Opcode::NewFunctionType => Instruction::NewFunctionType {
                dst: reader.register()?,
                param_count: reader.u32()?,
                first_param: reader.register()?,
                return_type: reader.register()?,
                implicit_count: reader.u32()?,
            },
            Opcode::NewUnionType => Instruction::NewUnionType {
                dst: reader.register()?,
                lhs: reader.register()?,
                rhs: reader.register()?,
            },
            Opcode::NewBindingType => Instruction::NewBindingType {
                dst: reader.register()?,
                name: reader.u32()?,
                ty: reader.register()?,
            },
            Opcode::NewValue => Instruction::NewValue {
                dst: reader.register()?,
                ty: reader.register()?,
            },
            Opcode::GetTypeForValue => Instruction::GetTypeForValue {
                dst: reader.register()?,
                value: reader.register()?,
            },
            Opcode::NewCallHole => Instruction::NewCallHole {
                dst: reader.register()?,
                callee: reader.register()?,
                argc: reader.u32()?,
                first_arg: reader.register()?,
            },
            Opcode::NewSubscriptHole => Instruction::NewSubscriptHole {
                dst: reader.register()?,
                target: reader.register()?,
                index: reader.register()?,
            },
            Opcode::NewMemberHole => Instruction::NewMemberHole {
                dst: reader.register()?,
                object: reader.register()?,
                field: reader.u32()?,
            },
            Opcode::IsCell => Instruction::IsCell {
                dst: reader.register()?,
                value: reader.register()?,
                kind: reader.kind()?,
            },
            Opcode::RuntimeError => Instruction::RuntimeError {
                message: reader.u32()?,
            },
        };
        Ok(instruction)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode())?;
        for (index, operand) in self.operands().iter().enumerate() {
            let separator = if index == 0 { " " } else { ", " };
            write!(f, "{separator}{operand}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of bytecode at offset {offset}")]
    UnexpectedEnd { offset: usize },
    #[error("unknown opcode {byte:#04x} at offset {offset}")]
    UnknownOpcode { byte: u8, offset: usize },
    #[error("invalid {operand} operand {value} at offset {offset}")]
    InvalidOperand {
        operand: &'static str,
        value: u8,
        offset: usize,
    },
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: &'a mut usize,
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let start = *self.offset;
        let slice = self
            .bytes
            .get(start..start + N)
            .ok_or(DecodeError::UnexpectedEnd { offset: start })?;
        let mut buffer = [0u8; N];
        buffer.copy_from_slice(slice);
        *self.offset = start + N;
        Ok(buffer)
    }

    fn byte(&mut self) -> Result<u8, DecodeError> {
        let [byte] = self.take::<1>()?;
        Ok(byte)
    }

    fn register(&mut self) -> Result<Register, DecodeError> {
        Ok(Register(u16::from_be_bytes(self.take()?)))
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.take()?))
    }

    fn i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.take()?))
    }

    fn flag(&mut self) -> Result<bool, DecodeError> {
        let offset = *self.offset;
        match self.byte()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(DecodeError::InvalidOperand {
                operand: "flag",
                value,
                offset,
            }),
        }
    }

    fn class(&mut self) -> Result<TypeClass, DecodeError> {
        let offset = *self.offset;
        let value = self.byte()?;
        TypeClass::from_u8(value).ok_or(DecodeError::InvalidOperand {
            operand: "type class",
            value,
            offset,
        })
    }

    fn kind(&mut self) -> Result<CellKind, DecodeError> {
        let offset = *self.offset;
        let value = self.byte()?;
        CellKind::from_u8(value).ok_or(DecodeError::InvalidOperand {
            operand: "cell kind",
            value,
            offset,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{block}` instruction {offset} ({instruction}): {message}")]
pub struct VerifyError {
    pub block: String,
    pub offset: usize,
    pub instruction: String,
    pub message: String,
}

/// A finished unit of bytecode: the program body or one function.
///
/// Function blocks start with a type section that rebuilds their signature;
/// value code begins at `code_start`.
#[derive(Debug, Clone, PartialEq)]
pub struct BytecodeBlock {
    pub name: String,
    pub instructions: Vec<Instruction>,
    pub constants: Vec<Constant>,
    pub identifiers: Vec<String>,
    pub functions: Vec<Rc<BytecodeBlock>>,
    pub parameter_count: u32,
    pub register_count: u32,
    pub code_start: u32,
}

impl BytecodeBlock {
    pub fn new<S: Into<String>>(name: S, parameter_count: u32) -> Self {
        Self {
            name: name.into(),
            instructions: Vec::new(),
            constants: Vec::new(),
            identifiers: Vec::new(),
            functions: Vec::new(),
            parameter_count,
            register_count: parameter_count,
            code_start: 0,
        }
    }

    pub fn emit(&mut self, instruction: Instruction) -> usize {
        let index = self.instructions.len();
        self.instructions.push(instruction);
        index
    }

    /// Interns a constant, returning the index of an identical entry when
    /// one exists.
    pub fn add_constant(&mut self, constant: Constant) -> u32 {
        if let Some(index) = self
            .constants
            .iter()
            .position(|existing| existing.same(&constant))
        {
            return index as u32;
        }
        self.constants.push(constant);
        (self.constants.len() - 1) as u32
    }

    pub fn add_identifier(&mut self, name: &str) -> u32 {
        if let Some(index) = self.identifiers.iter().position(|existing| existing == name) {
            return index as u32;
        }
        self.identifiers.push(name.to_string());
        (self.identifiers.len() - 1) as u32
    }

    pub fn add_function(&mut self, block: BytecodeBlock) -> u32 {
        self.functions.push(Rc::new(block));
        (self.functions.len() - 1) as u32
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn constant(&self, index: u32) -> Option<&Constant> {
        self.constants.get(index as usize)
    }

    pub fn identifier(&self, index: u32) -> Option<&str> {
        self.identifiers.get(index as usize).map(String::as_str)
    }

    pub fn function(&self, index: u32) -> Option<&Rc<BytecodeBlock>> {
        self.functions.get(index as usize)
    }

    pub fn opcodes(&self) -> Vec<Opcode> {
        self.instructions
            .iter()
            .map(Instruction::opcode)
            .collect()
    }

    pub fn count(&self, opcode: Opcode) -> usize {
        self.instructions
            .iter()
            .filter(|instruction| instruction.opcode() == opcode)
            .count()
    }

    /// The instruction stream of this block, without nested functions.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for instruction in &self.instructions {
            instruction.encode(&mut bytes);
        }
        bytes
    }

    pub fn decode_instructions(bytes: &[u8]) -> Result<Vec<Instruction>, DecodeError> {
        let mut offset = 0;
        let mut instructions = Vec::new();
        while offset < bytes.len() {
            instructions.push(Instruction::decode(bytes, &mut offset)?);
        }
        Ok(instructions)
    }

    /// Checks every operand of this block and its nested functions against
    /// the pools, function table and register file.
    pub fn verify(&self) -> Result<(), VerifyError> {
        for (offset, instruction) in self.instructions.iter().enumerate() {
            self.verify_instruction(offset, instruction)?;
        }
        for function in &self.functions {
            function.verify()?;
        }
        Ok(())
    }

    fn verify_instruction(&self, offset: usize, instruction: &Instruction) -> Result<(), VerifyError> {
        for operand in instruction.operands() {
            let problem = match operand {
                Operand::Register(register) if u32::from(register.0) >= self.register_count => {
                    Some(format!(
                        "register {register} outside register file of {}",
                        self.register_count
                    ))
                }
                Operand::Constant(index) if index as usize >= self.constants.len() => {
                    Some(format!("constant c{index} out of range"))
                }
                Operand::Identifier(index) if index as usize >= self.identifiers.len() => {
                    Some(format!("identifier id{index} out of range"))
                }
                Operand::Function(index) if index as usize >= self.functions.len() => {
                    Some(format!("function fn{index} out of range"))
                }
                Operand::Target(target)
                    if target < 0 || target as usize >= self.instructions.len() =>
                {
                    Some(format!("jump target {target} out of range"))
                }
                _ => None,
            };
            if let Some(message) = problem {
                return Err(self.verify_error(offset, instruction, message));
            }
        }

        for (first, count) in instruction.register_ranges() {
            let end = u32::from(first.0) + count;
            if count > 0 && end > self.register_count {
                return Err(self.verify_error(
                    offset,
                    instruction,
                    format!("register range {first}..r{end} outside register file"),
                ));
            }
        }

        if let Instruction::TypeError { message } | Instruction::RuntimeError { message } =
            instruction
        {
            if !matches!(self.constant(*message), Some(Constant::String(_))) {
                return Err(self.verify_error(
                    offset,
                    instruction,
                    "message operand is not a string constant".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn verify_error(&self, offset: usize, instruction: &Instruction, message: String) -> VerifyError {
        VerifyError {
            block: self.name.clone(),
            offset,
            instruction: instruction.to_string(),
            message,
        }
    }

    pub fn disassemble(&self) -> String {
        self.to_string()
    }

    fn write_listing(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        writeln!(
            f,
            "{indent}block `{}` (parameters: {}, registers: {}, code start: {})",
            self.name, self.parameter_count, self.register_count, self.code_start
        )?;
        for (index, constant) in self.constants.iter().enumerate() {
            writeln!(f, "{indent}  c{index} = {constant}")?;
        }
        for (index, identifier) in self.identifiers.iter().enumerate() {
            writeln!(f, "{indent}  id{index} = {identifier}")?;
        }
        for (index, instruction) in self.instructions.iter().enumerate() {
            let marker = if index as u32 == self.code_start && self.code_start > 0 {
                ">"
            } else {
                " "
            };
            writeln!(f, "{indent} {marker}{index:04} {instruction}")?;
        }
        for function in &self.functions {
            function.write_listing(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for BytecodeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_listing(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_interned() {
        let mut block = BytecodeBlock::new("test", 0);
        let first = block.add_constant(Constant::Number(1.5));
        let second = block.add_constant(Constant::String("x".into()));
        assert_eq!(block.add_constant(Constant::Number(1.5)), first);
        assert_eq!(block.add_constant(Constant::String("x".into())), second);
        let negative_zero = block.add_constant(Constant::Number(-0.0));
        assert_ne!(negative_zero, block.add_constant(Constant::Number(0.0)));
    }

    #[test]
    fn decodes_what_it_encodes() {
        let r = Register;
        let samples = [
            Instruction::End { value: r(1) },
            Instruction::TryGetField {
                dst: r(1),
                object: r(2),
                field: 3,
                target: 40,
            },
            Instruction::NewVarType {
                dst: r(0),
                name: 7,
                inferred: true,
                rigid: false,
            },
            Instruction::NewFunctionType {
                dst: r(1),
                param_count: 2,
                first_param: r(2),
                return_type: r(4),
                implicit_count: 1,
            },
            Instruction::CheckTypeOf {
                dst: r(3),
                value: r(4),
                expected: TypeClass::Record,
            },
            Instruction::IsCell {
                dst: r(0),
                value: r(1),
                kind: CellKind::Hole,
            },
            Instruction::PopUnificationScope,
        ];
        let mut bytes = Vec::new();
        for instruction in &samples {
            instruction.encode(&mut bytes);
        }
        let decoded = BytecodeBlock::decode_instructions(&bytes).expect("decode");
        assert_eq!(decoded, samples);
    }

    #[test]
    fn rejects_truncated_streams_and_unknown_opcodes() {
        let mut bytes = Vec::new();
        Instruction::Jump { target: 3 }.encode(&mut bytes);
        bytes.pop();
        let mut offset = 0;
        assert_eq!(
            Instruction::decode(&bytes, &mut offset),
            Err(DecodeError::UnexpectedEnd { offset: 1 })
        );

        let mut offset = 0;
        assert_eq!(
            Instruction::decode(&[0xff], &mut offset),
            Err(DecodeError::UnknownOpcode {
                byte: 0xff,
                offset: 0
            })
        );
    }

    #[test]
    fn verify_reports_out_of_range_jumps() {
        let mut block = BytecodeBlock::new("broken", 0);
        block.register_count = 1;
        block.emit(Instruction::Jump { target: 5 });
        block.emit(Instruction::End { value: Register(0) });
        let error = block.verify().expect_err("jump past the end");
        assert_eq!(error.offset, 0);
        assert!(error.message.contains("jump target 5"));
    }

    #[test]
    fn display_uses_upper_snake_mnemonics() {
        let instruction = Instruction::JumpIfFalse {
            condition: Register(2),
            target: 9,
        };
        assert_eq!(instruction.to_string(), "JUMP_IF_FALSE r2, ->9");
        assert_eq!(Instruction::PushScope.to_string(), "PUSH_SCOPE");
    }
}
