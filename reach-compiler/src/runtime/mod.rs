mod bytecode;
mod codegen;
mod value;
mod vm;

pub use bytecode::{
    BytecodeBlock, CellKind, Constant, DecodeError, Instruction, Opcode, Operand, Register,
    VerifyError, UNPATCHED,
};
pub use codegen::CodeGenerator;
pub use value::{Closure, Environment, Hole, Shared, Value};
pub use vm::{Vm, VmError};
