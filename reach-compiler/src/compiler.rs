use anyhow::{bail, Result};
use log::debug;

use crate::ast::Program;
use crate::diagnostics::Diagnostics;
use crate::runtime::{BytecodeBlock, CodeGenerator, Value, Vm, VmError};
use crate::typechecker::{CheckReport, TypeChecker};

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Emit run-time checks for annotated bindings fed by holes.
    pub runtime_checks: bool,
    /// Fail instead of generating code for the accepted declarations.
    pub deny_errors: bool,
    pub dump_bytecode: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            runtime_checks: true,
            deny_errors: false,
            dump_bytecode: false,
        }
    }
}

pub struct Compilation {
    /// The program with resolved types attached.
    pub program: Program,
    pub block: BytecodeBlock,
    pub report: CheckReport,
}

impl Compilation {
    pub fn run(&self) -> Result<Value, VmError> {
        Vm::new().run(&self.block)
    }
}

pub struct Compiler {
    diagnostics: Diagnostics,
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            diagnostics: Diagnostics::new(),
            options,
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn compile(&mut self, mut program: Program) -> Result<Compilation> {
        let mut checker = TypeChecker::new();
        let report = checker.check_program(&mut program);
        self.diagnostics.extend(checker.into_diagnostics());

        if self.options.deny_errors && !self.diagnostics.is_empty() {
            bail!("Type checking failed");
        }

        let generator = CodeGenerator::new().with_runtime_checks(self.options.runtime_checks);
        let block = generator.generate_program(&program, &report)?;

        if self.options.dump_bytecode {
            debug!("bytecode:\n{}", block.disassemble());
        }

        Ok(Compilation {
            program,
            block,
            report,
        })
    }
}
