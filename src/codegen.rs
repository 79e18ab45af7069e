//! x86-64 assembly emission from TAC.
//!
//! Generates AT&T-syntax assembly as text, the same way the IR dumps are
//! produced: written into a `String` and handed to the driver, which feeds
//! it to the external assembler.
//!
//! Register allocation is a fixed stack-slot scheme: temporary `N` lives at
//! `-(N+1)*8(%rbp)` for the whole function, `%eax` (plus `%edx` for
//! division and `%ecx` as the divisor scratch) carries values between
//! slots. All arithmetic is 32-bit. The frame is `(max_temp_id + 1) * 8`
//! bytes rounded up to a 16-byte multiple, never below 32.
//!
//! Global symbol names take a leading underscore under the Mach-O
//! convention; the `CompilerConfig` switch selects it, defaulting from the
//! host.

use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::tac::{BinaryOp, Instruction, Operand, TacFunction, TacProgram, UnaryOp};
use std::fmt::Write as _;

/// Smallest frame the prologue ever reserves.
const MIN_FRAME_BYTES: usize = 32;

/// Emit a whole program as assembly text.
pub fn emit(program: &TacProgram<'_>, config: &CompilerConfig) -> Result<String, CompileError> {
    let mut codegen = CodeGen::new(config);
    for function in &program.functions {
        codegen.emit_function(function)?;
    }
    Ok(codegen.out)
}

/// Highest temporary id appearing in any operand of `instructions`.
fn max_temp_id(instructions: &[Instruction<'_>]) -> Option<u32> {
    let mut max: Option<u32> = None;
    let mut note = |operand: &Operand<'_>| {
        if let Some(id) = operand.temp_id() {
            max = Some(max.map_or(id, |m| m.max(id)));
        }
    };
    for instruction in instructions {
        match instruction {
            Instruction::Copy { dst, src } | Instruction::Unary { dst, src, .. } => {
                note(dst);
                note(src);
            }
            Instruction::Binary {
                dst, src1, src2, ..
            } => {
                note(dst);
                note(src1);
                note(src2);
            }
            Instruction::JumpIfZero { cond, .. } | Instruction::JumpIfNotZero { cond, .. } => {
                note(cond)
            }
            Instruction::Return(src) => note(src),
            Instruction::Label(_) | Instruction::Jump(_) => {}
        }
    }
    max
}

/// `max(32, round_up((max_temp_id + 1) * 8, 16))`
fn frame_size(instructions: &[Instruction<'_>]) -> usize {
    let slots = max_temp_id(instructions).map_or(0, |max| max as usize + 1);
    let bytes = (slots * 8).div_ceil(16) * 16;
    bytes.max(MIN_FRAME_BYTES)
}

/// Memory or immediate operand text: `$<n>` or `-N(%rbp)`.
fn operand(op: &Operand<'_>) -> String {
    match op {
        Operand::Constant(value) => format!("${}", value),
        Operand::Temp { id, .. } => format!("-{}(%rbp)", (id + 1) * 8),
    }
}

struct CodeGen<'c> {
    config: &'c CompilerConfig,
    out: String,
}

impl<'c> CodeGen<'c> {
    fn new(config: &'c CompilerConfig) -> Self {
        CodeGen {
            config,
            out: String::new(),
        }
    }

    fn symbol_prefix(&self) -> &'static str {
        if self.config.underscore_prefix { "_" } else { "" }
    }

    fn emit_function(&mut self, function: &TacFunction<'_>) -> Result<(), CompileError> {
        let prefix = self.symbol_prefix();
        writeln!(self.out, "\t.globl {}{}", prefix, function.name)?;
        writeln!(self.out, "{}{}:", prefix, function.name)?;
        writeln!(self.out, "\tpushq %rbp")?;
        writeln!(self.out, "\tmovq %rsp, %rbp")?;
        writeln!(self.out, "\tsubq ${}, %rsp", frame_size(&function.instructions))?;
        for instruction in &function.instructions {
            self.emit_instruction(instruction)?;
        }
        Ok(())
    }

    fn emit_instruction(&mut self, instruction: &Instruction<'_>) -> Result<(), CompileError> {
        match instruction {
            Instruction::Copy { dst, src } => self.emit_copy(dst, src),
            Instruction::Unary { op, dst, src } => match op {
                UnaryOp::Negate => self.emit_through_eax("negl", dst, src),
                UnaryOp::Complement => self.emit_complement(dst, src),
                UnaryOp::Not => self.emit_logical_not(dst, src),
            },
            Instruction::Binary {
                op,
                dst,
                src1,
                src2,
            } => match op {
                BinaryOp::Add => self.emit_arithmetic("addl", dst, src1, src2),
                BinaryOp::Sub => self.emit_arithmetic("subl", dst, src1, src2),
                BinaryOp::Mul => self.emit_arithmetic("imull", dst, src1, src2),
                BinaryOp::Div => self.emit_division(dst, src1, src2, "%eax"),
                BinaryOp::Mod => self.emit_division(dst, src1, src2, "%edx"),
                BinaryOp::Less => self.emit_relational("l", dst, src1, src2),
                BinaryOp::Greater => self.emit_relational("g", dst, src1, src2),
                BinaryOp::LessEq => self.emit_relational("le", dst, src1, src2),
                BinaryOp::GreaterEq => self.emit_relational("ge", dst, src1, src2),
                BinaryOp::Equal => self.emit_relational("e", dst, src1, src2),
                BinaryOp::NotEqual => self.emit_relational("ne", dst, src1, src2),
            },
            Instruction::Label(name) => {
                writeln!(self.out, "{}:", name)?;
                Ok(())
            }
            Instruction::Jump(target) => {
                writeln!(self.out, "\tjmp {}", target)?;
                Ok(())
            }
            Instruction::JumpIfZero { cond, target } => self.emit_branch("jz", cond, target),
            Instruction::JumpIfNotZero { cond, target } => self.emit_branch("jnz", cond, target),
            Instruction::Return(src) => {
                writeln!(self.out, "\tmovl {}, %eax", operand(src))?;
                writeln!(self.out, "\tleave")?;
                writeln!(self.out, "\tretq")?;
                Ok(())
            }
        }
    }

    fn emit_copy(&mut self, dst: &Operand<'_>, src: &Operand<'_>) -> Result<(), CompileError> {
        // Constants move straight to memory; slot-to-slot goes through %eax.
        match src {
            Operand::Constant(_) => {
                writeln!(self.out, "\tmovl {}, {}", operand(src), operand(dst))?;
            }
            Operand::Temp { .. } => {
                writeln!(self.out, "\tmovl {}, %eax", operand(src))?;
                writeln!(self.out, "\tmovl %eax, {}", operand(dst))?;
            }
        }
        Ok(())
    }

    /// `movl src, %eax; <op> %eax; movl %eax, dst`
    fn emit_through_eax(
        &mut self,
        mnemonic: &str,
        dst: &Operand<'_>,
        src: &Operand<'_>,
    ) -> Result<(), CompileError> {
        writeln!(self.out, "\tmovl {}, %eax", operand(src))?;
        writeln!(self.out, "\t{} %eax", mnemonic)?;
        writeln!(self.out, "\tmovl %eax, {}", operand(dst))?;
        Ok(())
    }

    fn emit_complement(
        &mut self,
        dst: &Operand<'_>,
        src: &Operand<'_>,
    ) -> Result<(), CompileError> {
        if dst.same_temp(src) {
            writeln!(self.out, "\tnotl {}", operand(dst))?;
            Ok(())
        } else {
            self.emit_through_eax("notl", dst, src)
        }
    }

    fn emit_logical_not(
        &mut self,
        dst: &Operand<'_>,
        src: &Operand<'_>,
    ) -> Result<(), CompileError> {
        writeln!(self.out, "\tmovl {}, %eax", operand(src))?;
        writeln!(self.out, "\tcmpl $0, %eax")?;
        writeln!(self.out, "\tsete %al")?;
        writeln!(self.out, "\tmovzbl %al, %eax")?;
        writeln!(self.out, "\tmovl %eax, {}", operand(dst))?;
        Ok(())
    }

    fn emit_arithmetic(
        &mut self,
        mnemonic: &str,
        dst: &Operand<'_>,
        src1: &Operand<'_>,
        src2: &Operand<'_>,
    ) -> Result<(), CompileError> {
        writeln!(self.out, "\tmovl {}, %eax", operand(src1))?;
        writeln!(self.out, "\t{} {}, %eax", mnemonic, operand(src2))?;
        writeln!(self.out, "\tmovl %eax, {}", operand(dst))?;
        Ok(())
    }

    /// `idivl` has no immediate form, so constant divisors go through %ecx.
    fn emit_division(
        &mut self,
        dst: &Operand<'_>,
        src1: &Operand<'_>,
        src2: &Operand<'_>,
        result_register: &str,
    ) -> Result<(), CompileError> {
        writeln!(self.out, "\tmovl {}, %eax", operand(src1))?;
        writeln!(self.out, "\tcltd")?;
        match src2 {
            Operand::Constant(_) => {
                writeln!(self.out, "\tmovl {}, %ecx", operand(src2))?;
                writeln!(self.out, "\tidivl %ecx")?;
            }
            Operand::Temp { .. } => {
                writeln!(self.out, "\tidivl {}", operand(src2))?;
            }
        }
        writeln!(self.out, "\tmovl {}, {}", result_register, operand(dst))?;
        Ok(())
    }

    /// `cmpl src2, src1` then materialise the flag via `set<cc>`.
    fn emit_relational(
        &mut self,
        condition_code: &str,
        dst: &Operand<'_>,
        src1: &Operand<'_>,
        src2: &Operand<'_>,
    ) -> Result<(), CompileError> {
        writeln!(self.out, "\tmovl {}, %eax", operand(src1))?;
        writeln!(self.out, "\tcmpl {}, %eax", operand(src2))?;
        writeln!(self.out, "\tset{} %al", condition_code)?;
        writeln!(self.out, "\tmovzbl %al, %eax")?;
        writeln!(self.out, "\tmovl %eax, {}", operand(dst))?;
        Ok(())
    }

    fn emit_branch(
        &mut self,
        mnemonic: &str,
        cond: &Operand<'_>,
        target: &str,
    ) -> Result<(), CompileError> {
        writeln!(self.out, "\tmovl {}, %eax", operand(cond))?;
        writeln!(self.out, "\ttestl %eax, %eax")?;
        writeln!(self.out, "\t{} {}", mnemonic, target)?;
        Ok(())
    }
}
