//! AST to three-address code lowering.
//!
//! Two mutually recursive visitors: statements and declarations produce no
//! value; expressions return the operand holding their result. A caller may
//! pass a target-temp hint into expression lowering: when the expression
//! naturally materialises a result (unary, binary), it is written straight
//! into the hinted temporary instead of a fresh one, which elides the copy
//! when an initialiser lowers directly into its variable's slot.
//!
//! Temporary ids for variables are pre-assigned by the validator; the
//! fresh-temp counter starts past the highest of those so expression
//! temporaries never collide with variable temporaries. Labels come from a
//! separate monotonic counter, `L0`, `L1`, … unique within the function.

use crate::arena::Arena;
use crate::ast;
use crate::ast::{Block, BlockItem, Exp, FuncDef, Program, Stmt, VarDecl};
use crate::error::CompileError;
use crate::tac::{BinaryOp, Instruction, Operand, TacFunction, TacProgram, UnaryOp};

/// Lower a validated program to TAC.
pub fn lower<'a>(program: Program<'a>, arena: &'a Arena) -> Result<TacProgram<'a>, CompileError> {
    let function = TacGen::new(arena).lower_function(program.function)?;
    Ok(TacProgram {
        functions: vec![function],
    })
}

fn unary_op(op: ast::UnaryOp) -> UnaryOp {
    match op {
        ast::UnaryOp::Negate => UnaryOp::Negate,
        ast::UnaryOp::Complement => UnaryOp::Complement,
        ast::UnaryOp::Not => UnaryOp::Not,
    }
}

/// Arithmetic and relational operators map one-to-one; `&&` and `||` have
/// no TAC counterpart and lower to control flow instead.
fn binary_op(op: ast::BinaryOp) -> Option<BinaryOp> {
    match op {
        ast::BinaryOp::Add => Some(BinaryOp::Add),
        ast::BinaryOp::Subtract => Some(BinaryOp::Sub),
        ast::BinaryOp::Multiply => Some(BinaryOp::Mul),
        ast::BinaryOp::Divide => Some(BinaryOp::Div),
        ast::BinaryOp::Remainder => Some(BinaryOp::Mod),
        ast::BinaryOp::LessThan => Some(BinaryOp::Less),
        ast::BinaryOp::GreaterThan => Some(BinaryOp::Greater),
        ast::BinaryOp::LessEqual => Some(BinaryOp::LessEq),
        ast::BinaryOp::GreaterEqual => Some(BinaryOp::GreaterEq),
        ast::BinaryOp::Equal => Some(BinaryOp::Equal),
        ast::BinaryOp::NotEqual => Some(BinaryOp::NotEqual),
        ast::BinaryOp::And | ast::BinaryOp::Or => None,
    }
}

/// Highest validator-assigned temporary id in the body, if any.
fn max_declared_temp(block: &Block<'_>) -> Option<u32> {
    block
        .items
        .iter()
        .filter_map(|item| match item {
            BlockItem::Decl(decl) => decl.resolved.map(|r| r.temp_id),
            BlockItem::Stmt(_) => None,
        })
        .max()
}

struct TacGen<'a> {
    arena: &'a Arena,
    next_temp: u32,
    next_label: u32,
    instructions: Vec<Instruction<'a>>,
}

impl<'a> TacGen<'a> {
    fn new(arena: &'a Arena) -> Self {
        TacGen {
            arena,
            next_temp: 0,
            next_label: 0,
            instructions: Vec::new(),
        }
    }

    fn lower_function(mut self, function: &'a FuncDef<'a>) -> Result<TacFunction<'a>, CompileError> {
        self.next_temp = max_declared_temp(&function.body).map_or(0, |max| max + 1);
        self.emit_block(&function.body)?;
        // A body that falls off the end returns 0, as main does in C.
        if !matches!(self.instructions.last(), Some(Instruction::Return(_))) {
            self.instructions.push(Instruction::Return(Operand::Constant(0)));
        }
        Ok(TacFunction {
            name: function.name,
            instructions: self.instructions,
        })
    }

    fn emit_block(&mut self, block: &Block<'a>) -> Result<(), CompileError> {
        for item in block.items {
            match item {
                BlockItem::Decl(decl) => self.emit_vardecl(decl)?,
                BlockItem::Stmt(stmt) => self.emit_stmt(stmt)?,
            }
        }
        Ok(())
    }

    fn emit_vardecl(&mut self, decl: &'a VarDecl<'a>) -> Result<(), CompileError> {
        let Some(init) = decl.init else {
            return Ok(());
        };
        let var = self.decl_operand(decl)?;
        let value = self.emit_exp(init, Some(var))?;
        // The hint may have been consumed by the initialiser itself; only
        // materialise when the value landed somewhere else.
        if !value.same_temp(&var) {
            self.instructions.push(Instruction::Copy {
                dst: var,
                src: value,
            });
        }
        Ok(())
    }

    fn emit_stmt(&mut self, stmt: &'a Stmt<'a>) -> Result<(), CompileError> {
        match stmt {
            Stmt::Return(value) => {
                let src = self.emit_exp(value, None)?;
                self.instructions.push(Instruction::Return(src));
                Ok(())
            }
            Stmt::Expression(exp) => {
                self.emit_exp(exp, None)?;
                Ok(())
            }
        }
    }

    /// Lower an expression; the returned operand holds its value. With a
    /// hint, instructions that produce a fresh destination write into the
    /// hinted temporary instead.
    fn emit_exp(
        &mut self,
        exp: &'a Exp<'a>,
        hint: Option<Operand<'a>>,
    ) -> Result<Operand<'a>, CompileError> {
        match exp {
            Exp::IntLiteral(value) => Ok(Operand::Constant(*value)),
            Exp::Var { .. } => self.var_operand(exp),
            Exp::Unary { op, operand } => {
                let src = self.emit_exp(operand, None)?;
                let dst = self.destination(hint);
                self.instructions.push(Instruction::Unary {
                    op: unary_op(*op),
                    dst,
                    src,
                });
                Ok(dst)
            }
            Exp::Binary { op, lhs, rhs } => match binary_op(*op) {
                Some(op) => {
                    let src1 = self.emit_exp(lhs, None)?;
                    let src2 = self.emit_exp(rhs, None)?;
                    let dst = self.destination(hint);
                    self.instructions.push(Instruction::Binary {
                        op,
                        dst,
                        src1,
                        src2,
                    });
                    Ok(dst)
                }
                None => self.emit_short_circuit(*op, lhs, rhs, hint),
            },
            Exp::Assignment { target, value, .. } => {
                let target = self.emit_exp(target, None)?;
                let value = self.emit_exp(value, None)?;
                self.instructions.push(Instruction::Copy {
                    dst: target,
                    src: value,
                });
                // An assignment expression's value is its right side.
                Ok(value)
            }
        }
    }

    /// Shared lowering for `&&` and `||`.
    ///
    /// ```text
    /// lower(lhs)
    /// if_false lhs goto Lshort      (if_true for ||)
    /// lower(rhs)
    /// dst = rhs != 0
    /// goto Lend
    /// Lshort:
    /// dst = 0                       (1 for ||)
    /// Lend:
    /// ```
    fn emit_short_circuit(
        &mut self,
        op: ast::BinaryOp,
        lhs: &'a Exp<'a>,
        rhs: &'a Exp<'a>,
        hint: Option<Operand<'a>>,
    ) -> Result<Operand<'a>, CompileError> {
        let is_and = op == ast::BinaryOp::And;
        let short_label = self.fresh_label();
        let end_label = self.fresh_label();

        let lhs_value = self.emit_exp(lhs, None)?;
        self.instructions.push(if is_and {
            Instruction::JumpIfZero {
                cond: lhs_value,
                target: short_label,
            }
        } else {
            Instruction::JumpIfNotZero {
                cond: lhs_value,
                target: short_label,
            }
        });

        let rhs_value = self.emit_exp(rhs, None)?;
        let dst = self.destination(hint);
        self.instructions.push(Instruction::Binary {
            op: BinaryOp::NotEqual,
            dst,
            src1: rhs_value,
            src2: Operand::Constant(0),
        });
        self.instructions.push(Instruction::Jump(end_label));
        self.instructions.push(Instruction::Label(short_label));
        self.instructions.push(Instruction::Copy {
            dst,
            src: Operand::Constant(if is_and { 0 } else { 1 }),
        });
        self.instructions.push(Instruction::Label(end_label));
        Ok(dst)
    }

    /// The hint always wins over a fresh destination.
    fn destination(&mut self, hint: Option<Operand<'a>>) -> Operand<'a> {
        hint.unwrap_or_else(|| self.fresh_temp())
    }

    fn fresh_temp(&mut self) -> Operand<'a> {
        let id = self.next_temp;
        self.next_temp += 1;
        Operand::Temp { id, name: None }
    }

    fn fresh_label(&mut self) -> &'a str {
        let label = self.arena.alloc_format(format_args!("L{}", self.next_label));
        self.next_label += 1;
        label
    }

    fn decl_operand(&self, decl: &VarDecl<'a>) -> Result<Operand<'a>, CompileError> {
        let resolved = decl
            .resolved
            .ok_or_else(|| CompileError::internal("lowering an unvalidated declaration"))?;
        Ok(Operand::Temp {
            id: resolved.temp_id,
            name: Some(resolved.decorated),
        })
    }

    fn var_operand(&self, exp: &Exp<'a>) -> Result<Operand<'a>, CompileError> {
        let Exp::Var { resolved, .. } = exp else {
            return Err(CompileError::internal("expected an identifier expression"));
        };
        let resolved =
            resolved.ok_or_else(|| CompileError::internal("lowering an unresolved identifier"))?;
        Ok(Operand::Temp {
            id: resolved.temp_id,
            name: Some(resolved.decorated),
        })
    }
}
