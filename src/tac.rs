//! Three-address code, the linear IR between the AST and assembly.
//!
//! Each instruction has at most one operator and up to three operands (one
//! destination, two sources). Control flow is explicit: labels, jumps and
//! conditional jumps on zero/non-zero. Temporaries are virtual registers
//! identified by a small integer; the code generator later backs each one
//! with a stack slot.
//!
//! The `Display` impl on `TacProgram` is the `--tac` dump:
//!
//! ```text
//! program:
//!   function main:
//!     x.0 = 10
//!     t1 = x.0 + 2
//!     return t1
//! end program
//! ```
//!
//! Named temporaries print as their decorated name, unnamed ones as `tN`.

use std::fmt;

/// A value an instruction reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand<'a> {
    Constant(i64),
    Temp {
        id: u32,
        /// Decorated variable name when the temporary backs a source variable
        name: Option<&'a str>,
    },
}

impl<'a> Operand<'a> {
    /// Temporary id, if this operand is a temporary.
    pub fn temp_id(&self) -> Option<u32> {
        match self {
            Operand::Temp { id, .. } => Some(*id),
            Operand::Constant(_) => None,
        }
    }

    /// Two temporaries are the same slot when their ids match, regardless
    /// of the display name.
    pub fn same_temp(&self, other: &Operand<'_>) -> bool {
        matches!((self, other), (Operand::Temp { id: a, .. }, Operand::Temp { id: b, .. }) if a == b)
    }
}

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Constant(value) => write!(f, "{}", value),
            Operand::Temp {
                name: Some(name), ..
            } => write!(f, "{}", name),
            Operand::Temp { id, name: None } => write!(f, "t{}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Complement,
    /// `dst <- (src == 0) ? 1 : 0`
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            UnaryOp::Negate => "-",
            UnaryOp::Complement => "~",
            UnaryOp::Not => "!",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    Equal,
    NotEqual,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEq => "<=",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
        };
        write!(f, "{}", symbol)
    }
}

/// One TAC instruction, tagged by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    Copy {
        dst: Operand<'a>,
        src: Operand<'a>,
    },
    Unary {
        op: UnaryOp,
        dst: Operand<'a>,
        src: Operand<'a>,
    },
    Binary {
        op: BinaryOp,
        dst: Operand<'a>,
        src1: Operand<'a>,
        src2: Operand<'a>,
    },
    /// Defines a jump target; label names are unique within a function
    Label(&'a str),
    Jump(&'a str),
    JumpIfZero {
        cond: Operand<'a>,
        target: &'a str,
    },
    JumpIfNotZero {
        cond: Operand<'a>,
        target: &'a str,
    },
    Return(Operand<'a>),
}

impl fmt::Display for Instruction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Copy { dst, src } => write!(f, "{} = {}", dst, src),
            Instruction::Unary { op, dst, src } => write!(f, "{} = {} {}", dst, op, src),
            Instruction::Binary {
                op,
                dst,
                src1,
                src2,
            } => write!(f, "{} = {} {} {}", dst, src1, op, src2),
            Instruction::Label(name) => write!(f, "{}:", name),
            Instruction::Jump(target) => write!(f, "goto {}", target),
            Instruction::JumpIfZero { cond, target } => {
                write!(f, "if_false {} goto {}", cond, target)
            }
            Instruction::JumpIfNotZero { cond, target } => {
                write!(f, "if_true {} goto {}", cond, target)
            }
            Instruction::Return(src) => write!(f, "return {}", src),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TacFunction<'a> {
    pub name: &'a str,
    pub instructions: Vec<Instruction<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TacProgram<'a> {
    pub functions: Vec<TacFunction<'a>>,
}

impl fmt::Display for TacProgram<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "program:")?;
        for function in &self.functions {
            writeln!(f, "  function {}:", function.name)?;
            for instruction in &function.instructions {
                // Labels outdent so jump targets stand out.
                match instruction {
                    Instruction::Label(_) => writeln!(f, "  {}", instruction)?,
                    _ => writeln!(f, "    {}", instruction)?,
                }
            }
        }
        writeln!(f, "end program")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(id: u32) -> Operand<'static> {
        Operand::Temp { id, name: None }
    }

    #[test]
    fn test_operand_display() {
        assert_eq!(Operand::Constant(42).to_string(), "42");
        assert_eq!(t(3).to_string(), "t3");
        assert_eq!(
            Operand::Temp {
                id: 0,
                name: Some("x.0"),
            }
            .to_string(),
            "x.0"
        );
    }

    #[test]
    fn test_same_temp_ignores_name() {
        let named = Operand::Temp {
            id: 1,
            name: Some("x.1"),
        };
        assert!(named.same_temp(&t(1)));
        assert!(!named.same_temp(&t(2)));
        assert!(!named.same_temp(&Operand::Constant(1)));
    }

    #[test]
    fn test_instruction_display() {
        assert_eq!(
            Instruction::Copy {
                dst: t(0),
                src: Operand::Constant(10),
            }
            .to_string(),
            "t0 = 10"
        );
        assert_eq!(
            Instruction::Unary {
                op: UnaryOp::Complement,
                dst: t(1),
                src: t(0),
            }
            .to_string(),
            "t1 = ~ t0"
        );
        assert_eq!(
            Instruction::Binary {
                op: BinaryOp::Add,
                dst: t(2),
                src1: t(0),
                src2: Operand::Constant(2),
            }
            .to_string(),
            "t2 = t0 + 2"
        );
        assert_eq!(Instruction::Label("L0").to_string(), "L0:");
        assert_eq!(Instruction::Jump("L1").to_string(), "goto L1");
        assert_eq!(
            Instruction::JumpIfZero {
                cond: t(0),
                target: "L0",
            }
            .to_string(),
            "if_false t0 goto L0"
        );
        assert_eq!(Instruction::Return(t(2)).to_string(), "return t2");
    }

    #[test]
    fn test_program_dump_layout() {
        let program = TacProgram {
            functions: vec![TacFunction {
                name: "main",
                instructions: vec![
                    Instruction::JumpIfZero {
                        cond: Operand::Constant(1),
                        target: "L0",
                    },
                    Instruction::Label("L0"),
                    Instruction::Return(Operand::Constant(0)),
                ],
            }],
        };
        let expected = "\
program:
  function main:
    if_false 1 goto L0
  L0:
    return 0
end program
";
        assert_eq!(program.to_string(), expected);
    }

}
