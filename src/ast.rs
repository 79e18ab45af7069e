//! Abstract syntax tree for Mini-C.
//!
//! Nodes are arena-allocated and linked by shared references, so the tree
//! for one compilation lives exactly as long as its `Arena`. The validator
//! never mutates nodes in place; it rebuilds the tree with the `Resolved`
//! annotations filled in, and lowering reads only the rebuilt tree.
//!
//! The `Display` impl on `Program` is the debug dump: one node per line,
//! prefixed by its kind, children indented by two spaces.

use std::fmt;

/// A whole translation unit: exactly one function definition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Program<'a> {
    pub function: &'a FuncDef<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuncDef<'a> {
    pub name: &'a str,
    pub body: Block<'a>,
}

/// An ordered sequence of declarations and statements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block<'a> {
    pub items: &'a [BlockItem<'a>],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockItem<'a> {
    Decl(&'a VarDecl<'a>),
    Stmt(&'a Stmt<'a>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarDecl<'a> {
    pub type_name: &'a str,
    pub name: &'a str,
    /// Byte offset of the declared name, for diagnostics
    pub offset: usize,
    pub init: Option<&'a Exp<'a>>,
    /// Filled by the validator
    pub resolved: Option<Resolved<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'a> {
    Return(&'a Exp<'a>),
    Expression(&'a Exp<'a>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Complement,
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
    Subtract,
    Multiply,
    Divide,
    Remainder,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Remainder => "%",
            BinaryOp::LessThan => "<",
            BinaryOp::GreaterThan => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Exp<'a> {
    IntLiteral(i64),
    Var {
        name: &'a str,
        /// Byte offset of the identifier, for diagnostics
        offset: usize,
        /// Filled by the validator
        resolved: Option<Resolved<'a>>,
    },
    Unary {
        op: UnaryOp,
        operand: &'a Exp<'a>,
    },
    Binary {
        op: BinaryOp,
        lhs: &'a Exp<'a>,
        rhs: &'a Exp<'a>,
    },
    Assignment {
        target: &'a Exp<'a>,
        value: &'a Exp<'a>,
        /// Byte offset of the `=`, for diagnostics
        offset: usize,
    },
}

/// Validator annotation on declarations and identifier uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved<'a> {
    /// Fresh temporary id; identical identifiers in scope share one id
    pub temp_id: u32,
    /// Display name `"<name>.<id>"` for shadow-free dumps
    pub decorated: &'a str,
}

impl fmt::Display for Program<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Program")?;
        writeln!(f, "  FuncDef {}", self.function.name)?;
        fmt_block(f, &self.function.body, 2)
    }
}

fn indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        write!(f, "  ")?;
    }
    Ok(())
}

fn fmt_block(f: &mut fmt::Formatter<'_>, block: &Block<'_>, depth: usize) -> fmt::Result {
    indent(f, depth)?;
    writeln!(f, "Block")?;
    for item in block.items {
        match item {
            BlockItem::Decl(decl) => fmt_decl(f, decl, depth + 1)?,
            BlockItem::Stmt(stmt) => fmt_stmt(f, stmt, depth + 1)?,
        }
    }
    Ok(())
}

fn fmt_decl(f: &mut fmt::Formatter<'_>, decl: &VarDecl<'_>, depth: usize) -> fmt::Result {
    indent(f, depth)?;
    match decl.resolved {
        Some(resolved) => writeln!(f, "VarDecl {} {}", decl.type_name, resolved.decorated)?,
        None => writeln!(f, "VarDecl {} {}", decl.type_name, decl.name)?,
    }
    if let Some(init) = decl.init {
        fmt_exp(f, init, depth + 1)?;
    }
    Ok(())
}

fn fmt_stmt(f: &mut fmt::Formatter<'_>, stmt: &Stmt<'_>, depth: usize) -> fmt::Result {
    match stmt {
        Stmt::Return(value) => {
            indent(f, depth)?;
            writeln!(f, "ReturnStmt")?;
            fmt_exp(f, value, depth + 1)
        }
        Stmt::Expression(exp) => {
            indent(f, depth)?;
            writeln!(f, "ExprStmt")?;
            fmt_exp(f, exp, depth + 1)
        }
    }
}

fn fmt_exp(f: &mut fmt::Formatter<'_>, exp: &Exp<'_>, depth: usize) -> fmt::Result {
    indent(f, depth)?;
    match exp {
        Exp::IntLiteral(value) => writeln!(f, "IntLiteral {}", value),
        Exp::Var { name, resolved, .. } => match resolved {
            Some(resolved) => writeln!(f, "Identifier {}", resolved.decorated),
            None => writeln!(f, "Identifier {}", name),
        },
        Exp::Unary { op, operand } => {
            writeln!(f, "UnaryOp {}", op)?;
            fmt_exp(f, operand, depth + 1)
        }
        Exp::Binary { op, lhs, rhs } => {
            writeln!(f, "BinaryOp {}", op)?;
            fmt_exp(f, lhs, depth + 1)?;
            fmt_exp(f, rhs, depth + 1)
        }
        Exp::Assignment { target, value, .. } => {
            writeln!(f, "AssignmentExp")?;
            fmt_exp(f, target, depth + 1)?;
            fmt_exp(f, value, depth + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;

    #[test]
    fn test_dump_return_literal() {
        let arena = Arena::new();
        let value = arena.alloc(Exp::IntLiteral(42));
        let stmt = arena.alloc(Stmt::Return(value));
        let items = arena.alloc_slice_copy(&[BlockItem::Stmt(stmt)]);
        let function = arena.alloc(FuncDef {
            name: "main",
            body: Block { items },
        });
        let program = Program { function };

        assert_eq!(
            program.to_string(),
            "Program\n  FuncDef main\n    Block\n      ReturnStmt\n        IntLiteral 42\n"
        );
    }

    #[test]
    fn test_dump_decl_uses_decorated_name_when_resolved() {
        let arena = Arena::new();
        let decl = arena.alloc(VarDecl {
            type_name: "int",
            name: "x",
            offset: 4,
            init: Some(arena.alloc(Exp::IntLiteral(1))),
            resolved: Some(Resolved {
                temp_id: 0,
                decorated: "x.0",
            }),
        });
        let items = arena.alloc_slice_copy(&[BlockItem::Decl(decl)]);
        let function = arena.alloc(FuncDef {
            name: "main",
            body: Block { items },
        });
        let dump = Program { function }.to_string();
        assert!(dump.contains("VarDecl int x.0\n"));
        assert!(dump.contains("IntLiteral 1\n"));
    }

    #[test]
    fn test_dump_nested_expression() {
        let arena = Arena::new();
        let one = arena.alloc(Exp::IntLiteral(1));
        let x = arena.alloc(Exp::Var {
            name: "x",
            offset: 0,
            resolved: None,
        });
        let sum = arena.alloc(Exp::Binary {
            op: BinaryOp::Add,
            lhs: one,
            rhs: x,
        });
        let negated = arena.alloc(Exp::Unary {
            op: UnaryOp::Negate,
            operand: sum,
        });
        let stmt = arena.alloc(Stmt::Expression(negated));
        let items = arena.alloc_slice_copy(&[BlockItem::Stmt(stmt)]);
        let function = arena.alloc(FuncDef {
            name: "main",
            body: Block { items },
        });
        let dump = Program { function }.to_string();
        let expected = "\
Program
  FuncDef main
    Block
      ExprStmt
        UnaryOp -
          BinaryOp +
            IntLiteral 1
            Identifier x
";
        assert_eq!(dump, expected);
    }

    #[test]
    fn test_operator_display() {
        assert_eq!(UnaryOp::Complement.to_string(), "~");
        assert_eq!(BinaryOp::NotEqual.to_string(), "!=");
        assert_eq!(BinaryOp::And.to_string(), "&&");
    }
}
