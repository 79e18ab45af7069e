//! Parser for Mini-C.
//!
//! Recursive descent for declarations and statements, precedence climbing
//! for expressions. The parser tokenizes the whole source up front and
//! walks the token vector with a cursor.
//!
//! Precedence levels (lowest to highest), all left-associative except
//! assignment:
//!
//! | level | operators            |
//! |-------|----------------------|
//! | 1     | `=` (right-assoc)    |
//! | 2     | `\|\|`               |
//! | 3     | `&&`                 |
//! | 4     | `==` `!=`            |
//! | 5     | `<` `>` `<=` `>=`    |
//! | 6     | `+` `-`              |
//! | 7     | `*` `/` `%`          |
//!
//! The parser accepts any expression as an assignment target; the validator
//! re-checks that the target is an identifier.

use crate::arena::Arena;
use crate::ast::{BinaryOp, Block, BlockItem, Exp, FuncDef, Program, Stmt, UnaryOp, VarDecl};
use crate::error::CompileError;
use crate::lexer::{Lexer, Token, TokenKind};

const ASSIGNMENT_PRECEDENCE: u8 = 1;

/// Binary operator and precedence for a token kind, if it is one.
fn binary_op(kind: TokenKind) -> Option<(BinaryOp, u8)> {
    match kind {
        TokenKind::PipePipe => Some((BinaryOp::Or, 2)),
        TokenKind::AmpAmp => Some((BinaryOp::And, 3)),
        TokenKind::EqualEqual => Some((BinaryOp::Equal, 4)),
        TokenKind::BangEqual => Some((BinaryOp::NotEqual, 4)),
        TokenKind::Less => Some((BinaryOp::LessThan, 5)),
        TokenKind::Greater => Some((BinaryOp::GreaterThan, 5)),
        TokenKind::LessEqual => Some((BinaryOp::LessEqual, 5)),
        TokenKind::GreaterEqual => Some((BinaryOp::GreaterEqual, 5)),
        TokenKind::Plus => Some((BinaryOp::Add, 6)),
        TokenKind::Minus => Some((BinaryOp::Subtract, 6)),
        TokenKind::Star => Some((BinaryOp::Multiply, 7)),
        TokenKind::Slash => Some((BinaryOp::Divide, 7)),
        TokenKind::Percent => Some((BinaryOp::Remainder, 7)),
        _ => None,
    }
}

pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    arena: &'a Arena,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, arena: &'a Arena) -> Self {
        Parser {
            tokens: Lexer::new(source, arena).tokenize(),
            pos: 0,
            arena,
        }
    }

    /// Parse a whole program: one function definition, then end of input.
    pub fn parse(&mut self) -> Result<Program<'a>, CompileError> {
        // Surface lexical errors before any syntax diagnostics.
        if let Some(bad) = self.tokens.iter().find(|t| t.kind == TokenKind::Unknown) {
            return Err(CompileError::lexical(
                bad.offset,
                format!("unknown character '{}'", bad.source_text()),
            ));
        }

        let function = self.parse_funcdef()?;
        let trailing = self.peek();
        if trailing.kind != TokenKind::Eof {
            return Err(CompileError::syntax(
                trailing.offset,
                format!("expected end of input, found {}", trailing.kind),
            ));
        }
        Ok(Program {
            function: self.arena.alloc(function),
        })
    }

    /// `int <ident> ( void ) { <block-item>* }`
    fn parse_funcdef(&mut self) -> Result<FuncDef<'a>, CompileError> {
        self.expect(TokenKind::KwInt)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LParen)?;
        self.expect(TokenKind::KwVoid)?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(FuncDef {
            name: name.lexeme.unwrap_or(""),
            body,
        })
    }

    fn parse_block(&mut self) -> Result<Block<'a>, CompileError> {
        self.expect(TokenKind::LBrace)?;
        let mut items = Vec::new();
        while self.peek().kind != TokenKind::RBrace {
            if self.peek().kind == TokenKind::Eof {
                let eof = self.peek();
                return Err(CompileError::syntax(
                    eof.offset,
                    "expected '}' before end of input",
                ));
            }
            items.push(self.parse_block_item()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Block {
            items: self.arena.alloc_slice_copy(&items),
        })
    }

    /// A declaration when the item starts with `int`, a statement otherwise.
    fn parse_block_item(&mut self) -> Result<BlockItem<'a>, CompileError> {
        if self.peek().kind == TokenKind::KwInt {
            Ok(BlockItem::Decl(self.parse_vardecl()?))
        } else {
            Ok(BlockItem::Stmt(self.parse_statement()?))
        }
    }

    /// `int <ident> ( = <exp> )? ;`
    fn parse_vardecl(&mut self) -> Result<&'a VarDecl<'a>, CompileError> {
        let type_token = self.expect(TokenKind::KwInt)?;
        let name = self.expect_identifier()?;
        let init = if self.peek().kind == TokenKind::Equal {
            self.advance();
            Some(self.parse_exp(ASSIGNMENT_PRECEDENCE)?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(self.arena.alloc(VarDecl {
            type_name: type_token.kind.fixed_spelling().unwrap_or("int"),
            name: name.lexeme.unwrap_or(""),
            offset: name.offset,
            init,
            resolved: None,
        }))
    }

    /// `return <exp> ;` or an expression statement `<exp> ;`
    fn parse_statement(&mut self) -> Result<&'a Stmt<'a>, CompileError> {
        if self.peek().kind == TokenKind::KwReturn {
            self.advance();
            let value = self.parse_exp(ASSIGNMENT_PRECEDENCE)?;
            self.expect(TokenKind::Semicolon)?;
            return Ok(self.arena.alloc(Stmt::Return(value)));
        }
        let exp = self.parse_exp(ASSIGNMENT_PRECEDENCE)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(self.arena.alloc(Stmt::Expression(exp)))
    }

    /// Precedence climbing: parse a unary operand, then consume binary
    /// operators of at least `min_prec`, recursing with `prec + 1` (or
    /// `prec` for right-associative assignment) on the right side.
    fn parse_exp(&mut self, min_prec: u8) -> Result<&'a Exp<'a>, CompileError> {
        let mut left = self.parse_unary()?;
        loop {
            let token = self.peek();
            if token.kind == TokenKind::Equal {
                if ASSIGNMENT_PRECEDENCE < min_prec {
                    break;
                }
                self.advance();
                let value = self.parse_exp(ASSIGNMENT_PRECEDENCE)?;
                left = self.arena.alloc(Exp::Assignment {
                    target: left,
                    value,
                    offset: token.offset,
                });
                continue;
            }
            let Some((op, prec)) = binary_op(token.kind) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.advance();
            let rhs = self.parse_exp(prec + 1)?;
            left = self.arena.alloc(Exp::Binary { op, lhs: left, rhs });
        }
        Ok(left)
    }

    /// Prefix operators bind tighter than any binary operator.
    fn parse_unary(&mut self) -> Result<&'a Exp<'a>, CompileError> {
        let op = match self.peek().kind {
            TokenKind::Minus => Some(UnaryOp::Negate),
            TokenKind::Tilde => Some(UnaryOp::Complement),
            TokenKind::Bang => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(self.arena.alloc(Exp::Unary { op, operand }));
        }
        self.parse_primary()
    }

    /// Integer literal, identifier, or a parenthesised expression.
    fn parse_primary(&mut self) -> Result<&'a Exp<'a>, CompileError> {
        let token = self.peek();
        match token.kind {
            TokenKind::IntLiteral => {
                self.advance();
                let text = token.lexeme.unwrap_or("");
                let value: i64 = text.parse().map_err(|_| {
                    CompileError::syntax(
                        token.offset,
                        format!("integer literal '{}' out of range", text),
                    )
                })?;
                Ok(self.arena.alloc(Exp::IntLiteral(value)))
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(self.arena.alloc(Exp::Var {
                    name: token.lexeme.unwrap_or(""),
                    offset: token.offset,
                    resolved: None,
                }))
            }
            TokenKind::LParen => {
                self.advance();
                let exp = self.parse_exp(ASSIGNMENT_PRECEDENCE)?;
                self.expect(TokenKind::RParen)?;
                Ok(exp)
            }
            _ => Err(CompileError::syntax(
                token.offset,
                format!("expected an expression, found {}", token.kind),
            )),
        }
    }

    fn peek(&self) -> Token<'a> {
        // The vector always ends with Eof, so the cursor never runs past it.
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token<'a> {
        let token = self.peek();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>, CompileError> {
        let token = self.peek();
        if token.kind != kind {
            return Err(CompileError::syntax(
                token.offset,
                format!("expected {}, found {}", kind, token.kind),
            ));
        }
        Ok(self.advance())
    }

    fn expect_identifier(&mut self) -> Result<Token<'a>, CompileError> {
        self.expect(TokenKind::Identifier)
    }
}
