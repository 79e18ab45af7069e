//! Semantic validation for Mini-C.
//!
//! Walks the parsed tree once with a scope-stack symbol table, assigning a
//! fresh temporary id to every declaration and resolving every identifier
//! use to the innermost declaration of that name. The walk rebuilds the
//! tree in the arena with `Resolved` annotations filled in; the input tree
//! is left untouched.
//!
//! Scope discipline: the function definition pushes a scope and the body
//! block pushes its own nested scope (two scopes for the region; the
//! distinction would only be observable through function-level parameters,
//! which the language does not have yet). Scopes are popped on error paths
//! too.
//!
//! The first error aborts validation; no recovery is attempted.

use crate::arena::Arena;
use crate::ast::{Block, BlockItem, Exp, FuncDef, Program, Resolved, Stmt, VarDecl};
use crate::error::{CompileError, ErrorKind};

/// A symbol visible in some scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Symbol<'a> {
    pub name: &'a str,
    pub temp_id: u32,
    /// `"<name>.<id>"`, arena-formatted
    pub decorated: &'a str,
}

/// An ordered list of the symbols declared in one scope.
#[derive(Debug, Default)]
struct Scope<'a> {
    symbols: Vec<Symbol<'a>>,
}

/// Stack of scopes, innermost last.
#[derive(Debug, Default)]
pub struct SymbolTable<'a> {
    scopes: Vec<Scope<'a>>,
}

impl<'a> SymbolTable<'a> {
    pub fn new() -> Self {
        SymbolTable { scopes: Vec::new() }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// True if `name` is already declared in the innermost scope.
    pub fn declared_in_current(&self, name: &str) -> bool {
        self.scopes
            .last()
            .is_some_and(|scope| scope.symbols.iter().any(|s| s.name == name))
    }

    /// Insert into the innermost scope. May shadow an outer symbol.
    pub fn insert(&mut self, symbol: Symbol<'a>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.symbols.push(symbol);
        }
    }

    /// Search from the innermost scope outward.
    pub fn lookup(&self, name: &str) -> Option<Symbol<'a>> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.symbols.iter().find(|s| s.name == name).copied())
    }
}

pub struct Validator<'a> {
    arena: &'a Arena,
    table: SymbolTable<'a>,
    next_temp: u32,
}

/// Validate `program`, returning a rebuilt tree with every `VarDecl` and
/// identifier use annotated.
pub fn validate<'a>(
    program: Program<'a>,
    arena: &'a Arena,
) -> Result<Program<'a>, CompileError> {
    Validator::new(arena).run(program)
}

impl<'a> Validator<'a> {
    pub fn new(arena: &'a Arena) -> Self {
        Validator {
            arena,
            table: SymbolTable::new(),
            next_temp: 0,
        }
    }

    pub fn run(mut self, program: Program<'a>) -> Result<Program<'a>, CompileError> {
        let function = self.check_funcdef(program.function)?;
        Ok(Program { function })
    }

    fn check_funcdef(&mut self, function: &'a FuncDef<'a>) -> Result<&'a FuncDef<'a>, CompileError> {
        self.table.push_scope();
        let body = self.check_block(&function.body);
        self.table.pop_scope();
        Ok(self.arena.alloc(FuncDef {
            name: function.name,
            body: body?,
        }))
    }

    fn check_block(&mut self, block: &Block<'a>) -> Result<Block<'a>, CompileError> {
        self.table.push_scope();
        let items = self.check_block_items(block.items);
        self.table.pop_scope();
        Ok(Block { items: items? })
    }

    fn check_block_items(
        &mut self,
        items: &'a [BlockItem<'a>],
    ) -> Result<&'a [BlockItem<'a>], CompileError> {
        let mut checked = Vec::with_capacity(items.len());
        for item in items {
            let item = match item {
                BlockItem::Decl(decl) => BlockItem::Decl(self.check_vardecl(decl)?),
                BlockItem::Stmt(stmt) => BlockItem::Stmt(self.check_stmt(stmt)?),
            };
            checked.push(item);
        }
        Ok(self.arena.alloc_slice_copy(&checked))
    }

    fn check_vardecl(&mut self, decl: &'a VarDecl<'a>) -> Result<&'a VarDecl<'a>, CompileError> {
        if decl.type_name != "int" {
            return Err(CompileError::semantic(
                ErrorKind::UnknownType,
                decl.offset,
                format!("unknown type '{}'", decl.type_name),
            ));
        }
        if self.table.declared_in_current(decl.name) {
            return Err(CompileError::semantic(
                ErrorKind::Redeclaration,
                decl.offset,
                format!("variable '{}' already declared in this scope", decl.name),
            ));
        }
        let temp_id = self.next_temp;
        self.next_temp += 1;
        let decorated = self
            .arena
            .alloc_format(format_args!("{}.{}", decl.name, temp_id));
        self.table.insert(Symbol {
            name: decl.name,
            temp_id,
            decorated,
        });
        // The symbol is visible to its own initialiser, as in C.
        let init = match decl.init {
            Some(init) => Some(self.check_exp(init)?),
            None => None,
        };
        Ok(self.arena.alloc(VarDecl {
            type_name: decl.type_name,
            name: decl.name,
            offset: decl.offset,
            init,
            resolved: Some(Resolved { temp_id, decorated }),
        }))
    }

    fn check_stmt(&mut self, stmt: &'a Stmt<'a>) -> Result<&'a Stmt<'a>, CompileError> {
        let stmt = match stmt {
            Stmt::Return(value) => Stmt::Return(self.check_exp(value)?),
            Stmt::Expression(exp) => Stmt::Expression(self.check_exp(exp)?),
        };
        Ok(self.arena.alloc(stmt))
    }

    fn check_exp(&mut self, exp: &'a Exp<'a>) -> Result<&'a Exp<'a>, CompileError> {
        match exp {
            Exp::IntLiteral(_) => Ok(exp),
            Exp::Var { name, offset, .. } => match self.table.lookup(name) {
                Some(symbol) => Ok(self.arena.alloc(Exp::Var {
                    name: *name,
                    offset: *offset,
                    resolved: Some(Resolved {
                        temp_id: symbol.temp_id,
                        decorated: symbol.decorated,
                    }),
                })),
                None => Err(CompileError::semantic(
                    ErrorKind::UndeclaredIdentifier,
                    *offset,
                    format!("use of undeclared identifier '{}'", name),
                )),
            },
            Exp::Unary { op, operand } => {
                let operand = self.check_exp(operand)?;
                Ok(self.arena.alloc(Exp::Unary { op: *op, operand }))
            }
            Exp::Binary { op, lhs, rhs } => {
                let lhs = self.check_exp(lhs)?;
                let rhs = self.check_exp(rhs)?;
                Ok(self.arena.alloc(Exp::Binary { op: *op, lhs, rhs }))
            }
            Exp::Assignment {
                target,
                value,
                offset,
            } => {
                if !matches!(target, Exp::Var { .. }) {
                    return Err(CompileError::semantic(
                        ErrorKind::InvalidAssignmentTarget,
                        *offset,
                        "left side of assignment is not assignable",
                    ));
                }
                let target = self.check_exp(target)?;
                let value = self.check_exp(value)?;
                Ok(self.arena.alloc(Exp::Assignment {
                    target,
                    value,
                    offset: *offset,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn validated<'a>(source: &'a str, arena: &'a Arena) -> Result<Program<'a>, CompileError> {
        let program = Parser::new(source, arena).parse()?;
        validate(program, arena)
    }

    fn decl<'a>(program: &Program<'a>, index: usize) -> &'a VarDecl<'a> {
        match program.function.body.items[index] {
            BlockItem::Decl(decl) => decl,
            other => panic!("expected declaration at {}, got {:?}", index, other),
        }
    }

    #[test]
    fn test_declaration_gets_sequential_ids_and_decorated_names() {
        let arena = Arena::new();
        let program = validated("int main(void) { int x = 1; int y = 2; }", &arena).unwrap();
        let x = decl(&program, 0).resolved.unwrap();
        let y = decl(&program, 1).resolved.unwrap();
        assert_eq!(x.temp_id, 0);
        assert_eq!(x.decorated, "x.0");
        assert_eq!(y.temp_id, 1);
        assert_eq!(y.decorated, "y.1");
    }

    #[test]
    fn test_use_resolves_to_declaration() {
        let arena = Arena::new();
        let program = validated("int main(void) { int x = 1; return x; }", &arena).unwrap();
        let x_id = decl(&program, 0).resolved.unwrap().temp_id;
        let BlockItem::Stmt(Stmt::Return(Exp::Var { resolved, .. })) =
            program.function.body.items[1]
        else {
            panic!("expected return of identifier");
        };
        assert_eq!(resolved.unwrap().temp_id, x_id);
        assert_eq!(resolved.unwrap().decorated, "x.0");
    }

    #[test]
    fn test_initialiser_sees_its_own_declaration() {
        let arena = Arena::new();
        let program = validated("int main(void) { int x = x; }", &arena).unwrap();
        let d = decl(&program, 0);
        let Some(Exp::Var { resolved, .. }) = d.init else {
            panic!("expected identifier initialiser");
        };
        assert_eq!(resolved.unwrap().temp_id, d.resolved.unwrap().temp_id);
    }

    #[test]
    fn test_original_tree_is_not_mutated() {
        let arena = Arena::new();
        let parsed = Parser::new("int main(void) { int x = 1; }", &arena)
            .parse()
            .unwrap();
        let _ = validate(parsed, &arena).unwrap();
        let BlockItem::Decl(original) = parsed.function.body.items[0] else {
            panic!("expected declaration");
        };
        assert!(original.resolved.is_none());
    }

    #[test]
    fn test_error_redeclaration() {
        let arena = Arena::new();
        let err = validated("int main(void) { int x; int x; return 0; }", &arena).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Redeclaration);
        assert_eq!(err.offset, Some(28));
        assert!(err.message.contains("'x'"));
    }

    #[test]
    fn test_error_undeclared_identifier() {
        let arena = Arena::new();
        let err = validated("int main(void) { return y; }", &arena).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndeclaredIdentifier);
        assert_eq!(err.offset, Some(24));
        assert!(err.message.contains("'y'"));
    }

    #[test]
    fn test_error_invalid_assignment_target() {
        let arena = Arena::new();
        let err = validated("int main(void) { 5 = 3; }", &arena).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidAssignmentTarget);
        assert_eq!(err.offset, Some(19));
    }

    #[test]
    fn test_error_assignment_to_expression() {
        let arena = Arena::new();
        let err = validated("int main(void) { int x = 1; x + 1 = 2; }", &arena).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidAssignmentTarget);
    }

    #[test]
    fn test_error_unknown_type() {
        // The parser only produces `int`, so build the declaration by hand.
        let arena = Arena::new();
        let decl = arena.alloc(VarDecl {
            type_name: "float",
            name: "x",
            offset: 0,
            init: None,
            resolved: None,
        });
        let items = arena.alloc_slice_copy(&[BlockItem::Decl(decl)]);
        let function = arena.alloc(crate::ast::FuncDef {
            name: "main",
            body: Block { items },
        });
        let err = validate(Program { function }, &arena).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownType);
        assert!(err.message.contains("'float'"));
    }

    #[test]
    fn test_first_error_wins() {
        let arena = Arena::new();
        // Both an undeclared use and a redeclaration; the use comes first.
        let err = validated("int main(void) { int x = q; int x; }", &arena).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndeclaredIdentifier);
    }

    #[test]
    fn test_symbol_table_shadowing() {
        let arena = Arena::new();
        let name = arena.alloc_str("x");
        let mut table = SymbolTable::new();
        table.push_scope();
        table.insert(Symbol {
            name,
            temp_id: 0,
            decorated: arena.alloc_str("x.0"),
        });
        table.push_scope();
        assert!(!table.declared_in_current(name));
        table.insert(Symbol {
            name,
            temp_id: 1,
            decorated: arena.alloc_str("x.1"),
        });
        // Innermost declaration wins while its scope is open.
        assert_eq!(table.lookup(name).unwrap().temp_id, 1);
        table.pop_scope();
        assert_eq!(table.lookup(name).unwrap().temp_id, 0);
        table.pop_scope();
        assert!(table.lookup(name).is_none());
    }

    #[test]
    fn test_symbol_table_redeclaration_is_scope_local() {
        let mut table = SymbolTable::new();
        table.push_scope();
        table.insert(Symbol {
            name: "a",
            temp_id: 0,
            decorated: "a.0",
        });
        assert!(table.declared_in_current("a"));
        table.push_scope();
        assert!(!table.declared_in_current("a"));
    }
}
