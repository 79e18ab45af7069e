//! Mini-C Compiler Library
//!
//! Compiles a small C-subset language (`int` locals, lexically-scoped
//! blocks, arithmetic, relational and short-circuit logical operators,
//! assignment and `return`) to x86-64 assembly.
//!
//! The pipeline is a strict linear composition; each stage consumes its
//! predecessor's fully-constructed output and may fail independently:
//!
//! ```text
//! source text -> tokens -> AST -> validated AST -> TAC -> assembly
//! ```
//!
//! One compilation owns one [`Arena`]; every token lexeme, AST node,
//! decorated name and TAC label lives in it and is released when it drops.
//! Callers wanting parallel compilations instantiate independent arenas.
//!
//! # Example
//!
//! ```rust
//! use minicc::{Arena, CompilerConfig};
//!
//! let arena = Arena::new();
//! let config = CompilerConfig::new().with_underscore_prefix(true);
//! let asm = minicc::compile_to_assembly(
//!     "int main(void) { return 42; }",
//!     &arena,
//!     &config,
//! ).unwrap();
//! assert!(asm.contains("movl $42, %eax"));
//! ```

pub mod arena;
pub mod ast;
pub mod codegen;
pub mod config;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod tac;
pub mod tacgen;
pub mod validator;

pub use arena::Arena;
pub use config::CompilerConfig;
pub use error::{CompileError, ErrorKind};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
pub use tac::TacProgram;

use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Lex `source` to a complete token stream, `Eof` included.
///
/// The lexer itself never fails; an unrecognised character surfaces here as
/// a lexical error at its byte offset.
pub fn tokenize<'a>(source: &'a str, arena: &'a Arena) -> Result<Vec<Token<'a>>, CompileError> {
    let tokens = Lexer::new(source, arena).tokenize();
    if let Some(bad) = tokens.iter().find(|t| t.kind == TokenKind::Unknown) {
        return Err(CompileError::lexical(
            bad.offset,
            format!("unknown character '{}'", bad.source_text()),
        ));
    }
    debug!(tokens = tokens.len(), "lexed source");
    Ok(tokens)
}

/// Lex and parse `source`.
pub fn parse<'a>(source: &'a str, arena: &'a Arena) -> Result<ast::Program<'a>, CompileError> {
    let program = Parser::new(source, arena).parse()?;
    debug!(function = program.function.name, "parsed program");
    Ok(program)
}

/// Lex, parse and validate `source`; the returned tree carries resolved
/// temporary ids and decorated names.
pub fn validate<'a>(source: &'a str, arena: &'a Arena) -> Result<ast::Program<'a>, CompileError> {
    let program = parse(source, arena)?;
    let validated = validator::validate(program, arena)?;
    debug!("validated program");
    Ok(validated)
}

/// Run the front end and lower to three-address code.
pub fn lower<'a>(source: &'a str, arena: &'a Arena) -> Result<TacProgram<'a>, CompileError> {
    let validated = validate(source, arena)?;
    let tac = tacgen::lower(validated, arena)?;
    let instructions: usize = tac.functions.iter().map(|f| f.instructions.len()).sum();
    debug!(instructions, "lowered to TAC");
    Ok(tac)
}

/// Run the whole pipeline on a source string and return assembly text.
pub fn compile_to_assembly(
    source: &str,
    arena: &Arena,
    config: &CompilerConfig,
) -> Result<String, CompileError> {
    let tac = lower(source, arena)?;
    let assembly = codegen::emit(&tac, config)?;
    debug!(bytes = assembly.len(), "emitted assembly");
    Ok(assembly)
}

/// Compile `input` to an executable at `output`.
///
/// Runs the external preprocessor (`cc -E -P`), compiles the result to
/// assembly, and hands the `.s` file to the external assembler/linker. The
/// intermediate files are removed unless the config keeps the assembly.
pub fn compile_file(
    input: &Path,
    output: &Path,
    config: &CompilerConfig,
) -> Result<(), CompileError> {
    let source = preprocess(input, config)?;
    let arena = Arena::new();
    let assembly = compile_to_assembly(&source, &arena, config)?;

    let asm_path = output.with_extension("s");
    fs::write(&asm_path, &assembly)?;
    let linked = assemble_and_link(&asm_path, output, config);
    if !config.keep_asm {
        fs::remove_file(&asm_path).ok();
    }
    linked
}

/// `cc -E -P <input> -o <input>.i`, read back and removed.
fn preprocess(input: &Path, config: &CompilerConfig) -> Result<String, CompileError> {
    let preprocessed = input.with_extension("i");
    run_toolchain(
        Command::new(&config.cc)
            .arg("-E")
            .arg("-P")
            .arg(input)
            .arg("-o")
            .arg(&preprocessed),
        &config.cc,
    )?;
    let source = fs::read_to_string(&preprocessed)?;
    fs::remove_file(&preprocessed).ok();
    debug!(input = %input.display(), bytes = source.len(), "preprocessed");
    Ok(source)
}

/// `cc <asm> -o <output>`
fn assemble_and_link(
    asm_path: &Path,
    output: &Path,
    config: &CompilerConfig,
) -> Result<(), CompileError> {
    run_toolchain(
        Command::new(&config.cc).arg(asm_path).arg("-o").arg(output),
        &config.cc,
    )?;
    debug!(output = %output.display(), "linked executable");
    Ok(())
}

fn run_toolchain(command: &mut Command, cc: &str) -> Result<(), CompileError> {
    let output = command
        .output()
        .map_err(|e| CompileError::toolchain(format!("failed to run {}: {}", cc, e)))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CompileError::toolchain(format!(
            "{} exited with {}:\n{}",
            cc, output.status, stderr
        )));
    }
    Ok(())
}
