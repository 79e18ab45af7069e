//! Mini-C Compiler CLI
//!
//! Compiles a `.c` source file to an executable through the external C
//! toolchain, or stops after a selected stage and prints that stage's
//! output: token stream, AST dump, validation status, TAC dump, or
//! assembly.

use clap::{ArgGroup, CommandFactory, Parser as ClapParser};
use clap_complete::{Shell, generate};
use minicc::{Arena, CompileError, CompilerConfig};
use std::io;
use std::path::PathBuf;
use std::process;

#[derive(ClapParser)]
#[command(name = "minicc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Mini-C compiler - compile a C-subset source file to x86-64", long_about = None)]
#[command(group(ArgGroup::new("stage").multiple(false)))]
struct Cli {
    /// Input source file
    #[arg(required_unless_present = "completions")]
    input: Option<PathBuf>,

    /// Stop after lexing and print the token stream
    #[arg(long, group = "stage")]
    lex: bool,

    /// Stop after parsing and print the AST
    #[arg(long, group = "stage")]
    parse: bool,

    /// Stop after semantic validation (exit status only)
    #[arg(long, group = "stage")]
    validate: bool,

    /// Stop after lowering and print the three-address code
    #[arg(long, visible_alias = "tacky", group = "stage")]
    tac: bool,

    /// Stop after code generation and print the assembly
    #[arg(long, group = "stage")]
    codegen: bool,

    /// Output executable path (defaults to the input filename without extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep the intermediate .s file
    #[arg(long)]
    keep_asm: bool,

    /// TOML compiler configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Generate shell completion scripts and exit
    #[arg(long, value_enum)]
    completions: Option<Shell>,
}

fn main() {
    // Set up logging; RUST_LOG overrides the default level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("minicc=warn".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        generate(shell, &mut Cli::command(), "minicc", &mut io::stdout());
        return;
    }

    let Some(input) = cli.input.clone() else {
        // Unreachable through clap, but do not panic on it.
        eprintln!("error: no input file");
        process::exit(2);
    };

    if let Err(e) = run(&cli, &input) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli, input: &PathBuf) -> Result<(), CompileError> {
    let mut config = match &cli.config {
        Some(path) => CompilerConfig::from_toml_file(path)?,
        None => CompilerConfig::new(),
    };
    if cli.keep_asm {
        config = config.with_keep_asm(true);
    }

    if !(cli.lex || cli.parse || cli.validate || cli.tac || cli.codegen) {
        let output = cli
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(input.file_stem().unwrap_or_default()));
        return minicc::compile_file(input, &output, &config);
    }

    let source = std::fs::read_to_string(input)
        .map_err(|e| CompileError::io(format!("failed to read {}: {}", input.display(), e)))?;
    let arena = Arena::new();

    if cli.lex {
        for token in minicc::tokenize(&source, &arena)? {
            println!("{}", token);
        }
    } else if cli.parse {
        print!("{}", minicc::parse(&source, &arena)?);
    } else if cli.validate {
        minicc::validate(&source, &arena)?;
    } else if cli.tac {
        print!("{}", minicc::lower(&source, &arena)?);
    } else {
        print!("{}", minicc::compile_to_assembly(&source, &arena, &config)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_stage_flags() {
        let cli = Cli::try_parse_from(["minicc", "prog.c", "--lex"]).unwrap();
        assert!(cli.lex);
        assert_eq!(cli.input, Some(PathBuf::from("prog.c")));
    }

    #[test]
    fn test_cli_rejects_two_stage_flags() {
        assert!(Cli::try_parse_from(["minicc", "prog.c", "--lex", "--parse"]).is_err());
    }

    #[test]
    fn test_cli_tacky_alias() {
        let cli = Cli::try_parse_from(["minicc", "prog.c", "--tacky"]).unwrap();
        assert!(cli.tac);
    }

    #[test]
    fn test_cli_requires_input_without_completions() {
        assert!(Cli::try_parse_from(["minicc"]).is_err());
        assert!(Cli::try_parse_from(["minicc", "--completions", "bash"]).is_ok());
    }

    #[test]
    fn test_cli_output_option() {
        let cli = Cli::try_parse_from(["minicc", "prog.c", "-o", "a.out"]).unwrap();
        assert_eq!(cli.output, Some(PathBuf::from("a.out")));
    }
}
