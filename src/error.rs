//! Shared error type for every compilation stage.
//!
//! Each stage returns `Result<_, CompileError>` and threads failures with
//! `?`; the first error aborts its stage and no later stage runs. Errors
//! carry a kind, an optional byte offset into the source, and a message.
//! The driver prints the rendered error to stderr and exits non-zero.

use std::fmt;

/// Classification of a compilation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown character in the source text
    Lexical,
    /// Unexpected token, missing terminator, malformed declaration or expression
    Syntax,
    /// Declared type name is not `int`
    UnknownType,
    /// Variable declared twice in the same scope
    Redeclaration,
    /// Use of an identifier with no visible declaration
    UndeclaredIdentifier,
    /// Left side of `=` is not assignable
    InvalidAssignmentTarget,
    /// A pipeline precondition was violated (e.g. lowering an unvalidated tree)
    Internal,
    /// Assembly emission failure
    Codegen,
    /// File read/write failure
    Io,
    /// External preprocessor or assembler/linker failure
    Toolchain,
    /// Malformed compiler configuration
    Config,
}

impl ErrorKind {
    /// Human-readable category used as the error message prefix.
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Lexical => "lexical error",
            ErrorKind::Syntax => "syntax error",
            ErrorKind::UnknownType
            | ErrorKind::Redeclaration
            | ErrorKind::UndeclaredIdentifier
            | ErrorKind::InvalidAssignmentTarget => "semantic error",
            ErrorKind::Internal => "internal error",
            ErrorKind::Codegen => "code generation error",
            ErrorKind::Io => "i/o error",
            ErrorKind::Toolchain => "toolchain error",
            ErrorKind::Config => "config error",
        }
    }
}

/// A failure from any stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub kind: ErrorKind,
    /// Byte offset of the offending source position, when the stage knows it
    pub offset: Option<usize>,
    pub message: String,
}

impl CompileError {
    pub fn new(kind: ErrorKind, offset: Option<usize>, message: impl Into<String>) -> Self {
        CompileError {
            kind,
            offset,
            message: message.into(),
        }
    }

    pub fn lexical(offset: usize, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Lexical, Some(offset), message)
    }

    pub fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, Some(offset), message)
    }

    /// Semantic error at a known source offset. `kind` must be one of the
    /// semantic kinds; other kinds have their own constructors.
    pub fn semantic(kind: ErrorKind, offset: usize, message: impl Into<String>) -> Self {
        Self::new(kind, Some(offset), message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, None, message)
    }

    pub fn codegen(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Codegen, None, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, None, message)
    }

    pub fn toolchain(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Toolchain, None, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, None, message)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{} at byte {}: {}", self.kind.label(), offset, self.message),
            None => write!(f, "{}: {}", self.kind.label(), self.message),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<fmt::Error> for CompileError {
    fn from(e: fmt::Error) -> Self {
        CompileError::codegen(format!("failed to write assembly text: {}", e))
    }
}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_offset() {
        let err = CompileError::syntax(17, "expected ';'");
        assert_eq!(err.to_string(), "syntax error at byte 17: expected ';'");
    }

    #[test]
    fn test_display_without_offset() {
        let err = CompileError::toolchain("cc exited with status 1");
        assert_eq!(err.to_string(), "toolchain error: cc exited with status 1");
    }

    #[test]
    fn test_semantic_kinds_share_label() {
        for kind in [
            ErrorKind::UnknownType,
            ErrorKind::Redeclaration,
            ErrorKind::UndeclaredIdentifier,
            ErrorKind::InvalidAssignmentTarget,
        ] {
            assert_eq!(kind.label(), "semantic error");
        }
    }

    #[test]
    fn test_from_fmt_error() {
        let err: CompileError = std::fmt::Error.into();
        assert_eq!(err.kind, ErrorKind::Codegen);
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CompileError = io.into();
        assert_eq!(err.kind, ErrorKind::Io);
        assert!(err.message.contains("missing"));
    }
}
