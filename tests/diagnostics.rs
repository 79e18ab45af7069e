//! Diagnostic behavior across the pipeline.
//!
//! Every failure carries an error kind, a message, and, for source-level
//! errors, the byte offset of the offending position. The first error
//! terminates its stage and nothing downstream runs.

use minicc::{Arena, CompileError, ErrorKind};

fn validate_err(source: &str) -> CompileError {
    let arena = Arena::new();
    minicc::validate(source, &arena).unwrap_err()
}

#[test]
fn test_lexical_error_position_and_rendering() {
    let arena = Arena::new();
    let err = minicc::tokenize("int main(void){return 1 $ 2;}", &arena).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Lexical);
    assert_eq!(err.offset, Some(24));
    assert_eq!(
        err.to_string(),
        "lexical error at byte 24: unknown character '$'"
    );
}

#[test]
fn test_lexical_error_precedes_syntax_error() {
    // The source is also syntactically broken after the bad character;
    // the lexical error is reported first.
    let arena = Arena::new();
    let err = minicc::parse("int main(void){ # return", &arena).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Lexical);
}

#[test]
fn test_syntax_error_reports_expected_token() {
    let arena = Arena::new();
    let err = minicc::parse("int main(void){return 1}", &arena).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert_eq!(err.offset, Some(23));
    assert!(err.message.contains("expected ';'"), "{}", err.message);
}

#[test]
fn test_syntax_error_on_missing_expression() {
    let arena = Arena::new();
    let err = minicc::parse("int main(void){return ;}", &arena).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert!(err.message.contains("expected an expression"));
}

#[test]
fn test_syntax_error_on_empty_source() {
    let arena = Arena::new();
    let err = minicc::parse("", &arena).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert_eq!(err.offset, Some(0));
}

#[test]
fn test_redeclaration_names_the_variable() {
    let err = validate_err("int main(void){int value; int value;}");
    assert_eq!(err.kind, ErrorKind::Redeclaration);
    assert!(err.message.contains("'value'"));
    assert!(err.to_string().starts_with("semantic error at byte "));
}

#[test]
fn test_undeclared_identifier_names_the_use() {
    let err = validate_err("int main(void){int a = 1; return a + missing;}");
    assert_eq!(err.kind, ErrorKind::UndeclaredIdentifier);
    assert!(err.message.contains("'missing'"));
    assert_eq!(err.offset, Some(37));
}

#[test]
fn test_undeclared_identifier_in_initialiser() {
    let err = validate_err("int main(void){int a = ghost; return a;}");
    assert_eq!(err.kind, ErrorKind::UndeclaredIdentifier);
    assert!(err.message.contains("'ghost'"));
}

#[test]
fn test_invalid_assignment_target_offset_points_at_equals() {
    let err = validate_err("int main(void){1 + 2 = 3;}");
    assert_eq!(err.kind, ErrorKind::InvalidAssignmentTarget);
    assert_eq!(err.offset, Some(21));
}

#[test]
fn test_assignment_to_parenthesised_literal_rejected() {
    let err = validate_err("int main(void){(4) = 4;}");
    assert_eq!(err.kind, ErrorKind::InvalidAssignmentTarget);
}

#[test]
fn test_semantic_error_stops_before_lowering() {
    let arena = Arena::new();
    let err = minicc::lower("int main(void){return nope;}", &arena).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UndeclaredIdentifier);
}

#[test]
fn test_syntax_error_stops_before_validation() {
    // The undeclared identifier is never reached; parsing fails first.
    let err = validate_err("int main(void){return nope");
    assert_eq!(err.kind, ErrorKind::Syntax);
}

#[test]
fn test_first_semantic_error_wins() {
    // Redeclaration of `a` comes before the later undeclared use.
    let err = validate_err("int main(void){int a; int a; return zzz;}");
    assert_eq!(err.kind, ErrorKind::Redeclaration);
}

#[test]
fn test_config_error_rendering() {
    let err = minicc::CompilerConfig::from_toml("underscore_prefix = \"yes\"").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Config);
    assert!(err.to_string().starts_with("config error: "));
}

#[test]
fn test_error_implements_std_error() {
    let err: Box<dyn std::error::Error> = Box::new(validate_err("int main(void){return x;}"));
    assert!(err.to_string().contains("undeclared"));
}
