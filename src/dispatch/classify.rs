//! Statement classification for direct dispatch.
//!
//! Uses sqlparser-rs with the PostgreSQL dialect to decide whether a piece
//! of text is a row-returning query, a plain statement, or a stored-procedure
//! invocation. Text the parser rejects gets a conservative keyword check,
//! since bare procedure names ("GetOrders") are not valid SQL.

use sqlparser::ast::Statement;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

/// What kind of statement a piece of text is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Returns rows (SELECT and friends).
    Query,

    /// A plain statement executed for its effect.
    NonQuery,

    /// A stored-procedure invocation.
    Procedure,
}

/// Classifies statement text.
pub fn classify_statement(text: &str) -> StatementKind {
    let dialect = PostgreSqlDialect {};
    match Parser::parse_sql(&dialect, text) {
        Ok(statements) => match statements.first() {
            Some(Statement::Query(_)) => StatementKind::Query,
            Some(Statement::Call(_)) | Some(Statement::Execute { .. }) => StatementKind::Procedure,
            _ => StatementKind::NonQuery,
        },
        Err(_) => classify_unparsed(text),
    }
}

/// Fallback for text sqlparser rejects.
///
/// A single bare identifier, optionally preceded by EXEC/EXECUTE/CALL, is
/// treated as a procedure invocation; everything else stays a non-query.
fn classify_unparsed(text: &str) -> StatementKind {
    let mut words = text.trim().split_whitespace();
    let first = match words.next() {
        Some(word) => word,
        None => return StatementKind::NonQuery,
    };

    if matches!(
        first.to_ascii_uppercase().as_str(),
        "EXEC" | "EXECUTE" | "CALL"
    ) {
        return match (words.next(), words.next()) {
            (Some(name), None) if is_identifier(name) => StatementKind::Procedure,
            _ => StatementKind::NonQuery,
        };
    }

    if words.next().is_none() && is_identifier(first) {
        return StatementKind::Procedure;
    }

    StatementKind::NonQuery
}

fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '$')
}
