//! Statement splitting for migration files

/// Separates statements within a migration file
pub const STATEMENT_SEPARATOR: char = ';';

/// A fragment starting with this marker (after trimming) is ignored entirely
pub const LINE_COMMENT: &str = "--";

/// Split migration content into executable statements.
///
/// Fragments between separators are trimmed; empty fragments and fragments
/// that begin with a line comment are dropped. The returned indices are the
/// checkpoint indices used while executing the file.
pub fn split_statements(content: &str) -> Vec<&str> {
    content
        .split(STATEMENT_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.starts_with(LINE_COMMENT))
        .collect()
}

#[cfg(test)]
#[path = "statement_test.rs"]
mod tests;
