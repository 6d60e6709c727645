//! ANSI identifier quoting for schema, table and column names.

pub const QUOTE_CHAR: char = '"';

/// Returns `true` if the identifier must be wrapped in double quotes for
/// PostgreSQL to preserve it as written.
///
/// An identifier is left alone when it is already quoted, or when it starts
/// with a lowercase letter or underscore and continues with lowercase letters,
/// digits, underscores or dollar signs. Reserved keywords are not checked.
pub fn requires_quoting(identifier: &str) -> bool {
    let mut chars = identifier.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    if identifier.len() > 1 && first == QUOTE_CHAR && identifier.ends_with(QUOTE_CHAR) {
        return false;
    }

    if !first.is_lowercase() && first != '_' {
        return true;
    }

    !chars.all(|c| c.is_lowercase() || c.is_ascii_digit() || c == '_' || c == '$')
}

/// Wraps the identifier in double quotes if [`requires_quoting`] says so.
///
/// Embedded quote characters are not escaped.
pub fn quote_if_needed(identifier: &str) -> String {
    if requires_quoting(identifier) {
        format!("{QUOTE_CHAR}{identifier}{QUOTE_CHAR}")
    } else {
        identifier.to_string()
    }
}

/// Returns the identifier as it should appear in generated SQL under the
/// given quoting policy.
pub fn identifier(name: &str, use_quoting: bool) -> String {
    if use_quoting {
        quote_if_needed(name)
    } else {
        name.to_string()
    }
}
