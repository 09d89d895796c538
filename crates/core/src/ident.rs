//! SQL identifier validation and quoting.
//!
//! Job definitions name their source and target tables as free-form
//! text, and the extractor and writer interpolate those names into
//! dynamically built SQL. Every identifier that reaches a query must
//! pass through [`quote_ident`] first.

use crate::error::CoreError;

/// Maximum identifier length accepted, matching PostgreSQL's NAMEDATALEN - 1.
pub const MAX_IDENT_LEN: usize = 63;

/// Validate that a string is usable as a SQL identifier.
///
/// Accepts non-empty strings of at most [`MAX_IDENT_LEN`] bytes that
/// contain no NUL bytes. Anything else is rejected rather than
/// silently truncated.
pub fn validate_ident(name: &str) -> Result<(), CoreError> {
    if name.is_empty() {
        return Err(CoreError::Validation("identifier must not be empty".into()));
    }
    if name.len() > MAX_IDENT_LEN {
        return Err(CoreError::Validation(format!(
            "identifier {name:?} exceeds {MAX_IDENT_LEN} bytes"
        )));
    }
    if name.contains('\0') {
        return Err(CoreError::Validation(format!(
            "identifier {name:?} contains a NUL byte"
        )));
    }
    Ok(())
}

/// Quote an identifier for interpolation into SQL.
///
/// Always double-quotes and doubles any embedded quote characters, so
/// a hostile column name cannot break out of identifier position:
///
/// ```
/// use gembed_core::ident::quote_ident;
///
/// assert_eq!(quote_ident("body").unwrap(), "\"body\"");
/// assert_eq!(quote_ident("we\"ird").unwrap(), "\"we\"\"ird\"");
/// ```
pub fn quote_ident(name: &str) -> Result<String, CoreError> {
    validate_ident(name)?;
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for c in name.chars() {
        if c == '"' {
            quoted.push('"');
        }
        quoted.push(c);
    }
    quoted.push('"');
    Ok(quoted)
}

/// Quote a `schema.table` pair as one qualified name.
pub fn quote_qualified(schema: &str, table: &str) -> Result<String, CoreError> {
    Ok(format!("{}.{}", quote_ident(schema)?, quote_ident(table)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_identifier_is_quoted() {
        assert_eq!(quote_ident("documents").unwrap(), "\"documents\"");
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        assert_eq!(quote_ident("a\"b").unwrap(), "\"a\"\"b\"");
    }

    #[test]
    fn injection_attempt_stays_inside_identifier_position() {
        let quoted = quote_ident("x\"; DROP TABLE jobs; --").unwrap();
        assert_eq!(quoted, "\"x\"\"; DROP TABLE jobs; --\"");
    }

    #[test]
    fn empty_identifier_is_rejected() {
        assert!(quote_ident("").is_err());
    }

    #[test]
    fn overlong_identifier_is_rejected() {
        let name = "a".repeat(MAX_IDENT_LEN + 1);
        assert!(validate_ident(&name).is_err());
    }

    #[test]
    fn nul_byte_is_rejected() {
        assert!(validate_ident("bad\0name").is_err());
    }

    #[test]
    fn qualified_name_quotes_both_parts() {
        assert_eq!(
            quote_qualified("public", "documents").unwrap(),
            "\"public\".\"documents\""
        );
    }
}
