use sqlparser::ast::{Ident, Value};

/// Longest identifier the authority accepts, in bytes.
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// Return the identifier without surrounding double quotes.
pub fn unquote_identifier(ident: &str) -> &str {
    ident
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(ident)
}

/// Normalize an identifier the way the catalog stores it.
///
/// Trims whitespace, removes surrounding double quotes on a single identifier,
/// and uppercases the result.
pub fn normalize_identifier(ident: &str) -> String {
    unquote_identifier(ident.trim()).to_uppercase()
}

/// Spelling used when the catalog hands a role or directory name back to callers.
pub fn reported_name(stored: &str) -> String {
    stored.to_lowercase()
}

/// Split a potentially owner-qualified name into its dot-separated parts.
///
/// Handles dots inside quoted identifiers, e.g. `"my.schema"."table.name"`.
/// Parts are trimmed and unquoted.
pub fn split_qualified_name(name: &str) -> Vec<String> {
    let mut in_quotes = false;
    let mut start = 0usize;
    let mut parts: Vec<&str> = Vec::new();

    for (idx, ch) in name.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '.' if !in_quotes => {
                parts.push(name[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(name[start..].trim());

    parts
        .into_iter()
        .map(|part| unquote_identifier(part).to_string())
        .collect()
}

/// True for names the authority accepts without quotes: a letter followed by
/// letters, digits, `_`, `$` or `#`.
fn is_simple_identifier(upper: &str) -> bool {
    let mut chars = upper.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '_' | '$' | '#'))
}

/// Render one identifier into statement text.
///
/// The name is upper-cased so that it resolves to the same entry the catalog
/// queries look up with `UPPER(:n)`. Simple names are emitted bare, anything
/// else is double-quoted.
pub fn render_identifier(name: &str) -> Result<String, &'static str> {
    let normalized = normalize_identifier(name);
    if normalized.is_empty() {
        return Err("identifier is empty");
    }
    if normalized.len() > MAX_IDENTIFIER_LEN {
        return Err("identifier is longer than 128 bytes");
    }
    if normalized.contains('"') {
        return Err("identifier contains a double quote");
    }
    if normalized.chars().any(char::is_control) {
        return Err("identifier contains a control character");
    }
    if is_simple_identifier(&normalized) {
        return Ok(normalized);
    }
    Ok(Ident::with_quote('"', normalized).to_string())
}

/// Normalize a privilege keyword phrase such as `create  session` to `CREATE SESSION`.
pub fn normalize_privilege(privilege: &str) -> String {
    privilege
        .split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a privilege keyword phrase. Only ASCII letters and `_` separated by
/// whitespace are accepted.
pub fn render_privilege(privilege: &str) -> Result<String, &'static str> {
    let normalized = normalize_privilege(privilege);
    if normalized.is_empty() {
        return Err("privilege is empty");
    }
    let well_formed = normalized
        .split(' ')
        .all(|word| word.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
    if !well_formed {
        return Err("privilege must consist of keywords");
    }
    Ok(normalized)
}

/// Render a password for an `IDENTIFIED BY` clause.
pub fn render_password(password: &str) -> Result<String, &'static str> {
    if password.is_empty() {
        return Err("password is empty");
    }
    if password.contains('"') {
        return Err("password contains a double quote");
    }
    if password.chars().any(char::is_control) {
        return Err("password contains a control character");
    }
    Ok(Ident::with_quote('"', password).to_string())
}

/// Render a single-quoted string literal, doubling embedded quotes.
pub fn render_string_literal(value: &str) -> Result<String, &'static str> {
    if value.chars().any(char::is_control) {
        return Err("literal contains a control character");
    }
    Ok(Value::SingleQuotedString(value.to_string()).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_qualified_name_handles_quoted_dots() {
        assert_eq!(
            split_qualified_name(r#""my.schema"."table.name""#),
            vec!["my.schema".to_string(), "table.name".to_string()]
        );
        assert_eq!(
            split_qualified_name(" system . test_table "),
            vec!["system".to_string(), "test_table".to_string()]
        );
        assert_eq!(split_qualified_name("test_table"), vec!["test_table".to_string()]);
    }

    #[test]
    fn simple_identifiers_render_bare_and_upper_cased() {
        assert_eq!(render_identifier("testuser"), Ok("TESTUSER".to_string()));
        assert_eq!(render_identifier(" app_$1# "), Ok("APP_$1#".to_string()));
        assert_eq!(render_identifier(r#""Quoted""#), Ok("QUOTED".to_string()));
    }

    #[test]
    fn unusual_identifiers_are_quoted_and_hostile_ones_rejected() {
        assert_eq!(render_identifier("data-dir"), Ok(r#""DATA-DIR""#.to_string()));
        assert_eq!(render_identifier("1st"), Ok(r#""1ST""#.to_string()));
        assert!(render_identifier("").is_err());
        assert!(render_identifier(r#"x" CASCADE --"#).is_err());
        assert!(render_identifier(&"a".repeat(129)).is_err());
    }

    #[test]
    fn normalization_matches_statement_rendering() {
        for raw in [r#""testuser""#, " testuser ", r#" "TestUser" "#] {
            assert_eq!(normalize_identifier(raw), "TESTUSER");
            assert_eq!(render_identifier(raw), Ok(normalize_identifier(raw)));
        }
    }

    #[test]
    fn privileges_are_keyword_phrases() {
        assert_eq!(
            render_privilege("create   session"),
            Ok("CREATE SESSION".to_string())
        );
        assert_eq!(
            render_privilege("select any_table"),
            Ok("SELECT ANY_TABLE".to_string())
        );
        assert!(render_privilege("SELECT; DROP USER x").is_err());
        assert!(render_privilege("  ").is_err());
    }

    #[test]
    fn literals_escape_quotes() {
        assert_eq!(render_string_literal("/tmp/o'neil"), Ok("'/tmp/o''neil'".to_string()));
        assert_eq!(render_password("s3cret"), Ok(r#""s3cret""#.to_string()));
        assert!(render_password(r#"bad"pw"#).is_err());
        assert!(render_password("").is_err());
    }
}
