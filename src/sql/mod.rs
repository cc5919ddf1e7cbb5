use crate::error::{Error, Result};

/// Identifier, privilege and literal rendering: the single place text is spliced into statements.
pub mod names;
/// Statement text with a log-safe redacted form.
pub mod statement;

pub use statement::Statement;

/// [`names::render_identifier`], failing with [`Error::InvalidIdentifier`].
pub(crate) fn identifier(name: &str) -> Result<String> {
    names::render_identifier(name).map_err(|reason| Error::InvalidIdentifier {
        name: name.to_string(),
        reason,
    })
}

/// Catalog bind value for `name`, normalized the way [`identifier`] renders it.
pub(crate) fn bind(name: &str) -> String {
    names::normalize_identifier(name)
}

/// [`names::render_password`], failing with [`Error::InvalidLiteral`].
pub(crate) fn password(secret: &str) -> Result<String> {
    names::render_password(secret).map_err(Error::InvalidLiteral)
}

/// [`names::render_string_literal`], failing with [`Error::InvalidLiteral`].
pub(crate) fn string_literal(value: &str) -> Result<String> {
    names::render_string_literal(value).map_err(Error::InvalidLiteral)
}
