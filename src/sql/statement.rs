use std::fmt;

use crate::session::{Session, SessionError};

/// A DDL/DCL statement ready to send to the authority.
///
/// Statements that embed a secret keep a redacted rendering; `Display`
/// always uses it, so logs and error messages never carry the secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    redacted: Option<String>,
}

impl Statement {
    /// A statement with no secret in it.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            redacted: None,
        }
    }

    /// A statement whose text embeds a secret; `redacted` is shown instead of `sql`.
    pub fn with_redacted(sql: impl Into<String>, redacted: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            redacted: Some(redacted.into()),
        }
    }

    /// Text sent to the authority.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Text safe to log.
    pub fn redacted(&self) -> &str {
        self.redacted.as_deref().unwrap_or(&self.sql)
    }

    /// Send the statement through `session`.
    pub fn execute<S: Session + ?Sized>(&self, session: &mut S) -> Result<(), SessionError> {
        tracing::debug!(statement = %self, "executing statement");
        session.execute(&self.sql).inspect_err(|error| {
            tracing::debug!(statement = %self, %error, "statement failed");
        })
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.redacted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_hides_secrets() {
        let statement = Statement::with_redacted(
            r#"ALTER USER APP IDENTIFIED BY "hunter2""#,
            r#"ALTER USER APP IDENTIFIED BY "***""#,
        );
        assert_eq!(statement.sql(), r#"ALTER USER APP IDENTIFIED BY "hunter2""#);
        assert!(!statement.to_string().contains("hunter2"));

        let plain = Statement::new("DROP ROLE R");
        assert_eq!(plain.to_string(), "DROP ROLE R");
    }
}
