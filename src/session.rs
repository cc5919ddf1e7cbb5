use thiserror::Error;

use crate::error::{Error, Result};

/// Failure reported by the authority behind a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The connection or authentication to the database failed.
    #[error("connection failed: {0}")]
    Connection(String),
    /// The database rejected the statement or query; the message is passed through verbatim.
    #[error("{0}")]
    Database(String),
}

/// One row returned by a catalog query, as nullable text columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row(Vec<Option<String>>);

impl Row {
    /// Build a row from raw column values.
    pub fn new(columns: Vec<Option<String>>) -> Self {
        Self(columns)
    }

    /// Build a row whose columns are all non-null.
    pub fn from_texts<I, T>(columns: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self(columns.into_iter().map(|c| Some(c.into())).collect())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Column `idx` as text; a missing column or NULL is a decoding error.
    pub fn text(&self, idx: usize) -> Result<&str> {
        self.nullable_text(idx)?
            .ok_or_else(|| Error::Decode(format!("column {idx} is NULL")))
    }

    /// Column `idx` as text, with NULL mapped to `None`.
    pub fn nullable_text(&self, idx: usize) -> Result<Option<&str>> {
        self.0
            .get(idx)
            .map(Option::as_deref)
            .ok_or_else(|| Error::Decode(format!("missing column {idx} (row has {})", self.len())))
    }
}

/// Blocking access to the database: the only way any component reaches the authority.
///
/// Implementations own connection handling. Every call is one round-trip;
/// nothing in this crate batches, pipelines or retries.
pub trait Session {
    /// Execute a DDL or DCL statement.
    fn execute(&mut self, sql: &str) -> std::result::Result<(), SessionError>;

    /// Run a query with positional bind values (`:1`, `:2`, ...) and return every row.
    fn query(&mut self, sql: &str, binds: &[&str]) -> std::result::Result<Vec<Row>, SessionError>;
}

impl<S: Session + ?Sized> Session for &mut S {
    fn execute(&mut self, sql: &str) -> std::result::Result<(), SessionError> {
        (**self).execute(sql)
    }

    fn query(&mut self, sql: &str, binds: &[&str]) -> std::result::Result<Vec<Row>, SessionError> {
        (**self).query(sql, binds)
    }
}

/// Run a `COUNT(*)` query and report whether it counted anything.
pub(crate) fn count_positive<S: Session + ?Sized>(
    session: &mut S,
    sql: &str,
    binds: &[&str],
) -> Result<bool> {
    let rows = session.query(sql, binds)?;
    let Some(row) = rows.first() else {
        return Err(Error::Decode("COUNT(*) returned no rows".to_string()));
    };
    let raw = row.text(0)?;
    let count: u64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::Decode(format!("COUNT(*) returned non-numeric `{raw}`")))?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_text_distinguishes_null_from_missing_columns() {
        let row = Row::new(vec![Some("SELECT".to_string()), None]);

        assert_eq!(row.text(0).expect("first column present"), "SELECT");
        assert_eq!(row.nullable_text(1).expect("second column present"), None);

        let err = row.text(1).expect_err("NULL is not text");
        assert!(err.to_string().contains("column 1 is NULL"));

        let err = row.text(5).expect_err("column 5 is absent");
        assert!(err.to_string().contains("missing column 5"));
    }
}
