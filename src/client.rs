use crate::error::Result;
use crate::session::Session;
use crate::sql::Statement;

/// Entry point for every operation, bound to one injected [`Session`].
///
/// Operations are grouped by concern across modules: principals in
/// [`crate::principal`], directories in [`crate::directory`], grants in
/// [`crate::grants::engine`].
#[derive(Debug)]
pub struct Client<S> {
    session: S,
}

impl<S: Session> Client<S> {
    /// Wrap an established session.
    pub fn new(session: S) -> Self {
        Self { session }
    }

    /// The underlying session.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// The underlying session, mutably.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Give the session back.
    pub fn into_session(self) -> S {
        self.session
    }

    /// Execute `sql` verbatim. Nothing is reconciled or read back.
    pub fn execute_sql(&mut self, sql: &str) -> Result<()> {
        self.run(&Statement::new(sql))
    }

    pub(crate) fn run(&mut self, statement: &Statement) -> Result<()> {
        statement.execute(&mut self.session)?;
        Ok(())
    }
}
