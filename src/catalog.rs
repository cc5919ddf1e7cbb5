//! Reads of the privilege metadata views.
//!
//! Every query binds names normalized the way statements render them, and
//! the views compare through `UPPER(:n)`. A principal or target that does not
//! exist reads as an empty set.

use crate::error::Result;
use crate::grants::{Privilege, PrivilegeKind, Target};
use crate::session::{Row, Session};
use crate::sql::{self, names::reported_name};

pub(crate) const SYSTEM_PRIVILEGES_QUERY: &str =
    "SELECT privilege, admin_option FROM dba_sys_privs WHERE grantee = UPPER(:1)";
pub(crate) const OBJECT_PRIVILEGES_QUERY: &str = "SELECT privilege, grantable FROM dba_tab_privs \
     WHERE grantee = UPPER(:1) AND owner = UPPER(:2) AND table_name = UPPER(:3)";
pub(crate) const UNQUALIFIED_OBJECT_PRIVILEGES_QUERY: &str = "SELECT privilege, grantable \
     FROM dba_tab_privs WHERE grantee = UPPER(:1) AND table_name = UPPER(:2)";
pub(crate) const DIRECTORY_PRIVILEGES_QUERY: &str = "SELECT privilege, grantable FROM all_tab_privs \
     WHERE grantee = UPPER(:1) AND table_name = UPPER(:2) AND type = 'DIRECTORY'";
pub(crate) const ROLE_GRANTS_QUERY: &str =
    "SELECT granted_role, admin_option FROM dba_role_privs WHERE grantee = UPPER(:1)";

/// Privileges `principal` holds on `target`, in catalog order.
pub fn current_privileges<S: Session + ?Sized>(
    session: &mut S,
    principal: &str,
    target: &Target,
) -> Result<Vec<Privilege>> {
    let kind = target.kind();
    let principal = sql::bind(principal);
    let rows = match target {
        Target::System => query(session, SYSTEM_PRIVILEGES_QUERY, &[principal.as_str()])?,
        Target::Role => query(session, ROLE_GRANTS_QUERY, &[principal.as_str()])?,
        Target::Directory { directory } => query(
            session,
            DIRECTORY_PRIVILEGES_QUERY,
            &[principal.as_str(), sql::bind(directory).as_str()],
        )?,
        Target::Object { owner, object } => {
            match Target::object_parts(owner.as_deref(), object)? {
                (Some(owner), object) => query(
                    session,
                    OBJECT_PRIVILEGES_QUERY,
                    &[principal.as_str(), owner.as_str(), object.as_str()],
                )?,
                (None, object) => query(
                    session,
                    UNQUALIFIED_OBJECT_PRIVILEGES_QUERY,
                    &[principal.as_str(), object.as_str()],
                )?,
            }
        }
    };

    rows.iter().map(|row| fold_row(row, kind)).collect()
}

fn query<S: Session + ?Sized>(session: &mut S, sql: &str, binds: &[&str]) -> Result<Vec<Row>> {
    tracing::debug!(query = sql, ?binds, "reading catalog");
    Ok(session.query(sql, binds)?)
}

fn fold_row(row: &Row, kind: PrivilegeKind) -> Result<Privilege> {
    let name = row.text(0)?;
    let flag = row.nullable_text(1)?;
    let name = match kind {
        PrivilegeKind::Role => reported_name(name),
        _ => name.to_string(),
    };
    Ok(Privilege::from_catalog(&name, flag, kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grants::GrantOption;
    use crate::session::SessionError;

    /// Answers every query with fixed rows and records what was asked.
    struct Scripted {
        rows: Vec<Row>,
        failure: Option<SessionError>,
        asked: Vec<(String, Vec<String>)>,
    }

    impl Session for Scripted {
        fn execute(&mut self, _sql: &str) -> std::result::Result<(), SessionError> {
            Ok(())
        }

        fn query(
            &mut self,
            sql: &str,
            binds: &[&str],
        ) -> std::result::Result<Vec<Row>, SessionError> {
            self.asked
                .push((sql.to_string(), binds.iter().map(|b| b.to_string()).collect()));
            match &self.failure {
                Some(error) => Err(error.clone()),
                None => Ok(self.rows.clone()),
            }
        }
    }

    fn scripted(rows: Vec<Row>) -> Scripted {
        Scripted {
            rows,
            failure: None,
            asked: Vec::new(),
        }
    }

    #[test]
    fn owner_presence_selects_the_object_query_variant() {
        let mut session = scripted(vec![Row::from_texts(["SELECT", "YES"])]);
        let target = Target::Object {
            owner: Some("hr".into()),
            object: "employees".into(),
        };

        let held = current_privileges(&mut session, "app", &target).unwrap();
        assert_eq!(held, vec![Privilege::new("SELECT", Some(GrantOption::Grant))]);
        assert_eq!(session.asked[0].0, OBJECT_PRIVILEGES_QUERY);
        assert_eq!(session.asked[0].1, vec!["APP", "HR", "EMPLOYEES"]);

        let unqualified = Target::Object {
            owner: None,
            object: "employees".into(),
        };
        current_privileges(&mut session, "app", &unqualified).unwrap();
        assert_eq!(session.asked[1].0, UNQUALIFIED_OBJECT_PRIVILEGES_QUERY);
        assert_eq!(session.asked[1].1, vec!["APP", "EMPLOYEES"]);

        let dotted = Target::Object {
            owner: None,
            object: "system.test_table".into(),
        };
        current_privileges(&mut session, "app", &dotted).unwrap();
        assert_eq!(session.asked[2].0, OBJECT_PRIVILEGES_QUERY);
        assert_eq!(session.asked[2].1, vec!["APP", "SYSTEM", "TEST_TABLE"]);
    }

    #[test]
    fn role_names_are_lower_cased_and_admin_option_folded() {
        let mut session = scripted(vec![
            Row::from_texts(["TEST_ROLE", "NO"]),
            Row::from_texts(["DBA", "YES"]),
        ]);

        let held = current_privileges(&mut session, "app", &Target::Role).unwrap();
        let rendered: Vec<String> = held.iter().map(ToString::to_string).collect();

        assert_eq!(rendered, vec!["test_role", "dba WITH ADMIN OPTION"]);
    }

    #[test]
    fn malformed_rows_propagate_as_decode_errors() {
        let mut session = scripted(vec![Row::new(vec![None, Some("NO".into())])]);

        let err = current_privileges(&mut session, "app", &Target::System)
            .expect_err("NULL privilege name should not decode");
        assert!(err.to_string().contains("unexpected catalog row"));
    }

    #[test]
    fn binds_use_the_rendered_spelling_of_each_name() {
        let mut session = scripted(Vec::new());

        current_privileges(&mut session, r#" "app" "#, &Target::System).unwrap();
        let directory = Target::Directory {
            directory: r#""test_dir""#.into(),
        };
        current_privileges(&mut session, " app ", &directory).unwrap();
        let quoted = Target::Object {
            owner: Some(r#""hr""#.into()),
            object: r#" "employees" "#.into(),
        };
        current_privileges(&mut session, "app", &quoted).unwrap();

        assert_eq!(session.asked[0].1, vec!["APP"]);
        assert_eq!(session.asked[1].1, vec!["APP", "TEST_DIR"]);
        assert_eq!(session.asked[2].1, vec!["APP", "HR", "EMPLOYEES"]);
    }

    #[test]
    fn query_failures_propagate_verbatim() {
        let mut session = scripted(Vec::new());
        session.failure = Some(SessionError::Database(
            "ORA-00942: table or view does not exist".into(),
        ));

        let err = current_privileges(&mut session, "app", &Target::Role)
            .expect_err("catalog read should fail");
        assert!(matches!(
            err,
            crate::Error::Session(SessionError::Database(ref message))
                if message == "ORA-00942: table or view does not exist"
        ));
    }
}
