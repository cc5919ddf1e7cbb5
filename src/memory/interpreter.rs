//! Statement parser for the dialect subset the in-memory authority accepts.
//!
//! Tokenizing goes through `sqlparser`; the grammar on top is a small cursor
//! parser covering user, role, directory, table and grant DDL.

use sqlparser::dialect::GenericDialect;
use sqlparser::tokenizer::{Token, Tokenizer, Word};

use crate::session::SessionError;

use super::ora;

/// Authentication clause of `CREATE USER`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Identification {
    Password(String),
    Externally,
    Globally,
}

/// Attribute clauses shared by `CREATE USER` and `ALTER USER`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct UserAttributes {
    pub(crate) identification: Option<Identification>,
    pub(crate) default_tablespace: Option<String>,
    pub(crate) temporary_tablespace: Option<String>,
    pub(crate) profile: Option<String>,
    /// `Some(true)` for `ACCOUNT LOCK`, `Some(false)` for `ACCOUNT UNLOCK`.
    pub(crate) locked: Option<bool>,
}

/// What an `ON` clause names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OnClause {
    Object { owner: Option<String>, name: String },
    Directory(String),
}

/// Option clause trailing a `GRANT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OptionClause {
    Admin,
    Grant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    CreateUser {
        name: String,
        attributes: UserAttributes,
    },
    AlterUser {
        name: String,
        attributes: UserAttributes,
    },
    DropUser {
        name: String,
        cascade: bool,
    },
    CreateRole {
        name: String,
    },
    DropRole {
        name: String,
    },
    CreateDirectory {
        name: String,
        path: String,
        replace: bool,
    },
    DropDirectory {
        name: String,
    },
    CreateTable {
        owner: Option<String>,
        name: String,
    },
    Grant {
        privileges: Vec<String>,
        on: Option<OnClause>,
        grantee: String,
        option: Option<OptionClause>,
    },
    Revoke {
        privileges: Vec<String>,
        on: Option<OnClause>,
        grantee: String,
    },
}

fn invalid(detail: impl std::fmt::Display) -> SessionError {
    ora("00900", format!("invalid SQL statement ({detail})"))
}

/// Parse one statement.
pub(crate) fn parse(sql: &str) -> Result<Command, SessionError> {
    let tokens = Tokenizer::new(&GenericDialect {}, sql)
        .tokenize()
        .map_err(invalid)?
        .into_iter()
        .filter(|token| !matches!(token, Token::Whitespace(_) | Token::EOF))
        .collect();
    let mut parser = StatementParser { tokens, index: 0 };
    let command = parser.parse_statement()?;
    parser.consume(&Token::SemiColon);
    if let Some(token) = parser.peek() {
        return Err(invalid(format!("unexpected `{token}`")));
    }
    Ok(command)
}

struct StatementParser {
    tokens: Vec<Token>,
    index: usize,
}

impl StatementParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn consume(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn next_is_keyword(&self, keyword: &str) -> bool {
        matches!(
            self.peek(),
            Some(Token::Word(Word { value, quote_style: None, .. }))
                if value.eq_ignore_ascii_case(keyword)
        )
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        if self.next_is_keyword(keyword) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), SessionError> {
        if self.consume_keyword(keyword) {
            Ok(())
        } else {
            Err(invalid(format!("expected {keyword}")))
        }
    }

    /// A bare identifier folds to upper case; a quoted one is kept verbatim.
    fn identifier(&mut self) -> Result<String, SessionError> {
        match self.next() {
            Some(Token::Word(Word {
                value,
                quote_style: None,
                ..
            })) => Ok(value.to_uppercase()),
            Some(Token::Word(Word {
                value,
                quote_style: Some('"'),
                ..
            })) => Ok(value),
            other => Err(invalid(format!("expected identifier, found {other:?}"))),
        }
    }

    fn qualified_name(&mut self) -> Result<(Option<String>, String), SessionError> {
        let first = self.identifier()?;
        if self.consume(&Token::Period) {
            Ok((Some(first), self.identifier()?))
        } else {
            Ok((None, first))
        }
    }

    fn string_literal(&mut self) -> Result<String, SessionError> {
        match self.next() {
            Some(Token::SingleQuotedString(value)) => Ok(value),
            other => Err(invalid(format!("expected string literal, found {other:?}"))),
        }
    }

    fn parse_statement(&mut self) -> Result<Command, SessionError> {
        if self.consume_keyword("CREATE") {
            self.parse_create()
        } else if self.consume_keyword("ALTER") {
            self.expect_keyword("USER")?;
            let name = self.identifier()?;
            let attributes = self.parse_user_attributes()?;
            Ok(Command::AlterUser { name, attributes })
        } else if self.consume_keyword("DROP") {
            self.parse_drop()
        } else if self.consume_keyword("GRANT") {
            self.parse_grant()
        } else if self.consume_keyword("REVOKE") {
            self.parse_revoke()
        } else {
            Err(invalid("unsupported statement"))
        }
    }

    fn parse_create(&mut self) -> Result<Command, SessionError> {
        let replace = if self.consume_keyword("OR") {
            self.expect_keyword("REPLACE")?;
            true
        } else {
            false
        };

        if self.consume_keyword("DIRECTORY") {
            let name = self.identifier()?;
            self.expect_keyword("AS")?;
            let path = self.string_literal()?;
            return Ok(Command::CreateDirectory {
                name,
                path,
                replace,
            });
        }
        if replace {
            return Err(invalid("OR REPLACE is only supported for directories"));
        }

        if self.consume_keyword("USER") {
            let name = self.identifier()?;
            let attributes = self.parse_user_attributes()?;
            if attributes.identification.is_none() {
                return Err(ora("00924", "missing BY keyword"));
            }
            Ok(Command::CreateUser { name, attributes })
        } else if self.consume_keyword("ROLE") {
            Ok(Command::CreateRole {
                name: self.identifier()?,
            })
        } else if self.consume_keyword("TABLE") {
            let (owner, name) = self.qualified_name()?;
            // Column definitions are not modelled.
            self.index = self.tokens.len();
            Ok(Command::CreateTable { owner, name })
        } else {
            Err(invalid("unsupported CREATE"))
        }
    }

    fn parse_user_attributes(&mut self) -> Result<UserAttributes, SessionError> {
        let mut attributes = UserAttributes::default();
        loop {
            if self.consume_keyword("IDENTIFIED") {
                let identification = if self.consume_keyword("BY") {
                    Identification::Password(self.identifier()?)
                } else if self.consume_keyword("EXTERNALLY") {
                    Identification::Externally
                } else if self.consume_keyword("GLOBALLY") {
                    Identification::Globally
                } else {
                    return Err(ora("00924", "missing BY keyword"));
                };
                attributes.identification = Some(identification);
            } else if self.consume_keyword("DEFAULT") {
                self.expect_keyword("TABLESPACE")?;
                attributes.default_tablespace = Some(self.identifier()?);
            } else if self.consume_keyword("TEMPORARY") {
                self.expect_keyword("TABLESPACE")?;
                attributes.temporary_tablespace = Some(self.identifier()?);
            } else if self.consume_keyword("PROFILE") {
                attributes.profile = Some(self.identifier()?);
            } else if self.consume_keyword("ACCOUNT") {
                attributes.locked = Some(if self.consume_keyword("LOCK") {
                    true
                } else {
                    self.expect_keyword("UNLOCK")?;
                    false
                });
            } else {
                return Ok(attributes);
            }
        }
    }

    fn parse_drop(&mut self) -> Result<Command, SessionError> {
        if self.consume_keyword("USER") {
            let name = self.identifier()?;
            let cascade = self.consume_keyword("CASCADE");
            Ok(Command::DropUser { name, cascade })
        } else if self.consume_keyword("ROLE") {
            Ok(Command::DropRole {
                name: self.identifier()?,
            })
        } else if self.consume_keyword("DIRECTORY") {
            Ok(Command::DropDirectory {
                name: self.identifier()?,
            })
        } else {
            Err(invalid("unsupported DROP"))
        }
    }

    /// Comma-separated privilege phrases or role names, up to `ON`, `TO` or `FROM`.
    fn parse_privilege_list(&mut self) -> Result<Vec<String>, SessionError> {
        let mut privileges = Vec::new();
        loop {
            let mut words = Vec::new();
            while !(self.next_is_keyword("ON")
                || self.next_is_keyword("TO")
                || self.next_is_keyword("FROM")
                || self.peek().is_none()
                || self.peek() == Some(&Token::Comma))
            {
                words.push(self.identifier()?);
            }
            if words.is_empty() {
                return Err(ora("00990", "missing or invalid privilege"));
            }
            privileges.push(words.join(" "));
            if !self.consume(&Token::Comma) {
                return Ok(privileges);
            }
        }
    }

    fn parse_on_clause(&mut self) -> Result<Option<OnClause>, SessionError> {
        if !self.consume_keyword("ON") {
            return Ok(None);
        }
        if self.consume_keyword("DIRECTORY") {
            return Ok(Some(OnClause::Directory(self.identifier()?)));
        }
        let (owner, name) = self.qualified_name()?;
        Ok(Some(OnClause::Object { owner, name }))
    }

    fn parse_grant(&mut self) -> Result<Command, SessionError> {
        let privileges = self.parse_privilege_list()?;
        let on = self.parse_on_clause()?;
        self.expect_keyword("TO")?;
        let grantee = self.identifier()?;
        let option = if self.consume_keyword("WITH") {
            let option = if self.consume_keyword("ADMIN") {
                OptionClause::Admin
            } else {
                self.expect_keyword("GRANT")?;
                OptionClause::Grant
            };
            self.expect_keyword("OPTION")?;
            Some(option)
        } else {
            None
        };
        Ok(Command::Grant {
            privileges,
            on,
            grantee,
            option,
        })
    }

    fn parse_revoke(&mut self) -> Result<Command, SessionError> {
        let privileges = self.parse_privilege_list()?;
        let on = self.parse_on_clause()?;
        self.expect_keyword("FROM")?;
        let grantee = self.identifier()?;
        Ok(Command::Revoke {
            privileges,
            on,
            grantee,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_parse_privilege_phrases_targets_and_options() {
        let command =
            parse("GRANT CREATE SESSION, create table TO app WITH ADMIN OPTION").unwrap();
        assert_eq!(
            command,
            Command::Grant {
                privileges: vec!["CREATE SESSION".into(), "CREATE TABLE".into()],
                on: None,
                grantee: "APP".into(),
                option: Some(OptionClause::Admin),
            }
        );

        let command = parse(r#"GRANT READ ON DIRECTORY "DATA-DIR" TO APP"#).unwrap();
        assert!(matches!(
            command,
            Command::Grant { on: Some(OnClause::Directory(ref d)), .. } if d == "DATA-DIR"
        ));

        let command = parse("REVOKE SELECT ON hr.employees FROM app;").unwrap();
        assert_eq!(
            command,
            Command::Revoke {
                privileges: vec!["SELECT".into()],
                on: Some(OnClause::Object {
                    owner: Some("HR".into()),
                    name: "EMPLOYEES".into()
                }),
                grantee: "APP".into(),
            }
        );
    }

    #[test]
    fn user_statements_collect_attribute_clauses() {
        let command = parse(
            r#"CREATE USER ops IDENTIFIED BY "s3cr et" DEFAULT TABLESPACE users ACCOUNT LOCK"#,
        )
        .unwrap();
        assert_eq!(
            command,
            Command::CreateUser {
                name: "OPS".into(),
                attributes: UserAttributes {
                    identification: Some(Identification::Password("s3cr et".into())),
                    default_tablespace: Some("USERS".into()),
                    locked: Some(true),
                    ..UserAttributes::default()
                },
            }
        );

        let command = parse("CREATE OR REPLACE DIRECTORY d AS '/tmp/o''neil'").unwrap();
        assert_eq!(
            command,
            Command::CreateDirectory {
                name: "D".into(),
                path: "/tmp/o'neil".into(),
                replace: true,
            }
        );
    }

    #[test]
    fn unsupported_or_trailing_input_is_rejected() {
        for sql in [
            "SELECT 1 FROM dual",
            "GRANT TO app",
            "DROP USER app CASCADE extra",
            "CREATE OR REPLACE ROLE r",
        ] {
            let err = parse(sql).expect_err(sql);
            assert!(err.to_string().starts_with("ORA-"), "{sql}: {err}");
        }
    }
}
