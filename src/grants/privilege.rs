use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grants::PrivilegeKind;
use crate::sql::names::normalize_privilege;

/// Option modifier that lets the grantee pass a privilege on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantOption {
    /// `WITH ADMIN OPTION`, used by system privileges and roles.
    Admin,
    /// `WITH GRANT OPTION`, used by object and directory privileges.
    Grant,
}

impl GrantOption {
    /// Statement clause for this option.
    pub fn clause(self) -> &'static str {
        match self {
            GrantOption::Admin => "WITH ADMIN OPTION",
            GrantOption::Grant => "WITH GRANT OPTION",
        }
    }

    fn other(self) -> Self {
        match self {
            GrantOption::Admin => GrantOption::Grant,
            GrantOption::Grant => GrantOption::Admin,
        }
    }
}

impl fmt::Display for GrantOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.clause())
    }
}

/// A privilege (or role) name plus its option modifier.
///
/// Equality through [`Privilege::key`] ignores case, whitespace runs and the
/// option; `==` compares the spelling exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Privilege {
    name: String,
    option: Option<GrantOption>,
}

impl Privilege {
    /// A privilege from its base name and option.
    pub fn new(name: impl Into<String>, option: Option<GrantOption>) -> Self {
        Self {
            name: name.into(),
            option,
        }
    }

    /// Parse a desired privilege string such as `select with grant option`.
    ///
    /// The option clause of `kind` is detected case-insensitively anywhere in
    /// the string and stripped; the clause belonging to the other domains is
    /// rejected.
    pub fn parse(raw: &str, kind: PrivilegeKind) -> Result<Self> {
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let upper = collapsed.to_ascii_uppercase();
        let option = kind.option();

        if upper.contains(option.other().clause()) {
            return Err(Error::InvalidPrivilege {
                privilege: raw.to_string(),
                domain: kind,
                reason: "option clause belongs to another privilege domain",
            });
        }

        let (name, option) = match upper.find(option.clause()) {
            Some(start) => {
                let end = start + option.clause().len();
                let name = format!("{} {}", &collapsed[..start], &collapsed[end..]);
                (name.trim().to_string(), Some(option))
            }
            None => (collapsed, None),
        };

        if name.is_empty() {
            return Err(Error::InvalidPrivilege {
                privilege: raw.to_string(),
                domain: kind,
                reason: "privilege is empty",
            });
        }
        Ok(Self { name, option })
    }

    /// Fold a catalog row `(name, flag)` into a privilege; `YES` sets the domain's option.
    pub fn from_catalog(name: &str, option_flag: Option<&str>, kind: PrivilegeKind) -> Self {
        let option = option_flag
            .is_some_and(|flag| flag.trim().eq_ignore_ascii_case("YES"))
            .then(|| kind.option());
        Self {
            name: name.trim().to_string(),
            option,
        }
    }

    /// Base name without the option clause.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Option modifier, if any.
    pub fn option(&self) -> Option<GrantOption> {
        self.option
    }

    /// True when the option modifier is present.
    pub fn has_option(&self) -> bool {
        self.option.is_some()
    }

    /// Comparison key: upper-cased base name with whitespace collapsed.
    pub fn key(&self) -> String {
        normalize_privilege(&self.name)
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.option {
            Some(option) => write!(f, "{} {option}", self.name),
            None => f.write_str(&self.name),
        }
    }
}
