//! Accounts and their roles.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{FieldValue, Record};

/// Opaque user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a user may do.
///
/// - `Regular`: owns runs and reports, sees only their own.
/// - `Manager`: manages user accounts; has no access to other users' runs.
/// - `Admin`: manages user accounts and every run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Regular,
    Manager,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Regular => "regular",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

impl Record for User {
    const NAME: &'static str = "user";
    const FIELDS: &'static [&'static str] = &["id", "username", "role"];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::Id(self.id.0)),
            "username" => Some(FieldValue::Text(&self.username)),
            "role" => Some(FieldValue::Text(self.role.as_str())),
            _ => None,
        }
    }
}
