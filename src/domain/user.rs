use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type UserId = u32;

/// Marketplace role of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Ceo,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Ceo => "ceo",
        };
        f.write_str(name)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "ceo" => Ok(Role::Ceo),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// The slice of a directory account the wallet core reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    /// Set once a teacher has paid the enrollment fee.
    pub teacher_enrolled: bool,
    pub xp: u64,
}

impl User {
    pub fn new(id: UserId, username: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            username: username.into(),
            role,
            teacher_enrolled: false,
            xp: 0,
        }
    }
}
