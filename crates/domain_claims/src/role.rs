//! Custodian roles
//!
//! Roles travel on the wire as the `user_typeN_0` attribute values issued by
//! the identity provider. Every comparison in the state machine goes through
//! [`Role`], never through raw strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A custodian authorized for specific transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    /// Creates claims
    Initiator,
    /// Host plan office
    Host,
    /// Home plan office
    Home,
    /// Central financial agency
    Cfa,
}

impl Role {
    /// All roles in custody order
    pub const ALL: [Role; 4] = [Role::Initiator, Role::Host, Role::Home, Role::Cfa];

    /// Wire representation carried in credentials and in the claim's `owner` field
    pub fn as_wire(&self) -> &'static str {
        match self {
            Role::Initiator => "user_type1_0",
            Role::Host => "user_type2_0",
            Role::Home => "user_type3_0",
            Role::Cfa => "user_type4_0",
        }
    }

    /// Parses a wire string, returning `None` for anything unrecognized
    pub fn from_wire(value: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.as_wire() == value)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Error returned when a string is not a recognized role
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::from_wire(s).ok_or_else(|| UnknownRole(s.to_string()))
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> String {
        role.as_wire().to_string()
    }
}
