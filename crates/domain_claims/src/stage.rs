//! Lifecycle stages
//!
//! ```text
//! INITIATE -> HOST -> HOME -> HOME_AND_HOST -> CFA
//! ```
//!
//! The order above is the intended business sequence only. Transfers do not
//! check the source stage; see [`crate::lifecycle`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::role::Role;

/// Phase of the custody workflow recorded in the stage register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Initiate,
    Host,
    Home,
    HomeAndHost,
    Cfa,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Initiate,
        Stage::Host,
        Stage::Home,
        Stage::HomeAndHost,
        Stage::Cfa,
    ];

    /// Name stored in the ledger register
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Initiate => "INITIATE",
            Stage::Host => "HOST",
            Stage::Home => "HOME",
            Stage::HomeAndHost => "HOME_AND_HOST",
            Stage::Cfa => "CFA",
        }
    }

    /// Role allowed to edit a claim while the register holds this stage
    pub fn custodian(&self) -> Role {
        match self {
            Stage::Initiate => Role::Initiator,
            Stage::Host | Stage::HomeAndHost => Role::Host,
            Stage::Home => Role::Home,
            Stage::Cfa => Role::Cfa,
        }
    }

    /// Checks whether `role` may act on a claim at this stage
    pub fn permits(&self, role: Role) -> bool {
        matches!(
            (role, *self),
            (Role::Initiator, Stage::Initiate)
                | (Role::Host, Stage::Host)
                | (Role::Host, Stage::HomeAndHost)
                | (Role::Home, Stage::Home)
                | (Role::Cfa, Stage::Cfa)
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when register bytes do not name a stage
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized stage '{0}'")]
pub struct UnknownStage(pub String);

impl FromStr for Stage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INITIATE" => Ok(Stage::Initiate),
            "HOST" => Ok(Stage::Host),
            "HOME" => Ok(Stage::Home),
            "HOME_AND_HOST" => Ok(Stage::HomeAndHost),
            "CFA" => Ok(Stage::Cfa),
            other => Err(UnknownStage(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_parse_back() {
        for stage in Stage::ALL {
            assert_eq!(stage.as_str().parse::<Stage>(), Ok(stage));
        }
        assert!("home".parse::<Stage>().is_err());
    }

    #[test]
    fn test_permits_matches_custodian() {
        for stage in Stage::ALL {
            for role in Role::ALL {
                assert_eq!(stage.permits(role), stage.custodian() == role);
            }
        }
    }

    #[test]
    fn test_home_only_permitted_at_home() {
        let permitted: Vec<Stage> = Stage::ALL
            .into_iter()
            .filter(|s| s.permits(Role::Home))
            .collect();
        assert_eq!(permitted, vec![Stage::Home]);
    }

    #[test]
    fn test_serde_matches_register_name() {
        let json = serde_json::to_string(&Stage::HomeAndHost).unwrap();
        assert_eq!(json, "\"HOME_AND_HOST\"");
    }
}
