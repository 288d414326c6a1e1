//! Positional command surface
//!
//! Commands arrive as a function name and a list of string arguments. The
//! argument count is checked against the function's exact arity and the
//! claim id is validated before anything touches the ledger.

use tracing::debug;

use core_kernel::ClaimId;

use crate::claim::SchemaVersion;
use crate::error::ClaimError;
use crate::lifecycle::LifecycleService;

/// A parsed command ready to run against the lifecycle service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create {
        caller: String,
        fields: Vec<String>,
    },
    TransferToHost {
        caller: String,
        claim_id: ClaimId,
    },
    TransferToHome {
        caller: String,
        claim_id: ClaimId,
    },
    TransferToHostByHome {
        caller: String,
        claim_id: ClaimId,
    },
    TransferToCfa {
        caller: String,
        claim_id: ClaimId,
    },
    UpdateByHost {
        caller: String,
        claim_id: ClaimId,
        approved_amount: String,
        local_plan_code: String,
        remote_plan_code: String,
    },
    UpdateByHome {
        caller: String,
        claim_id: ClaimId,
        cost_share: String,
        adjustment_flag: String,
    },
    UpdateByHostForCfa {
        caller: String,
        claim_id: ClaimId,
        final_approved_amount: String,
        payment_method: String,
    },
    GetClaimDetails {
        caller: String,
        claim_id: ClaimId,
    },
    GetClaimIds,
    AllowToUpdate {
        caller: String,
        claim_id: ClaimId,
    },
    Delete {
        claim_id: ClaimId,
    },
}

fn expect_arity(function: &str, args: &[String], expected: usize) -> Result<(), ClaimError> {
    if args.len() != expected {
        return Err(ClaimError::Arity {
            function: function.to_string(),
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}

/// `(callerRole, claimId)` pair shared by transfers and reads
fn caller_and_id(function: &str, args: &[String], expected: usize) -> Result<(String, ClaimId), ClaimError> {
    expect_arity(function, args, expected)?;
    let claim_id = ClaimId::new(args[1].as_str())?;
    Ok((args[0].clone(), claim_id))
}

impl Command {
    /// Parses a command
    ///
    /// Accepts the camelCase function names and their snake_case aliases.
    /// `schema` decides the arity of `create`/`init`.
    ///
    /// # Errors
    ///
    /// * `ClaimError::UnknownFunction` for unrecognized names
    /// * `ClaimError::Arity` when the argument count is not exact
    /// * `ClaimError::InvalidClaimId` when the claim id argument is unusable
    pub fn parse(function: &str, args: &[String], schema: SchemaVersion) -> Result<Self, ClaimError> {
        debug!(function, arg_count = args.len(), "Parsing command");

        let command = match function {
            "create" | "init" => {
                expect_arity(function, args, schema.arity())?;
                let (caller, fields) = if schema.leads_with_caller_role() {
                    (args[0].clone(), args[1..].to_vec())
                } else {
                    (String::new(), args.to_vec())
                };
                ClaimId::new(fields[0].as_str())?;
                Command::Create { caller, fields }
            }
            "transferToHost" | "transfer_to_host" => {
                let (caller, claim_id) = caller_and_id(function, args, 2)?;
                Command::TransferToHost { caller, claim_id }
            }
            "transferToHome" | "transfer_to_home" => {
                let (caller, claim_id) = caller_and_id(function, args, 2)?;
                Command::TransferToHome { caller, claim_id }
            }
            "transferToHostByHome" | "transfer_to_host_by_home" => {
                let (caller, claim_id) = caller_and_id(function, args, 2)?;
                Command::TransferToHostByHome { caller, claim_id }
            }
            "transferToCfa" | "transfer_to_cfa" => {
                let (caller, claim_id) = caller_and_id(function, args, 2)?;
                Command::TransferToCfa { caller, claim_id }
            }
            "updateByHost" | "update_by_host" => {
                let (caller, claim_id) = caller_and_id(function, args, 5)?;
                Command::UpdateByHost {
                    caller,
                    claim_id,
                    approved_amount: args[2].clone(),
                    local_plan_code: args[3].clone(),
                    remote_plan_code: args[4].clone(),
                }
            }
            "updateByHome" | "update_by_home" => {
                let (caller, claim_id) = caller_and_id(function, args, 4)?;
                Command::UpdateByHome {
                    caller,
                    claim_id,
                    cost_share: args[2].clone(),
                    adjustment_flag: args[3].clone(),
                }
            }
            "updateByHostForCfa" | "update_by_host_for_cfa" => {
                let (caller, claim_id) = caller_and_id(function, args, 4)?;
                Command::UpdateByHostForCfa {
                    caller,
                    claim_id,
                    final_approved_amount: args[2].clone(),
                    payment_method: args[3].clone(),
                }
            }
            "getClaimDetails" | "get_claim_details" => {
                let (caller, claim_id) = caller_and_id(function, args, 2)?;
                Command::GetClaimDetails { caller, claim_id }
            }
            "getClaimId" | "get_claim_id" => {
                expect_arity(function, args, 0)?;
                Command::GetClaimIds
            }
            "allowToUpdate" | "allow_to_update" => {
                let (caller, claim_id) = caller_and_id(function, args, 2)?;
                Command::AllowToUpdate { caller, claim_id }
            }
            "delete" => {
                expect_arity(function, args, 1)?;
                Command::Delete {
                    claim_id: ClaimId::new(args[0].as_str())?,
                }
            }
            other => return Err(ClaimError::UnknownFunction(other.to_string())),
        };

        Ok(command)
    }

    /// Canonical function name
    pub fn name(&self) -> &'static str {
        match self {
            Command::Create { .. } => "create",
            Command::TransferToHost { .. } => "transferToHost",
            Command::TransferToHome { .. } => "transferToHome",
            Command::TransferToHostByHome { .. } => "transferToHostByHome",
            Command::TransferToCfa { .. } => "transferToCfa",
            Command::UpdateByHost { .. } => "updateByHost",
            Command::UpdateByHome { .. } => "updateByHome",
            Command::UpdateByHostForCfa { .. } => "updateByHostForCfa",
            Command::GetClaimDetails { .. } => "getClaimDetails",
            Command::GetClaimIds => "getClaimId",
            Command::AllowToUpdate { .. } => "allowToUpdate",
            Command::Delete { .. } => "delete",
        }
    }

    /// Whether the command only reads the ledger
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            Command::GetClaimDetails { .. } | Command::GetClaimIds | Command::AllowToUpdate { .. }
        )
    }

    /// Runs the command and returns its payload
    ///
    /// Reads return the claim JSON or a JSON array of ids. `allowToUpdate`
    /// returns `None` when the claim is not open to the caller. Mutations
    /// return `None`.
    pub async fn execute(self, service: &LifecycleService) -> Result<Option<Vec<u8>>, ClaimError> {
        match self {
            Command::Create { caller, fields } => {
                service.create(&caller, &fields).await?;
                Ok(None)
            }
            Command::TransferToHost { caller, claim_id } => {
                service.transfer_to_host(&caller, &claim_id).await?;
                Ok(None)
            }
            Command::TransferToHome { caller, claim_id } => {
                service.transfer_to_home(&caller, &claim_id).await?;
                Ok(None)
            }
            Command::TransferToHostByHome { caller, claim_id } => {
                service.transfer_to_host_by_home(&caller, &claim_id).await?;
                Ok(None)
            }
            Command::TransferToCfa { caller, claim_id } => {
                service.transfer_to_cfa(&caller, &claim_id).await?;
                Ok(None)
            }
            Command::UpdateByHost {
                caller,
                claim_id,
                approved_amount,
                local_plan_code,
                remote_plan_code,
            } => {
                service
                    .update_by_host(
                        &caller,
                        &claim_id,
                        &approved_amount,
                        &local_plan_code,
                        &remote_plan_code,
                    )
                    .await?;
                Ok(None)
            }
            Command::UpdateByHome {
                caller,
                claim_id,
                cost_share,
                adjustment_flag,
            } => {
                service
                    .update_by_home(&caller, &claim_id, &cost_share, &adjustment_flag)
                    .await?;
                Ok(None)
            }
            Command::UpdateByHostForCfa {
                caller,
                claim_id,
                final_approved_amount,
                payment_method,
            } => {
                service
                    .update_by_host_for_cfa(&caller, &claim_id, &final_approved_amount, &payment_method)
                    .await?;
                Ok(None)
            }
            Command::GetClaimDetails { caller, claim_id } => {
                let claim = service.get_claim_details(&caller, &claim_id).await?;
                Ok(Some(claim.encode()?))
            }
            Command::GetClaimIds => {
                let ids = service.list_claim_ids().await?;
                let payload = serde_json::to_vec(&ids).map_err(|e| ClaimError::Encode {
                    claim_id: "ClaimID".to_string(),
                    message: e.to_string(),
                })?;
                Ok(Some(payload))
            }
            Command::AllowToUpdate { caller, claim_id } => {
                match service.allow_to_update(&caller, &claim_id).await? {
                    Some(claim) => Ok(Some(claim.encode()?)),
                    None => Ok(None),
                }
            }
            Command::Delete { claim_id } => {
                service.delete(&claim_id).await?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_transfer_and_alias() {
        let camel = Command::parse("transferToHost", &args(&["user_type2_0", "K1"]), SchemaVersion::Minimal)
            .unwrap();
        let snake = Command::parse("transfer_to_host", &args(&["user_type2_0", "K1"]), SchemaVersion::Minimal)
            .unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.name(), "transferToHost");
        assert!(!camel.is_query());
    }

    #[test]
    fn test_parse_arity_is_exact() {
        let err = Command::parse("updateByHost", &args(&["user_type2_0", "K1", "500"]), SchemaVersion::Minimal)
            .unwrap_err();
        assert!(matches!(err, ClaimError::Arity { expected: 5, actual: 3, .. }));

        let err = Command::parse("getClaimId", &args(&["extra"]), SchemaVersion::Minimal).unwrap_err();
        assert!(matches!(err, ClaimError::Arity { expected: 0, actual: 1, .. }));
    }

    #[test]
    fn test_parse_create_per_schema() {
        let minimal = args(&["K1", "2017-01-05", "P1", "M1", "S1", "99213", "150.00"]);
        match Command::parse("init", &minimal, SchemaVersion::Minimal).unwrap() {
            Command::Create { caller, fields } => {
                assert_eq!(caller, "");
                assert_eq!(fields.len(), 7);
            }
            other => panic!("unexpected command {:?}", other),
        }

        let err = Command::parse("create", &minimal, SchemaVersion::Full).unwrap_err();
        assert!(matches!(err, ClaimError::Arity { expected: 20, actual: 7, .. }));

        let mut full = vec!["user_type1_0".to_string(), "K1".to_string()];
        full.extend((0..18).map(|i| format!("f{}", i)));
        match Command::parse("create", &full, SchemaVersion::Full).unwrap() {
            Command::Create { caller, fields } => {
                assert_eq!(caller, "user_type1_0");
                assert_eq!(fields[0], "K1");
                assert_eq!(fields.len(), 19);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_reserved_claim_id() {
        let err = Command::parse("getClaimDetails", &args(&["user_type2_0", "State"]), SchemaVersion::Minimal)
            .unwrap_err();
        assert!(matches!(err, ClaimError::InvalidClaimId(_)));
    }

    #[test]
    fn test_unknown_function() {
        let err = Command::parse("approveEverything", &[], SchemaVersion::Minimal).unwrap_err();
        assert!(matches!(err, ClaimError::UnknownFunction(ref f) if f == "approveEverything"));
    }

    #[test]
    fn test_query_classification() {
        assert!(Command::GetClaimIds.is_query());
        let delete = Command::parse("delete", &args(&["K1"]), SchemaVersion::Minimal).unwrap();
        assert!(!delete.is_query());
    }
}
