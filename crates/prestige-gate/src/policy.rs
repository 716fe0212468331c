use prestige_types::{Permission, PermissionSet};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::action::Action;

/// Statement effect. Only `Allow` exists: denial is the absence of a statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
}

/// One store's worth of allowed actions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStatement {
    pub effect: Effect,
    pub actions: Vec<Action>,
    /// Store name the statement is scoped to.
    pub resource: String,
}

impl PolicyStatement {
    pub fn allow(resource: impl Into<String>, permissions: PermissionSet) -> Self {
        Self {
            effect: Effect::Allow,
            actions: Action::expand(permissions),
            resource: resource.into(),
        }
    }

    pub fn permits(&self, store: &str, action: Action) -> bool {
        self.resource == store && self.actions.contains(&action)
    }
}

/// The credential policy attached to one compute unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPolicy {
    /// Compute unit the policy is attached to.
    pub principal: String,
    /// One statement per granted store, in store-name order.
    pub statements: Vec<PolicyStatement>,
}

impl CredentialPolicy {
    /// A policy that allows nothing.
    pub fn deny_all(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            statements: Vec::new(),
        }
    }

    /// Returns `true` only if a statement explicitly allows `action` on `store`.
    pub fn allows(&self, store: &str, action: Action) -> bool {
        self.statements.iter().any(|s| s.permits(store, action))
    }

    /// Stores this policy mentions at all.
    pub fn stores(&self) -> impl Iterator<Item = &str> {
        self.statements.iter().map(|s| s.resource.as_str())
    }

    /// Effective permissions on `store`.
    pub fn permissions_on(&self, store: &str) -> PermissionSet {
        let covers = |permission: Permission| {
            let required: Vec<Action> = match permission {
                Permission::Read => Action::READ_ACTIONS.to_vec(),
                Permission::Write => Action::WRITE_ACTIONS.to_vec(),
            };
            required.iter().all(|a| self.allows(store, *a))
        };
        PermissionSet {
            read: covers(Permission::Read),
            write: covers(Permission::Write),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Render as a JSON policy document.
    pub fn to_document(&self) -> Value {
        let statements: Vec<Value> = self
            .statements
            .iter()
            .map(|s| {
                json!({
                    "Effect": "Allow",
                    "Action": s.actions.iter().map(Action::iam_name).collect::<Vec<_>>(),
                    "Resource": [format!("table/{}", s.resource)],
                })
            })
            .collect();
        json!({
            "Version": "2012-10-17",
            "Principal": self.principal,
            "Statement": statements,
        })
    }

    /// BLAKE3 hash of the serialized policy.
    pub fn policy_hash(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"prestige-gate-policy-v1:");
        match serde_json::to_vec(self) {
            Ok(bytes) => {
                hasher.update(&bytes);
            }
            Err(_) => return [0u8; 32],
        }
        *hasher.finalize().as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matchup_policy() -> CredentialPolicy {
        CredentialPolicy {
            principal: "Matchup".into(),
            statements: vec![
                PolicyStatement::allow("prestige-companies", PermissionSet::READ_WRITE),
                PolicyStatement::allow("prestige-matchups", PermissionSet::READ),
            ],
        }
    }

    #[test]
    fn deny_all_allows_nothing() {
        let policy = CredentialPolicy::deny_all("Rankings");
        assert!(policy.is_empty());
        assert!(!policy.allows("prestige-companies", Action::GetItem));
        assert_eq!(policy.permissions_on("prestige-companies"), PermissionSet::NONE);
    }

    #[test]
    fn allows_is_per_store() {
        let policy = matchup_policy();
        assert!(policy.allows("prestige-companies", Action::PutItem));
        assert!(policy.allows("prestige-matchups", Action::GetItem));
        assert!(!policy.allows("prestige-matchups", Action::PutItem));
        assert!(!policy.allows("other-table", Action::GetItem));
    }

    #[test]
    fn permissions_on_reconstructs_grant() {
        let policy = matchup_policy();
        assert_eq!(policy.permissions_on("prestige-companies"), PermissionSet::READ_WRITE);
        assert_eq!(policy.permissions_on("prestige-matchups"), PermissionSet::READ);
    }

    #[test]
    fn document_shape() {
        let doc = matchup_policy().to_document();
        assert_eq!(doc["Principal"], "Matchup");
        let statements = doc["Statement"].as_array().unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0]["Resource"][0], "table/prestige-companies");
        assert!(statements[1]["Action"]
            .as_array()
            .unwrap()
            .iter()
            .all(|a| a != "dynamodb:PutItem"));
    }

    #[test]
    fn policy_hash_tracks_content() {
        let a = matchup_policy();
        let mut b = matchup_policy();
        assert_eq!(a.policy_hash(), b.policy_hash());
        b.statements.pop();
        assert_ne!(a.policy_hash(), b.policy_hash());
    }
}
