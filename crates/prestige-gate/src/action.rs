use std::fmt;

use prestige_types::{Permission, PermissionSet};
use serde::{Deserialize, Serialize};

/// A data-plane operation on a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    GetItem,
    BatchGetItem,
    Query,
    Scan,
    ConditionCheckItem,
    DescribeTable,
    PutItem,
    UpdateItem,
    DeleteItem,
    BatchWriteItem,
}

impl Action {
    pub const READ_ACTIONS: [Action; 6] = [
        Action::BatchGetItem,
        Action::GetItem,
        Action::Query,
        Action::Scan,
        Action::ConditionCheckItem,
        Action::DescribeTable,
    ];

    pub const WRITE_ACTIONS: [Action; 4] = [
        Action::BatchWriteItem,
        Action::PutItem,
        Action::UpdateItem,
        Action::DeleteItem,
    ];

    /// Permission a grant must carry for this action.
    pub fn required_permission(&self) -> Permission {
        match self {
            Self::GetItem
            | Self::BatchGetItem
            | Self::Query
            | Self::Scan
            | Self::ConditionCheckItem
            | Self::DescribeTable => Permission::Read,
            Self::PutItem | Self::UpdateItem | Self::DeleteItem | Self::BatchWriteItem => {
                Permission::Write
            }
        }
    }

    /// The minimal action list a permission set expands to.
    pub fn expand(permissions: PermissionSet) -> Vec<Action> {
        let mut actions = Vec::new();
        if permissions.read {
            actions.extend(Self::READ_ACTIONS);
        }
        if permissions.write {
            actions.extend(Self::WRITE_ACTIONS);
        }
        actions
    }

    /// Service-qualified action name as it appears in a policy document.
    pub fn iam_name(&self) -> String {
        format!("dynamodb:{self:?}")
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_actions_need_read() {
        for a in Action::READ_ACTIONS {
            assert_eq!(a.required_permission(), Permission::Read);
        }
    }

    #[test]
    fn write_actions_need_write() {
        for a in Action::WRITE_ACTIONS {
            assert_eq!(a.required_permission(), Permission::Write);
        }
    }

    #[test]
    fn expand_matches_permissions() {
        assert_eq!(Action::expand(PermissionSet::READ).len(), 6);
        assert_eq!(Action::expand(PermissionSet::WRITE).len(), 4);
        assert_eq!(Action::expand(PermissionSet::READ_WRITE).len(), 10);
        assert!(Action::expand(PermissionSet::NONE).is_empty());
    }

    #[test]
    fn iam_names() {
        assert_eq!(Action::GetItem.iam_name(), "dynamodb:GetItem");
        assert_eq!(Action::BatchWriteItem.iam_name(), "dynamodb:BatchWriteItem");
    }
}
