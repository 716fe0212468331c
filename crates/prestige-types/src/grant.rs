use std::fmt;

use serde::{Deserialize, Serialize};

/// A single data-plane permission on a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// A set of permissions. Sets only ever grow: there is no "deny" member.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionSet {
    pub read: bool,
    pub write: bool,
}

impl PermissionSet {
    pub const NONE: PermissionSet = PermissionSet {
        read: false,
        write: false,
    };
    pub const READ: PermissionSet = PermissionSet {
        read: true,
        write: false,
    };
    pub const WRITE: PermissionSet = PermissionSet {
        read: false,
        write: true,
    };
    pub const READ_WRITE: PermissionSet = PermissionSet {
        read: true,
        write: true,
    };

    pub fn contains(&self, permission: Permission) -> bool {
        match permission {
            Permission::Read => self.read,
            Permission::Write => self.write,
        }
    }

    /// Additive merge of two sets.
    pub fn union(self, other: PermissionSet) -> PermissionSet {
        PermissionSet {
            read: self.read || other.read,
            write: self.write || other.write,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.read && !self.write
    }

    /// Members in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        [Permission::Read, Permission::Write]
            .into_iter()
            .filter(|p| self.contains(*p))
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.read, self.write) {
            (true, true) => write!(f, "read/write"),
            (true, false) => write!(f, "read"),
            (false, true) => write!(f, "write"),
            (false, false) => write!(f, "none"),
        }
    }
}

/// Explicit binding from a compute unit to a store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessGrant {
    /// Compute unit receiving access.
    pub grantee: String,
    /// Store the access applies to. Never implies access to any other store.
    pub store: String,
    pub permissions: PermissionSet,
}

impl AccessGrant {
    pub fn new(
        grantee: impl Into<String>,
        store: impl Into<String>,
        permissions: PermissionSet,
    ) -> Self {
        Self {
            grantee: grantee.into(),
            store: store.into(),
            permissions,
        }
    }

    pub fn read_write(grantee: impl Into<String>, store: impl Into<String>) -> Self {
        Self::new(grantee, store, PermissionSet::READ_WRITE)
    }
}

impl fmt::Display for AccessGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.grantee, self.store, self.permissions)
    }
}
