use serde::{Deserialize, Serialize};

use edugate_core::DomainError;

/// Kind of tenant a workspace represents.
///
/// Each type owns one reserved permission namespace. That mapping is the
/// workspace-scoped capability table: a session scoped to a workspace of type
/// `T` holds every token in `T`'s namespace and none from the others.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceType {
    Provider,
    Staff,
    Student,
}

impl WorkspaceType {
    pub const ALL: [WorkspaceType; 3] = [Self::Provider, Self::Staff, Self::Student];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Staff => "staff",
            Self::Student => "student",
        }
    }

    pub const fn permission_prefix(self) -> &'static str {
        match self {
            Self::Provider => "PROVIDER_",
            Self::Staff => "STAFF_",
            Self::Student => "STUDENT_",
        }
    }
}

impl core::fmt::Display for WorkspaceType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for WorkspaceType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s.trim())
            .ok_or_else(|| DomainError::validation(format!("unknown workspace type '{s}'")))
    }
}
