use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::workspace::WorkspaceType;

/// Permission identifier (capability token), e.g. `"CARD_PUBLISH"`.
///
/// Tokens are opaque except for the reserved namespaces `PROVIDER_`, `STAFF_`
/// and `STUDENT_`: a token in one of those namespaces is governed by the
/// workspace type, not by explicit grants (see [`crate::CapabilitySet`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Workspace type whose reserved namespace this token belongs to, if any.
    pub fn namespace(&self) -> Option<WorkspaceType> {
        WorkspaceType::ALL
            .into_iter()
            .find(|ty| self.as_str().starts_with(ty.permission_prefix()))
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_prefixes_map_to_workspace_types() {
        assert_eq!(
            Permission::new("PROVIDER_CARD_CREATE").namespace(),
            Some(WorkspaceType::Provider)
        );
        assert_eq!(Permission::new("STAFF_REPORTS").namespace(), Some(WorkspaceType::Staff));
        assert_eq!(
            Permission::new("STUDENT_ENROLL").namespace(),
            Some(WorkspaceType::Student)
        );
    }

    #[test]
    fn prefix_match_is_case_sensitive_and_anchored() {
        assert_eq!(Permission::new("provider_card_create").namespace(), None);
        assert_eq!(Permission::new("CARD_PROVIDER_EDIT").namespace(), None);
        assert_eq!(Permission::new("PROVIDERS_LIST").namespace(), None);
    }
}
