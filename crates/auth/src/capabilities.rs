//! Effective capability set for one resolved session.
//!
//! The set is computed once, at resolution time, as the union of the
//! session's explicit permissions, its role's grants and the active
//! membership's extras, scoped to the active workspace type:
//!
//! - tokens outside the reserved namespaces are satisfied only if granted;
//! - tokens inside a reserved namespace are satisfied exactly when the
//!   namespace belongs to the active workspace type. Explicit grants of
//!   foreign-namespace tokens are dropped during construction.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Permission, WorkspaceType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    granted: BTreeSet<Permission>,
    workspace_type: WorkspaceType,
}

impl CapabilitySet {
    pub fn for_workspace<I>(workspace_type: WorkspaceType, grants: I) -> Self
    where
        I: IntoIterator<Item = Permission>,
    {
        let granted = grants
            .into_iter()
            .filter(|p| !p.is_empty())
            .filter(|p| p.namespace().is_none_or(|ns| ns == workspace_type))
            .collect();

        Self {
            granted,
            workspace_type,
        }
    }

    pub fn satisfies(&self, required: &Permission) -> bool {
        match required.namespace() {
            Some(ns) => ns == self.workspace_type,
            None => self.granted.contains(required),
        }
    }

    /// First token in `required` this set does not satisfy.
    pub fn first_missing<'a, I>(&self, required: I) -> Option<&'a Permission>
    where
        I: IntoIterator<Item = &'a Permission>,
    {
        required.into_iter().find(|p| !self.satisfies(p))
    }

    /// Explicitly granted tokens (the namespace grant is implied by
    /// [`Self::workspace_type`]).
    pub fn granted(&self) -> impl Iterator<Item = &Permission> {
        self.granted.iter()
    }

    pub fn workspace_type(&self) -> WorkspaceType {
        self.workspace_type
    }
}
