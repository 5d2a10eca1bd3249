//! Route-keyed policy table, built once at startup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};

use crate::{PolicyError, RoutePolicy};

#[derive(Debug, Clone, Default)]
pub struct RoutePolicyRegistry {
    policies: HashMap<String, Arc<RoutePolicy>>,
}

impl RoutePolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, route: impl Into<String>, policy: RoutePolicy) -> Result<Self, PolicyError> {
        let route = route.into();
        policy.validate()?;
        if self.policies.contains_key(&route) {
            return Err(PolicyError::DuplicateRoute(route));
        }
        self.policies.insert(route, Arc::new(policy));
        Ok(self)
    }

    /// Parse a `{ "<route>": { ...policy... } }` document. A route that
    /// appears twice is [`PolicyError::DuplicateRoute`].
    pub fn from_json(document: &str) -> Result<Self, PolicyError> {
        let PolicyDocument(entries) =
            serde_json::from_str(document).map_err(|e| PolicyError::Parse(e.to_string()))?;

        entries
            .into_iter()
            .try_fold(Self::new(), |registry, (route, policy)| registry.register(route, policy))
    }

    /// Merge `other` into `self`; a route defined in both is an error.
    pub fn merge(self, other: RoutePolicyRegistry) -> Result<Self, PolicyError> {
        other.policies.into_iter().try_fold(self, |mut registry, (route, policy)| {
            if registry.policies.contains_key(&route) {
                return Err(PolicyError::DuplicateRoute(route));
            }
            registry.policies.insert(route, policy);
            Ok(registry)
        })
    }

    pub fn get(&self, route: &str) -> Option<Arc<RoutePolicy>> {
        self.policies.get(route).cloned()
    }

    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

/// Policy file entries in document order, duplicates included.
struct PolicyDocument(Vec<(String, RoutePolicy)>);

impl<'de> Deserialize<'de> for PolicyDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = PolicyDocument;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of route to policy")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, RoutePolicy>()? {
                    entries.push(entry);
                }
                Ok(PolicyDocument(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorkspaceType;

    #[test]
    fn repeated_route_in_document_is_rejected() {
        let err = RoutePolicyRegistry::from_json(
            r#"{
                "/me": { "authRequired": true },
                "/me": { "authRequired": false }
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::DuplicateRoute(route) if route == "/me"));
    }

    #[test]
    fn non_object_document_is_a_parse_error() {
        let err = RoutePolicyRegistry::from_json(r#"["/me"]"#).unwrap_err();
        assert!(matches!(err, PolicyError::Parse(_)));
    }

    #[test]
    fn loads_routes_from_json() {
        let registry = RoutePolicyRegistry::from_json(
            r#"{
                "/catalog": { "authRequired": false },
                "/provider/cards": { "workspace": "provider", "permission": "PROVIDER_CARD_CREATE" }
            }"#,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(!registry.get("/catalog").unwrap().auth_required());
        assert_eq!(
            registry.get("/provider/cards").unwrap().required_workspace(),
            Some(WorkspaceType::Provider)
        );
        assert!(registry.get("/missing").is_none());
    }

    #[test]
    fn one_bad_route_rejects_the_document() {
        let err = RoutePolicyRegistry::from_json(
            r#"{ "/ok": {}, "/bad": { "workspace": "galaxy" } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::Parse(msg) if msg.contains("galaxy")));
    }

    #[test]
    fn duplicate_registration_fails() {
        let err = RoutePolicyRegistry::new()
            .register("/a", RoutePolicy::public())
            .and_then(|r| r.register("/a", RoutePolicy::authenticated()))
            .unwrap_err();
        assert_eq!(err, PolicyError::DuplicateRoute("/a".to_string()));
    }

    #[test]
    fn merge_detects_overlap() {
        let a = RoutePolicyRegistry::new().register("/a", RoutePolicy::public()).unwrap();
        let b = RoutePolicyRegistry::new().register("/a", RoutePolicy::public()).unwrap();
        assert!(matches!(a.merge(b), Err(PolicyError::DuplicateRoute(_))));
    }
}
