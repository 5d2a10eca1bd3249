//! Route-policy registry loading from a JSON document on disk.

use std::path::Path;

use tracing::info;

use edugate_auth::RoutePolicyRegistry;

use crate::ConfigError;

/// Load `{ "<route>": { ...policy... } }` from `path`. Any malformed entry
/// fails the whole load; a server must not start with a partial policy table.
pub fn load_registry(path: &Path) -> Result<RoutePolicyRegistry, ConfigError> {
    let document = std::fs::read_to_string(path).map_err(|e| ConfigError::PolicyFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let registry = RoutePolicyRegistry::from_json(&document)?;
    info!(path = %path.display(), routes = registry.len(), "route policies loaded");
    Ok(registry)
}
