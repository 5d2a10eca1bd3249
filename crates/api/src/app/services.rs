//! Cache, policy and pipeline wiring from [`AuthConfig`].

use std::sync::Arc;

use anyhow::Context;

use edugate_auth::{
    Authorizer, InMemorySessionCache, RoleTable, RoutePolicyRegistry, SessionCache, SystemClock,
};
use edugate_infra::{AuthConfig, cache::RedisSessionCache, load_registry};

use super::{default_registry, routes::GUARDED_ROUTES};

pub async fn build_authorizer(config: &AuthConfig) -> anyhow::Result<Arc<Authorizer>> {
    let cache: Arc<dyn SessionCache> = match &config.redis_url {
        Some(url) => Arc::new(
            RedisSessionCache::connect(url)
                .await
                .context("connecting to session cache")?
                .with_key_prefix(config.redis_key_prefix.clone()),
        ),
        None => {
            tracing::warn!("EDUGATE_REDIS_URL not set; sessions live in process memory");
            Arc::new(InMemorySessionCache::default())
        }
    };

    let registry = match &config.policy_file {
        Some(path) => load_registry(path)?,
        None => default_registry()?,
    };
    ensure_guarded_routes_covered(&registry)?;

    Ok(Arc::new(Authorizer::new(
        cache,
        Arc::new(registry),
        Arc::new(RoleTable::standard()),
        Arc::new(SystemClock),
    )))
}

/// A guarded route without a policy would fail every request at runtime;
/// refuse to start instead.
pub fn ensure_guarded_routes_covered(registry: &RoutePolicyRegistry) -> anyhow::Result<()> {
    let missing: Vec<&str> = GUARDED_ROUTES
        .into_iter()
        .filter(|route| registry.get(route).is_none())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("no route policy for: {}", missing.join(", "))
    }
}
