//! Environment-driven configuration for the authorization service.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use edugate_auth::PolicyError;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_SESSION_COOKIE: &str = "session_id";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("could not read policy file {path}: {reason}")]
    PolicyFile { path: PathBuf, reason: String },

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// `EDUGATE_BIND_ADDR`
    pub bind_addr: SocketAddr,
    /// `EDUGATE_REDIS_URL`; the in-memory cache is used when unset.
    pub redis_url: Option<String>,
    /// `EDUGATE_REDIS_KEY_PREFIX`
    pub redis_key_prefix: String,
    /// `EDUGATE_POLICY_FILE`; built-in route policies are used when unset.
    pub policy_file: Option<PathBuf>,
    /// `EDUGATE_SESSION_COOKIE`
    pub session_cookie: String,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = get("EDUGATE_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: "EDUGATE_BIND_ADDR",
                reason: e.to_string(),
            })?;

        let session_cookie = get("EDUGATE_SESSION_COOKIE").unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string());
        if session_cookie.contains([';', '=', ' ']) {
            return Err(ConfigError::Invalid {
                var: "EDUGATE_SESSION_COOKIE",
                reason: format!("'{session_cookie}' is not a valid cookie name"),
            });
        }

        Ok(Self {
            bind_addr,
            redis_url: get("EDUGATE_REDIS_URL"),
            redis_key_prefix: get("EDUGATE_REDIS_KEY_PREFIX").unwrap_or_default(),
            policy_file: get("EDUGATE_POLICY_FILE").map(PathBuf::from),
            session_cookie,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AuthConfig, ConfigError> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AuthConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(cfg.session_cookie, DEFAULT_SESSION_COOKIE);
        assert_eq!(cfg.redis_url, None);
        assert_eq!(cfg.policy_file, None);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = config(&[("EDUGATE_REDIS_URL", "  "), ("EDUGATE_SESSION_COOKIE", "")]).unwrap();
        assert_eq!(cfg.redis_url, None);
        assert_eq!(cfg.session_cookie, DEFAULT_SESSION_COOKIE);
    }

    #[test]
    fn explicit_values_are_used() {
        let cfg = config(&[
            ("EDUGATE_BIND_ADDR", "127.0.0.1:9000"),
            ("EDUGATE_REDIS_URL", "redis://cache:6379"),
            ("EDUGATE_REDIS_KEY_PREFIX", "edugate:"),
            ("EDUGATE_POLICY_FILE", "/etc/edugate/routes.json"),
            ("EDUGATE_SESSION_COOKIE", "sid"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(cfg.redis_key_prefix, "edugate:");
        assert_eq!(cfg.policy_file, Some(PathBuf::from("/etc/edugate/routes.json")));
        assert_eq!(cfg.session_cookie, "sid");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config(&[("EDUGATE_BIND_ADDR", "not-an-addr")]),
            Err(ConfigError::Invalid { var: "EDUGATE_BIND_ADDR", .. })
        ));
        assert!(matches!(
            config(&[("EDUGATE_SESSION_COOKIE", "a=b")]),
            Err(ConfigError::Invalid { var: "EDUGATE_SESSION_COOKIE", .. })
        ));
    }
}
