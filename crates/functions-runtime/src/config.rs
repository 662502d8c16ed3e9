//! Configuration for the functions server

use crate::error::ConfigError;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Primary listener port override
pub const PORT_ENV: &str = "PORT";

/// Admin listener port. Unset disables the admin endpoint.
pub const ADMIN_PORT_ENV: &str = "ADMIN_PORT";

pub const DEFAULT_PORT: u16 = 8080;

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address both listeners bind to
    pub host: IpAddr,

    /// Function listener port
    pub port: u16,

    /// Admin listener port; `None` keeps the admin endpoint unbound
    pub admin_port: Option<u16>,

    /// Time in-flight requests get to finish once shutdown starts
    pub grace_period: Duration,

    /// Maximum event payload size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            admin_port: None,
            grace_period: DEFAULT_GRACE_PERIOD,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl ServerConfig {
    /// Load ports from `PORT` and `ADMIN_PORT`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load ports through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = parse_port(PORT_ENV, lookup(PORT_ENV))? {
            config.port = port;
        }
        config.admin_port = parse_port(ADMIN_PORT_ENV, lookup(ADMIN_PORT_ENV))?;

        Ok(config)
    }

    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_admin_port(mut self, port: u16) -> Self {
        self.admin_port = Some(port);
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    pub fn admin_enabled(&self) -> bool {
        self.admin_port.is_some()
    }
}

// An empty variable counts as unset.
fn parse_port(var: &'static str, value: Option<String>) -> Result<Option<u16>, ConfigError> {
    match value {
        None => Ok(None),
        Some(value) if value.is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse::<u16>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidPort { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.admin_port, None);
        assert_eq!(config.grace_period, Duration::from_secs(5));
        assert!(!config.admin_enabled());
    }

    #[test]
    fn test_ports_from_environment() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "9090"), ("ADMIN_PORT", "9091")]))
            .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.admin_port, Some(9091));
        assert!(config.admin_enabled());
    }

    #[test]
    fn test_missing_admin_port_disables_admin() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(!config.admin_enabled());

        let config = ServerConfig::from_lookup(lookup(&[("ADMIN_PORT", "")])).unwrap();
        assert!(!config.admin_enabled());
    }

    #[test]
    fn test_malformed_port_is_rejected() {
        let err = ServerConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidPort {
                var: "PORT",
                value: "eighty".to_string()
            }
        );

        let err = ServerConfig::from_lookup(lookup(&[("ADMIN_PORT", "70000")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidPort {
                var: "ADMIN_PORT",
                ..
            }
        ));
    }
}
