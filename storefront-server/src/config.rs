//! Server configuration loaded from the environment.

use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;

use storefront_core::{CheckoutConfig, DatabaseSettings, StoreError, StoreResult};
use tracing::info;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseSettings,
    pub checkout: CheckoutConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            // Same host port the Python boilerplate is documented on.
            port: 8001,
            database: DatabaseSettings::default(),
            checkout: CheckoutConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> StoreResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from `lookup`, falling back to the documented
    /// defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> StoreResult<Self> {
        let defaults = ServerConfig::default();
        let db = defaults.database;
        let checkout = defaults.checkout;

        let config = ServerConfig {
            host: load(&lookup, "STOREFRONT_HOST", defaults.host)?,
            port: load(&lookup, "STOREFRONT_PORT", defaults.port)?,
            database: DatabaseSettings {
                host: load(&lookup, "DB_HOST", db.host)?,
                port: load(&lookup, "DB_PORT", db.port)?,
                database: load(&lookup, "DB_NAME", db.database)?,
                user: load(&lookup, "DB_USER", db.user)?,
                password: load(&lookup, "DB_PASSWORD", db.password)?,
                root_password: load(&lookup, "MYSQL_ROOT_PASSWORD", db.root_password)?,
            },
            checkout: CheckoutConfig {
                currency: load(&lookup, "CHECKOUT_CURRENCY", checkout.currency)?,
                tax_rate: load(&lookup, "CHECKOUT_TAX_RATE", checkout.tax_rate)?,
                tax_on_shipping: load(&lookup, "CHECKOUT_TAX_ON_SHIPPING", checkout.tax_on_shipping)?,
            },
        };
        config.database.validate()?;
        config.checkout.validate()?;
        Ok(config)
    }

    pub fn socket_addr(&self) -> StoreResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| StoreError::Configuration(format!("invalid bind address {}:{}: {}", self.host, self.port, e)))
    }
}

fn load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> StoreResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| StoreError::Configuration(format!("invalid {} value '{}': {}", key, raw, e))),
        None => {
            info!("{key} not set, using default");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_follow_documented_stack() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8001);
        assert_eq!(config.database, DatabaseSettings::default());
        assert_eq!(config.checkout, CheckoutConfig::default());
        assert_eq!(config.socket_addr().unwrap().port(), 8001);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("STOREFRONT_PORT", "9000"),
            ("DB_HOST", "localhost"),
            ("CHECKOUT_TAX_RATE", "0.2"),
            ("CHECKOUT_TAX_ON_SHIPPING", "false"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.checkout.tax_rate, 0.2);
        assert!(!config.checkout.tax_on_shipping);
    }

    #[test]
    fn unparsable_values_are_errors() {
        let err = ServerConfig::from_lookup(lookup(&[("STOREFRONT_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("STOREFRONT_PORT"));
    }

    #[test]
    fn invalid_checkout_policy_is_rejected() {
        assert!(ServerConfig::from_lookup(lookup(&[("CHECKOUT_TAX_RATE", "2")])).is_err());
    }
}
