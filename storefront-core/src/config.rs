use serde::{Serialize, Deserialize};
use crate::error::{StoreResult, StoreError};

/// Default MySQL port; compose files leave it implicit.
pub const DEFAULT_DB_PORT: u16 = 3306;

/// Connection parameters for the shared MySQL container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Compose service name of the database container.
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub root_password: String,
}

impl DatabaseSettings {
    /// Renders the settings as a `mysql://` connection URL.
    pub fn connection_url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.host.trim().is_empty() {
            return Err(StoreError::Configuration("database host must not be empty".to_string()));
        }
        if self.database.trim().is_empty() {
            return Err(StoreError::Configuration("database name must not be empty".to_string()));
        }
        if self.user.trim().is_empty() {
            return Err(StoreError::Configuration("database user must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(StoreError::Configuration("database port must be greater than 0".to_string()));
        }
        Ok(())
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            host: "db".to_string(),
            port: DEFAULT_DB_PORT,
            database: "hackathon".to_string(),
            user: "hackathon".to_string(),
            password: "hackathon".to_string(),
            root_password: "root".to_string(),
        }
    }
}

/// Tax and currency policy applied when quoting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// ISO 4217 code attached to quotes and orders.
    pub currency: String,
    /// Fraction in `[0, 1)`, e.g. `0.08` for 8%.
    pub tax_rate: f64,
    /// Whether shipping is part of the taxable amount.
    pub tax_on_shipping: bool,
}

impl CheckoutConfig {
    pub fn validate(&self) -> StoreResult<()> {
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(StoreError::Configuration(format!(
                "currency must be a 3-letter uppercase code, got '{}'",
                self.currency
            )));
        }
        if !self.tax_rate.is_finite() || self.tax_rate < 0.0 || self.tax_rate >= 1.0 {
            return Err(StoreError::Configuration(format!(
                "tax_rate must be in [0, 1), got {}",
                self.tax_rate
            )));
        }
        Ok(())
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        CheckoutConfig {
            currency: "EUR".to_string(),
            tax_rate: 0.08,
            tax_on_shipping: true,
        }
    }
}
