use thiserror::Error;
use std::path::PathBuf;

/// The main result type for storefront-core operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Enum representing possible errors within the storefront-core library.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("SKU already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    #[error("Unknown {kind} SKU: {sku}")]
    UnknownItem { kind: String, sku: String },

    #[error("Invalid bundle SKU format (expected 'phone|plan'): {0}")]
    InvalidBundleSku(String),

    #[error("Invalid kind: {0}")]
    InvalidKind(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Product is not available: {0}")]
    Unavailable(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid shipping option: {0}")]
    InvalidShippingOption(usize),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error accessing path {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Compose file error: {0}")]
    Compose(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for StoreError {
    fn from(err: serde_yaml::Error) -> Self {
        StoreError::Compose(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display_not_found() {
        let err = StoreError::NotFound("p-iphone-15".to_string());
        assert_eq!(format!("{}", err), "Product not found: p-iphone-15");
    }

    #[test]
    fn test_error_display_unknown_item() {
        let err = StoreError::UnknownItem { kind: "phone".to_string(), sku: "p-nope".to_string() };
        assert_eq!(format!("{}", err), "Unknown phone SKU: p-nope");
    }

    #[test]
    fn test_error_display_bundle_sku() {
        let err = StoreError::InvalidBundleSku("p-iphone-15".to_string());
        assert_eq!(
            format!("{}", err),
            "Invalid bundle SKU format (expected 'phone|plan'): p-iphone-15"
        );
    }

    #[test]
    fn test_error_display_empty_cart() {
        assert_eq!(format!("{}", StoreError::EmptyCart), "Cart is empty");
    }

    #[test]
    fn test_error_display_io_error() {
        let path = PathBuf::from("/tmp/docker-compose.yml");
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = StoreError::IoError { path, source: io_err };
        assert!(format!("{}", err).contains("I/O error accessing path \"/tmp/docker-compose.yml\""));
        assert!(format!("{}", err).contains("file not found"));
    }

    #[test]
    fn test_from_yaml_error() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("services: [").unwrap_err();
        let err: StoreError = yaml_err.into();
        assert!(matches!(err, StoreError::Compose(_)));
    }
}
