use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid ticket id `{0}` (expected NVA- followed by 6 to 10 letters or digits)")]
    InvalidTicketId(String),
    #[error("invalid pending question: {0}")]
    InvalidQuestion(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("could not read input `{source_name}`: {message}")]
    InputRead { source_name: String, message: String },
    #[error("could not decode input `{source_name}`: {message}")]
    InputDecode { source_name: String, message: String },
    #[error("runtime failure: {0}")]
    Runtime(String),
}

impl ApplicationError {
    /// Stable machine-readable class reported by the CLI.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(_) => "domain_validation",
            Self::Configuration(_) => "config_validation",
            Self::Catalog(_) => "catalog_load",
            Self::InputRead { .. } => "input_read",
            Self::InputDecode { .. } => "input_decode",
            Self::Runtime(_) => "runtime_init",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::InputRead { .. } => 3,
            Self::InputDecode { .. } | Self::Domain(_) => 4,
            Self::Catalog(_) => 5,
            Self::Runtime(_) => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::catalog::CatalogError;
    use crate::config::ConfigError;
    use crate::errors::{ApplicationError, DomainError};

    #[test]
    fn config_error_maps_to_config_validation_class() {
        let error = ApplicationError::from(ConfigError::Validation("logging.level".to_owned()));

        assert_eq!(error.error_class(), "config_validation");
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn catalog_error_keeps_path_in_message() {
        let error = ApplicationError::from(CatalogError::Missing(PathBuf::from("data/products.json")));

        assert_eq!(error.error_class(), "catalog_load");
        assert_eq!(error.exit_code(), 5);
        assert!(error.to_string().contains("data/products.json"));
    }

    #[test]
    fn domain_and_decode_errors_share_exit_code() {
        let domain = ApplicationError::from(DomainError::InvalidTicketId("NVA-1".to_owned()));
        let decode = ApplicationError::InputDecode {
            source_name: "stdin".to_owned(),
            message: "expected value at line 1".to_owned(),
        };

        assert_eq!(domain.exit_code(), decode.exit_code());
        assert_ne!(domain.error_class(), decode.error_class());
    }
}
