//! Custom validation functions for configuration.

use validator::ValidationError;

/// Validate log level.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid = ["trace", "debug", "info", "warn", "error"]
        .contains(&level.to_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

/// Prometheus metric names allow `[a-zA-Z_:][a-zA-Z0-9_:]*`; the namespace
/// is kept to the colon-free subset.
pub fn validate_metric_namespace(name: &str) -> Result<(), ValidationError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_metric_namespace"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_levels() {
        assert!(validate_log_level("DEBUG").is_ok());
        assert!(validate_log_level("verbose").is_err());
    }

    #[test]
    fn metric_namespaces() {
        assert!(validate_metric_namespace("scratchpool").is_ok());
        assert!(validate_metric_namespace("_bls_2").is_ok());
        assert!(validate_metric_namespace("").is_err());
        assert!(validate_metric_namespace("9lives").is_err());
        assert!(validate_metric_namespace("bad-name").is_err());
    }
}
