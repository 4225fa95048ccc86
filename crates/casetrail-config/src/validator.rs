//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Timeouts above this many seconds are accepted but reported.
const LONG_TIMEOUT_SECS: u64 = 300;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error, if any, into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(first) => Err(ConfigError::InvalidValue {
                field: first.path,
                message: first.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_browser(config, &mut result);
        Self::validate_fetch(config, &mut result);
        Self::validate_logging(config, &mut result);

        result
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        if config.browser.debug_port == 0 {
            result.add_error(ValidationError::new(
                "browser.debug_port",
                "Port cannot be 0",
            ));
        }
    }

    fn validate_fetch(config: &Config, result: &mut ValidationResult) {
        let fetch = &config.fetch;

        for (path, secs) in [
            ("fetch.load_timeout_secs", fetch.load_timeout_secs),
            ("fetch.result_timeout_secs", fetch.result_timeout_secs),
        ] {
            if secs == 0 {
                result.add_error(ValidationError::new(path, "Timeout must be greater than 0"));
            } else if secs > LONG_TIMEOUT_SECS {
                result.add_warning(ValidationWarning::new(
                    path,
                    format!(
                        "Timeout is very high (>{}s), a stuck tab will hold the whole batch",
                        LONG_TIMEOUT_SECS
                    ),
                ));
            }
        }

        if fetch.channel_capacity == 0 {
            result.add_error(ValidationError::new(
                "fetch.channel_capacity",
                "channel_capacity must be greater than 0",
            ));
        }

        for (path, markers) in [
            ("fetch.auth_redirect_markers", &fetch.auth_redirect_markers),
            ("fetch.error_url_markers", &fetch.error_url_markers),
        ] {
            // An empty marker matches every URL.
            if markers.iter().any(|m| m.is_empty()) {
                result.add_error(ValidationError::new(path, "Markers cannot be empty strings"));
            }
        }

        if fetch.auth_redirect_markers.is_empty() {
            result.add_warning(ValidationWarning::new(
                "fetch.auth_redirect_markers",
                "No sign-in markers set, expired sessions will surface as extraction timeouts",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        if config.logging.level.trim().is_empty() {
            result.add_error(ValidationError::new(
                "logging.level",
                "Log level cannot be empty",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
