//! Configuration validation.

use crate::schema::Config;

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

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
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

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_coordinator(config, &mut result);
        Self::validate_agent(config, &mut result);
        Self::validate_backend(config, &mut result);

        result
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }
        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }
    }

    fn validate_coordinator(config: &Config, result: &mut ValidationResult) {
        let coordinator = &config.coordinator;
        if coordinator.screenshot_capacity == 0 {
            result.add_error(ValidationError::new(
                "coordinator.screenshot_capacity",
                "Capacity must be at least 1",
            ));
        }
        if coordinator.supported_hosts.is_empty() {
            result.add_error(ValidationError::new(
                "coordinator.supported_hosts",
                "At least one supported platform host is required",
            ));
        }
        if coordinator.trade_settle_delay_ms < coordinator.settle_delay_ms {
            result.add_warning(ValidationWarning::new(
                "coordinator.trade_settle_delay_ms",
                "Trade settle delay is shorter than the regular settle delay",
            ));
        }
    }

    fn validate_agent(config: &Config, result: &mut ValidationResult) {
        let agent = &config.agent;
        if !(agent.growth_factor >= 1.0) {
            result.add_error(ValidationError::new(
                "agent.growth_factor",
                "Growth factor must be at least 1.0",
            ));
        }
        if agent.base_delay_ms > agent.max_delay_ms {
            result.add_error(ValidationError::new(
                "agent.base_delay_ms",
                "Base delay exceeds max delay",
            ));
        }
        if agent.request_timeout_ms == 0 || agent.ping_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "agent.request_timeout_ms",
                "Timeouts must be greater than 0",
            ));
        }
        if agent.max_attempts == 0 {
            result.add_warning(ValidationWarning::new(
                "agent.max_attempts",
                "Content agents will never retry a failed handshake",
            ));
        }
    }

    fn validate_backend(config: &Config, result: &mut ValidationResult) {
        let backend = &config.backend;
        let Some(base_url) = backend.base_url.as_deref().filter(|u| !u.is_empty()) else {
            return;
        };

        match url::Url::parse(base_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(_) => result.add_error(ValidationError::new(
                "backend.base_url",
                "Base URL must use http or https",
            )),
            Err(e) => result.add_error(ValidationError::new(
                "backend.base_url",
                format!("Invalid URL: {}", e),
            )),
        }

        if backend.anon_key.as_deref().is_none_or(str::is_empty) {
            result.add_warning(ValidationWarning::new(
                "backend.anon_key",
                "No anon key configured; backend requests will be rejected",
            ));
        }
        if backend.poll_interval_secs == 0 {
            result.add_error(ValidationError::new(
                "backend.poll_interval_secs",
                "Poll interval must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
