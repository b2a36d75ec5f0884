use std::time::Duration;

/// How custom-data payloads are checked against the entity type's declared
/// field list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Accept any payload. Matches the permissive behavior of systems that
    /// treat the schema as documentation only.
    #[default]
    Permissive,
    /// Reject unknown fields, type-incompatible values, and missing
    /// required fields. Falls back to permissive (with a warning) when the
    /// schema itself cannot be read: a flexible-store outage must never
    /// fail a canonical write.
    Strict,
}

/// Coordination-layer configuration
///
/// Constructed explicitly and handed to [`EventDb`](crate::facade::EventDb);
/// there is no ambient global configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Timeout for canonical store calls. Exceeding it aborts the whole
    /// operation.
    pub canonical_timeout: Duration,

    /// Timeout for flexible-attribute and ephemeral store calls. Exceeding
    /// it is treated like a store failure: degrade on reads, mark-and-warn
    /// on writes.
    pub secondary_timeout: Duration,

    /// Custom-data validation policy.
    pub validation: ValidationMode,
}

impl DbConfig {
    pub fn new() -> Self {
        Self {
            canonical_timeout: Duration::from_secs(30),
            secondary_timeout: Duration::from_secs(5),
            validation: ValidationMode::Permissive,
        }
    }

    /// Set the canonical store timeout
    pub fn canonical_timeout(mut self, timeout: Duration) -> Self {
        self.canonical_timeout = timeout;
        self
    }

    /// Set the secondary store timeout
    pub fn secondary_timeout(mut self, timeout: Duration) -> Self {
        self.secondary_timeout = timeout;
        self
    }

    /// Set the custom-data validation policy
    pub fn validation(mut self, mode: ValidationMode) -> Self {
        self.validation = mode;
        self
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::new()
    }
}
