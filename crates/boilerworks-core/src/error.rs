//! Error types shared across the workspace.

/// Errors raised by the core and bridge.
///
/// `ConfigurationMismatch` marks a component invoked outside its valid
/// role -- a design invariant violation, not a recoverable runtime
/// condition. Callers must not paper over it with a zero result.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("component invoked outside its role: {what}")]
    ConfigurationMismatch { what: &'static str },

    #[error("carry {value} out of range for divisor {divisor}")]
    InvalidCarry { value: i64, divisor: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_display() {
        let e = CoreError::ConfigurationMismatch {
            what: "packet bridge asked for recipe energy",
        };
        assert!(e.to_string().contains("outside its role"));

        let e = CoreError::InvalidCarry {
            value: 170,
            divisor: 160,
        };
        assert!(e.to_string().contains("170"));
    }
}
