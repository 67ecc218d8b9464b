//! Submission input validation.
//!
//! Runs before any job is created or any network traffic happens.

use std::time::Duration;

use crate::error::CoreError;

/// Reject empty (or whitespace-only) payloads and zero timeouts.
pub fn validate_submission(payload: &str, timeout: Duration) -> Result<(), CoreError> {
    if payload.trim().is_empty() {
        return Err(CoreError::Validation(
            "Script payload must not be empty".to_string(),
        ));
    }
    if timeout.is_zero() {
        return Err(CoreError::Validation(
            "Timeout must be a positive duration".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_regular_payload() {
        assert!(validate_submission("noop", Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn rejects_empty_and_blank_payloads() {
        for payload in ["", "   ", "\n\t"] {
            let err = validate_submission(payload, Duration::from_secs(1)).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Validation failed: Script payload must not be empty"
            );
        }
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = validate_submission("noop", Duration::ZERO).unwrap_err();
        assert!(err.to_string().contains("positive duration"));
    }
}
