//! Error types and handling for the `HealthExposure` client

use std::time::Duration;

use thiserror::Error;

/// Main error type for the `HealthExposure` client
#[derive(Error, Debug)]
pub enum HealthExposureError {
    /// The user (or platform) refused to share a position
    #[error("Location permission denied: {message}")]
    PermissionDenied { message: String },

    /// A position could not be determined
    #[error("Location unavailable: {message}")]
    LocationUnavailable { message: String },

    /// An operation ran past its deadline
    #[error("Timed out: {message}")]
    Timeout { message: String },

    /// Transport-level failure talking to a remote service
    #[error("Network error: {message}")]
    Network { message: String },

    /// The backend answered with a non-success status
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// The backend answered, but the body could not be understood
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// A manual refresh was requested inside the cooldown window
    #[error("Refresh rejected, {}s of cooldown remaining", remaining.as_secs())]
    RefreshCooldown { remaining: Duration },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl HealthExposureError {
    pub fn permission_denied<S: Into<String>>(message: S) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    pub fn location_unavailable<S: Into<String>>(message: S) -> Self {
        Self::LocationUnavailable {
            message: message.into(),
        }
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn backend<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether trying the same operation again later could succeed.
    ///
    /// Nothing in the library acts on this by itself; it only informs the caller.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } => true,
            Self::Backend { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied { .. } => {
                "Location access was denied. Please enable location services.".to_string()
            }
            Self::LocationUnavailable { .. } => "Location information is unavailable.".to_string(),
            Self::Timeout { message } => message.clone(),
            Self::Network { .. } => {
                "Unable to reach the health data service. Please check your internet connection."
                    .to_string()
            }
            Self::Backend { status, message } => {
                if message.is_empty() {
                    format!("The health data service returned an error (HTTP {status}).")
                } else {
                    format!("The health data service returned an error (HTTP {status}): {message}")
                }
            }
            Self::MalformedResponse { .. } => {
                "Error loading environmental data. Please try again.".to_string()
            }
            Self::RefreshCooldown { remaining } => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let minutes = ((remaining.as_secs_f64() / 60.0).ceil() as u64).max(1);
                let unit = if minutes == 1 { "minute" } else { "minutes" };
                format!("Please wait {minutes} {unit} before refreshing again")
            }
            Self::Validation { message } => format!("Invalid input: {message}"),
            Self::Config { .. } => {
                "Configuration error. Please check your config file and API key.".to_string()
            }
            Self::Io { .. } => "File operation failed. Please check file permissions.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = HealthExposureError::backend(503, "unavailable");
        assert!(matches!(err, HealthExposureError::Backend { status: 503, .. }));

        let err = HealthExposureError::validation("latitude out of range");
        assert!(matches!(err, HealthExposureError::Validation { .. }));
    }

    #[test]
    fn test_location_messages_are_distinct() {
        let denied = HealthExposureError::permission_denied("denied").user_message();
        let unavailable = HealthExposureError::location_unavailable("none").user_message();
        let timeout = HealthExposureError::timeout("Location request timed out.").user_message();

        assert!(denied.contains("denied"));
        assert!(unavailable.contains("unavailable"));
        assert!(timeout.contains("timed out"));
        assert_ne!(denied, unavailable);
        assert_ne!(unavailable, timeout);
    }

    #[test]
    fn test_cooldown_message_rounds_up() {
        let err = HealthExposureError::RefreshCooldown {
            remaining: Duration::from_secs(180),
        };
        assert_eq!(
            err.user_message(),
            "Please wait 3 minutes before refreshing again"
        );

        let err = HealthExposureError::RefreshCooldown {
            remaining: Duration::from_secs(61),
        };
        assert!(err.user_message().contains("wait 2 minutes"));

        let err = HealthExposureError::RefreshCooldown {
            remaining: Duration::from_secs(20),
        };
        assert!(err.user_message().contains("wait 1 minute "));

        // a fraction of a second past a whole minute still counts
        let err = HealthExposureError::RefreshCooldown {
            remaining: Duration::from_millis(180_500),
        };
        assert!(err.user_message().contains("wait 4 minutes"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(HealthExposureError::network("reset").is_retryable());
        assert!(HealthExposureError::backend(502, "").is_retryable());
        assert!(!HealthExposureError::backend(403, "forbidden").is_retryable());
        assert!(!HealthExposureError::malformed("eof").is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: HealthExposureError = io_err.into();
        assert!(matches!(err, HealthExposureError::Io { .. }));
    }
}
