use thiserror::Error;

/// a3s-ctd error types
#[derive(Error, Debug)]
pub enum CtdError {
    /// A required external tool is missing from the search path
    #[error("Cannot find {binary} in path")]
    BinaryNotFound { binary: String },

    /// Temporary directory creation or removal failed
    #[error("Directory error: {0}")]
    DirectoryError(String),

    /// Rendering or writing the daemon config file failed
    #[error("Config write error: {0}")]
    ConfigWriteError(String),

    /// The OS could not start the daemon process
    #[error("Failed to start {binary}: {message}")]
    ProcessStartError { binary: String, message: String },

    /// Kill/wait anomaly on a supervised process
    #[error("Process error: {0}")]
    ProcessError(String),

    /// The fetch subprocess failed to spawn, exited non-zero, or was cancelled
    #[error("Fetch failed: {0}")]
    FetchError(String),

    /// Building a tar stream failed
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// Supervisor configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Timeout error
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CtdError {
    fn from(err: serde_json::Error) -> Self {
        CtdError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for CtdError {
    fn from(err: serde_yaml::Error) -> Self {
        CtdError::SerializationError(err.to_string())
    }
}

/// Result type alias for a3s-ctd operations
pub type Result<T> = std::result::Result<T, CtdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_not_found_display() {
        let error = CtdError::BinaryNotFound {
            binary: "containerd".to_string(),
        };
        assert_eq!(error.to_string(), "Cannot find containerd in path");
    }

    #[test]
    fn test_binary_not_found_dist_display() {
        let error = CtdError::BinaryNotFound {
            binary: "dist".to_string(),
        };
        assert_eq!(error.to_string(), "Cannot find dist in path");
    }

    #[test]
    fn test_process_start_error_display() {
        let error = CtdError::ProcessStartError {
            binary: "/usr/bin/containerd".to_string(),
            message: "permission denied".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to start /usr/bin/containerd: permission denied"
        );
    }

    #[test]
    fn test_fetch_error_display() {
        let error = CtdError::FetchError("dist exited with status 1".to_string());
        assert_eq!(error.to_string(), "Fetch failed: dist exited with status 1");
    }

    #[test]
    fn test_archive_error_display() {
        let error = CtdError::ArchiveError("short write".to_string());
        assert_eq!(error.to_string(), "Archive error: short write");
    }

    #[test]
    fn test_directory_error_display() {
        let error = CtdError::DirectoryError("read-only file system".to_string());
        assert_eq!(error.to_string(), "Directory error: read-only file system");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CtdError = io_error.into();
        assert!(matches!(err, CtdError::IoError(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope");
        let err: CtdError = result.unwrap_err().into();
        assert!(matches!(err, CtdError::SerializationError(_)));
    }

    #[test]
    fn test_serde_yaml_error_conversion() {
        let result: std::result::Result<serde_yaml::Value, _> =
            serde_yaml::from_str("invalid: yaml: content:");
        let err: CtdError = result.unwrap_err().into();
        assert!(matches!(err, CtdError::SerializationError(_)));
    }
}
