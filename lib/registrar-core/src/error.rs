use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// etcd's error code for a missing key
pub const KEY_NOT_FOUND: u64 = 100;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Store rejected operation on {key}: {message}")]
    StoreOperationFailed {
        key: String,
        code: Option<u64>,
        message: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl CoreError {
    /// True when the store refused the operation because the key does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::StoreOperationFailed {
                code: Some(KEY_NOT_FOUND),
                ..
            }
        )
    }

    /// True when the failure is a connectivity problem rather than a rejection
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CoreError::StoreUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let err = CoreError::StoreOperationFailed {
            key: "/vulcand/backends/web/servers/i1".to_string(),
            code: Some(KEY_NOT_FOUND),
            message: "Key not found".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_unavailable());

        let other = CoreError::StoreOperationFailed {
            key: "/vulcand".to_string(),
            code: Some(102),
            message: "Not a file".to_string(),
        };
        assert!(!other.is_not_found());
    }

    #[test]
    fn test_display() {
        let err = CoreError::StoreUnavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "Store unavailable: connection refused");
        assert!(err.is_unavailable());
    }
}
