use thiserror::Error;

/// Failures raised by method handlers. Each maps to one protocol error code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("method not found: {method}")]
    MethodNotFound { method: String },
    #[error("internal error")]
    Internal { message: String },
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Wraps a parameter decoding failure.
    pub fn invalid_params(err: serde_json::Error) -> Self {
        Self::bad_request("invalid_params", err.to_string())
    }
}
