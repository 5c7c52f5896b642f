use serde_json::Value;

/// Errors surfaced by the NenDB client.
///
/// Every failure carries a human-readable message; `Response` additionally
/// carries a structured details value (status code, server error body, raw
/// response text). Nothing is logged-and-swallowed: retries inside the
/// transport are the only automatic recovery, and once they are exhausted
/// the failure is terminal for that call.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Socket or DNS failure, startup health probe failure, or use after close.
    #[error("connection error: {message}")]
    Connection { message: String },

    /// The configured deadline elapsed before a response was received.
    #[error("timeout: {message}")]
    Timeout { message: String },

    /// A caller-supplied parameter violates a documented constraint.
    /// Raised before any network activity.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Malformed JSON on a success status, or HTTP status >= 400 after
    /// retries were exhausted.
    #[error("response error: {message}")]
    Response { message: String, details: Value },

    /// Any other unexpected failure during request execution, wrapped with
    /// the endpoint path for context.
    #[error("unexpected error on {endpoint}: {message}")]
    Other { endpoint: String, message: String },
}

impl ClientError {
    pub(crate) fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub(crate) fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn response(message: impl Into<String>, details: Value) -> Self {
        Self::Response {
            message: message.into(),
            details,
        }
    }

    pub(crate) fn other(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Other {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Structured details attached to the error, if any.
    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::Response { details, .. } => Some(details),
            _ => None,
        }
    }

    /// HTTP status code recorded in the details, if any.
    pub fn status_code(&self) -> Option<u16> {
        self.details()?
            .get("status_code")?
            .as_u64()
            .map(|code| code as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_error_exposes_status_code() {
        let err = ClientError::response(
            "HTTP error on /health: not found",
            json!({"status_code": 404, "response": {"error": "not found"}}),
        );
        assert_eq!(err.status_code(), Some(404));
        assert!(err.details().unwrap().get("response").is_some());
    }

    #[test]
    fn non_response_errors_have_no_details() {
        let err = ClientError::validation("start_node must be a non-negative integer");
        assert!(err.details().is_none());
        assert_eq!(err.status_code(), None);
        assert_eq!(
            err.to_string(),
            "validation error: start_node must be a non-negative integer"
        );
    }
}
